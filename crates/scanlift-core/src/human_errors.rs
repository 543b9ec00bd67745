// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the end-of-file failure lines.
//
// Each error variant maps to a short message and the next thing to try.
// The severity drives how the front end presents it.

use serde::{Deserialize, Serialize};

use crate::error::ScanliftError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Trying again may work (full disk freed, file unlocked).
    Transient,
    /// The user must change something (settings, permissions, file choice).
    ActionRequired,
    /// The input itself is unusable.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `ScanliftError` into a `HumanError`.
pub fn humanize_error(err: &ScanliftError) -> HumanError {
    match err {
        ScanliftError::InvalidParams(detail) => HumanError {
            message: "The enhancement settings are not valid.".into(),
            suggestion: format!("Check the contrast, radius, percent, and threshold values. ({detail})"),
            severity: Severity::ActionRequired,
        },

        ScanliftError::DocumentOpen(_) => HumanError {
            message: "This PDF file could not be opened.".into(),
            suggestion: "The file may be damaged or not really a PDF. Try opening it in a PDF viewer first.".into(),
            severity: Severity::Permanent,
        },

        ScanliftError::Extract(_) | ScanliftError::ImageError(_) => HumanError {
            message: "An image inside this PDF could not be read.".into(),
            suggestion: "The image may use an unusual format. The rest of the document is still processed.".into(),
            severity: Severity::Permanent,
        },

        ScanliftError::PdfError(_) => HumanError {
            message: "There's a problem with the structure of this PDF file.".into(),
            suggestion: "Try re-saving the file with a PDF viewer, then process the new copy.".into(),
            severity: Severity::Permanent,
        },

        ScanliftError::Save(_) => HumanError {
            message: "The enhanced PDF could not be written.".into(),
            suggestion: "Check there is free disk space and that the folder is writable.".into(),
            severity: Severity::Transient,
        },

        ScanliftError::Cancelled => HumanError {
            message: "Processing was stopped.".into(),
            suggestion: "Run the batch again to process the remaining files.".into(),
            severity: Severity::Transient,
        },

        ScanliftError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "An input or settings file couldn't be found.".into(),
                suggestion: "Check the path given on the command line.".into(),
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Scanlift doesn't have permission to use that file.".into(),
                suggestion: "Check the file and folder permissions, or copy the file somewhere else first.".into(),
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "A file could not be read or written.".into(),
                suggestion: "Try again. If this keeps happening, your storage may be full.".into(),
                severity: Severity::Transient,
            },
        },

        ScanliftError::Serialization(_) => HumanError {
            message: "The settings file could not be read.".into(),
            suggestion: "Make sure the settings file is valid JSON.".into(),
            severity: Severity::ActionRequired,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_failure_is_permanent() {
        let err = ScanliftError::DocumentOpen("scan.pdf: invalid file header".into());
        assert_eq!(humanize_error(&err).severity, Severity::Permanent);
    }

    #[test]
    fn save_failure_is_transient() {
        let err = ScanliftError::Save("scan_enhanced.pdf: no space left on device".into());
        assert_eq!(humanize_error(&err).severity, Severity::Transient);
    }

    #[test]
    fn missing_file_needs_user_action() {
        let err = ScanliftError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.message.contains("couldn't be found"));
    }

    #[test]
    fn invalid_params_carry_detail() {
        let err = ScanliftError::InvalidParams("contrast must be a positive number, got 0".into());
        let human = humanize_error(&err);
        assert!(human.suggestion.contains("contrast must be"));
    }
}
