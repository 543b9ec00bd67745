// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress reporting — observers that receive status text and total-progress
// ticks while a batch runs.

use std::sync::mpsc::Sender;

use scanlift_core::ProgressEvent;

/// Receives progress events in the order they happen.
///
/// Observers run on the processing thread; a slow observer slows the batch.
pub trait ProgressObserver {
    fn on_event(&mut self, event: &ProgressEvent);
}

/// Adapts a pair of closures: one for status text, one for `(current, total)`.
pub struct CallbackObserver<S, T>
where
    S: FnMut(&str),
    T: FnMut(usize, usize),
{
    on_status: S,
    on_total: T,
}

impl<S, T> CallbackObserver<S, T>
where
    S: FnMut(&str),
    T: FnMut(usize, usize),
{
    pub fn new(on_status: S, on_total: T) -> Self {
        Self {
            on_status,
            on_total,
        }
    }
}

impl<S, T> ProgressObserver for CallbackObserver<S, T>
where
    S: FnMut(&str),
    T: FnMut(usize, usize),
{
    fn on_event(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Status { message, .. } => (self.on_status)(message),
            ProgressEvent::TotalProgress { current, total } => (self.on_total)(*current, *total),
        }
    }
}

/// Forwards every event over an mpsc channel. A disconnected receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: Sender<ProgressEvent>,
}

impl ChannelObserver {
    pub fn new(sender: Sender<ProgressEvent>) -> Self {
        Self { sender }
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_event(&mut self, event: &ProgressEvent) {
        let _ = self.sender.send(event.clone());
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_event(&mut self, _event: &ProgressEvent) {}
}

/// Keeps every event, for inspection after the run.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    pub events: Vec<ProgressEvent>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status messages in arrival order.
    pub fn messages(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::Status { message, .. } => Some(message.as_str()),
                ProgressEvent::TotalProgress { .. } => None,
            })
            .collect()
    }

    /// `(current, total)` ticks in arrival order.
    pub fn totals(&self) -> Vec<(usize, usize)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::TotalProgress { current, total } => Some((*current, *total)),
                ProgressEvent::Status { .. } => None,
            })
            .collect()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_event(&mut self, event: &ProgressEvent) {
        self.events.push(event.clone());
    }
}

/// Status reporter bound to one file of the batch.
pub struct FileReporter<'a> {
    observer: &'a mut dyn ProgressObserver,
    file_index: usize,
}

impl<'a> FileReporter<'a> {
    pub fn new(observer: &'a mut dyn ProgressObserver, file_index: usize) -> Self {
        Self {
            observer,
            file_index,
        }
    }

    pub fn status(&mut self, message: impl Into<String>) {
        self.observer.on_event(&ProgressEvent::Status {
            file_index: self.file_index,
            page_index: None,
            message: message.into(),
        });
    }

    /// Status about the page at 0-based `page_index`.
    pub fn page_status(&mut self, page_index: usize, message: impl Into<String>) {
        self.observer.on_event(&ProgressEvent::Status {
            file_index: self.file_index,
            page_index: Some(page_index),
            message: message.into(),
        });
    }
}
