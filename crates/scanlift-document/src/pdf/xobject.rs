// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// XObject helpers — reference resolution, image enumeration through Form
// XObjects, and the stream-dictionary queries extraction depends on.

use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::pdf::samples::{ColorFamily, ColorSpace};

/// Reference chains longer than this are treated as broken.
const MAX_INDIRECTION: usize = 32;

/// Follow indirect references until a direct object is reached.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    let mut current = object;
    for _ in 0..MAX_INDIRECTION {
        match current {
            Object::Reference(id) => current = doc.get_object(*id).ok()?,
            other => return Some(other),
        }
    }
    None
}

/// Resolve `object` to a dictionary, if it is (or points at) one.
pub(crate) fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, object)? {
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Name value of `key`, if present and a name.
pub(crate) fn name<'a>(dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    match dict.get(key) {
        Ok(Object::Name(name)) => Some(name.as_slice()),
        _ => None,
    }
}

/// Integer value of `key`, following a reference if needed.
pub(crate) fn integer(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    let value = dict.get(key).ok()?;
    resolve(doc, value)?.as_i64().ok()
}

/// Filter chain of a stream, outermost first. A missing `/Filter` is empty.
pub(crate) fn filters(doc: &Document, dict: &Dictionary) -> Vec<Vec<u8>> {
    let Some(filter) = dict.get(b"Filter").ok().and_then(|f| resolve(doc, f)) else {
        return Vec::new();
    };
    match filter {
        Object::Name(name) => vec![name.clone()],
        Object::Array(items) => items
            .iter()
            .filter_map(|item| match resolve(doc, item) {
                Some(Object::Name(name)) => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Colour space of an image stream, for the spaces extraction supports:
/// the device spaces and their CalGray/CalRGB/ICCBased equivalents, and
/// `Indexed` over any of those.
pub(crate) fn color_space(doc: &Document, dict: &Dictionary) -> Option<ColorSpace> {
    let space = resolve(doc, dict.get(b"ColorSpace").ok()?)?;
    if let Some(family) = color_family(doc, space) {
        return Some(ColorSpace::Device(family));
    }
    indexed(doc, space)
}

fn color_family(doc: &Document, space: &Object) -> Option<ColorFamily> {
    match space {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"G" => Some(ColorFamily::Gray),
            b"DeviceRGB" | b"RGB" => Some(ColorFamily::Rgb),
            b"DeviceCMYK" | b"CMYK" => Some(ColorFamily::Cmyk),
            _ => None,
        },
        Object::Array(items) => {
            let family = match items.first().and_then(|f| resolve(doc, f)) {
                Some(Object::Name(family)) => family.as_slice(),
                _ => return None,
            };
            match family {
                b"CalGray" => Some(ColorFamily::Gray),
                b"CalRGB" => Some(ColorFamily::Rgb),
                b"ICCBased" => {
                    let profile = match items.get(1).and_then(|p| resolve(doc, p)) {
                        Some(Object::Stream(profile)) => profile,
                        _ => return None,
                    };
                    match integer(doc, &profile.dict, b"N") {
                        Some(1) => Some(ColorFamily::Gray),
                        Some(3) => Some(ColorFamily::Rgb),
                        Some(4) => Some(ColorFamily::Cmyk),
                        _ => None,
                    }
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// `[/Indexed base hival lookup]`, with the lookup given as a string or a
/// stream.
fn indexed(doc: &Document, space: &Object) -> Option<ColorSpace> {
    let Object::Array(items) = space else {
        return None;
    };
    let family = match items.first().and_then(|f| resolve(doc, f)) {
        Some(Object::Name(family)) => family.as_slice(),
        _ => return None,
    };
    if family != b"Indexed" && family != b"I" {
        return None;
    }

    let base = color_family(doc, resolve(doc, items.get(1)?)?)?;
    let hival = u8::try_from(resolve(doc, items.get(2)?)?.as_i64().ok()?).ok()?;
    let lookup = match resolve(doc, items.get(3)?)? {
        Object::String(bytes, _) => bytes.clone(),
        Object::Stream(stream) => stream.get_plain_content().ok()?,
        _ => return None,
    };
    Some(ColorSpace::Indexed {
        base,
        hival,
        lookup,
    })
}

/// Which of `components` ranges `/Decode` inverts.
///
/// A missing array inverts nothing. Each pair must be the default
/// `[0 max]` or its reverse `[max 0]`; any other mapping gives `None`.
pub(crate) fn decode_inversion(
    doc: &Document,
    dict: &Dictionary,
    components: usize,
    max: f32,
) -> Option<Vec<bool>> {
    let Ok(decode) = dict.get(b"Decode") else {
        return Some(vec![false; components]);
    };
    let Object::Array(items) = resolve(doc, decode)? else {
        return None;
    };
    if items.len() != components * 2 {
        return None;
    }

    items
        .chunks_exact(2)
        .map(|pair| {
            let low = resolve(doc, &pair[0])?.as_float().ok()?;
            let high = resolve(doc, &pair[1])?.as_float().ok()?;
            if low == 0.0 && high == max {
                Some(false)
            } else if low == max && high == 0.0 {
                Some(true)
            } else {
                None
            }
        })
        .collect()
}

/// Append every image XObject reachable from `resources` to `images`.
///
/// Form XObjects are searched recursively; `visited_forms` stops cycles and
/// repeated work. Inline (direct) image streams are not addressable by
/// reference and are left out.
pub(crate) fn collect_images(
    doc: &Document,
    resources: &Dictionary,
    images: &mut Vec<ObjectId>,
    visited_forms: &mut HashSet<ObjectId>,
) {
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|x| resolve_dict(doc, x))
    else {
        return;
    };

    for (_, value) in xobjects.iter() {
        let Object::Reference(id) = value else {
            continue;
        };
        let Ok(Object::Stream(stream)) = doc.get_object(*id) else {
            continue;
        };
        match name(&stream.dict, b"Subtype") {
            Some(b"Image") => {
                if !images.contains(id) {
                    images.push(*id);
                }
            }
            Some(b"Form") => {
                if !visited_forms.insert(*id) {
                    continue;
                }
                if let Some(form_resources) = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|r| resolve_dict(doc, r))
                {
                    collect_images(doc, form_resources, images, visited_forms);
                }
            }
            _ => {}
        }
    }
}
