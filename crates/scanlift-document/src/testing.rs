// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test fixtures — synthetic scanned PDFs built with lopdf.

use std::path::Path;

use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::{GrayImage, Luma, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat, dictionary};

/// Side length of every sample image.
pub(crate) const SIDE: u32 = 32;

/// Kinds of embedded image a sample page can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SampleImage {
    /// 8-bit DeviceGray, FlateDecode.
    Gray,
    /// 8-bit DeviceRGB, no filter.
    Rgb,
    /// Baseline JPEG with a 150 dpi JFIF header.
    Jpeg,
    /// 8-bit DeviceCMYK, no filter.
    Cmyk,
    /// 1-bit DeviceGray, FlateDecode.
    Bilevel,
    /// 1-bit DeviceGray, LZWDecode.
    BilevelLzw,
    /// 1-bit DeviceGray with `/Decode [1 0]`, so set bits are black.
    BilevelInverted,
    /// 4-bit DeviceGray, no filter.
    Gray4,
    /// 16-bit DeviceGray, ASCII85Decode.
    Gray16,
    /// 8-bit indices into `[/Indexed /DeviceRGB 1 <000000FFFFFF>]`.
    Indexed,
    /// 2-bit indices into a DeviceCMYK palette held in a stream.
    PaletteCmyk,
    /// JBIG2Decode, which extraction rejects.
    Jbig2,
    /// DeviceGray with a soft mask.
    GrayWithSmask,
}

/// Light-gray paper with a dark square in the middle.
pub(crate) fn gray_scene() -> GrayImage {
    GrayImage::from_fn(SIDE, SIDE, |x, y| {
        if (8..24).contains(&x) && (8..24).contains(&y) {
            Luma([30])
        } else {
            Luma([228])
        }
    })
}

pub(crate) fn rgb_scene() -> RgbImage {
    RgbImage::from_fn(SIDE, SIDE, |x, y| {
        if (8..24).contains(&x) && (12..20).contains(&y) {
            Rgb([20, 30, 90])
        } else {
            Rgb([230, 226, 214])
        }
    })
}

/// `gray_scene` thresholded to one bit per pixel: 0 for ink, 1 for paper.
pub(crate) fn bilevel_scene() -> Vec<u8> {
    gray_scene().pixels().map(|p| u8::from(p.0[0] >= 128)).collect()
}

/// Ink on paper in CMYK: the paper carries a light key, the ink a heavy one.
pub(crate) fn cmyk_scene() -> Vec<u8> {
    bilevel_scene()
        .into_iter()
        .flat_map(|paper| if paper == 1 { [0, 0, 10, 25] } else { [30, 20, 0, 220] })
        .collect()
}

/// Pack `values` (each below `1 << bits`) into rows of `SIDE` samples,
/// padding each row to a whole byte.
pub(crate) fn pack_rows(values: &[u8], bits: u8) -> Vec<u8> {
    let mut out = Vec::new();
    for row in values.chunks(SIDE as usize) {
        let mut byte = 0u8;
        let mut used = 0;
        for &value in row {
            byte |= value << (8 - bits - used);
            used += bits;
            if used == 8 {
                out.push(byte);
                byte = 0;
                used = 0;
            }
        }
        if used > 0 {
            out.push(byte);
        }
    }
    out
}

/// LZW-code `data` as literal 9-bit codes between a clear and an end code.
/// The table never grows past 9 bits for inputs under 250 bytes.
fn lzw_literals(data: &[u8]) -> Vec<u8> {
    assert!(data.len() < 250, "literal LZW only covers short inputs");
    let codes = std::iter::once(256u32)
        .chain(data.iter().map(|&b| u32::from(b)))
        .chain(std::iter::once(257));
    let mut out = Vec::new();
    let mut acc = 0u32;
    let mut pending = 0;
    for code in codes {
        acc = (acc << 9) | code;
        pending += 9;
        while pending >= 8 {
            pending -= 8;
            out.push((acc >> pending) as u8);
        }
        acc &= (1 << pending) - 1;
    }
    if pending > 0 {
        out.push((acc << (8 - pending)) as u8);
    }
    out
}

fn ascii85(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in data.chunks(4) {
        let mut group = [0u8; 4];
        group[..chunk.len()].copy_from_slice(chunk);
        let mut value = u32::from_be_bytes(group);
        let mut digits = [0u8; 5];
        for digit in digits.iter_mut().rev() {
            *digit = (value % 85) as u8 + b'!';
            value /= 85;
        }
        out.extend_from_slice(&digits[..chunk.len() + 1]);
    }
    out.extend_from_slice(b"~>");
    out
}

/// Builder for small multi-page PDFs whose pages draw sample images.
#[derive(Debug, Clone, Default)]
pub(crate) struct SamplePdf {
    pages: Vec<Vec<SampleImage>>,
    unused_on_first_page: bool,
}

impl SamplePdf {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a page drawing `images` side by side.
    pub(crate) fn page(mut self, images: &[SampleImage]) -> Self {
        self.pages.push(images.to_vec());
        self
    }

    /// List an extra image in the first page's resources without drawing it.
    pub(crate) fn unused_image_on_first_page(mut self) -> Self {
        self.unused_on_first_page = true;
        self
    }

    pub(crate) fn build(&self) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::new();

        for (index, images) in self.pages.iter().enumerate() {
            let mut xobjects = Dictionary::new();
            let mut operations = vec![Operation::new("q", vec![]), Operation::new("Q", vec![])];

            for (slot, kind) in images.iter().enumerate() {
                let name = format!("Im{}", slot);
                let stream = sample_stream(&mut doc, *kind);
                let id = doc.add_object(stream);
                xobjects.set(name.clone(), id);
                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new(
                    "cm",
                    vec![
                        32.into(),
                        0.into(),
                        0.into(),
                        32.into(),
                        (slot as i64 * 40).into(),
                        0.into(),
                    ],
                ));
                operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
                operations.push(Operation::new("Q", vec![]));
            }

            if index == 0 && self.unused_on_first_page {
                let stream = sample_stream(&mut doc, SampleImage::Rgb);
                let id = doc.add_object(stream);
                xobjects.set("Unused", id);
            }

            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("sample content encodes"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Resources" => dictionary! { "XObject" => xobjects },
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.build()
            .save_to(&mut bytes)
            .expect("sample PDF serialises");
        bytes
    }

    pub(crate) fn write_to(&self, path: &Path) {
        std::fs::write(path, self.to_bytes()).expect("sample PDF written");
    }
}

fn image_dict(color_space: &str) -> Dictionary {
    image_dict_with(Object::Name(color_space.as_bytes().to_vec()), 8)
}

fn image_dict_with(color_space: Object, bits: i64) -> Dictionary {
    dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => SIDE as i64,
        "Height" => SIDE as i64,
        "ColorSpace" => color_space,
        "BitsPerComponent" => bits,
    }
}

fn gray_dict(bits: i64) -> Dictionary {
    image_dict_with(Object::Name(b"DeviceGray".to_vec()), bits)
}

fn indexed_space(base: &[u8], hival: i64, lookup: Object) -> Object {
    Object::Array(vec![
        Object::Name(b"Indexed".to_vec()),
        Object::Name(base.to_vec()),
        hival.into(),
        lookup,
    ])
}

fn sample_stream(doc: &mut Document, kind: SampleImage) -> Stream {
    match kind {
        SampleImage::Gray => {
            let mut stream = Stream::new(image_dict("DeviceGray"), gray_scene().into_raw());
            stream.compress().expect("sample stream compresses");
            stream
        }
        SampleImage::Rgb => Stream::new(image_dict("DeviceRGB"), rgb_scene().into_raw()),
        SampleImage::Jpeg => {
            let mut jpeg = Vec::new();
            let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, 90);
            encoder.set_pixel_density(PixelDensity::dpi(150));
            encoder
                .encode_image(&rgb_scene())
                .expect("sample JPEG encodes");
            let mut dict = image_dict("DeviceRGB");
            dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
            Stream::new(dict, jpeg)
        }
        SampleImage::Cmyk => Stream::new(image_dict("DeviceCMYK"), cmyk_scene()),
        SampleImage::Bilevel => {
            let mut stream = Stream::new(gray_dict(1), pack_rows(&bilevel_scene(), 1));
            stream.compress().expect("sample stream compresses");
            stream
        }
        SampleImage::BilevelLzw => {
            let mut dict = gray_dict(1);
            dict.set("Filter", Object::Name(b"LZWDecode".to_vec()));
            Stream::new(dict, lzw_literals(&pack_rows(&bilevel_scene(), 1)))
        }
        SampleImage::BilevelInverted => {
            let ink: Vec<u8> = bilevel_scene().into_iter().map(|paper| 1 - paper).collect();
            let mut dict = gray_dict(1);
            dict.set("Decode", vec![1.into(), 0.into()]);
            Stream::new(dict, pack_rows(&ink, 1))
        }
        SampleImage::Gray4 => {
            let nibbles: Vec<u8> = gray_scene().into_raw().into_iter().map(|v| v >> 4).collect();
            Stream::new(gray_dict(4), pack_rows(&nibbles, 4))
        }
        SampleImage::Gray16 => {
            let wide: Vec<u8> = gray_scene().into_raw().into_iter().flat_map(|v| [v, v]).collect();
            let mut dict = gray_dict(16);
            dict.set("Filter", Object::Name(b"ASCII85Decode".to_vec()));
            Stream::new(dict, ascii85(&wide))
        }
        SampleImage::Indexed => {
            let lookup = Object::String(vec![0, 0, 0, 255, 255, 255], StringFormat::Hexadecimal);
            let space = indexed_space(b"DeviceRGB", 1, lookup);
            Stream::new(image_dict_with(space, 8), bilevel_scene())
        }
        SampleImage::PaletteCmyk => {
            // Entries: paper, ink, and two unused.
            let table = vec![0, 0, 10, 25, 30, 20, 0, 220, 255, 0, 0, 0, 0, 255, 0, 0];
            let mut lookup = Stream::new(dictionary! {}, table);
            lookup.compress().expect("palette compresses");
            let lookup_id = doc.add_object(lookup);
            let space = indexed_space(b"DeviceCMYK", 3, Object::Reference(lookup_id));
            let indices: Vec<u8> = bilevel_scene().into_iter().map(|paper| 1 - paper).collect();
            Stream::new(image_dict_with(space, 2), pack_rows(&indices, 2))
        }
        SampleImage::Jbig2 => {
            let mut dict = gray_dict(1);
            dict.set("Filter", Object::Name(b"JBIG2Decode".to_vec()));
            Stream::new(dict, vec![0; 64])
        }
        SampleImage::GrayWithSmask => {
            let smask = Stream::new(
                image_dict("DeviceGray"),
                vec![255; (SIDE * SIDE) as usize],
            );
            let smask_id = doc.add_object(smask);
            let mut dict = image_dict("DeviceGray");
            dict.set("SMask", smask_id);
            Stream::new(dict, gray_scene().into_raw())
        }
    }
}
