// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// lopdf-backed document — page enumeration, embedded-image extraction and
// in-place replacement, page content cleanup, and compacting save.

use std::collections::HashSet;
use std::path::Path;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use scanlift_core::error::ScanliftError;
use scanlift_core::{ImageRef, ObjectRef, PageRef, Resolution};
use tracing::{debug, info, instrument, warn};

use crate::pdf::samples::{self, SampleLayout};
use crate::pdf::xobject::{self, resolve_dict};
use crate::pdf::{ExtractedImage, PdfBackend};
use crate::raster::buffer::RasterImage;
use crate::raster::codec::read_resolution;

/// Dictionary entries of an image XObject that survive a replacement.
const PRESERVED_KEYS: [&[u8]; 5] = [b"SMask", b"Intent", b"Interpolate", b"Metadata", b"Name"];

/// Stream filters lopdf can undo, in any combination.
const DECODED_FILTERS: [&[u8]; 3] = [b"FlateDecode", b"LZWDecode", b"ASCII85Decode"];

/// Page-tree depth beyond which inherited resources are not searched.
const MAX_TREE_DEPTH: usize = 64;

/// An open PDF whose embedded images can be swapped in place.
pub struct LopdfDocument {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl LopdfDocument {
    // -- Construction ---------------------------------------------------------

    /// Load a document already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ScanliftError> {
        let document = Document::load_mem(data).map_err(|err| {
            ScanliftError::DocumentOpen(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Return the source path if the document was opened from a file.
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    // -- Helpers --------------------------------------------------------------

    fn image_stream(&self, image: ImageRef) -> Result<&Stream, ScanliftError> {
        match self.document.get_object(object_id(image)) {
            Ok(Object::Stream(stream)) => Ok(stream),
            Ok(_) => Err(ScanliftError::Extract(format!(
                "object {} is not a stream",
                image
            ))),
            Err(err) => Err(ScanliftError::Extract(format!(
                "object {} not found: {}",
                image, err
            ))),
        }
    }

    /// Unpack a sample stream to 8-bit gray or RGB and wrap it as a PNG at
    /// the default resolution.
    fn extract_samples(
        &self,
        image: ImageRef,
        stream: &Stream,
        data: Vec<u8>,
    ) -> Result<ExtractedImage, ScanliftError> {
        let doc = &self.document;
        let dict = &stream.dict;

        let space = xobject::color_space(doc, dict).ok_or_else(|| {
            ScanliftError::Extract(format!("{}: unsupported colour space", image))
        })?;
        let bits = match xobject::integer(doc, dict, b"BitsPerComponent") {
            Some(bits @ (1 | 2 | 4 | 8)) => bits as u8,
            Some(16) if !space.is_indexed() => 16,
            other => {
                return Err(ScanliftError::Extract(format!(
                    "{}: unsupported bits per component {:?}",
                    image, other
                )));
            }
        };
        let (width, height) = match (
            xobject::integer(doc, dict, b"Width"),
            xobject::integer(doc, dict, b"Height"),
        ) {
            (Some(w), Some(h)) if w > 0 && h > 0 && w <= u32::MAX as i64 && h <= u32::MAX as i64 => {
                (w as u32, h as u32)
            }
            (w, h) => {
                return Err(ScanliftError::Extract(format!(
                    "{}: invalid dimensions {:?}x{:?}",
                    image, w, h
                )));
            }
        };
        let inverted =
            xobject::decode_inversion(doc, dict, space.components(), space.decode_max(bits))
                .ok_or_else(|| {
                    ScanliftError::Extract(format!("{}: unsupported /Decode array", image))
                })?;

        let layout = SampleLayout {
            width: width as usize,
            height: height as usize,
            bits,
        };
        let expected = layout.byte_len(space.components());
        if data.len() > expected {
            warn!(extra = data.len() - expected, "Trailing sample bytes ignored");
        }
        let pixels = samples::to_pixels(&space, &data, layout, &inverted)?;

        let channels = space.output_channels();
        let raster =
            RasterImage::from_samples(width, height, channels, pixels, Resolution::default())
                .map_err(|err| ScanliftError::Extract(format!("{}: {}", image, err)))?;
        let data = raster.to_png_bytes()?;
        debug!(
            width,
            height,
            bits,
            channels,
            indexed = space.is_indexed(),
            "Sample stream unpacked as PNG"
        );
        Ok(ExtractedImage {
            data,
            resolution: raster.resolution(),
        })
    }

    /// Resources of a page, inherited through the page tree when absent on
    /// the page itself.
    fn page_resources(&self, page_id: ObjectId) -> Option<Dictionary> {
        let mut current = page_id;
        for _ in 0..MAX_TREE_DEPTH {
            let node = self.document.get_dictionary(current).ok()?;
            if let Ok(resources) = node.get(b"Resources") {
                return resolve_dict(&self.document, resources).cloned();
            }
            match node.get(b"Parent") {
                Ok(Object::Reference(parent)) => current = *parent,
                _ => return None,
            }
        }
        None
    }

    /// Give the page its own copy of its resources with only the XObject
    /// names in `drawn` left in place.
    fn prune_xobject_resources(
        &mut self,
        page_id: ObjectId,
        drawn: &HashSet<Vec<u8>>,
    ) -> Result<(), ScanliftError> {
        let Some(mut resources) = self.page_resources(page_id) else {
            return Ok(());
        };
        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|x| resolve_dict(&self.document, x))
            .cloned()
        else {
            return Ok(());
        };

        let mut kept = Dictionary::new();
        for (name, value) in xobjects.iter() {
            if drawn.contains(name) {
                kept.set(name.clone(), value.clone());
            } else {
                debug!(name = %String::from_utf8_lossy(name), "Dropping unused XObject resource");
            }
        }
        if kept.len() == xobjects.len() {
            return Ok(());
        }

        resources.set("XObject", Object::Dictionary(kept));
        let page = self.document.get_dictionary_mut(page_id).map_err(|err| {
            ScanliftError::PdfError(format!("page {:?} not found: {}", page_id, err))
        })?;
        page.set("Resources", Object::Dictionary(resources));
        Ok(())
    }
}

impl PdfBackend for LopdfDocument {
    #[instrument(skip_all, fields(path = %path.display()))]
    fn open(path: &Path) -> Result<Self, ScanliftError> {
        info!("Opening PDF: {}", path.display());

        let document = Document::load(path).map_err(|err| {
            ScanliftError::DocumentOpen(format!("failed to open {}: {}", path.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path.display().to_string()),
        })
    }

    fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    fn pages(&self) -> Vec<PageRef> {
        // lopdf pages are keyed by 1-indexed page number, in order.
        self.document
            .get_pages()
            .into_iter()
            .map(|(number, id)| PageRef {
                number,
                object: object_ref(id),
            })
            .collect()
    }

    fn embedded_images(&self, page: PageRef) -> Result<Vec<ImageRef>, ScanliftError> {
        let page_id = object_id(page.object);
        self.document.get_dictionary(page_id).map_err(|err| {
            ScanliftError::PdfError(format!("page {} not readable: {}", page.number, err))
        })?;

        let mut images = Vec::new();
        if let Some(resources) = self.page_resources(page_id) {
            xobject::collect_images(&self.document, &resources, &mut images, &mut HashSet::new());
        }
        debug!(page = page.number, images = images.len(), "Embedded images enumerated");
        Ok(images.into_iter().map(object_ref).collect())
    }

    #[instrument(skip(self), fields(image = %image))]
    fn extract_image(&self, image: ImageRef) -> Result<ExtractedImage, ScanliftError> {
        let stream = self.image_stream(image)?;
        let dict = &stream.dict;
        let doc = &self.document;

        if matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true))) {
            return Err(ScanliftError::Extract(format!("{} is a stencil mask", image)));
        }

        let filters = xobject::filters(doc, dict);
        match filters.as_slice() {
            [filter] if filter.as_slice() == b"DCTDecode" => {
                if dict.has(b"Decode") {
                    return Err(ScanliftError::Extract(format!(
                        "{}: JPEG with a /Decode array",
                        image
                    )));
                }
                let data = stream.content.clone();
                let resolution = read_resolution(&data).unwrap_or_default();
                debug!(bytes = data.len(), ?resolution, "JPEG stream extracted");
                Ok(ExtractedImage { data, resolution })
            }
            [] => self.extract_samples(image, stream, stream.content.clone()),
            chain if chain.iter().all(|f| DECODED_FILTERS.contains(&f.as_slice())) => {
                let samples = stream.decompressed_content().map_err(|err| {
                    ScanliftError::Extract(format!("{}: cannot decode stream: {}", image, err))
                })?;
                self.extract_samples(image, stream, samples)
            }
            other => Err(ScanliftError::Extract(format!(
                "{}: unsupported filter chain [{}]",
                image,
                other
                    .iter()
                    .map(|f| String::from_utf8_lossy(f).into_owned())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }

    #[instrument(skip(self, png), fields(page = page.number, image = %image, png_len = png.len()))]
    fn replace_image(
        &mut self,
        page: PageRef,
        image: ImageRef,
        png: &[u8],
    ) -> Result<(), ScanliftError> {
        let id = object_id(image);
        let original = match self.document.get_object(id) {
            Ok(Object::Stream(stream)) => stream.dict.clone(),
            _ => {
                return Err(ScanliftError::PdfError(format!(
                    "image {} vanished before replacement",
                    image
                )));
            }
        };

        let decoded = RasterImage::from_bytes(png, Resolution::default())?;
        let color_space = if decoded.channels() == 1 {
            "DeviceGray"
        } else {
            "DeviceRGB"
        };
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => decoded.width() as i64,
            "Height" => decoded.height() as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
        };
        for key in PRESERVED_KEYS {
            if let Ok(value) = original.get(key) {
                dict.set(key, value.clone());
            }
        }

        let samples = decoded.samples().to_vec();
        self.document
            .objects
            .insert(id, Object::Stream(Stream::new(dict, samples)));

        debug!("Image replaced");
        Ok(())
    }

    #[instrument(skip(self), fields(page = page.number))]
    fn clean_content_stream(&mut self, page: PageRef) -> Result<(), ScanliftError> {
        let page_id = object_id(page.object);
        let has_contents = self
            .document
            .get_dictionary(page_id)
            .map(|dict| dict.has(b"Contents"))
            .unwrap_or(false);
        if !has_contents {
            return Ok(());
        }

        let raw = self.document.get_page_content(page_id).map_err(|err| {
            ScanliftError::PdfError(format!("page {} content unreadable: {}", page.number, err))
        })?;
        let content = Content::decode(&raw).map_err(|err| {
            ScanliftError::PdfError(format!("page {} content unparsable: {}", page.number, err))
        })?;

        let drawn: HashSet<Vec<u8>> = content
            .operations
            .iter()
            .filter(|op| op.operator == "Do")
            .filter_map(|op| match op.operands.first() {
                Some(Object::Name(name)) => Some(name.clone()),
                _ => None,
            })
            .collect();

        let encoded = content.encode().map_err(|err| {
            ScanliftError::PdfError(format!("page {} content not encodable: {}", page.number, err))
        })?;
        self.document
            .change_page_content(page_id, encoded)
            .map_err(|err| {
                ScanliftError::PdfError(format!(
                    "page {} content not replaceable: {}",
                    page.number, err
                ))
            })?;

        self.prune_xobject_resources(page_id, &drawn)?;
        debug!(drawn = drawn.len(), "Page content cleaned");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn save(&mut self, path: &Path) -> Result<(), ScanliftError> {
        let pruned = self.document.prune_objects();
        let empty = self.document.delete_zero_length_streams();
        self.document.renumber_objects();
        self.document.compress();

        self.document.save(path).map_err(|err| {
            ScanliftError::Save(format!("failed to write {}: {}", path.display(), err))
        })?;

        info!(
            pruned = pruned.len(),
            empty_streams = empty.len(),
            "PDF saved"
        );
        Ok(())
    }
}

fn object_id(reference: ObjectRef) -> ObjectId {
    (reference.number, reference.generation)
}

fn object_ref(id: ObjectId) -> ObjectRef {
    ObjectRef {
        number: id.0,
        generation: id.1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{SIDE, SampleImage, SamplePdf, gray_scene};
    use image::GenericImageView;

    #[test]
    fn pages_are_listed_in_order() {
        let bytes = SamplePdf::new().page(&[SampleImage::Gray]).page(&[]).to_bytes();
        let doc = LopdfDocument::from_bytes(&bytes).unwrap();
        assert_eq!(doc.page_count(), 2);
        let numbers: Vec<u32> = doc.pages().iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn garbage_is_a_document_open_error() {
        let result = LopdfDocument::from_bytes(b"this is not a pdf");
        assert!(matches!(result, Err(ScanliftError::DocumentOpen(_))));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.5\ngarbage").unwrap();
        assert!(matches!(
            LopdfDocument::open(&path),
            Err(ScanliftError::DocumentOpen(_))
        ));
    }

    #[test]
    fn raw_gray_stream_extracts_as_png() {
        let bytes = SamplePdf::new().page(&[SampleImage::Gray]).to_bytes();
        let doc = LopdfDocument::from_bytes(&bytes).unwrap();
        let page = doc.pages()[0];
        let images = doc.embedded_images(page).unwrap();
        assert_eq!(images.len(), 1);

        let extracted = doc.extract_image(images[0]).unwrap();
        assert_eq!(extracted.resolution, Resolution::default());
        let decoded = image::load_from_memory(&extracted.data).unwrap();
        assert_eq!(decoded.dimensions(), (32, 32));
    }

    #[test]
    fn jpeg_stream_extracts_its_own_bytes() {
        let bytes = SamplePdf::new().page(&[SampleImage::Jpeg]).to_bytes();
        let doc = LopdfDocument::from_bytes(&bytes).unwrap();
        let images = doc.embedded_images(doc.pages()[0]).unwrap();
        let extracted = doc.extract_image(images[0]).unwrap();
        assert_eq!(&extracted.data[..2], &[0xFF, 0xD8]);
        assert_eq!(extracted.resolution, Resolution::new(150, 150));
    }

    #[test]
    fn unsupported_streams_are_extract_errors() {
        let bytes = SamplePdf::new().page(&[SampleImage::Jbig2]).to_bytes();
        let doc = LopdfDocument::from_bytes(&bytes).unwrap();
        let images = doc.embedded_images(doc.pages()[0]).unwrap();
        assert!(matches!(
            doc.extract_image(images[0]),
            Err(ScanliftError::Extract(_))
        ));
    }

    /// Extract the only image of a one-page document and decode it.
    fn extract_single(kind: SampleImage) -> RasterImage {
        let bytes = SamplePdf::new().page(&[kind]).to_bytes();
        let doc = LopdfDocument::from_bytes(&bytes).unwrap();
        let images = doc.embedded_images(doc.pages()[0]).unwrap();
        let extracted = doc.extract_image(images[0]).unwrap();
        let raster = RasterImage::from_bytes(&extracted.data, extracted.resolution).unwrap();
        assert_eq!((raster.width(), raster.height()), (SIDE, SIDE));
        raster
    }

    /// Samples of the pixel at (`x`, `y`).
    fn pixel(raster: &RasterImage, x: u32, y: u32) -> &[u8] {
        let channels = raster.channels();
        let start = (y * raster.width() + x) as usize * channels;
        &raster.samples()[start..start + channels]
    }

    #[test]
    fn bilevel_streams_unpack_to_black_and_white() {
        for kind in [
            SampleImage::Bilevel,
            SampleImage::BilevelLzw,
            SampleImage::BilevelInverted,
        ] {
            let raster = extract_single(kind);
            assert_eq!(raster.channels(), 1, "{:?}", kind);
            assert_eq!(pixel(&raster, 0, 0), &[255], "{:?}", kind);
            assert_eq!(pixel(&raster, 16, 16), &[0], "{:?}", kind);
        }
    }

    #[test]
    fn four_and_sixteen_bit_gray_unpack_to_eight_bits() {
        let nibbles = extract_single(SampleImage::Gray4);
        assert_eq!(pixel(&nibbles, 0, 0), &[238]);
        assert_eq!(pixel(&nibbles, 16, 16), &[17]);

        let wide = extract_single(SampleImage::Gray16);
        assert_eq!(wide.samples(), gray_scene().as_raw().as_slice());
    }

    #[test]
    fn cmyk_streams_convert_to_rgb() {
        let raster = extract_single(SampleImage::Cmyk);
        assert_eq!(raster.channels(), 3);
        assert_eq!(pixel(&raster, 0, 0), &[230, 230, 221]);
        assert_eq!(pixel(&raster, 16, 16), &[31, 32, 35]);
    }

    #[test]
    fn palette_streams_expand_through_their_lookup() {
        let indexed = extract_single(SampleImage::Indexed);
        assert_eq!(indexed.channels(), 3);
        assert_eq!(pixel(&indexed, 0, 0), &[255, 255, 255]);
        assert_eq!(pixel(&indexed, 16, 16), &[0, 0, 0]);

        let palette = extract_single(SampleImage::PaletteCmyk);
        let direct = extract_single(SampleImage::Cmyk);
        assert_eq!(palette.samples(), direct.samples());
    }

    #[test]
    fn replacement_keeps_reference_and_smask() {
        let bytes = SamplePdf::new().page(&[SampleImage::GrayWithSmask]).to_bytes();
        let mut doc = LopdfDocument::from_bytes(&bytes).unwrap();
        let page = doc.pages()[0];
        let image = doc.embedded_images(page).unwrap()[0];

        let white = RasterImage::rgb(
            image::RgbImage::from_pixel(32, 32, image::Rgb([255, 255, 255])),
            Resolution::default(),
        );
        doc.replace_image(page, image, &white.to_png_bytes().unwrap()).unwrap();

        let images = doc.embedded_images(page).unwrap();
        assert_eq!(images, vec![image]);
        let stream = doc.image_stream(image).unwrap();
        assert!(stream.dict.has(b"SMask"));
        assert_eq!(xobject::name(&stream.dict, b"ColorSpace"), Some(&b"DeviceRGB"[..]));
        assert_eq!(stream.content.len(), 32 * 32 * 3);
    }

    #[test]
    fn cleaning_drops_undrawn_xobjects() {
        let bytes = SamplePdf::new()
            .page(&[SampleImage::Gray])
            .unused_image_on_first_page()
            .to_bytes();
        let mut doc = LopdfDocument::from_bytes(&bytes).unwrap();
        let page = doc.pages()[0];
        assert_eq!(doc.embedded_images(page).unwrap().len(), 2);

        doc.clean_content_stream(page).unwrap();
        assert_eq!(doc.embedded_images(page).unwrap().len(), 1);
    }

    #[test]
    fn save_writes_a_loadable_document() {
        let bytes = SamplePdf::new().page(&[SampleImage::Gray]).page(&[SampleImage::Rgb]).to_bytes();
        let mut doc = LopdfDocument::from_bytes(&bytes).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        doc.save(&path).unwrap();

        let reopened = LopdfDocument::open(&path).unwrap();
        assert_eq!(reopened.page_count(), 2);
        assert_eq!(reopened.source_path(), Some(path.display().to_string().as_str()));
    }
}
