//! Raster image extraction using lopdf.

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::Result;
use crate::error::PdfError;

/// Pulls embedded raster images out of a loaded PDF.
pub struct PdfImageExtractor {
    document: Document,
}

impl PdfImageExtractor {
    /// Parse a PDF held in memory.
    ///
    /// Documents encrypted with an empty user password are decrypted.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        Ok(Self { document })
    }

    /// First decodable image drawn on a page (1-indexed).
    ///
    /// Falls back to any image object in the file when the page resources
    /// reference none, which happens with some scanner outputs.
    pub fn page_image(&self, page: u32) -> Result<DynamicImage> {
        let pages = self.document.get_pages();
        let page_id = pages.get(&page).ok_or(PdfError::NoPages)?;

        if let Some(image) = self.page_xobjects(*page_id).find_map(|obj| self.decode(obj)) {
            return Ok(image);
        }

        debug!("No XObject image on page {}, scanning all objects", page);
        self.document
            .objects
            .values()
            .find_map(|obj| self.decode(obj))
            .ok_or(PdfError::NoImage)
    }

    fn page_xobjects(&self, page_id: ObjectId) -> impl Iterator<Item = &Object> {
        let xobjects = self
            .resources(page_id)
            .and_then(|resources| resources.get(b"XObject").ok())
            .and_then(|obj| match self.document.dereference(obj) {
                Ok((_, Object::Dictionary(dict))) => Some(dict),
                _ => None,
            });

        xobjects
            .into_iter()
            .flat_map(|dict| dict.iter())
            .filter_map(|(_, obj)| self.document.dereference(obj).ok().map(|(_, obj)| obj))
    }

    /// Resources of a page node, inherited from ancestors when absent.
    fn resources(&self, node_id: ObjectId) -> Option<&Dictionary> {
        let Ok(Object::Dictionary(node)) = self.document.get_object(node_id) else {
            return None;
        };

        if let Ok(resources) = node.get(b"Resources") {
            if let Ok((_, Object::Dictionary(dict))) = self.document.dereference(resources) {
                return Some(dict);
            }
        }

        match node.get(b"Parent") {
            Ok(Object::Reference(parent)) => self.resources(*parent),
            _ => None,
        }
    }

    fn decode(&self, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
        let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;
        trace!("Found image object: {}x{}", width, height);

        let filter = dict.get(b"Filter").ok().and_then(|f| match f {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.last().and_then(|o| o.as_name().ok()),
            _ => None,
        });

        match filter {
            Some(b"DCTDecode") => {
                return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                    .ok();
            }
            Some(b"JPXDecode" | b"CCITTFaxDecode" | b"JBIG2Decode") => {
                trace!("Skipping image with unsupported filter");
                return None;
            }
            _ => {}
        }

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);
        if bits != 8 {
            trace!("Unsupported bits per component: {}", bits);
            return None;
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        match self.color_space(dict) {
            Some(b"DeviceGray" | b"G") => {
                let len = (width as usize) * (height as usize);
                let pixels = data.get(..len)?.to_vec();
                GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8)
            }
            Some(b"DeviceRGB" | b"RGB") | None => {
                let len = (width as usize) * (height as usize) * 3;
                let pixels = data.get(..len)?.to_vec();
                RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)
            }
            Some(other) => {
                trace!("Unsupported color space: {}", String::from_utf8_lossy(other));
                None
            }
        }
    }

    fn color_space<'a>(&'a self, dict: &'a Dictionary) -> Option<&'a [u8]> {
        match dict.get(b"ColorSpace").ok()? {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => self.document.get_object(*r).ok()?.as_name().ok(),
            _ => None,
        }
    }
}
