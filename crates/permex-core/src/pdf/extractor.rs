//! PDF page text and image access using lopdf and pdf-extract.

use std::panic::{self, AssertUnwindSafe};

use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::{PageSource, Result};
use crate::error::PdfError;

/// A loaded PDF document.
pub struct PdfDocument {
    document: Document,
    /// Per-page text from pdf-extract; `None` when that mode failed for this file.
    layout_pages: Option<Vec<String>>,
}

impl PdfDocument {
    /// Parse a PDF from bytes, decrypting documents protected by an empty password.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let decrypted;
        let bytes = if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut buffer = Vec::new();
            document
                .save_to(&mut buffer)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted = buffer;
            decrypted.as_slice()
        } else {
            data
        };

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        let layout_pages = layout_text_by_pages(bytes, page_count);
        debug!(
            "Loaded PDF with {} pages (layout text {})",
            page_count,
            if layout_pages.is_some() { "available" } else { "unavailable" }
        );

        Ok(Self {
            document,
            layout_pages,
        })
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.document
            .get_pages()
            .get(&page)
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }

    /// Images drawn on a page through its XObject resources.
    pub fn page_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let doc = &self.document;
        let page_id = self.page_id(page)?;
        let mut images = Vec::new();

        let xobjects = inherited(doc, page_id, b"Resources")
            .and_then(|res| match res {
                Object::Dictionary(dict) => dict.get(b"XObject").ok().cloned(),
                _ => None,
            })
            .and_then(|xobj| match doc.dereference(&xobj) {
                Ok((_, Object::Dictionary(dict))) => Some(dict.clone()),
                _ => None,
            });

        if let Some(xobjects) = xobjects {
            for (_, obj_ref) in xobjects.iter() {
                if let Ok((_, obj)) = doc.dereference(obj_ref) {
                    if let Some(img) = decode_image(doc, obj) {
                        images.push(img);
                    }
                }
            }
        }

        trace!("Extracted {} images from page {}", images.len(), page);
        Ok(images)
    }

    /// Every image object in the document, in object order.
    fn all_images(&self) -> Vec<DynamicImage> {
        self.document
            .objects
            .values()
            .filter_map(|obj| decode_image(&self.document, obj))
            .collect()
    }

    /// Page width in PDF points, from the (possibly inherited) MediaBox.
    fn page_width_pt(&self, page: u32) -> Option<f32> {
        let page_id = self.page_id(page).ok()?;
        match inherited(&self.document, page_id, b"MediaBox")? {
            Object::Array(values) if values.len() == 4 => {
                let x0 = values[0].as_float().ok()?;
                let x1 = values[2].as_float().ok()?;
                Some((x1 - x0).abs())
            }
            _ => None,
        }
    }
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    fn layout_text(&self, page: u32) -> Result<String> {
        self.layout_pages
            .as_ref()
            .and_then(|pages| pages.get(page.checked_sub(1)? as usize))
            .cloned()
            .ok_or_else(|| PdfError::TextExtraction(format!("no layout text for page {}", page)))
    }

    fn plain_text(&self, page: u32) -> Result<String> {
        self.page_id(page)?;
        self.document
            .extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    /// A scanned page is one embedded image; it is upscaled when its
    /// resolution falls short of `dpi` for the page width.
    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage> {
        let image = match self.page_images(page)?.into_iter().next() {
            Some(image) => image,
            None => {
                debug!("No XObject images on page {}, scanning all objects", page);
                self.all_images()
                    .into_iter()
                    .nth((page - 1) as usize)
                    .ok_or_else(|| {
                        PdfError::ImageExtraction(format!("no image found for page {}", page))
                    })?
            }
        };

        let Some(width_pt) = self.page_width_pt(page) else {
            return Ok(image);
        };
        let target_width = (width_pt / 72.0 * dpi as f32).round() as u32;
        if target_width == 0 || image.width() >= target_width {
            return Ok(image);
        }

        let target_height =
            (image.height() as f64 * target_width as f64 / image.width() as f64).round() as u32;
        trace!(
            "Upscaling page {} image {}x{} -> {}x{} for {} dpi",
            page,
            image.width(),
            image.height(),
            target_width,
            target_height,
            dpi
        );
        Ok(image.resize_exact(target_width, target_height.max(1), FilterType::Triangle))
    }
}

/// pdf-extract text per page. The crate panics on some malformed fonts, so
/// a panic is treated the same as an error.
fn layout_text_by_pages(bytes: &[u8], page_count: usize) -> Option<Vec<String>> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));

    match outcome {
        Ok(Ok(pages)) if pages.len() == page_count => Some(pages),
        Ok(Ok(pages)) => {
            warn!(
                "Layout extraction returned {} pages for a {}-page document",
                pages.len(),
                page_count
            );
            None
        }
        Ok(Err(e)) => {
            warn!("Layout text extraction failed: {}", e);
            None
        }
        Err(_) => {
            warn!("Layout text extraction panicked");
            None
        }
    }
}

/// Look up `key` on a page node, walking up the page tree.
fn inherited(doc: &Document, node_id: ObjectId, key: &[u8]) -> Option<Object> {
    let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
        return None;
    };

    if let Ok(value) = dict.get(key) {
        if let Ok((_, resolved)) = doc.dereference(value) {
            return Some(resolved.clone());
        }
    }

    match dict.get(b"Parent") {
        Ok(Object::Reference(parent_id)) => inherited(doc, *parent_id, key),
        _ => None,
    }
}

fn decode_image(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;

    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    trace!("Found image object: {}x{}", width, height);

    match first_name(dict, b"Filter") {
        Some(b"DCTDecode") => {
            return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg).ok();
        }
        Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
            trace!("Unsupported image filter");
            return None;
        }
        _ => {}
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let color_space = match dict.get(b"ColorSpace") {
        Ok(Object::Reference(r)) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
        Ok(_) => first_name(dict, b"ColorSpace"),
        Err(_) => None,
    }
    .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);

    if bits != 8 {
        trace!("Unsupported bits per component: {}", bits);
        return None;
    }

    raw_to_image(&data, width, height, color_space)
}

fn first_name<'a>(dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    match dict.get(key).ok()? {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
        _ => None,
    }
}

fn raw_to_image(data: &[u8], width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let pixels = (width as usize) * (height as usize);

    let rgba: Vec<u8> = match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => data[..pixels * 3]
            .chunks_exact(3)
            .flat_map(|c| [c[0], c[1], c[2], 255])
            .collect(),
        b"DeviceGray" | b"G" if data.len() >= pixels => data[..pixels]
            .iter()
            .flat_map(|&g| [g, g, g, 255])
            .collect(),
        _ => {
            trace!(
                "Could not decode {} image: data_len={}, pixels={}",
                String::from_utf8_lossy(color_space),
                data.len(),
                pixels
            );
            return None;
        }
    };

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_fail_to_load() {
        let err = PdfDocument::load(b"this is not a pdf").err().unwrap();
        assert!(matches!(err, PdfError::Parse(_) | PdfError::NoPages));
    }

    #[test]
    fn test_gray_image_decoding() {
        let image = raw_to_image(&[0, 128, 255, 64], 2, 2, b"DeviceGray").unwrap();
        assert_eq!(image.width(), 2);
        assert_eq!(image.to_rgba8().get_pixel(1, 0).0, [128, 128, 128, 255]);
    }

    #[test]
    fn test_short_image_data_rejected() {
        assert!(raw_to_image(&[1, 2, 3], 2, 2, b"DeviceRGB").is_none());
        assert!(raw_to_image(&[0; 12], 2, 2, b"Indexed").is_none());
    }
}
