//! Native text extraction with an OCR fallback for scanned documents.

use std::time::Instant;

use tracing::{debug, info, warn};

use super::{PageSource, PdfDocument, Result};
use crate::models::config::AcquisitionConfig;
use crate::models::permit::TextSource;
use crate::ocr::PageRecognizer;

/// Text recovered from a document.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquiredText {
    /// Pages joined with newlines, in page order.
    pub text: String,
    /// Per-page text; a page that failed is an empty string.
    pub pages: Vec<String>,
    /// Which path produced `text`.
    pub source: TextSource,
}

/// Turns document bytes into one text stream.
pub struct TextAcquirer {
    config: AcquisitionConfig,
    recognizer: Option<Box<dyn PageRecognizer>>,
}

impl TextAcquirer {
    /// Create an acquirer without OCR support.
    pub fn new(config: AcquisitionConfig) -> Self {
        Self {
            config,
            recognizer: None,
        }
    }

    /// Attach the recogniser used for scanned documents.
    pub fn with_recognizer(mut self, recognizer: Box<dyn PageRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn has_recognizer(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Load a PDF and acquire its text.
    ///
    /// Fails only when the document itself cannot be opened.
    pub fn acquire(&self, data: &[u8]) -> Result<AcquiredText> {
        let document = PdfDocument::load(data)?;
        Ok(self.acquire_from(&document))
    }

    /// Acquire text from any page source. Never fails.
    pub fn acquire_from<S: PageSource + ?Sized>(&self, source: &S) -> AcquiredText {
        let start = Instant::now();
        let page_count = self.page_limit(source.page_count());

        let pages: Vec<String> = (1..=page_count).map(|p| native_page(source, p)).collect();
        let text = pages.join("\n");
        let length = text.chars().count();

        debug!(
            "Native text: {} chars from {} pages in {:?}",
            length,
            page_count,
            start.elapsed()
        );

        if length >= self.config.min_text_length {
            return AcquiredText {
                text,
                pages,
                source: TextSource::Native,
            };
        }

        info!(
            "Native text too short ({} < {} chars), treating document as scanned",
            length, self.config.min_text_length
        );

        match self.ocr_pages(source, page_count) {
            Some(ocr_pages) => AcquiredText {
                text: ocr_pages.join("\n"),
                pages: ocr_pages,
                source: TextSource::Ocr,
            },
            None => AcquiredText {
                text,
                pages,
                source: TextSource::Native,
            },
        }
    }

    fn page_limit(&self, page_count: u32) -> u32 {
        match self.config.max_pages {
            0 => page_count,
            max => page_count.min(max as u32),
        }
    }

    /// OCR every page; `None` when OCR is unavailable or recovered nothing.
    fn ocr_pages<S: PageSource + ?Sized>(&self, source: &S, page_count: u32) -> Option<Vec<String>> {
        if !self.config.enable_ocr {
            debug!("OCR disabled, keeping native text");
            return None;
        }
        let Some(recognizer) = self.recognizer.as_deref() else {
            warn!("No OCR engine available, keeping native text");
            return None;
        };

        let start = Instant::now();
        let pages: Vec<String> = (1..=page_count)
            .map(|page| {
                let recognized = source
                    .render_page(page, self.config.render_dpi)
                    .map_err(|e| e.to_string())
                    .and_then(|image| recognizer.recognize(&image).map_err(|e| e.to_string()));

                recognized.unwrap_or_else(|e| {
                    warn!("OCR failed on page {}: {}", page, e);
                    String::new()
                })
            })
            .collect();

        if pages.iter().all(|p| p.trim().is_empty()) {
            warn!("OCR recovered no text, keeping native text");
            return None;
        }

        info!("OCR processed {} pages in {:?}", page_count, start.elapsed());
        Some(pages)
    }
}

/// The longer of the layout and plain extractions; layout wins ties.
fn native_page<S: PageSource + ?Sized>(source: &S, page: u32) -> String {
    let layout = source.layout_text(page).unwrap_or_else(|e| {
        debug!("Layout text unavailable for page {}: {}", page, e);
        String::new()
    });
    let plain = source.plain_text(page).unwrap_or_else(|e| {
        warn!("Plain text extraction failed on page {}: {}", page, e);
        String::new()
    });

    if plain.chars().count() > layout.chars().count() {
        plain
    } else {
        layout
    }
}
