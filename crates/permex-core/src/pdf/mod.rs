//! Page-structured document access and text acquisition.

mod acquire;
mod extractor;

pub use acquire::{AcquiredText, TextAcquirer};
pub use extractor::PdfDocument;

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// A document that can hand out text and images one page at a time.
///
/// Pages are 1-indexed.
pub trait PageSource {
    /// Get the number of pages.
    fn page_count(&self) -> u32;

    /// Layout-preserving text for a page.
    fn layout_text(&self, page: u32) -> Result<String>;

    /// Plain text for a page.
    fn plain_text(&self, page: u32) -> Result<String>;

    /// Render a page as an image at the specified DPI.
    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage>;
}
