//! Error types for the permex-core library.

use thiserror::Error;

/// Configuration-level errors.
///
/// Pipeline stages return their own error types ([`PdfError`], [`OcrError`],
/// [`StoreError`]).
#[derive(Error, Debug)]
pub enum PermexError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
///
/// Only `Parse`, `Encrypted` and `NoPages` can abort a request; the per-page
/// variants are absorbed by the text acquirer as empty page text.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from a page.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract images from a page.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors raised by the confirmed-record store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or appending the backing file failed.
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded.
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The writer lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Result type for configuration loading.
pub type Result<T> = std::result::Result<T, PermexError>;
