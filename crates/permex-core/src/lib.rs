//! Core library for transport permit extraction.
//!
//! This crate provides:
//! - PDF text acquisition with an OCR fallback for scanned documents
//! - Line normalization and keyword-driven block segmentation
//! - Rule-based extraction of permit fields, plates, axle tables and routes
//! - A confirmed-record store and a transport-agnostic request boundary

pub mod error;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod permit;
pub mod service;
pub mod store;

pub use error::{OcrError, PdfError, PermexError, Result, StoreError};
pub use models::config::{AcquisitionConfig, OcrConfig, PermexConfig};
pub use models::permit::{
    AxleCountSource, AxleGroup, AxleRow, AxleType, ConfirmedRecord, Field, FieldRecord, ParsedRecord,
    RouteSegment, TextSource,
};
pub use ocr::{PageRecognizer, create_recognizer};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pdf::{AcquiredText, PageSource, PdfDocument, TextAcquirer};
pub use permit::{PermitExtractor, PermitParser};
pub use service::{
    ConfirmRequest, PermitPipeline, PermitService, ServiceError, ServiceResponse, check_upload,
    confirm_into,
};
pub use store::{JsonLinesStore, MemoryStore, RecordStore};
