//! Request boundary: document upload and record confirmation.
//!
//! Transport-agnostic. Every call yields either a value or a [`ServiceError`]
//! carrying the status code and JSON body a transport should send.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};

use crate::error::{PdfError, StoreError};
use crate::models::config::PermexConfig;
use crate::models::permit::{ConfirmedRecord, ParsedRecord, TextSource};
use crate::ocr::create_recognizer;
use crate::pdf::{AcquiredText, TextAcquirer};
use crate::permit::{PermitExtractor, PermitParser};
use crate::store::RecordStore;

/// Errors surfaced to callers of the service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The request itself is unusable; no pipeline stage ran.
    #[error("invalid request: {0}")]
    Input(String),

    /// The document could not be opened at all.
    #[error("could not read document: {0}")]
    Acquisition(#[from] PdfError),

    /// The confirmed-record store failed.
    #[error("could not store record: {0}")]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Input(_) => 400,
            ServiceError::Acquisition(_) | ServiceError::Store(_) => 500,
        }
    }

    pub fn to_body(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

/// A status code and JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: Value,
}

impl ServiceResponse {
    /// Map a service result onto a response.
    pub fn from_result<T: Serialize>(result: Result<T, ServiceError>) -> Self {
        let outcome = result.and_then(|value| {
            serde_json::to_value(value).map_err(|e| ServiceError::Store(StoreError::Serialize(e)))
        });
        match outcome {
            Ok(body) => Self { status: 200, body },
            Err(e) => Self {
                status: e.status_code(),
                body: e.to_body(),
            },
        }
    }
}

/// Confirmation payload: a document id and the human-validated fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmRequest {
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub fields: Option<Value>,
}

impl ConfirmRequest {
    pub fn new(document_id: impl Into<String>, fields: Value) -> Self {
        Self {
            document_id: Some(document_id.into()),
            fields: Some(fields),
        }
    }

    /// Parse a JSON request body.
    pub fn from_json(body: &str) -> Result<Self, ServiceError> {
        serde_json::from_str(body).map_err(|e| ServiceError::Input(format!("malformed JSON: {}", e)))
    }

    /// Validate the request into a record stamped with the current time.
    pub fn into_record(self) -> Result<ConfirmedRecord, ServiceError> {
        let document_id = self
            .document_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ServiceError::Input("document_id is required".to_string()))?;
        let fields = self
            .fields
            .filter(|f| !f.is_null())
            .ok_or_else(|| ServiceError::Input("fields is required".to_string()))?;
        Ok(ConfirmedRecord::new(document_id, fields))
    }
}

/// Reject an upload before any pipeline stage runs.
pub fn check_upload(data: &[u8]) -> Result<(), ServiceError> {
    if data.is_empty() {
        return Err(ServiceError::Input("no document supplied".to_string()));
    }
    Ok(())
}

/// Validate a confirmation and append it to `store`.
pub fn confirm_into<S: RecordStore + ?Sized>(
    store: &S,
    request: ConfirmRequest,
) -> Result<ConfirmedRecord, ServiceError> {
    let record = request.into_record()?;
    store.save(&record)?;

    info!("Confirmed record for document {}", record.document_id);
    Ok(record)
}

/// Acquisition plus parsing. Holds no per-document state.
pub struct PermitPipeline {
    acquirer: TextAcquirer,
    parser: PermitParser,
}

impl PermitPipeline {
    pub fn new(acquirer: TextAcquirer, parser: PermitParser) -> Self {
        Self { acquirer, parser }
    }

    /// Build the pipeline, loading the OCR engine when enabled and available.
    pub fn from_config(config: &PermexConfig) -> Self {
        let mut acquirer = TextAcquirer::new(config.acquisition.clone());
        if config.acquisition.enable_ocr {
            if let Some(recognizer) = create_recognizer(&config.ocr) {
                acquirer = acquirer.with_recognizer(recognizer);
            }
        }

        let parser = PermitParser::from_config(&config.segmentation, &config.extraction);
        Self::new(acquirer, parser)
    }

    /// Document text only.
    pub fn acquire(&self, data: &[u8]) -> Result<AcquiredText, PdfError> {
        self.acquirer.acquire(data)
    }

    /// Parse already-acquired text.
    pub fn parse_text(&self, text: &str, source: TextSource) -> ParsedRecord {
        self.parser.parse(text, source)
    }

    /// Bytes to record. Fails only when the document cannot be opened.
    pub fn run(&self, data: &[u8]) -> Result<ParsedRecord, PdfError> {
        let acquired = self.acquire(data)?;
        Ok(self.parse_text(&acquired.text, acquired.source))
    }
}

/// Upload, confirm and list operations over a pipeline and a record store.
pub struct PermitService<S: RecordStore> {
    pipeline: PermitPipeline,
    store: S,
}

impl<S: RecordStore> PermitService<S> {
    pub fn new(pipeline: PermitPipeline, store: S) -> Self {
        Self { pipeline, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Extract a record from uploaded document bytes.
    pub fn upload(&self, data: &[u8]) -> Result<ParsedRecord, ServiceError> {
        check_upload(data)?;

        debug!("Processing upload of {} bytes", data.len());
        Ok(self.pipeline.run(data)?)
    }

    /// Validate and store a confirmed record.
    pub fn confirm(&self, request: ConfirmRequest) -> Result<ConfirmedRecord, ServiceError> {
        confirm_into(&self.store, request)
    }

    /// Every confirmed record.
    pub fn list(&self) -> Result<Vec<ConfirmedRecord>, ServiceError> {
        Ok(self.store.list()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::AcquisitionConfig;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn service() -> PermitService<MemoryStore> {
        let pipeline = PermitPipeline::new(
            TextAcquirer::new(AcquisitionConfig::default()),
            PermitParser::new(),
        );
        PermitService::new(pipeline, MemoryStore::new())
    }

    #[test]
    fn test_empty_upload_is_input_error() {
        let err = service().upload(&[]).unwrap_err();
        assert!(matches!(err, ServiceError::Input(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_corrupt_upload_is_server_error() {
        let err = service().upload(b"not a pdf at all").unwrap_err();
        assert!(matches!(err, ServiceError::Acquisition(_)));
        assert_eq!(err.status_code(), 500);
        assert!(err.to_body()["error"].as_str().unwrap().starts_with("could not read document"));
    }

    #[test]
    fn test_confirm_requires_id_and_fields() {
        let service = service();

        let missing_id = ConfirmRequest::from_json(r#"{"fields": {"permit_number": "X"}}"#).unwrap();
        assert_eq!(service.confirm(missing_id).unwrap_err().status_code(), 400);

        let blank_id = ConfirmRequest::new("  ", json!({}));
        assert_eq!(service.confirm(blank_id).unwrap_err().status_code(), 400);

        let null_fields = ConfirmRequest::from_json(r#"{"document_id": "doc-1", "fields": null}"#).unwrap();
        assert_eq!(service.confirm(null_fields).unwrap_err().status_code(), 400);

        assert!(matches!(ConfirmRequest::from_json("{"), Err(ServiceError::Input(_))));
        assert!(service.list().unwrap().is_empty());
    }

    #[test]
    fn test_confirm_and_list() {
        let service = service();
        let record = service
            .confirm(ConfirmRequest::new(" doc-7 ", json!({"permit_number": "UE-A-12345/2026"})))
            .unwrap();
        assert_eq!(record.document_id, "doc-7");

        let listed = service.list().unwrap();
        assert_eq!(listed, vec![record]);
    }

    #[test]
    fn test_response_mapping() {
        let ok = ServiceResponse::from_result(Ok::<_, ServiceError>(json!({"a": 1})));
        assert_eq!(ok.status, 200);

        let err = ServiceResponse::from_result::<Value>(Err(ServiceError::Input("no document supplied".into())));
        assert_eq!(err.status, 400);
        assert_eq!(err.body, json!({"error": "invalid request: no document supplied"}));
    }

    #[test]
    fn test_confirm_into_shared_store() {
        let store = MemoryStore::new();
        assert!(matches!(
            confirm_into(&store, ConfirmRequest::new("doc-1", Value::Null)),
            Err(ServiceError::Input(_))
        ));
        assert!(store.list().unwrap().is_empty());

        let saved = confirm_into(&store, ConfirmRequest::new("doc-1", json!({"to_place": "Győr"}))).unwrap();
        assert_eq!(store.list().unwrap(), vec![saved]);
        assert!(check_upload(b"%PDF").is_ok());
        assert_eq!(check_upload(b"").unwrap_err().status_code(), 400);
    }

    #[test]
    fn test_parse_text_never_fails() {
        let pipeline = PermitPipeline::from_config(&PermexConfig::default());
        let record = pipeline.parse_text("", TextSource::Native);
        assert_eq!(record.field(crate::models::permit::Field::PermitNumber), None);
    }
}
