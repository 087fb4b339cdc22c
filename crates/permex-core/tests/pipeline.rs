//! End-to-end extraction over generated PDF documents.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use permex_core::{
    AcquisitionConfig, ConfirmRequest, Field, MemoryStore, PermitExtractor, PermitParser, PermitPipeline,
    PermitService, ServiceError, ServiceResponse, TextAcquirer, TextSource,
};
use pretty_assertions::assert_eq;
use serde_json::json;

/// A one-page PDF with one text line per BT/ET block.
fn pdf_with_lines(lines: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut operations = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let y = 800 - (i as i64) * 16;
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 11.into()]));
        operations.push(Operation::new("Td", vec![40.into(), y.into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("ET", vec![]));
    }
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn service() -> PermitService<MemoryStore> {
    let pipeline = PermitPipeline::new(
        TextAcquirer::new(AcquisitionConfig::default()),
        PermitParser::new(),
    );
    PermitService::new(pipeline, MemoryStore::new())
}

#[test]
fn permit_number_and_issue_date_from_pdf() {
    let bytes = pdf_with_lines(&[
        "KOZUTI KOZLEKEDESI HATOSAG",
        "UE-A-12345/2026",
        "2026.01.12",
        "Ervenyessegi ido: 2026.01.15 - 2026.02.14",
        "Vontato rendszama: ABC-123",
    ]);

    let record = service().upload(&bytes).unwrap();

    assert_eq!(record.field(Field::PermitNumber), Some("UE-A-12345/2026"));
    assert_eq!(record.field(Field::IssueDate), Some("2026.01.12"));
    assert_eq!(record.field(Field::ValidUntil), Some("2026.02.14"));
    assert_eq!(record.license_plates, vec!["ABC123"]);
    assert_eq!(record.text_source, TextSource::Native);
}

#[test]
fn axle_block_rows_and_group() {
    let text = "UE-A-12345/2026\nTengelyadatok\n1 A 8,000\n2 V X 2,780\nVV 19,000 19,000 19,000\n";
    let record = PermitParser::new().parse(text, TextSource::Native);

    let axles = serde_json::to_value(&record.axles).unwrap();
    assert_eq!(
        axles,
        json!([
            {"index": 1, "type": "A", "driven": false, "load_tons": 8.0},
            {"index": 2, "type": "V", "driven": true, "load_tons": 2.78},
        ])
    );

    let groups = serde_json::to_value(&record).unwrap()["axle_groups"].clone();
    assert_eq!(groups, json!({"VV": {"load_tons": 19.0, "further": [19.0, 19.0]}}));
    assert_eq!(record.axle_count, 2);
}

#[test]
fn unrecognised_document_still_succeeds() {
    let bytes = pdf_with_lines(&["Lorem ipsum dolor sit amet", "consectetur adipiscing elit"]);

    let response = ServiceResponse::from_result(service().upload(&bytes));
    assert_eq!(response.status, 200);
    assert_eq!(response.body["permit_number"], json!(null));
    assert_eq!(response.body["axles"], json!([]));
    assert!(response.body["raw_text_preview"].as_str().unwrap().contains("Lorem ipsum"));
}

#[test]
fn empty_upload_is_rejected_before_parsing() {
    let err = service().upload(&[]).unwrap_err();
    assert!(matches!(err, ServiceError::Input(_)));

    let response = ServiceResponse::from_result(service().upload(&[]));
    assert_eq!(response.status, 400);
    assert!(response.body["error"].is_string());
}

#[test]
fn confirmed_records_round_trip_through_service() {
    let service = service();
    let request = ConfirmRequest::from_json(
        r#"{"document_id": "permit-42", "fields": {"permit_number": "UE-A-12345/2026"}}"#,
    )
    .unwrap();

    service.confirm(request).unwrap();
    let listed = service.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].fields, json!({"permit_number": "UE-A-12345/2026"}));
}
