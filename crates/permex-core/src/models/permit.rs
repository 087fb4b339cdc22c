//! Permit record data models.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// A scalar field recognised by the rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Permit number (`UE-A-12345/2026`).
    PermitNumber,
    /// Date the permit was issued.
    IssueDate,
    /// First day of validity.
    ValidFrom,
    /// Last day of validity.
    ValidUntil,
    /// Departure place.
    FromPlace,
    /// Destination place.
    ToPlace,
}

impl Field {
    /// Every field, in output order.
    pub const ALL: [Field; 6] = [
        Field::PermitNumber,
        Field::IssueDate,
        Field::ValidFrom,
        Field::ValidUntil,
        Field::FromPlace,
        Field::ToPlace,
    ];

    /// JSON key of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::PermitNumber => "permit_number",
            Field::IssueDate => "issue_date",
            Field::ValidFrom => "valid_from",
            Field::ValidUntil => "valid_until",
            Field::FromPlace => "from_place",
            Field::ToPlace => "to_place",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field name to optional value. A missing key means the field was not matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRecord {
    values: BTreeMap<Field, String>,
}

impl FieldRecord {
    /// Value of a field, `None` on a field-miss.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    /// Whether the field already holds a value.
    pub fn contains(&self, field: Field) -> bool {
        self.values.contains_key(&field)
    }

    /// Set a field unless it is already populated. Returns whether it was set.
    pub fn insert_first(&mut self, field: Field, value: String) -> bool {
        if self.contains(field) {
            return false;
        }
        self.values.insert(field, value);
        true
    }

    /// Fields that did not match any rule.
    pub fn missing(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| !self.contains(*f))
            .collect()
    }
}

impl Serialize for FieldRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Field::ALL.len()))?;
        for field in Field::ALL {
            map.serialize_entry(field.as_str(), &self.get(field))?;
        }
        map.end()
    }
}

/// Axle type code letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxleType {
    A,
    V,
    E,
}

impl AxleType {
    /// Parse a single code letter.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "A" => Some(Self::A),
            "V" => Some(Self::V),
            "E" => Some(Self::E),
            _ => None,
        }
    }
}

/// One physical axle from the axle table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxleRow {
    /// Axle index as printed (not necessarily contiguous or unique).
    pub index: u32,

    /// Axle type code.
    #[serde(rename = "type")]
    pub axle_type: AxleType,

    /// Whether the axle carries the driven marker.
    pub driven: bool,

    /// Load in tonnes.
    pub load_tons: Decimal,
}

/// Summary load for an axle group (VV, EE, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxleGroup {
    /// Group code as printed.
    pub group_code: String,

    /// First load column.
    pub load_tons: Decimal,

    /// Up to two further columns, positionally.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub further: Vec<Decimal>,
}

/// A road identifier with a kilometre marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    /// Road code such as `M1`.
    pub road: String,

    /// Kilometre marker (`km + m/1000`).
    pub km: Decimal,
}

/// Where the document text came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// Native PDF text extraction.
    #[default]
    Native,
    /// OCR over rendered page images.
    Ocr,
}

/// How `axle_count` was obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxleCountSource {
    /// Counted from parsed axle rows.
    Rows,
    /// Taken from a free-text phrase because no rows parsed.
    Text,
    /// Nothing found.
    #[default]
    None,
}

/// Everything extracted from one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedRecord {
    /// Scalar fields, serialised inline with `null` for misses.
    #[serde(flatten)]
    pub fields: FieldRecord,

    /// Deduplicated licence plates in first-seen order.
    pub license_plates: Vec<String>,

    /// Number of axles.
    pub axle_count: usize,

    /// Origin of `axle_count`.
    pub axle_count_source: AxleCountSource,

    /// Axle rows in source order.
    pub axles: Vec<AxleRow>,

    /// Group totals keyed by group code.
    #[serde(serialize_with = "groups_by_code")]
    pub axle_groups: Vec<AxleGroup>,

    /// Road segments with km markers.
    pub routes: Vec<RouteSegment>,

    /// Every road mentioned, deduplicated.
    pub roads: Vec<String>,

    /// Native text or OCR.
    pub text_source: TextSource,

    /// Bounded prefix of the normalized text.
    pub raw_text_preview: String,

    /// Field-misses and empty tables, for display.
    pub warnings: Vec<String>,
}

impl ParsedRecord {
    /// Shorthand for a scalar field.
    pub fn field(&self, field: Field) -> Option<&str> {
        self.fields.get(field)
    }

    /// Group entry by code.
    pub fn group(&self, code: &str) -> Option<&AxleGroup> {
        self.axle_groups.iter().find(|g| g.group_code == code)
    }
}

#[derive(Serialize)]
struct GroupLoad<'a> {
    load_tons: &'a Decimal,
    #[serde(skip_serializing_if = "no_further")]
    further: &'a [Decimal],
}

fn no_further(further: &&[Decimal]) -> bool {
    further.is_empty()
}

fn groups_by_code<S: Serializer>(groups: &[AxleGroup], serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(groups.len()))?;
    for group in groups {
        map.serialize_entry(
            &group.group_code,
            &GroupLoad {
                load_tons: &group.load_tons,
                further: &group.further,
            },
        )?;
    }
    map.end()
}

/// A human-validated record, keyed by document id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedRecord {
    /// Caller-supplied document identifier.
    pub document_id: String,

    /// Validated field payload, stored as given.
    pub fields: serde_json::Value,

    /// When the record was confirmed.
    pub confirmed_at: DateTime<Utc>,
}

impl ConfirmedRecord {
    /// Create a record stamped with the current time.
    pub fn new(document_id: impl Into<String>, fields: serde_json::Value) -> Self {
        Self {
            document_id: document_id.into(),
            fields,
            confirmed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_field_record_first_wins() {
        let mut record = FieldRecord::default();
        assert!(record.insert_first(Field::PermitNumber, "UE-A-1/2026".to_string()));
        assert!(!record.insert_first(Field::PermitNumber, "UE-B-2/2026".to_string()));
        assert_eq!(record.get(Field::PermitNumber), Some("UE-A-1/2026"));
        assert_eq!(record.missing().len(), 5);
    }

    #[test]
    fn test_parsed_record_json_shape() {
        let record = ParsedRecord {
            axles: vec![AxleRow {
                index: 1,
                axle_type: AxleType::A,
                driven: false,
                load_tons: Decimal::new(8000, 3),
            }],
            axle_count: 1,
            axle_count_source: AxleCountSource::Rows,
            axle_groups: vec![AxleGroup {
                group_code: "VV".to_string(),
                load_tons: Decimal::new(19, 0),
                further: vec![],
            }],
            ..Default::default()
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["permit_number"], json!(null));
        assert_eq!(value["to_place"], json!(null));
        assert_eq!(value["axles"][0]["type"], json!("A"));
        assert_eq!(value["axles"][0]["load_tons"], json!(8.0));
        assert_eq!(value["axle_groups"]["VV"], json!({"load_tons": 19.0}));
        assert_eq!(value["axle_count_source"], json!("rows"));
        assert_eq!(value["text_source"], json!("native"));
    }
}
