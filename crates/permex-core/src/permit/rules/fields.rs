//! Default field rules and value normalizers.

use chrono::{NaiveDate, NaiveTime};

use super::patterns::*;
use super::{FieldRule, Scope};
use crate::models::permit::Field;

/// The built-in rule table, in evaluation order.
pub fn default_rules() -> Vec<FieldRule> {
    vec![
        // Permit number: bare grammar first, labelled value as fallback
        FieldRule::new(Field::PermitNumber, Scope::Document, &PERMIT_NUMBER, normalize_permit_number),
        FieldRule::new(Field::PermitNumber, Scope::Document, &PERMIT_NUMBER_LABELED, normalize_permit_number),
        // Issue date
        FieldRule::new(Field::IssueDate, Scope::Document, &ISSUE_DATE_LABELED, normalize_date),
        FieldRule::new(Field::IssueDate, Scope::Document, &ISSUE_DATE_AFTER_PERMIT, normalize_date),
        FieldRule::new(Field::IssueDate, Scope::Header, &ANY_DATE, normalize_date),
        // Validity
        FieldRule::new(Field::ValidFrom, Scope::Document, &VALID_FROM_LABELED, normalize_date),
        FieldRule::new(Field::ValidFrom, Scope::Document, &VALIDITY_RANGE, normalize_date),
        FieldRule::new(Field::ValidFrom, Scope::Document, &VALID_FROM_SUFFIX, normalize_date),
        FieldRule::new(Field::ValidUntil, Scope::Document, &VALID_UNTIL_LABELED, normalize_date),
        FieldRule::new(Field::ValidUntil, Scope::Document, &VALIDITY_RANGE, normalize_date).with_group(2),
        FieldRule::new(Field::ValidUntil, Scope::Document, &VALID_UNTIL_SUFFIX, normalize_date),
        // Places
        FieldRule::new(Field::FromPlace, Scope::Document, &FROM_PLACE_SPLIT, normalize_place),
        FieldRule::new(Field::FromPlace, Scope::Document, &FROM_PLACE_INLINE, normalize_place),
        FieldRule::new(Field::ToPlace, Scope::Document, &TO_PLACE_SPLIT, normalize_place),
        FieldRule::new(Field::ToPlace, Scope::Document, &TO_PLACE_INLINE, normalize_place),
    ]
}

/// Uppercase and strip whitespace: `ue - a - 12345 / 2026` -> `UE-A-12345/2026`.
pub fn normalize_permit_number(raw: &str) -> Option<String> {
    let value: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    (value.len() >= 5 && value.chars().any(|c| c.is_ascii_digit())).then_some(value)
}

/// Canonical `YYYY.MM.DD[ HH:MM]`; impossible calendar dates are rejected.
pub fn normalize_date(raw: &str) -> Option<String> {
    let caps = DATE_PARTS.captures(raw.trim())?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let time = match (caps.get(4), caps.get(5)) {
        (Some(h), Some(m)) => NaiveTime::from_hms_opt(h.as_str().parse().ok()?, m.as_str().parse().ok()?, 0),
        _ => None,
    };

    Some(match time {
        Some(t) => format!("{} {}", date.format("%Y.%m.%d"), t.format("%H:%M")),
        None => date.format("%Y.%m.%d").to_string(),
    })
}

/// Trim a place value; reject one that is really the next section label.
pub fn normalize_place(raw: &str) -> Option<String> {
    let value = raw.trim().trim_end_matches([':', ',', ';']).trim();
    if value.is_empty() || NUMBERED_LABEL.is_match(value) {
        return None;
    }
    Some(value.to_string())
}
