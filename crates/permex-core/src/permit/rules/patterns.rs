//! Common regex patterns for transport permit extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// Date token: `YYYY.MM.DD`, whitespace tolerated around the dots, optional
/// trailing dot and time of day.
pub const DATE: &str = r"\b\d{4}\s*\.\s*\d{1,2}\s*\.\s*\d{1,2}\.?(?:[ \t]+\d{1,2}:\d{2})?";

/// Permit number: issuer letters, one letter, serial, year.
pub const PERMIT_CODE: &str = r"\b[A-Z]{1,3}\s*-\s*[A-Z]\s*-\s*\d{3,7}\s*/\s*\d{4}\b";

const DEPARTURE: &str =
    r"(?:kiindul[áa]si\s+hely|indul[áa]si\s+hely|indul[áa]s\s+helye|departure)";

const DESTINATION: &str =
    r"(?:c[ée]l[áa]llom[áa]s|[ée]rkez[ée]si\s+hely|rendeltet[ée]si\s+hely|destination)";

lazy_static! {
    pub static ref DATE_PARTS: Regex = Regex::new(
        r"^(\d{4})\s*\.\s*(\d{1,2})\s*\.\s*(\d{1,2})\.?(?:[ \t]+(\d{1,2}):(\d{2}))?$"
    ).unwrap();

    pub static ref ANY_DATE: Regex = Regex::new(&format!("({DATE})")).unwrap();

    // Permit number
    pub static ref PERMIT_NUMBER: Regex = Regex::new(&format!("(?i)({PERMIT_CODE})")).unwrap();

    pub static ref PERMIT_NUMBER_LABELED: Regex = Regex::new(
        r"(?i)(?:enged[ée]ly\s*sz[áa]ma|enged[ée]ly\s*sz\.|permit\s+(?:no\.?|number))\s*:?\s*([A-Z0-9][A-Z0-9\-/]{4,})"
    ).unwrap();

    // Issue date
    pub static ref ISSUE_DATE_LABELED: Regex = Regex::new(&format!(
        r"(?i)(?:kelt|ki[áa]ll[íi]t[áa]s\s+d[áa]tuma|kiad[áa]s\s+d[áa]tuma|issue\s+date)[^\n\d]*({DATE})"
    )).unwrap();

    pub static ref ISSUE_DATE_AFTER_PERMIT: Regex = Regex::new(&format!(
        r"(?i){PERMIT_CODE}[^\n]*\n\s*({DATE})"
    )).unwrap();

    // Validity
    pub static ref VALID_FROM_LABELED: Regex = Regex::new(&format!(
        r"(?i)(?:[ée]rv[ée]nyess[ée]g\s+kezdete|[ée]rv[ée]nyes\s+-?t[óo]l|valid\s+from)[^\n\d]*({DATE})"
    )).unwrap();

    pub static ref VALID_UNTIL_LABELED: Regex = Regex::new(&format!(
        r"(?i)(?:[ée]rv[ée]nyess[ée]g\s+v[ée]ge|[ée]rv[ée]nyes\s+-?ig|valid\s+(?:until|to))[^\n\d]*({DATE})"
    )).unwrap();

    pub static ref VALIDITY_RANGE: Regex = Regex::new(&format!(
        r"(?i)[ée]rv[ée]nyes\w*[^\n\d]*({DATE})\s*[-–]\s*({DATE})"
    )).unwrap();

    pub static ref VALID_FROM_SUFFIX: Regex = Regex::new(&format!(
        r"(?i)({DATE})\s*-?\s*t[óo]l\b"
    )).unwrap();

    pub static ref VALID_UNTIL_SUFFIX: Regex = Regex::new(&format!(
        r"(?i)({DATE})\s*-?\s*ig\b"
    )).unwrap();

    // Places: numbered label on one line, value on the next
    pub static ref FROM_PLACE_SPLIT: Regex = Regex::new(&format!(
        r"(?im)^[ \t]*\d{{1,2}}[ \t]*\.?[ \t]*{DEPARTURE}[ \t]*:?[ \t]*\r?\n\s*(\S[^\r\n]*)"
    )).unwrap();

    pub static ref FROM_PLACE_INLINE: Regex = Regex::new(&format!(
        r"(?i){DEPARTURE}[ \t]*:[ \t]*(\S[^\n]*)"
    )).unwrap();

    pub static ref TO_PLACE_SPLIT: Regex = Regex::new(&format!(
        r"(?im)^[ \t]*\d{{1,2}}[ \t]*\.?[ \t]*{DESTINATION}[ \t]*:?[ \t]*\r?\n\s*(\S[^\r\n]*)"
    )).unwrap();

    pub static ref TO_PLACE_INLINE: Regex = Regex::new(&format!(
        r"(?i){DESTINATION}[ \t]*:[ \t]*(\S[^\n]*)"
    )).unwrap();

    /// A line that is itself a numbered section label (`6. Célállomás`).
    pub static ref NUMBERED_LABEL: Regex = Regex::new(r"^\d{1,2}[ \t]*\.[ \t]*\p{L}").unwrap();

    // Licence plates (uppercase only)
    pub static ref PLATE_HU_CLASSIC: Regex = Regex::new(
        r"\b([A-Z]{3})[ -]?(\d{3})\b(?:[ \t]*\((?:H|HU)\))?"
    ).unwrap();

    pub static ref PLATE_HU_EU: Regex = Regex::new(
        r"\b([A-Z]{2})[ ]?([A-Z]{2})[ -]?(\d{3})\b(?:[ \t]*\((?:H|HU)\))?"
    ).unwrap();

    pub static ref PLATE_LETTERS_DIGITS_LETTERS: Regex = Regex::new(
        r"\b([A-Z]{2,3})[ -]?(\d{2,3})-?([A-Z]{1,3})\b"
    ).unwrap();

    // Axle table
    pub static ref AXLE_ROW: Regex = Regex::new(
        // The load must end at whitespace, a `t` unit or end of line so a
        // decimal is never cut short.
        r"(?i)^\s*([1-9]\d{0,2})\s+([AVE])\b(?:\s+(X|H|hajtott))?\s+(\d+(?:[.,]\d+)?)(?:\s*t\b|\s|$)"
    ).unwrap();

    pub static ref AXLE_GROUP: Regex = Regex::new(
        r"^\s*(VV|EE|VE|EV)\b\s+(\d+(?:[.,]\d+)?)(?:\s+(\d+(?:[.,]\d+)?))?(?:\s+(\d+(?:[.,]\d+)?))?"
    ).unwrap();

    pub static ref AXLE_COUNT_PHRASE: Regex = Regex::new(
        r"(?i)(?:tengelyek\s+sz[áa]ma\s*:?\s*(\d{1,2})\b|\b(\d{1,2})\s*(?:db\s+)?tengely(?:es|ű|ü)?\b)"
    ).unwrap();

    // Route
    pub static ref ROAD: Regex = Regex::new(r"\b([A-Z]\d{1,3})\b").unwrap();

    pub static ref KM_MARKER: Regex = Regex::new(r"\b(\d{1,4})\s*\+\s*(\d{1,3})\b").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_token_variants() {
        assert!(ANY_DATE.is_match("2026.01.12"));
        assert!(ANY_DATE.is_match("2026 . 01 . 12."));
        assert_eq!(&ANY_DATE.captures("kelt 2026.01.12 10:30 x").unwrap()[1], "2026.01.12 10:30");
        assert!(!ANY_DATE.is_match("12.01.2026"));
    }

    #[test]
    fn test_permit_code() {
        assert!(PERMIT_NUMBER.is_match("UE-A-12345/2026"));
        assert!(PERMIT_NUMBER.is_match("UE - A - 12345 / 2026"));
        assert!(!PERMIT_NUMBER.is_match("UE-12345/2026"));
    }

    #[test]
    fn test_axle_row_grammar() {
        let caps = AXLE_ROW.captures("2 V X 2,780").unwrap();
        assert_eq!(&caps[1], "2");
        assert_eq!(&caps[2], "V");
        assert_eq!(&caps[3], "X");
        assert_eq!(&caps[4], "2,780");

        let caps = AXLE_ROW.captures("1 A 8,000").unwrap();
        assert!(caps.get(3).is_none());
        assert!(!AXLE_ROW.is_match("VV 19,000"));
        assert!(!AXLE_ROW.is_match("0 A 1,0"));
    }
}
