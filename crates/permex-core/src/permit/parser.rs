//! Assembles a [`ParsedRecord`] from normalized document text.

use std::time::Instant;

use tracing::{debug, info};

use super::axles::AxleTable;
use super::lines::LineStream;
use super::routes::RouteParser;
use super::rules::{PlateMatcher, RuleSet, TextView};
use super::segmenter::{BlockSegmenter, Segments};
use crate::models::config::{ExtractionConfig, SegmentationConfig};
use crate::models::permit::{Field, ParsedRecord, TextSource};

/// Trait for permit parsing. Parsing never fails; misses become `None`/empty.
pub trait PermitExtractor {
    /// Parse a document's text.
    fn parse(&self, text: &str, source: TextSource) -> ParsedRecord;
}

/// Rule-based permit parser.
#[derive(Debug, Clone)]
pub struct PermitParser {
    segmenter: BlockSegmenter,
    rules: RuleSet,
    plates: PlateMatcher,
    routes: RouteParser,
    preview_chars: usize,
}

impl PermitParser {
    /// Create a parser with the built-in rules and default configuration.
    pub fn new() -> Self {
        Self::from_config(&SegmentationConfig::default(), &ExtractionConfig::default())
    }

    pub fn from_config(segmentation: &SegmentationConfig, extraction: &ExtractionConfig) -> Self {
        Self {
            segmenter: BlockSegmenter::new(segmentation),
            rules: RuleSet::default(),
            plates: PlateMatcher::default(),
            routes: RouteParser::new(extraction.route_lookahead),
            preview_chars: extraction.preview_chars,
        }
    }

    /// Replace the field rule set.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Replace the plate grammars.
    pub fn with_plates(mut self, plates: PlateMatcher) -> Self {
        self.plates = plates;
        self
    }

    /// Segment a line stream without extracting fields.
    pub fn segment(&self, stream: &LineStream) -> Segments {
        self.segmenter.segment(stream.lines())
    }

    /// Parse an already-normalized line stream.
    pub fn parse_stream(&self, stream: &LineStream, source: TextSource) -> ParsedRecord {
        let start = Instant::now();
        let segments = self.segment(stream);
        let header = segments.header.text();
        let view = TextView::new(stream.raw(), &header);

        let fields = self.rules.extract(&view);
        let license_plates = self.plates.extract(stream.raw());

        let table = AxleTable::parse(&segments.axle.lines);
        let (axle_count, axle_count_source) = table.axle_count(stream.raw());

        let route_text = if segments.route.is_empty() {
            debug!("Route block empty, scanning full text for roads");
            stream.normalized_text()
        } else {
            segments.route.text()
        };
        let route = self.routes.parse(&route_text);

        let mut warnings: Vec<String> = fields
            .missing()
            .into_iter()
            .map(|f| format!("Could not extract {f}"))
            .collect();
        if license_plates.is_empty() {
            warnings.push("Could not extract license plates".to_string());
        }
        if table.rows.is_empty() {
            warnings.push("Could not extract axle rows".to_string());
        }
        if route.roads.is_empty() {
            warnings.push("Could not extract route".to_string());
        }

        info!(
            "Parsed permit {} ({} axles, {} plates, {} route segments) in {:?}",
            fields.get(Field::PermitNumber).unwrap_or("<none>"),
            axle_count,
            license_plates.len(),
            route.segments.len(),
            start.elapsed()
        );

        ParsedRecord {
            fields,
            license_plates,
            axle_count,
            axle_count_source,
            axles: table.rows,
            axle_groups: table.groups,
            routes: route.segments,
            roads: route.roads,
            text_source: source,
            raw_text_preview: stream.preview(self.preview_chars),
            warnings,
        }
    }
}

impl Default for PermitParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PermitExtractor for PermitParser {
    fn parse(&self, text: &str, source: TextSource) -> ParsedRecord {
        self.parse_stream(&LineStream::from_text(text), source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::permit::AxleCountSource;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    const PERMIT: &str = r#"
        KÖZÚTI KÖZLEKEDÉSI HATÓSÁG
        Túlsúlyos jármű közlekedési engedély
        UE-A-12345/2026
        2026.01.12
        Érvényességi idő: 2026.01.15 - 2026.02.14

        Vontató rendszáma: ABC-123
        Pótkocsi rendszáma: AA BC-456

        5. Indulási hely
        Budapest
        6. Célállomás
        Győr

        Útvonal:
        M0 25+300 - M1 12+500
        81 sz. főút

        Tengelyadatok
        1 A 8,000
        2 V X 2,780
        3 E 9,5
        VV 19,000 19,000 19,000
    "#;

    #[test]
    fn test_parse_full_permit() {
        let record = PermitParser::new().parse(PERMIT, TextSource::Native);

        assert_eq!(record.field(Field::PermitNumber), Some("UE-A-12345/2026"));
        assert_eq!(record.field(Field::IssueDate), Some("2026.01.12"));
        assert_eq!(record.field(Field::ValidFrom), Some("2026.01.15"));
        assert_eq!(record.field(Field::ValidUntil), Some("2026.02.14"));
        assert_eq!(record.field(Field::FromPlace), Some("Budapest"));
        assert_eq!(record.field(Field::ToPlace), Some("Győr"));
        assert_eq!(record.license_plates, vec!["ABC123", "AABC456"]);

        assert_eq!(record.axle_count, 3);
        assert_eq!(record.axle_count_source, AxleCountSource::Rows);
        assert_eq!(record.axle_count, record.axles.len());
        assert_eq!(record.group("VV").unwrap().load_tons, Decimal::new(19, 0));

        assert_eq!(record.roads, vec!["M0", "M1"]);
        assert_eq!(record.routes[0].km, Decimal::new(25300, 3));
        assert!(record.warnings.is_empty(), "{:?}", record.warnings);
    }

    #[test]
    fn test_crlf_permit_matches_lf() {
        let crlf = PERMIT.replace('\n', "\r\n");
        let record = PermitParser::new().parse(&crlf, TextSource::Native);

        assert_eq!(record.field(Field::FromPlace), Some("Budapest"));
        assert_eq!(record.field(Field::ToPlace), Some("Győr"));
        assert_eq!(record.field(Field::IssueDate), Some("2026.01.12"));
        assert_eq!(record.axle_count, 3);
    }

    #[test]
    fn test_axle_count_bounded_by_axle_block() {
        let mut text = String::from("Tengelyadatok\n");
        for i in 1..=200 {
            text.push_str(&format!("{} A 8,0\n", i));
        }

        let record = PermitParser::new().parse(&text, TextSource::Native);
        assert_eq!(record.axle_count, record.axles.len());
        assert!(record.axle_count <= 120);
        // The trigger line uses one of the 120 block lines.
        assert_eq!(record.axle_count, 119);
    }

    #[test]
    fn test_unrecognised_text_yields_empty_record() {
        let record = PermitParser::new().parse("lorem ipsum\ndolor sit amet", TextSource::Ocr);

        assert_eq!(record.field(Field::PermitNumber), None);
        assert!(record.axles.is_empty());
        assert!(record.routes.is_empty());
        assert_eq!(record.axle_count, 0);
        assert_eq!(record.text_source, TextSource::Ocr);
        assert_eq!(record.warnings.len(), 9);
    }

    #[test]
    fn test_preview_is_bounded() {
        let extraction = ExtractionConfig {
            preview_chars: 10,
            ..Default::default()
        };
        let parser = PermitParser::from_config(&SegmentationConfig::default(), &extraction);
        let record = parser.parse(PERMIT, TextSource::Native);
        assert_eq!(record.raw_text_preview.chars().count(), 10);
        assert_eq!(record.raw_text_preview, "KÖZÚTI KÖZ");
    }

    #[test]
    fn test_empty_text() {
        let record = PermitParser::new().parse("", TextSource::Native);
        assert_eq!(record.raw_text_preview, "");
        assert!(record.license_plates.is_empty());
    }
}
