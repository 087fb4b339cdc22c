//! Axle table parsing.

use tracing::debug;

use super::numbers::parse_decimal;
use super::rules::patterns::{AXLE_COUNT_PHRASE, AXLE_GROUP, AXLE_ROW};
use crate::models::permit::{AxleCountSource, AxleGroup, AxleRow, AxleType};

/// Rows and group totals parsed from the axle block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxleTable {
    pub rows: Vec<AxleRow>,
    pub groups: Vec<AxleGroup>,
}

impl AxleTable {
    /// Parse every line of the axle block. Lines matching neither grammar are skipped.
    pub fn parse(lines: &[String]) -> Self {
        let mut table = Self::default();

        for line in lines {
            if let Some(row) = parse_row(line) {
                table.rows.push(row);
            } else if let Some(group) = parse_group(line) {
                if table.group(&group.group_code).is_none() {
                    table.groups.push(group);
                }
            }
        }

        debug!(
            "Axle table: {} rows, {} groups from {} lines",
            table.rows.len(),
            table.groups.len(),
            lines.len()
        );
        table
    }

    pub fn group(&self, code: &str) -> Option<&AxleGroup> {
        self.groups.iter().find(|g| g.group_code == code)
    }

    /// Axle count: parsed rows first, free-text phrase only when no row parsed.
    pub fn axle_count(&self, document: &str) -> (usize, AxleCountSource) {
        if !self.rows.is_empty() {
            return (self.rows.len(), AxleCountSource::Rows);
        }
        match axle_count_phrase(document) {
            Some(n) => (n, AxleCountSource::Text),
            None => (0, AxleCountSource::None),
        }
    }
}

/// `index type [driven] load`, e.g. `2 V X 2,780`.
pub fn parse_row(line: &str) -> Option<AxleRow> {
    let caps = AXLE_ROW.captures(line)?;
    Some(AxleRow {
        index: caps[1].parse().ok()?,
        axle_type: AxleType::from_code(&caps[2].to_uppercase())?,
        driven: caps.get(3).is_some(),
        load_tons: parse_decimal(&caps[4])?,
    })
}

/// `CODE load [col2 [col3]]`, e.g. `VV 19,000 19,000 19,000`.
pub fn parse_group(line: &str) -> Option<AxleGroup> {
    let caps = AXLE_GROUP.captures(line)?;
    Some(AxleGroup {
        group_code: caps[1].to_string(),
        load_tons: parse_decimal(&caps[2])?,
        further: [3, 4]
            .into_iter()
            .filter_map(|i| caps.get(i))
            .filter_map(|m| parse_decimal(m.as_str()))
            .collect(),
    })
}

fn axle_count_phrase(text: &str) -> Option<usize> {
    let caps = AXLE_COUNT_PHRASE.captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
        .filter(|n| *n > 0)
}
