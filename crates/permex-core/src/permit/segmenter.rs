//! Keyword-driven block segmentation.
//!
//! Each block kind is carved out by its own pass over the full line stream, so
//! blocks may overlap. A pass is a small state machine:
//!
//! ```text
//! Searching --start keyword--> Capturing --stop keyword / line bound--> Done
//! ```
//!
//! The trigger line is part of the block; a stop line is not.

use serde::Serialize;
use tracing::debug;

use crate::models::config::SegmentationConfig;

/// Which window of the document a block covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Header,
    Route,
    Axle,
}

/// A labelled window of source lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentBlock {
    pub kind: BlockKind,
    pub lines: Vec<String>,
}

impl ContentBlock {
    /// Lines joined with `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Start/stop conditions and line bound for one block kind.
#[derive(Debug, Clone)]
pub struct BlockSpec {
    kind: BlockKind,
    /// Lowercase start keywords; empty means capture from the first line.
    start: Vec<String>,
    /// Lowercase stop keywords, never checked on the trigger line.
    stop: Vec<String>,
    max_lines: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Searching,
    Capturing { taken: usize },
    Done,
}

impl BlockSpec {
    pub fn new(kind: BlockKind, start: &[String], stop: &[String], max_lines: usize) -> Self {
        Self {
            kind,
            start: start.iter().map(|k| k.to_lowercase()).collect(),
            stop: stop.iter().map(|k| k.to_lowercase()).collect(),
            max_lines,
        }
    }

    fn starts(&self, line: &str) -> bool {
        self.start.is_empty() || contains_any(line, &self.start)
    }

    fn stops(&self, line: &str) -> bool {
        contains_any(line, &self.stop)
    }

    /// Advance the scan by one line. Returns the next state and whether the
    /// line belongs to the block.
    fn step(&self, state: ScanState, line: &str) -> (ScanState, bool) {
        match state {
            ScanState::Searching if self.starts(line) => (self.after_take(0), true),
            ScanState::Searching => (ScanState::Searching, false),
            ScanState::Capturing { .. } if self.stops(line) => (ScanState::Done, false),
            ScanState::Capturing { taken } => (self.after_take(taken), true),
            ScanState::Done => (ScanState::Done, false),
        }
    }

    fn after_take(&self, taken: usize) -> ScanState {
        let taken = taken + 1;
        if taken >= self.max_lines {
            ScanState::Done
        } else {
            ScanState::Capturing { taken }
        }
    }

    /// Run the scan over a full line stream.
    pub fn scan(&self, lines: &[String]) -> ContentBlock {
        let mut block = ContentBlock {
            kind: self.kind,
            lines: Vec::new(),
        };
        if self.max_lines == 0 {
            return block;
        }

        let mut state = ScanState::Searching;
        for line in lines {
            let (next, take) = self.step(state, line);
            if take {
                block.lines.push(line.clone());
            }
            state = next;
            if state == ScanState::Done {
                break;
            }
        }

        debug!("{:?} block: {} lines", self.kind, block.lines.len());
        block
    }
}

fn contains_any(line: &str, keywords: &[String]) -> bool {
    let lower = line.to_lowercase();
    keywords.iter().any(|k| lower.contains(k.as_str()))
}

/// The three blocks of a permit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segments {
    pub header: ContentBlock,
    pub route: ContentBlock,
    pub axle: ContentBlock,
}

/// Segmenter holding one spec per block kind.
#[derive(Debug, Clone)]
pub struct BlockSegmenter {
    header: BlockSpec,
    route: BlockSpec,
    axle: BlockSpec,
}

impl BlockSegmenter {
    pub fn new(config: &SegmentationConfig) -> Self {
        Self {
            header: BlockSpec::new(
                BlockKind::Header,
                &[],
                &config.axle_start,
                config.header_max_lines,
            ),
            route: BlockSpec::new(
                BlockKind::Route,
                &config.route_start,
                &config.route_stop,
                config.route_max_lines,
            ),
            axle: BlockSpec::new(BlockKind::Axle, &config.axle_start, &[], config.axle_max_lines),
        }
    }

    pub fn segment(&self, lines: &[String]) -> Segments {
        Segments {
            header: self.header.scan(lines),
            route: self.route.scan(lines),
            axle: self.axle.scan(lines),
        }
    }
}

impl Default for BlockSegmenter {
    fn default() -> Self {
        Self::new(&SegmentationConfig::default())
    }
}
