//! Transport permit extraction: line normalization, block segmentation,
//! field rules, axle tables and routes.

pub mod axles;
pub mod lines;
pub mod numbers;
mod parser;
pub mod routes;
pub mod rules;
pub mod segmenter;

pub use axles::AxleTable;
pub use lines::LineStream;
pub use numbers::{normalize_decimal, parse_decimal};
pub use parser::{PermitExtractor, PermitParser};
pub use routes::{RouteInfo, RouteParser};
pub use rules::{FieldRule, RuleSet, Scope, TextView};
pub use segmenter::{BlockKind, BlockSegmenter, ContentBlock, Segments};
