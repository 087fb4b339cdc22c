//! Road and kilometre-marker extraction from the route block.

use rust_decimal::Decimal;

use super::rules::patterns::{KM_MARKER, ROAD};
use crate::models::permit::RouteSegment;

/// Segments with km markers, plus every road mentioned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteInfo {
    pub segments: Vec<RouteSegment>,
    pub roads: Vec<String>,
}

/// Finds `ROAD ... km+m` pairs within a bounded lookahead window.
#[derive(Debug, Clone)]
pub struct RouteParser {
    lookahead: usize,
}

impl RouteParser {
    pub fn new(lookahead: usize) -> Self {
        Self { lookahead }
    }

    pub fn parse(&self, text: &str) -> RouteInfo {
        let roads: Vec<_> = ROAD.captures_iter(text).filter_map(|c| c.get(1)).collect();
        let mut info = RouteInfo::default();

        for (i, road) in roads.iter().enumerate() {
            let code = road.as_str().to_string();

            // The window ends at the lookahead bound or the next road token
            let mut window_end = floor_char_boundary(text, road.end() + self.lookahead);
            if let Some(next) = roads.get(i + 1) {
                window_end = window_end.min(next.start());
            }

            if let Some(km) = KM_MARKER
                .captures(&text[road.end()..window_end])
                .and_then(|caps| km_value(&caps[1], &caps[2]))
            {
                info.segments.push(RouteSegment {
                    road: code.clone(),
                    km,
                });
            }

            if !info.roads.contains(&code) {
                info.roads.push(code);
            }
        }

        info
    }
}

impl Default for RouteParser {
    fn default() -> Self {
        Self::new(48)
    }
}

/// `12` + `500` -> `12.500`.
fn km_value(km: &str, meters: &str) -> Option<Decimal> {
    let km: i64 = km.parse().ok()?;
    let meters: i64 = meters.parse().ok()?;
    Some(Decimal::from(km) + Decimal::new(meters, 3))
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    (0..=index).rev().find(|i| text.is_char_boundary(*i)).unwrap_or(0)
}
