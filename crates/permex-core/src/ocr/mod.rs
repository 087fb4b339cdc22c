//! OCR fallback for scanned pages.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Turns a rendered page image into text.
pub trait PageRecognizer {
    /// Recognise all text on the page, lines in reading order.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// A recognised text box with its quadrilateral and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4).
    pub bbox: [f32; 8],

    /// Recognised text content.
    pub text: String,

    /// Recognition confidence (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Result of OCR on one page image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    /// Recognised boxes in reading order.
    pub boxes: Vec<TextBox>,

    /// Full text (boxes joined with newlines).
    pub text: String,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

impl OcrResult {
    /// Build a result from unordered boxes.
    pub fn from_boxes(mut boxes: Vec<TextBox>, processing_time_ms: u64, image_size: (u32, u32)) -> Self {
        sort_by_reading_order(&mut boxes);
        let text = boxes
            .iter()
            .map(|b| b.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            boxes,
            text,
            processing_time_ms,
            image_size,
        }
    }
}

/// Top-to-bottom in 20px bands, then left-to-right.
pub fn sort_by_reading_order(boxes: &mut [TextBox]) {
    boxes.sort_by(|a, b| {
        let (ax, ay, _, _) = a.rect();
        let (bx, by, _, _) = b.rect();

        let row_a = (ay / 20.0) as i32;
        let row_b = (by / 20.0) as i32;

        row_a
            .cmp(&row_b)
            .then(ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal))
    });
}

/// Build the recogniser described by `config`, if one is available.
///
/// A missing model or a build without the `native` feature is not an error:
/// acquisition then keeps whatever native text it found.
pub fn create_recognizer(config: &OcrConfig) -> Option<Box<dyn PageRecognizer>> {
    #[cfg(feature = "native")]
    {
        match PureOcrEngine::from_config(config) {
            Ok(engine) => Some(Box::new(engine)),
            Err(e) => {
                tracing::warn!("OCR fallback unavailable: {}", e);
                None
            }
        }
    }

    #[cfg(not(feature = "native"))]
    {
        tracing::debug!(
            "Built without OCR support, ignoring model dir {}",
            config.model_dir.display()
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_box(x: f32, y: f32, text: &str) -> TextBox {
        TextBox {
            bbox: [x, y, x + 50.0, y, x + 50.0, y + 12.0, x, y + 12.0],
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_reading_order() {
        let boxes = vec![
            text_box(200.0, 45.0, "Győr"),
            text_box(10.0, 5.0, "UE-A-12345/2026"),
            text_box(10.0, 42.0, "6. Célállomás"),
            text_box(300.0, 8.0, "2026.01.12"),
        ];

        let result = OcrResult::from_boxes(boxes, 12, (800, 600));
        assert_eq!(result.text, "UE-A-12345/2026\n2026.01.12\n6. Célállomás\nGyőr");
    }

    #[test]
    fn test_blank_boxes_dropped() {
        let result = OcrResult::from_boxes(vec![text_box(0.0, 0.0, "  "), text_box(0.0, 30.0, "VV 19,0")], 1, (10, 10));
        assert_eq!(result.text, "VV 19,0");
        assert_eq!(result.boxes.len(), 2);
    }

    #[test]
    fn test_missing_models_yield_no_recognizer() {
        let config = OcrConfig {
            model_dir: std::path::PathBuf::from("/nonexistent/permex-models"),
            ..Default::default()
        };
        assert!(create_recognizer(&config).is_none());
    }
}
