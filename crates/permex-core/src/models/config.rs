//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PermexError, Result};

/// Main configuration for the permex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PermexConfig {
    /// Text acquisition configuration.
    pub acquisition: AcquisitionConfig,

    /// OCR fallback configuration.
    pub ocr: OcrConfig,

    /// Block segmentation keywords and bounds.
    pub segmentation: SegmentationConfig,

    /// Field and table extraction configuration.
    pub extraction: ExtractionConfig,

    /// Confirmed-record store configuration.
    pub store: StoreConfig,
}

/// Text acquisition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Native text shorter than this (in characters) triggers OCR.
    pub min_text_length: usize,

    /// DPI used when a page has to be rasterised for OCR.
    pub render_dpi: u32,

    /// Maximum pages to read (0 = unlimited).
    pub max_pages: usize,

    /// Allow the OCR fallback at all.
    pub enable_ocr: bool,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            min_text_length: 100,
            render_dpi: 300,
            max_pages: 0,
            enable_ocr: true,
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Expected document language (ISO 639-1).
    pub language: String,

    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Keep `[UNK]` tokens in recognised text instead of blanking them.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "hu".to_string(),
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            keep_unk: false,
        }
    }
}

impl OcrConfig {
    /// Recognition model and dictionary file names for the configured language.
    pub fn recognition_files(&self) -> (String, String) {
        let script = match self.language.to_lowercase().as_str() {
            "ru" | "uk" | "bg" | "sr" => "cyrillic",
            "el" => "greek",
            _ => "latin",
        };
        (format!("{script}_rec.onnx"), format!("{script}_dict.txt"))
    }

    /// Full paths of the detection model, recognition model and dictionary.
    pub fn model_paths(&self) -> (PathBuf, PathBuf, PathBuf) {
        let (rec, dict) = self.recognition_files();
        (
            self.model_dir.join(&self.detection_model),
            self.model_dir.join(rec),
            self.model_dir.join(dict),
        )
    }
}

/// Keywords and line bounds for the block segmenter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Maximum lines in the header block.
    pub header_max_lines: usize,

    /// Maximum lines in the route block.
    pub route_max_lines: usize,

    /// Maximum lines in the axle block.
    pub axle_max_lines: usize,

    /// Lowercase keywords that open the route block.
    pub route_start: Vec<String>,

    /// Lowercase keywords that close the route block.
    pub route_stop: Vec<String>,

    /// Lowercase keywords that open the axle block (and end the header).
    pub axle_start: Vec<String>,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            header_max_lines: 150,
            route_max_lines: 50,
            axle_max_lines: 120,
            route_start: vec!["útvonal".to_string(), "utvonal".to_string()],
            route_stop: vec![
                "tengelyadat".to_string(),
                "tengely-".to_string(),
                "megjegyzés".to_string(),
            ],
            axle_start: vec!["tengelyadat".to_string(), "tengely-".to_string()],
        }
    }
}

/// Field and table extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Characters of normalized text echoed back in `raw_text_preview`.
    pub preview_chars: usize,

    /// How far (in characters) after a road token a km marker may appear.
    pub route_lookahead: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            preview_chars: 500,
            route_lookahead: 48,
        }
    }
}

/// Confirmed-record store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON-lines file holding confirmed records.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("confirmed_records.jsonl"),
        }
    }
}

impl PermexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| PermexError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| PermexError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: PermexConfig =
            serde_json::from_str(r#"{"acquisition": {"min_text_length": 40}}"#).unwrap();
        assert_eq!(config.acquisition.min_text_length, 40);
        assert_eq!(config.acquisition.render_dpi, 300);
        assert_eq!(config.segmentation.route_max_lines, 50);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = PermexConfig::default();
        config.ocr.language = "de".to_string();
        config.save(&path).unwrap();

        let loaded = PermexConfig::from_file(&path).unwrap();
        assert_eq!(loaded.ocr.language, "de");
        assert_eq!(loaded.store.path, PathBuf::from("confirmed_records.jsonl"));
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(PermexConfig::from_file(&path), Err(PermexError::Config(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = PermexConfig::from_file(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(PermexError::Io(_))));
    }

    #[test]
    fn test_recognition_files_by_language() {
        let mut ocr = OcrConfig::default();
        assert_eq!(
            ocr.recognition_files(),
            ("latin_rec.onnx".to_string(), "latin_dict.txt".to_string())
        );

        ocr.language = "uk".to_string();
        assert_eq!(ocr.recognition_files().0, "cyrillic_rec.onnx");
    }
}
