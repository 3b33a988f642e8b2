//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Class prompt settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Class names; each becomes one phrase of the caption
    pub class_list: Vec<String>,

    /// Pass the caption's word spans to the detector as a phrase hint
    pub use_token_spans: bool,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            class_list: vec![
                "red car".to_string(),
                "blue car".to_string(),
                "white car".to_string(),
                "yellow car".to_string(),
                "black car".to_string(),
            ],
            use_token_spans: true,
        }
    }
}

/// Which detector collaborator to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorBackend {
    /// Remote detection server over HTTP
    #[default]
    Http,
    /// Precomputed output stored next to each image
    Sidecar,
}

/// Detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub backend: DetectorBackend,

    /// Detection server base URL (http backend)
    pub endpoint: String,

    /// Minimum box score for a prediction to be kept
    pub box_threshold: f32,

    /// Minimum token score for a word to appear in the predicted phrase
    pub text_threshold: f32,

    /// Model weights, forwarded to the detection server
    pub weights_path: PathBuf,

    /// Model config file, forwarded to the detection server
    pub config_path: PathBuf,

    /// Ask the server to run inference on CPU only
    pub cpu_only: bool,

    /// Extension appended to an image path to find its sidecar file
    pub sidecar_extension: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            backend: DetectorBackend::Http,
            endpoint: "http://localhost:8000".to_string(),
            box_threshold: 0.3,
            text_threshold: 0.25,
            weights_path: PathBuf::from("./weights/groundingdino_swint_ogc.pth"),
            config_path: PathBuf::from("groundingdino/config/GroundingDINO_SwinT_OGC.py"),
            cpu_only: true,
            sidecar_extension: "json".to_string(),
        }
    }
}

/// Image source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Directory scanned recursively for images
    pub image_directory: PathBuf,

    /// Label only this many randomly chosen images
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsample: Option<usize>,

    /// Seed for subsampling, so reruns pick the same images
    pub seed: u64,

    /// Supported input formats
    pub supported_formats: Vec<String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            image_directory: PathBuf::from("images"),
            subsample: None,
            seed: 51,
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
                "bmp".to_string(),
                "tiff".to_string(),
            ],
        }
    }
}

/// Dataset export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Write a COCO detection dataset after labeling
    pub export_dataset: bool,

    /// Directory for the COCO dataset
    pub dir: PathBuf,

    /// Copy images into `<dir>/data/`; when false only `labels.json` is written
    pub copy_media: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            export_dataset: true,
            dir: PathBuf::from("coco_dataset"),
            copy_media: true,
        }
    }
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of images labeled concurrently
    pub parallel_workers: usize,

    /// Abort the run on the first failed image instead of skipping it
    pub fail_fast: bool,

    /// Reject detector output whose box and phrase counts differ.
    /// When false, the longer side is truncated to the shorter one.
    pub strict_alignment: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            fail_fast: false,
            strict_alignment: true,
        }
    }
}

/// Retry settings for transient detector failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Max retry attempts for transient failures
    pub retry_attempts: u32,

    /// Delay between retries in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

/// Resource limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Per-image detector timeout in milliseconds
    pub detect_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            detect_timeout_ms: 60000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
