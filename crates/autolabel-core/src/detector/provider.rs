//! Detector trait and request/response types.
//!
//! The open-vocabulary detector is an external collaborator. Everything the
//! pipeline needs from it fits in one call: an image and a caption in, aligned
//! boxes and `"phrase(confidence)"` strings out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::caption::{Caption, SpanTable};
use crate::config::{DetectorBackend, DetectorConfig};
use crate::error::PipelineError;
use crate::types::BoxCxCyWh;

use super::http::HttpDetector;
use super::sidecar::SidecarDetector;

/// Per-run detection parameters, shared by every image.
#[derive(Debug, Clone, Serialize)]
pub struct DetectParams {
    /// Normalized caption (e.g., "red car.blue car.")
    pub caption: String,

    pub box_threshold: f32,

    pub text_threshold: f32,

    pub cpu_only: bool,

    /// Word spans per phrase, when the detector should use them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_spans: Option<SpanTable>,
}

impl DetectParams {
    /// Build parameters for `caption` from detector settings.
    pub fn new(caption: &Caption, config: &DetectorConfig, use_token_spans: bool) -> Self {
        Self {
            caption: caption.as_str().to_string(),
            box_threshold: config.box_threshold,
            text_threshold: config.text_threshold,
            cpu_only: config.cpu_only,
            token_spans: use_token_spans.then(|| caption.spans().clone()),
        }
    }
}

/// Raw detector output for one image.
///
/// `boxes[i]` belongs to `phrases[i]`. Boxes are normalized center-form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorOutput {
    pub boxes: Vec<BoxCxCyWh>,
    pub phrases: Vec<String>,
}

/// Trait that all detector collaborators implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Box<dyn Detector>` for dynamic dispatch).
#[async_trait]
pub trait Detector: Send + Sync {
    /// Detector name for logging (e.g., "http", "sidecar").
    fn name(&self) -> &str;

    /// Run detection on one image.
    async fn detect(
        &self,
        image: &Path,
        params: &DetectParams,
    ) -> Result<DetectorOutput, PipelineError>;
}

/// Creates detectors from configuration.
pub struct DetectorFactory;

impl DetectorFactory {
    pub fn create(config: &DetectorConfig) -> Box<dyn Detector> {
        match config.backend {
            DetectorBackend::Http => Box::new(HttpDetector::new(
                &config.endpoint,
                &config.weights_path,
                &config.config_path,
            )),
            DetectorBackend::Sidecar => Box::new(SidecarDetector::new(&config.sidecar_extension)),
        }
    }
}
