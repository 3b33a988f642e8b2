//! Detection server client.
//!
//! Sends the image (base64) and detection parameters to a server that hosts
//! the grounding model, and reads back aligned boxes and phrase strings.

use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::provider::{DetectParams, Detector, DetectorOutput};
use crate::error::PipelineError;

/// Detector backed by a remote detection server.
pub struct HttpDetector {
    endpoint: String,
    weights_path: PathBuf,
    config_path: PathBuf,
    client: reqwest::Client,
}

impl HttpDetector {
    pub fn new(endpoint: &str, weights_path: &Path, config_path: &Path) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            weights_path: weights_path.to_path_buf(),
            config_path: config_path.to_path_buf(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self) -> String {
        format!("{}/detect", self.endpoint)
    }
}

/// `POST /detect` request body.
#[derive(Serialize)]
struct DetectRequest<'a> {
    image: String,
    #[serde(flatten)]
    params: &'a DetectParams,
    weights_path: &'a Path,
    config_path: &'a Path,
}

#[async_trait]
impl Detector for HttpDetector {
    fn name(&self) -> &str {
        "http"
    }

    async fn detect(
        &self,
        image: &Path,
        params: &DetectParams,
    ) -> Result<DetectorOutput, PipelineError> {
        let start = Instant::now();
        let detector_error = |message: String, status_code: Option<u16>| PipelineError::Detector {
            path: image.to_path_buf(),
            message,
            status_code,
        };

        let bytes = tokio::fs::read(image).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::FileNotFound(image.to_path_buf())
            } else {
                PipelineError::Image {
                    path: image.to_path_buf(),
                    message: format!("Failed to read image: {e}"),
                }
            }
        })?;

        let body = DetectRequest {
            image: base64::engine::general_purpose::STANDARD.encode(&bytes),
            params,
            weights_path: &self.weights_path,
            config_path: &self.config_path,
        };

        let resp = self
            .client
            .post(self.url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() {
                    "timed out"
                } else if e.is_connect() {
                    "failed to connect"
                } else {
                    "failed"
                };
                detector_error(format!("Detection request {kind}: {e}"), None)
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(detector_error(
                format!("Detection server HTTP {status}: {text}"),
                Some(status.as_u16()),
            ));
        }

        let output: DetectorOutput = resp.json().await.map_err(|e| {
            detector_error(format!("Failed to parse detection response: {e}"), None)
        })?;

        tracing::trace!(
            "Detection server returned {} boxes for {:?} in {:?}",
            output.boxes.len(),
            image,
            start.elapsed()
        );
        Ok(output)
    }
}
