//! Replays precomputed detector output stored next to each image.
//!
//! For `street/0001.jpg` the output is read from `street/0001.jpg.json`,
//! in the same `{"boxes": [...], "phrases": [...]}` shape the detection server
//! returns. Useful when inference ran elsewhere (a GPU box, a batch job).

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::provider::{DetectParams, Detector, DetectorOutput};
use crate::error::PipelineError;

/// Detector that reads output from sidecar files.
pub struct SidecarDetector {
    extension: String,
}

impl SidecarDetector {
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Path of the sidecar file for `image`.
    pub fn sidecar_path(&self, image: &Path) -> PathBuf {
        let mut path = image.as_os_str().to_owned();
        path.push(".");
        path.push(&self.extension);
        PathBuf::from(path)
    }
}

#[async_trait]
impl Detector for SidecarDetector {
    fn name(&self) -> &str {
        "sidecar"
    }

    async fn detect(
        &self,
        image: &Path,
        _params: &DetectParams,
    ) -> Result<DetectorOutput, PipelineError> {
        let path = self.sidecar_path(image);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::FileNotFound(path.clone())
            } else {
                PipelineError::Detector {
                    path: image.to_path_buf(),
                    message: format!("Failed to read {:?}: {e}", path),
                    status_code: None,
                }
            }
        })?;

        serde_json::from_str(&content).map_err(|e| PipelineError::Detector {
            path: image.to_path_buf(),
            message: format!("Invalid sidecar {:?}: {e}", path),
            status_code: None,
        })
    }
}
