//! Configuration validation with range checks.

use crate::caption::Caption;
use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(e) = Caption::from_classes(&self.prompt.class_list) {
            return Err(ConfigError::ValidationError(format!("prompt.class_list: {e}")));
        }
        if !(0.0..=1.0).contains(&self.detector.box_threshold) {
            return Err(ConfigError::ValidationError(
                "detector.box_threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.detector.text_threshold) {
            return Err(ConfigError::ValidationError(
                "detector.text_threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if self.dataset.subsample == Some(0) {
            return Err(ConfigError::ValidationError(
                "dataset.subsample must be > 0 when set".into(),
            ));
        }
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        if self.limits.detect_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.detect_timeout_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}
