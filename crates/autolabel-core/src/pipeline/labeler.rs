//! Labeling orchestration: detector call, assembly, and batching.
//!
//! For each image the labeler reads the image size, asks the detector for
//! boxes and phrase strings, and assembles them into a [`Sample`]. Batches
//! run one tokio task per image, bounded by a semaphore.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use crate::caption::Caption;
use crate::config::Config;
use crate::dataset::DiscoveredFile;
use crate::detection::{assemble, assemble_lenient};
use crate::detector::{retry, DetectParams, Detector, DetectorFactory, DetectorOutput};
use crate::error::{PipelineError, PipelineResult, Result};
use crate::types::{LabelingStats, Sample};

/// Options for controlling labeling behavior.
#[derive(Debug, Clone)]
pub struct LabelOptions {
    /// Maximum images labeled concurrently
    pub parallel: usize,
    /// Per-image detector timeout in milliseconds
    pub timeout_ms: u64,
    /// Maximum retries per image for transient detector failures
    pub retry_attempts: u32,
    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,
    /// Stop starting new images after the first failure
    pub fail_fast: bool,
    /// Fail on box/phrase count mismatch instead of truncating
    pub strict_alignment: bool,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            parallel: 4,
            timeout_ms: 60_000,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            fail_fast: false,
            strict_alignment: true,
        }
    }
}

impl LabelOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            parallel: config.processing.parallel_workers,
            timeout_ms: config.limits.detect_timeout_ms,
            retry_attempts: config.pipeline.retry_attempts,
            retry_delay_ms: config.pipeline.retry_delay_ms,
            fail_fast: config.processing.fail_fast,
            strict_alignment: config.processing.strict_alignment,
        }
    }
}

/// Result of labeling a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub samples: Vec<Sample>,
    pub failures: Vec<(PathBuf, PipelineError)>,
    /// Images never started because an earlier one failed under fail-fast
    pub not_started: usize,
    pub stats: LabelingStats,
}

/// Labels images with a detector and a fixed caption.
pub struct Labeler {
    detector: Arc<dyn Detector>,
    params: Arc<DetectParams>,
    options: LabelOptions,
}

impl Labeler {
    pub fn new(detector: Box<dyn Detector>, params: DetectParams, options: LabelOptions) -> Self {
        Self {
            detector: Arc::from(detector),
            params: Arc::new(params),
            options,
        }
    }

    /// Build a labeler from configuration: caption from the class list,
    /// detector from the backend setting.
    pub fn from_config(config: &Config) -> Result<Self> {
        let caption = config.caption()?;
        Ok(Self::with_caption(config, &caption))
    }

    /// Build a labeler for an explicit caption.
    pub fn with_caption(config: &Config, caption: &Caption) -> Self {
        let params = DetectParams::new(caption, &config.detector, config.prompt.use_token_spans);
        let detector = DetectorFactory::create(&config.detector);
        tracing::debug!(
            "Labeler using {} detector, caption {:?}",
            detector.name(),
            params.caption
        );
        Self::new(detector, params, LabelOptions::from_config(config))
    }

    pub fn params(&self) -> &DetectParams {
        &self.params
    }

    /// Label a single image.
    pub async fn label(&self, path: &Path) -> PipelineResult<Sample> {
        label_single(&self.detector, &self.params, &self.options, path).await
    }

    /// Label a batch of images concurrently.
    ///
    /// `on_result` is called as each image finishes (in completion order), so
    /// the caller can drive a progress bar. The returned outcome is in input
    /// order.
    pub async fn label_batch<F>(&self, files: &[DiscoveredFile], on_result: F) -> BatchOutcome
    where
        F: Fn(&Path, &PipelineResult<Sample>) + Send + Sync + 'static,
    {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.options.parallel.max(1)));
        let on_result = Arc::new(on_result);
        let stop = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::with_capacity(files.len());

        for file in files {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                tracing::warn!("Labeling semaphore closed unexpectedly, stopping batch");
                break;
            };
            if stop.load(Ordering::SeqCst) {
                break;
            }

            let detector = self.detector.clone();
            let params = self.params.clone();
            let options = self.options.clone();
            let on_result = on_result.clone();
            let stop = stop.clone();
            let path = file.path.clone();

            handles.push(tokio::spawn(async move {
                let result = label_single(&detector, &params, &options, &path).await;
                if result.is_err() && options.fail_fast {
                    stop.store(true, Ordering::SeqCst);
                }
                drop(permit);
                on_result(&path, &result);
                (path, result)
            }));
        }

        let mut outcome = BatchOutcome {
            not_started: files.len() - handles.len(),
            ..Default::default()
        };

        for (handle, file) in futures_util::future::join_all(handles).await.into_iter().zip(files) {
            match handle {
                Ok((_, Ok(sample))) => {
                    outcome.stats.succeeded += 1;
                    outcome.stats.detections += sample.detections.len();
                    outcome.samples.push(sample);
                }
                Ok((path, Err(e))) => {
                    outcome.stats.failed += 1;
                    outcome.failures.push((path, e));
                }
                Err(e) => {
                    tracing::error!("Labeling task panicked: {e}");
                    outcome.stats.failed += 1;
                    outcome.failures.push((
                        file.path.clone(),
                        PipelineError::Detector {
                            path: file.path.clone(),
                            message: format!("task panicked: {e}"),
                            status_code: None,
                        },
                    ));
                }
            }
        }

        outcome.stats.total_seconds = start.elapsed().as_secs_f64();
        outcome
    }
}

/// Label one image: measure it, detect with retries, assemble.
async fn label_single(
    detector: &Arc<dyn Detector>,
    params: &DetectParams,
    options: &LabelOptions,
    path: &Path,
) -> PipelineResult<Sample> {
    let start = Instant::now();
    tracing::debug!("Labeling: {:?}", path);

    let (width, height) = image_size(path).await?;
    let output = detect_with_retry(detector, params, options, path).await?;

    let detections = if options.strict_alignment {
        assemble(&output.boxes, &output.phrases)
    } else {
        assemble_lenient(&output.boxes, &output.phrases)
    }
    .map_err(|source| PipelineError::Assemble {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        "Labeled {:?}: {} detections in {:?}",
        path,
        detections.len(),
        start.elapsed()
    );

    Ok(Sample {
        filepath: path.to_path_buf(),
        width,
        height,
        detections,
    })
}

/// Read image dimensions from the file header.
async fn image_size(path: &Path) -> PipelineResult<(u32, u32)> {
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()));
    }
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || image::image_dimensions(&owned))
        .await
        .map_err(|e| PipelineError::Image {
            path: path.to_path_buf(),
            message: format!("Task join error: {e}"),
        })?
        .map_err(|e| PipelineError::Image {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Call the detector under a timeout, retrying transient failures.
async fn detect_with_retry(
    detector: &Arc<dyn Detector>,
    params: &DetectParams,
    options: &LabelOptions,
    path: &Path,
) -> PipelineResult<DetectorOutput> {
    let mut attempt = 0;
    loop {
        let result = match tokio::time::timeout(
            Duration::from_millis(options.timeout_ms),
            detector.detect(path, params),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout {
                path: path.to_path_buf(),
                stage: "detect".to_string(),
                timeout_ms: options.timeout_ms,
            }),
        };

        match result {
            Err(e) if attempt < options.retry_attempts && retry::is_retryable(&e) => {
                let delay = retry::backoff_duration(attempt, options.retry_delay_ms);
                attempt += 1;
                tracing::debug!(
                    "Retry {attempt}/{} for {:?} after {delay:?}: {e}",
                    options.retry_attempts,
                    path
                );
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssembleError;
    use crate::types::BoxCxCyWh;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex;

    /// Detector returning canned output keyed by file name.
    ///
    /// Files without an entry fail with a non-retryable error. The first
    /// `transient_failures` calls fail with HTTP 503.
    struct MockDetector {
        outputs: HashMap<String, DetectorOutput>,
        transient_failures: u32,
        calls: Arc<AtomicU32>,
        delay: Option<Duration>,
    }

    impl MockDetector {
        fn new(outputs: &[(&str, DetectorOutput)]) -> Self {
            Self {
                outputs: outputs
                    .iter()
                    .map(|(name, out)| (name.to_string(), out.clone()))
                    .collect(),
                transient_failures: 0,
                calls: Arc::new(AtomicU32::new(0)),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl Detector for MockDetector {
        fn name(&self) -> &str {
            "mock"
        }

        async fn detect(
            &self,
            image: &Path,
            _params: &DetectParams,
        ) -> std::result::Result<DetectorOutput, PipelineError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if call < self.transient_failures {
                return Err(PipelineError::Detector {
                    path: image.to_path_buf(),
                    message: "unavailable".to_string(),
                    status_code: Some(503),
                });
            }
            let name = image.file_name().unwrap().to_string_lossy().to_string();
            self.outputs
                .get(&name)
                .cloned()
                .ok_or_else(|| PipelineError::Detector {
                    path: image.to_path_buf(),
                    message: "no output".to_string(),
                    status_code: Some(400),
                })
        }
    }

    fn output(boxes: &[[f32; 4]], phrases: &[&str]) -> DetectorOutput {
        DetectorOutput {
            boxes: boxes.iter().copied().map(BoxCxCyWh::from).collect(),
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn params() -> DetectParams {
        DetectParams {
            caption: "car.dog.".to_string(),
            box_threshold: 0.3,
            text_threshold: 0.25,
            cpu_only: true,
            token_spans: None,
        }
    }

    fn fast_options() -> LabelOptions {
        LabelOptions {
            retry_delay_ms: 1,
            ..Default::default()
        }
    }

    fn write_images(dir: &Path, names: &[&str]) -> Vec<DiscoveredFile> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                image::RgbImage::new(8, 4).save(&path).unwrap();
                DiscoveredFile { path, size: 0 }
            })
            .collect()
    }

    #[tokio::test]
    async fn test_label_single_image() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_images(dir.path(), &["a.png"]);
        let detector = MockDetector::new(&[("a.png", output(&[[0.5, 0.5, 0.2, 0.4]], &["car(0.9)"]))]);

        let labeler = Labeler::new(Box::new(detector), params(), fast_options());
        let sample = labeler.label(&files[0].path).await.unwrap();

        assert_eq!((sample.width, sample.height), (8, 4));
        assert_eq!(sample.detections.len(), 1);
        assert_eq!(sample.detections[0].label, "car");
        assert!((sample.detections[0].bounding_box.x - 0.4).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_missing_image_fails_before_detection() {
        let detector = MockDetector::new(&[]);
        let calls = detector.calls.clone();
        let labeler = Labeler::new(Box::new(detector), params(), fast_options());

        let err = labeler.label(Path::new("/nonexistent/a.png")).await.unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_output_fails_image() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_images(dir.path(), &["a.png"]);
        let detector = MockDetector::new(&[("a.png", output(&[[0.5, 0.5, 0.2, 0.4]], &["car"]))]);

        let labeler = Labeler::new(Box::new(detector), params(), fast_options());
        let err = labeler.label(&files[0].path).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Assemble {
                source: AssembleError::Decode { index: 0, .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_alignment_policy() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_images(dir.path(), &["a.png"]);
        let mismatched = output(&[[0.5, 0.5, 0.2, 0.4], [0.1, 0.1, 0.1, 0.1]], &["car(0.9)"]);

        let strict = Labeler::new(
            Box::new(MockDetector::new(&[("a.png", mismatched.clone())])),
            params(),
            fast_options(),
        );
        let err = strict.label(&files[0].path).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Assemble {
                source: AssembleError::LengthMismatch { boxes: 2, phrases: 1 },
                ..
            }
        ));

        let lenient = Labeler::new(
            Box::new(MockDetector::new(&[("a.png", mismatched)])),
            params(),
            LabelOptions {
                strict_alignment: false,
                ..fast_options()
            },
        );
        let sample = lenient.label(&files[0].path).await.unwrap();
        assert_eq!(sample.detections.len(), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_images(dir.path(), &["a.png"]);
        let mut detector = MockDetector::new(&[("a.png", output(&[], &[]))]);
        detector.transient_failures = 2;
        let calls = detector.calls.clone();

        let labeler = Labeler::new(Box::new(detector), params(), fast_options());
        let sample = labeler.label(&files[0].path).await.unwrap();

        assert!(sample.detections.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_images(dir.path(), &["a.png"]);
        let mut detector = MockDetector::new(&[("a.png", output(&[], &[]))]);
        detector.transient_failures = 10;
        let calls = detector.calls.clone();

        let options = LabelOptions {
            retry_attempts: 2,
            ..fast_options()
        };
        let labeler = Labeler::new(Box::new(detector), params(), options);
        let err = labeler.label(&files[0].path).await.unwrap_err();

        assert!(matches!(err, PipelineError::Detector { status_code: Some(503), .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_detector_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_images(dir.path(), &["a.png"]);
        let mut detector = MockDetector::new(&[("a.png", output(&[], &[]))]);
        detector.delay = Some(Duration::from_millis(200));

        let options = LabelOptions {
            timeout_ms: 10,
            retry_attempts: 0,
            ..fast_options()
        };
        let labeler = Labeler::new(Box::new(detector), params(), options);
        let err = labeler.label(&files[0].path).await.unwrap_err();
        assert!(matches!(err, PipelineError::Timeout { timeout_ms: 10, .. }));
    }

    #[tokio::test]
    async fn test_batch_keeps_input_order_and_skips_failures() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_images(dir.path(), &["a.png", "b.png", "c.png", "d.png"]);
        let detector = MockDetector::new(&[
            ("a.png", output(&[[0.5, 0.5, 0.2, 0.2]], &["car(0.9)"])),
            ("b.png", output(&[], &[])),
            // c.png has no output and fails
            (
                "d.png",
                output(&[[0.5, 0.5, 0.2, 0.2], [0.3, 0.3, 0.1, 0.1]], &["dog(0.8)", "car(0.4)"]),
            ),
        ]);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_cb = seen.clone();
        let labeler = Labeler::new(Box::new(detector), params(), fast_options());
        let outcome = labeler
            .label_batch(&files, move |path, result| {
                seen_cb
                    .lock()
                    .unwrap()
                    .push((path.to_path_buf(), result.is_ok()));
            })
            .await;

        let names: Vec<String> = outcome
            .samples
            .iter()
            .map(|s| s.filepath.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png", "d.png"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, files[2].path);
        assert_eq!(outcome.not_started, 0);
        assert_eq!(outcome.stats.succeeded, 3);
        assert_eq!(outcome.stats.failed, 1);
        assert_eq!(outcome.stats.detections, 3);
        assert_eq!(seen.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_batch_fail_fast_stops_new_work() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_images(dir.path(), &["a.png", "b.png", "c.png"]);
        // a.png fails; sequential processing means nothing after it starts
        let detector = MockDetector::new(&[("b.png", output(&[], &[])), ("c.png", output(&[], &[]))]);

        let options = LabelOptions {
            parallel: 1,
            fail_fast: true,
            ..fast_options()
        };
        let labeler = Labeler::new(Box::new(detector), params(), options);
        let outcome = labeler.label_batch(&files, |_, _| {}).await;

        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.samples.is_empty());
        assert_eq!(outcome.not_started, 2);
    }
}
