//! The `autolabel run` command: label images and export the dataset.

mod batch;
mod setup;
pub mod types;

pub use types::OutputFormat;

use autolabel_core::{Caption, Config, FileDiscovery, Labeler};
use clap::Args;
use std::path::PathBuf;

use batch::run_batch;
use setup::setup_run;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Image directory (overrides [dataset] image_directory)
    #[arg(short, long)]
    pub images: Option<PathBuf>,

    /// Write labeled samples to this file ("-" for stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Sample output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Number of images labeled concurrently
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Label a random subset of this many images
    #[arg(long)]
    pub subsample: Option<usize>,

    /// Skip the COCO dataset export
    #[arg(long)]
    pub no_export: bool,

    /// COCO export directory (overrides [export] dir)
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Export only labels.json, without copying images
    #[arg(long)]
    pub labels_only: bool,

    /// Don't send word spans to the detector
    #[arg(long)]
    pub no_spans: bool,

    /// Abort on the first failed image
    #[arg(long)]
    pub fail_fast: bool,
}

/// Values match the clap defaults above.
impl Default for RunArgs {
    fn default() -> Self {
        Self {
            images: None,
            output: None,
            format: OutputFormat::Json,
            parallel: None,
            subsample: None,
            no_export: false,
            export_dir: None,
            labels_only: false,
            no_spans: false,
            fail_fast: false,
        }
    }
}

/// Everything a run needs, assembled by setup_run().
pub(crate) struct RunContext {
    pub caption: Caption,
    pub labeler: Labeler,
    pub discovery: FileDiscovery,
    pub config: Config,
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("caption", &self.caption)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Execute the run command.
pub async fn execute(args: RunArgs, config: Config) -> anyhow::Result<()> {
    let ctx = setup_run(&args, config)?;

    let images = ctx.config.image_directory();
    let files = ctx.discovery.discover_sampled(&images);
    if files.is_empty() {
        tracing::warn!("No supported image files found at {:?}", images);
        return Ok(());
    }
    tracing::info!("Found {} image(s) to label", files.len());

    run_batch(ctx, &args, files).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolabel_core::config::DetectorBackend;
    use autolabel_core::dataset::CocoDataset;

    fn write_image(dir: &std::path::Path, name: &str, sidecar: &str) {
        image::RgbImage::new(100, 50).save(dir.join(name)).unwrap();
        std::fs::write(dir.join(format!("{name}.json")), sidecar).unwrap();
    }

    fn sidecar_config(images: &std::path::Path, export: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.prompt.class_list = vec!["car".to_string(), "dog".to_string()];
        config.detector.backend = DetectorBackend::Sidecar;
        config.dataset.image_directory = images.to_path_buf();
        config.export.dir = export.to_path_buf();
        config.pipeline.retry_delay_ms = 1;
        config
    }

    #[test]
    fn run_args_default_format_is_json() {
        let args = RunArgs::default();
        assert!(matches!(args.format, OutputFormat::Json));
        assert!(args.output.is_none());
        assert!(!args.no_export);
    }

    #[tokio::test]
    async fn test_run_with_sidecar_detector_exports_coco() {
        let images = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_image(
            images.path(),
            "a.png",
            r#"{"boxes": [[0.5, 0.5, 0.2, 0.4]], "phrases": ["car(0.9)"]}"#,
        );
        write_image(
            images.path(),
            "b.png",
            r#"{"boxes": [[0.25, 0.25, 0.1, 0.1], [0.5, 0.5, 0.5, 0.5]], "phrases": ["dog(0.7)", "car(0.4)"]}"#,
        );

        let export = out.path().join("coco");
        let samples_path = out.path().join("samples.jsonl");
        let args = RunArgs {
            output: Some(samples_path.clone()),
            format: OutputFormat::Jsonl,
            ..Default::default()
        };
        execute(args, sidecar_config(images.path(), &export))
            .await
            .unwrap();

        let samples = std::fs::read_to_string(&samples_path).unwrap();
        assert_eq!(samples.lines().count(), 2);

        let coco: CocoDataset =
            serde_json::from_str(&std::fs::read_to_string(export.join("labels.json")).unwrap())
                .unwrap();
        assert_eq!(coco.images.len(), 2);
        assert_eq!(coco.annotations.len(), 3);
        assert_eq!(coco.categories[0].name, "car");
        assert_eq!(coco.annotations[0].bbox, [40.0, 15.0, 20.0, 20.0]);
        assert!(export.join("data/a.png").exists());
    }

    #[tokio::test]
    async fn test_run_labels_only_skips_media() {
        let images = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_image(
            images.path(),
            "a.png",
            r#"{"boxes": [[0.5, 0.5, 0.2, 0.4]], "phrases": ["car(0.9)"]}"#,
        );

        let export = out.path().join("coco");
        let args = RunArgs {
            labels_only: true,
            ..Default::default()
        };
        execute(args, sidecar_config(images.path(), &export))
            .await
            .unwrap();

        assert!(export.join("labels.json").exists());
        assert!(!export.join("data").exists());
    }

    #[tokio::test]
    async fn test_run_skips_failed_images_by_default() {
        let images = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_image(images.path(), "a.png", r#"{"boxes": [], "phrases": []}"#);
        write_image(
            images.path(),
            "b.png",
            r#"{"boxes": [[0.5, 0.5, 0.2, 0.4]], "phrases": ["car"]}"#,
        );

        let export = out.path().join("coco");
        execute(RunArgs::default(), sidecar_config(images.path(), &export))
            .await
            .unwrap();

        let coco: CocoDataset =
            serde_json::from_str(&std::fs::read_to_string(export.join("labels.json")).unwrap())
                .unwrap();
        assert_eq!(coco.images.len(), 1);
    }

    #[tokio::test]
    async fn test_run_fail_fast_aborts_without_export() {
        let images = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_image(
            images.path(),
            "a.png",
            r#"{"boxes": [[0.5, 0.5, 0.2, 0.4]], "phrases": []}"#,
        );

        let export = out.path().join("coco");
        let args = RunArgs {
            fail_fast: true,
            ..Default::default()
        };
        let err = execute(args, sidecar_config(images.path(), &export))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("a.png"));
        assert!(!export.exists());
    }
}
