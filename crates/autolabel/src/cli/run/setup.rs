//! Run setup: CLI overrides, validation, labeler and discovery creation.

use autolabel_core::{Config, FileDiscovery, Labeler};

use super::{RunArgs, RunContext};

/// Apply CLI overrides to the loaded config.
pub fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(ref images) = args.images {
        config.dataset.image_directory = images.clone();
    }
    if let Some(parallel) = args.parallel {
        config.processing.parallel_workers = parallel;
    }
    if let Some(n) = args.subsample {
        config.dataset.subsample = Some(n);
    }
    if args.no_export {
        config.export.export_dataset = false;
    }
    if let Some(ref dir) = args.export_dir {
        config.export.dir = dir.clone();
    }
    if args.labels_only {
        config.export.copy_media = false;
    }
    if args.no_spans {
        config.prompt.use_token_spans = false;
    }
    if args.fail_fast {
        config.processing.fail_fast = true;
    }
}

/// Validate overrides and input, then build everything a run needs.
pub fn setup_run(args: &RunArgs, mut config: Config) -> anyhow::Result<RunContext> {
    apply_overrides(&mut config, args);
    config.validate()?;

    let images = config.image_directory();
    if !images.exists() {
        anyhow::bail!(
            "Image directory does not exist: {:?}\n\n  Hint: Set [dataset] image_directory or pass --images.",
            images
        );
    }

    let caption = config.caption()?;
    tracing::info!("Caption: {}", caption);

    let labeler = Labeler::with_caption(&config, &caption);
    let discovery = FileDiscovery::new(config.dataset.clone());

    Ok(RunContext {
        caption,
        labeler,
        discovery,
        config,
    })
}
