//! Batch labeling with progress, sample output, and COCO export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use autolabel_core::{
    CocoExporter, DiscoveredFile, FileDiscovery, LabeledDataset, LabelingStats, OutputWriter,
};

use super::types::OutputFormat;
use super::{RunArgs, RunContext};

/// Label every discovered file, then write samples and export the dataset.
pub async fn run_batch(
    ctx: RunContext,
    args: &RunArgs,
    files: Vec<DiscoveredFile>,
) -> anyhow::Result<()> {
    let progress = create_progress_bar(files.len() as u64);
    let start_time = Instant::now();

    let pb = progress.clone();
    let outcome = ctx
        .labeler
        .label_batch(&files, move |path, result| {
            if let Err(e) = result {
                tracing::error!("Failed: {:?} - {}", path, e);
            }
            pb.inc(1);
            let elapsed = start_time.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                pb.set_message(format!("{:.1} img/sec", pb.position() as f64 / elapsed));
            }
        })
        .await;
    progress.finish_and_clear();

    print_summary(
        &outcome.stats,
        outcome.not_started,
        FileDiscovery::total_size(&files),
    );

    if ctx.config.processing.fail_fast {
        if let Some((path, e)) = outcome.failures.first() {
            anyhow::bail!("Aborted after failure on {:?}: {}", path, e);
        }
    }

    let mut dataset = LabeledDataset::new(ctx.caption);
    for sample in outcome.samples {
        dataset.add(sample);
    }

    if let Some(ref output) = args.output {
        write_samples(&dataset, output, args.format)?;
    }

    if ctx.config.export.export_dataset {
        let labels = dataset.export_coco(&CocoExporter::from_config(&ctx.config))?;
        eprintln!("  COCO dataset written to {}", labels.display());
    }

    Ok(())
}

/// Write samples to `output`, or to stdout when `output` is "-".
fn write_samples(
    dataset: &LabeledDataset,
    output: &Path,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let (sink, pretty): (Box<dyn Write>, bool) = if output == Path::new("-") {
        (Box::new(std::io::stdout().lock()), true)
    } else {
        (Box::new(BufWriter::new(File::create(output)?)), false)
    };

    let mut writer = OutputWriter::new(sink, format.into(), pretty);
    dataset.write_samples(&mut writer)?;

    if output != Path::new("-") {
        tracing::info!("{} samples written to {:?}", writer.items_written(), output);
    }
    Ok(())
}

fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after batch labeling.
fn print_summary(stats: &LabelingStats, not_started: usize, total_bytes: u64) {
    let mb = total_bytes as f64 / 1_000_000.0;

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Labeled:      {:>8}", stats.succeeded);
    if stats.failed > 0 {
        eprintln!("    Failed:       {:>8}", stats.failed);
    }
    if not_started > 0 {
        eprintln!("    Not started:  {:>8}", not_started);
    }
    eprintln!("    Detections:   {:>8}", stats.detections);
    eprintln!("  ------------------------------------");
    eprintln!("    Input:        {:>7.1} MB", mb);
    eprintln!("    Duration:     {:>7.1}s", stats.total_seconds);
    eprintln!("    Rate:         {:>7.1} img/sec", stats.images_per_second());
    eprintln!("  ====================================");
}
