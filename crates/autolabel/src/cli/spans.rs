//! The `autolabel spans` command: print a caption and its word spans.

use autolabel_core::{Caption, Config};
use clap::Args;

/// Arguments for the `spans` command.
#[derive(Args, Debug)]
pub struct SpansArgs {
    /// Class names (defaults to the configured class list)
    pub classes: Vec<String>,

    /// Use this caption verbatim instead of building one from classes
    #[arg(long, conflicts_with = "classes")]
    pub caption: Option<String>,

    /// Pretty-print the span table
    #[arg(long)]
    pub pretty: bool,
}

/// Execute the spans command.
pub fn execute(args: SpansArgs, config: &Config) -> anyhow::Result<()> {
    let caption = resolve_caption(&args, config)?;
    println!("{}", caption);
    println!("{}", render_spans(&caption, args.pretty)?);
    Ok(())
}

fn resolve_caption(args: &SpansArgs, config: &Config) -> anyhow::Result<Caption> {
    let caption = match (&args.caption, args.classes.is_empty()) {
        (Some(text), _) => Caption::parse(text)?,
        (None, false) => Caption::from_classes(&args.classes)?,
        (None, true) => config.caption()?,
    };
    Ok(caption)
}

fn render_spans(caption: &Caption, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(caption.spans())
    } else {
        serde_json::to_string(caption.spans())
    }
}
