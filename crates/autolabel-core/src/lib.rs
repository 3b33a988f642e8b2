//! Autolabel Core - prompt span mapping and detection assembly.
//!
//! Autolabel turns a class list into a detector caption, maps every word of
//! that caption to its character span, and converts open-vocabulary detector
//! output (boxes plus `"phrase(confidence)"` strings) into labeled samples.
//!
//! # Architecture
//!
//! ```text
//! Classes → Caption → Token spans ─┐
//! Images  → Discovery → Subsample ─┴→ Detector → Assemble → Samples → COCO / JSON
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use autolabel_core::{Config, FileDiscovery, Labeler};
//!
//! #[tokio::main]
//! async fn main() -> autolabel_core::Result<()> {
//!     let config = Config::load()?;
//!     let labeler = Labeler::from_config(&config)?;
//!
//!     let files = FileDiscovery::new(config.dataset.clone())
//!         .discover_sampled(&config.image_directory());
//!     let outcome = labeler.label_batch(&files, |_, _| {}).await;
//!     println!("{} detections", outcome.stats.detections);
//!     Ok(())
//! }
//! ```

pub mod caption;
pub mod config;
pub mod dataset;
pub mod detection;
pub mod detector;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod types;

pub use caption::{calc_token_spans, Caption, CharSpan, SpanTable, TokenSpanGroup};
pub use config::Config;
pub use dataset::{CocoExporter, DiscoveredFile, FileDiscovery, LabeledDataset};
pub use detection::{assemble, assemble_lenient, decode_phrase_logit, PhraseLogit};
pub use detector::{DetectParams, Detector, DetectorFactory, DetectorOutput};
pub use error::{
    AssembleError, AutolabelError, CaptionError, ConfigError, DecodeError, PipelineError,
    PipelineResult, Result,
};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{BatchOutcome, LabelOptions, Labeler};
pub use types::{BoxCxCyWh, BoxXywh, Detection, LabelingStats, Sample};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
