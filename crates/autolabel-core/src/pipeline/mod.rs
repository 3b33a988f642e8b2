//! Labeling pipeline.
//!
//! - **labeler**: per-image detect and assemble, plus bounded-concurrency batches

pub mod labeler;

pub use labeler::{BatchOutcome, LabelOptions, Labeler};
