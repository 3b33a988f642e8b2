//! File-based dataset store.
//!
//! - **discovery**: find images and pick a seeded subsample
//! - **store**: collect labeled samples for a run
//! - **coco**: export samples as a COCO detection dataset

pub mod coco;
pub mod discovery;
pub mod store;

pub use coco::{CocoDataset, CocoExporter};
pub use discovery::{subsample, DiscoveredFile, FileDiscovery};
pub use store::LabeledDataset;
