//! In-memory collection of labeled samples for one run.

use std::io::Write;
use std::path::PathBuf;

use crate::caption::Caption;
use crate::error::AutolabelError;
use crate::output::OutputWriter;
use crate::types::Sample;

use super::coco::CocoExporter;

/// Samples labeled against one caption.
pub struct LabeledDataset {
    caption: Caption,
    samples: Vec<Sample>,
}

impl LabeledDataset {
    pub fn new(caption: Caption) -> Self {
        Self {
            caption,
            samples: Vec::new(),
        }
    }

    pub fn caption(&self) -> &Caption {
        &self.caption
    }

    /// Attach a labeled sample.
    pub fn add(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total detections across all samples.
    pub fn detection_count(&self) -> usize {
        self.samples.iter().map(|s| s.detections.len()).sum()
    }

    /// Write every sample through `writer`.
    pub fn write_samples<W: Write>(&self, writer: &mut OutputWriter<W>) -> std::io::Result<()> {
        writer.write_all(&self.samples)?;
        writer.flush()
    }

    /// Export a COCO detection dataset to `dir`, with the caption's phrases
    /// as the leading categories.
    pub fn export_coco(&self, exporter: &CocoExporter) -> Result<PathBuf, AutolabelError> {
        exporter.export(&self.samples, &self.caption.phrases())
    }
}
