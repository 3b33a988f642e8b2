//! Core data types: boxes, detections, and labeled samples.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A box in center form: center x, center y, width, height.
///
/// This is what the detector emits, normalized to `[0, 1]` relative to the
/// image size. Serializes as `[cx, cy, w, h]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoxCxCyWh {
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
}

impl BoxCxCyWh {
    pub fn new(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self { cx, cy, w, h }
    }

    /// Convert to top-left form. Width and height are unchanged and the
    /// result stays in the same coordinate space.
    pub fn to_xywh(self) -> BoxXywh {
        BoxXywh {
            x: self.cx - self.w / 2.0,
            y: self.cy - self.h / 2.0,
            w: self.w,
            h: self.h,
        }
    }
}

impl From<[f32; 4]> for BoxCxCyWh {
    fn from([cx, cy, w, h]: [f32; 4]) -> Self {
        Self { cx, cy, w, h }
    }
}

impl From<BoxCxCyWh> for [f32; 4] {
    fn from(b: BoxCxCyWh) -> Self {
        [b.cx, b.cy, b.w, b.h]
    }
}

/// A box in top-left form: x, y, width, height. Serializes as `[x, y, w, h]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoxXywh {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoxXywh {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Scale a relative box to absolute pixels.
    pub fn to_pixels(self, width: u32, height: u32) -> BoxXywh {
        let (width, height) = (width as f32, height as f32);
        BoxXywh {
            x: self.x * width,
            y: self.y * height,
            w: self.w * width,
            h: self.h * height,
        }
    }

    pub fn area(&self) -> f32 {
        self.w * self.h
    }
}

impl From<[f32; 4]> for BoxXywh {
    fn from([x, y, w, h]: [f32; 4]) -> Self {
        Self { x, y, w, h }
    }
}

impl From<BoxXywh> for [f32; 4] {
    fn from(b: BoxXywh) -> Self {
        [b.x, b.y, b.w, b.h]
    }
}

/// One detected object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Phrase the detector matched (e.g., "red car")
    pub label: String,

    /// Detector confidence from 0.0 to 1.0
    pub confidence: f32,

    /// Relative top-left box
    pub bounding_box: BoxXywh,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bounding_box: BoxXywh) -> Self {
        Self {
            label: label.into(),
            confidence,
            bounding_box,
        }
    }
}

/// An image and the detections attached to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// Path to the source image
    pub filepath: PathBuf,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    pub detections: Vec<Detection>,
}

/// Statistics for a labeling run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LabelingStats {
    /// Images labeled successfully
    pub succeeded: usize,

    /// Images that failed
    pub failed: usize,

    /// Detections across all labeled images
    pub detections: usize,

    /// Total wall-clock time in seconds
    pub total_seconds: f64,
}

impl LabelingStats {
    pub fn images_per_second(&self) -> f64 {
        if self.total_seconds > 0.0 {
            (self.succeeded + self.failed) as f64 / self.total_seconds
        } else {
            0.0
        }
    }
}
