//! Detector collaborators.
//!
//! Defines the `Detector` trait and its implementations, plus retry helpers
//! for transient failures.

pub mod http;
pub mod provider;
pub mod retry;
pub mod sidecar;

pub use http::HttpDetector;
pub use provider::{DetectParams, Detector, DetectorFactory, DetectorOutput};
pub use sidecar::SidecarDetector;
