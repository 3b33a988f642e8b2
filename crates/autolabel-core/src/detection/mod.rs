//! Detector output decoding and detection assembly.
//!
//! - **decode**: split `"phrase(confidence)"` strings
//! - **assemble**: pair decoded phrases with converted boxes

pub mod assemble;
pub mod decode;

pub use assemble::{assemble, assemble_lenient};
pub use decode::{decode_phrase_logit, PhraseLogit};
