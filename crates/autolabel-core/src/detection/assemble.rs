//! Turning aligned detector output into typed detections.

use crate::error::AssembleError;
use crate::types::{BoxCxCyWh, Detection};

use super::decode::decode_phrase_logit;

/// Pair each box with its phrase-logit string and build detections.
///
/// Box `i` belongs to string `i`. Both sequences must have the same length;
/// the first string that fails to decode fails the whole image.
pub fn assemble<S: AsRef<str>>(
    boxes: &[BoxCxCyWh],
    phrase_logits: &[S],
) -> Result<Vec<Detection>, AssembleError> {
    if boxes.len() != phrase_logits.len() {
        return Err(AssembleError::LengthMismatch {
            boxes: boxes.len(),
            phrases: phrase_logits.len(),
        });
    }
    build(boxes, phrase_logits)
}

/// Like [`assemble`], but pairs up to the shorter sequence and drops the
/// unmatched tail of the longer one.
pub fn assemble_lenient<S: AsRef<str>>(
    boxes: &[BoxCxCyWh],
    phrase_logits: &[S],
) -> Result<Vec<Detection>, AssembleError> {
    let n = boxes.len().min(phrase_logits.len());
    if boxes.len() != phrase_logits.len() {
        tracing::warn!(
            "Detector returned {} boxes and {} phrases; dropping {} unmatched",
            boxes.len(),
            phrase_logits.len(),
            boxes.len().max(phrase_logits.len()) - n
        );
    }
    build(&boxes[..n], &phrase_logits[..n])
}

fn build<S: AsRef<str>>(
    boxes: &[BoxCxCyWh],
    phrase_logits: &[S],
) -> Result<Vec<Detection>, AssembleError> {
    boxes
        .iter()
        .zip(phrase_logits)
        .enumerate()
        .map(|(index, (bbox, raw))| {
            let decoded = decode_phrase_logit(raw.as_ref())
                .map_err(|source| AssembleError::Decode { index, source })?;
            Ok(Detection {
                label: decoded.phrase,
                confidence: decoded.confidence,
                bounding_box: bbox.to_xywh(),
            })
        })
        .collect()
}
