//! Decoding of the detector's `"phrase(confidence)"` strings.

use crate::error::DecodeError;

/// A phrase and its confidence, split out of one detector string.
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseLogit {
    pub phrase: String,
    pub confidence: f32,
}

/// Split `"red car(0.87)"` into `("red car", 0.87)`.
///
/// Uses the first `(` and the first `)`. The phrase is everything before
/// `(`, trimmed; the confidence is the text strictly between the two and
/// must be a finite number in `[0, 1]`.
pub fn decode_phrase_logit(raw: &str) -> Result<PhraseLogit, DecodeError> {
    let format_error = || DecodeError::Format {
        raw: raw.to_string(),
    };

    let open = raw.find('(').ok_or_else(format_error)?;
    let close = raw.find(')').ok_or_else(format_error)?;
    if close < open {
        return Err(format_error());
    }

    let value = raw[open + 1..close].trim();
    let parse_error = || DecodeError::Parse {
        raw: raw.to_string(),
        value: value.to_string(),
    };
    let confidence = value.parse::<f32>().map_err(|_| parse_error())?;
    // NaN serializes as null and would not survive a round trip
    if !(0.0..=1.0).contains(&confidence) {
        return Err(parse_error());
    }

    Ok(PhraseLogit {
        phrase: raw[..open].trim().to_string(),
        confidence,
    })
}
