//! Detector prompts built from a class list.
//!
//! A caption is the text prompt handed to the open-vocabulary detector:
//! lower-case phrases, one per class, each closed by `.` (for example
//! `"red car.blue car.person."`). The word spans of a caption are computed
//! once when it is built and can be passed to the detector as a hint.

pub mod spans;

pub use spans::{calc_token_spans, CharSpan, SpanTable, TokenSpanGroup};

use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::CaptionError;
use spans::{PHRASE_DELIMITER, WORD_DELIMITER};

/// A validated caption together with its span table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    text: String,
    spans: SpanTable,
}

impl Caption {
    /// Build a caption from class names.
    ///
    /// Each class is trimmed and its inner whitespace collapsed to single
    /// spaces; blank entries are skipped. Classes are joined with `.`, the
    /// result is closed with `.` and lower-cased.
    pub fn from_classes<S: AsRef<str>>(classes: &[S]) -> Result<Self, CaptionError> {
        let mut phrases = Vec::with_capacity(classes.len());

        for class in classes {
            let class = class.as_ref();
            if class.contains(PHRASE_DELIMITER) {
                return Err(CaptionError::DelimiterInClass {
                    class: class.to_string(),
                });
            }
            let words: Vec<&str> = class.split_whitespace().collect();
            if words.is_empty() {
                tracing::warn!("Skipping blank class name {:?}", class);
                continue;
            }
            phrases.push(words.join(&WORD_DELIMITER.to_string()));
        }

        if phrases.is_empty() {
            return Err(CaptionError::NoClasses);
        }

        let mut text = phrases.join(&PHRASE_DELIMITER.to_string());
        text.push(PHRASE_DELIMITER);
        Self::parse(text.to_lowercase())
    }

    /// Wrap an already-normalized caption, rejecting it if it cannot be
    /// tokenized.
    pub fn parse(text: impl Into<String>) -> Result<Self, CaptionError> {
        let text = text.into();
        let spans = calc_token_spans(&text)?;
        Ok(Self { text, spans })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn spans(&self) -> &SpanTable {
        &self.spans
    }

    /// Phrase texts in caption order, without delimiters.
    pub fn phrases(&self) -> Vec<&str> {
        self.spans
            .groups()
            .iter()
            .filter_map(|group| {
                let first = group.first()?;
                let last = group.last()?;
                Some(&self.text[first.start..last.end])
            })
            .collect()
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Caption {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_classes_matches_prompt_format() {
        let caption =
            Caption::from_classes(&["Red Car", "Blue car", "white Car", "yellow car"]).unwrap();
        assert_eq!(caption.as_str(), "red car.blue car.white car.yellow car.");
        assert_eq!(caption.spans().phrase_count(), 4);
    }

    #[test]
    fn test_from_classes_normalizes_whitespace() {
        let caption = Caption::from_classes(&["  traffic   light ", "dog", "   "]).unwrap();
        assert_eq!(caption.as_str(), "traffic light.dog.");
    }

    #[test]
    fn test_from_classes_rejects_empty_list() {
        let empty: [&str; 0] = [];
        assert_eq!(Caption::from_classes(&empty), Err(CaptionError::NoClasses));
        assert_eq!(
            Caption::from_classes(&["", "  "]),
            Err(CaptionError::NoClasses)
        );
    }

    #[test]
    fn test_from_classes_rejects_embedded_delimiter() {
        let err = Caption::from_classes(&["st. bernard"]).unwrap_err();
        assert!(matches!(err, CaptionError::DelimiterInClass { .. }));
    }

    #[test]
    fn test_phrases() {
        let caption = Caption::parse("red car.dog.traffic light.").unwrap();
        assert_eq!(caption.phrases(), vec!["red car", "dog", "traffic light"]);
    }

    #[test]
    fn test_parse_rejects_unterminated() {
        let err = Caption::parse("red car").unwrap_err();
        assert!(matches!(err, CaptionError::MissingTerminator { .. }));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let caption = Caption::parse("dog.").unwrap();
        assert_eq!(serde_json::to_string(&caption).unwrap(), "\"dog.\"");
    }
}
