//! Word-level character spans for a dot-delimited caption.
//!
//! The detector can be told which characters of the caption belong to which
//! phrase. The hint is a nested list: one group per phrase, one `[start, end]`
//! pair per word, where `caption[start..end]` is the word itself.

use serde::{Deserialize, Serialize};

use crate::error::CaptionError;

/// Separates phrases. Every phrase, including the last, ends with one.
pub const PHRASE_DELIMITER: char = '.';

/// Separates words within a phrase.
pub const WORD_DELIMITER: char = ' ';

/// Byte offsets of one word in the caption.
///
/// `end` is the offset of the delimiter that closes the word, so slicing
/// `caption[start..end]` yields the word. Serializes as `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct CharSpan {
    pub start: usize,
    pub end: usize,
}

impl CharSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The word this span covers in `caption`.
    pub fn slice<'a>(&self, caption: &'a str) -> &'a str {
        &caption[self.start..self.end]
    }
}

impl From<(usize, usize)> for CharSpan {
    fn from((start, end): (usize, usize)) -> Self {
        Self { start, end }
    }
}

impl From<CharSpan> for (usize, usize) {
    fn from(span: CharSpan) -> Self {
        (span.start, span.end)
    }
}

/// The word spans of a single phrase, left to right.
pub type TokenSpanGroup = Vec<CharSpan>;

/// One [`TokenSpanGroup`] per phrase, in caption order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanTable(Vec<TokenSpanGroup>);

impl SpanTable {
    pub fn groups(&self) -> &[TokenSpanGroup] {
        &self.0
    }

    pub fn phrase_count(&self) -> usize {
        self.0.len()
    }

    /// Total number of words across all phrases.
    pub fn word_count(&self) -> usize {
        self.0.iter().map(Vec::len).sum()
    }

    /// Words of each phrase, sliced out of `caption`.
    pub fn words<'a>(&self, caption: &'a str) -> Vec<Vec<&'a str>> {
        self.0
            .iter()
            .map(|group| group.iter().map(|span| span.slice(caption)).collect())
            .collect()
    }

    /// Rebuild the caption from its spans: words joined by a single space,
    /// each phrase closed by `.`.
    pub fn reconstruct(&self, caption: &str) -> String {
        let mut out = String::with_capacity(caption.len());
        for group in &self.0 {
            for (i, span) in group.iter().enumerate() {
                if i > 0 {
                    out.push(WORD_DELIMITER);
                }
                out.push_str(span.slice(caption));
            }
            out.push(PHRASE_DELIMITER);
        }
        out
    }
}

/// Compute per-phrase word spans for a normalized caption.
///
/// Merges two ascending position streams, the spaces (with a sentinel past
/// any real offset) and the dots. Whichever delimiter comes first closes the
/// current word; a dot also closes the phrase. On a tie the dot wins.
///
/// The caption must be non-empty, end with `.`, and contain no empty phrase
/// or empty word.
pub fn calc_token_spans(caption: &str) -> Result<SpanTable, CaptionError> {
    if caption.is_empty() {
        return Err(CaptionError::Empty);
    }
    if !caption.ends_with(PHRASE_DELIMITER) {
        return Err(CaptionError::MissingTerminator {
            caption: caption.to_string(),
        });
    }

    let mut spaces = delimiter_positions(caption, WORD_DELIMITER);
    spaces.push(usize::MAX);
    let dots = delimiter_positions(caption, PHRASE_DELIMITER);

    let mut groups = Vec::with_capacity(dots.len());
    let mut words: TokenSpanGroup = Vec::new();
    let mut start = 0;
    let (mut next_space, mut next_dot) = (0, 0);

    while next_dot < dots.len() {
        let space = spaces[next_space];
        let dot = dots[next_dot];

        if space < dot {
            if space == start {
                return Err(CaptionError::EmptyWord { offset: start });
            }
            words.push(CharSpan::new(start, space));
            start = space + 1;
            next_space += 1;
        } else {
            if dot == start {
                return Err(if words.is_empty() {
                    CaptionError::EmptyPhrase { offset: dot }
                } else {
                    CaptionError::EmptyWord { offset: dot }
                });
            }
            words.push(CharSpan::new(start, dot));
            groups.push(std::mem::take(&mut words));
            start = dot + 1;
            next_dot += 1;
        }
    }

    Ok(SpanTable(groups))
}

/// Ascending byte offsets of every occurrence of `delimiter`.
fn delimiter_positions(caption: &str, delimiter: char) -> Vec<usize> {
    caption
        .char_indices()
        .filter(|&(_, c)| c == delimiter)
        .map(|(i, _)| i)
        .collect()
}
