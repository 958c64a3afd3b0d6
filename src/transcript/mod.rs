pub mod document;
pub mod sentences;
pub mod split;

pub use document::TranscriptDocument;
pub use sentences::{merge_into_sentences, split_on_long_gaps, SentenceConfig};
pub use split::{split_long_unit, split_on_commas, subdivide_segments};

use serde::{Deserialize, Serialize};

/// A single timed word, times in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    #[serde(rename = "word", alias = "text")]
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl Word {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    /// Copy of this word shifted back by `offset` seconds.
    pub fn shifted(&self, offset: f64) -> Self {
        Self {
            text: self.text.clone(),
            start: self.start - offset,
            end: self.end - offset,
        }
    }
}

/// A timed, word-aligned unit of transcript text (usually one sentence).
///
/// `start`/`end` always equal the first word's start and the last word's end,
/// and `text` is the space-joined word texts. Use [`Segment::from_words`] to
/// build one so these stay consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub words: Vec<Word>,
}

impl Segment {
    /// Build a segment spanning `words`. Returns `None` for an empty slice.
    pub fn from_words(words: Vec<Word>) -> Option<Self> {
        let start = words.first()?.start;
        let end = words.last()?.end;
        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Some(Self {
            text,
            start,
            end,
            words,
        })
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Sum of the individual segment durations (gaps between segments excluded).
pub fn total_duration(segments: &[Segment]) -> f64 {
    segments.iter().map(Segment::duration).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_from_words() {
        let segment = Segment::from_words(vec![
            Word::new("Hello", 1.0, 1.5),
            Word::new("world.", 1.6, 2.2),
        ])
        .unwrap();

        assert_eq!(segment.text, "Hello world.");
        assert_eq!(segment.start, 1.0);
        assert_eq!(segment.end, 2.2);
        assert!((segment.duration() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_segment_from_no_words() {
        assert!(Segment::from_words(Vec::new()).is_none());
    }

    #[test]
    fn test_total_duration_ignores_gaps() {
        let a = Segment::from_words(vec![Word::new("a", 0.0, 2.0)]).unwrap();
        let b = Segment::from_words(vec![Word::new("b", 10.0, 13.0)]).unwrap();
        assert_eq!(total_duration(&[a, b]), 5.0);
    }

    #[test]
    fn test_word_serializes_as_word_key() {
        let json = serde_json::to_string(&Word::new("hi", 0.0, 0.5)).unwrap();
        assert!(json.contains("\"word\":\"hi\""));

        let parsed: Word = serde_json::from_str(r#"{"text":"yo","start":1,"end":2}"#).unwrap();
        assert_eq!(parsed.text, "yo");
    }
}
