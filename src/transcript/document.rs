//! Persisted transcript document (JSON or YAML on disk).

use super::sentences::{merge_into_sentences, split_on_long_gaps, SentenceConfig};
use super::{Segment, Word};
use crate::error::{Result, ShortsmithError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Transcript as stored between pipeline runs.
///
/// `segments` holds sentence-level text only; timing lives in `words`. The
/// two are tied together by position: segment `i` covers the next
/// `n` words of the global list, where `n` is its whitespace token count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptDocument {
    pub language: String,
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub segments: Vec<String>,
    pub words: Vec<Word>,
}

impl TranscriptDocument {
    /// Build a document from raw word-level output by merging words into
    /// sentences.
    pub fn from_words(language: impl Into<String>, words: Vec<Word>, config: &SentenceConfig) -> Self {
        let sentences = merge_into_sentences(words, config);
        Self::from_segments(language, &sentences)
    }

    pub fn from_segments(language: impl Into<String>, segments: &[Segment]) -> Self {
        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        Self {
            language: language.into(),
            transcript: texts.join(" "),
            segments: texts,
            words: segments.iter().flat_map(|s| s.words.clone()).collect(),
        }
    }

    /// Load a document, picking the format from the file extension
    /// (`.yaml`/`.yml` for YAML, anything else is JSON). A document whose
    /// segments do not align with its words is rejected.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ShortsmithError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let document: Self = if is_yaml(path) {
            serde_yaml::from_str(&contents)?
        } else {
            serde_json::from_str(&contents)?
        };

        debug!(
            "Loaded transcript {:?}: {} segments, {} words",
            path,
            document.segments.len(),
            document.words.len()
        );
        document.to_segments()?;
        Ok(document)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Rebuild timed segments, cross-checking segment text against the word
    /// list. Any misalignment is fatal: timings would be silently wrong.
    pub fn to_segments(&self) -> Result<Vec<Segment>> {
        let mut segments = Vec::with_capacity(self.segments.len());
        let mut word_index = 0;

        for (i, text) in self.segments.iter().enumerate() {
            let tokens: Vec<&str> = text.split_whitespace().collect();
            let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
                return Err(ShortsmithError::InvalidTranscript(format!(
                    "Segment {} is empty",
                    i
                )));
            };

            let word_end = word_index + tokens.len();
            if word_end > self.words.len() {
                return Err(ShortsmithError::Misalignment(format!(
                    "Segment {} needs words {}..{} but the transcript only has {} words",
                    i,
                    word_index,
                    word_end,
                    self.words.len()
                )));
            }

            let slice = &self.words[word_index..word_end];
            if slice[0].text != *first {
                return Err(ShortsmithError::Misalignment(format!(
                    "Segment {} starts with {:?} but word {} is {:?}",
                    i, first, word_index, slice[0].text
                )));
            }
            if slice[slice.len() - 1].text != *last {
                return Err(ShortsmithError::Misalignment(format!(
                    "Segment {} ends with {:?} but word {} is {:?}",
                    i,
                    last,
                    word_end - 1,
                    slice[slice.len() - 1].text
                )));
            }

            if let Some(segment) = Segment::from_words(slice.to_vec()) {
                segments.push(segment);
            }
            word_index = word_end;
        }

        if word_index < self.words.len() {
            warn!(
                "{} trailing words are not covered by any segment",
                self.words.len() - word_index
            );
        }

        Ok(segments)
    }

    /// Break segments wherever consecutive words are more than
    /// `gap_threshold_ms` apart. Returns the number of segments added.
    pub fn split_on_long_gaps(&mut self, gap_threshold_ms: f64) -> Result<usize> {
        let before = self.segments.len();
        let segments = split_on_long_gaps(self.to_segments()?, gap_threshold_ms);
        self.segments = segments.into_iter().map(|s| s.text).collect();
        Ok(self.segments.len() - before)
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
