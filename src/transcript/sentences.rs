use super::{Segment, Word};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for sentence building and long-sentence subdivision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentenceConfig {
    /// Silence between two words that closes a sentence (default: 500ms).
    pub gap_threshold_ms: f64,
    /// Sentences longer than this many characters get subdivided (default: 100).
    pub max_segment_length: usize,
}

impl Default for SentenceConfig {
    fn default() -> Self {
        Self {
            gap_threshold_ms: 500.0,
            max_segment_length: 100,
        }
    }
}

const TERMINAL_PUNCTUATION: [char; 3] = ['.', '!', '?'];

/// Running state of the sentence fold.
#[derive(Default)]
struct SentenceAccumulator {
    sentences: Vec<Segment>,
    buffer: Vec<Word>,
}

impl SentenceAccumulator {
    fn flush(mut self) -> Self {
        let words = std::mem::take(&mut self.buffer);
        if let Some(segment) = Segment::from_words(words) {
            self.sentences.push(segment);
        }
        self
    }

    fn push(self, word: Word, gap_threshold: f64) -> Self {
        let long_gap = self
            .buffer
            .last()
            .is_some_and(|prev| word.start - prev.end > gap_threshold);

        let mut acc = if long_gap {
            self.flush()
        } else {
            self
        };

        let terminal = word.text.trim_end().ends_with(TERMINAL_PUNCTUATION);
        acc.buffer.push(word);

        if terminal {
            acc.flush()
        } else {
            acc
        }
    }
}

/// Merge a flat word-level transcript into sentence segments.
///
/// A sentence closes after a word ending in `.`, `!` or `?`, and also before
/// any word that starts more than `gap_threshold_ms` after the previous word
/// ended. Every input word lands in exactly one sentence, in order.
pub fn merge_into_sentences(words: Vec<Word>, config: &SentenceConfig) -> Vec<Segment> {
    let gap_threshold = config.gap_threshold_ms / 1000.0;
    let word_count = words.len();

    let sentences = words
        .into_iter()
        .fold(SentenceAccumulator::default(), |acc, word| {
            acc.push(word, gap_threshold)
        })
        .flush()
        .sentences;

    debug!(
        "Merged {} words into {} sentences",
        word_count,
        sentences.len()
    );

    sentences
}

/// Split already-built sentences wherever two consecutive words are separated
/// by more than `gap_threshold_ms`.
pub fn split_on_long_gaps(sentences: Vec<Segment>, gap_threshold_ms: f64) -> Vec<Segment> {
    let gap_threshold = gap_threshold_ms / 1000.0;

    sentences
        .into_iter()
        .flat_map(|sentence| {
            let mut pieces: Vec<Vec<Word>> = Vec::new();
            for word in sentence.words {
                let starts_new = match pieces.last().and_then(|p| p.last()) {
                    Some(prev) => word.start - prev.end > gap_threshold,
                    None => true,
                };
                if starts_new {
                    pieces.push(vec![word]);
                } else if let Some(current) = pieces.last_mut() {
                    current.push(word);
                }
            }
            pieces.into_iter().filter_map(Segment::from_words)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_second_words(texts: &[&str]) -> Vec<Word> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Word::new(*t, i as f64, i as f64 + 1.0))
            .collect()
    }

    #[test]
    fn test_splits_on_terminal_punctuation() {
        let words = one_second_words(&["Hi", "there.", "How", "are", "you?", "Great!"]);
        let sentences = merge_into_sentences(words, &SentenceConfig::default());

        let texts: Vec<&str> = sentences.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Hi there.", "How are you?", "Great!"]);
        assert_eq!(sentences[1].start, 2.0);
        assert_eq!(sentences[1].end, 5.0);
    }

    #[test]
    fn test_splits_on_long_gap_without_punctuation() {
        let texts = [
            "The", "quick", "brown", "fox", "jumps", "over", "the", "lazy", "dog", "and", "then",
            "sleeps",
        ];
        let words: Vec<Word> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let shift = if i >= 6 { 0.6 } else { 0.0 };
                Word::new(*t, i as f64 + shift, i as f64 + 1.0 + shift)
            })
            .collect();

        let sentences = merge_into_sentences(words, &SentenceConfig::default());

        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].text, "The quick brown fox jumps over");
        assert_eq!(sentences[1].words.len(), 6);
        assert!((sentences[1].start - 6.6).abs() < 1e-9);
    }

    #[test]
    fn test_gap_at_threshold_does_not_split() {
        let words = vec![Word::new("a", 0.0, 1.0), Word::new("b", 1.5, 2.0)];
        let sentences = merge_into_sentences(words, &SentenceConfig::default());
        assert_eq!(sentences.len(), 1);
    }

    #[test]
    fn test_trailing_unterminated_sentence_is_emitted() {
        let words = one_second_words(&["Done.", "and", "then"]);
        let sentences = merge_into_sentences(words, &SentenceConfig::default());
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[1].text, "and then");
    }

    #[test]
    fn test_word_coverage() {
        let words = one_second_words(&["One.", "two", "three!", "four", "five", "six?", "seven"]);
        let sentences = merge_into_sentences(words.clone(), &SentenceConfig::default());

        let rebuilt: Vec<Word> = sentences.into_iter().flat_map(|s| s.words).collect();
        assert_eq!(rebuilt, words);
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_into_sentences(Vec::new(), &SentenceConfig::default()).is_empty());
    }

    #[test]
    fn test_split_on_long_gaps() {
        let sentence = Segment::from_words(vec![
            Word::new("one", 0.0, 0.5),
            Word::new("two", 0.6, 1.0),
            Word::new("three", 2.0, 2.5),
        ])
        .unwrap();

        let pieces = split_on_long_gaps(vec![sentence], 500.0);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].text, "one two");
        assert_eq!(pieces[1].text, "three");
    }
}
