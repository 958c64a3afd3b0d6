pub mod json;
pub mod srt;

use crate::config::OutputFormat;
use crate::transcript::{Segment, Word};
use serde::{Deserialize, Serialize};

/// Limits for on-screen subtitle cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleConfig {
    /// Maximum characters per card (default: 20).
    pub max_length: usize,
    /// Maximum words per card (default: 3).
    pub max_words: usize,
    /// Uppercase card text and word tokens.
    pub upper_case: bool,
    /// Extra seconds of video kept after the last clip of a short.
    pub end_padding: f64,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            max_length: 20,
            max_words: 3,
            upper_case: false,
            end_padding: 0.0,
        }
    }
}

/// One on-screen card. Times are relative to the caller's offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtitle {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub words: Vec<Word>,
}

impl Subtitle {
    fn from_words(words: Vec<Word>, time_offset: f64, upper_case: bool) -> Option<Self> {
        let start = words.first()?.start - time_offset;
        let end = words.last()?.end - time_offset;
        let words: Vec<Word> = words
            .into_iter()
            .map(|w| {
                let mut w = w.shifted(time_offset);
                if upper_case {
                    w.text = w.text.to_uppercase();
                }
                w
            })
            .collect();
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

    /// Copy moved forward by `delta` seconds.
    fn delayed(&self, delta: f64) -> Self {
        Self {
            text: self.text.clone(),
            start: self.start + delta,
            end: self.end + delta,
            words: self.words.iter().map(|w| w.shifted(-delta)).collect(),
        }
    }
}

/// Words accumulated for the card being built.
#[derive(Default)]
struct CardBuffer {
    words: Vec<Word>,
    text_len: usize,
    has_stop_mark: bool,
}

impl CardBuffer {
    fn should_close_before(&self, word: &Word, config: &SubtitleConfig) -> bool {
        if self.words.is_empty() {
            return false;
        }
        self.text_len + 1 + word.text.chars().count() > config.max_length
            || self.words.len() >= config.max_words
            || self.has_stop_mark
    }

    fn push(&mut self, word: &Word) {
        if !self.words.is_empty() {
            self.text_len += 1;
        }
        self.text_len += word.text.chars().count();
        self.has_stop_mark |= word.text.contains(['?', '!']);
        self.words.push(word.clone());
    }

    fn take(&mut self) -> Vec<Word> {
        std::mem::take(self).words
    }
}

/// Break each segment's words into display cards.
///
/// A card closes before the next word when that word would push it past
/// `max_length` characters, when it already holds `max_words` words, or when
/// it already contains `?` or `!`. A single word longer than `max_length`
/// still gets its own card. Times are shifted back by `time_offset`.
pub fn generate_subtitles(segments: &[Segment], config: &SubtitleConfig, time_offset: f64) -> Vec<Subtitle> {
    let mut cards = Vec::new();

    for segment in segments {
        let mut buffer = CardBuffer::default();
        for word in &segment.words {
            if buffer.should_close_before(word, config) {
                cards.extend(Subtitle::from_words(buffer.take(), time_offset, config.upper_case));
            }
            buffer.push(word);
        }
        cards.extend(Subtitle::from_words(buffer.take(), time_offset, config.upper_case));
    }

    cards
}

/// Where one source segment lands on the short's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Clip {
    pub source_start: f64,
    pub source_end: f64,
    pub timeline_start: f64,
    pub length: f64,
}

/// Cards for a whole short, on the timeline of the concatenated clips.
#[derive(Debug, Clone, Serialize)]
pub struct SubtitleTrack {
    pub clips: Vec<Clip>,
    pub subtitles: Vec<Subtitle>,
    pub duration: f64,
}

/// Render every segment as its own clip and lay the clips end to end.
///
/// Gaps between source segments are cut, so each segment's cards are built
/// relative to its own start and then moved by the length of the clips
/// before it. `end_padding` lengthens only the final clip.
pub fn short_subtitle_track(segments: &[Segment], config: &SubtitleConfig) -> SubtitleTrack {
    let mut clips = Vec::with_capacity(segments.len());
    let mut subtitles = Vec::new();
    let mut timeline = 0.0;

    for (i, segment) in segments.iter().enumerate() {
        let is_last = i + 1 == segments.len();
        let length = segment.duration() + if is_last { config.end_padding } else { 0.0 };

        subtitles.extend(
            generate_subtitles(std::slice::from_ref(segment), config, segment.start)
                .iter()
                .map(|card| card.delayed(timeline)),
        );
        clips.push(Clip {
            source_start: segment.start,
            source_end: segment.end + if is_last { config.end_padding } else { 0.0 },
            timeline_start: timeline,
            length,
        });
        timeline += length;
    }

    SubtitleTrack {
        clips,
        subtitles,
        duration: timeline,
    }
}

pub trait SubtitleFormatter {
    fn format(&self, subtitles: &[Subtitle]) -> String;
    fn extension(&self) -> &'static str;
}

pub fn create_formatter(format: OutputFormat) -> Box<dyn SubtitleFormatter> {
    match format {
        OutputFormat::Srt => Box::new(srt::SrtFormatter),
        OutputFormat::Json => Box::new(json::JsonFormatter::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(tokens: &[&str], start: f64, step: f64) -> Segment {
        let words = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let s = start + i as f64 * step;
                Word::new(*t, s, s + step * 0.8)
            })
            .collect();
        Segment::from_words(words).unwrap()
    }

    fn texts(cards: &[Subtitle]) -> Vec<&str> {
        cards.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_closes_on_word_count() {
        let seg = segment(&["one", "two", "three", "four", "five"], 0.0, 0.5);
        let cards = generate_subtitles(&[seg], &SubtitleConfig::default(), 0.0);
        assert_eq!(texts(&cards), vec!["one two three", "four five"]);
    }

    #[test]
    fn test_closes_on_length() {
        let seg = segment(&["extraordinary", "circumstances", "abound"], 0.0, 0.5);
        let cards = generate_subtitles(&[seg], &SubtitleConfig::default(), 0.0);
        assert_eq!(texts(&cards), vec!["extraordinary", "circumstances abound"]);
    }

    #[test]
    fn test_overlong_word_gets_own_card() {
        let seg = segment(&["a", "incomprehensibilities", "b"], 0.0, 0.5);
        let cards = generate_subtitles(&[seg], &SubtitleConfig::default(), 0.0);
        assert_eq!(texts(&cards), vec!["a", "incomprehensibilities", "b"]);
    }

    #[test]
    fn test_closes_after_question_or_exclamation() {
        let seg = segment(&["Really?", "Yes", "wow!", "ok"], 0.0, 0.5);
        let cards = generate_subtitles(&[seg], &SubtitleConfig::default(), 0.0);
        assert_eq!(texts(&cards), vec!["Really?", "Yes wow!", "ok"]);
    }

    #[test]
    fn test_times_are_offset() {
        let seg = segment(&["hi", "there"], 100.0, 1.0);
        let cards = generate_subtitles(&[seg.clone()], &SubtitleConfig::default(), 100.0);

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].start, 0.0);
        assert_eq!(cards[0].end, seg.end - 100.0);
        assert_eq!(cards[0].words[1].start, 1.0);
    }

    #[test]
    fn test_upper_case_leaves_source_untouched() {
        let seg = segment(&["hello", "world"], 0.0, 1.0);
        let config = SubtitleConfig {
            upper_case: true,
            ..Default::default()
        };
        let cards = generate_subtitles(&[seg.clone()], &config, 0.0);

        assert_eq!(cards[0].text, "HELLO WORLD");
        assert_eq!(cards[0].words[0].text, "HELLO");
        assert_eq!(seg.words[0].text, "hello");
    }

    #[test]
    fn test_segment_without_words_yields_no_cards() {
        let empty = Segment {
            text: String::new(),
            start: 0.0,
            end: 0.0,
            words: Vec::new(),
        };
        assert!(generate_subtitles(&[empty], &SubtitleConfig::default(), 0.0).is_empty());
    }

    #[test]
    fn test_cards_reconstruct_words() {
        let tokens = [
            "So", "what", "happens", "next?", "Nobody", "really", "knows,", "but", "the",
            "experiment", "continued", "for", "years!", "Amazing", "results", "followed.",
        ];
        let seg = segment(&tokens, 3.0, 0.4);

        for max_length in [1, 5, 12, 20, 80] {
            for max_words in [1, 2, 3, 7] {
                let config = SubtitleConfig {
                    max_length,
                    max_words,
                    ..Default::default()
                };
                let cards = generate_subtitles(&[seg.clone()], &config, 3.0);
                let rebuilt: Vec<Word> = cards.iter().flat_map(|c| c.words.clone()).collect();
                let expected: Vec<Word> = seg.words.iter().map(|w| w.shifted(3.0)).collect();
                assert_eq!(rebuilt, expected);

                for pair in cards.windows(2) {
                    assert!(pair[0].start <= pair[1].start);
                }
            }
        }
    }

    #[test]
    fn test_short_track_concatenates_clips() {
        let first = segment(&["first", "part"], 10.0, 1.0);
        let second = segment(&["second", "part"], 50.0, 1.0);
        let config = SubtitleConfig {
            end_padding: 0.5,
            ..Default::default()
        };
        let track = short_subtitle_track(&[first.clone(), second.clone()], &config);

        assert_eq!(track.clips.len(), 2);
        assert_eq!(track.clips[1].timeline_start, first.duration());
        assert_eq!(track.clips[1].length, second.duration() + 0.5);
        assert!((track.duration - (first.duration() + second.duration() + 0.5)).abs() < 1e-9);

        assert_eq!(track.subtitles.len(), 2);
        assert_eq!(track.subtitles[0].start, 0.0);
        assert_eq!(track.subtitles[1].start, first.duration());
        assert_eq!(track.subtitles[1].words[0].start, first.duration());
    }
}
