//! Integration tests for shortsmith
//!
//! These tests run the deterministic pipeline stages end to end without a
//! text generation backend.

use shortsmith::config::{Config, OutputFormat, Provider};
use shortsmith::selection::{
    chunk_transcript, RawSelection, RejectReason, SelectionConfig, SelectionState, WindowConfig,
};
use shortsmith::subtitle::{
    create_formatter, generate_subtitles, json::JsonFormatter, short_subtitle_track,
    srt::SrtFormatter, SubtitleConfig, SubtitleFormatter,
};
use shortsmith::transcript::{
    merge_into_sentences, split_on_commas, total_duration, Segment, SentenceConfig,
    TranscriptDocument, Word,
};
use shortsmith::translate::create_translated_segments;
use tempfile::TempDir;

/// Words of a steady talk: 6-word sentences, 0.5s per word, 1s pause after
/// each sentence.
fn talk_words(sentences: usize) -> Vec<Word> {
    let mut words = Vec::new();
    let mut t = 0.0;
    for s in 0..sentences {
        for w in 0..6 {
            let text = if w == 5 {
                format!("end{}.", s)
            } else {
                format!("w{}x{}", s, w)
            };
            words.push(Word::new(text, t, t + 0.4));
            t += 0.5;
        }
        t += 1.0;
    }
    words
}

// ============================================================================
// Config Integration Tests
// ============================================================================

mod config_tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = Config::default();
        assert_eq!(config.default_format, OutputFormat::Srt);
        assert_eq!(config.default_provider, Provider::Gemini);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.window.chunk_duration, 180.0);
        assert_eq!(config.selection.max_duration, 60.0);
    }

    #[test]
    fn test_config_from_toml_tables() {
        let config = Config::from_toml(
            r#"
            concurrency = 8

            [window]
            chunk_duration = 240.0

            [subtitles]
            upper_case = true
            "#,
        )
        .unwrap();

        assert_eq!(config.concurrency, 8);
        assert_eq!(config.window.chunk_duration, 240.0);
        assert_eq!(config.window.overlap_duration, 60.0);
        assert!(config.subtitles.upper_case);
        assert_eq!(config.subtitles.max_words, 3);
    }

    #[test]
    fn test_config_gemini_validation() {
        let mut config = Config::default();
        assert!(config.validate(Provider::Gemini).is_err());

        config.gemini_api_key = Some("test-key".to_string());
        assert!(config.validate(Provider::Gemini).is_ok());
        assert!(config.validate(Provider::OpenAi).is_err());
    }
}

// ============================================================================
// Transcript Tests
// ============================================================================

mod transcript_tests {
    use super::*;

    #[test]
    fn test_words_to_document_and_back() {
        let words = talk_words(4);
        let document = TranscriptDocument::from_words("en", words.clone(), &SentenceConfig::default());
        assert_eq!(document.segments.len(), 4);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("talk.yaml");
        document.save(&path).unwrap();

        let segments = TranscriptDocument::load(&path).unwrap().to_segments().unwrap();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[1].text, "w1x0 w1x1 w1x2 w1x3 w1x4 end1.");
        assert_eq!(segments[1].start, words[6].start);
        assert_eq!(segments[1].end, words[11].end);
    }

    #[test]
    fn test_document_rejects_edited_text() {
        let mut document = TranscriptDocument::from_words("en", talk_words(2), &SentenceConfig::default());
        document.segments[1] = document.segments[1].replace("w1x0", "hello");
        assert!(document.to_segments().is_err());
    }

    #[test]
    fn test_comma_split_keeps_numbers() {
        assert_eq!(
            split_on_commas("We raised 1,000 dollars, then spent it all."),
            vec!["We raised 1,000 dollars,", "then spent it all."]
        );
    }
}

// ============================================================================
// Selection Tests
// ============================================================================

mod selection_tests {
    use super::*;

    fn sentences(count: usize) -> Vec<Segment> {
        merge_into_sentences(talk_words(count), &SentenceConfig::default())
    }

    #[test]
    fn test_windows_cover_transcript() {
        // 2.9s sentences with 1.1s pauses: 40 of them span about 159s.
        let segments = sentences(40);
        let config = WindowConfig {
            chunk_duration: 60.0,
            overlap_duration: 20.0,
        };
        let chunks = chunk_transcript(&segments, &config);

        assert!(chunks.len() >= 4);
        for segment in &segments {
            assert!(chunks.iter().any(|c| c.segments.contains(segment)));
        }
        for chunk in &chunks {
            assert!(chunk.segments.iter().all(|s| s.end <= chunk.window_end));
        }
    }

    #[test]
    fn test_state_machine_on_real_chunk() {
        let segments = sentences(40);
        let chunk = &chunk_transcript(&segments, &WindowConfig::default())[0];
        let config = SelectionConfig::default();

        // 20 sentences of 2.9s each is 58s.
        match SelectionState::run(RawSelection::new(0, 19), &chunk.segments, &config) {
            SelectionState::Accepted { segments, trimmed, .. } => {
                assert!(!trimmed);
                assert!((total_duration(&segments) - 58.0).abs() < 1e-6);
            }
            other => panic!("expected acceptance, got {:?}", other),
        }

        // 30 sentences is 87s and must be trimmed under 66s.
        match SelectionState::run(RawSelection::new(0, 29), &chunk.segments, &config) {
            SelectionState::Accepted { segments, trimmed, .. } => {
                assert!(trimmed);
                assert_eq!(segments.len(), 22);
                assert!(total_duration(&segments) <= config.duration_limit());
            }
            other => panic!("expected trimmed acceptance, got {:?}", other),
        }

        assert_eq!(
            SelectionState::run(RawSelection::default(), &chunk.segments, &config),
            SelectionState::Rejected(RejectReason::MissingIndices)
        );
    }
}

// ============================================================================
// Subtitle Tests
// ============================================================================

mod subtitle_tests {
    use super::*;

    fn sample_segments() -> Vec<Segment> {
        merge_into_sentences(talk_words(3), &SentenceConfig::default())
    }

    #[test]
    fn test_cards_round_trip_every_segment() {
        let segments = sample_segments();
        let cards = generate_subtitles(&segments, &SubtitleConfig::default(), 0.0);

        let rebuilt: Vec<Word> = cards.iter().flat_map(|c| c.words.clone()).collect();
        let original: Vec<Word> = segments.iter().flat_map(|s| s.words.clone()).collect();
        assert_eq!(rebuilt, original);
        assert_eq!(cards.len(), 6);
    }

    #[test]
    fn test_translated_track_keeps_timing() {
        let segments = sample_segments();
        let texts: Vec<String> = vec![
            "premier point important".to_string(),
            "deuxième".to_string(),
            "et le dernier point, enfin".to_string(),
        ];
        let translated = create_translated_segments(&segments, &texts).unwrap();
        let track = short_subtitle_track(&translated, &SubtitleConfig::default());

        assert_eq!(track.duration, total_duration(&segments));
        assert_eq!(track.subtitles.first().unwrap().start, 0.0);
        assert_eq!(track.subtitles.last().unwrap().end, track.duration);
    }

    #[test]
    fn test_formatters() {
        let cards = generate_subtitles(&sample_segments(), &SubtitleConfig::default(), 0.0);

        let srt = SrtFormatter.format(&cards);
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:01,400\nw0x0 w0x1 w0x2\n"));

        let json = JsonFormatter::default().format(&cards);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["metadata"]["subtitle_count"], 6);
        assert_eq!(value["subtitles"][0]["words"][2]["word"], "w0x2");

        assert_eq!(create_formatter(OutputFormat::Srt).extension(), "srt");
        assert_eq!(create_formatter(OutputFormat::Json).extension(), "json");
    }
}
