// JSON subtitle format with per-word timing for the renderer
use super::{Subtitle, SubtitleFormatter};
use serde::Serialize;

#[derive(Default)]
pub struct JsonFormatter {
    pub language: Option<String>,
    pub provider: Option<String>,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    metadata: JsonMetadata,
    subtitles: Vec<JsonSubtitle<'a>>,
}

#[derive(Serialize)]
struct JsonMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
    subtitle_count: usize,
}

#[derive(Serialize)]
struct JsonSubtitle<'a> {
    index: usize,
    start: f64,
    end: f64,
    start_formatted: String,
    end_formatted: String,
    text: &'a str,
    words: Vec<JsonWord<'a>>,
}

#[derive(Serialize)]
struct JsonWord<'a> {
    word: &'a str,
    start: f64,
    end: f64,
}

impl SubtitleFormatter for JsonFormatter {
    fn format(&self, subtitles: &[Subtitle]) -> String {
        let output = JsonOutput {
            metadata: JsonMetadata {
                language: self.language.clone(),
                provider: self.provider.clone(),
                subtitle_count: subtitles.len(),
            },
            subtitles: subtitles
                .iter()
                .enumerate()
                .map(|(i, card)| JsonSubtitle {
                    index: i + 1,
                    start: card.start,
                    end: card.end,
                    start_formatted: format_timestamp(card.start),
                    end_formatted: format_timestamp(card.end),
                    text: &card.text,
                    words: card
                        .words
                        .iter()
                        .map(|w| JsonWord {
                            word: &w.text,
                            start: w.start,
                            end: w.end,
                        })
                        .collect(),
                })
                .collect(),
        };

        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

fn format_timestamp(seconds: f64) -> String {
    super::srt::format_timestamp(seconds).replace(',', ".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Word;

    #[test]
    fn test_json_format_keeps_word_timing() {
        let subtitles = vec![Subtitle {
            text: "Hello, world!".to_string(),
            start: 1.5,
            end: 4.0,
            words: vec![Word::new("Hello,", 1.5, 2.0), Word::new("world!", 2.5, 4.0)],
        }];

        let formatter = JsonFormatter {
            language: Some("en".to_string()),
            provider: None,
        };
        let output = formatter.format(&subtitles);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["metadata"]["subtitle_count"], 1);
        assert_eq!(value["metadata"]["language"], "en");
        assert_eq!(value["subtitles"][0]["text"], "Hello, world!");
        assert_eq!(value["subtitles"][0]["start_formatted"], "00:00:01.500");
        assert_eq!(value["subtitles"][0]["words"][1]["word"], "world!");
        assert_eq!(value["subtitles"][0]["words"][1]["start"], 2.5);
    }
}
