//! Prompt builders for each collaborator task.

use super::Prompt;
use crate::selection::SelectionConfig;
use crate::transcript::{total_duration, Segment};
use crate::translate::language_code_to_name;

const EDITOR_SYSTEM: &str = "You are a viral video editor. You turn long-form video \
transcripts into short, self-contained clips that keep the speaker's exact words.";

const LINGUIST_SYSTEM: &str = "You are a careful subtitle linguist. You never add, drop \
or reword content unless explicitly asked to translate it.";

/// Ask for a contiguous `{start_index, end_index}` range over the numbered
/// sentence list of one chunk.
pub fn select_short(chunk: &[Segment], config: &SelectionConfig) -> Prompt {
    let numbered = chunk
        .iter()
        .enumerate()
        .map(|(i, s)| format!("[{}] ({:.1}s) {}", i, s.duration(), s.text))
        .collect::<Vec<_>>()
        .join("\n");

    let task = format!(
        r#"Below is a transcript excerpt of {total:.0} seconds, one numbered segment per line with its spoken duration.

Select ONE contiguous range of segments that makes the most engaging, self-contained short.

Instructions:
1. The selected segments must add up to between {min:.0} and {max:.0} seconds of speech.
2. The range must start where the idea starts and end where it lands; skip filler and setup that needs outside context.
3. Use the segment numbers exactly as shown. Both bounds are inclusive.
4. Reply with a JSON object only: {{"start_index": <first segment number>, "end_index": <last segment number>}}

Segments:
{numbered}"#,
        total = total_duration(chunk),
        min = config.min_duration,
        max = config.max_duration,
    );

    Prompt {
        system: EDITOR_SYSTEM.to_string(),
        task,
        temperature: 0.7,
        structured: true,
    }
}

/// Ask for a verbatim split of one long sentence into shorter pieces.
pub fn split_long_text(text: &str) -> Prompt {
    let task = format!(
        r#"Split the following text into shorter, natural clauses for on-screen reading.

Rules:
1. Do not change, add or remove a single character: joining your pieces with single spaces must give back the exact input.
2. Only split between words.
3. Reply with a JSON object only: {{"segments": ["piece 1", "piece 2", ...]}}

Text:
{text}"#
    );

    Prompt {
        system: LINGUIST_SYSTEM.to_string(),
        task,
        temperature: 0.0,
        structured: true,
    }
}

/// Ask for a line-by-line translation, one output line per input line.
pub fn translate_lines(lines: &[String], source_lang: &str, target_lang: &str) -> Prompt {
    let task = format!(
        r#"Translate the following {count} lines from {source} to {target}.

Rules:
1. Return exactly {count} lines, in the same order, one translation per line.
2. Do not number, merge or split lines. Return ONLY the translations.

Lines:
{text}"#,
        count = lines.len(),
        source = language_code_to_name(source_lang),
        target = language_code_to_name(target_lang),
        text = lines.join("\n"),
    );

    Prompt {
        system: LINGUIST_SYSTEM.to_string(),
        task,
        temperature: 0.3,
        structured: false,
    }
}

/// Ask for publishing metadata of a finished short.
pub fn short_metadata(short_transcript: &str) -> Prompt {
    let task = format!(
        r#"Write publishing metadata for a short video with this transcript.

Reply with a JSON object only:
{{"title": "...", "description": "...", "tags": ["..."], "viral_score": <integer 0-100>}}

Transcript:
{short_transcript}"#
    );

    Prompt {
        system: EDITOR_SYSTEM.to_string(),
        task,
        temperature: 0.7,
        structured: true,
    }
}
