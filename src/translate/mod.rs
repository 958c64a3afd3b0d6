//! Sentence-level translation through the text-generation collaborator.

pub mod remap;

pub use remap::{create_translated_segments, remap_segment_timing};

use crate::error::Result;
use crate::llm::{prompts, TextGenerator};
use tracing::{debug, info, warn};

/// Stand-in for a line the collaborator failed to return.
pub const PLACEHOLDER: &str = ".";

/// Window settings for [`translate_segments`].
#[derive(Debug, Clone, Copy)]
pub struct TranslationWindow {
    /// Sentences sent per request (default: 12).
    pub chunk_size: usize,
    /// Sentences repeated from the previous request for context (default: 2).
    pub overlap: usize,
}

impl Default for TranslationWindow {
    fn default() -> Self {
        Self {
            chunk_size: 12,
            overlap: 2,
        }
    }
}

/// Translate sentence texts in overlapping windows.
///
/// Each window after the first drops its leading `overlap` lines, which only
/// serve as context. A reply with the wrong number of lines is padded with
/// [`PLACEHOLDER`] or truncated, so the output always has one line per input.
pub async fn translate_segments(
    generator: &dyn TextGenerator,
    texts: &[String],
    source_lang: &str,
    target_lang: &str,
    window: TranslationWindow,
) -> Result<Vec<String>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_size = window.chunk_size.max(1);
    let overlap = window.overlap.min(chunk_size - 1);
    let step = chunk_size - overlap;

    info!(
        "Translating {} sentences from {} to {}",
        texts.len(),
        language_code_to_name(source_lang),
        language_code_to_name(target_lang)
    );

    let mut translated = Vec::with_capacity(texts.len());
    for (i, start) in (0..texts.len()).step_by(step).enumerate() {
        let chunk = &texts[start..(start + chunk_size).min(texts.len())];
        let lines = translate_chunk(generator, chunk, source_lang, target_lang).await?;
        let skip = if i == 0 { 0 } else { overlap };
        translated.extend(lines.into_iter().skip(skip));
    }

    Ok(fit_to_count(translated, texts.len()))
}

async fn translate_chunk(
    generator: &dyn TextGenerator,
    chunk: &[String],
    source_lang: &str,
    target_lang: &str,
) -> Result<Vec<String>> {
    let prompt = prompts::translate_lines(chunk, source_lang, target_lang);
    let reply = generator.generate(&prompt).await?;
    // Blank separator lines would shift every later translation.
    let lines: Vec<String> = reply
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    if lines.len() != chunk.len() {
        warn!(
            "Translation returned {} lines for {} sentences, repairing",
            lines.len(),
            chunk.len()
        );
    } else {
        debug!("Translated {} sentences", chunk.len());
    }

    Ok(fit_to_count(lines, chunk.len()))
}

/// Pad with placeholders or truncate to exactly `count` lines. Empty lines
/// become placeholders too.
fn fit_to_count(mut lines: Vec<String>, count: usize) -> Vec<String> {
    lines.resize(count, PLACEHOLDER.to_string());
    for line in lines.iter_mut().filter(|l| l.is_empty()) {
        *line = PLACEHOLDER.to_string();
    }
    lines
}

/// Convert language code to full language name for prompts.
pub fn language_code_to_name(code: &str) -> &'static str {
    match code.to_lowercase().as_str() {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "nl" => "Dutch",
        "pl" => "Polish",
        "tr" => "Turkish",
        "uk" => "Ukrainian",
        "sv" => "Swedish",
        "id" => "Indonesian",
        "vi" => "Vietnamese",
        "el" => "Greek",
        "he" => "Hebrew",
        "ro" => "Romanian",
        _ => "the target language",
    }
}
