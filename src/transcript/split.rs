use crate::llm::{generate_structured, prompts, TextGenerator};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct SplitTextOutput {
    segments: Vec<String>,
}

/// Split text after commas, keeping the comma on the left piece.
///
/// Commas between two digits ("1,000") and commas glued to the next word
/// ("a,b") are not split points: a piece boundary must also be a word
/// boundary so the pieces still line up with the word timings.
pub fn split_on_commas(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut pieces = Vec::new();
    let mut piece_start = 0;

    for (i, &(byte_idx, c)) in chars.iter().enumerate() {
        if c != ',' {
            continue;
        }

        let prev = i.checked_sub(1).map(|p| chars[p].1);
        let next = chars.get(i + 1).map(|&(_, n)| n);

        let between_digits =
            prev.is_some_and(|p| p.is_ascii_digit()) && next.is_some_and(|n| n.is_ascii_digit());
        let at_word_boundary = next.map_or(true, char::is_whitespace);

        if between_digits || !at_word_boundary {
            continue;
        }

        let end = byte_idx + c.len_utf8();
        pieces.push(text[piece_start..end].trim().to_string());
        piece_start = end;
    }

    pieces.push(text[piece_start..].trim().to_string());
    pieces.into_iter().filter(|p| !p.is_empty()).collect()
}

/// Split one sentence into clause-sized pieces.
///
/// Comma splitting runs first. Pieces still longer than `max_length`
/// characters are handed to the collaborator, and its answer is kept only if
/// joining the returned pieces with single spaces gives back the piece
/// verbatim. Anything else leaves the piece untouched.
pub async fn split_long_unit(
    text: &str,
    max_length: usize,
    generator: &dyn TextGenerator,
) -> Vec<String> {
    let mut result = Vec::new();

    for piece in split_on_commas(text) {
        if piece.chars().count() <= max_length {
            result.push(piece);
            continue;
        }
        result.extend(split_with_generator(&piece, generator).await);
    }

    result
}

async fn split_with_generator(text: &str, generator: &dyn TextGenerator) -> Vec<String> {
    let prompt = prompts::split_long_text(text);

    let output = match generate_structured::<SplitTextOutput>(generator, &prompt).await {
        Ok(Some(output)) => output,
        Ok(None) => return vec![text.to_string()],
        Err(e) => {
            warn!("Sentence split request failed, keeping original text: {}", e);
            return vec![text.to_string()];
        }
    };

    if output.segments.join(" ") == text {
        debug!("Split long sentence into {} pieces", output.segments.len());
        output.segments
    } else {
        warn!("Split pieces do not reassemble the original text, keeping it unsplit");
        vec![text.to_string()]
    }
}

/// Subdivide every sentence text of a transcript, preserving order.
pub async fn subdivide_segments(
    segments: &[String],
    max_length: usize,
    generator: &dyn TextGenerator,
) -> Vec<String> {
    let mut result = Vec::with_capacity(segments.len());
    for segment in segments {
        result.extend(split_long_unit(segment, max_length, generator).await);
    }
    result
}
