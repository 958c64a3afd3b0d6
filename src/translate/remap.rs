use super::PLACEHOLDER;
use crate::error::{Result, ShortsmithError};
use crate::transcript::{Segment, Word};

/// Give `text` word timings spread over `segment`'s span.
///
/// Word boundaries are placed by cumulative character count (tokens joined
/// without spaces), so the result starts and ends exactly where the source
/// segment does. This is a proportional estimate, not an alignment.
pub fn remap_segment_timing(segment: &Segment, text: &str) -> Segment {
    let tokens: Vec<&str> = match text.split_whitespace().collect::<Vec<_>>() {
        tokens if tokens.is_empty() => vec![PLACEHOLDER],
        tokens => tokens,
    };

    let total_chars: usize = tokens.iter().map(|t| t.chars().count()).sum();
    let duration = segment.duration();
    let boundary = |chars_before: usize| {
        if total_chars == 0 {
            segment.start
        } else {
            segment.start + duration * chars_before as f64 / total_chars as f64
        }
    };

    let mut chars_before = 0;
    let mut words: Vec<Word> = tokens
        .iter()
        .map(|token| {
            let start = boundary(chars_before);
            chars_before += token.chars().count();
            Word::new(*token, start, boundary(chars_before))
        })
        .collect();

    // Pin the outer edges so rounding never moves the segment span.
    if let Some(first) = words.first_mut() {
        first.start = segment.start;
    }
    if let Some(last) = words.last_mut() {
        last.end = segment.end;
    }

    Segment {
        text: tokens.join(" "),
        start: segment.start,
        end: segment.end,
        words,
    }
}

/// Pair each segment with its translation and remap word timings.
///
/// The two lists must have the same length; anything else means the
/// translation step lost track of sentence boundaries and is an error.
pub fn create_translated_segments(segments: &[Segment], texts: &[String]) -> Result<Vec<Segment>> {
    if segments.len() != texts.len() {
        return Err(ShortsmithError::SegmentCountMismatch {
            expected: segments.len(),
            actual: texts.len(),
        });
    }

    Ok(segments
        .iter()
        .zip(texts)
        .map(|(segment, text)| remap_segment_timing(segment, text))
        .collect())
}
