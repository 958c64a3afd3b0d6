use crate::transcript::Segment;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Configuration for slicing a transcript into overlapping windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window length in seconds (default: 180).
    pub chunk_duration: f64,
    /// Overlap between consecutive windows in seconds (default: 60).
    pub overlap_duration: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            chunk_duration: 180.0,
            overlap_duration: 60.0,
        }
    }
}

impl WindowConfig {
    pub fn step(&self) -> f64 {
        self.chunk_duration - self.overlap_duration
    }
}

/// A duration-bounded window of consecutive segments.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Position among the emitted (non-empty) chunks.
    pub index: usize,
    pub window_start: f64,
    pub window_end: f64,
    pub segments: Vec<Segment>,
}

/// Slice segments into overlapping windows.
///
/// Windows start at the first segment's start and advance by
/// `chunk_duration - overlap_duration` until they pass the last segment's end.
/// Each window holds every segment lying fully inside it; empty windows are
/// skipped. A segment longer than the overlap may straddle every window
/// boundary it meets and then lands in no chunk.
pub fn chunk_transcript(segments: &[Segment], config: &WindowConfig) -> Vec<Chunk> {
    let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
        return Vec::new();
    };

    let step = config.step();
    if step <= 0.0 {
        warn!(
            "Chunk overlap ({}s) must be shorter than chunk duration ({}s)",
            config.overlap_duration, config.chunk_duration
        );
        return Vec::new();
    }

    let transcript_start = first.start;
    let transcript_end = last.end;

    let chunks: Vec<Chunk> = (0u32..)
        .map(|k| transcript_start + k as f64 * step)
        .take_while(|&window_start| window_start < transcript_end)
        .filter_map(|window_start| {
            let window_end = window_start + config.chunk_duration;
            let members: Vec<Segment> = segments
                .iter()
                .filter(|s| s.start >= window_start && s.end <= window_end)
                .cloned()
                .collect();
            (!members.is_empty()).then_some((window_start, window_end, members))
        })
        .enumerate()
        .map(|(index, (window_start, window_end, segments))| Chunk {
            index,
            window_start,
            window_end,
            segments,
        })
        .collect();

    debug!(
        "Split {:.1}s of transcript into {} chunks",
        transcript_end - transcript_start,
        chunks.len()
    );

    chunks
}
