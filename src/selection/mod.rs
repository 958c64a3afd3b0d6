pub mod metadata;
pub mod orchestrator;
pub mod selector;
pub mod window;

pub use metadata::{generate_short_metadata, rank_by_viral_score, ShortMetadata};
pub use orchestrator::{SelectionOrchestrator, SelectionStats};
pub use selector::{
    resolve, trim_to_duration, ContentSelector, RawSelection, RejectReason, SelectionConfig,
    SelectionResult, SelectionState,
};
pub use window::{chunk_transcript, Chunk, WindowConfig};

use crate::transcript::{total_duration, Segment};
use serde::Serialize;

/// A selected, duration-compliant run of segments from one chunk.
#[derive(Debug, Clone, Serialize)]
pub struct Short {
    pub chunk_index: usize,
    pub range: SelectionResult,
    pub segments: Vec<Segment>,
    /// Tail segments were dropped to meet the duration limit.
    pub trimmed: bool,
}

impl Short {
    pub fn duration(&self) -> f64 {
        total_duration(&self.segments)
    }

    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
