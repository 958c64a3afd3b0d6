//! Per-chunk short selection: ask the collaborator for a range, then enforce
//! the duration contract locally.
//!
//! The flow is an explicit state machine:
//!
//! ```text
//! Pending ──resolve──> Validated ──┐
//!    │                             ├──> Accepted
//!    │            ──trim──> Trimmed ┘
//!    └──────────────────────────────────> Rejected
//! ```
//!
//! There is exactly one deterministic retry (the trim); the collaborator is
//! never queried twice for the same chunk.

use crate::error::Result;
use crate::llm::{generate_structured, prompts, TextGenerator};
use crate::transcript::{total_duration, Segment};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Duration contract for a short, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Target minimum short duration (default: 30s).
    pub min_duration: f64,
    /// Target maximum short duration (default: 60s).
    pub max_duration: f64,
    /// Relative tolerance applied to both bounds (default: 0.1).
    pub tolerance: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_duration: 30.0,
            max_duration: 60.0,
            tolerance: 0.1,
        }
    }
}

impl SelectionConfig {
    /// Longest accepted short: `max_duration` plus the tolerance threshold.
    pub fn duration_limit(&self) -> f64 {
        self.max_duration * (1.0 + self.tolerance)
    }

    /// Shortest accepted short.
    pub fn duration_floor(&self) -> f64 {
        self.min_duration * (1.0 - self.tolerance)
    }

    /// Zero bounds are not treated as "no constraint": they reject every
    /// selection.
    pub fn is_constrained(&self) -> bool {
        self.min_duration > 0.0 && self.max_duration > 0.0
    }
}

/// Inclusive index range into the segments of one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub start_index: usize,
    pub end_index: usize,
}

/// Collaborator reply before validation. Fields may be missing or out of range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RawSelection {
    pub start_index: Option<i64>,
    pub end_index: Option<i64>,
}

impl RawSelection {
    pub fn new(start_index: i64, end_index: i64) -> Self {
        Self {
            start_index: Some(start_index),
            end_index: Some(end_index),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The reply had no usable index pair.
    MissingIndices,
    /// Indices out of bounds or `start_index >= end_index`.
    InvalidRange,
    /// A zero min or max duration.
    Unconstrained,
    /// Nothing fits under the duration limit, even after trimming.
    TooLong,
    /// Shorter than the minimum duration.
    TooShort,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::MissingIndices => write!(f, "missing indices"),
            RejectReason::InvalidRange => write!(f, "invalid range"),
            RejectReason::Unconstrained => write!(f, "unconstrained duration"),
            RejectReason::TooLong => write!(f, "too long"),
            RejectReason::TooShort => write!(f, "too short"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionState {
    Pending(RawSelection),
    Validated {
        range: SelectionResult,
        segments: Vec<Segment>,
    },
    Trimmed {
        range: SelectionResult,
        segments: Vec<Segment>,
    },
    Accepted {
        range: SelectionResult,
        segments: Vec<Segment>,
        trimmed: bool,
    },
    Rejected(RejectReason),
}

impl SelectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SelectionState::Accepted { .. } | SelectionState::Rejected(_)
        )
    }

    /// Advance one transition. Terminal states return themselves.
    pub fn step(self, chunk: &[Segment], config: &SelectionConfig) -> SelectionState {
        match self {
            SelectionState::Pending(raw) => {
                if !config.is_constrained() {
                    return SelectionState::Rejected(RejectReason::Unconstrained);
                }
                let range = match resolve(raw, chunk.len()) {
                    Ok(range) => range,
                    Err(reason) => return SelectionState::Rejected(reason),
                };

                let segments = chunk[range.start_index..=range.end_index].to_vec();
                if total_duration(&segments) <= config.duration_limit() {
                    SelectionState::Validated { range, segments }
                } else {
                    let segments = trim_to_duration(&segments, config.duration_limit());
                    let range = SelectionResult {
                        start_index: range.start_index,
                        end_index: range.start_index + segments.len().saturating_sub(1),
                    };
                    SelectionState::Trimmed { range, segments }
                }
            }
            SelectionState::Validated { range, segments } => accept(range, segments, false, config),
            SelectionState::Trimmed { range, segments } => accept(range, segments, true, config),
            terminal => terminal,
        }
    }

    /// Drive the machine from `Pending(raw)` to a terminal state.
    pub fn run(raw: RawSelection, chunk: &[Segment], config: &SelectionConfig) -> SelectionState {
        let mut state = SelectionState::Pending(raw);
        while !state.is_terminal() {
            state = state.step(chunk, config);
        }
        state
    }
}

fn accept(
    range: SelectionResult,
    segments: Vec<Segment>,
    trimmed: bool,
    config: &SelectionConfig,
) -> SelectionState {
    if segments.is_empty() {
        return SelectionState::Rejected(RejectReason::TooLong);
    }
    if total_duration(&segments) < config.duration_floor() {
        return SelectionState::Rejected(RejectReason::TooShort);
    }
    SelectionState::Accepted {
        range,
        segments,
        trimmed,
    }
}

/// Check a raw reply against a chunk of `len` segments.
pub fn resolve(raw: RawSelection, len: usize) -> std::result::Result<SelectionResult, RejectReason> {
    let (Some(start), Some(end)) = (raw.start_index, raw.end_index) else {
        return Err(RejectReason::MissingIndices);
    };

    if start < 0 || start >= end || end >= len as i64 {
        return Err(RejectReason::InvalidRange);
    }

    Ok(SelectionResult {
        start_index: start as usize,
        end_index: end as usize,
    })
}

/// Keep leading segments while their cumulative duration stays within
/// `limit`, dropping the tail. A compliant selection comes back unchanged.
pub fn trim_to_duration(segments: &[Segment], limit: f64) -> Vec<Segment> {
    segments
        .iter()
        .scan(0.0, |elapsed, segment| {
            *elapsed += segment.duration();
            (*elapsed <= limit).then(|| segment.clone())
        })
        .collect()
}

/// Chooses one short per chunk through the collaborator.
pub struct ContentSelector {
    generator: Arc<dyn TextGenerator>,
    config: SelectionConfig,
}

impl ContentSelector {
    pub fn new(generator: Arc<dyn TextGenerator>, config: SelectionConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Run request, resolve, validate and trim for one chunk.
    ///
    /// Returns an error only when the collaborator could not be reached; a bad
    /// reply ends in `SelectionState::Rejected`.
    pub async fn select(&self, chunk: &[Segment]) -> Result<SelectionState> {
        if !self.config.is_constrained() {
            return Ok(SelectionState::Rejected(RejectReason::Unconstrained));
        }
        if chunk.len() < 2 {
            return Ok(SelectionState::Rejected(RejectReason::InvalidRange));
        }

        let prompt = prompts::select_short(chunk, &self.config);
        let raw = generate_structured::<RawSelection>(self.generator.as_ref(), &prompt)
            .await?
            .unwrap_or_default();

        debug!(
            "{} selected {:?}..{:?} of {} segments",
            self.generator.name(),
            raw.start_index,
            raw.end_index,
            chunk.len()
        );

        Ok(SelectionState::run(raw, chunk, &self.config))
    }
}
