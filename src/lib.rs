pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod selection;
pub mod subtitle;
pub mod transcript;
pub mod translate;

pub use config::Config;
pub use error::{Result, ShortsmithError};
pub use pipeline::{
    generate_short_proposals, print_summary, PipelineConfig, PipelineResult, PipelineStats,
    ShortProposal,
};
pub use transcript::{Segment, TranscriptDocument, Word};
