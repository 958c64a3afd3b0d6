use crate::error::Result;
use crate::llm::{generate_structured, prompts, TextGenerator};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// Publishing metadata for a selected short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortMetadata {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Collaborator's engagement estimate, clamped to 0-100.
    #[serde(default, deserialize_with = "deserialize_score")]
    pub viral_score: u32,
}

/// Accepts integers, floats and numeric strings. Anything else scores 0.
fn deserialize_score<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let score = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(score.round().clamp(0.0, 100.0) as u32)
}

/// Ask the collaborator for title, description, tags and a viral score.
///
/// A malformed reply yields `Ok(None)`: the short is still usable without
/// metadata.
pub async fn generate_short_metadata(
    generator: &dyn TextGenerator,
    short_transcript: &str,
) -> Result<Option<ShortMetadata>> {
    let prompt = prompts::short_metadata(short_transcript);
    let metadata = generate_structured::<ShortMetadata>(generator, &prompt)
        .await?;

    if let Some(ref m) = metadata {
        debug!("Metadata: {:?} (score {})", m.title, m.viral_score);
    }
    Ok(metadata)
}

/// Stable sort by descending viral score. Items without metadata go last.
pub fn rank_by_viral_score<T, F>(items: &mut [T], metadata: F)
where
    F: Fn(&T) -> Option<&ShortMetadata>,
{
    items.sort_by_key(|item| {
        std::cmp::Reverse(metadata(item).map(|m| i64::from(m.viral_score)).unwrap_or(-1))
    });
}
