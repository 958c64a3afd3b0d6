use crate::error::{Result, ShortsmithError};
use crate::llm::TextGenerator;
use crate::selection::{
    chunk_transcript, generate_short_metadata, rank_by_viral_score, ContentSelector, SelectionConfig,
    SelectionOrchestrator, SelectionStats, Short, ShortMetadata, WindowConfig,
};
use crate::subtitle::{short_subtitle_track, SubtitleConfig, SubtitleTrack};
use crate::transcript::{total_duration, Segment};
use crate::translate::{create_translated_segments, translate_segments, TranslationWindow};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Configuration for the short proposal pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub window: WindowConfig,
    pub selection: SelectionConfig,
    pub subtitles: SubtitleConfig,
    /// Transcript language code.
    pub source_language: String,
    /// Target language for translated subtitles (optional).
    pub translate_to: Option<String>,
    /// Ask the collaborator for title, tags and viral score.
    pub with_metadata: bool,
    /// Number of concurrent collaborator requests.
    pub concurrency: usize,
    /// Show progress bars.
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            selection: SelectionConfig::default(),
            subtitles: SubtitleConfig::default(),
            source_language: "en".to_string(),
            translate_to: None,
            with_metadata: false,
            concurrency: 4,
            show_progress: true,
        }
    }
}

/// One selected short ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct ShortProposal {
    pub short: Short,
    /// Short segments in the target language, timings remapped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated: Option<Vec<Segment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ShortMetadata>,
    /// Cards in the target language when translated, source language otherwise.
    pub track: SubtitleTrack,
}

/// Statistics from the pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Total time taken for the entire pipeline.
    pub total_time: Duration,
    /// Time taken for chunk selection.
    pub selection_time: Duration,
    /// Time taken for translation and metadata.
    pub enrichment_time: Duration,
    /// Spoken duration of the input transcript.
    pub transcript_duration: f64,
    pub selection: SelectionStats,
    /// Collaborator used for every request.
    pub provider: String,
}

#[derive(Debug)]
pub struct PipelineResult {
    /// Proposals ranked by viral score when metadata was requested, chunk
    /// order otherwise.
    pub proposals: Vec<ShortProposal>,
    pub stats: PipelineStats,
}

/// Turn a sentence-level transcript into ranked short proposals.
///
/// 1. Slices the transcript into overlapping windows
/// 2. Selects one short per window through the collaborator
/// 3. Optionally translates each short and remaps word timings
/// 4. Optionally generates publishing metadata and ranks by viral score
/// 5. Builds the subtitle track for every short
///
/// Setting `cancelled` stops the run at the next chunk or stage boundary.
pub async fn generate_short_proposals(
    segments: &[Segment],
    generator: Arc<dyn TextGenerator>,
    config: &PipelineConfig,
    cancelled: Arc<AtomicBool>,
) -> Result<PipelineResult> {
    let start_time = Instant::now();
    let transcript_duration = total_duration(segments);

    info!(
        "Proposing shorts from {} segments ({:.1}s of speech) with {}",
        segments.len(),
        transcript_duration,
        generator.name()
    );

    let chunks = chunk_transcript(segments, &config.window);
    info!(
        "Created {} chunks of up to {:.0}s ({:.0}s overlap)",
        chunks.len(),
        config.window.chunk_duration,
        config.window.overlap_duration
    );

    let selection_start = Instant::now();
    let selector = ContentSelector::new(generator.clone(), config.selection.clone());
    let orchestrator =
        SelectionOrchestrator::new(selector, config.concurrency).with_progress(config.show_progress);
    let (shorts, selection_stats) = orchestrator.process_chunks(chunks, cancelled.clone()).await?;
    let selection_time = selection_start.elapsed();

    if shorts.is_empty() {
        warn!("No chunk produced an acceptable short");
    }

    let enrichment_start = Instant::now();
    let mut proposals = Vec::with_capacity(shorts.len());
    for short in shorts {
        check_cancelled(&cancelled)?;

        let translated = match config.translate_to {
            Some(ref target) => Some(
                translate_short(generator.as_ref(), &short, &config.source_language, target).await?,
            ),
            None => None,
        };

        let metadata = if config.with_metadata {
            // Metadata follows the language of the subtitles.
            let text = match translated {
                Some(ref segments) => segments
                    .iter()
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
                None => short.text(),
            };
            match generate_short_metadata(generator.as_ref(), &text).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Metadata for chunk {} failed: {}", short.chunk_index, e);
                    None
                }
            }
        } else {
            None
        };

        let track_segments = translated.as_deref().unwrap_or(&short.segments[..]);
        let track = short_subtitle_track(track_segments, &config.subtitles);
        proposals.push(ShortProposal {
            short,
            translated,
            metadata,
            track,
        });
    }
    let enrichment_time = enrichment_start.elapsed();

    if config.with_metadata {
        rank_by_viral_score(&mut proposals, |p| p.metadata.as_ref());
    }

    let stats = PipelineStats {
        total_time: start_time.elapsed(),
        selection_time,
        enrichment_time,
        transcript_duration,
        selection: selection_stats,
        provider: generator.name().to_string(),
    };

    info!(
        "Pipeline complete: {} proposals in {:.2}s",
        proposals.len(),
        stats.total_time.as_secs_f64()
    );

    Ok(PipelineResult { proposals, stats })
}

async fn translate_short(
    generator: &dyn TextGenerator,
    short: &Short,
    source_lang: &str,
    target_lang: &str,
) -> Result<Vec<Segment>> {
    let texts: Vec<String> = short.segments.iter().map(|s| s.text.clone()).collect();
    let translated = translate_segments(
        generator,
        &texts,
        source_lang,
        target_lang,
        TranslationWindow::default(),
    )
    .await?;
    create_translated_segments(&short.segments, &translated)
}

fn check_cancelled(cancelled: &AtomicBool) -> Result<()> {
    if cancelled.load(Ordering::Relaxed) {
        warn!("Pipeline cancelled");
        return Err(ShortsmithError::Cancelled);
    }
    Ok(())
}

/// Print a summary of the pipeline results.
pub fn print_summary(result: &PipelineResult) {
    let stats = &result.stats;
    let selection = &stats.selection;

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                      Short Proposals Ready                     ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Proposals:  {}", result.proposals.len());
    println!("  Provider:   {}", stats.provider);
    println!("  Transcript: {:.1}s of speech", stats.transcript_duration);
    println!();
    println!("  Chunks:");
    println!("    Total:       {}", selection.total_chunks);
    println!(
        "    Accepted:    {} ({} trimmed)",
        selection.successful_chunks, selection.trimmed_chunks
    );
    println!("    Rejected:    {}", selection.rejected_chunks);
    let mut reasons: Vec<_> = selection.rejections.iter().collect();
    reasons.sort_by_key(|(reason, _)| reason.to_string());
    for (reason, count) in reasons {
        println!("      {:<12} {}", format!("{}:", reason), count);
    }
    println!("    Failed:      {}", selection.failed_chunks);
    println!();
    for (i, proposal) in result.proposals.iter().enumerate() {
        let title = proposal
            .metadata
            .as_ref()
            .map(|m| format!("{} [{}]", m.title, m.viral_score))
            .unwrap_or_else(|| format!("chunk {}", proposal.short.chunk_index));
        println!(
            "  #{:<3} {:>5.1}s  {} cards  {}",
            i + 1,
            proposal.track.duration,
            proposal.track.subtitles.len(),
            title
        );
    }
    println!();
    println!("  Timing:");
    println!("    Select:      {:.2}s", stats.selection_time.as_secs_f64());
    println!("    Enrich:      {:.2}s", stats.enrichment_time.as_secs_f64());
    println!("    Total:       {:.2}s", stats.total_time.as_secs_f64());
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}
