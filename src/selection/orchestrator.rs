use super::selector::{ContentSelector, RejectReason, SelectionState};
use super::window::Chunk;
use super::Short;
use crate::error::{Result, ShortsmithError};
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// How often an in-flight request checks the cancellation flag.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Outcome of one chunk.
#[derive(Debug)]
enum ChunkOutcome {
    Selected(Short),
    Rejected(RejectReason),
    Failed(String),
    Cancelled,
}

#[derive(Debug)]
struct ChunkResult {
    index: usize,
    outcome: ChunkOutcome,
    duration_ms: u64,
}

/// Statistics from the selection run.
#[derive(Debug, Clone, Default)]
pub struct SelectionStats {
    pub total_chunks: usize,
    pub successful_chunks: usize,
    /// Accepted only after dropping tail segments.
    pub trimmed_chunks: usize,
    pub rejected_chunks: usize,
    /// Collaborator unreachable for the chunk.
    pub failed_chunks: usize,
    pub rejections: HashMap<RejectReason, usize>,
    pub total_time: Duration,
    pub avg_chunk_time: Duration,
}

/// Dispatches chunk selection to the collaborator with bounded concurrency.
pub struct SelectionOrchestrator {
    selector: Arc<ContentSelector>,
    concurrency: usize,
    show_progress: bool,
}

impl SelectionOrchestrator {
    pub fn new(selector: ContentSelector, concurrency: usize) -> Self {
        Self {
            selector: Arc::new(selector),
            concurrency: concurrency.max(1),
            show_progress: true,
        }
    }

    /// Enable or disable progress bar display.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Select a short from every chunk. Shorts come back in chunk order.
    ///
    /// Per-chunk rejections and collaborator failures are counted and
    /// skipped. Setting `cancelled` stops dispatching new chunks, abandons
    /// in-flight requests and makes the whole run return `Cancelled`.
    pub async fn process_chunks(
        &self,
        chunks: Vec<Chunk>,
        cancelled: Arc<AtomicBool>,
    ) -> Result<(Vec<Short>, SelectionStats)> {
        if chunks.is_empty() {
            return Ok((Vec::new(), SelectionStats::default()));
        }

        let total_chunks = chunks.len();
        let start_time = Instant::now();

        info!(
            "Selecting shorts from {} chunks with {} concurrent requests",
            total_chunks, self.concurrency
        );

        let progress_bar = if self.show_progress {
            let pb = ProgressBar::new(total_chunks as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        // The semaphore bounds how many requests hit the collaborator at once
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut futures = FuturesUnordered::new();

        for chunk in chunks {
            let sem = semaphore.clone();
            let selector = self.selector.clone();
            let cancelled = cancelled.clone();
            let pb = progress_bar.clone();

            futures.push(async move {
                let index = chunk.index;
                let chunk_start = Instant::now();

                let outcome = match sem.acquire().await {
                    Ok(_permit) if !cancelled.load(Ordering::Relaxed) => {
                        debug!("Starting selection for chunk {}", index);
                        tokio::select! {
                            result = selector.select(&chunk.segments) => {
                                into_outcome(index, chunk.segments.len(), result)
                            }
                            _ = wait_for_cancel(&cancelled) => ChunkOutcome::Cancelled,
                        }
                    }
                    _ => ChunkOutcome::Cancelled,
                };

                if let Some(ref pb) = pb {
                    pb.inc(1);
                }

                ChunkResult {
                    index,
                    outcome,
                    duration_ms: chunk_start.elapsed().as_millis() as u64,
                }
            });
        }

        let mut results: Vec<ChunkResult> = Vec::with_capacity(total_chunks);
        while let Some(result) = futures.next().await {
            results.push(result);
        }

        if let Some(pb) = progress_bar {
            pb.finish_with_message("Selection complete");
        }

        if cancelled.load(Ordering::Relaxed) {
            warn!("Selection cancelled after {} chunks", results.len());
            return Err(ShortsmithError::Cancelled);
        }

        // Sort results by chunk index to maintain order
        results.sort_by_key(|r| r.index);

        let mut stats = SelectionStats {
            total_chunks,
            ..Default::default()
        };
        let mut shorts = Vec::new();
        let mut total_chunk_time_ms: u64 = 0;

        for result in results {
            total_chunk_time_ms += result.duration_ms;
            match result.outcome {
                ChunkOutcome::Selected(short) => {
                    stats.successful_chunks += 1;
                    if short.trimmed {
                        stats.trimmed_chunks += 1;
                    }
                    shorts.push(short);
                }
                ChunkOutcome::Rejected(reason) => {
                    stats.rejected_chunks += 1;
                    *stats.rejections.entry(reason).or_insert(0) += 1;
                }
                ChunkOutcome::Failed(reason) => {
                    debug!("Chunk {} skipped: {}", result.index, reason);
                    stats.failed_chunks += 1;
                }
                ChunkOutcome::Cancelled => return Err(ShortsmithError::Cancelled),
            }
        }

        stats.total_time = start_time.elapsed();
        stats.avg_chunk_time = Duration::from_millis(total_chunk_time_ms / total_chunks as u64);

        info!(
            "Selection complete: {}/{} chunks yielded a short ({} trimmed, {} rejected, {} failed) in {:.2}s",
            stats.successful_chunks,
            total_chunks,
            stats.trimmed_chunks,
            stats.rejected_chunks,
            stats.failed_chunks,
            stats.total_time.as_secs_f64()
        );

        Ok((shorts, stats))
    }
}

fn into_outcome(index: usize, len: usize, result: Result<SelectionState>) -> ChunkOutcome {
    match result {
        Ok(SelectionState::Accepted {
            range,
            segments,
            trimmed,
        }) => {
            debug!(
                "Chunk {} accepted segments {}..={} of {}",
                index, range.start_index, range.end_index, len
            );
            ChunkOutcome::Selected(Short {
                chunk_index: index,
                range,
                segments,
                trimmed,
            })
        }
        Ok(SelectionState::Rejected(reason)) => {
            debug!("Chunk {} rejected: {}", index, reason);
            ChunkOutcome::Rejected(reason)
        }
        Ok(other) => {
            warn!("Chunk {} stopped in a non-terminal state: {:?}", index, other);
            ChunkOutcome::Failed("non-terminal selection state".to_string())
        }
        Err(e) => {
            warn!("Chunk {} failed: {}", index, e);
            ChunkOutcome::Failed(e.to_string())
        }
    }
}

async fn wait_for_cancel(cancelled: &AtomicBool) {
    while !cancelled.load(Ordering::Relaxed) {
        tokio::time::sleep(CANCEL_POLL_INTERVAL).await;
    }
}
