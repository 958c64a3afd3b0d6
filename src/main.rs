use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use shortsmith::config::{Config, OutputFormat, Provider};
use shortsmith::llm::create_generator;
use shortsmith::pipeline::{generate_short_proposals, print_summary, PipelineConfig};
use shortsmith::subtitle::{create_formatter, json::JsonFormatter, SubtitleFormatter};
use shortsmith::transcript::{subdivide_segments, TranscriptDocument, Word};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "shortsmith")]
#[command(version, about = "Cut long-form transcripts into subtitled shorts")]
#[command(long_about = "Turn a word-level video transcript into short, self-contained clips with timed subtitle cards, using OpenAI or Google Gemini to pick the content.")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Merge raw word-level output into a sentence transcript
    Sentences {
        /// JSON array of {"word", "start", "end"} objects
        words: PathBuf,

        /// Output transcript (.yaml or .json, defaults to <input>.yaml)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Transcript language code (e.g., en, fr)
        #[arg(short, long, default_value = "en")]
        language: String,
    },

    /// Split long sentences into shorter clauses, rewriting the transcript
    Subdivide {
        /// Transcript file (.yaml or .json)
        transcript: PathBuf,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Select shorts and write their subtitle tracks
    Propose {
        /// Transcript file (.yaml or .json)
        transcript: PathBuf,

        /// Output directory (defaults to <transcript>_shorts)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: srt, json
        #[arg(short, long)]
        format: Option<String>,

        /// Translate subtitles to target language (e.g., fr, es)
        #[arg(long)]
        translate: Option<String>,

        /// Generate title, tags and viral score for each short
        #[arg(long)]
        metadata: bool,

        /// Number of concurrent API requests
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Disable progress bar
        #[arg(long)]
        no_progress: bool,

        #[command(flatten)]
        llm: LlmArgs,
    },
}

#[derive(Args)]
struct LlmArgs {
    /// Text generation provider: gemini, openai
    #[arg(short, long)]
    provider: Option<String>,

    /// Model override for the provider
    #[arg(short, long)]
    model: Option<String>,
}

impl LlmArgs {
    /// Resolve the provider and fold CLI overrides into the config.
    fn apply(&self, config: &mut Config) -> Result<Provider> {
        let provider: Provider = match self.provider {
            Some(ref p) => p.parse().map_err(|e: String| anyhow::anyhow!(e))?,
            None => config.default_provider,
        };
        if let Some(ref model) = self.model {
            config.model = Some(model.clone());
        }
        Ok(provider)
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn derive_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let mut output = input.to_path_buf();
    output.set_file_name(format!("{}{}", stem.to_string_lossy(), suffix));
    output
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let mut config = Config::load().context("Failed to load configuration")?;

    match cli.command {
        Command::Sentences {
            words,
            output,
            language,
        } => {
            let output = output.unwrap_or_else(|| derive_output_path(&words, ".yaml"));
            run_sentences(&words, &output, &language, &config)
        }
        Command::Subdivide { transcript, llm } => {
            let provider = llm.apply(&mut config)?;
            run_subdivide(&transcript, &config, provider).await
        }
        Command::Propose {
            transcript,
            output,
            format,
            translate,
            metadata,
            concurrency,
            no_progress,
            llm,
        } => {
            let provider = llm.apply(&mut config)?;
            let format: OutputFormat = match format {
                Some(f) => f.parse().map_err(|e: String| anyhow::anyhow!(e))?,
                None => config.default_format,
            };
            if let Some(c) = concurrency {
                config.concurrency = c;
            }
            let output = output.unwrap_or_else(|| derive_output_path(&transcript, "_shorts"));

            let pipeline_config = PipelineConfig {
                window: config.window.clone(),
                selection: config.selection.clone(),
                subtitles: config.subtitles.clone(),
                source_language: String::new(),
                translate_to: translate,
                with_metadata: metadata,
                concurrency: config.concurrency,
                show_progress: !no_progress,
            };
            run_propose(&transcript, &output, format, &config, provider, pipeline_config).await
        }
    }
}

fn run_sentences(words_path: &Path, output: &Path, language: &str, config: &Config) -> Result<()> {
    let contents = std::fs::read_to_string(words_path)
        .with_context(|| format!("Failed to read {}", words_path.display()))?;
    let words: Vec<Word> = serde_json::from_str(&contents).context("Failed to parse word list")?;

    info!("Merging {} words into sentences", words.len());
    let document = TranscriptDocument::from_words(language, words, &config.sentences);
    document
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Wrote {} sentences to {}", document.segments.len(), output.display());
    Ok(())
}

async fn run_subdivide(path: &Path, config: &Config, provider: Provider) -> Result<()> {
    config
        .validate(provider)
        .context("Configuration validation failed")?;
    let generator = create_generator(config, provider)?;

    let mut document = TranscriptDocument::load(path).context("Failed to load transcript")?;
    let gap_splits = document
        .split_on_long_gaps(config.sentences.gap_threshold_ms)
        .context("Transcript failed the word alignment check")?;
    if gap_splits > 0 {
        info!("Split {} sentences on long pauses", gap_splits);
    }

    let before = document.segments.len();
    document.segments = subdivide_segments(
        &document.segments,
        config.sentences.max_segment_length,
        generator.as_ref(),
    )
    .await;

    // Splits are verbatim, so the cross-check must still hold.
    document
        .to_segments()
        .context("Subdivided transcript no longer aligns with its words")?;
    document
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Subdivided {} sentences into {}", before, document.segments.len());
    Ok(())
}

async fn run_propose(
    path: &Path,
    output_dir: &Path,
    format: OutputFormat,
    config: &Config,
    provider: Provider,
    mut pipeline_config: PipelineConfig,
) -> Result<()> {
    config
        .validate(provider)
        .context("Configuration validation failed")?;
    let generator = create_generator(config, provider)?;

    let document = TranscriptDocument::load(path).context("Failed to load transcript")?;
    let segments = document
        .to_segments()
        .context("Transcript failed the word alignment check")?;
    pipeline_config.source_language = document.language.clone();

    info!("Transcript: {}", path.display());
    info!("Output:     {}", output_dir.display());
    info!("Format:     {}", format);
    info!("Provider:   {}", provider);
    if let Some(ref target) = pipeline_config.translate_to {
        info!("Translate to: {}", target);
    }

    // Set up Ctrl+C handler
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();
    ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        eprintln!("\nCancelling... press Ctrl+C again to force quit");
    })
    .context("Failed to set Ctrl+C handler")?;

    let result = generate_short_proposals(&segments, generator, &pipeline_config, cancelled)
        .await
        .context("Short generation failed")?;

    if result.proposals.is_empty() {
        warn!("No shorts found; try a longer transcript or a wider duration tolerance");
        print_summary(&result);
        return Ok(());
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let subtitle_language = pipeline_config
        .translate_to
        .clone()
        .unwrap_or_else(|| document.language.clone());
    let formatter: Box<dyn SubtitleFormatter> = match format {
        OutputFormat::Json => Box::new(JsonFormatter {
            language: Some(subtitle_language),
            provider: Some(provider.to_string()),
        }),
        other => create_formatter(other),
    };

    for (i, proposal) in result.proposals.iter().enumerate() {
        let file = output_dir.join(format!("short_{:02}.{}", i + 1, formatter.extension()));
        std::fs::write(&file, formatter.format(&proposal.track.subtitles))
            .with_context(|| format!("Failed to write {}", file.display()))?;
    }

    let summary = output_dir.join("proposals.json");
    std::fs::write(&summary, serde_json::to_string_pretty(&result.proposals)?)
        .with_context(|| format!("Failed to write {}", summary.display()))?;

    print_summary(&result);
    Ok(())
}
