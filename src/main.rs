use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use podclip::cache::ResponseCache;
use podclip::clips::{clip_prefix, FfmpegTrimmer};
use podclip::config::PipelineConfig;
use podclip::context::RunContext;
use podclip::model::OllamaClient;
use podclip::pipeline::Pipeline;
use podclip::transcript::load_transcript;

/// Podclip - podcast highlight extractor
///
/// Asks a local language model for self-contained highlights in a transcribed
/// episode, maps them back to word timings and cuts them out as clips.
#[derive(Parser, Debug)]
#[command(name = "podclip")]
#[command(version = "0.1.0")]
#[command(about = "Podcast highlight extractor", long_about = None)]
struct Args {
    /// Source media file the clips are cut from
    #[arg(value_name = "INPUT")]
    input_file: PathBuf,

    /// Word-level transcript JSON (WhisperX layout)
    #[arg(long, value_name = "PATH")]
    transcript: PathBuf,

    /// Directory for clips, metadata.json and the text summary
    #[arg(long, value_name = "DIR")]
    output_dir: PathBuf,

    /// Optional JSON pipeline configuration
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Model id to request highlights from
    #[arg(long, value_name = "ID")]
    model: Option<String>,

    /// Base URL of the model server
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Response cache directory (defaults to OUTPUT_DIR/cache)
    #[arg(long, value_name = "DIR", conflicts_with = "no_cache")]
    cache_dir: Option<PathBuf>,

    /// Always query the model, ignoring cached responses
    #[arg(long)]
    no_cache: bool,

    /// Ask the model to confirm each clip before cutting it
    #[arg(long)]
    relevance_filter: bool,

    /// Chunk window length in minutes
    #[arg(long, value_name = "N")]
    window_minutes: Option<f64>,

    /// Seconds of context carried between consecutive chunks
    #[arg(long, value_name = "N")]
    overlap_seconds: Option<f64>,

    /// Recording name used in output file names (defaults to the input stem)
    #[arg(long, value_name = "NAME")]
    name: Option<String>,
}

impl Args {
    /// Validate CLI arguments
    fn validate(&self) -> Result<()> {
        if !self.input_file.is_file() {
            bail!("Input file does not exist: {:?}", self.input_file);
        }

        if !self.transcript.is_file() {
            bail!("Transcript file does not exist: {:?}", self.transcript);
        }

        if self.output_dir.exists() && !self.output_dir.is_dir() {
            bail!("Output path must be a directory: {:?}", self.output_dir);
        }

        Ok(())
    }

    /// File config (or defaults) with command-line overrides applied.
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(window) = self.window_minutes {
            config.window_minutes = window;
        }
        if let Some(overlap) = self.overlap_seconds {
            config.overlap_seconds = overlap;
        }
        if self.no_cache {
            config.use_cache = false;
        }
        if self.relevance_filter {
            config.relevance_filter = true;
        }
        Ok(config)
    }

    fn recording_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| file_stem(&self.input_file))
    }

    fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join("cache"))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    args.validate()
        .context("Failed to validate command-line arguments")?;

    let config = args
        .pipeline_config()
        .context("Failed to load pipeline configuration")?;
    config.validate().context("Pipeline configuration is invalid")?;

    println!("Podclip v0.1.0 - Podcast Highlight Extractor");
    println!("Input:      {:?}", args.input_file);
    println!("Transcript: {:?}", args.transcript);
    println!("Output dir: {:?}", args.output_dir);
    println!("Model:      {} @ {}", config.model, config.endpoint);

    println!("\n1. Loading transcript...");
    let transcript = load_transcript(&args.transcript).context("Transcript unavailable")?;
    println!(
        "   Loaded {} segments, {} word tokens",
        transcript.segments.len(),
        transcript.word_segments.len()
    );

    println!("\n2. Preparing model client and cache...");
    let client = OllamaClient::new(&config.endpoint, config.request_timeout())
        .context("Failed to build model client")?;
    let cache = if config.use_cache {
        let dir = args.cache_dir();
        let cache = ResponseCache::open(&dir)
            .with_context(|| format!("Failed to open response cache {:?}", dir))?;
        println!("   Caching responses under {:?}", cache.dir());
        Some(cache)
    } else {
        println!("   Response cache disabled");
        None
    };
    let ctx = RunContext::new(cache);

    println!("\n3. Extracting highlights...");
    let trimmer = FfmpegTrimmer::default();
    let prefix = clip_prefix(&config.model, &args.recording_name(), Utc::now());
    let report = Pipeline::new(&config, &client, &trimmer, &ctx)
        .run(&transcript, &args.input_file, &args.output_dir, &prefix)
        .context("Failed to write run outputs")?;

    println!(
        "   {} chunks ({} failed), {} excerpts, {} aligned",
        report.chunks, report.failed_chunks, report.excerpts, report.mapped
    );
    println!(
        "   Kept {} after duration filter, {} after dedup, {} after relevance",
        report.after_duration, report.after_dedup, report.after_relevance
    );
    for clip in &report.clips {
        println!(
            "   Clip {:02}: {:.2}s → {:.2}s {:?}",
            clip.index, clip.start, clip.end, clip.output_path
        );
    }
    if report.trim_failures > 0 {
        eprintln!("   {} clips failed to cut; see log", report.trim_failures);
    }

    println!(
        "\n✓ Wrote {} clips under {:?}",
        report.clips_written, args.output_dir
    );

    Ok(())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "recording".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec![
            "podclip",
            "episode.mp4",
            "--transcript",
            "episode.json",
            "--output-dir",
            "out",
        ];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn overrides_apply_over_defaults() {
        let args = parse(&["--model", "llama3", "--window-minutes", "3", "--no-cache"]);
        let config = args.pipeline_config().unwrap();
        assert_eq!(config.model, "llama3");
        assert_eq!(config.window_minutes, 3.0);
        assert!(!config.use_cache);
        assert_eq!(config.overlap_seconds, 60.0);
    }

    #[test]
    fn defaults_for_name_and_cache_dir() {
        let args = parse(&[]);
        assert_eq!(args.recording_name(), "episode");
        assert_eq!(args.cache_dir(), PathBuf::from("out").join("cache"));

        let args = parse(&["--name", "ep 12", "--cache-dir", "/tmp/c"]);
        assert_eq!(args.recording_name(), "ep 12");
        assert_eq!(args.cache_dir(), PathBuf::from("/tmp/c"));
    }

    #[test]
    fn cache_dir_conflicts_with_no_cache() {
        let argv = [
            "podclip",
            "a.mp4",
            "--transcript",
            "a.json",
            "--output-dir",
            "out",
            "--no-cache",
            "--cache-dir",
            "c",
        ];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn validate_rejects_missing_input() {
        let args = parse(&[]);
        assert!(args.validate().is_err());
    }
}
