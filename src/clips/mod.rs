//! Clip assembly: trim accepted spans out of the source media and record run
//! metadata.

mod trim;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::slugify;
use crate::error::OutputError;
use crate::types::{Clip, MappedSpan, WordToken};

pub use trim::{FfmpegTrimmer, Trimmer};

pub const METADATA_FILE: &str = "metadata.json";

/// Serialized run output: one joined text and one raw token span per clip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetadata {
    pub texts: Vec<String>,
    pub clips: Vec<Vec<WordToken>>,
}

impl RunMetadata {
    pub fn from_clips(clips: &[Clip]) -> Self {
        Self {
            texts: clips.iter().map(|clip| clip.text.clone()).collect(),
            clips: clips.iter().map(|clip| clip.words.clone()).collect(),
        }
    }
}

#[derive(Debug)]
pub struct Assembly {
    pub clips: Vec<Clip>,
    pub trim_failures: usize,
    pub metadata_path: PathBuf,
    pub summary_path: PathBuf,
}

pub struct ClipAssembler<'a, T> {
    trimmer: &'a T,
    output_dir: PathBuf,
    name_prefix: String,
}

impl<'a, T: Trimmer> ClipAssembler<'a, T> {
    pub fn new(trimmer: &'a T, output_dir: impl Into<PathBuf>, name_prefix: impl Into<String>) -> Self {
        Self {
            trimmer,
            output_dir: output_dir.into(),
            name_prefix: name_prefix.into(),
        }
    }

    /// Trim every span and write `metadata.json` plus a text summary. A clip
    /// that fails to trim is logged and left out; the rest still run.
    pub fn assemble(&self, spans: &[MappedSpan], source_media: &Path) -> Result<Assembly, OutputError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| OutputError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let extension = source_media
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("mp4");

        let mut clips = Vec::with_capacity(spans.len());
        let mut trim_failures = 0;
        for (index, span) in spans.iter().enumerate() {
            let output_path = self
                .output_dir
                .join(format!("{}_clip-{index}.{extension}", self.name_prefix));
            match self.trimmer.trim(source_media, &output_path, span.start, span.end) {
                Ok(()) => {
                    info!(
                        index,
                        start = span.start,
                        end = span.end,
                        path = %output_path.display(),
                        "clip written"
                    );
                    clips.push(Clip {
                        index,
                        start: span.start,
                        end: span.end,
                        text: span.text(),
                        words: span.words.clone(),
                        output_path,
                    });
                }
                Err(err) => {
                    warn!(index, total = spans.len(), "failed to cut clip: {err}");
                    trim_failures += 1;
                }
            }
        }
        info!("clip assembly kept {}/{}", clips.len(), spans.len());

        let metadata_path = self.output_dir.join(METADATA_FILE);
        let metadata = serde_json::to_string_pretty(&RunMetadata::from_clips(&clips))?;
        write_file(&metadata_path, &metadata)?;

        let summary_path = self
            .output_dir
            .join(format!("output_{}.txt", self.name_prefix));
        write_file(&summary_path, &summary_text(&clips))?;

        Ok(Assembly {
            clips,
            trim_failures,
            metadata_path,
            summary_path,
        })
    }
}

/// File name prefix for one run: slug of model and recording name plus a UTC
/// timestamp.
pub fn clip_prefix(model_id: &str, name: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}_{}",
        slugify(&format!("{model_id}_{name}"), ""),
        now.format("%Y%m%d%H%M%S")
    )
}

/// One `[start - end] text` line per clip.
pub fn summary_text(clips: &[Clip]) -> String {
    clips
        .iter()
        .map(|clip| format!("[{:.2} - {:.2}] {}\n", clip.start, clip.end, clip.text))
        .collect()
}

fn write_file(path: &Path, contents: &str) -> Result<(), OutputError> {
    fs::write(path, contents).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}
