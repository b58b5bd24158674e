use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::TrimError;

/// Cuts `[start, end]` seconds of `input` into `output`.
pub trait Trimmer {
    fn trim(&self, input: &Path, output: &Path, start: f64, end: f64) -> Result<(), TrimError>;
}

/// Stream-copies a time range with ffmpeg, without re-encoding.
#[derive(Debug, Clone)]
pub struct FfmpegTrimmer {
    binary: String,
}

impl Default for FfmpegTrimmer {
    fn default() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
        }
    }
}

impl FfmpegTrimmer {
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn args(input: &Path, output: &Path, start: f64, end: f64) -> Vec<String> {
        let duration = (end - start).max(0.0);
        vec![
            "-y".to_string(),
            "-ss".to_string(),
            format!("{start}"),
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-t".to_string(),
            format!("{duration}"),
            "-c".to_string(),
            "copy".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }
}

impl Trimmer for FfmpegTrimmer {
    fn trim(&self, input: &Path, output: &Path, start: f64, end: f64) -> Result<(), TrimError> {
        let args = Self::args(input, output, start, end);
        debug!(binary = %self.binary, ?args, "running trim");
        let result = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(TrimError::Spawn)?;
        if !result.status.success() {
            return Err(TrimError::Failed {
                status: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
