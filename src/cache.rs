//! On-disk store for raw model responses.
//!
//! Entries are keyed by a fingerprint of the model id and a normalized prefix
//! of the input text. Writes land in a temporary file first and are renamed
//! into place, so readers never observe a partial entry and the last writer
//! wins.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::CacheError;

/// Characters of normalized input text that feed the fingerprint.
pub const FINGERPRINT_PREFIX_CHARS: usize = 2000;

#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| CacheError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.entry_path(key);
        match fs::read_to_string(&path) {
            Ok(raw) => {
                let value: String = serde_json::from_str(&raw).unwrap_or(raw);
                debug!(key, "cache hit");
                Ok(Some(value))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }

    pub fn put(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        let io_err = |source: std::io::Error| CacheError::Io {
            path: path.clone(),
            source,
        };
        let encoded = serde_json::to_string(value).map_err(|err| io_err(err.into()))?;

        let mut staged = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        staged.write_all(encoded.as_bytes()).map_err(io_err)?;
        staged.persist(&path).map_err(|err| io_err(err.error))?;
        debug!(key, "cache entry written");
        Ok(())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

/// Stable cache key for a model call over `text`.
pub fn fingerprint(model_id: &str, text: &str) -> String {
    let normalized: String = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .chars()
        .take(FINGERPRINT_PREFIX_CHARS)
        .collect();

    let mut hasher = Sha256::new();
    hasher.update(model_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(normalized.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}_{}", slugify(model_id, "_"), &digest[..16])
}

/// Replace every non-word character with `replacement`.
pub fn slugify(input: &str, replacement: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c.to_string()
            } else {
                replacement.to_string()
            }
        })
        .collect()
}
