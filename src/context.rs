//! Per-run state handed to each stage instead of process-wide globals.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::cache::ResponseCache;

#[derive(Debug, Clone, Default)]
pub struct RunContext {
    cache: Option<ResponseCache>,
}

impl RunContext {
    pub fn new(cache: Option<ResponseCache>) -> Self {
        Self { cache }
    }

    /// Cached response for `key`; cache errors degrade to a miss.
    pub fn cached_response(&self, key: &str) -> Option<String> {
        let cache = self.cache.as_ref()?;
        match cache.get(key) {
            Ok(hit) => hit,
            Err(err) => {
                warn!(key, "ignoring unreadable cache entry: {err}");
                None
            }
        }
    }

    pub fn store_response(&self, key: &str, value: &str) {
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.put(key, value) {
                warn!(key, "failed to write cache entry: {err}");
            }
        }
    }

    pub fn timer(&self, label: &'static str) -> StageTimer {
        StageTimer::start(label)
    }
}

/// Measures one stage; logs the elapsed time when finished or dropped.
#[derive(Debug)]
pub struct StageTimer {
    label: &'static str,
    started: Instant,
    reported: bool,
}

impl StageTimer {
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            started: Instant::now(),
            reported: false,
        }
    }

    pub fn elapsed(&self) -> Elapsed {
        Elapsed(self.started.elapsed())
    }

    pub fn finish(mut self) -> Elapsed {
        let elapsed = self.elapsed();
        self.report(elapsed);
        elapsed
    }

    fn report(&mut self, elapsed: Elapsed) {
        if !self.reported {
            self.reported = true;
            info!(stage = self.label, "took {elapsed}");
        }
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        let elapsed = self.elapsed();
        self.report(elapsed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Elapsed(pub Duration);

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs_f64();
        if secs > 120.0 {
            write!(f, "{:.2}min", secs / 60.0)
        } else {
            write!(f, "{:.2}sec", secs)
        }
    }
}
