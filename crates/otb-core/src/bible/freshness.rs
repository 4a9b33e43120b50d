//! Cache freshness: the cache is fresh when every derived file exists and the
//! cache is at least as new as the source document.
//!
//! Only modification times are compared. A touched but unchanged source forces
//! a rebuild; a changed source that keeps an older mtime goes unnoticed.

use std::{
    fs,
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use super::CorpusPaths;

/// Filesystem clock: file modification times plus "now".
pub trait FileClock: Send + Sync {
    fn modified(&self, path: &Path) -> Option<SystemTime>;
    fn now(&self) -> SystemTime;
}

/// Real filesystem / wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl FileClock for SystemClock {
    fn modified(&self, path: &Path) -> Option<SystemTime> {
        fs::metadata(path).and_then(|m| m.modified()).ok()
    }

    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Snapshot of the cache versus its source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheState {
    /// mtime of the verse cache; `None` when any derived file is missing.
    pub built_at: Option<SystemTime>,
    /// mtime of the source document.
    pub source_version: SystemTime,
}

impl CacheState {
    /// Returns `None` when the source document itself is missing.
    pub fn observe(clock: &dyn FileClock, paths: &CorpusPaths) -> Option<Self> {
        let source_version = clock.modified(&paths.source)?;

        let offsets = paths.offsets();
        let built_at = match (
            clock.modified(&paths.cache),
            clock.modified(&offsets),
            clock.modified(&paths.index),
        ) {
            (Some(cache), Some(_), Some(_)) => Some(cache),
            _ => None,
        };

        Some(Self {
            built_at,
            source_version,
        })
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self.built_at, Some(built) if built >= self.source_version)
    }
}

pub fn unix_seconds(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}
