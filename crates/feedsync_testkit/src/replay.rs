//! Replay files for CLI tests.
//!
//! A replay is a feed snapshot (one JSON document) and a newline-delimited
//! log of real-time frames, written to a temporary directory that is
//! removed on drop.

use feedsync_protocol::{GetOrCreateFeedResponse, WsEvent};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A snapshot and event log on disk.
#[derive(Debug)]
pub struct ReplayFiles {
    dir: TempDir,
    snapshot: PathBuf,
    events: PathBuf,
}

impl ReplayFiles {
    /// Writes `snapshot` and `events` to a fresh temporary directory.
    pub fn new(snapshot: &GetOrCreateFeedResponse, events: &[WsEvent]) -> io::Result<Self> {
        let frames = events
            .iter()
            .map(|event| event.encode().map_err(io::Error::other))
            .collect::<io::Result<Vec<_>>>()?;
        Self::with_frames(snapshot, &frames)
    }

    /// Writes `snapshot` and the raw `frames`, one per line.
    pub fn with_frames(snapshot: &GetOrCreateFeedResponse, frames: &[String]) -> io::Result<Self> {
        let dir = TempDir::new()?;
        let snapshot_path = dir.path().join("snapshot.json");
        let events_path = dir.path().join("events.jsonl");

        let json = serde_json::to_string_pretty(snapshot).map_err(io::Error::other)?;
        fs::write(&snapshot_path, json)?;

        let mut file = fs::File::create(&events_path)?;
        for frame in frames {
            writeln!(file, "{frame}")?;
        }
        file.sync_all()?;

        Ok(Self {
            dir,
            snapshot: snapshot_path,
            events: events_path,
        })
    }

    /// Path of the snapshot document.
    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot
    }

    /// Path of the event log.
    pub fn events_path(&self) -> &Path {
        &self.events
    }

    /// The temporary directory holding both files.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}
