//! CLI command implementations.

pub mod dump_events;
pub mod replay;

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// A file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// The file.
        path: PathBuf,
        /// The cause.
        source: std::io::Error,
    },

    /// The snapshot is not a valid get-or-create-feed response.
    #[error("invalid snapshot {path}: {source}")]
    Snapshot {
        /// The file.
        path: PathBuf,
        /// The cause.
        source: serde_json::Error,
    },

    /// Output could not be rendered.
    #[error("cannot render output: {0}")]
    Render(#[from] serde_json::Error),
}

/// Reads a whole file.
pub fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Non-empty lines of an event log, numbered from 1.
pub fn frames(log: &str) -> impl Iterator<Item = (usize, &str)> {
    log.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_skip_blank_lines() {
        let log = "{\"a\":1}\n\n  \n{\"b\":2}\n";
        let numbered: Vec<_> = frames(log).collect();
        assert_eq!(numbered, vec![(1, "{\"a\":1}"), (4, "{\"b\":2}")]);
    }

    #[test]
    fn missing_files_name_the_path() {
        let err = read_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
