//! Dump-events command implementation.

use super::{frames, read_file, CliError};
use chrono::{DateTime, Utc};
use feedsync_protocol::WsEvent;
use serde::Serialize;
use std::path::Path;

/// One frame of an event log.
#[derive(Debug, Serialize, PartialEq)]
pub struct FrameSummary {
    /// Line number in the log.
    pub line: usize,
    /// Event type, or `None` for an undecodable frame.
    pub event_type: Option<String>,
    /// Feed the event was delivered for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fid: Option<String>,
    /// Event timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Decode error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summarizes up to `limit` frames of the log at `events`.
pub fn summarize(events: &Path, limit: Option<usize>) -> Result<Vec<FrameSummary>, CliError> {
    let log = read_file(events)?;
    let summaries = frames(&log)
        .take(limit.unwrap_or(usize::MAX))
        .map(|(line, frame)| match WsEvent::decode(frame) {
            Ok(event) => FrameSummary {
                line,
                event_type: Some(event.event_type().to_string()),
                fid: event.fid().map(|fid| fid.raw_value()),
                created_at: event.created_at(),
                error: None,
            },
            Err(err) => FrameSummary {
                line,
                event_type: None,
                fid: None,
                created_at: None,
                error: Some(err.to_string()),
            },
        })
        .collect();
    Ok(summaries)
}

/// Runs the dump-events command.
pub fn run(events: &Path, limit: Option<usize>, format: &str) -> Result<(), CliError> {
    let summaries = summarize(events, limit)?;
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&summaries)?),
        _ => {
            for summary in &summaries {
                match (&summary.event_type, &summary.error) {
                    (Some(event_type), _) => println!(
                        "{:>5}  {:<32} {:<20} {}",
                        summary.line,
                        event_type,
                        summary.fid.as_deref().unwrap_or("-"),
                        summary
                            .created_at
                            .map(|at| at.to_rfc3339())
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                    (None, error) => println!(
                        "{:>5}  <undecodable> {}",
                        summary.line,
                        error.as_deref().unwrap_or_default()
                    ),
                }
            }
        }
    }
    Ok(())
}
