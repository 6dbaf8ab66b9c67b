//! Replays an event log through an impact tracker.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ecotrace_core::{ImpactTracker, RequestStart};
use tracing::warn;

use crate::events::RequestEvent;

/// Outcome of replaying a log.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Events applied to the tracker.
    pub applied: usize,
    /// Lines that did not parse as events.
    pub skipped: usize,
}

/// Replay a JSONL event log file through the tracker.
pub fn replay_file(tracker: &ImpactTracker, path: &Path) -> Result<ReplaySummary> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read event log {}", path.display()))?;
    Ok(replay_lines(tracker, content.lines()))
}

/// Replay pre-split log lines. Malformed lines are logged and skipped;
/// the replay continues.
pub fn replay_lines<'a>(
    tracker: &ImpactTracker,
    lines: impl Iterator<Item = &'a str>,
) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    for (number, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match RequestEvent::parse(line) {
            Ok(event) => {
                apply(tracker, event);
                summary.applied += 1;
            }
            Err(error) => {
                warn!(line = number + 1, %error, "skipping malformed event line");
                summary.skipped += 1;
            }
        }
    }
    summary
}

fn apply(tracker: &ImpactTracker, event: RequestEvent) {
    match event {
        RequestEvent::Start {
            request_id,
            url,
            method,
            hostname,
            timestamp_ms,
        } => tracker.request_started(RequestStart {
            request_id,
            url,
            method,
            hostname,
            timestamp_ms,
        }),
        RequestEvent::Complete {
            request_id,
            end_timestamp_ms,
        } => tracker.request_completed(&request_id, end_timestamp_ms),
        RequestEvent::Error { request_id, .. } => tracker.request_failed(&request_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecotrace_core::profiles::builtin_profiles;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn tracker() -> ImpactTracker {
        ImpactTracker::builder()
            .profiles(builtin_profiles())
            .build()
    }

    const LOG: &str = r#"
{"event":"start","request_id":"r1","url":"https://chatgpt.com/backend-api/conversation","method":"POST","hostname":"chatgpt.com","timestamp_ms":1700000000000}
{"event":"complete","request_id":"r1","end_timestamp_ms":1700000004000}
{"event":"start","request_id":"r2","url":"https://claude.ai/api/organizations/o/chat_conversations/c/completion","method":"POST","hostname":"claude.ai","timestamp_ms":1700000010000}
{"event":"error","request_id":"r2","error":"net::ERR_ABORTED"}
"#;

    #[test]
    fn replays_lifecycle_into_footprints() {
        let tracker = tracker();
        let summary = replay_lines(&tracker, LOG.lines());

        assert_eq!(summary, ReplaySummary { applied: 4, skipped: 0 });

        let global = tracker.global_footprint();
        assert_eq!(global.requests, 1); // r2 errored, no sample
        assert!(global.service("chatgpt").is_some());
        assert!(global.service("claude").is_none());
        assert!(!tracker.is_request_active("claude"));
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let tracker = tracker();
        let log = "not json at all\n{\"event\":\"complete\",\"request_id\":\"ghost\",\"end_timestamp_ms\":1}\n";
        let summary = replay_lines(&tracker, log.lines());
        assert_eq!(summary.applied, 1);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn replay_file_reads_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(LOG.as_bytes()).unwrap();

        let tracker = tracker();
        let summary = replay_file(&tracker, file.path()).unwrap();
        assert_eq!(summary.applied, 4);
        assert_eq!(tracker.global_footprint().requests, 1);
    }

    #[test]
    fn replay_file_missing_path_errors() {
        let tracker = tracker();
        assert!(replay_file(&tracker, Path::new("/no/such/events.jsonl")).is_err());
    }
}
