//! Request-lifecycle event log parsing.
//!
//! The replay tool consumes newline-delimited JSON, one event per line,
//! mirroring the contract a host platform's network-interception layer
//! delivers: a start event with the request context, then either a
//! completion or an error naming the same request id.

use serde::Deserialize;

/// One request-lifecycle event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum RequestEvent {
    /// A tracked-candidate request began.
    Start {
        request_id: String,
        url: String,
        method: String,
        hostname: String,
        timestamp_ms: u64,
    },
    /// The request completed successfully.
    Complete {
        request_id: String,
        end_timestamp_ms: u64,
    },
    /// The request failed.
    Error {
        request_id: String,
        #[serde(default)]
        error: Option<String>,
    },
}

impl RequestEvent {
    /// Parse one log line.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}
