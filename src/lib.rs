//! # ecotrace
//!
//! Replay and reporting tool for the ecotrace impact estimation engine.
//!
//! The engine itself lives in [`ecotrace_core`]; this crate feeds it
//! request-lifecycle events captured to a JSONL log and renders the
//! aggregated footprints as plain text.
//!
//! ```bash
//! # Replay a captured event log and print today's + all-time footprints
//! ecotrace report events.jsonl
//!
//! # Accumulate across runs into a persistent state file
//! ecotrace report events.jsonl --state footprints.json
//!
//! # Show the configured service calibrations
//! ecotrace profiles
//! ```

pub mod events;
pub mod replay;
pub mod report;
pub mod settings;

pub use events::RequestEvent;
pub use replay::{replay_file, replay_lines, ReplaySummary};
pub use settings::Settings;
