//! # ecotrace-core
//!
//! Adaptive impact estimation engine for AI request footprint tracking.
//!
//! This crate turns observed network request timing into environmental
//! impact estimates (grams CO2e, milliliters of water) and aggregates them
//! into daily and all-time footprints per service.
//!
//! ## Quick Start
//!
//! ```rust
//! use ecotrace_core::{profiles, ImpactTracker, RequestStart};
//!
//! // Build a tracker with the bundled service calibrations.
//! let tracker = ImpactTracker::builder()
//!     .profiles(profiles::builtin_profiles())
//!     .build();
//!
//! // Feed it request-lifecycle events from the host's network layer.
//! tracker.request_started(RequestStart {
//!     request_id: "r1".into(),
//!     url: "https://chatgpt.com/backend-api/conversation".into(),
//!     method: "POST".into(),
//!     hostname: "chatgpt.com".into(),
//!     timestamp_ms: 1_700_000_000_000,
//! });
//! tracker.request_completed("r1", 1_700_000_004_000);
//!
//! // Read the aggregated footprints.
//! let global = tracker.global_footprint();
//! assert_eq!(global.requests, 1);
//! assert!(global.service("chatgpt").is_some());
//! ```
//!
//! ## Architecture
//!
//! - **[`registry`]**: static per-service calibration profiles indexed by
//!   hostname
//! - **[`classifier`]**: decides which observed requests count toward
//!   impact (exclusion-first pattern matching)
//! - **[`estimator`]**: pure duration-to-impact interpolation between
//!   calibrated bounds
//! - **[`store`]**: persistent daily/all-time accumulators and in-flight
//!   markers, with every read-modify-write serialized
//! - **[`bus`]**: payload-free change notification fan-out to observers
//! - **[`tracker`]**: the facade wiring it all together
//!
//! Storage failures never surface to callers: reads degrade to zeroed
//! structures and writes to no-ops, logged via `tracing`.

pub mod bus;
pub mod classifier;
pub mod error;
pub mod estimator;
pub mod profiles;
pub mod registry;
pub mod storage;
pub mod store;
pub mod tracker;

pub use bus::{ChangeBus, Subscription};
pub use classifier::{matches_pattern, should_track, RequestStart};
pub use error::StorageError;
pub use estimator::{estimate, estimate_profile};
pub use registry::ProviderRegistry;
pub use storage::{FileBackend, GuardedStorage, MemoryBackend, StorageBackend};
pub use store::{FootprintStore, DEFAULT_STALE_AFTER};
pub use tracker::{ImpactTracker, ImpactTrackerBuilder};

#[cfg(feature = "tokio")]
pub use tracker::SweeperHandle;

// Re-export types for convenience
pub use ecotrace_types::{
    ActiveRequestMarker, Curve, DurationThresholds, Footprint, ImpactSample, ImpactValue,
    Milliseconds, ServiceProfile, ServiceStats,
};
