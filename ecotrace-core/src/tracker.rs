//! The main ImpactTracker type tying the engine together.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use ecotrace_types::{
    ActiveRequestMarker, Curve, Footprint, ImpactSample, Milliseconds, ServiceProfile,
    ServiceStats,
};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::bus::Subscription;
use crate::classifier::{should_track, RequestStart};
use crate::estimator::estimate_profile;
use crate::registry::ProviderRegistry;
use crate::storage::{MemoryBackend, StorageBackend};
use crate::store::FootprintStore;

/// One tracked request currently in flight, keyed by its request id in the
/// tracker's transient map. Dropped as soon as the request completes,
/// errors, or is cleared; never persisted.
#[derive(Debug, Clone)]
struct ObservedRequest {
    hostname: String,
    method: String,
    url: String,
    started_at_ms: u64,
}

/// The adaptive impact estimation engine.
///
/// An `ImpactTracker` consumes request-lifecycle events from a host's
/// network-observation layer, classifies them against registered service
/// profiles, prices completed requests by duration, and folds the results
/// into persistent daily and all-time footprints.
///
/// Construct one explicitly and hand it to whatever owns the event loop;
/// there is no implicit global instance.
///
/// # Example
///
/// ```rust
/// use ecotrace_core::{ImpactTracker, RequestStart};
/// use ecotrace_types::{ImpactValue, ServiceProfile};
///
/// let tracker = ImpactTracker::builder()
///     .profile(
///         ServiceProfile::builder("claude", "Claude")
///             .hostname("claude.ai")
///             .carbon(ImpactValue::adaptive(1.8, 6.5))
///             .water(ImpactValue::adaptive(45.0, 150.0))
///             .endpoint("/completion")
///             .build(),
///     )
///     .build();
///
/// tracker.request_started(RequestStart {
///     request_id: "r1".into(),
///     url: "https://claude.ai/api/chat/completion".into(),
///     method: "POST".into(),
///     hostname: "claude.ai".into(),
///     timestamp_ms: 1_700_000_000_000,
/// });
/// tracker.request_completed("r1", 1_700_000_008_000);
///
/// assert_eq!(tracker.global_footprint().requests, 1);
/// ```
#[derive(Debug)]
pub struct ImpactTracker {
    registry: ProviderRegistry,
    store: FootprintStore,
    curve: Curve,
    in_flight: Mutex<HashMap<String, ObservedRequest>>,
}

impl ImpactTracker {
    /// Create a tracker with no profiles and in-memory storage.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for configuring the tracker.
    pub fn builder() -> ImpactTrackerBuilder {
        ImpactTrackerBuilder::new()
    }

    /// The profile registry.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Handle a request-start event.
    ///
    /// Untracked requests (unknown hostname, excluded endpoint, wrong
    /// method) are ignored.
    pub fn request_started(&self, event: RequestStart) {
        let Some(profile) = self.registry.find_by_hostname(&event.hostname) else {
            return;
        };
        if !should_track(&profile, &event.url, &event.method) {
            debug!(service = %profile.id, url = %event.url, "request not tracked");
            return;
        }

        debug!(service = %profile.id, request_id = %event.request_id, "tracking request");
        self.in_flight.lock().insert(
            event.request_id.clone(),
            ObservedRequest {
                hostname: event.hostname,
                method: event.method,
                url: event.url,
                started_at_ms: event.timestamp_ms,
            },
        );
        self.store.mark_request_start(&profile.id, &event.request_id);
    }

    /// Handle a request-completion event: price the request by its elapsed
    /// time and fold the result into the footprints.
    ///
    /// Completions for requests never seen (or already cleared) are
    /// ignored.
    pub fn request_completed(&self, request_id: &str, end_timestamp_ms: u64) {
        let Some(observed) = self.in_flight.lock().remove(request_id) else {
            debug!(request_id, "completion for unknown request");
            return;
        };
        let Some(profile) = self.registry.find_by_hostname(&observed.hostname) else {
            return;
        };

        let duration =
            Milliseconds::from_millis(end_timestamp_ms.saturating_sub(observed.started_at_ms));
        let (carbon_grams, water_ml) = estimate_profile(&profile, duration, self.curve);

        info!(
            service = %profile.id,
            duration_ms = duration.as_millis(),
            carbon_grams,
            water_ml,
            "request completed"
        );

        self.store.record_sample(&ImpactSample {
            service: profile.id.clone(),
            carbon_grams,
            water_ml,
            duration,
            timestamp_ms: end_timestamp_ms,
            url: observed.url,
            method: observed.method,
        });
        self.store.mark_request_end(&profile.id, request_id);
    }

    /// Handle a request-error event: the request is dropped without
    /// producing a sample, and its in-flight marker is cleared.
    pub fn request_failed(&self, request_id: &str) {
        let Some(observed) = self.in_flight.lock().remove(request_id) else {
            return;
        };
        if let Some(profile) = self.registry.find_by_hostname(&observed.hostname) {
            debug!(service = %profile.id, request_id, "request failed");
            self.store.mark_request_end(&profile.id, request_id);
        }
    }

    /// Fold an externally produced sample into the footprints.
    ///
    /// Most callers should feed lifecycle events instead and let the
    /// tracker price requests itself; this is for hosts that already
    /// estimated the impact elsewhere.
    pub fn record_sample(&self, sample: &ImpactSample) {
        self.store.record_sample(sample);
    }

    /// Drop all in-flight tracking state (e.g. on navigation away from
    /// every observed page). No samples are produced.
    pub fn clear_in_flight(&self) {
        self.in_flight.lock().clear();
        self.store.clear_active_requests();
    }

    /// Number of requests currently tracked in flight.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Footprint for one calendar day.
    pub fn daily_footprint(&self, date: NaiveDate) -> Footprint {
        self.store.daily_footprint(date)
    }

    /// Footprint for the current (UTC) day.
    pub fn today(&self) -> Footprint {
        self.store.today()
    }

    /// The all-time footprint.
    pub fn global_footprint(&self) -> Footprint {
        self.store.global_footprint()
    }

    /// Stats for one service on one day.
    pub fn service_stats(&self, service: &str, date: NaiveDate) -> ServiceStats {
        self.store.service_stats(service, date)
    }

    /// Snapshot of in-flight markers per service.
    pub fn active_requests(&self) -> std::collections::BTreeMap<String, ActiveRequestMarker> {
        self.store.active_requests()
    }

    /// Whether a service currently has a tracked request in flight.
    pub fn is_request_active(&self, service: &str) -> bool {
        self.store.is_request_active(service)
    }

    /// Register an observer invoked after every successful mutation.
    #[must_use = "dropping the subscription unsubscribes the callback"]
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.store.subscribe(callback)
    }

    /// Re-notify observers after a storage mutation made by another
    /// context sharing the same backend.
    pub fn external_change(&self) {
        self.store.external_change();
    }

    /// Zero every accumulator and marker. Irreversible.
    pub fn reset_all(&self) {
        self.clear_in_flight();
        self.store.reset_all();
    }

    /// Remove persisted markers older than `max_age`.
    pub fn sweep_stale_markers(&self, max_age: Milliseconds) -> usize {
        self.store.sweep_stale_markers(max_age)
    }

    /// Start a background task sweeping stale markers every `interval`.
    ///
    /// Recovers from requests whose completion or error event was never
    /// observed. Returns a handle that stops the task.
    #[cfg(feature = "tokio")]
    pub fn start_sweeper(
        self: Arc<Self>,
        interval: std::time::Duration,
        max_age: Milliseconds,
    ) -> SweeperHandle {
        use tokio::sync::watch;

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let tracker = self;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tracker.sweep_stale_markers(max_age);
                    }
                    _ = stop_rx.changed() => {
                        if *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        SweeperHandle { stop_tx }
    }
}

impl Default for ImpactTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for controlling the background marker sweeper.
///
/// Call [`SweeperHandle::stop`] to stop sweeping.
#[cfg(feature = "tokio")]
pub struct SweeperHandle {
    stop_tx: tokio::sync::watch::Sender<bool>,
}

#[cfg(feature = "tokio")]
impl SweeperHandle {
    /// Stop the background sweeper.
    pub fn stop(self) {
        let _ = self.stop_tx.send(true);
    }
}

/// Builder for configuring an [`ImpactTracker`].
#[derive(Default)]
pub struct ImpactTrackerBuilder {
    profiles: Vec<ServiceProfile>,
    backend: Option<Arc<dyn StorageBackend>>,
    curve: Curve,
}

impl ImpactTrackerBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service profile.
    pub fn profile(mut self, profile: ServiceProfile) -> Self {
        self.profiles.push(profile);
        self
    }

    /// Add several service profiles.
    pub fn profiles(mut self, profiles: impl IntoIterator<Item = ServiceProfile>) -> Self {
        self.profiles.extend(profiles);
        self
    }

    /// Use the given storage backend. Defaults to in-memory storage.
    pub fn storage(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Select the interpolation curve. Defaults to [`Curve::Linear`].
    pub fn curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }

    /// Build the tracker.
    pub fn build(self) -> ImpactTracker {
        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(MemoryBackend::new()));
        ImpactTracker {
            registry: ProviderRegistry::with_profiles(self.profiles),
            store: FootprintStore::new(backend),
            curve: self.curve,
            in_flight: Mutex::new(HashMap::new()),
        }
    }
}

impl std::fmt::Debug for ImpactTrackerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImpactTrackerBuilder")
            .field("profiles", &self.profiles.len())
            .field("curve", &self.curve)
            .finish()
    }
}
