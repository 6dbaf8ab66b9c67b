//! Footprint aggregation store.
//!
//! Folds impact samples into per-day and all-time buckets, tracks which
//! services currently have a request in flight, and notifies observers
//! after every successful mutation. The store is the sole writer of the
//! persisted accumulator state; readers only ever see snapshots.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, NaiveDate, Utc};
use ecotrace_types::{ActiveRequestMarker, Footprint, ImpactSample, Milliseconds, ServiceStats};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::bus::{ChangeBus, Subscription};
use crate::storage::{GuardedStorage, StorageBackend};

/// Markers older than this are presumed abandoned (completion never
/// observed, e.g. the page navigated away mid-request).
pub const DEFAULT_STALE_AFTER: Milliseconds = Milliseconds::from_secs(5 * 60);

const GLOBAL_KEY: &str = "global_footprint";
const ACTIVE_REQUESTS_KEY: &str = "active_requests";
const DAY_KEY_PREFIX: &str = "footprint_";

type MarkerMap = BTreeMap<String, ActiveRequestMarker>;

/// Aggregation store for footprint accumulators and in-flight markers.
///
/// Every mutation is a read-modify-write against persistent storage; a
/// store-wide mutex makes each one a critical section so concurrent
/// recordings for the same bucket never drop an increment. All storage
/// failures are absorbed: writes become no-ops and reads return zeroed
/// structures.
#[derive(Debug)]
pub struct FootprintStore {
    storage: GuardedStorage,
    bus: ChangeBus,
    /// Serializes every read-modify-write cycle.
    write_lock: Mutex<()>,
}

impl FootprintStore {
    /// Create a store over the given backend.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            storage: GuardedStorage::new(backend),
            bus: ChangeBus::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Register an observer invoked after every successful mutation.
    #[must_use = "dropping the subscription unsubscribes the callback"]
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.bus.subscribe(callback)
    }

    /// Re-notify observers after a mutation made by another context
    /// (e.g. a second open view sharing the same backend).
    pub fn external_change(&self) {
        self.bus.notify();
    }

    /// Fold one completed-request sample into its day bucket and the
    /// all-time bucket.
    pub fn record_sample(&self, sample: &ImpactSample) {
        let Some(date) = date_of_timestamp(sample.timestamp_ms) else {
            warn!(
                timestamp_ms = sample.timestamp_ms,
                "sample timestamp out of range, dropping"
            );
            return;
        };

        let recorded = {
            let _guard = self.write_lock.lock();

            let key = day_key(date);
            let mut day: Footprint = self.storage.get(&key).unwrap_or_default();
            day.fold(sample);

            let mut global: Footprint = self.storage.get(GLOBAL_KEY).unwrap_or_default();
            global.fold(sample);

            let day_ok = self.storage.put(&key, &day);
            let global_ok = self.storage.put(GLOBAL_KEY, &global);
            day_ok || global_ok
        };

        if recorded {
            debug!(
                service = %sample.service,
                carbon_grams = sample.carbon_grams,
                water_ml = sample.water_ml,
                duration_ms = sample.duration.as_millis(),
                "recorded impact sample"
            );
            self.bus.notify();
        }
    }

    /// Footprint for one calendar day. Missing days read as zeroed.
    pub fn daily_footprint(&self, date: NaiveDate) -> Footprint {
        self.storage.get(&day_key(date)).unwrap_or_default()
    }

    /// Footprint for the current (UTC) day.
    pub fn today(&self) -> Footprint {
        self.daily_footprint(Utc::now().date_naive())
    }

    /// The all-time footprint.
    pub fn global_footprint(&self) -> Footprint {
        self.storage.get(GLOBAL_KEY).unwrap_or_default()
    }

    /// Stats for one service on one day. Missing entries read as zeroed.
    pub fn service_stats(&self, service: &str, date: NaiveDate) -> ServiceStats {
        self.daily_footprint(date)
            .services
            .get(service)
            .cloned()
            .unwrap_or_default()
    }

    /// Zero every accumulator and clear all in-flight markers.
    /// Irreversible.
    pub fn reset_all(&self) {
        let removed = {
            let _guard = self.write_lock.lock();
            let keys: Vec<String> = self
                .storage
                .keys()
                .into_iter()
                .filter(|key| {
                    key.starts_with(DAY_KEY_PREFIX)
                        || key == GLOBAL_KEY
                        || key == ACTIVE_REQUESTS_KEY
                })
                .collect();
            !keys.is_empty() && self.storage.remove(&keys)
        };

        if removed {
            info!("all footprint data reset");
            self.bus.notify();
        }
    }

    /// Mark a request as in flight for a service, replacing any existing
    /// marker for that service.
    pub fn mark_request_start(&self, service: &str, request_id: &str) {
        let marked = {
            let _guard = self.write_lock.lock();
            let mut markers: MarkerMap =
                self.storage.get(ACTIVE_REQUESTS_KEY).unwrap_or_default();
            markers.insert(
                service.to_string(),
                ActiveRequestMarker {
                    request_id: request_id.to_string(),
                    started_at_ms: now_ms(),
                    is_active: true,
                },
            );
            self.storage.put(ACTIVE_REQUESTS_KEY, &markers)
        };
        if marked {
            self.bus.notify();
        }
    }

    /// Clear a service's in-flight marker, but only if `request_id` still
    /// names the stored marker. A mismatch means the marker was already
    /// cleared or replaced by a newer request and is a no-op.
    pub fn mark_request_end(&self, service: &str, request_id: &str) {
        let cleared = {
            let _guard = self.write_lock.lock();
            let mut markers: MarkerMap =
                self.storage.get(ACTIVE_REQUESTS_KEY).unwrap_or_default();
            match markers.get(service) {
                Some(marker) if marker.request_id == request_id => {
                    markers.remove(service);
                    self.storage.put(ACTIVE_REQUESTS_KEY, &markers)
                }
                Some(_) => {
                    debug!(service, request_id, "stale request end, marker kept");
                    false
                }
                None => false,
            }
        };
        if cleared {
            self.bus.notify();
        }
    }

    /// Whether a service currently has a request in flight.
    pub fn is_request_active(&self, service: &str) -> bool {
        self.active_requests()
            .get(service)
            .is_some_and(|marker| marker.is_active)
    }

    /// Snapshot of every in-flight marker, keyed by service.
    pub fn active_requests(&self) -> MarkerMap {
        self.storage.get(ACTIVE_REQUESTS_KEY).unwrap_or_default()
    }

    /// Remove markers whose request started more than `max_age` ago.
    /// Returns how many markers were swept.
    pub fn sweep_stale_markers(&self, max_age: Milliseconds) -> usize {
        let now = now_ms();
        let swept = {
            let _guard = self.write_lock.lock();
            let mut markers: MarkerMap =
                self.storage.get(ACTIVE_REQUESTS_KEY).unwrap_or_default();
            let before = markers.len();
            markers.retain(|service, marker| {
                let age = now.saturating_sub(marker.started_at_ms);
                let stale = age > max_age.as_millis();
                if stale {
                    info!(%service, age_ms = age, "sweeping stale request marker");
                }
                !stale
            });
            let swept = before - markers.len();
            if swept > 0 && !self.storage.put(ACTIVE_REQUESTS_KEY, &markers) {
                return 0;
            }
            swept
        };
        if swept > 0 {
            self.bus.notify();
        }
        swept
    }

    /// Drop every in-flight marker (e.g. the observed page navigated
    /// away, so no completion events will arrive).
    pub fn clear_active_requests(&self) {
        let cleared = {
            let _guard = self.write_lock.lock();
            self.storage.put(ACTIVE_REQUESTS_KEY, &MarkerMap::new())
        };
        if cleared {
            self.bus.notify();
        }
    }

    #[cfg(test)]
    fn put_markers(&self, markers: &MarkerMap) {
        self.storage.put(ACTIVE_REQUESTS_KEY, markers);
    }
}

fn day_key(date: NaiveDate) -> String {
    format!("{DAY_KEY_PREFIX}{date}")
}

fn date_of_timestamp(timestamp_ms: u64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(i64::try_from(timestamp_ms).ok()?)
        .map(|dt| dt.date_naive())
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
