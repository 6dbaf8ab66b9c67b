//! Footprint accumulators - per-request samples folded into running totals.

use std::collections::BTreeMap;

use crate::Milliseconds;

/// The estimation result for one completed request.
///
/// Produced once per completed request and immediately folded into the
/// matching day bucket and the all-time bucket; never persisted on its own.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImpactSample {
    /// Identifier of the service the request went to.
    pub service: String,
    /// Estimated carbon impact in grams CO2e.
    pub carbon_grams: f64,
    /// Estimated water impact in milliliters.
    pub water_ml: f64,
    /// Observed request duration.
    pub duration: Milliseconds,
    /// Completion time, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// Request URL.
    pub url: String,
    /// HTTP method.
    pub method: String,
}

/// Running totals for one service within a bucket.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceStats {
    /// Completed request count.
    pub requests: u64,
    /// Cumulative carbon, grams CO2e.
    pub carbon_grams: f64,
    /// Cumulative water, milliliters.
    pub water_ml: f64,
    /// Cumulative request duration.
    pub duration: Milliseconds,
}

impl ServiceStats {
    /// Fold one sample into the accumulator.
    pub fn fold(&mut self, sample: &ImpactSample) {
        self.requests += 1;
        self.carbon_grams += sample.carbon_grams;
        self.water_ml += sample.water_ml;
        self.duration += sample.duration;
    }
}

/// Aggregated footprint for one bucket: a single calendar day, or all time.
///
/// The bucket totals always equal the sum over the per-service entries;
/// [`Footprint::fold`] maintains that invariant by updating both sides in
/// one step.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Footprint {
    /// Completed request count across all services.
    pub requests: u64,
    /// Cumulative carbon, grams CO2e.
    pub carbon_grams: f64,
    /// Cumulative water, milliliters.
    pub water_ml: f64,
    /// Cumulative request duration.
    pub duration: Milliseconds,
    /// Per-service breakdown, keyed by service identifier.
    #[cfg_attr(feature = "serde", serde(default))]
    pub services: BTreeMap<String, ServiceStats>,
}

impl Footprint {
    /// Fold one sample into the bucket totals and its service entry.
    pub fn fold(&mut self, sample: &ImpactSample) {
        self.requests += 1;
        self.carbon_grams += sample.carbon_grams;
        self.water_ml += sample.water_ml;
        self.duration += sample.duration;
        self.services
            .entry(sample.service.clone())
            .or_default()
            .fold(sample);
    }

    /// Whether any request has been recorded in this bucket.
    pub fn is_empty(&self) -> bool {
        self.requests == 0 && self.services.is_empty()
    }

    /// Stats for one service, if it has recorded anything.
    pub fn service(&self, id: &str) -> Option<&ServiceStats> {
        self.services.get(id)
    }
}

/// Transient flag marking that a service has a request in flight.
///
/// At most one marker exists per service; a new request start replaces any
/// previous marker for the same service.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveRequestMarker {
    /// Identifier of the in-flight request.
    pub request_id: String,
    /// When the request started, milliseconds since the Unix epoch.
    pub started_at_ms: u64,
    /// Whether the marker is live. Always true for stored markers; kept so
    /// readers can distinguish a cleared map entry from a live one.
    pub is_active: bool,
}
