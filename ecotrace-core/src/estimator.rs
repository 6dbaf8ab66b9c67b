//! Impact estimation - threshold-bounded interpolation over request
//! duration.
//!
//! This is the core pricing function: given a service's calibrated impact
//! bounds and an observed duration, produce the per-request cost. Pure and
//! deterministic; identical inputs always yield identical output.

use ecotrace_types::{Curve, DurationThresholds, ImpactValue, Milliseconds, ServiceProfile};

/// Estimate the impact of one request.
///
/// Fixed specs pass through untouched. Adaptive specs return `min` for
/// durations at or below the simple threshold, `max` at or above the
/// complex threshold, and interpolate along `curve` in between:
///
/// ```text
/// t = (seconds - simple) / (complex - simple)      clamped to [0, 1]
/// impact = min + (max - min) * curve.apply(t)
/// ```
///
/// Degenerate thresholds (`complex <= simple`) snap straight to `max` once
/// past `simple`; the interpolation band is empty so no division occurs.
pub fn estimate(
    spec: ImpactValue,
    duration: Milliseconds,
    thresholds: DurationThresholds,
    curve: Curve,
) -> f64 {
    let (min, max) = match spec {
        ImpactValue::Fixed(value) => return value,
        ImpactValue::Adaptive { min, max } => (min, max),
    };

    let seconds = duration.as_secs_f64();
    if seconds <= thresholds.simple {
        return min;
    }
    if seconds >= thresholds.complex {
        return max;
    }

    let t = (seconds - thresholds.simple) / (thresholds.complex - thresholds.simple);
    min + (max - min) * curve.apply(t.clamp(0.0, 1.0))
}

/// Estimate both metrics of a profile for one request.
///
/// Carbon and water use their own bound pairs but share the profile's
/// thresholds and the duration-to-factor mapping.
pub fn estimate_profile(
    profile: &ServiceProfile,
    duration: Milliseconds,
    curve: Curve,
) -> (f64, f64) {
    let thresholds = profile.thresholds_or_default();
    let carbon = estimate(profile.carbon, duration, thresholds, curve);
    let water = estimate(profile.water, duration, thresholds, curve);
    (carbon, water)
}
