//! Impact specifications and interpolation curve shapes.
//!
//! A service's per-request environmental cost is either a fixed scalar or a
//! `{min, max}` pair scaled by how long the request ran. The curve shapes
//! here map normalized progress between the duration thresholds to a
//! shaping factor in `[0, 1]`.

use core::f64::consts::E;

/// Environmental cost of one request, in the unit of the metric it
/// describes (grams CO2e for carbon, milliliters for water).
///
/// A fixed value ignores request duration entirely. An adaptive value is
/// interpolated between `min` and `max` based on how the duration falls
/// against the service's [`DurationThresholds`].
///
/// With the `serde` feature, both JSON forms accepted by provider
/// configuration parse into this type: a bare number (`2.5`) or a bound
/// pair (`{"min": 1.8, "max": 6.5}`).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ImpactValue {
    /// Duration-independent cost per request.
    Fixed(f64),
    /// Duration-scaled cost bounded by short and long requests.
    Adaptive { min: f64, max: f64 },
}

impl ImpactValue {
    /// Create a fixed impact.
    pub const fn fixed(value: f64) -> Self {
        ImpactValue::Fixed(value)
    }

    /// Create an adaptive impact from its bounds.
    pub const fn adaptive(min: f64, max: f64) -> Self {
        ImpactValue::Adaptive { min, max }
    }

    /// Whether this impact scales with request duration.
    pub const fn is_adaptive(&self) -> bool {
        matches!(self, ImpactValue::Adaptive { .. })
    }
}

/// Duration boundaries classifying a request, in seconds.
///
/// At or below `simple` a request costs the minimum impact; at or above
/// `complex` it costs the maximum. In between, the impact is interpolated
/// along the selected [`Curve`]. The same thresholds govern both the carbon
/// and water bounds of a service.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DurationThresholds {
    /// Requests at or under this many seconds count as simple.
    pub simple: f64,
    /// Requests at or over this many seconds count as complex.
    pub complex: f64,
}

impl DurationThresholds {
    /// Create thresholds from simple/complex boundaries in seconds.
    pub const fn new(simple: f64, complex: f64) -> Self {
        Self { simple, complex }
    }
}

impl Default for DurationThresholds {
    fn default() -> Self {
        // Under 2s reads as a quick exchange, over 15s as heavy generation.
        Self {
            simple: 2.0,
            complex: 15.0,
        }
    }
}

/// Shape of the duration-to-impact interpolation.
///
/// Each variant is a pure function mapping normalized progress
/// `t` in `[0, 1]` to a shaping factor `f(t)` in `[0, 1]` with `f(0) = 0` and
/// `f(1) = 1`. The set is closed: adding a shape means adding a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Curve {
    /// `f(t) = t`.
    #[default]
    Linear,
    /// `f(t) = t * t`, impact ramps up late.
    Exponential,
    /// `f(t) = ln(1 + t * (e - 1))`, impact ramps up early.
    Logarithmic,
    /// Logistic S-curve centered at `t = 0.5`, renormalized to hit the
    /// endpoints exactly.
    Sigmoid,
}

/// Steepness of the sigmoid curve.
const SIGMOID_K: f64 = 6.0;

impl Curve {
    /// Apply the shaping function to a normalized position.
    ///
    /// `t` is clamped to `[0, 1]` before shaping.
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Curve::Linear => t,
            Curve::Exponential => t * t,
            Curve::Logarithmic => (1.0 + t * (E - 1.0)).ln(),
            Curve::Sigmoid => {
                let logistic = |x: f64| 1.0 / (1.0 + (-SIGMOID_K * (x - 0.5)).exp());
                let low = logistic(0.0);
                let high = logistic(1.0);
                (logistic(t) - low) / (high - low)
            }
        }
    }

    /// All supported shapes, in a stable order.
    pub const fn all() -> [Curve; 4] {
        [
            Curve::Linear,
            Curve::Exponential,
            Curve::Logarithmic,
            Curve::Sigmoid,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn fixed_and_adaptive_constructors() {
        assert!(!ImpactValue::fixed(7.0).is_adaptive());
        assert!(ImpactValue::adaptive(1.0, 10.0).is_adaptive());
    }

    #[test]
    fn default_thresholds() {
        let t = DurationThresholds::default();
        assert_eq!(t.simple, 2.0);
        assert_eq!(t.complex, 15.0);
    }

    #[test]
    fn every_curve_hits_endpoints() {
        for curve in Curve::all() {
            assert!(close(curve.apply(0.0), 0.0), "{curve:?} at 0");
            assert!(close(curve.apply(1.0), 1.0), "{curve:?} at 1");
        }
    }

    #[test]
    fn every_curve_clamps_out_of_range_input() {
        for curve in Curve::all() {
            assert!(close(curve.apply(-0.5), curve.apply(0.0)), "{curve:?}");
            assert!(close(curve.apply(1.5), curve.apply(1.0)), "{curve:?}");
        }
    }

    #[test]
    fn every_curve_is_monotonic() {
        for curve in Curve::all() {
            let mut prev = curve.apply(0.0);
            for step in 1..=100 {
                let next = curve.apply(step as f64 / 100.0);
                assert!(next >= prev - 1e-12, "{curve:?} decreased at {step}");
                prev = next;
            }
        }
    }

    #[test]
    fn linear_is_identity() {
        assert!(close(Curve::Linear.apply(0.25), 0.25));
        assert!(close(Curve::Linear.apply(0.5), 0.5));
    }

    #[test]
    fn exponential_lags_linear() {
        assert!(close(Curve::Exponential.apply(0.5), 0.25));
        assert!(Curve::Exponential.apply(0.3) < 0.3);
    }

    #[test]
    fn logarithmic_leads_linear() {
        assert!(Curve::Logarithmic.apply(0.3) > 0.3);
        assert!(close(Curve::Logarithmic.apply(1.0), 1.0)); // ln(e) = 1
    }

    #[test]
    fn sigmoid_is_symmetric_about_center() {
        assert!(close(Curve::Sigmoid.apply(0.5), 0.5));
        let a = Curve::Sigmoid.apply(0.2);
        let b = Curve::Sigmoid.apply(0.8);
        assert!(close(a + b, 1.0));
    }

    #[test]
    fn default_curve_is_linear() {
        assert_eq!(Curve::default(), Curve::Linear);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn impact_value_parses_both_json_forms() {
        let fixed: ImpactValue = serde_json::from_str("2.5").unwrap();
        assert_eq!(fixed, ImpactValue::fixed(2.5));

        let adaptive: ImpactValue = serde_json::from_str(r#"{"min":1.8,"max":6.5}"#).unwrap();
        assert_eq!(adaptive, ImpactValue::adaptive(1.8, 6.5));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn curve_parses_lowercase_tags() {
        let c: Curve = serde_json::from_str(r#""sigmoid""#).unwrap();
        assert_eq!(c, Curve::Sigmoid);
        let c: Curve = serde_json::from_str(r#""linear""#).unwrap();
        assert_eq!(c, Curve::Linear);
    }
}
