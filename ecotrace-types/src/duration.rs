//! Duration representation for serialization.
//!
//! We use milliseconds as the canonical unit for durations: request-lifecycle
//! events arrive with millisecond timestamps, and the calibration thresholds
//! operate on the same scale.

use core::ops::{Add, AddAssign};
use core::time::Duration;

/// Duration in milliseconds.
///
/// This wrapper provides consistent serialization of durations across
/// persisted records. Milliseconds match the resolution of the request
/// timing we observe while fitting in a u64 for any realistic duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Milliseconds(pub u64);

impl Milliseconds {
    /// Create from milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Create from seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1000)
    }

    /// Get the value in milliseconds.
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Get the value in whole seconds (truncated).
    pub const fn as_secs(&self) -> u64 {
        self.0 / 1000
    }

    /// Get the value in fractional seconds.
    ///
    /// This is the form the estimator's thresholds are expressed in.
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Convert to a standard Duration.
    pub const fn to_duration(&self) -> Duration {
        Duration::from_millis(self.0)
    }

    /// Saturating difference, for elapsed-time computations where clock
    /// skew could make the end timestamp precede the start.
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl From<Duration> for Milliseconds {
    fn from(d: Duration) -> Self {
        Self(d.as_millis() as u64)
    }
}

impl From<Milliseconds> for Duration {
    fn from(m: Milliseconds) -> Self {
        Duration::from_millis(m.0)
    }
}

impl Add for Milliseconds {
    type Output = Milliseconds;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Milliseconds {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}
