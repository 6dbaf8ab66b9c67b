//! Service profiles - static calibration data for tracked AI services.

use crate::{DurationThresholds, ImpactValue, Milliseconds};

/// Default per-request timeout for a service.
const DEFAULT_TIMEOUT: Milliseconds = Milliseconds::from_millis(5000);

/// Immutable calibration profile for one tracked AI service.
///
/// A profile carries everything needed to recognize a service's chat
/// requests and to price them: the hostnames it answers on, the endpoint
/// patterns that identify completion requests, the exclusion patterns that
/// veto them, and the carbon/water impact bounds with their duration
/// thresholds.
///
/// Profiles are created at startup (from built-in calibrations or a
/// configuration file) and never mutated afterwards.
///
/// # Example
///
/// ```rust
/// use ecotrace_types::{ImpactValue, ServiceProfile};
///
/// let profile = ServiceProfile::builder("claude", "Claude")
///     .hostname("claude.ai")
///     .carbon(ImpactValue::adaptive(1.8, 6.5))
///     .water(ImpactValue::adaptive(45.0, 150.0))
///     .endpoint("/completion")
///     .method("POST")
///     .build();
///
/// assert_eq!(profile.id, "claude");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceProfile {
    /// Unique identifier (stable key for aggregation).
    pub id: String,

    /// Human-readable display name.
    pub name: String,

    /// Hostnames this service answers on.
    pub hostnames: Vec<String>,

    /// Carbon cost per request, in grams CO2e.
    pub carbon: ImpactValue,

    /// Water cost per request, in milliliters.
    pub water: ImpactValue,

    /// Duration thresholds shared by the carbon and water bounds.
    /// When absent, estimation falls back to the defaults.
    #[cfg_attr(feature = "serde", serde(default))]
    pub thresholds: Option<DurationThresholds>,

    /// Provenance citations for the calibration figures.
    #[cfg_attr(feature = "serde", serde(default))]
    pub sources: Vec<String>,

    /// Endpoint patterns identifying trackable requests.
    pub endpoints: Vec<String>,

    /// Patterns that veto a request even when an endpoint matches.
    #[cfg_attr(feature = "serde", serde(default))]
    pub exclude_endpoints: Vec<String>,

    /// HTTP method allow-list. `None` allows every method.
    #[cfg_attr(feature = "serde", serde(default))]
    pub methods: Option<Vec<String>>,

    /// Treat endpoint and exclusion patterns as regular expressions
    /// rather than literal substrings.
    #[cfg_attr(feature = "serde", serde(default))]
    pub use_regex: bool,

    /// Per-request timeout before the in-flight marker is considered stale.
    #[cfg_attr(feature = "serde", serde(default = "default_timeout"))]
    pub timeout: Milliseconds,
}

#[cfg(feature = "serde")]
fn default_timeout() -> Milliseconds {
    DEFAULT_TIMEOUT
}

impl ServiceProfile {
    /// Start building a profile from its identifier and display name.
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> ServiceProfileBuilder {
        ServiceProfileBuilder::new(id, name)
    }

    /// Thresholds to use for estimation, falling back to the defaults.
    pub fn thresholds_or_default(&self) -> DurationThresholds {
        self.thresholds.unwrap_or_default()
    }
}

/// Builder for [`ServiceProfile`].
#[derive(Debug)]
pub struct ServiceProfileBuilder {
    id: String,
    name: String,
    hostnames: Vec<String>,
    carbon: ImpactValue,
    water: ImpactValue,
    thresholds: Option<DurationThresholds>,
    sources: Vec<String>,
    endpoints: Vec<String>,
    exclude_endpoints: Vec<String>,
    methods: Option<Vec<String>>,
    use_regex: bool,
    timeout: Milliseconds,
}

impl ServiceProfileBuilder {
    /// Create a new builder.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hostnames: Vec::new(),
            carbon: ImpactValue::fixed(0.0),
            water: ImpactValue::fixed(0.0),
            thresholds: None,
            sources: Vec::new(),
            endpoints: Vec::new(),
            exclude_endpoints: Vec::new(),
            methods: None,
            use_regex: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Add a hostname the service answers on.
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostnames.push(hostname.into());
        self
    }

    /// Set the carbon impact per request.
    pub fn carbon(mut self, carbon: ImpactValue) -> Self {
        self.carbon = carbon;
        self
    }

    /// Set the water impact per request.
    pub fn water(mut self, water: ImpactValue) -> Self {
        self.water = water;
        self
    }

    /// Set the duration thresholds shared by carbon and water.
    pub fn thresholds(mut self, simple: f64, complex: f64) -> Self {
        self.thresholds = Some(DurationThresholds::new(simple, complex));
        self
    }

    /// Add a provenance citation.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }

    /// Add an endpoint pattern.
    pub fn endpoint(mut self, pattern: impl Into<String>) -> Self {
        self.endpoints.push(pattern.into());
        self
    }

    /// Add an exclusion pattern.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_endpoints.push(pattern.into());
        self
    }

    /// Restrict tracking to an HTTP method. May be called repeatedly.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.methods.get_or_insert_with(Vec::new).push(method.into());
        self
    }

    /// Treat patterns as regular expressions.
    pub fn use_regex(mut self, use_regex: bool) -> Self {
        self.use_regex = use_regex;
        self
    }

    /// Set the per-request staleness timeout.
    pub fn timeout(mut self, timeout: Milliseconds) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the profile.
    pub fn build(self) -> ServiceProfile {
        ServiceProfile {
            id: self.id,
            name: self.name,
            hostnames: self.hostnames,
            carbon: self.carbon,
            water: self.water,
            thresholds: self.thresholds,
            sources: self.sources,
            endpoints: self.endpoints,
            exclude_endpoints: self.exclude_endpoints,
            methods: self.methods,
            use_regex: self.use_regex,
            timeout: self.timeout,
        }
    }
}
