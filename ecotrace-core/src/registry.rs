//! Provider registry - static per-service calibration data.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use ecotrace_types::ServiceProfile;
use parking_lot::RwLock;

/// Registry of tracked service profiles, indexed by hostname.
///
/// Profiles are registered once at startup and looked up on every observed
/// request. Registration is append-only; lookup order does not depend on
/// registration order. If two profiles claim the same hostname the later
/// registration wins for that hostname.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    profiles: RwLock<Vec<Arc<ServiceProfile>>>,
    by_hostname: RwLock<BTreeMap<String, Arc<ServiceProfile>>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with the given profiles.
    pub fn with_profiles(profiles: impl IntoIterator<Item = ServiceProfile>) -> Self {
        let registry = Self::new();
        for profile in profiles {
            registry.register(profile);
        }
        registry
    }

    /// Register a profile and index its hostnames.
    pub fn register(&self, profile: ServiceProfile) -> Arc<ServiceProfile> {
        let profile = Arc::new(profile);
        {
            let mut by_hostname = self.by_hostname.write();
            for hostname in &profile.hostnames {
                by_hostname.insert(hostname.clone(), profile.clone());
            }
        }
        self.profiles.write().push(profile.clone());
        profile
    }

    /// Look up the profile serving a hostname.
    pub fn find_by_hostname(&self, hostname: &str) -> Option<Arc<ServiceProfile>> {
        self.by_hostname.read().get(hostname).cloned()
    }

    /// All registered profiles, in registration order.
    pub fn profiles(&self) -> Vec<Arc<ServiceProfile>> {
        self.profiles.read().clone()
    }

    /// Number of registered profiles.
    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    /// Whether no profile has been registered.
    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }

    /// Match patterns (`*://host/*`) covering every registered hostname,
    /// deduplicated. This is what a host platform needs to scope its
    /// request interception.
    pub fn host_patterns(&self) -> Vec<String> {
        let profiles = self.profiles.read();
        let patterns: BTreeSet<String> = profiles
            .iter()
            .flat_map(|p| p.hostnames.iter())
            .map(|h| format!("*://{h}/*"))
            .collect();
        patterns.into_iter().collect()
    }
}
