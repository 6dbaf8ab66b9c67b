//! Request classification - which observed requests count toward impact.

use ecotrace_types::ServiceProfile;
use regex::Regex;
use tracing::warn;

/// A request-lifecycle start event from the host's network-interception
/// layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestStart {
    /// Host-assigned identifier correlating start and end events.
    pub request_id: String,
    /// Full request URL.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Target hostname.
    pub hostname: String,
    /// Start time, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

/// Decide whether a request to a tracked service counts toward impact.
///
/// Rules, in order:
/// 1. any exclusion pattern match rejects (exclusion always wins)
/// 2. a method outside the profile's allow-list rejects
/// 3. any endpoint pattern match accepts
/// 4. otherwise reject
pub fn should_track(profile: &ServiceProfile, url: &str, method: &str) -> bool {
    for pattern in &profile.exclude_endpoints {
        if matches_pattern(url, pattern, profile.use_regex) {
            return false;
        }
    }

    if let Some(methods) = &profile.methods {
        if !methods.iter().any(|m| m == method) {
            return false;
        }
    }

    profile
        .endpoints
        .iter()
        .any(|pattern| matches_pattern(url, pattern, profile.use_regex))
}

/// Match a URL against one pattern.
///
/// A malformed regex never matches; classification continues with the
/// remaining rules.
pub fn matches_pattern(url: &str, pattern: &str, use_regex: bool) -> bool {
    if use_regex {
        match Regex::new(pattern) {
            Ok(regex) => regex.is_match(url),
            Err(error) => {
                warn!(pattern, %error, "malformed endpoint pattern, treating as non-matching");
                false
            }
        }
    } else {
        url.contains(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecotrace_types::ImpactValue;

    fn claude_like() -> ServiceProfile {
        ServiceProfile::builder("claude", "Claude")
            .hostname("claude.ai")
            .carbon(ImpactValue::adaptive(1.8, 6.5))
            .water(ImpactValue::adaptive(45.0, 150.0))
            .endpoint("/api/organizations/.*/chat_conversations/.*/completion")
            .exclude("/api/auth/")
            .exclude(r"\.(js|css|png|jpg|svg|woff|woff2)$")
            .method("POST")
            .use_regex(true)
            .build()
    }

    #[test]
    fn endpoint_match_accepts() {
        let p = claude_like();
        assert!(should_track(
            &p,
            "https://claude.ai/api/organizations/org1/chat_conversations/c2/completion",
            "POST"
        ));
    }

    #[test]
    fn non_matching_url_rejects() {
        let p = claude_like();
        assert!(!should_track(
            &p,
            "https://claude.ai/api/organizations/org1/settings",
            "POST"
        ));
    }

    #[test]
    fn exclusion_wins_over_endpoint_match() {
        // An auth sub-path nested under a tracked prefix must never count.
        let p = ServiceProfile::builder("svc", "Service")
            .endpoint("/api/")
            .exclude("/api/auth/")
            .build();
        assert!(should_track(&p, "https://svc.example/api/chat", "POST"));
        assert!(!should_track(&p, "https://svc.example/api/auth/login", "POST"));
    }

    #[test]
    fn method_allow_list_rejects_other_methods() {
        let p = claude_like();
        let url = "https://claude.ai/api/organizations/o/chat_conversations/c/completion";
        assert!(should_track(&p, url, "POST"));
        assert!(!should_track(&p, url, "GET"));
    }

    #[test]
    fn no_method_list_allows_any_method() {
        let p = ServiceProfile::builder("svc", "Service")
            .endpoint("/api/chat")
            .build();
        assert!(should_track(&p, "https://svc.example/api/chat", "GET"));
        assert!(should_track(&p, "https://svc.example/api/chat", "POST"));
    }

    #[test]
    fn static_asset_exclusion() {
        let p = claude_like();
        assert!(!should_track(
            &p,
            "https://claude.ai/api/organizations/o/chat_conversations/c/completion/bundle.js",
            "POST"
        ));
    }

    #[test]
    fn substring_matching_when_regex_disabled() {
        let p = ServiceProfile::builder("svc", "Service")
            .endpoint("/StreamGenerate")
            .build();
        assert!(should_track(
            &p,
            "https://svc.example/data/service/StreamGenerate?x=1",
            "POST"
        ));
        // Regex metacharacters are literal in substring mode.
        let p = ServiceProfile::builder("svc", "Service")
            .endpoint("/conversation$")
            .build();
        assert!(!should_track(&p, "https://svc.example/conversation", "POST"));
        assert!(should_track(
            &p,
            "https://svc.example/conversation$fragment",
            "POST"
        ));
    }

    #[test]
    fn malformed_regex_never_matches() {
        assert!(!matches_pattern("https://svc.example/api", "(unclosed", true));

        // A profile whose only endpoint is malformed tracks nothing,
        // but a later valid endpoint still works.
        let p = ServiceProfile::builder("svc", "Service")
            .endpoint("(unclosed")
            .endpoint("/api/chat")
            .use_regex(true)
            .build();
        assert!(should_track(&p, "https://svc.example/api/chat", "POST"));
    }

    #[test]
    fn malformed_exclusion_does_not_block_tracking() {
        let p = ServiceProfile::builder("svc", "Service")
            .endpoint("/api/chat")
            .exclude("(unclosed")
            .use_regex(true)
            .build();
        assert!(should_track(&p, "https://svc.example/api/chat", "POST"));
    }
}
