//! Plain-text rendering of footprints and profiles.

use std::fmt::Write;
use std::sync::Arc;

use ecotrace_core::{Footprint, ImpactValue, ServiceProfile};

/// Render one footprint bucket as an indented text block.
pub fn render_footprint(title: &str, footprint: &Footprint) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{title}");

    if footprint.is_empty() {
        let _ = writeln!(out, "  no requests recorded");
        return out;
    }

    let _ = writeln!(
        out,
        "  requests: {}   carbon: {:.2} g CO2e   water: {:.1} ml   time: {:.1} s",
        footprint.requests,
        footprint.carbon_grams,
        footprint.water_ml,
        footprint.duration.as_secs_f64(),
    );
    let _ = writeln!(out, "  by service:");
    for (service, stats) in &footprint.services {
        let _ = writeln!(
            out,
            "    {service:<12} {:>5} req   {:>8.2} g   {:>8.1} ml   {:>7.1} s",
            stats.requests,
            stats.carbon_grams,
            stats.water_ml,
            stats.duration.as_secs_f64(),
        );
    }
    out
}

/// Render the configured profiles and their calibration.
pub fn render_profiles(profiles: &[Arc<ServiceProfile>]) -> String {
    let mut out = String::new();
    for profile in profiles {
        let _ = writeln!(out, "{} ({})", profile.name, profile.id);
        let _ = writeln!(out, "  hostnames: {}", profile.hostnames.join(", "));
        let _ = writeln!(out, "  carbon: {}", render_impact(&profile.carbon, "g CO2e"));
        let _ = writeln!(out, "  water: {}", render_impact(&profile.water, "ml"));
        let thresholds = profile.thresholds_or_default();
        let _ = writeln!(
            out,
            "  thresholds: simple <= {:.1}s, complex >= {:.1}s",
            thresholds.simple, thresholds.complex
        );
        if !profile.sources.is_empty() {
            let _ = writeln!(out, "  sources: {}", profile.sources.join("; "));
        }
    }
    out
}

fn render_impact(value: &ImpactValue, unit: &str) -> String {
    match value {
        ImpactValue::Fixed(v) => format!("{v} {unit} per request"),
        ImpactValue::Adaptive { min, max } => {
            format!("{min} to {max} {unit} per request, scaled by duration")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecotrace_core::{ImpactSample, Milliseconds};

    #[test]
    fn empty_footprint_renders_placeholder() {
        let out = render_footprint("Today", &Footprint::default());
        assert!(out.starts_with("Today"));
        assert!(out.contains("no requests recorded"));
    }

    #[test]
    fn footprint_lists_totals_and_services() {
        let mut fp = Footprint::default();
        fp.fold(&ImpactSample {
            service: "chatgpt".to_string(),
            carbon_grams: 2.5,
            water_ml: 60.0,
            duration: Milliseconds::from_millis(4000),
            timestamp_ms: 1_700_000_000_000,
            url: "https://chatgpt.com/backend-api/conversation".to_string(),
            method: "POST".to_string(),
        });

        let out = render_footprint("All time", &fp);
        assert!(out.contains("requests: 1"));
        assert!(out.contains("2.50 g CO2e"));
        assert!(out.contains("chatgpt"));
    }

    #[test]
    fn profiles_listing_shows_calibration() {
        let profiles = vec![Arc::new(
            ServiceProfile::builder("svc", "Service")
                .hostname("svc.example")
                .carbon(ImpactValue::adaptive(1.0, 4.0))
                .water(ImpactValue::fixed(25.0))
                .endpoint("/api/")
                .source("Somewhere (2025)")
                .build(),
        )];

        let out = render_profiles(&profiles);
        assert!(out.contains("Service (svc)"));
        assert!(out.contains("1 to 4 g CO2e"));
        assert!(out.contains("25 ml per request"));
        assert!(out.contains("Somewhere (2025)"));
    }
}
