//! Built-in service calibrations and profile-file loading.
//!
//! The bundled figures come from published estimates of per-request energy
//! and water use; each profile carries its citations. Deployments can
//! replace or extend the set with a JSON profile file.

use std::fs;
use std::path::Path;

use ecotrace_types::{ImpactValue, ServiceProfile};
use thiserror::Error;

/// Failure loading a profile file.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The file could not be read.
    #[error("failed to read profile file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid profile list.
    #[error("failed to parse profile file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The service calibrations shipped with the engine.
pub fn builtin_profiles() -> Vec<ServiceProfile> {
    vec![chatgpt(), claude(), gemini()]
}

/// Load profiles from a JSON file containing an array of profiles.
pub fn load_profiles<P: AsRef<Path>>(path: P) -> Result<Vec<ServiceProfile>, ProfileError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn chatgpt() -> ServiceProfile {
    ServiceProfile::builder("chatgpt", "ChatGPT")
        .hostname("chatgpt.com")
        .hostname("chat.openai.com")
        // GPT-4-class models: medium/heavy per-request cost.
        .carbon(ImpactValue::adaptive(2.5, 8.0))
        .water(ImpactValue::adaptive(60.0, 180.0))
        .thresholds(2.0, 15.0)
        .source("Washington Post")
        .source("UC Riverside (2024)")
        .endpoint("/conversation$")
        .exclude("/backend-api/accounts")
        .exclude("/backend-api/models")
        .exclude("/backend-api/me")
        .exclude("/_next/")
        .exclude(r"\.(js|css|png|jpg|svg|woff|woff2)$")
        .method("POST")
        .use_regex(true)
        .build()
}

fn claude() -> ServiceProfile {
    ServiceProfile::builder("claude", "Claude")
        .hostname("claude.ai")
        // Efficient on short requests, heavier on long analyses; wider
        // thresholds than ChatGPT because responses stream longer.
        .carbon(ImpactValue::adaptive(1.8, 6.5))
        .water(ImpactValue::adaptive(45.0, 150.0))
        .thresholds(3.0, 20.0)
        .source("Anthropic Research (2024)")
        .endpoint("/api/organizations/.*/chat_conversations/.*/completion")
        .exclude("/api/auth/")
        .exclude("/api/organizations/.*/users")
        .exclude("/api/organizations/.*/billing")
        .exclude(r"\.(js|css|png|jpg|svg|woff|woff2)$")
        .method("POST")
        .use_regex(true)
        .build()
}

fn gemini() -> ServiceProfile {
    ServiceProfile::builder("gemini", "Google Gemini")
        .hostname("gemini.google.com")
        .hostname("bard.google.com")
        .carbon(ImpactValue::adaptive(0.02, 0.07))
        .water(ImpactValue::adaptive(0.12, 0.34))
        .thresholds(2.5, 18.0)
        .source("Google Environmental Report (2025)")
        .endpoint("/_/BardChatUi/data/assistant.lamda.BardFrontendService/StreamGenerate")
        .method("POST")
        .build()
}
