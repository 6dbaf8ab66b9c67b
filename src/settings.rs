//! Optional settings file for the replay tool.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ecotrace_core::Curve;
use serde::Deserialize;

/// Settings loadable from an `ecotrace.toml` (or JSON) file.
///
/// Everything is optional; command-line flags override file values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Interpolation curve for adaptive impacts.
    pub curve: Option<Curve>,
    /// Path to a JSON profile file replacing the built-in calibrations.
    pub profile_file: Option<PathBuf>,
    /// Path to the persisted footprint state document.
    pub state_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from a file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .with_context(|| format!("failed to read settings {}", path.display()))?
            .try_deserialize()
            .context("settings file has unexpected shape")?;
        Ok(settings)
    }
}

/// Parse a curve name given on the command line.
pub fn parse_curve(name: &str) -> Result<Curve> {
    match name {
        "linear" => Ok(Curve::Linear),
        "exponential" => Ok(Curve::Exponential),
        "logarithmic" => Ok(Curve::Logarithmic),
        "sigmoid" => Ok(Curve::Sigmoid),
        other => anyhow::bail!(
            "unknown curve '{other}' (expected linear, exponential, logarithmic, or sigmoid)"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn no_path_yields_defaults() {
        let settings = Settings::load(None).unwrap();
        assert!(settings.curve.is_none());
        assert!(settings.profile_file.is_none());
    }

    #[test]
    fn loads_toml_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ecotrace.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "curve = \"sigmoid\"").unwrap();
        writeln!(file, "profile_file = \"profiles.json\"").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.curve, Some(Curve::Sigmoid));
        assert_eq!(
            settings.profile_file.as_deref(),
            Some(Path::new("profiles.json"))
        );
    }

    #[test]
    fn missing_settings_file_errors() {
        assert!(Settings::load(Some(Path::new("/no/such/ecotrace.toml"))).is_err());
    }

    #[test]
    fn parse_curve_accepts_all_shapes() {
        assert_eq!(parse_curve("linear").unwrap(), Curve::Linear);
        assert_eq!(parse_curve("exponential").unwrap(), Curve::Exponential);
        assert_eq!(parse_curve("logarithmic").unwrap(), Curve::Logarithmic);
        assert_eq!(parse_curve("sigmoid").unwrap(), Curve::Sigmoid);
        assert!(parse_curve("bezier").is_err());
    }
}
