use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ecotrace_core::profiles::{builtin_profiles, load_profiles};
use ecotrace_core::{Curve, FileBackend, ImpactTracker};

mod events;
mod replay;
mod report;
mod settings;

use settings::{parse_curve, Settings};

#[derive(Parser, Debug)]
#[command(name = "ecotrace")]
#[command(about = "Estimate the carbon and water footprint of AI chat requests")]
struct Args {
    /// Path to a settings file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a JSONL request-event log and print footprint totals
    Report {
        /// Path to the event log
        log: PathBuf,

        /// JSON profile file replacing the built-in calibrations
        #[arg(long)]
        profiles: Option<PathBuf>,

        /// Interpolation curve: linear, exponential, logarithmic, sigmoid
        #[arg(long)]
        curve: Option<String>,

        /// Persist footprints to this state file instead of starting empty
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// List the configured service profiles and their calibration
    Profiles {
        /// JSON profile file replacing the built-in calibrations
        #[arg(long)]
        profiles: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let settings = Settings::load(args.config.as_deref())?;

    match args.command {
        Command::Report {
            log,
            profiles,
            curve,
            state,
        } => run_report(&settings, log, profiles, curve, state),
        Command::Profiles { profiles } => run_profiles(&settings, profiles),
    }
}

fn run_report(
    settings: &Settings,
    log: PathBuf,
    profile_file: Option<PathBuf>,
    curve: Option<String>,
    state: Option<PathBuf>,
) -> Result<()> {
    let curve = match curve {
        Some(name) => parse_curve(&name)?,
        None => settings.curve.unwrap_or(Curve::Linear),
    };

    let mut builder = ImpactTracker::builder()
        .profiles(resolve_profiles(settings, profile_file)?)
        .curve(curve);
    if let Some(path) = state.or_else(|| settings.state_file.clone()) {
        builder = builder.storage(Arc::new(FileBackend::new(path)));
    }
    let tracker = builder.build();

    let summary = replay::replay_file(&tracker, &log)?;
    if summary.skipped > 0 {
        eprintln!("warning: skipped {} malformed event lines", summary.skipped);
    }

    print!("{}", report::render_footprint("Today", &tracker.today()));
    println!();
    print!(
        "{}",
        report::render_footprint("All time", &tracker.global_footprint())
    );
    Ok(())
}

fn run_profiles(settings: &Settings, profile_file: Option<PathBuf>) -> Result<()> {
    let tracker = ImpactTracker::builder()
        .profiles(resolve_profiles(settings, profile_file)?)
        .build();
    print!("{}", report::render_profiles(&tracker.registry().profiles()));
    Ok(())
}

fn resolve_profiles(
    settings: &Settings,
    override_path: Option<PathBuf>,
) -> Result<Vec<ecotrace_core::ServiceProfile>> {
    match override_path.or_else(|| settings.profile_file.clone()) {
        Some(path) => Ok(load_profiles(path)?),
        None => Ok(builtin_profiles()),
    }
}
