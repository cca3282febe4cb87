//! Command-line interface for archsmell.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use clap::{Parser, Subcommand, ValueEnum};

use crate::report;
use crate::scan::{self, ScanOptions};
use crate::thresholds::{self, Profile, Thresholds};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_REFACTOR: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Architectural smell detector for Swift codebases.
///
/// Archsmell parses Swift sources and reports design smells such as god
/// classes, cyclic dependencies, message chains and missing abstractions,
/// each with a severity, a location and a suggested refactoring.
#[derive(Parser)]
#[command(name = "archsmell")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a Swift file or directory
    #[command(visible_alias = "check")]
    Analyze(AnalyzeArgs),
    /// Write a thresholds file with the effective values of a profile
    Init(InitArgs),
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
    Markdown,
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Path to analyze (file or directory)
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Threshold profile (overrides the profile named in the config file)
    #[arg(short, long, value_enum)]
    pub profile: Option<Profile>,

    /// Path to a thresholds file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of files to analyze in parallel
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,

    /// Show suppressed defects in output
    #[arg(long)]
    pub show_suppressed: bool,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Profile whose values are written
    #[arg(short, long, value_enum, default_value_t = Profile::Default)]
    pub profile: Profile,

    /// Output file path
    #[arg(short, long, default_value = "archsmell.yaml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Resolve thresholds from the config file (if any) and the profile flag.
pub fn load_thresholds(
    config: Option<&Path>,
    profile: Option<Profile>,
) -> anyhow::Result<Thresholds> {
    match thresholds::discover_config(config) {
        Some(path) => {
            tracing::info!(config = %path.display(), "loading thresholds");
            Ok(Thresholds::load(&path, profile)?)
        }
        None => Ok(Thresholds::for_profile(profile.unwrap_or_default())),
    }
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    let thresholds = match load_thresholds(args.config.as_deref(), args.profile) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return Ok(EXIT_ERROR);
        }
    };
    let profile = thresholds.profile;
    let timeout = thresholds.analysis.timeout;

    let options = ScanOptions {
        jobs: args.jobs.max(1),
        progress: args.format == OutputFormat::Pretty && io::stderr().is_terminal(),
    };

    // The scan runs on a worker so the process-level timeout can be enforced.
    let (tx, rx) = mpsc::channel();
    let path = args.path.clone();
    let worker_thresholds = thresholds.clone();
    thread::spawn(move || {
        let outcome = scan::analyze_path(&path, &worker_thresholds, options);
        // receiver is gone after a timeout
        let _ = tx.send(outcome);
    });

    let result = match rx.recv_timeout(timeout) {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            eprintln!(
                "Error: analysis of {} did not finish within {:?}",
                args.path.display(),
                timeout
            );
            return Ok(EXIT_ERROR);
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            anyhow::bail!("analysis worker exited without a result")
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Json => writeln!(out, "{}", report::render_json(&result, profile)?)?,
        OutputFormat::Markdown => write!(out, "{}", report::render_markdown(&result, profile))?,
        OutputFormat::Pretty => {
            report::write_pretty(&mut out, &result, profile, args.show_suppressed)?
        }
    }

    if result.requires_refactoring() {
        Ok(EXIT_REFACTOR)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // Check if output already exists
    if args.output.exists() && !args.force {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it, pass --force, or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    let yaml = Thresholds::for_profile(args.profile).to_yaml()?;
    if let Err(e) = std::fs::write(&args.output, yaml) {
        eprintln!("Error: failed to write thresholds: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!(
        "Created {} with the '{}' profile",
        args.output.display(),
        args.profile
    );
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to tune limits for your project", args.output.display());
    println!("  2. Run: archsmell analyze . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}
