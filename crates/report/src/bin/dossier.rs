//! Dossier CLI - fingerprint, score and render compliance dossiers
//!
//! Usage:
//!   dossier generate --input facts.json --out report.pdf [--config layout.yaml]
//!   dossier fingerprint --input facts.json
//!   dossier verify --input facts.json --expected <HEX>
//!   dossier risk --input facts.json
//!   dossier findings --input facts.json
//!   dossier normalize --input facts.json
//!
//! Inputs may be either raw-record shape (flat legacy or structured).
//! JSON results go to stdout; logs go to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dossier_core::{
    assess, fingerprint, normalize_with_report, synthesize, verify_stored, RawFacts,
};
use dossier_report::{init_logging, logging, LayoutConfig, ReportGenerator};
use serde::Serialize;

/// Compliance dossier generator
#[derive(Parser, Debug)]
#[command(name = "dossier")]
#[command(about = "Normalize scan facts, fingerprint them and render paginated PDF dossiers")]
struct Args {
    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Also write daily-rolling logs to the default log directory
    #[arg(long, global = true)]
    log_file: bool,

    /// Also write daily-rolling logs to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a PDF dossier and write it atomically
    Generate {
        /// Scan facts JSON
        #[arg(long)]
        input: PathBuf,

        /// Output PDF path
        #[arg(long)]
        out: PathBuf,

        /// Layout configuration (YAML, or JSON by extension)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory containing LiberationSans-*.ttf
        #[arg(long)]
        font_dir: Option<PathBuf>,
    },

    /// Print the integrity fingerprint
    Fingerprint {
        #[arg(long)]
        input: PathBuf,
    },

    /// Recompute the fingerprint from stored facts and compare
    Verify {
        #[arg(long)]
        input: PathBuf,

        /// Expected fingerprint (hex)
        #[arg(long)]
        expected: String,
    },

    /// Print the risk assessment
    Risk {
        #[arg(long)]
        input: PathBuf,
    },

    /// Print the findings register
    Findings {
        #[arg(long)]
        input: PathBuf,
    },

    /// Print the canonical model and any degradations
    Normalize {
        #[arg(long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_dir = args
        .log_dir
        .or_else(|| args.log_file.then(logging::get_log_dir));
    let _guard = init_logging(&args.log_level, log_dir.as_deref());

    match run(args.command).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(command: Command) -> Result<ExitCode> {
    match command {
        Command::Generate {
            input,
            out,
            config,
            font_dir,
        } => {
            let mut layout = match config {
                Some(path) => LayoutConfig::load(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => LayoutConfig::default(),
            };
            if font_dir.is_some() {
                layout.font_dir = font_dir;
            }

            let raw = read_raw(&input)?;
            let generator = ReportGenerator::new(layout);
            let report = generator
                .generate_to_file(&raw, &out)
                .await
                .with_context(|| format!("Failed to generate {}", out.display()))?;
            print_json(&report.summary())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Fingerprint { input } => {
            let model = normalize_with_report(&read_raw(&input)?).model;
            let fp = fingerprint(&model)?;
            println!("{}", fp);
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { input, expected } => {
            let stored = read_json(&input)?;
            let outcome = verify_stored(&stored, &expected)?;
            print_json(&outcome)?;
            Ok(if outcome.matches {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Command::Risk { input } => {
            let model = normalize_with_report(&read_raw(&input)?).model;
            print_json(&assess(&model))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Findings { input } => {
            let model = normalize_with_report(&read_raw(&input)?).model;
            print_json(&synthesize(&model))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Normalize { input } => {
            let normalized = normalize_with_report(&read_raw(&input)?);
            print_json(&normalized)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn read_raw(path: &Path) -> Result<RawFacts> {
    Ok(RawFacts::from(read_json(path)?))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
