// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagesort — keyword classification, ROI-first OCR, and document splitting
// for multi-document scanned PDFs.
//
// Entry point. Parses the command line, initialises logging, and dispatches to
// the batch runner or one of the inspection commands.

mod batch;
mod integrity;
mod report;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pagesort_classify::PageClassifier;
use pagesort_core::error::{PagesortError, Result};
use pagesort_core::{PipelineConfig, ProfileTable};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use batch::{BatchOptions, BatchOutcome, BatchRunner, OrientationSource, discover_pdfs};
use report::CsvSummary;

#[derive(Parser)]
#[command(name = "pagesort")]
#[command(version)]
#[command(about = "Classify the pages of scanned PDFs and split them into documents", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also append plain-text logs to this file
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify and split every PDF in a directory
    Run(RunArgs),

    /// Classify the contents of a text file and print the result as JSON
    Classify {
        #[arg(value_name = "TEXT_FILE")]
        text_file: PathBuf,

        /// Pipeline configuration (JSON)
        #[arg(short, long, value_name = "FILE", env = "PAGESORT_CONFIG")]
        config: Option<PathBuf>,

        /// Document type profiles (JSON); built-in table if omitted
        #[arg(long, value_name = "FILE", env = "PAGESORT_PROFILES")]
        profiles: Option<PathBuf>,
    },

    /// Print the active document type profiles as JSON
    Profiles {
        #[arg(long, value_name = "FILE", env = "PAGESORT_PROFILES")]
        profiles: Option<PathBuf>,
    },
}

/// OCR engine used for the header, footer and full-page passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum Engine {
    /// Pure-Rust ocrs models (`.rten`)
    #[cfg_attr(not(feature = "oar"), default)]
    Ocrs,
    /// PaddleOCR ONNX models through oar-ocr, scored per line
    #[cfg_attr(feature = "oar", default)]
    Oar,
}

#[derive(Args)]
struct RunArgs {
    /// Directory holding the scanned PDFs
    #[arg(value_name = "INPUT_DIR")]
    input: PathBuf,

    /// Directory for the split PDFs
    #[arg(short, long, value_name = "DIR", default_value = "output")]
    output: PathBuf,

    /// Directory for per-document reports
    #[arg(long, value_name = "DIR", default_value = "reports")]
    reports: PathBuf,

    /// Batch CSV summary [default: <REPORTS>/summary.csv]
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Pipeline configuration (JSON)
    #[arg(short, long, value_name = "FILE", env = "PAGESORT_CONFIG")]
    config: Option<PathBuf>,

    /// Document type profiles (JSON); built-in table if omitted
    #[arg(long, value_name = "FILE", env = "PAGESORT_PROFILES")]
    profiles: Option<PathBuf>,

    /// OCR engine
    #[arg(long, value_enum, default_value_t = Engine::default())]
    engine: Engine,

    /// Directory holding the OCR detection and recognition models
    #[arg(long, value_name = "DIR", env = "PAGESORT_MODELS")]
    models: Option<PathBuf>,

    /// Page orientation model (ONNX) [default: looked up in <MODELS>]
    #[arg(long, value_name = "FILE", env = "PAGESORT_ORIENTATION_MODEL")]
    orientation_model: Option<PathBuf>,

    /// PDFs processed concurrently (overrides the configuration)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Always OCR the full page
    #[arg(long)]
    no_roi: bool,

    /// Write reports only, no split PDFs
    #[arg(long)]
    no_split: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("pagesort: {err}");
        return ExitCode::FAILURE;
    }

    match execute(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!(%err, "pagesort failed");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| {
                    PagesortError::Config(format!("cannot open log file {}: {}", path.display(), err))
                })?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

/// Returns whether the command fully succeeded.
fn execute(command: Command) -> Result<bool> {
    match command {
        Command::Run(args) => run(args),
        Command::Classify {
            text_file,
            config,
            profiles,
        } => {
            let config = load_config(config.as_deref())?;
            let profiles = load_profiles(profiles.as_deref())?;
            let text = std::fs::read_to_string(&text_file)?;
            let classification = PageClassifier::new(&profiles, &config).classify(&text);
            println!("{}", serde_json::to_string_pretty(&classification)?);
            Ok(true)
        }
        Command::Profiles { profiles } => {
            let profiles = load_profiles(profiles.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&profiles)?);
            Ok(true)
        }
    }
}

fn run(args: RunArgs) -> Result<bool> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(workers) = args.workers {
        config.max_workers = workers;
    }
    if args.no_roi {
        config.enable_roi_ocr = false;
    }
    config.validate()?;

    let orientation =
        OrientationSource::resolve(args.orientation_model.as_deref(), args.models.as_deref());
    orientation.validate()?;

    let profiles = load_profiles(args.profiles.as_deref())?;
    let classifier = PageClassifier::new(&profiles, &config);
    info!(
        profiles = classifier.profile_count(),
        roi = config.enable_roi_ocr,
        workers = config.max_workers,
        engine = ?args.engine,
        orientation = ?orientation,
        "Pagesort starting"
    );
    if orientation == OrientationSource::Upright {
        warn!("No orientation model; pages are processed as scanned");
    }

    let pdfs = discover_pdfs(&args.input)?;
    if pdfs.is_empty() {
        warn!(input = %args.input.display(), "No PDF files found");
        return Ok(true);
    }

    let summary_path = args
        .summary
        .clone()
        .unwrap_or_else(|| args.reports.join("summary.csv"));
    let options = BatchOptions {
        output_dir: args.output,
        reports_dir: args.reports,
        split: !args.no_split,
    };

    let runner = BatchRunner::new(&config, &classifier, &options);
    let outcome = match args.engine {
        Engine::Ocrs => run_ocrs(&runner, &pdfs, args.models.as_deref(), &orientation)?,
        Engine::Oar => run_oar(&runner, &pdfs, args.models.as_deref(), &orientation)?,
    };
    outcome.log_summary();

    if !outcome.reports.is_empty() {
        CsvSummary::new(summary_path).append(&outcome.reports)?;
    }
    Ok(outcome.is_success())
}

#[cfg(feature = "ocr")]
fn run_ocrs(
    runner: &BatchRunner<'_>,
    pdfs: &[PathBuf],
    models: Option<&Path>,
    orientation: &OrientationSource,
) -> Result<BatchOutcome> {
    use pagesort_document::scan::{OcrConfig, OcrsRecognizer};

    let ocr = models.map(OcrConfig::from_dir).unwrap_or_default();
    ocr.validate()?;
    runner.run(pdfs, || OcrsRecognizer::new(&ocr), || orientation.build())
}

#[cfg(not(feature = "ocr"))]
fn run_ocrs(
    _runner: &BatchRunner<'_>,
    _pdfs: &[PathBuf],
    _models: Option<&Path>,
    _orientation: &OrientationSource,
) -> Result<BatchOutcome> {
    Err(PagesortError::OcrUnavailable("ocr"))
}

#[cfg(feature = "oar")]
fn run_oar(
    runner: &BatchRunner<'_>,
    pdfs: &[PathBuf],
    models: Option<&Path>,
    orientation: &OrientationSource,
) -> Result<BatchOutcome> {
    use pagesort_document::scan::{OarConfig, OarRecognizer};

    let dir = models.ok_or_else(|| {
        PagesortError::Config("the oar engine needs --models <DIR>".to_string())
    })?;
    let oar = OarConfig::from_dir(dir);
    oar.validate()?;
    runner.run(pdfs, || OarRecognizer::new(&oar), || orientation.build())
}

#[cfg(not(feature = "oar"))]
fn run_oar(
    _runner: &BatchRunner<'_>,
    _pdfs: &[PathBuf],
    _models: Option<&Path>,
    _orientation: &OrientationSource,
) -> Result<BatchOutcome> {
    Err(PagesortError::OcrUnavailable("oar"))
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(path),
        None => Ok(PipelineConfig::default()),
    }
}

fn load_profiles(path: Option<&Path>) -> Result<ProfileTable> {
    match path {
        Some(path) => ProfileTable::load(path),
        None => Ok(ProfileTable::builtin()),
    }
}
