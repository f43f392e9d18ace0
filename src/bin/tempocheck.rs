//! tempocheck command line front-end.
//!
//! Reads a JSON constraint document and a CSV log, writes violations as JSON
//! lines and prints the run report to stderr. Exits with status 1 when any
//! violation was found.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use regex::Regex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tempocheck::{
    AnalyserConfig, ConstraintSet, CsvLogSource, JsonConstraintProvider, JsonLinesSink, Validator,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Check a recorded signal log against delay and age constraints")]
struct Args {
    /// JSON document with the extracted delay/age constraints
    #[arg(long)]
    constraints: PathBuf,
    /// CSV log with a header row
    #[arg(long)]
    log: PathBuf,
    /// Optional JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Name of the timestamp column (overrides config)
    #[arg(long)]
    timestamp_column: Option<String>,
    /// Multiplier applied to timestamps (overrides config)
    #[arg(long)]
    timestamp_scale: Option<f64>,
    /// Only check constraints whose id matches this regex
    #[arg(long)]
    only: Option<Regex>,
    /// Violation output file (JSON lines); stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run() {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<bool> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(io::stderr)
        .init();

    let cfg = load_config(&args)?;

    let provider = JsonConstraintProvider::from_reader(BufReader::new(
        File::open(&args.constraints)
            .with_context(|| format!("open constraints {}", args.constraints.display()))?,
    ))?;
    let mut constraints = ConstraintSet::from_provider(&provider)?;
    if let Some(pattern) = &args.only {
        constraints.retain_matching(pattern);
        info!(pattern = %pattern, remaining = constraints.len(), "filtered constraints");
    }

    let log_file =
        File::open(&args.log).with_context(|| format!("open log {}", args.log.display()))?;
    let source = CsvLogSource::new(BufReader::new(log_file), &cfg)?;

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("create output {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut sink = JsonLinesSink::new(out);

    let mut validator = Validator::new(source, constraints, &cfg);
    let report = validator.run(&mut sink)?;

    eprintln!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report.has_violations())
}

fn load_config(args: &Args) -> Result<AnalyserConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            AnalyserConfig::from_json_str(&raw)?
        }
        None => AnalyserConfig::default(),
    };
    if let Some(column) = &args.timestamp_column {
        cfg.timestamp_column.clone_from(column);
    }
    if let Some(scale) = args.timestamp_scale {
        cfg.timestamp_scale = scale;
    }
    cfg.validate()?;
    Ok(cfg)
}
