//! `kb-isolation-check`: fail CI when a domain module imports another directly.
//!
//! Exit codes: 0 passed, 1 violations or cycles found, 2 the check could not run.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use kb_isolation_check::{
    Checker, CheckerConfig, DEFAULT_MODULE_PREFIX, DEFAULT_ROOT, EXIT_ERROR,
};
use kb_telemetry::TelemetryConfig;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "kb-isolation-check")]
#[command(about = "Module dependency graph checker for the knowledge-base modules")]
#[command(version)]
struct Args {
    /// Directory holding one subdirectory or file per module
    #[arg(short, long, env = "KB_CHECK_ROOT", default_value = DEFAULT_ROOT)]
    root: PathBuf,

    /// Shared kernel module names
    #[arg(long = "shared", env = "KB_CHECK_SHARED", value_delimiter = ',', default_value = "shared")]
    shared: Vec<String>,

    /// Path prefixes that address a module (empty string: bare module names)
    #[arg(
        long = "prefix",
        env = "KB_CHECK_PREFIXES",
        value_delimiter = ',',
        default_value = DEFAULT_MODULE_PREFIX
    )]
    prefixes: Vec<String>,

    /// Submodules other modules may reference
    #[arg(long = "public", env = "KB_CHECK_PUBLIC", value_delimiter = ',', default_value = "events")]
    public: Vec<String>,

    /// Report format
    #[arg(short, long, env = "KB_CHECK_FORMAT", value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log scanning progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(args: &Args) -> Result<u8> {
    let config = CheckerConfig::new(&args.root)
        .with_shared_kernel(args.shared.iter().cloned())
        .with_module_prefixes(args.prefixes.iter().cloned())
        .with_public_surfaces(args.public.iter().cloned());

    let mut checker = Checker::new(config)?;
    let report = checker
        .run()
        .with_context(|| format!("checking {}", args.root.display()))?;

    match args.format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", report.render_json()?),
    }

    Ok(report.exit_code())
}

fn init_logging(verbose: bool) {
    let config = TelemetryConfig {
        log_level: if verbose { "debug" } else { "warn" }.to_string(),
        ..TelemetryConfig::for_service("kb-isolation-check")
    };
    if let Err(e) = kb_telemetry::init_logging(&config) {
        eprintln!("warning: logging disabled: {e}");
    }
}
