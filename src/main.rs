//! Binary entry point for the pyrepr CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Preview the module with generated __repr__ methods inserted
//! pyrepr show mymodule.py
//!
//! # Unified diff of what would change
//! pyrepr diff mymodule.py
//!
//! # Rewrite the file in place
//! pyrepr write mymodule.py --kwarg-splat '...'
//!
//! # Strip previously generated __repr__ methods
//! pyrepr remove mymodule.py --mode write
//!
//! # List classes missing a __repr__
//! pyrepr report mymodule.py --format json
//! ```
//!
//! Success prints the command's lines and exits 0. Failures print exactly
//! one diagnostic line to stderr and exit non-zero.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use pyrepr::driver::{self, Mode, Options};
use pyrepr::error::ReprError;
use pyrepr::output::{emit_json, ReportResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Generate __repr__ methods for Python classes from their __init__
/// signatures.
#[derive(Parser, Debug)]
#[command(name = "pyrepr", version, about)]
struct Cli {
    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// How the remove command disposes of the rewritten module.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Print the module with the methods removed (default).
    #[default]
    Show,
    /// Print a unified diff of the removals.
    Diff,
    /// Apply the removals to the file in place.
    Write,
}

impl ModeArg {
    fn as_mode(self) -> Mode {
        match self {
            ModeArg::Show => Mode::Show,
            ModeArg::Diff => Mode::Diff,
            ModeArg::Write => Mode::Write,
        }
    }
}

/// Output format for the report command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    /// One `path: line: Class` line per entry (default).
    #[default]
    Text,
    /// JSON response object.
    Json,
}

/// Arguments shared by the generating subcommands.
#[derive(Parser, Debug)]
struct GenerateArgs {
    /// The Python source file.
    file: PathBuf,

    /// Literal placeholder rendered for a **kwargs capture.
    #[arg(long, default_value = "{}")]
    kwarg_splat: String,

    /// Skip classes that already define __repr__.
    #[arg(long)]
    skip_existing: bool,
}

impl GenerateArgs {
    fn options(&self) -> Options {
        Options {
            kwarg_splat: self.kwarg_splat.clone(),
            skip_existing: self.skip_existing,
        }
    }
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Print the module with generated __repr__ methods inserted.
    Show(GenerateArgs),
    /// Print a unified diff of the changes.
    Diff(GenerateArgs),
    /// Apply the changes to the file in place.
    Write(GenerateArgs),
    /// Remove previously generated __repr__ methods.
    Remove {
        /// The Python source file.
        file: PathBuf,
        /// What to do with the stripped module.
        #[arg(long, value_enum, default_value = "show")]
        mode: ModeArg,
    },
    /// Report classes without a __repr__ method.
    Report {
        /// The Python source file.
        file: PathBuf,
        /// Output format.
        #[arg(long, value_enum, default_value = "text")]
        format: ReportFormat,
    },
}

// ============================================================================
// Entry point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn execute(command: Command) -> Result<(), ReprError> {
    match command {
        Command::Show(args) => print_lines(driver::run(&args.file, Mode::Show, &args.options())?),
        Command::Diff(args) => print_lines(driver::run(&args.file, Mode::Diff, &args.options())?),
        Command::Write(args) => {
            driver::run(&args.file, Mode::Write, &args.options())?;
        }
        Command::Remove { file, mode } => {
            print_lines(driver::run_remove(&file, mode.as_mode())?);
        }
        Command::Report { file, format } => {
            let entries = driver::report(&file)?;
            match format {
                ReportFormat::Text => {
                    print_lines(entries.iter().map(|e| e.to_text()).collect());
                }
                ReportFormat::Json => {
                    let response = ReportResponse::new(entries);
                    // Stdout going away mid-print is not a pipeline error.
                    let _ = emit_json(&response, &mut io::stdout());
                }
            }
        }
    }
    Ok(())
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pyrepr={}", level.as_filter())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
