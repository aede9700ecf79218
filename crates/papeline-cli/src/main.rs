//! papeline - batch fetch/transform tool for PMC JATS articles.
//!
//! Resolves PMIDs/DOIs/PMCIDs or local JATS files into structured JSON
//! artifacts via `papeline-pmc` and `papeline-jats`, with a small `aux`
//! subcommand group for scripting against the individual NCBI services.

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::Result;
use clap::{Parser, Subcommand};

use papeline_core::{ProgressContext, init_logging, shutdown_flag};
use papeline_pmc::Config;

mod cmd;

use cmd::fetch::RunOutcome;

#[derive(Parser)]
#[command(name = "papeline")]
#[command(about = "Batch fetch and transform PMC JATS articles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose (debug-level) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all but warning/error logging
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file path (default: ./pmcgrab.toml or $XDG_CONFIG_HOME/pmcgrab/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Batch fetch/transform PMC articles into structured JSON
    Fetch(cmd::fetch::FetchArgs),
    /// Scripting access to individual NCBI services (BioC, OA, OAI-PMH, citation export)
    Aux(cmd::aux::AuxArgs),
    /// Show the resolved configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let progress = Arc::new(ProgressContext::new());
    let multi = if progress.is_tty() { Some(progress.multi()) } else { None };
    init_logging(cli.quiet, cli.verbose, multi);

    setup_signal_handler();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            log::error!("configuration error: {e}");
            return ExitCode::from(2);
        }
    };

    match dispatch(cli.command, &config) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn dispatch(command: Command, config: &Config) -> Result<ExitCode> {
    match command {
        Command::Fetch(args) => match cmd::fetch::run(args, config)? {
            RunOutcome::Success => Ok(ExitCode::SUCCESS),
            RunOutcome::AllFetchesFailed => Ok(ExitCode::from(3)),
            RunOutcome::OutputUnwritable => Ok(ExitCode::from(4)),
        },
        Command::Aux(args) => {
            cmd::aux::run(args, config)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config => {
            print_config(config);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_config(config: &Config) {
    println!("Configuration:");
    println!("  Workers:        {}", config.workers);
    println!("  Timeout:        {}s", config.timeout_secs);
    println!("  Max attempts:   {}", config.max_attempts);
    println!(
        "  Output dir:     {}",
        config.output_dir.as_deref().map(|p| p.display().to_string()).unwrap_or_else(|| "(unset)".to_string())
    );
    println!("  Emails in pool: {}", config.emails.len().max(1));
    println!("  API key:        {}", if config.api_key.is_some() { "configured" } else { "not set" });
}

fn setup_signal_handler() {
    // Second signal while a shutdown is already pending forces an immediate exit.
    // SAFETY: AtomicBool::swap and process::exit are async-signal-safe.
    unsafe {
        signal_hook::low_level::register(signal_hook::consts::SIGTERM, || {
            if shutdown_flag().swap(true, Ordering::Relaxed) {
                std::process::exit(130);
            }
        })
        .expect("failed to register SIGTERM handler");
        signal_hook::low_level::register(signal_hook::consts::SIGINT, || {
            if shutdown_flag().swap(true, Ordering::Relaxed) {
                std::process::exit(130);
            }
        })
        .expect("failed to register SIGINT handler");
    }
}
