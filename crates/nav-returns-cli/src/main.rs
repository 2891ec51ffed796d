mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::metrics::{CagrArgs, XirrArgs};
use commands::rolling::RollingArgs;
use commands::simulate::{
    LumpsumArgs, SimulateArgs, SipArgs, StepUpSipArgs, StepUpSwpArgs, SwpArgs,
};

/// Mutual fund return simulations over historical NAV data
#[derive(Parser)]
#[command(
    name = "navr",
    version,
    about = "Mutual fund return simulations over historical NAV data",
    long_about = "Simulate lumpsum, SIP, step-up SIP, SWP and step-up SWP plans against \
                  a fund's NAV history, and compute XIRR, CAGR and rolling returns. \
                  NAV history comes from the input document or a date,nav CSV file."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log simulator decisions to stderr (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// One-time investment held over a period
    Lumpsum(LumpsumArgs),
    /// Fixed monthly contribution (SIP)
    Sip(SipArgs),
    /// Monthly contribution raised every year
    StepUpSip(StepUpSipArgs),
    /// Lumpsum with fixed monthly withdrawals (SWP)
    Swp(SwpArgs),
    /// Lumpsum with monthly withdrawals raised every year
    StepUpSwp(StepUpSwpArgs),
    /// Run any simulation described by a tagged input document
    Simulate(SimulateArgs),
    /// Rolling-window CAGR distribution
    Rolling(RollingArgs),
    /// XIRR of dated cash flows
    Xirr(XirrArgs),
    /// CAGR between two dated valuations
    Cagr(CagrArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("nav_returns_core=debug,navr=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Lumpsum(args) => commands::simulate::run_lumpsum(args),
        Commands::Sip(args) => commands::simulate::run_sip(args),
        Commands::StepUpSip(args) => commands::simulate::run_step_up_sip(args),
        Commands::Swp(args) => commands::simulate::run_swp(args),
        Commands::StepUpSwp(args) => commands::simulate::run_step_up_swp(args),
        Commands::Simulate(args) => commands::simulate::run_simulate(args),
        Commands::Rolling(args) => commands::rolling::run_rolling(args),
        Commands::Xirr(args) => commands::metrics::run_xirr(args),
        Commands::Cagr(args) => commands::metrics::run_cagr(args),
        Commands::Version => {
            println!("navr {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
