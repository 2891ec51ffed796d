use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use nav_returns_core::metrics::{self, CagrInput, XirrConfig, XirrInput};
use nav_returns_core::CashFlow;

use super::parse_date_arg;
use crate::input;

/// Arguments for XIRR
#[derive(Args)]
pub struct XirrArgs {
    /// Path to JSON/YAML input file with `cashFlows`
    #[arg(long)]
    pub input: Option<String>,

    /// Comma-separated `date:amount` pairs, outflows negative
    /// (e.g. 01-01-2020:-10000,01-01-2021:11000)
    #[arg(long, allow_hyphen_values = true)]
    pub flows: Option<String>,

    /// Initial guess for the solver
    #[arg(long)]
    pub guess: Option<Decimal>,
}

/// Arguments for CAGR
#[derive(Args)]
pub struct CagrArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Starting value
    #[arg(long)]
    pub initial: Option<Decimal>,

    /// Ending value
    #[arg(long = "final")]
    pub final_value: Option<Decimal>,

    #[arg(long, value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,

    #[arg(long, value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,
}

fn parse_flows(raw: &str) -> Result<Vec<CashFlow>, Box<dyn std::error::Error>> {
    raw.split(',')
        .filter(|pair| !pair.trim().is_empty())
        .map(|pair| -> Result<CashFlow, Box<dyn std::error::Error>> {
            let (date, amount) = pair
                .trim()
                .rsplit_once(':')
                .ok_or_else(|| format!("Expected date:amount, got '{pair}'"))?;
            let date = parse_date_arg(date)?;
            let amount: Decimal = amount
                .trim()
                .parse()
                .map_err(|e| format!("Invalid amount in '{pair}': {e}"))?;
            Ok(CashFlow::new(date, amount))
        })
        .collect()
}

pub fn run_xirr(args: XirrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut xirr_input = match args.flows.as_deref() {
        Some(raw) => XirrInput {
            cash_flows: parse_flows(raw)?,
            config: XirrConfig::default(),
        },
        None => input::read_document::<XirrInput>(args.input.as_deref())?
            .ok_or("--flows or --input <file.json|file.yaml> required for xirr")?,
    };
    if let Some(guess) = args.guess {
        xirr_input.config.guess = guess;
    }

    let result = metrics::calculate_xirr(&xirr_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_cagr(args: CagrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cagr_input = match input::read_document::<CagrInput>(args.input.as_deref())? {
        Some(doc) => doc,
        None => CagrInput {
            initial_value: args.initial.ok_or("--initial is required (or provide --input)")?,
            final_value: args.final_value.ok_or("--final is required (or provide --input)")?,
            from: args.from.ok_or("--from is required (or provide --input)")?,
            to: args.to.ok_or("--to is required (or provide --input)")?,
        },
    };

    let result = metrics::calculate_cagr(&cagr_input)?;
    Ok(serde_json::to_value(result)?)
}
