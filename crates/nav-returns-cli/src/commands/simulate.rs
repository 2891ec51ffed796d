use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use nav_returns_core::metrics::XirrConfig;
use nav_returns_core::nav::RawNavEntry;
use nav_returns_core::simulation::{
    self, LumpsumParams, Simulation, SimulationInput, SipParams, StepUpSipParams,
    StepUpSwpParams, SwpParams,
};

use super::parse_date_arg;
use crate::input;

/// Where the plan and its NAV history come from
#[derive(Args)]
pub struct SourceArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// CSV file with `date,nav` columns (overrides any embedded navHistory)
    #[arg(long)]
    pub nav_csv: Option<String>,
}

/// Plan parameters flattened next to an optional embedded NAV history.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantDocument<P> {
    #[serde(default)]
    nav_history: Vec<RawNavEntry>,
    #[serde(flatten)]
    params: P,
    #[serde(default)]
    xirr: XirrConfig,
}

/// Arguments for a lumpsum simulation
#[derive(Args)]
pub struct LumpsumArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Amount invested
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Investment date (DD-MM-YYYY or YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,

    /// Valuation date
    #[arg(long, value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,
}

/// Arguments for a SIP simulation
#[derive(Args)]
pub struct SipArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Monthly contribution
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// First contribution date
    #[arg(long, value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,

    /// Valuation date (contributions stop before it)
    #[arg(long, value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,
}

/// Arguments for a step-up SIP simulation
#[derive(Args)]
pub struct StepUpSipArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// First-year monthly contribution
    #[arg(long)]
    pub amount: Option<Decimal>,

    #[arg(long, value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,

    #[arg(long, value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,

    /// Annual increase in percent (e.g. 10)
    #[arg(long, default_value = "10")]
    pub step_up: Decimal,
}

/// Arguments for an SWP simulation
#[derive(Args)]
pub struct SwpArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Lumpsum invested at the start date
    #[arg(long)]
    pub initial_investment: Option<Decimal>,

    /// Monthly withdrawal
    #[arg(long)]
    pub withdrawal: Option<Decimal>,

    #[arg(long, value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,

    #[arg(long, value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,
}

/// Arguments for a step-up SWP simulation
#[derive(Args)]
pub struct StepUpSwpArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long)]
    pub initial_investment: Option<Decimal>,

    /// First-year monthly withdrawal
    #[arg(long)]
    pub withdrawal: Option<Decimal>,

    #[arg(long, value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,

    #[arg(long, value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,

    /// Annual increase in percent
    #[arg(long, default_value = "10")]
    pub step_up: Decimal,
}

/// Arguments for a tagged simulation document
#[derive(Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

fn required<T>(value: Option<T>, flag: &str) -> Result<T, Box<dyn std::error::Error>> {
    value.ok_or_else(|| format!("--{flag} is required (or provide --input)").into())
}

fn execute(
    source: &SourceArgs,
    nav_history: Vec<RawNavEntry>,
    plan: Simulation,
    xirr: XirrConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let nav_history = input::nav_csv::nav_history(source.nav_csv.as_deref(), nav_history)?;
    if nav_history.is_empty() {
        return Err("NAV history required: embed navHistory in --input or pass --nav-csv".into());
    }
    let sim_input = SimulationInput {
        nav_history,
        simulation: plan,
        xirr,
    };
    let result = simulation::run_simulation(&sim_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_lumpsum(args: LumpsumArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let doc = match input::read_document::<VariantDocument<LumpsumParams>>(args.source.input.as_deref())? {
        Some(doc) => doc,
        None => VariantDocument {
            nav_history: Vec::new(),
            params: LumpsumParams {
                amount: required(args.amount, "amount")?,
                from: required(args.from, "from")?,
                to: required(args.to, "to")?,
            },
            xirr: XirrConfig::default(),
        },
    };
    execute(&args.source, doc.nav_history, Simulation::Lumpsum(doc.params), doc.xirr)
}

pub fn run_sip(args: SipArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let doc = match input::read_document::<VariantDocument<SipParams>>(args.source.input.as_deref())? {
        Some(doc) => doc,
        None => VariantDocument {
            nav_history: Vec::new(),
            params: SipParams {
                amount: required(args.amount, "amount")?,
                from: required(args.from, "from")?,
                to: required(args.to, "to")?,
            },
            xirr: XirrConfig::default(),
        },
    };
    execute(&args.source, doc.nav_history, Simulation::Sip(doc.params), doc.xirr)
}

pub fn run_step_up_sip(args: StepUpSipArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let doc = match input::read_document::<VariantDocument<StepUpSipParams>>(args.source.input.as_deref())? {
        Some(doc) => doc,
        None => VariantDocument {
            nav_history: Vec::new(),
            params: StepUpSipParams {
                initial_amount: required(args.amount, "amount")?,
                from: required(args.from, "from")?,
                to: required(args.to, "to")?,
                step_up_percent: args.step_up,
            },
            xirr: XirrConfig::default(),
        },
    };
    execute(&args.source, doc.nav_history, Simulation::StepUpSip(doc.params), doc.xirr)
}

pub fn run_swp(args: SwpArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let doc = match input::read_document::<VariantDocument<SwpParams>>(args.source.input.as_deref())? {
        Some(doc) => doc,
        None => VariantDocument {
            nav_history: Vec::new(),
            params: SwpParams {
                initial_investment: required(args.initial_investment, "initial-investment")?,
                monthly_withdrawal: required(args.withdrawal, "withdrawal")?,
                from: required(args.from, "from")?,
                to: required(args.to, "to")?,
            },
            xirr: XirrConfig::default(),
        },
    };
    execute(&args.source, doc.nav_history, Simulation::Swp(doc.params), doc.xirr)
}

pub fn run_step_up_swp(args: StepUpSwpArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let doc = match input::read_document::<VariantDocument<StepUpSwpParams>>(args.source.input.as_deref())? {
        Some(doc) => doc,
        None => VariantDocument {
            nav_history: Vec::new(),
            params: StepUpSwpParams {
                initial_investment: required(args.initial_investment, "initial-investment")?,
                initial_monthly_withdrawal: required(args.withdrawal, "withdrawal")?,
                from: required(args.from, "from")?,
                to: required(args.to, "to")?,
                step_up_percent: args.step_up,
            },
            xirr: XirrConfig::default(),
        },
    };
    execute(&args.source, doc.nav_history, Simulation::StepUpSwp(doc.params), doc.xirr)
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sim_input: SimulationInput = input::read_document(args.source.input.as_deref())?
        .ok_or("--input <file.json|file.yaml> or stdin required for simulate")?;
    execute(
        &args.source,
        sim_input.nav_history,
        sim_input.simulation,
        sim_input.xirr,
    )
}
