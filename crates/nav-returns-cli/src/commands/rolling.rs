use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use nav_returns_core::rolling::{self, RollingReturnInput};

use super::parse_date_arg;
use super::simulate::SourceArgs;
use crate::input;

/// Arguments for rolling-return analysis
#[derive(Args)]
pub struct RollingArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Window length in years
    #[arg(long, default_value = "3")]
    pub window_years: u32,

    /// Ignore NAV observations before this date
    #[arg(long, value_parser = parse_date_arg)]
    pub inception: Option<NaiveDate>,
}

pub fn run_rolling(args: RollingArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut rolling_input = match input::read_document::<RollingReturnInput>(args.source.input.as_deref())? {
        Some(doc) => doc,
        None => RollingReturnInput {
            nav_history: Vec::new(),
            window_years: args.window_years,
            inception_date: args.inception,
        },
    };
    if args.inception.is_some() {
        rolling_input.inception_date = args.inception;
    }
    rolling_input.nav_history =
        input::nav_csv::nav_history(args.source.nav_csv.as_deref(), rolling_input.nav_history)?;
    if rolling_input.nav_history.is_empty() {
        return Err("NAV history required: embed navHistory in --input or pass --nav-csv".into());
    }

    let result = rolling::run_rolling_returns(&rolling_input)?;
    Ok(serde_json::to_value(result)?)
}
