pub mod metrics;
pub mod rolling;
pub mod simulate;

use chrono::NaiveDate;

/// clap value parser accepting `DD-MM-YYYY` or `YYYY-MM-DD`.
pub fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    nav_returns_core::calendar::parse_date(raw).map_err(|e| e.to_string())
}
