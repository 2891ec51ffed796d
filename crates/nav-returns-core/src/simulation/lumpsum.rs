use std::time::Instant;

use crate::error::NavEngineError;
use crate::metrics;
use crate::nav::NavSeries;
use crate::types::*;
use crate::NavEngineResult;

use super::growth;
use super::{
    closing_nav_warning, ensure_coverage, validate_amount, validate_window, AnnualizedMethod,
    LumpsumParams, RawResult, SimulationResult, SimulationVariant, Transaction,
};

/// Buy once at `from`, value at `to`. Annualised with CAGR over the dates of
/// the two NAVs actually used.
#[tracing::instrument(level = "debug", skip_all, fields(from = %params.from, to = %params.to))]
pub fn simulate_lumpsum(
    series: &NavSeries,
    params: &LumpsumParams,
) -> NavEngineResult<ComputationOutput<SimulationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_amount("amount", params.amount)?;
    validate_window(params.from, params.to)?;
    ensure_coverage(series, params.from, params.to)?;

    let entry = series
        .find_on_or_after(params.from)
        .ok_or_else(|| NavEngineError::NavUnavailable {
            date: params.from,
            context: "no NAV on or after the investment date".into(),
        })?;
    let exit = series
        .find_on_or_after(params.to)
        .ok_or_else(|| NavEngineError::NavUnavailable {
            date: params.to,
            context: "no NAV to value the holding".into(),
        })?;

    let purchase = Transaction::purchase(params.from, entry.date, entry.nav, params.amount);
    let units = purchase.units;
    let final_value = units * exit.nav;
    tracing::debug!(entry = %entry.date, exit = %exit.date, %units, %final_value, "lumpsum priced");

    warnings.extend(closing_nav_warning(params.to, exit.date));

    let absolute = metrics::absolute_return(params.amount, final_value);
    let annualized = metrics::cagr_between(entry.date, params.amount, exit.date, final_value);

    let curve = growth::holding_curve(
        series,
        params.from,
        params.to,
        units,
        params.amount,
        final_value,
    );

    let result = RawResult {
        variant: SimulationVariant::Lumpsum,
        total_invested: params.amount,
        total_withdrawn: None,
        final_value,
        units_held: units,
        absolute_return: absolute,
        annualized_return: annualized,
        annualized_method: AnnualizedMethod::Cagr,
        corpus_ran_out_date: None,
        growth_over_time: curve,
        transactions: vec![purchase],
        skipped_installments: Vec::new(),
    }
    .finish();

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Lumpsum: single purchase at the first NAV on/after the start date, CAGR to the closing NAV",
        params,
        warnings,
        elapsed,
        result,
    ))
}
