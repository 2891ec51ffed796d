//! Recurring contribution (SIP) simulators, flat and stepped-up.

use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::NavEngineError;
use crate::metrics::{self, XirrConfig};
use crate::nav::NavSeries;
use crate::types::*;
use crate::NavEngineResult;

use super::growth;
use super::schedule::{Cadence, Schedule};
use super::{
    closing_nav_warning, ensure_coverage, validate_amount, validate_step_up, validate_window,
    xirr_warning, AnnualizedMethod, RawResult, SimulationResult, SimulationVariant, SipParams,
    StepUpSipParams, Transaction,
};

pub fn simulate_sip(
    series: &NavSeries,
    params: &SipParams,
) -> NavEngineResult<ComputationOutput<SimulationResult>> {
    simulate_sip_with_config(series, params, &XirrConfig::default())
}

#[tracing::instrument(level = "debug", skip_all, fields(from = %params.from, to = %params.to))]
pub fn simulate_sip_with_config(
    series: &NavSeries,
    params: &SipParams,
    xirr: &XirrConfig,
) -> NavEngineResult<ComputationOutput<SimulationResult>> {
    let start = Instant::now();
    validate_amount("amount", params.amount)?;
    validate_window(params.from, params.to)?;

    let schedule = Schedule::flat(params.from, params.to, params.amount, Cadence::Contribution);
    let (result, warnings) =
        run_contributions(series, &schedule, SimulationVariant::Sip, xirr)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "SIP: monthly purchases at the first NAV on/after each date, XIRR on contributions and closing value",
        params,
        warnings,
        elapsed,
        result,
    ))
}

pub fn simulate_step_up_sip(
    series: &NavSeries,
    params: &StepUpSipParams,
) -> NavEngineResult<ComputationOutput<SimulationResult>> {
    simulate_step_up_sip_with_config(series, params, &XirrConfig::default())
}

#[tracing::instrument(level = "debug", skip_all, fields(from = %params.from, to = %params.to))]
pub fn simulate_step_up_sip_with_config(
    series: &NavSeries,
    params: &StepUpSipParams,
    xirr: &XirrConfig,
) -> NavEngineResult<ComputationOutput<SimulationResult>> {
    let start = Instant::now();
    validate_amount("initial_amount", params.initial_amount)?;
    validate_window(params.from, params.to)?;
    validate_step_up(params.step_up_percent)?;

    let schedule = Schedule::stepped(
        params.from,
        params.to,
        params.initial_amount,
        params.step_up_percent,
        Cadence::Contribution,
    );
    let (result, warnings) =
        run_contributions(series, &schedule, SimulationVariant::StepUpSip, xirr)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Step-up SIP: monthly purchases raised on each anniversary, XIRR on contributions and closing value",
        params,
        warnings,
        elapsed,
        result,
    ))
}

/// Execute a contribution schedule.
///
/// An installment the forward lookup cannot price is dropped, not deferred. A
/// NAV dated after `to` still prices it, as it does the closing valuation.
fn run_contributions(
    series: &NavSeries,
    schedule: &Schedule,
    variant: SimulationVariant,
    xirr: &XirrConfig,
) -> NavEngineResult<(SimulationResult, Vec<String>)> {
    let (from, to) = (schedule.from, schedule.to);
    ensure_coverage(series, from, to)?;
    let mut warnings: Vec<String> = Vec::new();

    let mut transactions: Vec<Transaction> = Vec::new();
    let mut skipped: Vec<NaiveDate> = Vec::new();
    let mut flows: Vec<CashFlow> = Vec::new();
    let mut units = Decimal::ZERO;
    let mut invested = Decimal::ZERO;

    for event in schedule.events()? {
        let point = match series.find_on_or_after(event.date) {
            Some(p) => p,
            None => {
                tracing::debug!(date = %event.date, "no NAV for installment, skipping");
                skipped.push(event.date);
                continue;
            }
        };
        let tx = Transaction::purchase(event.date, point.date, point.nav, event.amount);
        tracing::debug!(
            date = %event.date,
            nav_date = %point.date,
            amount = %event.amount,
            units = %tx.units,
            "installment executed"
        );
        units += tx.units;
        invested += event.amount;
        flows.push(CashFlow::new(event.date, -event.amount));
        transactions.push(tx);
    }

    if !skipped.is_empty() {
        tracing::warn!(count = skipped.len(), "SIP installments skipped");
        warnings.push(format!(
            "{} installment(s) skipped for lack of a NAV",
            skipped.len()
        ));
    }
    if transactions.is_empty() {
        warnings.push("No installments were executed inside the period".into());
    }

    let exit = series
        .find_on_or_after(to)
        .ok_or_else(|| NavEngineError::NavUnavailable {
            date: to,
            context: "no NAV to value the holding".into(),
        })?;
    let final_value = units * exit.nav;
    if !transactions.is_empty() {
        warnings.extend(closing_nav_warning(to, exit.date));
        flows.push(CashFlow::new(to, final_value));
    }

    let outcome = metrics::xirr_with_config(&flows, xirr);
    if let Some(w) = xirr_warning(&outcome) {
        if !transactions.is_empty() {
            tracing::warn!(?outcome, "XIRR fell back to zero");
            warnings.push(w);
        }
    }

    let curve = growth::contribution_curve(series, from, to, &transactions, final_value);

    let result = RawResult {
        variant,
        total_invested: invested,
        total_withdrawn: None,
        final_value,
        units_held: units,
        absolute_return: metrics::absolute_return(invested, final_value),
        annualized_return: outcome.rate_or_zero(),
        annualized_method: AnnualizedMethod::Xirr,
        corpus_ran_out_date: None,
        growth_over_time: curve,
        transactions,
        skipped_installments: skipped,
    }
    .finish();

    Ok((result, warnings))
}
