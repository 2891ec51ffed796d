//! Systematic withdrawal (SWP) simulators, flat and stepped-up.

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
    xirr_warning, AnnualizedMethod, RawResult, SimulationResult, SimulationVariant,
    StepUpSwpParams, SwpParams, Transaction,
};

pub fn simulate_swp(
    series: &NavSeries,
    params: &SwpParams,
) -> NavEngineResult<ComputationOutput<SimulationResult>> {
    simulate_swp_with_config(series, params, &XirrConfig::default())
}

#[tracing::instrument(level = "debug", skip_all, fields(from = %params.from, to = %params.to))]
pub fn simulate_swp_with_config(
    series: &NavSeries,
    params: &SwpParams,
    xirr: &XirrConfig,
) -> NavEngineResult<ComputationOutput<SimulationResult>> {
    let start = Instant::now();
    validate_amount("initial_investment", params.initial_investment)?;
    validate_amount("monthly_withdrawal", params.monthly_withdrawal)?;
    validate_window(params.from, params.to)?;

    let schedule = Schedule::flat(
        params.from,
        params.to,
        params.monthly_withdrawal,
        Cadence::Withdrawal,
    );
    let (result, warnings) = run_withdrawals(
        series,
        params.initial_investment,
        &schedule,
        SimulationVariant::Swp,
        xirr,
    )?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "SWP: lumpsum purchase then monthly redemptions at the first NAV on/after each date, XIRR on all flows",
        params,
        warnings,
        elapsed,
        result,
    ))
}

pub fn simulate_step_up_swp(
    series: &NavSeries,
    params: &StepUpSwpParams,
) -> NavEngineResult<ComputationOutput<SimulationResult>> {
    simulate_step_up_swp_with_config(series, params, &XirrConfig::default())
}

#[tracing::instrument(level = "debug", skip_all, fields(from = %params.from, to = %params.to))]
pub fn simulate_step_up_swp_with_config(
    series: &NavSeries,
    params: &StepUpSwpParams,
    xirr: &XirrConfig,
) -> NavEngineResult<ComputationOutput<SimulationResult>> {
    let start = Instant::now();
    validate_amount("initial_investment", params.initial_investment)?;
    validate_amount("initial_monthly_withdrawal", params.initial_monthly_withdrawal)?;
    validate_window(params.from, params.to)?;
    validate_step_up(params.step_up_percent)?;

    let schedule = Schedule::stepped(
        params.from,
        params.to,
        params.initial_monthly_withdrawal,
        params.step_up_percent,
        Cadence::Withdrawal,
    );
    let (result, warnings) = run_withdrawals(
        series,
        params.initial_investment,
        &schedule,
        SimulationVariant::StepUpSwp,
        xirr,
    )?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Step-up SWP: lumpsum purchase then monthly redemptions raised on each anniversary, XIRR on all flows",
        params,
        warnings,
        elapsed,
        result,
    ))
}

/// Buy `initial` at `from`, then redeem each scheduled amount until `to` or
/// until a redemption empties the corpus. That redemption's date is the
/// ran-out date.
fn run_withdrawals(
    series: &NavSeries,
    initial: Money,
    schedule: &Schedule,
    variant: SimulationVariant,
    xirr: &XirrConfig,
) -> NavEngineResult<(SimulationResult, Vec<String>)> {
    let (from, to) = (schedule.from, schedule.to);
    ensure_coverage(series, from, to)?;
    let mut warnings: Vec<String> = Vec::new();

    let entry = series
        .find_on_or_after(from)
        .ok_or_else(|| NavEngineError::NavUnavailable {
            date: from,
            context: "no NAV on or after the investment date".into(),
        })?;
    let purchase = Transaction::purchase(from, entry.date, entry.nav, initial);
    let mut units = purchase.units;
    let mut transactions = vec![purchase];
    let mut flows = vec![CashFlow::new(from, -initial)];
    let mut curve = Vec::new();
    let mut withdrawn = Decimal::ZERO;
    let mut ran_out: Option<NaiveDate> = None;

    for event in schedule.events()? {
        let point = series
            .find_on_or_after(event.date)
            .ok_or_else(|| NavEngineError::NavUnavailable {
                date: event.date,
                context: "no NAV for withdrawal".into(),
            })?;
        let value = units * point.nav;

        if round_money(value) <= event.amount {
            // this redemption takes whatever is left, possibly the full amount
            tracing::debug!(date = %event.date, remaining = %value, "corpus exhausted");
            withdrawn += value;
            units = Decimal::ZERO;
            ran_out = Some(event.date);
            transactions.push(Transaction::withdrawal(event.date, point.date, point.nav, value));
            flows.push(CashFlow::new(event.date, value));
            curve.push(growth::withdrawal_point(event.date, Decimal::ZERO, withdrawn));
            break;
        }

        let tx = Transaction::withdrawal(event.date, point.date, point.nav, event.amount);
        units -= tx.units;
        withdrawn += event.amount;
        tracing::debug!(
            date = %event.date,
            nav_date = %point.date,
            amount = %event.amount,
            %units,
            "withdrawal executed"
        );
        flows.push(CashFlow::new(event.date, event.amount));
        curve.push(growth::withdrawal_point(event.date, units * point.nav, withdrawn));
        transactions.push(tx);
    }

    let final_value = match ran_out {
        Some(date) => {
            tracing::warn!(%date, "corpus ran out before the end of the period");
            warnings.push(format!("Corpus ran out on {date}; withdrawals stopped early"));
            Decimal::ZERO
        }
        None => {
            let exit = series
                .find_on_or_after(to)
                .ok_or_else(|| NavEngineError::NavUnavailable {
                    date: to,
                    context: "no NAV to value the holding".into(),
                })?;
            warnings.extend(closing_nav_warning(to, exit.date));
            let value = units * exit.nav;
            if value > Decimal::ZERO {
                flows.push(CashFlow::new(to, value));
            }
            value
        }
    };

    let outcome = metrics::xirr_with_config(&flows, xirr);
    if let Some(w) = xirr_warning(&outcome) {
        tracing::warn!(?outcome, "XIRR fell back to zero");
        warnings.push(w);
    }

    let result = RawResult {
        variant,
        total_invested: initial,
        total_withdrawn: Some(withdrawn),
        final_value,
        units_held: units,
        absolute_return: metrics::absolute_return(initial, final_value + withdrawn),
        annualized_return: outcome.rate_or_zero(),
        annualized_method: AnnualizedMethod::Xirr,
        corpus_ran_out_date: ran_out,
        growth_over_time: curve,
        transactions,
        skipped_installments: Vec::new(),
    }
    .finish();

    Ok((result, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn flat_series(months: u32, nav: Decimal) -> NavSeries {
        let points = (0..months)
            .map(|m| (crate::calendar::add_months(d(2020, 1, 1), m).unwrap(), nav))
            .collect::<Vec<_>>();
        NavSeries::from_points(points)
    }

    #[test]
    fn test_swp_within_corpus() {
        let params = SwpParams {
            initial_investment: dec!(100000),
            monthly_withdrawal: dec!(1000),
            from: d(2020, 1, 1),
            to: d(2021, 1, 1),
        };
        let r = simulate_swp(&flat_series(24, dec!(10)), &params).unwrap().result;
        assert_eq!(r.total_withdrawn, Some(dec!(12000)));
        assert_eq!(r.final_value, dec!(88000));
        assert_eq!(r.growth_over_time.len(), 12);
        assert_eq!(r.corpus_ran_out_date, None);
        assert_eq!(r.absolute_return_pct, Decimal::ZERO);
    }

    #[test]
    fn test_swp_exhausts_corpus() {
        let params = SwpParams {
            initial_investment: dec!(2500),
            monthly_withdrawal: dec!(1000),
            from: d(2020, 1, 1),
            to: d(2021, 1, 1),
        };
        let r = simulate_swp(&flat_series(24, dec!(10)), &params).unwrap().result;
        assert_eq!(r.corpus_ran_out_date, Some(d(2020, 4, 1)));
        assert_eq!(r.units_held, Decimal::ZERO);
        assert_eq!(r.final_value, Decimal::ZERO);
        assert_eq!(r.total_withdrawn, Some(dec!(2500)));
        assert_eq!(r.transactions.last().unwrap().amount, dec!(500));
    }

    #[test]
    fn test_swp_full_withdrawal_that_empties_corpus_ends_plan() {
        let params = SwpParams {
            initial_investment: dec!(3000),
            monthly_withdrawal: dec!(1000),
            from: d(2020, 1, 1),
            to: d(2021, 1, 1),
        };
        let out = simulate_swp(&flat_series(24, dec!(10)), &params).unwrap();
        let r = out.result;
        assert_eq!(r.corpus_ran_out_date, Some(d(2020, 4, 1)));
        assert_eq!(r.transactions.len(), 4);
        assert_eq!(r.transactions.last().unwrap().amount, dec!(1000));
        assert_eq!(r.total_withdrawn, Some(dec!(3000)));
        assert!(out.warnings.iter().any(|w| w.contains("2020-04-01")));
    }

    #[test]
    fn test_step_up_swp_escalates() {
        let params = StepUpSwpParams {
            initial_investment: dec!(1000000),
            initial_monthly_withdrawal: dec!(1000),
            from: d(2020, 1, 1),
            to: d(2022, 1, 1),
            step_up_percent: dec!(5),
        };
        let r = simulate_step_up_swp(&flat_series(36, dec!(10)), &params)
            .unwrap()
            .result;
        let withdrawals: Vec<Money> = r
            .transactions
            .iter()
            .skip(1)
            .map(|t| t.amount)
            .collect();
        assert_eq!(withdrawals.len(), 24);
        assert_eq!(withdrawals[10], dec!(1000)); // 2020-12-01
        assert_eq!(withdrawals[11], dec!(1050)); // 2021-01-01
        assert_eq!(withdrawals[23], dec!(1102.5)); // 2022-01-01
    }
}
