//! Investor cashflow simulators over a NAV history.
//!
//! Every variant walks a monthly [`schedule::Schedule`], prices each event with
//! the forward resolver and keeps a running unit balance. Contribution variants
//! share [`contribution`], withdrawal variants share [`withdrawal`].

pub mod contribution;
pub mod growth;
pub mod lumpsum;
pub mod schedule;
pub mod withdrawal;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::NavEngineError;
use crate::metrics::{XirrConfig, XirrOutcome};
use crate::nav::{NavSeries, RawNavEntry};
use crate::types::*;
use crate::NavEngineResult;

pub use growth::GrowthPoint;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// One-time investment held from `from` to `to`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LumpsumParams {
    pub amount: Money,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Fixed monthly contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SipParams {
    pub amount: Money,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Monthly contribution raised by `step_up_percent` every year.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepUpSipParams {
    pub initial_amount: Money,
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Percentage, e.g. 10 = +10% a year
    pub step_up_percent: Decimal,
}

/// Lumpsum purchase followed by a fixed monthly withdrawal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwpParams {
    pub initial_investment: Money,
    pub monthly_withdrawal: Money,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Lumpsum purchase followed by a monthly withdrawal raised every year.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepUpSwpParams {
    pub initial_investment: Money,
    pub initial_monthly_withdrawal: Money,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub step_up_percent: Decimal,
}

/// Every supported simulation, tagged by `variant` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum Simulation {
    Lumpsum(LumpsumParams),
    Sip(SipParams),
    StepUpSip(StepUpSipParams),
    Swp(SwpParams),
    StepUpSwp(StepUpSwpParams),
}

impl Simulation {
    pub fn variant(&self) -> SimulationVariant {
        match self {
            Simulation::Lumpsum(_) => SimulationVariant::Lumpsum,
            Simulation::Sip(_) => SimulationVariant::Sip,
            Simulation::StepUpSip(_) => SimulationVariant::StepUpSip,
            Simulation::Swp(_) => SimulationVariant::Swp,
            Simulation::StepUpSwp(_) => SimulationVariant::StepUpSwp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationVariant {
    Lumpsum,
    Sip,
    StepUpSip,
    Swp,
    StepUpSwp,
}

/// Self-contained request: raw NAV history plus the plan to simulate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationInput {
    #[serde(default)]
    pub nav_history: Vec<RawNavEntry>,
    pub simulation: Simulation,
    #[serde(default)]
    pub xirr: XirrConfig,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnualizedMethod {
    Cagr,
    Xirr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Purchase,
    Withdrawal,
}

/// One executed purchase or withdrawal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub kind: TransactionKind,
    pub scheduled_date: NaiveDate,
    /// Date of the NAV the transaction was priced at
    pub nav_date: NaiveDate,
    pub nav: Decimal,
    pub amount: Money,
    pub units: Units,
}

impl Transaction {
    pub fn purchase(scheduled_date: NaiveDate, nav_date: NaiveDate, nav: Decimal, amount: Money) -> Self {
        Self {
            kind: TransactionKind::Purchase,
            scheduled_date,
            nav_date,
            nav,
            amount,
            units: amount / nav,
        }
    }

    pub fn withdrawal(scheduled_date: NaiveDate, nav_date: NaiveDate, nav: Decimal, amount: Money) -> Self {
        Self {
            kind: TransactionKind::Withdrawal,
            scheduled_date,
            nav_date,
            nav,
            amount,
            units: amount / nav,
        }
    }
}

/// Outcome of any simulator. Money is rounded to 2 dp, percentages are ×100.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub variant: SimulationVariant,
    pub total_invested: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_withdrawn: Option<Money>,
    pub final_value: Money,
    pub units_held: Units,
    pub absolute_return_pct: Percent,
    pub annualized_return_pct: Percent,
    pub annualized_method: AnnualizedMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corpus_ran_out_date: Option<NaiveDate>,
    pub growth_over_time: Vec<GrowthPoint>,
    pub transactions: Vec<Transaction>,
    pub skipped_installments: Vec<NaiveDate>,
}

/// Unrounded figures gathered by a simulator before presentation.
pub(crate) struct RawResult {
    pub variant: SimulationVariant,
    pub total_invested: Money,
    pub total_withdrawn: Option<Money>,
    pub final_value: Money,
    pub units_held: Units,
    pub absolute_return: Rate,
    pub annualized_return: Rate,
    pub annualized_method: AnnualizedMethod,
    pub corpus_ran_out_date: Option<NaiveDate>,
    pub growth_over_time: Vec<GrowthPoint>,
    pub transactions: Vec<Transaction>,
    pub skipped_installments: Vec<NaiveDate>,
}

impl RawResult {
    /// Apply boundary rounding.
    pub(crate) fn finish(self) -> SimulationResult {
        SimulationResult {
            variant: self.variant,
            total_invested: round_money(self.total_invested),
            total_withdrawn: self.total_withdrawn.map(round_money),
            final_value: round_money(self.final_value),
            units_held: round_units(self.units_held),
            absolute_return_pct: to_percent(self.absolute_return),
            annualized_return_pct: to_percent(self.annualized_return),
            annualized_method: self.annualized_method,
            corpus_ran_out_date: self.corpus_ran_out_date,
            growth_over_time: self
                .growth_over_time
                .into_iter()
                .map(|p| GrowthPoint {
                    date: p.date,
                    value: round_money(p.value),
                    cumulative_investment: p.cumulative_investment.map(round_money),
                    cumulative_withdrawal: p.cumulative_withdrawal.map(round_money),
                })
                .collect(),
            transactions: self
                .transactions
                .into_iter()
                .map(|t| Transaction {
                    amount: round_money(t.amount),
                    units: round_units(t.units),
                    ..t
                })
                .collect(),
            skipped_installments: self.skipped_installments,
        }
    }
}

fn round_units(units: Units) -> Units {
    units.round_dp(4)
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run any simulation against an already-normalised series.
pub fn simulate(
    series: &NavSeries,
    simulation: &Simulation,
) -> NavEngineResult<ComputationOutput<SimulationResult>> {
    simulate_with_config(series, simulation, &XirrConfig::default())
}

/// Run any simulation with explicit XIRR solver settings.
#[tracing::instrument(level = "debug", skip_all, fields(variant = ?simulation.variant(), observations = series.len()))]
pub fn simulate_with_config(
    series: &NavSeries,
    simulation: &Simulation,
    xirr: &XirrConfig,
) -> NavEngineResult<ComputationOutput<SimulationResult>> {
    match simulation {
        Simulation::Lumpsum(p) => lumpsum::simulate_lumpsum(series, p),
        Simulation::Sip(p) => contribution::simulate_sip_with_config(series, p, xirr),
        Simulation::StepUpSip(p) => contribution::simulate_step_up_sip_with_config(series, p, xirr),
        Simulation::Swp(p) => withdrawal::simulate_swp_with_config(series, p, xirr),
        Simulation::StepUpSwp(p) => withdrawal::simulate_step_up_swp_with_config(series, p, xirr),
    }
}

/// Normalise raw NAV history and run the requested simulation.
pub fn run_simulation(input: &SimulationInput) -> NavEngineResult<ComputationOutput<SimulationResult>> {
    let series = NavSeries::from_raw(&input.nav_history);
    let mut output = simulate_with_config(&series, &input.simulation, &input.xirr)?;
    if series.dropped_entries() > 0 {
        output.warnings.insert(
            0,
            format!(
                "{} of {} NAV rows discarded (unparsable date or non-positive NAV)",
                series.dropped_entries(),
                input.nav_history.len()
            ),
        );
    }
    Ok(output)
}

// ---------------------------------------------------------------------------
// Shared validation
// ---------------------------------------------------------------------------

pub(crate) fn validate_window(from: NaiveDate, to: NaiveDate) -> NavEngineResult<()> {
    if to < from {
        return Err(NavEngineError::invalid(
            "to",
            format!("end date {to} precedes start date {from}"),
        ));
    }
    Ok(())
}

pub(crate) fn validate_amount(field: &str, value: Money) -> NavEngineResult<()> {
    if value <= Decimal::ZERO {
        return Err(NavEngineError::invalid(field, "must be > 0"));
    }
    Ok(())
}

pub(crate) fn validate_step_up(value: Decimal) -> NavEngineResult<()> {
    if value < Decimal::ZERO {
        return Err(NavEngineError::invalid("step_up_percent", "must be >= 0"));
    }
    Ok(())
}

/// The window must overlap the NAV history: an empty series, or a window that
/// closes before the first observation, cannot be valued.
pub(crate) fn ensure_coverage(series: &NavSeries, from: NaiveDate, to: NaiveDate) -> NavEngineResult<()> {
    if series.is_empty() {
        return Err(NavEngineError::NavUnavailable {
            date: from,
            context: "NAV history is empty".into(),
        });
    }
    if series.find_on_or_before(to).is_none() {
        return Err(NavEngineError::NavUnavailable {
            date: to,
            context: "NAV history starts after the end of the requested period".into(),
        });
    }
    Ok(())
}

/// Note on the envelope when the closing valuation had to use a stale NAV.
pub(crate) fn closing_nav_warning(to: NaiveDate, nav_date: NaiveDate) -> Option<String> {
    if nav_date < to {
        Some(format!(
            "NAV history ends {nav_date}; closing value on {to} uses the last available NAV"
        ))
    } else {
        None
    }
}

/// Note on the envelope when XIRR fell back to the zero sentinel.
pub(crate) fn xirr_warning(outcome: &XirrOutcome) -> Option<String> {
    match outcome {
        XirrOutcome::Converged { .. } => None,
        XirrOutcome::DidNotConverge { iterations, reason } => Some(format!(
            "XIRR did not converge ({reason:?} after {iterations} iterations); annualized return reported as 0"
        )),
    }
}
