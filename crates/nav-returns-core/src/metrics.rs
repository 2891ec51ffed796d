use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::error::NavEngineError;
use crate::types::*;
use crate::NavEngineResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_XIRR_ITERATIONS: u32 = 100;
const DEFAULT_GUESS: Decimal = dec!(0.1);

/// Simple return on invested capital: `(final - invested) / invested`.
///
/// Returns zero when nothing was invested.
pub fn absolute_return(total_invested: Money, final_value: Money) -> Rate {
    if total_invested.is_zero() {
        return Decimal::ZERO;
    }
    (final_value - total_invested) / total_invested
}

/// Compound annual growth rate over `years` (actual/365 year fraction).
///
/// Zero when the period is empty or either value is non-positive. The
/// fractional power is taken in f64; inputs and result stay Decimal.
pub fn cagr(initial_value: Money, final_value: Money, years: Years) -> Rate {
    if years <= Decimal::ZERO || initial_value <= Decimal::ZERO || final_value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let ratio = match (final_value / initial_value).to_f64() {
        Some(r) => r,
        None => return Decimal::ZERO,
    };
    let years = match years.to_f64() {
        Some(y) => y,
        None => return Decimal::ZERO,
    };
    Decimal::from_f64(ratio.powf(1.0 / years) - 1.0).unwrap_or(Decimal::ZERO)
}

/// CAGR between two dated valuations.
pub fn cagr_between(
    start_date: NaiveDate,
    initial_value: Money,
    end_date: NaiveDate,
    final_value: Money,
) -> Rate {
    cagr(
        initial_value,
        final_value,
        calendar::year_fraction(start_date, end_date),
    )
}

/// Newton-Raphson settings for [`xirr_with_config`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct XirrConfig {
    /// Starting rate for the iteration
    pub guess: Rate,
    pub max_iterations: u32,
    /// Absolute NPV below which the rate is accepted
    pub tolerance: Decimal,
}

impl Default for XirrConfig {
    fn default() -> Self {
        Self {
            guess: DEFAULT_GUESS,
            max_iterations: MAX_XIRR_ITERATIONS,
            tolerance: CONVERGENCE_THRESHOLD,
        }
    }
}

/// Why the solver gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonConvergence {
    TooFewCashFlows,
    ZeroDerivative,
    NonFinite,
    IterationLimit,
}

/// Result of the XIRR solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum XirrOutcome {
    Converged { rate: Rate, iterations: u32 },
    DidNotConverge { iterations: u32, reason: NonConvergence },
}

impl XirrOutcome {
    /// The solved rate, or zero when the solver did not converge.
    pub fn rate_or_zero(&self) -> Rate {
        match self {
            XirrOutcome::Converged { rate, .. } => *rate,
            XirrOutcome::DidNotConverge { .. } => Decimal::ZERO,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, XirrOutcome::Converged { .. })
    }
}

/// Money-weighted annual return for irregularly dated cash flows.
pub fn xirr(flows: &[CashFlow]) -> XirrOutcome {
    xirr_with_config(flows, &XirrConfig::default())
}

/// XIRR via Newton-Raphson on `Σ cf / (1+r)^(days/365)`, with days counted from
/// the earliest flow.
pub fn xirr_with_config(flows: &[CashFlow], config: &XirrConfig) -> XirrOutcome {
    if flows.len() < 2 {
        return XirrOutcome::DidNotConverge {
            iterations: 0,
            reason: NonConvergence::TooFewCashFlows,
        };
    }

    let base_date = flows.iter().map(|cf| cf.date).min().unwrap_or(flows[0].date);
    let mut terms: Vec<(f64, f64)> = Vec::with_capacity(flows.len());
    for cf in flows {
        let years = calendar::days_between(base_date, cf.date) as f64 / 365.0;
        match cf.amount.to_f64() {
            Some(amount) => terms.push((years, amount)),
            None => {
                return XirrOutcome::DidNotConverge {
                    iterations: 0,
                    reason: NonConvergence::NonFinite,
                }
            }
        }
    }

    let tolerance = config.tolerance.to_f64().unwrap_or(1e-7);
    let mut rate = config.guess.to_f64().unwrap_or(0.1);

    for i in 0..config.max_iterations {
        let npv: f64 = terms
            .iter()
            .map(|(t, cf)| cf / (1.0 + rate).powf(*t))
            .sum();

        if !npv.is_finite() {
            return XirrOutcome::DidNotConverge {
                iterations: i,
                reason: NonConvergence::NonFinite,
            };
        }

        if npv.abs() < tolerance {
            return match Decimal::from_f64(rate) {
                Some(rate) => XirrOutcome::Converged {
                    rate,
                    iterations: i,
                },
                None => XirrOutcome::DidNotConverge {
                    iterations: i,
                    reason: NonConvergence::NonFinite,
                },
            };
        }

        // (1+r) must stay positive for fractional powers
        let mut dnpv = 0.0;
        if rate > -1.0 {
            for (t, cf) in &terms {
                dnpv -= t * cf / (1.0 + rate).powf(t + 1.0);
            }
        }

        if dnpv == 0.0 {
            return XirrOutcome::DidNotConverge {
                iterations: i,
                reason: NonConvergence::ZeroDerivative,
            };
        }

        rate -= npv / dnpv;
    }

    XirrOutcome::DidNotConverge {
        iterations: config.max_iterations,
        reason: NonConvergence::IterationLimit,
    }
}

// ---------------------------------------------------------------------------
// Standalone calculations
// ---------------------------------------------------------------------------

/// Request for [`calculate_xirr`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XirrInput {
    pub cash_flows: Vec<CashFlow>,
    #[serde(default)]
    pub config: XirrConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XirrOutput {
    pub outcome: XirrOutcome,
    /// Zero when the solver did not converge
    pub annualized_return_pct: Percent,
    pub total_outflow: Money,
    pub total_inflow: Money,
}

/// XIRR of an arbitrary dated cash flow series.
pub fn calculate_xirr(input: &XirrInput) -> NavEngineResult<ComputationOutput<XirrOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.cash_flows.is_empty() {
        return Err(NavEngineError::InsufficientData(
            "XIRR needs at least one cash flow".into(),
        ));
    }

    let outcome = xirr_with_config(&input.cash_flows, &input.config);
    if let XirrOutcome::DidNotConverge { iterations, reason } = outcome {
        warnings.push(format!(
            "XIRR did not converge ({reason:?} after {iterations} iterations); reporting 0"
        ));
    }

    let total_outflow: Money = input
        .cash_flows
        .iter()
        .filter(|cf| cf.amount.is_sign_negative())
        .map(|cf| cf.amount.abs())
        .sum();
    let total_inflow: Money = input
        .cash_flows
        .iter()
        .filter(|cf| cf.amount.is_sign_positive())
        .map(|cf| cf.amount)
        .sum();

    let output = XirrOutput {
        outcome,
        annualized_return_pct: to_percent(outcome.rate_or_zero()),
        total_outflow: round_money(total_outflow),
        total_inflow: round_money(total_inflow),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "XIRR (Newton-Raphson, actual/365 from the earliest flow)",
        &input.config,
        warnings,
        elapsed,
        output,
    ))
}

/// Request for [`calculate_cagr`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CagrInput {
    pub initial_value: Money,
    pub final_value: Money,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CagrOutput {
    pub years: Years,
    pub absolute_return_pct: Percent,
    pub cagr_pct: Percent,
}

/// Absolute return and CAGR between two dated valuations.
pub fn calculate_cagr(input: &CagrInput) -> NavEngineResult<ComputationOutput<CagrOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.to < input.from {
        return Err(NavEngineError::InvalidInput {
            field: "to".into(),
            reason: format!("end date {} precedes start date {}", input.to, input.from),
        });
    }

    let years = calendar::year_fraction(input.from, input.to);
    if years.is_zero() {
        warnings.push("Zero-length period; CAGR reported as 0".into());
    }

    let output = CagrOutput {
        years: years.round_dp(4),
        absolute_return_pct: to_percent(absolute_return(input.initial_value, input.final_value)),
        cagr_pct: to_percent(cagr(input.initial_value, input.final_value, years)),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "CAGR: (final / initial)^(365 / days) - 1",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_absolute_return() {
        assert_eq!(absolute_return(dec!(100000), dec!(121000)), dec!(0.21));
        assert_eq!(absolute_return(dec!(100), dec!(80)), dec!(-0.2));
        assert_eq!(absolute_return(Decimal::ZERO, dec!(80)), Decimal::ZERO);
    }

    #[test]
    fn test_cagr_doubling_in_one_year() {
        let r = cagr(dec!(100), dec!(200), Decimal::ONE);
        assert!((r - Decimal::ONE).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_cagr_fractional_years_matches_closed_form() {
        // 1.21x over 1.5 years: 1.21^(2/3) - 1
        let r = cagr(dec!(1000), dec!(1210), dec!(1.5));
        assert!((r - dec!(0.135508)).abs() < dec!(0.000001), "got {r}");
    }

    #[test]
    fn test_cagr_guards() {
        assert_eq!(cagr(dec!(100), dec!(200), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(cagr(dec!(100), dec!(200), dec!(-1)), Decimal::ZERO);
        assert_eq!(cagr(Decimal::ZERO, dec!(200), Decimal::ONE), Decimal::ZERO);
        assert_eq!(cagr(dec!(100), Decimal::ZERO, Decimal::ONE), Decimal::ZERO);
    }

    #[test]
    fn test_xirr_single_year() {
        let flows = vec![
            CashFlow::new(d(2021, 1, 1), dec!(-1000)),
            CashFlow::new(d(2022, 1, 1), dec!(1100)),
        ];
        let outcome = xirr(&flows);
        match outcome {
            XirrOutcome::Converged { rate, iterations } => {
                assert!((rate - dec!(0.10)).abs() < dec!(0.0001), "rate {rate}");
                assert!(iterations < 10);
            }
            other => panic!("expected convergence, got {other:?}"),
        }
    }

    #[test]
    fn test_xirr_unsorted_flows_use_earliest_base() {
        let flows = vec![
            CashFlow::new(d(2022, 1, 1), dec!(1100)),
            CashFlow::new(d(2021, 1, 1), dec!(-1000)),
        ];
        assert!((xirr(&flows).rate_or_zero() - dec!(0.10)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_xirr_too_few_flows_is_zero() {
        let flows = vec![CashFlow::new(d(2021, 1, 1), dec!(-1000))];
        let outcome = xirr(&flows);
        assert_eq!(
            outcome,
            XirrOutcome::DidNotConverge {
                iterations: 0,
                reason: NonConvergence::TooFewCashFlows
            }
        );
        assert_eq!(outcome.rate_or_zero(), Decimal::ZERO);
    }

    #[test]
    fn test_xirr_same_day_flows_have_zero_derivative() {
        let flows = vec![
            CashFlow::new(d(2021, 1, 1), dec!(-1000)),
            CashFlow::new(d(2021, 1, 1), dec!(1100)),
        ];
        let outcome = xirr(&flows);
        assert!(!outcome.is_converged());
        assert_eq!(outcome.rate_or_zero(), Decimal::ZERO);
    }

    #[test]
    fn test_calculate_cagr_envelope() {
        let input = CagrInput {
            initial_value: dec!(100),
            final_value: dec!(121),
            from: d(2021, 1, 1),
            to: d(2023, 1, 1),
        };
        let out = calculate_cagr(&input).unwrap();
        assert_eq!(out.result.years, dec!(2));
        assert_eq!(out.result.absolute_return_pct, dec!(21));
        assert_eq!(out.result.cagr_pct, dec!(10));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_calculate_xirr_reports_totals() {
        let input = XirrInput {
            cash_flows: vec![
                CashFlow::new(d(2021, 1, 1), dec!(-500)),
                CashFlow::new(d(2021, 7, 1), dec!(-500)),
                CashFlow::new(d(2022, 1, 1), dec!(1080)),
            ],
            config: XirrConfig::default(),
        };
        let out = calculate_xirr(&input).unwrap();
        assert_eq!(out.result.total_outflow, dec!(1000));
        assert_eq!(out.result.total_inflow, dec!(1080));
        assert!(out.result.outcome.is_converged());
        assert!(out.result.annualized_return_pct > dec!(8));
    }

    #[test]
    fn test_xirr_respects_iteration_cap() {
        let flows = vec![
            CashFlow::new(d(2021, 1, 1), dec!(-1000)),
            CashFlow::new(d(2023, 1, 1), dec!(1500)),
        ];
        let config = XirrConfig {
            guess: dec!(5),
            max_iterations: 1,
            ..XirrConfig::default()
        };
        assert_eq!(
            xirr_with_config(&flows, &config),
            XirrOutcome::DidNotConverge {
                iterations: 1,
                reason: NonConvergence::IterationLimit
            }
        );
    }
}
