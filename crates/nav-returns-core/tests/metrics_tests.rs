use chrono::NaiveDate;
use nav_returns_core::metrics::{self, NonConvergence, XirrConfig, XirrOutcome};
use nav_returns_core::types::CashFlow;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Absolute return, CAGR and XIRR
// ===========================================================================

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn test_cagr_between_dates_uses_actual_365() {
    // 1.21x over 731 days is just under 10% a year
    let r = metrics::cagr_between(d(2020, 1, 1), dec!(100000), d(2022, 1, 1), dec!(121000));
    assert!(r < dec!(0.1) && r > dec!(0.0995), "got {}", r);
}

#[test]
fn test_cagr_loss() {
    let r = metrics::cagr(dec!(100), dec!(81), dec!(2));
    assert!((r - dec!(-0.1)).abs() < dec!(0.000001), "got {}", r);
}

#[test]
fn test_xirr_day_365_ten_percent() {
    let flows = vec![
        CashFlow::new(d(2023, 1, 1), dec!(-1000)),
        CashFlow::new(d(2024, 1, 1), dec!(1100)),
    ];
    // 2023 is not a leap year: exactly 365 days
    let outcome = metrics::xirr(&flows);
    assert!(outcome.is_converged());
    assert!((outcome.rate_or_zero() - dec!(0.10)).abs() < dec!(0.000001));
}

#[test]
fn test_xirr_monthly_contributions() {
    let mut flows: Vec<CashFlow> = (1..=12)
        .map(|m| CashFlow::new(d(2021, m, 1), dec!(-1000)))
        .collect();
    flows.push(CashFlow::new(d(2022, 1, 1), dec!(12800)));
    let outcome = metrics::xirr(&flows);
    match outcome {
        XirrOutcome::Converged { rate, iterations } => {
            assert!(rate > dec!(0.10) && rate < dec!(0.15), "got {}", rate);
            assert!(iterations <= 100);
        }
        other => panic!("expected convergence, got {:?}", other),
    }
}

#[test]
fn test_xirr_all_outflows_does_not_converge() {
    let flows = vec![
        CashFlow::new(d(2021, 1, 1), dec!(-1000)),
        CashFlow::new(d(2022, 1, 1), dec!(-1000)),
    ];
    let outcome = metrics::xirr(&flows);
    assert!(!outcome.is_converged());
    assert_eq!(outcome.rate_or_zero(), Decimal::ZERO);
}

#[test]
fn test_xirr_empty_input() {
    assert_eq!(
        metrics::xirr(&[]),
        XirrOutcome::DidNotConverge {
            iterations: 0,
            reason: NonConvergence::TooFewCashFlows
        }
    );
}

#[test]
fn test_xirr_config_deserializes_with_defaults() {
    let config: XirrConfig = serde_json::from_str(r#"{"maxIterations": 20}"#).unwrap();
    assert_eq!(config.max_iterations, 20);
    assert_eq!(config.guess, XirrConfig::default().guess);
    assert_eq!(config.tolerance, XirrConfig::default().tolerance);
}

#[test]
fn test_calculate_xirr_rejects_empty_flows() {
    let input = metrics::XirrInput {
        cash_flows: Vec::new(),
        config: XirrConfig::default(),
    };
    let err = metrics::calculate_xirr(&input).unwrap_err();
    assert!(matches!(err, nav_returns_core::NavEngineError::InsufficientData(_)));
}
