use chrono::NaiveDate;
use nav_returns_core::calendar;
use nav_returns_core::nav::NavSeries;
use nav_returns_core::rolling::{self, RollingReturnInput};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Rolling return analyzer
// ===========================================================================

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn weekly_series(start: NaiveDate, weeks: i64, growth: Decimal) -> NavSeries {
    let mut nav = dec!(100);
    let mut points = Vec::new();
    for w in 0..weeks {
        points.push((start + chrono::Duration::weeks(w), nav));
        nav *= Decimal::ONE + growth;
    }
    NavSeries::from_points(points)
}

#[test]
fn test_constant_growth_has_near_zero_dispersion() {
    let series = weekly_series(d(2015, 1, 5), 52 * 6, dec!(0.002));
    let r = rolling::rolling_returns(&series, 3, None).unwrap().result;
    assert!(r.sample_count > 100);
    assert!(r.standard_deviation < dec!(0.5), "std {}", r.standard_deviation);
    // 0.2% a week is ~10.9% a year
    assert!((r.average - dec!(10.9)).abs() < dec!(0.5), "avg {}", r.average);
}

#[test]
fn test_last_window_start_respects_bound() {
    let series = weekly_series(d(2015, 1, 5), 52 * 4, dec!(0.001));
    let last = series.last().unwrap().date;
    let r = rolling::rolling_returns(&series, 2, None).unwrap().result;
    let bound = calendar::sub_years(last, 2).unwrap();
    assert!(r.points.iter().all(|p| p.window_start_date <= bound));
}

#[test]
fn test_run_from_raw_input() {
    let input: RollingReturnInput = serde_json::from_str(
        r#"{
            "navHistory": [
                {"date": "01-01-2019", "nav": "8"},
                {"date": "01-01-2020", "nav": "10"},
                {"date": "01-01-2021", "nav": "11"},
                {"date": "01-01-2022", "nav": "12.1"},
                {"date": "oops", "nav": "12.1"}
            ],
            "windowYears": 1,
            "inceptionDate": "2020-01-01"
        }"#,
    )
    .unwrap();
    let out = rolling::run_rolling_returns(&input).unwrap();
    assert_eq!(out.result.sample_count, 2);
    assert_eq!(out.result.points[0].window_start_date, d(2020, 1, 1));
    assert_eq!(out.warnings.len(), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_min_avg_max_ordering(
        navs in prop::collection::vec(1u32..10_000, 60..200),
        window in 1u32..3,
    ) {
        // monthly observations with arbitrary prices
        let points: Vec<(NaiveDate, Decimal)> = navs
            .iter()
            .enumerate()
            .map(|(i, nav)| {
                (
                    calendar::add_months(d(2005, 1, 1), i as u32).unwrap(),
                    Decimal::new(*nav as i64, 2),
                )
            })
            .collect();
        let series = NavSeries::from_points(points);
        let r = rolling::rolling_returns(&series, window, None).unwrap().result;
        prop_assert!(r.sample_count > 0);
        prop_assert!(r.min <= r.average && r.average <= r.max);
        prop_assert!(r.standard_deviation >= Decimal::ZERO);
        for p in &r.points {
            let span = (p.window_end_date - p.window_start_date).num_days();
            // one monthly sampling interval of slack
            prop_assert!(span <= 366 * window as i64 + 31);
            prop_assert!(span > 0);
        }
    }
}
