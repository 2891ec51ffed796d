//! Rolling-window CAGR distribution over a NAV history.

use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::error::NavEngineError;
use crate::metrics;
use crate::nav::{NavSeries, RawNavEntry};
use crate::types::*;
use crate::NavEngineResult;

/// Request for [`run_rolling_returns`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingReturnInput {
    #[serde(default)]
    pub nav_history: Vec<RawNavEntry>,
    /// Window length in whole years
    pub window_years: u32,
    /// Observations before this date are ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inception_date: Option<NaiveDate>,
}

/// Annualised return of one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingReturnPoint {
    pub window_start_date: NaiveDate,
    pub window_end_date: NaiveDate,
    pub annualized_return_pct: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingReturnResult {
    pub window_years: u32,
    pub sample_count: usize,
    pub points: Vec<RollingReturnPoint>,
    pub average: Percent,
    pub min: Percent,
    pub max: Percent,
    /// Population standard deviation
    pub standard_deviation: Percent,
}

/// Normalise raw history and compute rolling returns.
pub fn run_rolling_returns(
    input: &RollingReturnInput,
) -> NavEngineResult<ComputationOutput<RollingReturnResult>> {
    let series = NavSeries::from_raw(&input.nav_history);
    let mut output = rolling_returns(&series, input.window_years, input.inception_date)?;
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

/// One CAGR sample per observation that can open a full window.
///
/// The window end is the first NAV on or after `start + window_years`; each
/// sample is annualised over the actual elapsed time between the two NAVs.
/// No eligible window yields an empty, all-zero result rather than an error.
#[tracing::instrument(level = "debug", skip(series), fields(observations = series.len()))]
pub fn rolling_returns(
    series: &NavSeries,
    window_years: u32,
    inception_date: Option<NaiveDate>,
) -> NavEngineResult<ComputationOutput<RollingReturnResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if window_years == 0 {
        return Err(NavEngineError::invalid("window_years", "must be >= 1"));
    }

    let series = match inception_date {
        Some(inception) => series.since(inception),
        None => series.clone(),
    };

    let mut samples: Vec<(NaiveDate, NaiveDate, Rate)> = Vec::new();
    // a window longer than the calendar can represent has no eligible start
    let last_start = series
        .last()
        .and_then(|last| calendar::sub_years(last.date, window_years).ok());
    if let Some(last_start) = last_start {
        for point in series.points() {
            if point.date > last_start {
                break;
            }
            let target = calendar::add_years(point.date, window_years)?;
            let end = match series.find_on_or_after(target) {
                Some(end) => end,
                None => continue,
            };
            let elapsed = calendar::year_fraction(point.date, end.date);
            if elapsed <= Decimal::ZERO {
                continue;
            }
            samples.push((
                point.date,
                end.date,
                metrics::cagr(point.nav, end.nav, elapsed),
            ));
        }
    }

    if samples.is_empty() {
        tracing::debug!(window_years, "no eligible rolling windows");
        warnings.push(format!(
            "NAV history is shorter than the {window_years}-year window; no samples"
        ));
    }

    let rates: Vec<Rate> = samples.iter().map(|(_, _, r)| *r).collect();
    let stats = Summary::of(&rates);

    let result = RollingReturnResult {
        window_years,
        sample_count: samples.len(),
        points: samples
            .into_iter()
            .map(|(s, e, r)| RollingReturnPoint {
                window_start_date: s,
                window_end_date: e,
                annualized_return_pct: to_percent(r),
            })
            .collect(),
        average: to_percent(stats.mean),
        min: to_percent(stats.min),
        max: to_percent(stats.max),
        standard_deviation: to_percent(stats.std_dev),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rolling returns: CAGR from each eligible start NAV to the first NAV on/after start + window",
        &serde_json::json!({
            "window_years": window_years,
            "inception_date": inception_date,
            "observations": series.len(),
        }),
        warnings,
        elapsed,
        result,
    ))
}

/// Descriptive statistics over a sample of rates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Summary {
    mean: Rate,
    min: Rate,
    max: Rate,
    std_dev: Rate,
}

impl Summary {
    fn of(data: &[Rate]) -> Self {
        if data.is_empty() {
            return Summary::default();
        }
        let n = Decimal::from(data.len() as i64);
        let mean = data.iter().sum::<Decimal>() / n;
        let min = data.iter().copied().min().unwrap_or(Decimal::ZERO);
        let max = data.iter().copied().max().unwrap_or(Decimal::ZERO);
        let variance = data.iter().map(|x| (x - mean) * (x - mean)).sum::<Decimal>() / n;
        Summary {
            mean,
            min,
            max,
            std_dev: sqrt_decimal(variance),
        }
    }
}

fn sqrt_decimal(val: Decimal) -> Decimal {
    if val <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    val.sqrt().unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_summary_population_std_dev() {
        let s = Summary::of(&[dec!(0.02), dec!(0.04), dec!(0.04), dec!(0.04), dec!(0.05), dec!(0.05), dec!(0.07), dec!(0.09)]);
        assert_eq!(s.mean, dec!(0.05));
        assert_eq!(s.min, dec!(0.02));
        assert_eq!(s.max, dec!(0.09));
        assert!((s.std_dev - dec!(0.02)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_summary_empty_is_zero() {
        assert_eq!(Summary::of(&[]), Summary::default());
    }

    #[test]
    fn test_one_year_windows_on_annual_series() {
        let series = NavSeries::from_points(vec![
            (d(2020, 1, 1), dec!(10.00)),
            (d(2021, 1, 1), dec!(11.00)),
            (d(2022, 1, 1), dec!(12.10)),
        ]);
        let r = rolling_returns(&series, 1, None).unwrap().result;
        assert_eq!(r.sample_count, 2);
        assert_eq!(r.points[0].window_end_date, d(2021, 1, 1));
        // 2020 is a leap year: 366 days
        assert!((r.points[0].annualized_return_pct - dec!(9.97)).abs() < dec!(0.02));
        assert_eq!(r.points[1].annualized_return_pct, dec!(10));
        assert!(r.min <= r.average && r.average <= r.max);
    }

    #[test]
    fn test_short_history_gives_empty_result() {
        let series = NavSeries::from_points(vec![
            (d(2021, 1, 1), dec!(10)),
            (d(2021, 6, 1), dec!(11)),
        ]);
        let out = rolling_returns(&series, 3, None).unwrap();
        assert!(out.result.points.is_empty());
        assert_eq!(out.result.average, Decimal::ZERO);
        assert_eq!(out.result.standard_deviation, Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_inception_excludes_earlier_points() {
        let series = NavSeries::from_points(vec![
            (d(2019, 1, 1), dec!(5)),
            (d(2020, 1, 1), dec!(10)),
            (d(2021, 1, 1), dec!(11)),
        ]);
        let r = rolling_returns(&series, 1, Some(d(2020, 1, 1))).unwrap().result;
        assert_eq!(r.sample_count, 1);
        assert_eq!(r.points[0].window_start_date, d(2020, 1, 1));
    }

    #[test]
    fn test_window_beyond_calendar_gives_empty_result() {
        let series = NavSeries::from_points(vec![
            (d(2019, 4, 9), dec!(10)),
            (d(2020, 4, 9), dec!(11)),
        ]);
        let out = rolling_returns(&series, 1_000_000, None).unwrap();
        assert_eq!(out.result.sample_count, 0);
        assert!(out.result.points.is_empty());
        assert_eq!(out.result.average, Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(rolling_returns(&NavSeries::default(), 0, None).is_err());
    }
}
