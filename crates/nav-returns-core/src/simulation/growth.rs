//! Valuation curves for charting simulator output.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Transaction, TransactionKind};
use crate::nav::NavSeries;
use crate::types::{Money, Units};

/// One point on a growth curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthPoint {
    pub date: NaiveDate,
    pub value: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cumulative_investment: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cumulative_withdrawal: Option<Money>,
}

/// Value a fixed unit balance at every observation in `[from, to]`, closing
/// with an explicit point at `to` when the last observation falls short of it.
pub fn holding_curve(
    series: &NavSeries,
    from: NaiveDate,
    to: NaiveDate,
    units: Units,
    invested: Money,
    closing_value: Money,
) -> Vec<GrowthPoint> {
    let mut curve: Vec<GrowthPoint> = series
        .between(from, to)
        .iter()
        .map(|p| GrowthPoint {
            date: p.date,
            value: units * p.nav,
            cumulative_investment: Some(invested),
            cumulative_withdrawal: None,
        })
        .collect();

    if curve.last().map(|p| p.date) != Some(to) {
        curve.push(GrowthPoint {
            date: to,
            value: closing_value,
            cumulative_investment: Some(invested),
            cumulative_withdrawal: None,
        });
    }
    curve
}

/// Replay executed purchases against every observation in `[from, to]`.
///
/// A purchase counts from its NAV date onwards, so the value and the cumulative
/// investment on each point reflect exactly the units bought by then. The curve
/// closes at `to` with the full investment, including purchases priced at a NAV
/// dated after `to`.
pub fn contribution_curve(
    series: &NavSeries,
    from: NaiveDate,
    to: NaiveDate,
    transactions: &[Transaction],
    closing_value: Money,
) -> Vec<GrowthPoint> {
    let mut purchases: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Purchase)
        .collect();
    purchases.sort_by_key(|t| t.nav_date);

    let mut next = 0;
    let mut units = Decimal::ZERO;
    let mut invested = Decimal::ZERO;
    let mut curve = Vec::new();

    for point in series.between(from, to) {
        while next < purchases.len() && purchases[next].nav_date <= point.date {
            units += purchases[next].units;
            invested += purchases[next].amount;
            next += 1;
        }
        if invested.is_zero() {
            continue;
        }
        curve.push(GrowthPoint {
            date: point.date,
            value: units * point.nav,
            cumulative_investment: Some(invested),
            cumulative_withdrawal: None,
        });
    }

    let total: Money = purchases.iter().map(|t| t.amount).sum();
    if !total.is_zero() && curve.last().map(|p| p.date) != Some(to) {
        curve.push(GrowthPoint {
            date: to,
            value: closing_value,
            cumulative_investment: Some(total),
            cumulative_withdrawal: None,
        });
    }
    curve
}

/// Record the remaining corpus after a withdrawal event.
pub fn withdrawal_point(date: NaiveDate, remaining: Money, withdrawn_so_far: Money) -> GrowthPoint {
    GrowthPoint {
        date,
        value: remaining,
        cumulative_investment: None,
        cumulative_withdrawal: Some(withdrawn_so_far),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn series() -> NavSeries {
        NavSeries::from_points(vec![
            (d(2020, 1, 1), dec!(10)),
            (d(2020, 2, 1), dec!(20)),
            (d(2020, 3, 1), dec!(40)),
        ])
    }

    #[test]
    fn test_holding_curve_appends_closing_point() {
        let curve = holding_curve(&series(), d(2020, 1, 1), d(2020, 3, 15), dec!(2), dec!(20), dec!(80));
        assert_eq!(curve.len(), 4);
        assert_eq!(curve[1].value, dec!(40));
        assert_eq!(curve[3].date, d(2020, 3, 15));
        assert_eq!(curve[3].value, dec!(80));
    }

    #[test]
    fn test_holding_curve_no_duplicate_when_closing_on_observation() {
        let curve = holding_curve(&series(), d(2020, 1, 1), d(2020, 3, 1), dec!(2), dec!(20), dec!(80));
        assert_eq!(curve.len(), 3);
    }

    #[test]
    fn test_contribution_curve_accumulates_units() {
        let txs = vec![
            Transaction::purchase(d(2020, 1, 1), d(2020, 1, 1), dec!(10), dec!(100)),
            Transaction::purchase(d(2020, 2, 1), d(2020, 2, 1), dec!(20), dec!(100)),
        ];
        let curve = contribution_curve(&series(), d(2020, 1, 1), d(2020, 3, 1), &txs, dec!(600));
        assert_eq!(curve.len(), 3);
        assert_eq!(curve[0].value, dec!(100));
        assert_eq!(curve[1].value, dec!(300)); // 15 units * 20
        assert_eq!(curve[2].value, dec!(600));
        assert_eq!(curve[2].cumulative_investment, Some(dec!(200)));
    }

    #[test]
    fn test_contribution_curve_closes_on_end_date() {
        let txs = vec![
            Transaction::purchase(d(2020, 1, 1), d(2020, 1, 1), dec!(10), dec!(100)),
            Transaction::purchase(d(2020, 2, 1), d(2020, 3, 1), dec!(40), dec!(100)),
        ];
        let curve = contribution_curve(&series(), d(2020, 1, 1), d(2020, 2, 15), &txs, dec!(450));
        assert_eq!(curve.len(), 3);
        assert_eq!(curve[1].cumulative_investment, Some(dec!(100)));
        assert_eq!(curve[2].date, d(2020, 2, 15));
        assert_eq!(curve[2].value, dec!(450));
        assert_eq!(curve[2].cumulative_investment, Some(dec!(200)));
    }
}
