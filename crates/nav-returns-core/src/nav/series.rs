use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar;

/// One row of NAV history as received from a feed.
///
/// `nav` may arrive either as a JSON string (`"12.3456"`) or a JSON number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNavEntry {
    pub date: String,
    pub nav: serde_json::Value,
}

impl RawNavEntry {
    pub fn new(date: impl Into<String>, nav: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            nav: serde_json::Value::String(nav.into()),
        }
    }

    /// Parse into a validated point, or `None` if the row fails the data-quality rules.
    fn parse(&self) -> Option<NavPoint> {
        let date = calendar::parse_date(&self.date).ok()?;
        let nav = match &self.nav {
            serde_json::Value::String(s) => parse_decimal(s)?,
            serde_json::Value::Number(n) => parse_decimal(&n.to_string())?,
            _ => return None,
        };
        NavPoint::new(date, nav)
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// A single validated NAV observation. `nav` is always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: Decimal,
}

impl NavPoint {
    pub fn new(date: NaiveDate, nav: Decimal) -> Option<Self> {
        if nav > Decimal::ZERO {
            Some(Self { date, nav })
        } else {
            None
        }
    }
}

/// Chronologically ordered NAV history.
///
/// Built once per computation and never mutated. Rows with unparsable dates or
/// non-positive NAVs are discarded on construction; the count is kept so callers
/// can surface it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NavSeries {
    points: Vec<NavPoint>,
    #[serde(skip)]
    dropped: usize,
}

impl NavSeries {
    /// Normalise raw feed rows. Never fails: bad rows are dropped.
    pub fn from_raw(entries: &[RawNavEntry]) -> Self {
        let mut points: Vec<NavPoint> = entries.iter().filter_map(RawNavEntry::parse).collect();
        let dropped = entries.len() - points.len();
        if dropped > 0 {
            tracing::warn!(dropped, total = entries.len(), "discarded invalid NAV rows");
        }
        // stable: rows sharing a date keep feed order
        points.sort_by_key(|p| p.date);
        Self { points, dropped }
    }

    /// Build from already-typed observations, applying the same positivity filter.
    pub fn from_points(points: impl IntoIterator<Item = (NaiveDate, Decimal)>) -> Self {
        let raw: Vec<(NaiveDate, Decimal)> = points.into_iter().collect();
        let total = raw.len();
        let mut points: Vec<NavPoint> = raw
            .into_iter()
            .filter_map(|(date, nav)| NavPoint::new(date, nav))
            .collect();
        let dropped = total - points.len();
        points.sort_by_key(|p| p.date);
        Self { points, dropped }
    }

    pub fn points(&self) -> &[NavPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Rows discarded while building this series.
    pub fn dropped_entries(&self) -> usize {
        self.dropped
    }

    pub fn first(&self) -> Option<&NavPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&NavPoint> {
        self.points.last()
    }

    /// Observations dated within `[from, to]`, inclusive.
    pub fn between(&self, from: NaiveDate, to: NaiveDate) -> &[NavPoint] {
        let start = self.points.partition_point(|p| p.date < from);
        let end = self.points.partition_point(|p| p.date <= to);
        if start >= end {
            &[]
        } else {
            &self.points[start..end]
        }
    }

    /// A new series holding only observations on or after `inception`.
    pub fn since(&self, inception: NaiveDate) -> NavSeries {
        let start = self.points.partition_point(|p| p.date < inception);
        NavSeries {
            points: self.points[start..].to_vec(),
            dropped: 0,
        }
    }
}
