//! Date lookups against a NAV series.
//!
//! Forward resolution locks in the nearest tradable price on or after a date and
//! falls back to the last observation when the date is past the end of history.
//! Backward resolution answers "what was the price as of this date" and never
//! extrapolates before the first observation.

use chrono::NaiveDate;

use super::series::{NavPoint, NavSeries};

impl NavSeries {
    /// First observation dated on or after `target`; the last observation when
    /// `target` is beyond the series. `None` only for an empty series.
    pub fn find_on_or_after(&self, target: NaiveDate) -> Option<&NavPoint> {
        let points = self.points();
        let idx = points.partition_point(|p| p.date < target);
        points.get(idx).or_else(|| points.last())
    }

    /// Last observation dated on or before `target`; `None` when `target`
    /// precedes the first observation.
    pub fn find_on_or_before(&self, target: NaiveDate) -> Option<&NavPoint> {
        let points = self.points();
        let idx = points.partition_point(|p| p.date <= target);
        if idx == 0 {
            None
        } else {
            points.get(idx - 1)
        }
    }
}
