//! Calendar arithmetic used by the resolver, simulators and rolling analyzer.
//!
//! Every function takes and returns plain `NaiveDate` values. Month and year
//! additions clamp to the last valid day of the target month (31 Jan + 1 month
//! = 28/29 Feb).

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::NavEngineError;
use crate::types::Years;
use crate::NavEngineResult;

/// Day-count basis for year fractions (actual/365 fixed).
pub const DAYS_PER_YEAR: Decimal = dec!(365);

/// Day-month-year format used by NAV feeds.
pub const NAV_DATE_FORMAT: &str = "%d-%m-%Y";

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a NAV feed date. `DD-MM-YYYY` first, ISO `YYYY-MM-DD` as a fallback.
pub fn parse_date(raw: &str) -> NavEngineResult<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, NAV_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, ISO_DATE_FORMAT))
        .map_err(|_| NavEngineError::DateError(format!("unrecognised date '{trimmed}'")))
}

/// `date + n` calendar months, clamped to month end.
pub fn add_months(date: NaiveDate, n: u32) -> NavEngineResult<NaiveDate> {
    date.checked_add_months(Months::new(n))
        .ok_or_else(|| NavEngineError::DateError(format!("{date} + {n} months overflows")))
}

/// `date + n` calendar years.
pub fn add_years(date: NaiveDate, n: u32) -> NavEngineResult<NaiveDate> {
    let months = n
        .checked_mul(12)
        .ok_or_else(|| NavEngineError::DateError(format!("{n} years overflows")))?;
    add_months(date, months)
}

/// `date - n` calendar years.
pub fn sub_years(date: NaiveDate, n: u32) -> NavEngineResult<NaiveDate> {
    let months = n
        .checked_mul(12)
        .ok_or_else(|| NavEngineError::DateError(format!("{n} years overflows")))?;
    date.checked_sub_months(Months::new(months))
        .ok_or_else(|| NavEngineError::DateError(format!("{date} - {n} years underflows")))
}

/// Signed actual day count from `start` to `end`.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Actual/365 year fraction from `start` to `end`. Negative when `end < start`.
pub fn year_fraction(start: NaiveDate, end: NaiveDate) -> Years {
    Decimal::from(days_between(start, end)) / DAYS_PER_YEAR
}

/// Number of whole anniversaries of `anchor` that have passed on `date`.
///
/// The anniversary day itself counts as passed.
pub fn anniversaries_elapsed(anchor: NaiveDate, date: NaiveDate) -> u32 {
    if date <= anchor {
        return 0;
    }
    let mut years = 0u32;
    while let Ok(next) = add_years(anchor, years + 1) {
        if next > date {
            break;
        }
        years += 1;
    }
    years
}
