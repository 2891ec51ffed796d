//! Monthly event calendar shared by the contribution and withdrawal simulators.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::calendar;
use crate::error::NavEngineError;
use crate::types::{Money, Rate};
use crate::NavEngineResult;

/// Which end of the window the calendar covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// `from`, `from + 1m`, … strictly before `to`
    Contribution,
    /// `from + 1m`, `from + 2m`, … on or before `to`
    Withdrawal,
}

/// One dated installment produced by a [`Schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEvent {
    /// Months after `from`
    pub month: u32,
    pub date: NaiveDate,
    /// Completed years since `from` on `date`, which drives the step-up
    pub year: u32,
    pub amount: Money,
}

/// A monthly installment plan with an optional annual step-up.
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub base_amount: Money,
    /// Annual escalation as a rate (0.10 = +10% a year)
    pub step_up: Rate,
    pub cadence: Cadence,
}

impl Schedule {
    pub fn flat(from: NaiveDate, to: NaiveDate, amount: Money, cadence: Cadence) -> Self {
        Self {
            from,
            to,
            base_amount: amount,
            step_up: Decimal::ZERO,
            cadence,
        }
    }

    /// `step_up_percent` is a percentage (10 = +10% a year).
    pub fn stepped(
        from: NaiveDate,
        to: NaiveDate,
        amount: Money,
        step_up_percent: Decimal,
        cadence: Cadence,
    ) -> Self {
        Self {
            from,
            to,
            base_amount: amount,
            step_up: step_up_percent / dec!(100),
            cadence,
        }
    }

    /// Installment size once `year` anniversaries have passed.
    ///
    /// Fails instead of overflowing when a steep step-up runs for many years.
    pub fn amount_for_year(&self, year: u32) -> NavEngineResult<Money> {
        let factor = Decimal::ONE + self.step_up;
        let mut amount = self.base_amount;
        for _ in 0..year {
            amount = amount.checked_mul(factor).ok_or_else(|| {
                NavEngineError::invalid(
                    "step_up_percent",
                    format!("installment overflows after {year} years of step-up"),
                )
            })?;
        }
        Ok(amount)
    }

    /// Every event in the window, in date order.
    ///
    /// Dates are anchored on `from` (`from + k months`) so month-end clamping
    /// never accumulates.
    pub fn events(&self) -> NavEngineResult<Vec<ScheduledEvent>> {
        let mut events = Vec::new();
        let mut month = match self.cadence {
            Cadence::Contribution => 0,
            Cadence::Withdrawal => 1,
        };
        loop {
            let date = calendar::add_months(self.from, month)?;
            let in_window = match self.cadence {
                Cadence::Contribution => date < self.to,
                Cadence::Withdrawal => date <= self.to,
            };
            if !in_window {
                break;
            }
            let year = calendar::anniversaries_elapsed(self.from, date);
            events.push(ScheduledEvent {
                month,
                date,
                year,
                amount: self.amount_for_year(year)?,
            });
            month += 1;
        }
        Ok(events)
    }
}
