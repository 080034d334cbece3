//! A calendar month, the unit that budgets, allocations and contributions are scoped to.

use std::fmt::Display;

use time::{Date, Duration, Month};

/// A calendar month in a specific year, e.g. October 2025.
///
/// Internally this is the first day of the month so that it can never hold an
/// invalid month/year combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthYear {
    first_day: Date,
}

impl MonthYear {
    /// The month that `date` falls in.
    pub fn from_date(date: Date) -> Self {
        Self {
            first_day: date - Duration::days(i64::from(date.day()) - 1),
        }
    }

    /// The calendar month, 1-12.
    pub fn month_number(&self) -> u8 {
        u8::from(self.first_day.month())
    }

    /// The calendar month.
    pub fn month(&self) -> Month {
        self.first_day.month()
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    /// The month immediately before this one, wrapping January back to the
    /// December of the previous year.
    pub fn previous(&self) -> Self {
        Self::from_date(self.first_day - Duration::days(1))
    }

    /// The month immediately after this one.
    pub fn next(&self) -> Self {
        // The 32nd day after the 1st always lands in the next month.
        Self::from_date(self.first_day + Duration::days(31))
    }

    /// The first day of the month.
    pub fn first_day(&self) -> Date {
        self.first_day
    }

    /// The first day of the following month, i.e. the exclusive end of this month.
    pub fn end_exclusive(&self) -> Date {
        self.next().first_day
    }
}

impl Display for MonthYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.month(), self.year())
    }
}
