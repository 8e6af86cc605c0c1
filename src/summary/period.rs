//! A calendar month used to bucket expenses.

use std::fmt::Display;

use time::{Date, Month};

use crate::Error;

/// A (month, year) pair.
///
/// Construct with [Period::new] so that the month is always in `1..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    month: Month,
    year: i32,
}

impl Period {
    /// Create a period from a month number and a year.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidPeriod] if `month` is not in `1..=12` or the
    /// year is outside of the range supported by [time::Date].
    pub fn new(month: u8, year: i32) -> Result<Self, Error> {
        let invalid_period = || Error::InvalidPeriod { month, year };
        let month = Month::try_from(month).map_err(|_| invalid_period())?;

        // Make sure every day of the month can be represented as a date.
        Date::from_calendar_date(year, month, 1).map_err(|_| invalid_period())?;

        Ok(Self { month, year })
    }

    /// The period that `date` falls in.
    pub fn containing(date: Date) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
        }
    }

    /// The month number, January is 1.
    pub fn month(&self) -> u8 {
        self.month as u8
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The English name of the month, e.g. "March".
    pub fn month_name(&self) -> String {
        self.month.to_string()
    }

    /// The month before this one, rolling back into December of the previous year.
    pub fn previous(&self) -> Self {
        let year = if self.month == Month::January {
            self.year - 1
        } else {
            self.year
        };

        Self {
            month: self.month.previous(),
            year,
        }
    }

    /// The first and last day of the month.
    pub fn date_range(&self) -> (Date, Date) {
        let days = self.month.length(self.year);

        // `new` and `containing` guarantee the year and month are valid.
        let first = Date::from_calendar_date(self.year, self.month, 1).unwrap_or(Date::MIN);
        let last = Date::from_calendar_date(self.year, self.month, days).unwrap_or(Date::MAX);

        (first, last)
    }

    /// Whether `date` is a day in this month.
    pub fn contains(&self, date: Date) -> bool {
        date.month() == self.month && date.year() == self.year
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}
