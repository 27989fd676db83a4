use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month, OffsetDateTime};

use crate::{Interval, ValidationError};

/// Lookback lengths used to derive the fetch window from an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPolicy {
    /// Days of history requested for intraday intervals.
    pub intraday_lookback_days: u16,
    /// Calendar years of history requested for daily data. The window starts
    /// on 1 January of `end.year - daily_lookback_years`.
    pub daily_lookback_years: u16,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            intraday_lookback_days: 91,
            daily_lookback_years: 10,
        }
    }
}

impl WindowPolicy {
    pub fn window_for(&self, interval: Interval, end: Date) -> Result<DateWindow, ValidationError> {
        let start = if interval.is_intraday() {
            end.checked_sub(Duration::days(i64::from(self.intraday_lookback_days)))
        } else {
            let year = end.year() - i32::from(self.daily_lookback_years);
            Date::from_calendar_date(year, Month::January, 1).ok()
        }
        .ok_or(ValidationError::EmptyWindow)?;

        DateWindow::new(start, end)
    }
}

/// Inclusive start / end dates handed to the fetch step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateWindow {
    start: Date,
    end: Date,
}

impl DateWindow {
    pub fn new(start: Date, end: Date) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::EmptyWindow);
        }
        Ok(Self { start, end })
    }

    pub const fn start(&self) -> Date {
        self.start
    }

    pub const fn end(&self) -> Date {
        self.end
    }

    pub fn start_arg(&self) -> String {
        format_date(self.start)
    }

    pub fn end_arg(&self) -> String {
        format_date(self.end)
    }
}

impl Display for DateWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start_arg(), self.end_arg())
    }
}

pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Renders a date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Result<Date, ValidationError> {
    let invalid = || ValidationError::InvalidDate {
        value: value.to_owned(),
    };

    let mut parts = value.trim().splitn(3, '-');
    let (Some(year), Some(month), Some(day)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };
    if year.len() != 4 || month.len() != 2 || day.len() != 2 {
        return Err(invalid());
    }

    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u8 = month.parse().map_err(|_| invalid())?;
    let day: u8 = day.parse().map_err(|_| invalid())?;
    let month = Month::try_from(month).map_err(|_| invalid())?;

    Date::from_calendar_date(year, month, day).map_err(|_| invalid())
}
