use crate::error::{PaceError, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeSet;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Exact calendar dates that are never worked (bank holidays, leave).
pub type DateSet = BTreeSet<NaiveDate>;

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|source| {
        PaceError::InvalidDate {
            value: value.to_string(),
            source,
        }
    })
}

/// Parse a collection of ISO dates, failing on the first malformed entry.
pub fn parse_dates<I, S>(values: I) -> Result<DateSet>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| parse_date(v.as_ref()))
        .collect()
}

/// Anything the calendar accepts as a date bound: a `NaiveDate` or an ISO
/// `YYYY-MM-DD` string.
pub trait IntoDate {
    fn into_date(self) -> Result<NaiveDate>;
}

impl IntoDate for NaiveDate {
    fn into_date(self) -> Result<NaiveDate> {
        Ok(self)
    }
}

impl IntoDate for &NaiveDate {
    fn into_date(self) -> Result<NaiveDate> {
        Ok(*self)
    }
}

impl IntoDate for &str {
    fn into_date(self) -> Result<NaiveDate> {
        parse_date(self)
    }
}

impl IntoDate for &String {
    fn into_date(self) -> Result<NaiveDate> {
        parse_date(self)
    }
}

impl IntoDate for String {
    fn into_date(self) -> Result<NaiveDate> {
        parse_date(&self)
    }
}

// ---------------------------------------------------------------------------
// Working days
// ---------------------------------------------------------------------------

/// Monday to Friday and not a holiday.
pub fn is_working_day(date: NaiveDate, holidays: &DateSet) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !holidays.contains(&date)
}

/// Working days in the inclusive range `start..=end`, ascending.
///
/// An inverted range (`end < start`) yields no days.
pub fn working_days_between(
    start: impl IntoDate,
    end: impl IntoDate,
    holidays: &DateSet,
) -> Result<Vec<NaiveDate>> {
    let start = start.into_date()?;
    let end = end.into_date()?;
    Ok(working_days_in(start, end, holidays))
}

fn working_days_in(start: NaiveDate, end: NaiveDate, holidays: &DateSet) -> Vec<NaiveDate> {
    if end < start {
        return Vec::new();
    }
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_working_day(*d, holidays))
        .collect()
}

// ---------------------------------------------------------------------------
// CalendarConstraint
// ---------------------------------------------------------------------------

/// Start date, deadline and holidays for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarConstraint {
    pub start: NaiveDate,
    pub deadline: NaiveDate,
    pub holidays: DateSet,
}

impl CalendarConstraint {
    pub fn new(start: NaiveDate, deadline: NaiveDate, holidays: DateSet) -> Self {
        Self {
            start,
            deadline,
            holidays,
        }
    }

    /// Build from ISO strings as they appear in the project config.
    pub fn parse<S: AsRef<str>>(start: &str, deadline: &str, holidays: &[S]) -> Result<Self> {
        Ok(Self::new(
            parse_date(start)?,
            parse_date(deadline)?,
            parse_dates(holidays)?,
        ))
    }

    pub fn working_days(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        working_days_in(from, to, &self.holidays)
    }

    /// Every working day from start through deadline.
    pub fn project_days(&self) -> Vec<NaiveDate> {
        self.working_days(self.start, self.deadline)
    }

    /// Working days from start through `today`, inclusive.
    pub fn elapsed_days(&self, today: NaiveDate) -> Vec<NaiveDate> {
        self.working_days(self.start, today)
    }

    /// Working days from `today` through the deadline, inclusive.
    ///
    /// A working `today` is counted here and in [`Self::elapsed_days`].
    pub fn remaining_days(&self, today: NaiveDate) -> Vec<NaiveDate> {
        self.working_days(today, self.deadline)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
