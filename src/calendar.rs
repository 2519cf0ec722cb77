//! Workday arithmetic over weekends and a configured holiday set.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::error::DispatchError;

const ISO_FORMAT: &str = "%Y-%m-%d";

/// Direction in which `adjust_to_workday` shifts a non-workday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkdayCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl WorkdayCalendar {
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn is_workday(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }

    /// Return `date` itself if it is a workday, otherwise the nearest workday
    /// in `direction`.
    pub fn adjust_to_workday(&self, date: NaiveDate, direction: Direction) -> NaiveDate {
        let mut current = date;
        while !self.is_workday(current) {
            let step = match direction {
                Direction::Forward => current.checked_add_days(Days::new(1)),
                Direction::Backward => current.checked_sub_days(Days::new(1)),
            };
            match step {
                Some(next) => current = next,
                None => return date,
            }
        }
        current
    }

    /// Number of workdays in `(from, to]`. Zero when `to <= from`.
    pub fn workdays_between(&self, from: NaiveDate, to: NaiveDate) -> u32 {
        from.iter_days()
            .skip(1)
            .take_while(|day| *day <= to)
            .filter(|day| self.is_workday(*day))
            .count() as u32
    }

    /// First workday strictly after `from`.
    pub fn next_workday(&self, from: NaiveDate) -> NaiveDate {
        match from.checked_add_days(Days::new(1)) {
            Some(next) => self.adjust_to_workday(next, Direction::Forward),
            None => from,
        }
    }
}

pub fn parse_iso_date(value: &str) -> Result<NaiveDate, DispatchError> {
    NaiveDate::parse_from_str(value.trim(), ISO_FORMAT)
        .map_err(|_| DispatchError::InvalidDate(value.to_string()))
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

/// Default planning date for callers: the next workday after `from`.
pub fn next_workday_iso(from: &str, holidays: &BTreeSet<NaiveDate>) -> Result<String, DispatchError> {
    let from = parse_iso_date(from)?;
    let calendar = WorkdayCalendar::new(holidays.iter().copied());
    Ok(format_iso_date(calendar.next_workday(from)))
}
