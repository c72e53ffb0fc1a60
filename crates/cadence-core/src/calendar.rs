//! Zone-less calendar arithmetic.
//!
//! Every value here is a plain calendar date: there is no time-of-day and no
//! offset, so "local midnight" is implicit. Month and year steps roll day
//! overflow forward into the following month (Jan 31 + 1 month = Mar 2 in a
//! leap year) instead of clamping to the last day of the month.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::RecurrenceUnit;

/// Storage and display format for calendar dates.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Returns the first day of the week containing `date`.
pub fn start_of_week(date: NaiveDate, week_starts_monday: bool) -> NaiveDate {
    let offset = if week_starts_monday {
        date.weekday().num_days_from_monday()
    } else {
        date.weekday().num_days_from_sunday()
    };
    add_days(date, -i64::from(offset))
}

/// Returns the first day of the month containing `date`.
pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    add_days(date, -i64::from(date.day0()))
}

/// Adds `n` days (negative moves backwards), saturating at the calendar range.
pub fn add_days(date: NaiveDate, n: i64) -> NaiveDate {
    let shifted = if n >= 0 {
        date.checked_add_days(Days::new(n.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(n.unsigned_abs()))
    };
    shifted.unwrap_or(if n < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// Advances `date` by one recurrence step of `every` units.
///
/// Returns `None` when the result falls outside the representable calendar.
pub fn add_interval(date: NaiveDate, every: u32, unit: RecurrenceUnit) -> Option<NaiveDate> {
    match unit {
        RecurrenceUnit::Day => date.checked_add_days(Days::new(u64::from(every))),
        RecurrenceUnit::Week => date.checked_add_days(Days::new(u64::from(every) * 7)),
        RecurrenceUnit::Month => shift_months(date, i64::from(every)),
        RecurrenceUnit::Year => shift_months(date, i64::from(every) * 12),
    }
}

/// Moves `date` by a signed number of months, keeping the day-of-month and
/// letting any overflow spill into the next month.
pub(crate) fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let total = i64::from(date.year()) * 12 + i64::from(date.month0()) + months;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    first.checked_add_days(Days::new(u64::from(date.day0())))
}

/// The 42 days (six weeks) of a month calendar page for `anchor`'s month,
/// starting on the first day of the week that contains the 1st.
pub fn month_grid(anchor: NaiveDate, week_starts_monday: bool) -> Vec<NaiveDate> {
    let first = start_of_week(start_of_month(anchor), week_starts_monday);
    (0..42).map(|offset| add_days(first, offset)).collect()
}

pub fn to_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

pub fn parse_iso_date(s: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(s.trim(), ISO_DATE_FORMAT)
        .map_err(|e| CoreError::InvalidDate(format!("'{}' is not a YYYY-MM-DD date: {}", s, e)))
}

/// A closed range of calendar dates. Either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DateWindow {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidInput(format!(
                "window start {} is after window end {}",
                to_iso_date(start),
                to_iso_date(end)
            )));
        }
        Ok(Self {
            start: Some(start),
            end: Some(end),
        })
    }

    /// The window used by board/list views: no date bound at all.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Open-ended window beginning at `start`.
    pub fn starting(start: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// The seven days of the week containing `date`.
    pub fn week_of(date: NaiveDate, week_starts_monday: bool) -> Self {
        let start = start_of_week(date, week_starts_monday);
        Self {
            start: Some(start),
            end: Some(add_days(start, 6)),
        }
    }

    pub fn month_of(date: NaiveDate) -> Self {
        let start = start_of_month(date);
        let end = shift_months(start, 1)
            .map(|next| add_days(next, -1))
            .unwrap_or(NaiveDate::MAX);
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    pub fn is_bounded(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    /// Every date of a bounded window, ascending. `None` when either side is open.
    pub fn days(&self) -> Option<Vec<NaiveDate>> {
        let (start, end) = (self.start?, self.end?);
        Some(start.iter_days().take_while(|d| *d <= end).collect())
    }
}
