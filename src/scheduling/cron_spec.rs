//! Six-field cron specifications and next-occurrence calculation
//!
//! The calculator jumps between candidate instants one calendar unit at a
//! time (month, day, hour, minute, second) instead of scanning second by
//! second, so sparse schedules such as a yearly job resolve in a handful of
//! iterations rather than millions.

use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Duration, Months, TimeZone, Timelike, Utc};

use super::field::CronFieldExpression;
use crate::errors::{CronResult, CronSyntaxError};

/// How far past the reference the calculator searches before giving up.
///
/// Any satisfiable spec repeats within a year; the slack covers leap-day
/// schedules. Specs naming a date that never exists (February 30th) resolve
/// to `None` instead of looping forever.
const SEARCH_HORIZON_DAYS: i64 = 4 * 366;

/// Month names in field position order, mapped to the zero-based numbering
/// the matcher is given (`month0`).
const MONTH_NAMES: [(&str, &str); 12] = [
    ("JAN", "0"),
    ("FEB", "1"),
    ("MAR", "2"),
    ("APR", "3"),
    ("MAY", "4"),
    ("JUN", "5"),
    ("JUL", "6"),
    ("AUG", "7"),
    ("SEP", "8"),
    ("OCT", "9"),
    ("NOV", "10"),
    ("DEC", "11"),
];

const WEEKDAY_NAMES: [(&str, &str); 7] = [
    ("SUN", "0"),
    ("MON", "1"),
    ("TUE", "2"),
    ("WED", "3"),
    ("THU", "4"),
    ("FRI", "5"),
    ("SAT", "6"),
];

/// A parsed six-field cron specification: second, minute, hour,
/// day-of-month, month, weekday
///
/// Immutable once constructed, either from a full expression string or
/// field by field through [`CronSpecBuilder`]. Months are matched
/// zero-based (0 = January), day-of-month 1-31, weekdays 0-6 with
/// Sunday = 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSpec {
    second: CronFieldExpression,
    minute: CronFieldExpression,
    hour: CronFieldExpression,
    day_of_month: CronFieldExpression,
    month: CronFieldExpression,
    weekday: CronFieldExpression,
}

impl FromStr for CronSpec {
    type Err = CronSyntaxError;

    /// Parse a six-field expression such as `"*/15 * * * * *"`.
    ///
    /// Month and weekday fields accept case-insensitive 3-letter names
    /// (`JAN`-`DEC`, `SUN`-`SAT`), substituted before field parsing.
    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(CronSyntaxError::FieldCount {
                found: fields.len(),
            });
        }
        Ok(Self {
            second: CronFieldExpression::parse(fields[0])?,
            minute: CronFieldExpression::parse(fields[1])?,
            hour: CronFieldExpression::parse(fields[2])?,
            day_of_month: CronFieldExpression::parse(fields[3])?,
            month: CronFieldExpression::parse(&substitute_names(fields[4], &MONTH_NAMES))?,
            weekday: CronFieldExpression::parse(&substitute_names(fields[5], &WEEKDAY_NAMES))?,
        })
    }
}

impl CronSpec {
    /// Start building a spec field by field. Unset fields default to `*`.
    pub fn builder() -> CronSpecBuilder {
        CronSpecBuilder::default()
    }

    /// The earliest instant strictly after `reference` (at whole-second
    /// resolution) that satisfies every field, or `None` when no such
    /// instant exists within the search horizon.
    ///
    /// The candidate starts at the reference truncated to whole seconds
    /// plus one second, then advances coarse-to-fine: a failing month jumps
    /// to the first instant of the next month, a failing day-of-month or
    /// weekday to the next midnight, and so on. Every jump zeroes all finer
    /// components, so each step strictly increases the candidate. Both the
    /// day-of-month and the weekday constraint must hold for a day to
    /// qualify.
    pub fn next_run_time(&self, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut candidate = reference.with_nanosecond(0)? + Duration::seconds(1);
        let horizon = candidate + Duration::days(SEARCH_HORIZON_DAYS);

        while candidate <= horizon {
            if !self.month.matches(candidate.month0()) {
                candidate = start_of_next_month(candidate)?;
            } else if !self.day_of_month.matches(candidate.day())
                || !self.weekday.matches(candidate.weekday().num_days_from_sunday())
            {
                candidate = start_of_next_day(candidate)?;
            } else if !self.hour.matches(candidate.hour()) {
                candidate = start_of_next_hour(candidate)?;
            } else if !self.minute.matches(candidate.minute()) {
                candidate = start_of_next_minute(candidate)?;
            } else if !self.second.matches(candidate.second()) {
                candidate = candidate + Duration::seconds(1);
            } else {
                return Some(candidate);
            }
        }

        None
    }
}

/// Field-by-field [`CronSpec`] construction, validating each field as it is
/// set
#[derive(Debug, Clone, Default)]
pub struct CronSpecBuilder {
    second: Option<CronFieldExpression>,
    minute: Option<CronFieldExpression>,
    hour: Option<CronFieldExpression>,
    day_of_month: Option<CronFieldExpression>,
    month: Option<CronFieldExpression>,
    weekday: Option<CronFieldExpression>,
}

impl CronSpecBuilder {
    pub fn second(mut self, field: &str) -> CronResult<Self> {
        self.second = Some(CronFieldExpression::parse(field)?);
        Ok(self)
    }

    pub fn minute(mut self, field: &str) -> CronResult<Self> {
        self.minute = Some(CronFieldExpression::parse(field)?);
        Ok(self)
    }

    pub fn hour(mut self, field: &str) -> CronResult<Self> {
        self.hour = Some(CronFieldExpression::parse(field)?);
        Ok(self)
    }

    pub fn day_of_month(mut self, field: &str) -> CronResult<Self> {
        self.day_of_month = Some(CronFieldExpression::parse(field)?);
        Ok(self)
    }

    /// Accepts `JAN`-`DEC` names as well as zero-based month numbers.
    pub fn month(mut self, field: &str) -> CronResult<Self> {
        self.month = Some(CronFieldExpression::parse(&substitute_names(
            field,
            &MONTH_NAMES,
        ))?);
        Ok(self)
    }

    /// Accepts `SUN`-`SAT` names as well as weekday numbers, Sunday = 0.
    pub fn weekday(mut self, field: &str) -> CronResult<Self> {
        self.weekday = Some(CronFieldExpression::parse(&substitute_names(
            field,
            &WEEKDAY_NAMES,
        ))?);
        Ok(self)
    }

    pub fn build(self) -> CronSpec {
        CronSpec {
            second: self.second.unwrap_or_else(CronFieldExpression::any),
            minute: self.minute.unwrap_or_else(CronFieldExpression::any),
            hour: self.hour.unwrap_or_else(CronFieldExpression::any),
            day_of_month: self.day_of_month.unwrap_or_else(CronFieldExpression::any),
            month: self.month.unwrap_or_else(CronFieldExpression::any),
            weekday: self.weekday.unwrap_or_else(CronFieldExpression::any),
        }
    }
}

/// Replace 3-letter names with their numeric equivalents, case-insensitively.
fn substitute_names(field: &str, names: &[(&str, &str)]) -> String {
    let mut substituted = field.to_ascii_uppercase();
    for (name, number) in names {
        substituted = substituted.replace(name, number);
    }
    substituted
}

fn start_of_next_month(t: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let first = t.date_naive().with_day(1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some(Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0)?))
}

fn start_of_next_day(t: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let next = t.date_naive().checked_add_days(Days::new(1))?;
    Some(Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0)?))
}

fn start_of_next_hour(t: DateTime<Utc>) -> Option<DateTime<Utc>> {
    Some(t.with_minute(0)?.with_second(0)? + Duration::hours(1))
}

fn start_of_next_minute(t: DateTime<Utc>) -> Option<DateTime<Utc>> {
    Some(t.with_second(0)? + Duration::minutes(1))
}
