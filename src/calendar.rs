use chrono::{Datelike, Month, NaiveDate, Weekday};
use num_traits::FromPrimitive;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};

pub fn days_of_month(month: &Month, year: i32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month.number_from_month(), 1);
    let next = if month.number_from_month() == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month.number_from_month() + 1, 1)
    };

    match (first, next) {
        (Some(first), Some(next)) => next.signed_duration_since(first).num_days() as u32,
        _ => 0,
    }
}

/// Day count used by the perpetual calendar. February always has 29 days so
/// the layout is identical for every year.
pub fn canonical_days_of_month(month: &Month) -> u32 {
    match month {
        Month::February => 29,
        other => days_of_month(other, 2001),
    }
}

pub fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

/// Closest leap year not after `year`.
pub fn previous_leap_year(year: i32) -> i32 {
    (0..8)
        .map(|back| year - back)
        .find(|y| is_leap_year(*y))
        .unwrap_or(year)
}

pub fn month_from_number(month: u32) -> Result<Month> {
    Month::from_u32(month).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidRequest,
            &format!("Month must be between 1 and 12, got {}", month),
        )
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, DeserializeFromStr, SerializeDisplay)]
pub enum WeekStart {
    Monday,
    Sunday,
}

impl Default for WeekStart {
    fn default() -> Self {
        WeekStart::Monday
    }
}

impl WeekStart {
    pub fn weekday(&self) -> Weekday {
        match self {
            WeekStart::Monday => Weekday::Mon,
            WeekStart::Sunday => Weekday::Sun,
        }
    }

    /// Position of `weekday` within a row starting at this week start.
    pub fn column_of(&self, weekday: Weekday) -> u32 {
        match self {
            WeekStart::Monday => weekday.num_days_from_monday(),
            WeekStart::Sunday => weekday.num_days_from_sunday(),
        }
    }
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekStart::Monday => write!(f, "monday"),
            WeekStart::Sunday => write!(f, "sunday"),
        }
    }
}

impl FromStr for WeekStart {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" => Ok(WeekStart::Monday),
            "sunday" | "sun" => Ok(WeekStart::Sunday),
            _ => Err(Error::new(
                ErrorKind::ParseError,
                &format!("Week start '{}' not recognized (monday, sunday)", s),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YearMonth {
    year: i32,
    month: Month,
}

impl YearMonth {
    pub fn new(year: i32, month: Month) -> Self {
        YearMonth { year, month }
    }

    pub fn from_numbers(year: i32, month: u32) -> Result<Self> {
        Ok(YearMonth::new(year, month_from_number(month)?))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn month_number(&self) -> u32 {
        self.month.number_from_month()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month_number(), 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month_number(), self.num_days())
    }

    pub fn num_days(&self) -> u32 {
        days_of_month(&self.month, self.year)
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month_number()
    }

    pub fn next(&self) -> Self {
        let next_month = self.month.succ();

        YearMonth {
            month: next_month,
            year: if next_month == Month::January {
                self.year + 1
            } else {
                self.year
            },
        }
    }

    pub fn prev(&self) -> Self {
        let prev_month = self.month.pred();

        YearMonth {
            month: prev_month,
            year: if prev_month == Month::December {
                self.year - 1
            } else {
                self.year
            },
        }
    }

    pub fn key(&self) -> MonthKey {
        MonthKey::year_bound(self.year, self.month_number())
    }
}

impl<T: Datelike> From<T> for YearMonth {
    fn from(d: T) -> Self {
        // `Datelike::month` is always within 1..=12
        let month = Month::from_u32(d.month()).unwrap_or(Month::January);
        YearMonth::new(d.year(), month)
    }
}

impl Add<u32> for YearMonth {
    type Output = YearMonth;
    fn add(self, rhs: u32) -> Self::Output {
        (0..rhs).fold(self, |ym, _| ym.next())
    }
}

impl Sub<u32> for YearMonth {
    type Output = YearMonth;
    fn sub(self, rhs: u32) -> Self::Output {
        (0..rhs).fold(self, |ym, _| ym.prev())
    }
}

impl PartialOrd for YearMonth {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for YearMonth {
    fn cmp(&self, other: &Self) -> Ordering {
        self.year
            .cmp(&other.year)
            .then(self.month_number().cmp(&other.month_number()))
    }
}

/// Key of one month's photo sequence: `YYYYMM` for year-bound entries or
/// `MM` for the perpetual projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay)]
pub struct MonthKey {
    year: Option<i32>,
    month: u32,
}

impl MonthKey {
    pub fn year_bound(year: i32, month: u32) -> Self {
        MonthKey {
            year: Some(year),
            month,
        }
    }

    pub fn perpetual(month: u32) -> Self {
        MonthKey { year: None, month }
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn is_perpetual(&self) -> bool {
        self.year.is_none()
    }

    /// Drops the year portion.
    pub fn project(&self) -> Self {
        MonthKey::perpetual(self.month)
    }

    pub fn year_month(&self) -> Option<YearMonth> {
        self.year
            .and_then(|year| YearMonth::from_numbers(year, self.month).ok())
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(year) => write!(f, "{:04}{:02}", year, self.month),
            None => write!(f, "{:02}", self.month),
        }
    }
}

impl FromStr for MonthKey {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || {
            Error::new(
                ErrorKind::PhotoTableParse,
                &format!("'{}' is not a month key (YYYYMM or MM)", s),
            )
        };

        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let key = match s.len() {
            6 => MonthKey::year_bound(
                s[..4].parse().map_err(|_| invalid())?,
                s[4..].parse().map_err(|_| invalid())?,
            ),
            1 | 2 => MonthKey::perpetual(s.parse().map_err(|_| invalid())?),
            _ => return Err(invalid()),
        };

        if (1..=12).contains(&key.month) {
            Ok(key)
        } else {
            Err(invalid())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_lengths() {
        assert_eq!(days_of_month(&Month::February, 2024), 29);
        assert_eq!(days_of_month(&Month::February, 2026), 28);
        assert_eq!(days_of_month(&Month::December, 2026), 31);
        assert_eq!(days_of_month(&Month::April, 2026), 30);
    }

    #[test]
    fn leap_years() {
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(2026));
        assert!(!is_leap_year(2100));
        assert_eq!(previous_leap_year(2026), 2024);
        assert_eq!(previous_leap_year(2028), 2028);
        assert_eq!(previous_leap_year(2103), 2096);
    }

    #[test]
    fn perpetual_february_has_leap_day() {
        assert_eq!(canonical_days_of_month(&Month::February), 29);
        assert_eq!(canonical_days_of_month(&Month::January), 31);
        assert_eq!(canonical_days_of_month(&Month::June), 30);
    }

    #[test]
    fn neighbours_wrap_years() {
        let jan = YearMonth::new(2026, Month::January);
        assert_eq!(jan.prev(), YearMonth::new(2025, Month::December));
        assert_eq!(jan.prev().next(), jan);
        assert_eq!(jan + 13, YearMonth::new(2027, Month::February));
        assert_eq!(jan - 14, YearMonth::new(2024, Month::November));
        assert!(jan.prev() < jan);
    }

    #[test]
    fn month_keys_parse_and_project() {
        let key: MonthKey = "202602".parse().unwrap();
        assert_eq!(key, MonthKey::year_bound(2026, 2));
        assert_eq!(key.to_string(), "202602");
        assert_eq!(key.project(), "02".parse().unwrap());
        assert_eq!(key.project().to_string(), "02");
        assert!("202613".parse::<MonthKey>().is_err());
        assert!("2026-02".parse::<MonthKey>().is_err());
        assert!("0".parse::<MonthKey>().is_err());
    }

    #[test]
    fn week_start_parses() {
        assert_eq!("Sunday".parse::<WeekStart>().unwrap(), WeekStart::Sunday);
        assert_eq!(WeekStart::Sunday.column_of(Weekday::Sun), 0);
        assert_eq!(WeekStart::Monday.column_of(Weekday::Sun), 6);
        assert!("friday".parse::<WeekStart>().is_err());
    }
}
