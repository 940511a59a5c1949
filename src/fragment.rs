use chrono::{Datelike, Month, NaiveDate};
use nom::{
    branch::alt,
    bytes::complete::take_while_m_n,
    combinator::{all_consuming, map},
    IResult,
};
use serde::Serialize;
use std::fmt;

use crate::calendar::YearMonth;
use crate::error::{Error, ErrorKind, Result};
use crate::l10n::Language;

const LANG_PARAM: &str = "&lang=";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentPattern {
    /// `YYYYMMDD`
    FullDate,
    /// `YYYYMM`
    YearMonth,
    /// `M` or `MM`, year-independent
    PerpetualMonth,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedDate {
    pub date: NaiveDate,
    pub source_pattern: FragmentPattern,
    /// Language requested by the fragment. `None` keeps the current one.
    pub language: Option<Language>,
}

enum Shape<'a> {
    FullDate(&'a str),
    YearMonth(&'a str),
    Month(&'a str),
}

fn digits<'a>(min: usize, max: usize) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    all_consuming(take_while_m_n(min, max, |c: char| c.is_ascii_digit()))
}

fn shape(input: &str) -> IResult<&str, Shape<'_>> {
    alt((
        map(digits(8, 8), Shape::FullDate),
        map(digits(6, 6), Shape::YearMonth),
        map(digits(1, 2), Shape::Month),
    ))(input)
}

/// Splits off a trailing `&lang=xx`. Unsupported codes are dropped without
/// changing the language.
fn split_language(fragment: &str) -> (&str, Option<Language>) {
    match fragment.find(LANG_PARAM) {
        Some(idx) => {
            let code = &fragment[idx + LANG_PARAM.len()..];
            let language = Language::from_code(code);
            if language.is_none() {
                log::debug!("Ignoring unsupported language '{}'", code);
            }
            (&fragment[..idx], language)
        }
        None => (fragment, None),
    }
}

/// Resolves a link fragment into a calendar date relative to `today`.
///
/// Recognized shapes are tried in order: `YYYYMMDD` (must be a real date),
/// `YYYYMM` (today if it is the current month, else the 1st) and a month
/// number `1`..`12` (today if it is the current month, else the 1st of that
/// month in the current year). Anything else is an
/// [`ErrorKind::InvalidDateFragment`] and the displayed date must stay as it is.
pub fn resolve(today: NaiveDate, fragment: &str) -> Result<ResolvedDate> {
    let fragment = fragment.trim().trim_start_matches('#');
    let (numeric, language) = split_language(fragment);
    let invalid = |reason: &str| {
        Error::new(
            ErrorKind::InvalidDateFragment,
            &format!("'{}': {}", fragment, reason),
        )
    };

    let (_, parsed) = shape(numeric).map_err(|_| invalid("unrecognized shape"))?;

    let (date, source_pattern) = match parsed {
        Shape::FullDate(s) => {
            let (year, month, day) = (num(&s[..4]), num(&s[4..6]), num(&s[6..]));
            let date = NaiveDate::from_ymd_opt(year as i32, month, day)
                .filter(|d| d.year() == year as i32 && d.month() == month && d.day() == day)
                .ok_or_else(|| invalid("no such date"))?;
            (date, FragmentPattern::FullDate)
        }
        Shape::YearMonth(s) => {
            let (year, month) = (num(&s[..4]) as i32, num(&s[4..]));
            let target =
                YearMonth::from_numbers(year, month).map_err(|_| invalid("no such month"))?;
            (
                first_or_today(today, target).ok_or_else(|| invalid("no such month"))?,
                FragmentPattern::YearMonth,
            )
        }
        Shape::Month(s) => {
            let month = num(s);
            let target =
                YearMonth::from_numbers(today.year(), month).map_err(|_| invalid("no such month"))?;
            (
                first_or_today(today, target).ok_or_else(|| invalid("no such month"))?,
                FragmentPattern::PerpetualMonth,
            )
        }
    };

    Ok(ResolvedDate {
        date,
        source_pattern,
        language,
    })
}

// Input is at most 8 ASCII digits, always fits.
fn num(s: &str) -> u32 {
    s.parse().unwrap_or(0)
}

fn first_or_today(today: NaiveDate, target: YearMonth) -> Option<NaiveDate> {
    if target.contains(&today) {
        Some(today)
    } else {
        target.first_day()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FragmentTarget {
    Date(NaiveDate),
    Month(YearMonth),
    Perpetual(Month),
}

/// Encodes a date, month or perpetual month into a link fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub target: FragmentTarget,
    pub language: Option<Language>,
}

impl Fragment {
    pub fn date(date: NaiveDate) -> Self {
        Fragment {
            target: FragmentTarget::Date(date),
            language: None,
        }
    }

    pub fn month(month: YearMonth) -> Self {
        Fragment {
            target: FragmentTarget::Month(month),
            language: None,
        }
    }

    pub fn perpetual(month: Month) -> Self {
        Fragment {
            target: FragmentTarget::Perpetual(month),
            language: None,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn link(&self, base_url: &str) -> String {
        format!("{}#{}", base_url, self)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target {
            FragmentTarget::Date(date) => write!(f, "{}", date.format("%Y%m%d"))?,
            FragmentTarget::Month(ym) => write!(f, "{:04}{:02}", ym.year(), ym.month_number())?,
            FragmentTarget::Perpetual(month) => write!(f, "{:02}", month.number_from_month())?,
        }
        if let Some(language) = self.language {
            write!(f, "{}{}", LANG_PARAM, language)?;
        }
        Ok(())
    }
}
