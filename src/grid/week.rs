use chrono::{Datelike, Duration, NaiveDate, Weekday};
use itertools::Itertools;

use super::Membership;
use crate::calendar::{WeekStart, YearMonth};
use crate::error::{Error, ErrorKind, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridDay {
    pub date: NaiveDate,
    pub membership: Membership,
}

impl GridDay {
    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn year_month(&self) -> YearMonth {
        YearMonth::from(self.date)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeekRow {
    pub week_number: u32,
    pub iso_year: i32,
    pub days: [GridDay; 7],
}

impl WeekRow {
    fn new(days: [GridDay; 7]) -> Self {
        // A row always holds seven consecutive dates, so exactly one is a Thursday.
        let thursday = days
            .iter()
            .find(|d| d.date.weekday() == Weekday::Thu)
            .map(|d| d.date)
            .unwrap_or(days[0].date);
        let iso = thursday.iso_week();

        WeekRow {
            week_number: iso.week(),
            iso_year: iso.year(),
            days,
        }
    }

    pub fn count(&self, membership: Membership) -> usize {
        self.days
            .iter()
            .filter(|d| d.membership == membership)
            .count()
    }
}

/// ISO-week-numbered grid of one month including the leading days of the
/// previous month and the trailing days of the next one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeekGrid {
    month: YearMonth,
    week_start: WeekStart,
    rows: Vec<WeekRow>,
}

impl WeekGrid {
    pub fn new(year: i32, month: u32, week_start: WeekStart) -> Result<Self> {
        let month = YearMonth::from_numbers(year, month)?;
        let out_of_range = || {
            Error::new(
                ErrorKind::InvalidRequest,
                &format!("Year {} is out of the supported date range", year),
            )
        };

        let first_of_month = month.first_day().ok_or_else(out_of_range)?;
        let last_of_month = month.last_day().ok_or_else(out_of_range)?;

        let lead = week_start.column_of(first_of_month.weekday());
        let trail = 6 - week_start.column_of(last_of_month.weekday());

        let first = first_of_month - Duration::days(lead as i64);
        let last = last_of_month + Duration::days(trail as i64);
        let total_days = (last - first).num_days() + 1;

        let rows = (0..total_days)
            .map(|offset| {
                let date = first + Duration::days(offset);
                GridDay {
                    date,
                    membership: if date < first_of_month {
                        Membership::Previous
                    } else if date > last_of_month {
                        Membership::Next
                    } else {
                        Membership::Current
                    },
                }
            })
            .chunks(7)
            .into_iter()
            .map(|chunk| {
                let days = chunk.collect_vec();
                WeekRow::new([
                    days[0], days[1], days[2], days[3], days[4], days[5], days[6],
                ])
            })
            .collect_vec();

        log::trace!(
            "Week grid for {}-{:02}: {} rows starting {}",
            year,
            month.month_number(),
            rows.len(),
            first
        );

        Ok(WeekGrid {
            month,
            week_start,
            rows,
        })
    }

    pub fn month(&self) -> YearMonth {
        self.month
    }

    pub fn week_start(&self) -> WeekStart {
        self.week_start
    }

    pub fn rows(&self) -> &[WeekRow] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.days[0].date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.days[6].date)
    }

    pub fn days(&self) -> impl Iterator<Item = &GridDay> {
        self.rows.iter().flat_map(|r| r.days.iter())
    }

    pub fn week_numbers(&self) -> Vec<u32> {
        self.rows.iter().map(|r| r.week_number).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::days_of_month;
    use chrono::Month;
    use num_traits::FromPrimitive;

    #[test]
    fn february_2026_monday_start() {
        let grid = WeekGrid::new(2026, 2, WeekStart::Monday).unwrap();
        let first = &grid.rows()[0];

        assert_eq!(first.count(Membership::Previous), 6);
        assert_eq!(first.count(Membership::Current), 1);
        assert_eq!(first.days[6].date, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        // Thursday of that row is 2026-01-29
        assert_eq!(first.week_number, 5);
        assert_eq!(grid.num_rows(), 5);

        let last = grid.rows().last().unwrap();
        assert_eq!(last.count(Membership::Next), 1);
        assert_eq!(last.days[6].date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn february_2026_sunday_start_has_no_lead() {
        let grid = WeekGrid::new(2026, 2, WeekStart::Sunday).unwrap();
        assert_eq!(grid.rows()[0].count(Membership::Previous), 0);
        assert_eq!(grid.num_rows(), 4);
        assert_eq!(grid.first_date().unwrap().weekday(), Weekday::Sun);
    }

    #[test]
    fn week_numbers_across_year_boundary() {
        // 2027-01-01 is a Friday, its row's Thursday is 2026-12-31 (week 53)
        let grid = WeekGrid::new(2027, 1, WeekStart::Monday).unwrap();
        assert_eq!(grid.rows()[0].week_number, 53);
        assert_eq!(grid.rows()[0].iso_year, 2026);
        assert_eq!(grid.rows()[1].week_number, 1);

        // the last row of December 2025 already belongs to week 1 of 2026
        let grid = WeekGrid::new(2025, 12, WeekStart::Monday).unwrap();
        let last = grid.rows().last().unwrap();
        assert_eq!(last.week_number, 1);
        assert_eq!(last.iso_year, 2026);
    }

    #[test]
    fn rows_cover_every_day_exactly_once() {
        for year in 2020..=2030 {
            for month in 1..=12 {
                for week_start in [WeekStart::Monday, WeekStart::Sunday] {
                    let grid = WeekGrid::new(year, month, week_start).unwrap();
                    let days = days_of_month(&Month::from_u32(month).unwrap(), year);

                    let current = grid
                        .days()
                        .filter(|d| d.membership == Membership::Current)
                        .map(|d| d.day())
                        .collect_vec();
                    assert_eq!(current, (1..=days).collect_vec());

                    assert!(grid.rows().iter().all(|r| r.days.len() == 7));
                    assert!((4..=6).contains(&grid.num_rows()));
                    assert_eq!(
                        grid.first_date().unwrap().weekday(),
                        week_start.weekday()
                    );

                    let dates = grid.days().map(|d| d.date).collect_vec();
                    assert!(dates.windows(2).all(|w| w[1] - w[0] == Duration::days(1)));
                }
            }
        }
    }

    #[test]
    fn week_numbers_only_reset_at_year_wrap() {
        for year in 2020..=2030 {
            for month in 1..=12 {
                let grid = WeekGrid::new(year, month, WeekStart::Monday).unwrap();
                for pair in grid.rows().windows(2) {
                    let (a, b) = (&pair[0], &pair[1]);
                    if b.iso_year == a.iso_year {
                        assert_eq!(b.week_number, a.week_number + 1);
                    } else {
                        assert_eq!(b.week_number, 1);
                        assert!(a.week_number == 52 || a.week_number == 53);
                    }
                }
            }
        }
    }

    #[test]
    fn rejects_invalid_month() {
        assert!(WeekGrid::new(2026, 13, WeekStart::Monday).is_err());
        assert!(WeekGrid::new(2026, 0, WeekStart::Monday).is_err());
    }
}
