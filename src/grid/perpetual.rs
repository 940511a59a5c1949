use chrono::Month;
use itertools::Itertools;

use crate::calendar::{canonical_days_of_month, month_from_number};
use crate::error::Result;

/// A slot of the perpetual grid. Slots past the month's last day stay empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PerpetualSlot {
    Day(u32),
    Empty,
}

impl PerpetualSlot {
    pub fn day(&self) -> Option<u32> {
        match self {
            PerpetualSlot::Day(day) => Some(*day),
            PerpetualSlot::Empty => None,
        }
    }
}

/// Year-independent month grid: day numbers only, laid out row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PerpetualGrid {
    month: Month,
    columns: usize,
    rows: Vec<Vec<PerpetualSlot>>,
}

impl PerpetualGrid {
    pub const ROWS: usize = 5;

    pub fn new(month: u32) -> Result<Self> {
        let month = month_from_number(month)?;
        let days = canonical_days_of_month(&month);
        let columns = Self::columns_for(days);

        let rows = (1..=days)
            .map(PerpetualSlot::Day)
            .pad_using(Self::ROWS * columns, |_| PerpetualSlot::Empty)
            .chunks(columns)
            .into_iter()
            .map(|row| row.collect_vec())
            .collect_vec();

        Ok(PerpetualGrid {
            month,
            columns,
            rows,
        })
    }

    pub fn columns_for(days: u32) -> usize {
        if days > 30 {
            7
        } else {
            6
        }
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> &[Vec<PerpetualSlot>] {
        &self.rows
    }

    pub fn num_days(&self) -> u32 {
        canonical_days_of_month(&self.month)
    }

    pub fn slots(&self) -> impl Iterator<Item = &PerpetualSlot> {
        self.rows.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn february_always_has_day_29() {
        let grid = PerpetualGrid::new(2).unwrap();
        assert_eq!(grid.columns(), 6);
        assert!(grid.slots().any(|s| *s == PerpetualSlot::Day(29)));
        assert_eq!(grid.slots().filter_map(|s| s.day()).count(), 29);
    }

    #[test]
    fn shape_is_five_rows_of_six_or_seven() {
        for month in 1..=12 {
            let grid = PerpetualGrid::new(month).unwrap();
            assert_eq!(grid.rows().len(), PerpetualGrid::ROWS);
            assert!(grid.rows().iter().all(|r| r.len() == grid.columns()));

            let expected_columns = if grid.num_days() == 31 { 7 } else { 6 };
            assert_eq!(grid.columns(), expected_columns);

            let days = grid.slots().filter_map(|s| s.day()).collect_vec();
            assert_eq!(days, (1..=grid.num_days()).collect_vec());
        }
    }

    #[test]
    fn trailing_slots_are_empty() {
        // 30 days in a 6x5 grid fill every slot
        let april = PerpetualGrid::new(4).unwrap();
        assert!(april.slots().all(|s| *s != PerpetualSlot::Empty));

        // 31 days in a 7x5 grid leave four empty slots at the end
        let january = PerpetualGrid::new(1).unwrap();
        let last_row = january.rows().last().unwrap();
        assert_eq!(last_row[2], PerpetualSlot::Day(31));
        assert!(last_row[3..].iter().all(|s| *s == PerpetualSlot::Empty));
    }

    #[test]
    fn rejects_invalid_month() {
        assert!(PerpetualGrid::new(0).is_err());
        assert!(PerpetualGrid::new(13).is_err());
    }
}
