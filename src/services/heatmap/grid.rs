use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::category::{CategoryField, CategoryRecord};

pub const DAYS_PER_WEEK: usize = 7;

/// Sunday on or before January 1 of `year`.
pub fn first_sunday(year: i32) -> Option<NaiveDate> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    Some(jan1 - Duration::days(jan1.weekday().num_days_from_sunday() as i64))
}

/// Week columns for `year`: `ceil((Dec 31 - first Sunday) / 7) + 1`.
pub fn column_count(year: i32) -> Option<usize> {
    let dec31 = NaiveDate::from_ymd_opt(year, 12, 31)?;
    let days = (dec31 - first_sunday(year)?).num_days() as usize;
    Some(days.div_ceil(DAYS_PER_WEEK) + 1)
}

/// Week x weekday matrix for one (year, field). Rows are weekdays with
/// Sunday as row 0, columns are weeks. A cell holds the domain index of the
/// day's value, or `None` for no data.
#[derive(Debug, Clone)]
pub struct HeatmapGrid {
    pub year: i32,
    pub field: CategoryField,
    pub first_sunday: NaiveDate,
    pub columns: usize,
    cells: Vec<Option<usize>>,
}

impl HeatmapGrid {
    /// Buckets `records` for `year`. Records from other years and records
    /// without a value for `field` leave their cell empty. Returns `None`
    /// for a year chrono cannot represent.
    pub fn build(records: &[CategoryRecord], year: i32, field: CategoryField) -> Option<Self> {
        let first_sunday = first_sunday(year)?;
        let columns = column_count(year)?;
        let mut grid = Self {
            year,
            field,
            first_sunday,
            columns,
            cells: vec![None; DAYS_PER_WEEK * columns],
        };

        for record in records {
            if record.date.year() != year {
                continue;
            }
            let Some(value) = record.value_index(field) else {
                continue;
            };
            if let Some((row, col)) = grid.position_of(record.date) {
                grid.cells[row * columns + col] = Some(value);
            }
        }
        Some(grid)
    }

    pub fn position_of(&self, date: NaiveDate) -> Option<(usize, usize)> {
        let offset = (date - self.first_sunday).num_days();
        if offset < 0 {
            return None;
        }
        let offset = offset as usize;
        let col = offset / DAYS_PER_WEEK;
        (col < self.columns).then_some((offset % DAYS_PER_WEEK, col))
    }

    pub fn date_at(&self, row: usize, col: usize) -> NaiveDate {
        self.first_sunday + Duration::days((col * DAYS_PER_WEEK + row) as i64)
    }

    /// Whether the cell's date falls inside the grid's year.
    pub fn in_year(&self, row: usize, col: usize) -> bool {
        self.date_at(row, col).year() == self.year
    }

    pub fn get(&self, row: usize, col: usize) -> Option<usize> {
        if row >= DAYS_PER_WEEK || col >= self.columns {
            return None;
        }
        self.cells[row * self.columns + col]
    }

    /// Distinct domain indices present, ascending.
    pub fn observed(&self) -> BTreeSet<usize> {
        self.cells.iter().flatten().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }
}
