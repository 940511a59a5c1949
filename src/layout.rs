use derive_more::Constructor;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};

/// Fixed print canvas the grid has to fill, in millimetres.
#[derive(Clone, Copy, Debug, PartialEq, Constructor, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub printable_height_mm: f64,
    pub printable_width_mm: f64,
    pub spacing_mm: f64,
    pub photo_margin_mm: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        // A3 landscape: 245mm grid minus the 8mm weekday header, 400mm between margins
        LayoutConfig {
            printable_height_mm: 237.0,
            printable_width_mm: 400.0,
            spacing_mm: 2.0,
            photo_margin_mm: 3.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CellLayout {
    pub rows: usize,
    pub columns: usize,
    pub row_height: f64,
    pub cell_height: f64,
    pub cell_width: f64,
    pub spacing: f64,
}

impl CellLayout {
    pub fn total_height(&self) -> f64 {
        self.rows as f64 * self.row_height + (self.rows as f64 - 1.0) * self.spacing
    }

    pub fn total_width(&self) -> f64 {
        self.columns as f64 * self.cell_width + (self.columns as f64 - 1.0) * self.spacing
    }
}

/// Sizes grid cells so that any row count fills the canvas height exactly.
/// Only the height varies with the row count, the width depends on the
/// column count alone.
#[derive(Clone, Copy, Debug, Default, Constructor)]
pub struct LayoutSizer {
    config: LayoutConfig,
}

impl LayoutSizer {
    pub const WEEK_COLUMNS: usize = 7;
    pub const PERPETUAL_ROWS: usize = 5;

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn year_bound(&self, rows_needed: usize) -> Result<CellLayout> {
        self.size(rows_needed, Self::WEEK_COLUMNS)
    }

    pub fn perpetual(&self, columns: usize) -> Result<CellLayout> {
        self.size(Self::PERPETUAL_ROWS, columns)
    }

    pub fn size(&self, rows: usize, columns: usize) -> Result<CellLayout> {
        let LayoutConfig {
            printable_height_mm: height,
            printable_width_mm: width,
            spacing_mm: spacing,
            photo_margin_mm: margin,
        } = self.config;

        if rows == 0 || columns == 0 {
            return Err(Error::new(
                ErrorKind::InvalidRequest,
                &format!("Cannot lay out a {}x{} grid", rows, columns),
            ));
        }

        let row_height = (height - (rows as f64 - 1.0) * spacing) / rows as f64;
        let cell_width = (width - (columns as f64 - 1.0) * spacing) / columns as f64;
        let cell_height = row_height - margin;

        if cell_height <= 0.0 || cell_width <= 0.0 {
            return Err(Error::new(
                ErrorKind::InvalidRequest,
                &format!(
                    "{}x{} cells do not fit a {}x{}mm canvas",
                    rows, columns, width, height
                ),
            ));
        }

        Ok(CellLayout {
            rows,
            columns,
            row_height,
            cell_height,
            cell_width,
            spacing,
        })
    }
}
