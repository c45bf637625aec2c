//! Filled-set builder
//!
//! First pipeline stage: snapshot the filled cells of a grid source into an
//! owned, row-major ordered list the rest of the parse works from.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TextruxError};
use crate::geometry::GridPoint;
use crate::grid::GridSource;

/// A filled cell: position plus raw value.
///
/// The value keeps its original whitespace; it is guaranteed non-empty after
/// trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilledCell {
    /// 1-indexed row
    pub row: usize,
    /// 1-indexed column
    pub col: usize,
    /// Raw cell value (non-blank)
    pub value: String,
}

impl FilledCell {
    /// Create a filled cell after validating coordinates and content.
    pub fn new(row: usize, col: usize, value: impl Into<String>) -> Result<Self> {
        if row == 0 || col == 0 {
            return Err(TextruxError::InvalidCoordinate { row, col });
        }
        Ok(Self {
            row,
            col,
            value: value.into(),
        })
    }

    /// Position of the cell.
    pub fn point(&self) -> GridPoint {
        GridPoint::new(self.row, self.col)
    }

    /// Display form of the value (trimmed).
    pub fn trimmed(&self) -> &str {
        self.value.trim()
    }
}

/// Snapshot every filled cell of `grid` in row-major order.
pub fn collect_filled(grid: &dyn GridSource) -> Vec<FilledCell> {
    let mut out = Vec::new();
    for row in 1..=grid.row_count() {
        for col in 1..=grid.col_count() {
            let value = grid.cell(row, col);
            if !value.trim().is_empty() {
                out.push(FilledCell {
                    row,
                    col,
                    value: value.to_string(),
                });
            }
        }
    }
    out
}

/// Build a validated, row-major sorted filled set from raw triples.
///
/// Blank values are skipped; zero coordinates are rejected.
pub fn filled_cells_from_pairs<I, S>(cells: I) -> Result<Vec<FilledCell>>
where
    I: IntoIterator<Item = (usize, usize, S)>,
    S: Into<String>,
{
    let mut out = Vec::new();
    for (row, col, value) in cells {
        let value = value.into();
        if value.trim().is_empty() {
            continue;
        }
        out.push(FilledCell::new(row, col, value)?);
    }
    out.sort_by_key(|c| (c.row, c.col));
    out.dedup_by(|a, b| a.row == b.row && a.col == b.col);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::InMemoryGrid;

    #[test]
    fn test_collect_skips_blank_cells() {
        let mut grid = InMemoryGrid::new(3, 3);
        grid.set_cell(1, 1, "a").unwrap();
        grid.set_cell(3, 2, "b").unwrap();

        let filled = collect_filled(&grid);
        assert_eq!(filled.len(), 2);
        assert_eq!(filled[0].point(), GridPoint::new(1, 1));
        assert_eq!(filled[1].point(), GridPoint::new(3, 2));
    }

    #[test]
    fn test_row_major_order() {
        let filled =
            filled_cells_from_pairs(vec![(2, 1, "c"), (1, 2, "b"), (1, 1, "a")]).unwrap();
        let points: Vec<_> = filled.iter().map(FilledCell::point).collect();
        assert_eq!(
            points,
            vec![GridPoint::new(1, 1), GridPoint::new(1, 2), GridPoint::new(2, 1)]
        );
    }

    #[test]
    fn test_invalid_coordinate_rejected() {
        let err = filled_cells_from_pairs(vec![(0, 2, "x")]).unwrap_err();
        assert!(matches!(err, TextruxError::InvalidCoordinate { .. }));
    }

    #[test]
    fn test_trimmed_accessor() {
        let cell = FilledCell::new(1, 1, "  value  ").unwrap();
        assert_eq!(cell.trimmed(), "value");
        assert_eq!(cell.value, "  value  ");
    }
}
