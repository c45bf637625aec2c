//! Matrix construct builder
//!
//! A matrix is a rectangle whose top-left corner is empty (window key 7).
//! The rest of the first row is the primary header line, the rest of the
//! first column is the secondary header line, and the interior is the body.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::constructs::Detection;
use crate::error::{Result, TextruxError};
use crate::geometry::{GridPoint, GridRect};
use crate::parser::ParseContext;

/// Cell role inside a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatrixCellType {
    /// First row, past the corner
    PrimaryHeader,
    /// First column, past the corner
    SecondaryHeader,
    /// Interior cell
    Body,
    /// The definitional empty top-left corner
    EmptyCorner,
}

/// One matrix cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixCell {
    /// Cell position
    pub point: GridPoint,
    /// Trimmed content
    pub content: String,
    /// Role in the matrix
    pub cell_type: MatrixCellType,
}

/// A header line with its body cells: a column for primary entities, a row
/// for secondary entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixEntity {
    /// 0-based entity index
    pub index: usize,
    /// Header cell of the line
    pub header: MatrixCell,
    /// Body cells of the line, in grid order
    pub cells: Vec<MatrixCell>,
}

/// A built matrix construct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    /// Bounding rectangle
    pub bounds: GridRect,
    /// Detection key
    pub key: u8,
    /// Position of the empty corner
    pub empty_corner: GridPoint,
    /// All cells, row-major
    pub cells: Vec<MatrixCell>,
    /// Columns, headed by the first row
    pub primary_entities: Vec<MatrixEntity>,
    /// Rows, headed by the first column
    pub secondary_entities: Vec<MatrixEntity>,
}

impl Matrix {
    /// Body cell at the crossing of primary entity `primary` and secondary
    /// entity `secondary` (both 0-based), if filled.
    pub fn value_at(&self, primary: usize, secondary: usize) -> Option<&MatrixCell> {
        let point = GridPoint::new(
            self.bounds.top_row + 1 + secondary,
            self.bounds.left_col + 1 + primary,
        );
        self.cells
            .iter()
            .find(|c| c.point == point && c.cell_type == MatrixCellType::Body)
    }
}

/// Build a matrix from the cluster's filled cells.
pub fn build_matrix(
    bounds: GridRect,
    filled: &BTreeSet<GridPoint>,
    detection: &Detection,
    ctx: &ParseContext,
) -> Result<Matrix> {
    if filled.is_empty() {
        return Err(TextruxError::EmptyCluster);
    }

    let corner = bounds.top_left();
    let cell_type = |point: GridPoint| {
        if point == corner {
            MatrixCellType::EmptyCorner
        } else if point.row == bounds.top_row {
            MatrixCellType::PrimaryHeader
        } else if point.col == bounds.left_col {
            MatrixCellType::SecondaryHeader
        } else {
            MatrixCellType::Body
        }
    };
    let make_cell = |point: GridPoint| MatrixCell {
        point,
        content: ctx.trimmed(point).to_string(),
        cell_type: cell_type(point),
    };

    let cells: Vec<MatrixCell> = filled.iter().map(|&p| make_cell(p)).collect();

    let primary_entities = (bounds.left_col + 1..=bounds.right_col)
        .map(|col| MatrixEntity {
            index: col - bounds.left_col - 1,
            header: make_cell(GridPoint::new(bounds.top_row, col)),
            cells: (bounds.top_row + 1..=bounds.bottom_row)
                .map(|row| GridPoint::new(row, col))
                .filter(|p| filled.contains(p))
                .map(make_cell)
                .collect(),
        })
        .collect();

    let secondary_entities = (bounds.top_row + 1..=bounds.bottom_row)
        .map(|row| MatrixEntity {
            index: row - bounds.top_row - 1,
            header: make_cell(GridPoint::new(row, bounds.left_col)),
            cells: (bounds.left_col + 1..=bounds.right_col)
                .map(|col| GridPoint::new(row, col))
                .filter(|p| filled.contains(p))
                .map(make_cell)
                .collect(),
        })
        .collect();

    Ok(Matrix {
        bounds,
        key: detection.key,
        empty_corner: corner,
        cells,
        primary_entities,
        secondary_entities,
    })
}
