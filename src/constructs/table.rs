//! Table construct builder
//!
//! A table is a fully filled rectangle (window key 15). The first row is
//! the header row and the first column is a row-header column; entities are
//! the data rows, attributes are the columns including their header cell.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::constructs::Detection;
use crate::error::{Result, TextruxError};
use crate::geometry::{GridPoint, GridRect};
use crate::parser::ParseContext;

/// Cell role inside a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableCellType {
    /// First row or first column
    Header,
    /// Everything else
    Body,
}

/// One table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell position
    pub point: GridPoint,
    /// Trimmed content
    pub content: String,
    /// Header or body
    pub cell_type: TableCellType,
}

/// A data row, indexed from 0 for the first row under the header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntity {
    /// 0-based data-row index
    pub index: usize,
    /// Cells of the data row, left to right
    pub cells: Vec<TableCell>,
}

impl TableEntity {
    /// Cells of the data row, left to right.
    pub fn body_cells(&self) -> &[TableCell] {
        &self.cells
    }
}

/// A column, including its header cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableAttribute {
    /// 0-based column index
    pub index: usize,
    /// Header cell of the column (content may be empty for sparse tables)
    pub header: TableCell,
    /// Cells below the header, top to bottom
    pub cells: Vec<TableCell>,
}

/// A built table construct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Bounding rectangle
    pub bounds: GridRect,
    /// Detection key
    pub key: u8,
    /// All cells, row-major
    pub cells: Vec<TableCell>,
    /// Data rows
    pub entities: Vec<TableEntity>,
    /// Columns with their headers
    pub attributes: Vec<TableAttribute>,
}

impl Table {
    /// The cell at `point`, if filled.
    pub fn cell_at(&self, point: GridPoint) -> Option<&TableCell> {
        self.cells.iter().find(|c| c.point == point)
    }
}

/// Build a table from the cluster's filled cells.
pub fn build_table(
    bounds: GridRect,
    filled: &BTreeSet<GridPoint>,
    detection: &Detection,
    ctx: &ParseContext,
) -> Result<Table> {
    if filled.is_empty() {
        return Err(TextruxError::EmptyCluster);
    }

    let cell_type = |point: GridPoint| {
        if point.row == bounds.top_row || point.col == bounds.left_col {
            TableCellType::Header
        } else {
            TableCellType::Body
        }
    };
    let make_cell = |point: GridPoint| TableCell {
        point,
        content: ctx.trimmed(point).to_string(),
        cell_type: cell_type(point),
    };

    let cells: Vec<TableCell> = filled.iter().map(|&p| make_cell(p)).collect();

    let entities = (bounds.top_row + 1..=bounds.bottom_row)
        .map(|row| TableEntity {
            index: row - bounds.top_row - 1,
            cells: (bounds.left_col..=bounds.right_col)
                .map(|col| GridPoint::new(row, col))
                .filter(|p| filled.contains(p))
                .map(make_cell)
                .collect(),
        })
        .collect();

    let attributes = (bounds.left_col..=bounds.right_col)
        .map(|col| {
            let header_point = GridPoint::new(bounds.top_row, col);
            TableAttribute {
                index: col - bounds.left_col,
                header: make_cell(header_point),
                cells: (bounds.top_row + 1..=bounds.bottom_row)
                    .map(|row| GridPoint::new(row, col))
                    .filter(|p| filled.contains(p))
                    .map(make_cell)
                    .collect(),
            }
        })
        .collect();

    Ok(Table {
        bounds,
        key: detection.key,
        cells,
        entities,
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructs::detect_cluster;
    use crate::grid::FilledCell;

    fn context(cells: &[(usize, usize, &str)]) -> (ParseContext, BTreeSet<GridPoint>) {
        let filled: Vec<FilledCell> = cells
            .iter()
            .map(|&(r, c, v)| FilledCell::new(r, c, v).unwrap())
            .collect();
        let points = filled.iter().map(FilledCell::point).collect();
        (ParseContext::new(&filled, 20, 20), points)
    }

    #[test]
    fn test_simple_table() {
        let (ctx, points) = context(&[
            (1, 1, "Name"),
            (1, 2, "Age"),
            (2, 1, "A"),
            (2, 2, "30"),
            (3, 1, "B"),
            (3, 2, "40"),
        ]);
        let bounds = GridRect::new(1, 3, 1, 2);
        let detection = detect_cluster(bounds, &points, &ctx, None).unwrap();
        let table = build_table(bounds, &points, &detection, &ctx).unwrap();

        assert_eq!(table.key, 15);
        assert_eq!(table.attributes.len(), 2);
        assert_eq!(table.entities.len(), 2);
        assert_eq!(table.attributes[0].header.content, "Name");
        assert_eq!(table.attributes[1].header.content, "Age");

        let contents: Vec<&str> = table.entities[0]
            .body_cells()
            .iter()
            .map(|c| c.content.as_str())
            .collect();
        assert_eq!(contents, vec!["A", "30"]);
    }

    #[test]
    fn test_cell_typing() {
        let (ctx, points) = context(&[
            (1, 1, "h"),
            (1, 2, "h"),
            (2, 1, "h"),
            (2, 2, "b"),
        ]);
        let bounds = GridRect::new(1, 2, 1, 2);
        let detection = detect_cluster(bounds, &points, &ctx, None).unwrap();
        let table = build_table(bounds, &points, &detection, &ctx).unwrap();

        let body: Vec<_> = table
            .cells
            .iter()
            .filter(|c| c.cell_type == TableCellType::Body)
            .collect();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].point, GridPoint::new(2, 2));
    }

    #[test]
    fn test_empty_cluster_rejected() {
        let (ctx, _) = context(&[(1, 1, "x")]);
        let empty = BTreeSet::new();
        let detection = Detection {
            key: 15,
            kind: crate::constructs::ConstructKind::Table,
            orientation: crate::constructs::Orientation::Regular,
            has_child_header: false,
        };
        let err = build_table(GridRect::new(1, 1, 1, 1), &empty, &detection, &ctx).unwrap_err();
        assert!(matches!(err, TextruxError::EmptyCluster));
    }
}
