//! Per-parse scratch state
//!
//! A [`ParseContext`] replaces any notion of global state: it carries the
//! read-only content snapshot and the cell-to-block scratch map, lives for
//! one parse, and is dropped with it.

use std::collections::HashMap;

use crate::geometry::GridPoint;
use crate::grid::FilledCell;

/// Read-only content snapshot plus block-ownership scratch map for one parse.
#[derive(Debug, Clone)]
pub struct ParseContext {
    contents: HashMap<GridPoint, String>,
    row_count: usize,
    col_count: usize,
    cell_to_block: HashMap<GridPoint, usize>,
}

impl ParseContext {
    /// Snapshot the filled set. Grid dimensions clamp ring computations.
    pub fn new(filled: &[FilledCell], row_count: usize, col_count: usize) -> Self {
        let contents = filled
            .iter()
            .map(|cell| (cell.point(), cell.value.clone()))
            .collect();
        Self {
            contents,
            row_count,
            col_count,
            cell_to_block: HashMap::new(),
        }
    }

    /// Raw value at `point`, `""` when unfilled.
    pub fn content(&self, point: GridPoint) -> &str {
        self.contents.get(&point).map_or("", String::as_str)
    }

    /// Display value at `point` (trimmed).
    pub fn trimmed(&self, point: GridPoint) -> &str {
        self.content(point).trim()
    }

    /// Whether `point` holds a filled cell.
    pub fn is_filled(&self, point: GridPoint) -> bool {
        self.contents.contains_key(&point)
    }

    /// Number of rows in the source grid.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns in the source grid.
    pub fn col_count(&self) -> usize {
        self.col_count
    }

    /// Record that `point` belongs to block `block_id`.
    pub fn assign_block(&mut self, point: GridPoint, block_id: usize) {
        self.cell_to_block.insert(point, block_id);
    }

    /// The block owning `point`, if any.
    pub fn block_of(&self, point: GridPoint) -> Option<usize> {
        self.cell_to_block.get(&point).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_lookup() {
        let filled = vec![
            FilledCell::new(1, 1, "a").unwrap(),
            FilledCell::new(2, 3, "  b ").unwrap(),
        ];
        let ctx = ParseContext::new(&filled, 5, 5);
        assert_eq!(ctx.content(GridPoint::new(2, 3)), "  b ");
        assert_eq!(ctx.trimmed(GridPoint::new(2, 3)), "b");
        assert_eq!(ctx.content(GridPoint::new(4, 4)), "");
        assert!(ctx.is_filled(GridPoint::new(1, 1)));
    }

    #[test]
    fn test_block_assignment() {
        let ctx_filled = vec![FilledCell::new(1, 1, "a").unwrap()];
        let mut ctx = ParseContext::new(&ctx_filled, 2, 2);
        let p = GridPoint::new(1, 1);
        ctx.assign_block(p, 7);
        assert_eq!(ctx.block_of(p), Some(7));
        assert_eq!(ctx.block_of(GridPoint::new(2, 2)), None);
    }
}
