//! List construct builder
//!
//! A list is a cluster confined to a single row or column: the first cell
//! is the header, every following filled cell is an item with a 0-based
//! index.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::constructs::{Detection, Orientation};
use crate::error::{Result, TextruxError};
use crate::geometry::{GridPoint, GridRect};
use crate::parser::ParseContext;

/// One list cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    /// 0-based item index
    pub index: usize,
    /// Cell position
    pub point: GridPoint,
    /// Trimmed content
    pub content: String,
}

/// A built list construct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    /// Bounding rectangle
    pub bounds: GridRect,
    /// Detection key
    pub key: u8,
    /// Regular lists run down a column, transposed lists run along a row
    pub orientation: Orientation,
    /// The first cell
    pub header: Option<ListItem>,
    /// Items after the header, in natural order
    pub items: Vec<ListItem>,
}

impl List {
    /// Where the next item would go: one step past the last item (or past
    /// the header for an empty list), continuing the list contiguously.
    pub fn next_item_position(&self) -> GridPoint {
        let last = self
            .items
            .last()
            .map(|item| item.point)
            .or_else(|| self.header.as_ref().map(|h| h.point))
            .unwrap_or_else(|| self.bounds.top_left());
        match self.orientation {
            Orientation::Regular => GridPoint::new(last.row + 1, last.col),
            Orientation::Transposed => GridPoint::new(last.row, last.col + 1),
        }
    }
}

/// Build a list from the cluster's filled cells.
pub fn build_list(
    bounds: GridRect,
    filled: &BTreeSet<GridPoint>,
    detection: &Detection,
    ctx: &ParseContext,
) -> Result<List> {
    if filled.is_empty() {
        return Err(TextruxError::EmptyCluster);
    }

    // Natural order: column-major for vertical lists, row-major for
    // horizontal ones. The BTreeSet is already row-major, which coincides
    // with both for single-line clusters.
    let mut cells = filled.iter().copied();
    let Some(header_point) = cells.next() else {
        return Err(TextruxError::EmptyCluster);
    };

    let make = |index: usize, point: GridPoint| ListItem {
        index,
        point,
        content: ctx.trimmed(point).to_string(),
    };

    let header = Some(make(0, header_point));
    let items = cells
        .enumerate()
        .map(|(index, point)| make(index, point))
        .collect();

    Ok(List {
        bounds,
        key: detection.key,
        orientation: detection.orientation,
        header,
        items,
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
    fn test_horizontal_list() {
        let (ctx, points) = context(&[
            (1, 1, "Fruits"),
            (1, 2, "Apple"),
            (1, 3, "Banana"),
            (1, 4, "Cherry"),
        ]);
        let bounds = GridRect::new(1, 1, 1, 4);
        let detection = detect_cluster(bounds, &points, &ctx, None).unwrap();
        let list = build_list(bounds, &points, &detection, &ctx).unwrap();

        assert_eq!(list.orientation, Orientation::Transposed);
        assert_eq!(list.header.as_ref().unwrap().content, "Fruits");
        let contents: Vec<&str> = list.items.iter().map(|i| i.content.as_str()).collect();
        assert_eq!(contents, vec!["Apple", "Banana", "Cherry"]);
        let indices: Vec<usize> = list.items.iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_vertical_list_next_position() {
        let (ctx, points) = context(&[(2, 3, "Tasks"), (3, 3, "one"), (4, 3, "two")]);
        let bounds = GridRect::new(2, 4, 3, 3);
        let detection = detect_cluster(bounds, &points, &ctx, None).unwrap();
        let list = build_list(bounds, &points, &detection, &ctx).unwrap();

        assert_eq!(list.orientation, Orientation::Regular);
        assert_eq!(list.next_item_position(), GridPoint::new(5, 3));
    }

    #[test]
    fn test_single_cell_list() {
        let (ctx, points) = context(&[(1, 1, "Lonely")]);
        let bounds = GridRect::new(1, 1, 1, 1);
        let detection = detect_cluster(bounds, &points, &ctx, None).unwrap();
        let list = build_list(bounds, &points, &detection, &ctx).unwrap();

        assert_eq!(list.header.as_ref().unwrap().content, "Lonely");
        assert!(list.items.is_empty());
        assert_eq!(list.next_item_position(), GridPoint::new(2, 1));
    }

    #[test]
    fn test_gapped_horizontal_list_keeps_order() {
        let (ctx, points) = context(&[(1, 1, "H"), (1, 3, "a"), (1, 5, "b")]);
        let bounds = GridRect::new(1, 1, 1, 5);
        let detection = detect_cluster(bounds, &points, &ctx, None).unwrap();
        let list = build_list(bounds, &points, &detection, &ctx).unwrap();

        assert_eq!(list.items.len(), 2);
        // Next position extends from the last actual item.
        assert_eq!(list.next_item_position(), GridPoint::new(1, 6));
    }
}
