//! Key-based construct detection
//!
//! Every cell cluster is classified by the fill pattern of the 2x2 window
//! anchored at its top-left corner. The four fill bits form a key in 0..16;
//! three keys name a construct outright (table 15, matrix 7, key-value 9),
//! single-row and single-column shapes resolve to lists, and everything
//! else falls through to a tree.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::constructs::{ConstructKind, Orientation};
use crate::geometry::{GridPoint, GridRect};
use crate::parser::ParseContext;

/// Key of a fully filled 2x2 window (table).
pub const KEY_TABLE: u8 = 0b1111;
/// Key with an empty top-left corner (matrix).
pub const KEY_MATRIX: u8 = 0b0111;
/// Key with a filled diagonal (key-value).
pub const KEY_KEY_VALUE: u8 = 0b1001;

/// Outcome of cluster detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    /// The 4-bit window key
    pub key: u8,
    /// Selected construct variant
    pub kind: ConstructKind,
    /// Reading direction, where meaningful
    pub orientation: Orientation,
    /// Whether a tree's window indicates the child-header variant
    pub has_child_header: bool,
}

/// Compute the 4-bit key of the 2x2 window anchored at `top_left`.
///
/// Bit order, most significant first: `(r, c)`, `(r, c+1)`, `(r+1, c)`,
/// `(r+1, c+1)`.
pub fn window_key(filled: &BTreeSet<GridPoint>, top_left: GridPoint) -> u8 {
    let GridPoint { row, col } = top_left;
    let bit = |r: usize, c: usize| u8::from(filled.contains(&GridPoint::new(r, c)));
    (bit(row, col) << 3) | (bit(row, col + 1) << 2) | (bit(row + 1, col) << 1) | bit(row + 1, col + 1)
}

/// Indent depth encoded in leading spaces, two per level.
pub(crate) fn content_indent_level(raw: &str) -> usize {
    raw.chars().take_while(|&c| c == ' ').count() / 2
}

/// Classify a cluster. Returns `None` for an empty filled set.
///
/// `forced` pins the construct variant (used when reparsing tree domains);
/// orientation and key are still derived from the cells.
pub fn detect_cluster(
    bounds: GridRect,
    filled: &BTreeSet<GridPoint>,
    ctx: &ParseContext,
    forced: Option<ConstructKind>,
) -> Option<Detection> {
    if filled.is_empty() {
        return None;
    }

    let key = window_key(filled, bounds.top_left());

    if let Some(kind) = forced {
        return Some(resolve(kind, key, bounds, filled));
    }

    let kind = match key {
        KEY_TABLE => ConstructKind::Table,
        KEY_MATRIX => ConstructKind::Matrix,
        KEY_KEY_VALUE => ConstructKind::KeyValue,
        _ => {
            // Shape preconditions for lists are hard: a list is a single
            // row or column of plain cells. Leading-space indentation means
            // hierarchy, which makes a single line a tree instead.
            if bounds.height() == 1 || bounds.width() == 1 {
                let indented = filled
                    .iter()
                    .any(|&p| content_indent_level(ctx.content(p)) > 0);
                if indented {
                    ConstructKind::Tree
                } else {
                    ConstructKind::List
                }
            } else {
                ConstructKind::Tree
            }
        }
    };

    Some(resolve(kind, key, bounds, filled))
}

fn resolve(
    kind: ConstructKind,
    key: u8,
    bounds: GridRect,
    filled: &BTreeSet<GridPoint>,
) -> Detection {
    let orientation = match kind {
        ConstructKind::Table | ConstructKind::Matrix => Orientation::Regular,
        ConstructKind::KeyValue => key_value_orientation(bounds, filled),
        ConstructKind::List => {
            if bounds.height() == 1 && bounds.width() > 1 {
                Orientation::Transposed
            } else {
                Orientation::Regular
            }
        }
        ConstructKind::Tree => tree_orientation(bounds, filled),
    };

    let has_child_header = kind == ConstructKind::Tree
        && match orientation {
            Orientation::Regular => {
                filled.contains(&GridPoint::new(bounds.top_row, bounds.left_col + 1))
            }
            Orientation::Transposed => {
                filled.contains(&GridPoint::new(bounds.top_row + 1, bounds.left_col))
            }
        };

    Detection {
        key,
        kind,
        orientation,
        has_child_header,
    }
}

/// The key-value window is symmetric, so orientation falls to whichever
/// candidate key line carries more cells: the second column (vertical) or
/// the second row (transposed). Ties are vertical.
fn key_value_orientation(bounds: GridRect, filled: &BTreeSet<GridPoint>) -> Orientation {
    let key_col = bounds.left_col + 1;
    let key_row = bounds.top_row + 1;
    let column_keys = (key_row..=bounds.bottom_row)
        .filter(|&r| filled.contains(&GridPoint::new(r, key_col)))
        .count();
    let row_keys = (key_col..=bounds.right_col)
        .filter(|&c| filled.contains(&GridPoint::new(key_row, c)))
        .count();
    if row_keys > column_keys {
        Orientation::Transposed
    } else {
        Orientation::Regular
    }
}

/// A tree grows top-down (regular) when its anchor column carries more than
/// one cell. A populated anchor row alone is ambiguous: the child-header
/// variant of a regular tree also fills `(top, left+1)`, so the second
/// column and second row break the tie. Remaining ties are regular.
fn tree_orientation(bounds: GridRect, filled: &BTreeSet<GridPoint>) -> Orientation {
    let count_col = |col: usize| {
        (bounds.top_row..=bounds.bottom_row)
            .filter(|&r| filled.contains(&GridPoint::new(r, col)))
            .count()
    };
    let count_row = |row: usize| {
        (bounds.left_col..=bounds.right_col)
            .filter(|&c| filled.contains(&GridPoint::new(row, c)))
            .count()
    };

    if count_col(bounds.left_col) >= 2 {
        return Orientation::Regular;
    }
    if count_row(bounds.top_row) >= 2 {
        if count_col(bounds.left_col + 1) > count_row(bounds.top_row + 1) {
            return Orientation::Regular;
        }
        return Orientation::Transposed;
    }
    Orientation::Regular
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::FilledCell;

    fn fixture(cells: &[(usize, usize, &str)]) -> (ParseContext, BTreeSet<GridPoint>, GridRect) {
        let filled: Vec<FilledCell> = cells
            .iter()
            .map(|&(r, c, v)| FilledCell::new(r, c, v).unwrap())
            .collect();
        let points: BTreeSet<GridPoint> = filled.iter().map(FilledCell::point).collect();
        let bounds = GridRect::from_points(points.iter().copied()).unwrap();
        (ParseContext::new(&filled, 20, 20), points, bounds)
    }

    #[test]
    fn test_full_window_is_table() {
        let (ctx, points, bounds) =
            fixture(&[(1, 1, "a"), (1, 2, "b"), (2, 1, "c"), (2, 2, "d"), (3, 1, "e"), (3, 2, "f")]);
        let detection = detect_cluster(bounds, &points, &ctx, None).unwrap();
        assert_eq!(detection.key, 15);
        assert_eq!(detection.kind, ConstructKind::Table);
    }

    #[test]
    fn test_empty_corner_is_matrix() {
        let (ctx, points, bounds) =
            fixture(&[(1, 2, "x"), (1, 3, "y"), (2, 1, "a"), (2, 2, "1"), (2, 3, "2")]);
        let detection = detect_cluster(bounds, &points, &ctx, None).unwrap();
        assert_eq!(detection.key, 7);
        assert_eq!(detection.kind, ConstructKind::Matrix);
    }

    #[test]
    fn test_diagonal_is_key_value() {
        let (ctx, points, bounds) =
            fixture(&[(1, 1, "h"), (2, 2, "k1"), (2, 3, "v1"), (3, 2, "k2"), (3, 3, "v2")]);
        let detection = detect_cluster(bounds, &points, &ctx, None).unwrap();
        assert_eq!(detection.key, 9);
        assert_eq!(detection.kind, ConstructKind::KeyValue);
        assert_eq!(detection.orientation, Orientation::Regular);
    }

    #[test]
    fn test_transposed_key_value() {
        // Keys run along the second row, values below them.
        let (ctx, points, bounds) = fixture(&[
            (1, 1, "h"),
            (2, 2, "a"),
            (2, 3, "b"),
            (2, 4, "c"),
            (3, 2, "1"),
            (3, 3, "2"),
            (3, 4, "3"),
        ]);
        let detection = detect_cluster(bounds, &points, &ctx, None).unwrap();
        assert_eq!(detection.kind, ConstructKind::KeyValue);
        assert_eq!(detection.orientation, Orientation::Transposed);
    }

    #[test]
    fn test_single_row_is_horizontal_list() {
        let (ctx, points, bounds) = fixture(&[(1, 1, "h"), (1, 2, "a"), (1, 3, "b")]);
        let detection = detect_cluster(bounds, &points, &ctx, None).unwrap();
        assert_eq!(detection.kind, ConstructKind::List);
        assert_eq!(detection.orientation, Orientation::Transposed);
    }

    #[test]
    fn test_single_column_is_vertical_list() {
        let (ctx, points, bounds) = fixture(&[(1, 1, "h"), (2, 1, "a"), (3, 1, "b")]);
        let detection = detect_cluster(bounds, &points, &ctx, None).unwrap();
        assert_eq!(detection.kind, ConstructKind::List);
        assert_eq!(detection.orientation, Orientation::Regular);
    }

    #[test]
    fn test_indented_single_column_is_tree() {
        let (ctx, points, bounds) =
            fixture(&[(1, 1, "root"), (2, 1, "  child"), (3, 1, "    grand")]);
        let detection = detect_cluster(bounds, &points, &ctx, None).unwrap();
        assert_eq!(detection.kind, ConstructKind::Tree);
        assert_eq!(detection.orientation, Orientation::Regular);
    }

    #[test]
    fn test_indented_column_is_tree() {
        let (ctx, points, bounds) =
            fixture(&[(1, 1, "r"), (2, 1, "s"), (2, 2, "a"), (3, 2, "b"), (3, 3, "c")]);
        let detection = detect_cluster(bounds, &points, &ctx, None).unwrap();
        assert_eq!(detection.kind, ConstructKind::Tree);
        assert_eq!(detection.orientation, Orientation::Regular);
    }

    #[test]
    fn test_child_header_flag() {
        // Anchor and a header on the anchor's row, children below.
        let (ctx, points, bounds) =
            fixture(&[(1, 1, "r"), (1, 2, "hdr"), (2, 2, "a"), (3, 2, "b")]);
        let detection = detect_cluster(bounds, &points, &ctx, None).unwrap();
        assert_eq!(detection.kind, ConstructKind::Tree);
        assert_eq!(detection.orientation, Orientation::Regular);
        assert!(detection.has_child_header);
    }

    #[test]
    fn test_transposed_tree_orientation() {
        // One cell in the anchor column, several along the anchor row, and
        // the second row outweighs the second column.
        let (ctx, points, bounds) =
            fixture(&[(1, 1, "r"), (1, 2, "s"), (2, 2, "a"), (2, 3, "b")]);
        let detection = detect_cluster(bounds, &points, &ctx, None).unwrap();
        assert_eq!(detection.kind, ConstructKind::Tree);
        assert_eq!(detection.orientation, Orientation::Transposed);
    }

    #[test]
    fn test_forced_detection_wins() {
        let (ctx, points, bounds) =
            fixture(&[(1, 1, "a"), (1, 2, "b"), (2, 1, "c"), (2, 2, "d")]);
        let detection =
            detect_cluster(bounds, &points, &ctx, Some(ConstructKind::KeyValue)).unwrap();
        assert_eq!(detection.kind, ConstructKind::KeyValue);
        assert_eq!(detection.key, 15);
    }

    #[test]
    fn test_empty_cluster_detects_nothing() {
        let (ctx, _, _) = fixture(&[(1, 1, "x")]);
        let empty = BTreeSet::new();
        assert!(detect_cluster(GridRect::new(1, 1, 1, 1), &empty, &ctx, None).is_none());
    }

    #[test]
    fn test_single_cell_is_degenerate_list() {
        let (ctx, points, bounds) = fixture(&[(2, 2, "only")]);
        let detection = detect_cluster(bounds, &points, &ctx, None).unwrap();
        assert_eq!(detection.kind, ConstructKind::List);
        assert_eq!(detection.orientation, Orientation::Regular);
    }

    #[test]
    fn test_indent_level_parsing() {
        assert_eq!(content_indent_level("plain"), 0);
        assert_eq!(content_indent_level("  one"), 1);
        assert_eq!(content_indent_level("    two"), 2);
        assert_eq!(content_indent_level("   odd"), 1);
    }
}
