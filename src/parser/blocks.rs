//! Block discovery and finalization
//!
//! Filled cells group into blocks in two steps: an 8-neighbor flood fill
//! produces seed components, then components whose bounding boxes sit
//! within proximity 2 of each other merge until no pair qualifies. The
//! merge is commutative and associative, so the final partition does not
//! depend on input order.
//!
//! Finalization fills in the derived geometry: the canvas partition
//! (filled vs empty cells inside the bounding box), the border ring at
//! distance 1, and the frame ring at distance 2, both clipped to the grid
//! and excluding cells owned by other blocks.

use std::collections::{BTreeSet, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::geometry::{GridPoint, GridRect};
use crate::parser::ParseContext;
use crate::parser::clusters::{CellCluster, detect_cell_clusters};

/// Bounding-box proximity for block merging: gaps strictly below this merge.
pub const BLOCK_PROXIMITY: usize = 2;

/// A maximal group of filled cells under proximity-2 bounding-box adjacency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Bounding box of the filled cells
    pub bounds: GridRect,
    /// Filled cells inside the bounding box
    pub canvas_filled: BTreeSet<GridPoint>,
    /// Empty cells inside the bounding box
    pub canvas_empty: BTreeSet<GridPoint>,
    /// Ring of cells at distance 1 outside the bounding box
    pub border: BTreeSet<GridPoint>,
    /// Ring of cells at distance 2 outside the bounding box
    pub frame: BTreeSet<GridPoint>,
    /// Cell clusters detected on the canvas
    pub cell_clusters: Vec<CellCluster>,
    /// Empty cells inside any cluster's bounds
    pub cluster_empty: BTreeSet<GridPoint>,
}

impl Block {
    fn seed(canvas_filled: BTreeSet<GridPoint>) -> Self {
        let bounds = GridRect::from_points(canvas_filled.iter().copied())
            .expect("block seeded from at least one cell");
        Self {
            bounds,
            canvas_filled,
            canvas_empty: BTreeSet::new(),
            border: BTreeSet::new(),
            frame: BTreeSet::new(),
            cell_clusters: Vec::new(),
            cluster_empty: BTreeSet::new(),
        }
    }

    /// Union another block's cells into this one and regrow the bounds.
    fn absorb(&mut self, other: Block) {
        self.canvas_filled.extend(other.canvas_filled);
        self.bounds = self.bounds.union(&other.bounds);
    }

    /// Compute canvas partition, rings, and cell clusters.
    ///
    /// Ring cells belonging to another block's canvas are dropped, which
    /// keeps border and frame ownership disjoint across blocks.
    pub fn finalize(&mut self, ctx: &ParseContext) {
        self.canvas_empty = self
            .bounds
            .cells()
            .filter(|p| !self.canvas_filled.contains(p))
            .collect();

        let not_foreign = |p: &GridPoint| ctx.block_of(*p).is_none();
        self.border = self
            .bounds
            .ring(1, ctx.row_count(), ctx.col_count())
            .into_iter()
            .filter(not_foreign)
            .collect();
        self.frame = self
            .bounds
            .ring(2, ctx.row_count(), ctx.col_count())
            .into_iter()
            .filter(not_foreign)
            .collect();

        self.cell_clusters = detect_cell_clusters(&self.canvas_filled, &self.canvas_empty);
        self.cluster_empty = self
            .cell_clusters
            .iter()
            .flat_map(|cluster| cluster.cluster_empty.iter().copied())
            .collect();
    }
}

/// Group filled cells into blocks: 8-neighbor flood fill, then proximity-2
/// bounding-box merging to a fixed point.
pub fn discover_blocks(points: &BTreeSet<GridPoint>) -> Vec<Block> {
    let mut blocks: Vec<Block> = connected_components(points)
        .into_iter()
        .map(Block::seed)
        .collect();

    // Merge pass: restart the scan after every merge so transitively
    // reachable pairs are caught.
    loop {
        let Some((keep, remove)) = find_mergeable_pair(&blocks) else {
            break;
        };
        let absorbed = blocks.swap_remove(remove);
        blocks[keep].absorb(absorbed);
    }

    blocks.sort_by_key(|b| (b.bounds.top_row, b.bounds.left_col));
    tracing::debug!(blocks = blocks.len(), "block discovery complete");
    blocks
}

fn find_mergeable_pair(blocks: &[Block]) -> Option<(usize, usize)> {
    for i in 0..blocks.len() {
        for j in i + 1..blocks.len() {
            if blocks[i]
                .bounds
                .within_proximity(&blocks[j].bounds, BLOCK_PROXIMITY)
            {
                return Some((i, j));
            }
        }
    }
    None
}

/// 8-neighbor connected components over a point set.
pub(crate) fn connected_components(points: &BTreeSet<GridPoint>) -> Vec<BTreeSet<GridPoint>> {
    let mut visited: HashSet<GridPoint> = HashSet::new();
    let mut components = Vec::new();

    for &start in points {
        if visited.contains(&start) {
            continue;
        }
        let mut component = BTreeSet::new();
        let mut queue = VecDeque::from([start]);
        visited.insert(start);
        while let Some(point) = queue.pop_front() {
            component.insert(point);
            for neighbor in point.neighbors8() {
                if points.contains(&neighbor) && visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        components.push(component);
    }

    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::FilledCell;

    fn points(cells: &[(usize, usize)]) -> BTreeSet<GridPoint> {
        cells.iter().map(|&(r, c)| GridPoint::new(r, c)).collect()
    }

    fn context_for(cells: &BTreeSet<GridPoint>) -> ParseContext {
        let filled: Vec<FilledCell> = cells
            .iter()
            .map(|p| FilledCell::new(p.row, p.col, "x").unwrap())
            .collect();
        ParseContext::new(&filled, 50, 50)
    }

    #[test]
    fn test_adjacent_cells_one_block() {
        let blocks = discover_blocks(&points(&[(1, 1), (1, 2), (2, 2)]));
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].bounds, GridRect::new(1, 2, 1, 2));
    }

    #[test]
    fn test_gap_one_merges() {
        // One empty cell between the two: still one block.
        let blocks = discover_blocks(&points(&[(1, 1), (1, 3)]));
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_gap_two_stays_separate() {
        let blocks = discover_blocks(&points(&[(1, 1), (1, 4)]));
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_gap_three_stays_separate() {
        let blocks = discover_blocks(&points(&[(1, 1), (1, 5)]));
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_diagonal_proximity_merges() {
        // Bounding boxes one apart in both axes.
        let blocks = discover_blocks(&points(&[(1, 1), (3, 3)]));
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_transitive_merge() {
        // a-b within proximity, b-c within proximity: all three merge.
        let blocks = discover_blocks(&points(&[(1, 1), (1, 3), (1, 5)]));
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].canvas_filled.len(), 3);
    }

    #[test]
    fn test_empty_input_no_blocks() {
        assert!(discover_blocks(&BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_final_blocks_respect_separation() {
        let blocks = discover_blocks(&points(&[(1, 1), (1, 2), (5, 8), (6, 8), (1, 9)]));
        for i in 0..blocks.len() {
            for j in i + 1..blocks.len() {
                let row_gap = blocks[i].bounds.row_gap(&blocks[j].bounds);
                let col_gap = blocks[i].bounds.col_gap(&blocks[j].bounds);
                assert!(row_gap >= 2 || col_gap >= 2);
            }
        }
    }

    #[test]
    fn test_canvas_partition() {
        let cells = points(&[(1, 1), (1, 3), (2, 1), (2, 2), (2, 3)]);
        let ctx = context_for(&cells);
        let mut blocks = discover_blocks(&cells);
        assert_eq!(blocks.len(), 1);
        blocks[0].finalize(&ctx);

        let block = &blocks[0];
        assert_eq!(block.canvas_empty, points(&[(1, 2)]));
        let all: BTreeSet<GridPoint> = block
            .canvas_filled
            .union(&block.canvas_empty)
            .copied()
            .collect();
        assert_eq!(all, block.bounds.cells().collect());
    }

    #[test]
    fn test_rings_surround_block() {
        let cells = points(&[(3, 3), (3, 4), (4, 3), (4, 4)]);
        let ctx = context_for(&cells);
        let mut blocks = discover_blocks(&cells);
        blocks[0].finalize(&ctx);

        let block = &blocks[0];
        assert_eq!(block.border.len(), 12);
        assert_eq!(block.frame.len(), 20);
        assert!(block.border.iter().all(|p| !block.bounds.contains(*p)));
        assert!(block.frame.iter().all(|p| p.ring_distance(&block.bounds) == 2));
    }
}
