//! Property-based tests for the parse invariants
//!
//! Random sparse grids must uphold the structural invariants regardless of
//! shape: block partitioning, block separation, canvas coverage, cluster
//! containment, determinism, and codec round-trips.

use std::collections::BTreeMap;

use proptest::prelude::*;
use textrux::{
    Delimiter, FilledCell, GridPoint, GridSource, InMemoryGrid, ParserConfig, SpatialParser,
    parse_grid, write_grid,
};

fn sequential_parser() -> SpatialParser {
    SpatialParser::with_config(ParserConfig {
        parallel: false,
        ..ParserConfig::default()
    })
    .unwrap()
}

/// Up to 24 filled cells on a 12x12 grid with short plain values.
fn sparse_cells() -> impl Strategy<Value = BTreeMap<(usize, usize), String>> {
    prop::collection::btree_map((1usize..=12, 1usize..=12), "[a-z][a-z0-9]{0,5}", 0..24)
}

/// Values that exercise codec escaping: separators, quotes, spaces.
fn tricky_cells() -> impl Strategy<Value = BTreeMap<(usize, usize), String>> {
    prop::collection::btree_map((1usize..=8, 1usize..=8), "[a-z][a-z0-9 ,\"]{0,6}", 1..12)
}

fn to_filled(cells: &BTreeMap<(usize, usize), String>) -> Vec<FilledCell> {
    cells
        .iter()
        .map(|(&(row, col), value)| FilledCell::new(row, col, value.clone()).unwrap())
        .collect()
}

proptest! {
    #[test]
    fn every_filled_cell_in_exactly_one_block(cells in sparse_cells()) {
        let result = sequential_parser().parse_cells(to_filled(&cells)).unwrap();
        for &(row, col) in cells.keys() {
            let owners = result
                .blocks
                .iter()
                .filter(|b| b.canvas_filled.contains(&GridPoint::new(row, col)))
                .count();
            prop_assert_eq!(owners, 1);
        }
    }

    #[test]
    fn distinct_blocks_keep_their_distance(cells in sparse_cells()) {
        let result = sequential_parser().parse_cells(to_filled(&cells)).unwrap();
        for i in 0..result.blocks.len() {
            for j in i + 1..result.blocks.len() {
                let a = &result.blocks[i].bounds;
                let b = &result.blocks[j].bounds;
                prop_assert!(a.row_gap(b) >= 2 || a.col_gap(b) >= 2);
            }
        }
    }

    #[test]
    fn canvas_partition_covers_every_bbox_cell(cells in sparse_cells()) {
        let result = sequential_parser().parse_cells(to_filled(&cells)).unwrap();
        for block in &result.blocks {
            prop_assert!(block.canvas_filled.is_disjoint(&block.canvas_empty));
            let covered = block.canvas_filled.len() + block.canvas_empty.len();
            prop_assert_eq!(covered, block.bounds.area());
        }
    }

    #[test]
    fn clusters_stay_inside_their_block(cells in sparse_cells()) {
        let result = sequential_parser().parse_cells(to_filled(&cells)).unwrap();
        for block in &result.blocks {
            for cluster in &block.cell_clusters {
                prop_assert!(cluster.filled_points.is_subset(&block.canvas_filled));
                prop_assert!(block.bounds.contains(cluster.bounds.top_left()));
                prop_assert!(block.bounds.contains(GridPoint::new(
                    cluster.bounds.bottom_row,
                    cluster.bounds.right_col,
                )));
            }
        }
    }

    #[test]
    fn parsing_twice_is_deterministic(cells in sparse_cells()) {
        let parser = sequential_parser();
        let first = parser.parse_cells(to_filled(&cells)).unwrap();
        let second = parser.parse_cells(to_filled(&cells)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn block_clusters_partition_blocks(cells in sparse_cells()) {
        let result = sequential_parser().parse_cells(to_filled(&cells)).unwrap();
        let mut seen = std::collections::BTreeSet::new();
        for cluster in &result.block_clusters {
            for &id in &cluster.block_ids {
                prop_assert!(seen.insert(id));
            }
        }
        prop_assert_eq!(seen.len(), result.blocks.len());
    }

    #[test]
    fn codec_round_trips_filled_cells(cells in tricky_cells()) {
        let mut grid = InMemoryGrid::default();
        for (&(row, col), value) in &cells {
            grid.set_cell(row, col, value.clone()).unwrap();
        }

        let text = write_grid(&grid, Delimiter::Comma);
        let reparsed = parse_grid(&text, Delimiter::Comma).unwrap();

        for (&(row, col), value) in &cells {
            prop_assert_eq!(reparsed.cell(row, col), value.as_str());
        }
        prop_assert_eq!(reparsed.filled_count(), grid.filled_count());
    }
}
