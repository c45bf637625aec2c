//! Block joins and block clusters
//!
//! Two blocks whose border/frame rings intersect form a join: locked when
//! a border meets the other's frame, linked when only the frames meet.
//! Block clusters are the connected components of the join graph,
//! aggregating the member joins' cell sets.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::geometry::{GridPoint, GridRect};
use crate::parser::blocks::Block;

/// How two blocks' rings intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    /// Only the frames overlap
    Linked,
    /// A border overlaps the other block's frame
    Locked,
}

/// A join between two blocks, identified by their indices in the parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockJoin {
    /// Indices of the joined blocks, lower first
    pub blocks: (usize, usize),
    /// Linked or locked
    pub kind: JoinKind,
    /// Frame-frame overlap cells
    pub linked_cells: BTreeSet<GridPoint>,
    /// Border-frame overlap cells (empty for linked joins)
    pub locked_cells: BTreeSet<GridPoint>,
}

/// A connected group of blocks under the join relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockCluster {
    /// Indices of member blocks, ascending
    pub block_ids: Vec<usize>,
    /// Indices of member joins, ascending
    pub join_ids: Vec<usize>,
    /// Envelope over the member blocks' canvases
    pub canvas_bounds: GridRect,
    /// Deduplicated linked cells of the member joins
    pub linked_cells: BTreeSet<GridPoint>,
    /// Deduplicated locked cells of the member joins
    pub locked_cells: BTreeSet<GridPoint>,
}

/// Detect the joins of every unordered block pair.
pub fn detect_joins(blocks: &[Block]) -> Vec<BlockJoin> {
    let mut joins = Vec::new();
    for a in 0..blocks.len() {
        for b in a + 1..blocks.len() {
            if let Some(join) = join_between(blocks, a, b) {
                joins.push(join);
            }
        }
    }
    joins
}

fn join_between(blocks: &[Block], a: usize, b: usize) -> Option<BlockJoin> {
    let frame_frame: BTreeSet<GridPoint> = blocks[a]
        .frame
        .intersection(&blocks[b].frame)
        .copied()
        .collect();
    let border_frame: BTreeSet<GridPoint> = blocks[a]
        .border
        .intersection(&blocks[b].frame)
        .chain(blocks[a].frame.intersection(&blocks[b].border))
        .copied()
        .collect();

    if !border_frame.is_empty() {
        Some(BlockJoin {
            blocks: (a, b),
            kind: JoinKind::Locked,
            linked_cells: frame_frame,
            locked_cells: border_frame,
        })
    } else if !frame_frame.is_empty() {
        Some(BlockJoin {
            blocks: (a, b),
            kind: JoinKind::Linked,
            linked_cells: frame_frame,
            locked_cells: BTreeSet::new(),
        })
    } else {
        None
    }
}

/// Group blocks into clusters: connected components of the join graph.
///
/// Every block lands in exactly one cluster; blocks without joins form
/// singleton clusters.
pub fn cluster_blocks(blocks: &[Block], joins: &[BlockJoin]) -> Vec<BlockCluster> {
    let mut assigned = vec![false; blocks.len()];
    let mut clusters = Vec::new();

    for start in 0..blocks.len() {
        if assigned[start] {
            continue;
        }
        let mut members = BTreeSet::new();
        let mut queue = VecDeque::from([start]);
        assigned[start] = true;
        while let Some(block) = queue.pop_front() {
            members.insert(block);
            for join in joins {
                let neighbor = match join.blocks {
                    (a, b) if a == block => b,
                    (a, b) if b == block => a,
                    _ => continue,
                };
                if !assigned[neighbor] {
                    assigned[neighbor] = true;
                    queue.push_back(neighbor);
                }
            }
        }

        let join_ids: Vec<usize> = joins
            .iter()
            .enumerate()
            .filter(|(_, join)| members.contains(&join.blocks.0))
            .map(|(id, _)| id)
            .collect();

        let canvas_bounds = members
            .iter()
            .map(|&id| blocks[id].bounds)
            .reduce(|acc, bounds| acc.union(&bounds))
            .expect("cluster has at least one block");
        let linked_cells = join_ids
            .iter()
            .flat_map(|&id| joins[id].linked_cells.iter().copied())
            .collect();
        let locked_cells = join_ids
            .iter()
            .flat_map(|&id| joins[id].locked_cells.iter().copied())
            .collect();

        clusters.push(BlockCluster {
            block_ids: members.into_iter().collect(),
            join_ids,
            canvas_bounds,
            linked_cells,
            locked_cells,
        });
    }

    clusters
}
