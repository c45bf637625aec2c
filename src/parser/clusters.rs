//! Cell-cluster detection
//!
//! Within a block's canvas, filled cells regroup into cell clusters. The
//! defining proximity semantics is the expand-by-1-then-overlap rule:
//! filled lumps merge directly when their bounding boxes touch, and
//! indirectly when an empty lump's expanded bounding box bridges both of
//! their expanded bounding boxes. The pass repeats until stable.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::constructs::Construct;
use crate::geometry::{GridPoint, GridRect};
use crate::parser::blocks::connected_components;

/// A sub-group of a block's filled cells, carrying its construct once the
/// detection stage has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellCluster {
    /// Envelope of the cluster's filled cells
    pub bounds: GridRect,
    /// Filled cells, a subset of the owning block's canvas
    pub filled_points: BTreeSet<GridPoint>,
    /// Empty cells inside the envelope
    pub cluster_empty: BTreeSet<GridPoint>,
    /// Detection key, set by the construct stage
    pub key: Option<u8>,
    /// The construct this cluster resolved to
    pub construct: Option<Construct>,
}

impl CellCluster {
    fn from_points(filled_points: BTreeSet<GridPoint>, canvas_empty: &BTreeSet<GridPoint>) -> Self {
        let bounds = GridRect::from_points(filled_points.iter().copied())
            .expect("cluster built from at least one cell");
        let cluster_empty = bounds
            .cells()
            .filter(|p| canvas_empty.contains(p))
            .collect();
        Self {
            bounds,
            filled_points,
            cluster_empty,
            key: None,
            construct: None,
        }
    }
}

/// Working lump: a point set plus its envelope.
#[derive(Debug, Clone)]
struct Lump {
    points: BTreeSet<GridPoint>,
    bounds: GridRect,
}

impl Lump {
    fn new(points: BTreeSet<GridPoint>) -> Self {
        let bounds = GridRect::from_points(points.iter().copied())
            .expect("lump built from at least one cell");
        Self { points, bounds }
    }

    fn absorb(&mut self, other: Lump) {
        self.points.extend(other.points);
        self.bounds = self.bounds.union(&other.bounds);
    }
}

/// Detect the cell clusters of one block's canvas.
pub fn detect_cell_clusters(
    canvas_filled: &BTreeSet<GridPoint>,
    canvas_empty: &BTreeSet<GridPoint>,
) -> Vec<CellCluster> {
    let mut lumps: Vec<Lump> = connected_components(canvas_filled)
        .into_iter()
        .map(Lump::new)
        .collect();
    let empty_lumps: Vec<Lump> = connected_components(canvas_empty)
        .into_iter()
        .map(Lump::new)
        .collect();

    // Stabilization loop: direct proximity-1 merges and empty-lump
    // bridging both shrink the lump list; repeat until neither applies.
    loop {
        if let Some((keep, remove)) = direct_pair(&lumps) {
            let absorbed = lumps.swap_remove(remove);
            lumps[keep].absorb(absorbed);
            continue;
        }
        if let Some((keep, remove)) = bridged_pair(&lumps, &empty_lumps) {
            let absorbed = lumps.swap_remove(remove);
            lumps[keep].absorb(absorbed);
            continue;
        }
        break;
    }

    let mut clusters: Vec<CellCluster> = lumps
        .into_iter()
        .map(|lump| CellCluster::from_points(lump.points, canvas_empty))
        .collect();
    clusters.sort_by_key(|c| (c.bounds.top_row, c.bounds.left_col));
    clusters
}

/// Two filled lumps whose envelopes touch or overlap.
fn direct_pair(lumps: &[Lump]) -> Option<(usize, usize)> {
    for i in 0..lumps.len() {
        for j in i + 1..lumps.len() {
            if lumps[i].bounds.within_proximity(&lumps[j].bounds, 1) {
                return Some((i, j));
            }
        }
    }
    None
}

/// Two filled lumps bridged by one empty lump under the
/// expand-by-1-then-overlap rule.
fn bridged_pair(lumps: &[Lump], empty_lumps: &[Lump]) -> Option<(usize, usize)> {
    for empty in empty_lumps {
        let reach = empty.bounds.expand(1);
        let mut touching = (0..lumps.len())
            .filter(|&i| lumps[i].bounds.expand(1).touches_or_intersects(&reach));
        let first = touching.next();
        let second = touching.next();
        if let (Some(i), Some(j)) = (first, second) {
            return Some((i, j));
        }
    }
    None
}
