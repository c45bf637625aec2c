//! Tree domain regions and nested construct parsing
//!
//! Each tree parent owns a rectangular domain: the subgrid holding its
//! descendants and value elements. A domain can host a nested construct
//! (table, matrix, or key-value); detection probes the domain's top-left
//! window and the parent's own line, and a synthetic cluster over the
//! domain is reparsed with the detection result forced. Failures are
//! contained: they mark the region unparsed without touching the outer
//! tree.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::constructs::detect::{KEY_KEY_VALUE, detect_cluster, window_key};
use crate::constructs::key_value::build_key_value;
use crate::constructs::matrix::build_matrix;
use crate::constructs::table::build_table;
use crate::constructs::{Construct, ConstructKind, Orientation};
use crate::error::{Result, TextruxError};
use crate::geometry::{GridPoint, GridRect};
use crate::parser::ParseContext;

/// Fewest filled cells a domain needs before a nested construct is attempted.
pub const MIN_NESTED_CELLS: usize = 4;

/// The rectangular subgrid owned by a tree parent element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRegion {
    /// Bounding rectangle; never contains the parent's own cell
    pub bounds: GridRect,
    /// Nested construct variant the domain was classified as, if any
    pub construct_kind: Option<ConstructKind>,
    /// The nested construct, when one was built
    pub nested_construct: Option<Box<Construct>>,
    /// False when a nested build was indicated but failed
    pub parsed_successfully: bool,
}

/// Classify what a parent's domain holds.
///
/// A key-value window at the domain corner wins; otherwise filled cells on
/// the parent's own line past its immediate neighbor indicate a 2-D
/// structure, with the neighbor cell splitting table (filled) from matrix
/// (empty). Anything else is a plain nested subtree.
pub(crate) fn detect_domain_kind(
    parent: GridPoint,
    domain: &GridRect,
    filled: &BTreeSet<GridPoint>,
    orientation: Orientation,
) -> Option<ConstructKind> {
    if window_key(filled, domain.top_left()) == KEY_KEY_VALUE {
        return Some(ConstructKind::KeyValue);
    }

    match orientation {
        Orientation::Regular => {
            let neighbor = GridPoint::new(parent.row, parent.col + 1);
            let two_dimensional = (parent.col + 2..=domain.right_col)
                .any(|col| filled.contains(&GridPoint::new(parent.row, col)));
            if two_dimensional {
                if filled.contains(&neighbor) {
                    Some(ConstructKind::Table)
                } else {
                    Some(ConstructKind::Matrix)
                }
            } else {
                None
            }
        }
        Orientation::Transposed => {
            let neighbor = GridPoint::new(parent.row + 1, parent.col);
            let two_dimensional = (parent.row + 2..=domain.bottom_row)
                .any(|row| filled.contains(&GridPoint::new(row, parent.col)));
            if two_dimensional {
                if filled.contains(&neighbor) {
                    Some(ConstructKind::Table)
                } else {
                    Some(ConstructKind::Matrix)
                }
            } else {
                None
            }
        }
    }
}

/// Reparse a domain as a synthetic cluster with a forced detection result.
pub(crate) fn build_nested(
    domain: &GridRect,
    cluster_filled: &BTreeSet<GridPoint>,
    kind: ConstructKind,
    ctx: &ParseContext,
) -> Result<Construct> {
    let sub_filled: BTreeSet<GridPoint> = cluster_filled
        .iter()
        .filter(|p| domain.contains(**p))
        .copied()
        .collect();

    if sub_filled.len() < MIN_NESTED_CELLS {
        return Err(TextruxError::nested_build_failed(format!(
            "domain holds {} filled cells, need at least {MIN_NESTED_CELLS}",
            sub_filled.len()
        )));
    }

    let detection = detect_cluster(*domain, &sub_filled, ctx, Some(kind))
        .ok_or_else(|| TextruxError::nested_build_failed("domain has no filled cells"))?;

    match kind {
        ConstructKind::Table => {
            build_table(*domain, &sub_filled, &detection, ctx).map(Construct::Table)
        }
        ConstructKind::Matrix => {
            build_matrix(*domain, &sub_filled, &detection, ctx).map(Construct::Matrix)
        }
        ConstructKind::KeyValue => {
            build_key_value(*domain, &sub_filled, &detection, ctx).map(Construct::KeyValue)
        }
        ConstructKind::List | ConstructKind::Tree => Err(TextruxError::nested_build_failed(
            format!("{kind} is not a nested domain construct"),
        )),
    }
}
