//! Key-value construct builder
//!
//! Window key 9: a main header on the diagonal's first cell, keys along the
//! second column (vertical) or second row (transposed), and values extending
//! away from each key.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::constructs::{Detection, Orientation};
use crate::error::{Result, TextruxError};
use crate::geometry::{GridPoint, GridRect};
use crate::parser::ParseContext;

/// One key-value cell (main header, key, or value).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KvCell {
    /// Cell position
    pub point: GridPoint,
    /// Trimmed content
    pub content: String,
}

/// A key together with its values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValuePair {
    /// The key cell
    pub key: KvCell,
    /// Value cells, in grid order away from the key
    pub values: Vec<KvCell>,
}

/// A built key-value construct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    /// Bounding rectangle
    pub bounds: GridRect,
    /// Detection key
    pub key: u8,
    /// Reading direction: regular keys run down, transposed keys run right
    pub orientation: Orientation,
    /// Optional header at the top-left corner
    pub main_header: Option<KvCell>,
    /// All key cells
    pub key_cells: Vec<KvCell>,
    /// All value cells
    pub value_cells: Vec<KvCell>,
    /// Keys paired with their values
    pub pairs: Vec<KeyValuePair>,
}

impl KeyValue {
    /// Values of every pair whose key content equals `key`, in pair order.
    pub fn values_for_key(&self, key: &str) -> Vec<&KvCell> {
        self.pairs
            .iter()
            .filter(|pair| pair.key.content == key)
            .flat_map(|pair| pair.values.iter())
            .collect()
    }
}

/// Build a key-value construct from the cluster's filled cells.
pub fn build_key_value(
    bounds: GridRect,
    filled: &BTreeSet<GridPoint>,
    detection: &Detection,
    ctx: &ParseContext,
) -> Result<KeyValue> {
    if filled.is_empty() {
        return Err(TextruxError::EmptyCluster);
    }

    let make_cell = |point: GridPoint| KvCell {
        point,
        content: ctx.trimmed(point).to_string(),
    };

    let corner = bounds.top_left();
    let main_header = filled.contains(&corner).then(|| make_cell(corner));

    let pairs: Vec<KeyValuePair> = match detection.orientation {
        Orientation::Regular => {
            let key_col = bounds.left_col + 1;
            (bounds.top_row + 1..=bounds.bottom_row)
                .map(|row| GridPoint::new(row, key_col))
                .filter(|p| filled.contains(p))
                .map(|key_point| KeyValuePair {
                    key: make_cell(key_point),
                    values: (key_col + 1..=bounds.right_col)
                        .map(|col| GridPoint::new(key_point.row, col))
                        .filter(|p| filled.contains(p))
                        .map(make_cell)
                        .collect(),
                })
                .collect()
        }
        Orientation::Transposed => {
            let key_row = bounds.top_row + 1;
            (bounds.left_col + 1..=bounds.right_col)
                .map(|col| GridPoint::new(key_row, col))
                .filter(|p| filled.contains(p))
                .map(|key_point| KeyValuePair {
                    key: make_cell(key_point),
                    values: (key_row + 1..=bounds.bottom_row)
                        .map(|row| GridPoint::new(row, key_point.col))
                        .filter(|p| filled.contains(p))
                        .map(make_cell)
                        .collect(),
                })
                .collect()
        }
    };

    let key_cells = pairs.iter().map(|p| p.key.clone()).collect();
    let value_cells = pairs
        .iter()
        .flat_map(|p| p.values.iter().cloned())
        .collect();

    Ok(KeyValue {
        bounds,
        key: detection.key,
        orientation: detection.orientation,
        main_header,
        key_cells,
        value_cells,
        pairs,
    })
}
