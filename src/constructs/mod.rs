//! Construct model
//!
//! A construct is the typed structural interpretation of one cell cluster:
//! table, matrix, key-value, list, or tree. Constructs are immutable value
//! records produced by the builders in this module and dispatched by tag.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::geometry::GridRect;

pub mod detect;
pub mod domain;
pub mod key_value;
pub mod list;
pub mod matrix;
pub mod table;
pub mod tree;

pub use detect::{Detection, detect_cluster, window_key};
pub use domain::DomainRegion;
pub use key_value::{KeyValue, KeyValuePair, KvCell};
pub use list::{List, ListItem};
pub use matrix::{Matrix, MatrixCell, MatrixCellType, MatrixEntity};
pub use table::{Table, TableAttribute, TableCell, TableCellType, TableEntity};
pub use tree::{ElementId, Tree, TreeElement};

/// The five construct variants a cluster can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstructKind {
    Table,
    Matrix,
    KeyValue,
    List,
    Tree,
}

impl ConstructKind {
    /// Stable lowercase identifier used in key patterns and diagnostics.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Matrix => "matrix",
            Self::KeyValue => "key-value",
            Self::List => "list",
            Self::Tree => "tree",
        }
    }
}

impl std::fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// Reading direction of a construct.
///
/// `Regular` is vertical growth (vertical list, vertical key-value, top-down
/// tree); `Transposed` is the row/column mirror.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Regular,
    Transposed,
}

impl Orientation {
    pub fn is_regular(&self) -> bool {
        matches!(self, Self::Regular)
    }

    /// The opposite orientation.
    pub fn flipped(&self) -> Orientation {
        match self {
            Self::Regular => Self::Transposed,
            Self::Transposed => Self::Regular,
        }
    }
}

/// A fully built construct, tagged by variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Construct {
    Table(Table),
    Matrix(Matrix),
    KeyValue(KeyValue),
    List(List),
    Tree(Tree),
}

impl Construct {
    /// Which variant this is.
    pub fn kind(&self) -> ConstructKind {
        match self {
            Self::Table(_) => ConstructKind::Table,
            Self::Matrix(_) => ConstructKind::Matrix,
            Self::KeyValue(_) => ConstructKind::KeyValue,
            Self::List(_) => ConstructKind::List,
            Self::Tree(_) => ConstructKind::Tree,
        }
    }

    /// Bounding rectangle of the construct.
    pub fn bounds(&self) -> GridRect {
        match self {
            Self::Table(t) => t.bounds,
            Self::Matrix(m) => m.bounds,
            Self::KeyValue(kv) => kv.bounds,
            Self::List(l) => l.bounds,
            Self::Tree(t) => t.bounds,
        }
    }

    /// The 4-bit detection key the construct was classified from.
    pub fn key(&self) -> u8 {
        match self {
            Self::Table(t) => t.key,
            Self::Matrix(m) => m.key,
            Self::KeyValue(kv) => kv.key,
            Self::List(l) => l.key,
            Self::Tree(t) => t.key,
        }
    }

    /// Diagnostic key pattern of the form `core-<type>-key-<n>`.
    pub fn key_pattern(&self) -> String {
        format!("core-{}-key-{}", self.kind().slug(), self.key())
    }

    /// One-line human description, used by the CLI summary view.
    pub fn summary(&self) -> String {
        match self {
            Self::Table(t) => format!(
                "table {}x{} ({} entities, {} attributes)",
                t.bounds.height(),
                t.bounds.width(),
                t.entities.len(),
                t.attributes.len()
            ),
            Self::Matrix(m) => format!(
                "matrix {}x{} ({} primary, {} secondary)",
                m.bounds.height(),
                m.bounds.width(),
                m.primary_entities.len(),
                m.secondary_entities.len()
            ),
            Self::KeyValue(kv) => format!("key-value ({} pairs)", kv.pairs.len()),
            Self::List(l) => format!(
                "{} list ({} items)",
                if l.orientation.is_regular() { "vertical" } else { "horizontal" },
                l.items.len()
            ),
            Self::Tree(t) => format!(
                "tree ({} elements, {} nested constructs)",
                t.elements.len(),
                t.child_constructs.len()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_slugs() {
        assert_eq!(ConstructKind::KeyValue.slug(), "key-value");
        assert_eq!(ConstructKind::Tree.to_string(), "tree");
    }

    #[test]
    fn test_orientation_flip() {
        assert_eq!(Orientation::Regular.flipped(), Orientation::Transposed);
        assert!(Orientation::Transposed.flipped().is_regular());
    }
}
