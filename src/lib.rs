//! # Textrux
//!
//! Spatial text structure parser: reads the layout of text on a sparse
//! 2-D grid as structured content. Filled cells group into blocks and cell
//! clusters by proximity, and every cluster resolves to a typed construct:
//! table, matrix, key-value, list, or tree (with nested constructs inside
//! tree domains).
//!
//! ## Quick Start
//!
//! ```rust
//! use textrux::{InMemoryGrid, SpatialParser};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut grid = InMemoryGrid::default();
//!     grid.set_cell(1, 1, "Name")?;
//!     grid.set_cell(1, 2, "Age")?;
//!     grid.set_cell(2, 1, "Ada")?;
//!     grid.set_cell(2, 2, "36")?;
//!
//!     let parser = SpatialParser::new()?;
//!     let result = parser.parse(&grid)?;
//!
//!     for construct in result.constructs() {
//!         println!("{} at {:?}", construct.key_pattern(), construct.bounds());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, missing_debug_implementations, rust_2024_compatibility)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod codec;
pub mod constructs;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod parser;

pub use codec::{Delimiter, parse_grid, write_grid};
pub use constructs::{
    Construct, ConstructKind, Detection, DomainRegion, ElementId, KeyValue, KeyValuePair, KvCell,
    List, ListItem, Matrix, MatrixCell, MatrixCellType, MatrixEntity, Orientation, Table,
    TableAttribute, TableCell, TableCellType, TableEntity, Tree, TreeElement,
};
pub use error::{Result, TextruxError};
pub use geometry::{GridPoint, GridRect};
pub use grid::{FilledCell, GridSource, InMemoryGrid, collect_filled};
pub use parser::{
    Block, BlockCluster, BlockJoin, CancellationToken, CellCluster, JoinKind, ParseContext,
    ParseResult, ParserConfig, SpatialParser,
};

/// Current version of the Textrux library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse a grid with a default-configured parser.
pub fn parse(grid: &dyn GridSource) -> Result<ParseResult> {
    SpatialParser::new()?.parse(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shortcut() {
        let mut grid = InMemoryGrid::default();
        grid.set_cell(1, 1, "x").unwrap();
        let result = parse(&grid).unwrap();
        assert_eq!(result.blocks.len(), 1);
    }

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
