//! Grid access layer
//!
//! The parser consumes a read-only [`GridSource`]; [`InMemoryGrid`] is the
//! bundled store for callers that assemble grids programmatically or through
//! the delimited codec.

mod filled;
mod source;

pub use filled::{FilledCell, collect_filled, filled_cells_from_pairs};
pub use source::{GridSource, InMemoryGrid};
