//! Grid codecs
//!
//! The parser consumes already-loaded cell data; this module is the
//! delimited-text collaborator that loads and stores it.

mod delimited;

pub use delimited::{Delimiter, parse_grid, write_grid};
