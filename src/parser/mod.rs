//! Spatial parse pipeline
//!
//! The parse is a pure function over an immutable snapshot of filled
//! cells: block discovery, per-block finalization, join detection, block
//! clustering, and per-cluster construct building. Blocks and clusters
//! are disjoint after discovery, so finalization and construct building
//! may fan out across threads; results are deterministic because every
//! stage sorts by grid position.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constructs::{
    Construct, ConstructKind, detect_cluster,
    key_value::build_key_value, list::build_list, matrix::build_matrix, table::build_table,
    tree::build_tree,
};
use crate::error::{Result, TextruxError};
use crate::geometry::GridPoint;
use crate::grid::{FilledCell, GridSource, collect_filled};

pub mod blocks;
pub mod clusters;
mod context;
pub mod joins;

pub use blocks::{BLOCK_PROXIMITY, Block, discover_blocks};
pub use clusters::{CellCluster, detect_cell_clusters};
pub use context::ParseContext;
pub use joins::{BlockCluster, BlockJoin, JoinKind, cluster_blocks, detect_joins};

/// Cooperative cancellation flag, polled between pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a fresh, untripped token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the token; the next stage boundary aborts the parse.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether the token has been tripped.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Fan block finalization and construct building out across threads
    pub parallel: bool,
    /// Worker threads used when `parallel` is on
    pub max_parallel: usize,
    /// Optional cancellation token polled between stages
    pub cancellation: Option<CancellationToken>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            max_parallel: num_cpus::get(),
            cancellation: None,
        }
    }
}

/// Output of a parse: blocks (owning their clusters and constructs),
/// joins, and block clusters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    /// Discovered blocks, sorted by position
    pub blocks: Vec<Block>,
    /// Joins between block pairs, sorted by block indices
    pub joins: Vec<BlockJoin>,
    /// Connected groups of joined blocks
    pub block_clusters: Vec<BlockCluster>,
}

impl ParseResult {
    /// Whether the grid held no filled cells.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All constructs, in block and cluster order.
    pub fn constructs(&self) -> impl Iterator<Item = &Construct> {
        self.blocks
            .iter()
            .flat_map(|block| block.cell_clusters.iter())
            .filter_map(|cluster| cluster.construct.as_ref())
    }

    /// Total number of cell clusters across all blocks.
    pub fn cluster_count(&self) -> usize {
        self.blocks.iter().map(|b| b.cell_clusters.len()).sum()
    }
}

/// The spatial parser.
///
/// Holds the configuration and, when parallelism is enabled, the worker
/// pool. Parsing never mutates the grid source.
pub struct SpatialParser {
    config: ParserConfig,
    pool: Option<rayon::ThreadPool>,
}

impl std::fmt::Debug for SpatialParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialParser")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for SpatialParser {
    fn default() -> Self {
        Self::new().expect("default parser configuration is valid")
    }
}

impl SpatialParser {
    /// Create a parser with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(ParserConfig::default())
    }

    /// Create a parser with a custom configuration.
    pub fn with_config(config: ParserConfig) -> Result<Self> {
        if config.parallel && config.max_parallel == 0 {
            return Err(TextruxError::InvalidOptions(
                "max_parallel must be at least 1".to_string(),
            ));
        }
        let pool = if config.parallel {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.max_parallel)
                .build()
                .map_err(|e| TextruxError::InvalidOptions(e.to_string()))?;
            Some(pool)
        } else {
            None
        };
        Ok(Self { config, pool })
    }

    /// The active configuration.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse every filled cell of a grid source.
    pub fn parse(&self, grid: &dyn GridSource) -> Result<ParseResult> {
        let filled = collect_filled(grid);
        self.parse_filled(filled, grid.row_count(), grid.col_count())
    }

    /// Parse an explicit filled set, without a backing grid store.
    ///
    /// Cells with zero coordinates are rejected, blank cells are skipped,
    /// and the grid extent is taken from the largest coordinates present.
    pub fn parse_cells(&self, cells: Vec<FilledCell>) -> Result<ParseResult> {
        let mut filled = Vec::with_capacity(cells.len());
        for cell in cells {
            if cell.row == 0 || cell.col == 0 {
                return Err(TextruxError::InvalidCoordinate {
                    row: cell.row,
                    col: cell.col,
                });
            }
            if !cell.value.trim().is_empty() {
                filled.push(cell);
            }
        }
        filled.sort_by_key(|c| (c.row, c.col));
        filled.dedup_by(|a, b| a.row == b.row && a.col == b.col);
        let rows = filled.iter().map(|c| c.row).max().unwrap_or(0);
        let cols = filled.iter().map(|c| c.col).max().unwrap_or(0);
        self.parse_filled(filled, rows, cols)
    }

    fn parse_filled(
        &self,
        filled: Vec<FilledCell>,
        rows: usize,
        cols: usize,
    ) -> Result<ParseResult> {
        let span = tracing::debug_span!("parse", cells = filled.len(), rows, cols);
        let _enter = span.enter();

        self.check_cancelled()?;
        let points: BTreeSet<GridPoint> = filled.iter().map(FilledCell::point).collect();
        let mut ctx = ParseContext::new(&filled, rows, cols);

        // Stage 1: block discovery.
        let mut blocks = discover_blocks(&points);
        self.check_cancelled()?;
        for (id, block) in blocks.iter().enumerate() {
            for &point in &block.canvas_filled {
                ctx.assign_block(point, id);
            }
        }

        // Stage 2: per-block finalization (canvas, rings, cell clusters).
        match &self.pool {
            Some(pool) => pool.install(|| {
                blocks.par_iter_mut().for_each(|block| block.finalize(&ctx));
            }),
            None => {
                for block in &mut blocks {
                    block.finalize(&ctx);
                    self.check_cancelled()?;
                }
            }
        }
        self.check_cancelled()?;

        // Stage 3: joins and block clusters.
        let joins = detect_joins(&blocks);
        let block_clusters = cluster_blocks(&blocks, &joins);
        self.check_cancelled()?;

        // Stage 4: construct detection and building, per cluster.
        match &self.pool {
            Some(pool) => pool.install(|| {
                blocks.par_iter_mut().for_each(|block| {
                    for cluster in &mut block.cell_clusters {
                        build_cluster_construct(cluster, &ctx);
                    }
                });
            }),
            None => {
                for block in &mut blocks {
                    for cluster in &mut block.cell_clusters {
                        build_cluster_construct(cluster, &ctx);
                        self.check_cancelled()?;
                    }
                }
            }
        }
        self.check_cancelled()?;

        tracing::info!(
            blocks = blocks.len(),
            joins = joins.len(),
            block_clusters = block_clusters.len(),
            constructs = blocks
                .iter()
                .flat_map(|b| b.cell_clusters.iter())
                .filter(|c| c.construct.is_some())
                .count(),
            "parse complete"
        );

        Ok(ParseResult {
            blocks,
            joins,
            block_clusters,
        })
    }

    fn check_cancelled(&self) -> Result<()> {
        if let Some(token) = &self.config.cancellation {
            if token.is_cancelled() {
                return Err(TextruxError::Cancelled);
            }
        }
        Ok(())
    }
}

/// Detect and build one cluster's construct. Empty clusters are skipped
/// silently; builder failures leave the cluster without a construct.
fn build_cluster_construct(cluster: &mut CellCluster, ctx: &ParseContext) {
    let Some(detection) = detect_cluster(cluster.bounds, &cluster.filled_points, ctx, None) else {
        return;
    };
    cluster.key = Some(detection.key);

    let built = match detection.kind {
        ConstructKind::Table => {
            build_table(cluster.bounds, &cluster.filled_points, &detection, ctx)
                .map(Construct::Table)
        }
        ConstructKind::Matrix => {
            build_matrix(cluster.bounds, &cluster.filled_points, &detection, ctx)
                .map(Construct::Matrix)
        }
        ConstructKind::KeyValue => {
            build_key_value(cluster.bounds, &cluster.filled_points, &detection, ctx)
                .map(Construct::KeyValue)
        }
        ConstructKind::List => {
            build_list(cluster.bounds, &cluster.filled_points, &detection, ctx)
                .map(Construct::List)
        }
        ConstructKind::Tree => {
            build_tree(cluster.bounds, &cluster.filled_points, &detection, ctx)
                .map(Construct::Tree)
        }
    };

    match built {
        Ok(construct) => cluster.construct = Some(construct),
        Err(err) => {
            tracing::warn!(%err, bounds = ?cluster.bounds, "construct build failed");
        }
    }
}
