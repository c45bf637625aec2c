//! Textrux CLI - parse delimited grids into spatial structures
//!
//! Loads a CSV/TSV file, runs the spatial parser, and prints what the
//! grid means: either a colored summary or the full parse as JSON.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use textrux::{Delimiter, GridSource, InMemoryGrid, SpatialParser, collect_filled, parse_grid};

#[derive(Parser)]
#[command(
    name = "textrux",
    version,
    about = "Spatial text structure parser",
    long_about = "Textrux reads the spatial arrangement of text on a grid as structured\n\
                  content: tables, matrices, key-value sets, lists, and trees."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a delimited grid file and describe its structures
    Parse {
        /// Input file path (.csv or .tsv)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "summary")]
        format: OutputFormatArg,

        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Show grid statistics without parsing structures
    Info {
        /// Input file path
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// List supported input formats
    Formats,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    /// Human-readable structure summary
    Summary,
    /// Full parse result as JSON
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else if cli.quiet {
        tracing::Level::ERROR
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    if let Err(e) = run_command(cli).await {
        eprintln!("{} {e:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}

async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Parse {
            input,
            format,
            pretty,
        } => {
            let grid = load_grid(&input).await?;

            let start = Instant::now();
            let parser = SpatialParser::new()?;
            let result = parser.parse(&grid)?;
            let duration = start.elapsed();

            match format {
                OutputFormatArg::Json => {
                    let json = if pretty {
                        serde_json::to_string_pretty(&result)?
                    } else {
                        serde_json::to_string(&result)?
                    };
                    println!("{json}");
                }
                OutputFormatArg::Summary => {
                    if !cli.quiet {
                        println!("{}", "Parsed grid structure".cyan().bold());
                        println!("  Input:  {}", input.display());
                        println!(
                            "  Blocks: {}  Joins: {}  Block clusters: {}",
                            result.blocks.len(),
                            result.joins.len(),
                            result.block_clusters.len()
                        );
                        println!();
                    }
                    for construct in result.constructs() {
                        let bounds = construct.bounds();
                        println!(
                            "{} {} {}",
                            construct.key_pattern().yellow(),
                            construct.summary().green(),
                            format!(
                                "R{}C{}..R{}C{}",
                                bounds.top_row, bounds.left_col, bounds.bottom_row, bounds.right_col
                            )
                            .dimmed()
                        );
                    }
                    if !cli.quiet {
                        println!();
                        println!("Completed in {duration:.2?}");
                    }
                }
            }
            Ok(())
        }

        Commands::Info { input } => {
            let grid = load_grid(&input).await?;
            let filled = collect_filled(&grid);
            println!("{}", "Grid info".cyan().bold());
            println!("  Rows:    {}", grid.row_count());
            println!("  Columns: {}", grid.col_count());
            println!("  Filled:  {}", filled.len());
            Ok(())
        }

        Commands::Formats => {
            println!("{}", "Supported input formats".cyan().bold());
            println!("  csv  comma-separated values");
            println!("  tsv  tab-separated values");
            Ok(())
        }
    }
}

async fn load_grid(input: &PathBuf) -> anyhow::Result<InMemoryGrid> {
    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    let delimiter = input
        .extension()
        .and_then(|e| e.to_str())
        .map(Delimiter::from_extension)
        .unwrap_or(Delimiter::Comma);
    let grid = parse_grid(&text, delimiter)
        .with_context(|| format!("parsing {}", input.display()))?;
    Ok(grid)
}
