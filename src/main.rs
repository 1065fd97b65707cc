//!
//! Fold attribute access in an expression tree.
//!
//! Usage: `attrfold [INPUT] [--config FILE] [--max-passes N] [--trace]`

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::{error, info};

use attrfold::config::OptimizerConfig;
use attrfold::ir::Expression;
use attrfold::ir::optimization::Optimizer;
use attrfold::logging::init_logger;

#[derive(Parser, Debug)]
#[command(name = "attrfold")]
#[command(version, about = "Simplify attribute lookups and builtin attribute calls in an expression tree")]
struct Args {
    /// Expression tree as JSON; reads stdin when omitted
    input: Option<PathBuf>,

    /// Optimizer config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the pass limit from the config
    #[arg(long = "max-passes")]
    max_passes: Option<usize>,

    /// Log level for stderr (otherwise RUST_LOG, then "info")
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Disable ANSI colors in stderr output
    #[arg(long = "no-color")]
    no_color: bool,

    /// Also write a DEBUG-level session log into this directory
    #[arg(long = "log-dir")]
    log_dir: Option<PathBuf>,

    /// Print the change log next to the optimized tree
    #[arg(long)]
    trace: bool,
}

fn read_tree(input: Option<&PathBuf>) -> Result<Arc<Expression>> {
    let text = match input {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).context("Failed to read stdin")?;
            buffer
        }
    };
    let tree: Expression = serde_json::from_str(&text).context("Input is not a valid expression tree")?;
    Ok(Arc::new(tree))
}

fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => OptimizerConfig::from_file(path)?,
        None => OptimizerConfig::default(),
    };
    if let Some(max_passes) = args.max_passes {
        anyhow::ensure!(max_passes > 0, "--max-passes must be at least 1");
        config.max_passes = max_passes;
    }
    config.record_changes |= args.trace;

    let tree = read_tree(args.input.as_ref())?;
    info!("Optimizing {} at {}", tree.kind(), tree.source_ref());

    let outcome = Optimizer::new(config).optimize(&tree)?;
    info!(
        "{} changes in {} passes (fixpoint: {})",
        outcome.changes.len(),
        outcome.passes,
        outcome.reached_fixpoint
    );

    let output = if args.trace {
        serde_json::to_string_pretty(&outcome)?
    } else {
        serde_json::to_string_pretty(&json!({ "tree": outcome.tree }))?
    };
    println!("{}", output);
    Ok(())
}

fn main() {
    let args = Args::parse();

    let _guard = match init_logger(args.no_color, args.log_level.as_deref(), args.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logger: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&args) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
