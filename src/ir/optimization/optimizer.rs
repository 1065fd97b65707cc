use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::super::error::Result;
use super::super::expression::Expression;
use super::{ChangeRecord, ConstraintCollection, Simplification, compute_expression};
use crate::config::OptimizerConfig;

/// Result of running the optimizer over one tree.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationOutcome {
    pub tree: Arc<Expression>,
    pub passes: usize,
    pub reached_fixpoint: bool,
    pub changes: Vec<ChangeRecord>,
}

/// Drives simplification over a whole tree until no node reports a change.
///
/// Each pass walks the tree bottom-up: children are simplified and relinked
/// first, then the node itself gets one `compute_expression` attempt. A node
/// replaced in this pass is looked at again in the next one.
pub struct Optimizer {
    config: OptimizerConfig,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Optimizer { config }
    }

    /// Optimizes `tree` to a fixpoint or until `max_passes` is exhausted.
    ///
    /// # Errors
    /// Returns the first internal error a node rule raises; the tree is
    /// not partially optimized in that case.
    pub fn optimize(&self, tree: &Arc<Expression>) -> Result<OptimizationOutcome> {
        let mut collection = ConstraintCollection::new(self.config.record_changes);
        let mut current = Arc::clone(tree);
        let mut reached_fixpoint = false;

        while collection.pass() < self.config.max_passes {
            collection.start_pass();
            current = self.optimize_node(&current, &mut collection)?;
            debug!("Pass {} made {} changes", collection.pass(), collection.changes_in_pass());
            if collection.changes_in_pass() == 0 {
                reached_fixpoint = true;
                break;
            }
        }

        if reached_fixpoint {
            info!("Optimization reached fixpoint after {} passes", collection.pass());
        } else {
            warn!(
                "Optimization stopped after {} passes without reaching a fixpoint",
                collection.pass()
            );
        }

        Ok(OptimizationOutcome {
            tree: current,
            passes: collection.pass(),
            reached_fixpoint,
            changes: collection.into_changes(),
        })
    }

    /// Runs a single bottom-up pass.
    pub fn optimize_node(&self, node: &Arc<Expression>, collection: &mut ConstraintCollection) -> Result<Arc<Expression>> {
        let relinked = match node.map_children(|child| self.optimize_node(child, collection))? {
            Some(rebuilt) => Arc::new(rebuilt),
            None => Arc::clone(node),
        };

        match compute_expression(&relinked, collection)? {
            Simplification::Changed { node: replacement, tag, description } => {
                collection.on_change(tag, relinked.source_ref(), &description);
                Ok(replacement)
            }
            Simplification::Unchanged => Ok(relinked),
        }
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Optimizer::new(OptimizerConfig::default())
    }
}
