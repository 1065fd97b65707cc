//! Progressive simplification of expression nodes.
//!
//! Every node kind answers `compute_expression`: either it stays as it is, or
//! it hands back a replacement subtree together with a change tag and a
//! human-readable justification. The `Optimizer` driver applies this bottom-up
//! over the whole tree until a pass changes nothing.

use std::sync::Arc;

use super::error::Result;
use super::expression::Expression;
use super::node::ChangeTag;

pub mod attribute_nodes;
pub mod call_nodes;
pub mod constraint_collection;
pub mod optimizer;
pub mod receivers;
pub mod side_effect_nodes;

pub use constraint_collection::{ChangeRecord, ConstraintCollection};
pub use optimizer::{OptimizationOutcome, Optimizer};
pub use receivers::{AttributeAccess, CallTarget};

/// Result of one simplification attempt on one node.
#[derive(Debug, Clone)]
pub enum Simplification {
    /// The node is terminal for the current facts.
    Unchanged,
    /// The node should be replaced by `node`.
    Changed {
        node: Arc<Expression>,
        tag: ChangeTag,
        description: String,
    },
}

impl Simplification {
    pub fn changed(node: Arc<Expression>, tag: ChangeTag, description: impl Into<String>) -> Self {
        let description = description.into();
        debug_assert!(!description.is_empty(), "a change must be justified");
        Simplification::Changed { node, tag, description }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, Simplification::Changed { .. })
    }

    pub fn tag(&self) -> Option<ChangeTag> {
        match self {
            Simplification::Changed { tag, .. } => Some(*tag),
            Simplification::Unchanged => None,
        }
    }

    /// Transforms the replacement node, keeping tag and description.
    pub fn map_node<F>(self, f: F) -> Self
    where
        F: FnOnce(Arc<Expression>) -> Arc<Expression>,
    {
        match self {
            Simplification::Changed { node, tag, description } => Simplification::Changed {
                node: f(node),
                tag,
                description,
            },
            Simplification::Unchanged => Simplification::Unchanged,
        }
    }

    /// The node the tree should hold after this attempt.
    pub fn into_node(self, original: &Arc<Expression>) -> Arc<Expression> {
        match self {
            Simplification::Changed { node, .. } => node,
            Simplification::Unchanged => Arc::clone(original),
        }
    }
}

/// Simplifies a single node against the current facts.
///
/// Dispatches on the node kind; children are not visited here.
pub fn compute_expression(node: &Arc<Expression>, collection: &mut ConstraintCollection) -> Result<Simplification> {
    match &**node {
        Expression::AttributeLookup { source, attribute_name, .. } => {
            attribute_nodes::compute_attribute_lookup(node, source, attribute_name, collection)
        }
        Expression::SpecialAttributeLookup { source, .. } => attribute_nodes::compute_special_attribute_lookup(source),
        Expression::BuiltinGetattr { source, attribute, default, .. } => {
            attribute_nodes::compute_builtin_getattr(node, source, attribute, default.as_ref())
        }
        Expression::BuiltinSetattr { .. } => attribute_nodes::compute_builtin_setattr(),
        Expression::BuiltinHasattr { source, attribute, .. } => {
            attribute_nodes::compute_builtin_hasattr(node, source, attribute)
        }
        Expression::Call { called, args, kw, .. } => call_nodes::compute_call(node, called, args, kw, collection),
        Expression::SideEffects { side_effects, expression, .. } => {
            side_effect_nodes::compute_side_effects(node, side_effects, expression)
        }
        Expression::MakeTuple { elements, .. } => side_effect_nodes::compute_make_tuple(node, elements),
        Expression::ConstantRef { .. } | Expression::VariableRef { .. } | Expression::RaiseException { .. } => {
            Ok(Simplification::Unchanged)
        }
    }
}
