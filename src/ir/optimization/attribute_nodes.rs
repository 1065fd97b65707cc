//! Simplification of the attribute access family.
//!
//! `obj.attr` and `obj.__dunder__` short-circuit on a raising receiver; plain
//! lookups then let the receiver decide. `getattr` with a literal name becomes
//! a plain lookup, `hasattr` on a constant is evaluated outright, and
//! `setattr` is left alone.

use std::sync::Arc;

use tracing::trace;

use super::super::constant::Constant;
use super::super::error::{EvaluationError, Result};
use super::super::exception::ExceptionKind;
use super::super::expression::Expression;
use super::super::helpers::{
    get_computation_result, wrap_expression_with_node_side_effects, wrap_expression_with_side_effects,
};
use super::super::node::ChangeTag;
use super::{AttributeAccess, ConstraintCollection, Simplification};

/// `source.attribute_name`
pub fn compute_attribute_lookup(
    node: &Arc<Expression>,
    source: &Arc<Expression>,
    attribute_name: &str,
    collection: &mut ConstraintCollection,
) -> Result<Simplification> {
    if source.will_raise_exception(ExceptionKind::BaseException) {
        return Ok(Simplification::changed(
            Arc::clone(source),
            ChangeTag::ExceptionPropagated,
            "Attribute lookup source raises exception.",
        ));
    }

    source.compute_expression_attribute(node, attribute_name, collection)
}

/// `source.__special__`
///
/// Reserved names need stricter folding rules than plain lookups, so after the
/// raising check the node is left as is rather than delegated to the receiver.
pub fn compute_special_attribute_lookup(source: &Arc<Expression>) -> Result<Simplification> {
    if source.will_raise_exception(ExceptionKind::BaseException) {
        return Ok(Simplification::changed(
            Arc::clone(source),
            ChangeTag::ExceptionPropagated,
            "Special attribute lookup source raises exception.",
        ));
    }

    Ok(Simplification::Unchanged)
}

/// `getattr(source, attribute[, default])`
pub fn compute_builtin_getattr(
    node: &Arc<Expression>,
    source: &Arc<Expression>,
    attribute: &Arc<Expression>,
    default: Option<&Arc<Expression>>,
) -> Result<Simplification> {
    let Some(attribute_name) = attribute.get_string_value() else {
        trace!("getattr at {} has no literal attribute name", node.source_ref());
        return Ok(Simplification::Unchanged);
    };

    // The receiver would have to be bound to a temporary first to keep its
    // effects ahead of the lookup exactly once.
    if !source.extract_side_effects().is_empty() {
        trace!("getattr at {} kept, receiver has side effects", node.source_ref());
        return Ok(Simplification::Unchanged);
    }

    let lookup = Expression::attribute_lookup(Arc::clone(source), attribute_name, node.source_ref().clone());

    let discarded = attribute
        .extract_side_effects()
        .into_iter()
        .chain(default.map(|default| default.extract_side_effects()).unwrap_or_default());
    let result = wrap_expression_with_side_effects(discarded, node, lookup);

    Ok(Simplification::changed(
        result,
        ChangeTag::Rewritten,
        format!("getattr with constant attribute '{}' replaced by attribute lookup", attribute_name),
    ))
}

/// `setattr(source, attribute, value)`
pub fn compute_builtin_setattr() -> Result<Simplification> {
    // TODO: lower to a direct attribute store when the name is a literal string.
    Ok(Simplification::Unchanged)
}

/// `hasattr(source, attribute)`
pub fn compute_builtin_hasattr(
    node: &Arc<Expression>,
    source: &Arc<Expression>,
    attribute: &Arc<Expression>,
) -> Result<Simplification> {
    if !source.is_compile_time_constant() {
        return Ok(Simplification::Unchanged);
    }

    let Some(attribute_name) = attribute.get_string_value() else {
        return Ok(Simplification::Unchanged);
    };

    let result = get_computation_result(
        node,
        || {
            let value = source.get_compile_time_constant().ok_or_else(|| {
                EvaluationError::Internal(format!("{} reported constant without a value", source.kind()))
            })?;
            Ok(Constant::Bool(value.has_attribute(attribute_name)))
        },
        "hasattr pre-computed",
    )?;

    Ok(result.map_node(|folded| {
        let folded = wrap_expression_with_node_side_effects(folded, attribute);
        wrap_expression_with_node_side_effects(folded, source)
    }))
}
