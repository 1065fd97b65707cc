//! Node-making helpers shared by the simplification rules.
//!
//! Two contracts live here: re-attaching the effects of discarded expressions
//! to their replacement, and running a compile-time computation so that a
//! raising computation becomes a raising node instead of a compiler crash.

use std::sync::Arc;

use tracing::trace;

use super::constant::Constant;
use super::error::{EvaluationError, IrError, Result};
use super::expression::Expression;
use super::node::ChangeTag;
use super::optimization::Simplification;

/// Wraps `new_node` so that `side_effects` are evaluated first, in order.
///
/// Entries without side effects are dropped and the rest are flattened through
/// `extract_side_effects`. If nothing remains, `new_node` is returned as is.
/// When `new_node` is already a `SideEffects` node the effects are prepended to
/// its list, which evaluates exactly like nesting.
pub fn wrap_expression_with_side_effects<I>(side_effects: I, old_node: &Expression, new_node: Arc<Expression>) -> Arc<Expression>
where
    I: IntoIterator<Item = Arc<Expression>>,
{
    let effects: Vec<Arc<Expression>> = side_effects
        .into_iter()
        .filter(|effect| effect.may_have_side_effects())
        .flat_map(|effect| effect.extract_side_effects())
        .collect();

    if effects.is_empty() {
        return new_node;
    }

    let location = old_node.source_ref().clone();
    match &*new_node {
        Expression::SideEffects { side_effects: inner, expression, .. } => Expression::side_effects(
            effects.into_iter().chain(inner.iter().cloned()),
            Arc::clone(expression),
            location,
        ),
        _ => Expression::side_effects(effects, new_node, location),
    }
}

/// Wraps `new_node` with whatever effects discarding `old_node` would lose.
pub fn wrap_expression_with_node_side_effects(new_node: Arc<Expression>, old_node: &Arc<Expression>) -> Arc<Expression> {
    wrap_expression_with_side_effects(old_node.extract_side_effects(), old_node, new_node)
}

/// Runs `computation` at compile time on behalf of `node`.
///
/// A constant result becomes a `ConstantRef` tagged `ConstantFolded`. A
/// computation that raises the way the program would becomes a
/// `RaiseException` tagged `ExceptionPropagated`. An internal failure is not
/// recoverable and aborts optimization with the node's location.
pub fn get_computation_result<F>(node: &Expression, computation: F, description: &str) -> Result<Simplification>
where
    F: FnOnce() -> std::result::Result<Constant, EvaluationError>,
{
    let location = node.source_ref().clone();
    match computation() {
        Ok(value) => Ok(Simplification::changed(
            Expression::constant(value, location),
            ChangeTag::ConstantFolded,
            description,
        )),
        Err(EvaluationError::Raised(exception)) => {
            trace!("Compile time computation at {} raises {}", location, exception);
            let message = format!("{} Predicted to raise {}.", description, exception);
            Ok(Simplification::changed(
                Expression::raise(exception, location),
                ChangeTag::ExceptionPropagated,
                message,
            ))
        }
        Err(EvaluationError::Internal(message)) => Err(IrError::InternalInvariant { message, location }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::exception::{ExceptionKind, RuntimeException};
    use crate::ir::node::SourceRef;

    fn loc(line: u32) -> SourceRef {
        SourceRef::new("helpers.py", line)
    }

    fn effect(name: &str) -> Arc<Expression> {
        Expression::call_empty(Expression::variable(name, loc(1)), loc(1))
    }

    #[test]
    fn test_wrap_without_effects_is_identity() {
        let new_node = Expression::constant(Constant::Int(1), loc(1));
        let old_node = Expression::string("x", loc(2));
        let result = wrap_expression_with_node_side_effects(Arc::clone(&new_node), &old_node);
        assert!(Arc::ptr_eq(&result, &new_node));
    }

    #[test]
    fn test_wrap_attaches_effects_at_old_location() {
        let new_node = Expression::constant(Constant::Int(1), loc(1));
        let old_node = effect("f");
        let result = wrap_expression_with_node_side_effects(new_node, &old_node);
        assert_eq!(result.to_string(), "side_effects(f(*(), **{}); 1)");
        assert_eq!(result.source_ref(), old_node.source_ref());
    }

    #[test]
    fn test_later_wrap_runs_first() {
        let inner = wrap_expression_with_node_side_effects(Expression::variable("v", loc(1)), &effect("second"));
        let outer = wrap_expression_with_node_side_effects(inner, &effect("first"));
        assert_eq!(outer.to_string(), "side_effects(first(*(), **{}), second(*(), **{}); v)");
    }

    #[test]
    fn test_computation_success_folds_constant() {
        let node = Expression::variable("x", loc(3));
        let result = get_computation_result(&node, || Ok(Constant::Bool(true)), "Pre-computed.").unwrap();
        match result {
            Simplification::Changed { node, tag, description } => {
                assert_eq!(tag, ChangeTag::ConstantFolded);
                assert_eq!(description, "Pre-computed.");
                assert_eq!(node.get_compile_time_constant(), Some(&Constant::Bool(true)));
                assert_eq!(node.source_ref(), &loc(3));
            }
            Simplification::Unchanged => panic!("expected a change"),
        }
    }

    #[test]
    fn test_computation_raise_becomes_node() {
        let node = Expression::variable("x", loc(3));
        let result = get_computation_result(
            &node,
            || Err(RuntimeException::new(ExceptionKind::ZeroDivisionError, "division by zero").into()),
            "Division pre-computed.",
        )
        .unwrap();
        match result {
            Simplification::Changed { node, tag, description } => {
                assert_eq!(tag, ChangeTag::ExceptionPropagated);
                assert!(node.will_raise_exception(ExceptionKind::ArithmeticError));
                assert_eq!(
                    description,
                    "Division pre-computed. Predicted to raise ZeroDivisionError: division by zero."
                );
            }
            Simplification::Unchanged => panic!("expected a change"),
        }
    }

    #[test]
    fn test_internal_failure_is_fatal() {
        let node = Expression::variable("x", loc(8));
        let err = get_computation_result(&node, || Err(EvaluationError::Internal("lost constant".into())), "d")
            .unwrap_err();
        assert_eq!(err.to_string(), "helpers.py:8: internal invariant violated: lost constant");
    }
}
