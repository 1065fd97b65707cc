//! Simplification of effect wrappers and tuple construction.

use std::sync::Arc;

use super::super::constant::Constant;
use super::super::error::{EvaluationError, Result};
use super::super::exception::ExceptionKind;
use super::super::expression::{Expression, ExpressionVector};
use super::super::helpers::{get_computation_result, wrap_expression_with_side_effects};
use super::super::node::ChangeTag;
use super::Simplification;

/// Position and node of the first expression that always raises.
fn first_raising(expressions: &ExpressionVector) -> Option<(usize, Arc<Expression>)> {
    expressions
        .iter()
        .enumerate()
        .find(|(_, expression)| expression.will_raise_exception(ExceptionKind::BaseException))
        .map(|(index, expression)| (index, Arc::clone(expression)))
}

pub fn compute_side_effects(
    node: &Arc<Expression>,
    side_effects: &ExpressionVector,
    expression: &Arc<Expression>,
) -> Result<Simplification> {
    if let Some((index, raising)) = first_raising(side_effects) {
        let result = wrap_expression_with_side_effects(side_effects.iter().take(index).cloned(), node, raising);
        return Ok(Simplification::changed(
            result,
            ChangeTag::ExceptionPropagated,
            "Side effects raise exception, value is never computed.",
        ));
    }

    let kept: Vec<Arc<Expression>> = side_effects
        .iter()
        .filter(|effect| effect.may_have_side_effects())
        .cloned()
        .collect();

    if kept.is_empty() {
        return Ok(Simplification::changed(
            Arc::clone(expression),
            ChangeTag::Rewritten,
            "Side effects removed as they have no effect.",
        ));
    }

    if kept.len() == side_effects.len() {
        return Ok(Simplification::Unchanged);
    }

    Ok(Simplification::changed(
        Expression::side_effects(kept, Arc::clone(expression), node.source_ref().clone()),
        ChangeTag::Rewritten,
        "Side effects without effect removed.",
    ))
}

pub fn compute_make_tuple(node: &Arc<Expression>, elements: &ExpressionVector) -> Result<Simplification> {
    if let Some((index, raising)) = first_raising(elements) {
        let result = wrap_expression_with_side_effects(elements.iter().take(index).cloned(), node, raising);
        return Ok(Simplification::changed(
            result,
            ChangeTag::ExceptionPropagated,
            "Tuple element raises exception, tuple is never created.",
        ));
    }

    if !elements.iter().all(|element| element.is_compile_time_constant()) {
        return Ok(Simplification::Unchanged);
    }

    get_computation_result(
        node,
        || {
            elements
                .iter()
                .map(|element| {
                    element.get_compile_time_constant().cloned().ok_or_else(|| {
                        EvaluationError::Internal(format!("{} reported constant without a value", element.kind()))
                    })
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Constant::Tuple)
        },
        "Tuple with constant elements pre-computed.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::exception::RuntimeException;
    use crate::ir::node::SourceRef;
    use crate::ir::optimization::{ConstraintCollection, compute_expression};

    fn loc() -> SourceRef {
        SourceRef::new("effects.py", 11)
    }

    fn simplify(node: &Arc<Expression>) -> Simplification {
        let mut collection = ConstraintCollection::new(false);
        compute_expression(node, &mut collection).unwrap()
    }

    fn effect(name: &str) -> Arc<Expression> {
        Expression::call_empty(Expression::variable(name, loc()), loc())
    }

    #[test]
    fn test_inert_side_effects_are_dropped() {
        let value = Expression::variable("v", loc());
        let node = Expression::side_effects(
            vec![Expression::constant(Constant::Int(1), loc())],
            Arc::clone(&value),
            loc(),
        );
        let result = simplify(&node);
        assert_eq!(result.tag(), Some(ChangeTag::Rewritten));
        assert!(Arc::ptr_eq(&result.into_node(&node), &value));
    }

    #[test]
    fn test_empty_side_effects_collapse_to_value() {
        let value = Expression::variable("v", loc());
        let node = Expression::side_effects(Vec::new(), Arc::clone(&value), loc());
        let result = simplify(&node);
        assert_eq!(result.tag(), Some(ChangeTag::Rewritten));
        assert!(Arc::ptr_eq(&result.into_node(&node), &value));
    }

    #[test]
    fn test_only_inert_entries_are_dropped() {
        let node = Expression::side_effects(
            vec![effect("f"), Expression::variable("unused", loc())],
            Expression::variable("v", loc()),
            loc(),
        );
        let result = simplify(&node).into_node(&node);
        assert_eq!(result.to_string(), "side_effects(f(*(), **{}); v)");
        assert!(!simplify(&result).is_changed());
    }

    #[test]
    fn test_raising_side_effect_truncates() {
        let raise = Expression::raise(RuntimeException::new(ExceptionKind::KeyError, "k"), loc());
        let node = Expression::side_effects(
            vec![effect("before"), raise, effect("after")],
            Expression::variable("v", loc()),
            loc(),
        );
        let result = simplify(&node);
        assert_eq!(result.tag(), Some(ChangeTag::ExceptionPropagated));
        assert_eq!(
            result.into_node(&node).to_string(),
            "side_effects(before(*(), **{}); raise KeyError: k)"
        );
    }

    #[test]
    fn test_constant_tuple_folds() {
        let node = Expression::make_tuple(
            vec![Expression::constant(Constant::Int(1), loc()), Expression::string("a", loc())],
            loc(),
        );
        let result = simplify(&node);
        assert_eq!(result.tag(), Some(ChangeTag::ConstantFolded));
        assert_eq!(
            result.into_node(&node).get_compile_time_constant(),
            Some(&Constant::Tuple(vec![Constant::Int(1), Constant::Str("a".into())]))
        );
    }

    #[test]
    fn test_tuple_with_raising_element() {
        let raise = Expression::raise(RuntimeException::new(ExceptionKind::IndexError, "i"), loc());
        let node = Expression::make_tuple(vec![effect("f"), raise, effect("g")], loc());
        let result = simplify(&node).into_node(&node);
        assert_eq!(result.to_string(), "side_effects(f(*(), **{}); raise IndexError: i)");
    }

    #[test]
    fn test_tuple_with_variable_is_terminal() {
        let node = Expression::make_tuple(vec![Expression::variable("x", loc())], loc());
        assert!(!simplify(&node).is_changed());
    }
}
