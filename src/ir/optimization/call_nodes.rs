//! Simplification of call expressions.
//!
//! Operands are evaluated called, args, kw. The first one known to raise ends
//! the call, keeping the effects of the operands before it; otherwise the
//! called expression decides through `CallTarget`.

use std::sync::Arc;

use super::super::error::Result;
use super::super::exception::ExceptionKind;
use super::super::expression::Expression;
use super::super::helpers::wrap_expression_with_side_effects;
use super::super::node::ChangeTag;
use super::{CallTarget, ConstraintCollection, Simplification};

impl Expression {
    /// Effects of the call's arguments, which run after the called expression
    /// is evaluated but before the call itself. Empty for non-calls.
    pub fn extract_pre_call_side_effects(&self) -> Vec<Arc<Expression>> {
        match self {
            Expression::Call { args, kw, .. } => {
                let mut effects = args.extract_side_effects();
                effects.extend(kw.extract_side_effects());
                effects
            }
            _ => Vec::new(),
        }
    }
}

pub fn compute_call(
    node: &Arc<Expression>,
    called: &Arc<Expression>,
    args: &Arc<Expression>,
    kw: &Arc<Expression>,
    collection: &mut ConstraintCollection,
) -> Result<Simplification> {
    if called.will_raise_exception(ExceptionKind::BaseException) {
        return Ok(Simplification::changed(
            Arc::clone(called),
            ChangeTag::ExceptionPropagated,
            "Called expression raises exception",
        ));
    }

    if args.will_raise_exception(ExceptionKind::BaseException) {
        let result = wrap_expression_with_side_effects([Arc::clone(called)], node, Arc::clone(args));
        return Ok(Simplification::changed(
            result,
            ChangeTag::ExceptionPropagated,
            "Call arguments raise exception",
        ));
    }

    if kw.will_raise_exception(ExceptionKind::BaseException) {
        let result = wrap_expression_with_side_effects([Arc::clone(called), Arc::clone(args)], node, Arc::clone(kw));
        return Ok(Simplification::changed(
            result,
            ChangeTag::ExceptionPropagated,
            "Call keyword arguments raise exception",
        ));
    }

    called.compute_expression_call(node, collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::constant::Constant;
    use crate::ir::exception::RuntimeException;
    use crate::ir::node::SourceRef;
    use crate::ir::optimization::compute_expression;

    fn loc() -> SourceRef {
        SourceRef::new("calls.py", 7)
    }

    fn raise() -> Arc<Expression> {
        Expression::raise(RuntimeException::new(ExceptionKind::ValueError, "bad"), loc())
    }

    fn simplify(node: &Arc<Expression>) -> Simplification {
        let mut collection = ConstraintCollection::new(false);
        compute_expression(node, &mut collection).unwrap()
    }

    #[test]
    fn test_raising_called_replaces_call() {
        let called = raise();
        let call = Expression::call_empty(Arc::clone(&called), loc());
        let result = simplify(&call).into_node(&call);
        assert!(Arc::ptr_eq(&result, &called));
    }

    #[test]
    fn test_raising_args_keep_called_effects() {
        let called = Expression::call_empty(Expression::variable("factory", loc()), loc());
        let call = Expression::call_no_keywords(called, raise(), loc());
        let result = simplify(&call);
        assert_eq!(result.tag(), Some(ChangeTag::ExceptionPropagated));
        assert_eq!(
            result.into_node(&call).to_string(),
            "side_effects(factory(*(), **{}); raise ValueError: bad)"
        );
    }

    #[test]
    fn test_raising_kw_keeps_called_and_args_effects() {
        let called = Expression::variable("f", loc());
        let args = Expression::make_tuple(vec![Expression::call_empty(Expression::variable("g", loc()), loc())], loc());
        let call = Expression::call(called, args, raise(), loc());
        let result = simplify(&call).into_node(&call);
        assert_eq!(result.to_string(), "side_effects(g(*(), **{}); raise ValueError: bad)");
    }

    #[test]
    fn test_call_of_variable_is_terminal() {
        let call = Expression::call_keywords_only(
            Expression::variable("f", loc()),
            Expression::constant(Constant::empty_dict(), loc()),
            loc(),
        );
        assert!(!simplify(&call).is_changed());
    }

    #[test]
    fn test_pre_call_effects_in_order() {
        let first = Expression::call_empty(Expression::variable("a", loc()), loc());
        let second = Expression::call_empty(Expression::variable("b", loc()), loc());
        let call = Expression::call(
            Expression::variable("f", loc()),
            Expression::make_tuple(vec![Arc::clone(&first)], loc()),
            Arc::clone(&second),
            loc(),
        );
        let effects = call.extract_pre_call_side_effects();
        assert_eq!(effects.len(), 2);
        assert!(Arc::ptr_eq(&effects[0], &first));
        assert!(Arc::ptr_eq(&effects[1], &second));
    }
}
