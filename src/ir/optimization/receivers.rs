//! Receiver-side double dispatch.
//!
//! A lookup or call node never inspects its receiver. It asks the receiver,
//! through these capability traits, how an access against it simplifies. Each
//! receiver kind answers for itself; kinds without shape knowledge leave the
//! access as it is.

use std::sync::Arc;

use tracing::trace;

use super::super::constant::Constant;
use super::super::error::{EvaluationError, Result};
use super::super::exception::RuntimeException;
use super::super::expression::Expression;
use super::super::helpers::{get_computation_result, wrap_expression_with_side_effects};
use super::{ConstraintCollection, Simplification};

/// How `receiver.<attribute_name>` simplifies for a given receiver.
pub trait AttributeAccess {
    fn compute_expression_attribute(
        &self,
        lookup_node: &Arc<Expression>,
        attribute_name: &str,
        collection: &mut ConstraintCollection,
    ) -> Result<Simplification>;
}

/// How `receiver(*args, **kw)` simplifies for a given receiver.
pub trait CallTarget {
    fn compute_expression_call(
        &self,
        call_node: &Arc<Expression>,
        collection: &mut ConstraintCollection,
    ) -> Result<Simplification>;
}

impl AttributeAccess for Expression {
    fn compute_expression_attribute(
        &self,
        lookup_node: &Arc<Expression>,
        attribute_name: &str,
        _collection: &mut ConstraintCollection,
    ) -> Result<Simplification> {
        match self {
            Expression::ConstantRef { value, .. } => constant_attribute(value, lookup_node, attribute_name),
            _ => Ok(Simplification::Unchanged),
        }
    }
}

impl CallTarget for Expression {
    fn compute_expression_call(
        &self,
        call_node: &Arc<Expression>,
        _collection: &mut ConstraintCollection,
    ) -> Result<Simplification> {
        match self {
            Expression::ConstantRef { value, .. } => constant_call(value, call_node),
            _ => Ok(Simplification::Unchanged),
        }
    }
}

fn constant_attribute(value: &Constant, lookup_node: &Arc<Expression>, attribute_name: &str) -> Result<Simplification> {
    let outcome = match value.lookup_attribute(attribute_name) {
        Ok(Some(folded)) => Ok(folded),
        Ok(None) => {
            trace!("Attribute '{}' of {} has no constant value", attribute_name, value.type_name());
            return Ok(Simplification::Unchanged);
        }
        Err(exception) => Err(EvaluationError::Raised(exception)),
    };

    get_computation_result(
        lookup_node,
        || outcome,
        &format!("Attribute '{}' of constant pre-computed.", attribute_name),
    )
}

fn constant_call(value: &Constant, call_node: &Arc<Expression>) -> Result<Simplification> {
    let result = get_computation_result(
        call_node,
        || Err(RuntimeException::not_callable(value.type_name()).into()),
        "Call of constant value pre-computed.",
    )?;

    Ok(result.map_node(|raised| {
        wrap_expression_with_side_effects(call_node.extract_pre_call_side_effects(), call_node, raised)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::exception::ExceptionKind;
    use crate::ir::node::{ChangeTag, SourceRef};

    fn loc() -> SourceRef {
        SourceRef::new("receivers.py", 5)
    }

    fn lookup_on(receiver: Arc<Expression>, name: &str) -> (Arc<Expression>, Simplification) {
        let lookup = Expression::attribute_lookup(Arc::clone(&receiver), name, loc());
        let mut collection = ConstraintCollection::new(false);
        let result = receiver.compute_expression_attribute(&lookup, name, &mut collection).unwrap();
        (lookup, result)
    }

    #[test]
    fn test_constant_data_attribute_folds() {
        let (_, result) = lookup_on(Expression::constant(Constant::Int(5), loc()), "denominator");
        assert_eq!(result.tag(), Some(ChangeTag::ConstantFolded));
    }

    #[test]
    fn test_constant_method_is_left_alone() {
        let (_, result) = lookup_on(Expression::constant(Constant::Int(5), loc()), "bit_length");
        assert!(!result.is_changed());
    }

    #[test]
    fn test_constant_missing_attribute_raises() {
        let (lookup, result) = lookup_on(Expression::string("s", loc()), "nope");
        let node = result.into_node(&lookup);
        assert!(node.will_raise_exception(ExceptionKind::AttributeError));
        assert_eq!(node.to_string(), "raise AttributeError: 'str' object has no attribute 'nope'");
    }

    #[test]
    fn test_unknown_receiver_is_left_alone() {
        let (_, result) = lookup_on(Expression::variable("obj", loc()), "anything");
        assert!(!result.is_changed());
    }

    #[test]
    fn test_calling_constant_raises_type_error() {
        let receiver = Expression::constant(Constant::None, loc());
        let call = Expression::call_empty(Arc::clone(&receiver), loc());
        let mut collection = ConstraintCollection::new(false);
        let result = receiver.compute_expression_call(&call, &mut collection).unwrap();
        assert_eq!(result.tag(), Some(ChangeTag::ExceptionPropagated));
        let node = result.into_node(&call);
        assert_eq!(node.to_string(), "raise TypeError: 'NoneType' object is not callable");
    }
}
