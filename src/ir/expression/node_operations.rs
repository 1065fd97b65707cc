// Capability queries answered by every expression node.
//
// These are what the simplification rules ask of their operands: will it
// always raise, what effects would be lost if it were discarded, and is its
// value known at compile time.

use std::sync::Arc;

use super::super::constant::Constant;
use super::super::exception::ExceptionKind;
use super::node_types::Expression;

impl Expression {
    /// Returns true if evaluating this node unconditionally raises an
    /// exception that is an instance of `exception_base`.
    pub fn will_raise_exception(&self, exception_base: ExceptionKind) -> bool {
        match self {
            Expression::RaiseException { exception, .. } => exception.kind.is_subclass_of(exception_base),
            Expression::SideEffects { side_effects, expression, .. } => {
                side_effects.iter().any(|effect| effect.will_raise_exception(exception_base))
                    || expression.will_raise_exception(exception_base)
            }
            _ => false,
        }
    }

    pub fn may_have_side_effects(&self) -> bool {
        match self {
            Expression::ConstantRef { .. } | Expression::VariableRef { .. } => false,
            Expression::MakeTuple { elements, .. } => elements.iter().any(|e| e.may_have_side_effects()),
            Expression::SideEffects { side_effects, expression, .. } => {
                side_effects.iter().any(|e| e.may_have_side_effects()) || expression.may_have_side_effects()
            }
            // Lookups, builtins and calls can raise; raises always do.
            _ => true,
        }
    }

    /// The ordered effect-only expressions that must still be evaluated if
    /// this node's value is discarded. Empty if the node is side-effect free.
    pub fn extract_side_effects(self: &Arc<Self>) -> Vec<Arc<Expression>> {
        match &**self {
            Expression::ConstantRef { .. } | Expression::VariableRef { .. } => Vec::new(),
            Expression::MakeTuple { elements, .. } => {
                elements.iter().flat_map(|element| element.extract_side_effects()).collect()
            }
            Expression::SideEffects { side_effects, expression, .. } => side_effects
                .iter()
                .flat_map(|effect| effect.extract_side_effects())
                .chain(expression.extract_side_effects())
                .collect(),
            _ => vec![Arc::clone(self)],
        }
    }

    pub fn is_compile_time_constant(&self) -> bool {
        matches!(self, Expression::ConstantRef { .. })
    }

    pub fn get_compile_time_constant(&self) -> Option<&Constant> {
        match self {
            Expression::ConstantRef { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The value of a literal string constant.
    pub fn get_string_value(&self) -> Option<&str> {
        self.get_compile_time_constant().and_then(Constant::as_str)
    }

    /// Whether the value is known to be iterable with `count` elements.
    /// `None` means unknown.
    pub fn may_be_iterable(&self, count: usize) -> Option<bool> {
        match self {
            Expression::ConstantRef { value: Constant::Tuple(elements), .. } => Some(elements.len() == count),
            Expression::MakeTuple { elements, .. } => Some(elements.len() == count),
            // TODO: answer for attribute lookups once receiver shapes are tracked.
            _ => None,
        }
    }
}
