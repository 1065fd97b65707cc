use std::sync::Arc;

use archery::ArcK;
use rpds::Vector;
use serde::{Deserialize, Serialize};

use super::super::constant::Constant;
use super::super::error::{IrError, Result};
use super::super::exception::RuntimeException;
use super::super::node::{NodeKind, SourceRef};

pub type ExpressionVector = Vector<Arc<Expression>, ArcK>;

/// Represents the expression constructs the optimizer works on.
/// Each variant owns its children through `Arc`, and a changed child always
/// produces a new parent rather than mutating the old one.
///
/// # Examples
/// - AttributeLookup: `source.attribute_name`
/// - BuiltinGetattr: `getattr(source, attribute, default)`
/// - SideEffects: evaluate `side_effects` in order, then yield `expression`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expression {
    /// Plain attribute access with a literal name.
    AttributeLookup {
        source_ref: SourceRef,
        source: Arc<Expression>,
        attribute_name: String,
    },
    /// Attribute access on a reserved (dunder) name.
    SpecialAttributeLookup {
        source_ref: SourceRef,
        source: Arc<Expression>,
        attribute_name: String,
    },
    /// `getattr(source, attribute[, default])`.
    BuiltinGetattr {
        source_ref: SourceRef,
        source: Arc<Expression>,
        attribute: Arc<Expression>,
        default: Option<Arc<Expression>>,
    },
    /// `setattr(source, attribute, value)`.
    BuiltinSetattr {
        source_ref: SourceRef,
        source: Arc<Expression>,
        attribute: Arc<Expression>,
        value: Arc<Expression>,
    },
    /// `hasattr(source, attribute)`.
    BuiltinHasattr {
        source_ref: SourceRef,
        source: Arc<Expression>,
        attribute: Arc<Expression>,
    },
    /// Reference to a compile-time constant.
    ConstantRef {
        source_ref: SourceRef,
        value: Constant,
    },
    /// Reference to a local variable known to be assigned.
    VariableRef {
        source_ref: SourceRef,
        variable_name: String,
    },
    /// Unconditionally raises `exception`.
    RaiseException {
        source_ref: SourceRef,
        exception: RuntimeException,
    },
    /// Effect-only expressions evaluated before `expression` provides the value.
    SideEffects {
        source_ref: SourceRef,
        side_effects: ExpressionVector,
        expression: Arc<Expression>,
    },
    /// Tuple construction from element expressions.
    MakeTuple {
        source_ref: SourceRef,
        elements: ExpressionVector,
    },
    /// Call of `called` with positional `args` (a tuple) and keywords `kw` (a dict).
    Call {
        source_ref: SourceRef,
        called: Arc<Expression>,
        args: Arc<Expression>,
        kw: Arc<Expression>,
    },
}

/// Named arguments of `getattr(object, name[, default])`.
#[derive(Debug, Clone, Default)]
pub struct GetattrArgs {
    pub object_arg: Option<Arc<Expression>>,
    pub name: Option<Arc<Expression>>,
    pub default: Option<Arc<Expression>>,
}

/// Named arguments of `setattr(object, name, value)`.
#[derive(Debug, Clone, Default)]
pub struct SetattrArgs {
    pub object_arg: Option<Arc<Expression>>,
    pub name: Option<Arc<Expression>>,
    pub value: Option<Arc<Expression>>,
}

/// Named arguments of `hasattr(object, name)`.
#[derive(Debug, Clone, Default)]
pub struct HasattrArgs {
    pub object_arg: Option<Arc<Expression>>,
    pub name: Option<Arc<Expression>>,
}

fn required(
    argument: Option<Arc<Expression>>,
    name: &'static str,
    kind: NodeKind,
    source_ref: &SourceRef,
) -> Result<Arc<Expression>> {
    argument.ok_or_else(|| IrError::MissingArgument {
        kind,
        argument: name,
        location: source_ref.clone(),
    })
}

impl Expression {
    pub fn attribute_lookup(source: Arc<Expression>, attribute_name: impl Into<String>, source_ref: SourceRef) -> Arc<Expression> {
        Arc::new(Expression::AttributeLookup {
            source_ref,
            source,
            attribute_name: attribute_name.into(),
        })
    }

    pub fn special_attribute_lookup(
        source: Arc<Expression>,
        attribute_name: impl Into<String>,
        source_ref: SourceRef,
    ) -> Arc<Expression> {
        Arc::new(Expression::SpecialAttributeLookup {
            source_ref,
            source,
            attribute_name: attribute_name.into(),
        })
    }

    /// Builds a `getattr` node from its named arguments; `object` and `name`
    /// are required, `default` may be absent.
    pub fn builtin_getattr(args: GetattrArgs, source_ref: SourceRef) -> Result<Arc<Expression>> {
        let kind = NodeKind::BuiltinGetattr;
        let source = required(args.object_arg, "object", kind, &source_ref)?;
        let attribute = required(args.name, "name", kind, &source_ref)?;
        Ok(Arc::new(Expression::BuiltinGetattr {
            source_ref,
            source,
            attribute,
            default: args.default,
        }))
    }

    pub fn builtin_setattr(args: SetattrArgs, source_ref: SourceRef) -> Result<Arc<Expression>> {
        let kind = NodeKind::BuiltinSetattr;
        let source = required(args.object_arg, "object", kind, &source_ref)?;
        let attribute = required(args.name, "name", kind, &source_ref)?;
        let value = required(args.value, "value", kind, &source_ref)?;
        Ok(Arc::new(Expression::BuiltinSetattr { source_ref, source, attribute, value }))
    }

    pub fn builtin_hasattr(args: HasattrArgs, source_ref: SourceRef) -> Result<Arc<Expression>> {
        let kind = NodeKind::BuiltinHasattr;
        let source = required(args.object_arg, "object", kind, &source_ref)?;
        let attribute = required(args.name, "name", kind, &source_ref)?;
        Ok(Arc::new(Expression::BuiltinHasattr { source_ref, source, attribute }))
    }

    pub fn constant(value: Constant, source_ref: SourceRef) -> Arc<Expression> {
        Arc::new(Expression::ConstantRef { source_ref, value })
    }

    pub fn string(value: impl Into<String>, source_ref: SourceRef) -> Arc<Expression> {
        Expression::constant(Constant::Str(value.into()), source_ref)
    }

    pub fn variable(variable_name: impl Into<String>, source_ref: SourceRef) -> Arc<Expression> {
        Arc::new(Expression::VariableRef {
            source_ref,
            variable_name: variable_name.into(),
        })
    }

    pub fn raise(exception: RuntimeException, source_ref: SourceRef) -> Arc<Expression> {
        Arc::new(Expression::RaiseException { source_ref, exception })
    }

    pub fn side_effects(
        side_effects: impl IntoIterator<Item = Arc<Expression>>,
        expression: Arc<Expression>,
        source_ref: SourceRef,
    ) -> Arc<Expression> {
        Arc::new(Expression::SideEffects {
            source_ref,
            side_effects: side_effects.into_iter().collect(),
            expression,
        })
    }

    pub fn make_tuple(elements: impl IntoIterator<Item = Arc<Expression>>, source_ref: SourceRef) -> Arc<Expression> {
        Arc::new(Expression::MakeTuple {
            source_ref,
            elements: elements.into_iter().collect(),
        })
    }

    pub fn call(called: Arc<Expression>, args: Arc<Expression>, kw: Arc<Expression>, source_ref: SourceRef) -> Arc<Expression> {
        Arc::new(Expression::Call { source_ref, called, args, kw })
    }

    /// Call without keyword arguments; `kw` becomes an empty constant dict.
    pub fn call_no_keywords(called: Arc<Expression>, args: Arc<Expression>, source_ref: SourceRef) -> Arc<Expression> {
        let kw = Expression::constant(Constant::empty_dict(), source_ref.clone());
        Expression::call(called, args, kw, source_ref)
    }

    /// Call with keyword arguments only; `args` becomes an empty constant tuple.
    pub fn call_keywords_only(called: Arc<Expression>, kw: Arc<Expression>, source_ref: SourceRef) -> Arc<Expression> {
        let args = Expression::constant(Constant::empty_tuple(), source_ref.clone());
        Expression::call(called, args, kw, source_ref)
    }

    pub fn call_empty(called: Arc<Expression>, source_ref: SourceRef) -> Arc<Expression> {
        let args = Expression::constant(Constant::empty_tuple(), source_ref.clone());
        let kw = Expression::constant(Constant::empty_dict(), source_ref.clone());
        Expression::call(called, args, kw, source_ref)
    }
}
