use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::super::error::{IrError, Result};
use super::super::node::{ChildRole, NodeKind, SourceRef};
use super::node_types::{Expression, ExpressionVector};

impl Expression {
    /// Returns the discriminator of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Expression::AttributeLookup { .. } => NodeKind::AttributeLookup,
            Expression::SpecialAttributeLookup { .. } => NodeKind::SpecialAttributeLookup,
            Expression::BuiltinGetattr { .. } => NodeKind::BuiltinGetattr,
            Expression::BuiltinSetattr { .. } => NodeKind::BuiltinSetattr,
            Expression::BuiltinHasattr { .. } => NodeKind::BuiltinHasattr,
            Expression::ConstantRef { .. } => NodeKind::ConstantRef,
            Expression::VariableRef { .. } => NodeKind::VariableRef,
            Expression::RaiseException { .. } => NodeKind::RaiseException,
            Expression::SideEffects { .. } => NodeKind::SideEffects,
            Expression::MakeTuple { .. } => NodeKind::MakeTuple,
            Expression::Call { .. } => NodeKind::Call,
        }
    }

    pub fn source_ref(&self) -> &SourceRef {
        match self {
            Expression::AttributeLookup { source_ref, .. }
            | Expression::SpecialAttributeLookup { source_ref, .. }
            | Expression::BuiltinGetattr { source_ref, .. }
            | Expression::BuiltinSetattr { source_ref, .. }
            | Expression::BuiltinHasattr { source_ref, .. }
            | Expression::ConstantRef { source_ref, .. }
            | Expression::VariableRef { source_ref, .. }
            | Expression::RaiseException { source_ref, .. }
            | Expression::SideEffects { source_ref, .. }
            | Expression::MakeTuple { source_ref, .. }
            | Expression::Call { source_ref, .. } => source_ref,
        }
    }

    /// The child roles this node's kind declares.
    pub fn named_children(&self) -> &'static [ChildRole] {
        self.kind().named_children()
    }

    fn mismatch(&self, role: ChildRole) -> IrError {
        IrError::StructuralMismatch {
            kind: self.kind(),
            role,
            location: self.source_ref().clone(),
        }
    }

    /// Returns the child in a single-valued role. An optional role that is
    /// empty yields `Ok(None)`; a role the kind does not declare is an error.
    pub fn child(&self, role: ChildRole) -> Result<Option<&Arc<Expression>>> {
        match (self, role) {
            (
                Expression::AttributeLookup { source, .. }
                | Expression::SpecialAttributeLookup { source, .. }
                | Expression::BuiltinGetattr { source, .. }
                | Expression::BuiltinSetattr { source, .. }
                | Expression::BuiltinHasattr { source, .. },
                ChildRole::Source,
            ) => Ok(Some(source)),
            (
                Expression::BuiltinGetattr { attribute, .. }
                | Expression::BuiltinSetattr { attribute, .. }
                | Expression::BuiltinHasattr { attribute, .. },
                ChildRole::Attribute,
            ) => Ok(Some(attribute)),
            (Expression::BuiltinGetattr { default, .. }, ChildRole::Default) => Ok(default.as_ref()),
            (Expression::BuiltinSetattr { value, .. }, ChildRole::Value) => Ok(Some(value)),
            (Expression::SideEffects { expression, .. }, ChildRole::Expression) => Ok(Some(expression)),
            (Expression::Call { called, .. }, ChildRole::Called) => Ok(Some(called)),
            (Expression::Call { args, .. }, ChildRole::Args) => Ok(Some(args)),
            (Expression::Call { kw, .. }, ChildRole::Kw) => Ok(Some(kw)),
            _ => Err(self.mismatch(role)),
        }
    }

    /// Returns the children held in a sequence role.
    pub fn child_sequence(&self, role: ChildRole) -> Result<&ExpressionVector> {
        match (self, role) {
            (Expression::SideEffects { side_effects, .. }, ChildRole::SideEffects) => Ok(side_effects),
            (Expression::MakeTuple { elements, .. }, ChildRole::Elements) => Ok(elements),
            _ => Err(self.mismatch(role)),
        }
    }

    /// Returns all present children in evaluation order.
    pub fn children(&self) -> Vec<&Arc<Expression>> {
        match self {
            Expression::AttributeLookup { source, .. } | Expression::SpecialAttributeLookup { source, .. } => vec![source],
            Expression::BuiltinGetattr { source, attribute, default, .. } => {
                let mut children = vec![source, attribute];
                children.extend(default.as_ref());
                children
            }
            Expression::BuiltinSetattr { source, attribute, value, .. } => vec![source, attribute, value],
            Expression::BuiltinHasattr { source, attribute, .. } => vec![source, attribute],
            Expression::ConstantRef { .. } | Expression::VariableRef { .. } | Expression::RaiseException { .. } => vec![],
            Expression::SideEffects { side_effects, expression, .. } => {
                let mut children: Vec<_> = side_effects.iter().collect();
                children.push(expression);
                children
            }
            Expression::MakeTuple { elements, .. } => elements.iter().collect(),
            Expression::Call { called, args, kw, .. } => vec![called, args, kw],
        }
    }

    /// Returns a copy of this node with the single-valued `role` replaced.
    pub fn with_child(&self, role: ChildRole, child: Arc<Expression>) -> Result<Expression> {
        let mut node = self.clone();
        match (&mut node, role) {
            (
                Expression::AttributeLookup { source, .. }
                | Expression::SpecialAttributeLookup { source, .. }
                | Expression::BuiltinGetattr { source, .. }
                | Expression::BuiltinSetattr { source, .. }
                | Expression::BuiltinHasattr { source, .. },
                ChildRole::Source,
            ) => *source = child,
            (
                Expression::BuiltinGetattr { attribute, .. }
                | Expression::BuiltinSetattr { attribute, .. }
                | Expression::BuiltinHasattr { attribute, .. },
                ChildRole::Attribute,
            ) => *attribute = child,
            (Expression::BuiltinGetattr { default, .. }, ChildRole::Default) => *default = Some(child),
            (Expression::BuiltinSetattr { value, .. }, ChildRole::Value) => *value = child,
            (Expression::SideEffects { expression, .. }, ChildRole::Expression) => *expression = child,
            (Expression::Call { called, .. }, ChildRole::Called) => *called = child,
            (Expression::Call { args, .. }, ChildRole::Args) => *args = child,
            (Expression::Call { kw, .. }, ChildRole::Kw) => *kw = child,
            _ => return Err(self.mismatch(role)),
        }
        Ok(node)
    }

    /// Rebuilds this node with every child passed through `f`.
    ///
    /// Returns `Ok(None)` when `f` handed back every child unchanged (pointer
    /// equality), so callers can keep the original `Arc`.
    pub fn map_children<F>(&self, mut f: F) -> Result<Option<Expression>>
    where
        F: FnMut(&Arc<Expression>) -> Result<Arc<Expression>>,
    {
        let mut changed = false;
        let mut relink = |child: &Arc<Expression>| -> Result<Arc<Expression>> {
            let new_child = f(child)?;
            if !Arc::ptr_eq(child, &new_child) {
                changed = true;
            }
            Ok(new_child)
        };

        let rebuilt = match self {
            Expression::AttributeLookup { source_ref, source, attribute_name } => Expression::AttributeLookup {
                source_ref: source_ref.clone(),
                source: relink(source)?,
                attribute_name: attribute_name.clone(),
            },
            Expression::SpecialAttributeLookup { source_ref, source, attribute_name } => {
                Expression::SpecialAttributeLookup {
                    source_ref: source_ref.clone(),
                    source: relink(source)?,
                    attribute_name: attribute_name.clone(),
                }
            }
            Expression::BuiltinGetattr { source_ref, source, attribute, default } => Expression::BuiltinGetattr {
                source_ref: source_ref.clone(),
                source: relink(source)?,
                attribute: relink(attribute)?,
                default: default.as_ref().map(&mut relink).transpose()?,
            },
            Expression::BuiltinSetattr { source_ref, source, attribute, value } => Expression::BuiltinSetattr {
                source_ref: source_ref.clone(),
                source: relink(source)?,
                attribute: relink(attribute)?,
                value: relink(value)?,
            },
            Expression::BuiltinHasattr { source_ref, source, attribute } => Expression::BuiltinHasattr {
                source_ref: source_ref.clone(),
                source: relink(source)?,
                attribute: relink(attribute)?,
            },
            Expression::SideEffects { source_ref, side_effects, expression } => Expression::SideEffects {
                source_ref: source_ref.clone(),
                side_effects: side_effects.iter().map(&mut relink).collect::<Result<ExpressionVector>>()?,
                expression: relink(expression)?,
            },
            Expression::MakeTuple { source_ref, elements } => Expression::MakeTuple {
                source_ref: source_ref.clone(),
                elements: elements.iter().map(&mut relink).collect::<Result<ExpressionVector>>()?,
            },
            Expression::Call { source_ref, called, args, kw } => Expression::Call {
                source_ref: source_ref.clone(),
                called: relink(called)?,
                args: relink(args)?,
                kw: relink(kw)?,
            },
            Expression::ConstantRef { .. } | Expression::VariableRef { .. } | Expression::RaiseException { .. } => {
                return Ok(None);
            }
        };

        Ok(if changed { Some(rebuilt) } else { None })
    }

    /// Deep copy of this subtree with every node relocated to `source_ref`.
    pub fn make_clone_at(&self, source_ref: &SourceRef) -> Expression {
        let clone = |child: &Arc<Expression>| Arc::new(child.make_clone_at(source_ref));
        let location = source_ref.clone();
        match self {
            Expression::AttributeLookup { source, attribute_name, .. } => Expression::AttributeLookup {
                source_ref: location,
                source: clone(source),
                attribute_name: attribute_name.clone(),
            },
            Expression::SpecialAttributeLookup { source, attribute_name, .. } => Expression::SpecialAttributeLookup {
                source_ref: location,
                source: clone(source),
                attribute_name: attribute_name.clone(),
            },
            Expression::BuiltinGetattr { source, attribute, default, .. } => Expression::BuiltinGetattr {
                source_ref: location,
                source: clone(source),
                attribute: clone(attribute),
                default: default.as_ref().map(clone),
            },
            Expression::BuiltinSetattr { source, attribute, value, .. } => Expression::BuiltinSetattr {
                source_ref: location,
                source: clone(source),
                attribute: clone(attribute),
                value: clone(value),
            },
            Expression::BuiltinHasattr { source, attribute, .. } => Expression::BuiltinHasattr {
                source_ref: location,
                source: clone(source),
                attribute: clone(attribute),
            },
            Expression::ConstantRef { value, .. } => Expression::ConstantRef {
                source_ref: location,
                value: value.clone(),
            },
            Expression::VariableRef { variable_name, .. } => Expression::VariableRef {
                source_ref: location,
                variable_name: variable_name.clone(),
            },
            Expression::RaiseException { exception, .. } => Expression::RaiseException {
                source_ref: location,
                exception: exception.clone(),
            },
            Expression::SideEffects { side_effects, expression, .. } => Expression::SideEffects {
                source_ref: location,
                side_effects: side_effects.iter().map(clone).collect(),
                expression: clone(expression),
            },
            Expression::MakeTuple { elements, .. } => Expression::MakeTuple {
                source_ref: location,
                elements: elements.iter().map(clone).collect(),
            },
            Expression::Call { called, args, kw, .. } => Expression::Call {
                source_ref: location,
                called: clone(called),
                args: clone(args),
                kw: clone(kw),
            },
        }
    }

    /// Equality of shape and values, ignoring source locations.
    pub fn structurally_eq(&self, other: &Expression) -> bool {
        fn sequence_eq(a: &ExpressionVector, b: &ExpressionVector) -> bool {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.structurally_eq(y))
        }

        match (self, other) {
            (
                Expression::AttributeLookup { source: sa, attribute_name: na, .. },
                Expression::AttributeLookup { source: sb, attribute_name: nb, .. },
            )
            | (
                Expression::SpecialAttributeLookup { source: sa, attribute_name: na, .. },
                Expression::SpecialAttributeLookup { source: sb, attribute_name: nb, .. },
            ) => na == nb && sa.structurally_eq(sb),
            (
                Expression::BuiltinGetattr { source: sa, attribute: aa, default: da, .. },
                Expression::BuiltinGetattr { source: sb, attribute: ab, default: db, .. },
            ) => {
                sa.structurally_eq(sb)
                    && aa.structurally_eq(ab)
                    && match (da, db) {
                        (Some(da), Some(db)) => da.structurally_eq(db),
                        (None, None) => true,
                        _ => false,
                    }
            }
            (
                Expression::BuiltinSetattr { source: sa, attribute: aa, value: va, .. },
                Expression::BuiltinSetattr { source: sb, attribute: ab, value: vb, .. },
            ) => sa.structurally_eq(sb) && aa.structurally_eq(ab) && va.structurally_eq(vb),
            (
                Expression::BuiltinHasattr { source: sa, attribute: aa, .. },
                Expression::BuiltinHasattr { source: sb, attribute: ab, .. },
            ) => sa.structurally_eq(sb) && aa.structurally_eq(ab),
            (Expression::ConstantRef { value: va, .. }, Expression::ConstantRef { value: vb, .. }) => va == vb,
            (Expression::VariableRef { variable_name: na, .. }, Expression::VariableRef { variable_name: nb, .. }) => {
                na == nb
            }
            (Expression::RaiseException { exception: ea, .. }, Expression::RaiseException { exception: eb, .. }) => {
                ea == eb
            }
            (
                Expression::SideEffects { side_effects: sa, expression: ea, .. },
                Expression::SideEffects { side_effects: sb, expression: eb, .. },
            ) => sequence_eq(sa, sb) && ea.structurally_eq(eb),
            (Expression::MakeTuple { elements: ea, .. }, Expression::MakeTuple { elements: eb, .. }) => {
                sequence_eq(ea, eb)
            }
            (
                Expression::Call { called: ca, args: aa, kw: ka, .. },
                Expression::Call { called: cb, args: ab, kw: kb, .. },
            ) => ca.structurally_eq(cb) && aa.structurally_eq(ab) && ka.structurally_eq(kb),
            _ => false,
        }
    }

    /// The literal attribute name of an attribute lookup.
    pub fn attribute_name(&self) -> Option<&str> {
        match self {
            Expression::AttributeLookup { attribute_name, .. }
            | Expression::SpecialAttributeLookup { attribute_name, .. } => Some(attribute_name),
            _ => None,
        }
    }

    /// Renames the attribute of a lookup in place. The node's identity and
    /// children are untouched.
    pub fn set_attribute_name(&mut self, name: impl Into<String>) -> Result<()> {
        match self {
            Expression::AttributeLookup { attribute_name, .. }
            | Expression::SpecialAttributeLookup { attribute_name, .. } => {
                *attribute_name = name.into();
                Ok(())
            }
            _ => Err(IrError::NotAnAttributeLookup {
                kind: self.kind(),
                location: self.source_ref().clone(),
            }),
        }
    }

    /// Scalar, non-child data of the node, for serialized traces.
    pub fn details(&self) -> BTreeMap<&'static str, String> {
        let mut details = BTreeMap::new();
        match self {
            Expression::AttributeLookup { attribute_name, .. }
            | Expression::SpecialAttributeLookup { attribute_name, .. } => {
                details.insert("attribute", attribute_name.clone());
            }
            Expression::ConstantRef { value, .. } => {
                details.insert("constant", value.to_string());
            }
            Expression::VariableRef { variable_name, .. } => {
                details.insert("variable_name", variable_name.clone());
            }
            Expression::RaiseException { exception, .. } => {
                details.insert("exception", exception.to_string());
            }
            _ => {}
        }
        details
    }

    /// One-line human readable description used in diagnostics.
    pub fn detail(&self) -> String {
        match self {
            Expression::AttributeLookup { source, attribute_name, .. }
            | Expression::SpecialAttributeLookup { source, attribute_name, .. } => {
                format!("attribute {} from {}", attribute_name, source.kind())
            }
            _ => format!("{} at {}", self.kind(), self.source_ref()),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn comma_separated(f: &mut fmt::Formatter<'_>, items: &ExpressionVector) -> fmt::Result {
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", item)?;
            }
            Ok(())
        }

        match self {
            Expression::AttributeLookup { source, attribute_name, .. }
            | Expression::SpecialAttributeLookup { source, attribute_name, .. } => {
                write!(f, "{}.{}", source, attribute_name)
            }
            Expression::BuiltinGetattr { source, attribute, default: Some(default), .. } => {
                write!(f, "getattr({}, {}, {})", source, attribute, default)
            }
            Expression::BuiltinGetattr { source, attribute, default: None, .. } => {
                write!(f, "getattr({}, {})", source, attribute)
            }
            Expression::BuiltinSetattr { source, attribute, value, .. } => {
                write!(f, "setattr({}, {}, {})", source, attribute, value)
            }
            Expression::BuiltinHasattr { source, attribute, .. } => write!(f, "hasattr({}, {})", source, attribute),
            Expression::ConstantRef { value, .. } => write!(f, "{}", value),
            Expression::VariableRef { variable_name, .. } => write!(f, "{}", variable_name),
            Expression::RaiseException { exception, .. } => write!(f, "raise {}", exception),
            Expression::SideEffects { side_effects, expression, .. } => {
                write!(f, "side_effects(")?;
                comma_separated(f, side_effects)?;
                write!(f, "; {})", expression)
            }
            Expression::MakeTuple { elements, .. } => {
                write!(f, "(")?;
                comma_separated(f, elements)?;
                if elements.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Expression::Call { called, args, kw, .. } => write!(f, "{}(*{}, **{})", called, args, kw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::constant::Constant;
    use crate::ir::expression::{GetattrArgs, HasattrArgs};

    fn loc(line: u32) -> SourceRef {
        SourceRef::new("test.py", line)
    }

    fn getattr_node() -> Arc<Expression> {
        Expression::builtin_getattr(
            GetattrArgs {
                object_arg: Some(Expression::variable("x", loc(1))),
                name: Some(Expression::string("foo", loc(1))),
                default: None,
            },
            loc(1),
        )
        .unwrap()
    }

    #[test]
    fn test_child_by_role() {
        let node = getattr_node();
        assert!(matches!(
            node.child(ChildRole::Source).unwrap().map(|c| c.kind()),
            Some(NodeKind::VariableRef)
        ));
        // Optional role exists but is empty.
        assert!(node.child(ChildRole::Default).unwrap().is_none());
        let err = node.child(ChildRole::Value).unwrap_err();
        assert!(matches!(err, IrError::StructuralMismatch { role: ChildRole::Value, .. }));
    }

    #[test]
    fn test_child_sequence_by_role() {
        let effect = Expression::call_empty(Expression::variable("f", loc(1)), loc(1));
        let node = Expression::side_effects(vec![Arc::clone(&effect)], Expression::variable("v", loc(1)), loc(1));
        let effects = node.child_sequence(ChildRole::SideEffects).unwrap();
        assert_eq!(effects.len(), 1);
        assert!(Arc::ptr_eq(&effects[0], &effect));
        assert!(node.child(ChildRole::Expression).unwrap().is_some());

        let tuple = Expression::make_tuple(vec![Expression::constant(Constant::Int(1), loc(2))], loc(2));
        assert_eq!(tuple.child_sequence(ChildRole::Elements).unwrap().len(), 1);

        // Single-valued and sequence roles are not interchangeable.
        let err = node.child_sequence(ChildRole::Elements).unwrap_err();
        assert!(matches!(err, IrError::StructuralMismatch { role: ChildRole::Elements, .. }));
        assert!(tuple.child(ChildRole::Elements).is_err());
        assert!(getattr_node().child_sequence(ChildRole::Source).is_err());
    }

    #[test]
    fn test_children_in_evaluation_order() {
        let node = getattr_node();
        let kinds: Vec<_> = node.children().iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, vec![NodeKind::VariableRef, NodeKind::ConstantRef]);
    }

    #[test]
    fn test_with_child_sets_optional_role() {
        let node = getattr_node();
        let replaced = node
            .with_child(ChildRole::Default, Expression::constant(Constant::None, loc(2)))
            .unwrap();
        assert!(replaced.child(ChildRole::Default).unwrap().is_some());
        assert!(node.with_child(ChildRole::Elements, Expression::variable("y", loc(2))).is_err());
    }

    #[test]
    fn test_map_children_keeps_identity_when_unchanged() {
        let node = getattr_node();
        let result = node.map_children(|child| Ok(Arc::clone(child))).unwrap();
        assert!(result.is_none());

        let result = node
            .map_children(|child| match &**child {
                Expression::VariableRef { .. } => Ok(Expression::variable("y", loc(3))),
                _ => Ok(Arc::clone(child)),
            })
            .unwrap()
            .expect("source was replaced");
        assert_eq!(result.to_string(), "getattr(y, \"foo\")");
    }

    #[test]
    fn test_make_clone_at_relocates_all_nodes() {
        let node = getattr_node();
        let clone = node.make_clone_at(&loc(40));
        assert!(clone.structurally_eq(&node));
        assert_eq!(clone.source_ref(), &loc(40));
        for child in clone.children() {
            assert_eq!(child.source_ref(), &loc(40));
            assert!(!Arc::ptr_eq(child, node.child(ChildRole::Source).unwrap().unwrap()));
        }
    }

    #[test]
    fn test_set_attribute_name_in_place() {
        let mut lookup = (*Expression::attribute_lookup(Expression::variable("x", loc(1)), "a", loc(1))).clone();
        lookup.set_attribute_name("b").unwrap();
        assert_eq!(lookup.attribute_name(), Some("b"));
        assert_eq!(lookup.details().get("attribute").map(String::as_str), Some("b"));
        assert_eq!(lookup.detail(), "attribute b from VariableRef");

        let mut constant = (*Expression::constant(Constant::Int(1), loc(1))).clone();
        assert!(matches!(
            constant.set_attribute_name("b"),
            Err(IrError::NotAnAttributeLookup { kind: NodeKind::ConstantRef, .. })
        ));
    }

    #[test]
    fn test_missing_required_argument() {
        let err = Expression::builtin_hasattr(
            HasattrArgs { object_arg: Some(Expression::variable("x", loc(5))), name: None },
            loc(5),
        )
        .unwrap_err();
        assert!(matches!(err, IrError::MissingArgument { argument: "name", .. }));
    }

    #[test]
    fn test_structural_equality_ignores_location() {
        let a = Expression::attribute_lookup(Expression::variable("x", loc(1)), "a", loc(1));
        let b = Expression::attribute_lookup(Expression::variable("x", loc(9)), "a", loc(9));
        let c = Expression::special_attribute_lookup(Expression::variable("x", loc(1)), "a", loc(1));
        assert!(a.structurally_eq(&b));
        assert!(!a.structurally_eq(&c));
    }
}
