/// Node identity and shape
///
/// This module provides the static description shared by every expression node:
/// the kind discriminator, the named child roles each kind declares, the source
/// location carried for diagnostics, and the closed vocabulary of change tags
/// that simplification reports back to the optimizer driver.
///
/// Design principles:
/// - Kinds are a closed enum so dispatch and diagnostics never compare strings
/// - Child roles are fixed per kind; optional roles exist even when empty
/// - Locations are plain values, cheap to clone onto replacement nodes

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Provenance of a node in the compiled source (file and 1-based line).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    pub file: Arc<str>,
    pub line: u32,
}

impl SourceRef {
    /// Creates a new source reference.
    pub fn new(file: impl Into<Arc<str>>, line: u32) -> Self {
        SourceRef { file: file.into(), line }
    }

    /// Returns a reference to the same file at another line.
    pub fn at_line(&self, line: u32) -> Self {
        SourceRef { file: Arc::clone(&self.file), line }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Discriminator for the expression node variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    // Attribute access family
    AttributeLookup,
    SpecialAttributeLookup,
    BuiltinGetattr,
    BuiltinSetattr,
    BuiltinHasattr,

    // Receivers and operands
    ConstantRef,
    VariableRef,
    RaiseException,
    SideEffects,
    MakeTuple,
    Call,
}

impl NodeKind {
    /// Returns the child roles declared by this kind, in evaluation order.
    pub fn named_children(self) -> &'static [ChildRole] {
        match self {
            NodeKind::AttributeLookup | NodeKind::SpecialAttributeLookup => &[ChildRole::Source],
            NodeKind::BuiltinGetattr => &[ChildRole::Source, ChildRole::Attribute, ChildRole::Default],
            NodeKind::BuiltinSetattr => &[ChildRole::Source, ChildRole::Attribute, ChildRole::Value],
            NodeKind::BuiltinHasattr => &[ChildRole::Source, ChildRole::Attribute],
            NodeKind::ConstantRef | NodeKind::VariableRef | NodeKind::RaiseException => &[],
            NodeKind::SideEffects => &[ChildRole::SideEffects, ChildRole::Expression],
            NodeKind::MakeTuple => &[ChildRole::Elements],
            NodeKind::Call => &[ChildRole::Called, ChildRole::Args, ChildRole::Kw],
        }
    }

    /// Returns true if the kind declares the given role.
    pub fn declares(self, role: ChildRole) -> bool {
        self.named_children().contains(&role)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::AttributeLookup => write!(f, "AttributeLookup"),
            NodeKind::SpecialAttributeLookup => write!(f, "SpecialAttributeLookup"),
            NodeKind::BuiltinGetattr => write!(f, "Builtin::Getattr"),
            NodeKind::BuiltinSetattr => write!(f, "Builtin::Setattr"),
            NodeKind::BuiltinHasattr => write!(f, "Builtin::Hasattr"),
            NodeKind::ConstantRef => write!(f, "ConstantRef"),
            NodeKind::VariableRef => write!(f, "VariableRef"),
            NodeKind::RaiseException => write!(f, "RaiseException"),
            NodeKind::SideEffects => write!(f, "SideEffects"),
            NodeKind::MakeTuple => write!(f, "MakeTuple"),
            NodeKind::Call => write!(f, "Call"),
        }
    }
}

/// Name of a child slot within a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildRole {
    Source,
    Attribute,
    Default,
    Value,
    Called,
    Args,
    Kw,
    Expression,
    SideEffects,
    Elements,
}

impl ChildRole {
    /// Returns true for roles that hold a sequence of children rather than one.
    pub fn is_sequence(self) -> bool {
        matches!(self, ChildRole::SideEffects | ChildRole::Elements)
    }
}

impl fmt::Display for ChildRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChildRole::Source => "source",
            ChildRole::Attribute => "attribute",
            ChildRole::Default => "default",
            ChildRole::Value => "value",
            ChildRole::Called => "called",
            ChildRole::Args => "args",
            ChildRole::Kw => "kw",
            ChildRole::Expression => "expression",
            ChildRole::SideEffects => "side_effects",
            ChildRole::Elements => "elements",
        };
        f.write_str(name)
    }
}

/// What kind of change a simplification made.
///
/// Absence of a tag (see `Simplification::Unchanged`) means the node is terminal
/// for the current facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeTag {
    /// The node was replaced by a subtree that unconditionally raises.
    ExceptionPropagated,
    /// The node was replaced by a different, simpler expression.
    Rewritten,
    /// The node was evaluated at compile time into a constant.
    ConstantFolded,
}

impl ChangeTag {
    /// Short tag used in optimization traces.
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeTag::ExceptionPropagated => "new_raise",
            ChangeTag::Rewritten => "new_expression",
            ChangeTag::ConstantFolded => "new_constant",
        }
    }
}

impl fmt::Display for ChangeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
