use thiserror::Error;

use super::exception::RuntimeException;
use super::node::{ChildRole, NodeKind, SourceRef};

/// Errors that abort optimization. Each one is a compiler bug or a malformed
/// tree handed over by an earlier stage, never a property of the compiled
/// program, so every variant carries the location it was detected at.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IrError {
    #[error("{location}: {kind} has no child role '{role}'")]
    StructuralMismatch { kind: NodeKind, role: ChildRole, location: SourceRef },

    #[error("{location}: {kind} requires argument '{argument}'")]
    MissingArgument { kind: NodeKind, argument: &'static str, location: SourceRef },

    #[error("{location}: {kind} does not carry an attribute name")]
    NotAnAttributeLookup { kind: NodeKind, location: SourceRef },

    #[error("{location}: internal invariant violated: {message}")]
    InternalInvariant { message: String, location: SourceRef },
}

pub type Result<T> = std::result::Result<T, IrError>;

/// Outcome channel of a compile-time computation handed to the safe evaluator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// The computation raised the way the compiled program would at runtime.
    /// Recoverable into a raising expression node.
    #[error("computation raised {0}")]
    Raised(RuntimeException),

    /// The computation hit a state the optimizer itself guarantees cannot
    /// happen. Never turned into an IR node.
    #[error("{0}")]
    Internal(String),
}

impl From<RuntimeException> for EvaluationError {
    fn from(exception: RuntimeException) -> Self {
        EvaluationError::Raised(exception)
    }
}
