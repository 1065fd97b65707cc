//! Expression IR for attribute-access folding.
//!
//! Trees are immutable and shared through `Arc`; optimization builds new
//! spines and reuses every untouched subtree.

pub mod constant;
pub mod error;
pub mod exception;
pub mod expression;
pub mod helpers;
pub mod node;
pub mod optimization;

pub use error::{EvaluationError, IrError};
pub use expression::Expression;
pub use node::{ChangeTag, ChildRole, NodeKind, SourceRef};
