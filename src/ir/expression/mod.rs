// Expression Node Module
//
// The expression IR the optimizer rewrites, split into focused submodules:
//
// - node_types: the Expression enum, constructors and builtin argument structs
// - node_impl: identity, child access by role, relinking, cloning, equality
// - node_operations: capability queries (raising, side effects, constness)

pub mod node_types;
pub mod node_impl;
pub mod node_operations;

pub use node_types::*;
