//! Semantic analysis.
//!
//! Four strictly ordered passes over the tree, each completing before the
//! next starts so later passes can rely on what earlier ones recorded:
//!
//! - pass A declares a type for every class
//! - pass B resolves type references and computes function signatures
//! - pass C registers variable, function, and label symbols with their owners
//! - pass D resolves names and types every expression
//!
//! Submodules:
//! - analyzer: the `analyze` driver and the lexical scope stack
//! - declarations: passes A through C
//! - expressions: pass D

pub mod analyzer;
pub mod declarations;
pub mod expressions;

pub use analyzer::analyze;

#[cfg(test)]
mod tests;
