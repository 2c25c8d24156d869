//! Error types for semantic analysis and evaluation.
//!
//! Two taxonomies live here:
//!
//! - `SemanticError`: every way a program can be statically rejected
//! - `RuntimeError`: every way evaluation can fault, including states the
//!   language itself leaves unspecified and we surface as explicit errors

pub mod errors;

#[cfg(test)]
mod tests;
