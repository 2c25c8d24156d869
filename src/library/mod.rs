//! The declared-entity table.
//!
//! Everything a program declares (types, variables, functions, labels) is a
//! `Symbol` owned by the `Library` arena and addressed by `SymbolId`. The
//! library also owns the built-in core types and the interning tables for
//! derived pointer and function-signature types.

pub mod library;

#[cfg(test)]
mod tests;
