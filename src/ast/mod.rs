//! Syntax tree input shape.
//!
//! This module defines what the crate consumes: the token kinds shared with
//! the external scanner and the tagged-union node types the external parser
//! produces.
//!
//! Submodules:
//! - tokens: token kinds and the token struct
//! - nodes: tree node definitions with analyzer annotation slots

pub mod nodes;
pub mod tokens;
