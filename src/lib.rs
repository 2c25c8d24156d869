//! Static semantics and tree-walking evaluation for a small statically
//! typed language with classes, functions, and pointers.
//!
//! The scanner and parser are external collaborators: this crate takes a
//! finished syntax tree (`ast`), checks it in four passes that populate a
//! symbol table (`analyzer` + `library`), and then executes the annotated
//! tree directly (`interpreter`).
//!
//! ```
//! use interpreter::analyzer::analyze;
//! use interpreter::ast::nodes::{
//!     BlockNode, ExpressionNode, FunctionNode, GlobalNode, ReturnNode, ScopeNode, StatementNode,
//!     TypeReferenceNode,
//! };
//! use interpreter::interpreter::{corelib, Bindings, Interpreter};
//! use interpreter::library::library::Library;
//!
//! let mut library = Library::new();
//! let mut bindings = Bindings::default();
//! corelib::install(&mut library, &mut bindings).unwrap();
//!
//! let mut block = BlockNode::new(vec![GlobalNode::Function(FunctionNode::new(
//!     "Main",
//!     Vec::new(),
//!     Some(TypeReferenceNode::named("Integer")),
//!     ScopeNode::new(vec![StatementNode::Return(ReturnNode {
//!         value: Some(ExpressionNode::integer(5)),
//!     })]),
//! ))]);
//! analyze(&mut block, &mut library).unwrap();
//!
//! let mut out = Vec::new();
//! let value = Interpreter::new(&mut block, &library, bindings, &mut out)
//!     .unwrap()
//!     .run_entry("Main")
//!     .unwrap();
//! assert_eq!(value.as_integer(), Some(5));
//! ```

#![allow(clippy::module_inception)]

pub mod analyzer;
pub mod ast;
pub mod errors;
pub mod interpreter;
pub mod library;
