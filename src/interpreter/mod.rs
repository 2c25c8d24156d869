//! Tree-walking evaluation of an analyzed program.
//!
//! Submodules:
//! - value: the runtime value model (scalars, pointers, function values)
//! - frames: activation frames, block scopes, and the global frame
//! - prepass: literal decoding and function-body collection
//! - interpreter: the evaluation engine itself
//! - corelib: the built-in output functions and host-binding examples

pub mod corelib;
pub mod frames;
pub mod interpreter;
pub mod prepass;
pub mod value;

pub use interpreter::{Bindings, Interpreter, NativeCallback};
