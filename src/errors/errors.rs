use thiserror::Error;

/// A static rejection produced by the semantic analyzer.
///
/// Every variant carries a rendered description of the offending construct;
/// analysis stops at the first error found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("duplicate name `{0}`")]
    DuplicateName(String),

    #[error("symbol `{0}` not found")]
    SymbolNotFound(String),

    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch { expected: String, found: String },

    #[error("type `{type_name}` has no member `{member}`")]
    InvalidMemberAccess { type_name: String, member: String },

    #[error("invalid call: {0}")]
    InvalidCall(String),

    #[error("cannot cast `{from}` to `{to}`")]
    InvalidCast { from: String, to: String },

    #[error("cannot index into value of type `{0}`")]
    InvalidIndexer(String),

    #[error("`{0}` used outside of a loop")]
    BreakContinueOutsideLoop(String),

    #[error("label `{0}` not found in the enclosing function")]
    LabelNotFound(String),

    #[error("unary operator `{operator}` cannot be applied to `{operand}`")]
    InvalidUnaryOperator { operator: String, operand: String },

    #[error("binary operator `{operator}` cannot be applied to `{left}` and `{right}`")]
    InvalidBinaryOperator {
        operator: String,
        left: String,
        right: String,
    },

    #[error("condition has type `{0}`, expected a boolean or pointer")]
    ConditionExpectedBooleanOrPointer(String),
}

/// A fault raised during evaluation.
///
/// The language leaves several runtime states unspecified (calling through
/// an unbound function value, dereferencing null, running a `goto`). Those
/// all surface here as explicit variants instead of aborting the host.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("value of type `{0}` is not callable")]
    NotCallable(String),

    #[error("function `{0}` has no body and no native binding")]
    UnboundFunction(String),

    #[error("null pointer dereference")]
    NullDereference,

    #[error("left side of assignment is not a storage location")]
    NotAssignable,

    #[error("division by zero")]
    DivisionByZero,

    #[error("step limit exceeded after {0} steps")]
    StepLimitExceeded(u64),

    #[error("unsupported runtime operation: {0}")]
    Unsupported(String),

    #[error("output error: {0}")]
    HostIo(#[from] std::io::Error),

    #[error("malformed literal `{0}`")]
    MalformedLiteral(String),

    #[error("tree was not analyzed before execution: {0}")]
    NotAnalyzed(String),

    #[error("invalid entry point: {0}")]
    InvalidEntryPoint(String),

    #[error("condition evaluated to a non-boolean, non-pointer value")]
    InvalidCondition,

    #[error("invalid pointer arithmetic: {0}")]
    InvalidPointerArithmetic(String),

    #[error("native function `{name}` called with {got} arguments, expected {expected}")]
    MalformedNativeCall {
        name: String,
        expected: usize,
        got: usize,
    },
}
