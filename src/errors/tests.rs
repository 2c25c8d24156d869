use pretty_assertions::assert_eq;

use super::errors::{RuntimeError, SemanticError};

#[test]
fn semantic_errors_render_the_offending_names() {
    assert_eq!(
        SemanticError::DuplicateName("Main".into()).to_string(),
        "duplicate name `Main`"
    );
    assert_eq!(
        SemanticError::TypeMismatch {
            expected: "Integer".into(),
            found: "Float".into(),
        }
        .to_string(),
        "type mismatch: expected `Integer`, found `Float`"
    );
    assert_eq!(
        SemanticError::InvalidBinaryOperator {
            operator: "+".into(),
            left: "Boolean".into(),
            right: "Integer".into(),
        }
        .to_string(),
        "binary operator `+` cannot be applied to `Boolean` and `Integer`"
    );
}

#[test]
fn runtime_errors_render_their_context() {
    assert_eq!(
        RuntimeError::NotCallable("Integer".into()).to_string(),
        "value of type `Integer` is not callable"
    );
    assert_eq!(
        RuntimeError::StepLimitExceeded(1000).to_string(),
        "step limit exceeded after 1000 steps"
    );
    assert_eq!(
        RuntimeError::MalformedNativeCall {
            name: "Sin".into(),
            expected: 1,
            got: 2,
        }
        .to_string(),
        "native function `Sin` called with 2 arguments, expected 1"
    );
}

#[test]
fn io_errors_convert_into_runtime_errors() {
    let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "sink closed");
    let err: RuntimeError = io.into();
    assert!(matches!(err, RuntimeError::HostIo(_)));
}
