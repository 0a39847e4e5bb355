//! Integration tests for error types

use nml_foundation::{Error, RuntimeError, SyntaxError, ValueType};

#[test]
fn syntax_errors_wrap_into_both_families() {
    let syntax = SyntaxError::new(2, "no blocks to end");

    let runtime: RuntimeError = syntax.clone().into();
    assert_eq!(runtime, RuntimeError::Compile(syntax.clone()));
    assert_eq!(
        runtime.to_string(),
        "verb failed to compile: line 2: no blocks to end"
    );

    let error: Error = syntax.into();
    assert_eq!(error.to_string(), "syntax error: line 2: no blocks to end");
}

#[test]
fn runtime_errors_wrap_into_error() {
    let error: Error = RuntimeError::TickLimitExceeded(50).into();
    assert!(matches!(
        error,
        Error::Runtime(RuntimeError::TickLimitExceeded(50))
    ));
    assert_eq!(error.to_string(), "runtime error: tick limit exceeded (50)");
}

#[test]
fn messages_name_what_failed() {
    assert_eq!(
        RuntimeError::UnknownAlias("ROOT".into()).to_string(),
        "unknown object alias: ##ROOT"
    );
    assert_eq!(
        RuntimeError::IndexOutOfBounds {
            index: 4,
            length: 2
        }
        .to_string(),
        "index out of bounds: 4 (length 2)"
    );
    assert_eq!(
        RuntimeError::NonIndexable(ValueType::Number).to_string(),
        "cannot index into a value of type number"
    );
}

#[test]
fn only_end_of_script_is_normal_completion() {
    assert!(RuntimeError::EndOfScript.is_end_of_script());
    assert!(!RuntimeError::CallDepthExceeded(8).is_end_of_script());
}
