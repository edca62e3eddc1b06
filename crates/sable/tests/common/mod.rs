#![allow(dead_code)]

use sable::{Interpreter, SableError, Value};

/// Evaluate in a fresh interpreter session.
pub fn eval(input: &str) -> Value {
    let interp = Interpreter::new();
    interp
        .eval_str(input)
        .unwrap_or_else(|e| panic!("eval failed for `{input}`: {e}"))
}

/// Evaluate in a fresh session, expecting an error.
pub fn eval_err(input: &str) -> SableError {
    let interp = Interpreter::new();
    match interp.eval_str(input) {
        Ok(v) => panic!("expected error for `{input}`, got {v}"),
        Err(e) => e,
    }
}

pub fn eval_to_string(input: &str) -> String {
    eval(input).to_string()
}

/// Generate one test per `name: "source" => expected` row.
///
/// Usage:
/// ```ignore
/// eval_tests! {
///     test_name: "(+ 1 2)" => Value::int(3),
/// }
/// ```
#[macro_export]
macro_rules! eval_tests {
    ($($name:ident : $input:expr => $expected:expr),* $(,)?) => {
        $(
            paste::paste! {
                #[test]
                fn [<test_ $name>]() {
                    let result = common::eval($input);
                    assert_eq!(result, $expected, "{}", $input);
                }
            }
        )*
    };
}

/// Generate one test per `name: "source"` row that must fail to evaluate.
#[macro_export]
macro_rules! eval_error_tests {
    ($($name:ident : $input:expr),* $(,)?) => {
        $(
            paste::paste! {
                #[test]
                fn [<test_ $name _errors>]() {
                    let interp = sable::Interpreter::new();
                    assert!(interp.eval_str($input).is_err(), "should error for: {}", $input);
                }
            }
        )*
    };
}
