use std::cmp::Ordering;

use sable_core::{Env, Result, SableError, Type, Value};

use crate::{register_fn, register_variadic};

pub fn register(env: &Env) {
    register_fn(env, "=", vec![Type::Any, Type::Any], |args| {
        Ok(Value::Bool(args[0] == args[1]))
    });
    register_fn(env, "/=", vec![Type::Any, Type::Any], |args| {
        Ok(Value::Bool(args[0] != args[1]))
    });

    register_chain(env, "<", |o| o == Ordering::Less);
    register_chain(env, ">", |o| o == Ordering::Greater);
    register_chain(env, "<=", |o| o != Ordering::Greater);
    register_chain(env, ">=", |o| o != Ordering::Less);

    register_variadic(env, "and", vec![Type::Bool, Type::Bool], Type::Bool, |args| {
        Ok(Value::Bool(args.iter().all(|a| a.as_bool() == Some(true))))
    });
    register_variadic(env, "or", vec![Type::Bool, Type::Bool], Type::Bool, |args| {
        Ok(Value::Bool(args.iter().any(|a| a.as_bool() == Some(true))))
    });
    register_fn(env, "not", vec![Type::Bool], |args| {
        Ok(Value::Bool(args[0].as_bool() != Some(true)))
    });
}

/// `(< a b c)` holds when every adjacent pair does.
fn register_chain(env: &Env, name: &'static str, holds: fn(Ordering) -> bool) {
    register_variadic(env, name, vec![Type::Num, Type::Num], Type::Num, move |args| {
        for pair in args.windows(2) {
            if !holds(compare(&pair[0], &pair[1], name)?) {
                return Ok(Value::Bool(false));
            }
        }
        Ok(Value::Bool(true))
    });
}

fn compare(a: &Value, b: &Value, name: &str) -> Result<Ordering> {
    if let (Value::Int(x), Value::Int(y)) = (a, b) {
        return Ok(x.cmp(y));
    }
    match (a.as_decimal(), b.as_decimal()) {
        (Some(x), Some(y)) => Ok(x.cmp(&y)),
        _ => Err(SableError::eval(format!(
            "{name}: cannot compare {} with {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}
