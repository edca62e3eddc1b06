use std::sync::Arc;

use sable_core::{DispatchSet, Env, FunctionEntry, SableError, Type, Value};
use sable_eval::call_function;

use crate::{items, register_native};

pub fn register(env: &Env) {
    register_native(
        env,
        "apply-list",
        vec![Type::Function, Type::List],
        None,
        |args, env| call_function(&args[0], items(&args[1])?, env),
    );

    register_native(
        env,
        "map",
        vec![Type::Function, Type::List],
        None,
        |args, env| {
            let out = items(&args[1])?
                .into_iter()
                .map(|x| call_function(&args[0], vec![x], env))
                .collect::<sable_core::Result<Vec<_>>>()?;
            Ok(Value::list(out))
        },
    );

    register_native(
        env,
        "filter",
        vec![Type::Function, Type::List],
        None,
        |args, env| {
            let mut out = Vec::new();
            for x in items(&args[1])? {
                match call_function(&args[0], vec![x.clone()], env)? {
                    Value::Bool(true) => out.push(x),
                    Value::Bool(false) => {}
                    other => return Err(SableError::type_error("bool", other.type_name())),
                }
            }
            Ok(Value::list(out))
        },
    );

    register_native(
        env,
        "foldl",
        vec![Type::Function, Type::Any, Type::List],
        None,
        |args, env| {
            let mut acc = args[1].clone();
            for x in items(&args[2])? {
                acc = call_function(&args[0], vec![acc, x], env)?;
            }
            Ok(acc)
        },
    );

    register_native(
        env,
        "foldr",
        vec![Type::Function, Type::Any, Type::List],
        None,
        |args, env| {
            let mut acc = args[1].clone();
            for x in items(&args[2])?.into_iter().rev() {
                acc = call_function(&args[0], vec![x, acc], env)?;
            }
            Ok(acc)
        },
    );

    register_native(
        env,
        "for-each",
        vec![Type::Function, Type::List],
        None,
        |args, env| {
            for x in items(&args[1])? {
                call_function(&args[0], vec![x], env)?;
            }
            Ok(Value::Nil)
        },
    );

    // (curry f a b) => a function that calls f with a, b and then its own arguments
    register_native(
        env,
        "curry",
        vec![Type::Function],
        Some(Type::Any),
        |args, _env| {
            let f = args[0].clone();
            let bound: Arc<[Value]> = args[1..].into();
            let name = args[0]
                .as_function()
                .map(|set| set.name.clone())
                .unwrap_or_default();
            let curried = FunctionEntry::native(
                format!("curry {name}"),
                Vec::new(),
                move |rest, env| {
                    let mut all = bound.to_vec();
                    all.extend_from_slice(rest);
                    call_function(&f, all, env)
                },
            )
            .variadic(Type::Any);
            Ok(Value::function(DispatchSet::single(curried)))
        },
    );

    // (maybe f x) => nil when x is nil, otherwise (f x)
    register_native(
        env,
        "maybe",
        vec![Type::Function, Type::Any],
        None,
        |args, env| {
            if args[1].is_nil() {
                return Ok(Value::Nil);
            }
            call_function(&args[0], vec![args[1].clone()], env)
        },
    );
}
