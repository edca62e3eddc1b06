use sable_core::{Env, Type, Value};

use crate::register_fn;

pub fn register(env: &Env) {
    let checks: [(&str, fn(&Value) -> bool); 11] = [
        ("nil?", |v| matches!(v, Value::Nil)),
        ("bool?", |v| matches!(v, Value::Bool(_))),
        ("int?", |v| matches!(v, Value::Int(_))),
        ("real?", |v| matches!(v, Value::Real(_))),
        ("num?", |v| matches!(v, Value::Int(_) | Value::Real(_))),
        ("byte?", |v| matches!(v, Value::Byte(_))),
        ("string?", |v| matches!(v, Value::Str(_))),
        ("id?", |v| matches!(v, Value::Id(_))),
        ("list?", |v| matches!(v, Value::List(_))),
        ("table?", |v| matches!(v, Value::Table(_))),
        ("function?", |v| matches!(v, Value::Function(_))),
    ];
    for (name, check) in checks {
        register_fn(env, name, vec![Type::Any], move |args| {
            Ok(Value::Bool(check(&args[0])))
        });
    }
}
