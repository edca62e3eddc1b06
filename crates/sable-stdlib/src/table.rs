use indexmap::IndexMap;
use sable_core::{Env, Result, SableError, Type, Value};

use crate::{register_fn, register_variadic};

pub fn register(env: &Env) {
    // (table k1 v1 k2 v2 ...)
    register_variadic(env, "table", vec![], Type::Any, |args| {
        if args.len() % 2 != 0 {
            return Err(SableError::eval(
                "table: expects an even number of arguments (key value ...)",
            ));
        }
        let entries = args
            .chunks(2)
            .map(|kv| (kv[0].clone(), kv[1].clone()))
            .collect();
        Ok(Value::table(entries))
    });

    register_fn(env, "table-put", vec![Type::Table, Type::Any, Type::Any], |args| {
        let mut entries = entries(&args[0])?;
        entries.insert(args[1].clone(), args[2].clone());
        Ok(Value::table(entries))
    });
    register_fn(env, "table-put!", vec![Type::Table, Type::Any, Type::Any], |args| {
        if let Some(t) = args[0].as_table() {
            t.write().insert(args[1].clone(), args[2].clone());
        }
        Ok(args[0].clone())
    });

    register_fn(env, "table-get", vec![Type::Table, Type::Any], |args| {
        Ok(entries(&args[0])?.get(&args[1]).cloned().unwrap_or(Value::Nil))
    });
    register_fn(env, "table-get", vec![Type::Table, Type::Any, Type::Any], |args| {
        Ok(entries(&args[0])?
            .get(&args[1])
            .cloned()
            .unwrap_or_else(|| args[2].clone()))
    });

    register_fn(env, "table-remove", vec![Type::Table, Type::Any], |args| {
        let mut entries = entries(&args[0])?;
        entries.shift_remove(&args[1]);
        Ok(Value::table(entries))
    });
    register_fn(env, "table-remove!", vec![Type::Table, Type::Any], |args| {
        if let Some(t) = args[0].as_table() {
            t.write().shift_remove(&args[1]);
        }
        Ok(args[0].clone())
    });

    register_fn(env, "table-keys", vec![Type::Table], |args| {
        Ok(Value::list(entries(&args[0])?.into_keys().collect()))
    });
    register_fn(env, "table-values", vec![Type::Table], |args| {
        Ok(Value::list(entries(&args[0])?.into_values().collect()))
    });

    register_fn(env, "table-contains", vec![Type::Table, Type::Any], |args| {
        Ok(Value::Bool(entries(&args[0])?.contains_key(&args[1])))
    });
}

/// Snapshot of a table's entries, insertion ordered.
fn entries(v: &Value) -> Result<IndexMap<Value, Value>> {
    v.as_table()
        .map(|t| t.read().clone())
        .ok_or_else(|| SableError::type_error("table", v.type_name()))
}
