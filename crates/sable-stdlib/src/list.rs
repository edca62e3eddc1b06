use num_bigint::BigInt;
use sable_core::{Env, SableError, Type, Value};

use crate::{index, items, register_fn, register_variadic};

pub fn register(env: &Env) {
    register_variadic(env, "list", vec![], Type::Any, |args| {
        Ok(Value::list(args.to_vec()))
    });

    register_fn(env, "cons", vec![Type::Any, Type::List], |args| {
        let mut out = vec![args[0].clone()];
        out.extend(items(&args[1])?);
        Ok(Value::list(out))
    });

    for name in ["car", "head"] {
        register_fn(env, name, vec![Type::List], move |args| {
            items(&args[0])?
                .into_iter()
                .next()
                .ok_or_else(|| SableError::eval(format!("{name}: empty list")))
        });
    }

    register_fn(env, "cdr", vec![Type::List], |args| {
        let xs = items(&args[0])?;
        if xs.is_empty() {
            return Err(SableError::eval("cdr: empty list"));
        }
        Ok(Value::list(xs[1..].to_vec()))
    });

    register_fn(env, "last", vec![Type::List], |args| {
        items(&args[0])?
            .pop()
            .ok_or_else(|| SableError::eval("last: empty list"))
    });

    // `length` is one name over three collection types
    register_fn(env, "length", vec![Type::List], |args| {
        Ok(Value::int(items(&args[0])?.len() as i64))
    });
    register_fn(env, "length", vec![Type::Str], |args| {
        Ok(Value::int(crate::text(&args[0])?.chars().count() as i64))
    });
    register_fn(env, "length", vec![Type::Table], |args| {
        let len = args[0].as_table().map(|t| t.read().len()).unwrap_or(0);
        Ok(Value::int(len as i64))
    });

    register_fn(env, "list-ref", vec![Type::List, Type::Int], |args| {
        let xs = items(&args[0])?;
        let i = index(&args[1], xs.len(), "list-ref")?;
        Ok(xs[i].clone())
    });

    register_fn(env, "list-add", vec![Type::List, Type::Any], |args| {
        let mut xs = items(&args[0])?;
        xs.push(args[1].clone());
        Ok(Value::list(xs))
    });
    register_fn(env, "list-add!", vec![Type::List, Type::Any], |args| {
        if let Some(list) = args[0].as_list() {
            list.write().push(args[1].clone());
        }
        Ok(args[0].clone())
    });

    register_fn(env, "list-set", vec![Type::List, Type::Int, Type::Any], |args| {
        let mut xs = items(&args[0])?;
        let i = index(&args[1], xs.len(), "list-set")?;
        xs[i] = args[2].clone();
        Ok(Value::list(xs))
    });
    register_fn(env, "list-set!", vec![Type::List, Type::Int, Type::Any], |args| {
        if let Some(list) = args[0].as_list() {
            let mut xs = list.write();
            let i = index(&args[1], xs.len(), "list-set!")?;
            xs[i] = args[2].clone();
        }
        Ok(args[0].clone())
    });

    register_fn(env, "list-remove", vec![Type::List, Type::Int], |args| {
        let mut xs = items(&args[0])?;
        let i = index(&args[1], xs.len(), "list-remove")?;
        xs.remove(i);
        Ok(Value::list(xs))
    });
    register_fn(env, "list-remove!", vec![Type::List, Type::Int], |args| {
        if let Some(list) = args[0].as_list() {
            let mut xs = list.write();
            let i = index(&args[1], xs.len(), "list-remove!")?;
            xs.remove(i);
        }
        Ok(args[0].clone())
    });

    register_fn(env, "list-contains", vec![Type::List, Type::Any], |args| {
        Ok(Value::Bool(items(&args[0])?.contains(&args[1])))
    });

    register_fn(env, "reverse", vec![Type::List], |args| {
        let mut xs = items(&args[0])?;
        xs.reverse();
        Ok(Value::list(xs))
    });

    register_fn(env, "range", vec![Type::Int], |args| {
        range(&BigInt::from(0), int(&args[0])?)
    });
    register_fn(env, "range", vec![Type::Int, Type::Int], |args| {
        range(int(&args[0])?, int(&args[1])?)
    });

    // `++` concatenates strings or lists
    register_variadic(env, "++", vec![Type::Str, Type::Str], Type::Str, |args| {
        let mut out = String::new();
        for a in args {
            out.push_str(crate::text(a)?);
        }
        Ok(Value::string(&out))
    });
    register_variadic(env, "++", vec![Type::List, Type::List], Type::List, |args| {
        let mut out = Vec::new();
        for a in args {
            out.extend(items(a)?);
        }
        Ok(Value::list(out))
    });
}

fn int(v: &Value) -> sable_core::Result<&BigInt> {
    v.as_int()
        .ok_or_else(|| SableError::type_error("int", v.type_name()))
}

/// Half-open `[from, to)`.
fn range(from: &BigInt, to: &BigInt) -> sable_core::Result<Value> {
    let mut out = Vec::new();
    let mut n = from.clone();
    while &n < to {
        out.push(Value::Int(n.clone()));
        n += 1u32;
    }
    Ok(Value::list(out))
}
