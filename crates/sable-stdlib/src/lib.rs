mod arithmetic;
mod comparison;
mod higher_order;
mod io;
mod list;
mod meta;
mod predicates;
mod stream;
mod sync;
mod table;

use sable_core::{Env, FunctionEntry, Result, SableError, Type, Value};

/// Register every builtin into `env`.
pub fn register_stdlib(env: &Env) {
    arithmetic::register(env);
    comparison::register(env);
    list::register(env);
    table::register(env);
    stream::register(env);
    higher_order::register(env);
    predicates::register(env);
    meta::register(env);
    io::register(env);
    sync::register(env);
    tracing::debug!(names = env.names().len(), "stdlib registered");
}

fn register_fn(
    env: &Env,
    name: &str,
    params: Vec<Type>,
    f: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
) {
    env.register(FunctionEntry::simple(name, params, f));
}

/// Trailing arguments must satisfy `rest`.
fn register_variadic(
    env: &Env,
    name: &str,
    params: Vec<Type>,
    rest: Type,
    f: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
) {
    env.register(FunctionEntry::simple(name, params, f).variadic(rest));
}

/// A builtin that needs the calling scope (callbacks, `eval`, threads).
fn register_native(
    env: &Env,
    name: &str,
    params: Vec<Type>,
    rest: Option<Type>,
    f: impl Fn(&[Value], &Env) -> Result<Value> + Send + Sync + 'static,
) {
    let mut entry = FunctionEntry::native(name, params, f);
    entry.variadic = rest;
    env.register(entry);
}

pub(crate) fn text(v: &Value) -> Result<&str> {
    v.as_str()
        .ok_or_else(|| SableError::type_error("string", v.type_name()))
}

pub(crate) fn items(v: &Value) -> Result<Vec<Value>> {
    v.list_items()
        .ok_or_else(|| SableError::type_error("list", v.type_name()))
}

/// A non-negative index into a collection of `len` items.
pub(crate) fn index(v: &Value, len: usize, name: &str) -> Result<usize> {
    match v.as_i64() {
        Some(i) if i >= 0 && (i as usize) < len => Ok(i as usize),
        _ => Err(SableError::eval(format!(
            "{name}: index {v} out of range for length {len}"
        ))),
    }
}
