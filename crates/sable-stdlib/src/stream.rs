use sable_core::{DispatchSet, Env, FunctionEntry, Result, SableError, Type, Value};
use sable_eval::call_function;

use crate::{items, register_fn, register_native};

/// A stream is either `empty-stream` or a two-element list: a head value and
/// a zero-argument function producing the rest of the stream.
pub fn register(env: &Env) {
    env.define_str("empty-stream", Value::EmptyStream);

    register_fn(env, "empty-stream?", vec![Type::Any], |args| {
        Ok(Value::Bool(matches!(args[0], Value::EmptyStream)))
    });

    // forcing a non-function returns it unchanged
    register_native(env, "force", vec![Type::Function], None, |args, env| {
        call_function(&args[0], Vec::new(), env)
    });
    register_fn(env, "force", vec![Type::Any], |args| Ok(args[0].clone()));

    register_fn(env, "stream-car", vec![Type::List], |args| {
        let (head, _) = cell(&args[0], "stream-car")?;
        Ok(head)
    });

    register_native(env, "stream-cdr", vec![Type::List], None, |args, env| {
        stream_cdr(&args[0], env)
    });

    register_native(
        env,
        "stream-ref",
        vec![Type::List, Type::Int],
        None,
        |args, env| {
            let n = args[1]
                .as_i64()
                .filter(|n| *n >= 0)
                .ok_or_else(|| SableError::eval(format!("stream-ref: bad index {}", args[1])))?;
            let mut s = args[0].clone();
            for _ in 0..n {
                s = stream_cdr(&s, env)?;
            }
            let (head, _) = cell(&s, "stream-ref")?;
            Ok(head)
        },
    );

    register_native(
        env,
        "stream-take",
        vec![Type::Any, Type::Int],
        None,
        |args, env| {
            let n = args[1]
                .as_i64()
                .filter(|n| *n >= 0)
                .ok_or_else(|| SableError::eval(format!("stream-take: bad count {}", args[1])))?;
            let mut out = Vec::new();
            let mut s = args[0].clone();
            while (out.len() as i64) < n && !matches!(s, Value::EmptyStream) {
                let (head, _) = cell(&s, "stream-take")?;
                out.push(head);
                s = stream_cdr(&s, env)?;
            }
            Ok(Value::list(out))
        },
    );

    // (stream-map f s...) is lazy: f runs on each step's heads when forced
    register_native(
        env,
        "stream-map",
        vec![Type::Function, Type::Any],
        Some(Type::Any),
        |args, env| map_streams(args[0].clone(), args[1..].to_vec(), env),
    );

    register_native(
        env,
        "stream-filter",
        vec![Type::Function, Type::Any],
        None,
        |args, env| filter_stream(args[0].clone(), args[1].clone(), env),
    );

    // walks until the shortest stream ends
    register_native(
        env,
        "stream-for-each",
        vec![Type::Function, Type::Any],
        Some(Type::Any),
        |args, env| {
            let mut streams = args[1..].to_vec();
            while !streams.iter().any(|s| matches!(s, Value::EmptyStream)) {
                let mut heads = Vec::with_capacity(streams.len());
                let mut rests = Vec::with_capacity(streams.len());
                for s in &streams {
                    let (head, rest) = cell(s, "stream-for-each")?;
                    heads.push(head);
                    rests.push(rest);
                }
                call_function(&args[0], heads, env)?;
                streams = rests
                    .iter()
                    .map(|rest| force_rest(rest, env))
                    .collect::<Result<_>>()?;
            }
            Ok(Value::Nil)
        },
    );
}

fn cell(s: &Value, name: &str) -> Result<(Value, Value)> {
    if matches!(s, Value::EmptyStream) {
        return Err(SableError::eval(format!("{name}: empty stream")));
    }
    let xs = items(s)?;
    match <[Value; 2]>::try_from(xs) {
        Ok([head, rest]) => Ok((head, rest)),
        Err(xs) => Err(SableError::eval(format!(
            "{name}: expected a stream cell (head promise), got a list of {}",
            xs.len()
        ))),
    }
}

fn stream_cdr(s: &Value, env: &Env) -> Result<Value> {
    let (_, rest) = cell(s, "stream-cdr")?;
    force_rest(&rest, env)
}

fn force_rest(rest: &Value, env: &Env) -> Result<Value> {
    match rest {
        Value::Function(_) => call_function(rest, Vec::new(), env),
        other => Ok(other.clone()),
    }
}

/// A zero-argument function value standing in for the rest of a stream.
fn promise(
    name: &str,
    f: impl Fn(&Env) -> Result<Value> + Send + Sync + 'static,
) -> Value {
    Value::function(DispatchSet::single(FunctionEntry::native(
        name,
        Vec::new(),
        move |_args, env| f(env),
    )))
}

fn map_streams(f: Value, streams: Vec<Value>, env: &Env) -> Result<Value> {
    if streams.iter().any(|s| matches!(s, Value::EmptyStream)) {
        return Ok(Value::EmptyStream);
    }
    let mut heads = Vec::with_capacity(streams.len());
    let mut rests = Vec::with_capacity(streams.len());
    for s in &streams {
        let (head, rest) = cell(s, "stream-map")?;
        heads.push(head);
        rests.push(rest);
    }
    let head = call_function(&f, heads, env)?;
    let rest = promise("stream-map", move |env| {
        let forced = rests
            .iter()
            .map(|rest| force_rest(rest, env))
            .collect::<Result<Vec<_>>>()?;
        map_streams(f.clone(), forced, env)
    });
    Ok(Value::list(vec![head, rest]))
}

/// Skips rejected elements eagerly up to the next match, then defers.
fn filter_stream(pred: Value, mut s: Value, env: &Env) -> Result<Value> {
    loop {
        if matches!(s, Value::EmptyStream) {
            return Ok(Value::EmptyStream);
        }
        let (head, rest) = cell(&s, "stream-filter")?;
        match call_function(&pred, vec![head.clone()], env)? {
            Value::Bool(true) => {
                let tail = promise("stream-filter", move |env| {
                    filter_stream(pred.clone(), force_rest(&rest, env)?, env)
                });
                return Ok(Value::list(vec![head, tail]));
            }
            Value::Bool(false) => s = force_rest(&rest, env)?,
            other => return Err(SableError::type_error("bool", other.type_name())),
        }
    }
}
