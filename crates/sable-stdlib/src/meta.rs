use sable_core::{Env, Type, Value};
use sable_eval::eval_all;

use crate::{register_fn, register_native, text};

pub fn register(env: &Env) {
    // (eval "source") reads and evaluates in a child of the calling scope
    register_native(env, "eval", vec![Type::Str], None, |args, env| {
        let mut nodes = sable_reader::read_many(text(&args[0])?)?;
        eval_all(&mut nodes, &env.create_child())
    });

    register_fn(env, "type-of", vec![Type::Any], |args| {
        Ok(Value::id(args[0].type_name()))
    });

    register_native(env, "bound?", vec![Type::Id], None, |args, env| {
        let bound = args[0].as_id().is_some_and(|name| env.contains(name));
        Ok(Value::Bool(bound))
    });
}
