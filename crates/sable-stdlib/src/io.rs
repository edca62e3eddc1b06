use std::io::Write;

use sable_core::{Env, Type, Value};

use crate::{register_fn, register_variadic};

pub fn register(env: &Env) {
    register_variadic(env, "print", vec![], Type::Any, |args| {
        let mut out = std::io::stdout().lock();
        write_all(&mut out, args)?;
        out.flush()?;
        Ok(Value::Nil)
    });

    register_variadic(env, "println", vec![], Type::Any, |args| {
        let mut out = std::io::stdout().lock();
        write_all(&mut out, args)?;
        writeln!(out)?;
        Ok(Value::Nil)
    });

    register_fn(env, "newline", vec![], |_args| {
        println!();
        Ok(Value::Nil)
    });
}

/// Display strings separated by single spaces.
fn write_all(out: &mut impl Write, args: &[Value]) -> std::io::Result<()> {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(out, " ")?;
        }
        write!(out, "{}", arg.display_string())?;
    }
    Ok(())
}
