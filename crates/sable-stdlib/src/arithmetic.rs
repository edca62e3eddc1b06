use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use sable_core::{Env, Result, SableError, Type, Value};

use crate::{register_fn, register_variadic, text};

/// Significant digits kept by `/`.
const DIVISION_PRECISION: u64 = 32;

pub fn register(env: &Env) {
    // Each operator has an exact integer overload and a mixed numeric one;
    // all-int calls score higher on the int overload.
    register_variadic(env, "+", vec![Type::Int], Type::Int, |args| {
        let ns = ints(args)?;
        Ok(Value::Int(ns.into_iter().sum()))
    });
    register_variadic(env, "+", vec![Type::Num], Type::Num, |args| {
        let ds = decimals(args)?;
        Ok(Value::Real(ds.into_iter().sum()))
    });

    register_variadic(env, "-", vec![Type::Int], Type::Int, |args| {
        let ns = ints(args)?;
        let (first, rest) = split(ns, "-")?;
        if rest.is_empty() {
            return Ok(Value::Int(-first));
        }
        Ok(Value::Int(rest.into_iter().fold(first, |acc, n| acc - n)))
    });
    register_variadic(env, "-", vec![Type::Num], Type::Num, |args| {
        let ds = decimals(args)?;
        let (first, rest) = split(ds, "-")?;
        if rest.is_empty() {
            return Ok(Value::Real(-first));
        }
        Ok(Value::Real(rest.into_iter().fold(first, |acc, d| acc - d)))
    });

    register_variadic(env, "*", vec![Type::Int], Type::Int, |args| {
        let ns = ints(args)?;
        Ok(Value::Int(ns.into_iter().product()))
    });
    register_variadic(env, "*", vec![Type::Num], Type::Num, |args| {
        let ds = decimals(args)?;
        let product = ds
            .into_iter()
            .fold(BigDecimal::from(1), |acc, d| acc * d);
        Ok(Value::Real(product))
    });

    register_variadic(env, "/", vec![Type::Num, Type::Num], Type::Num, |args| {
        let ds = decimals(args)?;
        let (first, rest) = split(ds, "/")?;
        let mut result = first;
        for d in rest {
            if d.is_zero() {
                return Err(SableError::eval("/: division by zero"));
            }
            result = (result / d).with_prec(DIVISION_PRECISION);
        }
        Ok(Value::Real(result.normalized()))
    });

    register_fn(env, "mod", vec![Type::Int, Type::Int], |args| {
        let ns = ints(args)?;
        let (a, b) = (&ns[0], &ns[1]);
        if b.is_zero() {
            return Err(SableError::eval("mod: division by zero"));
        }
        // result takes the sign of the divisor
        let r = a % b;
        let r = if !r.is_zero() && r.is_negative() != b.is_negative() {
            r + b
        } else {
            r
        };
        Ok(Value::Int(r))
    });

    register_fn(env, "abs", vec![Type::Int], |args| {
        Ok(Value::Int(ints(args)?[0].abs()))
    });
    register_fn(env, "abs", vec![Type::Real], |args| {
        Ok(Value::Real(decimals(args)?[0].abs()))
    });

    register_fn(env, "->string", vec![Type::Any], |args| {
        Ok(Value::string(&args[0].display_string()))
    });

    register_fn(env, "->int", vec![Type::Int], |args| Ok(args[0].clone()));
    register_fn(env, "->int", vec![Type::Real], |args| {
        let d = decimals(args)?.remove(0);
        // truncates toward zero
        let (digits, _) = d.with_scale(0).into_bigint_and_exponent();
        Ok(Value::Int(digits))
    });
    register_fn(env, "->int", vec![Type::Str], |args| {
        let s = text(&args[0])?;
        s.trim()
            .parse::<BigInt>()
            .map(Value::Int)
            .map_err(|_| SableError::eval(format!("->int: cannot parse {s:?} as an integer")))
    });

    register_fn(env, "->real", vec![Type::Num], |args| {
        Ok(Value::Real(decimals(args)?.remove(0)))
    });
    register_fn(env, "->real", vec![Type::Str], |args| {
        let s = text(&args[0])?;
        s.trim()
            .parse::<BigDecimal>()
            .map(Value::Real)
            .map_err(|_| SableError::eval(format!("->real: cannot parse {s:?} as a number")))
    });
}

pub(crate) fn ints(args: &[Value]) -> Result<Vec<BigInt>> {
    args.iter()
        .map(|a| {
            a.as_int()
                .cloned()
                .ok_or_else(|| SableError::type_error("int", a.type_name()))
        })
        .collect()
}

pub(crate) fn decimals(args: &[Value]) -> Result<Vec<BigDecimal>> {
    args.iter()
        .map(|a| {
            a.as_decimal()
                .ok_or_else(|| SableError::type_error("num", a.type_name()))
        })
        .collect()
}

fn split<T>(items: Vec<T>, name: &str) -> Result<(T, Vec<T>)> {
    let mut items = items.into_iter();
    let first = items
        .next()
        .ok_or_else(|| SableError::arity(name, "1+", 0))?;
    Ok((first, items.collect()))
}
