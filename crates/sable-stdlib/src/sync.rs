use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sable_core::{Env, Lock, SableError, ThreadHandle, Type, Value};
use sable_eval::call_function;

use crate::{register_fn, register_native};

const THREAD_STACK_SIZE: usize = 64 * 1024 * 1024;

static THREAD_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub fn register(env: &Env) {
    register_fn(env, "make-lock", vec![], |_args| {
        Ok(Value::Lock(Arc::new(Lock::new())))
    });

    register_fn(env, "lock", vec![Type::Lock], |args| {
        if let Value::Lock(lock) = &args[0] {
            lock.acquire();
        }
        Ok(Value::Nil)
    });

    register_fn(env, "unlock", vec![Type::Lock], |args| {
        if let Value::Lock(lock) = &args[0] {
            if !lock.release() {
                return Err(SableError::eval("unlock: lock is not held"));
            }
        }
        Ok(Value::Nil)
    });

    register_fn(env, "is-locked", vec![Type::Lock], |args| {
        Ok(Value::Bool(matches!(&args[0], Value::Lock(l) if l.is_locked())))
    });

    // (thread f) runs f with no arguments on a new native thread
    register_native(env, "thread", vec![Type::Function], None, |args, env| {
        let f = args[0].clone();
        let scope = env.create_child();
        let id = THREAD_COUNTER.fetch_add(1, Ordering::Relaxed);
        let name = match f.as_function() {
            Some(set) => format!("{}-{id}", set.name),
            None => format!("thread-{id}"),
        };
        tracing::debug!(thread = %name, "spawn");
        let handle = std::thread::Builder::new()
            .name(name.clone())
            .stack_size(THREAD_STACK_SIZE)
            .spawn(move || call_function(&f, Vec::new(), &scope))?;
        Ok(Value::Thread(Arc::new(ThreadHandle::new(name, handle))))
    });

    register_fn(env, "thread-join", vec![Type::Thread], |args| match &args[0] {
        Value::Thread(t) => t.join(),
        other => Err(SableError::type_error("thread", other.type_name())),
    });

    register_fn(env, "thread-alive", vec![Type::Thread], |args| {
        Ok(Value::Bool(
            matches!(&args[0], Value::Thread(t) if t.is_alive()),
        ))
    });

    register_fn(env, "sleep", vec![Type::Int], |args| {
        let ms = args[0]
            .as_i64()
            .filter(|ms| *ms >= 0)
            .ok_or_else(|| SableError::eval(format!("sleep: bad duration {}", args[0])))?;
        std::thread::sleep(Duration::from_millis(ms as u64));
        Ok(Value::Nil)
    });
}
