//! Sable: a small Lisp with overload dispatch, closures and textual macros.
//!
//! This module provides the embedding API for the Sable interpreter.
//!
//! # Quick Start
//!
//! ```no_run
//! use sable::{Interpreter, Value};
//!
//! let interp = Interpreter::new();
//! let result = interp.eval_str("(+ 1 2)").unwrap();
//! assert_eq!(result, Value::int(3));
//! ```

use std::path::Path;
use std::sync::OnceLock;

// Re-export core types.
pub use sable_core::{
    intern, resolve, with_resolved, Env, FunctionEntry, Node, SableError, Type, Value,
};

/// Result of evaluating a Sable expression.
pub type EvalResult = Result<Value>;

pub type Result<T> = std::result::Result<T, SableError>;

/// Scope holding the special forms and `apply`.
static CORE_ROOT: OnceLock<Env> = OnceLock::new();

/// Child of [`CORE_ROOT`] holding the standard library.
static PRELUDE_ROOT: OnceLock<Env> = OnceLock::new();

fn core_root() -> &'static Env {
    CORE_ROOT.get_or_init(|| {
        let env = Env::new();
        sable_eval::register_core(&env);
        tracing::debug!("core root initialized");
        env
    })
}

fn prelude_root() -> &'static Env {
    PRELUDE_ROOT.get_or_init(|| {
        let env = core_root().create_child();
        sable_stdlib::register_stdlib(&env);
        env
    })
}

/// Builder for configuring and constructing an [`Interpreter`].
///
/// By default the standard library is enabled and the evaluation depth
/// limit is [`sable_eval::DEFAULT_MAX_DEPTH`].
pub struct InterpreterBuilder {
    stdlib: bool,
    max_depth: Option<usize>,
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InterpreterBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            stdlib: true,
            max_depth: None,
        }
    }

    /// Enable or disable the standard library (default: `true`).
    pub fn with_stdlib(mut self, enable: bool) -> Self {
        self.stdlib = enable;
        self
    }

    /// Disable the standard library. Special forms stay available.
    pub fn without_stdlib(self) -> Self {
        self.with_stdlib(false)
    }

    /// Limit nested call evaluation. The limit is process-wide.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Build the [`Interpreter`] with the configured options.
    pub fn build(self) -> Interpreter {
        if let Some(depth) = self.max_depth {
            sable_eval::set_max_depth(depth);
        }
        let root = if self.stdlib {
            prelude_root()
        } else {
            core_root()
        };
        tracing::debug!(stdlib = self.stdlib, max_depth = sable_eval::max_depth(), "interpreter");
        Interpreter {
            env: root.create_child(),
        }
    }
}

/// A Sable interpreter session.
///
/// Each session evaluates in its own child of the shared root scope, so
/// definitions from one session are not visible in another.
pub struct Interpreter {
    env: Env,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    /// Create an [`InterpreterBuilder`] for fine-grained configuration.
    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    /// Evaluate a copy of a parsed node in the session scope.
    pub fn eval(&self, node: &Node) -> EvalResult {
        sable_eval::evaluate(&mut node.clone(), &self.env)
    }

    /// Parse and evaluate a string containing one or more Sable expressions.
    ///
    /// Definitions persist across calls, so you can define a function in one
    /// call and use it in the next.
    pub fn eval_str(&self, input: &str) -> EvalResult {
        let mut nodes = sable_reader::read_many(input)?;
        sable_eval::eval_all(&mut nodes, &self.env)
    }

    /// Read and evaluate a source file.
    pub fn load_file(&self, path: impl AsRef<Path>) -> EvalResult {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| SableError::Io(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), bytes = source.len(), "load");
        self.eval_str(&source)
    }

    /// Register a native overload that can be called from Sable code.
    ///
    /// A name that is already bound to functions gains another overload.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sable::{Interpreter, Type, Value};
    ///
    /// let interp = Interpreter::new();
    /// interp.register_native("twice", vec![Type::Int], None, |args: &[Value]| {
    ///     let n = args[0].as_i64().unwrap_or(0);
    ///     Ok(Value::int(n * 2))
    /// });
    /// ```
    pub fn register_native<F>(&self, name: &str, params: Vec<Type>, variadic: Option<Type>, f: F)
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let mut entry = FunctionEntry::simple(name, params, f);
        entry.variadic = variadic;
        self.env.register(entry);
    }

    /// Register an untyped native function accepting any arguments.
    pub fn register_fn<F>(&self, name: &str, f: F)
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.register_native(name, Vec::new(), Some(Type::Any), f);
    }

    /// The session scope.
    pub fn env(&self) -> &Env {
        &self.env
    }
}
