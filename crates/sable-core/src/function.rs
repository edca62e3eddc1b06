use std::fmt;
use std::sync::Arc;

use lasso::Spur;

use crate::ast::Node;
use crate::env::Env;
use crate::error::Result;
use crate::value::{with_resolved, Type, Value};

/// A special form receives its call node unevaluated.
pub type SpecialFn = dyn Fn(&Node, &Env) -> Result<Value> + Send + Sync;

/// A native function receives evaluated arguments.
pub type NativeFn = dyn Fn(&[Value], &Env) -> Result<Value> + Send + Sync;

/// A user-defined function.
#[derive(Debug, Clone)]
pub struct Closure {
    pub params: Vec<Spur>,
    pub rest_param: Option<Spur>,
    /// Templates, evaluated as copies on every call.
    pub body: Vec<Node>,
    pub env: Env,
}

#[derive(Clone)]
pub enum FunctionKind {
    Special(Arc<SpecialFn>),
    Native(Arc<NativeFn>),
    Closure(Arc<Closure>),
}

/// One overload of a named function.
#[derive(Clone)]
pub struct FunctionEntry {
    pub name: String,
    pub kind: FunctionKind,
    pub param_types: Vec<Type>,
    /// Element type of trailing arguments, if the entry is variadic.
    pub variadic: Option<Type>,
}

impl FunctionEntry {
    pub fn special(
        name: impl Into<String>,
        f: impl Fn(&Node, &Env) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        FunctionEntry {
            name: name.into(),
            kind: FunctionKind::Special(Arc::new(f)),
            param_types: Vec::new(),
            variadic: Some(Type::Any),
        }
    }

    pub fn native(
        name: impl Into<String>,
        param_types: Vec<Type>,
        f: impl Fn(&[Value], &Env) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        FunctionEntry {
            name: name.into(),
            kind: FunctionKind::Native(Arc::new(f)),
            param_types,
            variadic: None,
        }
    }

    /// A native function that does not need the calling scope.
    pub fn simple(
        name: impl Into<String>,
        param_types: Vec<Type>,
        f: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self::native(name, param_types, move |args, _env| f(args))
    }

    pub fn closure(name: impl Into<String>, closure: Closure) -> Self {
        let param_types = vec![Type::Any; closure.params.len()];
        let variadic = closure.rest_param.map(|_| Type::Any);
        FunctionEntry {
            name: name.into(),
            kind: FunctionKind::Closure(Arc::new(closure)),
            param_types,
            variadic,
        }
    }

    /// Accept any number of trailing arguments of type `rest`.
    pub fn variadic(mut self, rest: Type) -> Self {
        self.variadic = Some(rest);
        self
    }

    pub fn is_special(&self) -> bool {
        matches!(self.kind, FunctionKind::Special(_))
    }

    pub fn accepts_arity(&self, n: usize) -> bool {
        match self.variadic {
            Some(_) => self.param_types.len() <= n,
            None => self.param_types.len() == n,
        }
    }

    /// Sum of per-position scores, or `None` if any argument fails its constraint.
    pub fn score(&self, args: &[Value]) -> Option<u32> {
        let mut total = 0;
        for (i, arg) in args.iter().enumerate() {
            let ty = match self.param_types.get(i) {
                Some(t) => *t,
                None => self.variadic?,
            };
            total += ty.score(arg)?;
        }
        Some(total)
    }

    /// Human-readable arity, e.g. `2` or `1+`.
    pub fn arity(&self) -> String {
        match self.variadic {
            Some(_) => format!("{}+", self.param_types.len()),
            None => self.param_types.len().to_string(),
        }
    }

    /// e.g. `(+ int int . int)`
    pub fn signature(&self) -> String {
        let mut s = format!("({}", self.name);
        for t in &self.param_types {
            s.push(' ');
            s.push_str(t.name());
        }
        if let Some(rest) = self.variadic {
            s.push_str(" . ");
            s.push_str(rest.name());
        }
        s.push(')');
        s
    }
}

impl fmt::Debug for FunctionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            FunctionKind::Special(_) => "special",
            FunctionKind::Native(_) => "native",
            FunctionKind::Closure(_) => "closure",
        };
        write!(f, "<{kind} {}>", self.signature())
    }
}

impl fmt::Display for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(lambda (")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            with_resolved(*p, |name| write!(f, "{name}"))?;
        }
        if let Some(rest) = self.rest_param {
            with_resolved(rest, |name| write!(f, " . {name}"))?;
        }
        write!(f, ")")?;
        for form in &self.body {
            write!(f, " {form}")?;
        }
        write!(f, ")")
    }
}
