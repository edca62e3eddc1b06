use std::fmt;

/// Check arity of a native function's arguments, returning `SableError::Arity` on mismatch.
///
/// # Forms
///
/// ```ignore
/// check_arity!(args, "fn-name", 2);        // exactly 2
/// check_arity!(args, "fn-name", 1..=3);    // 1 to 3 inclusive
/// check_arity!(args, "fn-name", 2..);      // 2 or more
/// ```
#[macro_export]
macro_rules! check_arity {
    ($args:expr, $name:expr, $exact:literal) => {
        if $args.len() != $exact {
            return Err($crate::SableError::arity(
                $name,
                stringify!($exact),
                $args.len(),
            ));
        }
    };
    ($args:expr, $name:expr, $lo:literal ..= $hi:literal) => {
        if $args.len() < $lo || $args.len() > $hi {
            return Err($crate::SableError::arity(
                $name,
                concat!(stringify!($lo), "-", stringify!($hi)),
                $args.len(),
            ));
        }
    };
    ($args:expr, $name:expr, $lo:literal ..) => {
        if $args.len() < $lo {
            return Err($crate::SableError::arity(
                $name,
                concat!(stringify!($lo), "+"),
                $args.len(),
            ));
        }
    };
}

/// A position in source text, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

impl Span {
    pub fn new(line: usize, col: usize) -> Self {
        Span { line, col }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A single frame in a call stack trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    pub name: String,
}

/// A captured stack trace (list of call frames, innermost first).
#[derive(Debug, Clone, Default)]
pub struct StackTrace(pub Vec<CallFrame>);

impl fmt::Display for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in &self.0 {
            writeln!(f, "  at {}", frame.name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SableError {
    #[error("Reader error at {span}: {message}")]
    Reader { message: String, span: Span },

    #[error("Eval error: {0}")]
    Eval(String),

    #[error("Type error: expected {expected}, got {got}")]
    Type { expected: String, got: String },

    #[error("Arity error: {name} expects {expected} args, got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
    },

    #[error("Unbound name: {0}")]
    Unbound(String),

    #[error("No matching overload: {name} cannot be called with ({args})")]
    NoMatchingOverload { name: String, args: String },

    #[error("Ambiguous call: {name} has several equally good overloads for ({args})")]
    AmbiguousCall { name: String, args: String },

    #[error("Not callable: {0}")]
    NotCallable(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("{inner}")]
    WithTrace {
        inner: Box<SableError>,
        trace: StackTrace,
    },

    #[error("{inner}")]
    WithContext {
        inner: Box<SableError>,
        hint: String,
    },
}

pub type Result<T> = std::result::Result<T, SableError>;

/// Compute the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Find the most similar name from a list of candidates.
/// Returns `None` if no candidate is close enough.
pub fn suggest_similar(name: &str, candidates: &[&str]) -> Option<String> {
    // roughly 1/3 of the name length, min 1, max 3
    let threshold = (name.chars().count() / 3).clamp(1, 3);

    candidates
        .iter()
        .filter_map(|c| {
            let d = edit_distance(name, c);
            if d > 0 && d <= threshold {
                Some((*c, d))
            } else {
                None
            }
        })
        .min_by_key(|(_, d)| *d)
        .map(|(name, _)| name.to_string())
}

/// Targeted hints for names carried over from other Lisp dialects.
/// Checked before fuzzy matching.
pub fn dialect_hint(name: &str) -> Option<&'static str> {
    match name {
        "define" | "defvar" | "defparameter" | "defn" | "defun" => {
            Some("Sable uses 'def' for both values and functions: (def (f x) ...)")
        }
        "set!" | "setq" | "setf" => Some("Sable uses 'set' to assign an existing binding"),
        "defmacro" | "define-syntax" | "syntax-rules" => {
            Some("Sable uses 'def-symbol' for textual macros")
        }
        "progn" => Some("Sable uses 'begin' to sequence expressions"),
        "fn" => Some("Sable uses 'lambda' for anonymous functions"),
        "mapcar" => Some("Sable uses 'map' for mapping over lists"),
        "hash-ref" | "gethash" => Some("Sable uses 'table-get' to look up table entries"),
        "make-hash-table" | "hash-map" => Some("Sable uses 'table' to build tables"),
        "case" => Some("Sable uses 'switch' to compare a value against alternatives"),
        "loop" => Some("Sable uses 'while' for iteration, or recursion"),
        _ => None,
    }
}

impl SableError {
    pub fn eval(msg: impl Into<String>) -> Self {
        SableError::Eval(msg.into())
    }

    pub fn type_error(expected: impl Into<String>, got: impl Into<String>) -> Self {
        SableError::Type {
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn arity(name: impl Into<String>, expected: impl Into<String>, got: usize) -> Self {
        SableError::Arity {
            name: name.into(),
            expected: expected.into(),
            got,
        }
    }

    pub fn unbound(name: impl Into<String>) -> Self {
        SableError::Unbound(name.into())
    }

    pub fn reader(message: impl Into<String>, span: Span) -> Self {
        SableError::Reader {
            message: message.into(),
            span,
        }
    }

    /// Attach a hint (actionable suggestion) to this error, replacing any earlier one.
    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        match self {
            SableError::WithContext { inner, .. } => SableError::WithContext {
                inner,
                hint: hint.into(),
            },
            other => SableError::WithContext {
                inner: Box::new(other),
                hint: hint.into(),
            },
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            SableError::WithContext { hint, .. } => Some(hint),
            SableError::WithTrace { inner, .. } => inner.hint(),
            _ => None,
        }
    }

    /// Wrap this error with a stack trace (no-op if already wrapped or the trace is empty).
    pub fn with_stack_trace(self, trace: StackTrace) -> Self {
        if trace.0.is_empty() {
            return self;
        }
        match self {
            SableError::WithTrace { .. } => self,
            SableError::WithContext { inner, hint } => SableError::WithContext {
                inner: Box::new(inner.with_stack_trace(trace)),
                hint,
            },
            other => SableError::WithTrace {
                inner: Box::new(other),
                trace,
            },
        }
    }

    pub fn stack_trace(&self) -> Option<&StackTrace> {
        match self {
            SableError::WithTrace { trace, .. } => Some(trace),
            SableError::WithContext { inner, .. } => inner.stack_trace(),
            _ => None,
        }
    }

    pub fn inner(&self) -> &SableError {
        match self {
            SableError::WithTrace { inner, .. } => inner.inner(),
            SableError::WithContext { inner, .. } => inner.inner(),
            other => other,
        }
    }
}

impl From<std::io::Error> for SableError {
    fn from(e: std::io::Error) -> Self {
        SableError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn span_display() {
        assert_eq!(Span::new(1, 5).to_string(), "1:5");
    }

    #[test]
    fn stack_trace_display() {
        let trace = StackTrace(vec![
            CallFrame { name: "foo".into() },
            CallFrame { name: "bar".into() },
        ]);
        assert_eq!(trace.to_string(), "  at foo\n  at bar\n");
    }

    #[test]
    fn eval_error() {
        let e = SableError::eval("something broke");
        assert_eq!(e.to_string(), "Eval error: something broke");
    }

    #[test]
    fn type_error() {
        let e = SableError::type_error("bool", "int");
        assert_eq!(e.to_string(), "Type error: expected bool, got int");
    }

    #[test]
    fn arity_error() {
        let e = SableError::arity("my-fn", "2", 5);
        assert_eq!(e.to_string(), "Arity error: my-fn expects 2 args, got 5");
    }

    #[test]
    fn dispatch_error_display() {
        let e = SableError::NoMatchingOverload {
            name: "f".into(),
            args: "string int".into(),
        };
        assert_eq!(
            e.to_string(),
            "No matching overload: f cannot be called with (string int)"
        );
        let e = SableError::AmbiguousCall {
            name: "g".into(),
            args: "int".into(),
        };
        assert!(e.to_string().starts_with("Ambiguous call: g"));
    }

    #[test]
    fn with_hint() {
        let e = SableError::eval("oops").with_hint("try this");
        assert_eq!(e.hint(), Some("try this"));
        assert_eq!(e.to_string(), "Eval error: oops");
    }

    #[test]
    fn with_hint_replaces() {
        let e = SableError::eval("oops").with_hint("first").with_hint("second");
        assert_eq!(e.hint(), Some("second"));
        assert!(matches!(e, SableError::WithContext { ref inner, .. } if matches!(**inner, SableError::Eval(_))));
    }

    #[test]
    fn with_stack_trace() {
        let trace = StackTrace(vec![CallFrame { name: "f".into() }]);
        let e = SableError::eval("err").with_stack_trace(trace);
        let st = e.stack_trace().expect("should have stack trace");
        assert_eq!(st.0.len(), 1);
        assert_eq!(st.0[0].name, "f");
    }

    #[test]
    fn with_stack_trace_empty_is_noop() {
        let e = SableError::eval("err").with_stack_trace(StackTrace::default());
        assert!(e.stack_trace().is_none());
        assert!(matches!(e, SableError::Eval(_)));
    }

    #[test]
    fn with_stack_trace_already_wrapped_is_noop() {
        let e = SableError::eval("err").with_stack_trace(StackTrace(vec![CallFrame {
            name: "first".into(),
        }]));
        let e2 = e.with_stack_trace(StackTrace(vec![CallFrame {
            name: "second".into(),
        }]));
        let st = e2.stack_trace().unwrap();
        assert_eq!(st.0.len(), 1);
        assert_eq!(st.0[0].name, "first");
    }

    #[test]
    fn inner_unwraps() {
        let e = SableError::unbound("x")
            .with_hint("h")
            .with_stack_trace(StackTrace(vec![CallFrame { name: "x".into() }]));
        assert!(matches!(e.inner(), SableError::Unbound(name) if name == "x"));
        assert_eq!(e.hint(), Some("h"));
    }

    #[test]
    fn check_arity_exact() {
        fn run(args: &[Value]) -> Result<()> {
            check_arity!(args, "test-fn", 2);
            Ok(())
        }
        assert!(run(&[Value::Nil, Value::Nil]).is_ok());
        let err = run(&[Value::Nil]).unwrap_err();
        assert!(err.to_string().contains("test-fn"));
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn check_arity_range() {
        fn run(args: &[Value]) -> Result<()> {
            check_arity!(args, "range-fn", 1..=3);
            Ok(())
        }
        assert!(run(&[Value::Nil]).is_ok());
        assert!(run(&[Value::Nil, Value::Nil, Value::Nil]).is_ok());
        assert!(run(&[]).is_err());
        assert!(run(&[Value::Nil, Value::Nil, Value::Nil, Value::Nil]).is_err());
    }

    #[test]
    fn check_arity_open_range() {
        fn run(args: &[Value]) -> Result<()> {
            check_arity!(args, "open-fn", 2..);
            Ok(())
        }
        assert!(run(&[Value::Nil, Value::Nil]).is_ok());
        assert!(run(&[Value::Nil, Value::Nil, Value::Nil]).is_ok());
        assert!(run(&[Value::Nil]).is_err());
    }

    #[test]
    fn test_suggest_similar() {
        assert_eq!(
            suggest_similar("lenght", &["length", "list", "map", "println"]),
            Some("length".to_string())
        );
        assert_eq!(
            suggest_similar("pritnln", &["println", "print", "map"]),
            Some("println".to_string())
        );
        assert_eq!(suggest_similar("xyzzy", &["a", "b", "c"]), None);
    }

    #[test]
    fn test_dialect_hint() {
        assert!(dialect_hint("define").unwrap().contains("'def'"));
        assert!(dialect_hint("defmacro").unwrap().contains("def-symbol"));
        assert!(dialect_hint("def").is_none());
        assert!(dialect_hint("println").is_none());
    }
}
