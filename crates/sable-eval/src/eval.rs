use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sable_core::error::{dialect_hint, suggest_similar};
use sable_core::{
    with_resolved, CallFrame, Closure, DispatchSet, Env, FunctionEntry, FunctionKind, Node,
    Result, SableError, StackTrace, Value,
};

pub const DEFAULT_MAX_DEPTH: usize = 10_000;

/// Grow the stack when less than this much remains.
const RED_ZONE: usize = 100 * 1024;

/// Size of each additional stack segment.
const STACK_GROWTH: usize = 1024 * 1024;

static MAX_DEPTH: AtomicUsize = AtomicUsize::new(DEFAULT_MAX_DEPTH);

thread_local! {
    /// Call stack for error traces
    static CALL_STACK: RefCell<Vec<CallFrame>> = const { RefCell::new(Vec::new()) };
    /// Nesting depth of calls being evaluated on this thread
    static EVAL_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Set the process-wide limit on nested call evaluation.
pub fn set_max_depth(depth: usize) {
    MAX_DEPTH.store(depth.max(1), Ordering::Relaxed);
}

pub fn max_depth() -> usize {
    MAX_DEPTH.load(Ordering::Relaxed)
}

// --- Call stack functions ---

pub fn push_call_frame(frame: CallFrame) {
    CALL_STACK.with(|s| s.borrow_mut().push(frame));
}

pub fn call_stack_depth() -> usize {
    CALL_STACK.with(|s| s.borrow().len())
}

pub fn truncate_call_stack(depth: usize) {
    CALL_STACK.with(|s| s.borrow_mut().truncate(depth));
}

pub fn capture_stack_trace() -> StackTrace {
    CALL_STACK.with(|s| StackTrace(s.borrow().iter().rev().cloned().collect()))
}

/// RAII guard that truncates the call stack on drop.
struct CallStackGuard {
    entry_depth: usize,
}

impl CallStackGuard {
    fn push(name: &str) -> Self {
        let entry_depth = call_stack_depth();
        push_call_frame(CallFrame {
            name: name.to_string(),
        });
        CallStackGuard { entry_depth }
    }
}

impl Drop for CallStackGuard {
    fn drop(&mut self) {
        truncate_call_stack(self.entry_depth);
    }
}

struct DepthGuard;

impl DepthGuard {
    fn enter() -> Result<Self> {
        EVAL_DEPTH.with(|d| {
            let depth = d.get() + 1;
            let limit = max_depth();
            if depth > limit {
                return Err(SableError::eval(format!(
                    "maximum evaluation depth ({limit}) exceeded"
                )));
            }
            d.set(depth);
            Ok(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        EVAL_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Run `f` with enough stack for another level of evaluation, so the depth
/// limit is reached before the thread's own stack runs out.
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_GROWTH, f)
}

/// Evaluate `node` in `env`, collapsing it to its result.
///
/// The node is consumed as a template: evaluate a `clone()` when the tree must
/// be reused.
pub fn evaluate(node: &mut Node, env: &Env) -> Result<Value> {
    resolve_alias(node, env);
    if node.is_atom() {
        return Ok(node.value().clone());
    }

    let set = match node.value() {
        Value::Function(set) => Some(Arc::clone(set)),
        Value::Nil if node.is_empty() => None,
        other => return Err(not_callable(other, env)),
    };
    let Some(set) = set else {
        node.collapse(Value::Nil);
        return Ok(Value::Nil);
    };

    let _depth = DepthGuard::enter()?;
    tracing::trace!(form = %node, "eval");
    let result = ensure_sufficient_stack(|| dispatch(&set, node, env))?;
    node.collapse(result.clone());
    Ok(result)
}

/// Evaluate top-level forms in order directly in `env`, returning the last value.
pub fn eval_all(nodes: &mut [Node], env: &Env) -> Result<Value> {
    let mut result = Value::Nil;
    for node in nodes.iter_mut() {
        result = evaluate(node, env)?;
    }
    Ok(result)
}

/// Evaluate copies of `templates` in sequence in `env`, returning the last value.
pub fn eval_body(templates: &[Node], env: &Env) -> Result<Value> {
    let mut result = Value::Nil;
    for template in templates {
        result = evaluate(&mut template.clone(), env)?;
    }
    Ok(result)
}

/// Invoke a function value on already-evaluated arguments.
///
/// Special forms reached this way receive a synthesized call node whose
/// children are the argument values.
pub fn call_function(func: &Value, args: Vec<Value>, env: &Env) -> Result<Value> {
    let set = func
        .as_function()
        .ok_or_else(|| not_callable(func, env))?;
    if let Some(entry) = set.special() {
        let node = Node::form(
            Value::Function(Arc::clone(set)),
            args.into_iter().map(Node::atom).collect(),
        );
        return call_special(entry, &node, env);
    }
    let entry = set.select(&args)?;
    call_entry(entry, args, env)
}

/// Alias resolution: follow identifier bindings until a non-identifier value,
/// an unbound name, or a name already visited on this walk.
fn resolve_alias(node: &mut Node, env: &Env) {
    let mut seen = Vec::new();
    while let Value::Id(name) = node.value() {
        let name = *name;
        if seen.contains(&name) {
            break;
        }
        match env.lookup(name) {
            Some(value) => {
                seen.push(name);
                node.set_value(value);
            }
            None => break,
        }
    }
}

fn dispatch(set: &DispatchSet, node: &mut Node, env: &Env) -> Result<Value> {
    if let Some(entry) = set.special() {
        return call_special(entry, node, env);
    }
    let mut args = Vec::with_capacity(node.len());
    for child in node.children_mut() {
        args.push(evaluate(child, &env.create_child())?);
    }
    let entry = set.select(&args)?;
    call_entry(entry, args, env)
}

fn call_special(entry: &FunctionEntry, node: &Node, env: &Env) -> Result<Value> {
    match &entry.kind {
        FunctionKind::Special(f) => f(node, env),
        _ => Err(SableError::eval(format!("{} is not a special form", entry.name))),
    }
}

fn call_entry(entry: &FunctionEntry, args: Vec<Value>, env: &Env) -> Result<Value> {
    let _frame = CallStackGuard::push(&entry.name);
    let result = match &entry.kind {
        FunctionKind::Native(f) => f(&args, env),
        FunctionKind::Closure(closure) => apply_closure(&entry.name, closure, args),
        FunctionKind::Special(_) => {
            let node = Node::form(Value::Nil, args.into_iter().map(Node::atom).collect());
            call_special(entry, &node, env)
        }
    };
    result.map_err(|e| {
        if e.stack_trace().is_none() {
            e.with_stack_trace(capture_stack_trace())
        } else {
            e
        }
    })
}

/// Bind `args` in a fresh child of the captured scope and run the body.
pub fn apply_closure(name: &str, closure: &Closure, args: Vec<Value>) -> Result<Value> {
    let declared = closure.params.len();
    let too_many = closure.rest_param.is_none() && args.len() > declared;
    if args.len() < declared || too_many {
        let expected = match closure.rest_param {
            Some(_) => format!("{declared}+"),
            None => declared.to_string(),
        };
        return Err(SableError::arity(name, expected, args.len()));
    }

    let scope = closure.env.create_child();
    let mut args = args.into_iter();
    for param in &closure.params {
        if let Some(arg) = args.next() {
            scope.define(*param, arg);
        }
    }
    if let Some(rest) = closure.rest_param {
        scope.define(rest, Value::list(args.collect()));
    }
    eval_body(&closure.body, &scope)
}

fn not_callable(value: &Value, env: &Env) -> SableError {
    match value {
        Value::Id(name) => with_resolved(*name, |n| {
            let err = SableError::NotCallable(n.to_string());
            if let Some(hint) = dialect_hint(n) {
                return err.with_hint(hint);
            }
            let names = env.names();
            let candidates: Vec<&str> = names.iter().map(String::as_str).collect();
            match suggest_similar(n, &candidates) {
                Some(similar) => err.with_hint(format!("did you mean '{similar}'?")),
                None => err,
            }
        }),
        other => SableError::NotCallable(format!("{other} ({})", other.type_name())),
    }
}
