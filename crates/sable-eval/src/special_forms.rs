use sable_core::{
    check_arity, intern, resolve, Closure, DispatchSet, Env, FunctionEntry, Node, Result,
    SableError, Spur, Type, Value,
};

use crate::eval::{call_function, eval_body, evaluate};

/// Canonical list of all special form names registered by [`register_special_forms`].
pub const SPECIAL_FORM_NAMES: &[&str] = &[
    "begin",
    "cond",
    "cons-stream",
    "def",
    "def-symbol",
    "def-variable",
    "delay",
    "if",
    "lambda",
    "let",
    "let*",
    "quote",
    "set",
    "set-variable",
    "switch",
    "undef",
    "while",
];

/// Install the special forms plus `apply`, which the reader targets for a
/// form in head position: `((f x) y)` reads as `(apply (f x) y)`.
pub fn register_core(env: &Env) {
    register_special_forms(env);
    env.register(
        FunctionEntry::native("apply", vec![Type::Function], |args, env| {
            call_function(&args[0], args[1..].to_vec(), env)
        })
        .variadic(Type::Any),
    );
}

/// Install every special form into `env`.
pub fn register_special_forms(env: &Env) {
    env.register(FunctionEntry::special("begin", eval_begin));
    env.register(FunctionEntry::special("cond", eval_cond));
    env.register(FunctionEntry::special("cons-stream", eval_cons_stream));
    env.register(FunctionEntry::special("def", eval_def));
    env.register(FunctionEntry::special("def-symbol", eval_def_symbol));
    env.register(FunctionEntry::special("def-variable", eval_def_variable));
    env.register(FunctionEntry::special("delay", eval_delay));
    env.register(FunctionEntry::special("if", eval_if));
    env.register(FunctionEntry::special("lambda", eval_lambda));
    env.register(FunctionEntry::special("let", eval_let));
    env.register(FunctionEntry::special("let*", eval_let_star));
    env.register(FunctionEntry::special("quote", eval_quote));
    env.register(FunctionEntry::special("set", eval_set));
    env.register(FunctionEntry::special("set-variable", eval_set_variable));
    env.register(FunctionEntry::special("switch", eval_switch));
    env.register(FunctionEntry::special("undef", eval_undef));
    env.register(FunctionEntry::special("while", eval_while));
}

/// (def x e...) or (def (f p...) body...)
fn eval_def(node: &Node, env: &Env) -> Result<Value> {
    let args = node.children();
    check_arity!(args, "def", 2..);
    let target = &args[0];
    if target.is_atom() {
        let name = name_of(target, "def")?;
        let value = eval_body(&args[1..], &env.create_child())?;
        tracing::debug!(name = %resolve(name), "def");
        env.define(name, value);
    } else {
        let (name, names) = signature(target, "def")?;
        let (params, rest_param) = parse_params(&names);
        tracing::debug!(name = %resolve(name), params = params.len(), "def function");
        let closure = make_closure(name, params, rest_param, &args[1..], env.create_child());
        env.define(name, closure);
    }
    Ok(Value::Nil)
}

/// (def-variable (f p... rest) body...): the last parameter collects the remaining arguments.
fn eval_def_variable(node: &Node, env: &Env) -> Result<Value> {
    let args = node.children();
    check_arity!(args, "def-variable", 2..);
    let (name, params, rest) = variadic_signature(&args[0], "def-variable")?;
    let closure = make_closure(name, params, Some(rest), &args[1..], env.create_child());
    env.define(name, closure);
    Ok(Value::Nil)
}

/// (set x e...) or (set (f p...) body...)
fn eval_set(node: &Node, env: &Env) -> Result<Value> {
    let args = node.children();
    check_arity!(args, "set", 2..);
    let target = &args[0];
    if target.is_atom() {
        let name = name_of(target, "set")?;
        env.get(name)?;
        let value = eval_body(&args[1..], &env.create_child())?;
        env.assign(name, value)?;
    } else {
        let (name, names) = signature(target, "set")?;
        env.get(name)?;
        let (params, rest_param) = parse_params(&names);
        let closure = make_closure(name, params, rest_param, &args[1..], env.create_child());
        env.assign(name, closure)?;
    }
    Ok(Value::Nil)
}

fn eval_set_variable(node: &Node, env: &Env) -> Result<Value> {
    let args = node.children();
    check_arity!(args, "set-variable", 2..);
    let (name, params, rest) = variadic_signature(&args[0], "set-variable")?;
    env.get(name)?;
    let closure = make_closure(name, params, Some(rest), &args[1..], env.create_child());
    env.assign(name, closure)?;
    Ok(Value::Nil)
}

fn eval_undef(node: &Node, env: &Env) -> Result<Value> {
    let args = node.children();
    check_arity!(args, "undef", 1);
    let name = name_of(&args[0], "undef")?;
    env.remove(name)?;
    Ok(Value::Nil)
}

/// (lambda (p...) body...), `()` for no parameters, `.` before a rest parameter.
fn eval_lambda(node: &Node, env: &Env) -> Result<Value> {
    let args = node.children();
    check_arity!(args, "lambda", 2..);
    let names = lambda_params(&args[0])?;
    let (params, rest_param) = parse_params(&names);
    Ok(make_closure(
        intern("lambda"),
        params,
        rest_param,
        &args[1..],
        env.create_child(),
    ))
}

fn eval_let(node: &Node, env: &Env) -> Result<Value> {
    let args = node.children();
    check_arity!(args, "let", 1..);
    let scope = env.create_child();
    for binding in let_bindings(&args[0], "let")? {
        // bindings see the outer scope only
        bind(binding, env, &scope, "let")?;
    }
    eval_body(&args[1..], &scope.create_child())
}

fn eval_let_star(node: &Node, env: &Env) -> Result<Value> {
    let args = node.children();
    check_arity!(args, "let*", 1..);
    let scope = env.create_child();
    for binding in let_bindings(&args[0], "let*")? {
        bind(binding, &scope, &scope, "let*")?;
    }
    eval_body(&args[1..], &scope.create_child())
}

fn eval_begin(node: &Node, env: &Env) -> Result<Value> {
    eval_body(node.children(), &env.create_child())
}

fn eval_if(node: &Node, env: &Env) -> Result<Value> {
    let args = node.children();
    check_arity!(args, "if", 2..=3);
    let scope = env.create_child();
    if test(&args[0], &scope)? {
        eval_body(&args[1..2], &scope)
    } else {
        eval_body(&args[2..], &scope)
    }
}

/// (cond (test body...) ... (else body...))
fn eval_cond(node: &Node, env: &Env) -> Result<Value> {
    let scope = env.create_child();
    for clause in node.children() {
        if is_keyword(clause.value(), "else") {
            return eval_body(clause.children(), &scope);
        }
        let (condition, body) = split_clause(clause);
        if test(&condition, &scope)? {
            return eval_body(body, &scope);
        }
    }
    Ok(Value::Nil)
}

/// (switch e (v body...) ... (else body...))
fn eval_switch(node: &Node, env: &Env) -> Result<Value> {
    let args = node.children();
    check_arity!(args, "switch", 1..);
    let scope = env.create_child();
    let subject = evaluate(&mut args[0].clone(), &scope)?;
    for clause in &args[1..] {
        if is_keyword(clause.value(), "else") || *clause.value() == subject {
            return eval_body(clause.children(), &scope);
        }
    }
    Ok(Value::Nil)
}

/// (while test body...): fresh copies of test and body every iteration.
fn eval_while(node: &Node, env: &Env) -> Result<Value> {
    let args = node.children();
    check_arity!(args, "while", 1..);
    let scope = env.create_child();
    let mut result = Value::Nil;
    while test(&args[0], &scope)? {
        result = eval_body(&args[1..], &scope)?;
    }
    Ok(result)
}

/// (def-symbol (m p...) body...)
///
/// Expansion is textual and unhygienic: each parameter occurrence in a copy of
/// the body is replaced by the unevaluated argument subtree, then the result
/// is evaluated in a child of the calling scope.
fn eval_def_symbol(node: &Node, env: &Env) -> Result<Value> {
    let args = node.children();
    check_arity!(args, "def-symbol", 2..);
    let (name, params) = signature(&args[0], "def-symbol")?;
    let templates: Vec<Node> = args[1..].to_vec();
    let macro_name = resolve(name);
    tracing::debug!(name = %macro_name, params = params.len(), "def-symbol");

    let expand_name = macro_name.clone();
    let entry = FunctionEntry::special(macro_name, move |call: &Node, caller: &Env| {
        let supplied = call.children();
        if supplied.len() < params.len() {
            return Err(SableError::arity(
                &expand_name,
                params.len().to_string(),
                supplied.len(),
            ));
        }
        let bindings: Vec<(Spur, Node)> = params
            .iter()
            .copied()
            .zip(supplied.iter().cloned())
            .collect();
        let scope = caller.create_child();
        let mut result = Value::Nil;
        for template in &templates {
            let mut form = template.clone();
            form.substitute(&bindings);
            tracing::trace!(name = %expand_name, expansion = %form, "expand");
            result = evaluate(&mut form, &scope)?;
        }
        Ok(result)
    });
    env.define(name, Value::function(DispatchSet::single(entry)));
    Ok(Value::Nil)
}

/// (delay e...) => zero-parameter closure over copies of the body.
fn eval_delay(node: &Node, env: &Env) -> Result<Value> {
    let args = node.children();
    check_arity!(args, "delay", 1..);
    Ok(make_closure(
        intern("delay"),
        Vec::new(),
        None,
        args,
        env.create_child(),
    ))
}

/// (cons-stream h e...) => (h-value, (delay e...))
fn eval_cons_stream(node: &Node, env: &Env) -> Result<Value> {
    let args = node.children();
    check_arity!(args, "cons-stream", 2..);
    let head = evaluate(&mut args[0].clone(), &env.create_child())?;
    let rest = make_closure(
        intern("delay"),
        Vec::new(),
        None,
        &args[1..],
        env.create_child(),
    );
    Ok(Value::list(vec![head, rest]))
}

fn eval_quote(node: &Node, _env: &Env) -> Result<Value> {
    let args = node.children();
    check_arity!(args, "quote", 1);
    Ok(quoted(&args[0]))
}

fn quoted(node: &Node) -> Value {
    if node.is_atom() {
        return node.value().clone();
    }
    if node.value().is_nil() && node.is_empty() {
        return Value::list(Vec::new());
    }
    let mut items = Vec::with_capacity(node.len() + 1);
    items.push(node.value().clone());
    items.extend(node.children().iter().map(quoted));
    Value::list(items)
}

// --- helpers ---

fn make_closure(
    name: Spur,
    params: Vec<Spur>,
    rest_param: Option<Spur>,
    body: &[Node],
    env: Env,
) -> Value {
    let closure = Closure {
        params,
        rest_param,
        body: body.to_vec(),
        env,
    };
    Value::function(DispatchSet::single(FunctionEntry::closure(
        resolve(name),
        closure,
    )))
}

/// Evaluate a copy of `condition`; it must produce a bool.
fn test(condition: &Node, env: &Env) -> Result<bool> {
    match evaluate(&mut condition.clone(), env)? {
        Value::Bool(b) => Ok(b),
        other => Err(SableError::type_error("bool", other.type_name())),
    }
}

fn is_keyword(value: &Value, keyword: &str) -> bool {
    matches!(value, Value::Id(id) if *id == intern(keyword))
}

/// `((f p...) body...)` is read with an `apply` head.
fn is_apply(node: &Node) -> bool {
    node.is_group() && is_keyword(node.value(), "apply")
}

/// Split a cond clause into its test and body.
fn split_clause(clause: &Node) -> (Node, &[Node]) {
    if is_apply(clause) {
        if let Some((first, body)) = clause.children().split_first() {
            return (first.clone(), body);
        }
    }
    (Node::atom(clause.value().clone()), clause.children())
}

fn name_of(node: &Node, form: &str) -> Result<Spur> {
    node.value()
        .as_id()
        .ok_or_else(|| SableError::eval(format!("{form}: expected a name, got {node}")))
}

/// `(f p...)` => (f, [p...])
fn signature(node: &Node, form: &str) -> Result<(Spur, Vec<Spur>)> {
    let name = name_of(node, form)?;
    let params = node
        .children()
        .iter()
        .map(|p| {
            if p.is_atom() {
                name_of(p, form)
            } else {
                Err(SableError::eval(format!(
                    "{form}: parameter must be a name, got {p}"
                )))
            }
        })
        .collect::<Result<_>>()?;
    Ok((name, params))
}

fn variadic_signature(node: &Node, form: &str) -> Result<(Spur, Vec<Spur>, Spur)> {
    let (name, mut params) = signature(node, form)?;
    let rest = params.pop().ok_or_else(|| {
        SableError::eval(format!("{form}: needs at least one parameter to collect the rest"))
    })?;
    Ok((name, params, rest))
}

/// The parameter list of a lambda: `()`, `(x)`, `(x y . rest)`.
fn lambda_params(node: &Node) -> Result<Vec<Spur>> {
    if node.value().is_nil() && node.is_empty() {
        return Ok(Vec::new());
    }
    let (first, rest) = signature(node, "lambda")?;
    let mut names = Vec::with_capacity(rest.len() + 1);
    names.push(first);
    names.extend(rest);
    Ok(names)
}

/// Parse parameter list, handling rest params (e.g., `(a b . rest)`)
fn parse_params(names: &[Spur]) -> (Vec<Spur>, Option<Spur>) {
    let dot = intern(".");
    if let Some(pos) = names.iter().position(|s| *s == dot) {
        let params = names[..pos].to_vec();
        let rest = names.get(pos + 1).copied();
        (params, rest)
    } else {
        (names.to_vec(), None)
    }
}

fn let_bindings<'a>(node: &'a Node, form: &str) -> Result<&'a [Node]> {
    if node.value().is_nil() && node.is_empty() {
        return Ok(&[]);
    }
    if is_apply(node) {
        return Ok(node.children());
    }
    Err(SableError::eval(format!(
        "{form}: bindings must be a list of (name value) forms, got {node}"
    )))
}

/// Bind one `let` entry into `scope`. Values are evaluated in a child of
/// `source`; function bindings capture a child of `source`.
fn bind(binding: &Node, source: &Env, scope: &Env, form: &str) -> Result<()> {
    if is_apply(binding) {
        let (sig, body) = binding
            .children()
            .split_first()
            .ok_or_else(|| SableError::eval(format!("{form}: empty function binding")))?;
        let (name, names) = signature(sig, form)?;
        let (params, rest_param) = parse_params(&names);
        let closure = make_closure(name, params, rest_param, body, source.create_child());
        scope.define(name, closure);
        return Ok(());
    }
    let name = name_of(binding, form)?;
    let value = eval_body(binding.children(), &source.create_child())?;
    scope.define(name, value);
    Ok(())
}
