use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap as SpurMap;
use lasso::Spur;
use parking_lot::RwLock;

use crate::dispatch::DispatchSet;
use crate::error::{dialect_hint, suggest_similar, Result, SableError};
use crate::function::FunctionEntry;
use crate::value::{intern, resolve, with_resolved, Value};

/// A Sable environment: a chain of scopes with bindings.
#[derive(Clone)]
pub struct Env {
    pub bindings: Arc<RwLock<SpurMap<Spur, Value>>>,
    pub parent: Option<Arc<Env>>,
}

impl Env {
    pub fn new() -> Self {
        Env {
            bindings: Arc::new(RwLock::new(SpurMap::new())),
            parent: None,
        }
    }

    pub fn with_parent(parent: Arc<Env>) -> Self {
        Env {
            bindings: Arc::new(RwLock::new(SpurMap::new())),
            parent: Some(parent),
        }
    }

    /// A fresh empty scope whose parent is this one.
    pub fn create_child(&self) -> Env {
        Env::with_parent(Arc::new(self.clone()))
    }

    /// Look a name up along the chain.
    pub fn lookup(&self, name: Spur) -> Option<Value> {
        // release this scope's lock before walking up
        let local = self.bindings.read().get(&name).cloned();
        match local {
            Some(val) => Some(val),
            None => self.parent.as_ref().and_then(|p| p.lookup(name)),
        }
    }

    pub fn get(&self, name: Spur) -> Result<Value> {
        self.lookup(name).ok_or_else(|| self.unbound(name))
    }

    pub fn get_str(&self, name: &str) -> Result<Value> {
        self.get(intern(name))
    }

    pub fn contains(&self, name: Spur) -> bool {
        let local = self.bindings.read().contains_key(&name);
        local || self.parent.as_ref().is_some_and(|p| p.contains(name))
    }

    /// Insert or overwrite a binding in this scope only.
    pub fn define(&self, name: Spur, val: Value) {
        self.bindings.write().insert(name, val);
    }

    pub fn define_str(&self, name: &str, val: Value) {
        self.define(intern(name), val);
    }

    /// Overwrite the binding in the nearest scope that owns `name`.
    pub fn assign(&self, name: Spur, val: Value) -> Result<()> {
        if self.set_existing(name, val) {
            Ok(())
        } else {
            Err(self.unbound(name))
        }
    }

    fn set_existing(&self, name: Spur, val: Value) -> bool {
        let mut bindings = self.bindings.write();
        if let Some(entry) = bindings.get_mut(&name) {
            *entry = val;
            true
        } else {
            drop(bindings);
            match &self.parent {
                Some(parent) => parent.set_existing(name, val),
                None => false,
            }
        }
    }

    /// Remove a binding from this scope only.
    pub fn remove(&self, name: Spur) -> Result<Value> {
        let removed = self.bindings.write().remove(&name);
        removed.ok_or_else(|| self.unbound(name))
    }

    /// Merge `entry` into the dispatch set visible under its name and bind
    /// the merged set in this scope.
    pub fn register(&self, entry: FunctionEntry) {
        let name = intern(&entry.name);
        let merged = match self.lookup(name) {
            Some(Value::Function(set)) => set.with_entry(entry),
            _ => DispatchSet::single(entry),
        };
        tracing::debug!(name = %merged.name, overloads = merged.entries.len(), "register");
        self.define(name, Value::Function(Arc::new(merged)));
    }

    /// Every name visible from this scope, innermost first, without duplicates.
    pub fn names(&self) -> Vec<String> {
        let mut seen = hashbrown::HashSet::new();
        let mut names = Vec::new();
        let mut scope = Some(self);
        while let Some(env) = scope {
            for name in env.bindings.read().keys() {
                if seen.insert(*name) {
                    names.push(resolve(*name));
                }
            }
            scope = env.parent.as_deref();
        }
        names
    }

    pub fn root(&self) -> Env {
        match &self.parent {
            Some(parent) => parent.root(),
            None => self.clone(),
        }
    }

    fn unbound(&self, name: Spur) -> SableError {
        with_resolved(name, |n| {
            let err = SableError::unbound(n);
            if let Some(hint) = dialect_hint(n) {
                return err.with_hint(hint);
            }
            let names = self.names();
            let candidates: Vec<&str> = names.iter().map(String::as_str).collect();
            match suggest_similar(n, &candidates) {
                Some(similar) => err.with_hint(format!("did you mean '{similar}'?")),
                None => err,
            }
        })
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut depth = 0;
        let mut scope = self.parent.as_deref();
        while let Some(env) = scope {
            depth += 1;
            scope = env.parent.as_deref();
        }
        write!(
            f,
            "Env {{ bindings: {}, depth: {depth} }}",
            self.bindings.read().len()
        )
    }
}
