use std::sync::Arc;

use crate::error::{Result, SableError};
use crate::function::FunctionEntry;
use crate::value::Value;

/// All overloads visible under one name.
#[derive(Debug, Clone)]
pub struct DispatchSet {
    pub name: String,
    pub entries: Vec<Arc<FunctionEntry>>,
}

impl DispatchSet {
    pub fn single(entry: FunctionEntry) -> Self {
        DispatchSet {
            name: entry.name.clone(),
            entries: vec![Arc::new(entry)],
        }
    }

    /// A new set with `entry` appended; `self` is left untouched.
    pub fn with_entry(&self, entry: FunctionEntry) -> Self {
        let mut entries = self.entries.clone();
        entries.push(Arc::new(entry));
        DispatchSet {
            name: self.name.clone(),
            entries,
        }
    }

    /// The first registered special form, if any. Special forms win before
    /// arguments are evaluated.
    pub fn special(&self) -> Option<&Arc<FunctionEntry>> {
        self.entries.iter().find(|e| e.is_special())
    }

    /// Pick the overload that best matches `args`.
    pub fn select(&self, args: &[Value]) -> Result<&Arc<FunctionEntry>> {
        let by_arity: Vec<&Arc<FunctionEntry>> = self
            .entries
            .iter()
            .filter(|e| e.accepts_arity(args.len()))
            .collect();
        if by_arity.is_empty() {
            let mut accepted: Vec<String> = self.entries.iter().map(|e| e.arity()).collect();
            accepted.dedup();
            return Err(SableError::arity(&self.name, accepted.join(" or "), args.len()));
        }

        let mut scored: Vec<(u32, &Arc<FunctionEntry>)> = by_arity
            .into_iter()
            .filter_map(|e| e.score(args).map(|s| (s, e)))
            .collect();
        // sort_by is stable: equal scores keep registration order
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        match scored.as_slice() {
            [] => Err(SableError::NoMatchingOverload {
                name: self.name.clone(),
                args: describe_args(args),
            }),
            [(best, _), (second, _), ..] if best == second => {
                tracing::warn!(name = %self.name, score = *best, "ambiguous call");
                Err(SableError::AmbiguousCall {
                    name: self.name.clone(),
                    args: describe_args(args),
                })
            }
            [(best, entry), ..] => {
                tracing::trace!(name = %self.name, score = *best, chosen = %entry.signature(), "dispatch");
                Ok(*entry)
            }
        }
    }
}

fn describe_args(args: &[Value]) -> String {
    args.iter()
        .map(|a| a.type_name())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Type;
    use std::str::FromStr;

    fn tagged(name: &str, params: Vec<Type>, tag: i64) -> FunctionEntry {
        FunctionEntry::simple(name, params, move |_| Ok(Value::int(tag)))
    }

    fn chosen(set: &DispatchSet, args: &[Value]) -> Value {
        match &set.select(args).unwrap().kind {
            crate::FunctionKind::Native(f) => f(args, &crate::Env::new()).unwrap(),
            _ => panic!("expected native entry"),
        }
    }

    #[test]
    fn single_entry_is_chosen_when_types_fit() {
        let set = DispatchSet::single(tagged("f", vec![Type::Int], 1));
        assert_eq!(chosen(&set, &[Value::int(5)]), Value::int(1));
    }

    #[test]
    fn exact_beats_any() {
        let set = DispatchSet::single(tagged("f", vec![Type::Int], 1))
            .with_entry(tagged("f", vec![Type::Any], 2));
        assert_eq!(chosen(&set, &[Value::int(5)]), Value::int(1));
        assert_eq!(chosen(&set, &[Value::string("s")]), Value::int(2));
    }

    #[test]
    fn exact_beats_num_family() {
        let set = DispatchSet::single(tagged("+", vec![], 1).variadic(Type::Num))
            .with_entry(tagged("+", vec![], 2).variadic(Type::Int));
        let ints = [Value::int(1), Value::int(2)];
        assert_eq!(chosen(&set, &ints), Value::int(2));
        let mixed = [
            Value::int(1),
            Value::real(bigdecimal::BigDecimal::from_str("0.5").unwrap()),
        ];
        assert_eq!(chosen(&set, &mixed), Value::int(1));
    }

    #[test]
    fn identical_signatures_are_ambiguous() {
        let set = DispatchSet::single(tagged("g", vec![Type::Int], 1))
            .with_entry(tagged("g", vec![Type::Int], 2));
        let err = set.select(&[Value::int(1)]).unwrap_err();
        assert!(matches!(err, SableError::AmbiguousCall { ref name, .. } if name == "g"));
    }

    #[test]
    fn wrong_arity_is_an_arity_error() {
        let set = DispatchSet::single(tagged("f", vec![Type::Int], 1));
        let err = set.select(&[Value::int(1), Value::int(2)]).unwrap_err();
        assert!(matches!(err, SableError::Arity { got: 2, .. }));
    }

    #[test]
    fn wrong_types_is_no_matching_overload() {
        let set = DispatchSet::single(tagged("f", vec![Type::Int], 1));
        let err = set.select(&[Value::string("x")]).unwrap_err();
        match err {
            SableError::NoMatchingOverload { name, args } => {
                assert_eq!(name, "f");
                assert_eq!(args, "string");
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn with_entry_is_persistent() {
        let one = DispatchSet::single(tagged("f", vec![Type::Int], 1));
        let two = one.with_entry(tagged("f", vec![Type::Str], 2));
        assert_eq!(one.entries.len(), 1);
        assert_eq!(two.entries.len(), 2);
    }

    #[test]
    fn first_special_form_wins() {
        let set = DispatchSet::single(tagged("s", vec![], 1))
            .with_entry(FunctionEntry::special("s", |_, _| Ok(Value::int(2))))
            .with_entry(FunctionEntry::special("s", |_, _| Ok(Value::int(3))));
        let special = set.special().unwrap();
        match &special.kind {
            crate::FunctionKind::Special(f) => {
                let node = crate::Node::atom(Value::Nil);
                assert_eq!(f(&node, &crate::Env::new()).unwrap(), Value::int(2));
            }
            _ => panic!("expected special form"),
        }
    }
}
