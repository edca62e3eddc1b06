use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use lasso::{Spur, ThreadedRodeo};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use parking_lot::RwLock;

use crate::dispatch::DispatchSet;
use crate::sync::{Lock, ThreadHandle};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Intern a string, returning a Spur key.
pub fn intern(s: &str) -> Spur {
    INTERNER.get_or_intern(s)
}

/// Resolve a Spur key back to a String.
pub fn resolve(spur: Spur) -> String {
    INTERNER.resolve(&spur).to_string()
}

/// Resolve a Spur and call f with the &str, avoiding allocation.
pub fn with_resolved<F, R>(spur: Spur, f: F) -> R
where
    F: FnOnce(&str) -> R,
{
    f(INTERNER.resolve(&spur))
}

pub type List = Arc<RwLock<Vec<Value>>>;
pub type Table = Arc<RwLock<IndexMap<Value, Value>>>;

#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(BigInt),
    Real(BigDecimal),
    Byte(u8),
    Str(Arc<str>),
    Id(Spur),
    List(List),
    Table(Table),
    EmptyStream,
    Function(Arc<DispatchSet>),
    Lock(Arc<Lock>),
    Thread(Arc<ThreadHandle>),
}

/// A parameter constraint used by overload dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Nil,
    Bool,
    Int,
    Real,
    Byte,
    Str,
    Id,
    List,
    Table,
    EmptyStream,
    Function,
    Lock,
    Thread,
    /// Accepts `Int` and `Real`.
    Num,
    Any,
}

impl Type {
    pub fn name(self) -> &'static str {
        match self {
            Type::Nil => "nil",
            Type::Bool => "bool",
            Type::Int => "int",
            Type::Real => "real",
            Type::Byte => "byte",
            Type::Str => "string",
            Type::Id => "id",
            Type::List => "list",
            Type::Table => "table",
            Type::EmptyStream => "empty-stream",
            Type::Function => "function",
            Type::Lock => "lock",
            Type::Thread => "thread",
            Type::Num => "num",
            Type::Any => "any",
        }
    }

    /// How well `value` satisfies this constraint: exact 3, numeric family 2,
    /// `Any` 1, no match `None`.
    pub fn score(self, value: &Value) -> Option<u32> {
        let actual = value.type_of();
        match self {
            Type::Any => Some(1),
            Type::Num if matches!(actual, Type::Int | Type::Real) => Some(2),
            t if t == actual => Some(3),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    pub fn type_of(&self) -> Type {
        match self {
            Value::Nil => Type::Nil,
            Value::Bool(_) => Type::Bool,
            Value::Int(_) => Type::Int,
            Value::Real(_) => Type::Real,
            Value::Byte(_) => Type::Byte,
            Value::Str(_) => Type::Str,
            Value::Id(_) => Type::Id,
            Value::List(_) => Type::List,
            Value::Table(_) => Type::Table,
            Value::EmptyStream => Type::EmptyStream,
            Value::Function(_) => Type::Function,
            Value::Lock(_) => Type::Lock,
            Value::Thread(_) => Type::Thread,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_of().name()
    }

    pub fn int(n: i64) -> Value {
        Value::Int(BigInt::from(n))
    }

    pub fn real(d: BigDecimal) -> Value {
        Value::Real(d)
    }

    pub fn string(s: &str) -> Value {
        Value::Str(Arc::from(s))
    }

    pub fn id(name: &str) -> Value {
        Value::Id(intern(name))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Arc::new(RwLock::new(items)))
    }

    pub fn table(entries: IndexMap<Value, Value>) -> Value {
        Value::Table(Arc::new(RwLock::new(entries)))
    }

    pub fn function(set: DispatchSet) -> Value {
        Value::Function(Arc::new(set))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Value::Int(n) => Some(n),
            _ => None,
        }
    }

    /// Integer value narrowed to `i64`, if it fits.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_int().and_then(|n| n.to_i64())
    }

    /// Numeric value widened to a decimal.
    pub fn as_decimal(&self) -> Option<BigDecimal> {
        match self {
            Value::Int(n) => Some(BigDecimal::new(n.clone(), 0)),
            Value::Real(d) => Some(d.clone()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_id(&self) -> Option<Spur> {
        match self {
            Value::Id(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Snapshot of a list's elements.
    pub fn list_items(&self) -> Option<Vec<Value>> {
        self.as_list().map(|l| l.read().clone())
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Arc<DispatchSet>> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// The form used by `println` and `->string`: strings without quotes.
    pub fn display_string(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            other => other.to_string(),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Nil | Value::EmptyStream => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(n) => n.hash(state),
            Value::Real(d) => d.hash(state),
            Value::Byte(b) => b.hash(state),
            Value::Str(s) => s.hash(state),
            Value::Id(s) => s.hash(state),
            Value::List(l) => l.read().hash(state),
            // table equality ignores insertion order
            Value::Table(t) => t.read().len().hash(state),
            Value::Function(f) => (Arc::as_ptr(f) as usize).hash(state),
            Value::Lock(l) => (Arc::as_ptr(l) as usize).hash(state),
            Value::Thread(t) => (Arc::as_ptr(t) as usize).hash(state),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::EmptyStream, Value::EmptyStream) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Id(a), Value::Id(b)) => a == b,
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b) || *a.read() == *b.read(),
            (Value::Table(a), Value::Table(b)) => Arc::ptr_eq(a, b) || *a.read() == *b.read(),
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Lock(a), Value::Lock(b)) => Arc::ptr_eq(a, b),
            (Value::Thread(a), Value::Thread(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

/// Render a decimal in plain notation, always with a fractional part.
pub fn format_real(d: &BigDecimal) -> String {
    let (digits, scale) = d.as_bigint_and_exponent();
    let negative = digits.sign() == num_bigint::Sign::Minus;
    let magnitude = digits.magnitude().to_string();

    let (int_part, frac_part) = if scale <= 0 {
        let zeros = "0".repeat(scale.unsigned_abs() as usize);
        (format!("{magnitude}{zeros}"), String::new())
    } else {
        let scale = scale as usize;
        let padded = if magnitude.len() <= scale {
            format!("{}{magnitude}", "0".repeat(scale - magnitude.len() + 1))
        } else {
            magnitude
        };
        let (i, f) = padded.split_at(padded.len() - scale);
        (i.to_string(), f.trim_end_matches('0').to_string())
    };
    let int_part = if int_part.is_empty() || int_part.chars().all(|c| c == '0') {
        "0".to_string()
    } else {
        int_part
    };
    let frac_part = if frac_part.is_empty() {
        "0".to_string()
    } else {
        frac_part
    };
    let sign = if negative { "-" } else { "" };
    format!("{sign}{int_part}.{frac_part}")
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Real(d) => f.write_str(&format_real(d)),
            Value::Byte(b) => write!(f, "#x{b:02x}"),
            Value::Str(s) => write_escaped(f, s),
            Value::Id(s) => with_resolved(*s, |name| write!(f, "{name}")),
            Value::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.read().iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Value::Table(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.read().iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{k} {v}")?;
                }
                write!(f, "}}")
            }
            Value::EmptyStream => write!(f, "empty-stream"),
            Value::Function(set) => write!(f, "<function {}>", set.name),
            Value::Lock(l) => {
                if l.is_locked() {
                    write!(f, "<lock (held)>")
                } else {
                    write!(f, "<lock>")
                }
            }
            Value::Thread(t) => write!(f, "<thread {}>", t.name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::Int(n)
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Value::Real(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn real(s: &str) -> Value {
        Value::real(BigDecimal::from_str(s).unwrap())
    }

    #[test]
    fn equality_is_type_sensitive() {
        assert_ne!(Value::int(1), real("1.0"));
        assert_eq!(real("1.0"), real("1.00"));
        assert_eq!(Value::string("a"), Value::string("a"));
        assert_ne!(Value::string("a"), Value::id("a"));
    }

    #[test]
    fn lists_compare_by_contents() {
        let a = Value::list(vec![Value::int(1), Value::string("x")]);
        let b = Value::list(vec![Value::int(1), Value::string("x")]);
        assert_eq!(a, b);
        assert_eq!(a, a.clone());
        assert_ne!(a, Value::list(vec![Value::int(1)]));
    }

    #[test]
    fn tables_ignore_insertion_order() {
        let mut m1 = IndexMap::new();
        m1.insert(Value::int(1), Value::string("a"));
        m1.insert(Value::int(2), Value::string("b"));
        let mut m2 = IndexMap::new();
        m2.insert(Value::int(2), Value::string("b"));
        m2.insert(Value::int(1), Value::string("a"));
        let (t1, t2) = (Value::table(m1), Value::table(m2));
        assert_eq!(t1, t2);

        use std::collections::hash_map::DefaultHasher;
        let hash = |v: &Value| {
            let mut h = DefaultHasher::new();
            v.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&t1), hash(&t2));
    }

    #[test]
    fn values_work_as_table_keys() {
        let mut m = IndexMap::new();
        m.insert(Value::list(vec![Value::int(1)]), Value::Bool(true));
        assert_eq!(
            m.get(&Value::list(vec![Value::int(1)])),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn display_round_trips_numbers_and_strings() {
        assert_eq!(Value::int(-42).to_string(), "-42");
        assert_eq!(real("2").to_string(), "2.0");
        assert_eq!(real("0.5").to_string(), "0.5");
        assert_eq!(real("-0.05").to_string(), "-0.05");
        assert_eq!(real("2.50").to_string(), "2.5");
        assert_eq!(real("1e3").to_string(), "1000.0");
        assert_eq!(Value::string("a\"b\n").to_string(), r#""a\"b\n""#);
        assert_eq!(Value::string("a\"b").display_string(), "a\"b");
    }

    #[test]
    fn display_compound() {
        let l = Value::list(vec![Value::int(1), Value::string("s"), Value::Nil]);
        assert_eq!(l.to_string(), "(1 \"s\" nil)");
        let mut m = IndexMap::new();
        m.insert(Value::id("k"), Value::Bool(false));
        assert_eq!(Value::table(m).to_string(), "{k false}");
        assert_eq!(Value::EmptyStream.to_string(), "empty-stream");
    }

    #[test]
    fn type_scores() {
        let i = Value::int(3);
        let r = real("3.5");
        assert_eq!(Type::Int.score(&i), Some(3));
        assert_eq!(Type::Num.score(&i), Some(2));
        assert_eq!(Type::Num.score(&r), Some(2));
        assert_eq!(Type::Any.score(&i), Some(1));
        assert_eq!(Type::Int.score(&r), None);
        assert_eq!(Type::Num.score(&Value::string("3")), None);
        assert_eq!(Type::Str.score(&Value::string("3")), Some(3));
    }

    #[test]
    fn interner_is_shared_across_threads() {
        let here = intern("shared-name");
        let there = std::thread::spawn(|| intern("shared-name")).join().unwrap();
        assert_eq!(here, there);
        assert_eq!(resolve(there), "shared-name");
    }
}
