//! Fact values and fact maps shared by every core engine module.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single fact value: string, boolean or floating-point number.
///
/// Mirrors the three JSON scalar types a persisted rule bundle can carry
/// for a consequent fact or requirement constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Bool(bool),
    Num(f64),
}

impl Value {
    /// Python-style truthiness: empty string, `false` and `0.0` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Num(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// An order-preserving fact map.
///
/// Facts are never mutated after construction; insertion order is kept
/// because the rule matcher's synthesized-dependency phase must iterate
/// facts in the order they were asserted, while the explorer's
/// memoization key is a separately-sorted view over the same pairs.
pub type Facts = IndexMap<String, Value>;

/// Tag a value's `Display` rendering with its variant so values of
/// different types (e.g. `Num(1.0)` and `Str("1")`) never stringify to
/// the same cache-key component.
fn tagged_repr(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("s:{s}"),
        Value::Bool(b) => format!("b:{b}"),
        Value::Num(n) => format!("n:{n}"),
    }
}

/// A stable, sorted view of a fact map used as a memoization cache key.
pub fn sorted_pairs(facts: &Facts) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = facts
        .iter()
        .map(|(k, v)| (k.clone(), tagged_repr(v)))
        .collect();
    pairs.sort();
    pairs
}

/// Build a `Facts` map from `(key, value)` pairs, in the given order.
pub fn facts_from<I, K, V>(pairs: I) -> Facts
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
