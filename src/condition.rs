//! Condition tree and evaluator.
//!
//! A condition is either a leaf (fact key or literal) or an ordered,
//! left-associative operand/operator/operand/... sequence. This mirrors
//! the JSON bundle format directly: a JSON array is a compound node, a
//! JSON scalar is a leaf — so `Condition` doubles as the in-memory form
//! of a rule's `condition` field.

use crate::operators::{self, OperatorFn};
use crate::value::{Facts, Value};
use serde_json::Value as Json;

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Leaf(Value),
    Node(Vec<Condition>),
}

impl Condition {
    /// A condition naming a single fact key, e.g. the left side of
    /// `("cryptography", ">=~", "2.0")`.
    pub fn fact(key: impl Into<String>) -> Condition {
        Condition::Leaf(Value::Str(key.into()))
    }

    pub fn literal(value: impl Into<Value>) -> Condition {
        Condition::Leaf(value.into())
    }

    pub fn node(children: impl IntoIterator<Item = Condition>) -> Condition {
        Condition::Node(children.into_iter().collect())
    }

    /// Convert from the bundle's JSON representation (nested arrays).
    pub fn from_json(value: &Json) -> Condition {
        match value {
            Json::Array(items) => Condition::Node(items.iter().map(Condition::from_json).collect()),
            Json::String(s) => Condition::Leaf(Value::Str(s.clone())),
            Json::Bool(b) => Condition::Leaf(Value::Bool(*b)),
            Json::Number(n) => Condition::Leaf(Value::Num(n.as_f64().unwrap_or(0.0))),
            Json::Null => Condition::Node(Vec::new()),
            Json::Object(_) => Condition::Node(Vec::new()),
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            Condition::Leaf(Value::Str(s)) => Json::String(s.clone()),
            Condition::Leaf(Value::Bool(b)) => Json::Bool(*b),
            Condition::Leaf(Value::Num(n)) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Condition::Node(children) => Json::Array(children.iter().map(Condition::to_json).collect()),
        }
    }

    /// A human-readable left-to-right rendering, e.g. `cryptography >=~ 2.0`.
    pub fn render(&self) -> String {
        match self {
            Condition::Leaf(v) => v.to_string(),
            Condition::Node(children) => children
                .iter()
                .map(Condition::render)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// The accumulator's resolved state: either a concrete value, or a fact
/// key that was absent from the map. A missing value is never coerced
/// into a concrete `Value` (e.g. the empty string) because every
/// operator applied against it must collapse to `false`, including
/// comparisons (`<=`, `>=`, ...) that would otherwise spuriously hold
/// against an empty-string stand-in.
enum Resolved {
    Value(Value),
    Missing,
}

impl Resolved {
    fn is_truthy(&self) -> bool {
        match self {
            Resolved::Value(v) => v.is_truthy(),
            Resolved::Missing => false,
        }
    }
}

/// Resolve the accumulator position: compound children recurse, a string
/// leaf is a fact-key lookup (missing -> `Resolved::Missing`), other
/// leaves are literal.
fn resolve_left(condition: &Condition, facts: &Facts) -> Resolved {
    match condition {
        Condition::Node(children) => Resolved::Value(Value::Bool(eval_node(children, facts))),
        Condition::Leaf(Value::Str(key)) => match facts.get(key) {
            Some(v) => Resolved::Value(v.clone()),
            None => Resolved::Missing,
        },
        Condition::Leaf(v) => Resolved::Value(v.clone()),
    }
}

/// Resolve a right-operand position: compound children recurse, scalar
/// children are literal values, never looked up as fact keys.
fn resolve_right(condition: &Condition, facts: &Facts) -> Value {
    match condition {
        Condition::Node(children) => Value::Bool(eval_node(children, facts)),
        Condition::Leaf(v) => v.clone(),
    }
}

fn operator_of(condition: &Condition) -> OperatorFn {
    match condition {
        Condition::Leaf(Value::Str(name)) => operators::lookup(name),
        _ => operators::never,
    }
}

fn eval_node(children: &[Condition], facts: &Facts) -> bool {
    let mut prev: Option<Resolved> = None;
    let mut op: Option<OperatorFn> = None;

    for child in children {
        match (&prev, &op) {
            (None, None) => prev = Some(resolve_left(child, facts)),
            (Some(_), None) => op = Some(operator_of(child)),
            (Some(p), Some(f)) => {
                let resolved = resolve_right(child, facts);
                // A missing left operand collapses the comparison to
                // `false` without ever calling the operator function.
                let result = match p {
                    Resolved::Value(pv) => f(pv, &resolved),
                    Resolved::Missing => false,
                };
                prev = Some(Resolved::Value(Value::Bool(result)));
                op = None;
            }
            (None, Some(_)) => unreachable!("operator cannot be set before an operand"),
        }
    }

    prev.map(|v| v.is_truthy()).unwrap_or(false)
}

/// Evaluate a condition tree against a fact map. Never panics, never
/// returns anything but a boolean.
pub fn evaluate(condition: &Condition, facts: &Facts) -> bool {
    match condition {
        Condition::Node(children) => eval_node(children, facts),
        Condition::Leaf(v) => resolve_left(&Condition::Leaf(v.clone()), facts).is_truthy(),
    }
}
