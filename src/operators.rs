//! Operator table.
//!
//! A small registry mapping operator name to a binary function over fact
//! values. Built once as a plain `match` rather than a heap-allocated
//! map — the sentinel `never` function is a `fn` pointer, not a
//! per-call allocation.

use crate::value::Value;
use crate::version;

pub type OperatorFn = fn(&Value, &Value) -> bool;

/// Default operator: unknown operator names always evaluate to `false`.
pub fn never(_a: &Value, _b: &Value) -> bool {
    false
}

fn eq(a: &Value, b: &Value) -> bool {
    a == b
}

fn neq(a: &Value, b: &Value) -> bool {
    a != b
}

fn scalar_cmp(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Num(x), Value::Num(y)) => x.partial_cmp(y),
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        // A type mismatch (e.g. number vs string) collapses the comparison
        // to `false` rather than raising.
        _ => None,
    }
}

fn ge(a: &Value, b: &Value) -> bool {
    matches!(
        scalar_cmp(a, b),
        Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
    )
}

fn le(a: &Value, b: &Value) -> bool {
    matches!(
        scalar_cmp(a, b),
        Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
    )
}

fn gt(a: &Value, b: &Value) -> bool {
    matches!(scalar_cmp(a, b), Some(std::cmp::Ordering::Greater))
}

fn lt(a: &Value, b: &Value) -> bool {
    matches!(scalar_cmp(a, b), Some(std::cmp::Ordering::Less))
}

fn version_cmp(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    let (a, b) = (a.as_str()?, b.as_str()?);
    let (va, vb) = (version::parse(a).ok()?, version::parse(b).ok()?);
    Some(va.cmp(&vb))
}

fn ver_ge(a: &Value, b: &Value) -> bool {
    matches!(
        version_cmp(a, b),
        Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
    )
}

fn ver_le(a: &Value, b: &Value) -> bool {
    matches!(
        version_cmp(a, b),
        Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
    )
}

fn ver_gt(a: &Value, b: &Value) -> bool {
    matches!(version_cmp(a, b), Some(std::cmp::Ordering::Greater))
}

fn ver_lt(a: &Value, b: &Value) -> bool {
    matches!(version_cmp(a, b), Some(std::cmp::Ordering::Less))
}

fn and(a: &Value, b: &Value) -> bool {
    a.is_truthy() && b.is_truthy()
}

fn or(a: &Value, b: &Value) -> bool {
    a.is_truthy() || b.is_truthy()
}

/// Resolve an operator name to its function, or `never` if unregistered.
///
/// `~=` and `>==` are registered as plain `>=`, deliberately: `~=`
/// normally means PEP 440's compatible-release clause, but this engine's
/// rule data treats it as a minimum-version check, and that approximation
/// is preserved here rather than "fixed".
pub fn lookup(name: &str) -> OperatorFn {
    match name {
        "===" | "==" => eq,
        "!=" => neq,
        ">=" | "~=" | ">==" => ge,
        "<=" => le,
        ">" => gt,
        "<" => lt,
        ">=~" => ver_ge,
        "<=~" => ver_le,
        ">~" => ver_gt,
        "<~" => ver_lt,
        "and" => and,
        "or" => or,
        _ => never,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_operator_is_never() {
        let f = lookup("xor");
        assert!(!f(&Value::Bool(true), &Value::Bool(true)));
    }

    #[test]
    fn tilde_equal_is_registered_as_minimum() {
        let f = lookup("~=");
        assert!(f(&Value::from("2.0"), &Value::from("1.0")));
        assert!(!f(&Value::from("1.0"), &Value::from("2.0")));
    }

    #[test]
    fn version_comparison_skips_unparseable_operands() {
        let f = lookup(">=~");
        assert!(!f(&Value::from("not-a-version"), &Value::from("1.0")));
    }

    #[test]
    fn type_mismatch_collapses_to_false() {
        let f = lookup(">");
        assert!(!f(&Value::Bool(true), &Value::Num(1.0)));
    }
}
