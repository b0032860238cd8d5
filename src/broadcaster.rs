//! Version-set broadcaster.
//!
//! Enumerates the concrete versions of a package known to the rule
//! store that satisfy a constraint list, in packages-table insertion
//! order (parse order).

use crate::operators;
use crate::rules::RuleStore;
use crate::value::Value;

/// Versions of `name` (case-insensitive) for which every `(op, rhs)` in
/// `constraints` holds. Each known version is emitted at most once.
pub fn expand<'a>(
    store: &'a RuleStore,
    name: &str,
    constraints: &'a [(String, String)],
) -> impl Iterator<Item = String> + 'a {
    let key = name.to_lowercase();
    store
        .packages
        .get(&key)
        .into_iter()
        .flat_map(|versions| versions.keys())
        .filter(move |version| {
            constraints.iter().all(|(op, rhs)| {
                let cmp = operators::lookup(op);
                cmp(&Value::from(version.as_str()), &Value::from(rhs.as_str()))
            })
        })
        .cloned()
}
