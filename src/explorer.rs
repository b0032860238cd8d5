//! Forward-chaining explorer.
//!
//! Memoized depth-first enumeration of paths from an initial fact map to
//! a goal predicate, guarded against cycles by tracking in-progress
//! cache keys. Interior mutability uses `RefCell`, not a mutex: a single
//! `Explorer` is not meant to be driven from more than one thread at a
//! time.

use crate::matcher;
use crate::rules::RuleStore;
use crate::value::{sorted_pairs, Facts};
use crate::condition::Condition;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum PathElem {
    Condition(Condition),
    Facts(Facts),
}

pub type Path = Vec<PathElem>;

type CacheKey = (Vec<(String, String)>, Vec<(String, String)>);

fn cache_key_for(facts: &Facts, goal: &Facts) -> CacheKey {
    (sorted_pairs(facts), sorted_pairs(goal))
}

/// `goal` is a conjunction of key/value equalities; `facts` satisfies it
/// iff every key in `goal` is present in `facts` with an equal value.
/// Extra keys in `facts` are ignored.
fn satisfies(facts: &Facts, goal: &Facts) -> bool {
    goal.iter().all(|(key, value)| facts.get(key) == Some(value))
}

pub struct Explorer {
    store: Rc<RuleStore>,
    path_cache: RefCell<HashMap<CacheKey, Vec<Path>>>,
    in_progress: RefCell<HashSet<CacheKey>>,
}

impl Explorer {
    pub fn new(store: Rc<RuleStore>) -> Explorer {
        Explorer {
            store,
            path_cache: RefCell::new(HashMap::new()),
            in_progress: RefCell::new(HashSet::new()),
        }
    }

    /// Enumerate every path from `facts` to `goal`, memoized by
    /// `(sorted facts, sorted goal)`. Deterministic across repeated calls.
    pub fn explore(&self, facts: &Facts, goal: &Facts) -> Vec<Path> {
        let key = cache_key_for(facts, goal);
        self.explore_keyed(facts, goal, key)
    }

    fn explore_keyed(&self, facts: &Facts, goal: &Facts, key: CacheKey) -> Vec<Path> {
        if let Some(cached) = self.path_cache.borrow().get(&key) {
            return cached.clone();
        }
        // An in-progress key re-entered through a cycle yields no paths;
        // any genuinely new path would have extended the fact map instead.
        if self.in_progress.borrow().contains(&key) {
            return Vec::new();
        }
        self.in_progress.borrow_mut().insert(key.clone());

        let mut paths = Vec::new();
        if satisfies(facts, goal) {
            paths.push(vec![PathElem::Facts(facts.clone())]);
        } else {
            for (condition, consequent) in matcher::matching(&self.store, facts) {
                let sub_key = cache_key_for(&consequent, goal);
                for sub_path in self.explore_keyed(&consequent, goal, sub_key) {
                    let mut path = Vec::with_capacity(sub_path.len() + 1);
                    path.push(PathElem::Condition(condition.clone()));
                    path.extend(sub_path);
                    paths.push(path);
                }
            }
        }

        self.in_progress.borrow_mut().remove(&key);
        self.path_cache.borrow_mut().insert(key, paths.clone());
        paths
    }

    /// Drop every memoized path. The cache otherwise grows monotonically
    /// with unique `(facts, goal)` queries; this is the manual eviction
    /// hook.
    pub fn clear_cache(&self) {
        self.path_cache.borrow_mut().clear();
        self.in_progress.borrow_mut().clear();
    }
}

/// Render a path the way the CLI prints a reasoning chain: conditions
/// left-to-right, then the terminal fact map.
pub fn render_path(path: &Path) -> String {
    path.iter()
        .map(|elem| match elem {
            PathElem::Condition(c) => c.render(),
            PathElem::Facts(facts) => facts
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleStore;
    use crate::value::facts_from;
    use serde_json::json;

    fn fixture_store() -> Rc<RuleStore> {
        let doc = json!({
            "packages": {
                "autobahn": {
                    "20.12.3": { "cryptography": [[">=", "2.5"]] }
                },
                "cryptography": {
                    "2.9": {},
                    "3.0": {},
                    "3.4": {}
                }
            },
            "rules": [
                [
                    [["cryptography", ">=~", "2.0"], "and", ["cryptography", "<~", "3.3"]],
                    { "$cve": "CVE-2020-0001", "$vuln": true }
                ]
            ]
        });
        Rc::new(RuleStore::from_json(&doc).expect("valid fixture"))
    }

    #[test]
    fn facts_already_satisfying_goal_is_singleton_path() {
        let explorer = Explorer::new(fixture_store());
        let facts = facts_from([("$vuln", true.into())]);
        let goal = facts_from([("$vuln", true.into())]);
        let paths = explorer.explore(&facts, &goal);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0], vec![PathElem::Facts(facts)]);
    }

    #[test]
    fn transitive_dependency_to_cve_path_is_found() {
        let explorer = Explorer::new(fixture_store());
        let facts = facts_from([("autobahn", "20.12.3".into())]);
        let goal = facts_from([("$vuln", true.into())]);
        let paths = explorer.explore(&facts, &goal);
        assert!(!paths.is_empty());
        assert!(paths.iter().any(|path| path.len() == 3));
    }

    #[test]
    fn no_path_when_version_outside_vulnerable_range() {
        let explorer = Explorer::new(fixture_store());
        let facts = facts_from([("cryptography", "3.4".into())]);
        let goal = facts_from([("$vuln", true.into())]);
        assert!(explorer.explore(&facts, &goal).is_empty());
    }

    #[test]
    fn repeated_calls_are_deterministic() {
        let explorer = Explorer::new(fixture_store());
        let facts = facts_from([("autobahn", "20.12.3".into())]);
        let goal = facts_from([("$vuln", true.into())]);
        let first = explorer.explore(&facts, &goal);
        let second = explorer.explore(&facts, &goal);
        assert_eq!(first, second);
    }

    #[test]
    fn clear_cache_resets_memoization() {
        let explorer = Explorer::new(fixture_store());
        let facts = facts_from([("cryptography", "3.0".into())]);
        let goal = facts_from([("$vuln", true.into())]);
        let before = explorer.explore(&facts, &goal);
        explorer.clear_cache();
        let after = explorer.explore(&facts, &goal);
        assert_eq!(before, after);
    }
}
