//! Rule matcher.
//!
//! `matching` yields Phase A (static rules whose condition currently
//! holds) then Phase B (dependency rules synthesized on demand from the
//! packages table), built from Rust iterator adapters so a consumer
//! that only reads the first few rules does the minimum work.

use crate::condition::{self, Condition};
use crate::operators;
use crate::rules::{Rule, RuleStore};
use crate::value::{facts_from, Facts, Value};

/// Phase A: static rules whose condition evaluates true against `facts`.
fn matching_static<'a>(store: &'a RuleStore, facts: &'a Facts) -> impl Iterator<Item = Rule> + 'a {
    store
        .rules
        .iter()
        .filter(move |(cond, _)| condition::evaluate(cond, facts))
        .cloned()
}

/// Phase B: for each `(fact_key, fact_value)` treat `fact_key` (lowered)
/// as a candidate package name and `fact_value` as one of its versions;
/// look up its direct dependencies and synthesize one rule per dependency
/// version whose constraints all hold.
fn matching_packages<'a>(store: &'a RuleStore, facts: &'a Facts) -> impl Iterator<Item = Rule> + 'a {
    facts.iter().flat_map(move |(fact_key, fact_value)| {
        let fact_key = fact_key.clone();
        let fact_value = fact_value.clone();
        let deps = fact_value
            .as_str()
            .and_then(|value| store.packages.get(&fact_key.to_lowercase()).and_then(|v| v.get(value)));

        deps.into_iter().flat_map(move |deps| {
            let fact_key = fact_key.clone();
            let fact_value = fact_value.clone();
            deps.iter().flat_map(move |(dep_name, constraints)| {
                let fact_key = fact_key.clone();
                let fact_value = fact_value.clone();
                let dep_name = dep_name.clone();
                let constraints = constraints.clone();
                store
                    .packages
                    .get(&dep_name)
                    .into_iter()
                    .flat_map(|versions| versions.keys().cloned())
                    .filter(move |version| satisfies_all(&constraints, version))
                    .map(move |version| {
                        let condition = Condition::node([
                            Condition::fact(fact_key.clone()),
                            Condition::fact("=="),
                            Condition::literal(fact_value.clone()),
                        ]);
                        let consequent = facts_from([(dep_name.clone(), Value::from(version))]);
                        (condition, consequent)
                    })
            })
        })
    })
}

fn satisfies_all(constraints: &[(String, String)], version: &str) -> bool {
    constraints.iter().all(|(op, rhs)| {
        let cmp = operators::lookup(op);
        cmp(&Value::from(version), &Value::from(rhs.as_str()))
    })
}

/// All rules currently applicable to `facts`: static rules first, then
/// synthesized dependency rules in fact-iteration order.
pub fn matching<'a>(store: &'a RuleStore, facts: &'a Facts) -> impl Iterator<Item = Rule> + 'a {
    matching_static(store, facts).chain(matching_packages(store, facts))
}
