//! Range compiler.
//!
//! Converts an enumerated "vulnerable version" set into a compact boolean
//! range expression over the version total order, using only `>=~`,
//! `<~`, `and`, `or`.

use crate::condition::Condition;
use crate::version;
use std::collections::HashSet;

/// Build `(name >=~ lower) and (name <~ upper)` (or an unbounded-below
/// `(name >=~ lower)` run) for every maximal run of matching versions in
/// sorted order, concatenated with `or`.
pub fn compile<I, J>(name: &str, matching_versions: I, all_versions: J) -> Condition
where
    I: IntoIterator<Item = String>,
    J: IntoIterator<Item = String>,
{
    let matching: HashSet<String> = matching_versions.into_iter().collect();

    let mut sorted: Vec<String> = all_versions.into_iter().collect();
    sorted.sort_by(|a, b| match (version::parse(a), version::parse(b)) {
        (Ok(va), Ok(vb)) => va.cmp(&vb),
        _ => a.cmp(b),
    });

    let mut ranges: Vec<Condition> = Vec::new();
    let mut bottom: Option<String> = None;

    for package_version in &sorted {
        if matching.contains(package_version) {
            if bottom.is_none() {
                bottom = Some(package_version.clone());
            }
        } else if let Some(lower) = bottom.take() {
            ranges.push(range_condition(name, &lower, Some(package_version)));
        }
    }
    if let Some(lower) = bottom {
        ranges.push(range_condition(name, &lower, None));
    }

    match ranges.len() {
        0 => Condition::node([]),
        1 => ranges.into_iter().next().unwrap(),
        _ => {
            let mut children = Vec::with_capacity(ranges.len() * 2 - 1);
            for (i, range) in ranges.into_iter().enumerate() {
                if i > 0 {
                    children.push(Condition::fact("or"));
                }
                children.push(range);
            }
            Condition::node(children)
        }
    }
}

fn range_condition(name: &str, lower: &str, upper: Option<&str>) -> Condition {
    let lower_bound = Condition::node([
        Condition::fact(name),
        Condition::fact(">=~"),
        Condition::literal(lower),
    ]);
    match upper {
        Some(upper) => Condition::node([
            lower_bound,
            Condition::fact("and"),
            Condition::node([
                Condition::fact(name),
                Condition::fact("<~"),
                Condition::literal(upper),
            ]),
        ]),
        None => lower_bound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::evaluate;
    use crate::value::facts_from;

    fn strs(vs: &[&str]) -> Vec<String> {
        vs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_matching_set_is_always_false() {
        let cond = compile("pkg", strs(&[]), strs(&["1.0", "2.0"]));
        for version in ["1.0", "2.0"] {
            let facts = facts_from([("pkg", version.into())]);
            assert!(!evaluate(&cond, &facts));
        }
    }

    #[test]
    fn matching_equals_all_is_single_unbounded_range() {
        let cond = compile("pkg", strs(&["1.0", "2.0"]), strs(&["1.0", "2.0"]));
        assert!(matches!(cond, Condition::Node(_)));
        for version in ["1.0", "2.0", "3.0"] {
            let facts = facts_from([("pkg", version.into())]);
            assert!(evaluate(&cond, &facts));
        }
    }

    #[test]
    fn round_trip_every_partition_classifies_correctly() {
        let all = strs(&["1.0", "1.1", "1.2", "2.0", "2.1", "3.0"]);
        let matching = strs(&["1.1", "1.2", "2.1"]);
        let cond = compile("pkg", matching.clone(), all.clone());
        let matching_set: std::collections::HashSet<_> = matching.into_iter().collect();
        for version in &all {
            let facts = facts_from([("pkg", version.as_str().into())]);
            assert_eq!(
                evaluate(&cond, &facts),
                matching_set.contains(version.as_str()),
                "mismatch for {version}"
            );
        }
    }

    #[test]
    fn unbounded_run_at_tail_has_no_upper_bound() {
        let all = strs(&["1.0", "2.0", "3.0"]);
        let matching = strs(&["2.0", "3.0"]);
        let cond = compile("pkg", matching, all);
        let facts = facts_from([("pkg", "99.0".into())]);
        assert!(evaluate(&cond, &facts));
    }
}
