//! Rule store.
//!
//! A two-field, load-once container: the packages-versions-requirements
//! table and the static rule list, both deep-frozen after construction.
//! Bundle shape: `{"packages": {...}, "rules": [...]}`.

use crate::condition::Condition;
use crate::value::{facts_from, Facts, Value};
use indexmap::IndexMap;
use serde_json::Value as Json;
use thiserror::Error;

/// `dep_name -> [(operator, rhs_version), ...]`.
pub type DependencyConstraints = Vec<(String, String)>;
/// `version_string -> dependency constraints`.
pub type VersionDependencies = IndexMap<String, DependencyConstraints>;
/// `package_name (lowercase) -> version_string -> dependency constraints`.
pub type PackagesTable = IndexMap<String, IndexMap<String, VersionDependencies>>;

/// A `(condition, consequent_facts)` pair, static or synthesized.
pub type Rule = (Condition, Facts);

#[derive(Debug, Error)]
pub enum RuleStoreError {
    #[error("bundle has no top-level `packages` object")]
    MissingPackages,
    #[error("bundle has no top-level `rules` array")]
    MissingRules,
    #[error("malformed packages table entry for package {package:?}")]
    MalformedPackageEntry { package: String },
    #[error("malformed dependency constraint list for {package:?} {version:?} -> {dep:?}")]
    MalformedConstraint {
        package: String,
        version: String,
        dep: String,
    },
    #[error("malformed rule at index {index}: expected a 2-element [condition, consequent] array")]
    MalformedRule { index: usize },
    #[error("malformed consequent facts object at rule index {index}")]
    MalformedConsequent { index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleStore {
    pub packages: PackagesTable,
    pub rules: Vec<Rule>,
}

impl RuleStore {
    pub fn new(packages: PackagesTable, rules: Vec<Rule>) -> RuleStore {
        RuleStore { packages, rules }
    }

    /// Parse the bundle's top-level JSON document (the decompressed
    /// contents of the single zip entry, see `bundle::load`).
    pub fn from_json(doc: &Json) -> Result<RuleStore, RuleStoreError> {
        let packages = parse_packages(doc.get("packages").ok_or(RuleStoreError::MissingPackages)?)?;
        let rules = parse_rules(doc.get("rules").ok_or(RuleStoreError::MissingRules)?)?;
        Ok(RuleStore { packages, rules })
    }

    pub fn to_json(&self) -> Json {
        let packages = Json::Object(
            self.packages
                .iter()
                .map(|(name, versions)| (name.clone(), packages_versions_to_json(versions)))
                .collect(),
        );
        let rules = Json::Array(
            self.rules
                .iter()
                .map(|(condition, consequent)| {
                    Json::Array(vec![condition.to_json(), facts_to_json(consequent)])
                })
                .collect(),
        );
        Json::Object(
            [("packages".to_string(), packages), ("rules".to_string(), rules)]
                .into_iter()
                .collect(),
        )
    }
}

fn packages_versions_to_json(versions: &IndexMap<String, VersionDependencies>) -> Json {
    Json::Object(
        versions
            .iter()
            .map(|(version, deps)| (version.clone(), dependency_constraints_to_json(deps)))
            .collect(),
    )
}

fn dependency_constraints_to_json(deps: &VersionDependencies) -> Json {
    Json::Object(
        deps.iter()
            .map(|(dep_name, constraints)| {
                let list = Json::Array(
                    constraints
                        .iter()
                        .map(|(op, rhs)| Json::Array(vec![Json::String(op.clone()), Json::String(rhs.clone())]))
                        .collect(),
                );
                (dep_name.clone(), list)
            })
            .collect(),
    )
}

fn facts_to_json(facts: &Facts) -> Json {
    Json::Object(
        facts
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    Value::Str(s) => Json::String(s.clone()),
                    Value::Bool(b) => Json::Bool(*b),
                    Value::Num(n) => serde_json::Number::from_f64(*n).map(Json::Number).unwrap_or(Json::Null),
                };
                (k.clone(), value)
            })
            .collect(),
    )
}

fn parse_packages(json: &Json) -> Result<PackagesTable, RuleStoreError> {
    let object = json.as_object().ok_or(RuleStoreError::MissingPackages)?;
    let mut table = PackagesTable::new();
    for (package, versions_json) in object {
        let versions_obj = versions_json
            .as_object()
            .ok_or_else(|| RuleStoreError::MalformedPackageEntry { package: package.clone() })?;
        let mut versions = IndexMap::new();
        for (version, deps_json) in versions_obj {
            let deps_obj = deps_json
                .as_object()
                .ok_or_else(|| RuleStoreError::MalformedPackageEntry { package: package.clone() })?;
            let mut deps = IndexMap::new();
            for (dep_name, constraints_json) in deps_obj {
                let constraints = constraints_json
                    .as_array()
                    .ok_or_else(|| RuleStoreError::MalformedConstraint {
                        package: package.clone(),
                        version: version.clone(),
                        dep: dep_name.clone(),
                    })?
                    .iter()
                    .map(|pair| parse_constraint_pair(pair))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| RuleStoreError::MalformedConstraint {
                        package: package.clone(),
                        version: version.clone(),
                        dep: dep_name.clone(),
                    })?;
                deps.insert(dep_name.clone(), constraints);
            }
            versions.insert(version.clone(), deps);
        }
        table.insert(package.clone(), versions);
    }
    Ok(table)
}

fn parse_constraint_pair(pair: &Json) -> Option<(String, String)> {
    let items = pair.as_array()?;
    let op = items.first()?.as_str()?.to_string();
    let rhs = items.get(1)?.as_str()?.to_string();
    Some((op, rhs))
}

fn parse_rules(json: &Json) -> Result<Vec<Rule>, RuleStoreError> {
    let array = json.as_array().ok_or(RuleStoreError::MissingRules)?;
    array
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let pair = entry.as_array().ok_or(RuleStoreError::MalformedRule { index })?;
            if pair.len() != 2 {
                return Err(RuleStoreError::MalformedRule { index });
            }
            let condition = Condition::from_json(&pair[0]);
            let consequent_obj = pair[1]
                .as_object()
                .ok_or(RuleStoreError::MalformedConsequent { index })?;
            let consequent = facts_from(consequent_obj.iter().map(|(k, v)| (k.clone(), json_to_value(v))));
            Ok((condition, consequent))
        })
        .collect()
}

fn json_to_value(json: &Json) -> Value {
    match json {
        Json::String(s) => Value::Str(s.clone()),
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Num(n.as_f64().unwrap_or(0.0)),
        _ => Value::Str(json.to_string()),
    }
}
