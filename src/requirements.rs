//! Requirement-line parsing.
//!
//! Resolves `-r <path>` recursively and parses each remaining line into
//! `name -> (original_line, constraints)`. Malformed lines, lines
//! carrying extras, and individual version clauses that fail to parse
//! are all skipped silently rather than rejected.

use crate::version;
use indexmap::IndexMap;
use regex::Regex;
use std::fs;
use std::sync::OnceLock;
use thiserror::Error;

/// Requirement-line parsing never fails by design: malformed lines and
/// unreadable `-r` targets are skipped silently. This type exists so a
/// future stricter mode has somewhere to report into.
#[derive(Debug, Error)]
pub enum RequirementsError {}

/// One resolved requirement: the line it first appeared on (for display)
/// plus its accumulated `(operator, version)` constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementEntry {
    pub original_line: String,
    pub constraints: Vec<(String, String)>,
}

fn requirement_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([a-zA-Z0-9\-_.]+)(?:\[([a-zA-Z0-9\-_., ]+)\])?(?:\s*\(?([^;)]+)\)?)?(?:\s*;\s*(.+))?$")
            .expect("static regex is valid")
    })
}

fn version_clause_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(.==?|<|>)\s*([^~!=<>]+)").expect("static regex is valid"))
}

/// Parse a flat list of requirement lines (no `-r` resolution) into
/// `name -> constraints`. Lines with bracketed extras are dropped
/// entirely, environment markers are matched but discarded, duplicate
/// `(op, value)` pairs are deduped.
pub fn parse_requirements(lines: &[String]) -> IndexMap<String, Vec<(String, String)>> {
    let mut parsed: IndexMap<String, Vec<(String, String)>> = IndexMap::new();
    for line in lines {
        if line.starts_with("git+") {
            continue;
        }
        let Some(caps) = requirement_regex().captures(line.trim()) else {
            continue;
        };
        let name = caps.get(1).unwrap().as_str().to_string();
        if caps.get(2).is_some() {
            continue;
        }
        let entry = parsed.entry(name).or_default();
        if let Some(version_expr) = caps.get(3) {
            let version_expr = version_expr.as_str().trim();
            if !version_expr.is_empty() {
                for clause in version_expr.split(',') {
                    for clause_caps in version_clause_regex().captures_iter(clause.trim()) {
                        let op = clause_caps.get(1).unwrap().as_str().to_string();
                        let value = clause_caps.get(2).unwrap().as_str().trim().to_lowercase();
                        if op.is_empty() || value.is_empty() || version::parse(&value).is_err() {
                            continue;
                        }
                        let pair = (op, value);
                        if !entry.contains(&pair) {
                            entry.push(pair);
                        }
                    }
                }
            }
        }
    }
    parsed
}

fn merge(parsed: &mut IndexMap<String, RequirementEntry>, name: String, original_line: String, constraints: Vec<(String, String)>) {
    match parsed.get_mut(&name) {
        Some(existing) => existing.constraints.extend(constraints),
        None => {
            parsed.insert(name, RequirementEntry { original_line, constraints });
        }
    }
}

/// Resolve `-r <path>` / `-r path` recursively, then parse the rest,
/// merging constraint lists per package name in first-seen order. A
/// file that cannot be read is skipped rather than treated as an error.
pub fn parse_lines(lines: &[String]) -> IndexMap<String, RequirementEntry> {
    let mut parsed: IndexMap<String, RequirementEntry> = IndexMap::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();
        let path = if line == "-r" {
            lines.get(i + 1).cloned()
        } else {
            line.strip_prefix("-r ").map(|rest| rest.trim().to_string())
        };

        if let Some(path) = path {
            if let Ok(contents) = fs::read_to_string(&path) {
                let sub_lines: Vec<String> = contents
                    .trim()
                    .split(['\n', '\r'])
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                for (name, entry) in parse_lines(&sub_lines) {
                    merge(&mut parsed, name, entry.original_line, entry.constraints);
                }
            }
            if line == "-r" {
                i += 1;
            }
        } else if !line.is_empty() {
            let single = [line.to_string()];
            if let Some((name, constraints)) = parse_requirements(&single).into_iter().next() {
                merge(&mut parsed, name, line.to_string(), constraints);
            }
        }
        i += 1;
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn lines(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_name_has_no_constraints() {
        let parsed = parse_requirements(&lines(&["autobahn"]));
        assert_eq!(parsed["autobahn"], Vec::<(String, String)>::new());
    }

    #[test]
    fn version_clauses_are_collected() {
        let parsed = parse_requirements(&lines(&["autobahn>=20.0,<21.0"]));
        assert_eq!(
            parsed["autobahn"],
            vec![(">=".to_string(), "20.0".to_string()), ("<".to_string(), "21.0".to_string())]
        );
    }

    #[test]
    fn unparseable_version_clause_is_dropped_not_the_whole_requirement() {
        let parsed = parse_requirements(&lines(&["autobahn>=not-a-version,<21.0"]));
        assert_eq!(parsed["autobahn"], vec![("<".to_string(), "21.0".to_string())]);
    }

    #[test]
    fn extras_drop_the_whole_line() {
        let parsed = parse_requirements(&lines(&["autobahn[accelerate]>=20.0"]));
        assert!(!parsed.contains_key("autobahn"));
    }

    #[test]
    fn environment_marker_is_ignored_not_rejected() {
        let parsed = parse_requirements(&lines(&["autobahn>=20.0; python_version >= '3.8'"]));
        assert_eq!(parsed["autobahn"], vec![(">=".to_string(), "20.0".to_string())]);
    }

    #[test]
    fn git_urls_are_skipped() {
        let parsed = parse_requirements(&lines(&["git+https://example.com/repo.git"]));
        assert!(parsed.is_empty());
    }

    #[test]
    fn recursive_r_flag_merges_into_parent() {
        let dir = tempdir().expect("tempdir");
        let nested = dir.path().join("nested.txt");
        fs::write(&nested, "cryptography>=2.5\n").expect("write nested");

        let root = lines(&["autobahn>=20.0", "-r", nested.to_str().unwrap()]);
        let parsed = parse_lines(&root);

        assert!(parsed.contains_key("autobahn"));
        assert_eq!(parsed["cryptography"].constraints, vec![(">=".to_string(), "2.5".to_string())]);
    }

    #[test]
    fn unreadable_r_path_is_skipped_silently() {
        let parsed = parse_lines(&lines(&["-r", "/nonexistent/requirements.txt", "autobahn"]));
        assert_eq!(parsed.len(), 1);
        assert!(parsed.contains_key("autobahn"));
    }
}
