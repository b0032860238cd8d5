//! Orchestration and reporting: load a bundle, parse requirement lines,
//! broadcast and explore each, and print a reasoning chain per
//! vulnerable match.

use crate::cli::{Cli, OutputFormat};
use color_eyre::eyre::{eyre, Result};
use console::Style;
use depaudit::explorer::{Path, PathElem};
use depaudit::value::facts_from;
use depaudit::Engine;
use std::io::IsTerminal;
use std::path::PathBuf;

const CVE_DETAIL_BASE: &str = "https://nvd.nist.gov/vuln/detail/";

struct Finding {
    requirement: String,
    vulnerable: bool,
    reasoning: Option<String>,
    cve: Option<String>,
}

/// Resolve the bundle path: `--bundle` flag, then `DEPAUDIT_BUNDLE`, then
/// a default path under the platform data directory.
fn resolve_bundle_path(cli: &Cli) -> Result<PathBuf> {
    if let Some(path) = &cli.bundle {
        return Ok(path.clone());
    }
    if let Ok(path) = std::env::var("DEPAUDIT_BUNDLE") {
        return Ok(PathBuf::from(path));
    }
    dirs::data_dir()
        .map(|dir| dir.join("depaudit").join("rules.bundle"))
        .ok_or_else(|| eyre!("could not determine a default data directory; pass --bundle explicitly"))
}

/// Replace version-comparison operator tokens with their mathematical
/// symbols for display.
fn prettify(rendered: &str) -> String {
    rendered
        .replace(">=~", "≥")
        .replace("<=~", "≤")
        .replace(">~", ">")
        .replace("<~", "<")
        .replace("==", "=")
}

fn reasoning_and_cve(path: &Path) -> (String, Option<String>) {
    let mut steps = Vec::new();
    let mut cve = None;
    for elem in path {
        match elem {
            PathElem::Condition(condition) => steps.push(prettify(&condition.render())),
            PathElem::Facts(facts) => cve = facts.get("$cve").map(|v| v.to_string()),
        }
    }
    let mut reasoning = steps.join(" \u{2192} ");
    if !reasoning.is_empty() {
        reasoning.push_str(" \u{2192} ");
    }
    reasoning.push_str(CVE_DETAIL_BASE);
    if let Some(id) = &cve {
        reasoning.push_str(id);
    }
    (reasoning, cve)
}

/// The first version of `requirement` (if any) with a path to `$vuln`.
fn first_vulnerable_path(engine: &Engine, requirement: &str, constraints: &[(String, String)], goal: &depaudit::value::Facts) -> Option<Path> {
    for version in engine.expand(requirement, constraints) {
        let facts = facts_from([(requirement.to_string(), version.into())]);
        if let Some(path) = engine.explore(&facts, goal).into_iter().next() {
            return Some(path);
        }
    }
    None
}

pub fn execute(cli: Cli) -> Result<i32> {
    if cli.requirements.is_empty() {
        eprintln!("no requirements given; pass one or more package specifiers or -r <path>");
        return Ok(2);
    }

    let bundle_path = resolve_bundle_path(&cli)?;
    let engine = Engine::load(&bundle_path)
        .map_err(|source| eyre!("failed to load rule bundle at {}: {source}", bundle_path.display()))?;

    let parsed = depaudit::requirements::parse_lines(&cli.requirements);
    let goal = facts_from([("$vuln", true.into())]);

    let findings: Vec<Finding> = parsed
        .iter()
        .map(|(name, entry)| match first_vulnerable_path(&engine, name, &entry.constraints, &goal) {
            Some(path) => {
                let (reasoning, cve) = reasoning_and_cve(&path);
                Finding {
                    requirement: name.clone(),
                    vulnerable: true,
                    reasoning: Some(reasoning),
                    cve,
                }
            }
            None => Finding {
                requirement: name.clone(),
                vulnerable: false,
                reasoning: None,
                cve: None,
            },
        })
        .collect();

    let any_vulnerable = findings.iter().any(|f| f.vulnerable);

    match cli.format {
        OutputFormat::Text => print_text(&findings),
        OutputFormat::Json => print_json(&findings),
    }

    Ok(if any_vulnerable { 1 } else { 0 })
}

fn print_text(findings: &[Finding]) {
    let colored = std::io::stdout().is_terminal();
    let red = Style::new().red();
    let green = Style::new().green();
    let dim = Style::new().dim();

    for finding in findings {
        if finding.vulnerable {
            let reasoning = finding.reasoning.as_deref().unwrap_or_default();
            if colored {
                println!("{}  {}", red.apply_to(&finding.requirement), dim.apply_to(format!("# {reasoning}")));
            } else {
                println!("{}  # {reasoning}", finding.requirement);
            }
        } else if colored {
            println!("{}", green.apply_to(&finding.requirement));
        } else {
            println!("{}", finding.requirement);
        }
    }
}

fn print_json(findings: &[Finding]) {
    let json = serde_json::json!({
        "vulnerable": findings.iter().any(|f| f.vulnerable),
        "findings": findings.iter().map(|f| serde_json::json!({
            "requirement": f.requirement,
            "vulnerable": f.vulnerable,
            "reasoning": f.reasoning,
            "cve": f.cve,
        })).collect::<Vec<_>>(),
    });
    println!("{json}");
}
