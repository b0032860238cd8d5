//! Package version parsing and ordering.
//!
//! Implements the public-Python-package versioning scheme: an epoch, a
//! release tuple, an optional pre-release, post-release, dev-release and
//! local version label (`dev < pre < final < post`, locals compared as
//! `Vec<LocalSegment>`). Parsing is hand-scanned rather than
//! regex-based, and covers the full scheme natively rather than
//! delegating to a three-component semver parser.

use dashmap::DashMap;
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid version string: {0}")]
pub struct InvalidVersionError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PreKind {
    Alpha,
    Beta,
    Rc,
}

impl fmt::Display for PreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreKind::Alpha => write!(f, "a"),
            PreKind::Beta => write!(f, "b"),
            PreKind::Rc => write!(f, "rc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocalSegment {
    Num(u64),
    Str(String),
}

impl Ord for LocalSegment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (LocalSegment::Num(a), LocalSegment::Num(b)) => a.cmp(b),
            (LocalSegment::Str(a), LocalSegment::Str(b)) => a.cmp(b),
            // "the numeric section always compares as greater than the lexicographic segment"
            (LocalSegment::Num(_), LocalSegment::Str(_)) => Ordering::Greater,
            (LocalSegment::Str(_), LocalSegment::Num(_)) => Ordering::Less,
        }
    }
}

impl PartialOrd for LocalSegment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LocalSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalSegment::Num(n) => write!(f, "{n}"),
            LocalSegment::Str(s) => write!(f, "{s}"),
        }
    }
}

/// A parsed, totally-ordered package version.
#[derive(Debug, Clone, Eq)]
pub struct Version {
    pub epoch: u64,
    pub release: Vec<u64>,
    pub pre: Option<(PreKind, u64)>,
    pub post: Option<u64>,
    pub dev: Option<u64>,
    pub local: Option<Vec<LocalSegment>>,
    normalized: String,
}

impl Version {
    /// The release-tuple accessor exposed for rule ingest; unused by
    /// the core engine itself.
    pub fn release(&self) -> &[u64] {
        &self.release
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

fn compare_release(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// `(pre_rank, pre_num, post_num_or_none_as_smallest, dev_num_or_max, local)`
/// Rank: dev-only = 0, alpha = 1, beta = 2, rc = 3, final = 4, post = 5.
type SortableTuple = (u8, u64, Option<u64>, u64, Option<Vec<LocalSegment>>);

fn sortable_tuple(v: &Version) -> SortableTuple {
    let dev_rank = v.dev.unwrap_or(u64::MAX);
    match (&v.pre, v.post, v.dev) {
        (None, None, Some(n)) => (0, 0, None, n, v.local.clone()),
        (Some((PreKind::Alpha, n)), post, _) => (1, *n, post, dev_rank, v.local.clone()),
        (Some((PreKind::Beta, n)), post, _) => (2, *n, post, dev_rank, v.local.clone()),
        (Some((PreKind::Rc, n)), post, _) => (3, *n, post, dev_rank, v.local.clone()),
        (None, None, None) => (4, 0, None, 0, v.local.clone()),
        (None, Some(post), _) => (5, 0, Some(post), dev_rank, v.local.clone()),
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| compare_release(&self.release, &other.release))
            .then_with(|| sortable_tuple(self).cmp(&sortable_tuple(other)))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized)
    }
}

struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }

    fn eat_digits(&mut self) -> Option<&'a str> {
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        if end == 0 {
            return None;
        }
        let (digits, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(digits)
    }

    fn eat_one_of(&mut self, chars: &[char]) -> bool {
        if let Some(c) = self.rest.chars().next() {
            if chars.contains(&c) {
                self.rest = &self.rest[c.len_utf8()..];
                return true;
            }
        }
        false
    }

    /// Case-insensitive literal match; consumes on success.
    fn eat_tag(&mut self, tag: &str) -> bool {
        if self.rest.len() >= tag.len() && self.rest[..tag.len()].eq_ignore_ascii_case(tag) {
            self.rest = &self.rest[tag.len()..];
            true
        } else {
            false
        }
    }

    fn eat_tag_longest<'b>(&mut self, tags: &[&'b str]) -> Option<&'b str> {
        let mut best: Option<&'b str> = None;
        for &tag in tags {
            if self.rest.len() >= tag.len()
                && self.rest[..tag.len()].eq_ignore_ascii_case(tag)
                && best.map(|b: &str| tag.len() > b.len()).unwrap_or(true)
            {
                best = Some(tag);
            }
        }
        if let Some(tag) = best {
            self.rest = &self.rest[tag.len()..];
        }
        best
    }

    fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }
}

fn parse_release(s: &mut Scanner) -> Option<Vec<u64>> {
    let mut parts = Vec::new();
    let first = s.eat_digits()?;
    parts.push(first.parse().ok()?);
    loop {
        let checkpoint = s.rest;
        if !s.eat_one_of(&['.']) {
            break;
        }
        match s.eat_digits() {
            Some(d) => parts.push(d.parse().ok()?),
            None => {
                s.rest = checkpoint;
                break;
            }
        }
    }
    Some(parts)
}

fn parse_pre(s: &mut Scanner) -> Option<(PreKind, u64)> {
    let checkpoint = s.rest;
    s.eat_one_of(&['-', '_', '.']);
    let tag = s.eat_tag_longest(&["alpha", "beta", "preview", "pre", "rc", "c", "a", "b"]);
    let kind = match tag {
        Some("a") | Some("alpha") => PreKind::Alpha,
        Some("b") | Some("beta") => PreKind::Beta,
        Some("rc") | Some("c") | Some("pre") | Some("preview") => PreKind::Rc,
        _ => {
            s.rest = checkpoint;
            return None;
        }
    };
    s.eat_one_of(&['-', '_', '.']);
    let num = s.eat_digits().and_then(|d| d.parse().ok()).unwrap_or(0);
    Some((kind, num))
}

fn parse_post(s: &mut Scanner) -> Option<u64> {
    let checkpoint = s.rest;
    // implicit post release: `-N`
    if s.eat_one_of(&['-']) {
        if let Some(d) = s.eat_digits() {
            return d.parse().ok();
        }
        s.rest = checkpoint;
        return None;
    }
    s.eat_one_of(&['-', '_', '.']);
    if s.eat_tag_longest(&["post", "rev", "r"]).is_some() {
        s.eat_one_of(&['-', '_', '.']);
        let num = s.eat_digits().and_then(|d| d.parse().ok()).unwrap_or(0);
        Some(num)
    } else {
        s.rest = checkpoint;
        None
    }
}

fn parse_dev(s: &mut Scanner) -> Option<u64> {
    let checkpoint = s.rest;
    s.eat_one_of(&['-', '_', '.']);
    if s.eat_tag("dev") {
        s.eat_one_of(&['-', '_', '.']);
        let num = s.eat_digits().and_then(|d| d.parse().ok()).unwrap_or(0);
        Some(num)
    } else {
        s.rest = checkpoint;
        None
    }
}

fn parse_local(s: &mut Scanner) -> Option<Vec<LocalSegment>> {
    if !s.eat_one_of(&['+']) {
        return None;
    }
    let mut segments = Vec::new();
    loop {
        let end = s
            .rest
            .char_indices()
            .find(|(_, c)| matches!(c, '.' | '-' | '_'))
            .map(|(i, _)| i)
            .unwrap_or(s.rest.len());
        let (seg, rest) = s.rest.split_at(end);
        if seg.is_empty() {
            break;
        }
        segments.push(if seg.chars().all(|c| c.is_ascii_digit()) {
            LocalSegment::Num(seg.parse().unwrap_or(0))
        } else {
            LocalSegment::Str(seg.to_ascii_lowercase())
        });
        s.rest = rest;
        if !s.eat_one_of(&['.', '-', '_']) {
            break;
        }
    }
    Some(segments)
}

fn normalize(input: &str) -> Result<Version, InvalidVersionError> {
    let trimmed = input.trim();
    let mut s = Scanner::new(trimmed);
    s.eat_one_of(&['v']);

    let epoch = {
        let checkpoint = s.rest;
        match s.eat_digits() {
            Some(digits) if s.eat_one_of(&['!']) => digits.parse().unwrap_or(0),
            _ => {
                s.rest = checkpoint;
                0
            }
        }
    };

    let release =
        parse_release(&mut s).ok_or_else(|| InvalidVersionError(input.to_string()))?;
    let pre = parse_pre(&mut s);
    let post = parse_post(&mut s);
    let dev = parse_dev(&mut s);
    let local = parse_local(&mut s);

    if !s.is_empty() {
        return Err(InvalidVersionError(input.to_string()));
    }

    let mut normalized = String::new();
    if epoch != 0 {
        normalized.push_str(&format!("{epoch}!"));
    }
    normalized.push_str(
        &release
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join("."),
    );
    if let Some((kind, n)) = &pre {
        normalized.push_str(&format!("{kind}{n}"));
    }
    if let Some(n) = post {
        normalized.push_str(&format!(".post{n}"));
    }
    if let Some(n) = dev {
        normalized.push_str(&format!(".dev{n}"));
    }
    if let Some(segs) = &local {
        normalized.push('+');
        normalized.push_str(
            &segs
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join("."),
        );
    }

    Ok(Version {
        epoch,
        release,
        pre,
        post,
        dev,
        local,
        normalized,
    })
}

fn intern_cache() -> &'static DashMap<String, Version> {
    static CACHE: OnceLock<DashMap<String, Version>> = OnceLock::new();
    CACHE.get_or_init(DashMap::new)
}

/// Parse a version string, caching the result by source string so repeated
/// lookups of the same string are O(1) after the first parse.
pub fn parse(s: &str) -> Result<Version, InvalidVersionError> {
    if let Some(cached) = intern_cache().get(s) {
        return Ok(cached.clone());
    }
    let version = normalize(s)?;
    intern_cache().insert(s.to_string(), version.clone());
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        parse(s).unwrap_or_else(|_| panic!("expected {s} to parse"))
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("not-a-version").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn caches_by_source_string() {
        let a = parse("1.2.3").unwrap();
        let b = parse("1.2.3").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn orders_dev_pre_final_post() {
        let chain = [
            "1.0.dev456",
            "1.0a1",
            "1.0a2.dev456",
            "1.0a12.dev456",
            "1.0a12",
            "1.0b1.dev456",
            "1.0b2",
            "1.0b2.post345.dev456",
            "1.0b2.post345",
            "1.0c1.dev456",
            "1.0c1",
            "1.0rc2",
            "1.0c3",
            "1.0",
            "1.0.post456.dev34",
            "1.0.post456",
        ];
        for pair in chain.windows(2) {
            assert!(
                v(pair[0]) < v(pair[1]),
                "{} should be < {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn release_padding_treats_missing_components_as_zero() {
        assert_eq!(v("1.1"), v("1.1.0"));
        assert!(v("1.16") < v("1.19"));
    }

    #[test]
    fn epoch_dominates_release() {
        assert!(v("1!0.1") > v("2.0"));
    }

    #[test]
    fn local_segments_compare_numeric_over_lexicographic() {
        assert!(v("1.0+abc") < v("1.0+1"));
        assert!(v("1.0+a") < v("1.0+a.1"));
    }
}
