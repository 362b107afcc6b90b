//! Tool version parsing and comparison.
//!
//! Versions compare segment by segment as numbers, so `1.10.0.0` is newer
//! than `1.7.7.5` even though it sorts lower as a string. Missing trailing
//! segments count as zero and non-numeric segments sort below any number.

use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static RE_VERSION_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"version\s+([0-9][0-9A-Za-z.\-]*)").expect("static version regex is valid")
});

static RE_DOTTED_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)+)").expect("static version regex is valid")
});

/// One dot-separated piece of a version.
///
/// Variant order matters: `Text` sorts before every `Number`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Segment {
    Text(String),
    Number(u64),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.parse::<u64>() {
            Ok(n) if raw.bytes().all(|b| b.is_ascii_digit()) => Segment::Number(n),
            _ => Segment::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Text(s) => f.write_str(s),
            Segment::Number(n) => write!(f, "{}", n),
        }
    }
}

/// A dotted version such as `1.7.7.5`.
#[derive(Debug, Clone)]
pub struct Version {
    segments: Vec<Segment>,
}

impl Version {
    /// Parse a dotted version. A leading `v` is accepted.
    ///
    /// Returns `None` for an empty string or one with empty segments.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let raw = raw.strip_prefix('v').unwrap_or(raw);
        if raw.is_empty() {
            return None;
        }
        let segments: Vec<Segment> = raw
            .split('.')
            .map(|s| (!s.is_empty()).then(|| Segment::parse(s)))
            .collect::<Option<_>>()?;
        Some(Self { segments })
    }

    /// The parsed segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether this version meets `required`.
    pub fn satisfies(&self, required: &Version) -> bool {
        self >= required
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s).ok_or_else(|| format!("invalid version: {:?}", s))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        const ZERO: Segment = Segment::Number(0);
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let left = self.segments.get(i).unwrap_or(&ZERO);
            let right = other.segments.get(i).unwrap_or(&ZERO);
            match left.cmp(right) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Equality must agree with `Ord`, so `1.7` == `1.7.0`.
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Pull a version out of `--version` output.
///
/// Looks at the first line only, preferring the number after the word
/// `version` (`git version 2.39.2`, `svn, version 1.14.2 (r1899510)`) and
/// falling back to the first dotted number on the line.
pub fn extract_version(output: &str) -> Option<Version> {
    let first_line = output.lines().next()?;
    let found = RE_VERSION_WORD
        .captures(first_line)
        .or_else(|| RE_DOTTED_NUMBER.captures(first_line))
        .and_then(|caps| caps.get(1))?;
    Version::parse(found.as_str().trim_end_matches('.'))
}
