//! Package version parsing and ordering
//!
//! Versions follow the package manager grammar:
//! `1.2.3`, `1.2.3b`, `1.0_rc1`, `2.0_beta2_p1`. Revisions (`-rN`) are handled
//! by [`crate::package::identity`].

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)*)([a-z]?)((?:_(?:alpha|beta|pre|rc|p)\d*)*)$")
        .expect("version regex is valid")
});

static SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(alpha|beta|pre|rc|p)(\d*)").expect("suffix regex is valid"));

/// Token marking a live/rolling build
pub const LIVE_VERSION_MARKER: &str = "9999";

/// Version suffix kinds, in ascending order.
///
/// A version without suffix sits between `Rc` and `P`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Suffix {
    Alpha,
    Beta,
    Pre,
    Rc,
    P,
}

impl Suffix {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "alpha" => Some(Suffix::Alpha),
            "beta" => Some(Suffix::Beta),
            "pre" => Some(Suffix::Pre),
            "rc" => Some(Suffix::Rc),
            "p" => Some(Suffix::P),
            _ => None,
        }
    }
}

/// A parsed package version
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    numbers: Vec<String>,
    letter: Option<char>,
    suffixes: Vec<(Suffix, u64)>,
}

impl Version {
    /// Parse a version string, returning `None` if it does not follow the grammar
    pub fn parse(version: &str) -> Option<Self> {
        let caps = VERSION_RE.captures(version)?;

        let numbers = caps[1].split('.').map(str::to_string).collect();
        let letter = caps[2].chars().next();
        let suffixes = SUFFIX_RE
            .captures_iter(&caps[3])
            .filter_map(|c| {
                let kind = Suffix::parse(&c[1])?;
                let n = if c[2].is_empty() { 0 } else { c[2].parse().ok()? };
                Some((kind, n))
            })
            .collect();

        Some(Self {
            raw: version.to_string(),
            numbers,
            letter,
            suffixes,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this is a live/rolling build
    pub fn is_live(&self) -> bool {
        self.raw.contains(LIVE_VERSION_MARKER)
    }

    /// Numeric components (`1.2.3` -> `["1", "2", "3"]`)
    pub fn numbers(&self) -> &[String] {
        &self.numbers
    }
}

/// Compare two digit strings as unbounded integers
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn cmp_numbers(a: &[String], b: &[String]) -> Ordering {
    let first = cmp_digits(&a[0], &b[0]);
    if first != Ordering::Equal {
        return first;
    }

    for (x, y) in a.iter().zip(b.iter()).skip(1) {
        // Components with a leading zero compare as decimal fractions
        let ord = if x.starts_with('0') || y.starts_with('0') {
            x.trim_end_matches('0').cmp(y.trim_end_matches('0'))
        } else {
            cmp_digits(x, y)
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    a.len().cmp(&b.len())
}

fn cmp_suffixes(a: &[(Suffix, u64)], b: &[(Suffix, u64)]) -> Ordering {
    for i in 0..a.len().max(b.len()) {
        let ord = match (a.get(i), b.get(i)) {
            (Some(x), Some(y)) => x.0.cmp(&y.0).then(x.1.cmp(&y.1)),
            (Some((s, _)), None) => {
                if *s == Suffix::P {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            (None, Some((s, _))) => {
                if *s == Suffix::P {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_numbers(&self.numbers, &other.numbers)
            .then_with(|| self.letter.cmp(&other.letter))
            .then_with(|| cmp_suffixes(&self.suffixes, &other.suffixes))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Returns true if `candidate` is strictly newer than `current`.
///
/// Strings outside the version grammar are never considered newer.
pub fn is_newer(candidate: &str, current: &str) -> bool {
    match (Version::parse(candidate), Version::parse(current)) {
        (Some(c), Some(cur)) => c > cur,
        _ => false,
    }
}
