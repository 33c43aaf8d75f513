//! Release version parsing and ordering.
//!
//! Appliance releases are numbered `major.minor.patch`, optionally followed by
//! a hotfix suffix `-hN` and a candidate suffix `-cN` (`10.2.9`, `11.1.3-h1`,
//! `10.2.9-c2`). Ordering looks at `(major, minor, patch, hotfix)` only; the
//! candidate number is parsed but never compared.
//!
//! Two families of comparison helpers exist on purpose:
//!
//! - [`compare_strict`] returns an error for unparseable input;
//! - [`compare`] and the predicates ([`gte`], [`lt`], ...) never fail. The
//!   predicates evaluate to `false` when either side does not parse, so a
//!   gate built on them stays closed on bad input.

use std::cmp::Ordering;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::PanosError;

static VERSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    match Regex::new(r"^(\d+)\.(\d+)\.(\d+)(?:-h(\d+))?(?:-c(\d+))?$") {
        Ok(re) => re,
        Err(err) => panic!("invalid VERSION_PATTERN regex: {err}"),
    }
});

/// A parsed release version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ParsedVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    /// Hotfix number, 0 for a base release.
    pub hotfix: u32,
    /// Candidate build number, 0 for a final release.
    pub candidate: u32,
    /// Trimmed input text.
    pub raw: String,
}

impl ParsedVersion {
    /// Parses `text`, returning `None` for anything that is not a release version.
    pub fn parse(text: &str) -> Option<Self> {
        let raw = text.trim();
        let caps = VERSION_PATTERN.captures(raw)?;
        let number = |idx: usize| -> Option<u32> {
            match caps.get(idx) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(0),
            }
        };
        Some(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            hotfix: number(4)?,
            candidate: number(5)?,
            raw: raw.to_string(),
        })
    }

    /// Orders two versions by `(major, minor, patch, hotfix)`.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }

    /// `"major.minor"` train of this version.
    pub fn major_minor(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }

    pub fn is_hotfix(&self) -> bool {
        self.hotfix > 0
    }

    /// Canonical text without the candidate suffix.
    pub fn normalized(&self) -> String {
        if self.hotfix > 0 {
            format!("{}.{}.{}-h{}", self.major, self.minor, self.patch, self.hotfix)
        } else {
            format!("{}.{}.{}", self.major, self.minor, self.patch)
        }
    }

    fn sort_key(&self) -> (u32, u32, u32, u32) {
        (self.major, self.minor, self.patch, self.hotfix)
    }
}

impl fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parses a version string. Never fails; bad input yields `None`.
pub fn parse(text: &str) -> Option<ParsedVersion> {
    ParsedVersion::parse(text)
}

/// Compares two version strings, `None` if either does not parse.
pub fn compare(left: &str, right: &str) -> Option<Ordering> {
    let left = ParsedVersion::parse(left)?;
    let right = ParsedVersion::parse(right)?;
    Some(left.compare(&right))
}

/// Compares two version strings, failing with `INVALID_VERSION` on bad input.
pub fn compare_strict(left: &str, right: &str) -> Result<Ordering, PanosError> {
    compare(left, right).ok_or_else(|| PanosError::InvalidVersion {
        left: left.to_string(),
        right: right.to_string(),
    })
}

/// `left >= right`; false when either side does not parse.
pub fn gte(left: &str, right: &str) -> bool {
    compare(left, right).is_some_and(|o| o != Ordering::Less)
}

/// `left <= right`; false when either side does not parse.
pub fn lte(left: &str, right: &str) -> bool {
    compare(left, right).is_some_and(|o| o != Ordering::Greater)
}

/// `left > right`; false when either side does not parse.
pub fn gt(left: &str, right: &str) -> bool {
    compare(left, right) == Some(Ordering::Greater)
}

/// `left < right`; false when either side does not parse.
pub fn lt(left: &str, right: &str) -> bool {
    compare(left, right) == Some(Ordering::Less)
}

/// `left == right` by release ordering; false when either side does not parse.
pub fn eq(left: &str, right: &str) -> bool {
    compare(left, right) == Some(Ordering::Equal)
}

/// `"major.minor"` of a version string.
pub fn major_minor(text: &str) -> Option<String> {
    ParsedVersion::parse(text).map(|v| v.major_minor())
}

/// True for a parseable version with a non-zero hotfix.
pub fn is_hotfix(text: &str) -> bool {
    ParsedVersion::parse(text).is_some_and(|v| v.is_hotfix())
}

/// Canonical form of a version string, or the input unchanged if it does not parse.
pub fn normalize(text: &str) -> String {
    match ParsedVersion::parse(text) {
        Some(v) => v.normalized(),
        None => text.to_string(),
    }
}
