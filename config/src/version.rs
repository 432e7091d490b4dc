//! Version parsing and comparison
//!
//! Versions follow the ebuild grammar (`1.2.3`, `1.0_rc2`, `2.4.1_p3-r1`) and
//! are reduced to a fixed-length sequence of comparable tokens:
//!
//! - `_alpha`, `_beta`, `_pre` and `_rc` merge with their number into one
//!   negative token, so `alpha < beta < pre < rc < release`
//! - `_p` keeps its number in place, so a patch release sorts above the release
//! - a trailing `-rN` always lands in the last slot
//! - everything in between is padded with `"0"`

use crate::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Number of slots in a normalized version, the last one being the revision.
pub const MAXVX: usize = 12;

/// Index of the revision slot.
pub const REVISION_SLOT: usize = MAXVX - 1;

const ALPHA_OFFSET: i64 = -40000;
const BETA_OFFSET: i64 = -30000;
const PRE_OFFSET: i64 = -20000;
const RC_OFFSET: i64 = -10000;

/// Version comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Same version ignoring the revision (~)
    Approximate,
    /// Exact, prefix (`1.2*`) or substring (`*1.2*`) match (=)
    Equal,
    /// Greater than or equal (>=)
    GreaterEqual,
    /// Less than or equal (<=)
    LessEqual,
    /// Greater than (>)
    Greater,
    /// Less than (<)
    Less,
}

impl Operator {
    /// The operator as written in an atom
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Approximate => "~",
            Operator::Equal => "=",
            Operator::GreaterEqual => ">=",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::Less => "<",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "~" => Ok(Operator::Approximate),
            "=" => Ok(Operator::Equal),
            ">=" => Ok(Operator::GreaterEqual),
            "<=" => Ok(Operator::LessEqual),
            ">" => Ok(Operator::Greater),
            "<" => Ok(Operator::Less),
            _ => Err(ConfigError::UnknownOperator(s.to_string())),
        }
    }
}

/// Wildcard form of a version used as an `=` filter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Wildcard {
    None,
    /// `1.2*`: the literal components before the star
    Trailing(Vec<String>),
    /// `*1.2*`: substring of the candidate's raw version
    Substring(String),
}

/// A parsed, comparable package version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct VersionSpec {
    raw: String,
    components: Vec<String>,
    normalized: Vec<String>,
    numeric: Vec<i64>,
    wildcard: Wildcard,
}

impl VersionSpec {
    /// Parse a version string.
    ///
    /// Parsing never fails: scanning stops at the first character that is not
    /// a separator, digit, letter or `*`, and whatever was read so far is kept.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let components = tokenize(raw);

        let trailing_star = components.last().map(String::as_str) == Some("*");
        let body = if trailing_star {
            &components[..components.len() - 1]
        } else {
            &components[..]
        };
        let normalized = normalize(body);

        let wildcard = if raw.len() >= 2 && raw.starts_with('*') && raw.ends_with('*') {
            Wildcard::Substring(raw[1..raw.len() - 1].to_string())
        } else if trailing_star {
            Wildcard::Trailing(body.to_vec())
        } else {
            Wildcard::None
        };

        let numeric = normalized
            .iter()
            .map(|token| token.parse::<i64>().unwrap_or(0))
            .collect();

        Self {
            raw: raw.to_string(),
            components,
            normalized,
            numeric,
            wildcard,
        }
    }

    /// The version exactly as given
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Literal digit/alpha runs in order of appearance
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Number of literal components
    pub fn count(&self) -> usize {
        self.components.len()
    }

    /// The `MAXVX` normalized tokens
    pub fn normalized(&self) -> &[String] {
        &self.normalized
    }

    /// The `MAXVX` normalized tokens as integers
    pub fn numeric(&self) -> &[i64] {
        &self.numeric
    }

    /// Revision token, `"0"` when the version has none
    pub fn revision(&self) -> &str {
        &self.normalized[REVISION_SLOT]
    }

    /// Whether this version carries a `*` wildcard
    pub fn is_wildcard(&self) -> bool {
        self.wildcard != Wildcard::None
    }

    /// Literal component at `index`, or `""` when out of range
    pub fn cut(&self, index: usize) -> &str {
        self.components.get(index).map(String::as_str).unwrap_or("")
    }

    /// Normalized token at `index`, or `""` when out of range
    pub fn cut_internal_vx(&self, index: usize) -> &str {
        self.normalized.get(index).map(String::as_str).unwrap_or("")
    }

    /// Order this version against another, slot by slot
    pub fn compare(&self, other: &VersionSpec) -> Ordering {
        self.compare_upto(other, MAXVX)
    }

    fn compare_upto(&self, other: &VersionSpec, limit: usize) -> Ordering {
        for i in 0..limit.min(MAXVX) {
            let ord = compare_slot(
                &self.normalized[i],
                self.numeric[i],
                &other.normalized[i],
                other.numeric[i],
            );
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Test `candidate` against this version used as a filter bound.
    ///
    /// `bound.matches(Operator::GreaterEqual, c)` holds when `c >= bound`.
    pub fn matches(&self, op: Operator, candidate: &VersionSpec) -> bool {
        match op {
            Operator::Equal => self.matches_equal(candidate),
            Operator::Approximate => {
                self.compare_upto(candidate, REVISION_SLOT) == Ordering::Equal
            }
            Operator::GreaterEqual => candidate.compare(self) != Ordering::Less,
            Operator::LessEqual => candidate.compare(self) != Ordering::Greater,
            Operator::Greater => candidate.compare(self) == Ordering::Greater,
            Operator::Less => candidate.compare(self) == Ordering::Less,
        }
    }

    /// Like [`matches`](Self::matches) but with the operator as text.
    ///
    /// An unknown operator is logged and never matches.
    pub fn match_op(&self, op: &str, candidate: &VersionSpec) -> bool {
        match op.parse::<Operator>() {
            Ok(op) => self.matches(op, candidate),
            Err(e) => {
                tracing::warn!("{} (comparing {} with {})", e, self.raw, candidate.raw);
                false
            }
        }
    }

    fn matches_equal(&self, candidate: &VersionSpec) -> bool {
        match &self.wildcard {
            Wildcard::Substring(inner) => candidate.raw.contains(inner.as_str()),
            Wildcard::Trailing(prefix) => candidate.components.starts_with(prefix),
            Wildcard::None => self.compare(candidate) == Ordering::Equal,
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for VersionSpec {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for VersionSpec {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<VersionSpec> for String {
    fn from(version: VersionSpec) -> Self {
        version.raw
    }
}

fn is_separator(b: u8) -> bool {
    matches!(b, b'.' | b'_' | b'-' | b'+')
}

/// Split a version into its digit runs, alpha runs and `*` tokens.
fn tokenize(raw: &str) -> Vec<String> {
    let bytes = raw.as_bytes();
    let mut components = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        while pos < bytes.len() && is_separator(bytes[pos]) {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }

        let start = pos;
        let first = bytes[pos];
        if first.is_ascii_digit() {
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
        } else if first.is_ascii_alphabetic() {
            while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
                pos += 1;
            }
        } else if first == b'*' {
            pos += 1;
        } else {
            break;
        }
        components.push(raw[start..pos].to_string());
    }

    components
}

fn is_number(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn suffix_offset(token: &str) -> Option<i64> {
    match token {
        "alpha" => Some(ALPHA_OFFSET),
        "beta" => Some(BETA_OFFSET),
        "pre" => Some(PRE_OFFSET),
        "rc" => Some(RC_OFFSET),
        _ => None,
    }
}

/// Build the `MAXVX` normalized slots.
fn normalize(components: &[String]) -> Vec<String> {
    let mut end = components.len();
    let mut revision = String::from("0");
    if end >= 2 && components[end - 2] == "r" && is_number(&components[end - 1]) {
        revision = components[end - 1].clone();
        end -= 2;
    }

    let mut slots: Vec<String> = Vec::with_capacity(MAXVX);
    let mut i = 0;
    while i < end {
        let token = components[i].as_str();
        let marker = suffix_offset(token).or(if token == "p" { Some(0) } else { None });

        match marker {
            Some(offset) => {
                let number = match components.get(i + 1) {
                    Some(next) if i + 1 < end && is_number(next) => {
                        i += 1;
                        next.parse::<i64>().unwrap_or(0)
                    }
                    _ => 0,
                };
                slots.push((offset + number).to_string());
            }
            None => slots.push(token.to_string()),
        }
        i += 1;
    }

    slots.truncate(REVISION_SLOT);
    slots.resize(REVISION_SLOT, String::from("0"));
    slots.push(revision);

    slots
}

/// Numeric value decides; text breaks ties between non-numeric tokens.
///
/// Two digit runs are compared by magnitude on their text, so runs too long
/// for `i64` still order correctly.
fn compare_slot(a_text: &str, a_num: i64, b_text: &str, b_num: i64) -> Ordering {
    if is_number(a_text) && is_number(b_text) {
        let a = a_text.trim_start_matches('0');
        let b = b_text.trim_start_matches('0');
        return a.len().cmp(&b.len()).then_with(|| a.cmp(b));
    }
    match a_num.cmp(&b_num) {
        Ordering::Equal if a_text.parse::<i64>().is_err() || b_text.parse::<i64>().is_err() => {
            a_text.cmp(b_text)
        }
        ord => ord,
    }
}
