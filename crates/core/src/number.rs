use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

static LEADING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+").expect("static leading digit pattern"));
static TRAILING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+$").expect("static trailing digit pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorMode {
    #[default]
    Prefix,
    Suffix,
}

impl AnchorMode {
    pub fn from_suffix_flag(suffix: bool) -> Self {
        if suffix {
            Self::Suffix
        } else {
            Self::Prefix
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            Self::Prefix => &LEADING_DIGITS,
            Self::Suffix => &TRAILING_DIGITS,
        }
    }
}

/// Numeric value of a digit run, kept as its significant digits so that
/// runs of any length compare by value without overflowing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddedNumber(String);

impl EmbeddedNumber {
    pub fn from_digits(digits: &str) -> Self {
        let significant = digits.trim_start_matches('0');
        if significant.is_empty() {
            Self("0".to_string())
        } else {
            Self(significant.to_string())
        }
    }

    pub fn digit_count(&self) -> usize {
        self.0.len()
    }

    pub fn padded(&self, width: usize) -> String {
        format!("{:0>width$}", self.0, width = width)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for EmbeddedNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for EmbeddedNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EmbeddedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberMatch {
    /// Byte range of the digit run inside the stem.
    pub span: Range<usize>,
    pub number: EmbeddedNumber,
}

/// Splits `filename` on its last `.`; the extension keeps the dot.
pub fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(index) => filename.split_at(index),
        None => (filename, ""),
    }
}

pub fn find_number(stem: &str, anchor: AnchorMode) -> Option<NumberMatch> {
    let found = anchor.pattern().find(stem)?;
    Some(NumberMatch {
        span: found.range(),
        number: EmbeddedNumber::from_digits(found.as_str()),
    })
}

pub fn find_number_in_name(filename: &str, anchor: AnchorMode) -> Option<NumberMatch> {
    let (stem, _) = split_extension(filename);
    find_number(stem, anchor)
}
