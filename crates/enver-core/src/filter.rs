//! Context and variable filters
//!
//! Both filters are pure predicates. Context filtering decides whether a
//! source takes part in a run at all; variable filtering decides, per
//! variable name, whether a resolved value is kept.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A name pattern: literal equality first, regular expression second
///
/// Patterns that are not valid regular expressions still match by
/// literal equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Pattern {
    raw: String,
    regex: Option<Regex>,
}

impl Pattern {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let regex = Regex::new(&raw).ok();
        Self { raw, regex }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Check whether `name` matches this pattern
    pub fn matches(&self, name: &str) -> bool {
        if self.raw == name {
            return true;
        }
        self.regex.as_ref().is_some_and(|re| re.is_match(name))
    }
}

impl From<String> for Pattern {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for Pattern {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.raw
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Pattern {}

/// Source eligibility by selected context names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextFilter {
    #[serde(default)]
    pub include: BTreeSet<String>,

    #[serde(default)]
    pub exclude: BTreeSet<String>,
}

impl ContextFilter {
    /// Whether a source with this filter is eligible under `selected`
    ///
    /// An empty selection always includes.
    pub fn includes<S: AsRef<str>>(&self, selected: &[S]) -> bool {
        if selected.is_empty() {
            return true;
        }

        let included = self.include.is_empty()
            || selected.iter().any(|s| self.include.contains(s.as_ref()));
        let excluded = selected.iter().any(|s| self.exclude.contains(s.as_ref()));

        included && !excluded
    }
}

/// Variable retention by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableFilter {
    #[serde(default)]
    pub include: Vec<Pattern>,

    #[serde(default)]
    pub exclude: Vec<Pattern>,
}

impl VariableFilter {
    pub fn new<I, E>(include: I, exclude: E) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Pattern>,
        E: IntoIterator,
        E::Item: Into<Pattern>,
    {
        Self {
            include: include.into_iter().map(Into::into).collect(),
            exclude: exclude.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a variable named `name` is kept
    pub fn keeps(&self, name: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|p| p.matches(name));
        included && !self.exclude.iter().any(|p| p.matches(name))
    }
}
