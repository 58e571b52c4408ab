//! Label sets
//!
//! A [`LabelSet`] is the flat name/value mapping attached to one monitored
//! entity. Names are unique and ordering carries no meaning; two sets are
//! equal when they hold the same pairs.

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Prometheus label names must match: `[a-zA-Z_][a-zA-Z0-9_]*`
static LABEL_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("invalid label name regex"));

/// Check whether `name` is a valid label name
pub fn is_valid_label_name(name: &str) -> bool {
    LABEL_NAME_RE.is_match(name)
}

/// Explain why `name` is not a valid label name, or `None` if it is
pub fn label_name_violation(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("label name must not be empty")
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        Some("label name must not start with a digit")
    } else if !is_valid_label_name(name) {
        Some("label name must match [a-zA-Z_][a-zA-Z0-9_]*")
    } else {
        None
    }
}

/// Mapping from label name to label value
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet {
    labels: BTreeMap<String, String>,
}

impl LabelSet {
    /// Create an empty label set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a label, builder style
    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a label, returning the previous value if any
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.labels.insert(name.into(), value.into())
    }

    /// Look up a label value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    /// Look up a label value, reading an absent label as the empty string
    pub fn value_or_empty(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.labels.remove(name)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate over labels in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// First label whose name is malformed, with the reason
    pub fn invalid_label_name(&self) -> Option<(&str, &'static str)> {
        self.labels
            .keys()
            .find_map(|name| label_name_violation(name).map(|reason| (name.as_str(), reason)))
    }

    /// Join the values of `names` with `separator`
    ///
    /// Absent labels contribute an empty string, so the number of
    /// separators in the result is always `names.len() - 1`.
    pub fn join_values<S: AsRef<str>>(&self, names: &[S], separator: &str) -> String {
        let mut joined = String::new();
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                joined.push_str(separator);
            }
            joined.push_str(self.value_or_empty(name.as_ref()));
        }
        joined
    }

    /// Merge `other` into a copy of this set; labels in `other` win
    pub fn merge(&self, other: &LabelSet) -> LabelSet {
        let mut merged = self.clone();
        merged.extend(other.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        merged
    }
}

impl fmt::Display for LabelSet {
    /// Prometheus-style rendering: `{a="foo", b="bar"}`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}=\"{}\"", name, escape_value(value))?;
        }
        f.write_str("}")
    }
}

fn escape_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            labels: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for LabelSet {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.labels.insert(k.into(), v.into());
        }
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for LabelSet {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl IntoIterator for LabelSet {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.labels.into_iter()
    }
}
