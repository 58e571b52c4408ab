//! Relabel rule definitions
//!
//! A rule is declared as a [`RelabelConfig`] (the shape found in YAML
//! configuration files) and compiled into an immutable [`Rule`] holding the
//! compiled regex. Rules are stateless and can be shared freely between
//! threads.
//!
//! # Example
//!
//! ```
//! use relabeler::relabel::{Action, RelabelConfig, RuleSet};
//!
//! # fn main() -> Result<(), relabeler::error::RuleError> {
//! let rules = RuleSet::compile_all(&[
//!     RelabelConfig::new(Action::Replace)
//!         .source_labels(["a"])
//!         .regex("f(.*)")
//!         .target_label("d")
//!         .replacement("ch${1}-ch${1}"),
//! ])?;
//! assert_eq!(rules.len(), 1);
//! # Ok(())
//! # }
//! ```

use std::str::FromStr;

use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::RuleError;

use super::labels::label_name_violation;

/// Result type for rule operations
pub type RuleResult<T> = Result<T, RuleError>;

/// Default separator joining source label values
pub const DEFAULT_SEPARATOR: &str = ";";

/// Default pattern, matching any input and capturing it whole
pub const DEFAULT_REGEX: &str = "(.*)";

/// Default replacement, the first capture group
pub const DEFAULT_REPLACEMENT: &str = "$1";

/// Effect class of a relabel rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Action {
    /// Rewrite the target label on match
    #[default]
    Replace,
    /// Keep the label set only on match
    Keep,
    /// Drop the label set on match
    Drop,
}

impl Action {
    /// Returns the configuration string of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Replace => "replace",
            Action::Keep => "keep",
            Action::Drop => "drop",
        }
    }
}

impl FromStr for Action {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replace" => Ok(Action::Replace),
            "keep" => Ok(Action::Keep),
            "drop" => Ok(Action::Drop),
            _ => Err(RuleError::UnknownAction(s.to_string())),
        }
    }
}

impl Serialize for Action {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declarative form of a relabel rule
///
/// # Example Configuration (YAML)
///
/// ```yaml
/// source_labels: [a, b]
/// separator: ";"
/// regex: "^f(.*);(.*)r$"
/// target_label: a
/// replacement: "b${1}${2}m"
/// action: replace
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelabelConfig {
    /// Labels whose values are joined and matched
    #[serde(default)]
    pub source_labels: Vec<String>,

    /// Separator placed between source label values
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Pattern matched against the joined source values
    #[serde(default = "default_regex")]
    pub regex: String,

    /// Label written by `replace`; may reference capture groups
    #[serde(default)]
    pub target_label: Option<String>,

    /// Replacement template with `$N` / `${N}` capture references
    #[serde(default = "default_replacement")]
    pub replacement: String,

    /// What to do on match
    #[serde(default)]
    pub action: Action,
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn default_regex() -> String {
    DEFAULT_REGEX.to_string()
}

fn default_replacement() -> String {
    DEFAULT_REPLACEMENT.to_string()
}

impl Default for RelabelConfig {
    fn default() -> Self {
        Self::new(Action::default())
    }
}

impl RelabelConfig {
    /// Create a config for `action` with every other field defaulted
    pub fn new(action: Action) -> Self {
        Self {
            source_labels: Vec::new(),
            separator: default_separator(),
            regex: default_regex(),
            target_label: None,
            replacement: default_replacement(),
            action,
        }
    }

    pub fn source_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn regex(mut self, regex: impl Into<String>) -> Self {
        self.regex = regex.into();
        self
    }

    pub fn target_label(mut self, target: impl Into<String>) -> Self {
        self.target_label = Some(target.into());
        self
    }

    pub fn replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = replacement.into();
        self
    }

    /// Validate the config and compile it into a [`Rule`]
    ///
    /// # Errors
    ///
    /// Returns an error if the regex does not compile, a `replace` rule has
    /// no target label, or a source/target label name is malformed.
    pub fn compile(&self) -> RuleResult<Rule> {
        for name in &self.source_labels {
            check_label_name(name)?;
        }

        let regex = Regex::new(&self.regex).map_err(|e| RuleError::InvalidPattern {
            pattern: self.regex.clone(),
            source: e,
        })?;

        let target_label = match (self.action, self.target_label.as_deref()) {
            (Action::Replace, None | Some("")) => return Err(RuleError::MissingTargetLabel),
            (Action::Replace, Some(target)) => {
                // Templated targets can only be checked once expanded.
                if !target.contains('$') {
                    check_label_name(target)?;
                }
                target.to_string()
            }
            (_, target) => target.unwrap_or_default().to_string(),
        };

        Ok(Rule {
            source_labels: self.source_labels.clone(),
            separator: self.separator.clone(),
            regex,
            target_label,
            replacement: self.replacement.clone(),
            action: self.action,
        })
    }
}

fn check_label_name(name: &str) -> RuleResult<()> {
    match label_name_violation(name) {
        Some(reason) => Err(RuleError::InvalidLabelName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Compiled, immutable relabel rule
#[derive(Debug, Clone)]
pub struct Rule {
    source_labels: Vec<String>,
    separator: String,
    regex: Regex,
    target_label: String,
    replacement: String,
    action: Action,
}

impl Rule {
    pub fn source_labels(&self) -> &[String] {
        &self.source_labels
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Target label template; empty for `keep` and `drop` rules without one
    pub fn target_label(&self) -> &str {
        &self.target_label
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Search `input` with the rule's regex
    ///
    /// Returns `Some` on a match, including a zero-length one, and `None`
    /// when the pattern does not match at all.
    pub fn captures<'h>(&self, input: &'h str) -> Option<Captures<'h>> {
        self.regex.captures(input)
    }

    /// Expand the replacement template against `captures`
    pub fn expand_replacement(&self, captures: &Captures<'_>) -> String {
        expand_template(&self.replacement, captures)
    }

    /// Expand the target label template against `captures`
    pub fn expand_target(&self, captures: &Captures<'_>) -> String {
        expand_template(&self.target_label, captures)
    }
}

/// Ordered collection of compiled rules
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Create a new empty rule set
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create a rule set from already compiled rules
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Compile every config, in order
    ///
    /// # Errors
    ///
    /// Returns `RuleError::RuleCompileFailed` carrying the index of the
    /// first config that fails to compile.
    pub fn compile_all(configs: &[RelabelConfig]) -> RuleResult<Self> {
        configs
            .iter()
            .enumerate()
            .map(|(index, config)| {
                config.compile().map_err(|e| RuleError::RuleCompileFailed {
                    index,
                    source: Box::new(e),
                })
            })
            .collect()
    }

    /// Add a rule to the end of the chain
    pub fn add(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

/// Apply capture group substitution to a template string
///
/// Uses the regex crate's expansion rules:
/// - `$name` takes the longest run of `[_0-9A-Za-z]`; an all-digit name is a
///   group index (`$10` is group 10, `$1_x` is the group named `1_x`)
/// - `${name}` delimits the reference (`${1}0` is group 1 then a literal `0`)
/// - `$$` is a literal `$`
///
/// References to groups that did not participate or do not exist expand to
/// the empty string. A `$` not followed by a reference is copied verbatim.
pub fn expand_template(template: &str, captures: &Captures<'_>) -> String {
    let mut result = String::with_capacity(template.len());
    captures.expand(template, &mut result);
    result
}
