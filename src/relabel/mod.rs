//! Label relabeling module
//!
//! This module rewrites, keeps, or drops label sets according to an ordered
//! chain of regex-driven rules.

pub mod engine;
pub mod labels;
pub mod rules;

pub use engine::{evaluate, relabel, Relabeler, RuleOutcome};
pub use labels::{is_valid_label_name, LabelSet};
pub use rules::{expand_template, Action, RelabelConfig, Rule, RuleResult, RuleSet};
