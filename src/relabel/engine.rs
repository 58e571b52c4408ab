//! Relabel Engine - rule chain evaluation
//!
//! This module applies an ordered list of relabel rules to a label set.
//! Each rule sees the label set as left by the rules before it. A `drop`
//! anywhere in the chain ends evaluation with no label set; an error ends it
//! with the error. The caller's label set is never modified.

use std::borrow::Cow;

use crate::error::RelabelError;

use super::labels::{label_name_violation, LabelSet};
use super::rules::{Action, Rule, RuleSet};

/// Outcome of evaluating a single rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// Leave the label set as it is
    Pass,
    /// Discard the whole label set
    Drop,
    /// Set `name` to `value`
    Set { name: String, value: String },
}

/// Evaluate one rule against the current label set
///
/// Source labels are read from `labels`; absent labels read as the empty
/// string. The label set itself is not touched: a `replace` that matches
/// reports the assignment as [`RuleOutcome::Set`].
///
/// # Errors
///
/// Returns `RelabelError::InvalidLabelName` if the target label template
/// expands to something that is not a valid label name.
pub fn evaluate(labels: &LabelSet, rule: &Rule) -> Result<RuleOutcome, RelabelError> {
    let value = labels.join_values(rule.source_labels(), rule.separator());
    let captures = rule.captures(&value);

    let outcome = match (rule.action(), captures) {
        (Action::Drop, Some(_)) | (Action::Keep, None) => RuleOutcome::Drop,
        (Action::Drop, None) | (Action::Keep, Some(_)) | (Action::Replace, None) => {
            RuleOutcome::Pass
        }
        (Action::Replace, Some(caps)) => {
            let name = rule.expand_target(&caps);
            if let Some(reason) = label_name_violation(&name) {
                return Err(RelabelError::InvalidLabelName {
                    name,
                    reason: reason.to_string(),
                });
            }
            RuleOutcome::Set {
                name,
                value: rule.expand_replacement(&caps),
            }
        }
    };

    tracing::trace!(
        action = %rule.action(),
        input = %value,
        outcome = ?outcome,
        "Evaluated relabel rule"
    );

    Ok(outcome)
}

/// Apply `rules` to `labels` in order
///
/// Returns `Ok(None)` when a rule drops the label set, and the relabeled set
/// otherwise. With no rules the result is a copy of `labels`.
///
/// # Errors
///
/// Returns `RelabelError::RuleFailed` with the index of the first rule that
/// fails. Later rules are not evaluated.
///
/// # Example
///
/// ```
/// use relabeler::relabel::{relabel, Action, LabelSet, RelabelConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let rule = RelabelConfig::new(Action::Drop)
///     .source_labels(["a"])
///     .regex("o$")
///     .compile()?;
///
/// let labels = LabelSet::from([("a", "foo")]);
/// assert_eq!(relabel(&labels, &[rule])?, None);
/// # Ok(())
/// # }
/// ```
pub fn relabel<'r, I>(labels: &LabelSet, rules: I) -> Result<Option<LabelSet>, RelabelError>
where
    I: IntoIterator<Item = &'r Rule>,
{
    let mut current = Cow::Borrowed(labels);

    for (index, rule) in rules.into_iter().enumerate() {
        let outcome = evaluate(&current, rule).map_err(|e| RelabelError::RuleFailed {
            index,
            source: Box::new(e),
        })?;

        match outcome {
            RuleOutcome::Pass => {}
            RuleOutcome::Drop => {
                tracing::debug!(rule = index, labels = %current, "Label set dropped");
                return Ok(None);
            }
            RuleOutcome::Set { name, value } => {
                current.to_mut().insert(name, value);
            }
        }
    }

    Ok(Some(current.into_owned()))
}

/// Relabel engine holding a compiled rule chain
///
/// Cloning is cheap enough to hand one engine to each worker, and the engine
/// is `Send + Sync`, so it can equally be shared by reference.
#[derive(Debug, Clone, Default)]
pub struct Relabeler {
    rules: RuleSet,
}

impl Relabeler {
    /// Create a new Relabeler with the given rules
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Create an engine without rules, which passes every label set through
    pub fn empty() -> Self {
        Self::new(RuleSet::new())
    }

    /// Get a reference to the rule set
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Apply the rule chain to one label set
    pub fn relabel(&self, labels: &LabelSet) -> Result<Option<LabelSet>, RelabelError> {
        relabel(labels, &self.rules)
    }

    /// Apply the rule chain to each label set, preserving order
    ///
    /// Dropped sets appear as `None` at their position.
    ///
    /// # Errors
    ///
    /// Stops at the first label set whose evaluation fails.
    pub fn relabel_all(
        &self,
        sets: &[LabelSet],
    ) -> Result<Vec<Option<LabelSet>>, RelabelError> {
        let results = sets
            .iter()
            .map(|labels| self.relabel(labels))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            total = sets.len(),
            dropped = results.iter().filter(|r| r.is_none()).count(),
            "Relabeled label sets"
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relabel::rules::RelabelConfig;

    fn rule(config: RelabelConfig) -> Rule {
        config.compile().unwrap()
    }

    // ==========================================================================
    // Single rule tests
    // ==========================================================================

    #[test]
    fn test_evaluate_drop() {
        let labels = LabelSet::from([("a", "foo")]);
        let drop = rule(RelabelConfig::new(Action::Drop).source_labels(["a"]).regex("o$"));
        assert_eq!(evaluate(&labels, &drop).unwrap(), RuleOutcome::Drop);

        let drop = rule(
            RelabelConfig::new(Action::Drop)
                .source_labels(["a"])
                .regex("no-match"),
        );
        assert_eq!(evaluate(&labels, &drop).unwrap(), RuleOutcome::Pass);
    }

    #[test]
    fn test_evaluate_keep() {
        let labels = LabelSet::from([("a", "foo")]);
        let keep = rule(RelabelConfig::new(Action::Keep).source_labels(["a"]).regex("^f"));
        assert_eq!(evaluate(&labels, &keep).unwrap(), RuleOutcome::Pass);

        let keep = rule(
            RelabelConfig::new(Action::Keep)
                .source_labels(["a"])
                .regex("no-match"),
        );
        assert_eq!(evaluate(&labels, &keep).unwrap(), RuleOutcome::Drop);
    }

    #[test]
    fn test_evaluate_replace() {
        let labels = LabelSet::from([("a", "foo")]);
        let replace = rule(
            RelabelConfig::new(Action::Replace)
                .source_labels(["a"])
                .regex("f(.*)")
                .target_label("d")
                .replacement("ch${1}-ch${1}"),
        );
        assert_eq!(
            evaluate(&labels, &replace).unwrap(),
            RuleOutcome::Set {
                name: "d".to_string(),
                value: "choo-choo".to_string(),
            }
        );
    }

    #[test]
    fn test_evaluate_replace_no_match() {
        let labels = LabelSet::from([("a", "boo"), ("b", "keep-me")]);
        let replace = rule(
            RelabelConfig::new(Action::Replace)
                .source_labels(["a"])
                .regex("^f")
                .target_label("b")
                .replacement("bar"),
        );
        assert_eq!(evaluate(&labels, &replace).unwrap(), RuleOutcome::Pass);
    }

    #[test]
    fn test_evaluate_templated_target() {
        let labels = LabelSet::from([("__meta_tag", "env=prod")]);
        let replace = rule(
            RelabelConfig::new(Action::Replace)
                .source_labels(["__meta_tag"])
                .regex("(\\w+)=(\\w+)")
                .target_label("${1}")
                .replacement("$2"),
        );
        assert_eq!(
            evaluate(&labels, &replace).unwrap(),
            RuleOutcome::Set {
                name: "env".to_string(),
                value: "prod".to_string(),
            }
        );
    }

    #[test]
    fn test_evaluate_invalid_expanded_target() {
        let labels = LabelSet::from([("a", "1x")]);
        let replace = rule(
            RelabelConfig::new(Action::Replace)
                .source_labels(["a"])
                .regex("(.*)")
                .target_label("$1"),
        );
        match evaluate(&labels, &replace) {
            Err(RelabelError::InvalidLabelName { name, .. }) => assert_eq!(name, "1x"),
            other => panic!("Expected InvalidLabelName error, got {:?}", other),
        }
    }

    #[test]
    fn test_evaluate_empty_source_labels() {
        // No source labels join to "", which the default regex matches.
        let labels = LabelSet::from([("a", "foo")]);
        let replace = rule(
            RelabelConfig::new(Action::Replace)
                .target_label("static")
                .replacement("value"),
        );
        assert_eq!(
            evaluate(&labels, &replace).unwrap(),
            RuleOutcome::Set {
                name: "static".to_string(),
                value: "value".to_string(),
            }
        );
    }

    // ==========================================================================
    // Chain tests
    // ==========================================================================

    #[test]
    fn test_relabel_no_rules_returns_copy() {
        let labels = LabelSet::from([("a", "foo")]);
        let rules: [Rule; 0] = [];
        let result = relabel(&labels, &rules).unwrap();
        assert_eq!(result, Some(labels));
    }

    #[test]
    fn test_relabel_does_not_touch_input() {
        let labels = LabelSet::from([("a", "foo")]);
        let rules = [rule(
            RelabelConfig::new(Action::Replace)
                .source_labels(["a"])
                .target_label("a")
                .replacement("bar"),
        )];

        let result = relabel(&labels, &rules).unwrap().unwrap();
        assert_eq!(result.get("a"), Some("bar"));
        assert_eq!(labels.get("a"), Some("foo"));
    }

    #[test]
    fn test_relabel_error_carries_index() {
        let labels = LabelSet::from([("a", "foo"), ("bad", "-x")]);
        let rules = [
            rule(
                RelabelConfig::new(Action::Keep)
                    .source_labels(["a"])
                    .regex("foo"),
            ),
            rule(
                RelabelConfig::new(Action::Replace)
                    .source_labels(["bad"])
                    .target_label("$1"),
            ),
        ];

        let err = relabel(&labels, &rules).unwrap_err();
        assert_eq!(err.rule_index(), Some(1));
    }

    #[test]
    fn test_relabel_empty_replacement_sets_empty_value() {
        let labels = LabelSet::from([("a", "foo")]);
        let rules = [rule(
            RelabelConfig::new(Action::Replace)
                .source_labels(["a"])
                .target_label("a")
                .replacement(""),
        )];

        let result = relabel(&labels, &rules).unwrap().unwrap();
        assert_eq!(result.get("a"), Some(""));
        assert_eq!(result.len(), 1);
    }

    // ==========================================================================
    // Relabeler tests
    // ==========================================================================

    #[test]
    fn test_relabeler_empty() {
        let engine = Relabeler::empty();
        assert!(engine.rules().is_empty());
        let labels = LabelSet::from([("a", "foo")]);
        assert_eq!(engine.relabel(&labels).unwrap(), Some(labels));
    }

    #[test]
    fn test_relabeler_relabel_all() {
        let rules = RuleSet::from_rules(vec![rule(
            RelabelConfig::new(Action::Keep)
                .source_labels(["job"])
                .regex("^api$"),
        )]);
        let engine = Relabeler::new(rules);

        let sets = vec![
            LabelSet::from([("job", "api")]),
            LabelSet::from([("job", "worker")]),
            LabelSet::from([("job", "api"), ("instance", "b")]),
        ];
        let results = engine.relabel_all(&sets).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0], Some(sets[0].clone()));
        assert_eq!(results[1], None);
        assert_eq!(results[2], Some(sets[2].clone()));
    }

    #[test]
    fn test_relabeler_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Relabeler>();
        assert_send_sync::<Rule>();
    }
}
