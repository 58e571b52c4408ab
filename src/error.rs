//! Error types for relabeler
//!
//! This module defines the error types used throughout the application.
//! Dropping a label set is a regular outcome of relabeling and is never
//! reported through these types.

use thiserror::Error;

/// Rule construction and validation errors
#[derive(Error, Debug)]
pub enum RuleError {
    /// Regex pattern failed to compile
    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Action name outside of replace/keep/drop
    #[error("Unknown relabel action '{0}', expected one of: replace, keep, drop")]
    UnknownAction(String),

    /// `replace` rule without a target label
    #[error("Relabel action 'replace' requires a target_label")]
    MissingTargetLabel,

    /// Invalid source or target label name
    #[error("Invalid label name '{name}': {reason}")]
    InvalidLabelName { name: String, reason: String },

    /// Rule compilation failed (with index)
    #[error("Failed to compile rule at index {index}: {source}")]
    RuleCompileFailed {
        index: usize,
        #[source]
        source: Box<RuleError>,
    },
}

/// Relabel evaluation errors
#[derive(Error, Debug)]
pub enum RelabelError {
    /// Expanded target label is not a valid label name
    #[error("Invalid label name '{name}': {reason}")]
    InvalidLabelName { name: String, reason: String },

    /// Evaluation of a rule in the chain failed (with index)
    #[error("Relabel rule at index {index} failed: {source}")]
    RuleFailed {
        index: usize,
        #[source]
        source: Box<RelabelError>,
    },
}

impl RelabelError {
    /// Index of the rule that failed, if known
    pub fn rule_index(&self) -> Option<usize> {
        match self {
            RelabelError::RuleFailed { index, .. } => Some(*index),
            RelabelError::InvalidLabelName { .. } => None,
        }
    }
}

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Relabel evaluation error
    #[error("Relabel error: {0}")]
    Relabel(#[from] RelabelError),

    /// Label set input could not be read or parsed
    #[error("Input error: {0}")]
    Input(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Input(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Input(err.to_string())
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;
