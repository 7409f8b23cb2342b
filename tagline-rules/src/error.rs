use std::path::PathBuf;

use thiserror::Error;

use crate::condition::ConditionError;

/// Errors returned by the rules engine when loading, compiling or evaluating
/// rule sets.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule set not found: {0}")]
    SetNotFound(String),
    #[error("rule set {name} is provided by both {first} and {second}")]
    AmbiguousSet {
        name: String,
        first: String,
        second: String,
    },
    #[error("invalid condition in rule {rule}: {source}")]
    InvalidCondition {
        rule: String,
        #[source]
        source: ConditionError,
    },
    #[error("rule {rule} failed: {message}")]
    RuleFailed { rule: String, message: String },
    #[error("rules path does not exist: {0}")]
    MissingPath(String),
    #[error("failed to read rules from {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse rules from {path}: {message}")]
    Parse { path: String, message: String },
    #[error("duplicate rule set name detected: {0}")]
    DuplicateSet(String),
}

impl RuleError {
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RuleError::Io {
            path: path.into().display().to_string(),
            source,
        }
    }

    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        RuleError::Parse {
            path: path.into().display().to_string(),
            message: message.into(),
        }
    }

    pub fn rule_failed(rule: impl Into<String>, message: impl Into<String>) -> Self {
        RuleError::RuleFailed {
            rule: rule.into(),
            message: message.into(),
        }
    }
}

impl From<RuleError> for tagline_core::TaglineError {
    fn from(err: RuleError) -> Self {
        tagline_core::TaglineError::RuleViolation(err.to_string())
    }
}
