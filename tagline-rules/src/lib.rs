//! Rule evaluation engine for the Tagline platform.
//!
//! This crate exposes the declarative rule system used by the auto-tagging
//! pipeline. Rule sets are expressed either as JSON/YAML documents whose
//! conditions are compiled at load time, or directly in code as predicate +
//! action pairs. A [`RuleEngine`] aggregates both kinds behind one lookup and
//! evaluates every rule of a named set against a per-event context.

mod condition;
mod context;
mod definition;
mod engine;
mod error;
mod loader;
mod output;
mod provider;
mod rule;

pub use condition::{Comparator, Condition, ConditionError};
pub use context::{FromContextValue, RuleContext, RuleContextBuilder};
pub use definition::{RuleDefinition, RuleSetDefinition};
pub use engine::{NameResolution, RuleEngine, RuleExecutionResult};
pub use error::RuleError;
pub use loader::load_rule_set_definitions;
pub use output::RuleOutput;
pub use provider::{DeclarativeRuleProvider, LambdaRuleProvider, RuleProvider};
pub use rule::{Rule, RuleSet, RuleSetBuilder};
