use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::Condition;
use crate::error::RuleError;
use crate::rule::{Rule, RuleSet};

/// Declarative rule definition as it appears in configuration documents.
///
/// The condition is a textual boolean expression; `set` entries are copied
/// verbatim into the output when the condition matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleDefinition {
    pub name: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub set: BTreeMap<String, Value>,
}

impl RuleDefinition {
    /// Compiles the definition into a runtime rule, validating the condition.
    pub fn compile(&self) -> Result<Rule, RuleError> {
        let condition = Condition::parse(&self.condition).map_err(|source| {
            RuleError::InvalidCondition {
                rule: self.name.clone(),
                source,
            }
        })?;
        Ok(self.into_rule(condition))
    }

    /// Compiles without validation, keeping the historical behavior where a
    /// malformed leaf silently never matches.
    pub fn compile_lenient(&self) -> Rule {
        self.into_rule(Condition::parse_lenient(&self.condition))
    }

    fn into_rule(&self, condition: Condition) -> Rule {
        let entries = self.set.clone();
        Rule::new(
            self.name.as_str(),
            move |context| Ok(condition.matches(context)),
            move |_context, output| {
                for (key, value) in &entries {
                    output.set(key, value.clone());
                }
                Ok(())
            },
        )
    }
}

/// One named rule-set document from configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleSetDefinition {
    pub name: String,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

impl RuleSetDefinition {
    /// Compiles every rule definition, skipping blank-named ones.
    pub fn compile(&self) -> Result<RuleSet, RuleError> {
        let rules = self
            .named_rules()
            .map(RuleDefinition::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RuleSet::new(self.name.as_str(), rules))
    }

    /// Lenient counterpart of [`RuleSetDefinition::compile`].
    pub fn compile_lenient(&self) -> RuleSet {
        let rules = self
            .named_rules()
            .map(RuleDefinition::compile_lenient)
            .collect();
        RuleSet::new(self.name.as_str(), rules)
    }

    // Definitions with a blank name are filtered out, not treated as errors.
    fn named_rules(&self) -> impl Iterator<Item = &RuleDefinition> {
        self.rules
            .iter()
            .filter(|definition| !definition.name.trim().is_empty())
    }
}
