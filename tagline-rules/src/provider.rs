use crate::definition::RuleSetDefinition;
use crate::error::RuleError;
use crate::rule::RuleSet;

/// A source of rule sets registered with the engine.
///
/// Multiple providers can coexist, e.g. declarative sets loaded from
/// configuration next to code-defined sets. The engine aggregates across all
/// registered providers in registration order.
pub trait RuleProvider: Send + Sync {
    /// Identifier used in logs and ambiguity errors.
    fn source(&self) -> &str;

    fn rule_sets(&self) -> &[RuleSet];
}

/// Provider over pre-built, code-constructed rule sets.
///
/// Used for built-in rules that are easier to express as direct predicates
/// and actions than as text.
pub struct LambdaRuleProvider {
    source: String,
    sets: Vec<RuleSet>,
}

impl LambdaRuleProvider {
    pub fn new(source: impl Into<String>, sets: Vec<RuleSet>) -> Self {
        Self {
            source: source.into(),
            sets,
        }
    }

    pub fn single(source: impl Into<String>, set: RuleSet) -> Self {
        Self::new(source, vec![set])
    }
}

impl RuleProvider for LambdaRuleProvider {
    fn source(&self) -> &str {
        &self.source
    }

    fn rule_sets(&self) -> &[RuleSet] {
        &self.sets
    }
}

/// Provider that compiles declarative definitions at construction time.
pub struct DeclarativeRuleProvider {
    source: String,
    sets: Vec<RuleSet>,
}

impl DeclarativeRuleProvider {
    /// Compiles the definitions, failing fast on any unparseable condition.
    pub fn new(
        source: impl Into<String>,
        definitions: &[RuleSetDefinition],
    ) -> Result<Self, RuleError> {
        let sets = definitions
            .iter()
            .map(RuleSetDefinition::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            source: source.into(),
            sets,
        })
    }

    /// Compatibility constructor that never fails: malformed condition leaves
    /// compile to never-matching rules instead of errors.
    pub fn permissive(source: impl Into<String>, definitions: &[RuleSetDefinition]) -> Self {
        let sets = definitions
            .iter()
            .map(RuleSetDefinition::compile_lenient)
            .collect();
        Self {
            source: source.into(),
            sets,
        }
    }
}

impl RuleProvider for DeclarativeRuleProvider {
    fn source(&self) -> &str {
        &self.source
    }

    fn rule_sets(&self) -> &[RuleSet] {
        &self.sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::RuleDefinition;
    use std::collections::BTreeMap;

    fn definitions(condition: &str) -> Vec<RuleSetDefinition> {
        vec![RuleSetDefinition {
            name: "demo".to_string(),
            rules: vec![RuleDefinition {
                name: "rule-1".to_string(),
                condition: condition.to_string(),
                set: BTreeMap::new(),
            }],
        }]
    }

    #[test]
    fn strict_construction_rejects_bad_conditions() {
        let err = DeclarativeRuleProvider::new("config", &definitions("amount >>= 1"))
            .map(|_| ())
            .expect_err("should fail");
        assert!(matches!(err, RuleError::InvalidCondition { .. }));
    }

    #[test]
    fn permissive_construction_keeps_the_rule_dead() {
        let provider = DeclarativeRuleProvider::permissive("legacy", &definitions("amount >>= 1"));
        assert_eq!(provider.rule_sets().len(), 1);

        let context = crate::RuleContext::builder().value("amount", 5).build();
        let rule = &provider.rule_sets()[0].rules()[0];
        assert!(!rule.matches(&context).expect("predicate"));
    }
}
