use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::context::RuleContext;
use crate::error::RuleError;
use crate::output::RuleOutput;
use crate::provider::RuleProvider;
use crate::rule::RuleSet;

/// Policy for resolving a rule-set name across registered providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameResolution {
    /// The first provider registered that exposes the name wins.
    #[default]
    FirstRegistered,
    /// Two providers exposing the same name is a configuration error.
    ErrorOnAmbiguity,
}

/// Result of executing one named rule set against a context.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RuleExecutionResult {
    pub rule_set: String,
    /// Names of the rules whose predicate matched, in evaluation order.
    pub executed_rules: Vec<String>,
    pub output: BTreeMap<String, Value>,
}

/// Aggregates rule providers and evaluates named rule sets.
///
/// The provider list is built once at startup and never mutated afterwards,
/// so a shared engine is safe to call from concurrent handler invocations:
/// every call constructs its own output and the context is caller-owned.
pub struct RuleEngine {
    providers: Vec<Box<dyn RuleProvider>>,
    resolution: NameResolution,
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.source()).collect::<Vec<_>>(),
            )
            .field("resolution", &self.resolution)
            .finish()
    }
}

impl RuleEngine {
    pub fn new(providers: Vec<Box<dyn RuleProvider>>) -> Self {
        Self::with_resolution(providers, NameResolution::default())
    }

    pub fn with_resolution(
        providers: Vec<Box<dyn RuleProvider>>,
        resolution: NameResolution,
    ) -> Self {
        Self {
            providers,
            resolution,
        }
    }

    /// Registers another provider. Registration order decides resolution
    /// under [`NameResolution::FirstRegistered`].
    pub fn register(&mut self, provider: Box<dyn RuleProvider>) {
        self.providers.push(provider);
    }

    /// Names of every rule set exposed by the registered providers.
    pub fn rule_set_names(&self) -> Vec<String> {
        self.providers
            .iter()
            .flat_map(|provider| provider.rule_sets())
            .map(|set| set.name().to_string())
            .collect()
    }

    fn resolve(&self, name: &str) -> Result<&RuleSet, RuleError> {
        let mut found: Option<(&str, &RuleSet)> = None;
        for provider in &self.providers {
            for set in provider.rule_sets() {
                if set.name() != name {
                    continue;
                }

                if self.resolution == NameResolution::FirstRegistered {
                    return Ok(set);
                }

                if let Some((first, _)) = found {
                    return Err(RuleError::AmbiguousSet {
                        name: name.to_string(),
                        first: first.to_string(),
                        second: provider.source().to_string(),
                    });
                }

                found = Some((provider.source(), set));
            }
        }

        found
            .map(|(_, set)| set)
            .ok_or_else(|| RuleError::SetNotFound(name.to_string()))
    }

    /// Evaluates every rule of the named set, in order, against the context.
    ///
    /// All rules are independently evaluated; a non-matching rule does not
    /// short-circuit the rest. A failing predicate or action aborts the whole
    /// call with no partial output.
    pub fn execute(
        &self,
        rule_set: &str,
        context: &RuleContext,
    ) -> Result<RuleExecutionResult, RuleError> {
        let set = self.resolve(rule_set)?;
        let mut output = RuleOutput::new();
        let mut executed_rules = Vec::new();

        for rule in set.rules() {
            if rule.matches(context)? {
                debug!(rule_set = %set.name(), rule = %rule.name(), "rule matched");
                executed_rules.push(rule.name().to_string());
                rule.apply(context, &mut output)?;
            }
        }

        Ok(RuleExecutionResult {
            rule_set: set.name().to_string(),
            executed_rules,
            output: output.snapshot(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::LambdaRuleProvider;
    use crate::rule::RuleSet;

    fn flag_set(set_name: &str, rule_name: &str) -> RuleSet {
        let marker = rule_name.to_string();
        RuleSet::builder(set_name)
            .rule(
                rule_name,
                |_| Ok(true),
                move |_, output| {
                    output.set("origin", marker.clone());
                    Ok(())
                },
            )
            .build()
    }

    #[test]
    fn all_rules_are_evaluated_in_order() {
        let set = RuleSet::builder("three")
            .rule(
                "first",
                |_| Ok(true),
                |_, output| {
                    output.set("first", true);
                    Ok(())
                },
            )
            .rule(
                "second",
                |_| Ok(false),
                |_, output| {
                    output.set("second", true);
                    Ok(())
                },
            )
            .rule(
                "third",
                |_| Ok(true),
                |_, output| {
                    output.set("third", true);
                    Ok(())
                },
            )
            .build();

        let engine = RuleEngine::new(vec![Box::new(LambdaRuleProvider::single("test", set))]);
        let result = engine
            .execute("three", &RuleContext::new())
            .expect("execute");

        assert_eq!(result.executed_rules, vec!["first", "third"]);
        assert!(!result.output.contains_key("second"));
    }

    #[test]
    fn later_rules_see_earlier_writes() {
        let set = RuleSet::builder("accumulate")
            .rule(
                "seed",
                |_| Ok(true),
                |_, output| {
                    output.set("tagIds", vec!["T-A".to_string()]);
                    Ok(())
                },
            )
            .rule(
                "augment",
                |_| Ok(true),
                |_, output| {
                    let mut tags: Vec<String> = output.try_get("tagIds").unwrap_or_default();
                    tags.push("T-B".to_string());
                    output.set("tagIds", tags);
                    Ok(())
                },
            )
            .build();

        let engine = RuleEngine::new(vec![Box::new(LambdaRuleProvider::single("test", set))]);
        let result = engine
            .execute("accumulate", &RuleContext::new())
            .expect("execute");

        assert_eq!(
            result.output.get("tagids"),
            Some(&serde_json::json!(["T-A", "T-B"]))
        );
    }

    #[test]
    fn unknown_rule_set_is_a_reported_failure() {
        let engine = RuleEngine::new(Vec::new());
        let err = engine
            .execute("ghost", &RuleContext::new())
            .expect_err("should fail");
        assert!(matches!(err, RuleError::SetNotFound(name) if name == "ghost"));
    }

    #[test]
    fn first_registered_provider_wins() {
        let engine = RuleEngine::new(vec![
            Box::new(LambdaRuleProvider::single("alpha", flag_set("shared", "from-alpha"))),
            Box::new(LambdaRuleProvider::single("beta", flag_set("shared", "from-beta"))),
        ]);

        let result = engine
            .execute("shared", &RuleContext::new())
            .expect("execute");
        assert_eq!(result.executed_rules, vec!["from-alpha"]);
    }

    #[test]
    fn ambiguity_policy_reports_both_sources() {
        let engine = RuleEngine::with_resolution(
            vec![
                Box::new(LambdaRuleProvider::single("alpha", flag_set("shared", "a"))),
                Box::new(LambdaRuleProvider::single("beta", flag_set("shared", "b"))),
            ],
            NameResolution::ErrorOnAmbiguity,
        );

        let err = engine
            .execute("shared", &RuleContext::new())
            .expect_err("should fail");
        match err {
            RuleError::AmbiguousSet { first, second, .. } => {
                assert_eq!(first, "alpha");
                assert_eq!(second, "beta");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn failing_rule_aborts_the_whole_execution() {
        let set = RuleSet::builder("fragile")
            .rule(
                "writes",
                |_| Ok(true),
                |_, output| {
                    output.set("written", true);
                    Ok(())
                },
            )
            .rule(
                "explodes",
                |_| Err(RuleError::rule_failed("explodes", "lookup backend down")),
                |_, _| Ok(()),
            )
            .build();

        let engine = RuleEngine::new(vec![Box::new(LambdaRuleProvider::single("test", set))]);
        let err = engine
            .execute("fragile", &RuleContext::new())
            .expect_err("should fail");
        assert!(matches!(err, RuleError::RuleFailed { .. }));
    }
}
