use std::fmt;

use crate::context::RuleContext;
use crate::error::RuleError;
use crate::output::RuleOutput;

pub type PredicateFn = dyn Fn(&RuleContext) -> Result<bool, RuleError> + Send + Sync;
pub type ActionFn = dyn Fn(&RuleContext, &mut RuleOutput) -> Result<(), RuleError> + Send + Sync;

/// A named predicate + action pair evaluated against a context.
///
/// Predicates must be pure; actions may only write to the output. The name is
/// non-empty and shows up in audit reporting, so keep it meaningful.
pub struct Rule {
    name: String,
    predicate: Box<PredicateFn>,
    action: Box<ActionFn>,
}

impl Rule {
    pub fn new<P, A>(name: impl Into<String>, predicate: P, action: A) -> Self
    where
        P: Fn(&RuleContext) -> Result<bool, RuleError> + Send + Sync + 'static,
        A: Fn(&RuleContext, &mut RuleOutput) -> Result<(), RuleError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
            action: Box::new(action),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, context: &RuleContext) -> Result<bool, RuleError> {
        (self.predicate)(context)
    }

    pub fn apply(&self, context: &RuleContext, output: &mut RuleOutput) -> Result<(), RuleError> {
        (self.action)(context, output)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// An ordered, named collection of rules evaluated together.
#[derive(Debug)]
pub struct RuleSet {
    name: String,
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(name: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }

    pub fn builder(name: impl Into<String>) -> RuleSetBuilder {
        RuleSetBuilder {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Accumulates `{name, predicate, action}` triples and materializes one named
/// rule set. This is the authoring surface for code-defined rules.
pub struct RuleSetBuilder {
    name: String,
    rules: Vec<Rule>,
}

impl RuleSetBuilder {
    pub fn rule<P, A>(mut self, name: impl Into<String>, predicate: P, action: A) -> Self
    where
        P: Fn(&RuleContext) -> Result<bool, RuleError> + Send + Sync + 'static,
        A: Fn(&RuleContext, &mut RuleOutput) -> Result<(), RuleError> + Send + Sync + 'static,
    {
        self.rules.push(Rule::new(name, predicate, action));
        self
    }

    pub fn build(self) -> RuleSet {
        RuleSet::new(self.name, self.rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_preserves_rule_order() {
        let set = RuleSet::builder("ordered")
            .rule("first", |_| Ok(true), |_, _| Ok(()))
            .rule("second", |_| Ok(false), |_, _| Ok(()))
            .build();

        let names: Vec<&str> = set.rules().iter().map(Rule::name).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn actions_write_into_the_output() {
        let rule = Rule::new(
            "emit",
            |_| Ok(true),
            |_, output| {
                output.set("flag", true);
                Ok(())
            },
        );

        let context = RuleContext::new();
        let mut output = RuleOutput::new();
        assert!(rule.matches(&context).expect("predicate"));
        rule.apply(&context, &mut output).expect("action");
        assert_eq!(output.try_get("flag"), Some(true));
    }
}
