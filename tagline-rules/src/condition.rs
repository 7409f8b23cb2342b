use thiserror::Error;

use crate::context::{FromContextValue, RuleContext};

/// Problems found while compiling a textual condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("no comparison operator in \"{0}\"")]
    MissingOperator(String),
    #[error("invalid field name in \"{0}\"")]
    InvalidField(String),
}

/// Comparison operators supported by condition leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    GreaterOrEqual,
    LessOrEqual,
    Equal,
    NotEqual,
    Greater,
    Less,
}

// Two-character operators must be matched before one-character ones.
const OPERATORS: [(&str, Comparator); 6] = [
    (">=", Comparator::GreaterOrEqual),
    ("<=", Comparator::LessOrEqual),
    ("==", Comparator::Equal),
    ("!=", Comparator::NotEqual),
    (">", Comparator::Greater),
    ("<", Comparator::Less),
];

impl Comparator {
    fn compare_numbers(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparator::Equal => (lhs - rhs).abs() < f64::EPSILON,
            Comparator::NotEqual => (lhs - rhs).abs() >= f64::EPSILON,
            Comparator::Greater => lhs > rhs,
            Comparator::Less => lhs < rhs,
            Comparator::GreaterOrEqual => lhs >= rhs,
            Comparator::LessOrEqual => lhs <= rhs,
        }
    }

    fn compare_text(self, lhs: &str, rhs: &str) -> bool {
        let lhs = lhs.to_lowercase();
        let rhs = rhs.to_lowercase();
        match self {
            Comparator::Equal => lhs == rhs,
            Comparator::NotEqual => lhs != rhs,
            Comparator::Greater => lhs > rhs,
            Comparator::Less => lhs < rhs,
            Comparator::GreaterOrEqual => lhs >= rhs,
            Comparator::LessOrEqual => lhs <= rhs,
        }
    }
}

/// A single `field <op> value` alternative.
#[derive(Debug, Clone, PartialEq)]
enum Leaf {
    Comparison {
        field: String,
        comparator: Comparator,
        literal: String,
    },
    /// Source text that failed to parse. Kept for diagnostics; never matches.
    Invalid(String),
}

impl Leaf {
    fn matches(&self, context: &RuleContext) -> bool {
        match self {
            Leaf::Invalid(_) => false,
            Leaf::Comparison {
                field,
                comparator,
                literal,
            } => {
                let Some(value) = context.raw(field) else {
                    return false;
                };
                // Only scalar values participate in comparisons.
                let Some(actual) = String::from_value(value) else {
                    return false;
                };

                let lhs: Option<f64> = actual.trim().parse().ok();
                let rhs: Option<f64> = literal.trim().parse().ok();
                match (lhs, rhs) {
                    (Some(lhs), Some(rhs)) => comparator.compare_numbers(lhs, rhs),
                    _ => comparator.compare_text(&actual, literal),
                }
            }
        }
    }
}

/// A boolean condition compiled from text.
///
/// The grammar has no real parenthetical grouping: the expression splits into
/// AND-clauses on `&&`, each clause splits into OR-alternatives on `||`, and
/// the whole condition holds when every AND-clause has at least one matching
/// alternative. An empty condition always matches.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Condition {
    clauses: Vec<Vec<Leaf>>,
}

impl Condition {
    /// The unconditional condition used for rules without a condition string.
    pub fn always() -> Self {
        Self::default()
    }

    /// Strict compilation: every alternative must parse, otherwise the first
    /// offending leaf is reported. Run at provider construction so that a
    /// malformed definition fails startup instead of silently disabling a
    /// rule.
    pub fn parse(text: &str) -> Result<Self, ConditionError> {
        let mut clauses = Vec::new();
        for clause in split_clauses(text) {
            let mut alternatives = Vec::new();
            for alternative in clause {
                alternatives.push(parse_leaf(alternative)?);
            }
            clauses.push(alternatives);
        }
        Ok(Self { clauses })
    }

    /// Compatibility compilation: malformed alternatives become leaves that
    /// never match, mirroring the historical evaluate-to-false policy.
    pub fn parse_lenient(text: &str) -> Self {
        let clauses = split_clauses(text)
            .into_iter()
            .map(|clause| {
                clause
                    .into_iter()
                    .map(|alternative| {
                        parse_leaf(alternative)
                            .unwrap_or_else(|_| Leaf::Invalid(alternative.trim().to_string()))
                    })
                    .collect()
            })
            .collect();
        Self { clauses }
    }

    pub fn is_unconditional(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluates the condition against the context. Never fails: missing
    /// fields, non-scalar values and invalid leaves all evaluate to false.
    pub fn matches(&self, context: &RuleContext) -> bool {
        self.clauses
            .iter()
            .all(|alternatives| alternatives.iter().any(|leaf| leaf.matches(context)))
    }
}

// AND-clauses on `&&`, then OR-alternatives on `||`. A blank expression has
// no clauses at all.
fn split_clauses(text: &str) -> Vec<Vec<&str>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    trimmed
        .split("&&")
        .map(|clause| clause.split("||").collect())
        .collect()
}

fn parse_leaf(text: &str) -> Result<Leaf, ConditionError> {
    for (symbol, comparator) in OPERATORS {
        let Some(index) = text.find(symbol) else {
            continue;
        };

        let field = text[..index].trim();
        if field.is_empty()
            || !field
                .chars()
                .all(|c| c.is_alphanumeric() || c == '.' || c == '_')
        {
            return Err(ConditionError::InvalidField(text.trim().to_string()));
        }

        let literal = strip_quotes(text[index + symbol.len()..].trim());
        return Ok(Leaf::Comparison {
            field: field.to_string(),
            comparator,
            literal: literal.to_string(),
        });
    }

    Err(ConditionError::MissingOperator(text.trim().to_string()))
}

/// Removes one surrounding pair of matching quote characters, if present.
fn strip_quotes(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &text[1..text.len() - 1];
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> RuleContext {
        RuleContext::builder()
            .value("amount", "150")
            .value("category", "Invoice")
            .value("a", 1)
            .value("b", 3)
            .build()
    }

    #[test]
    fn empty_condition_always_matches() {
        assert!(Condition::parse("").expect("parse").matches(&context()));
        assert!(Condition::parse("   ").expect("parse").matches(&context()));
        assert!(Condition::always().is_unconditional());
    }

    #[test]
    fn numeric_comparisons() {
        let ctx = context();
        assert!(Condition::parse("amount >= 100").expect("parse").matches(&ctx));
        assert!(!Condition::parse("amount > 150").expect("parse").matches(&ctx));
        assert!(!Condition::parse("amount != 150").expect("parse").matches(&ctx));
        assert!(Condition::parse("amount <= 150").expect("parse").matches(&ctx));
    }

    #[test]
    fn string_fallback_is_case_insensitive() {
        let ctx = context();
        assert!(Condition::parse("category == \"invoice\"")
            .expect("parse")
            .matches(&ctx));
        assert!(!Condition::parse("category != \"invoice\"")
            .expect("parse")
            .matches(&ctx));
        assert!(Condition::parse("category == 'INVOICE'")
            .expect("parse")
            .matches(&ctx));
    }

    #[test]
    fn and_of_or_composition() {
        let condition = Condition::parse("a==1 && b==2||b==3").expect("parse");
        assert!(condition.matches(&context()));

        let other = RuleContext::builder().value("a", 2).value("b", 3).build();
        assert!(!condition.matches(&other));
    }

    #[test]
    fn missing_field_evaluates_false() {
        let condition = Condition::parse("nonexistent == 1").expect("parse");
        assert!(!condition.matches(&context()));
    }

    #[test]
    fn strict_parse_rejects_malformed_leaves() {
        assert!(matches!(
            Condition::parse("amount ~ 100"),
            Err(ConditionError::MissingOperator(_))
        ));
        assert!(matches!(
            Condition::parse("bad field == 1"),
            Err(ConditionError::InvalidField(_))
        ));
        assert!(matches!(
            Condition::parse("a==1 && "),
            Err(ConditionError::MissingOperator(_))
        ));
    }

    #[test]
    fn lenient_parse_turns_malformed_leaves_into_false() {
        let ctx = context();
        let condition = Condition::parse_lenient("amount ~ 100");
        assert!(!condition.matches(&ctx));

        // A malformed OR-alternative does not poison the valid one.
        let mixed = Condition::parse_lenient("amount ~ 100 || amount >= 100");
        assert!(mixed.matches(&ctx));
    }

    #[test]
    fn two_character_operators_win_over_one_character() {
        let ctx = RuleContext::builder().value("n", 5).build();
        assert!(Condition::parse("n >= 5").expect("parse").matches(&ctx));
        assert!(Condition::parse("n <= 5").expect("parse").matches(&ctx));
    }

    #[test]
    fn ordering_falls_back_to_lexicographic_for_text() {
        let ctx = RuleContext::builder().value("name", "beta").build();
        assert!(Condition::parse("name > alpha").expect("parse").matches(&ctx));
        assert!(!Condition::parse("name < alpha").expect("parse").matches(&ctx));
    }

    #[test]
    fn dotted_and_underscored_fields_parse() {
        let ctx = RuleContext::builder()
            .value("doc.kind", "invoice")
            .value("page_count", 3)
            .build();
        assert!(Condition::parse("doc.kind == invoice")
            .expect("parse")
            .matches(&ctx));
        assert!(Condition::parse("page_count < 10").expect("parse").matches(&ctx));
    }
}
