use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

pub(crate) fn fold_key(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}

/// Bounded set of conversions applied by typed context and output lookups.
///
/// Supported coercions are deliberately small: number ↔ numeric string,
/// boolean ↔ "true"/"false", string passthrough or scalar rendering,
/// RFC 3339 timestamps and string lists. Anything else yields `None`.
pub trait FromContextValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromContextValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }
}

impl FromContextValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromContextValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromContextValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(flag) => Some(*flag),
            Value::String(text) => {
                let text = text.trim();
                if text.eq_ignore_ascii_case("true") {
                    Some(true)
                } else if text.eq_ignore_ascii_case("false") {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl FromContextValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => DateTime::parse_from_rfc3339(text.trim())
                .ok()
                .map(|parsed| parsed.with_timezone(&Utc)),
            _ => None,
        }
    }
}

impl FromContextValue for Vec<String> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => items.iter().map(String::from_value).collect(),
            Value::String(text) => Some(vec![text.clone()]),
            _ => None,
        }
    }
}

/// Read-only named-value view over an event's data.
///
/// Keys are case-insensitive within a single context. Typed lookups never
/// fail: a missing key or an impossible coercion falls back to the supplied
/// default. Contexts are built once per evaluation and discarded afterwards.
#[derive(Debug, Clone, Default)]
pub struct RuleContext {
    values: BTreeMap<String, Value>,
}

impl RuleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> RuleContextBuilder {
        RuleContextBuilder::default()
    }

    /// Builds a context from key/value pairs, folding keys case-insensitively.
    pub fn from_values(values: impl IntoIterator<Item = (String, Value)>) -> Self {
        let values = values
            .into_iter()
            .map(|(key, value)| (fold_key(&key), value))
            .collect();
        Self { values }
    }

    /// Pure existence check, independent of the stored value's type.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(&fold_key(key))
    }

    /// Borrow the raw stored value, if present.
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.values.get(&fold_key(key))
    }

    /// Typed lookup returning `None` when absent or not coercible.
    pub fn get<T: FromContextValue>(&self, key: &str) -> Option<T> {
        self.raw(key).and_then(|value| T::from_value(value))
    }

    /// Typed lookup that falls back to `default` instead of failing.
    pub fn get_or<T: FromContextValue>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct RuleContextBuilder {
    values: BTreeMap<String, Value>,
}

impl RuleContextBuilder {
    pub fn value(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.values.insert(fold_key(key), value.into());
        self
    }

    pub fn build(self) -> RuleContext {
        RuleContext {
            values: self.values,
        }
    }
}
