use std::collections::BTreeMap;

use serde_json::Value;

use crate::context::{fold_key, FromContextValue};

/// Mutable named-value sink that rule actions write into.
///
/// One output is created per rule-set execution and shared by every rule in
/// that execution, so a later rule can read and augment what an earlier rule
/// wrote. The last writer for a given key wins. Keys fold case-insensitively,
/// matching [`crate::RuleContext`] lookups.
#[derive(Debug, Clone, Default)]
pub struct RuleOutput {
    values: BTreeMap<String, Value>,
}

impl RuleOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value under the key, overwriting any previous entry.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(fold_key(key), value.into());
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(&fold_key(key))
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.values.get(&fold_key(key))
    }

    /// Typed lookup applying the same coercions as context lookups.
    pub fn try_get<T: FromContextValue>(&self, key: &str) -> Option<T> {
        self.raw(key).and_then(|value| T::from_value(value))
    }

    /// Clones the accumulated entries for the execution result.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.values.clone()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
