use std::collections::BTreeMap;

/// Maps an event's logical name to the rule sets configured to run for it.
///
/// Matching is case-insensitive on the event name. An unmapped event selects
/// nothing, which makes the pipeline inert for it by design.
#[derive(Debug, Clone, Default)]
pub struct RuleSetSelector {
    triggers: BTreeMap<String, Vec<String>>,
}

impl RuleSetSelector {
    pub fn new(triggers: BTreeMap<String, Vec<String>>) -> Self {
        let triggers = triggers
            .into_iter()
            .map(|(event, sets)| (event.trim().to_ascii_lowercase(), sets))
            .collect();
        Self { triggers }
    }

    pub fn select(&self, event_name: &str) -> &[String] {
        self.triggers
            .get(&event_name.trim().to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}
