use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use tagline_protocol::event::DocumentEvent;
use tagline_rules::{RuleEngine, RuleExecutionResult};

use crate::assignment::{AssignmentStatus, TagAssignmentService};
use crate::context::build_context;
use crate::error::PipelineError;
use crate::runtime::{EventHandler, Shutdown};
use crate::selector::RuleSetSelector;

/// Output key rule authors use to emit tag identifiers.
pub const TAG_IDS_KEY: &str = "tagIds";

/// Aggregated result of processing one lifecycle event.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TaggingOutcome {
    pub event_name: String,
    pub document_id: Uuid,
    /// Rule sets that were executed for the event, in trigger order.
    pub rule_sets: Vec<String>,
    /// Union of matched rule names across all executed sets.
    pub executed_rules: Vec<String>,
    pub assigned: Vec<String>,
    pub already_assigned: Vec<String>,
}

impl TaggingOutcome {
    pub fn skipped(event_name: impl Into<String>, document_id: Uuid) -> Self {
        Self {
            event_name: event_name.into(),
            document_id,
            rule_sets: Vec::new(),
            executed_rules: Vec::new(),
            assigned: Vec::new(),
            already_assigned: Vec::new(),
        }
    }

    /// Whether the event had no rule sets configured at all.
    pub fn is_noop(&self) -> bool {
        self.rule_sets.is_empty()
    }
}

/// Orchestrates the auto-tagging flow for one inbound event:
/// build context → select rule sets → evaluate each → derive tag ids →
/// assign tags through the document service.
///
/// The pipeline holds no per-event state; a shared instance serves
/// concurrent handler invocations.
pub struct TaggingPipeline {
    engine: RuleEngine,
    selector: RuleSetSelector,
    assignments: Arc<dyn TagAssignmentService>,
    /// Actor recorded on automated assignments; `None` means fully automated.
    applied_by: Option<String>,
}

impl TaggingPipeline {
    pub fn new(
        engine: RuleEngine,
        selector: RuleSetSelector,
        assignments: Arc<dyn TagAssignmentService>,
        applied_by: Option<String>,
    ) -> Self {
        Self {
            engine,
            selector,
            assignments,
            applied_by,
        }
    }

    pub async fn process(
        &self,
        event: &DocumentEvent,
        shutdown: &Shutdown,
    ) -> Result<TaggingOutcome, PipelineError> {
        let event_name = event.event_name();
        let document_id = event.document_id();

        let selected = self.selector.select(event_name);
        if selected.is_empty() {
            debug!(event = event_name, "no rule sets configured for event");
            return Ok(TaggingOutcome::skipped(event_name, document_id));
        }

        let context = build_context(event);
        let mut outcome = TaggingOutcome::skipped(event_name, document_id);
        let mut tag_ids: Vec<String> = Vec::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();

        for set_name in selected {
            let result = self.engine.execute(set_name, &context)?;
            debug!(
                event = event_name,
                rule_set = %result.rule_set,
                matched = result.executed_rules.len(),
                "rule set evaluated"
            );

            for tag_id in derive_tag_ids(&result) {
                if seen.insert(tag_id.clone()) {
                    tag_ids.push(tag_id);
                }
            }

            outcome.rule_sets.push(result.rule_set);
            outcome.executed_rules.extend(result.executed_rules);
        }

        info!(
            event = event_name,
            document = %document_id,
            tags = tag_ids.len(),
            "derived tag assignments"
        );

        for tag_id in tag_ids {
            if shutdown.is_requested() {
                return Err(PipelineError::Cancelled);
            }

            let assign = self
                .assignments
                .assign(document_id, &tag_id, self.applied_by.as_deref());
            let status = tokio::select! {
                result = assign => result.map_err(|source| PipelineError::Assignment {
                    document_id,
                    source,
                })?,
                _ = shutdown.notified() => return Err(PipelineError::Cancelled),
            };

            match status {
                AssignmentStatus::Assigned => outcome.assigned.push(tag_id),
                AssignmentStatus::AlreadyAssigned => outcome.already_assigned.push(tag_id),
            }
        }

        Ok(outcome)
    }
}

#[async_trait]
impl EventHandler for TaggingPipeline {
    async fn handle(
        &self,
        event: DocumentEvent,
        shutdown: &Shutdown,
    ) -> Result<TaggingOutcome, PipelineError> {
        self.process(&event, shutdown).await
    }
}

/// Extracts tag identifiers from an execution result's output.
///
/// The well-known key is matched case-insensitively; the value may be a
/// single identifier or a list. Anything else is ignored — the pipeline is
/// additive-only and never fails on junk output.
fn derive_tag_ids(result: &RuleExecutionResult) -> Vec<String> {
    let mut ids = Vec::new();
    for (key, value) in &result.output {
        if !key.eq_ignore_ascii_case(TAG_IDS_KEY) {
            continue;
        }
        match value {
            Value::String(id) if !id.trim().is_empty() => ids.push(id.trim().to_string()),
            Value::Array(items) => {
                for item in items {
                    if let Value::String(id) = item {
                        if !id.trim().is_empty() {
                            ids.push(id.trim().to_string());
                        }
                    }
                }
            }
            _ => {}
        }
    }
    ids
}
