use thiserror::Error;
use uuid::Uuid;

use crate::assignment::AssignmentError;
use tagline_rules::RuleError;

/// Errors surfaced while processing a lifecycle event.
///
/// Any of these makes the event eligible for transport-level redelivery;
/// assignment idempotency keeps a second full attempt safe.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("rule evaluation failed: {0}")]
    Rules(#[from] RuleError),
    #[error("tag assignment failed for document {document_id}")]
    Assignment {
        document_id: Uuid,
        #[source]
        source: AssignmentError,
    },
    #[error("processing cancelled before completion")]
    Cancelled,
    #[error("runtime is shutting down")]
    ShuttingDown,
    #[error("pipeline configuration error: {0}")]
    Config(String),
}

impl From<PipelineError> for tagline_core::TaglineError {
    fn from(err: PipelineError) -> Self {
        tagline_core::TaglineError::EventProcessingError(err.to_string())
    }
}
