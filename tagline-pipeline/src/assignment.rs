use std::collections::BTreeSet;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use uuid::Uuid;

/// Result of an idempotent tag assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentStatus {
    Assigned,
    /// The association already existed; converging on it is not an error.
    AlreadyAssigned,
}

/// Failures reported by the assignment backend.
#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("unknown tag: {0}")]
    UnknownTag(String),
    #[error("unknown document: {0}")]
    UnknownDocument(Uuid),
    #[error("assignment backend unavailable: {0}")]
    Unavailable(String),
}

/// Narrow interface to the document service that persists tag↔document
/// associations and raises the matching domain events.
///
/// Implementations must be idempotent: re-assigning an existing tag reports
/// [`AssignmentStatus::AlreadyAssigned`] instead of failing.
#[async_trait]
pub trait TagAssignmentService: Send + Sync {
    async fn assign(
        &self,
        document_id: Uuid,
        tag_id: &str,
        applied_by: Option<&str>,
    ) -> Result<AssignmentStatus, AssignmentError>;
}

/// One observed assignment call, kept for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRecord {
    pub document_id: Uuid,
    pub tag_id: String,
    pub applied_by: Option<String>,
    pub status: AssignmentStatus,
}

/// In-memory assignment store.
///
/// Backs tests and local runs; deployments wire in the document service
/// client instead.
#[derive(Debug, Default)]
pub struct InMemoryTagAssignments {
    assignments: Mutex<BTreeSet<(Uuid, String)>>,
    log: Mutex<Vec<AssignmentRecord>>,
}

impl InMemoryTagAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored associations for the document/tag pair (0 or 1).
    pub fn count(&self, document_id: Uuid, tag_id: &str) -> usize {
        let assignments = self.assignments.lock();
        usize::from(assignments.contains(&(document_id, tag_id.to_string())))
    }

    /// Every assignment call observed, in order.
    pub fn log(&self) -> Vec<AssignmentRecord> {
        self.log.lock().clone()
    }
}

#[async_trait]
impl TagAssignmentService for InMemoryTagAssignments {
    async fn assign(
        &self,
        document_id: Uuid,
        tag_id: &str,
        applied_by: Option<&str>,
    ) -> Result<AssignmentStatus, AssignmentError> {
        let inserted = self
            .assignments
            .lock()
            .insert((document_id, tag_id.to_string()));
        let status = if inserted {
            AssignmentStatus::Assigned
        } else {
            AssignmentStatus::AlreadyAssigned
        };

        self.log.lock().push(AssignmentRecord {
            document_id,
            tag_id: tag_id.to_string(),
            applied_by: applied_by.map(str::to_string),
            status,
        });

        Ok(status)
    }
}
