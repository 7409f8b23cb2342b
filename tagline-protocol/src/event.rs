use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload shared by every document lifecycle event the pipeline consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentEventPayload {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub document_id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl DocumentEventPayload {
    pub fn builder(document_id: Uuid, title: impl Into<String>) -> DocumentEventBuilder {
        DocumentEventBuilder::new(document_id, title)
    }
}

/// Lifecycle events that can trigger automatic tagging.
///
/// The set of kinds is closed: adding one is a compile-time change here plus
/// the context mapping in the pipeline crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentEvent {
    Uploaded(DocumentEventPayload),
    OcrCompleted(DocumentEventPayload),
}

impl DocumentEvent {
    /// Logical event name used by trigger configuration and audit logs.
    pub fn event_name(&self) -> &'static str {
        match self {
            DocumentEvent::Uploaded(_) => "DocumentUploaded",
            DocumentEvent::OcrCompleted(_) => "OcrCompleted",
        }
    }

    /// Transport topic the event kind is delivered on.
    pub fn topic(&self) -> &'static str {
        match self {
            DocumentEvent::Uploaded(_) => "documents.uploaded",
            DocumentEvent::OcrCompleted(_) => "documents.ocr-completed",
        }
    }

    pub fn payload(&self) -> &DocumentEventPayload {
        match self {
            DocumentEvent::Uploaded(payload) => payload,
            DocumentEvent::OcrCompleted(payload) => payload,
        }
    }

    pub fn document_id(&self) -> Uuid {
        self.payload().document_id
    }
}

/// Builder helper to create event payloads with many optional fields.
pub struct DocumentEventBuilder {
    payload: DocumentEventPayload,
}

impl DocumentEventBuilder {
    pub fn new(document_id: Uuid, title: impl Into<String>) -> Self {
        let payload = DocumentEventPayload {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            document_id,
            title: title.into(),
            summary: None,
            content: None,
            metadata: BTreeMap::new(),
            tags: Vec::new(),
        };

        Self { payload }
    }

    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.payload.occurred_at = occurred_at;
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.payload.summary = Some(summary.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.payload.content = Some(content.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.metadata.insert(key.into(), value.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.payload.tags.push(tag.into());
        self
    }

    pub fn uploaded(self) -> DocumentEvent {
        DocumentEvent::Uploaded(self.payload)
    }

    pub fn ocr_completed(self) -> DocumentEvent {
        DocumentEvent::OcrCompleted(self.payload)
    }

    pub fn build(self) -> DocumentEventPayload {
        self.payload
    }
}
