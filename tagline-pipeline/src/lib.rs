//! Event-triggered auto-tagging pipeline for the Tagline platform.
//!
//! Lifecycle events (document uploaded, OCR completed) are flattened into a
//! rule-evaluation context, matched against configured rule sets and turned
//! into idempotent tag assignments through the document service. The worker
//! runtime drains an in-process queue with a pool of consumer loops;
//! delivery retry stays with the external message transport.

pub mod assignment;
pub mod builtin;
pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod queue;
pub mod runtime;
pub mod selector;

pub use assignment::{
    AssignmentError, AssignmentRecord, AssignmentStatus, InMemoryTagAssignments,
    TagAssignmentService,
};
pub use builtin::{anniversary_rules, document_type_rules, AUTO_DATE_TAG};
pub use config::PipelineConfig;
pub use context::build_context;
pub use error::PipelineError;
pub use pipeline::{TaggingOutcome, TaggingPipeline, TAG_IDS_KEY};
pub use queue::EventQueue;
pub use runtime::{EventHandler, RuntimeHandle, Shutdown, TaggingRuntime};
pub use selector::RuleSetSelector;
