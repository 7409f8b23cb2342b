use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tagline_protocol::event::DocumentEvent;

/// Shared in-process queue feeding the consumer loops.
///
/// One logical consumer group: any worker may take any event. Offset and
/// commit bookkeeping belong to the external transport, not here.
#[derive(Debug, Default, Clone)]
pub struct EventQueue {
    inner: Arc<Mutex<VecDeque<DocumentEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: DocumentEvent) {
        self.inner.lock().push_back(event);
    }

    pub fn pop(&self) -> Option<DocumentEvent> {
        self.inner.lock().pop_front()
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().len()
    }
}
