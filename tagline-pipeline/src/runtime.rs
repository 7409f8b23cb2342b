use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use tagline_protocol::event::DocumentEvent;

use crate::error::PipelineError;
use crate::pipeline::TaggingOutcome;
use crate::queue::EventQueue;

/// Cooperative shutdown signal shared by the runtime and in-flight handlers.
///
/// Handlers observe it at their awaited I/O points; completed work is never
/// rolled back (at-least-once semantics).
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    inner: Arc<ShutdownInner>,
}

#[derive(Debug, Default)]
struct ShutdownInner {
    requested: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.inner.requested.store(true, Ordering::Relaxed);
        self.inner.notify.notify_waiters();
    }

    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::Relaxed)
    }

    /// Resolves once shutdown has been requested.
    pub async fn notified(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_requested() {
                return;
            }
            notified.await;
        }
    }
}

/// Processes one inbound event; implemented by the tagging pipeline.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    async fn handle(
        &self,
        event: DocumentEvent,
        shutdown: &Shutdown,
    ) -> Result<TaggingOutcome, PipelineError>;
}

/// Handle used to submit events while the runtime is running.
#[derive(Clone)]
pub struct RuntimeHandle {
    queue: EventQueue,
    notify: Arc<Notify>,
    shutdown: Shutdown,
}

impl RuntimeHandle {
    pub fn submit(&self, event: DocumentEvent) -> Result<(), PipelineError> {
        if self.shutdown.is_requested() {
            return Err(PipelineError::ShuttingDown);
        }

        self.queue.push(event);
        self.notify.notify_one();
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.queue.pending()
    }
}

/// Pool of consumer loops draining the event queue.
///
/// Each event is handled by a single worker; the rule engine underneath is
/// stateless, so handler invocations may run in parallel freely. A failed
/// event is logged and dropped here — redelivery is the transport's job.
pub struct TaggingRuntime {
    queue: EventQueue,
    notify: Arc<Notify>,
    shutdown: Shutdown,
    workers: Vec<JoinHandle<()>>,
}

impl TaggingRuntime {
    pub fn new() -> Self {
        Self {
            queue: EventQueue::new(),
            notify: Arc::new(Notify::new()),
            shutdown: Shutdown::new(),
            workers: Vec::new(),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            queue: self.queue.clone(),
            notify: self.notify.clone(),
            shutdown: self.shutdown.clone(),
        }
    }

    pub fn start<H>(&mut self, handler: Arc<H>, worker_count: usize)
    where
        H: EventHandler,
    {
        let worker_count = worker_count.max(1);
        for worker_index in 0..worker_count {
            let queue = self.queue.clone();
            let notify = self.notify.clone();
            let shutdown = self.shutdown.clone();
            let handler = handler.clone();

            let handle = tokio::spawn(async move {
                worker_loop(worker_index, queue, notify, shutdown, handler).await;
            });

            self.workers.push(handle);
        }
    }

    pub async fn shutdown(self) {
        self.shutdown.request();
        self.notify.notify_waiters();
        for handle in self.workers {
            if let Err(err) = handle.await {
                error!("worker crashed: {:?}", err);
            }
        }
    }
}

impl Default for TaggingRuntime {
    fn default() -> Self {
        Self::new()
    }
}

async fn worker_loop<H>(
    worker_index: usize,
    queue: EventQueue,
    notify: Arc<Notify>,
    shutdown: Shutdown,
    handler: Arc<H>,
) where
    H: EventHandler,
{
    loop {
        if shutdown.is_requested() {
            break;
        }

        let event = loop {
            if let Some(event) = queue.pop() {
                break event;
            }

            if shutdown.is_requested() {
                return;
            }

            notify.notified().await;
        };

        let event_name = event.event_name();
        let document_id = event.document_id();
        info!(worker = worker_index, event = event_name, document = %document_id, "processing event");

        match handler.handle(event, &shutdown).await {
            Ok(outcome) if outcome.is_noop() => {
                debug!(worker = worker_index, event = event_name, "no rule sets configured");
            }
            Ok(outcome) => {
                info!(
                    worker = worker_index,
                    event = event_name,
                    document = %document_id,
                    assigned = outcome.assigned.len(),
                    already_assigned = outcome.already_assigned.len(),
                    "event processed"
                );
            }
            Err(err) => {
                error!(worker = worker_index, event = event_name, document = %document_id, error = %err, "event processing failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use tagline_protocol::event::DocumentEventPayload;
    use uuid::Uuid;

    struct RecordingHandler {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EventHandler for RecordingHandler {
        async fn handle(
            &self,
            event: DocumentEvent,
            _shutdown: &Shutdown,
        ) -> Result<TaggingOutcome, PipelineError> {
            self.seen.lock().push(event.payload().title.clone());
            Ok(TaggingOutcome::skipped(event.event_name(), event.document_id()))
        }
    }

    #[tokio::test]
    async fn drains_submitted_events_until_shutdown() {
        let handler = Arc::new(RecordingHandler {
            seen: Mutex::new(Vec::new()),
        });
        let mut runtime = TaggingRuntime::new();
        runtime.start(handler.clone(), 2);
        let handle = runtime.handle();

        for title in ["a", "b", "c"] {
            let event = DocumentEventPayload::builder(Uuid::new_v4(), title).uploaded();
            handle.submit(event).expect("submit");
        }

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(handle.pending(), 0);
        assert_eq!(handler.seen.lock().len(), 3);

        runtime.shutdown().await;

        // The surviving handle observes shutdown and refuses new work.
        let event = DocumentEventPayload::builder(Uuid::new_v4(), "late").uploaded();
        assert!(matches!(
            handle.submit(event),
            Err(PipelineError::ShuttingDown)
        ));
    }

    #[tokio::test]
    async fn shutdown_signal_resolves_notified_waiters() {
        let shutdown = Shutdown::new();
        let waiter = shutdown.clone();
        let task = tokio::spawn(async move {
            waiter.notified().await;
            true
        });

        tokio::task::yield_now().await;
        shutdown.request();
        assert!(task.await.expect("join"));
    }
}
