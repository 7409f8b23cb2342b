use tagline_protocol::event::DocumentEvent;
use tagline_rules::RuleContext;

/// Flattens a lifecycle event into the rule-evaluation context.
///
/// Metadata pairs land first so that well-known fields always win a key
/// collision. Keys and values are trimmed; blank ones are dropped. The
/// mapping is exhaustive over the event variants, so a new event kind fails
/// compilation here until it is given a context shape.
pub fn build_context(event: &DocumentEvent) -> RuleContext {
    let payload = match event {
        DocumentEvent::Uploaded(payload) => payload,
        DocumentEvent::OcrCompleted(payload) => payload,
    };

    let mut builder = RuleContext::builder();

    for (key, value) in &payload.metadata {
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }
        builder = builder.value(key, value);
    }

    builder = builder
        .value("documentId", payload.document_id.to_string())
        .value("title", payload.title.clone())
        .value("eventName", event.event_name())
        .value("occurredAtUtc", payload.occurred_at.to_rfc3339())
        .value(
            "occurredAtDate",
            payload.occurred_at.format("%Y-%m-%d").to_string(),
        );

    if let Some(summary) = &payload.summary {
        builder = builder.value("summary", summary.clone());
    }
    if let Some(content) = &payload.content {
        builder = builder.value("content", content.clone());
    }

    builder.build()
}
