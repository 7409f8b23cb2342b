use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate};

use tagline_rules::{RuleOutput, RuleSet};

use crate::pipeline::TAG_IDS_KEY;

/// Tag emitted by the creation-anniversary rule.
pub const AUTO_DATE_TAG: &str = "auto-date";

/// Appends a tag id to the output's tag list, keeping earlier writes.
pub fn push_tag_id(output: &mut RuleOutput, tag_id: &str) {
    let mut tags: Vec<String> = output.try_get(TAG_IDS_KEY).unwrap_or_default();
    if !tags.iter().any(|existing| existing == tag_id) {
        tags.push(tag_id.to_string());
    }
    output.set(TAG_IDS_KEY, tags);
}

/// Code-defined rule set that tags documents whose `field` metadata value is
/// recognized, e.g. `{"invoice" → "T-INVOICE", "contract" → "T-CONTRACT"}`.
pub fn document_type_rules(
    set_name: impl Into<String>,
    field: &str,
    mapping: &BTreeMap<String, String>,
) -> RuleSet {
    let mut builder = RuleSet::builder(set_name);
    for (value, tag_id) in mapping {
        let field = field.to_string();
        let expected = value.clone();
        let tag = tag_id.clone();
        builder = builder.rule(
            format!("doc-type-{}", value),
            move |context| {
                Ok(context
                    .get::<String>(&field)
                    .map(|actual| actual.trim().eq_ignore_ascii_case(&expected))
                    .unwrap_or(false))
            },
            move |_context, output| {
                push_tag_id(output, &tag);
                Ok(())
            },
        );
    }
    builder.build()
}

/// Code-defined rule set that tags a document with [`AUTO_DATE_TAG`] when the
/// event date falls on the anniversary (month and day) of the document's
/// creation date, read from the `created_field` metadata value.
pub fn anniversary_rules(set_name: impl Into<String>, created_field: &str) -> RuleSet {
    let field = created_field.to_string();
    RuleSet::builder(set_name)
        .rule(
            "creation-anniversary",
            move |context| {
                let event_date = context
                    .get::<String>("occurredAtDate")
                    .and_then(|text| parse_date(&text));
                let created = context
                    .get::<String>(&field)
                    .and_then(|text| parse_date(&text));

                Ok(match (event_date, created) {
                    (Some(event), Some(created)) => {
                        event.month() == created.month() && event.day() == created.day()
                    }
                    _ => false,
                })
            },
            |_context, output| {
                push_tag_id(output, AUTO_DATE_TAG);
                Ok(())
            },
        )
        .build()
}

// Accepts plain dates and full RFC 3339 timestamps.
fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.date_naive());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}
