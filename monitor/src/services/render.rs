//! Snapshot rendering for the notification channel
//!
//! Rendered messages always fit Discord's embed limits: at most 25 fields,
//! 256 characters per field name, 1024 per value and 6000 in total.
//! Endpoints sharing a hostname are named by their full URI.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

use crate::constants::notifications::{
    self, MAX_EMBED_FIELDS, MAX_EMBED_TOTAL_CHARS, MAX_ERROR_CHARS, MAX_FIELD_NAME_CHARS,
    MAX_FIELD_VALUE_CHARS,
};
use crate::health::{EndpointVerdict, FleetSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageField {
    pub name: String,
    pub value: String,
}

/// Sink-agnostic summary message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageContent {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<MessageField>,
    pub timestamp: DateTime<Utc>,
}

pub fn render_online(snapshot: &FleetSnapshot) -> MessageContent {
    let online: Vec<&EndpointVerdict> = snapshot.online().collect();
    let description = if online.is_empty() {
        "No servers are online.".to_string()
    } else {
        format!(
            "The following Electrum servers are online and synced ({}/{}):",
            snapshot.online_count, snapshot.total_count
        )
    };

    MessageContent {
        title: "Electrum Server Sync Check - Online Servers".to_string(),
        description,
        color: notifications::ONLINE_COLOR,
        fields: capped_fields(&online, &FieldNames::for_snapshot(snapshot), online_field),
        timestamp: snapshot.timestamp,
    }
    .fit_to_limits()
}

pub fn render_offline(snapshot: &FleetSnapshot) -> MessageContent {
    let offline: Vec<&EndpointVerdict> = snapshot.offline().collect();
    let description = if offline.is_empty() {
        "No servers are offline.".to_string()
    } else {
        "The following Electrum servers are offline:".to_string()
    };

    MessageContent {
        title: "Electrum Servers Status".to_string(),
        description,
        color: notifications::OFFLINE_COLOR,
        fields: capped_fields(&offline, &FieldNames::for_snapshot(snapshot), offline_field),
        timestamp: snapshot.timestamp,
    }
    .fit_to_limits()
}

/// Fill `{online}` and `{total}` in the label template.
pub fn render_label(template: &str, snapshot: &FleetSnapshot) -> String {
    template
        .replace("{online}", &snapshot.online_count.to_string())
        .replace("{total}", &snapshot.total_count.to_string())
}

impl MessageContent {
    /// Characters Discord counts towards the 6000 character embed limit
    pub fn embed_chars(&self) -> usize {
        self.title.chars().count()
            + self.description.chars().count()
            + self
                .fields
                .iter()
                .map(|f| f.name.chars().count() + f.value.chars().count())
                .sum::<usize>()
    }

    /// Shrink field names and values until the embed fits in total. Each
    /// field gets an equal share of what the title and description leave.
    fn fit_to_limits(mut self) -> Self {
        if self.embed_chars() <= MAX_EMBED_TOTAL_CHARS || self.fields.is_empty() {
            return self;
        }

        let fixed = self.title.chars().count() + self.description.chars().count();
        let per_field = MAX_EMBED_TOTAL_CHARS.saturating_sub(fixed) / self.fields.len();
        for field in &mut self.fields {
            field.name = truncate(&field.name, per_field / 2);
            let remaining = per_field.saturating_sub(field.name.chars().count());
            field.value = truncate(&field.value, remaining);
        }
        self
    }
}

/// Field naming for one snapshot. Hostnames listed more than once (same
/// host on several ports or schemes) fall back to the endpoint URI.
struct FieldNames<'a> {
    shared: HashSet<&'a str>,
}

impl<'a> FieldNames<'a> {
    fn for_snapshot(snapshot: &'a FleetSnapshot) -> Self {
        let mut seen = HashSet::new();
        let mut shared = HashSet::new();
        for verdict in &snapshot.verdicts {
            let hostname = verdict.endpoint.hostname.as_str();
            if !seen.insert(hostname) {
                shared.insert(hostname);
            }
        }
        Self { shared }
    }

    fn name(&self, verdict: &EndpointVerdict) -> String {
        let endpoint = &verdict.endpoint;
        let name = if self.shared.contains(endpoint.hostname.as_str()) {
            &endpoint.uri
        } else {
            &endpoint.hostname
        };
        truncate(name, MAX_FIELD_NAME_CHARS)
    }
}

fn online_field(verdict: &EndpointVerdict, name: String) -> MessageField {
    let height = verdict
        .height
        .map_or_else(|| "N/A".to_string(), |h| h.to_string());
    let version = verdict.version.as_deref().unwrap_or("Unknown Version");

    MessageField {
        name,
        value: truncate(
            &format!(
                "Synced (Block height: {})\nVersion: {}\nAddresses online: {}/{}",
                height, version, verdict.online_address_count, verdict.total_address_count
            ),
            MAX_FIELD_VALUE_CHARS,
        ),
    }
}

fn offline_field(verdict: &EndpointVerdict, name: String) -> MessageField {
    let mut value = format!(
        "Offline! ({}/{} addresses reachable)",
        verdict.online_address_count, verdict.total_address_count
    );
    if let Some(first) = verdict.errors.first() {
        value.push('\n');
        value.push_str(&truncate(first, MAX_ERROR_CHARS));
    }

    MessageField {
        name,
        value: truncate(&value, MAX_FIELD_VALUE_CHARS),
    }
}

fn capped_fields(
    verdicts: &[&EndpointVerdict],
    names: &FieldNames<'_>,
    render: fn(&EndpointVerdict, String) -> MessageField,
) -> Vec<MessageField> {
    if verdicts.len() <= MAX_EMBED_FIELDS {
        return verdicts.iter().map(|v| render(v, names.name(v))).collect();
    }

    let mut fields: Vec<MessageField> = verdicts[..MAX_EMBED_FIELDS - 1]
        .iter()
        .map(|v| render(v, names.name(v)))
        .collect();
    let remaining = &verdicts[MAX_EMBED_FIELDS - 1..];
    let listed: Vec<String> = remaining.iter().map(|v| names.name(v)).collect();
    fields.push(MessageField {
        name: format!("... and {} more", remaining.len()),
        value: truncate(&listed.join(", "), MAX_FIELD_VALUE_CHARS),
    });
    fields
}

/// Cut `value` to at most `max` characters, marking the cut with "...".
fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    if max <= 3 {
        return value.chars().take(max).collect();
    }
    let mut cut: String = value.chars().take(max - 3).collect();
    cut.push_str("...");
    cut
}
