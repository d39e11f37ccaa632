//! Notification state synchronization
//!
//! Keeps the published channel state (online summary, offline summary and the
//! fleet label) consistent with the latest snapshot. Every decision is made
//! fresh from the previous [`NotificationState`] and the new snapshot, so a
//! repeated tick with an unchanged snapshot only edits messages in place.
//!
//! A failing sink call never aborts the tick. It clears the matching
//! reference so the next tick recreates the message instead of editing a
//! message that may no longer exist.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::render::{render_label, render_offline, render_online, MessageContent};
use crate::errors::SinkError;
use crate::health::FleetSnapshot;

/// Handle to a message published on the sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub channel_id: String,
    pub message_id: String,
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn create_message(
        &self,
        channel: &str,
        content: &MessageContent,
    ) -> Result<MessageRef, SinkError>;

    async fn edit_message(
        &self,
        message: &MessageRef,
        content: &MessageContent,
    ) -> Result<(), SinkError>;

    async fn delete_message(&self, message: &MessageRef) -> Result<(), SinkError>;

    async fn rename_label(&self, target: &str, text: &str) -> Result<(), SinkError>;
}

/// What has been published so far. Empty means "unknown".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationState {
    pub online_message: Option<MessageRef>,
    pub offline_message: Option<MessageRef>,
    pub last_label: Option<String>,
}

/// Where messages and the label go
#[derive(Debug, Clone)]
pub struct NotificationTargets {
    pub channel: String,
    pub label_target: Option<String>,
    pub label_template: String,
}

/// Compute and apply the side effects that bring the sink in line with
/// `snapshot`, returning the state to carry into the next tick.
pub async fn sync(
    sink: &dyn NotificationSink,
    targets: &NotificationTargets,
    previous: &NotificationState,
    snapshot: &FleetSnapshot,
) -> NotificationState {
    let mut next = previous.clone();
    apply(sink, targets, &mut next, snapshot).await;
    next
}

/// Same as [`sync`], updating `state` in place. Each reference is written
/// as soon as its sink call returns, so if this future is dropped midway
/// `state` still matches every side effect that completed.
pub async fn apply(
    sink: &dyn NotificationSink,
    targets: &NotificationTargets,
    state: &mut NotificationState,
    snapshot: &FleetSnapshot,
) {
    let online = state.online_message.clone();
    state.online_message = upsert(
        sink,
        &targets.channel,
        online.as_ref(),
        &render_online(snapshot),
        "online summary",
    )
    .await;

    if snapshot.has_offline() {
        let offline = state.offline_message.clone();
        state.offline_message = upsert(
            sink,
            &targets.channel,
            offline.as_ref(),
            &render_offline(snapshot),
            "offline summary",
        )
        .await;
    } else if let Some(message) = state.offline_message.clone() {
        match sink.delete_message(&message).await {
            Ok(()) => info!("Fleet fully online, deleted offline summary {}", message.message_id),
            Err(e) => warn!(
                "Failed to delete offline summary {}: {}",
                message.message_id, e
            ),
        }
        state.offline_message = None;
    }

    if let Some(target) = &targets.label_target {
        let label = render_label(&targets.label_template, snapshot);
        if state.last_label.as_deref() != Some(label.as_str()) {
            match sink.rename_label(target, &label).await {
                Ok(()) => {
                    info!("Fleet label updated to '{}'", label);
                    state.last_label = Some(label);
                }
                Err(e) => {
                    warn!("Failed to update fleet label to '{}': {}", label, e);
                    state.last_label = None;
                }
            }
        } else {
            debug!("Fleet label unchanged: '{}'", label);
        }
    }
}

async fn upsert(
    sink: &dyn NotificationSink,
    channel: &str,
    existing: Option<&MessageRef>,
    content: &MessageContent,
    kind: &str,
) -> Option<MessageRef> {
    match existing {
        Some(message) => match sink.edit_message(message, content).await {
            Ok(()) => {
                debug!("Edited {} {}", kind, message.message_id);
                Some(message.clone())
            }
            Err(e) => {
                warn!(
                    "Failed to edit {} {}: {} (will recreate next tick)",
                    kind, message.message_id, e
                );
                None
            }
        },
        None => match sink.create_message(channel, content).await {
            Ok(message) => {
                info!("Created {} {}", kind, message.message_id);
                Some(message)
            }
            Err(e) => {
                warn!("Failed to create {}: {}", kind, e);
                None
            }
        },
    }
}

/// Owns the notification state across ticks
pub struct NotificationService {
    sink: Arc<dyn NotificationSink>,
    targets: NotificationTargets,
    state: NotificationState,
}

impl NotificationService {
    pub fn new(sink: Arc<dyn NotificationSink>, targets: NotificationTargets) -> Self {
        Self {
            sink,
            targets,
            state: NotificationState::default(),
        }
    }

    #[instrument(skip_all, fields(online = snapshot.online_count, total = snapshot.total_count))]
    pub async fn publish(&mut self, snapshot: &FleetSnapshot) {
        apply(self.sink.as_ref(), &self.targets, &mut self.state, snapshot).await;
    }

    pub fn state(&self) -> &NotificationState {
        &self.state
    }
}
