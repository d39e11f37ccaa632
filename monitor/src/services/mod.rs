// File: monitor/src/services/mod.rs

pub mod discord;
pub mod notification_service;
pub mod render;

pub use discord::DiscordSink;
pub use notification_service::{
    MessageRef, NotificationService, NotificationSink, NotificationState, NotificationTargets,
};
pub use render::MessageContent;
