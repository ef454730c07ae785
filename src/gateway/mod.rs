//! Messaging gateway abstraction.
//!
//! The chat platform is an external collaborator. Everything the onboarding
//! engine needs from it goes through the [`Gateway`] trait: a stream of join
//! and message events, private channels, named broadcast channels, display
//! label changes, and role checks.

pub mod cli;

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GatewayError;

pub use cli::CliGateway;

/// A community member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    /// Platform-stable identifier.
    pub id: String,
    /// Account name, used for the fallback label.
    pub name: String,
}

impl Member {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Inline reference to this member.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// A channel messages can be sent to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: String,
    pub name: String,
}

impl ChannelRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Inline reference to this channel.
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }
}

/// A text message received from a member.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Channel the message arrived on.
    pub channel_id: String,
    pub author: Member,
    pub content: String,
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(channel_id: impl Into<String>, author: Member, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel_id: channel_id.into(),
            author,
            content: content.into(),
            received_at: Utc::now(),
        }
    }
}

/// Events pushed by the gateway.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// A member joined the community.
    MemberJoined(Member),
    /// A message was posted on any channel the gateway can see.
    Message(IncomingMessage),
}

pub type EventStream = Pin<Box<dyn Stream<Item = GatewayEvent> + Send>>;

/// Chat platform operations used by the onboarding engine.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Gateway name, for logs.
    fn name(&self) -> &str;

    /// Begin receiving events.
    async fn start(&self) -> Result<EventStream, GatewayError>;

    /// Open (or reuse) a one-to-one channel with `member`.
    async fn open_private(&self, member: &Member) -> Result<ChannelRef, GatewayError>;

    /// Post `text` on `channel`.
    async fn send(&self, channel: &ChannelRef, text: &str) -> Result<(), GatewayError>;

    /// Look up a broadcast channel by name.
    async fn find_channel(&self, name: &str) -> Option<ChannelRef>;

    /// Resolve a member reference (mention, id, or name).
    async fn find_member(&self, reference: &str) -> Option<Member>;

    /// Change the label other members see for `member`.
    async fn set_display_label(&self, member: &Member, label: &str) -> Result<(), GatewayError>;

    /// Whether `member` holds `role`.
    async fn has_role(&self, member: &Member, role: &str) -> bool;

    async fn shutdown(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}
