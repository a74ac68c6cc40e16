//! Boundary between the component framework and the chat platform.
//!
//! The framework never talks to the HTTP client directly; everything goes
//! through [`Transport`] so the lifecycle logic can be driven without a live
//! connection.

mod twilight;

#[cfg(test)]
pub(crate) mod recording;

pub use twilight::TwilightTransport;

use async_trait::async_trait;
use twilight_model::{
    channel::message::{component::Component, embed::Embed},
    id::{
        Id,
        marker::{ApplicationMarker, ChannelMarker, InteractionMarker, MessageMarker, UserMarker},
    },
};

/// Failure talking to the chat platform.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("the target message or channel no longer exists")]
    NotFound,
    #[error("missing access to the target resource")]
    Forbidden,
    #[error("rate limited by the platform")]
    RateLimited,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TransportError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// A message the bot has sent, as far as component bookkeeping cares.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MessageHandle {
    pub channel_id: Id<ChannelMarker>,
    pub message_id: Id<MessageMarker>,
    /// Message this one replies to, in the same channel.
    pub reference: Option<Id<MessageMarker>>,
}

/// Everything needed to answer an interaction after the fact.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InteractionRef {
    pub id: Id<InteractionMarker>,
    pub application_id: Id<ApplicationMarker>,
    pub token: String,
    pub channel_id: Id<ChannelMarker>,
}

/// Content of an outgoing or edited message.
///
/// When editing, empty `components` leave the message's components untouched;
/// use [`Transport::clear_components`] to remove them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    pub components: Vec<Component>,
    pub reply_to: Option<Id<MessageMarker>>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }

    pub fn replying_to(mut self, message_id: Id<MessageMarker>) -> Self {
        self.reply_to = Some(message_id);
        self
    }
}

/// Initial response to a component interaction.
#[derive(Clone, Debug, PartialEq)]
pub enum InteractionReply {
    /// New message in the channel, optionally visible only to the invoker.
    Message {
        message: OutgoingMessage,
        ephemeral: bool,
    },
    /// Edit the message the component is attached to.
    UpdateMessage(OutgoingMessage),
    /// Acknowledge without visible change.
    DeferredUpdate,
}

/// Which interaction reply a later deletion refers to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReplyHandle {
    Original,
    Followup(Id<MessageMarker>),
}

/// Messaging operations the component framework relies on.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message: &OutgoingMessage,
    ) -> Result<MessageHandle, TransportError>;

    async fn edit_message(
        &self,
        target: &MessageHandle,
        message: &OutgoingMessage,
    ) -> Result<(), TransportError>;

    /// Remove every component from a message, leaving its content alone.
    async fn clear_components(&self, target: &MessageHandle) -> Result<(), TransportError>;

    async fn delete_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> Result<(), TransportError>;

    async fn respond(
        &self,
        interaction: &InteractionRef,
        reply: InteractionReply,
    ) -> Result<(), TransportError>;

    async fn followup(
        &self,
        interaction: &InteractionRef,
        message: &OutgoingMessage,
        ephemeral: bool,
    ) -> Result<Id<MessageMarker>, TransportError>;

    async fn delete_reply(
        &self,
        interaction: &InteractionRef,
        reply: ReplyHandle,
    ) -> Result<(), TransportError>;

    /// Resolve (opening if needed) the direct-message channel with a user.
    async fn open_direct_channel(
        &self,
        user_id: Id<UserMarker>,
    ) -> Result<Id<ChannelMarker>, TransportError>;
}
