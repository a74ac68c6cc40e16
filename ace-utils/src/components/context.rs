use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use twilight_model::{
    application::interaction::InteractionData,
    gateway::payload::incoming::InteractionCreate,
    id::{Id, marker::GuildMarker},
};

use super::component::Principal;
use crate::errors::InteractionError;
use crate::transport::{
    InteractionRef, InteractionReply, MessageHandle, OutgoingMessage, ReplyHandle, Transport,
};

/// One component press, as seen by callbacks and the error router.
///
/// Cheap to clone; clones share the "already responded" flag so a later reply
/// becomes a follow-up instead of a second initial response.
#[derive(Clone)]
pub struct InteractionContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    transport: Arc<dyn Transport>,
    interaction: InteractionRef,
    invoking_user: Principal,
    guild_id: Option<Id<GuildMarker>>,
    custom_id: String,
    message: Option<MessageHandle>,
    responded: AtomicBool,
}

impl InteractionContext {
    pub fn new(
        transport: Arc<dyn Transport>,
        interaction: InteractionRef,
        invoking_user: Principal,
        guild_id: Option<Id<GuildMarker>>,
        custom_id: impl Into<String>,
        message: Option<MessageHandle>,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                transport,
                interaction,
                invoking_user,
                guild_id,
                custom_id: custom_id.into(),
                message,
                responded: AtomicBool::new(false),
            }),
        }
    }

    /// Build a context from a gateway component interaction.
    ///
    /// Returns `None` for anything that is not a message component press or
    /// lacks a user or channel.
    pub fn from_interaction(
        transport: Arc<dyn Transport>,
        interaction: &InteractionCreate,
    ) -> Option<Self> {
        let Some(InteractionData::MessageComponent(data)) = interaction.data.as_ref() else {
            return None;
        };

        let invoking_user = interaction.author_id()?;
        let message = interaction.message.as_ref().map(|message| MessageHandle {
            channel_id: message.channel_id,
            message_id: message.id,
            reference: message
                .reference
                .as_ref()
                .and_then(|reference| reference.message_id),
        });
        let channel_id = interaction
            .channel
            .as_ref()
            .map(|channel| channel.id)
            .or_else(|| message.map(|message| message.channel_id))?;

        Some(Self::new(
            transport,
            InteractionRef {
                id: interaction.id,
                application_id: interaction.application_id,
                token: interaction.token.clone(),
                channel_id,
            },
            invoking_user,
            interaction.guild_id,
            data.custom_id.clone(),
            message,
        ))
    }

    pub fn invoking_user(&self) -> Principal {
        self.inner.invoking_user
    }

    pub fn guild_id(&self) -> Option<Id<GuildMarker>> {
        self.inner.guild_id
    }

    pub fn custom_id(&self) -> &str {
        &self.inner.custom_id
    }

    pub fn interaction(&self) -> &InteractionRef {
        &self.inner.interaction
    }

    /// Message the pressed component is attached to.
    pub fn message(&self) -> Option<MessageHandle> {
        self.inner.message
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    pub fn has_responded(&self) -> bool {
        self.inner.responded.load(Ordering::SeqCst)
    }

    /// Reply with plain text, privately when `ephemeral` is set.
    pub async fn respond(
        &self,
        content: impl Into<String>,
        ephemeral: bool,
    ) -> Result<ReplyHandle, InteractionError> {
        self.reply(OutgoingMessage::text(content), ephemeral).await
    }

    /// Reply with a full message; follows up when a response was already sent.
    pub async fn reply(
        &self,
        message: OutgoingMessage,
        ephemeral: bool,
    ) -> Result<ReplyHandle, InteractionError> {
        if self.claim_initial_response() {
            self.send_initial_response(InteractionReply::Message { message, ephemeral })
                .await?;
            return Ok(ReplyHandle::Original);
        }

        let message_id = self
            .transport()
            .followup(self.interaction(), &message, ephemeral)
            .await?;
        Ok(ReplyHandle::Followup(message_id))
    }

    /// Replace the attached message in place.
    pub async fn update_message(&self, message: OutgoingMessage) -> Result<(), InteractionError> {
        if self.claim_initial_response() {
            return self
                .send_initial_response(InteractionReply::UpdateMessage(message))
                .await;
        }

        let Some(target) = self.message() else {
            return Err(InteractionError::unhandled(anyhow::anyhow!(
                "interaction has no attached message to update"
            )));
        };
        self.transport().edit_message(&target, &message).await?;
        Ok(())
    }

    /// Acknowledge the press without visible change. No-op once responded.
    pub async fn defer_update(&self) -> Result<(), InteractionError> {
        if self.claim_initial_response() {
            self.send_initial_response(InteractionReply::DeferredUpdate)
                .await?;
        }
        Ok(())
    }

    fn claim_initial_response(&self) -> bool {
        !self.inner.responded.swap(true, Ordering::SeqCst)
    }

    /// Send the initial response claimed by [`Self::claim_initial_response`].
    ///
    /// A failed send gives the claim back, so the next reply is still initial.
    async fn send_initial_response(&self, reply: InteractionReply) -> Result<(), InteractionError> {
        let sent = self.transport().respond(self.interaction(), reply).await;
        if sent.is_err() {
            self.inner.responded.store(false, Ordering::SeqCst);
        }
        Ok(sent?)
    }
}

#[cfg(test)]
impl InteractionContext {
    /// Context for a press of `custom_id` by `user`, on a message in channel 10.
    pub(crate) fn for_tests(
        transport: Arc<dyn Transport>,
        user: u64,
        custom_id: impl Into<String>,
        message: Option<MessageHandle>,
    ) -> Self {
        use std::sync::atomic::AtomicU64;
        static NEXT_INTERACTION: AtomicU64 = AtomicU64::new(1);

        Self::new(
            transport,
            InteractionRef {
                id: Id::new(NEXT_INTERACTION.fetch_add(1, Ordering::SeqCst)),
                application_id: Id::new(7),
                token: "token".to_owned(),
                channel_id: Id::new(10),
            },
            Id::new(user),
            Some(Id::new(99)),
            custom_id,
            message,
        )
    }
}
