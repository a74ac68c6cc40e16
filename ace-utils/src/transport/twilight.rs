use std::sync::Arc;

use async_trait::async_trait;
use twilight_http::{Client, error::ErrorType, response::DeserializeBodyError};
use twilight_model::{
    channel::message::{MessageFlags, component::Component},
    http::interaction::{InteractionResponse, InteractionResponseType},
    id::{
        Id,
        marker::{ChannelMarker, MessageMarker, UserMarker},
    },
};
use twilight_util::builder::InteractionResponseDataBuilder;

use super::{
    InteractionRef, InteractionReply, MessageHandle, OutgoingMessage, ReplyHandle, Transport,
    TransportError,
};

const STATUS_FORBIDDEN: u16 = 403;
const STATUS_NOT_FOUND: u16 = 404;
const STATUS_TOO_MANY_REQUESTS: u16 = 429;

impl From<twilight_http::Error> for TransportError {
    fn from(source: twilight_http::Error) -> Self {
        let status = match source.kind() {
            ErrorType::Response { status, .. } => Some(status.get()),
            _ => None,
        };

        match status {
            Some(STATUS_NOT_FOUND) => Self::NotFound,
            Some(STATUS_FORBIDDEN) => Self::Forbidden,
            Some(STATUS_TOO_MANY_REQUESTS) => Self::RateLimited,
            _ => Self::Other(anyhow::Error::new(source)),
        }
    }
}

impl From<DeserializeBodyError> for TransportError {
    fn from(source: DeserializeBodyError) -> Self {
        Self::Other(anyhow::Error::new(source))
    }
}

/// [`Transport`] backed by the shared twilight HTTP client.
#[derive(Clone)]
pub struct TwilightTransport {
    http: Arc<Client>,
}

impl TwilightTransport {
    pub fn new(http: Arc<Client>) -> Self {
        Self { http }
    }
}

fn response_for(reply: InteractionReply) -> InteractionResponse {
    match reply {
        InteractionReply::Message { message, ephemeral } => {
            let mut data = InteractionResponseDataBuilder::new()
                .embeds(message.embeds)
                .components(message.components);
            if let Some(content) = message.content {
                data = data.content(content);
            }
            if ephemeral {
                data = data.flags(MessageFlags::EPHEMERAL);
            }

            InteractionResponse {
                kind: InteractionResponseType::ChannelMessageWithSource,
                data: Some(data.build()),
            }
        }
        InteractionReply::UpdateMessage(message) => {
            let mut data = InteractionResponseDataBuilder::new().embeds(message.embeds);
            if !message.components.is_empty() {
                data = data.components(message.components);
            }
            if let Some(content) = message.content {
                data = data.content(content);
            }

            InteractionResponse {
                kind: InteractionResponseType::UpdateMessage,
                data: Some(data.build()),
            }
        }
        InteractionReply::DeferredUpdate => InteractionResponse {
            kind: InteractionResponseType::DeferredUpdateMessage,
            data: None,
        },
    }
}

#[async_trait]
impl Transport for TwilightTransport {
    async fn send_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message: &OutgoingMessage,
    ) -> Result<MessageHandle, TransportError> {
        let mut request = self
            .http
            .create_message(channel_id)
            .embeds(&message.embeds)
            .components(&message.components);
        if let Some(content) = message.content.as_deref() {
            request = request.content(content);
        }
        if let Some(reply_to) = message.reply_to {
            request = request.reply(reply_to);
        }

        let created = request.await?.model().await?;

        Ok(MessageHandle {
            channel_id: created.channel_id,
            message_id: created.id,
            reference: message.reply_to,
        })
    }

    async fn edit_message(
        &self,
        target: &MessageHandle,
        message: &OutgoingMessage,
    ) -> Result<(), TransportError> {
        let components =
            (!message.components.is_empty()).then_some(message.components.as_slice());
        self.http
            .update_message(target.channel_id, target.message_id)
            .content(message.content.as_deref())
            .embeds(Some(message.embeds.as_slice()))
            .components(components)
            .await?;

        Ok(())
    }

    async fn clear_components(&self, target: &MessageHandle) -> Result<(), TransportError> {
        let empty_components: [Component; 0] = [];
        self.http
            .update_message(target.channel_id, target.message_id)
            .components(Some(&empty_components))
            .await?;

        Ok(())
    }

    async fn delete_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> Result<(), TransportError> {
        self.http.delete_message(channel_id, message_id).await?;

        Ok(())
    }

    async fn respond(
        &self,
        interaction: &InteractionRef,
        reply: InteractionReply,
    ) -> Result<(), TransportError> {
        let response = response_for(reply);

        self.http
            .interaction(interaction.application_id)
            .create_response(interaction.id, &interaction.token, &response)
            .await?;

        Ok(())
    }

    async fn followup(
        &self,
        interaction: &InteractionRef,
        message: &OutgoingMessage,
        ephemeral: bool,
    ) -> Result<Id<MessageMarker>, TransportError> {
        let client = self.http.interaction(interaction.application_id);
        let mut request = client
            .create_followup(&interaction.token)
            .embeds(&message.embeds)
            .components(&message.components);
        if let Some(content) = message.content.as_deref() {
            request = request.content(content);
        }
        if ephemeral {
            request = request.flags(MessageFlags::EPHEMERAL);
        }

        let created = request.await?.model().await?;

        Ok(created.id)
    }

    async fn delete_reply(
        &self,
        interaction: &InteractionRef,
        reply: ReplyHandle,
    ) -> Result<(), TransportError> {
        let client = self.http.interaction(interaction.application_id);
        match reply {
            ReplyHandle::Original => {
                client.delete_response(&interaction.token).await?;
            }
            ReplyHandle::Followup(message_id) => {
                client
                    .delete_followup(&interaction.token, message_id)
                    .await?;
            }
        }

        Ok(())
    }

    async fn open_direct_channel(
        &self,
        user_id: Id<UserMarker>,
    ) -> Result<Id<ChannelMarker>, TransportError> {
        let channel = self
            .http
            .create_private_channel(user_id)
            .await?
            .model()
            .await?;

        Ok(channel.id)
    }
}
