//! In-memory [`Transport`] double that records every call.

use std::sync::{
    Mutex,
    atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, InteractionMarker, MessageMarker, UserMarker},
};

use super::{
    InteractionRef, InteractionReply, MessageHandle, OutgoingMessage, ReplyHandle, Transport,
    TransportError,
};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    Send {
        channel_id: Id<ChannelMarker>,
        message: OutgoingMessage,
        handle: MessageHandle,
    },
    Edit {
        target: MessageHandle,
        message: OutgoingMessage,
    },
    ClearComponents(MessageHandle),
    Delete {
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    },
    Respond {
        interaction: Id<InteractionMarker>,
        reply: InteractionReply,
    },
    Followup {
        interaction: Id<InteractionMarker>,
        message: OutgoingMessage,
        ephemeral: bool,
    },
    DeleteReply(ReplyHandle),
    OpenDirect(Id<UserMarker>),
}

/// Failure modes a test can arm before exercising a code path.
#[derive(Default)]
pub(crate) struct Failures {
    pub delete_not_found: Vec<Id<MessageMarker>>,
    pub delete_forbidden: Vec<Id<MessageMarker>>,
    pub direct_channel_unavailable: bool,
    /// Number of upcoming interaction responses to reject.
    pub failing_responds: usize,
    pub clear_not_found: bool,
}

pub(crate) struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    next_message_id: AtomicU64,
    pub(crate) failures: Mutex<Failures>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_message_id: AtomicU64::new(1000),
            failures: Mutex::new(Failures::default()),
        }
    }
}

impl RecordingTransport {
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn sent(&self) -> Vec<(Id<ChannelMarker>, OutgoingMessage)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Send {
                    channel_id,
                    message,
                    ..
                } => Some((channel_id, message)),
                _ => None,
            })
            .collect()
    }

    /// Interaction replies that carried a visible message, with their ephemeral flag.
    pub(crate) fn notices(&self) -> Vec<(String, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Respond {
                    reply: InteractionReply::Message { message, ephemeral },
                    ..
                } => Some((message.content.unwrap_or_default(), ephemeral)),
                Call::Followup {
                    message, ephemeral, ..
                } => Some((message.content.unwrap_or_default(), ephemeral)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn deleted(&self) -> Vec<Id<MessageMarker>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delete { message_id, .. } => Some(message_id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message: &OutgoingMessage,
    ) -> Result<MessageHandle, TransportError> {
        let message_id = Id::new(self.next_message_id.fetch_add(1, Ordering::SeqCst));
        let handle = MessageHandle {
            channel_id,
            message_id,
            reference: message.reply_to,
        };
        self.record(Call::Send {
            channel_id,
            message: message.clone(),
            handle,
        });
        Ok(handle)
    }

    async fn edit_message(
        &self,
        target: &MessageHandle,
        message: &OutgoingMessage,
    ) -> Result<(), TransportError> {
        self.record(Call::Edit {
            target: *target,
            message: message.clone(),
        });
        Ok(())
    }

    async fn clear_components(&self, target: &MessageHandle) -> Result<(), TransportError> {
        self.record(Call::ClearComponents(*target));
        if self.failures.lock().expect("failures lock").clear_not_found {
            return Err(TransportError::NotFound);
        }
        Ok(())
    }

    async fn delete_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> Result<(), TransportError> {
        {
            let failures = self.failures.lock().expect("failures lock");
            if failures.delete_not_found.contains(&message_id) {
                return Err(TransportError::NotFound);
            }
            if failures.delete_forbidden.contains(&message_id) {
                return Err(TransportError::Forbidden);
            }
        }
        self.record(Call::Delete {
            channel_id,
            message_id,
        });
        Ok(())
    }

    async fn respond(
        &self,
        interaction: &InteractionRef,
        reply: InteractionReply,
    ) -> Result<(), TransportError> {
        {
            let mut failures = self.failures.lock().expect("failures lock");
            if failures.failing_responds > 0 {
                failures.failing_responds -= 1;
                return Err(TransportError::Forbidden);
            }
        }
        self.record(Call::Respond {
            interaction: interaction.id,
            reply,
        });
        Ok(())
    }

    async fn followup(
        &self,
        interaction: &InteractionRef,
        message: &OutgoingMessage,
        ephemeral: bool,
    ) -> Result<Id<MessageMarker>, TransportError> {
        self.record(Call::Followup {
            interaction: interaction.id,
            message: message.clone(),
            ephemeral,
        });
        Ok(Id::new(self.next_message_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn delete_reply(
        &self,
        _interaction: &InteractionRef,
        reply: ReplyHandle,
    ) -> Result<(), TransportError> {
        self.record(Call::DeleteReply(reply));
        Ok(())
    }

    async fn open_direct_channel(
        &self,
        user_id: Id<UserMarker>,
    ) -> Result<Id<ChannelMarker>, TransportError> {
        if self
            .failures
            .lock()
            .expect("failures lock")
            .direct_channel_unavailable
        {
            return Err(TransportError::Forbidden);
        }
        self.record(Call::OpenDirect(user_id));
        Ok(Id::new(user_id.get() + 500_000))
    }
}
