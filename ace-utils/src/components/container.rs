use std::{fmt, str::FromStr, time::Duration};

use tokio::time::Instant;
use tracing::warn;
use twilight_model::channel::message::component::{ActionRow, Component};
use uuid::Uuid;

use super::{
    build_custom_id,
    component::{AuthorizedComponent, Principal},
    context::InteractionContext,
};
use crate::errors::InteractionError;
use crate::transport::{MessageHandle, Transport};

/// Platform cap on interactive components per message (5 rows of 5).
pub const MAX_COMPONENTS_PER_MESSAGE: usize = 25;
/// Buttons laid out per action row.
pub const COMPONENTS_PER_ROW: usize = 5;

/// Stable identifier of a container, embedded in its components' custom IDs.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ContainerId(Uuid);

impl ContainerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContainerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for ContainerId {
    type Err = uuid::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Uuid::try_parse(raw).map(Self)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContainerState {
    /// Components are still being added; nothing sent yet.
    Building,
    /// Attached to a message and accepting presses.
    Active,
    TimedOut,
    Disposed,
}

/// The components of one message, their principal and their timeout.
#[derive(Debug)]
pub struct ComponentContainer {
    id: ContainerId,
    principal: Principal,
    timeout: Duration,
    components: Vec<AuthorizedComponent>,
    attached: Option<MessageHandle>,
    public: bool,
    state: ContainerState,
    expires_at: Option<Instant>,
}

impl ComponentContainer {
    pub fn create(timeout: Duration, principal: Principal) -> Self {
        Self {
            id: ContainerId::new(),
            principal,
            timeout,
            components: Vec::new(),
            attached: None,
            public: false,
            state: ContainerState::Building,
            expires_at: None,
        }
    }

    /// Lift the owner gate for every component in this container.
    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    /// Append a component; display order is insertion order.
    pub fn add(&mut self, component: AuthorizedComponent) -> Result<&mut Self, InteractionError> {
        if self.components.len() >= MAX_COMPONENTS_PER_MESSAGE {
            return Err(InteractionError::CapacityExceeded {
                limit: MAX_COMPONENTS_PER_MESSAGE,
            });
        }

        self.components.push(component);
        Ok(self)
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn principal(&self) -> Principal {
        self.principal
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn state(&self) -> ContainerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ContainerState::Active
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn attached(&self) -> Option<MessageHandle> {
        self.attached
    }

    pub fn components(&self) -> &[AuthorizedComponent] {
        &self.components
    }

    pub fn component(&self, index: usize) -> Result<&AuthorizedComponent, InteractionError> {
        self.components.get(index).ok_or_else(|| {
            InteractionError::unhandled(anyhow::anyhow!(
                "container {} has no component at index {index}",
                self.id
            ))
        })
    }

    pub fn component_mut(&mut self, index: usize) -> Option<&mut AuthorizedComponent> {
        self.components.get_mut(index)
    }

    /// Run the owner gate for the component at `index`.
    pub fn authorize(&self, index: usize, actor: Principal) -> Result<(), InteractionError> {
        self.component(index)?.authorize(actor, self.public)
    }

    /// Lay the components out in action rows.
    pub fn render_components(&self) -> Vec<Component> {
        self.components
            .chunks(COMPONENTS_PER_ROW)
            .enumerate()
            .map(|(row, chunk)| {
                let components = chunk
                    .iter()
                    .enumerate()
                    .map(|(offset, component)| {
                        let index = row * COMPONENTS_PER_ROW + offset;
                        component.render(build_custom_id(self.id, index))
                    })
                    .collect();

                Component::ActionRow(ActionRow {
                    id: None,
                    components,
                })
            })
            .collect()
    }

    pub(crate) fn activate(&mut self, message: MessageHandle) {
        self.attached = Some(message);
        self.state = ContainerState::Active;
    }

    /// Start (or restart) the inactivity window from `now`.
    pub(crate) fn arm(&mut self, now: Instant) {
        self.expires_at = Some(now + self.timeout);
    }

    pub(crate) fn deadline_passed(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }

    /// Move out of `Active`, dropping all components.
    ///
    /// Returns the attached message the first time only; later calls are no-ops.
    pub fn detach(&mut self, next: ContainerState) -> Option<MessageHandle> {
        if self.state != ContainerState::Active {
            return None;
        }

        self.state = next;
        self.components.clear();
        self.expires_at = None;
        self.attached
    }

    /// Time out: detach and strip the buttons from the message. Idempotent.
    pub async fn expire(&mut self, transport: &dyn Transport) {
        let Some(message) = self.detach(ContainerState::TimedOut) else {
            return;
        };

        if let Err(source) = transport.clear_components(&message).await
            && !source.is_not_found()
        {
            warn!(?source, container_id = %self.id, "failed to clear expired components");
        }
    }

    /// Quit control: delete the attached message and dispose the container.
    ///
    /// With `require_reference_deletion`, the message it replies to goes too;
    /// that second deletion tolerates the message already being gone.
    pub async fn quit(
        &mut self,
        ctx: &InteractionContext,
        require_reference_deletion: bool,
    ) -> Result<(), InteractionError> {
        ctx.defer_update().await?;

        let Some(message) = self.detach(ContainerState::Disposed) else {
            return Ok(());
        };
        let transport = ctx.transport();
        transport
            .delete_message(message.channel_id, message.message_id)
            .await?;

        let reference = message
            .reference
            .or_else(|| ctx.message().and_then(|attached| attached.reference));
        if require_reference_deletion && let Some(reference) = reference {
            match transport.delete_message(message.channel_id, reference).await {
                Ok(()) => {}
                Err(source) if source.is_not_found() => {}
                Err(source) => return Err(source.into()),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use twilight_model::id::Id;

    use super::*;
    use crate::components::{ButtonPolicy, ComponentAction, parse_custom_id};
    use crate::errors::ErrorKind;
    use crate::transport::recording::{Call, RecordingTransport};

    fn attached(message_id: u64, reference: Option<u64>) -> MessageHandle {
        MessageHandle {
            channel_id: Id::new(10),
            message_id: Id::new(message_id),
            reference: reference.map(Id::new),
        }
    }

    #[test]
    fn add_enforces_the_component_cap() {
        let mut container = ComponentContainer::create(Duration::from_secs(60), Id::new(1));
        for _ in 0..MAX_COMPONENTS_PER_MESSAGE {
            container.add(AuthorizedComponent::quit(Id::new(1))).unwrap();
        }

        let error = container
            .add(AuthorizedComponent::quit(Id::new(1)))
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::CapacityExceeded);
        assert_eq!(container.components().len(), MAX_COMPONENTS_PER_MESSAGE);
    }

    #[test]
    fn rows_follow_insertion_order() {
        let mut container = ComponentContainer::create(Duration::from_secs(60), Id::new(1));
        for index in 0..7 {
            container
                .add(AuthorizedComponent::public(
                    ButtonPolicy::new(format!("b{index}")),
                    ComponentAction::Next,
                ))
                .unwrap();
        }

        let rows = container.render_components();
        assert_eq!(rows.len(), 2);

        let Component::ActionRow(second) = &rows[1] else {
            panic!("expected an action row");
        };
        assert_eq!(second.components.len(), 2);
        let Component::Button(button) = &second.components[1] else {
            panic!("expected a button");
        };
        assert_eq!(button.label.as_deref(), Some("b6"));
        let (id, index) = parse_custom_id(button.custom_id.as_deref().unwrap()).unwrap();
        assert_eq!((id, index), (container.id(), 6));
    }

    #[test]
    fn detach_only_happens_once() {
        let mut container = ComponentContainer::create(Duration::from_secs(60), Id::new(1));
        container.add(AuthorizedComponent::quit(Id::new(1))).unwrap();
        container.activate(attached(5, None));

        assert_eq!(container.detach(ContainerState::TimedOut), Some(attached(5, None)));
        assert_eq!(container.detach(ContainerState::Disposed), None);
        assert_eq!(container.state(), ContainerState::TimedOut);
        assert!(container.components().is_empty());
    }

    #[tokio::test]
    async fn quit_swallows_a_missing_reference() {
        let transport = Arc::new(RecordingTransport::default());
        transport
            .failures
            .lock()
            .unwrap()
            .delete_not_found
            .push(Id::new(4));

        let mut container = ComponentContainer::create(Duration::from_secs(60), Id::new(1));
        container.activate(attached(5, Some(4)));
        let ctx = InteractionContext::for_tests(transport.clone(), 1, "acv:x:0", None);

        container.quit(&ctx, true).await.unwrap();

        assert_eq!(transport.deleted(), vec![Id::new(5)]);
        assert_eq!(container.state(), ContainerState::Disposed);
    }

    #[tokio::test]
    async fn quit_surfaces_other_reference_failures() {
        let transport = Arc::new(RecordingTransport::default());
        transport
            .failures
            .lock()
            .unwrap()
            .delete_forbidden
            .push(Id::new(4));

        let mut container = ComponentContainer::create(Duration::from_secs(60), Id::new(1));
        container.activate(attached(5, Some(4)));
        let ctx = InteractionContext::for_tests(transport.clone(), 1, "acv:x:0", None);

        let error = container.quit(&ctx, true).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unhandled);
    }

    #[tokio::test]
    async fn quit_leaves_the_reference_alone_by_default() {
        let transport = Arc::new(RecordingTransport::default());
        let mut container = ComponentContainer::create(Duration::from_secs(60), Id::new(1));
        container.activate(attached(5, Some(4)));
        let ctx = InteractionContext::for_tests(transport.clone(), 1, "acv:x:0", None);

        container.quit(&ctx, false).await.unwrap();

        assert_eq!(transport.deleted(), vec![Id::new(5)]);
        assert!(matches!(transport.calls()[0], Call::Respond { .. }));
    }

    #[tokio::test]
    async fn expire_clears_components_once() {
        let transport = RecordingTransport::default();
        let mut container = ComponentContainer::create(Duration::from_secs(60), Id::new(1));
        container.activate(attached(5, None));

        container.expire(&transport).await;
        container.expire(&transport).await;

        assert_eq!(transport.calls(), vec![Call::ClearComponents(attached(5, None))]);
        assert_eq!(container.state(), ContainerState::TimedOut);
    }
}
