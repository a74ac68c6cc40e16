//! Navigation container bound to one paginator session.

use std::time::Duration;

use async_trait::async_trait;
use twilight_model::channel::message::component::ButtonStyle;

use super::session::PaginatorSession;
use crate::components::{
    AuthorizedComponent, ButtonPolicy, ComponentAction, ComponentContainer, ComponentRuntime,
    InteractionContext, Principal, View,
};
use crate::errors::InteractionError;
use crate::transport::OutgoingMessage;

const PREV: usize = 0;
const NEXT: usize = 1;

/// Previous / next / quit controls over a [`PaginatorSession`].
#[derive(Debug)]
pub struct PaginatorView {
    container: ComponentContainer,
    session: PaginatorSession,
}

impl PaginatorView {
    pub fn new(
        session: PaginatorSession,
        timeout: Duration,
        principal: Principal,
    ) -> Result<Self, InteractionError> {
        let mut container = ComponentContainer::create(timeout, principal);
        container
            .add(AuthorizedComponent::bind(
                principal,
                ButtonPolicy::new("◀ Prev"),
                ComponentAction::Previous,
            ))?
            .add(AuthorizedComponent::bind(
                principal,
                ButtonPolicy::new("Next ▶"),
                ComponentAction::Next,
            ))?
            .add(AuthorizedComponent::quit_with(
                principal,
                ButtonPolicy::new("Quit").style(ButtonStyle::Danger),
            ))?;

        let mut view = Self { container, session };
        view.sync_controls();
        Ok(view)
    }

    /// Current page with the navigation controls in their current state.
    pub fn page_message(&self) -> Result<OutgoingMessage, InteractionError> {
        let mut message = self.session.message_for_current()?;
        message.components = self.container.render_components();
        Ok(message)
    }

    fn sync_controls(&mut self) {
        let page = self.session.current();
        let (first, last) = (page.is_first(), page.is_last());

        if let Some(prev) = self.container.component_mut(PREV) {
            prev.set_disabled(first);
        }
        if let Some(next) = self.container.component_mut(NEXT) {
            next.set_disabled(last);
        }
    }

    async fn navigate(
        &mut self,
        ctx: &InteractionContext,
        forward: bool,
    ) -> Result<(), InteractionError> {
        let before = self.session.current().index();
        let after = if forward {
            self.session.next().index()
        } else {
            self.session.prev().index()
        };

        if before == after {
            return ctx.defer_update().await;
        }

        self.sync_controls();
        ctx.update_message(self.page_message()?).await
    }
}

#[async_trait]
impl View for PaginatorView {
    fn container(&self) -> &ComponentContainer {
        &self.container
    }

    fn container_mut(&mut self) -> &mut ComponentContainer {
        &mut self.container
    }

    async fn invoke(
        &mut self,
        _runtime: &ComponentRuntime,
        ctx: &InteractionContext,
        index: usize,
    ) -> Result<(), InteractionError> {
        let component = self.container.component(index)?;
        let require_reference_deletion = component.policy().require_reference_deletion;
        let action = component.action().clone();

        match action {
            ComponentAction::Previous => self.navigate(ctx, false).await,
            ComponentAction::Next => self.navigate(ctx, true).await,
            ComponentAction::Quit => self.container.quit(ctx, require_reference_deletion).await,
            ComponentAction::Callback(callback) => callback.call(ctx.clone()).await,
        }
    }

    async fn handle_error(
        &mut self,
        runtime: &ComponentRuntime,
        error: InteractionError,
        ctx: &InteractionContext,
    ) {
        runtime.router().dispatch(runtime, error, ctx).await;
    }

    async fn handle_timeout(&mut self, runtime: &ComponentRuntime) {
        self.container.expire(runtime.transport().as_ref()).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use twilight_model::{channel::message::component::Component, id::Id};

    use super::*;
    use crate::components::{SentView, build_custom_id};
    use crate::router::{ErrorRouter, OwnerTarget};
    use crate::transport::{
        InteractionReply,
        recording::{Call, RecordingTransport},
    };

    fn runtime(transport: &Arc<RecordingTransport>) -> ComponentRuntime {
        ComponentRuntime::new(
            transport.clone(),
            ErrorRouter::new(OwnerTarget {
                owner: Id::new(900),
                channel: Some(Id::new(77)),
            }),
        )
    }

    fn disabled_flags(message: &OutgoingMessage) -> Vec<bool> {
        let Some(Component::ActionRow(row)) = message.components.first() else {
            panic!("expected an action row");
        };
        row.components
            .iter()
            .map(|component| match component {
                Component::Button(button) => button.disabled,
                _ => panic!("expected buttons only"),
            })
            .collect()
    }

    async fn press(
        runtime: &ComponentRuntime,
        transport: &Arc<RecordingTransport>,
        sent: SentView,
        index: usize,
    ) {
        let ctx = InteractionContext::for_tests(
            transport.clone(),
            1,
            build_custom_id(sent.container_id, index),
            Some(sent.message),
        );
        runtime.dispatch(ctx).await;
    }

    fn last_update(transport: &RecordingTransport) -> OutgoingMessage {
        transport
            .calls()
            .into_iter()
            .rev()
            .find_map(|call| match call {
                Call::Respond {
                    reply: InteractionReply::UpdateMessage(message),
                    ..
                } => Some(message),
                _ => None,
            })
            .expect("an in-place update")
    }

    #[tokio::test]
    async fn start_sends_the_first_page_with_prev_disabled() {
        let transport = Arc::new(RecordingTransport::default());
        let runtime = runtime(&transport);
        let lines: Vec<String> = (1..=250).map(|line| line.to_string()).collect();

        let sent = PaginatorSession::paginate(lines, "", "", 100)
            .start(
                &runtime,
                Id::new(1),
                Duration::from_secs(60),
                Id::new(10),
                Some(Id::new(4)),
            )
            .await
            .unwrap();

        let (channel_id, first) = transport.sent().remove(0);
        assert_eq!(channel_id, Id::new(10));
        assert_eq!(first.reply_to, Some(Id::new(4)));
        assert!(first.content.as_deref().unwrap().starts_with("1\n2\n"));
        assert_eq!(disabled_flags(&first), vec![true, false, false]);
        assert_eq!(sent.message.reference, Some(Id::new(4)));
    }

    #[tokio::test]
    async fn navigation_updates_in_place_and_stops_at_the_end() {
        let transport = Arc::new(RecordingTransport::default());
        let runtime = runtime(&transport);
        let lines: Vec<String> = (1..=250).map(|line| line.to_string()).collect();
        let sent = PaginatorSession::paginate(lines, "", "", 100)
            .start(&runtime, Id::new(1), Duration::from_secs(60), Id::new(10), None)
            .await
            .unwrap();

        press(&runtime, &transport, sent, NEXT).await;
        press(&runtime, &transport, sent, NEXT).await;

        let last = last_update(&transport);
        assert!(last.content.as_deref().unwrap().starts_with("201\n"));
        assert_eq!(disabled_flags(&last), vec![false, true, false]);

        let updates_before = transport.calls().len();
        press(&runtime, &transport, sent, NEXT).await;
        let calls = transport.calls();
        assert_eq!(calls.len(), updates_before + 1);
        assert!(matches!(
            calls.last(),
            Some(Call::Respond {
                reply: InteractionReply::DeferredUpdate,
                ..
            })
        ));

        press(&runtime, &transport, sent, PREV).await;
        assert!(
            last_update(&transport)
                .content
                .as_deref()
                .unwrap()
                .starts_with("101\n")
        );
    }

    #[tokio::test]
    async fn oversized_sessions_never_send() {
        let transport = Arc::new(RecordingTransport::default());
        let runtime = runtime(&transport);

        let error = PaginatorSession::paginate(vec!["x".repeat(2500)], "", "", 1)
            .start(&runtime, Id::new(1), Duration::from_secs(60), Id::new(10), None)
            .await
            .unwrap_err();

        assert_eq!(error.kind(), crate::errors::ErrorKind::ContentTooLarge);
        assert!(transport.calls().is_empty());
    }
}
