use std::time::Duration;

use async_trait::async_trait;

use super::{
    component::{AuthorizedComponent, ComponentAction, Principal},
    container::ComponentContainer,
    context::InteractionContext,
    runtime::ComponentRuntime,
};
use crate::errors::InteractionError;

/// A container variant the runtime can drive.
///
/// The runtime runs the owner gate before [`View::invoke`] and routes any
/// error from it to [`View::handle_error`]; implementations only decide what
/// their actions do and how they fail or expire.
#[async_trait]
pub trait View: Send + 'static {
    fn container(&self) -> &ComponentContainer;

    fn container_mut(&mut self) -> &mut ComponentContainer;

    /// Run the action of the already authorized component at `index`.
    async fn invoke(
        &mut self,
        runtime: &ComponentRuntime,
        ctx: &InteractionContext,
        index: usize,
    ) -> Result<(), InteractionError>;

    async fn handle_error(
        &mut self,
        runtime: &ComponentRuntime,
        error: InteractionError,
        ctx: &InteractionContext,
    );

    async fn handle_timeout(&mut self, runtime: &ComponentRuntime);
}

/// Plain reply container: quit controls plus arbitrary callbacks.
#[derive(Debug)]
pub struct ReplyView {
    container: ComponentContainer,
}

impl ReplyView {
    pub fn new(timeout: Duration, principal: Principal) -> Self {
        Self::from_container(ComponentContainer::create(timeout, principal))
    }

    pub fn from_container(container: ComponentContainer) -> Self {
        Self { container }
    }

    pub fn add(&mut self, component: AuthorizedComponent) -> Result<&mut Self, InteractionError> {
        self.container.add(component)?;
        Ok(self)
    }
}

#[async_trait]
impl View for ReplyView {
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
            ComponentAction::Quit => self.container.quit(ctx, require_reference_deletion).await,
            ComponentAction::Callback(callback) => callback.call(ctx.clone()).await,
            action @ (ComponentAction::Previous | ComponentAction::Next) => {
                Err(InteractionError::unhandled(anyhow::anyhow!(
                    "{action:?} control attached to a plain reply"
                )))
            }
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
