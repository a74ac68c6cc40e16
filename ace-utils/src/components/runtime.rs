//! Process-wide owner of live containers.

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{sync::Mutex, task::JoinHandle, time::Instant};
use tracing::{debug, info, warn};
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, MessageMarker},
};

use super::{
    container::{ContainerId, ContainerState},
    context::InteractionContext,
    parse_custom_id,
    view::View,
};
use crate::errors::InteractionError;
use crate::router::ErrorRouter;
use crate::transport::{MessageHandle, OutgoingMessage, Transport};

type SharedView = Arc<Mutex<Box<dyn View>>>;

#[derive(Default)]
struct Registry {
    views: HashMap<ContainerId, SharedView>,
    by_message: HashMap<Id<MessageMarker>, ContainerId>,
    timers: HashMap<ContainerId, JoinHandle<()>>,
}

/// Where a container ended up after [`ComponentRuntime::send`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SentView {
    pub container_id: ContainerId,
    pub message: MessageHandle,
}

/// Registry, dispatcher and timeout scheduler for component containers.
///
/// Cheap to clone. Each container sits behind its own lock, so presses on one
/// container run one at a time while other containers proceed. The registry
/// lock is never held while a container lock is being acquired.
#[derive(Clone)]
pub struct ComponentRuntime {
    transport: Arc<dyn Transport>,
    router: Arc<ErrorRouter>,
    registry: Arc<Mutex<Registry>>,
}

impl ComponentRuntime {
    pub fn new(transport: Arc<dyn Transport>, router: ErrorRouter) -> Self {
        Self {
            transport,
            router: Arc::new(router),
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn router(&self) -> &ErrorRouter {
        &self.router
    }

    /// Send a new message carrying the view's components and take ownership of it.
    pub async fn send<V: View>(
        &self,
        view: V,
        channel_id: Id<ChannelMarker>,
        mut message: OutgoingMessage,
    ) -> Result<SentView, InteractionError> {
        ensure_building(&view)?;

        let container_id = view.container().id();
        message.components = view.container().render_components();
        let handle = self.transport.send_message(channel_id, &message).await?;
        self.register(Box::new(view), handle).await;

        Ok(SentView {
            container_id,
            message: handle,
        })
    }

    /// Re-attach an existing message to a new view, replacing whatever governed it.
    pub async fn attach<V: View>(
        &self,
        view: V,
        target: MessageHandle,
        mut message: OutgoingMessage,
    ) -> Result<SentView, InteractionError> {
        ensure_building(&view)?;

        let container_id = view.container().id();
        message.components = view.container().render_components();
        self.transport.edit_message(&target, &message).await?;
        self.register(Box::new(view), target).await;

        Ok(SentView {
            container_id,
            message: target,
        })
    }

    /// Number of containers currently accepting presses.
    pub async fn live_views(&self) -> usize {
        self.registry.lock().await.views.len()
    }

    /// Route a component press to its container.
    ///
    /// Returns `false` when the custom ID was not minted by this runtime.
    /// Presses on unknown, expired or disposed containers are acknowledged and
    /// otherwise ignored.
    pub async fn dispatch(&self, ctx: InteractionContext) -> bool {
        let Some((container_id, index)) = parse_custom_id(ctx.custom_id()) else {
            return false;
        };

        let Some(view) = self.lookup(container_id).await else {
            debug!(%container_id, "press on a container that is no longer live");
            acknowledge(&ctx).await;
            return true;
        };

        let mut view = view.lock().await;
        if !view.container().is_active() {
            drop(view);
            acknowledge(&ctx).await;
            return true;
        }

        let outcome = match view.container().authorize(index, ctx.invoking_user()) {
            Ok(()) => view.invoke(self, &ctx, index).await,
            Err(error) => Err(error),
        };

        let succeeded = outcome.is_ok();
        match outcome {
            Ok(()) => acknowledge(&ctx).await,
            Err(error) => view.handle_error(self, error, &ctx).await,
        }

        if view.container().is_active() {
            if succeeded {
                view.container_mut().arm(Instant::now());
                let timeout = view.container().timeout();
                self.schedule_timeout(container_id, timeout).await;
            }
        } else {
            drop(view);
            self.forget(container_id, true).await;
        }

        true
    }

    /// Dispose a container on request, stripping its components from the message.
    pub async fn dispose(&self, container_id: ContainerId) {
        let Some(view) = self.lookup(container_id).await else {
            return;
        };

        let detached = view.lock().await.container_mut().detach(ContainerState::Disposed);
        if let Some(message) = detached
            && let Err(source) = self.transport.clear_components(&message).await
            && !source.is_not_found()
        {
            warn!(?source, %container_id, "failed to clear disposed components");
        }

        self.forget(container_id, true).await;
    }

    async fn register(&self, mut view: Box<dyn View>, message: MessageHandle) {
        let container_id = view.container().id();
        let timeout = view.container().timeout();
        view.container_mut().activate(message);
        view.container_mut().arm(Instant::now());

        let replaced = {
            let mut registry = self.registry.lock().await;
            let previous = registry
                .by_message
                .insert(message.message_id, container_id)
                .filter(|previous| *previous != container_id);

            let replaced = match previous {
                Some(previous) => {
                    if let Some(timer) = registry.timers.remove(&previous) {
                        timer.abort();
                    }
                    registry.views.remove(&previous)
                }
                None => None,
            };

            registry
                .views
                .insert(container_id, Arc::new(Mutex::new(view)));
            replaced
        };

        if let Some(previous) = replaced {
            info!(
                message_id = message.message_id.get(),
                %container_id,
                "replacing the container attached to a message"
            );
            // The previous view may be the one currently dispatching this call.
            if let Ok(mut previous) = previous.try_lock() {
                previous.container_mut().detach(ContainerState::Disposed);
            }
        }

        self.schedule_timeout(container_id, timeout).await;
    }

    async fn schedule_timeout(&self, container_id: ContainerId, timeout: Duration) {
        let mut registry = self.registry.lock().await;
        if !registry.views.contains_key(&container_id) {
            return;
        }

        let runtime = self.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            runtime.expire(container_id).await;
        });

        if let Some(previous) = registry.timers.insert(container_id, task) {
            previous.abort();
        }
    }

    async fn expire(&self, container_id: ContainerId) {
        let Some(view) = self.lookup(container_id).await else {
            self.forget(container_id, false).await;
            return;
        };

        let mut view = view.lock().await;
        if view.container().is_active() && view.container().deadline_passed(Instant::now()) {
            debug!(%container_id, "component container timed out");
            view.handle_timeout(self).await;
        }

        let finished = !view.container().is_active();
        drop(view);
        if finished {
            self.forget(container_id, false).await;
        }
    }

    async fn lookup(&self, container_id: ContainerId) -> Option<SharedView> {
        self.registry
            .lock()
            .await
            .views
            .get(&container_id)
            .cloned()
    }

    async fn forget(&self, container_id: ContainerId, abort_timer: bool) {
        let mut registry = self.registry.lock().await;
        registry.views.remove(&container_id);
        registry.by_message.retain(|_, owner| *owner != container_id);

        if let Some(timer) = registry.timers.remove(&container_id)
            && abort_timer
        {
            timer.abort();
        }
    }
}

fn ensure_building<V: View>(view: &V) -> Result<(), InteractionError> {
    match view.container().state() {
        ContainerState::Building => Ok(()),
        state => Err(InteractionError::unhandled(anyhow::anyhow!(
            "container {} cannot be sent from state {state:?}",
            view.container().id()
        ))),
    }
}

async fn acknowledge(ctx: &InteractionContext) {
    if ctx.has_responded() {
        return;
    }

    if let Err(source) = ctx.defer_update().await {
        warn!(?source, "failed to acknowledge component interaction");
    }
}
