//! Owner-gated, self-expiring message components.
//!
//! A command builds a [`ComponentContainer`] (usually through a [`View`]
//! implementation), adds [`AuthorizedComponent`]s, and hands it to
//! [`ComponentRuntime::send`]. From then on the runtime owns it: taps are routed
//! back through [`ComponentRuntime::dispatch`], failures go to the error router
//! and the container detaches itself once it times out or is quit.

mod component;
mod container;
mod context;
mod runtime;
mod view;

pub use component::{
    AuthorizedComponent, ButtonPolicy, ComponentAction, ComponentCallback, Principal, callback,
};
pub use container::{
    COMPONENTS_PER_ROW, ComponentContainer, ContainerId, ContainerState,
    MAX_COMPONENTS_PER_MESSAGE,
};
pub use context::InteractionContext;
pub use runtime::{ComponentRuntime, SentView};
pub use view::{ReplyView, View};

/// Prefix of every custom ID minted by the runtime.
pub const CUSTOM_ID_PREFIX: &str = "acv";

/// Build the custom ID for the component at `index` in a container.
pub fn build_custom_id(container_id: ContainerId, index: usize) -> String {
    format!("{CUSTOM_ID_PREFIX}:{container_id}:{index}")
}

/// Parse a runtime custom ID back into its container and component index.
pub fn parse_custom_id(custom_id: &str) -> Option<(ContainerId, usize)> {
    let mut parts = custom_id.split(':');

    if parts.next()? != CUSTOM_ID_PREFIX {
        return None;
    }

    let container_id = parts.next()?.parse::<ContainerId>().ok()?;
    let index = parts.next()?.parse::<usize>().ok()?;

    if parts.next().is_some() {
        return None;
    }

    Some((container_id, index))
}
