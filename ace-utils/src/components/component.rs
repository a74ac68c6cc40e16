use std::{fmt, future::Future, sync::Arc};

use async_trait::async_trait;
use twilight_model::{
    channel::message::{
        EmojiReactionType,
        component::{Button, ButtonStyle, Component},
    },
    id::{Id, marker::UserMarker},
};

use super::context::InteractionContext;
use crate::errors::InteractionError;

/// Identity allowed to operate a component.
pub type Principal = Id<UserMarker>;

/// Side effect bound to a component.
#[async_trait]
pub trait ComponentCallback: Send + Sync {
    async fn call(&self, ctx: InteractionContext) -> Result<(), InteractionError>;
}

struct FnCallback<F>(F);

#[async_trait]
impl<F, Fut> ComponentCallback for FnCallback<F>
where
    F: Fn(InteractionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), InteractionError>> + Send,
{
    async fn call(&self, ctx: InteractionContext) -> Result<(), InteractionError> {
        (self.0)(ctx).await
    }
}

/// Wrap an async closure as a component callback.
pub fn callback<F, Fut>(f: F) -> Arc<dyn ComponentCallback>
where
    F: Fn(InteractionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), InteractionError>> + Send + 'static,
{
    Arc::new(FnCallback(f))
}

/// What pressing a component does once the gate has passed.
#[derive(Clone)]
pub enum ComponentAction {
    /// Delete the attached message and dispose the container.
    Quit,
    /// Paginator navigation, only meaningful inside a paginator view.
    Previous,
    Next,
    Callback(Arc<dyn ComponentCallback>),
}

impl fmt::Debug for ComponentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quit => f.write_str("Quit"),
            Self::Previous => f.write_str("Previous"),
            Self::Next => f.write_str("Next"),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Presentation and failure policy of a button.
#[derive(Clone, Debug)]
pub struct ButtonPolicy {
    pub style: ButtonStyle,
    pub label: String,
    pub emoji: Option<String>,
    /// Quit also deletes the message the attached message replies to.
    pub require_reference_deletion: bool,
    /// Notice shown to anyone but the owner; `None` uses the standard text.
    pub denial_reason: Option<String>,
    pub disabled: bool,
}

impl ButtonPolicy {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            style: ButtonStyle::Secondary,
            label: label.into(),
            emoji: None,
            require_reference_deletion: false,
            denial_reason: None,
            disabled: false,
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = style;
        self
    }

    pub fn emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    pub fn require_reference_deletion(mut self, enabled: bool) -> Self {
        self.require_reference_deletion = enabled;
        self
    }

    pub fn denial_reason(mut self, reason: impl Into<String>) -> Self {
        self.denial_reason = Some(reason.into());
        self
    }
}

/// A button bound to the one principal allowed to press it.
#[derive(Clone, Debug)]
pub struct AuthorizedComponent {
    owner: Option<Principal>,
    policy: ButtonPolicy,
    action: ComponentAction,
}

impl AuthorizedComponent {
    /// Bind an action to `owner`; anyone else gets an unauthorized notice.
    pub fn bind(owner: Principal, policy: ButtonPolicy, action: ComponentAction) -> Self {
        Self {
            owner: Some(owner),
            policy,
            action,
        }
    }

    /// A component anyone may press.
    pub fn public(policy: ButtonPolicy, action: ComponentAction) -> Self {
        Self {
            owner: None,
            policy,
            action,
        }
    }

    /// The standard red "Quit" control.
    pub fn quit(owner: Principal) -> Self {
        Self::quit_with(owner, ButtonPolicy::new("Quit").style(ButtonStyle::Danger))
    }

    pub fn quit_with(owner: Principal, policy: ButtonPolicy) -> Self {
        Self::bind(owner, policy, ComponentAction::Quit)
    }

    pub fn owner(&self) -> Option<Principal> {
        self.owner
    }

    pub fn policy(&self) -> &ButtonPolicy {
        &self.policy
    }

    pub fn action(&self) -> &ComponentAction {
        &self.action
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.policy.disabled = disabled;
    }

    /// Check `actor` against the bound owner.
    ///
    /// `container_public` lifts the gate for every component of the container.
    pub fn authorize(&self, actor: Principal, container_public: bool) -> Result<(), InteractionError> {
        match self.owner {
            Some(owner) if !container_public && owner != actor => {
                Err(InteractionError::unauthorized(self.policy.denial_reason.clone()))
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn render(&self, custom_id: String) -> Component {
        Component::Button(Button {
            id: None,
            custom_id: Some(custom_id),
            disabled: self.policy.disabled,
            emoji: self
                .policy
                .emoji
                .clone()
                .map(|name| EmojiReactionType::Unicode { name }),
            label: Some(self.policy.label.clone()),
            style: self.policy.style,
            url: None,
            sku_id: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorKind, NOT_YOUR_BUTTON_MESSAGE};

    fn user(id: u64) -> Principal {
        Id::new(id)
    }

    #[test]
    fn gate_rejects_everyone_but_the_owner() {
        let quit = AuthorizedComponent::quit(user(1));
        assert_eq!(quit.owner(), Some(user(1)));

        assert!(quit.authorize(user(1), false).is_ok());

        let denied = quit.authorize(user(2), false).unwrap_err();
        assert_eq!(denied.kind(), ErrorKind::UnauthorizedInteraction);
        assert_eq!(denied.summary(), NOT_YOUR_BUTTON_MESSAGE);
    }

    #[test]
    fn gate_carries_the_denial_reason() {
        let refresh = AuthorizedComponent::bind(
            user(1),
            ButtonPolicy::new("Refresh").denial_reason("Only the owner can refresh stats manually"),
            ComponentAction::Quit,
        );

        let denied = refresh.authorize(user(9), false).unwrap_err();
        assert_eq!(denied.summary(), "Only the owner can refresh stats manually");
    }

    #[test]
    fn public_components_and_containers_skip_the_gate() {
        let open = AuthorizedComponent::public(ButtonPolicy::new("See more"), ComponentAction::Next);
        assert_eq!(open.owner(), None);
        assert!(open.authorize(user(42), false).is_ok());

        let gated = AuthorizedComponent::quit(user(1));
        assert!(gated.authorize(user(42), true).is_ok());
    }

    #[test]
    fn render_reflects_policy() {
        let mut component = AuthorizedComponent::quit_with(
            user(1),
            ButtonPolicy::new("Delete").emoji("🗑️"),
        );
        component.set_disabled(true);

        let Component::Button(button) = component.render("acv:x:0".to_owned()) else {
            panic!("expected a button");
        };
        assert_eq!(button.label.as_deref(), Some("Delete"));
        assert_eq!(button.custom_id.as_deref(), Some("acv:x:0"));
        assert!(button.disabled);
        assert_eq!(button.style, ButtonStyle::Secondary);
        assert!(matches!(button.emoji, Some(EmojiReactionType::Unicode { ref name }) if name == "🗑️"));
    }
}
