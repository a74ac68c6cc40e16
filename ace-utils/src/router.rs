//! Delivery of classified failures to the invoking user and the bot owner.
//!
//! [`route`] is the whole policy: the error kind alone decides whether the
//! invoker sees a notice (and how), and whether the owner gets a diagnostic.
//! [`ErrorRouter`] carries that policy out. Delivery failures are logged and
//! never propagated.

use std::{fmt::Write as _, sync::Arc, time::Duration};

use tracing::{error, info, warn};
use twilight_model::{
    channel::message::component::ButtonStyle,
    id::{
        Id,
        marker::{ChannelMarker, MessageMarker},
    },
};

use crate::components::{
    AuthorizedComponent, ButtonPolicy, ComponentRuntime, InteractionContext, Principal, ReplyView,
};
use crate::embed::diagnostic_embed;
use crate::errors::{ErrorKind, InteractionError};
use crate::redact::{default_prefixes, redact_paths};
use crate::transport::{OutgoingMessage, Transport};

/// Prefix of the public notice sent when an action failed unexpectedly.
pub const APOLOGY: &str = ":x: Something went wrong, the owner has been notified.";
/// How long precondition notices stay visible by default.
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(10);
/// How long the owner can dismiss a diagnostic before its button detaches.
pub const DEFAULT_DISMISS_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// How the invoker is told about a failure.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Notice {
    /// Visible to the invoker only; removed after the notice TTL when `expires`.
    Ephemeral { expires: bool },
    /// Visible to the channel.
    Public,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Route {
    pub user: Option<Notice>,
    pub owner_report: bool,
}

/// Routing table of the error taxonomy.
pub fn route(kind: ErrorKind) -> Route {
    match kind {
        ErrorKind::UnauthorizedInteraction => Route {
            user: Some(Notice::Ephemeral { expires: false }),
            owner_report: false,
        },
        ErrorKind::PreconditionUnmet => Route {
            user: Some(Notice::Ephemeral { expires: true }),
            owner_report: false,
        },
        ErrorKind::Unhandled | ErrorKind::ContentTooLarge => Route {
            user: Some(Notice::Public),
            owner_report: true,
        },
        ErrorKind::CapacityExceeded => Route {
            user: None,
            owner_report: true,
        },
    }
}

/// Where owner diagnostics go.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OwnerTarget {
    pub owner: Principal,
    /// Dedicated diagnostics channel; direct messages to the owner otherwise.
    pub channel: Option<Id<ChannelMarker>>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Destination {
    Channel(Id<ChannelMarker>),
    Unavailable,
}

impl OwnerTarget {
    pub async fn resolve(&self, transport: &dyn Transport) -> Destination {
        if let Some(channel_id) = self.channel {
            return Destination::Channel(channel_id);
        }

        match transport.open_direct_channel(self.owner).await {
            Ok(channel_id) => Destination::Channel(channel_id),
            Err(source) => {
                warn!(?source, owner = self.owner.get(), "cannot open owner direct messages");
                Destination::Unavailable
            }
        }
    }
}

/// A message command that failed, for [`ErrorRouter::report_command_error`].
#[derive(Clone, Debug)]
pub struct CommandOrigin {
    pub command: String,
    pub channel_id: Id<ChannelMarker>,
    pub message_id: Id<MessageMarker>,
    pub invoker: Principal,
}

#[derive(Clone, Debug)]
pub struct ErrorRouter {
    owner: OwnerTarget,
    redact_prefixes: Vec<String>,
    notice_ttl: Duration,
}

impl ErrorRouter {
    pub fn new(owner: OwnerTarget) -> Self {
        Self {
            owner,
            redact_prefixes: default_prefixes(),
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }

    /// Add path prefixes to strip on top of the build and working directories.
    pub fn with_redact_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.redact_prefixes
            .extend(prefixes.into_iter().map(Into::into));
        self
    }

    pub fn with_notice_ttl(mut self, ttl: Duration) -> Self {
        self.notice_ttl = ttl;
        self
    }

    pub fn notice_ttl(&self) -> Duration {
        self.notice_ttl
    }

    pub fn redact(&self, text: &str) -> String {
        redact_paths(text, &self.redact_prefixes)
    }

    /// Full owner-facing report: kind, message, causes and backtrace, path-redacted.
    pub fn diagnostic(&self, error: &InteractionError) -> String {
        let mut report = format!("{}: {}", error.kind(), error.summary());

        let causes = error.causes();
        if !causes.is_empty() {
            report.push_str("\n\nCaused by:");
            for (depth, cause) in causes.iter().enumerate() {
                let _ = write!(report, "\n    {depth}: {cause}");
            }
        }

        if let Some(backtrace) = error.backtrace() {
            report.push_str("\n\nBacktrace:\n");
            report.push_str(&backtrace);
        }

        self.redact(&report)
    }

    /// Handle a failure raised while a component press was processed.
    pub async fn dispatch(
        &self,
        runtime: &ComponentRuntime,
        error: InteractionError,
        ctx: &InteractionContext,
    ) {
        let kind = error.kind();
        let route = route(kind);
        info!(
            %kind,
            user = ctx.invoking_user().get(),
            custom_id = ctx.custom_id(),
            "component interaction failed"
        );

        if let Some(notice) = route.user {
            self.notify_interaction(ctx, &error, notice).await;
        }

        if route.owner_report {
            let origin = format!(
                "Component {} pressed by {}",
                ctx.custom_id(),
                ctx.invoking_user()
            );
            self.report_to_owner(runtime, &error, "component", &origin)
                .await;
        }
    }

    /// Handle a failure raised by a message command.
    ///
    /// User notices become replies to the command message; precondition replies
    /// delete themselves after the notice TTL.
    pub async fn report_command_error(
        &self,
        runtime: &ComponentRuntime,
        error: InteractionError,
        origin: &CommandOrigin,
    ) {
        let kind = error.kind();
        let route = route(kind);
        info!(
            %kind,
            command = %origin.command,
            user = origin.invoker.get(),
            "command failed"
        );

        if let Some(notice) = route.user {
            self.notify_channel(runtime.transport(), origin, &error, notice)
                .await;
        }

        if route.owner_report {
            let detail = format!("Command !{} invoked by {}", origin.command, origin.invoker);
            self.report_to_owner(runtime, &error, "command", &detail)
                .await;
        }
    }

    fn notice_text(&self, error: &InteractionError, notice: Notice) -> String {
        let summary = self.redact(&error.summary());
        match notice {
            Notice::Ephemeral { .. } => summary,
            Notice::Public => format!("{APOLOGY}\n> {summary}"),
        }
    }

    async fn notify_interaction(
        &self,
        ctx: &InteractionContext,
        error: &InteractionError,
        notice: Notice,
    ) {
        let ephemeral = matches!(notice, Notice::Ephemeral { .. });
        let handle = match ctx.respond(self.notice_text(error, notice), ephemeral).await {
            Ok(handle) => handle,
            Err(source) => {
                warn!(?source, kind = %error.kind(), "failed to notify the invoking user");
                return;
            }
        };

        if notice == (Notice::Ephemeral { expires: true }) {
            let transport = Arc::clone(ctx.transport());
            let interaction = ctx.interaction().clone();
            let ttl = self.notice_ttl;
            tokio::spawn(async move {
                tokio::time::sleep(ttl).await;
                if let Err(source) = transport.delete_reply(&interaction, handle).await
                    && !source.is_not_found()
                {
                    warn!(?source, "failed to remove expired notice");
                }
            });
        }
    }

    async fn notify_channel(
        &self,
        transport: &Arc<dyn Transport>,
        origin: &CommandOrigin,
        error: &InteractionError,
        notice: Notice,
    ) {
        let message =
            OutgoingMessage::text(self.notice_text(error, notice)).replying_to(origin.message_id);
        let sent = match transport.send_message(origin.channel_id, &message).await {
            Ok(sent) => sent,
            Err(source) => {
                warn!(?source, kind = %error.kind(), "failed to notify the command invoker");
                return;
            }
        };

        if notice == (Notice::Ephemeral { expires: true }) {
            let transport = Arc::clone(transport);
            let ttl = self.notice_ttl;
            tokio::spawn(async move {
                tokio::time::sleep(ttl).await;
                if let Err(source) = transport
                    .delete_message(sent.channel_id, sent.message_id)
                    .await
                    && !source.is_not_found()
                {
                    warn!(?source, "failed to remove expired notice");
                }
            });
        }
    }

    async fn report_to_owner(
        &self,
        runtime: &ComponentRuntime,
        error: &InteractionError,
        surface: &str,
        origin: &str,
    ) {
        let kind = error.kind();
        let report = self.diagnostic(error);

        let Destination::Channel(channel_id) = self.owner.resolve(runtime.transport().as_ref()).await
        else {
            error!(%kind, %report, "no owner destination, diagnostic dropped");
            return;
        };

        let title = match kind {
            ErrorKind::Unhandled => format!(":warning: Unhandled error in {surface}"),
            kind => format!(":warning: {kind} in {surface}"),
        };
        let embed = match diagnostic_embed(&title, &report, &self.redact(origin)) {
            Ok(embed) => embed,
            Err(source) => {
                error!(?source, %kind, %report, "failed to build diagnostic embed");
                return;
            }
        };

        let mut view = ReplyView::new(DEFAULT_DISMISS_TIMEOUT, self.owner.owner);
        let dismiss = AuthorizedComponent::quit_with(
            self.owner.owner,
            ButtonPolicy::new("Dismiss").style(ButtonStyle::Secondary),
        );
        if let Err(source) = view.add(dismiss) {
            error!(?source, "failed to attach dismiss control");
            return;
        }

        if let Err(source) = runtime
            .send(view, channel_id, OutgoingMessage::embed(embed))
            .await
        {
            error!(?source, %kind, %report, "failed to deliver owner diagnostic");
        }
    }
}
