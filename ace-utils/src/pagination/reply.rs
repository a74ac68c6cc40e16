//! Send text as a single deletable reply, or paginate it when it does not fit.

use std::time::Duration;

use tracing::debug;
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, MessageMarker},
};

use super::session::{MAX_MESSAGE_LENGTH, PaginatorSession};
use crate::components::{
    AuthorizedComponent, ButtonPolicy, ComponentRuntime, Principal, ReplyView, SentView,
};
use crate::errors::InteractionError;
use crate::transport::OutgoingMessage;

/// Lines per page tried first when content has to be paginated.
pub const DEFAULT_LINES_PER_PAGE: usize = 20;

/// Where a reply goes and who may operate it.
#[derive(Clone, Copy, Debug)]
pub struct ReplyTarget {
    pub channel_id: Id<ChannelMarker>,
    /// Command message being answered; removed together with the reply on delete.
    pub reply_to: Option<Id<MessageMarker>>,
    pub principal: Principal,
}

/// Reply with `prefix + content + suffix`.
///
/// Content that fits in one message gets a "Delete" control that also removes
/// the command message. Longer content is paginated by lines.
pub async fn reply(
    runtime: &ComponentRuntime,
    target: ReplyTarget,
    content: &str,
    prefix: &str,
    suffix: &str,
    timeout: Duration,
) -> Result<SentView, InteractionError> {
    let rendered = format!("{prefix}{content}{suffix}");
    if rendered.chars().count() <= MAX_MESSAGE_LENGTH {
        let mut view = ReplyView::new(timeout, target.principal);
        view.add(AuthorizedComponent::quit_with(
            target.principal,
            ButtonPolicy::new("Delete")
                .emoji("🗑️")
                .require_reference_deletion(true),
        ))?;

        let mut message = OutgoingMessage::text(rendered);
        message.reply_to = target.reply_to;
        return runtime.send(view, target.channel_id, message).await;
    }

    let session = fit_session(content, prefix, suffix)?;
    debug!(
        pages = session.pages().len(),
        lines_per_page = session.max_lines_per_page(),
        "paginating oversized reply"
    );

    session
        .start(
            runtime,
            target.principal,
            timeout,
            target.channel_id,
            target.reply_to,
        )
        .await
}

/// Paginate `content` with the largest page size, starting at
/// [`DEFAULT_LINES_PER_PAGE`] and halving down to one line, whose every page fits.
pub fn fit_session(
    content: &str,
    prefix: &str,
    suffix: &str,
) -> Result<PaginatorSession, InteractionError> {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut lines_per_page = DEFAULT_LINES_PER_PAGE;

    loop {
        let session = PaginatorSession::paginate(lines.iter().copied(), prefix, suffix, lines_per_page);
        match session.validate() {
            Ok(()) => return Ok(session),
            Err(error) if lines_per_page == 1 => return Err(error),
            Err(_) => lines_per_page /= 2,
        }
    }
}
