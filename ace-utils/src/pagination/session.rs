use std::time::Duration;

use twilight_model::id::{
    Id,
    marker::{ChannelMarker, MessageMarker},
};

use super::page::{page_window, total_pages};
use super::view::PaginatorView;
use crate::components::{ComponentRuntime, Principal, SentView};
use crate::errors::InteractionError;
use crate::transport::OutgoingMessage;

/// Platform cap on message content, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// One bounded slice of a session's lines.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Page {
    lines: Vec<String>,
    index: usize,
    total_pages: usize,
}

impl Page {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Zero-based position in the session.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.total_pages
    }
}

/// Cursor over the pages of one oversized reply.
#[derive(Clone, Debug)]
pub struct PaginatorSession {
    pages: Vec<Page>,
    prefix: String,
    suffix: String,
    max_lines_per_page: usize,
    current: usize,
}

impl PaginatorSession {
    /// Split `lines` into consecutive pages of at most `max_lines_per_page` lines.
    ///
    /// Order is preserved and only the last page can be shorter. Empty input
    /// still yields a single empty page.
    pub fn paginate<I, S>(
        lines: I,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        max_lines_per_page: usize,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        let max_lines_per_page = max_lines_per_page.max(1);
        let total = total_pages(lines.len(), max_lines_per_page).max(1);

        let pages = (0..total)
            .map(|index| {
                let (start, end) = page_window(lines.len(), max_lines_per_page, index + 1);
                Page {
                    lines: lines[start..end].to_vec(),
                    index,
                    total_pages: total,
                }
            })
            .collect();

        Self {
            pages,
            prefix: prefix.into(),
            suffix: suffix.into(),
            max_lines_per_page,
            current: 0,
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn max_lines_per_page(&self) -> usize {
        self.max_lines_per_page
    }

    pub fn current(&self) -> &Page {
        &self.pages[self.current]
    }

    /// Move forward one page; stays put on the last page.
    pub fn next(&mut self) -> &Page {
        if self.current + 1 < self.pages.len() {
            self.current += 1;
        }
        self.current()
    }

    /// Move back one page; stays put on the first page.
    pub fn prev(&mut self) -> &Page {
        self.current = self.current.saturating_sub(1);
        self.current()
    }

    /// `prefix + lines joined by newlines + suffix`, within the message size cap.
    pub fn render(&self, page: &Page) -> Result<String, InteractionError> {
        let rendered = format!("{}{}{}", self.prefix, page.lines.join("\n"), self.suffix);

        let length = rendered.chars().count();
        if length > MAX_MESSAGE_LENGTH {
            return Err(InteractionError::ContentTooLarge {
                length,
                limit: MAX_MESSAGE_LENGTH,
            });
        }

        Ok(rendered)
    }

    pub fn render_current(&self) -> Result<String, InteractionError> {
        self.render(self.current())
    }

    /// Check that every page renders within the size cap.
    pub fn validate(&self) -> Result<(), InteractionError> {
        self.pages
            .iter()
            .try_for_each(|page| self.render(page).map(drop))
    }

    /// Send the first page with its navigation controls and hand it to the runtime.
    pub async fn start(
        self,
        runtime: &ComponentRuntime,
        principal: Principal,
        timeout: Duration,
        channel_id: Id<ChannelMarker>,
        reply_to: Option<Id<MessageMarker>>,
    ) -> Result<SentView, InteractionError> {
        self.validate()?;

        let view = PaginatorView::new(self, timeout, principal)?;
        let mut message = view.page_message()?;
        message.reply_to = reply_to;

        runtime.send(view, channel_id, message).await
    }

    pub(crate) fn message_for_current(&self) -> Result<OutgoingMessage, InteractionError> {
        Ok(OutgoingMessage::text(self.render_current()?))
    }
}
