//! Stable facade for splitting long text into navigable pages.

mod page;
mod reply;
mod session;
mod view;

pub use page::{clamp_page, page_window, parse_one_based_page, total_pages};
pub use reply::{DEFAULT_LINES_PER_PAGE, ReplyTarget, fit_session, reply};
pub use session::{MAX_MESSAGE_LENGTH, Page, PaginatorSession};
pub use view::PaginatorView;
