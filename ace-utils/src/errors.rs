//! Classified failures raised by component callbacks and reply helpers.
//!
//! Every error that leaves a component callback is one of these kinds. The
//! kind alone decides where the error router sends it (see [`crate::router`]).

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;

use crate::transport::TransportError;

/// Default notice shown when someone presses a button that is not theirs.
pub const NOT_YOUR_BUTTON_MESSAGE: &str = "This is not your instance/button!";

/// Discriminant of [`InteractionError`], used for routing decisions.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    UnauthorizedInteraction,
    PreconditionUnmet,
    CapacityExceeded,
    ContentTooLarge,
    Unhandled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnauthorizedInteraction => "UnauthorizedInteraction",
            Self::PreconditionUnmet => "PreconditionUnmet",
            Self::CapacityExceeded => "CapacityExceeded",
            Self::ContentTooLarge => "ContentTooLarge",
            Self::Unhandled => "Unhandled",
        };
        f.write_str(name)
    }
}

/// External state an action needs before it can run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Precondition {
    /// Caller has to be connected to a voice channel.
    InVoiceChannel,
    /// Caller has to be inside a tracked party channel.
    InParty,
    /// Caller has to own the party they are in.
    PartyOwner,
    /// Free-form requirement with its own notice text.
    Custom(String),
}

impl Precondition {
    /// User-facing notice for this unmet requirement.
    pub fn notice(&self) -> String {
        match self {
            Self::InVoiceChannel => ":warning: You are not in a vc !".to_owned(),
            Self::InParty => ":warning: You are not in a party !".to_owned(),
            Self::PartyOwner => ":warning: You do not own this party !".to_owned(),
            Self::Custom(text) => format!(":warning: {text}"),
        }
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.notice())
    }
}

/// Failure raised anywhere in the component callback chain.
#[derive(Debug, thiserror::Error)]
pub enum InteractionError {
    #[error("{}", .reason.as_deref().unwrap_or(NOT_YOUR_BUTTON_MESSAGE))]
    UnauthorizedInteraction { reason: Option<String> },

    #[error("{0}")]
    PreconditionUnmet(Precondition),

    #[error("a message holds at most {limit} components")]
    CapacityExceeded { limit: usize },

    #[error("rendered content is {length} characters, the limit is {limit}")]
    ContentTooLarge { length: usize, limit: usize },

    #[error("{source}")]
    Unhandled {
        #[source]
        source: anyhow::Error,
        /// Where the failure was classified; used when `source` has no trace.
        trace: Box<Backtrace>,
    },
}

impl InteractionError {
    /// Build an unauthorized error with an optional custom notice.
    pub fn unauthorized(reason: Option<impl Into<String>>) -> Self {
        Self::UnauthorizedInteraction {
            reason: reason.map(Into::into),
        }
    }

    /// Build an unmet-precondition error.
    pub fn precondition(precondition: Precondition) -> Self {
        Self::PreconditionUnmet(precondition)
    }

    /// Wrap any failure as an unhandled error.
    pub fn unhandled(source: impl Into<anyhow::Error>) -> Self {
        Self::Unhandled {
            source: source.into(),
            trace: Box::new(Backtrace::force_capture()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnauthorizedInteraction { .. } => ErrorKind::UnauthorizedInteraction,
            Self::PreconditionUnmet(_) => ErrorKind::PreconditionUnmet,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::ContentTooLarge { .. } => ErrorKind::ContentTooLarge,
            Self::Unhandled { .. } => ErrorKind::Unhandled,
        }
    }

    /// Short, argument-only text safe to show the invoking user.
    ///
    /// Never includes the cause chain or a backtrace.
    pub fn summary(&self) -> String {
        self.to_string()
    }

    /// Cause chain below the top-level message, outermost first.
    pub fn causes(&self) -> Vec<String> {
        match self {
            Self::Unhandled { source, .. } => source.chain().skip(1).map(ToString::to_string).collect(),
            _ => Vec::new(),
        }
    }

    /// Backtrace of an unhandled error.
    ///
    /// Prefers the trace `anyhow` recorded at the origin and falls back to the
    /// one captured when the error was classified, whatever `RUST_BACKTRACE` says.
    pub fn backtrace(&self) -> Option<String> {
        let Self::Unhandled { source, trace } = self else {
            return None;
        };

        let backtrace = match source.backtrace() {
            origin if origin.status() == BacktraceStatus::Captured => origin,
            _ => trace.as_ref(),
        };
        (backtrace.status() == BacktraceStatus::Captured).then(|| backtrace.to_string())
    }
}

impl From<anyhow::Error> for InteractionError {
    fn from(source: anyhow::Error) -> Self {
        match source.downcast::<InteractionError>() {
            Ok(classified) => classified,
            Err(source) => Self::unhandled(source),
        }
    }
}

impl From<TransportError> for InteractionError {
    fn from(source: TransportError) -> Self {
        Self::unhandled(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_defaults_to_standard_notice() {
        let error = InteractionError::unauthorized(None::<String>);
        assert_eq!(error.to_string(), NOT_YOUR_BUTTON_MESSAGE);
        assert_eq!(error.kind(), ErrorKind::UnauthorizedInteraction);

        let custom = InteractionError::unauthorized(Some("Only the owner can refresh stats manually"));
        assert_eq!(custom.summary(), "Only the owner can refresh stats manually");
    }

    #[test]
    fn anyhow_wrapping_a_classified_error_keeps_its_kind() {
        let wrapped = anyhow::Error::new(InteractionError::precondition(Precondition::InParty));
        let error = InteractionError::from(wrapped);
        assert_eq!(error.kind(), ErrorKind::PreconditionUnmet);
        assert_eq!(error.summary(), ":warning: You are not in a party !");
    }

    #[test]
    fn foreign_errors_become_unhandled_with_their_chain() {
        let source = anyhow::anyhow!("socket closed").context("fetching statistics");
        let error = InteractionError::from(source);
        assert_eq!(error.kind(), ErrorKind::Unhandled);
        assert_eq!(error.summary(), "fetching statistics");
        assert_eq!(error.causes(), vec!["socket closed".to_owned()]);
    }

    #[test]
    fn unhandled_errors_always_carry_a_backtrace() {
        let built = InteractionError::unhandled(anyhow::anyhow!("boom"));
        let converted = InteractionError::from(anyhow::anyhow!("boom"));
        let transport = InteractionError::from(TransportError::Forbidden);

        for error in [built, converted, transport] {
            assert!(error.backtrace().is_some_and(|trace| !trace.is_empty()));
        }
    }

    #[test]
    fn classified_errors_have_no_chain() {
        let error = InteractionError::ContentTooLarge {
            length: 2100,
            limit: 2000,
        };
        assert!(error.causes().is_empty());
        assert!(error.backtrace().is_none());
    }
}
