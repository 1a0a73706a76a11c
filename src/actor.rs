//! Error plumbing shared by all actors of the controller.

use act_zero::ActorError;
use std::fmt;
use tracing::error;
use tracing_error::SpanTrace;

/// Error returned from actor handlers, carrying the span trace of the place it
/// was raised at.
#[derive(Debug, thiserror::Error)]
pub struct Error {
    source: ErrorKind,
    span_trace: SpanTrace,
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Stops the actor that produced it.
    #[error(transparent)]
    Fatal(anyhow::Error),
    #[error(transparent)]
    NonFatal(#[from] anyhow::Error),
}

impl Error {
    pub fn fatal(source: anyhow::Error) -> Self {
        Self {
            source: ErrorKind::Fatal(source),
            span_trace: SpanTrace::capture(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self.source, ErrorKind::Fatal(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.source, fmt)
    }
}

impl<E> From<E> for Error
where
    ErrorKind: From<E>,
{
    fn from(source: E) -> Self {
        Self {
            source: ErrorKind::from(source),
            span_trace: SpanTrace::capture(),
        }
    }
}

/// Logs an actor error and returns whether the actor has to be stopped.
pub fn handle_error(error: ActorError) -> bool {
    let (error, stop_actor, span_trace) = match error.downcast_ref::<Error>() {
        Some(e) => (
            format!("{:?}", e.source),
            e.is_fatal(),
            Some(e.span_trace.to_string()),
        ),
        None => (format!("{:?}", error), false, None),
    };

    error!(
        %stop_actor,
        span_trace = span_trace.as_deref().unwrap_or("None"),
        "ActorError: {}",
        error
    );

    stop_actor
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_non_fatal_errors_keep_the_actor_alive() {
        let error: ActorError = Box::new(Error::from(anyhow!("director list failed")));

        assert!(!handle_error(error));
    }

    #[test]
    fn test_fatal_errors_stop_the_actor() {
        let error: ActorError = Box::new(Error::fatal(anyhow!("broken client")));

        assert!(handle_error(error));
    }

    #[test]
    fn test_foreign_errors_are_non_fatal() {
        let error: ActorError = "plain".into();

        assert!(!handle_error(error));
    }
}
