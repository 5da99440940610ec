use std::error::Error as StdError;
use std::fmt::{self, Debug};

use thiserror::Error;

type BoxError = Box<dyn StdError + Send + Sync>;

/// The phase of a transaction an action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The forward phase.
    Commit,
    /// The compensating phase.
    Rollback,
}

impl Stage {
    /// Lowercase name used in error messages and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Rollback => "rollback",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of failure kinds, for callers that only care about the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// See [`TxError::CannotCommit`].
    CannotCommit,
    /// See [`TxError::CannotRollback`].
    CannotRollback,
    /// See [`TxError::ActionFailed`].
    ActionFailed,
}

/// Error from transaction execution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TxError<E: Debug> {
    /// Commit was refused because no rollback actions are registered.
    #[error("tx-keeper: cannot do commit: rollback function is not set")]
    CannotCommit,

    /// Rollback was refused because no rollback actions are registered.
    #[error("tx-keeper: cannot do rollback: rollback function is not set")]
    CannotRollback,

    /// An action returned an error. Actions after it were not invoked.
    #[error("tx-keeper: error {stage} on func {index}: {source}")]
    ActionFailed {
        /// Group the failing action belongs to.
        stage: Stage,
        /// Zero-based position of the failing action within its group.
        index: usize,
        /// The error returned by the action.
        #[source]
        source: E,
    },
}

impl<E: Debug> TxError<E> {
    /// Category of this error, for equality checks.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CannotCommit => ErrorKind::CannotCommit,
            Self::CannotRollback => ErrorKind::CannotRollback,
            Self::ActionFailed { .. } => ErrorKind::ActionFailed,
        }
    }

    /// Stage of the failing action, if an action failed.
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::ActionFailed { stage, .. } => Some(*stage),
            Self::CannotCommit | Self::CannotRollback => None,
        }
    }

    /// Index of the failing action, if an action failed.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::ActionFailed { index, .. } => Some(*index),
            Self::CannotCommit | Self::CannotRollback => None,
        }
    }

    /// Take back the error returned by the failing action.
    #[must_use]
    pub fn into_source(self) -> Option<E> {
        match self {
            Self::ActionFailed { source, .. } => Some(source),
            Self::CannotCommit | Self::CannotRollback => None,
        }
    }
}

/// Why a [`Context`](crate::Context) says work should stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The context or one of its clones was cancelled.
    #[error("context cancelled")]
    Cancelled,
    /// The context's deadline has passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Error type for actions that do not declare their own.
///
/// Wraps any boxed error and forwards `Display` and `source()` to it, so a
/// `TxError<ActionError>` works with `?` into `anyhow::Result` or
/// `Box<dyn Error>`.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ActionError(BoxError);

impl ActionError {
    /// Wrap any error.
    #[must_use]
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Box::new(error))
    }

    /// Build an error from a message alone.
    #[must_use]
    pub fn msg(message: impl fmt::Display) -> Self {
        Self(message.to_string().into())
    }

    /// Borrow the wrapped error as `T`, if that is its type.
    #[must_use]
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Hand back the wrapped error.
    #[must_use]
    pub fn into_inner(self) -> BoxError {
        self.0
    }
}

impl From<BoxError> for ActionError {
    fn from(error: BoxError) -> Self {
        Self(error)
    }
}

impl From<String> for ActionError {
    fn from(message: String) -> Self {
        Self(message.into())
    }
}

impl From<&str> for ActionError {
    fn from(message: &str) -> Self {
        Self(message.into())
    }
}

impl From<ContextError> for ActionError {
    fn from(error: ContextError) -> Self {
        Self::new(error)
    }
}

impl From<std::io::Error> for ActionError {
    fn from(error: std::io::Error) -> Self {
        Self::new(error)
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("{0}")]
    struct TestError(String);

    #[test]
    fn precondition_errors_have_fixed_messages() {
        let commit: TxError<TestError> = TxError::CannotCommit;
        let rollback: TxError<TestError> = TxError::CannotRollback;

        assert_eq!(
            commit.to_string(),
            "tx-keeper: cannot do commit: rollback function is not set"
        );
        assert_eq!(
            rollback.to_string(),
            "tx-keeper: cannot do rollback: rollback function is not set"
        );
    }

    #[test]
    fn action_failed_message_includes_stage_index_and_source() {
        let err = TxError::ActionFailed {
            stage: Stage::Commit,
            index: 0,
            source: TestError("some error".to_string()),
        };

        assert_eq!(err.to_string(), "tx-keeper: error commit on func 0: some error");
    }

    #[test]
    fn action_failed_exposes_source() {
        let err = TxError::ActionFailed {
            stage: Stage::Rollback,
            index: 3,
            source: TestError("boom".to_string()),
        };

        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("boom"));
        assert_eq!(err.kind(), ErrorKind::ActionFailed);
        assert_eq!(err.stage(), Some(Stage::Rollback));
        assert_eq!(err.index(), Some(3));
        assert_eq!(err.into_source(), Some(TestError("boom".to_string())));
    }

    #[test]
    fn kind_distinguishes_preconditions() {
        let commit: TxError<TestError> = TxError::CannotCommit;
        let rollback: TxError<TestError> = TxError::CannotRollback;

        assert_eq!(commit.kind(), ErrorKind::CannotCommit);
        assert_eq!(rollback.kind(), ErrorKind::CannotRollback);
        assert!(commit.stage().is_none());
        assert!(rollback.into_source().is_none());
    }

    #[test]
    fn action_error_is_transparent() {
        let err = ActionError::new(ContextError::Cancelled);

        assert_eq!(err.to_string(), "context cancelled");
        assert_eq!(err.downcast_ref::<ContextError>(), Some(&ContextError::Cancelled));
        assert!(err.downcast_ref::<TestError>().is_none());
    }

    #[test]
    fn action_error_from_message() {
        let from_str = ActionError::from("disk full");
        let from_msg = ActionError::msg(format_args!("disk {}", "full"));

        assert_eq!(from_str.to_string(), "disk full");
        assert_eq!(from_msg.into_inner().to_string(), "disk full");
    }

    #[test]
    fn tx_error_with_action_error_is_std_error() {
        let err: TxError<ActionError> = TxError::ActionFailed {
            stage: Stage::Commit,
            index: 1,
            source: ActionError::msg("payment declined"),
        };

        let boxed: Box<dyn StdError + Send + Sync> = Box::new(err);
        assert_eq!(
            boxed.to_string(),
            "tx-keeper: error commit on func 1: payment declined"
        );
        let source = boxed.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("payment declined"));
    }

    #[test]
    fn stage_displays_lowercase_name() {
        assert_eq!(Stage::Commit.to_string(), "commit");
        assert_eq!(Stage::Rollback.to_string(), "rollback");
    }
}
