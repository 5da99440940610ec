use std::fmt::{self, Debug};

use tracing::{debug, warn};

use crate::action::{Action, Commit, Rollback};
use crate::audit::ExecutionLog;
use crate::config::TransactionConfig;
use crate::context::Context;
use crate::error::{ActionError, Stage, TxError};

/// A set of commit actions paired with the rollback actions that undo them.
///
/// Commit and rollback run their groups strictly in registration order and
/// stop at the first failing action. Neither calls the other: after a failed
/// commit the caller decides whether to run [`do_rollback`]. Nothing marks a
/// transaction as executed, so every call re-runs its whole group.
///
/// [`do_rollback`]: Transaction::do_rollback
pub struct Transaction<Ctx = Context, E = ActionError> {
    commit: Commit<Ctx, E>,
    rollback: Rollback<Ctx, E>,
    check_rollback: bool,
}

impl<Ctx, E> Transaction<Ctx, E> {
    /// Create a transaction with empty groups that refuses to commit until
    /// rollback actions are registered.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TransactionConfig::default())
    }

    /// Create a transaction with empty groups using the given settings.
    #[must_use]
    pub fn with_config(config: TransactionConfig) -> Self {
        Self {
            commit: Commit::default(),
            rollback: Rollback::default(),
            check_rollback: config.check_rollback(),
        }
    }

    /// Replace the commit group.
    #[must_use]
    pub fn with_commit(mut self, commit: Commit<Ctx, E>) -> Self {
        self.set_commit(commit);
        self
    }

    /// Replace the rollback group.
    #[must_use]
    pub fn with_rollback(mut self, rollback: Rollback<Ctx, E>) -> Self {
        self.set_rollback(rollback);
        self
    }

    /// Replace the commit group in place.
    pub fn set_commit(&mut self, commit: Commit<Ctx, E>) {
        self.commit = commit;
    }

    /// Replace the rollback group in place.
    pub fn set_rollback(&mut self, rollback: Rollback<Ctx, E>) {
        self.rollback = rollback;
    }

    /// Registered commit actions.
    #[must_use]
    pub fn commit(&self) -> &Commit<Ctx, E> {
        &self.commit
    }

    /// Registered rollback actions.
    #[must_use]
    pub fn rollback(&self) -> &Rollback<Ctx, E> {
        &self.rollback
    }

    /// Whether commit is refused while the rollback group is empty.
    #[must_use]
    pub fn check_rollback(&self) -> bool {
        self.check_rollback
    }
}

impl<Ctx, E: Debug> Transaction<Ctx, E> {
    /// Run every commit action in order.
    ///
    /// # Errors
    ///
    /// Returns `TxError::CannotCommit` without invoking anything if the
    /// rollback check is enabled and no rollback actions are registered.
    /// Returns `TxError::ActionFailed` for the first action that fails; the
    /// actions after it are not invoked.
    pub fn do_commit(&self, ctx: &Ctx) -> Result<(), TxError<E>> {
        self.commit_internal(ctx, None)
    }

    /// Run every commit action and return the result together with a log of
    /// what was invoked.
    pub fn do_commit_with_log(&self, ctx: &Ctx) -> (Result<(), TxError<E>>, ExecutionLog) {
        let mut log = ExecutionLog::new(Stage::Commit);
        let result = self.commit_internal(ctx, Some(&mut log));
        (result, log)
    }

    /// Run every rollback action in order.
    ///
    /// # Errors
    ///
    /// Returns `TxError::CannotRollback` without invoking anything if no
    /// rollback actions are registered, regardless of configuration.
    /// Returns `TxError::ActionFailed` for the first action that fails; the
    /// actions after it are not invoked.
    pub fn do_rollback(&self, ctx: &Ctx) -> Result<(), TxError<E>> {
        self.rollback_internal(ctx, None)
    }

    /// Run every rollback action and return the result together with a log of
    /// what was invoked.
    pub fn do_rollback_with_log(&self, ctx: &Ctx) -> (Result<(), TxError<E>>, ExecutionLog) {
        let mut log = ExecutionLog::new(Stage::Rollback);
        let result = self.rollback_internal(ctx, Some(&mut log));
        (result, log)
    }

    fn commit_internal(
        &self,
        ctx: &Ctx,
        log: Option<&mut ExecutionLog>,
    ) -> Result<(), TxError<E>> {
        if self.check_rollback && self.rollback.is_empty() {
            warn!(
                commit_actions = self.commit.len(),
                "refusing to commit: no rollback actions registered"
            );
            return Err(TxError::CannotCommit);
        }

        run_actions(Stage::Commit, self.commit.actions(), ctx, log)
    }

    fn rollback_internal(
        &self,
        ctx: &Ctx,
        log: Option<&mut ExecutionLog>,
    ) -> Result<(), TxError<E>> {
        if self.rollback.is_empty() {
            warn!("refusing to roll back: no rollback actions registered");
            return Err(TxError::CannotRollback);
        }

        run_actions(Stage::Rollback, self.rollback.actions(), ctx, log)
    }
}

/// Invoke `actions` in order, stopping at the first failure. Records are only
/// built when a log is passed in.
fn run_actions<Ctx, E: Debug>(
    stage: Stage,
    actions: &[Action<Ctx, E>],
    ctx: &Ctx,
    mut log: Option<&mut ExecutionLog>,
) -> Result<(), TxError<E>> {
    for (index, action) in actions.iter().enumerate() {
        debug!(%stage, index, action = action.name(), "running action");
        if let Some(log) = log.as_deref_mut() {
            log.record_start(index, action.label(index));
        }

        if let Err(source) = action.invoke(ctx) {
            debug!(%stage, index, error = ?source, "action failed");

            if let Some(log) = log.as_deref_mut() {
                log.record_failure();
                for (skipped, rest) in actions.iter().enumerate().skip(index + 1) {
                    log.record_skipped(skipped, rest.label(skipped));
                }
            }

            return Err(TxError::ActionFailed {
                stage,
                index,
                source,
            });
        }

        if let Some(log) = log.as_deref_mut() {
            log.record_success();
        }
    }

    debug!(%stage, count = actions.len(), "all actions completed");
    Ok(())
}

impl<Ctx, E> Default for Transaction<Ctx, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx, E> Debug for Transaction<Ctx, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("commit", &self.commit)
            .field("rollback", &self.rollback)
            .field("check_rollback", &self.check_rollback)
            .finish()
    }
}
