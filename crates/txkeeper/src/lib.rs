//! Ordered commit and rollback actions for non-transactional side effects.
//!
//! A [`Transaction`] pairs a group of commit actions with a group of rollback
//! actions that undo them. Commit runs its actions in order and stops at the
//! first failure; the caller then decides whether to run rollback. By default
//! commit is refused until at least one rollback action is registered.
//!
//! ```
//! use txkeeper::{Commit, Context, Rollback, Transaction};
//!
//! let tx: Transaction = Transaction::new()
//!     .with_commit(Commit::new(|_: &Context, _: &[serde_json::Value]| Ok(()), ["insert"]))
//!     .with_rollback(Rollback::new(|_: &Context, _: &[serde_json::Value]| Ok(()), ["delete"]));
//!
//! let ctx = Context::background();
//! if tx.do_commit(&ctx).is_err() {
//!     tx.do_rollback(&ctx).expect("rollback failed");
//! }
//! ```

mod action;
mod audit;
mod config;
mod context;
mod error;
mod transaction;

pub use action::{Action, Callable, Commit, Rollback};
pub use audit::{ActionRecord, ActionStatus, ExecutionLog};
pub use config::TransactionConfig;
pub use context::{Canceller, Context};
pub use error::{ActionError, ContextError, ErrorKind, Stage, TxError};
pub use transaction::Transaction;
