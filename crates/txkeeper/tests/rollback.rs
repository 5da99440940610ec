//! Integration tests for rollback behavior.

use std::cell::RefCell;

use serde_json::Value;
use txkeeper::{Action, Commit, ErrorKind, Rollback, Stage, Transaction, TransactionConfig, TxError};

struct TestContext {
    total: RefCell<i64>,
    undo_log: RefCell<Vec<String>>,
}

impl TestContext {
    fn new() -> Self {
        Self {
            total: RefCell::new(0),
            undo_log: RefCell::new(Vec::new()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct TestError(String);

fn sum(ctx: &TestContext, args: &[Value]) -> Result<(), TestError> {
    for arg in args {
        let n = arg
            .as_i64()
            .ok_or_else(|| TestError(format!("expected integer, got {arg}")))?;
        *ctx.total.borrow_mut() += n;
    }
    Ok(())
}

fn undo(ctx: &TestContext, args: &[Value]) -> Result<(), TestError> {
    let target = args
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| TestError("missing undo target".to_string()))?;
    ctx.undo_log.borrow_mut().push(format!("undo {target}"));
    Ok(())
}

fn fail_undo(_: &TestContext, args: &[Value]) -> Result<(), TestError> {
    Err(TestError(format!("cannot undo {args:?}")))
}

#[test]
fn rollback_sums_arguments() -> anyhow::Result<()> {
    let ctx = TestContext::new();

    let tx = Transaction::new().with_rollback(Rollback::new(sum, [1, 2, 3, 4, 5]));
    tx.do_rollback(&ctx)?;

    assert_eq!(*ctx.total.borrow(), 15);
    Ok(())
}

#[test]
fn rollback_refused_when_group_empty() {
    let ctx = TestContext::new();

    let tx: Transaction<TestContext, TestError> =
        Transaction::new().with_commit(Commit::new(sum, [1]));

    let err = tx.do_rollback(&ctx).expect_err("rollback should be refused");

    assert_eq!(err.kind(), ErrorKind::CannotRollback);
    assert_eq!(err.to_string(), "tx-keeper: cannot do rollback: rollback function is not set");
}

#[test]
fn rollback_refused_even_with_check_disabled() {
    let ctx = TestContext::new();

    let tx: Transaction<TestContext, TestError> =
        Transaction::with_config(TransactionConfig::default().without_rollback_check());

    assert!(matches!(tx.do_rollback(&ctx), Err(TxError::CannotRollback)));
    assert_eq!(*ctx.total.borrow(), 0);
}

#[test]
fn rollback_stops_at_first_failure() {
    let ctx = TestContext::new();

    let rollback = Rollback::from_actions(vec![
        Action::new(undo, ["cache"]),
        Action::new(fail_undo, ["api"]),
        Action::new(undo, ["db"]),
    ]);
    let tx = Transaction::new().with_rollback(rollback);

    let err = tx.do_rollback(&ctx).expect_err("second action should fail");

    assert_eq!(err.stage(), Some(Stage::Rollback));
    assert_eq!(err.index(), Some(1));
    assert!(err.to_string().starts_with("tx-keeper: error rollback on func 1: cannot undo"));
    assert_eq!(*ctx.undo_log.borrow(), ["undo cache"]);
}

#[test]
fn rollback_after_failed_commit_undoes_in_order() -> anyhow::Result<()> {
    let ctx = TestContext::new();

    let commit = Commit::from_actions(vec![
        Action::new(sum, [5]),
        Action::from_fn(|_: &TestContext| Err(TestError("external service down".to_string()))),
    ]);
    let rollback = Rollback::from_actions(vec![
        Action::new(undo, ["api"]),
        Action::new(undo, ["db"]),
    ]);
    let tx = Transaction::new().with_commit(commit).with_rollback(rollback);

    let commit_err = tx.do_commit(&ctx).expect_err("commit should fail");
    assert_eq!(commit_err.index(), Some(1));
    tx.do_rollback(&ctx)?;

    assert_eq!(*ctx.total.borrow(), 5);
    assert_eq!(*ctx.undo_log.borrow(), ["undo api", "undo db"]);
    Ok(())
}

#[test]
fn second_with_rollback_replaces_first_group() -> anyhow::Result<()> {
    let ctx = TestContext::new();

    let tx = Transaction::new()
        .with_rollback(Rollback::new(undo, ["first"]))
        .with_rollback(Rollback::new(undo, ["second"]));
    tx.do_rollback(&ctx)?;

    assert_eq!(*ctx.undo_log.borrow(), ["undo second"]);
    Ok(())
}

#[test]
fn repeated_rollback_reruns_all_actions() -> anyhow::Result<()> {
    let ctx = TestContext::new();

    let tx = Transaction::new().with_rollback(Rollback::new(sum, [1, 2, 3, 4, 5]));
    tx.do_rollback(&ctx)?;
    tx.do_rollback(&ctx)?;

    assert_eq!(*ctx.total.borrow(), 30);
    Ok(())
}
