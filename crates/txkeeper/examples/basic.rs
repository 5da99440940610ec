//! Commit two side effects and undo them when the second one fails.
//!
//! Run with `cargo run -p txkeeper --example basic`.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use txkeeper::{Action, Commit, Context, Rollback, Transaction};

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("payment service rejected order {0}")]
    PaymentRejected(String),
    #[error("orders table is locked")]
    Poisoned,
}

fn main() -> anyhow::Result<()> {
    let orders = Arc::new(Mutex::new(Vec::<String>::new()));

    let insert = {
        let orders = Arc::clone(&orders);
        move |_: &Context, args: &[Value]| -> Result<(), AppError> {
            let mut orders = orders.lock().map_err(|_| AppError::Poisoned)?;
            orders.extend(args.iter().filter_map(Value::as_str).map(str::to_owned));
            println!("inserted orders {args:?}");
            Ok(())
        }
    };
    let delete = {
        let orders = Arc::clone(&orders);
        move |_: &Context, args: &[Value]| -> Result<(), AppError> {
            let mut orders = orders.lock().map_err(|_| AppError::Poisoned)?;
            orders.retain(|order| {
                !args
                    .iter()
                    .any(|arg| arg.as_str() == Some(order.as_str()))
            });
            println!("deleted orders {args:?}");
            Ok(())
        }
    };

    let commit = Commit::from_actions(vec![
        Action::new(insert, ["order-1", "order-2"]).named("insert_orders"),
        Action::from_fn(|ctx: &Context| {
            if ctx.is_cancelled() {
                return Ok(());
            }
            Err(AppError::PaymentRejected("order-2".to_string()))
        })
        .named("charge_payment"),
    ]);
    let rollback = Rollback::new(delete, ["order-1", "order-2"]);

    let tx = Transaction::new().with_commit(commit).with_rollback(rollback);
    let ctx = Context::background();

    if let Err(err) = tx.do_commit(&ctx) {
        eprintln!("commit failed: {err}");
        let (result, log) = tx.do_rollback_with_log(&ctx);
        println!("{}", log.summary());
        result?;
    } else {
        println!("transaction completed successfully");
    }

    let remaining = orders.lock().map_err(|_| AppError::Poisoned)?;
    println!("orders left: {remaining:?}");
    Ok(())
}
