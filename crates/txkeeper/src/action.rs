use std::fmt;

use serde_json::Value;

use crate::context::Context;
use crate::error::ActionError;

/// Work deferred until commit or rollback.
///
/// Implemented for every `Fn(&Ctx, &[Value]) -> Result<(), E>` closure, so
/// most callers never implement it by hand.
pub trait Callable<Ctx, E>: Send + Sync {
    /// Run the work with the caller's context and the arguments bound to the action.
    ///
    /// # Errors
    ///
    /// Returns the callable's own error; the transaction wraps it with the
    /// stage and index of the action.
    fn call(&self, ctx: &Ctx, args: &[Value]) -> Result<(), E>;
}

impl<F, Ctx, E> Callable<Ctx, E> for F
where
    F: Fn(&Ctx, &[Value]) -> Result<(), E> + Send + Sync,
{
    fn call(&self, ctx: &Ctx, args: &[Value]) -> Result<(), E> {
        self(ctx, args)
    }
}

/// One callable plus the arguments it will be invoked with.
///
/// Arguments are opaque to the transaction and only interpreted by the
/// callable, which pays for that with run-time checks on every access.
/// [`Action::from_fn`] avoids the argument list entirely by letting the
/// closure capture typed state instead.
pub struct Action<Ctx = Context, E = ActionError> {
    callable: Box<dyn Callable<Ctx, E>>,
    args: Vec<Value>,
    name: Option<String>,
}

impl<Ctx, E> Action<Ctx, E> {
    /// Build an action that calls `callable` with `args`.
    #[must_use]
    pub fn new<C, I>(callable: C, args: I) -> Self
    where
        C: Callable<Ctx, E> + 'static,
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self {
            callable: Box::new(callable),
            args: args.into_iter().map(Into::into).collect(),
            name: None,
        }
    }

    /// Build an action from a closure that takes no arguments.
    #[must_use]
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Ctx) -> Result<(), E> + Send + Sync + 'static,
    {
        Self {
            callable: Box::new(move |ctx: &Ctx, _: &[Value]| f(ctx)),
            args: Vec::new(),
            name: None,
        }
    }

    /// Attach a name used in logs and the execution log.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name given with [`named`](Action::named), if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Arguments the callable will be invoked with.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub(crate) fn invoke(&self, ctx: &Ctx) -> Result<(), E> {
        self.callable.call(ctx, &self.args)
    }

    pub(crate) fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("action #{index}"),
        }
    }
}

impl<Ctx, E> fmt::Debug for Action<Ctx, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

macro_rules! action_group {
    ($(#[$meta:meta])* $group:ident) => {
        $(#[$meta])*
        pub struct $group<Ctx = Context, E = ActionError> {
            actions: Vec<Action<Ctx, E>>,
        }

        impl<Ctx, E> $group<Ctx, E> {
            /// A group holding a single action.
            #[must_use]
            pub fn new<C, I>(callable: C, args: I) -> Self
            where
                C: Callable<Ctx, E> + 'static,
                I: IntoIterator,
                I::Item: Into<Value>,
            {
                Self::from_actions(vec![Action::new(callable, args)])
            }

            /// A group running `actions` in the given order.
            #[must_use]
            pub fn from_actions(actions: Vec<Action<Ctx, E>>) -> Self {
                Self { actions }
            }

            /// Append an action that runs after every action already in the group.
            #[must_use]
            pub fn then(mut self, action: Action<Ctx, E>) -> Self {
                self.actions.push(action);
                self
            }

            /// Actions in execution order.
            #[must_use]
            pub fn actions(&self) -> &[Action<Ctx, E>] {
                &self.actions
            }

            /// Number of actions in the group.
            #[must_use]
            pub fn len(&self) -> usize {
                self.actions.len()
            }

            /// Whether the group holds no actions.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.actions.is_empty()
            }
        }

        impl<Ctx, E> Default for $group<Ctx, E> {
            fn default() -> Self {
                Self::from_actions(Vec::new())
            }
        }

        impl<Ctx, E> FromIterator<Action<Ctx, E>> for $group<Ctx, E> {
            fn from_iter<T: IntoIterator<Item = Action<Ctx, E>>>(iter: T) -> Self {
                Self::from_actions(iter.into_iter().collect())
            }
        }

        impl<Ctx, E> fmt::Debug for $group<Ctx, E> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($group))
                    .field("actions", &self.actions)
                    .finish()
            }
        }
    };
}

action_group!(
    /// Actions run by [`Transaction::do_commit`](crate::Transaction::do_commit),
    /// earliest registered first.
    Commit
);

action_group!(
    /// Actions run by [`Transaction::do_rollback`](crate::Transaction::do_rollback),
    /// earliest registered first.
    Rollback
);
