//! Standard derivations: background, cancel, deadline and single value
//!
//! Cancellation flows from parent to child through a small Tokio task per
//! derived context, spawned only when the parent can actually be cancelled.
//! Deriving from a cancellable parent therefore requires a running runtime.

use super::{Context, ContextRef, ContextValue, Done, DoneTrigger};
use crate::errors::ContextError;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// Root context: never done, no deadline, no values
pub fn background() -> ContextRef {
    Arc::new(Background)
}

#[derive(Debug)]
struct Background;

impl Context for Background {
    fn value(&self, _key: &str) -> Option<ContextValue> {
        None
    }

    fn done(&self) -> Done {
        Done::never()
    }

    fn err(&self) -> Option<ContextError> {
        None
    }

    fn deadline(&self) -> Option<Instant> {
        None
    }
}

/// Cancels the context it was returned with
#[derive(Debug, Clone)]
pub struct CancelHandle {
    trigger: DoneTrigger,
}

impl CancelHandle {
    /// Cancel the context with `ContextError::Canceled`
    ///
    /// Has no effect if the context is already done.
    pub fn cancel(&self) {
        self.trigger.fire(ContextError::Canceled);
    }
}

/// Derive a context that is done when `cancel` is called or the parent is done
pub fn with_cancel(parent: ContextRef) -> (ContextRef, CancelHandle) {
    let (ctx, trigger) = CancelContext::derive(parent, None);
    (ctx, CancelHandle { trigger })
}

/// Derive a context that is also done once `deadline` passes
///
/// The effective deadline is the earlier of `deadline` and the parent's.
pub fn with_deadline(parent: ContextRef, deadline: Instant) -> (ContextRef, CancelHandle) {
    let effective = match parent.deadline() {
        Some(inherited) if inherited < deadline => inherited,
        _ => deadline,
    };
    let (ctx, trigger) = CancelContext::derive(parent, Some(effective));
    (ctx, CancelHandle { trigger })
}

/// `with_deadline(parent, now + timeout)`
///
/// A timeout too large to represent as an `Instant` means no deadline.
pub fn with_timeout(parent: ContextRef, timeout: Duration) -> (ContextRef, CancelHandle) {
    match Instant::now().checked_add(timeout) {
        Some(deadline) => with_deadline(parent, deadline),
        None => with_cancel(parent),
    }
}

/// Derive a context holding one key/value pair on top of the parent's values
pub fn with_value(
    parent: ContextRef,
    key: impl Into<String>,
    value: impl Any + Send + Sync,
) -> ContextRef {
    Arc::new(ValueContext {
        parent,
        key: key.into(),
        value: Arc::new(value),
    })
}

struct CancelContext {
    parent: ContextRef,
    done: Done,
    deadline: Option<Instant>,
}

impl CancelContext {
    fn derive(parent: ContextRef, deadline: Option<Instant>) -> (ContextRef, DoneTrigger) {
        let trigger = DoneTrigger::new();
        let parent_done = parent.done();

        if let Some(err) = parent_done.err() {
            trigger.fire(err);
        } else if deadline.is_some_and(|at| at <= Instant::now()) {
            trigger.fire(ContextError::DeadlineExceeded);
        } else if !parent_done.is_never() || deadline.is_some() {
            tokio::spawn(propagate(parent_done, deadline, trigger.clone()));
        }

        let ctx = Arc::new(Self {
            parent,
            done: trigger.done(),
            deadline,
        });
        (ctx, trigger)
    }
}

/// Fires `trigger` from the parent or the deadline, whichever is first
async fn propagate(parent_done: Done, deadline: Option<Instant>, trigger: DoneTrigger) {
    let own = trigger.done();
    let expiry = async {
        match deadline {
            Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        err = parent_done.wait() => {
            trace!(%err, "parent done, propagating");
            trigger.fire(err);
        }
        () = expiry => {
            trigger.fire(ContextError::DeadlineExceeded);
        }
        _ = own.wait() => {}
    }
}

impl fmt::Debug for CancelContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelContext")
            .field("deadline", &self.deadline)
            .field("err", &self.done.err())
            .finish_non_exhaustive()
    }
}

impl Context for CancelContext {
    fn value(&self, key: &str) -> Option<ContextValue> {
        self.parent.value(key)
    }

    fn done(&self) -> Done {
        self.done.clone()
    }

    fn err(&self) -> Option<ContextError> {
        self.done.err()
    }

    fn deadline(&self) -> Option<Instant> {
        self.deadline.or_else(|| self.parent.deadline())
    }
}

struct ValueContext {
    parent: ContextRef,
    key: String,
    value: ContextValue,
}

impl fmt::Debug for ValueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueContext")
            .field("key", &self.key)
            .field("parent", &self.parent)
            .finish_non_exhaustive()
    }
}

impl Context for ValueContext {
    fn value(&self, key: &str) -> Option<ContextValue> {
        if self.key == key {
            return Some(Arc::clone(&self.value));
        }
        self.parent.value(key)
    }

    fn done(&self) -> Done {
        self.parent.done()
    }

    fn err(&self) -> Option<ContextError> {
        self.parent.err()
    }

    fn deadline(&self) -> Option<Instant> {
        self.parent.deadline()
    }
}
