//! Context contract
//!
//! A context is an immutable handle carrying a cancellation signal with its error,
//! an optional deadline and a key/value lookup chain. Contexts form a tree by
//! composition and never change after construction, apart from the single
//! transition from "not done" to "done".

mod base;
mod done;

pub use base::{background, with_cancel, with_deadline, with_timeout, with_value, CancelHandle};
pub use done::{Done, DoneTrigger};

use crate::errors::ContextError;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// A value stored in a context
pub type ContextValue = Arc<dyn Any + Send + Sync>;

/// Shared handle to any context
pub type ContextRef = Arc<dyn Context>;

/// The context contract
///
/// Implementations must keep `err` consistent with `done`: `None` until the done
/// signal fires, then the same error on every call.
pub trait Context: Send + Sync + fmt::Debug {
    /// Look up `key`; `None` when no context in the chain holds it
    fn value(&self, key: &str) -> Option<ContextValue>;

    /// Completion signal for this context
    fn done(&self) -> Done;

    /// Why the context is done, or `None` while it is still live
    fn err(&self) -> Option<ContextError>;

    /// When the context will be cancelled automatically, if ever
    fn deadline(&self) -> Option<Instant>;
}

/// Convenience methods available on every context
pub trait ContextExt: Context {
    /// Typed lookup; `None` if absent or of a different type
    fn value_as<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.value(key).and_then(|value| value.downcast::<T>().ok())
    }

    /// Non-blocking done check
    fn is_done(&self) -> bool {
        self.err().is_some()
    }
}

impl<C: Context + ?Sized> ContextExt for C {}

/// Pointer identity of two context handles, ignoring vtables
pub fn same_context(a: &ContextRef, b: &ContextRef) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a).cast::<()>(),
        Arc::as_ptr(b).cast::<()>(),
    )
}
