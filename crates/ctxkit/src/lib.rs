//! ctxkit - Context Composition
//!
//! Three decorators over the `ctxkit_core::Context` contract:
//!
//! - [`SignalContext`]: done when its parent is done or an external signal
//!   arrives, and records which of the two happened.
//! - [`ValueOverlay`] (`with_values`): lifecycle of one context, values of two.
//! - [`ValueCopy`] (`copy_values`): the same composition with source/destination
//!   naming, for grafting old request values onto a freshly lived context.
//!
//! # Example
//!
//! ```rust,ignore
//! // Detached work keeps the request's values but gets its own one-minute budget.
//! let (task_ctx, cancel) = with_timeout(background(), Duration::from_secs(60));
//! let task_ctx = copy_values(request_ctx, task_ctx);
//! tokio::spawn(async move {
//!     run_task(task_ctx).await;
//!     cancel.cancel();
//! });
//! ```

#![forbid(unsafe_code)]

mod copy;
mod signal;
mod values;

pub use copy::{copy_values, ValueCopy};
pub use signal::{interrupt, with_signal, SignalCause, SignalContext};
pub use values::{with_values, ValueOverlay};

pub use ctxkit_core::{
    background, same_context, with_cancel, with_deadline, with_timeout, with_value, CancelHandle,
    Context, ContextError, ContextExt, ContextRef, ContextValue, Done, Signal, SignalFilter,
    SignalSource,
};
