//! Value overlays
//!
//! `with_values` joins the values of two contexts under the lifecycle of one.
//! The typical use is detached work started from a request handler: the
//! request's context ends when the handler returns, but the work still needs
//! the request id and credentials stored in it.
//!
//! ```rust,ignore
//! let (task_ctx, cancel) = with_timeout(background(), Duration::from_secs(60));
//! let task_ctx = with_values(task_ctx, request_ctx);
//! tokio::spawn(async move {
//!     async_task(task_ctx).await;
//!     cancel.cancel();
//! });
//! ```

use ctxkit_core::{same_context, Context, ContextError, ContextRef, ContextValue, Done};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Lifecycle of `ctx`, values of `ctx` then `values`
///
/// A key present in `ctx` shadows the same key in `values`. Done, error and
/// deadline are read from `ctx` only; whatever happens to `values` has no
/// effect on the overlay.
pub struct ValueOverlay {
    ctx: ContextRef,
    values: Option<ContextRef>,
}

/// Compose the values of `values` under the lifecycle of `ctx`
pub fn with_values(ctx: ContextRef, values: ContextRef) -> Arc<ValueOverlay> {
    ValueOverlay::new(ctx, values)
}

impl ValueOverlay {
    /// Create an overlay; see [`with_values`]
    pub fn new(ctx: ContextRef, values: ContextRef) -> Arc<Self> {
        let values = fallback_for(&ctx, values);
        Arc::new(Self { ctx, values })
    }

    /// The context whose lifecycle the overlay exposes
    pub fn lifecycle(&self) -> &ContextRef {
        &self.ctx
    }
}

/// A fallback that is the owner itself would never be consulted
pub(crate) fn fallback_for(owner: &ContextRef, fallback: ContextRef) -> Option<ContextRef> {
    if same_context(owner, &fallback) {
        None
    } else {
        Some(fallback)
    }
}

/// Owner first; the fallback only on a miss
pub(crate) fn lookup(
    owner: &ContextRef,
    fallback: Option<&ContextRef>,
    key: &str,
) -> Option<ContextValue> {
    owner
        .value(key)
        .or_else(|| fallback.and_then(|fallback| fallback.value(key)))
}

impl fmt::Debug for ValueOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueOverlay")
            .field("ctx", &self.ctx)
            .field("values", &self.values)
            .finish()
    }
}

impl Context for ValueOverlay {
    fn value(&self, key: &str) -> Option<ContextValue> {
        lookup(&self.ctx, self.values.as_ref(), key)
    }

    fn done(&self) -> Done {
        self.ctx.done()
    }

    fn err(&self) -> Option<ContextError> {
        self.ctx.err()
    }

    fn deadline(&self) -> Option<Instant> {
        self.ctx.deadline()
    }
}
