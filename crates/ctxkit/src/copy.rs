//! Value copies
//!
//! Same mechanics as `with_values`, named for the other direction: values are
//! copied *from* `src` *onto* `dst`, and the result lives as long as `dst`.

use crate::values::{fallback_for, lookup};
use ctxkit_core::{Context, ContextError, ContextRef, ContextValue, Done};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Lifecycle of `dst`, values of `dst` then `src`
pub struct ValueCopy {
    src: Option<ContextRef>,
    dst: ContextRef,
}

/// Expose the values of `src` on `dst`, keeping `dst`'s lifecycle
///
/// Keys already set on `dst` win over the same keys in `src`.
pub fn copy_values(src: ContextRef, dst: ContextRef) -> Arc<ValueCopy> {
    ValueCopy::new(src, dst)
}

impl ValueCopy {
    /// Create a copy; see [`copy_values`]
    pub fn new(src: ContextRef, dst: ContextRef) -> Arc<Self> {
        let src = fallback_for(&dst, src);
        Arc::new(Self { src, dst })
    }

    /// The context whose lifecycle the copy exposes
    pub fn destination(&self) -> &ContextRef {
        &self.dst
    }
}

impl fmt::Debug for ValueCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCopy")
            .field("src", &self.src)
            .field("dst", &self.dst)
            .finish()
    }
}

impl Context for ValueCopy {
    fn value(&self, key: &str) -> Option<ContextValue> {
        lookup(&self.dst, self.src.as_ref(), key)
    }

    fn done(&self) -> Done {
        self.dst.done()
    }

    fn err(&self) -> Option<ContextError> {
        self.dst.err()
    }

    fn deadline(&self) -> Option<Instant> {
        self.dst.deadline()
    }
}
