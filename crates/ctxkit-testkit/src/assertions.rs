//! Lifecycle assertion helpers
//!
//! Done-ness is checked with a bounded observation window: "done" must be seen
//! within `SHORT_DURATION`, "not done" must hold for all of it.

use ctxkit_core::{Context, ContextError};
use std::time::Duration;

/// Observation window for done / not-done assertions
pub const SHORT_DURATION: Duration = Duration::from_millis(100);

/// Assert that `ctx` becomes done within `SHORT_DURATION`; returns its error
pub async fn assert_done(ctx: &dyn Context) -> ContextError {
    let waited = tokio::time::timeout(SHORT_DURATION, ctx.done().wait()).await;
    let Ok(err) = waited else {
        panic!("context was not done: {ctx:?}");
    };
    assert_eq!(
        ctx.err(),
        Some(err),
        "err() must report the error carried by done"
    );
    err
}

/// Assert that `ctx` stays live for all of `SHORT_DURATION`
pub async fn assert_not_done(ctx: &dyn Context) {
    let waited = tokio::time::timeout(SHORT_DURATION, ctx.done().wait()).await;
    if let Ok(err) = waited {
        panic!("context was done: {err}");
    }
    assert_eq!(ctx.err(), None);
}

/// Live, with no deadline
pub async fn assert_valid(ctx: &dyn Context) {
    assert!(ctx.deadline().is_none(), "unexpected deadline");
    assert_not_done(ctx).await;
}

/// Done, with no deadline
pub async fn assert_cancelled(ctx: &dyn Context) -> ContextError {
    assert!(ctx.deadline().is_none(), "unexpected deadline");
    assert_done(ctx).await
}

/// Done because its deadline elapsed
pub async fn assert_deadlined(ctx: &dyn Context) {
    assert!(ctx.deadline().is_some(), "expected a deadline");
    assert_eq!(assert_done(ctx).await, ContextError::DeadlineExceeded);
}
