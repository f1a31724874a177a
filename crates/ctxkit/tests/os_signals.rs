//! SignalContext over real OS signals
//!
//! Delivers signals to this test process with `kill`, so only unix runs these.

#![cfg(unix)]

use ctxkit::{background, with_cancel, with_signal, Context, ContextError, Signal, SignalCause};
use ctxkit_testkit::{assert_done, init_test_logging};

fn raise(signal: &str) {
    let status = std::process::Command::new("kill")
        .arg(format!("-{signal}"))
        .arg(std::process::id().to_string())
        .status()
        .unwrap();
    assert!(status.success());
}

#[tokio::test(flavor = "multi_thread")]
async fn os_signal_ends_context() {
    init_test_logging();
    let ctx = with_signal(background(), [Signal::User2]);

    raise("USR2");

    let err = tokio::time::timeout(std::time::Duration::from_secs(5), ctx.done().wait())
        .await
        .unwrap();
    assert_eq!(err, ContextError::signal(Signal::User2));
    assert_eq!(ctx.err(), Some(ContextError::signal(Signal::User2)));
    assert_eq!(ctx.cause(), Some(SignalCause::Signal(Signal::User2)));
}

#[tokio::test(flavor = "multi_thread")]
async fn os_backed_context_follows_parent() {
    let (parent, cancel) = with_cancel(background());
    let ctx = with_signal(parent, [Signal::User1]);

    cancel.cancel();
    assert_eq!(assert_done(&*ctx).await, ContextError::Canceled);
}
