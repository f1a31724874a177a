//! Signal-cancelled contexts
//!
//! A `SignalContext` wraps a parent and ends when either the parent ends or an
//! external signal arrives, whichever happens first. The losing event is
//! ignored. The cause is recorded before done is published, so anyone who sees
//! done also sees why.

use ctxkit_core::{
    background, Context, ContextError, ContextRef, ContextValue, Done, DoneTrigger, Signal,
    SignalFilter, SignalSource,
};
use ctxkit_effects::OsSignalSource;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Which event ended a `SignalContext`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalCause {
    /// The parent ended first; carries the parent's own error
    Parent(ContextError),
    /// A matching signal arrived first
    Signal(Signal),
}

impl SignalCause {
    /// The error a context ended by this cause reports
    pub fn error(&self) -> ContextError {
        match self {
            SignalCause::Parent(err) => *err,
            SignalCause::Signal(signal) => ContextError::signal(*signal),
        }
    }

    /// The signal, if a signal ended the context
    pub fn signal(&self) -> Option<Signal> {
        match self {
            SignalCause::Parent(_) => None,
            SignalCause::Signal(signal) => Some(*signal),
        }
    }
}

impl fmt::Display for SignalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalCause::Parent(err) => write!(f, "parent done: {err}"),
            SignalCause::Signal(signal) => write!(f, "signal: {signal}"),
        }
    }
}

/// Context that is also done when an external signal arrives
///
/// Values and deadline come from the parent unchanged. `err()` is `None` until
/// done, then either the parent's error or `ContextError::SignalReceived`.
pub struct SignalContext {
    parent: ContextRef,
    filter: SignalFilter,
    done: Done,
    cause: Arc<OnceCell<SignalCause>>,
}

/// Derive a context that is done on the parent's done or an OS signal in `filter`
///
/// An empty filter listens for every signal the OS source can deliver.
///
/// # Panics
///
/// Panics outside a Tokio runtime with the signal driver enabled.
pub fn with_signal(parent: ContextRef, filter: impl Into<SignalFilter>) -> Arc<SignalContext> {
    SignalContext::with_source(parent, filter, &OsSignalSource::new())
}

/// Process-level interrupt handling: any OS signal on a background context
///
/// ```rust,ignore
/// #[tokio::main]
/// async fn main() {
///     let ctx = ctxkit::interrupt();
///     serve(ctx.clone()).await;
/// }
/// ```
pub fn interrupt() -> Arc<SignalContext> {
    with_signal(background(), SignalFilter::any())
}

impl SignalContext {
    /// Derive a signal context fed by `source`
    ///
    /// Registration with `source` completes before the watcher starts and
    /// before this returns, so a signal raised immediately afterwards is not
    /// lost.
    ///
    /// # Panics
    ///
    /// Panics outside a Tokio runtime.
    pub fn with_source(
        parent: ContextRef,
        filter: impl Into<SignalFilter>,
        source: &dyn SignalSource,
    ) -> Arc<Self> {
        let filter = filter.into();

        // Buffered so a signal raised before the watcher first polls is kept.
        let (sink, signals) = mpsc::channel(1);
        source.notify(sink, &filter);

        let trigger = DoneTrigger::new();
        let done = trigger.done();
        let cause = Arc::new(OnceCell::new());

        tokio::spawn(watch(
            parent.done(),
            signals,
            filter.clone(),
            trigger,
            Arc::clone(&cause),
        ));
        debug!(%filter, "signal context armed");

        Arc::new(Self {
            parent,
            filter,
            done,
            cause,
        })
    }

    /// The recorded cause, once done
    pub fn cause(&self) -> Option<SignalCause> {
        if !self.done.is_done() {
            return None;
        }
        self.cause.get().copied()
    }

    /// Signals this context was registered for
    pub fn filter(&self) -> &SignalFilter {
        &self.filter
    }

    /// The wrapped parent
    pub fn parent(&self) -> &ContextRef {
        &self.parent
    }
}

/// Wait for the first of parent-done or a matching signal, then fire once
async fn watch(
    parent_done: Done,
    mut signals: mpsc::Receiver<Signal>,
    filter: SignalFilter,
    trigger: DoneTrigger,
    slot: Arc<OnceCell<SignalCause>>,
) {
    let cause = loop {
        tokio::select! {
            err = parent_done.wait() => break SignalCause::Parent(err),
            received = signals.recv() => match received {
                Some(signal) if filter.matches(signal) => break SignalCause::Signal(signal),
                Some(signal) => trace!(%signal, %filter, "signal outside filter ignored"),
                // Source went away; only the parent can end us now.
                None => break SignalCause::Parent(parent_done.wait().await),
            },
        }
    };

    // Stop consuming so the source can release its registration.
    drop(signals);

    let _ = slot.set(cause);
    trigger.fire(cause.error());
    debug!(%cause, "signal context done");
}

impl fmt::Debug for SignalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalContext")
            .field("filter", &self.filter)
            .field("cause", &self.cause())
            .field("parent", &self.parent)
            .finish()
    }
}

impl Context for SignalContext {
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
        self.parent.deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxkit_core::{with_cancel, with_value, ContextExt};
    use ctxkit_testkit::{assert_done, assert_not_done, FakeSignalSource};

    #[tokio::test]
    async fn test_registers_before_returning() {
        let source = FakeSignalSource::new();
        let ctx = SignalContext::with_source(background(), [Signal::Terminate], &source);

        assert_eq!(source.registration_count(), 1);
        assert_eq!(
            source.last_filter(),
            Some(SignalFilter::only([Signal::Terminate]))
        );
        assert_eq!(ctx.filter(), &SignalFilter::only([Signal::Terminate]));
    }

    #[tokio::test]
    async fn test_signal_raised_before_watcher_runs_is_kept() {
        let source = FakeSignalSource::new();
        let ctx = SignalContext::with_source(background(), SignalFilter::any(), &source);
        // Current-thread runtime: the watcher has not been polled yet.
        assert_eq!(source.raise(Signal::Interrupt), 1);

        assert_eq!(
            assert_done(&*ctx).await,
            ContextError::signal(Signal::Interrupt)
        );
        assert_eq!(ctx.cause(), Some(SignalCause::Signal(Signal::Interrupt)));
    }

    #[tokio::test]
    async fn test_cause_distinguishes_nested_signal_contexts() {
        let source = FakeSignalSource::new();
        let outer = SignalContext::with_source(background(), [Signal::Hangup], &source);
        let inner = SignalContext::with_source(outer.clone(), [Signal::Terminate], &source);

        source.raise(Signal::Hangup);

        let err = assert_done(&*inner).await;
        assert_eq!(err, ContextError::signal(Signal::Hangup));
        assert_eq!(
            inner.cause(),
            Some(SignalCause::Parent(ContextError::signal(Signal::Hangup)))
        );
        assert_eq!(outer.cause(), Some(SignalCause::Signal(Signal::Hangup)));
    }

    #[tokio::test]
    async fn test_source_closing_leaves_parent_in_charge() {
        let source = FakeSignalSource::new();
        let (parent, cancel) = with_cancel(background());
        let ctx = SignalContext::with_source(parent, SignalFilter::any(), &source);

        source.close();
        assert_not_done(&*ctx).await;

        cancel.cancel();
        assert_eq!(assert_done(&*ctx).await, ContextError::Canceled);
    }

    #[tokio::test]
    async fn test_values_and_deadline_come_from_parent() {
        let source = FakeSignalSource::new();
        let parent = with_value(background(), "request_id", "r-1");
        let ctx = SignalContext::with_source(parent, SignalFilter::any(), &source);

        assert_eq!(ctx.value_as::<&str>("request_id").as_deref(), Some(&"r-1"));
        assert!(ctx.value("missing").is_none());
        assert_eq!(ctx.deadline(), None);
        assert_eq!(ctx.cause(), None);
    }

    #[test]
    fn test_cause_display() {
        assert_eq!(
            SignalCause::Signal(Signal::Terminate).to_string(),
            "signal: terminated"
        );
        assert_eq!(
            SignalCause::Parent(ContextError::Canceled).to_string(),
            "parent done: context canceled"
        );
        assert_eq!(SignalCause::Parent(ContextError::Canceled).signal(), None);
    }
}
