//! Controllable signal source
//!
//! Stands in for `OsSignalSource` so tests can deliver signals deterministically
//! without touching process-wide signal dispositions.

use ctxkit_core::{Signal, SignalFilter, SignalSink, SignalSource};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

/// Signal source that delivers only when a test calls `raise`
///
/// Each `notify` call is kept as its own registration, with its own sink and
/// filter. Clones share registrations.
#[derive(Debug, Clone, Default)]
pub struct FakeSignalSource {
    registrations: Arc<Mutex<Vec<Registration>>>,
}

#[derive(Debug)]
struct Registration {
    sink: SignalSink,
    filter: SignalFilter,
}

impl FakeSignalSource {
    /// Create a source with no registrations
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `signal` to every registration whose filter allows it
    ///
    /// Returns how many sinks accepted the signal. Like a real source, a full or
    /// closed sink drops the signal instead of blocking.
    pub fn raise(&self, signal: Signal) -> usize {
        self.deliver(signal, |registration| registration.filter.matches(signal))
    }

    /// Deliver `signal` to every registration, ignoring filters
    ///
    /// Simulates a source that does not honour the filter it was given.
    pub fn raise_unfiltered(&self, signal: Signal) -> usize {
        self.deliver(signal, |_| true)
    }

    /// Number of registrations whose receiver is still alive
    pub fn registration_count(&self) -> usize {
        let mut registrations = self.registrations.lock();
        prune_closed(&mut registrations);
        registrations.len()
    }

    /// Filter passed to the most recent `notify` call
    pub fn last_filter(&self) -> Option<SignalFilter> {
        self.registrations
            .lock()
            .last()
            .map(|registration| registration.filter.clone())
    }

    /// Drop every registered sink, as a source that stops delivering would
    pub fn close(&self) {
        self.registrations.lock().clear();
    }

    fn deliver(&self, signal: Signal, allowed: impl Fn(&Registration) -> bool) -> usize {
        let mut registrations = self.registrations.lock();
        prune_closed(&mut registrations);
        let delivered = registrations
            .iter()
            .filter(|registration| allowed(registration))
            .filter(|registration| registration.sink.try_send(signal).is_ok())
            .count();
        trace!(%signal, delivered, "fake signal raised");
        delivered
    }
}

/// Forget registrations whose receiver has been dropped
fn prune_closed(registrations: &mut Vec<Registration>) {
    registrations.retain(|registration| !registration.sink.is_closed());
}

impl SignalSource for FakeSignalSource {
    fn notify(&self, sink: SignalSink, filter: &SignalFilter) {
        let mut registrations = self.registrations.lock();
        prune_closed(&mut registrations);
        registrations.push(Registration {
            sink,
            filter: filter.clone(),
        });
        trace!(%filter, "fake signal source registered");
    }
}
