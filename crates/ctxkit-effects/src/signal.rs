//! OS Signal Effect Handler - Production Only
//!
//! Stateless implementation of `SignalSource` from ctxkit-core on top of
//! `tokio::signal`. Each `notify` call installs its own listeners and forwards
//! into its own sink, so unrelated registrations never share a channel.
//!
//! Registering a signal kind through Tokio replaces the default disposition for
//! the rest of the process: after `notify(.., Interrupt)` a Ctrl+C no longer
//! terminates the process on its own.

use ctxkit_core::{Signal, SignalFilter, SignalSink, SignalSource};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{trace, warn};

#[cfg(unix)]
const PLATFORM_SIGNALS: &[Signal] = &Signal::ALL;

#[cfg(not(unix))]
const PLATFORM_SIGNALS: &[Signal] = &[Signal::Interrupt];

/// Signal source backed by the operating system
///
/// Must be used from within a Tokio runtime with the signal driver enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSignalSource;

impl OsSignalSource {
    /// Create a new OS signal source
    pub fn new() -> Self {
        Self
    }

    /// Signals delivered for an empty filter on this platform
    pub fn deliverable() -> &'static [Signal] {
        PLATFORM_SIGNALS
    }
}

impl SignalSource for OsSignalSource {
    fn notify(&self, sink: SignalSink, filter: &SignalFilter) {
        for signal in filter.resolve(PLATFORM_SIGNALS) {
            // Listener creation registers the handler synchronously.
            match platform::listen(signal) {
                Ok(listener) => {
                    tokio::spawn(forward(listener, signal, sink.clone()));
                }
                Err(err) => {
                    warn!(%signal, error = %err, "failed to register signal handler");
                }
            }
        }
    }
}

/// Pump one OS listener into `sink` until the sink's receiver is dropped
async fn forward(mut listener: platform::Listener, signal: Signal, sink: SignalSink) {
    loop {
        tokio::select! {
            () = sink.closed() => break,
            received = listener.recv() => {
                if received.is_none() {
                    break;
                }
                match sink.try_send(signal) {
                    Ok(()) => trace!(%signal, "signal forwarded"),
                    Err(TrySendError::Full(_)) => trace!(%signal, "sink full, signal dropped"),
                    Err(TrySendError::Closed(_)) => break,
                }
            }
        }
    }
}

#[cfg(unix)]
mod platform {
    use ctxkit_core::Signal;
    use std::io;
    use tokio::signal::unix::{self, SignalKind};

    pub(super) struct Listener(unix::Signal);

    impl Listener {
        pub(super) async fn recv(&mut self) -> Option<()> {
            self.0.recv().await
        }
    }

    pub(super) fn listen(signal: Signal) -> io::Result<Listener> {
        let kind = match signal {
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Terminate => SignalKind::terminate(),
            Signal::Hangup => SignalKind::hangup(),
            Signal::Quit => SignalKind::quit(),
            Signal::User1 => SignalKind::user_defined1(),
            Signal::User2 => SignalKind::user_defined2(),
        };
        unix::signal(kind).map(Listener)
    }
}

#[cfg(not(unix))]
mod platform {
    use ctxkit_core::Signal;
    use std::io;
    use tokio::signal::windows;

    pub(super) struct Listener(windows::CtrlC);

    impl Listener {
        pub(super) async fn recv(&mut self) -> Option<()> {
            self.0.recv().await
        }
    }

    pub(super) fn listen(signal: Signal) -> io::Result<Listener> {
        match signal {
            Signal::Interrupt => windows::ctrl_c().map(Listener),
            other => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("{} is not deliverable on this platform", other.short_name()),
            )),
        }
    }
}
