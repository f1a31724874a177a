//! Unified error system for ctxkit core
//!
//! A context reports why it ended through a single error type. Errors are never
//! raised for control flow; they are read from `Context::err` after done fires.

use crate::signal::Signal;

/// Reason a context is done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ContextError {
    /// The context was cancelled explicitly or through its parent
    #[error("context canceled")]
    Canceled,

    /// The context's deadline elapsed
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// An external signal ended the context
    #[error("got signal: {signal}")]
    SignalReceived {
        /// The signal that was delivered
        signal: Signal,
    },
}

impl ContextError {
    /// Create a signal-received error
    pub fn signal(signal: Signal) -> Self {
        Self::SignalReceived { signal }
    }

    /// The delivered signal, if this error was caused by one
    pub fn received_signal(&self) -> Option<Signal> {
        match self {
            Self::SignalReceived { signal } => Some(*signal),
            _ => None,
        }
    }

    /// Whether the context ended because its deadline passed
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded)
    }
}
