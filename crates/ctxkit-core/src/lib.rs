//! ctxkit Core - Context Contract Foundation
//!
//! This crate defines the context contract that every ctxkit wrapper implements,
//! together with the small set of standard derivations the wrappers compose.
//!
//! # Contents
//!
//! ## Context Contract
//! - `Context`: value lookup, done signal, error, deadline
//! - `Done` / `DoneTrigger`: one-shot, level-triggered completion with its error payload
//! - `background`, `with_cancel`, `with_deadline`, `with_timeout`, `with_value`
//!
//! ## Signal Model
//! - `Signal`: named external events (interrupt, terminate, ...)
//! - `SignalFilter`: the set of signals a listener registers for
//!
//! ## Effect Interfaces
//! - `SignalSource`: registration primitive for external signal delivery
//!
//! All lifecycle transitions are monotonic: once a context reports done, it stays
//! done and keeps reporting the same error.

#![forbid(unsafe_code)]

/// Context trait, done signal and the standard derivations
pub mod context;

/// Pure effect interfaces (no implementations)
pub mod effects;

/// Unified error handling
pub mod errors;

/// Signal identities and filters
pub mod signal;

// === Public API Re-exports ===

pub use context::{
    background, same_context, with_cancel, with_deadline, with_timeout, with_value, CancelHandle,
    Context, ContextExt, ContextRef, ContextValue, Done, DoneTrigger,
};
pub use effects::{SignalSink, SignalSource};
pub use errors::ContextError;
pub use signal::{Signal, SignalFilter, SignalParseError};
