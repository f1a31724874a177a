//! ctxkit Effects - Production Handlers
//!
//! Stateless implementations of the effect interfaces declared in `ctxkit-core`.
//!
//! **Layer Constraint**: NO mock handlers - those belong in `ctxkit-testkit`.

#![forbid(unsafe_code)]

/// OS signal delivery through `tokio::signal`
pub mod signal;

pub use signal::OsSignalSource;
