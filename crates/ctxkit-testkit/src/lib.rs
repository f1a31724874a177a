//! ctxkit Testing Infrastructure
//!
//! Shared helpers for driving contexts deterministically in tests: a signal
//! source that delivers only when told to, assertions over the done lifecycle
//! with a bounded observation window, and a one-time tracing setup.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! ctxkit-testkit = { path = "../ctxkit-testkit" }
//! ```
//!
//! ```rust,ignore
//! use ctxkit_testkit::{assert_done, FakeSignalSource};
//!
//! let source = FakeSignalSource::new();
//! let ctx = SignalContext::with_source(background(), SignalFilter::any(), &source);
//! source.raise(Signal::Interrupt);
//! assert_done(ctx.as_ref()).await;
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod assertions;
pub mod logging;
pub mod signal;

pub use assertions::{
    assert_cancelled, assert_deadlined, assert_done, assert_not_done, assert_valid,
    SHORT_DURATION,
};
pub use logging::init_test_logging;
pub use signal::FakeSignalSource;
