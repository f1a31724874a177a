//! Effect interfaces
//!
//! Traits for the side effects ctxkit depends on. Production handlers live in
//! `ctxkit-effects`; controllable test doubles live in `ctxkit-testkit`.

pub mod signal;

pub use signal::{SignalSink, SignalSource};
