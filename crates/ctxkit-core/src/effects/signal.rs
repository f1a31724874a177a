//! Signal delivery effect
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `ctxkit-effects` (OS signals), `ctxkit-testkit` (fake)
//! - **Usage**: `SignalContext` registration

use crate::signal::{Signal, SignalFilter};
use std::fmt;
use tokio::sync::mpsc;

/// Delivery channel handed to a signal source
pub type SignalSink = mpsc::Sender<Signal>;

/// Registration primitive for external signals
///
/// `notify` must finish registering before it returns: a signal raised right
/// after the call has to reach `sink`. An empty filter asks for everything the
/// source is able to deliver. Delivery should never block; a source drops a
/// signal rather than wait on a full sink, and stops delivering once the sink's
/// receiver is gone.
pub trait SignalSource: Send + Sync + fmt::Debug {
    /// Register `sink` for signals matching `filter`
    fn notify(&self, sink: SignalSink, filter: &SignalFilter);
}
