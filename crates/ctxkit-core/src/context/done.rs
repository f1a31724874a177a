//! One-shot completion signal carrying the context error
//!
//! The error is the payload of the done transition itself, so a reader that
//! observes done always observes the error with it. There is never a window in
//! which a context is done but its error is unset.

use crate::errors::ContextError;
use std::sync::Arc;
use tokio::sync::watch;

/// Reader half of a context's completion signal
///
/// Cloning is cheap; every clone observes the same transition.
#[derive(Debug, Clone)]
pub struct Done {
    rx: Option<watch::Receiver<Option<ContextError>>>,
}

impl Done {
    /// A signal that never fires
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Whether this signal can ever fire
    pub fn is_never(&self) -> bool {
        self.rx.is_none()
    }

    /// Non-blocking check
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// The recorded error, once done
    pub fn err(&self) -> Option<ContextError> {
        self.rx.as_ref().and_then(|rx| *rx.borrow())
    }

    /// Resolves with the recorded error once done
    ///
    /// Pends forever for `Done::never()`, and for a signal whose writer was
    /// dropped without firing.
    pub async fn wait(&self) -> ContextError {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            let current = *rx.borrow_and_update();
            if let Some(err) = current {
                return err;
            }
            if rx.changed().await.is_err() {
                let last = *rx.borrow();
                return match last {
                    Some(err) => err,
                    None => std::future::pending().await,
                };
            }
        }
    }
}

/// Writer half of a context's completion signal
#[derive(Debug, Clone)]
pub struct DoneTrigger {
    tx: Arc<watch::Sender<Option<ContextError>>>,
}

impl DoneTrigger {
    /// Create a trigger that has not fired
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// A reader for this trigger
    pub fn done(&self) -> Done {
        Done {
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Whether the trigger has fired
    pub fn is_fired(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Record `err` and publish done
    ///
    /// Only the first call has an effect; it returns `true`. Later calls leave
    /// the recorded error untouched and return `false`.
    pub fn fire(&self, err: ContextError) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(err);
            true
        })
    }
}

impl Default for DoneTrigger {
    fn default() -> Self {
        Self::new()
    }
}
