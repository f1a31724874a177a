//! Watch command
//!
//! Simulates the detached-task pattern: request-scoped values are attached to a
//! short-lived request context, the request ends, and a task context that lives
//! until a signal (or the optional timeout) keeps reading those values.

use crate::config::WatchConfig;
use anyhow::{Context as _, Result};
use clap::Args;
use ctxkit::{
    background, copy_values, with_cancel, with_timeout, with_value, CancelHandle, Context,
    ContextError, ContextExt, ContextRef, Signal, SignalContext, SignalSource, ValueCopy,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Wait for a signal or timeout under a signal-aware context
#[derive(Args, Debug, Default)]
pub struct WatchCommand {
    /// Signal to listen for (repeatable); none listens for any
    #[arg(short, long = "signal", value_name = "SIGNAL")]
    pub signals: Vec<Signal>,

    /// Give up after this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Request-scoped value carried onto the task context (KEY=VALUE, repeatable)
    #[arg(long = "value", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub values: Vec<(String, String)>,
}

impl WatchCommand {
    /// Layer command-line flags over the loaded configuration
    pub fn apply(self, config: &mut WatchConfig) {
        if !self.signals.is_empty() {
            config.signals = self.signals;
        }
        if self.timeout_ms.is_some() {
            config.timeout_ms = self.timeout_ms;
        }
        config.values.extend(self.values);
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("expected KEY=VALUE, got {raw:?}"))?;
    if key.is_empty() {
        anyhow::bail!("empty key in {raw:?}");
    }
    Ok((key.to_string(), value.to_string()))
}

/// How a watch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// A signal arrived
    Signal(Signal),
    /// The timeout elapsed
    TimedOut,
    /// The context was cancelled some other way
    Cancelled,
}

impl From<ContextError> for WatchOutcome {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::SignalReceived { signal } => Self::Signal(signal),
            ContextError::DeadlineExceeded => Self::TimedOut,
            ContextError::Canceled => Self::Cancelled,
        }
    }
}

impl fmt::Display for WatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(signal) => write!(f, "stopped by signal: {signal}"),
            Self::TimedOut => f.write_str("timed out"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// A prepared watch, armed and waiting
pub struct Watch {
    task: Arc<ValueCopy>,
    keys: Vec<String>,
    _cancel: CancelHandle,
}

impl Watch {
    /// Build the context tree and register with `source`
    ///
    /// Registration is complete on return.
    pub fn arm(config: &WatchConfig, source: &dyn SignalSource) -> Result<Self> {
        config.validate().context("invalid watch configuration")?;

        let (request, end_request) = with_cancel(background());
        let request: ContextRef = config
            .values
            .iter()
            .fold(request, |ctx, (key, value)| {
                with_value(ctx, key.clone(), value.clone())
            });

        let signals: ContextRef = SignalContext::with_source(background(), config.filter(), source);
        let (lifecycle, cancel) = match config.timeout() {
            Some(timeout) => with_timeout(signals, timeout),
            None => with_cancel(signals),
        };

        let task = copy_values(request, lifecycle);
        // The request is over; the task keeps its values, not its lifecycle.
        end_request.cancel();

        info!(filter = %config.filter(), timeout_ms = ?config.timeout_ms, "watching");
        Ok(Self {
            task,
            keys: config.values.keys().cloned().collect(),
            _cancel: cancel,
        })
    }

    /// Wait for the task context to end
    pub async fn wait(&self) -> WatchOutcome {
        let err = self.task.done().wait().await;
        for key in &self.keys {
            if let Some(value) = self.task.value_as::<String>(key) {
                debug!(%key, %value, "value still visible after request ended");
            }
        }
        WatchOutcome::from(err)
    }
}

/// Handle watch command execution
pub async fn handle_watch_command(
    cmd: WatchCommand,
    mut config: WatchConfig,
    source: &dyn SignalSource,
) -> Result<WatchOutcome> {
    cmd.apply(&mut config);
    let watch = Watch::arm(&config, source)?;
    let outcome = watch.wait().await;
    info!(%outcome, "watch finished");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxkit_testkit::{assert_valid, FakeSignalSource};

    fn config_with_values() -> WatchConfig {
        let mut config = WatchConfig::default();
        config
            .values
            .insert("request_id".to_string(), "req-1".to_string());
        config
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("user=alice=admin").unwrap(),
            ("user".to_string(), "alice=admin".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = config_with_values();
        config.signals = vec![Signal::Hangup];

        WatchCommand {
            signals: vec![Signal::Terminate],
            timeout_ms: Some(5),
            values: vec![("trace".to_string(), "t".to_string())],
        }
        .apply(&mut config);

        assert_eq!(config.signals, vec![Signal::Terminate]);
        assert_eq!(config.timeout_ms, Some(5));
        assert_eq!(config.values.len(), 2);

        WatchCommand::default().apply(&mut config);
        assert_eq!(config.signals, vec![Signal::Terminate]);
    }

    #[tokio::test]
    async fn test_signal_ends_watch_and_values_survive_request() {
        let source = FakeSignalSource::new();
        let watch = Watch::arm(&config_with_values(), &source).unwrap();

        assert_valid(&*watch.task).await;
        assert_eq!(
            watch
                .task
                .value_as::<String>("request_id")
                .as_deref()
                .map(String::as_str),
            Some("req-1")
        );

        source.raise(Signal::Interrupt);
        assert_eq!(watch.wait().await, WatchOutcome::Signal(Signal::Interrupt));
    }

    #[tokio::test]
    async fn test_timeout_ends_watch() {
        let source = FakeSignalSource::new();
        let config = WatchConfig {
            timeout_ms: Some(20),
            ..WatchConfig::default()
        };
        let outcome = handle_watch_command(WatchCommand::default(), config, &source)
            .await
            .unwrap();
        assert_eq!(outcome, WatchOutcome::TimedOut);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let source = FakeSignalSource::new();
        let config = WatchConfig {
            timeout_ms: Some(0),
            ..WatchConfig::default()
        };
        assert!(Watch::arm(&config, &source).is_err());
        assert_eq!(source.registration_count(), 0);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(
            WatchOutcome::Signal(Signal::Terminate).to_string(),
            "stopped by signal: terminated"
        );
        assert_eq!(
            WatchOutcome::from(ContextError::DeadlineExceeded),
            WatchOutcome::TimedOut
        );
    }
}
