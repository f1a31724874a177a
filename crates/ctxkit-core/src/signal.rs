//! Signal identities and filters
//!
//! Signals are opaque named events delivered from outside the context tree. The
//! set is platform-neutral; mapping to OS signal numbers lives in `ctxkit-effects`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An externally delivered named event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// SIGINT / Ctrl+C
    Interrupt,
    /// SIGTERM
    Terminate,
    /// SIGHUP
    Hangup,
    /// SIGQUIT
    Quit,
    /// SIGUSR1
    User1,
    /// SIGUSR2
    User2,
}

impl Signal {
    /// Every signal ctxkit knows how to name
    pub const ALL: [Signal; 6] = [
        Signal::Interrupt,
        Signal::Terminate,
        Signal::Hangup,
        Signal::Quit,
        Signal::User1,
        Signal::User2,
    ];

    /// Conventional short name, e.g. `SIGINT`
    pub fn short_name(&self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Hangup => "SIGHUP",
            Signal::Quit => "SIGQUIT",
            Signal::User1 => "SIGUSR1",
            Signal::User2 => "SIGUSR2",
        }
    }

    fn long_name(&self) -> &'static str {
        match self {
            Signal::Interrupt => "interrupt",
            Signal::Terminate => "terminate",
            Signal::Hangup => "hangup",
            Signal::Quit => "quit",
            Signal::User1 => "user1",
            Signal::User2 => "user2",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Same wording as strsignal(3)
        let description = match self {
            Signal::Interrupt => "interrupt",
            Signal::Terminate => "terminated",
            Signal::Hangup => "hangup",
            Signal::Quit => "quit",
            Signal::User1 => "user defined signal 1",
            Signal::User2 => "user defined signal 2",
        };
        f.write_str(description)
    }
}

/// Error returned when a signal name is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown signal: {name}")]
pub struct SignalParseError {
    /// The rejected input
    pub name: String,
}

impl FromStr for Signal {
    type Err = SignalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        let bare = normalized.strip_prefix("SIG").unwrap_or(&normalized);

        Signal::ALL
            .into_iter()
            .find(|signal| {
                let short = &signal.short_name()[3..];
                bare == short || bare.eq_ignore_ascii_case(signal.long_name())
            })
            .ok_or_else(|| SignalParseError {
                name: s.to_string(),
            })
    }
}

/// Set of signals a listener registers for
///
/// An empty filter means "whatever the source delivers when given no filter".
/// It is not a wildcard on its own; the source decides what that covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalFilter {
    signals: Vec<Signal>,
}

impl SignalFilter {
    /// Filter with no entries: listen for anything the source delivers
    pub fn any() -> Self {
        Self::default()
    }

    /// Filter restricted to the given signals
    pub fn only(signals: impl IntoIterator<Item = Signal>) -> Self {
        signals.into_iter().collect()
    }

    /// Whether the filter is empty
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Whether `signal` passes the filter
    pub fn matches(&self, signal: Signal) -> bool {
        self.signals.is_empty() || self.signals.contains(&signal)
    }

    /// Registered signals in insertion order
    pub fn iter(&self) -> impl Iterator<Item = Signal> + '_ {
        self.signals.iter().copied()
    }

    /// Signals to register with a source whose full deliverable set is `all`
    pub fn resolve(&self, all: &[Signal]) -> Vec<Signal> {
        if self.signals.is_empty() {
            all.to_vec()
        } else {
            self.signals.clone()
        }
    }
}

impl FromIterator<Signal> for SignalFilter {
    fn from_iter<I: IntoIterator<Item = Signal>>(iter: I) -> Self {
        let mut signals = Vec::new();
        for signal in iter {
            if !signals.contains(&signal) {
                signals.push(signal);
            }
        }
        Self { signals }
    }
}

impl From<Vec<Signal>> for SignalFilter {
    fn from(signals: Vec<Signal>) -> Self {
        signals.into_iter().collect()
    }
}

impl<const N: usize> From<[Signal; N]> for SignalFilter {
    fn from(signals: [Signal; N]) -> Self {
        signals.into_iter().collect()
    }
}

impl From<Signal> for SignalFilter {
    fn from(signal: Signal) -> Self {
        Self {
            signals: vec![signal],
        }
    }
}

impl fmt::Display for SignalFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.signals.is_empty() {
            return f.write_str("any");
        }
        let names: Vec<&str> = self.signals.iter().map(Signal::short_name).collect();
        f.write_str(&names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_accepts_all_spellings() {
        for input in ["interrupt", "INT", "sigint", "SIGINT", " Interrupt "] {
            assert_eq!(input.parse::<Signal>().unwrap(), Signal::Interrupt, "{input}");
        }
        assert_eq!("term".parse::<Signal>().unwrap(), Signal::Terminate);
        assert_eq!("SIGUSR2".parse::<Signal>().unwrap(), Signal::User2);
        assert_eq!("user1".parse::<Signal>().unwrap(), Signal::User1);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "SIGWINCH".parse::<Signal>().unwrap_err();
        assert_eq!(err.name, "SIGWINCH");
        assert!("".parse::<Signal>().is_err());
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = SignalFilter::any();
        assert!(filter.is_empty());
        for signal in Signal::ALL {
            assert!(filter.matches(signal));
        }
        assert_eq!(filter.resolve(&Signal::ALL), Signal::ALL.to_vec());
    }

    #[test]
    fn test_non_empty_filter_is_exclusive() {
        let filter = SignalFilter::only([Signal::Terminate, Signal::Terminate, Signal::Hangup]);
        assert!(filter.matches(Signal::Terminate));
        assert!(!filter.matches(Signal::Interrupt));
        assert_eq!(
            filter.iter().collect::<Vec<_>>(),
            vec![Signal::Terminate, Signal::Hangup]
        );
        assert_eq!(filter.to_string(), "SIGTERM,SIGHUP");
    }

    fn any_signal() -> impl Strategy<Value = Signal> {
        prop::sample::select(Signal::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_filter_matches_exactly_its_members(
            members in prop::collection::vec(any_signal(), 1..6),
            probe in any_signal(),
        ) {
            let filter = SignalFilter::only(members.clone());
            prop_assert_eq!(filter.matches(probe), members.contains(&probe));
            prop_assert!(filter.iter().count() <= members.len());
            prop_assert_eq!(filter.resolve(&Signal::ALL), filter.iter().collect::<Vec<_>>());
        }

        #[test]
        fn prop_every_spelling_parses_back(signal in any_signal()) {
            prop_assert_eq!(signal.short_name().parse::<Signal>().unwrap(), signal);
            prop_assert_eq!(signal.short_name()[3..].to_lowercase().parse::<Signal>().unwrap(), signal);
        }
    }
}
