//! Live-channel state machine.
//!
//! Models the lifecycle of the reconnecting device channel with
//! validated transitions that return `Result` instead of panicking.

use std::time::Instant;

use crate::error::SketchError;

// ── ChannelState ─────────────────────────────────────────────────

/// The current phase of the live device channel.
///
/// ```text
///  Connecting ──► Open
///      ▲           │
///      │           ▼
///      └──────── Closed        (re-entered after the backoff delay,
///                               indefinitely — the channel heals forever)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelState {
    /// A connection attempt is in flight. Initial state.
    #[default]
    Connecting,

    /// The channel is established; frames may be sent.
    Open {
        /// When the channel entered the `Open` state.
        since: Instant,
    },

    /// The channel was lost or refused; waiting out the backoff.
    Closed,
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "Connecting"),
            Self::Open { .. } => write!(f, "Open"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

impl ChannelState {
    /// Returns `true` when frames may be handed to the channel.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// How long the channel has been open, `None` in any other state.
    pub fn open_duration(&self) -> Option<std::time::Duration> {
        match self {
            Self::Open { since } => Some(since.elapsed()),
            _ => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Transition to `Open`.
    ///
    /// Valid from: `Connecting`.
    pub fn opened(&mut self) -> Result<(), SketchError> {
        match self {
            Self::Connecting => {
                *self = Self::Open {
                    since: Instant::now(),
                };
                Ok(())
            }
            _ => Err(SketchError::ProtocolViolation(
                "cannot open: not in Connecting state",
            )),
        }
    }

    /// Transition to `Closed` from any state.
    ///
    /// Infallible: a transport error can strike during connect or
    /// mid-stream alike.
    pub fn lost(&mut self) {
        *self = Self::Closed;
    }

    /// Transition back to `Connecting` for the next attempt.
    ///
    /// Valid from: `Closed`.
    pub fn retry(&mut self) -> Result<(), SketchError> {
        match self {
            Self::Closed => {
                *self = Self::Connecting;
                Ok(())
            }
            _ => Err(SketchError::ProtocolViolation(
                "cannot retry: not in Closed state",
            )),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_lifecycle() {
        let mut state = ChannelState::default();
        assert_eq!(state, ChannelState::Connecting);

        state.opened().unwrap();
        assert!(state.is_open());
        assert!(state.open_duration().is_some());

        state.lost();
        assert!(state.is_closed());

        state.retry().unwrap();
        assert_eq!(state, ChannelState::Connecting);
    }

    #[test]
    fn invalid_open_from_closed() {
        let mut state = ChannelState::Closed;
        assert!(state.opened().is_err());
    }

    #[test]
    fn invalid_retry_while_open() {
        let mut state = ChannelState::Connecting;
        state.opened().unwrap();
        assert!(state.retry().is_err());
    }

    #[test]
    fn lost_from_any_state() {
        let mut state = ChannelState::Connecting;
        state.lost();
        assert!(state.is_closed());

        let mut state = ChannelState::Closed;
        state.lost();
        assert!(state.is_closed());
    }

    #[test]
    fn display_format() {
        assert_eq!(ChannelState::Connecting.to_string(), "Connecting");
        assert_eq!(ChannelState::Closed.to_string(), "Closed");
        assert_eq!(
            ChannelState::Open {
                since: Instant::now()
            }
            .to_string(),
            "Open"
        );
    }
}
