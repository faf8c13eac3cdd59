//! Session lifecycle states and owner notifications.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::identifiers::ConnectionId;

// ============================================================================
// SessionState
// ============================================================================

/// Lifecycle state of a hub session.
///
/// ```text
/// Idle ──start──► Negotiating ──► HandshakeSent ──► Running
///                      ▲                              │ connection lost
///                      │                              ▼
///   Stopped ◄──────────┴───── budget exhausted ── Reconnecting
/// ```
///
/// `stop()`, a server close, or an exhausted reconnect budget all end in
/// `Stopped`; a fresh `start()` leaves it again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Constructed, never started.
    #[default]
    Idle,
    /// Negotiate request in flight.
    Negotiating,
    /// Handshake posted, waiting for the acknowledgement poll.
    HandshakeSent,
    /// Poll loop active; invocations accepted.
    Running,
    /// Tearing down and re-establishing the session after connection loss.
    Reconnecting,
    /// Halted; requires an explicit `start()`.
    Stopped,
}

impl SessionState {
    /// Returns `true` if invocations are accepted.
    #[inline]
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns `true` while a start or reconnect is establishing a session.
    #[inline]
    #[must_use]
    pub const fn is_connecting(self) -> bool {
        matches!(
            self,
            Self::Negotiating | Self::HandshakeSent | Self::Reconnecting
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Negotiating => "negotiating",
            Self::HandshakeSent => "handshake-sent",
            Self::Running => "running",
            Self::Reconnecting => "reconnecting",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

// ============================================================================
// ConnectionEvent
// ============================================================================

/// Asynchronous notification about the connection, delivered to the owner.
///
/// Poll-loop and reconnection failures never surface at unrelated call
/// sites; they arrive here instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// `start()` completed negotiate and handshake.
    Connected {
        /// Connection id assigned by the hub.
        connection_id: ConnectionId,
    },

    /// A reconnect attempt is scheduled.
    Reconnecting {
        /// Attempt number, starting at 1.
        attempt: u32,
        /// Backoff before the attempt.
        delay: Duration,
    },

    /// The session was re-established and resynchronized.
    Reconnected {
        /// Connection id of the new session.
        connection_id: ConnectionId,
    },

    /// The session was re-established but the resync hook failed.
    ResyncFailed {
        /// Error reported by the hook.
        message: String,
    },

    /// Reconnect budget exhausted; the session is stopped.
    ConnectionLost,

    /// The hub closed the session.
    Closed {
        /// Close reason sent by the hub, if any.
        error: Option<String>,
    },
}

/// Owner callback for [`ConnectionEvent`]s.
///
/// Called on the poll-loop task; keep it short and non-blocking.
pub type LifecycleHandler = Arc<dyn Fn(&ConnectionEvent) + Send + Sync>;

// ============================================================================
// Tests
// ============================================================================
