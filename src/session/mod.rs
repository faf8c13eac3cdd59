//! Hub session lifecycle.
//!
//! This module owns everything between the public client and the HTTP
//! transport: the state machine, the poll loop, correlation of
//! invocations with their completions, and reconnection.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SessionState`] | Lifecycle state machine |
//! | [`ConnectionEvent`] | Owner notifications |
//! | [`ReconnectPolicy`] | Backoff schedule and attempt budget |
//! | [`ResyncHook`] | Post-reconnect resynchronization callback |
//! | [`InvocationHandler`] | Callback for hub-initiated invocations |

// ============================================================================
// Submodules
// ============================================================================

/// Session state machine and poll loop.
pub(crate) mod core;

/// Handlers for hub-initiated invocations.
pub mod handlers;

/// In-flight invocation table.
pub(crate) mod pending;

/// Backoff policy and resync hook.
pub mod reconnect;

/// Lifecycle states and events.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub(crate) use self::core::Session;
pub use handlers::{HandlerError, HandlerResult, InvocationHandler};
pub use reconnect::{ReconnectPolicy, ResyncHook};
pub use state::{ConnectionEvent, LifecycleHandler, SessionState};
