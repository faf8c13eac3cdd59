//! Public client facade.
//!
//! This module is the entry point for talking to a hub.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`HubClient`] | Start, stop, invoke, send, register handlers |
//! | [`HubClientBuilder`] | Fluent configuration builder |
//! | [`ClientOptions`] | Timeouts and reconnection policy |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Client handle.
pub mod core;

/// Timing options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::HubClient;
pub use builder::HubClientBuilder;
pub use options::ClientOptions;
