//! Hub Long-Poll - Duplex RPC client over HTTP long-polling.
//!
//! This library keeps a logical persistent connection to a message hub
//! alive using nothing but plain HTTP requests: it negotiates a session,
//! performs the JSON protocol handshake, and continuously long-polls for
//! frames the hub pushes.
//!
//! # Architecture
//!
//! The client follows a session-per-handle model:
//!
//! - **Outbound**: `invoke` and `send` POST invocation frames to the session
//! - **Inbound**: a background poll loop GETs batches of frames and routes
//!   them to handlers or to waiting invocations
//!
//! Key design principles:
//!
//! - Each [`HubClient`] owns one session (shared by all clones)
//! - Frames are JSON objects delimited by the `0x1E` record separator
//! - Invocations are correlated with completions by id, each with a deadline
//! - Connection loss triggers bounded exponential backoff and a full
//!   renegotiation, followed by an owner-supplied resync hook
//!
//! # Quick Start
//!
//! ```no_run
//! use hub_longpoll::{HubClient, Result};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = HubClient::builder()
//!         .url("https://example.com/hubs/warroom")
//!         .access_token("eyJhbGciOi...")
//!         .on_reconnect(|client| async move {
//!             client.send("SetDisplayName", vec![json!("Ghost")]).await;
//!             Ok(())
//!         })
//!         .build()?;
//!
//!     client.on("AttackUpdate", |args| {
//!         println!("attack update: {args:?}");
//!         Ok(())
//!     });
//!
//!     client.start().await?;
//!     let rooms = client.invoke("GetWarRooms", vec![]).await?;
//!     println!("war rooms: {rooms}");
//!
//!     client.stop();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`HubClient`], its builder and options |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Frame types and codec |
//! | [`session`] | Lifecycle states, events and reconnection policy |
//! | [`transport`] | HTTP transport trait and reqwest implementation |

// ============================================================================
// Modules
// ============================================================================

/// Client facade and configuration.
///
/// Use [`HubClient::builder()`] to create a configured client.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for sessions and invocations.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Hub protocol message types and framing.
pub mod protocol;

/// Session lifecycle, poll loop and reconnection.
pub mod session;

/// HTTP transport layer.
///
/// Implement [`HttpTransport`] to run the client over another HTTP stack.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{ClientOptions, HubClient, HubClientBuilder};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ConnectionId, ConnectionToken, InvocationId};

// Protocol types
pub use protocol::{ChangeKind, Message, MessageType};

// Session types
pub use session::{
    ConnectionEvent, HandlerError, HandlerResult, ReconnectPolicy, ResyncHook, SessionState,
};

// Transport types
pub use transport::{HttpTransport, ReqwestTransport};
