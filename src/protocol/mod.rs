//! Hub wire protocol types.
//!
//! This module defines the JSON framing spoken over the long-polling
//! transport and the negotiate/handshake payloads that precede it.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | `NegotiateResponse` | Hub → Client | Connection id and token |
//! | `HandshakeRequest` | Client → Hub | Select the JSON protocol |
//! | `Message` type 1 | Both | Invocation of a named method |
//! | `Message` type 3 | Hub → Client | Completion of a client invocation |
//! | `Message` type 6 | Hub → Client | Keep-alive ping |
//! | `Message` type 7 | Hub → Client | Authoritative close |
//!
//! Every frame is a JSON object terminated by the ASCII record separator
//! (`0x1E`). A single poll response may carry several frames.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `change` | Canonical change-kind enumeration for pushed payloads |
//! | `codec` | Record-separator framing |
//! | `message` | Frame, handshake and negotiate types |

// ============================================================================
// Submodules
// ============================================================================

/// Change-kind normalization for application payloads.
pub mod change;

/// Record-separator frame codec.
pub mod codec;

/// Frame, handshake and negotiate message types.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use change::ChangeKind;
pub use codec::{RECORD_SEPARATOR, decode, encode};
pub use message::{HandshakeRequest, Message, MessageType, NegotiateResponse};
