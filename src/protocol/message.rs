//! Frame, handshake and negotiate message types.
//!
//! The hub multiplexes every message kind through one JSON object shape,
//! discriminated by a numeric `type` field. Fields that do not apply to a
//! kind are simply absent.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::{ConnectionId, ConnectionToken, InvocationId};

// ============================================================================
// MessageType
// ============================================================================

/// Numeric `type` discriminator of a frame.
///
/// Kinds this client does not act on are kept as [`MessageType::Other`] so
/// they can be logged and skipped instead of failing the whole frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
pub enum MessageType {
    /// Invocation of a named method (`1`).
    Invocation,
    /// Completion of an earlier invocation (`3`).
    Completion,
    /// Keep-alive (`6`).
    Ping,
    /// Server-initiated close (`7`).
    Close,
    /// Any other code (stream items, cancellations, ...).
    Other(u64),
}

impl MessageType {
    /// Returns the wire code of this type.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u64 {
        match self {
            Self::Invocation => 1,
            Self::Completion => 3,
            Self::Ping => 6,
            Self::Close => 7,
            Self::Other(code) => code,
        }
    }
}

impl From<u64> for MessageType {
    fn from(code: u64) -> Self {
        match code {
            1 => Self::Invocation,
            3 => Self::Completion,
            6 => Self::Ping,
            7 => Self::Close,
            other => Self::Other(other),
        }
    }
}

impl From<MessageType> for u64 {
    fn from(kind: MessageType) -> Self {
        kind.code()
    }
}

// ============================================================================
// Message
// ============================================================================

/// A single decoded frame.
///
/// # Format
///
/// ```json
/// {
///   "type": 1,
///   "invocationId": "4",
///   "target": "GetAttacks",
///   "arguments": [12]
/// }
/// ```
///
/// A frame without `type` (the empty handshake acknowledgement `{}` for
/// instance) decodes with `kind == None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Frame kind.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MessageType>,

    /// Correlation id (invocations expecting a result, completions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<InvocationId>,

    /// Method name (invocations).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Positional arguments (invocations).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<Value>>,

    /// Return value (successful completions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error message (failed completions, close, handshake rejection).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Whether the hub allows reconnecting after a close.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_reconnect: Option<bool>,
}

impl Message {
    /// Creates an invocation frame.
    ///
    /// Pass `None` as `invocation_id` for a fire-and-forget send.
    #[must_use]
    pub fn invocation(
        invocation_id: Option<InvocationId>,
        target: impl Into<String>,
        arguments: Vec<Value>,
    ) -> Self {
        Self {
            kind: Some(MessageType::Invocation),
            invocation_id,
            target: Some(target.into()),
            arguments: Some(arguments),
            ..Self::default()
        }
    }

    /// Creates a successful completion frame.
    #[must_use]
    pub fn completion(invocation_id: InvocationId, result: Value) -> Self {
        Self {
            kind: Some(MessageType::Completion),
            invocation_id: Some(invocation_id),
            result: Some(result),
            ..Self::default()
        }
    }

    /// Creates a failed completion frame.
    #[must_use]
    pub fn completion_error(invocation_id: InvocationId, error: impl Into<String>) -> Self {
        Self {
            kind: Some(MessageType::Completion),
            invocation_id: Some(invocation_id),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Creates a ping frame.
    #[must_use]
    pub fn ping() -> Self {
        Self {
            kind: Some(MessageType::Ping),
            ..Self::default()
        }
    }

    /// Creates a close frame.
    #[must_use]
    pub fn close(error: Option<String>) -> Self {
        Self {
            kind: Some(MessageType::Close),
            error,
            ..Self::default()
        }
    }

    /// Returns `true` for frames routing ignores (`{}` or no `type`).
    #[inline]
    #[must_use]
    pub fn is_keep_alive(&self) -> bool {
        self.kind.is_none()
    }

    /// Returns the arguments, or an empty slice if absent.
    #[inline]
    #[must_use]
    pub fn arguments(&self) -> &[Value] {
        self.arguments.as_deref().unwrap_or_default()
    }
}

// ============================================================================
// HandshakeRequest
// ============================================================================

/// First frame sent on a negotiated connection.
///
/// ```json
/// {"protocol": "json", "version": 1}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HandshakeRequest {
    /// Hub protocol name.
    pub protocol: &'static str,
    /// Hub protocol version.
    pub version: u32,
}

impl HandshakeRequest {
    /// The JSON protocol, version 1.
    pub const JSON: Self = Self {
        protocol: "json",
        version: 1,
    };
}

impl Default for HandshakeRequest {
    fn default() -> Self {
        Self::JSON
    }
}

// ============================================================================
// NegotiateResponse
// ============================================================================

/// Body of the negotiate response.
///
/// ```json
/// {"connectionId": "abc", "connectionToken": "xyz", "negotiateVersion": 1}
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiateResponse {
    /// Connection id.
    #[serde(default)]
    pub connection_id: Option<String>,

    /// Token addressing the connection (negotiate version 1+).
    #[serde(default)]
    pub connection_token: Option<String>,

    /// Negotiate protocol version echoed by the hub.
    #[serde(default)]
    pub negotiate_version: Option<u32>,

    /// Error reported by the hub instead of a connection.
    #[serde(default)]
    pub error: Option<String>,
}

impl NegotiateResponse {
    /// Extracts the connection id and the addressing token.
    ///
    /// The token falls back to the connection id when absent.
    ///
    /// # Errors
    ///
    /// - [`Error::Negotiate`] if the hub reported an error or omitted the
    ///   connection id
    pub fn into_ids(self) -> Result<(ConnectionId, ConnectionToken)> {
        if let Some(error) = self.error {
            return Err(Error::negotiate(error));
        }

        let id = self
            .connection_id
            .filter(|id| !id.is_empty())
            .map(ConnectionId::new)
            .ok_or_else(|| Error::negotiate("response is missing connectionId"))?;

        let token = match self.connection_token.filter(|t| !t.is_empty()) {
            Some(token) => ConnectionToken::new(token),
            None => ConnectionToken::from(&id),
        };

        Ok((id, token))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invocation_serialization() {
        let msg = Message::invocation(Some(InvocationId::new(1)), "GetAttacks", vec![json!(12)]);
        let value = serde_json::to_value(&msg).expect("serialize");

        assert_eq!(
            value,
            json!({
                "type": 1,
                "invocationId": "1",
                "target": "GetAttacks",
                "arguments": [12]
            })
        );
    }

    #[test]
    fn test_send_has_no_invocation_id_but_keeps_empty_arguments() {
        let msg = Message::invocation(None, "SetDisplayName", vec![]);
        let value = serde_json::to_value(&msg).expect("serialize");

        assert_eq!(
            value,
            json!({ "type": 1, "target": "SetDisplayName", "arguments": [] })
        );
    }

    #[test]
    fn test_completion_parse() {
        let msg: Message =
            serde_json::from_str(r#"{"type":3,"invocationId":"1","result":{"ok":true}}"#)
                .expect("parse");

        assert_eq!(msg.kind, Some(MessageType::Completion));
        assert_eq!(msg.invocation_id, Some(InvocationId::new(1)));
        assert_eq!(msg.result, Some(json!({"ok": true})));
        assert!(msg.error.is_none());
    }

    #[test]
    fn test_unknown_type_is_other() {
        let msg: Message = serde_json::from_str(r#"{"type":2,"item":1}"#).expect("parse");
        assert_eq!(msg.kind, Some(MessageType::Other(2)));
    }

    #[test]
    fn test_empty_object_is_keep_alive() {
        let msg: Message = serde_json::from_str("{}").expect("parse");
        assert!(msg.is_keep_alive());
        assert!(msg.arguments().is_empty());
    }

    #[test]
    fn test_message_type_codes() {
        for code in [1, 3, 6, 7, 9] {
            assert_eq!(MessageType::from(code).code(), code);
        }
    }

    #[test]
    fn test_handshake_serialization() {
        let json = serde_json::to_string(&HandshakeRequest::JSON).expect("serialize");
        assert_eq!(json, r#"{"protocol":"json","version":1}"#);
    }

    #[test]
    fn test_negotiate_with_token() {
        let response: NegotiateResponse = serde_json::from_str(
            r#"{"negotiateVersion":1,"connectionId":"id-1","connectionToken":"tok-1"}"#,
        )
        .expect("parse");

        let (id, token) = response.into_ids().expect("ids");
        assert_eq!(id.as_str(), "id-1");
        assert_eq!(token.as_str(), "tok-1");
    }

    #[test]
    fn test_negotiate_token_falls_back_to_id() {
        let response: NegotiateResponse =
            serde_json::from_str(r#"{"connectionId":"id-2"}"#).expect("parse");

        let (_, token) = response.into_ids().expect("ids");
        assert_eq!(token.as_str(), "id-2");
    }

    #[test]
    fn test_negotiate_error() {
        let response: NegotiateResponse =
            serde_json::from_str(r#"{"error":"Hub is shutting down"}"#).expect("parse");

        let err = response.into_ids().unwrap_err();
        assert!(matches!(err, Error::Negotiate { .. }));
        assert!(err.to_string().contains("shutting down"));
    }

    #[test]
    fn test_negotiate_missing_id() {
        let err = NegotiateResponse::default().into_ids().unwrap_err();
        assert!(matches!(err, Error::Negotiate { .. }));
    }
}
