//! Public client handle.
//!
//! # Example
//!
//! ```no_run
//! use hub_longpoll::{HubClient, Result};
//! use serde_json::json;
//!
//! # async fn example() -> Result<()> {
//! let client = HubClient::builder()
//!     .url("https://example.com/hubs/warroom")
//!     .access_token("eyJhbGciOi...")
//!     .build()?;
//!
//! client.on("ReceiveMessage", |args| {
//!     println!("message: {args:?}");
//!     Ok(())
//! });
//!
//! client.start().await?;
//! let attacks = client.invoke("GetAttacks", vec![json!(12)]).await?;
//! client.stop();
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::error::Result;
use crate::identifiers::ConnectionId;
use crate::session::{HandlerResult, Session, SessionState};

use super::builder::HubClientBuilder;

// ============================================================================
// HubClient
// ============================================================================

/// Duplex RPC client for a long-polling hub.
///
/// Cheap to clone; all clones share one session.
///
/// # Thread Safety
///
/// `HubClient` is `Send + Sync`. Invocations, sends and handler
/// registrations may run concurrently with the poll loop.
#[derive(Clone)]
pub struct HubClient {
    pub(crate) session: Arc<Session>,
}

impl fmt::Debug for HubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubClient")
            .field("hub_url", &self.session.hub_url().as_str())
            .field("state", &self.session.state())
            .field("connection_id", &self.session.connection_id())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// HubClient - Public API
// ============================================================================

impl HubClient {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> HubClientBuilder {
        HubClientBuilder::new()
    }

    /// Connects to the hub and starts polling.
    ///
    /// Returns once negotiate and handshake succeeded; polling continues in
    /// the background. Restores the full reconnect budget. Does nothing if
    /// already running.
    ///
    /// # Errors
    ///
    /// - [`Error::Negotiate`](crate::Error::Negotiate) if the hub refused the session
    /// - [`Error::Handshake`](crate::Error::Handshake) if the hub rejected the protocol
    /// - [`Error::Http`](crate::Error::Http) / [`Error::Network`](crate::Error::Network)
    ///   on transport failure
    /// - [`Error::Protocol`](crate::Error::Protocol) if a connection attempt is
    ///   already in progress
    pub async fn start(&self) -> Result<()> {
        self.session.start().await
    }

    /// Stops the client.
    ///
    /// Pending invocations fail with `ConnectionClosed`; no reconnection
    /// happens until the next [`start`](Self::start).
    pub fn stop(&self) {
        self.session.stop();
    }

    /// Invokes a hub method and waits for its result.
    ///
    /// A completion without `result` yields `Value::Null`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotRunning`](crate::Error::NotRunning) if the client is not running
    /// - [`Error::InvocationTimeout`](crate::Error::InvocationTimeout) after the deadline
    /// - [`Error::Hub`](crate::Error::Hub) if the hub reported an error
    /// - [`Error::ConnectionClosed`](crate::Error::ConnectionClosed) if the
    ///   session was torn down first
    pub async fn invoke(&self, method: &str, arguments: Vec<Value>) -> Result<Value> {
        self.session.invoke(method, arguments).await
    }

    /// Invokes a hub method and deserializes its result.
    ///
    /// # Errors
    ///
    /// Same as [`invoke`](Self::invoke), plus
    /// [`Error::Json`](crate::Error::Json) if the result does not match `T`.
    pub async fn invoke_as<T>(&self, method: &str, arguments: Vec<Value>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let value = self.invoke(method, arguments).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Sends a hub method without waiting for a result.
    ///
    /// Does nothing when not running; failures are logged.
    pub async fn send(&self, method: &str, arguments: Vec<Value>) {
        self.session.send(method, arguments).await;
    }

    /// Registers a handler for hub invocations of `method`.
    ///
    /// Matching is case-insensitive and registrations accumulate. Errors
    /// and panics from the handler are logged and do not affect other
    /// handlers.
    pub fn on<F>(&self, method: &str, handler: F)
    where
        F: Fn(&[Value]) -> HandlerResult + Send + Sync + 'static,
    {
        self.session.on(method, Arc::new(handler));
    }

    /// Registers a handler receiving the first argument deserialized as `T`.
    ///
    /// A missing argument is deserialized from `null`. Deserialization
    /// failures are logged like handler errors.
    pub fn on_arg<T, F>(&self, method: &str, handler: F)
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(method, move |arguments| {
            let first = arguments.first().cloned().unwrap_or(Value::Null);
            handler(serde_json::from_value(first)?)
        });
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Returns `true` if invocations are accepted.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    /// Returns the connection id of the current session.
    #[inline]
    #[must_use]
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.session.connection_id()
    }

    /// Returns the number of invocations awaiting completion.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.session.pending_count()
    }

    /// Returns the number of reconnect attempts since the last good poll.
    #[inline]
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.session.reconnect_attempts()
    }

    /// Returns the hub URL.
    #[inline]
    #[must_use]
    pub fn hub_url(&self) -> &Url {
        self.session.hub_url()
    }
}

// ============================================================================
// HubClient - Internal
// ============================================================================

impl HubClient {
    pub(crate) fn from_session(session: Arc<Session>) -> Self {
        Self { session }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use serde::Deserialize;
    use serde_json::json;

    use crate::error::Error;
    use crate::protocol::{ChangeKind, Message};
    use crate::transport::HttpTransport;
    use crate::transport::scripted::ScriptedTransport;

    fn client(transport: &Arc<ScriptedTransport>) -> HubClient {
        let shared: Arc<dyn HttpTransport> = transport.clone();
        HubClient::builder()
            .url("https://hub.test/hubs/warroom")
            .access_token("secret")
            .shared_transport(shared)
            .build()
            .expect("build")
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct AttackUpdate {
        attack_id: u64,
        event_type: ChangeKind,
    }

    #[test]
    fn test_client_is_clone_send_sync() {
        fn assert_traits<T: Clone + Send + Sync + fmt::Debug>() {}
        assert_traits::<HubClient>();
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_as_deserializes_result() {
        let transport = ScriptedTransport::new();
        transport.respond_with(|frame| {
            frame
                .invocation_id
                .clone()
                .map(|id| Message::completion(id, json!([1, 2, 3])))
        });
        let client = client(&transport);
        client.start().await.expect("start");

        let ids: Vec<u64> = client.invoke_as("GetAttackIds", vec![]).await.expect("invoke");
        assert_eq!(ids, [1, 2, 3]);

        let err = client
            .invoke_as::<String>("GetAttackIds", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_arg_deserializes_first_argument() {
        let transport = ScriptedTransport::new();
        let client = client(&transport);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        client.on_arg("attackupdate", move |update: AttackUpdate| {
            sink.lock().push(update);
            Ok(())
        });
        client.start().await.expect("start");

        transport.push_frames(&[
            Message::invocation(
                None,
                "AttackUpdate",
                vec![json!({"attackId": 7, "eventType": "Done"})],
            ),
            Message::invocation(None, "AttackUpdate", vec![json!("garbage")]),
            Message::invocation(
                None,
                "AttackUpdate",
                vec![json!({"attackId": 8, "eventType": 1})],
            ),
        ]);
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        assert_eq!(
            *seen.lock(),
            [
                AttackUpdate {
                    attack_id: 7,
                    event_type: ChangeKind::Done
                },
                AttackUpdate {
                    attack_id: 8,
                    event_type: ChangeKind::Updated
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_introspection() {
        let transport = ScriptedTransport::new();
        let client = client(&transport);
        assert_eq!(client.connection_id(), None);

        client.start().await.expect("start");
        assert!(client.is_running());
        assert_eq!(client.connection_id(), Some(ConnectionId::new("conn-1")));
        assert_eq!(client.pending_count(), 0);
        assert_eq!(client.reconnect_attempts(), 0);

        let clone = client.clone();
        clone.stop();
        assert_eq!(client.state(), SessionState::Stopped);
        assert!(format!("{client:?}").contains("Stopped"));
    }
}
