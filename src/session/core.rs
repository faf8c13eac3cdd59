//! Long-poll session: negotiate, handshake, poll loop and reconnection.
//!
//! One [`Session`] backs every clone of a `HubClient`. It owns the state
//! machine and spawns a single poll-loop task per `start()`.
//!
//! # Poll Loop
//!
//! The loop task handles:
//!
//! - Long-poll GETs against the session endpoint
//! - Routing decoded frames to handlers and pending calls
//! - Pausing on transient poll failures
//! - Running the reconnection controller on connection loss
//!
//! Every `start()` and `stop()` bumps a generation counter. A loop whose
//! generation is stale stops routing and exits at its next check.

// ============================================================================
// Imports
// ============================================================================

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::client::{ClientOptions, HubClient};
use crate::error::{Error, Result};
use crate::identifiers::{ConnectionId, ConnectionToken, InvocationId};
use crate::protocol::{HandshakeRequest, Message, MessageType, NegotiateResponse, decode, encode};
use crate::transport::HttpTransport;

use super::handlers::{HandlerRegistry, InvocationHandler};
use super::pending::{PendingCalls, PendingGuard};
use super::reconnect::ResyncHook;
use super::state::{ConnectionEvent, LifecycleHandler, SessionState};

// ============================================================================
// SessionCore
// ============================================================================

/// Mutable session state, guarded by one lock.
#[derive(Debug, Default)]
struct SessionCore {
    state: SessionState,
    connection_id: Option<ConnectionId>,
    connection_token: Option<ConnectionToken>,
    reconnect_attempts: u32,
    reconnect_budget: u32,
    generation: u64,
}

impl SessionCore {
    /// Returns the token if invocations are currently accepted.
    fn running_token(&self) -> Option<ConnectionToken> {
        if self.state.is_running() {
            self.connection_token.clone()
        } else {
            None
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Shared session behind a `HubClient`.
pub(crate) struct Session {
    hub_url: Url,
    negotiate_url: Url,
    access_token: String,
    options: ClientOptions,
    transport: Arc<dyn HttpTransport>,
    core: Mutex<SessionCore>,
    pending: PendingCalls,
    handlers: HandlerRegistry,
    next_invocation: AtomicU64,
    resync: Option<ResyncHook>,
    lifecycle: Vec<LifecycleHandler>,
}

impl Session {
    /// Creates an idle session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the hub URL cannot carry a path.
    pub fn new(
        hub_url: Url,
        access_token: String,
        options: ClientOptions,
        transport: Arc<dyn HttpTransport>,
        resync: Option<ResyncHook>,
        lifecycle: Vec<LifecycleHandler>,
    ) -> Result<Self> {
        let negotiate_url = negotiate_url(&hub_url)?;

        Ok(Self {
            hub_url,
            negotiate_url,
            access_token,
            options,
            transport,
            core: Mutex::new(SessionCore::default()),
            pending: PendingCalls::new(),
            handlers: HandlerRegistry::new(),
            next_invocation: AtomicU64::new(1),
            resync,
            lifecycle,
        })
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Negotiates, handshakes and launches the poll loop.
    ///
    /// Returns immediately if the session is already running.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] if a start or reconnect is already in progress
    /// - [`Error::Negotiate`] / [`Error::Handshake`] if the hub refuses
    /// - Transport errors from the negotiate or handshake requests
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        let generation = {
            let mut core = self.core.lock();
            if core.state.is_running() {
                debug!("Session already running");
                return Ok(());
            }
            if core.state.is_connecting() {
                return Err(Error::protocol("connection attempt already in progress"));
            }

            core.generation += 1;
            core.state = SessionState::Negotiating;
            core.reconnect_attempts = 0;
            core.reconnect_budget = self.options.reconnect.budget;
            core.generation
        };

        match self.connect(generation).await {
            Ok(connection_id) => {
                info!(%connection_id, "Hub session started");
                self.emit(&ConnectionEvent::Connected { connection_id });
                tokio::spawn(Arc::clone(self).poll_loop(generation));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Hub session failed to start");
                let mut core = self.core.lock();
                if core.generation == generation {
                    core.state = SessionState::Stopped;
                    core.connection_id = None;
                    core.connection_token = None;
                }
                Err(e)
            }
        }
    }

    /// Stops the session.
    ///
    /// Rejects pending invocations, disables reconnection and sends a
    /// best-effort DELETE for the current connection.
    pub fn stop(&self) {
        if self.halt(None) {
            info!("Hub session stopped");
        }
    }

    /// Runs negotiate and handshake, ending in `Running`.
    async fn connect(&self, generation: u64) -> Result<ConnectionId> {
        let (connection_id, token) = self.negotiate().await?;

        {
            let mut core = self.core.lock();
            if core.generation != generation {
                return Err(Error::ConnectionClosed);
            }
            core.connection_id = Some(connection_id.clone());
            core.connection_token = Some(token.clone());
            core.state = SessionState::HandshakeSent;
        }

        self.handshake(&token, generation).await?;

        let mut core = self.core.lock();
        if core.generation != generation {
            return Err(Error::ConnectionClosed);
        }
        core.state = SessionState::Running;
        core.reconnect_attempts = 0;

        Ok(connection_id)
    }

    async fn negotiate(&self) -> Result<(ConnectionId, ConnectionToken)> {
        trace!(url = %self.negotiate_url, "Negotiating");

        let body = self
            .transport
            .post(
                &self.negotiate_url,
                &self.access_token,
                String::new(),
                Some(self.options.request_timeout),
            )
            .await?;

        let response: NegotiateResponse = serde_json::from_str(&body)
            .map_err(|e| Error::negotiate(format!("invalid negotiate response: {e}")))?;
        let (connection_id, token) = response.into_ids()?;

        debug!(%connection_id, "Negotiated");
        Ok((connection_id, token))
    }

    /// Posts the handshake and reads the acknowledgement poll.
    ///
    /// Any frame of the acknowledgement carrying `error` fails the
    /// handshake; the remaining frames are routed.
    async fn handshake(&self, token: &ConnectionToken, generation: u64) -> Result<()> {
        let url = self.session_url(token);
        let request = encode(&HandshakeRequest::JSON)?;

        self.transport
            .post(
                &url,
                &self.access_token,
                request,
                Some(self.options.request_timeout),
            )
            .await?;

        let ack = self
            .transport
            .get(&url, &self.access_token, Some(self.options.request_timeout))
            .await?;

        let frames = decode(&ack);
        if let Some(error) = frames
            .iter()
            .find_map(|frame| frame.error.clone().filter(|e| !e.is_empty()))
        {
            return Err(Error::handshake(error));
        }

        debug!("Handshake acknowledged");
        self.route_batch(frames, generation);
        Ok(())
    }

    /// Tears the session down.
    ///
    /// With `expected` set, only a session still at that generation is
    /// halted. Returns `true` if this call performed the teardown.
    fn halt(&self, expected: Option<u64>) -> bool {
        let token = {
            let mut core = self.core.lock();
            if expected.is_some_and(|generation| generation != core.generation) {
                return false;
            }
            core.generation += 1;
            core.state = SessionState::Stopped;
            core.reconnect_budget = 0;
            core.connection_id = None;
            core.connection_token.take()
        };

        self.pending.reject_all(|| Error::ConnectionClosed);

        if let Some(token) = token {
            self.spawn_close(token);
        }
        true
    }

    fn spawn_close(&self, token: ConnectionToken) {
        let Ok(handle) = Handle::try_current() else {
            debug!("No runtime available, skipping close request");
            return;
        };

        let transport = Arc::clone(&self.transport);
        let url = self.session_url(&token);
        let bearer = self.access_token.clone();
        let timeout = Some(self.options.request_timeout);

        handle.spawn(async move {
            match transport.delete(&url, &bearer, timeout).await {
                Ok(()) => debug!("Close request sent"),
                Err(Error::UnsupportedMethod { method }) => {
                    debug!(method, "Transport cannot close the connection, skipping");
                }
                Err(e) => debug!(error = %e, "Close request failed"),
            }
        });
    }

    // ========================================================================
    // Poll Loop
    // ========================================================================

    async fn poll_loop(self: Arc<Self>, generation: u64) {
        debug!(generation, "Poll loop started");

        loop {
            let Some(token) = self.token_for(generation) else {
                break;
            };

            let outcome = self
                .transport
                .get(
                    &self.session_url(&token),
                    &self.access_token,
                    self.options.poll_timeout,
                )
                .await;

            if !self.is_current(generation) {
                break;
            }

            match outcome {
                Ok(body) => {
                    self.core.lock().reconnect_attempts = 0;
                    self.route_batch(decode(&body), generation);
                }
                Err(e) if e.is_connection_loss() => {
                    warn!(error = %e, "Poll lost the connection");
                    if !self.recover(generation).await {
                        break;
                    }
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        retry_in_ms = self.options.retry_pause.as_millis() as u64,
                        "Poll failed"
                    );
                    sleep(self.options.retry_pause).await;
                }
            }
        }

        debug!(generation, "Poll loop terminated");
    }

    fn route_batch(&self, frames: Vec<Message>, generation: u64) {
        for frame in frames {
            if !self.is_current(generation) {
                trace!("Session superseded, dropping remaining frames");
                return;
            }
            self.route(frame, generation);
        }
    }

    fn route(&self, frame: Message, generation: u64) {
        let Some(kind) = frame.kind else {
            trace!("Keep-alive frame");
            return;
        };

        match kind {
            MessageType::Invocation => {
                let Some(target) = frame.target.as_deref() else {
                    warn!("Invocation frame without target");
                    return;
                };
                if self.handlers.dispatch(target, frame.arguments()) == 0 {
                    debug!(method = %target, "No handler registered");
                }
            }

            MessageType::Completion => {
                let Some(id) = frame.invocation_id else {
                    warn!("Completion frame without invocation id");
                    return;
                };
                let outcome = match frame.error.filter(|e| !e.is_empty()) {
                    Some(error) => Err(Error::hub(error)),
                    None => Ok(frame.result.unwrap_or(Value::Null)),
                };
                if !self.pending.complete(&id, outcome) {
                    warn!(invocation_id = %id, "Completion for unknown invocation");
                }
            }

            MessageType::Ping => trace!("Ping"),

            MessageType::Close => {
                info!(error = ?frame.error, "Hub closed the connection");
                if self.halt(Some(generation)) {
                    self.emit(&ConnectionEvent::Closed { error: frame.error });
                }
            }

            MessageType::Other(code) => debug!(code, "Ignoring unsupported frame type"),
        }
    }

    // ========================================================================
    // Reconnection
    // ========================================================================

    /// Runs reconnect attempts until one succeeds or the budget runs out.
    ///
    /// Returns `true` if the session is running again.
    async fn recover(self: &Arc<Self>, generation: u64) -> bool {
        loop {
            let attempt = {
                let mut core = self.core.lock();
                if core.generation != generation {
                    return false;
                }
                if core.reconnect_attempts >= core.reconnect_budget {
                    let attempts = core.reconnect_attempts;
                    drop(core);

                    warn!(attempts, "Reconnect budget exhausted");
                    if self.halt(Some(generation)) {
                        self.emit(&ConnectionEvent::ConnectionLost);
                    }
                    return false;
                }
                core.reconnect_attempts += 1;
                core.reconnect_attempts
            };

            let delay = self.options.reconnect.delay_for(attempt);
            info!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Scheduling reconnect"
            );
            self.emit(&ConnectionEvent::Reconnecting { attempt, delay });
            sleep(delay).await;

            match self.reconnect(generation).await {
                Ok(connection_id) => {
                    info!(%connection_id, attempt, "Reconnected");
                    self.resynchronize(connection_id);
                    return true;
                }
                Err(e) => {
                    if !self.is_current(generation) {
                        return false;
                    }
                    warn!(attempt, error = %e, "Reconnect attempt failed");
                }
            }
        }
    }

    async fn reconnect(&self, generation: u64) -> Result<ConnectionId> {
        {
            let mut core = self.core.lock();
            if core.generation != generation {
                return Err(Error::ConnectionClosed);
            }
            core.state = SessionState::Reconnecting;
        }

        sleep(self.options.reconnect.grace_period).await;

        {
            let mut core = self.core.lock();
            if core.generation != generation {
                return Err(Error::ConnectionClosed);
            }
            core.connection_id = None;
            core.connection_token = None;
        }
        self.pending.reject_all(|| Error::ConnectionClosed);

        self.connect(generation).await
    }

    /// Invokes the resync hook and drives its future on its own task.
    fn resynchronize(self: &Arc<Self>, connection_id: ConnectionId) {
        let Some(hook) = self.resync.as_ref() else {
            self.emit(&ConnectionEvent::Reconnected { connection_id });
            return;
        };

        let resync = hook(HubClient::from_session(Arc::clone(self)));
        let session = Arc::clone(self);

        tokio::spawn(async move {
            match resync.await {
                Ok(()) => {
                    debug!(%connection_id, "Resynchronized");
                    session.emit(&ConnectionEvent::Reconnected { connection_id });
                }
                Err(e) => {
                    warn!(error = %e, "Resync hook failed");
                    session.emit(&ConnectionEvent::ResyncFailed {
                        message: e.to_string(),
                    });
                }
            }
        });
    }

    // ========================================================================
    // Invocations
    // ========================================================================

    /// Invokes a hub method and waits for its completion.
    ///
    /// # Errors
    ///
    /// - [`Error::NotRunning`] if the session is not running (no I/O happens)
    /// - [`Error::InvocationTimeout`] if no completion arrives in time
    /// - [`Error::Hub`] if the hub completed the call with an error
    /// - [`Error::ConnectionClosed`] if the session was torn down meanwhile
    /// - Transport errors from posting the invocation
    pub async fn invoke(&self, method: &str, arguments: Vec<Value>) -> Result<Value> {
        let token = self.core.lock().running_token().ok_or(Error::NotRunning)?;

        let id = InvocationId::new(self.next_invocation.fetch_add(1, Ordering::Relaxed));
        let completion = self.pending.register(id.clone(), method)?;
        let _guard = PendingGuard::new(&self.pending, id.clone());

        let frame = encode(&Message::invocation(Some(id.clone()), method, arguments))?;
        let url = self.session_url(&token);
        let deadline = self.options.invocation_timeout;

        trace!(invocation_id = %id, method, "Invoking");

        let call = async {
            self.transport
                .post(
                    &url,
                    &self.access_token,
                    frame,
                    Some(self.options.request_timeout),
                )
                .await?;
            completion.await?
        };

        match timeout(deadline, call).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(invocation_id = %id, method, "Invocation timed out");
                Err(Error::invocation_timeout(
                    method,
                    id,
                    deadline.as_millis() as u64,
                ))
            }
        }
    }

    /// Fire-and-forget invocation. Failures are logged, never returned.
    pub async fn send(&self, method: &str, arguments: Vec<Value>) {
        let Some(token) = self.core.lock().running_token() else {
            debug!(method, "Session not running, dropping send");
            return;
        };

        let frame = match encode(&Message::invocation(None, method, arguments)) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(method, error = %e, "Failed to encode send");
                return;
            }
        };

        if let Err(e) = self
            .transport
            .post(
                &self.session_url(&token),
                &self.access_token,
                frame,
                Some(self.options.request_timeout),
            )
            .await
        {
            warn!(method, error = %e, "Send failed");
        }
    }

    /// Registers a handler for hub invocations of `method`.
    pub fn on(&self, method: &str, handler: InvocationHandler) {
        self.handlers.register(method, handler);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> SessionState {
        self.core.lock().state
    }

    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.core.lock().connection_id.clone()
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.core.lock().reconnect_attempts
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn hub_url(&self) -> &Url {
        &self.hub_url
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn is_current(&self, generation: u64) -> bool {
        self.core.lock().generation == generation
    }

    fn token_for(&self, generation: u64) -> Option<ConnectionToken> {
        let core = self.core.lock();
        if core.generation == generation {
            core.running_token()
        } else {
            None
        }
    }

    fn session_url(&self, token: &ConnectionToken) -> Url {
        let mut url = self.hub_url.clone();
        url.query_pairs_mut().append_pair("id", token.as_str());
        url
    }

    fn emit(&self, event: &ConnectionEvent) {
        for handler in &self.lifecycle {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                warn!(?event, "Lifecycle handler panicked");
            }
        }
    }
}

/// `{hub}/negotiate?negotiateVersion=1`
fn negotiate_url(hub_url: &Url) -> Result<Url> {
    let mut url = hub_url.clone();
    url.path_segments_mut()
        .map_err(|()| Error::config(format!("Hub URL cannot carry a path: {hub_url}")))?
        .pop_if_empty()
        .push("negotiate");
    url.query_pairs_mut().append_pair("negotiateVersion", "1");
    Ok(url)
}

// ============================================================================
// Tests
// ============================================================================
