//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`HubClient`] instances.
//!
//! # Example
//!
//! ```no_run
//! use hub_longpoll::HubClient;
//!
//! # fn example() -> hub_longpoll::Result<()> {
//! let client = HubClient::builder()
//!     .url("https://example.com/hubs/warroom")
//!     .access_token("eyJhbGciOi...")
//!     .on_reconnect(|client| async move {
//!         client.invoke("GetWarRooms", vec![]).await.map(|_| ())
//!     })
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use url::Url;

use crate::error::{Error, Result};
use crate::session::{
    ConnectionEvent, LifecycleHandler, ReconnectPolicy, ResyncHook, Session,
};
use crate::transport::{HttpTransport, ReqwestTransport};

use super::core::HubClient;
use super::options::ClientOptions;

// ============================================================================
// HubClientBuilder
// ============================================================================

/// Builder for configuring a [`HubClient`] instance.
///
/// Use [`HubClient::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct HubClientBuilder {
    /// Hub endpoint URL.
    url: Option<String>,
    /// Bearer credential.
    access_token: Option<String>,
    /// Timing options.
    options: ClientOptions,
    /// HTTP transport; defaults to reqwest.
    transport: Option<Arc<dyn HttpTransport>>,
    /// Post-reconnect hook.
    resync: Option<ResyncHook>,
    /// Lifecycle observers.
    lifecycle: Vec<LifecycleHandler>,
}

impl fmt::Debug for HubClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubClientBuilder")
            .field("url", &self.url)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("options", &self.options)
            .field("custom_transport", &self.transport.is_some())
            .field("resync", &self.resync.is_some())
            .field("lifecycle", &self.lifecycle.len())
            .finish()
    }
}

// ============================================================================
// HubClientBuilder Implementation
// ============================================================================

impl HubClientBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hub endpoint URL.
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute http(s) URL of the hub (e.g. "https://host/hubs/warroom")
    #[inline]
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the bearer credential sent with every request.
    #[inline]
    #[must_use]
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Replaces all timing options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the reconnection policy.
    #[inline]
    #[must_use]
    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.options.reconnect = policy;
        self
    }

    /// Sets the invocation deadline.
    #[inline]
    #[must_use]
    pub fn invocation_timeout(mut self, timeout: Duration) -> Self {
        self.options.invocation_timeout = timeout;
        self
    }

    /// Uses a custom HTTP transport.
    #[inline]
    #[must_use]
    pub fn transport<T>(mut self, transport: T) -> Self
    where
        T: HttpTransport + 'static,
    {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Uses a transport shared with other clients.
    #[inline]
    #[must_use]
    pub fn shared_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the hook run after every successful reconnect.
    ///
    /// The hook receives a client handle and typically re-sends identity,
    /// rejoins channels and refetches state. Its future runs on its own
    /// task while polling continues.
    #[must_use]
    pub fn on_reconnect<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(HubClient) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.resync = Some(Arc::new(move |client| hook(client).boxed()));
        self
    }

    /// Adds an observer for connection lifecycle events.
    #[must_use]
    pub fn on_lifecycle<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ConnectionEvent) + Send + Sync + 'static,
    {
        self.lifecycle.push(Arc::new(handler));
        self
    }

    /// Builds the client with validation.
    ///
    /// The client is idle; call [`HubClient::start`] to connect.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the URL or token is missing or invalid, or the
    ///   default HTTP client cannot be created
    /// - [`Error::InvalidUrl`] if the URL cannot be parsed
    pub fn build(self) -> Result<HubClient> {
        let hub_url = self.validate_url()?;
        let access_token = self.validate_token()?;

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        let session = Session::new(
            hub_url,
            access_token,
            self.options,
            transport,
            self.resync,
            self.lifecycle,
        )?;

        Ok(HubClient::from_session(Arc::new(session)))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl HubClientBuilder {
    /// Validates the hub URL.
    fn validate_url(&self) -> Result<Url> {
        let raw = self.url.as_deref().ok_or_else(|| {
            Error::config(
                "Hub URL is required. Use .url() to set it.\n\
                 Example: HubClient::builder().url(\"https://host/hubs/warroom\")",
            )
        })?;

        let url = Url::parse(raw)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "Hub URL must use http or https, got: {}",
                url.scheme()
            )));
        }

        Ok(url)
    }

    /// Validates the bearer credential.
    fn validate_token(&self) -> Result<String> {
        match self.access_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token.to_string()),
            _ => Err(Error::config(
                "Access token is required. Use .access_token() to set it.",
            )),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
