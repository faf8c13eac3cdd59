//! Reconnection policy and resynchronization hook.
//!
//! When a poll fails with a connection-loss error the session burns one
//! attempt of its budget, backs off exponentially, then renegotiates from
//! scratch. After a successful reconnect the owner's [`ResyncHook`] runs to
//! rebuild whatever server-side state the application depends on.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::client::HubClient;
use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Default number of reconnect attempts before giving up.
pub const DEFAULT_RECONNECT_BUDGET: u32 = 5;

/// Delay before the first attempt; doubles for every further attempt.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Upper bound for a single backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(30_000);

/// Pause between marking the session down and renegotiating, so requests
/// still in flight against the old session can settle.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(500);

// ============================================================================
// Types
// ============================================================================

/// Owner callback run after every successful reconnect.
///
/// Receives a client handle to re-register display names, rejoin channels
/// and refetch state. The poll loop keeps running while the returned future
/// is driven, so invocations made from it complete normally.
pub type ResyncHook = Arc<dyn Fn(HubClient) -> BoxFuture<'static, Result<()>> + Send + Sync>;

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// Backoff schedule and attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Attempts allowed before the session is declared lost.
    pub budget: u32,
    /// Delay of attempt 1.
    pub base_delay: Duration,
    /// Cap for any attempt's delay.
    pub max_delay: Duration,
    /// Settle time before renegotiating.
    pub grace_period: Duration,
}

impl ReconnectPolicy {
    /// Creates the default policy: 5 attempts, 1 s doubling to 30 s, 500 ms
    /// grace.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            budget: DEFAULT_RECONNECT_BUDGET,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    /// Creates a policy that never reconnects.
    #[inline]
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            budget: 0,
            ..Self::new()
        }
    }

    /// Sets the attempt budget.
    #[inline]
    #[must_use]
    pub const fn with_budget(mut self, budget: u32) -> Self {
        self.budget = budget;
        self
    }

    /// Sets the delay of the first attempt.
    #[inline]
    #[must_use]
    pub const fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the delay cap.
    #[inline]
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the grace period.
    #[inline]
    #[must_use]
    pub const fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = grace;
        self
    }

    /// Backoff before `attempt` (1-based): `min(base * 2^(attempt-1), max)`.
    ///
    /// Attempt 0 is treated as attempt 1.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
