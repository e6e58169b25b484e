//! Fixed-window request counting.
//!
//! A [`RateLimitStore`] is an atomic counter with expiry. The
//! [`RateLimitEngine`] turns a store plus a [`RateLimitPolicy`] into an
//! [`Admission`] decision for an (ip, user) pair.
//!
//! Counters reset entirely when their window ends, so a client can land up to
//! `2 × limit` requests across a window boundary.

mod engine;
mod memory;
mod redis_store;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::StoreError;

pub use engine::RateLimitEngine;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Counter-with-expiry primitive shared by all backends.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Atomically adds one to `key` and returns the new count.
    ///
    /// A key that is absent or expired starts a new window of length `window`.
    async fn increment(&self, key: &str, window: Duration) -> Result<u64, StoreError>;

    /// Current count for `key`, or 0 if absent or expired. Never mutates.
    async fn get_count(&self, key: &str) -> Result<u64, StoreError>;
}

/// Dimension a limit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Ip,
    User,
}

impl Scope {
    /// Segment used in counter keys.
    pub fn key_segment(&self) -> &'static str {
        match self {
            Scope::Ip => "ip",
            Scope::User => "user",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Ip => f.write_str("IP"),
            Scope::User => f.write_str("user"),
        }
    }
}

/// Result of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied(Scope),
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

/// How many requests a key may make per window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub enabled: bool,
    pub limit: u32,
    /// Overrides `limit` for the user scope when set.
    pub user_limit: Option<u32>,
    /// Whole seconds; sub-second parts are dropped by the remote store.
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            enabled: true,
            limit,
            user_limit: None,
            window,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(0, Duration::ZERO)
        }
    }

    pub fn with_user_limit(mut self, user_limit: u32) -> Self {
        self.user_limit = Some(user_limit);
        self
    }

    pub fn limit_for(&self, scope: Scope) -> u32 {
        match scope {
            Scope::Ip => self.limit,
            Scope::User => self.user_limit.unwrap_or(self.limit),
        }
    }

    /// Combines two policies into one at least as strict as both: the lower
    /// limit per scope over the longer window. A disabled side is ignored.
    pub fn stricter(&self, other: &RateLimitPolicy) -> RateLimitPolicy {
        match (self.enabled, other.enabled) {
            (false, _) => return other.clone(),
            (_, false) => return self.clone(),
            _ => {}
        }

        let user_limit = match (self.user_limit, other.user_limit) {
            (None, None) => None,
            _ => Some(
                self.limit_for(Scope::User)
                    .min(other.limit_for(Scope::User)),
            ),
        };

        RateLimitPolicy {
            enabled: true,
            limit: self.limit.min(other.limit),
            user_limit,
            window: self.window.max(other.window),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn user_limit_falls_back_to_limit() {
        let policy = RateLimitPolicy::new(10, MINUTE);
        assert_eq!(policy.limit_for(Scope::User), 10);
        assert_eq!(policy.with_user_limit(3).limit_for(Scope::User), 3);
    }

    #[test]
    fn stricter_takes_lower_limit_and_longer_window() {
        let tenant = RateLimitPolicy::new(100, MINUTE).with_user_limit(50);
        let login = RateLimitPolicy::new(5, Duration::from_secs(300));

        let combined = tenant.stricter(&login);
        assert_eq!(combined.limit, 5);
        assert_eq!(combined.limit_for(Scope::User), 5);
        assert_eq!(combined.window, Duration::from_secs(300));
        assert_eq!(combined, login.stricter(&tenant));
    }

    #[test]
    fn stricter_keeps_tighter_tenant_limit() {
        let tenant = RateLimitPolicy::new(2, MINUTE);
        let login = RateLimitPolicy::new(5, MINUTE);
        assert_eq!(tenant.stricter(&login).limit, 2);
    }

    #[test]
    fn stricter_ignores_disabled_side() {
        let login = RateLimitPolicy::new(5, MINUTE);
        assert_eq!(RateLimitPolicy::disabled().stricter(&login), login);
        assert_eq!(login.stricter(&RateLimitPolicy::disabled()), login);
    }
}
