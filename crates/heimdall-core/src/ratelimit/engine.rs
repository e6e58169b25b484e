use std::sync::Arc;

use super::{Admission, RateLimitPolicy, RateLimitStore, Scope};
use crate::error::StoreError;

const DEFAULT_KEY_PREFIX: &str = "rate_limit";

/// Applies a [`RateLimitPolicy`] to per-IP and per-user counters in a store.
#[derive(Clone)]
pub struct RateLimitEngine {
    store: Arc<dyn RateLimitStore>,
    enabled: bool,
    key_prefix: String,
}

impl RateLimitEngine {
    pub fn new(store: Arc<dyn RateLimitStore>, enabled: bool) -> Self {
        Self {
            store,
            enabled,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Counter key, e.g. `rate_limit:ip:10.0.0.1`.
    pub fn key(&self, scope: Scope, identifier: &str) -> String {
        format!("{}:{}:{}", self.key_prefix, scope.key_segment(), identifier)
    }

    /// Decides whether a request from `ip`, optionally on behalf of `user_id`,
    /// may proceed.
    ///
    /// The IP counter is checked first and a denial stops there. The user
    /// counter is only consulted when `user_id` is non-empty. A key already at
    /// its limit is denied without being incremented.
    ///
    /// # Errors
    ///
    /// A backend failure is returned as [`StoreError`]; callers must treat it
    /// as a denial.
    pub async fn admit(
        &self,
        ip: &str,
        user_id: &str,
        policy: &RateLimitPolicy,
    ) -> Result<Admission, StoreError> {
        match self.admit_scope(Scope::Ip, ip, policy).await? {
            Admission::Allowed => self.admit_scope(Scope::User, user_id, policy).await,
            denied => Ok(denied),
        }
    }

    /// Checks and charges a single scope's counter. An empty `identifier`
    /// is not counted.
    pub async fn admit_scope(
        &self,
        scope: Scope,
        identifier: &str,
        policy: &RateLimitPolicy,
    ) -> Result<Admission, StoreError> {
        if !self.enabled || !policy.enabled || identifier.is_empty() {
            return Ok(Admission::Allowed);
        }

        if self.check(scope, identifier, policy).await? {
            Ok(Admission::Allowed)
        } else {
            Ok(Admission::Denied(scope))
        }
    }

    /// Read, then increment only if under budget. Returns `false` when denied.
    async fn check(
        &self,
        scope: Scope,
        identifier: &str,
        policy: &RateLimitPolicy,
    ) -> Result<bool, StoreError> {
        let key = self.key(scope, identifier);
        let limit = u64::from(policy.limit_for(scope));

        let count = self.store.get_count(&key).await?;
        if count >= limit {
            tracing::warn!("Rate limit exceeded: scope={scope:?}, key={key}, count={count}");
            return Ok(false);
        }

        self.store.increment(&key, policy.window).await?;
        Ok(true)
    }
}
