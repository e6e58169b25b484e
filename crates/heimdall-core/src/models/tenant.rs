//! Tenants and their authentication / rate-limit configuration.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ratelimit::RateLimitPolicy;

/// How users of a tenant prove their identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    #[default]
    UsernamePassword,
}

/// A customer of the gateway. Owns exactly one [`TenantConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub config: TenantConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Builds a tenant with a fresh UUID and the given settings.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the name or description is out of
    /// bounds, or any numeric setting is zero.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        settings: TenantConfigUpdate,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let description = description.into();

        let name_len = name.chars().count();
        if !(3..=50).contains(&name_len) {
            return Err(ValidationError::new("name", "must be 3 to 50 characters"));
        }
        if description.chars().count() > 500 {
            return Err(ValidationError::new(
                "description",
                "must be at most 500 characters",
            ));
        }
        settings.validate()?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        Ok(Self {
            config: TenantConfig {
                tenant_id: id.clone(),
                auth_method: settings.auth_method,
                jwt_duration: settings.jwt_duration,
                rate_limit_ip: settings.rate_limit_ip,
                rate_limit_user: settings.rate_limit_user,
                rate_limit_window: settings.rate_limit_window,
                created_at: now,
                updated_at: now,
            },
            id,
            name,
            description,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn view(&self) -> TenantView {
        TenantView {
            id: self.id.clone(),
            name: self.name.clone(),
            config: self.config.clone(),
        }
    }
}

/// Per-tenant session and rate-limit settings.
///
/// All numeric fields are positive. `jwt_duration` is in minutes,
/// `rate_limit_window` in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantConfig {
    pub tenant_id: String,
    pub auth_method: AuthMethod,
    pub jwt_duration: u32,
    pub rate_limit_ip: u32,
    pub rate_limit_user: u32,
    pub rate_limit_window: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantConfig {
    /// The configuration a tenant gets when none is supplied:
    /// 60 minute sessions, 100 requests per IP and 50 per user per 60 seconds.
    pub fn default_for(tenant_id: impl Into<String>) -> Self {
        let now = Utc::now();
        let defaults = TenantConfigUpdate::default();
        Self {
            tenant_id: tenant_id.into(),
            auth_method: defaults.auth_method,
            jwt_duration: defaults.jwt_duration,
            rate_limit_ip: defaults.rate_limit_ip,
            rate_limit_user: defaults.rate_limit_user,
            rate_limit_window: defaults.rate_limit_window,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces every auth and rate-limit field at once and bumps `updated_at`.
    ///
    /// The config is left untouched if `update` fails validation.
    pub fn apply(&mut self, update: &TenantConfigUpdate) -> Result<(), ValidationError> {
        update.validate()?;
        self.auth_method = update.auth_method;
        self.jwt_duration = update.jwt_duration;
        self.rate_limit_ip = update.rate_limit_ip;
        self.rate_limit_user = update.rate_limit_user;
        self.rate_limit_window = update.rate_limit_window;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Lifetime of tokens issued for this tenant.
    pub fn session_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.jwt_duration) * 60)
    }

    /// Admission policy derived from the tenant's limits.
    pub fn rate_limit_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(
            self.rate_limit_ip,
            Duration::from_secs(u64::from(self.rate_limit_window)),
        )
        .with_user_limit(self.rate_limit_user)
    }
}

/// The replaceable part of a [`TenantConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantConfigUpdate {
    #[serde(default)]
    pub auth_method: AuthMethod,
    pub jwt_duration: u32,
    pub rate_limit_ip: u32,
    pub rate_limit_user: u32,
    pub rate_limit_window: u32,
}

impl Default for TenantConfigUpdate {
    fn default() -> Self {
        Self {
            auth_method: AuthMethod::UsernamePassword,
            jwt_duration: 60,
            rate_limit_ip: 100,
            rate_limit_user: 50,
            rate_limit_window: 60,
        }
    }
}

impl TenantConfigUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("jwt_duration", self.jwt_duration),
            ("rate_limit_ip", self.rate_limit_ip),
            ("rate_limit_user", self.rate_limit_user),
            ("rate_limit_window", self.rate_limit_window),
        ];
        for (field, value) in fields {
            if value == 0 {
                return Err(ValidationError::new(field, "must be at least 1"));
            }
        }
        Ok(())
    }
}

/// Tenant as exposed by token validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenantView {
    pub id: String,
    pub name: String,
    pub config: TenantConfig,
}
