use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use heimdall_core::{RateLimitPolicy, Role, TenantConfigUpdate};
use serde::Deserialize;

/// Tenant created at startup. `id` is fixed so seeded users can refer to it.
#[derive(Debug, Clone, Deserialize)]
pub struct TenantSeed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub settings: SeedSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedSettings {
    #[serde(default = "default_jwt_duration")]
    pub jwt_duration: u32,
    #[serde(default = "default_tenant_ip_limit")]
    pub rate_limit_ip: u32,
    #[serde(default = "default_tenant_user_limit")]
    pub rate_limit_user: u32,
    #[serde(default = "default_window_secs")]
    pub rate_limit_window: u32,
}

impl Default for SeedSettings {
    fn default() -> Self {
        Self {
            jwt_duration: default_jwt_duration(),
            rate_limit_ip: default_tenant_ip_limit(),
            rate_limit_user: default_tenant_user_limit(),
            rate_limit_window: default_window_secs(),
        }
    }
}

impl SeedSettings {
    pub fn to_update(&self) -> TenantConfigUpdate {
        TenantConfigUpdate {
            jwt_duration: self.jwt_duration,
            rate_limit_ip: self.rate_limit_ip,
            rate_limit_user: self.rate_limit_user,
            rate_limit_window: self.rate_limit_window,
            ..TenantConfigUpdate::default()
        }
    }
}

/// User created at startup. `password_hash` comes from the `hash_password` binary.
#[derive(Debug, Clone, Deserialize)]
pub struct UserSeed {
    pub tenant_id: String,
    pub username: String,
    pub password_hash: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub tenants: Vec<TenantSeed>,
    #[serde(default)]
    pub users: Vec<UserSeed>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub backend: RateLimitBackend,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_login_limit")]
    pub login_limit: u32,
    #[serde(default = "default_window_secs")]
    pub login_window_secs: u32,
    #[serde(default = "default_request_limit")]
    pub request_limit: u32,
    #[serde(default = "default_window_secs")]
    pub request_window_secs: u32,
}

impl RateLimitConfig {
    /// Applied to login attempts for tenants that do not exist.
    pub fn login_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(
            self.login_limit,
            Duration::from_secs(u64::from(self.login_window_secs)),
        )
    }

    /// Applied to every authenticated request.
    pub fn request_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(
            self.request_limit,
            Duration::from_secs(u64::from(self.request_window_secs)),
        )
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: RateLimitBackend::default(),
            redis_url: default_redis_url(),
            login_limit: default_login_limit(),
            login_window_secs: default_window_secs(),
            request_limit: default_request_limit(),
            request_window_secs: default_window_secs(),
        }
    }
}

fn default_true() -> bool { true }
fn default_login_limit() -> u32 { 5 }
fn default_request_limit() -> u32 { 100 }
fn default_window_secs() -> u32 { 60 }
fn default_jwt_duration() -> u32 { 60 }
fn default_tenant_ip_limit() -> u32 { 100 }
fn default_tenant_user_limit() -> u32 { 50 }
fn default_role() -> Role { Role::User }
fn default_redis_url() -> String { "redis://127.0.0.1:6379".to_string() }

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::default(),
            tenants: Vec::new(),
            users: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("HEIMDALL_CONFIG").map(PathBuf::from).ok();

        let mut config = if let Some(path) = config_path {
            let contents = std::fs::read_to_string(&path)?;
            Self::from_toml(&contents)?
        } else {
            ServerConfig::default()
        };

        if let Ok(secret) = std::env::var("HEIMDALL_JWT_SECRET") {
            config.auth.jwt_secret = secret;
        }
        if let Ok(addr) = std::env::var("HEIMDALL_BIND_ADDR") {
            config.bind_addr = addr.parse()?;
        }
        if let Ok(val) = std::env::var("HEIMDALL_RATE_LIMIT_ENABLED") {
            config.rate_limit.enabled = val == "true" || val == "1";
        }
        if let Ok(val) = std::env::var("HEIMDALL_RATE_LIMIT_BACKEND") {
            config.rate_limit.backend = match val.as_str() {
                "memory" => RateLimitBackend::Memory,
                "redis" => RateLimitBackend::Redis,
                other => anyhow::bail!("Unknown rate limit backend: {other}"),
            };
        }
        if let Ok(url) = std::env::var("HEIMDALL_REDIS_URL") {
            config.rate_limit.redis_url = url;
        }

        config.check_secret()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Fills in a random secret when none is set and refuses placeholders.
    fn check_secret(&mut self) -> anyhow::Result<()> {
        if self.auth.jwt_secret.is_empty() {
            self.auth.jwt_secret = uuid::Uuid::new_v4().to_string();
            tracing::warn!(
                "No JWT secret configured. \
                 Generated random secret (tokens will not survive a restart)."
            );
            return Ok(());
        }

        const WEAK_SECRETS: &[&str] = &[
            "your-secret-key",
            "change-me",
            "secret",
            "password",
            "jwt-secret",
        ];
        if WEAK_SECRETS.iter().any(|&w| self.auth.jwt_secret == w) {
            anyhow::bail!(
                "JWT secret matches a known placeholder value. \
                 Set a strong random secret via HEIMDALL_JWT_SECRET."
            );
        }
        if self.auth.jwt_secret.len() < 32 {
            tracing::warn!(
                "JWT secret is shorter than 32 characters. \
                 Consider a stronger secret via HEIMDALL_JWT_SECRET."
            );
        }
        Ok(())
    }
}
