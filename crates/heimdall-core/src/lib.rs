//! Heimdall core library — tenant-scoped session tokens and login protection.
//!
//! `heimdall-core` holds everything in the gateway that carries shared state or
//! security-sensitive logic. It knows nothing about HTTP; the `heimdall-web`
//! binary maps its outcomes onto routes and status codes.
//!
//! # Modules
//!
//! - [`models`] — Tenants, their configuration, users, roles.
//! - [`storage`] — The [`Storage`] capability and an in-memory implementation.
//! - [`ratelimit`] — Counter stores ([`MemoryStore`], [`RedisStore`]) and the
//!   [`RateLimitEngine`].
//! - [`token`] — HMAC-SHA256 session tokens via [`TokenService`].
//! - [`credentials`] — The opaque [`PasswordVerifier`] capability.
//! - [`pipeline`] — [`AuthPipeline`]: admission, authentication, authorization, login.
//! - [`error`] — Error taxonomy ([`AuthError`] and friends).

pub mod credentials;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod ratelimit;
pub mod storage;
pub mod token;

pub use credentials::PasswordVerifier;
pub use error::{AuthError, StorageError, StorageResult, StoreError, TokenError, ValidationError};
pub use models::{
    AuthMethod, Role, Tenant, TenantConfig, TenantConfigUpdate, TenantView, User, UserView,
};
pub use pipeline::{AuthPipeline, AuthRequest, LoginOutcome, TokenValidation};
pub use ratelimit::{
    Admission, MemoryStore, RateLimitEngine, RateLimitPolicy, RateLimitStore, RedisStore, Scope,
};
pub use storage::{InMemoryStorage, SortDirection, Storage, UserPage, UserQuery, UserSortField};
pub use token::{Claims, IssuedToken, TokenService};
