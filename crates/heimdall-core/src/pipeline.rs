//! Per-request authentication and authorization.
//!
//! A protected request moves through these states, stopping at the first
//! failure:
//!
//! ```text
//! IP limit ─► bearer ─► token ─► user limit ─► role ─► authorized
//!    │           │         │          │          │
//!   429         401       401        429        403
//! ```
//!
//! The user counter is only charged once a token has validated, so
//! unauthenticated traffic cannot inflate it. Login attempts are counted
//! under their own key prefix and never share a counter with requests.
//!
//! Token and role steps are also exposed on their own
//! ([`AuthPipeline::authenticate`], [`AuthPipeline::require_role`]) so the
//! HTTP layer can chain them per route.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::credentials::PasswordVerifier;
use crate::error::{AuthError, StorageError};
use crate::models::{Role, TenantView, UserView};
use crate::error::StoreError;
use crate::ratelimit::{Admission, RateLimitEngine, RateLimitPolicy, Scope};
use crate::storage::Storage;
use crate::token::{Claims, TokenService};

/// What the HTTP layer knows about an inbound request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthRequest<'a> {
    /// Client address used for the IP-scope counter.
    pub ip: &'a str,
    /// Raw `Authorization` header value.
    pub authorization: Option<&'a str>,
    /// Empty means any authenticated role is accepted.
    pub required_roles: &'a [Role],
}

/// Successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    pub user: UserView,
}

/// Result of standalone token validation. Never contains the token itself.
#[derive(Debug, Clone, Serialize)]
pub struct TokenValidation {
    pub valid: bool,
    pub user: UserView,
    pub tenant: TenantView,
    pub expires_at: Option<DateTime<Utc>>,
}

const LOGIN_KEY_PREFIX: &str = "rate_limit:login";

/// Composes the rate limiter, token service and storage.
///
/// Built once per process and shared; holds no global state.
#[derive(Clone)]
pub struct AuthPipeline {
    storage: Arc<dyn Storage>,
    tokens: Arc<TokenService>,
    limiter: RateLimitEngine,
    login_limiter: RateLimitEngine,
    passwords: Arc<dyn PasswordVerifier>,
    request_policy: RateLimitPolicy,
}

impl AuthPipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        tokens: Arc<TokenService>,
        limiter: RateLimitEngine,
        passwords: Arc<dyn PasswordVerifier>,
    ) -> Self {
        let login_limiter = limiter.clone().with_key_prefix(LOGIN_KEY_PREFIX);
        Self {
            storage,
            tokens,
            limiter,
            login_limiter,
            passwords,
            request_policy: RateLimitPolicy::disabled(),
        }
    }

    /// IP-scope policy applied by [`authorize`](Self::authorize). Disabled by
    /// default.
    pub fn with_request_policy(mut self, policy: RateLimitPolicy) -> Self {
        self.request_policy = policy;
        self
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Login attempts from `ip`, counted apart from ordinary requests.
    pub async fn admit_login(&self, ip: &str, policy: &RateLimitPolicy) -> Result<(), AuthError> {
        admission(self.login_limiter.admit_scope(Scope::Ip, ip, policy).await, ip)
    }

    /// Bearer extraction and token validation.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Claims, AuthError> {
        let token = extract_bearer(authorization)?;
        Ok(self.tokens.validate(token)?)
    }

    /// Role step. `None` means no identity was attached, which is reported
    /// separately from holding the wrong role.
    pub fn require_role<'c>(
        claims: Option<&'c Claims>,
        allowed: &[Role],
    ) -> Result<&'c Claims, AuthError> {
        let claims = claims.ok_or(AuthError::MissingClaims)?;
        if allowed.is_empty() || claims.has_any_role(allowed) {
            Ok(claims)
        } else {
            tracing::warn!(
                "Role {} denied for user {}, requires one of {allowed:?}",
                claims.role,
                claims.user_id
            );
            Err(AuthError::Forbidden)
        }
    }

    /// Runs the whole chain for a protected request.
    ///
    /// The IP scope uses the request policy. The user scope uses the token's
    /// tenant settings (`rate_limit_user` per `rate_limit_window`).
    pub async fn authorize(&self, request: &AuthRequest<'_>) -> Result<Claims, AuthError> {
        let ip_check = self
            .limiter
            .admit_scope(Scope::Ip, request.ip, &self.request_policy)
            .await;
        admission(ip_check, request.ip)?;

        let claims = self.authenticate(request.authorization)?;

        let tenant = self
            .storage
            .get_tenant(&claims.tenant_id)
            .await
            .map_err(tenant_lookup)?;
        let user_check = self
            .limiter
            .admit_scope(Scope::User, &claims.user_id, &tenant.config.rate_limit_policy())
            .await;
        admission(user_check, request.ip)?;

        Self::require_role(Some(&claims), request.required_roles)?;
        Ok(claims)
    }

    /// Exchanges tenant-scoped credentials for a session token.
    ///
    /// The user must belong to `tenant_id`; usernames are global, so a
    /// correct password for another tenant's user is rejected with
    /// [`AuthError::TenantMismatch`]. Recording `last_login` is best effort.
    pub async fn login(
        &self,
        tenant_id: &str,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome, AuthError> {
        let tenant = self
            .storage
            .get_tenant(tenant_id)
            .await
            .map_err(tenant_lookup)?;

        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let user = match self.storage.get_user_by_username(username).await {
            Ok(user) => user,
            Err(StorageError::NotFound(_)) => {
                tracing::warn!("Failed login attempt for unknown user: {username}");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(AuthError::Storage(e)),
        };

        let verifier = self.passwords.clone();
        let password = password.to_string();
        let hash = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || verifier.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        if !valid {
            tracing::warn!("Failed login attempt for user: {username}");
            return Err(AuthError::InvalidCredentials);
        }

        if user.tenant_id != tenant.id {
            tracing::warn!(
                "Login for user {username} rejected: belongs to tenant {}, not {}",
                user.tenant_id,
                tenant.id
            );
            return Err(AuthError::TenantMismatch);
        }

        let ttl = tenant.config.session_duration();
        let issued = self
            .tokens
            .issue(&user, ttl)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let mut view = user.view();
        match self.storage.update_user_last_login(&user.id).await {
            Ok(()) => view.last_login = Some(Utc::now()),
            Err(e) => tracing::warn!("Failed to record last login for user {}: {e}", user.id),
        }

        tracing::info!("User {username} logged in to tenant {}", tenant.id);
        Ok(LoginOutcome {
            token: issued.token,
            expires_in: ttl.as_secs(),
            user: view,
        })
    }

    /// Validates a bearer token and confirms its user and tenant still exist.
    pub async fn validate_token(
        &self,
        authorization: Option<&str>,
    ) -> Result<TokenValidation, AuthError> {
        let claims = self.authenticate(authorization)?;

        let user = self.storage.get_user(&claims.user_id).await.map_err(|e| match e {
            StorageError::NotFound(_) => AuthError::UserNotFound,
            other => AuthError::Storage(other),
        })?;
        let tenant = self
            .storage
            .get_tenant(&claims.tenant_id)
            .await
            .map_err(tenant_lookup)?;

        if user.tenant_id != tenant.id {
            return Err(AuthError::TenantMismatch);
        }

        Ok(TokenValidation {
            valid: true,
            user: user.view(),
            tenant: tenant.view(),
            expires_at: claims.expires_at_utc(),
        })
    }
}

/// Pulls the token out of a `Bearer <token>` header value.
pub fn extract_bearer(authorization: Option<&str>) -> Result<&str, AuthError> {
    let header = authorization.ok_or(AuthError::MissingAuthorization)?;
    if header.is_empty() {
        return Err(AuthError::MissingAuthorization);
    }
    match header.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() && !token.contains(' ') => Ok(token),
        _ => Err(AuthError::MalformedAuthorization),
    }
}

/// A failing counter store denies the request.
fn admission(result: Result<Admission, StoreError>, ip: &str) -> Result<(), AuthError> {
    match result {
        Ok(Admission::Allowed) => Ok(()),
        Ok(Admission::Denied(scope)) => Err(AuthError::RateLimitExceeded { scope }),
        Err(e) => {
            tracing::error!("Rate limit store failed, denying request from {ip}: {e}");
            Err(AuthError::StoreUnavailable(e))
        }
    }
}

fn tenant_lookup(e: StorageError) -> AuthError {
    match e {
        StorageError::NotFound(_) => AuthError::TenantNotFound,
        other => AuthError::Storage(other),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::{StorageResult, TokenError};
    use crate::models::{Tenant, TenantConfig, TenantConfigUpdate, User};
    use crate::ratelimit::{MemoryStore, RateLimitStore};
    use crate::storage::{InMemoryStorage, UserPage, UserQuery};

    const SECRET: &str = "pipeline-test-secret-0123456789abcdef";

    fn plain_verifier(password: &str, hash: &str) -> bool {
        hash.strip_prefix("plain:") == Some(password)
    }

    struct Fixture {
        pipeline: AuthPipeline,
        storage: Arc<InMemoryStorage>,
        tenant_a: Tenant,
        tenant_b: Tenant,
        alice: User,
    }

    async fn fixture() -> Fixture {
        let storage = Arc::new(InMemoryStorage::new());
        fixture_with(storage.clone(), storage).await
    }

    async fn fixture_with(storage: Arc<InMemoryStorage>, backend: Arc<dyn Storage>) -> Fixture {
        let settings = TenantConfigUpdate {
            jwt_duration: 30,
            ..TenantConfigUpdate::default()
        };
        let tenant_a = storage
            .create_tenant(Tenant::new("tenant-a", "", settings.clone()).unwrap())
            .await
            .unwrap();
        let tenant_b = storage
            .create_tenant(Tenant::new("tenant-b", "", settings).unwrap())
            .await
            .unwrap();
        let alice = storage
            .create_user(User::new(&tenant_a.id, "alice", "plain:wonderland", Role::Admin))
            .await
            .unwrap();
        storage
            .create_user(User::new(&tenant_b.id, "bob", "plain:builder", Role::ReadOnly))
            .await
            .unwrap();

        let limiter = RateLimitEngine::new(Arc::new(MemoryStore::new()), true);
        let pipeline = AuthPipeline::new(
            backend,
            Arc::new(TokenService::new(SECRET)),
            limiter,
            Arc::new(plain_verifier),
        );

        Fixture {
            pipeline,
            storage,
            tenant_a,
            tenant_b,
            alice,
        }
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }

    #[tokio::test]
    async fn login_issues_tenant_scoped_token() {
        let fx = fixture().await;

        let outcome = fx
            .pipeline
            .login(&fx.tenant_a.id, "alice", "wonderland")
            .await
            .unwrap();

        assert_eq!(outcome.expires_in, 30 * 60);
        assert_eq!(outcome.user.username, "alice");
        let claims = fx.pipeline.tokens().validate(&outcome.token).unwrap();
        assert_eq!(claims.user_id, fx.alice.id);
        assert_eq!(claims.tenant_id, fx.tenant_a.id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.expires_at - claims.issued_at, 30 * 60);
    }

    #[tokio::test]
    async fn login_records_last_login() {
        let fx = fixture().await;
        fx.pipeline
            .login(&fx.tenant_a.id, "alice", "wonderland")
            .await
            .unwrap();

        let stored = fx.storage.get_user(&fx.alice.id).await.unwrap();
        assert!(stored.last_login.is_some());
    }

    #[tokio::test]
    async fn login_with_wrong_password_fails() {
        let fx = fixture().await;
        let err = fx
            .pipeline
            .login(&fx.tenant_a.id, "alice", "looking-glass")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_unknown_user_looks_like_wrong_password() {
        let fx = fixture().await;
        let err = fx
            .pipeline
            .login(&fx.tenant_a.id, "mallory", "anything")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_with_empty_password_fails() {
        let fx = fixture().await;
        let err = fx.pipeline.login(&fx.tenant_a.id, "alice", "").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_unknown_tenant_is_not_found() {
        let fx = fixture().await;
        let err = fx
            .pipeline
            .login("no-such-tenant", "alice", "wonderland")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TenantNotFound));
    }

    #[tokio::test]
    async fn login_into_other_tenant_is_a_mismatch() {
        let fx = fixture().await;
        // Correct password, but bob belongs to tenant B.
        let err = fx
            .pipeline
            .login(&fx.tenant_a.id, "bob", "builder")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TenantMismatch));
        assert_eq!(err.public_message(), "Invalid credentials");
    }

    #[tokio::test]
    async fn login_survives_last_login_failure() {
        let storage = Arc::new(InMemoryStorage::new());
        let flaky = Arc::new(NoLastLogin(storage.clone()));
        let fx = fixture_with(storage, flaky).await;

        let outcome = fx
            .pipeline
            .login(&fx.tenant_a.id, "alice", "wonderland")
            .await
            .unwrap();

        assert!(outcome.user.last_login.is_none());
        assert!(!outcome.token.is_empty());
    }

    #[tokio::test]
    async fn validate_token_resolves_user_and_tenant() {
        let fx = fixture().await;
        let outcome = fx
            .pipeline
            .login(&fx.tenant_a.id, "alice", "wonderland")
            .await
            .unwrap();

        let validation = fx
            .pipeline
            .validate_token(Some(&bearer(&outcome.token)))
            .await
            .unwrap();

        assert!(validation.valid);
        assert_eq!(validation.user.id, fx.alice.id);
        assert_eq!(validation.tenant.id, fx.tenant_a.id);
        assert_eq!(validation.tenant.config.jwt_duration, 30);
        assert!(validation.expires_at.is_some());
        let json = serde_json::to_string(&validation).unwrap();
        assert!(!json.contains(&outcome.token));
        assert!(!json.contains(SECRET));
    }

    #[tokio::test]
    async fn validate_token_for_vanished_user_fails() {
        let fx = fixture().await;
        let ghost = User::new(&fx.tenant_a.id, "ghost", "plain:x", Role::User);
        let issued = fx.pipeline.tokens().issue(&ghost, Duration::from_secs(60)).unwrap();

        let err = fx
            .pipeline
            .validate_token(Some(&bearer(&issued.token)))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }

    #[tokio::test]
    async fn validate_token_for_vanished_tenant_fails() {
        let fx = fixture().await;
        let mut orphan = fx.alice.clone();
        orphan.tenant_id = "deleted-tenant".to_string();
        let issued = fx.pipeline.tokens().issue(&orphan, Duration::from_secs(60)).unwrap();

        let err = fx
            .pipeline
            .validate_token(Some(&bearer(&issued.token)))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TenantNotFound));
    }

    #[tokio::test]
    async fn validate_token_rejects_garbage() {
        let fx = fixture().await;
        let err = fx
            .pipeline
            .validate_token(Some("Bearer nonsense"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::InvalidToken {
                reason: TokenError::Malformed(_)
            }
        ));
    }

    #[tokio::test]
    async fn authorize_walks_every_step() {
        let fx = fixture().await;
        let outcome = fx
            .pipeline
            .login(&fx.tenant_a.id, "alice", "wonderland")
            .await
            .unwrap();
        let header = bearer(&outcome.token);

        let claims = fx
            .pipeline
            .authorize(&AuthRequest {
                ip: "10.0.0.1",
                authorization: Some(&header),
                required_roles: &[Role::Admin],
            })
            .await
            .unwrap();
        assert_eq!(claims.user_id, fx.alice.id);
    }

    #[tokio::test]
    async fn authorize_reports_missing_and_malformed_headers() {
        let fx = fixture().await;

        let err = fx
            .pipeline
            .authorize(&AuthRequest {
                ip: "10.0.0.1",
                ..AuthRequest::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingAuthorization));

        let err = fx
            .pipeline
            .authorize(&AuthRequest {
                ip: "10.0.0.1",
                authorization: Some("Basic YWxpY2U6d29uZGVybGFuZA=="),
                ..AuthRequest::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MalformedAuthorization));
    }

    #[tokio::test]
    async fn authorize_forbids_wrong_role() {
        let fx = fixture().await;
        let outcome = fx
            .pipeline
            .login(&fx.tenant_b.id, "bob", "builder")
            .await
            .unwrap();
        let header = bearer(&outcome.token);

        let err = fx
            .pipeline
            .authorize(&AuthRequest {
                ip: "10.0.0.1",
                authorization: Some(&header),
                required_roles: &[Role::Admin, Role::User],
                ..AuthRequest::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Forbidden));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_runs_before_token_checks() {
        let fx = fixture().await;
        let pipeline = fx
            .pipeline
            .clone()
            .with_request_policy(RateLimitPolicy::new(1, Duration::from_secs(60)));
        let request = AuthRequest {
            ip: "10.9.9.9",
            ..AuthRequest::default()
        };

        let first = pipeline.authorize(&request).await.unwrap_err();
        assert!(matches!(first, AuthError::MissingAuthorization));

        let second = pipeline.authorize(&request).await.unwrap_err();
        assert!(matches!(
            second,
            AuthError::RateLimitExceeded { scope: Scope::Ip }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn authorize_charges_user_after_token() {
        let fx = fixture().await;
        let update = TenantConfigUpdate {
            jwt_duration: 30,
            rate_limit_user: 2,
            ..TenantConfigUpdate::default()
        };
        fx.storage
            .update_tenant_config(&fx.tenant_a.id, &update)
            .await
            .unwrap();
        let issued = fx
            .pipeline
            .tokens()
            .issue(&fx.alice, Duration::from_secs(600))
            .unwrap();
        let header = bearer(&issued.token);

        // Unauthenticated attempts from the same address never reach the user counter.
        for _ in 0..5 {
            let err = fx
                .pipeline
                .authorize(&AuthRequest {
                    ip: "10.0.0.1",
                    ..AuthRequest::default()
                })
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::MissingAuthorization));
        }

        // The user limit follows alice across addresses.
        for ip in ["10.0.0.1", "10.0.0.2"] {
            let request = AuthRequest {
                ip,
                authorization: Some(&header),
                ..AuthRequest::default()
            };
            assert!(fx.pipeline.authorize(&request).await.is_ok());
        }
        let err = fx
            .pipeline
            .authorize(&AuthRequest {
                ip: "10.0.0.3",
                authorization: Some(&header),
                ..AuthRequest::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::RateLimitExceeded { scope: Scope::User }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn login_and_request_counters_are_separate() {
        let fx = fixture().await;
        let policy = RateLimitPolicy::new(1, Duration::from_secs(60));
        let pipeline = fx.pipeline.clone().with_request_policy(policy.clone());
        let issued = pipeline
            .tokens()
            .issue(&fx.alice, Duration::from_secs(600))
            .unwrap();
        let header = bearer(&issued.token);
        let request = AuthRequest {
            ip: "10.0.0.1",
            authorization: Some(&header),
            ..AuthRequest::default()
        };

        pipeline.admit_login("10.0.0.1", &policy).await.unwrap();
        pipeline.authorize(&request).await.unwrap();

        let err = pipeline.admit_login("10.0.0.1", &policy).await.unwrap_err();
        assert!(matches!(err, AuthError::RateLimitExceeded { scope: Scope::Ip }));
        let err = pipeline.authorize(&request).await.unwrap_err();
        assert!(matches!(err, AuthError::RateLimitExceeded { scope: Scope::Ip }));
    }

    #[tokio::test]
    async fn authorize_rejects_token_of_vanished_tenant() {
        let fx = fixture().await;
        let mut orphan = fx.alice.clone();
        orphan.tenant_id = "deleted-tenant".to_string();
        let issued = fx.pipeline.tokens().issue(&orphan, Duration::from_secs(60)).unwrap();
        let header = bearer(&issued.token);

        let err = fx
            .pipeline
            .authorize(&AuthRequest {
                ip: "10.0.0.1",
                authorization: Some(&header),
                ..AuthRequest::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TenantNotFound));
    }

    #[test]
    fn require_role_without_claims_is_distinct() {
        let err = AuthPipeline::require_role(None, &[Role::Admin]).unwrap_err();
        assert!(matches!(err, AuthError::MissingClaims));
    }

    #[test]
    fn require_role_accepts_listed_role() {
        let user = User::new("t1", "u", "h", Role::ReadOnly);
        let claims = Claims::for_user(&user, 0, Duration::from_secs(60));
        assert!(AuthPipeline::require_role(Some(&claims), &[Role::ReadOnly]).is_ok());
        assert!(AuthPipeline::require_role(Some(&claims), &[]).is_ok());
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(Some("Bearer abc")).unwrap(), "abc");
        assert!(matches!(
            extract_bearer(None),
            Err(AuthError::MissingAuthorization)
        ));
        assert!(matches!(
            extract_bearer(Some("")),
            Err(AuthError::MissingAuthorization)
        ));
        for bad in ["abc", "Bearer ", "bearer abc", "Bearer a b"] {
            assert!(matches!(
                extract_bearer(Some(bad)),
                Err(AuthError::MalformedAuthorization)
            ));
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl RateLimitStore for BrokenStore {
        async fn increment(&self, _key: &str, _window: Duration) -> Result<u64, StoreError> {
            Err(StoreError("timeout".into()))
        }

        async fn get_count(&self, _key: &str) -> Result<u64, StoreError> {
            Err(StoreError("timeout".into()))
        }
    }

    #[tokio::test]
    async fn store_failure_fails_closed() {
        let pipeline = AuthPipeline::new(
            Arc::new(InMemoryStorage::new()),
            Arc::new(TokenService::new(SECRET)),
            RateLimitEngine::new(Arc::new(BrokenStore), true),
            Arc::new(plain_verifier),
        );

        let err = pipeline
            .admit_login("10.0.0.1", &RateLimitPolicy::new(100, Duration::from_secs(60)))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable(_)));

        let pipeline =
            pipeline.with_request_policy(RateLimitPolicy::new(100, Duration::from_secs(60)));
        let err = pipeline
            .authorize(&AuthRequest {
                ip: "10.0.0.1",
                authorization: Some("Bearer anything"),
                ..AuthRequest::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable(_)));
    }

    /// Delegates to an in-memory store but cannot record logins.
    struct NoLastLogin(Arc<InMemoryStorage>);

    #[async_trait]
    impl Storage for NoLastLogin {
        async fn create_tenant(&self, tenant: Tenant) -> StorageResult<Tenant> {
            self.0.create_tenant(tenant).await
        }

        async fn get_tenant(&self, id: &str) -> StorageResult<Tenant> {
            self.0.get_tenant(id).await
        }

        async fn update_tenant_config(
            &self,
            tenant_id: &str,
            update: &TenantConfigUpdate,
        ) -> StorageResult<TenantConfig> {
            self.0.update_tenant_config(tenant_id, update).await
        }

        async fn create_user(&self, user: User) -> StorageResult<User> {
            self.0.create_user(user).await
        }

        async fn get_user(&self, id: &str) -> StorageResult<User> {
            self.0.get_user(id).await
        }

        async fn get_user_by_username(&self, username: &str) -> StorageResult<User> {
            self.0.get_user_by_username(username).await
        }

        async fn update_user_last_login(&self, _id: &str) -> StorageResult<()> {
            Err(StorageError::Backend("read-only replica".into()))
        }

        async fn list_users(&self, tenant_id: &str, query: &UserQuery) -> StorageResult<UserPage> {
            self.0.list_users(tenant_id, query).await
        }
    }
}
