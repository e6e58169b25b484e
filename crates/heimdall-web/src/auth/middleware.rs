use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::header::AUTHORIZATION;
use heimdall_core::{AuthPipeline, AuthRequest, Claims, Role};

use crate::error::AppError;
use crate::state::AppState;

/// Claims of a request that passed the rate limit and token checks.
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Role gate for handlers behind this extractor.
    pub fn require_role(&self, allowed: &[Role]) -> Result<&Claims, AppError> {
        Ok(AuthPipeline::require_role(Some(&self.0), allowed)?)
    }

    /// Rejects callers whose token was issued for another tenant.
    pub fn require_tenant(&self, tenant_id: &str) -> Result<&Claims, AppError> {
        self.0
            .ensure_tenant(tenant_id)
            .map_err(|_| AppError::Forbidden("Access denied to this tenant".to_string()))?;
        Ok(&self.0)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ip = client_ip(parts, state).await;
        let authorization = parts
            .headers
            .get(AUTHORIZATION)
            .map(|v| v.to_str().unwrap_or_default());

        let claims = state
            .pipeline
            .authorize(&AuthRequest {
                ip: &ip,
                authorization,
                required_roles: &[],
            })
            .await?;

        Ok(AuthUser(claims))
    }
}

/// Peer address of the connection. Requests without one share a single bucket.
pub async fn client_ip<S: Send + Sync>(parts: &mut Parts, state: &S) -> String {
    match ConnectInfo::<SocketAddr>::from_request_parts(parts, state).await {
        Ok(ConnectInfo(addr)) => addr.ip().to_string(),
        Err(_) => "unknown".to_string(),
    }
}
