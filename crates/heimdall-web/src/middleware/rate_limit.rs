// Login admission. Applied as a route layer on `/{tenant_id}/login`. Attempts
// are counted apart from authenticated requests, under the stricter of the
// tenant's limits and the configured `rate_limit.login_*` policy. Unknown
// tenants get the configured policy alone and are then rejected by the handler.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppError;
use crate::state::AppState;

pub async fn login_rate_limit(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let policy = match state.pipeline.storage().get_tenant(&tenant_id).await {
        Ok(tenant) => tenant.config.rate_limit_policy().stricter(&state.login_policy),
        Err(_) => state.login_policy.clone(),
    };

    state
        .pipeline
        .admit_login(&addr.ip().to_string(), &policy)
        .await?;

    Ok(next.run(req).await)
}
