mod auth_handlers;
mod tenant_handlers;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use axum::Router;

use crate::middleware::rate_limit::login_rate_limit;
use crate::middleware::security_headers::security_headers;
use crate::state::AppState;

/// Routes that do not need a token. Login is gated by the rate limiter.
pub fn public_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/tenants", post(tenant_handlers::create_tenant))
        .route(
            "/{tenant_id}/login",
            post(auth_handlers::login)
                .route_layer(from_fn_with_state(state, login_rate_limit)),
        )
        .route("/validate-token", post(auth_handlers::validate_token))
}

/// Routes whose handlers take an [`AuthUser`](crate::auth::middleware::AuthUser).
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/me", get(auth_handlers::me))
        .route(
            "/tenants/{tenant_id}/config",
            put(tenant_handlers::update_tenant_config),
        )
        .route("/tenants/{tenant_id}/users", get(tenant_handlers::list_users))
}

/// The full `/api/v1` application.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            public_router(state.clone()).merge(protected_router()),
        )
        .layer(from_fn(security_headers))
        .with_state(state)
}
