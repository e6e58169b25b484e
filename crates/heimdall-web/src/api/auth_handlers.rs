use axum::extract::{Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::Json;
use heimdall_core::{Claims, LoginOutcome, TokenValidation};

use crate::auth::middleware::AuthUser;
use crate::dto::LoginRequest;
use crate::error::AppError;
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginOutcome>, AppError> {
    let outcome = state
        .pipeline
        .login(&tenant_id, &body.username, &body.password)
        .await?;
    Ok(Json(outcome))
}

pub async fn validate_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenValidation>, AppError> {
    let authorization = headers
        .get(AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or_default());
    let validation = state.pipeline.validate_token(authorization).await?;
    Ok(Json(validation))
}

pub async fn me(AuthUser(claims): AuthUser) -> Json<Claims> {
    Json(claims)
}
