use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use heimdall_core::{Role, Tenant, TenantConfigUpdate, UserPage, UserQuery};

use crate::auth::middleware::AuthUser;
use crate::dto::{CreateTenantRequest, UpdateTenantConfigResponse};
use crate::error::AppError;
use crate::state::AppState;

pub async fn create_tenant(
    State(state): State<AppState>,
    Json(body): Json<CreateTenantRequest>,
) -> Result<(StatusCode, Json<Tenant>), AppError> {
    let tenant = Tenant::new(&body.name, &body.description, body.settings())?;
    let tenant = state.pipeline.storage().create_tenant(tenant).await?;
    tracing::info!("Tenant created: {} ({})", tenant.name, tenant.id);
    Ok((StatusCode::CREATED, Json(tenant)))
}

pub async fn update_tenant_config(
    user: AuthUser,
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(body): Json<TenantConfigUpdate>,
) -> Result<Json<UpdateTenantConfigResponse>, AppError> {
    user.require_tenant(&tenant_id)?;
    user.require_role(&[Role::Admin])?;
    body.validate()?;

    let config = state
        .pipeline
        .storage()
        .update_tenant_config(&tenant_id, &body)
        .await?;

    tracing::info!("Tenant {tenant_id} config updated by {}", user.0.user_id);
    Ok(Json(UpdateTenantConfigResponse {
        message: "Tenant configuration updated successfully".to_string(),
        config,
    }))
}

pub async fn list_users(
    user: AuthUser,
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<UserPage>, AppError> {
    user.require_tenant(&tenant_id)?;
    query.validate()?;

    let storage = state.pipeline.storage();
    storage.get_tenant(&tenant_id).await?;
    let page = storage.list_users(&tenant_id, &query).await?;
    Ok(Json(page))
}
