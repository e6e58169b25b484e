use heimdall_core::{AuthMethod, TenantConfig, TenantConfigUpdate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTenantRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub auth_method: AuthMethod,
    pub jwt_duration: u32,
    pub rate_limit_ip: u32,
    pub rate_limit_user: u32,
    pub rate_limit_window: u32,
}

impl CreateTenantRequest {
    pub fn settings(&self) -> TenantConfigUpdate {
        TenantConfigUpdate {
            auth_method: self.auth_method,
            jwt_duration: self.jwt_duration,
            rate_limit_ip: self.rate_limit_ip,
            rate_limit_user: self.rate_limit_user,
            rate_limit_window: self.rate_limit_window,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateTenantConfigResponse {
    pub message: String,
    pub config: TenantConfig,
}
