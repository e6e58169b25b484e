use heimdall_core::{AuthPipeline, RateLimitPolicy};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: AuthPipeline,
    /// Floor for login attempts; the only policy for tenants that do not exist.
    pub login_policy: RateLimitPolicy,
}
