mod api;
mod auth;
mod config;
mod dto;
mod error;
mod middleware;
mod state;

use std::sync::Arc;

use axum::http::{header, Method};
use heimdall_core::{
    AuthPipeline, InMemoryStorage, MemoryStore, RateLimitEngine, RateLimitStore, RedisStore,
    Storage, Tenant, TokenService, User,
};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::auth::password::Argon2Verifier;
use crate::config::{RateLimitBackend, ServerConfig};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "heimdall_web=debug,heimdall_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::load()?;
    let bind_addr = config.bind_addr;

    let counter_store: Arc<dyn RateLimitStore> = match config.rate_limit.backend {
        RateLimitBackend::Memory => Arc::new(MemoryStore::new()),
        RateLimitBackend::Redis => {
            let store = RedisStore::connect(&config.rate_limit.redis_url).await?;
            tracing::info!("Rate limiting backed by Redis at {}", config.rate_limit.redis_url);
            Arc::new(store)
        }
    };
    let limiter = RateLimitEngine::new(counter_store, config.rate_limit.enabled);
    if !limiter.is_enabled() {
        tracing::warn!("Rate limiting is disabled");
    }

    let storage = Arc::new(InMemoryStorage::new());
    seed(storage.as_ref(), &config).await?;

    let pipeline = AuthPipeline::new(
        storage,
        Arc::new(TokenService::new(&config.auth.jwt_secret)),
        limiter,
        Arc::new(Argon2Verifier),
    )
    .with_request_policy(config.rate_limit.request_policy());

    let state = AppState {
        pipeline,
        login_policy: config.rate_limit.login_policy(),
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = api::app(state)
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("heimdall listening on http://{}", bind_addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Loads `[[tenants]]` and `[[users]]` from the config into storage.
async fn seed(storage: &dyn Storage, config: &ServerConfig) -> anyhow::Result<()> {
    for seed in &config.tenants {
        let mut tenant = Tenant::new(&seed.name, &seed.description, seed.settings.to_update())
            .map_err(|e| anyhow::anyhow!("Invalid tenant seed {}: {e}", seed.id))?;
        tenant.id = seed.id.clone();
        tenant.config.tenant_id = seed.id.clone();
        storage.create_tenant(tenant).await?;
    }

    for seed in &config.users {
        storage
            .get_tenant(&seed.tenant_id)
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "User {} refers to unknown tenant {}",
                    seed.username,
                    seed.tenant_id
                )
            })?;

        let mut user = User::new(&seed.tenant_id, &seed.username, &seed.password_hash, seed.role);
        user.phone = seed.phone.clone();
        storage.create_user(user).await?;
    }

    tracing::info!(
        "Seeded {} tenant(s) and {} user(s)",
        config.tenants.len(),
        config.users.len()
    );
    Ok(())
}
