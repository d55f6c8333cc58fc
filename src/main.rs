use printshelf_web::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    upstream::{HttpUpstream, UpstreamState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production variables)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "printshelf_web=debug,tower_http=info,axum=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);
    if config.jwt_secret.is_none() {
        tracing::warn!("JWT_SECRET not set: session tokens are read without signature verification");
    }

    // 3. Upstream client
    let upstream = HttpUpstream::new(&config)
        .expect("FATAL: Failed to build the upstream HTTP client.");
    tracing::info!(upstream = %config.upstream_url, "Upstream API configured");
    let upstream = Arc::new(upstream) as UpstreamState;

    // 4. State, router and server
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(config, upstream));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/swagger-ui", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
