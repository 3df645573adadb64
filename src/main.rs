use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;

use auth::rate_limit::RateLimitState;
use config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: RateLimitState,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "calmworks_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Config::from_env();
    let config = Arc::new(config);

    // Database
    let db = db::create_pool(&config.database_url).await;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations applied");

    let rate_limiter = RateLimitState::new();

    let state = AppState {
        db,
        config: config.clone(),
        rate_limiter,
    };

    // Auth routes with per-IP rate limiting
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/api/tiers", get(handlers::billing::list_tiers))
        .route(
            "/api/billing/webhook",
            post(handlers::billing::stripe_webhook),
        )
        .merge(auth_routes);

    let protected_routes = Router::new()
        .route("/api/me", get(handlers::auth::me))
        // Mood & burnout
        .route("/api/mood", post(handlers::mood::upsert_mood))
        .route("/api/mood", get(handlers::mood::list_moods))
        .route("/api/mood/risk", get(handlers::mood::burnout_risk))
        // Journal
        .route("/api/journal", post(handlers::journal::create_entry))
        .route("/api/journal", get(handlers::journal::list_entries))
        // Vent chat
        .route("/api/chat", post(handlers::chat::send_message))
        .route("/api/chat/history", get(handlers::chat::history))
        // Audio boosts
        .route("/api/audio", get(handlers::audio::list_boosts))
        .route("/api/audio/:id/play", post(handlers::audio::play_boost))
        // Micro-lessons
        .route("/api/lessons", get(handlers::lessons::list_lessons))
        .route(
            "/api/lessons/:id/complete",
            post(handlers::lessons::complete_lesson),
        )
        // Billing & referrals
        .route(
            "/api/billing/subscription",
            get(handlers::billing::get_subscription),
        )
        .route(
            "/api/billing/checkout",
            post(handlers::billing::create_checkout),
        )
        .route(
            "/api/referral/redeem",
            post(handlers::billing::redeem_referral),
        )
        // Auth actions requiring a session
        .route("/api/auth/logout", post(handlers::auth::logout))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let allowed_origins: Vec<axum::http::HeaderValue> = {
        let mut origins = vec![config
            .frontend_url
            .parse::<axum::http::HeaderValue>()
            .unwrap()];
        // In dev, also allow LAN access (e.g. testing from another device)
        if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
            for o in extra.split(',') {
                if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                    origins.push(hv);
                }
            }
        }
        origins
    };
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true);

    auth::rate_limit::spawn_cleanup_worker(state.rate_limiter.clone());

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    // into_make_service_with_connect_info provides client IPs for rate limiting
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .unwrap();
}
