use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method};
use axum::routing::{delete, get, post, put};
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::signal::{self, ctrl_c};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod announcement;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod media;
pub mod models;
pub mod property;
pub mod schema;
pub mod settings;
pub mod users;

use config::AppConfig;
use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
}

/// Bearer-token gate for the admin router. Anyone without an admin or owner
/// role is turned away before the handler runs.
async fn require_admin(
    headers: HeaderMap,
    axum::extract::State(state): axum::extract::State<AppState>,
    request: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> Result<axum::response::Response, AppError> {
    let auth_header = headers.get(AUTHORIZATION).ok_or(AppError::Unauthorized)?;
    let token = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized)?
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;
    let claims = auth::validate_token(token, &state.config.jwt_secret)?;
    if !auth::Role::parse(&claims.role).is_admin() {
        return Err(AppError::Forbidden);
    }
    info!("Authenticated admin user: {}", claims.sub);
    Ok(next.run(request).await)
}

pub fn build_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/api/properties", post(property::create_property))
        .route("/api/properties/:id", put(property::update_property))
        .route("/api/properties/:id", delete(property::delete_property))
        .route("/api/properties/:id/images", post(media::upload_property_images))
        .route(
            "/api/properties/:id/images/:filename",
            delete(media::delete_property_image),
        )
        .route("/api/properties/:id/restore", post(media::restore_property_handler))
        .route("/api/restore", post(media::restore_all_handler))
        .route("/api/images/:filename/validate", get(media::validate_image))
        .route("/api/announcements/all", get(announcement::get_all_announcements))
        .route("/api/announcements", post(announcement::create_announcement))
        .route("/api/announcements/:id", put(announcement::update_announcement))
        .route("/api/announcements/:id", delete(announcement::delete_announcement))
        .route("/api/users", get(users::get_users))
        .route("/api/users", post(users::create_user))
        .route("/api/users/:id/role", put(users::update_user_role))
        .route("/api/users/:id", delete(users::delete_user))
        .route("/api/settings", put(settings::update_settings))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin))
        // Room for a full multipart batch; per-file limits apply on top.
        .layer(axum::extract::DefaultBodyLimit::max(64 * 1024 * 1024));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_origin(Any);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/properties", get(property::get_properties))
        .route("/api/properties/:id", get(property::get_property))
        .route("/api/announcements", get(announcement::get_active_announcements))
        .route("/api/settings", get(settings::get_settings))
        .route("/api/login", post(users::login))
        .nest_service("/uploads", ServeDir::new(&state.config.uploads_dir))
        .merge(admin_routes)
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() -> Result<(), Box<dyn std::error::Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = AppConfig::load()?;
    info!("Loaded config for port {}", config.port);

    db::check_connection(&config.database_url)?;
    std::fs::create_dir_all(&config.uploads_dir)?;

    let address = format!("0.0.0.0:{}", config.port);
    let state = AppState { config };
    let app = build_router(state);

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
