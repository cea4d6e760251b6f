use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;

use crate::config::Config;
use crate::services::{AuthService, CodeService, QrService};
use crate::state::SharedState;

mod assets;
pub mod auth;
mod codes;
mod error;
mod extract;
mod observability;
mod qr;
mod sessions;
mod system;
mod types;
mod validation;

pub use error::ApiError;
pub use observability::{REQUEST_ID_HEADER, RedemptionContext, RequestUser};
pub use sessions::SessionTable;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,

    pub sessions: SessionTable,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn code_service(&self) -> &Arc<dyn CodeService> {
        &self.shared.code_service
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn qr(&self) -> &QrService {
        &self.shared.qr
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
        sessions: SessionTable::default(),
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let server = state.config().server.clone();

    let protected_routes = create_protected_router();

    let session_layer = SessionManagerLayer::new(state.sessions.clone())
        .with_name("qrpromo.sid")
        .with_secure(server.secure_cookies)
        .with_http_only(true)
        .with_same_site(tower_sessions::cookie::SameSite::Lax);

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/auth-status", get(auth::auth_status))
        .route("/health", get(system::health))
        .layer(session_layer)
        .with_state(state);

    let cors_layer = if server.cors_allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = server
            .cors_allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::DELETE,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE])
            .allow_credentials(true)
    };

    Router::new()
        .nest("/api", api_router)
        .fallback(assets::serve_asset)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(observability::logging_middleware))
                .layer(middleware::from_fn(
                    observability::security_headers_middleware,
                ))
                .layer(cors_layer),
        )
}

fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate-code", post(codes::generate_code))
        .route("/validate-code", post(codes::validate_code))
        .route("/codes", get(codes::list_codes))
        .route("/codes/stats", get(codes::code_stats))
        .route("/codes/lookup/{code}", get(codes::lookup_code))
        .route("/codes/{id}", delete(codes::delete_code))
        .route("/qr-code/{code}", get(qr::qr_data_url))
        .route("/generate-qr/{code}", get(qr::qr_png))
        .route("/change-password", post(auth::change_password))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn(auth::auth_middleware))
}
