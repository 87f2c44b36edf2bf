//! Axum HTTP server for the assessment API.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, header},
    routing::get,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::{Config, RateLimitConfig, ScoringConfig};
use crate::error::{ServerError, SubmissionError};
use crate::notify::SubmissionNotifier;
use crate::store::SubmissionStore;
use crate::web::auth::{API_KEY_HEADER, AccessPolicy};
use crate::web::handlers::{download_handler, health_handler, list_handler, submit_handler};
use crate::web::rate_limit::FixedWindowLimiter;

/// Shared state for all handlers.
pub struct AppState {
    pub scoring: ScoringConfig,
    pub access: AccessPolicy,
    pub rate_limits: RateLimitConfig,
    pub limiter: FixedWindowLimiter,
    pub store: Arc<dyn SubmissionStore>,
    /// `None` when email delivery is not configured.
    pub notifier: Option<Arc<SubmissionNotifier>>,
}

impl AppState {
    pub fn new(
        config: &Config,
        store: Arc<dyn SubmissionStore>,
        notifier: Option<Arc<SubmissionNotifier>>,
    ) -> Self {
        Self {
            scoring: config.scoring,
            access: AccessPolicy::new(&config.access),
            rate_limits: config.rate_limit,
            limiter: FixedWindowLimiter::new(config.rate_limit.window),
            store,
            notifier,
        }
    }

    pub(crate) fn enforce_rate_limit(
        &self,
        label: &str,
        client: &str,
        max: u64,
    ) -> Result<(), SubmissionError> {
        if self.limiter.check(label, client, max) {
            Ok(())
        } else {
            tracing::warn!(label, client, "Rate limit exceeded");
            Err(SubmissionError::RateLimited)
        }
    }
}

/// Build the router with CORS, body limit, security headers and tracing.
pub fn build_router(state: Arc<AppState>) -> Router {
    let allow_origin = if state.access.allowed_origins().is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            state
                .access
                .allowed_origins()
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            HeaderName::from_static(API_KEY_HEADER),
        ]));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/submissions", get(list_handler).post(submit_handler))
        .route("/api/admin/submissions/download", get(download_handler))
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB max request body
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn start_server<F>(
    addr: SocketAddr,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let bound_addr = listener
        .local_addr()
        .map_err(|source| ServerError::Bind { addr, source })?;

    let app = build_router(state);
    tracing::info!(%bound_addr, "Personality backend listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown.await;
        tracing::info!("Personality backend shutting down");
    })
    .await
    .map_err(ServerError::Serve)
}
