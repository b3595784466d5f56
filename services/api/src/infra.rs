use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::header::{
    AUTHORIZATION, CONTENT_TYPE, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use realty::config::HttpConfig;
use tower::ServiceExt;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::routes::route_not_found;
use crate::throttle::{throttle, FixedWindow};

/// Request bodies above this size are rejected before reaching a handler.
pub(crate) const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring malformed CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_origin(AllowOrigin::list(origins))
}

/// Wraps the routed app with the edge layers shared by every deployment.
pub(crate) fn with_edge_layers(app: Router, http: &HttpConfig) -> Router {
    let limiter = Arc::new(
        FixedWindow::new(
            http.rate_limit_max,
            Duration::from_secs(http.rate_limit_window_secs),
        )
        .trusting_proxy(http.trust_proxy),
    );
    app.layer(from_fn_with_state(limiter, throttle))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(cors_layer(&http.cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// Unmatched paths: JSON 404 under `/api`, the storefront bundle elsewhere when one is configured.
pub(crate) fn with_fallback(app: Router, static_dir: Option<&Path>) -> Router {
    let Some(dir) = static_dir else {
        return app.fallback(route_not_found);
    };
    tracing::info!(dir = %dir.display(), "serving storefront assets");
    let storefront = ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")));
    app.fallback(move |request: Request| async move {
        if request.uri().path().starts_with("/api") {
            return route_not_found().await.into_response();
        }
        match storefront.oneshot(request).await {
            Ok(response) => response.into_response(),
            Err(never) => match never {},
        }
    })
}
