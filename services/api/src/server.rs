use crate::cli::ServeArgs;
use crate::infra::{with_edge_layers, with_fallback, AppState};
use crate::routes::ops_router;
use axum::{Extension, Router};
use axum_prometheus::PrometheusMetricLayer;
use realty::accounts::LoggingMailer;
use realty::api_router;
use realty::config::AppConfig;
use realty::error::AppError;
use realty::storage::{MemoryStore, PgStore, Store};
use realty::telemetry;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    if config.database.url.is_some() {
        let store = Arc::new(PgStore::connect(&config.database).await?);
        let served = serve(Arc::clone(&store), &config).await;
        store.close().await;
        info!("database pool closed");
        served
    } else {
        tracing::warn!("DATABASE_URL not set; listings and accounts live in memory only");
        serve(Arc::new(MemoryStore::new()), &config).await
    }
}

/// The API, the ops probes, and the storefront fallback behind the edge layers.
pub(crate) fn build_app<S: Store>(store: Arc<S>, config: &AppConfig, state: AppState) -> Router {
    let app = api_router(store, Arc::new(LoggingMailer), &config.auth)
        .merge(ops_router())
        .layer(Extension(state));
    with_edge_layers(
        with_fallback(app, config.http.static_dir.as_deref()),
        &config.http,
    )
}

async fn serve<S: Store>(store: Arc<S>, config: &AppConfig) -> Result<(), AppError> {
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: Arc::clone(&readiness),
        metrics: Arc::new(prometheus_handle),
    };
    let app = build_app(store, config, state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness.store(true, Ordering::Release);

    info!(?config.environment, %addr, "realty api ready");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    readiness.store(false, Ordering::Release);
    info!("realty api stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received; draining connections");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Duration;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use realty::config::{
        AppEnvironment, AuthConfig, DatabaseConfig, HttpConfig, ServerConfig, TelemetryConfig,
    };
    use tower::ServiceExt;

    fn config(rate_limit_max: u32) -> AppConfig {
        AppConfig {
            environment: AppEnvironment::Test,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 1,
            },
            auth: AuthConfig {
                jwt_secret: "server-test-secret".to_string(),
                token_ttl: Duration::hours(1),
                bcrypt_cost: 4,
                reset_token_ttl: Duration::minutes(60),
            },
            http: HttpConfig {
                cors_origins: vec!["http://localhost:3000".to_string()],
                static_dir: None,
                rate_limit_max,
                rate_limit_window_secs: 900,
                trust_proxy: false,
            },
        }
    }

    fn app(rate_limit_max: u32) -> Router {
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        build_app(Arc::new(MemoryStore::new()), &config(rate_limit_max), state)
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request builds");
        let response = app.clone().oneshot(request).await.expect("call");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1 << 16)
            .await
            .expect("body");
        (status, serde_json::from_slice(&body).unwrap_or_default())
    }

    #[tokio::test]
    async fn assembled_app_serves_api_and_probes() {
        let app = app(100);
        let (status, body) = get(&app, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");

        let (status, body) = get(&app, "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");

        let (status, body) = get(&app, "/api/properties").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["properties"], serde_json::json!([]));

        let (status, body) = get(&app, "/api/does-not-exist").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route not found");
    }

    #[tokio::test]
    async fn api_calls_past_the_window_allowance_are_throttled() {
        let app = app(2);
        assert_eq!(get(&app, "/api/health").await.0, StatusCode::OK);
        assert_eq!(get(&app, "/api/health").await.0, StatusCode::OK);
        let (status, body) = get(&app, "/api/health").await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            body["message"],
            "Too many requests from this IP, please try again later."
        );
        assert_eq!(get(&app, "/health").await.0, StatusCode::OK);
    }
}
