use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

const THROTTLED_PREFIX: &str = "/api";
const FORWARDED_FOR: &str = "x-forwarded-for";
/// Client table size above which expired windows are dropped.
const PRUNE_ABOVE: usize = 4096;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

/// Per-client request counter over fixed windows.
#[derive(Debug)]
pub(crate) struct FixedWindow {
    max: u32,
    period: Duration,
    trust_proxy: bool,
    clients: Mutex<HashMap<IpAddr, Window>>,
}

impl FixedWindow {
    pub(crate) fn new(max: u32, period: Duration) -> Self {
        Self {
            max,
            period,
            trust_proxy: false,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Keys clients on the first `X-Forwarded-For` hop when the peer is a trusted proxy.
    pub(crate) fn trusting_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    /// Counts a hit and reports whether the client is still within its allowance.
    pub(crate) fn admit(&self, client: IpAddr, now: Instant) -> bool {
        let Ok(mut clients) = self.clients.lock() else {
            tracing::error!("rate limiter state poisoned; admitting request");
            return true;
        };
        if clients.len() > PRUNE_ABOVE {
            let period = self.period;
            clients.retain(|_, window| now.duration_since(window.started) < period);
        }
        let window = clients.entry(client).or_insert(Window {
            started: now,
            hits: 0,
        });
        if now.duration_since(window.started) >= self.period {
            *window = Window {
                started: now,
                hits: 0,
            };
        }
        window.hits = window.hits.saturating_add(1);
        window.hits <= self.max
    }
}

fn forwarded_ip(request: &Request) -> Option<IpAddr> {
    request
        .headers()
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|value| value.trim().parse::<IpAddr>().ok())
}

fn peer_ip(request: &Request) -> Option<IpAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

fn client_ip(request: &Request, trust_proxy: bool) -> IpAddr {
    let forwarded = if trust_proxy {
        forwarded_ip(request)
    } else {
        None
    };
    forwarded
        .or_else(|| peer_ip(request))
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

pub(crate) async fn throttle(
    State(limiter): State<Arc<FixedWindow>>,
    request: Request,
    next: Next,
) -> Response {
    if !request.uri().path().starts_with(THROTTLED_PREFIX) {
        return next.run(request).await;
    }
    let client = client_ip(&request, limiter.trust_proxy);
    if limiter.admit(client, Instant::now()) {
        return next.run(request).await;
    }
    tracing::warn!(%client, "rate limit exceeded");
    let body = json!({ "message": "Too many requests from this IP, please try again later." });
    (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
}
