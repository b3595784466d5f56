//! Fixtures shared by the router tests of every module.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use serde_json::Value;
use tower::ServiceExt;

use crate::accounts::domain::{NewUser, Role, User, UserId};
use crate::accounts::mailer::{MailerError, ResetMailer, ResetNotice};
use crate::accounts::token::TokenAuthority;
use crate::api_router;
use crate::config::AuthConfig;
use crate::listings::domain::{Listing, ListingType, NewListing, Purpose};
use crate::storage::{ListingRepository, MemoryStore, UserRepository};

pub(crate) const PASSWORD: &str = "harbour9!";

pub(crate) fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "router-test-secret".to_string(),
        token_ttl: Duration::hours(1),
        bcrypt_cost: 4,
        reset_token_ttl: Duration::minutes(60),
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingMailer {
    notices: Mutex<Vec<ResetNotice>>,
}

impl RecordingMailer {
    pub(crate) fn notices(&self) -> Vec<ResetNotice> {
        self.notices.lock().expect("mailer mutex poisoned").clone()
    }
}

#[async_trait]
impl ResetMailer for RecordingMailer {
    async fn send_reset(&self, notice: ResetNotice) -> Result<(), MailerError> {
        self.notices
            .lock()
            .expect("mailer mutex poisoned")
            .push(notice);
        Ok(())
    }
}

/// The full API router over a fresh in-memory store.
pub(crate) struct TestApp {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) mailer: Arc<RecordingMailer>,
    tokens: TokenAuthority,
    router: Router,
}

impl TestApp {
    pub(crate) fn new() -> Self {
        let config = auth_config();
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let router = api_router(Arc::clone(&store), Arc::clone(&mailer), &config);
        Self {
            store,
            mailer,
            tokens: TokenAuthority::from_config(&config),
            router,
        }
    }

    /// Inserts an account whose password is [`PASSWORD`] and returns it with a session token.
    pub(crate) async fn user(&self, name: &str, role: Role) -> (User, String) {
        let password_hash = bcrypt::hash(PASSWORD, 4).expect("hash password");
        let user = self
            .store
            .insert_user(NewUser {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                password_hash,
                phone: Some("555-0100".to_string()),
                role,
            })
            .await
            .expect("user inserted");
        let token = self.tokens.issue(&user).expect("token issued");
        (user, token)
    }

    pub(crate) async fn agent(&self, name: &str) -> (User, String) {
        self.user(name, Role::Agent).await
    }

    pub(crate) async fn buyer(&self, name: &str) -> (User, String) {
        self.user(name, Role::Buyer).await
    }

    pub(crate) async fn listing(&self, agent: UserId, title: &str, price: f64) -> Listing {
        self.store
            .insert_listing(agent, new_listing(title, price))
            .await
            .expect("listing inserted")
    }

    pub(crate) async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("route executes");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .expect("read body");
        if body.is_empty() {
            return (status, Value::Null);
        }
        (status, serde_json::from_slice(&body).expect("json payload"))
    }
}

pub(crate) fn new_listing(title: &str, price: f64) -> NewListing {
    NewListing {
        title: title.to_string(),
        description: Some(format!("{title} with a garden")),
        listing_type: ListingType::House,
        purpose: Purpose::Buy,
        price,
        location: "Lakeside".to_string(),
        address: Some("12 Harbour Road".to_string()),
        bedrooms: Some(3),
        bathrooms: Some(2),
        area: Some(140.0),
        features: vec!["garden".to_string()],
        images: Vec::new(),
    }
}

pub(crate) fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    request(Method::GET, uri, token, None)
}

pub(crate) fn delete(uri: &str, token: Option<&str>) -> Request<Body> {
    request(Method::DELETE, uri, token, None)
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> Request<Body> {
    request(method, uri, token, Some(body))
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}
