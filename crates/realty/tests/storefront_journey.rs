use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use realty::accounts::LoggingMailer;
use realty::api_router;
use realty::config::AuthConfig;
use realty::storage::MemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;

fn storefront() -> Router {
    let auth = AuthConfig {
        jwt_secret: "journey-secret".to_string(),
        token_ttl: Duration::hours(1),
        bcrypt_cost: 4,
        reset_token_ttl: Duration::minutes(30),
    };
    api_router(
        Arc::new(MemoryStore::new()),
        Arc::new(LoggingMailer),
        &auth,
    )
}

async fn call(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request builds");
    let response = router.clone().oneshot(request).await.expect("route runs");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("body readable");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

async fn register(router: &Router, name: &str, role: &str) -> String {
    let (status, body) = call(
        router,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "password": "harbour9!",
            "confirmPassword": "harbour9!",
            "terms": true,
            "role": role,
            "phone": "555-0142",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().expect("token issued").to_string()
}

#[tokio::test]
async fn agent_lists_buyer_saves_and_asks() {
    let router = storefront();
    let agent = register(&router, "Avery", "agent").await;
    let buyer = register(&router, "Quinn", "buyer").await;

    let (status, body) = call(
        &router,
        Method::POST,
        "/api/properties",
        Some(&agent),
        Some(json!({
            "title": "Harbour View Flat",
            "description": "Two bedrooms above the marina",
            "type": "apartment",
            "purpose": "rent",
            "price": 1850,
            "location": "Marina",
            "bedrooms": 2,
            "bathrooms": 1,
            "features": ["balcony"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let listing_id = body["property"]["id"].as_i64().expect("listing id");

    let (status, body) = call(
        &router,
        Method::GET,
        "/api/properties?purpose=rent&location=marina",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["properties"][0]["title"], "Harbour View Flat");
    assert_eq!(body["properties"][0]["agent_name"], "Avery");

    let favorite = format!("/api/favorites/{listing_id}");
    let (status, _) = call(&router, Method::POST, &favorite, Some(&buyer), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let check = format!("/api/favorites/check/{listing_id}");
    let (_, body) = call(&router, Method::GET, &check, Some(&buyer), None).await;
    assert_eq!(body["isFavorited"], true);

    let (status, _) = call(
        &router,
        Method::POST,
        "/api/contact",
        Some(&buyer),
        Some(json!({
            "name": "Quinn",
            "email": "quinn@example.com",
            "message": "Are pets allowed?",
            "propertyId": listing_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        &router,
        Method::GET,
        "/api/contact/agent-inquiries",
        Some(&agent),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let inquiry_id = body["inquiries"][0]["id"].as_i64().expect("inquiry id");
    assert_eq!(body["inquiries"][0]["property_title"], "Harbour View Flat");

    let (status, body) = call(
        &router,
        Method::PUT,
        &format!("/api/contact/{inquiry_id}/status"),
        Some(&agent),
        Some(json!({ "status": "responded", "response": "Cats only." })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inquiry"]["status"], "responded");

    let (status, body) =
        call(&router, Method::GET, "/api/users/dashboard", Some(&agent), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["total_properties"], 1);

    let (status, body) =
        call(&router, Method::GET, "/api/users/dashboard", Some(&buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["favoriteCount"], 1);
    assert_eq!(body["stats"]["openInquiries"], 1);
}

#[tokio::test]
async fn deleting_a_listing_drops_it_from_search_and_favorites() {
    let router = storefront();
    let agent = register(&router, "Avery", "agent").await;
    let buyer = register(&router, "Quinn", "buyer").await;

    let (_, body) = call(
        &router,
        Method::POST,
        "/api/properties",
        Some(&agent),
        Some(json!({
            "title": "Orchard Lot",
            "type": "land",
            "purpose": "buy",
            "price": 90000,
            "location": "Valley",
        })),
    )
    .await;
    let listing_id = body["property"]["id"].as_i64().expect("listing id");
    let favorite = format!("/api/favorites/{listing_id}");
    call(&router, Method::POST, &favorite, Some(&buyer), None).await;

    let (status, _) = call(
        &router,
        Method::DELETE,
        &format!("/api/properties/{listing_id}"),
        Some(&buyer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &router,
        Method::DELETE,
        &format!("/api/properties/{listing_id}"),
        Some(&agent),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(&router, Method::GET, "/api/properties", None, None).await;
    assert_eq!(body["properties"], json!([]));
    let (_, body) = call(&router, Method::GET, "/api/favorites", Some(&buyer), None).await;
    assert_eq!(body["favorites"], json!([]));
}
