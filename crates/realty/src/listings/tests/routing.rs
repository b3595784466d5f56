use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::listings::domain::{ListingPatch, ListingStatus};
use crate::storage::ListingRepository;
use crate::testing::{delete, get, json_request, TestApp};

fn draft() -> serde_json::Value {
    json!({
        "title": "Cedar cottage",
        "description": "Two storeys near the park",
        "price": 325000,
        "type": "house",
        "purpose": "buy",
        "location": "Maple Heights",
        "address": "4 Cedar Lane",
        "bedrooms": 3,
        "bathrooms": 2,
        "features": ["fireplace"],
    })
}

#[tokio::test]
async fn agents_create_listings_buyers_cannot() {
    let app = TestApp::new();
    let (agent, agent_token) = app.agent("Blake").await;
    let (_, buyer_token) = app.buyer("Riley").await;

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/properties",
            Some(&buyer_token),
            draft(),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Only agents can create properties");

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/properties",
            Some(&agent_token),
            draft(),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Property created successfully");
    assert_eq!(body["property"]["status"], "active");
    assert_eq!(body["property"]["agent_id"], agent.id.0);
    assert_eq!(body["property"]["type"], "house");
}

#[tokio::test]
async fn create_without_session_is_unauthorized() {
    let app = TestApp::new();
    let (status, body) = app
        .send(json_request(Method::POST, "/api/properties", None, draft()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Access token required");
}

#[tokio::test]
async fn search_filters_and_paginates_active_listings() {
    let app = TestApp::new();
    let (agent, _) = app.agent("Blake").await;
    for (title, price) in [("Cabin", 150_000.0), ("Villa", 900_000.0), ("Loft", 300_000.0)] {
        app.listing(agent.id, title, price).await;
    }
    let hidden = app.listing(agent.id, "Sold farmhouse", 200_000.0).await;
    app.store
        .update_listing(
            hidden.id,
            agent.id,
            &ListingPatch {
                status: Some(ListingStatus::Sold),
                ..ListingPatch::default()
            },
        )
        .await
        .expect("update succeeds");

    let (status, body) = app
        .send(get(
            "/api/properties?type=all&minPrice=100000&maxPrice=500000&sortBy=price&sortOrder=asc&limit=1",
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let properties = body["properties"].as_array().expect("properties array");
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0]["title"], "Cabin");
    assert_eq!(properties[0]["agent_name"], "Blake");
    assert_eq!(body["pagination"]["totalItems"], 2);
    assert_eq!(body["pagination"]["totalPages"], 2);
    assert_eq!(body["pagination"]["hasNext"], true);
    assert_eq!(body["pagination"]["hasPrev"], false);
}

#[tokio::test]
async fn search_rejects_unparsable_numbers() {
    let app = TestApp::new();
    let (status, body) = app
        .send(get("/api/properties?minPrice=cheap", None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn detail_counts_views_and_reports_missing() {
    let app = TestApp::new();
    let (agent, _) = app.agent("Blake").await;
    let listing = app.listing(agent.id, "Cabin", 150_000.0).await;
    let uri = format!("/api/properties/{}", listing.id);

    let (status, body) = app.send(get(&uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["property"]["title"], "Cabin");
    assert_eq!(body["property"]["agent_email"], "blake@example.com");
    app.send(get(&uri, None)).await;

    let stored = app
        .store
        .listing(listing.id)
        .await
        .expect("read succeeds")
        .expect("listing exists");
    assert_eq!(stored.listing.views, 2);

    let (status, body) = app.send(get("/api/properties/9999", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Property not found");
}

#[tokio::test]
async fn only_the_owner_updates_or_deletes() {
    let app = TestApp::new();
    let (owner, owner_token) = app.agent("Blake").await;
    let (_, rival_token) = app.agent("Quinn").await;
    let listing = app.listing(owner.id, "Cabin", 150_000.0).await;
    let uri = format!("/api/properties/{}", listing.id);

    let (status, body) = app
        .send(json_request(
            Method::PUT,
            &uri,
            Some(&rival_token),
            json!({ "price": 99 }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Property not found or unauthorized");

    let (status, body) = app
        .send(json_request(
            Method::PUT,
            &uri,
            Some(&owner_token),
            json!({ "price": 175000, "status": "pending" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["property"]["price"], 175000.0);
    assert_eq!(body["property"]["status"], "pending");
    assert_eq!(body["property"]["title"], "Cabin");

    let (status, _) = app.send(delete(&uri, Some(&rival_token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = app.send(delete(&uri, Some(&owner_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Property deleted successfully");
    let (status, _) = app.send(get(&uri, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_with_invalid_price_is_rejected() {
    let app = TestApp::new();
    let (owner, owner_token) = app.agent("Blake").await;
    let listing = app.listing(owner.id, "Cabin", 150_000.0).await;

    let (status, body) = app
        .send(json_request(
            Method::PUT,
            &format!("/api/properties/{}", listing.id),
            Some(&owner_token),
            json!({ "price": 0 }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["path"], "price");
}

#[tokio::test]
async fn my_properties_lists_every_status_for_agents_only() {
    let app = TestApp::new();
    let (agent, agent_token) = app.agent("Blake").await;
    let (other, _) = app.agent("Quinn").await;
    let (_, buyer_token) = app.buyer("Riley").await;
    let sold = app.listing(agent.id, "Cabin", 150_000.0).await;
    app.listing(agent.id, "Loft", 300_000.0).await;
    app.listing(other.id, "Villa", 900_000.0).await;
    app.store
        .update_listing(
            sold.id,
            agent.id,
            &ListingPatch {
                status: Some(ListingStatus::Sold),
                ..ListingPatch::default()
            },
        )
        .await
        .expect("update succeeds");

    let (status, body) = app
        .send(get("/api/properties/agent/my-properties", Some(&agent_token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["totalItems"], 2);
    assert_eq!(body["properties"][0]["title"], "Loft");

    let (status, body) = app
        .send(get(
            "/api/properties/agent/my-properties?status=sold",
            Some(&agent_token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["properties"].as_array().map(Vec::len), Some(1));

    let (status, body) = app
        .send(get("/api/properties/agent/my-properties", Some(&buyer_token)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Only agents can access this endpoint");
}

#[tokio::test]
async fn keyword_search_requires_query() {
    let app = TestApp::new();
    let (agent, _) = app.agent("Blake").await;
    app.listing(agent.id, "Cabin", 150_000.0).await;
    app.listing(agent.id, "Loft", 300_000.0).await;

    let (status, body) = app.send(get("/api/properties/search/advanced", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Search query is required");

    let (status, body) = app
        .send(get("/api/properties/search/advanced?q=LOFT", None))
        .await;
    assert_eq!(status, StatusCode::OK);
    let properties = body["properties"].as_array().expect("properties array");
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0]["title"], "Loft");
}

#[tokio::test]
async fn keyword_search_returns_newest_twenty() {
    let app = TestApp::new();
    let (agent, _) = app.agent("Blake").await;
    for n in 0..25 {
        app.listing(agent.id, &format!("Harbour flat {n}"), 200_000.0).await;
    }
    app.listing(agent.id, "Hilltop barn", 90_000.0).await;

    let (status, body) = app
        .send(get("/api/properties/search/advanced?q=flat", None))
        .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body["properties"]
        .as_array()
        .expect("properties array")
        .iter()
        .filter_map(|property| property["title"].as_str())
        .collect();
    let expected: Vec<String> = (5..25).rev().map(|n| format!("Harbour flat {n}")).collect();
    assert_eq!(titles, expected);
}

#[tokio::test]
async fn search_clamps_oversized_page_limit() {
    let app = TestApp::new();
    let (agent, _) = app.agent("Blake").await;
    for n in 0..101 {
        app.listing(agent.id, &format!("Unit {n}"), 1_500.0).await;
    }

    let (status, body) = app.send(get("/api/properties?limit=500", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["properties"].as_array().map(Vec::len), Some(100));
    assert_eq!(body["pagination"]["currentPage"], 1);
    assert_eq!(body["pagination"]["totalPages"], 2);
    assert_eq!(body["pagination"]["totalItems"], 101);
    assert_eq!(body["pagination"]["hasNext"], true);

    let (status, body) = app
        .send(get("/api/properties?limit=500&page=2", None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["properties"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["pagination"]["hasPrev"], true);
}
