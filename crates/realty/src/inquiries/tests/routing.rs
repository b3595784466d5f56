use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::testing::{delete, get, json_request, TestApp};

fn contact(body: Value, token: Option<&str>) -> axum::http::Request<axum::body::Body> {
    json_request(Method::POST, "/api/contact", token, body)
}

async fn submit(app: &TestApp, body: Value, token: Option<&str>) -> i64 {
    let (status, body) = app.send(contact(body, token)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["inquiry"]["id"].as_i64().expect("inquiry id")
}

#[tokio::test]
async fn anonymous_general_inquiry_is_accepted() {
    let app = TestApp::new();
    let (status, body) = app
        .send(contact(
            json!({
                "name": "Sam",
                "email": "sam@example.com",
                "message": "Do you cover the coast?",
            }),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Inquiry submitted successfully");
    assert_eq!(body["inquiry"]["inquiry_type"], "general");
    assert_eq!(body["inquiry"]["status"], "new");
    assert!(body["inquiry"]["user_id"].is_null());
    assert!(body["propertyInfo"].is_null());
    assert!(body["agentInfo"].is_null());
}

#[tokio::test]
async fn listing_inquiry_reports_listing_and_agent() {
    let app = TestApp::new();
    let (agent, _) = app.agent("Blake").await;
    let (buyer, token) = app.buyer("Riley").await;
    let listing = app.listing(agent.id, "Cabin", 150_000.0).await;

    let (status, body) = app
        .send(contact(
            json!({
                "name": "Riley",
                "email": "riley@example.com",
                "message": "Can I visit on Saturday?",
                "propertyId": listing.id,
                "inquiryType": "viewing",
            }),
            Some(&token),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["inquiry"]["user_id"], buyer.id.0);
    assert_eq!(body["inquiry"]["inquiry_type"], "viewing");
    assert_eq!(body["propertyInfo"]["title"], "Cabin");
    assert_eq!(body["propertyInfo"]["location"], "Lakeside");
    assert_eq!(body["agentInfo"]["name"], "Blake");
    assert_eq!(body["agentInfo"]["email"], "blake@example.com");
}

#[tokio::test]
async fn rejected_token_submits_anonymously() {
    let app = TestApp::new();
    let (status, body) = app
        .send(contact(
            json!({ "name": "Sam", "email": "sam@example.com", "message": "Hello" }),
            Some("not-a-token"),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["inquiry"]["user_id"].is_null());
}

#[tokio::test]
async fn submission_checks_fields_email_and_listing() {
    let app = TestApp::new();

    let (status, body) = app
        .send(contact(
            json!({ "name": "Sam", "email": "sam@example.com", "message": "   " }),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Name, email, and message are required");

    let (status, body) = app
        .send(contact(
            json!({ "name": "Sam", "email": "sam-at-example", "message": "Hello" }),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please provide a valid email address");

    let (status, body) = app
        .send(contact(
            json!({
                "name": "Sam",
                "email": "sam@example.com",
                "message": "Hello",
                "propertyId": 999,
            }),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Property not found");
}

#[tokio::test]
async fn my_inquiries_lists_only_the_senders_own() {
    let app = TestApp::new();
    let (_, riley) = app.buyer("Riley").await;
    let (_, jordan) = app.buyer("Jordan").await;
    submit(
        &app,
        json!({ "name": "Riley", "email": "riley@example.com", "message": "First" }),
        Some(&riley),
    )
    .await;
    submit(
        &app,
        json!({ "name": "Jordan", "email": "jordan@example.com", "message": "Other" }),
        Some(&jordan),
    )
    .await;

    let (status, body) = app
        .send(get("/api/contact/my-inquiries", Some(&riley)))
        .await;
    assert_eq!(status, StatusCode::OK);
    let inquiries = body["inquiries"].as_array().expect("inquiries array");
    assert_eq!(inquiries.len(), 1);
    assert_eq!(inquiries[0]["message"], "First");
    assert_eq!(body["pagination"]["totalItems"], 1);

    let (status, body) = app
        .send(get("/api/contact/my-inquiries?status=closed", Some(&riley)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inquiries"], json!([]));

    let (status, _) = app.send(get("/api/contact/my-inquiries", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn agent_inbox_holds_own_listings_and_general_inquiries() {
    let app = TestApp::new();
    let (blake, blake_token) = app.agent("Blake").await;
    let (casey, _) = app.agent("Casey").await;
    let (_, buyer_token) = app.buyer("Riley").await;
    let own = app.listing(blake.id, "Cabin", 150_000.0).await;
    let other = app.listing(casey.id, "Loft", 320_000.0).await;

    let submissions = [
        (Some(own.id.0), "Own"),
        (Some(other.id.0), "Theirs"),
        (None, "General"),
    ];
    for (property, message) in submissions {
        submit(
            &app,
            json!({
                "name": "Riley",
                "email": "riley@example.com",
                "message": message,
                "propertyId": property,
            }),
            Some(&buyer_token),
        )
        .await;
    }

    let (status, body) = app
        .send(get("/api/contact/agent-inquiries", Some(&blake_token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    let mut messages: Vec<&str> = body["inquiries"]
        .as_array()
        .expect("inquiries array")
        .iter()
        .filter_map(|inquiry| inquiry["message"].as_str())
        .collect();
    messages.sort_unstable();
    assert_eq!(messages, ["General", "Own"]);

    let uri = format!("/api/contact/agent-inquiries?propertyId={}", own.id);
    let (_, body) = app.send(get(&uri, Some(&blake_token))).await;
    assert_eq!(body["inquiries"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["inquiries"][0]["property_title"], "Cabin");

    let (status, body) = app
        .send(get("/api/contact/agent-inquiries", Some(&buyer_token)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Only agents can access this endpoint");
}

#[tokio::test]
async fn detail_is_hidden_from_unrelated_callers() {
    let app = TestApp::new();
    let (blake, blake_token) = app.agent("Blake").await;
    let (_, casey_token) = app.agent("Casey").await;
    let (_, riley) = app.buyer("Riley").await;
    let (_, jordan) = app.buyer("Jordan").await;
    let listing = app.listing(blake.id, "Cabin", 150_000.0).await;
    let id = submit(
        &app,
        json!({
            "name": "Riley",
            "email": "riley@example.com",
            "message": "Is the roof new?",
            "propertyId": listing.id,
        }),
        Some(&riley),
    )
    .await;
    let uri = format!("/api/contact/{id}");

    for token in [&riley, &blake_token] {
        let (status, body) = app.send(get(&uri, Some(token.as_str()))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["inquiry"]["message"], "Is the roof new?");
    }
    for token in [&jordan, &casey_token] {
        let (status, body) = app.send(get(&uri, Some(token.as_str()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Inquiry not found or unauthorized");
    }

    let (status, _) = app.send(get("/api/contact/abc", Some(&riley))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn agent_responds_and_status_is_validated() {
    let app = TestApp::new();
    let (blake, blake_token) = app.agent("Blake").await;
    let (_, riley) = app.buyer("Riley").await;
    let listing = app.listing(blake.id, "Cabin", 150_000.0).await;
    let id = submit(
        &app,
        json!({
            "name": "Riley",
            "email": "riley@example.com",
            "message": "Price negotiable?",
            "propertyId": listing.id,
        }),
        Some(&riley),
    )
    .await;
    let uri = format!("/api/contact/{id}/status");

    let (status, body) = app
        .send(json_request(
            Method::PUT,
            &uri,
            Some(&blake_token),
            json!({ "status": "archived" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Invalid status. Must be one of: new, in_progress, responded, closed"
    );

    let (status, body) = app
        .send(json_request(
            Method::PUT,
            &uri,
            Some(&blake_token),
            json!({ "status": "responded", "response": "A little." }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Inquiry status updated successfully");
    assert_eq!(body["inquiry"]["status"], "responded");
    assert_eq!(body["inquiry"]["response"], "A little.");
    assert!(body["inquiry"]["responded_at"].is_string());

    let (status, body) = app
        .send(json_request(
            Method::PUT,
            &uri,
            Some(&riley),
            json!({ "status": "closed" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inquiry"]["status"], "closed");
    assert_eq!(body["inquiry"]["response"], "A little.");
}

#[tokio::test]
async fn delete_respects_visibility() {
    let app = TestApp::new();
    let (blake, _) = app.agent("Blake").await;
    let (_, casey_token) = app.agent("Casey").await;
    let (_, riley) = app.buyer("Riley").await;
    let listing = app.listing(blake.id, "Cabin", 150_000.0).await;
    let id = submit(
        &app,
        json!({
            "name": "Riley",
            "email": "riley@example.com",
            "message": "Never mind",
            "propertyId": listing.id,
        }),
        Some(&riley),
    )
    .await;
    let uri = format!("/api/contact/{id}");

    let (status, _) = app.send(delete(&uri, Some(&casey_token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.send(delete(&uri, Some(&riley))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Inquiry deleted successfully");

    let (status, _) = app.send(get(&uri, Some(&riley))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
