use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    ListingDraft, ListingFilter, ListingId, ListingSort, ListingStatus, ListingUpdate,
};
use super::service::ListingService;
use crate::accounts::session::Session;
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::pagination::{PageQuery, PaginationMeta};
use crate::params::{empty_as_none, empty_or_all_as_none};
use crate::storage::Store;

type Listings<S> = State<Arc<ListingService<S>>>;

/// Router builder for `/api/properties/*`.
pub fn listing_router<S>(service: Arc<ListingService<S>>) -> Router
where
    S: Store,
{
    Router::new()
        .route(
            "/api/properties",
            get(search_handler::<S>).post(create_handler::<S>),
        )
        .route(
            "/api/properties/:id",
            get(detail_handler::<S>)
                .put(update_handler::<S>)
                .delete(delete_handler::<S>),
        )
        .route(
            "/api/properties/agent/my-properties",
            get(agent_listings_handler::<S>),
        )
        .route(
            "/api/properties/search/advanced",
            get(keyword_search_handler::<S>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SortQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    sort_by: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    sort_order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StatusQuery {
    #[serde(default, deserialize_with = "empty_or_all_as_none")]
    status: Option<ListingStatus>,
}

#[derive(Debug, Default, Deserialize)]
struct KeywordQuery {
    #[serde(default)]
    q: Option<String>,
}

async fn search_handler<S: Store>(
    State(service): Listings<S>,
    QueryParams(filter): QueryParams<ListingFilter>,
    QueryParams(sort): QueryParams<SortQuery>,
    QueryParams(page): QueryParams<PageQuery>,
) -> Result<Response, ApiError> {
    let request = page.resolve();
    let sort = ListingSort::from_params(sort.sort_by.as_deref(), sort.sort_order.as_deref());
    let page = service.search(&filter, sort, request).await?;
    let body = json!({
        "properties": page.items,
        "pagination": PaginationMeta::new(request, page.total),
    });
    Ok(Json(body).into_response())
}

async fn detail_handler<S: Store>(
    State(service): Listings<S>,
    PathParam(id): PathParam<i64>,
) -> Result<Response, ApiError> {
    let property = service.view(ListingId(id)).await?;
    Ok(Json(json!({ "property": property })).into_response())
}

async fn create_handler<S: Store>(
    State(service): Listings<S>,
    session: Session,
    JsonBody(draft): JsonBody<ListingDraft>,
) -> Result<Response, ApiError> {
    let property = service.create(&session, draft).await?;
    let body = json!({ "message": "Property created successfully", "property": property });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

async fn update_handler<S: Store>(
    State(service): Listings<S>,
    session: Session,
    PathParam(id): PathParam<i64>,
    JsonBody(update): JsonBody<ListingUpdate>,
) -> Result<Response, ApiError> {
    let property = service.update(&session, ListingId(id), update).await?;
    let body = json!({ "message": "Property updated successfully", "property": property });
    Ok(Json(body).into_response())
}

async fn delete_handler<S: Store>(
    State(service): Listings<S>,
    session: Session,
    PathParam(id): PathParam<i64>,
) -> Result<Response, ApiError> {
    service.delete(&session, ListingId(id)).await?;
    Ok(Json(json!({ "message": "Property deleted successfully" })).into_response())
}

async fn agent_listings_handler<S: Store>(
    State(service): Listings<S>,
    session: Session,
    QueryParams(status): QueryParams<StatusQuery>,
    QueryParams(page): QueryParams<PageQuery>,
) -> Result<Response, ApiError> {
    let request = page.resolve();
    let page = service
        .agent_listings(&session, status.status, request)
        .await?;
    let body = json!({
        "properties": page.items,
        "pagination": PaginationMeta::new(request, page.total),
    });
    Ok(Json(body).into_response())
}

async fn keyword_search_handler<S: Store>(
    State(service): Listings<S>,
    QueryParams(query): QueryParams<KeywordQuery>,
) -> Result<Response, ApiError> {
    let properties = service.keyword_search(query.q).await?;
    Ok(Json(json!({ "properties": properties })).into_response())
}
