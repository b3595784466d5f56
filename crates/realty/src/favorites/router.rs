use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::service::FavoriteService;
use crate::accounts::session::Session;
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::listings::domain::ListingId;
use crate::pagination::{PageQuery, PaginationMeta};
use crate::storage::Store;

type Favorites<S> = State<Arc<FavoriteService<S>>>;

/// Router builder for `/api/favorites/*`. Every route requires a session.
pub fn favorite_router<S>(service: Arc<FavoriteService<S>>) -> Router
where
    S: Store,
{
    Router::new()
        .route(
            "/api/favorites",
            get(list_handler::<S>).post(add_from_body_handler::<S>),
        )
        .route(
            "/api/favorites/:property_id",
            post(add_handler::<S>).delete(remove_handler::<S>),
        )
        .route("/api/favorites/check/:property_id", get(check_handler::<S>))
        .route("/api/favorites/bulk-check", post(bulk_check_handler::<S>))
        .route("/api/favorites/stats", get(stats_handler::<S>))
        .route("/api/favorites/clear-all", delete(clear_handler::<S>))
        .route("/api/favorites/export", get(export_handler::<S>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddFavoriteBody {
    #[serde(default)]
    property_id: Option<ListingId>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkCheckBody {
    #[serde(default)]
    property_ids: Option<Vec<ListingId>>,
}

async fn list_handler<S: Store>(
    State(service): Favorites<S>,
    session: Session,
    QueryParams(page): QueryParams<PageQuery>,
) -> Result<Response, ApiError> {
    let request = page.resolve();
    let page = service.list(&session, request).await?;
    let body = json!({
        "favorites": page.items,
        "pagination": PaginationMeta::new(request, page.total),
    });
    Ok(Json(body).into_response())
}

async fn add<S: Store>(
    service: &FavoriteService<S>,
    session: &Session,
    property: ListingId,
) -> Result<Response, ApiError> {
    let favorite = service.add(session, property).await?;
    let body = json!({ "message": "Property added to favorites", "favorite": favorite });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

async fn add_handler<S: Store>(
    State(service): Favorites<S>,
    session: Session,
    PathParam(property_id): PathParam<i64>,
) -> Result<Response, ApiError> {
    add(&service, &session, ListingId(property_id)).await
}

async fn add_from_body_handler<S: Store>(
    State(service): Favorites<S>,
    session: Session,
    JsonBody(body): JsonBody<AddFavoriteBody>,
) -> Result<Response, ApiError> {
    let property = body
        .property_id
        .ok_or_else(|| ApiError::bad_request("Property ID is required"))?;
    add(&service, &session, property).await
}

async fn remove_handler<S: Store>(
    State(service): Favorites<S>,
    session: Session,
    PathParam(property_id): PathParam<i64>,
) -> Result<Response, ApiError> {
    service.remove(&session, ListingId(property_id)).await?;
    Ok(Json(json!({ "message": "Property removed from favorites" })).into_response())
}

async fn check_handler<S: Store>(
    State(service): Favorites<S>,
    session: Session,
    PathParam(property_id): PathParam<i64>,
) -> Result<Response, ApiError> {
    let check = service.check(&session, ListingId(property_id)).await?;
    Ok(Json(check).into_response())
}

async fn bulk_check_handler<S: Store>(
    State(service): Favorites<S>,
    session: Session,
    JsonBody(body): JsonBody<BulkCheckBody>,
) -> Result<Response, ApiError> {
    let result = service.bulk_check(&session, body.property_ids).await?;
    Ok(Json(result).into_response())
}

async fn stats_handler<S: Store>(
    State(service): Favorites<S>,
    session: Session,
) -> Result<Response, ApiError> {
    let stats = service.stats(&session).await?;
    Ok(Json(stats).into_response())
}

async fn clear_handler<S: Store>(
    State(service): Favorites<S>,
    session: Session,
) -> Result<Response, ApiError> {
    let deleted = service.clear(&session).await?;
    let body = json!({
        "message": "All favorites cleared successfully",
        "deletedCount": deleted,
    });
    Ok(Json(body).into_response())
}

async fn export_handler<S: Store>(
    State(service): Favorites<S>,
    session: Session,
) -> Result<Response, ApiError> {
    let export = service.export(&session).await?;
    let body = json!({
        "message": "Favorites exported successfully",
        "exportDate": export.export_date,
        "totalCount": export.total_count,
        "favorites": export.favorites,
    });
    Ok(Json(body).into_response())
}
