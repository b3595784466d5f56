use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{InquiryFilter, InquiryId, InquiryStatus, InquirySubmission};
use super::service::InquiryService;
use crate::accounts::session::Session;
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::pagination::{PageQuery, PaginationMeta};
use crate::params::empty_as_none;
use crate::storage::Store;

type Inquiries<S> = State<Arc<InquiryService<S>>>;

/// Router builder for `/api/contact/*`.
pub fn inquiry_router<S>(service: Arc<InquiryService<S>>) -> Router
where
    S: Store,
{
    Router::new()
        .route("/api/contact", post(submit_handler::<S>))
        .route("/api/contact/my-inquiries", get(my_inquiries_handler::<S>))
        .route(
            "/api/contact/agent-inquiries",
            get(agent_inquiries_handler::<S>),
        )
        .route(
            "/api/contact/:id",
            get(detail_handler::<S>).delete(delete_handler::<S>),
        )
        .route("/api/contact/:id/status", put(status_handler::<S>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
struct OwnStatusQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    status: Option<InquiryStatus>,
}

#[derive(Debug, Default, Deserialize)]
struct StatusBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    response: Option<String>,
}

async fn submit_handler<S: Store>(
    State(service): Inquiries<S>,
    session: Option<Session>,
    JsonBody(submission): JsonBody<InquirySubmission>,
) -> Result<Response, ApiError> {
    let submitted = service.submit(session.as_ref(), submission).await?;
    let body = json!({
        "message": "Inquiry submitted successfully",
        "inquiry": submitted.inquiry,
        "propertyInfo": submitted.property_info,
        "agentInfo": submitted.agent_info,
    });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

async fn my_inquiries_handler<S: Store>(
    State(service): Inquiries<S>,
    session: Session,
    QueryParams(query): QueryParams<OwnStatusQuery>,
    QueryParams(page): QueryParams<PageQuery>,
) -> Result<Response, ApiError> {
    let request = page.resolve();
    let page = service
        .my_inquiries(&session, query.status, request)
        .await?;
    let body = json!({
        "inquiries": page.items,
        "pagination": PaginationMeta::new(request, page.total),
    });
    Ok(Json(body).into_response())
}

async fn agent_inquiries_handler<S: Store>(
    State(service): Inquiries<S>,
    session: Session,
    QueryParams(filter): QueryParams<InquiryFilter>,
    QueryParams(page): QueryParams<PageQuery>,
) -> Result<Response, ApiError> {
    let request = page.resolve();
    let page = service.agent_inquiries(&session, filter, request).await?;
    let body = json!({
        "inquiries": page.items,
        "pagination": PaginationMeta::new(request, page.total),
    });
    Ok(Json(body).into_response())
}

async fn detail_handler<S: Store>(
    State(service): Inquiries<S>,
    session: Session,
    PathParam(id): PathParam<i64>,
) -> Result<Response, ApiError> {
    let inquiry = service.detail(&session, InquiryId(id)).await?;
    Ok(Json(json!({ "inquiry": inquiry })).into_response())
}

async fn status_handler<S: Store>(
    State(service): Inquiries<S>,
    session: Session,
    PathParam(id): PathParam<i64>,
    JsonBody(body): JsonBody<StatusBody>,
) -> Result<Response, ApiError> {
    let inquiry = service
        .update_status(&session, InquiryId(id), body.status, body.response)
        .await?;
    let body = json!({ "message": "Inquiry status updated successfully", "inquiry": inquiry });
    Ok(Json(body).into_response())
}

async fn delete_handler<S: Store>(
    State(service): Inquiries<S>,
    session: Session,
    PathParam(id): PathParam<i64>,
) -> Result<Response, ApiError> {
    service.delete(&session, InquiryId(id)).await?;
    Ok(Json(json!({ "message": "Inquiry deleted successfully" })).into_response())
}
