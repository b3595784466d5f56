use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ProfileUpdate, UserId};
use super::mailer::ResetMailer;
use super::service::AccountService;
use super::session::Session;
use super::validation::{LoginForm, RegistrationForm};
use crate::error::ApiError;
use crate::extract::{JsonBody, JsonBodyOrDefault, PathParam, QueryParams};
use crate::pagination::{PageQuery, PaginationMeta};
use crate::params::empty_as_none;
use crate::storage::Store;

type Accounts<S, M> = State<Arc<AccountService<S, M>>>;

/// Router builder for `/api/auth/*` and `/api/users/*`.
pub fn account_router<S, M>(service: Arc<AccountService<S, M>>) -> Router
where
    S: Store,
    M: ResetMailer + 'static,
{
    Router::new()
        .route("/api/auth/register", post(register::<S, M>))
        .route("/api/auth/login", post(login::<S, M>))
        .route("/api/auth/me", get(me::<S, M>))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/forgot-password", post(forgot_password::<S, M>))
        .route("/api/auth/reset-password", post(reset_password::<S, M>))
        .route(
            "/api/users/profile",
            get(me::<S, M>).put(update_profile::<S, M>),
        )
        .route("/api/users/avatar", put(update_avatar::<S, M>))
        .route("/api/users/change-password", put(change_password::<S, M>))
        .route("/api/users/account", delete(delete_account::<S, M>))
        .route("/api/users/agents", get(agents::<S, M>))
        .route("/api/users/agents/:id", get(agent::<S, M>))
        .route("/api/users/dashboard", get(dashboard::<S, M>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
struct ForgotPasswordBody {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordBody {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    new_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AvatarBody {
    #[serde(default)]
    avatar: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordBody {
    #[serde(default)]
    current_password: Option<String>,
    #[serde(default)]
    new_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DeleteAccountBody {
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AgentDirectoryQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    location: Option<String>,
}

async fn register<S, M>(
    State(service): Accounts<S, M>,
    JsonBody(form): JsonBody<RegistrationForm>,
) -> Result<Response, ApiError>
where
    S: Store,
    M: ResetMailer + 'static,
{
    let grant = service.register(form).await?;
    let body = json!({
        "message": "User registered successfully",
        "token": grant.token,
        "user": grant.user,
    });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

async fn login<S, M>(
    State(service): Accounts<S, M>,
    JsonBody(form): JsonBody<LoginForm>,
) -> Result<Response, ApiError>
where
    S: Store,
    M: ResetMailer + 'static,
{
    let grant = service.login(form).await?;
    let body = json!({
        "message": "Login successful",
        "token": grant.token,
        "user": grant.user,
    });
    Ok(Json(body).into_response())
}

async fn me<S, M>(State(service): Accounts<S, M>, session: Session) -> Result<Response, ApiError>
where
    S: Store,
    M: ResetMailer + 'static,
{
    let user = service.current_user(&session).await?;
    Ok(Json(json!({ "user": user })).into_response())
}

async fn logout() -> Response {
    Json(json!({ "message": "Logout successful" })).into_response()
}

async fn forgot_password<S, M>(
    State(service): Accounts<S, M>,
    JsonBody(body): JsonBody<ForgotPasswordBody>,
) -> Result<Response, ApiError>
where
    S: Store,
    M: ResetMailer + 'static,
{
    service.forgot_password(body.email).await?;
    let body = json!({ "message": "If email exists, reset link has been sent" });
    Ok(Json(body).into_response())
}

async fn reset_password<S, M>(
    State(service): Accounts<S, M>,
    JsonBody(body): JsonBody<ResetPasswordBody>,
) -> Result<Response, ApiError>
where
    S: Store,
    M: ResetMailer + 'static,
{
    service.reset_password(body.token, body.new_password).await?;
    Ok(Json(json!({ "message": "Password reset successful" })).into_response())
}

async fn update_profile<S, M>(
    State(service): Accounts<S, M>,
    session: Session,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> Result<Response, ApiError>
where
    S: Store,
    M: ResetMailer + 'static,
{
    let user = service.update_profile(&session, update).await?;
    let body = json!({ "message": "Profile updated successfully", "user": user });
    Ok(Json(body).into_response())
}

async fn update_avatar<S, M>(
    State(service): Accounts<S, M>,
    session: Session,
    JsonBody(body): JsonBody<AvatarBody>,
) -> Result<Response, ApiError>
where
    S: Store,
    M: ResetMailer + 'static,
{
    let user = service.update_avatar(&session, body.avatar).await?;
    let body = json!({ "message": "Avatar updated successfully", "user": user });
    Ok(Json(body).into_response())
}

async fn change_password<S, M>(
    State(service): Accounts<S, M>,
    session: Session,
    JsonBody(body): JsonBody<ChangePasswordBody>,
) -> Result<Response, ApiError>
where
    S: Store,
    M: ResetMailer + 'static,
{
    service
        .change_password(&session, body.current_password, body.new_password)
        .await?;
    Ok(Json(json!({ "message": "Password changed successfully" })).into_response())
}

async fn delete_account<S, M>(
    State(service): Accounts<S, M>,
    session: Session,
    JsonBodyOrDefault(body): JsonBodyOrDefault<DeleteAccountBody>,
) -> Result<Response, ApiError>
where
    S: Store,
    M: ResetMailer + 'static,
{
    service.delete_account(&session, body.password).await?;
    Ok(Json(json!({ "message": "Account deleted successfully" })).into_response())
}

async fn agents<S, M>(
    State(service): Accounts<S, M>,
    QueryParams(query): QueryParams<AgentDirectoryQuery>,
    QueryParams(page): QueryParams<PageQuery>,
) -> Result<Response, ApiError>
where
    S: Store,
    M: ResetMailer + 'static,
{
    let request = page.resolve();
    let page = service.agents(query.location, request).await?;
    let body = json!({
        "agents": page.items,
        "pagination": PaginationMeta::new(request, page.total),
    });
    Ok(Json(body).into_response())
}

async fn agent<S, M>(
    State(service): Accounts<S, M>,
    PathParam(id): PathParam<i64>,
) -> Result<Response, ApiError>
where
    S: Store,
    M: ResetMailer + 'static,
{
    let agent = service.agent(UserId(id)).await?;
    Ok(Json(json!({ "agent": agent })).into_response())
}

async fn dashboard<S, M>(
    State(service): Accounts<S, M>,
    session: Session,
) -> Result<Response, ApiError>
where
    S: Store,
    M: ResetMailer + 'static,
{
    let stats = service.dashboard(&session).await?;
    Ok(Json(json!({ "stats": stats })).into_response())
}
