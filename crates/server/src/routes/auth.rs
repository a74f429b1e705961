use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use tracing::debug;

use service::auth::{
    domain::{AccessGrant, AuthSession, AuthUser, LoginInput, RefreshInput, RegisterInput, UserView},
    errors::AuthError,
    repository::CredentialStore,
    token::TokenError,
    AuthService,
};

use crate::errors::ApiError;

#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService<dyn CredentialStore>>,
}

impl ServerState {
    pub fn new(auth: AuthService<dyn CredentialStore>) -> Self {
        Self { auth: Arc::new(auth) }
    }
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 201, description = "Registered", body = crate::openapi::AuthSessionDoc), (status = 400, description = "Bad Request", body = crate::openapi::ErrorBody), (status = 409, description = "Conflict", body = crate::openapi::ErrorBody)))]
pub async fn register(
    State(state): State<ServerState>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthSession>), ApiError> {
    let Json(input) = payload?;
    let session = state.auth.register(input).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In", body = crate::openapi::AuthSessionDoc), (status = 400, description = "Bad Request", body = crate::openapi::ErrorBody), (status = 401, description = "Unauthorized", body = crate::openapi::ErrorBody)))]
pub async fn login(
    State(state): State<ServerState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<AuthSession>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(state.auth.login(input).await?))
}

#[utoipa::path(post, path = "/auth/refresh", tag = "auth", request_body = crate::openapi::RefreshRequest, responses((status = 200, description = "New access token", body = crate::openapi::AccessGrantDoc), (status = 400, description = "Bad Request", body = crate::openapi::ErrorBody), (status = 401, description = "Unauthorized", body = crate::openapi::ErrorBody)))]
pub async fn refresh(
    State(state): State<ServerState>,
    payload: Result<Json<RefreshInput>, JsonRejection>,
) -> Result<Json<AccessGrant>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(state.auth.refresh(input).await?))
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", security(("bearer" = [])), responses((status = 200, description = "Current user", body = crate::openapi::UserViewDoc), (status = 401, description = "Unauthorized", body = crate::openapi::ErrorBody)))]
pub async fn me(Extension(user): Extension<AuthUser>) -> Json<UserView> {
    Json(UserView::from(&user))
}

/// Route middleware: requires `Authorization: Bearer <access token>` and
/// stores the resolved `AuthUser` in request extensions.
pub async fn require_access_token(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned);

    let Some(token) = token else {
        debug!(path = %req.uri().path(), "missing bearer token");
        return Err(AuthError::Unauthorized(TokenError::Malformed("missing bearer token".into())).into());
    };

    let user = state.auth.authenticate(&token).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
