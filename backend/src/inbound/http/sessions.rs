//! Session API handlers: sign-in, sign-out and the caller's own account.
//!
//! ```text
//! POST /api/v1/signin {"email":"coach@gym.example","password":"..."}
//! POST /api/v1/signout
//! GET /api/v1/me
//! PATCH /api/v1/me/password {"oldPassword":"...","newPassword":"..."}
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Identity, Password, PermissionLevel, SignInCredentials};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedIdentity;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, credential_error};

/// Sign-in request body for `POST /api/v1/signin`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    #[schema(example = "coach@gym.example")]
    pub email: String,
    pub password: String,
}

/// Password change body for `PATCH /api/v1/me/password`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Permission level as exposed over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PermissionPayload {
    Standard,
    Admin,
}

impl From<PermissionPayload> for PermissionLevel {
    fn from(value: PermissionPayload) -> Self {
        match value {
            PermissionPayload::Standard => Self::Standard,
            PermissionPayload::Admin => Self::Admin,
        }
    }
}

impl From<PermissionLevel> for PermissionPayload {
    fn from(value: PermissionLevel) -> Self {
        match value {
            PermissionLevel::Standard => Self::Standard,
            PermissionLevel::Admin => Self::Admin,
        }
    }
}

/// Identity as returned to its owner. Credentials never leave the server.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "coach@gym.example")]
    pub email: String,
    #[schema(example = "Coach")]
    pub name: String,
    pub permission: PermissionPayload,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&Identity> for IdentityResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.get(),
            email: identity.email.to_string(),
            name: identity.name.as_ref().to_owned(),
            permission: identity.permission.into(),
            last_login: identity.last_login,
        }
    }
}

/// Verify credentials and establish a session cookie.
///
/// Unknown emails and wrong passwords get the same `401` so accounts cannot
/// be probed.
#[utoipa::path(
    post,
    path = "/api/v1/signin",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = IdentityResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["sessions"],
    operation_id = "signIn",
    security([])
)]
#[post("/signin")]
pub async fn sign_in(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignInRequest>,
) -> ApiResult<web::Json<IdentityResponse>> {
    let SignInRequest { email, password } = payload.into_inner();
    let credentials = SignInCredentials::try_from_parts(&email, &password)
        .map_err(|err| credential_error(FieldName::new("password"), &err))?;
    let issued = state.sessions.issue(&credentials).await?;
    session.persist_token(&issued.token)?;
    Ok(web::Json(IdentityResponse::from(&issued.identity)))
}

/// Revoke the caller's token and purge the session cookie.
#[utoipa::path(
    post,
    path = "/api/v1/signout",
    responses(
        (status = 200, description = "Signed out"),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["sessions"],
    operation_id = "signOut"
)]
#[post("/signout")]
pub async fn sign_out(
    state: web::Data<HttpState>,
    session: SessionContext,
    caller: AuthenticatedIdentity,
) -> ApiResult<HttpResponse> {
    state.sessions.revoke(caller.token()).await?;
    session.purge();
    Ok(HttpResponse::Ok().finish())
}

/// Return the signed-in identity.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current identity", body = IdentityResponse),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["sessions"],
    operation_id = "currentIdentity"
)]
#[get("/me")]
pub async fn current_identity(caller: AuthenticatedIdentity) -> web::Json<IdentityResponse> {
    web::Json(IdentityResponse::from(&*caller))
}

/// Replace the caller's password. The current session stays valid.
#[utoipa::path(
    patch,
    path = "/api/v1/me/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Invalid request or wrong current password", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["sessions"],
    operation_id = "changePassword"
)]
#[patch("/me/password")]
pub async fn change_password(
    state: web::Data<HttpState>,
    caller: AuthenticatedIdentity,
    payload: web::Json<ChangePasswordRequest>,
) -> ApiResult<HttpResponse> {
    let ChangePasswordRequest {
        old_password,
        new_password,
    } = payload.into_inner();
    let current = Password::presented(&old_password)
        .map_err(|err| credential_error(FieldName::new("oldPassword"), &err))?;
    let replacement = Password::new_secret(&new_password)
        .map_err(|err| credential_error(FieldName::new("newPassword"), &err))?;
    state
        .accounts
        .change_password(&caller, &current, &replacement)
        .await?;
    Ok(HttpResponse::Ok().finish())
}
