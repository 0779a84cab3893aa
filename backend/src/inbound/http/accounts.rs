//! Admin account management handlers.
//!
//! ```text
//! POST /api/v1/admin/accounts {"email":"...","name":"...","password":"...","permission":"standard"}
//! DELETE /api/v1/admin/accounts/{id}
//! ```

use actix_web::{HttpResponse, delete, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{Email, Error, IdentityId, IdentityName, NewAccount, Password};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AdminIdentity;
use crate::inbound::http::sessions::PermissionPayload;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, credential_error, email_error, name_error};

/// Account creation body for `POST /api/v1/admin/accounts`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    #[schema(example = "coach@gym.example")]
    pub email: String,
    #[schema(example = "Coach")]
    pub name: String,
    pub password: String,
    #[serde(default = "default_permission")]
    pub permission: PermissionPayload,
}

fn default_permission() -> PermissionPayload {
    PermissionPayload::Standard
}

impl TryFrom<CreateAccountRequest> for NewAccount {
    type Error = Error;

    fn try_from(value: CreateAccountRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            email: Email::new(&value.email).map_err(|err| email_error(&err))?,
            name: IdentityName::new(&value.name).map_err(|err| name_error(&err))?,
            password: Password::new_secret(&value.password)
                .map_err(|err| credential_error(FieldName::new("password"), &err))?,
            permission: value.permission.into(),
        })
    }
}

/// Identifier of a newly created resource.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CreatedResponse {
    #[schema(example = 42)]
    pub id: i64,
}

/// Create a staff or admin account.
#[utoipa::path(
    post,
    path = "/api/v1/admin/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = CreatedResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Admin permission required", body = ErrorSchema),
        (status = 409, description = "Email already in use", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "createAccount"
)]
#[post("/admin/accounts")]
pub async fn create_account(
    state: web::Data<HttpState>,
    admin: AdminIdentity,
    payload: web::Json<CreateAccountRequest>,
) -> ApiResult<HttpResponse> {
    let account = NewAccount::try_from(payload.into_inner())?;
    let id = state.accounts.create_account(&admin, account).await?;
    Ok(HttpResponse::Created().json(CreatedResponse { id: id.get() }))
}

/// Deactivate an account and end its session.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/accounts/{id}",
    params(("id" = i64, Path, description = "Identity id")),
    responses(
        (status = 200, description = "Account deactivated"),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Admin permission required", body = ErrorSchema),
        (status = 404, description = "Account not found", body = ErrorSchema),
        (status = 409, description = "Cannot deactivate own account", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "deactivateAccount"
)]
#[delete("/admin/accounts/{id}")]
pub async fn deactivate_account(
    state: web::Data<HttpState>,
    admin: AdminIdentity,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    // A non-positive id cannot name an account.
    let target =
        IdentityId::new(path.into_inner()).map_err(|_| Error::not_found("account not found"))?;
    state.accounts.deactivate_account(&admin, target).await?;
    Ok(HttpResponse::Ok().finish())
}
