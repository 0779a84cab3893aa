//! Announcement handlers: admin broadcasts and the caller's inbox.
//!
//! ```text
//! POST /api/v1/admin/announcements {"text":"Pool closed","all":true}
//! GET /api/v1/admin/announcements
//! GET /api/v1/announcements
//! POST /api/v1/announcements/{id}/read
//! POST /api/v1/announcements/read-all
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AnnouncementSummary, InboxAnnouncement};
use crate::inbound::http::ApiResult;
use crate::inbound::http::accounts::CreatedResponse;
use crate::inbound::http::auth::{AdminIdentity, AuthenticatedIdentity};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_value};

/// Broadcast body for `POST /api/v1/admin/announcements`.
///
/// Exactly one audience must be chosen: `all` or a non-empty `toUserIds`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest {
    #[schema(example = "The pool is closed on Sunday")]
    pub text: String,
    #[serde(default)]
    pub to_user_ids: Vec<i64>,
    #[serde(default)]
    pub all: bool,
}

/// Announcement as seen by one recipient.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InboxAnnouncementResponse {
    pub id: i64,
    pub text: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

impl From<InboxAnnouncement> for InboxAnnouncementResponse {
    fn from(value: InboxAnnouncement) -> Self {
        Self {
            id: value.id.get(),
            text: value.body,
            sent_at: value.sent_at,
            read: value.read,
        }
    }
}

/// Announcement with delivery counts, for admins.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementSummaryResponse {
    pub id: i64,
    pub text: String,
    pub sent_at: DateTime<Utc>,
    pub recipient_count: u64,
    pub read_count: u64,
}

impl From<AnnouncementSummary> for AnnouncementSummaryResponse {
    fn from(value: AnnouncementSummary) -> Self {
        Self {
            id: value.id.get(),
            text: value.body,
            sent_at: value.sent_at,
            recipient_count: value.recipient_count,
            read_count: value.read_count,
        }
    }
}

/// Number of announcements flipped to read.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct MarkAllReadResponse {
    pub changed: u64,
}

/// Send an announcement to everyone or to a recipient list.
///
/// The message and all of its receipts are written atomically; an unknown
/// recipient aborts the broadcast with `404` and nothing is stored.
#[utoipa::path(
    post,
    path = "/api/v1/admin/announcements",
    request_body = BroadcastRequest,
    responses(
        (status = 201, description = "Announcement sent", body = CreatedResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Admin permission required", body = ErrorSchema),
        (status = 404, description = "Recipient not found", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["announcements"],
    operation_id = "broadcastAnnouncement"
)]
#[post("/admin/announcements")]
pub async fn broadcast(
    state: web::Data<HttpState>,
    admin: AdminIdentity,
    payload: web::Json<BroadcastRequest>,
) -> ApiResult<HttpResponse> {
    let BroadcastRequest {
        text,
        to_user_ids,
        all,
    } = payload.into_inner();
    let id = match (all, to_user_ids.is_empty()) {
        (true, true) => state.announcements.broadcast_to_all(&admin, &text).await?,
        (false, false) => {
            state
                .announcements
                .broadcast_to_recipients(&admin, &text, &to_user_ids)
                .await?
        }
        (true, false) => {
            return Err(invalid_value(
                FieldName::new("toUserIds"),
                "toUserIds must be empty when all is set",
            ));
        }
        (false, true) => {
            return Err(invalid_value(
                FieldName::new("toUserIds"),
                "toUserIds must not be empty unless all is set",
            ));
        }
    };
    Ok(HttpResponse::Created().json(CreatedResponse { id: id.get() }))
}

/// Every announcement with recipient and read counts, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/admin/announcements",
    responses(
        (status = 200, description = "Announcements", body = [AnnouncementSummaryResponse]),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Admin permission required", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["announcements"],
    operation_id = "listAllAnnouncements"
)]
#[get("/admin/announcements")]
pub async fn list_all(
    state: web::Data<HttpState>,
    admin: AdminIdentity,
) -> ApiResult<web::Json<Vec<AnnouncementSummaryResponse>>> {
    let summaries = state.announcements.list_all(&admin).await?;
    Ok(web::Json(summaries.into_iter().map(Into::into).collect()))
}

/// Announcements addressed to the caller with read flags, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/announcements",
    responses(
        (status = 200, description = "Inbox", body = [InboxAnnouncementResponse]),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["announcements"],
    operation_id = "listAnnouncements"
)]
#[get("/announcements")]
pub async fn list_inbox(
    state: web::Data<HttpState>,
    caller: AuthenticatedIdentity,
) -> ApiResult<web::Json<Vec<InboxAnnouncementResponse>>> {
    let inbox = state.announcements.list_for_recipient(&caller).await?;
    Ok(web::Json(inbox.into_iter().map(Into::into).collect()))
}

/// Mark one announcement as read. Idempotent.
#[utoipa::path(
    post,
    path = "/api/v1/announcements/{id}/read",
    params(("id" = i64, Path, description = "Announcement id")),
    responses(
        (status = 200, description = "Marked read"),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["announcements"],
    operation_id = "markAnnouncementRead"
)]
#[post("/announcements/{id}/read")]
pub async fn mark_read(
    state: web::Data<HttpState>,
    caller: AuthenticatedIdentity,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    state
        .announcements
        .mark_read(&caller, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().finish())
}

/// Mark every announcement of the caller as read.
#[utoipa::path(
    post,
    path = "/api/v1/announcements/read-all",
    responses(
        (status = 200, description = "Marked read", body = MarkAllReadResponse),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["announcements"],
    operation_id = "markAllAnnouncementsRead"
)]
#[post("/announcements/read-all")]
pub async fn mark_all_read(
    state: web::Data<HttpState>,
    caller: AuthenticatedIdentity,
) -> ApiResult<web::Json<MarkAllReadResponse>> {
    let changed = state.announcements.mark_all_read(&caller).await?;
    Ok(web::Json(MarkAllReadResponse { changed }))
}
