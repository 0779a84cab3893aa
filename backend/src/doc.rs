//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every inbound HTTP path, the request and response
//! DTOs, the domain error schema wrappers and the session cookie security
//! scheme. Swagger UI serves it in debug builds and the `openapi-dump` binary
//! prints it for external tooling.

use crate::inbound::http::accounts::{CreateAccountRequest, CreatedResponse};
use crate::inbound::http::announcements::{
    AnnouncementSummaryResponse, BroadcastRequest, InboxAnnouncementResponse, MarkAllReadResponse,
};
use crate::inbound::http::basket::{AddToBasketRequest, BasketLineResponse};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::sessions::{
    ChangePasswordRequest, IdentityResponse, PermissionPayload, SignInRequest,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "gymdesk-session",
                "Encrypted session cookie issued by POST /api/v1/signin.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "gymdesk API",
        description = "Gym back office: sessions, accounts, announcements and baskets."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::sessions::sign_in,
        crate::inbound::http::sessions::sign_out,
        crate::inbound::http::sessions::current_identity,
        crate::inbound::http::sessions::change_password,
        crate::inbound::http::accounts::create_account,
        crate::inbound::http::accounts::deactivate_account,
        crate::inbound::http::announcements::broadcast,
        crate::inbound::http::announcements::list_all,
        crate::inbound::http::announcements::list_inbox,
        crate::inbound::http::announcements::mark_read,
        crate::inbound::http::announcements::mark_all_read,
        crate::inbound::http::basket::list_basket,
        crate::inbound::http::basket::get_basket_entry,
        crate::inbound::http::basket::add_to_basket,
        crate::inbound::http::basket::increment_entry,
        crate::inbound::http::basket::decrement_entry,
        crate::inbound::http::basket::delete_entry,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        SignInRequest,
        ChangePasswordRequest,
        IdentityResponse,
        PermissionPayload,
        CreateAccountRequest,
        CreatedResponse,
        BroadcastRequest,
        InboxAnnouncementResponse,
        AnnouncementSummaryResponse,
        MarkAllReadResponse,
        AddToBasketRequest,
        BasketLineResponse,
    )),
    tags(
        (name = "sessions", description = "Sign-in, sign-out and the caller's identity"),
        (name = "admin", description = "Admin account management"),
        (name = "announcements", description = "Broadcasts and inboxes"),
        (name = "basket", description = "Per-customer basket entries"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
