//! Domain primitives, services and ports.
//!
//! Purpose: define the strongly typed entities shared by the HTTP and
//! persistence adapters, plus the services that run the session, broadcast
//! and basket operations against repository ports. Validation lives in the
//! constructors of each type; services only ever see well-formed values.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - TraceId: request correlation id propagated through task-local scope.
//! - Identity and friends: credential store records.
//! - SessionAuthenticator, AccountService, AnnouncementService,
//!   BasketService: the domain services.
//! - require_admin: the authorization gate.

pub mod error;
mod error_mapping;
pub mod ports;
pub mod trace_id;

mod account_service;
mod announcement_service;
mod announcements;
mod auth;
mod authorization;
mod basket;
mod basket_service;
mod identity;
mod session_authenticator;
mod session_token;

pub use self::account_service::{AccountService, NewAccount};
pub use self::announcement_service::AnnouncementService;
pub use self::announcements::{
    ANNOUNCEMENT_MAX, AnnouncementSummary, AnnouncementText, AnnouncementValidationError,
    BroadcastAudience, BroadcastReceipt, InboxAnnouncement, MessageId,
};
pub use self::auth::{CredentialValidationError, PASSWORD_MIN, Password, SignInCredentials};
pub use self::authorization::require_admin;
pub use self::basket::{
    BasketEntryId, BasketLine, BasketValidationError, ProductId, Quantity, StepOutcome,
};
pub use self::basket_service::BasketService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity::{
    CredentialHash, EMAIL_MAX, Email, Identity, IdentityId, IdentityName,
    IdentityValidationError, NAME_MAX, NewIdentity, PermissionLevel,
};
pub use self::session_authenticator::{
    INVALID_CREDENTIALS, IssuedSession, LOGIN_REQUIRED, SessionAuthenticator,
};
pub use self::session_token::{SESSION_TOKEN_BYTES, SessionToken, SessionTokenError};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
