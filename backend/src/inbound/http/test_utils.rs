//! Test helpers for inbound HTTP components.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};

use crate::domain::{IdentityId, PermissionLevel};
use crate::test_support::{InMemoryServices, InMemoryStore};

use super::configure_api;

/// Password of the standard identity seeded by the fixtures below.
pub const STAFF_PASSWORD: &str = "correct horse";
/// Password of the admin identity seeded by [`services_with_admin`].
pub const ADMIN_PASSWORD: &str = "admin password";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// In-memory services with one standard identity, `staff@gym.example`.
pub fn services_with_staff() -> (InMemoryServices, IdentityId) {
    let store = InMemoryStore::shared();
    let staff = store.seed_identity(
        "staff@gym.example",
        "Staff",
        PermissionLevel::Standard,
        STAFF_PASSWORD,
    );
    (InMemoryServices::new(store), staff)
}

/// Like [`services_with_staff`] plus an admin, `admin@gym.example`.
///
/// Returns `(services, admin, staff)`.
pub fn services_with_admin() -> (InMemoryServices, IdentityId, IdentityId) {
    let (services, staff) = services_with_staff();
    let admin = services.store.seed_identity(
        "admin@gym.example",
        "Admin",
        PermissionLevel::Admin,
        ADMIN_PASSWORD,
    );
    (services, admin, staff)
}

/// Application with every `/api/v1` route mounted over `services`.
pub fn api_app(
    services: &InMemoryServices,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    App::new()
        .app_data(web::Data::new(services.http_state()))
        .service(
            web::scope("/api/v1")
                .wrap(test_session_middleware())
                .configure(configure_api),
        )
}

/// Sign in through `POST /api/v1/signin` and return the session cookie.
macro_rules! sign_in_cookie {
    ($app:expr, $email:expr, $password:expr) => {{
        let res = actix_web::test::call_service(
            $app,
            actix_web::test::TestRequest::post()
                .uri("/api/v1/signin")
                .set_json(serde_json::json!({ "email": $email, "password": $password }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), actix_web::http::StatusCode::OK);
        res.response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .map(|cookie| cookie.into_owned())
            .expect("session cookie")
    }};
}
pub(crate) use sign_in_cookie;
