//! Shared HTTP harness for integration tests.
//!
//! Mirrors the production middleware stack (trace ids, private session
//! cookie) over the in-memory adapters.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::time::Duration;
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use gymdesk::Trace;
use gymdesk::domain::{IdentityId, PermissionLevel};
use gymdesk::inbound::http::configure_api;
use gymdesk::test_support::{InMemoryServices, InMemoryStore};

pub const SESSION_COOKIE: &str = "gymdesk-session";
pub const ADMIN_EMAIL: &str = "admin@gym.example";
pub const ADMIN_PASSWORD: &str = "admin password";
pub const STAFF_EMAIL: &str = "staff@gym.example";
pub const STAFF_PASSWORD: &str = "correct horse";

/// Seeded identities for a scenario.
pub struct Gym {
    pub services: InMemoryServices,
    pub admin: IdentityId,
    pub staff: IdentityId,
}

/// In-memory gym with one admin and one standard identity.
pub fn gym() -> Gym {
    let store = InMemoryStore::shared();
    let staff = store.seed_identity(STAFF_EMAIL, "Staff", PermissionLevel::Standard, STAFF_PASSWORD);
    let admin = store.seed_identity(ADMIN_EMAIL, "Admin", PermissionLevel::Admin, ADMIN_PASSWORD);
    Gym {
        services: InMemoryServices::new(store),
        admin,
        staff,
    }
}

/// Application wired like the production server.
pub fn gymdesk_app(
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
    let session = SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name(SESSION_COOKIE.to_owned())
        .cookie_secure(false)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(PersistentSession::default().session_ttl(Duration::hours(6)))
        .build();

    App::new()
        .app_data(web::Data::new(services.http_state()))
        .wrap(Trace)
        .service(web::scope("/api/v1").wrap(session).configure(configure_api))
}

/// Sign in through the API and return the session cookie.
macro_rules! sign_in {
    ($app:expr, $email:expr, $password:expr) => {{
        let res = actix_web::test::call_service(
            $app,
            actix_web::test::TestRequest::post()
                .uri("/api/v1/signin")
                .set_json(serde_json::json!({ "email": $email, "password": $password }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), actix_web::http::StatusCode::OK, "sign-in failed");
        res.response()
            .cookies()
            .find(|cookie| cookie.name() == $crate::support::SESSION_COOKIE)
            .map(|cookie| cookie.into_owned())
            .expect("session cookie")
    }};
}
