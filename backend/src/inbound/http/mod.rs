//! HTTP inbound adapter exposing REST endpoints.

pub mod accounts;
pub mod announcements;
pub mod auth;
pub mod basket;
pub mod error;
pub mod health;
pub mod schemas;
pub mod session;
pub mod sessions;
pub mod state;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod validation;

use actix_web::web;
use tracing::debug;

use crate::domain::Error;

pub use error::ApiResult;

/// Register every `/api/v1` handler on `cfg`.
///
/// The caller owns the scope and its session middleware; this only adds
/// routes plus a JSON extractor config that reports body errors in the
/// standard error envelope.
///
/// # Examples
/// ```no_run
/// use actix_web::{App, web};
/// use gymdesk::inbound::http::configure_api;
///
/// let app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    let json = web::JsonConfig::default().error_handler(|err, _req| {
        debug!(error = %err, "rejected request body");
        Error::invalid_request(format!("invalid request body: {err}")).into()
    });

    cfg.app_data(json)
        .service(sessions::sign_in)
        .service(sessions::sign_out)
        .service(sessions::current_identity)
        .service(sessions::change_password)
        .service(accounts::create_account)
        .service(accounts::deactivate_account)
        .service(announcements::broadcast)
        .service(announcements::list_all)
        .service(announcements::list_inbox)
        .service(announcements::mark_all_read)
        .service(announcements::mark_read)
        .service(basket::list_basket)
        .service(basket::get_basket_entry)
        .service(basket::add_to_basket)
        .service(basket::increment_entry)
        .service(basket::decrement_entry)
        .service(basket::delete_entry);
}
