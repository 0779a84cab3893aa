//! Authentication extractors used by HTTP handlers.
//!
//! Keep the HTTP modules focused on request/response mapping by resolving
//! the caller here: the cookie token is validated against the credential
//! store on every request, and the admin gate runs before the handler body.

use std::ops::Deref;

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, Identity, LOGIN_REQUIRED, SessionToken, require_admin};

use super::session::SessionContext;
use super::state::HttpState;

/// Caller holding a valid session.
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    identity: Identity,
    token: SessionToken,
}

impl AuthenticatedIdentity {
    /// Token that authenticated this request.
    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Consume the wrapper and return the identity.
    pub fn into_inner(self) -> Identity {
        self.identity
    }
}

impl Deref for AuthenticatedIdentity {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.identity
    }
}

/// Caller holding a valid session and the admin permission level.
#[derive(Debug, Clone)]
pub struct AdminIdentity(Identity);

impl Deref for AdminIdentity {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

async fn authenticate(
    state: Option<web::Data<HttpState>>,
    session: SessionContext,
) -> Result<AuthenticatedIdentity, Error> {
    let state = state.ok_or_else(|| Error::internal("HTTP state not configured"))?;
    let token = session
        .token()?
        .ok_or_else(|| Error::unauthorized(LOGIN_REQUIRED))?;
    let identity = state.sessions.validate(token.as_str()).await?;
    Ok(AuthenticatedIdentity { identity, token })
}

fn extract(
    req: &HttpRequest,
    payload: &mut Payload,
) -> LocalBoxFuture<'static, Result<AuthenticatedIdentity, Error>> {
    let state = req.app_data::<web::Data<HttpState>>().cloned();
    let session = SessionContext::from_request(req, payload);
    Box::pin(async move {
        let session = session.await.map_err(Error::from)?;
        authenticate(state, session).await
    })
}

impl FromRequest for AuthenticatedIdentity {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        extract(req, payload)
    }
}

impl FromRequest for AdminIdentity {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = extract(req, payload);
        Box::pin(async move {
            let identity = fut.await?.into_inner();
            require_admin(&identity)?;
            Ok(Self(identity))
        })
    }
}
