//! Authorization gate restricting operations to admin identities.

use super::{Error, Identity};

/// Pass only when `identity` holds the admin permission level.
///
/// Composes after session validation; it has no state and performs no I/O.
///
/// # Examples
/// ```
/// use gymdesk::domain::{require_admin, ErrorCode, PermissionLevel};
/// # use gymdesk::domain::{CredentialHash, Email, Identity, IdentityId, IdentityName};
/// # let identity = Identity {
/// #     id: IdentityId::new(1).unwrap(),
/// #     email: Email::new("coach@gym.example").unwrap(),
/// #     name: IdentityName::new("Coach").unwrap(),
/// #     permission: PermissionLevel::Standard,
/// #     last_login: None,
/// #     credential: CredentialHash::new("hash"),
/// # };
/// let err = require_admin(&identity).unwrap_err();
/// assert_eq!(err.code(), ErrorCode::Forbidden);
/// ```
pub fn require_admin(identity: &Identity) -> Result<(), Error> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(Error::forbidden("admin permission required"))
    }
}
