//! Account administration and self-service password changes.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use super::error_mapping::{map_hasher_error, map_identity_error};
use super::ports::{CredentialHasher, IdentityPersistenceError, IdentityRepository};
use super::{
    Email, Error, Identity, IdentityId, IdentityName, NewIdentity, Password, PermissionLevel,
    require_admin,
};

/// Validated input for [`AccountService::create_account`].
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: Email,
    pub name: IdentityName,
    pub password: Password,
    pub permission: PermissionLevel,
}

/// Domain service managing identities on behalf of admins and their owners.
#[derive(Clone)]
pub struct AccountService {
    identities: Arc<dyn IdentityRepository>,
    hasher: Arc<dyn CredentialHasher>,
}

impl AccountService {
    /// Create a new service over the credential store.
    pub fn new(identities: Arc<dyn IdentityRepository>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { identities, hasher }
    }

    /// Create an identity. Admin only; a duplicate active email is a conflict.
    pub async fn create_account(
        &self,
        actor: &Identity,
        account: NewAccount,
    ) -> Result<IdentityId, Error> {
        require_admin(actor)?;
        let NewAccount {
            email,
            name,
            password,
            permission,
        } = account;
        let credential = self
            .hasher
            .hash(&password)
            .await
            .map_err(map_hasher_error)?;
        let id = self
            .identities
            .create(&NewIdentity {
                email,
                name,
                permission,
                credential,
            })
            .await
            .map_err(map_create_error)?;
        info!(actor_id = %actor.id, identity_id = %id, ?permission, "account created");
        Ok(id)
    }

    /// Soft-delete an identity and drop its session. Admin only.
    ///
    /// Admins cannot deactivate themselves; that would lock the caller out
    /// mid-request.
    pub async fn deactivate_account(
        &self,
        actor: &Identity,
        target: IdentityId,
    ) -> Result<(), Error> {
        require_admin(actor)?;
        if actor.id == target {
            return Err(Error::conflict("cannot deactivate your own account"));
        }
        let removed = self
            .identities
            .soft_delete(target)
            .await
            .map_err(map_identity_error)?;
        if !removed {
            return Err(Error::not_found("account not found"));
        }
        info!(actor_id = %actor.id, identity_id = %target, "account deactivated");
        Ok(())
    }

    /// Replace the caller's password after checking the current one.
    ///
    /// The current session stays valid.
    pub async fn change_password(
        &self,
        identity: &Identity,
        current: &Password,
        replacement: &Password,
    ) -> Result<(), Error> {
        let verified = self
            .hasher
            .verify(current, &identity.credential)
            .await
            .map_err(map_hasher_error)?;
        if !verified {
            return Err(Error::invalid_request("current password is incorrect")
                .with_details(json!({ "field": "oldPassword", "code": "incorrect_password" })));
        }
        let credential = self
            .hasher
            .hash(replacement)
            .await
            .map_err(map_hasher_error)?;
        let updated = self
            .identities
            .update_password_hash(identity.id, &credential)
            .await
            .map_err(map_identity_error)?;
        if !updated {
            return Err(Error::not_found("account not found"));
        }
        info!(identity_id = %identity.id, "password changed");
        Ok(())
    }
}

fn map_create_error(err: IdentityPersistenceError) -> Error {
    let duplicate = matches!(err, IdentityPersistenceError::DuplicateEmail { .. });
    let mapped = map_identity_error(err);
    if duplicate {
        mapped.with_details(json!({ "field": "email", "code": "duplicate_email" }))
    } else {
        mapped
    }
}

#[cfg(test)]
mod tests {
    //! Tests for account administration.
    use super::*;
    use crate::domain::ports::{MockCredentialHasher, MockIdentityRepository};
    use crate::domain::{CredentialHash, ErrorCode, SignInCredentials};
    use crate::test_support::{InMemoryServices, InMemoryStore};
    use rstest::{fixture, rstest};

    struct Harness {
        services: InMemoryServices,
        admin: Identity,
        staff: Identity,
    }

    async fn load(services: &InMemoryServices, id: IdentityId) -> Identity {
        services
            .store
            .identity(id)
            .expect("identity exists")
    }

    #[fixture]
    async fn harness() -> Harness {
        let store = InMemoryStore::shared();
        let admin_id = store.seed_identity(
            "admin@gym.example",
            "Admin",
            PermissionLevel::Admin,
            "admin-pass",
        );
        let staff_id = store.seed_identity(
            "staff@gym.example",
            "Staff",
            PermissionLevel::Standard,
            "staff-pass",
        );
        let services = InMemoryServices::new(store);
        let admin = load(&services, admin_id).await;
        let staff = load(&services, staff_id).await;
        Harness {
            services,
            admin,
            staff,
        }
    }

    fn sign_in(email: &str, password: &str) -> SignInCredentials {
        SignInCredentials::try_from_parts(email, password).expect("credential shape")
    }

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: Email::new(email).expect("valid email"),
            name: IdentityName::new("Trainer").expect("valid name"),
            password: Password::new_secret("trainer-pass").expect("valid password"),
            permission: PermissionLevel::Standard,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn admin_creates_account_that_can_sign_in(#[future] harness: Harness) {
        let harness = harness.await;
        let id = harness
            .services
            .accounts
            .create_account(&harness.admin, new_account("trainer@gym.example"))
            .await
            .expect("account created");

        let issued = harness
            .services
            .sessions
            .issue(&sign_in("trainer@gym.example", "trainer-pass"))
            .await
            .expect("new account signs in");
        assert_eq!(issued.identity.id, id);
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_active_email_conflicts(#[future] harness: Harness) {
        let harness = harness.await;
        let err = harness
            .services
            .accounts
            .create_account(&harness.admin, new_account("staff@gym.example"))
            .await
            .expect_err("duplicate rejected");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn email_of_deactivated_account_can_be_reused(#[future] harness: Harness) {
        let harness = harness.await;
        let accounts = &harness.services.accounts;
        accounts
            .deactivate_account(&harness.admin, harness.staff.id)
            .await
            .expect("deactivated");
        accounts
            .create_account(&harness.admin, new_account("staff@gym.example"))
            .await
            .expect("email reusable");
    }

    #[rstest]
    #[tokio::test]
    async fn standard_identity_cannot_administer_accounts(#[future] harness: Harness) {
        let harness = harness.await;
        let accounts = &harness.services.accounts;
        let create = accounts
            .create_account(&harness.staff, new_account("x@gym.example"))
            .await
            .expect_err("forbidden");
        let deactivate = accounts
            .deactivate_account(&harness.staff, harness.admin.id)
            .await
            .expect_err("forbidden");

        assert_eq!(create.code(), ErrorCode::Forbidden);
        assert_eq!(deactivate.code(), ErrorCode::Forbidden);
        assert!(!harness.services.store.is_deleted(harness.admin.id));
        assert!(
            harness
                .services
                .store
                .find_active_by_email(&Email::new("x@gym.example").expect("valid"))
                .await
                .expect("store reachable")
                .is_none()
        );
    }

    #[rstest]
    #[tokio::test]
    async fn deactivation_revokes_the_session(#[future] harness: Harness) {
        let harness = harness.await;
        let issued = harness
            .services
            .sessions
            .issue(&sign_in("staff@gym.example", "staff-pass"))
            .await
            .expect("staff signs in");

        harness
            .services
            .accounts
            .deactivate_account(&harness.admin, harness.staff.id)
            .await
            .expect("deactivated");

        assert!(harness.services.store.is_deleted(harness.staff.id));
        assert!(
            harness
                .services
                .sessions
                .validate(issued.token.as_str())
                .await
                .is_err()
        );
    }

    #[rstest]
    #[tokio::test]
    async fn deactivation_rejects_self_and_missing_targets(#[future] harness: Harness) {
        let harness = harness.await;
        let accounts = &harness.services.accounts;
        let own = accounts
            .deactivate_account(&harness.admin, harness.admin.id)
            .await
            .expect_err("self deactivation rejected");
        let missing = accounts
            .deactivate_account(&harness.admin, IdentityId::new(999).expect("positive"))
            .await
            .expect_err("missing target");

        assert_eq!(own.code(), ErrorCode::Conflict);
        assert_eq!(missing.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn change_password_requires_current_password(#[future] harness: Harness) {
        let harness = harness.await;
        let err = harness
            .services
            .accounts
            .change_password(
                &harness.staff,
                &Password::presented("wrong").expect("non-empty"),
                &Password::new_secret("brand-new-pass").expect("valid"),
            )
            .await
            .expect_err("wrong current password");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn changed_password_is_used_for_next_sign_in(#[future] harness: Harness) {
        let harness = harness.await;
        harness
            .services
            .accounts
            .change_password(
                &harness.staff,
                &Password::presented("staff-pass").expect("non-empty"),
                &Password::new_secret("brand-new-pass").expect("valid"),
            )
            .await
            .expect("password changed");

        let sessions = &harness.services.sessions;
        let old = sign_in("staff@gym.example", "staff-pass");
        let new = sign_in("staff@gym.example", "brand-new-pass");
        assert!(sessions.issue(&old).await.is_err());
        assert!(sessions.issue(&new).await.is_ok());
    }

    #[rstest]
    #[tokio::test]
    async fn store_failure_while_creating_is_reported() {
        let mut identities = MockIdentityRepository::new();
        identities
            .expect_create()
            .times(1)
            .return_once(|_| Err(IdentityPersistenceError::connection("pool exhausted")));
        let mut hasher = MockCredentialHasher::new();
        hasher
            .expect_hash()
            .times(1)
            .return_once(|_| Ok(CredentialHash::new("$argon2id$stub")));
        let service = AccountService::new(Arc::new(identities), Arc::new(hasher));
        let admin = Identity {
            id: IdentityId::new(1).expect("positive"),
            email: Email::new("admin@gym.example").expect("valid"),
            name: IdentityName::new("Admin").expect("valid"),
            permission: PermissionLevel::Admin,
            last_login: None,
            credential: CredentialHash::new("$argon2id$stub"),
        };

        let err = service
            .create_account(&admin, new_account("new@gym.example"))
            .await
            .expect_err("store down");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
