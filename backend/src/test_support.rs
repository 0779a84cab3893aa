//! In-memory adapters for service and HTTP tests.
//!
//! [`InMemoryStore`] implements the identity, message and basket repository
//! ports over one mutex-guarded state. Multi-row operations stage their
//! changes on a copy and swap it in only on success, which mirrors the
//! commit-or-rollback contract of the PostgreSQL adapters. Failure injection
//! hooks let tests exercise rollback and unavailability paths.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    BasketPersistenceError, BasketRepository, CredentialHasher, CredentialHasherError,
    IdentityPersistenceError, IdentityRepository, MessagePersistenceError, MessageRepository,
    SessionTokenGenerator, SessionTokenGeneratorError,
};
use crate::domain::{
    AccountService, AnnouncementService, AnnouncementSummary, AnnouncementText, BasketEntryId,
    BasketLine, BasketService, BroadcastAudience, BroadcastReceipt, CredentialHash, Email,
    Identity, IdentityId, IdentityName, InboxAnnouncement, MessageId, NewIdentity, Password,
    PermissionLevel, ProductId, Quantity, SessionAuthenticator, SessionToken, StepOutcome,
};

use crate::inbound::http::state::HttpState;

const PLAINTEXT_PREFIX: &str = "plain$";

#[derive(Debug, Clone)]
struct IdentityRecord {
    email: String,
    name: String,
    permission: PermissionLevel,
    credential: String,
    session_token: Option<String>,
    last_login: Option<DateTime<Utc>>,
    deleted: bool,
}

#[derive(Debug, Clone)]
struct MessageRecord {
    body: String,
    sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct ProductRecord {
    name: String,
    price: f64,
    deleted: bool,
}

#[derive(Debug, Clone)]
struct BasketRecord {
    customer: i64,
    product: i64,
    quantity: i32,
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    identities: BTreeMap<i64, IdentityRecord>,
    messages: BTreeMap<i64, MessageRecord>,
    // Keyed by (message id, recipient id).
    receipts: BTreeMap<(i64, i64), bool>,
    products: BTreeMap<i64, ProductRecord>,
    basket: BTreeMap<i64, BasketRecord>,
    next_identity: i64,
    next_message: i64,
    next_basket: i64,
}

impl StoreState {
    fn allocate(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn active(&self, id: i64) -> Option<&IdentityRecord> {
        self.identities.get(&id).filter(|record| !record.deleted)
    }

    fn basket_line(&self, id: i64, record: &BasketRecord) -> Option<BasketLine> {
        let product = self.products.get(&record.product)?;
        Some(BasketLine {
            id: BasketEntryId::new(id).ok()?,
            product_id: ProductId::new(record.product).ok()?,
            product_name: product.name.clone(),
            unit_price: product.price,
            quantity: record.quantity,
        })
    }
}

#[derive(Debug, Default)]
struct Failures {
    unavailable: bool,
    receipt_for: BTreeSet<i64>,
}

/// Shared in-memory credential, message and basket store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    failures: Mutex<Failures>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn to_identity(id: i64, record: &IdentityRecord) -> Result<Identity, IdentityPersistenceError> {
    let invalid = |err: &dyn std::fmt::Display| IdentityPersistenceError::query(err.to_string());
    Ok(Identity {
        id: IdentityId::new(id).map_err(|err| invalid(&err))?,
        email: Email::new(&record.email).map_err(|err| invalid(&err))?,
        name: IdentityName::new(&record.name).map_err(|err| invalid(&err))?,
        permission: record.permission,
        last_login: record.last_login,
        credential: CredentialHash::new(record.credential.clone()),
    })
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store behind an `Arc`, ready to hand to services.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Insert an active identity whose password is stored with [`PlaintextHasher`].
    ///
    /// # Panics
    /// Panics when `email` or `name` is invalid; fixtures are expected to be
    /// well-formed.
    pub fn seed_identity(
        &self,
        email: &str,
        name: &str,
        permission: PermissionLevel,
        password: &str,
    ) -> IdentityId {
        let mut state = lock(&self.state);
        let id = StoreState::allocate(&mut state.next_identity);
        state.identities.insert(
            id,
            IdentityRecord {
                email: String::from(Email::new(email).unwrap_or_else(|err| panic!("{err}"))),
                name: String::from(IdentityName::new(name).unwrap_or_else(|err| panic!("{err}"))),
                permission,
                credential: format!("{PLAINTEXT_PREFIX}{password}"),
                session_token: None,
                last_login: None,
                deleted: false,
            },
        );
        IdentityId::new(id).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Insert or replace a product.
    ///
    /// # Panics
    /// Panics when `id` is not positive.
    pub fn seed_product(&self, id: i64, name: &str, price: f64) -> ProductId {
        let product = ProductId::new(id).unwrap_or_else(|err| panic!("{err}"));
        lock(&self.state).products.insert(
            id,
            ProductRecord {
                name: name.to_owned(),
                price,
                deleted: false,
            },
        );
        product
    }

    /// Withdraw a product so new basket entries are rejected.
    pub fn withdraw_product(&self, id: ProductId) {
        if let Some(product) = lock(&self.state).products.get_mut(&id.get()) {
            product.deleted = true;
        }
    }

    /// Make every subsequent call fail with a connection error.
    pub fn set_unavailable(&self, unavailable: bool) {
        lock(&self.failures).unavailable = unavailable;
    }

    /// Make any broadcast that would write a receipt for `recipient` fail.
    pub fn fail_receipt_for(&self, recipient: IdentityId) {
        lock(&self.failures).receipt_for.insert(recipient.get());
    }

    /// Session token currently stored for `id`.
    #[must_use]
    pub fn session_token_of(&self, id: IdentityId) -> Option<String> {
        lock(&self.state)
            .identities
            .get(&id.get())
            .and_then(|record| record.session_token.clone())
    }

    /// Last sign-in timestamp recorded for `id`.
    #[must_use]
    pub fn last_login_of(&self, id: IdentityId) -> Option<DateTime<Utc>> {
        lock(&self.state)
            .identities
            .get(&id.get())
            .and_then(|record| record.last_login)
    }

    /// Active identity stored under `id`.
    #[must_use]
    pub fn identity(&self, id: IdentityId) -> Option<Identity> {
        lock(&self.state)
            .active(id.get())
            .and_then(|record| to_identity(id.get(), record).ok())
    }

    /// Whether `id` has been soft-deleted.
    #[must_use]
    pub fn is_deleted(&self, id: IdentityId) -> bool {
        lock(&self.state)
            .identities
            .get(&id.get())
            .is_some_and(|record| record.deleted)
    }

    /// Number of stored messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        lock(&self.state).messages.len()
    }

    /// Receipts of `message` as (recipient, read) pairs, by recipient id.
    #[must_use]
    pub fn receipts_for(&self, message: MessageId) -> Vec<(i64, bool)> {
        lock(&self.state)
            .receipts
            .iter()
            .filter(|((message_id, _), _)| *message_id == message.get())
            .map(|((_, recipient), read)| (*recipient, *read))
            .collect()
    }

    /// Basket rows of `customer` as (entry, product, quantity) triples.
    #[must_use]
    pub fn basket_rows_for(&self, customer: IdentityId) -> Vec<(i64, i64, i32)> {
        lock(&self.state)
            .basket
            .iter()
            .filter(|(_, record)| record.customer == customer.get())
            .map(|(id, record)| (*id, record.product, record.quantity))
            .collect()
    }

    fn available<E>(&self, connection: impl FnOnce(&'static str) -> E) -> Result<(), E> {
        if lock(&self.failures).unavailable {
            return Err(connection("store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityRepository for InMemoryStore {
    async fn find_active_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Identity>, IdentityPersistenceError> {
        self.available(IdentityPersistenceError::connection)?;
        let state = lock(&self.state);
        state
            .identities
            .iter()
            .find(|(_, record)| !record.deleted && record.email == email.as_ref())
            .map(|(id, record)| to_identity(*id, record))
            .transpose()
    }

    async fn find_active_by_token(
        &self,
        token: &SessionToken,
    ) -> Result<Option<Identity>, IdentityPersistenceError> {
        self.available(IdentityPersistenceError::connection)?;
        let state = lock(&self.state);
        state
            .identities
            .iter()
            .find(|(_, record)| {
                !record.deleted && record.session_token.as_deref() == Some(token.as_str())
            })
            .map(|(id, record)| to_identity(*id, record))
            .transpose()
    }

    async fn update_session(
        &self,
        id: IdentityId,
        token: &SessionToken,
    ) -> Result<(), IdentityPersistenceError> {
        self.available(IdentityPersistenceError::connection)?;
        let mut state = lock(&self.state);
        for record in state.identities.values_mut() {
            if record.session_token.as_deref() == Some(token.as_str()) {
                record.session_token = None;
            }
        }
        if let Some(record) = state.identities.get_mut(&id.get()) {
            record.session_token = Some(token.as_str().to_owned());
            record.last_login = Some(Utc::now());
        }
        Ok(())
    }

    async fn clear_session(&self, token: &SessionToken) -> Result<(), IdentityPersistenceError> {
        self.available(IdentityPersistenceError::connection)?;
        let mut state = lock(&self.state);
        for record in state.identities.values_mut() {
            if record.session_token.as_deref() == Some(token.as_str()) {
                record.session_token = None;
            }
        }
        Ok(())
    }

    async fn create(&self, identity: &NewIdentity) -> Result<IdentityId, IdentityPersistenceError> {
        self.available(IdentityPersistenceError::connection)?;
        let mut state = lock(&self.state);
        let taken = state
            .identities
            .values()
            .any(|record| !record.deleted && record.email == identity.email.as_ref());
        if taken {
            return Err(IdentityPersistenceError::duplicate_email(
                identity.email.as_ref(),
            ));
        }
        let id = StoreState::allocate(&mut state.next_identity);
        state.identities.insert(
            id,
            IdentityRecord {
                email: identity.email.as_ref().to_owned(),
                name: identity.name.as_ref().to_owned(),
                permission: identity.permission,
                credential: identity.credential.as_str().to_owned(),
                session_token: None,
                last_login: None,
                deleted: false,
            },
        );
        IdentityId::new(id).map_err(|err| IdentityPersistenceError::query(err.to_string()))
    }

    async fn update_password_hash(
        &self,
        id: IdentityId,
        credential: &CredentialHash,
    ) -> Result<bool, IdentityPersistenceError> {
        self.available(IdentityPersistenceError::connection)?;
        let mut state = lock(&self.state);
        match state.identities.get_mut(&id.get()) {
            Some(record) if !record.deleted => {
                record.credential = credential.as_str().to_owned();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn soft_delete(&self, id: IdentityId) -> Result<bool, IdentityPersistenceError> {
        self.available(IdentityPersistenceError::connection)?;
        let mut state = lock(&self.state);
        match state.identities.get_mut(&id.get()) {
            Some(record) if !record.deleted => {
                record.deleted = true;
                record.session_token = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl MessageRepository for InMemoryStore {
    async fn create_broadcast(
        &self,
        text: &AnnouncementText,
        audience: &BroadcastAudience,
    ) -> Result<BroadcastReceipt, MessagePersistenceError> {
        self.available(MessagePersistenceError::connection)?;
        let failing = lock(&self.failures).receipt_for.clone();
        let mut state = lock(&self.state);

        // Work on a copy; only a fully successful broadcast is swapped in.
        let mut staged = state.clone();
        let message_id = StoreState::allocate(&mut staged.next_message);
        staged.messages.insert(
            message_id,
            MessageRecord {
                body: text.as_ref().to_owned(),
                sent_at: Utc::now(),
            },
        );

        let recipients: Vec<i64> = match audience {
            BroadcastAudience::AllActive => staged
                .identities
                .iter()
                .filter(|(_, record)| !record.deleted)
                .map(|(id, _)| *id)
                .collect(),
            BroadcastAudience::Explicit(ids) => ids.iter().map(|id| id.get()).collect(),
        };

        for recipient in &recipients {
            if failing.contains(recipient) {
                return Err(MessagePersistenceError::query("injected receipt failure"));
            }
            if !staged
                .identities
                .get(recipient)
                .is_some_and(|record| !record.deleted)
            {
                return Err(MessagePersistenceError::unknown_recipient());
            }
            staged.receipts.insert((message_id, *recipient), false);
        }

        *state = staged;
        Ok(BroadcastReceipt {
            message_id: MessageId::new(message_id)
                .map_err(|err| MessagePersistenceError::query(err.to_string()))?,
            recipient_count: recipients.len(),
        })
    }

    async fn mark_read(
        &self,
        recipient: IdentityId,
        message: MessageId,
    ) -> Result<(), MessagePersistenceError> {
        self.available(MessagePersistenceError::connection)?;
        if let Some(read) = lock(&self.state)
            .receipts
            .get_mut(&(message.get(), recipient.get()))
        {
            *read = true;
        }
        Ok(())
    }

    async fn mark_all_read(&self, recipient: IdentityId) -> Result<u64, MessagePersistenceError> {
        self.available(MessagePersistenceError::connection)?;
        let mut state = lock(&self.state);
        let mut changed = 0_u64;
        for ((_, owner), read) in &mut state.receipts {
            if *owner == recipient.get() && !*read {
                *read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn list_for_recipient(
        &self,
        recipient: IdentityId,
    ) -> Result<Vec<InboxAnnouncement>, MessagePersistenceError> {
        self.available(MessagePersistenceError::connection)?;
        let state = lock(&self.state);
        let mut inbox = Vec::new();
        for ((message_id, owner), read) in &state.receipts {
            if *owner != recipient.get() {
                continue;
            }
            let Some(message) = state.messages.get(message_id) else {
                continue;
            };
            inbox.push(InboxAnnouncement {
                id: MessageId::new(*message_id)
                    .map_err(|err| MessagePersistenceError::query(err.to_string()))?,
                body: message.body.clone(),
                sent_at: message.sent_at,
                read: *read,
            });
        }
        inbox.sort_by(|a, b| b.sent_at.cmp(&a.sent_at).then(b.id.cmp(&a.id)));
        Ok(inbox)
    }

    async fn list_all(&self) -> Result<Vec<AnnouncementSummary>, MessagePersistenceError> {
        self.available(MessagePersistenceError::connection)?;
        let state = lock(&self.state);
        let mut summaries = Vec::with_capacity(state.messages.len());
        for (message_id, message) in state.messages.iter().rev() {
            let receipts = state
                .receipts
                .iter()
                .filter(|((id, _), _)| id == message_id);
            let (recipient_count, read_count) =
                receipts.fold((0_u64, 0_u64), |(total, read), (_, is_read)| {
                    (total + 1, read + u64::from(*is_read))
                });
            summaries.push(AnnouncementSummary {
                id: MessageId::new(*message_id)
                    .map_err(|err| MessagePersistenceError::query(err.to_string()))?,
                body: message.body.clone(),
                sent_at: message.sent_at,
                recipient_count,
                read_count,
            });
        }
        Ok(summaries)
    }
}

#[async_trait]
impl BasketRepository for InMemoryStore {
    async fn upsert(
        &self,
        customer: IdentityId,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<BasketEntryId, BasketPersistenceError> {
        self.available(BasketPersistenceError::connection)?;
        let mut state = lock(&self.state);
        let available = state
            .products
            .get(&product.get())
            .is_some_and(|record| !record.deleted);
        if !available {
            return Err(BasketPersistenceError::unknown_product());
        }

        let existing = state.basket.iter_mut().find(|(_, record)| {
            record.customer == customer.get() && record.product == product.get()
        });
        let id = match existing {
            Some((id, record)) => {
                record.quantity = record
                    .quantity
                    .checked_add(1)
                    .ok_or_else(BasketPersistenceError::quantity_limit)?;
                *id
            }
            None => {
                let id = StoreState::allocate(&mut state.next_basket);
                state.basket.insert(
                    id,
                    BasketRecord {
                        customer: customer.get(),
                        product: product.get(),
                        quantity: quantity.get(),
                    },
                );
                id
            }
        };
        BasketEntryId::new(id).map_err(|err| BasketPersistenceError::query(err.to_string()))
    }

    async fn increment(
        &self,
        customer: IdentityId,
        entry: BasketEntryId,
    ) -> Result<StepOutcome, BasketPersistenceError> {
        self.available(BasketPersistenceError::connection)?;
        let mut state = lock(&self.state);
        match state.basket.get_mut(&entry.get()) {
            Some(record) if record.customer == customer.get() => {
                match record.quantity.checked_add(1) {
                    Some(quantity) => {
                        record.quantity = quantity;
                        Ok(StepOutcome::Applied)
                    }
                    None => Ok(StepOutcome::AtMaximum),
                }
            }
            _ => Ok(StepOutcome::Missing),
        }
    }

    async fn decrement(
        &self,
        customer: IdentityId,
        entry: BasketEntryId,
    ) -> Result<StepOutcome, BasketPersistenceError> {
        self.available(BasketPersistenceError::connection)?;
        let mut state = lock(&self.state);
        match state.basket.get_mut(&entry.get()) {
            Some(record) if record.customer == customer.get() => {
                if record.quantity > 1 {
                    record.quantity -= 1;
                    Ok(StepOutcome::Applied)
                } else {
                    Ok(StepOutcome::AtMinimum)
                }
            }
            _ => Ok(StepOutcome::Missing),
        }
    }

    async fn delete(
        &self,
        customer: IdentityId,
        entry: BasketEntryId,
    ) -> Result<bool, BasketPersistenceError> {
        self.available(BasketPersistenceError::connection)?;
        let mut state = lock(&self.state);
        let owned = state
            .basket
            .get(&entry.get())
            .is_some_and(|record| record.customer == customer.get());
        if owned {
            state.basket.remove(&entry.get());
        }
        Ok(owned)
    }

    async fn find_for_customer(
        &self,
        customer: IdentityId,
        entry: BasketEntryId,
    ) -> Result<Option<BasketLine>, BasketPersistenceError> {
        self.available(BasketPersistenceError::connection)?;
        let state = lock(&self.state);
        Ok(state
            .basket
            .get(&entry.get())
            .filter(|record| record.customer == customer.get())
            .and_then(|record| state.basket_line(entry.get(), record)))
    }

    async fn list_for_customer(
        &self,
        customer: IdentityId,
    ) -> Result<Vec<BasketLine>, BasketPersistenceError> {
        self.available(BasketPersistenceError::connection)?;
        let state = lock(&self.state);
        Ok(state
            .basket
            .iter()
            .filter(|(_, record)| record.customer == customer.get())
            .filter_map(|(id, record)| state.basket_line(*id, record))
            .collect())
    }
}

/// Reversible "hasher" for tests: stores `plain$<password>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextHasher;

#[async_trait]
impl CredentialHasher for PlaintextHasher {
    async fn hash(&self, password: &Password) -> Result<CredentialHash, CredentialHasherError> {
        Ok(CredentialHash::new(format!(
            "{PLAINTEXT_PREFIX}{}",
            password.expose()
        )))
    }

    async fn verify(
        &self,
        password: &Password,
        hash: &CredentialHash,
    ) -> Result<bool, CredentialHasherError> {
        let stored = hash
            .as_str()
            .strip_prefix(PLAINTEXT_PREFIX)
            .ok_or_else(|| CredentialHasherError::malformed_hash("missing plaintext prefix"))?;
        Ok(stored == password.expose())
    }
}

/// Deterministic token source producing distinct, well-formed tokens.
#[derive(Debug, Default)]
pub struct SequentialTokenGenerator {
    counter: AtomicU64,
}

impl SessionTokenGenerator for SequentialTokenGenerator {
    fn generate(&self) -> Result<SessionToken, SessionTokenGeneratorError> {
        let next = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        SessionToken::parse(&format!("{next:064x}"))
            .map_err(|err| SessionTokenGeneratorError::entropy(err.to_string()))
    }
}

/// Domain services wired to one shared [`InMemoryStore`].
#[derive(Clone)]
pub struct InMemoryServices {
    pub store: Arc<InMemoryStore>,
    pub sessions: Arc<SessionAuthenticator>,
    pub accounts: Arc<AccountService>,
    pub announcements: Arc<AnnouncementService>,
    pub basket: Arc<BasketService>,
}

impl InMemoryServices {
    /// Wire every service to `store` with the plaintext hasher and
    /// sequential token generator.
    #[must_use]
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        let hasher: Arc<dyn CredentialHasher> = Arc::new(PlaintextHasher);
        Self {
            sessions: Arc::new(SessionAuthenticator::new(
                store.clone(),
                hasher.clone(),
                Arc::new(SequentialTokenGenerator::default()),
            )),
            accounts: Arc::new(AccountService::new(store.clone(), hasher)),
            announcements: Arc::new(AnnouncementService::new(store.clone())),
            basket: Arc::new(BasketService::new(store.clone())),
            store,
        }
    }

    /// HTTP adapter state over these services.
    #[must_use]
    pub fn http_state(&self) -> HttpState {
        HttpState::from_services(
            self.sessions.clone(),
            self.accounts.clone(),
            self.announcements.clone(),
            self.basket.clone(),
        )
    }
}
