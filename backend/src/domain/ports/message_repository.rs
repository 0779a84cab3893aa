//! Port abstraction for announcement persistence and read receipts.
use async_trait::async_trait;

use crate::domain::{
    AnnouncementSummary, AnnouncementText, BroadcastAudience, BroadcastReceipt, IdentityId,
    InboxAnnouncement, MessageId,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by message repository adapters.
    pub enum MessagePersistenceError {
        /// Repository connection could not be established or timed out.
        Connection { message: String } => "message repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "message repository query failed: {message}",
        /// A receipt referenced an identity that does not exist.
        UnknownRecipient => "broadcast referenced an unknown recipient",
    }
}

/// Message store port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Insert the message and one unread receipt per recipient as a single
    /// transaction. On any error nothing is persisted.
    async fn create_broadcast(
        &self,
        text: &AnnouncementText,
        audience: &BroadcastAudience,
    ) -> Result<BroadcastReceipt, MessagePersistenceError>;

    /// Flag the receipt for (`recipient`, `message`) as read. Missing
    /// receipts are ignored.
    async fn mark_read(
        &self,
        recipient: IdentityId,
        message: MessageId,
    ) -> Result<(), MessagePersistenceError>;

    /// Flag every receipt of `recipient` as read and return how many changed.
    async fn mark_all_read(&self, recipient: IdentityId) -> Result<u64, MessagePersistenceError>;

    /// Announcements addressed to `recipient`, newest first.
    async fn list_for_recipient(
        &self,
        recipient: IdentityId,
    ) -> Result<Vec<InboxAnnouncement>, MessagePersistenceError>;

    /// Every announcement with delivery counts, newest first.
    async fn list_all(&self) -> Result<Vec<AnnouncementSummary>, MessagePersistenceError>;
}
