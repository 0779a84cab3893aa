//! Broadcast messaging engine.
//!
//! A broadcast writes one message and one unread receipt per recipient in a
//! single repository call; the adapter commits both or neither, so a caller
//! never sees a message id whose receipts are incomplete.

use std::sync::Arc;

use tracing::{debug, info};

use super::error_mapping::map_message_error;
use super::ports::MessageRepository;
use super::{
    AnnouncementSummary, AnnouncementText, BroadcastAudience, Error, Identity, IdentityId,
    InboxAnnouncement, MessageId, require_admin,
};

/// Domain service for announcements and their read receipts.
#[derive(Clone)]
pub struct AnnouncementService {
    messages: Arc<dyn MessageRepository>,
}

impl AnnouncementService {
    /// Create a new service over the message store.
    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    /// Send `text` to every identity active at commit time. Admin only.
    pub async fn broadcast_to_all(&self, actor: &Identity, text: &str) -> Result<MessageId, Error> {
        require_admin(actor)?;
        let text = parse_text(text)?;
        self.broadcast(actor, &text, &BroadcastAudience::AllActive)
            .await
    }

    /// Send `text` to an explicit recipient list. Admin only.
    ///
    /// Duplicate ids collapse to one receipt. An id with no identity behind
    /// it aborts the whole broadcast with `not_found`.
    pub async fn broadcast_to_recipients(
        &self,
        actor: &Identity,
        text: &str,
        recipient_ids: &[i64],
    ) -> Result<MessageId, Error> {
        require_admin(actor)?;
        let text = parse_text(text)?;
        let ids = recipient_ids
            .iter()
            .map(|raw| IdentityId::new(*raw))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let audience = BroadcastAudience::explicit(ids)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        self.broadcast(actor, &text, &audience).await
    }

    async fn broadcast(
        &self,
        actor: &Identity,
        text: &AnnouncementText,
        audience: &BroadcastAudience,
    ) -> Result<MessageId, Error> {
        let receipt = self
            .messages
            .create_broadcast(text, audience)
            .await
            .map_err(map_message_error)?;
        info!(
            actor_id = %actor.id,
            message_id = %receipt.message_id,
            recipient_count = receipt.recipient_count,
            "announcement broadcast"
        );
        Ok(receipt.message_id)
    }

    /// Flag one announcement as read for `recipient`. Idempotent; a message
    /// never addressed to the caller is silently ignored.
    pub async fn mark_read(&self, recipient: &Identity, message_id: i64) -> Result<(), Error> {
        let message =
            MessageId::new(message_id).map_err(|err| Error::invalid_request(err.to_string()))?;
        self.messages
            .mark_read(recipient.id, message)
            .await
            .map_err(map_message_error)?;
        debug!(identity_id = %recipient.id, message_id = %message, "announcement read");
        Ok(())
    }

    /// Flag every announcement of `recipient` as read.
    pub async fn mark_all_read(&self, recipient: &Identity) -> Result<u64, Error> {
        let changed = self
            .messages
            .mark_all_read(recipient.id)
            .await
            .map_err(map_message_error)?;
        debug!(identity_id = %recipient.id, changed, "announcements read");
        Ok(changed)
    }

    /// Announcements addressed to `recipient`, newest first.
    pub async fn list_for_recipient(
        &self,
        recipient: &Identity,
    ) -> Result<Vec<InboxAnnouncement>, Error> {
        self.messages
            .list_for_recipient(recipient.id)
            .await
            .map_err(map_message_error)
    }

    /// Every announcement with delivery counts. Admin only.
    pub async fn list_all(&self, actor: &Identity) -> Result<Vec<AnnouncementSummary>, Error> {
        require_admin(actor)?;
        self.messages.list_all().await.map_err(map_message_error)
    }
}

fn parse_text(raw: &str) -> Result<AnnouncementText, Error> {
    AnnouncementText::new(raw).map_err(|err| Error::invalid_request(err.to_string()))
}
