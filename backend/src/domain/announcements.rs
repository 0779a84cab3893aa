//! Announcement (broadcast message) data model.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::IdentityId;

/// Maximum accepted announcement length in characters.
pub const ANNOUNCEMENT_MAX: usize = 4000;

/// Validation errors for announcement inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnnouncementValidationError {
    #[error("announcement text must not be empty")]
    EmptyText,
    #[error("announcement text must be at most {max} characters")]
    TextTooLong { max: usize },
    #[error("recipient list must not be empty")]
    NoRecipients,
    #[error("message id must be positive")]
    NonPositiveMessageId,
}

/// Database identifier of a message row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct MessageId(i64);

impl MessageId {
    /// Validate and construct an identifier.
    pub fn new(raw: i64) -> Result<Self, AnnouncementValidationError> {
        if raw <= 0 {
            return Err(AnnouncementValidationError::NonPositiveMessageId);
        }
        Ok(Self(raw))
    }

    /// Raw column value.
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for MessageId {
    type Error = AnnouncementValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MessageId> for i64 {
    fn from(value: MessageId) -> Self {
        value.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-empty announcement body. Surrounding whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementText(String);

impl AnnouncementText {
    /// Validate and construct the announcement body.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, AnnouncementValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(AnnouncementValidationError::EmptyText);
        }
        if trimmed.chars().count() > ANNOUNCEMENT_MAX {
            return Err(AnnouncementValidationError::TextTooLong {
                max: ANNOUNCEMENT_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for AnnouncementText {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Target recipient set of a broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastAudience {
    /// Every identity that is active when the broadcast commits.
    AllActive,
    /// A caller-supplied, de-duplicated, non-empty id set.
    Explicit(BTreeSet<IdentityId>),
}

impl BroadcastAudience {
    /// Build an explicit audience, collapsing duplicate ids.
    ///
    /// # Examples
    /// ```
    /// use gymdesk::domain::{BroadcastAudience, IdentityId};
    ///
    /// let ids = [3, 1, 3].map(|raw| IdentityId::new(raw).unwrap());
    /// let audience = BroadcastAudience::explicit(ids).unwrap();
    /// assert!(matches!(audience, BroadcastAudience::Explicit(set) if set.len() == 2));
    /// ```
    pub fn explicit(
        ids: impl IntoIterator<Item = IdentityId>,
    ) -> Result<Self, AnnouncementValidationError> {
        let set: BTreeSet<IdentityId> = ids.into_iter().collect();
        if set.is_empty() {
            return Err(AnnouncementValidationError::NoRecipients);
        }
        Ok(Self::Explicit(set))
    }
}

/// Outcome of a committed broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReceipt {
    pub message_id: MessageId,
    pub recipient_count: usize,
}

/// An announcement as seen by one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxAnnouncement {
    pub id: MessageId,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

/// An announcement with delivery statistics, for administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementSummary {
    pub id: MessageId,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub recipient_count: u64,
    pub read_count: u64,
}
