//! Wire types for the remote agent platform.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::CarouselItem;

/// A message as the platform returns it from the conversation log.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub payload: Option<RawPayload>,
}

/// Loosely-typed payload object: which fields are present depends on the
/// `type` discriminator, and the platform is not strict about it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPayload {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<CarouselItem>>,
}

impl RawPayload {
    pub fn is_carousel(&self) -> bool {
        self.kind.as_deref() == Some("carousel")
    }

    /// Whether this payload carries anything worth showing: non-empty text,
    /// an image URL, or a carousel with at least one card.
    pub fn is_substantive(&self) -> bool {
        let has_text = self.text.as_deref().is_some_and(|t| !t.is_empty());
        let has_image = self.image.as_deref().is_some_and(|i| !i.is_empty());
        let has_items = self.is_carousel() && self.items.as_deref().is_some_and(|i| !i.is_empty());
        has_text || has_image || has_items
    }
}

/// Receipt for a message this side posted: the platform-assigned id and
/// timestamp the reply aggregator keys its filters on.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentReceipt {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

// Response envelopes.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatedUser {
    pub key: String,
    #[serde(default)]
    #[allow(dead_code)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConversationEnvelope {
    pub conversation: ConversationRef,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConversationRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageEnvelope {
    pub message: SentReceipt,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesEnvelope {
    pub messages: Vec<RawMessage>,
}
