//! Maps platform wire messages into the canonical [`Message`] shape.

use crate::models::{Message, Payload, Role};
use crate::remote::types::RawMessage;

/// Shown when a payload exists but carries neither text, image, nor cards.
pub const FALLBACK_TEXT: &str = "Message content unavailable";

/// How to decide whether a message came from the agent.
///
/// Deployments differ: some platforms expose a fixed bot identity, others
/// only let us say "anyone who is not the requesting user". One rule instance
/// is shared by the reply aggregator and the normalizer so classification
/// stays consistent within a conversation.
#[derive(Debug, Clone)]
pub enum SenderRule {
    /// The message's `userId` equals this configured bot identity.
    BotId(String),
    /// Any sender other than the requesting identity is the agent.
    NotRequester,
}

impl SenderRule {
    pub fn is_agent(&self, sender: Option<&str>, requester: &str) -> bool {
        match self {
            SenderRule::BotId(bot_id) => sender == Some(bot_id.as_str()),
            SenderRule::NotRequester => sender.is_some_and(|s| s != requester),
        }
    }
}

/// Convert a wire message into the canonical shape, or `None` when the
/// message carries no payload at all (system entries, delivery markers).
pub fn normalize(raw: &RawMessage, requester: &str, rule: &SenderRule) -> Option<Message> {
    let raw_payload = raw.payload.as_ref()?;

    let role = if rule.is_agent(raw.user_id.as_deref(), requester) {
        Role::Assistant
    } else {
        Role::User
    };

    let payload = if raw_payload.is_carousel() {
        Payload::Carousel(raw_payload.items.clone().unwrap_or_default())
    } else if let Some(image) = raw_payload.image.as_deref().filter(|i| !i.is_empty()) {
        Payload::Image(image.to_string())
    } else {
        let text = raw_payload
            .text
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(FALLBACK_TEXT);
        Payload::Text(text.to_string())
    };

    Some(Message {
        id: raw.id.clone(),
        role,
        payload,
        created_at: raw.created_at,
    })
}
