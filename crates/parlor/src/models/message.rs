use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::payload::Payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A normalized conversation message.
///
/// `id` is assigned by the platform and is stable within a conversation;
/// `created_at` drives ordering and the "newer than the user's own message"
/// comparison in the reply aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    #[serde(flatten)]
    pub payload: Payload,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}
