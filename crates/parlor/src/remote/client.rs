use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::types::{
    ConversationEnvelope, CreatedUser, MessageEnvelope, MessagesEnvelope, RawMessage, SentReceipt,
};
use crate::errors::{ParlorError, ParlorResult};

/// Thin HTTP client for the remote agent platform. Pure I/O: one method per
/// endpoint, no retry or aggregation logic.
pub struct RemoteClient {
    client: Client,
    host: String,
    api_key: String,
}

impl RemoteClient {
    pub fn new<S: Into<String>, K: Into<String>>(host: S, api_key: K) -> ParlorResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            host: host.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> ParlorResult<T> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ParlorError::UpstreamStatus {
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| ParlorError::UnexpectedPayload(err.to_string()))
    }

    /// `POST /users` — mint a new end-user identity. Returns the opaque key
    /// the platform expects back in the `x-user-id` header.
    pub async fn create_user(&self) -> ParlorResult<String> {
        let created: CreatedUser = self
            .execute(self.client.post(self.url("/users")).json(&json!({})))
            .await?;
        Ok(created.key)
    }

    /// `POST /conversations` — open a new conversation for `identity`.
    pub async fn create_conversation(&self, identity: &str) -> ParlorResult<String> {
        let envelope: ConversationEnvelope = self
            .execute(
                self.client
                    .post(self.url("/conversations"))
                    .header("x-user-id", identity)
                    .json(&json!({})),
            )
            .await?;
        Ok(envelope.conversation.id)
    }

    /// `POST /messages` — post a text message into `conversation` and return
    /// the platform's receipt for it.
    pub async fn post_message(
        &self,
        identity: &str,
        conversation: &str,
        text: &str,
    ) -> ParlorResult<SentReceipt> {
        let envelope: MessageEnvelope = self
            .execute(
                self.client
                    .post(self.url("/messages"))
                    .header("x-user-id", identity)
                    .json(&json!({
                        "conversationId": conversation,
                        "payload": {
                            "type": "text",
                            "text": text,
                        }
                    })),
            )
            .await?;
        Ok(envelope.message)
    }

    /// `GET /conversations/{id}/messages?limit=N` — most recent messages,
    /// newest first.
    pub async fn list_messages(
        &self,
        identity: &str,
        conversation: &str,
        limit: u32,
    ) -> ParlorResult<Vec<RawMessage>> {
        let envelope: MessagesEnvelope = self
            .execute(
                self.client
                    .get(self.url(&format!("/conversations/{}/messages", conversation)))
                    .query(&[("limit", limit)])
                    .header("x-user-id", identity),
            )
            .await?;
        Ok(envelope.messages)
    }
}
