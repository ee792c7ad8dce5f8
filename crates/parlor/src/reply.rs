//! Reply aggregation: poll the conversation log after a send until the
//! agent's (possibly multi-part) answer looks complete.
//!
//! The platform has no push channel and no "turn finished" marker, so this is
//! a heuristic convergence detector over an eventually-consistent message
//! list, not a delivery guarantee. The heuristics:
//!
//! - a batch that is exactly one text message is a complete reply;
//! - a batch mixing text with media (image or carousel) is a complete reply,
//!   covering agents that send a caption and attachment a beat apart;
//! - once something was collected, [`ReplyPolicy::max_quiet_polls`] polls
//!   with nothing new means the agent has gone quiet and we return what we
//!   have.
//!
//! If the attempt budget runs out with a partial answer collected, the
//! partial answer is returned rather than an error.

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::sleep;

use crate::errors::{ParlorError, ParlorResult};
use crate::normalize::SenderRule;
use crate::remote::types::{RawMessage, SentReceipt};
use crate::remote::RemoteClient;
use crate::session::Session;

/// Tunables for the polling loop. Defaults bound a request to roughly
/// fifteen seconds of wall clock.
#[derive(Debug, Clone)]
pub struct ReplyPolicy {
    /// Total poll iterations before giving up.
    pub max_attempts: u32,
    /// Pause before each poll.
    pub poll_interval: Duration,
    /// Consecutive empty polls after which a non-empty reply is considered
    /// finished.
    pub max_quiet_polls: u32,
    /// How many recent messages to fetch per poll.
    pub fetch_limit: u32,
}

impl Default for ReplyPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            poll_interval: Duration::from_millis(1000),
            max_quiet_polls: 3,
            fetch_limit: 10,
        }
    }
}

/// Per-request bookkeeping. Never shared across requests: two tabs polling
/// the same conversation each run their own chain.
#[derive(Debug)]
struct PollState {
    /// Every message id observed so far, seeded with the user's own send.
    /// The log re-lists whole batches on every poll, so suppressing only the
    /// newest id would let earlier members of a multi-message batch back in.
    seen_ids: HashSet<String>,
    collected: Vec<RawMessage>,
    quiet_polls: u32,
    attempt: u32,
}

impl PollState {
    fn new(sent_id: String) -> Self {
        Self {
            seen_ids: HashSet::from([sent_id]),
            collected: Vec::new(),
            quiet_polls: 0,
            attempt: 0,
        }
    }
}

/// Poll the log until the agent's reply to `sent` is complete under the
/// heuristics above. Returns the collected agent messages in `createdAt`
/// order, or [`ParlorError::ResponseTimeout`] when nothing arrived within
/// the budget.
///
/// Individual poll failures against the platform are logged and treated as
/// empty iterations; a transient upstream hiccup should not discard an
/// otherwise successful wait.
pub async fn await_reply(
    client: &RemoteClient,
    session: &Session,
    sent: &SentReceipt,
    rule: &SenderRule,
    policy: &ReplyPolicy,
) -> ParlorResult<Vec<RawMessage>> {
    let mut state = PollState::new(sent.id.clone());

    while state.attempt < policy.max_attempts {
        sleep(policy.poll_interval).await;

        let fetched = match client
            .list_messages(&session.identity, &session.conversation, policy.fetch_limit)
            .await
        {
            Ok(messages) => messages,
            Err(err) => {
                tracing::warn!(error = %err, attempt = state.attempt, "poll failed; treating as empty");
                Vec::new()
            }
        };

        // De-duplication and staleness guard: only agent messages we have
        // not observed before, created after our own send.
        let mut fresh: Vec<RawMessage> = fetched
            .into_iter()
            .filter(|msg| {
                rule.is_agent(msg.user_id.as_deref(), &session.identity)
                    && !state.seen_ids.contains(&msg.id)
                    && msg.created_at > sent.created_at
            })
            .collect();
        fresh.sort_by_key(|msg| msg.created_at);

        if !fresh.is_empty() {
            for msg in &fresh {
                state.seen_ids.insert(msg.id.clone());
            }

            let valid: Vec<RawMessage> = fresh
                .into_iter()
                .filter(|msg| msg.payload.as_ref().is_some_and(|p| p.is_substantive()))
                .collect();

            if !valid.is_empty() {
                state.quiet_polls = 0;
                let complete = batch_is_complete(&valid);
                state.collected.extend(valid);
                if complete {
                    tracing::debug!(
                        total = state.collected.len(),
                        attempt = state.attempt,
                        "reply complete"
                    );
                    return Ok(state.collected);
                }
            }
        } else {
            state.quiet_polls += 1;
            if !state.collected.is_empty() && state.quiet_polls >= policy.max_quiet_polls {
                tracing::debug!(
                    total = state.collected.len(),
                    attempt = state.attempt,
                    "agent went quiet; reply assumed complete"
                );
                return Ok(state.collected);
            }
        }

        state.attempt += 1;
    }

    if state.collected.is_empty() {
        Err(ParlorError::ResponseTimeout)
    } else {
        // Budget exhausted mid-reply: surface what the agent did say.
        tracing::debug!(total = state.collected.len(), "attempt budget exhausted; returning partial reply");
        Ok(state.collected)
    }
}

/// Completion rules over one round's valid batch.
fn batch_is_complete(batch: &[RawMessage]) -> bool {
    let has_text = batch.iter().any(|msg| payload_kind(msg) == Kind::Text);
    let has_media = batch.iter().any(|msg| payload_kind(msg) == Kind::Media);

    let simple_text = batch.len() == 1 && has_text;
    let text_and_media = has_text && has_media;
    simple_text || text_and_media
}

#[derive(PartialEq)]
enum Kind {
    Text,
    Media,
}

fn payload_kind(msg: &RawMessage) -> Kind {
    match msg.payload.as_ref().and_then(|p| p.kind.as_deref()) {
        Some("image") | Some("carousel") => Kind::Media,
        _ => Kind::Text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CONVERSATION_PATH: &str = "/conversations/c-1/messages";

    fn test_policy(max_attempts: u32) -> ReplyPolicy {
        ReplyPolicy {
            max_attempts,
            poll_interval: Duration::from_millis(5),
            ..ReplyPolicy::default()
        }
    }

    fn session() -> Session {
        Session {
            identity: "u-1".to_string(),
            conversation: "c-1".to_string(),
        }
    }

    fn sent() -> SentReceipt {
        serde_json::from_value(json!({"id": "m-sent", "createdAt": "2024-05-01T12:00:00Z"}))
            .unwrap()
    }

    fn text_message(id: &str, created_at: &str, text: &str) -> Value {
        json!({
            "id": id,
            "userId": "bot",
            "createdAt": created_at,
            "payload": {"type": "text", "text": text}
        })
    }

    fn carousel_message(id: &str, created_at: &str) -> Value {
        json!({
            "id": id,
            "userId": "bot",
            "createdAt": created_at,
            "payload": {"type": "carousel", "items": [
                {"title": "Card", "imageUrl": "https://cdn.example/c.png", "actions": []}
            ]}
        })
    }

    fn image_message(id: &str, created_at: &str) -> Value {
        json!({
            "id": id,
            "userId": "bot",
            "createdAt": created_at,
            "payload": {"type": "image", "image": "https://cdn.example/i.png"}
        })
    }

    /// Mounts a response for the next `times` polls; later mounts take over
    /// once earlier ones are exhausted.
    async fn mount_polls(server: &MockServer, messages: Vec<Value>, times: u64) {
        Mock::given(method("GET"))
            .and(path(CONVERSATION_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"messages": messages})),
            )
            .up_to_n_times(times)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_single_text_completes_immediately() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CONVERSATION_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [text_message("m-2", "2024-05-01T12:00:01Z", "hi")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RemoteClient::new(server.uri(), "k")?;
        let reply = await_reply(
            &client,
            &session(),
            &sent(),
            &SenderRule::NotRequester,
            &test_policy(15),
        )
        .await?;

        assert_eq!(reply.len(), 1);
        assert_eq!(reply[0].id, "m-2");
        // expect(1) on the mock verifies polling stopped after completion.
        Ok(())
    }

    #[tokio::test]
    async fn test_echo_of_sent_message_is_ignored() -> Result<()> {
        let server = MockServer::start().await;
        // Poll 1 returns only the user's own message; poll 2 the reply.
        mount_polls(
            &server,
            vec![json!({
                "id": "m-sent",
                "userId": "u-1",
                "createdAt": "2024-05-01T12:00:00Z",
                "payload": {"type": "text", "text": "question"}
            })],
            1,
        )
        .await;
        mount_polls(
            &server,
            vec![text_message("m-2", "2024-05-01T12:00:01Z", "hi")],
            u64::MAX,
        )
        .await;

        let client = RemoteClient::new(server.uri(), "k")?;
        let reply = await_reply(
            &client,
            &session(),
            &sent(),
            &SenderRule::NotRequester,
            &test_policy(15),
        )
        .await?;

        assert_eq!(reply.len(), 1);
        assert_eq!(reply[0].id, "m-2");
        Ok(())
    }

    #[tokio::test]
    async fn test_text_with_carousel_returned_in_timestamp_order() -> Result<()> {
        let server = MockServer::start().await;
        // Listed newest-first, as the platform does.
        mount_polls(
            &server,
            vec![
                carousel_message("m-3", "2024-05-01T12:00:02Z"),
                text_message("m-2", "2024-05-01T12:00:01Z", "here are some options"),
            ],
            u64::MAX,
        )
        .await;

        let client = RemoteClient::new(server.uri(), "k")?;
        let reply = await_reply(
            &client,
            &session(),
            &sent(),
            &SenderRule::NotRequester,
            &test_policy(15),
        )
        .await?;

        let ids: Vec<&str> = reply.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m-2", "m-3"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_text_then_carousel_across_polls() -> Result<()> {
        let server = MockServer::start().await;
        // A lone text plus a trailing media message is not yet complete when
        // the media arrives first; the text in a later poll closes it.
        mount_polls(
            &server,
            vec![carousel_message("m-2", "2024-05-01T12:00:01Z")],
            1,
        )
        .await;
        mount_polls(
            &server,
            vec![
                text_message("m-3", "2024-05-01T12:00:02Z", "those are our rooms"),
                carousel_message("m-2", "2024-05-01T12:00:01Z"),
            ],
            u64::MAX,
        )
        .await;

        let client = RemoteClient::new(server.uri(), "k")?;
        let reply = await_reply(
            &client,
            &session(),
            &sent(),
            &SenderRule::NotRequester,
            &test_policy(15),
        )
        .await?;

        let ids: Vec<&str> = reply.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m-2", "m-3"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_no_reply_times_out_after_budget() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CONVERSATION_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messages": []})))
            .expect(4)
            .mount(&server)
            .await;

        let client = RemoteClient::new(server.uri(), "k")?;
        let err = await_reply(
            &client,
            &session(),
            &sent(),
            &SenderRule::NotRequester,
            &test_policy(4),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ParlorError::ResponseTimeout));
        Ok(())
    }

    #[tokio::test]
    async fn test_quiet_polls_finish_a_media_only_reply() -> Result<()> {
        let server = MockServer::start().await;
        // One carousel (no completion rule fires), then silence. The same
        // message keeps appearing in the log and must stay suppressed.
        mount_polls(
            &server,
            vec![carousel_message("m-2", "2024-05-01T12:00:01Z")],
            u64::MAX,
        )
        .await;

        let client = RemoteClient::new(server.uri(), "k")?;
        let policy = test_policy(15);
        let reply = await_reply(
            &client,
            &session(),
            &sent(),
            &SenderRule::NotRequester,
            &policy,
        )
        .await?;

        assert_eq!(reply.len(), 1);
        assert_eq!(reply[0].id, "m-2");
        // 1 productive poll + max_quiet_polls quiet ones.
        assert_eq!(
            server.received_requests().await.unwrap().len() as u32,
            1 + policy.max_quiet_polls
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_repeated_two_text_batch_is_not_recollected() -> Result<()> {
        let server = MockServer::start().await;
        // The log permanently re-lists a two-text batch. Every member must
        // stay suppressed on later polls, not just the newest one, and the
        // reply then finishes by silence with each message exactly once.
        mount_polls(
            &server,
            vec![
                text_message("m-3", "2024-05-01T12:00:02Z", "second part"),
                text_message("m-2", "2024-05-01T12:00:01Z", "first part"),
            ],
            u64::MAX,
        )
        .await;

        let client = RemoteClient::new(server.uri(), "k")?;
        let policy = test_policy(15);
        let reply = await_reply(
            &client,
            &session(),
            &sent(),
            &SenderRule::NotRequester,
            &policy,
        )
        .await?;

        let ids: Vec<&str> = reply.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m-2", "m-3"]);
        assert_eq!(
            server.received_requests().await.unwrap().len() as u32,
            1 + policy.max_quiet_polls
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_upstream_error_during_poll_is_swallowed() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CONVERSATION_PATH))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_polls(
            &server,
            vec![text_message("m-2", "2024-05-01T12:00:01Z", "recovered")],
            u64::MAX,
        )
        .await;

        let client = RemoteClient::new(server.uri(), "k")?;
        let reply = await_reply(
            &client,
            &session(),
            &sent(),
            &SenderRule::NotRequester,
            &test_policy(15),
        )
        .await?;

        assert_eq!(reply.len(), 1);
        assert_eq!(reply[0].id, "m-2");
        Ok(())
    }

    #[tokio::test]
    async fn test_exhausted_budget_returns_partial_reply() -> Result<()> {
        let server = MockServer::start().await;
        // A new image every poll: never complete, never quiet.
        mount_polls(&server, vec![image_message("m-2", "2024-05-01T12:00:01Z")], 1).await;
        mount_polls(&server, vec![image_message("m-3", "2024-05-01T12:00:02Z")], 1).await;
        mount_polls(&server, vec![image_message("m-4", "2024-05-01T12:00:03Z")], 1).await;

        let client = RemoteClient::new(server.uri(), "k")?;
        let reply = await_reply(
            &client,
            &session(),
            &sent(),
            &SenderRule::NotRequester,
            &test_policy(3),
        )
        .await?;

        let ids: Vec<&str> = reply.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m-2", "m-3", "m-4"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_history_is_excluded() -> Result<()> {
        let server = MockServer::start().await;
        // Agent message from before the user's send must not count.
        mount_polls(
            &server,
            vec![
                text_message("m-old", "2024-05-01T11:59:00Z", "earlier turn"),
                text_message("m-2", "2024-05-01T12:00:01Z", "fresh"),
            ],
            u64::MAX,
        )
        .await;

        let client = RemoteClient::new(server.uri(), "k")?;
        let reply = await_reply(
            &client,
            &session(),
            &sent(),
            &SenderRule::NotRequester,
            &test_policy(15),
        )
        .await?;

        // Batch is exactly one fresh text, so it completes as a simple reply.
        assert_eq!(reply.len(), 1);
        assert_eq!(reply[0].id, "m-2");
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_payloads_advance_cursor_without_collecting() -> Result<()> {
        let server = MockServer::start().await;
        // An empty text payload advances last-seen but collects nothing,
        // then the agent goes silent: timeout, not a phantom reply.
        mount_polls(
            &server,
            vec![text_message("m-2", "2024-05-01T12:00:01Z", "")],
            u64::MAX,
        )
        .await;

        let client = RemoteClient::new(server.uri(), "k")?;
        let err = await_reply(
            &client,
            &session(),
            &sent(),
            &SenderRule::NotRequester,
            &test_policy(5),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ParlorError::ResponseTimeout));
        Ok(())
    }

    #[tokio::test]
    async fn test_bot_id_rule_filters_other_humans() -> Result<()> {
        let server = MockServer::start().await;
        let other_human = json!({
            "id": "m-2",
            "userId": "u-2",
            "createdAt": "2024-05-01T12:00:01Z",
            "payload": {"type": "text", "text": "another tab"}
        });
        mount_polls(&server, vec![other_human], 1).await;
        mount_polls(
            &server,
            vec![json!({
                "id": "m-3",
                "userId": "bot-7",
                "createdAt": "2024-05-01T12:00:02Z",
                "payload": {"type": "text", "text": "from the bot"}
            })],
            u64::MAX,
        )
        .await;

        let client = RemoteClient::new(server.uri(), "k")?;
        let reply = await_reply(
            &client,
            &session(),
            &sent(),
            &SenderRule::BotId("bot-7".to_string()),
            &test_policy(15),
        )
        .await?;

        assert_eq!(reply.len(), 1);
        assert_eq!(reply[0].id, "m-3");
        Ok(())
    }
}
