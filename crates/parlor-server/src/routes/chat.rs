//! The browser-facing chat endpoints: send-and-wait and history.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use parlor::errors::{ParlorError, ParlorResult};
use parlor::models::Message;
use parlor::normalize::normalize;
use parlor::reply::await_reply;
use parlor::session;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::state::AppState;

const HISTORY_LIMIT: u32 = 50;

const TIMEOUT_TEXT: &str =
    "The assistant is taking longer than expected. Please try again.";
const FAILURE_TEXT: &str = "Unable to process your request. Please try again.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    messages: Vec<IncomingMessage>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    conversation_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IncomingMessage {
    #[serde(default)]
    #[allow(dead_code)]
    role: Option<String>,
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatResponse {
    role: &'static str,
    user_id: String,
    conversation_id: String,
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryParams {
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    messages: Vec<Message>,
}

/// Send the user's newest message and wait for the aggregated agent reply.
async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let Some(outgoing) = request.messages.last() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid request format"})),
        )
            .into_response();
    };

    match run_chat(
        &state,
        request.user_id.clone(),
        request.conversation_id.clone(),
        &outgoing.content,
    )
    .await
    {
        Ok(reply) => Json(reply).into_response(),
        Err(err) => failure_response(err),
    }
}

async fn run_chat(
    state: &AppState,
    existing_identity: Option<String>,
    existing_conversation: Option<String>,
    text: &str,
) -> ParlorResult<ChatResponse> {
    let session = session::resolve(&state.client, existing_identity, existing_conversation).await?;

    let receipt = state
        .client
        .post_message(&session.identity, &session.conversation, text)
        .await
        .map_err(|err| ParlorError::MessageSend {
            status: err.upstream_status(),
        })?;

    let raw = await_reply(
        &state.client,
        &session,
        &receipt,
        &state.sender_rule,
        &state.reply_policy,
    )
    .await?;

    let messages = raw
        .iter()
        .filter_map(|msg| normalize(msg, &session.identity, &state.sender_rule))
        .collect();

    Ok(ChatResponse {
        role: "assistant",
        user_id: session.identity,
        conversation_id: session.conversation,
        messages,
    })
}

/// Every internal failure resolves to the uniform widget-facing shape;
/// upstream bodies never reach the browser.
fn failure_response(err: ParlorError) -> Response {
    tracing::warn!(error = %err, "chat request failed");
    let (status, content) = match err {
        ParlorError::ResponseTimeout => (StatusCode::GATEWAY_TIMEOUT, TIMEOUT_TEXT),
        _ => (StatusCode::BAD_GATEWAY, FAILURE_TEXT),
    };
    (
        status,
        Json(json!({"role": "assistant", "content": content})),
    )
        .into_response()
}

/// Conversation history for an existing session, oldest first.
async fn history(State(state): State<AppState>, Query(params): Query<HistoryParams>) -> Response {
    let (Some(conversation_id), Some(user_id)) = (params.conversation_id, params.user_id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing required parameters"})),
        )
            .into_response();
    };

    match state
        .client
        .list_messages(&user_id, &conversation_id, HISTORY_LIMIT)
        .await
    {
        Ok(raw) => {
            // Platform lists newest first; the widget renders top-down.
            let mut messages: Vec<Message> = raw
                .iter()
                .filter_map(|msg| normalize(msg, &user_id, &state.sender_rule))
                .collect();
            messages.reverse();
            Json(HistoryResponse { messages }).into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "history request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Unable to load chat history"})),
            )
                .into_response()
        }
    }
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(send_message).get(history))
        .with_state(state)
}
