//! Idempotent identity/conversation bootstrap.

use crate::errors::{BootstrapStage, ParlorError, ParlorResult};
use crate::remote::RemoteClient;

/// A resolved identity/conversation pair. Both are opaque platform tokens;
/// the browser persists them and sends them back on subsequent requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: String,
    pub conversation: String,
}

/// Reuse the supplied identifiers or mint the missing ones. Supplied values
/// are trusted as-is, so a request with both set makes no network calls.
pub async fn resolve(
    client: &RemoteClient,
    existing_identity: Option<String>,
    existing_conversation: Option<String>,
) -> ParlorResult<Session> {
    let identity = match existing_identity {
        Some(identity) => identity,
        None => client
            .create_user()
            .await
            .map_err(|err| bootstrap_error(BootstrapStage::Identity, err))?,
    };

    let conversation = match existing_conversation {
        Some(conversation) => conversation,
        None => client
            .create_conversation(&identity)
            .await
            .map_err(|err| bootstrap_error(BootstrapStage::Conversation, err))?,
    };

    Ok(Session {
        identity,
        conversation,
    })
}

fn bootstrap_error(stage: BootstrapStage, err: ParlorError) -> ParlorError {
    ParlorError::SessionBootstrap {
        stage,
        status: err.upstream_status(),
    }
}
