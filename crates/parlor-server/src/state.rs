use std::sync::Arc;

use parlor::normalize::SenderRule;
use parlor::remote::RemoteClient;
use parlor::reply::ReplyPolicy;

use crate::store::ConfigStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<RemoteClient>,
    pub sender_rule: SenderRule,
    pub reply_policy: ReplyPolicy,
    pub configs: Arc<dyn ConfigStore>,
}

impl AppState {
    pub fn new(
        client: RemoteClient,
        sender_rule: SenderRule,
        reply_policy: ReplyPolicy,
        configs: Arc<dyn ConfigStore>,
    ) -> Self {
        Self {
            client: Arc::new(client),
            sender_rule,
            reply_policy,
            configs,
        }
    }
}
