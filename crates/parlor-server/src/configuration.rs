use std::net::SocketAddr;
use std::time::Duration;

use config::{Config, Environment};
use parlor::normalize::SenderRule;
use parlor::reply::ReplyPolicy;
use serde::Deserialize;

use crate::error::{to_env_var, ConfigError};

#[derive(Debug, Default, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Failed to parse socket address")
    }
}

/// Connection settings for the remote agent platform.
#[derive(Debug, Deserialize)]
pub struct PlatformSettings {
    pub base_url: String,
    pub api_key: String,
    /// Fixed bot identity; when unset, any sender other than the requesting
    /// user is classified as the agent.
    #[serde(default)]
    pub bot_id: Option<String>,
}

impl PlatformSettings {
    pub fn sender_rule(&self) -> SenderRule {
        match &self.bot_id {
            Some(bot_id) => SenderRule::BotId(bot_id.clone()),
            None => SenderRule::NotRequester,
        }
    }
}

/// Reply-aggregation tunables, all optional with the library defaults.
#[derive(Debug, Deserialize)]
pub struct ReplySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_quiet_polls")]
    pub max_quiet_polls: u32,
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: u32,
}

impl Default for ReplySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
            max_quiet_polls: default_max_quiet_polls(),
            fetch_limit: default_fetch_limit(),
        }
    }
}

impl ReplySettings {
    pub fn to_policy(&self) -> ReplyPolicy {
        ReplyPolicy {
            max_attempts: self.max_attempts,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_quiet_polls: self.max_quiet_polls,
            fetch_limit: self.fetch_limit,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub platform: PlatformSettings,
    #[serde(default)]
    pub reply: ReplySettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .add_source(
                Environment::with_prefix("PARLOR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        // Missing required fields are reported as the env var to set.
        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches("`");
                    let env_var = to_env_var(field);
                    Err(ConfigError::MissingEnvVar { env_var })
                } else if let config::ConfigError::NotFound(field) = &err {
                    let env_var = to_env_var(field);
                    Err(ConfigError::MissingEnvVar { env_var })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_attempts() -> u32 {
    15
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_quiet_polls() -> u32 {
    3
}

fn default_fetch_limit() -> u32 {
    10
}
