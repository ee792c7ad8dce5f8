use std::fmt;

use thiserror::Error;

/// Which bootstrap call against the platform failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStage {
    Identity,
    Conversation,
}

impl fmt::Display for BootstrapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapStage::Identity => write!(f, "identity"),
            BootstrapStage::Conversation => write!(f, "conversation"),
        }
    }
}

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ParlorError {
    #[error("could not bootstrap {stage} against the platform (upstream status {status:?})")]
    SessionBootstrap {
        stage: BootstrapStage,
        status: Option<u16>,
    },

    #[error("could not deliver the user message (upstream status {status:?})")]
    MessageSend { status: Option<u16> },

    #[error("no agent reply observed within the polling budget")]
    ResponseTimeout,

    #[error("platform returned status {status}")]
    UpstreamStatus { status: u16 },

    #[error("request to platform failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected platform payload: {0}")]
    UnexpectedPayload(String),
}

impl ParlorError {
    /// Upstream HTTP status carried by this error, when one was observed.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ParlorError::UpstreamStatus { status } => Some(*status),
            ParlorError::SessionBootstrap { status, .. } => *status,
            ParlorError::MessageSend { status } => *status,
            ParlorError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type ParlorResult<T> = Result<T, ParlorError>;
