pub mod client;
pub mod types;

pub use client::RemoteClient;
pub use types::{RawMessage, RawPayload, SentReceipt};
