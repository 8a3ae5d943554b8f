//! Error taxonomy (spec.md §7), one `thiserror` enum per component
//! boundary, matching the split the teacher SDK uses for `TwzrdError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required configuration `{0}` is missing")]
    Missing(&'static str),
    #[error("configuration `{0}` could not be parsed: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Error)]
pub enum KvError {
    #[error("kv transport error: {0}")]
    Transport(String),
    #[error("kv value for key `{0}` could not be decoded: {1}")]
    Decode(String, String),
}

#[derive(Debug, Error)]
pub enum BusError {
    #[error("bus transport error: {0}")]
    Transport(String),
    #[error("request to `{0}` timed out waiting for a reply")]
    AckTimeout(String),
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("transient rpc error calling {endpoint}: {source}")]
    Transient {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("box `{0}` not found (spent or unknown)")]
    NotFound(String),
    #[error("wallet is locked")]
    WalletLocked,
    #[error("node rejected submission: {0}")]
    SubmitRejected(String),
    #[error("response body could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("malformed register value `{value}`: {reason}")]
    Malformed { value: String, reason: String },
}

#[derive(Debug, Error)]
pub enum PayoutError {
    #[error(transparent)]
    Kv(#[from] KvError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Register(#[from] RegisterError),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Kv(#[from] KvError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error("malformed NotConfirmed entry `{0}`")]
    MalformedEntry(String),
    #[error("no bet record for `{0}`")]
    MissingBet(String),
}
