use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrainerError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("timeout waiting for telemetry")]
    Timeout,
    #[error("stop command failed: {0}")]
    StopFailed(String),
    #[error("machine not connected")]
    NotConnected,
    #[error("plan has no items")]
    EmptyPlan,
    #[error("invalid state: {0}")]
    State(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing machine")]
    MissingMachine,
    #[error("missing history store")]
    MissingHistory,
    #[error("missing sample archive")]
    MissingArchive,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
