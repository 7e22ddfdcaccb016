use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("machine disconnected")]
    Disconnected,
    #[error("telemetry timeout")]
    Timeout,
    #[error("stop command rejected: {0}")]
    StopRejected(String),
    #[error("simulator state poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, HwError>;
