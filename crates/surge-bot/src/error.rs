//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Executor error: {0}")]
    Executor(#[from] surge_feed::ExecutorError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] surge_telemetry::TelemetryError),

    #[error("Replay parse error: {0}")]
    Replay(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
