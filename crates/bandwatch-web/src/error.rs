use std::net::SocketAddr;

use thiserror::Error;

/// Server startup failures mapped to process exit codes.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Validation(#[from] bandwatch_core::ValidationError),

    #[error("invalid log filter '{filter}': {message}")]
    LogFilter { filter: String, message: String },

    #[error("failed to install log subscriber: {0}")]
    Logging(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::LogFilter { .. } => 2,
            Self::Logging(_) => 6,
            Self::Bind { .. } => 10,
            Self::Io(_) => 10,
        }
    }
}
