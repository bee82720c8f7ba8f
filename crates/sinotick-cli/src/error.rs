use thiserror::Error;

use sinotick_core::{FetchFailure, HttpError, RouterError};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Router(#[from] RouterError),

    #[error("http client startup failed: {0}")]
    Startup(#[from] HttpError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Router(error) => match &error.cause {
                FetchFailure::Validation(_) => 2,
                FetchFailure::Transport(_) => 3,
                FetchFailure::Normalization(_) => 4,
            },
            Self::Startup(_) | Self::Serialization(_) | Self::Io(_) => 10,
        }
    }
}
