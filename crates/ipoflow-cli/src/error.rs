use ipoflow_core::{ResolveError, ValidationError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Resolve(error) => match error {
                ResolveError::NoData { .. } => 3,
                ResolveError::RateLimited { .. } => 4,
                ResolveError::Unavailable { .. } => 5,
                ResolveError::Validation(_) => 2,
            },
            Self::Serialization(_) => 6,
            Self::Io(_) => 10,
        }
    }
}
