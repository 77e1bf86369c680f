//! Driver error taxonomy and exit status mapping.

use thiserror::Error;

use crate::chain::ChainError;
use crate::config::ConfigError;

/// Exit status after a normal run.
pub const EXIT_SUCCESS: u8 = 0;

/// Exit status after any failure.
pub const EXIT_FAILURE: u8 = 1;

/// Anything that aborts a run.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Configuration could not be loaded or is invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The node or the client library reported a failure.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Console output could not be written.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    /// A value could not be rendered for output.
    #[error("Render error: {0}")]
    Render(#[from] serde_json::Error),
}

impl DriverError {
    /// Short category label for the final error line.
    pub fn kind(&self) -> &'static str {
        match self {
            DriverError::Config(_) => "config",
            DriverError::Chain(e) => e.kind(),
            DriverError::Output(_) => "output",
            DriverError::Render(_) => "render",
        }
    }
}

/// Map a run outcome to the process exit status.
pub fn exit_status<T>(outcome: &Result<T, DriverError>) -> u8 {
    match outcome {
        Ok(_) => EXIT_SUCCESS,
        Err(_) => EXIT_FAILURE,
    }
}
