//! Error types for configuration operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration")]
    Load(#[from] confy::ConfyError),

    #[error("failed to load configuration from {}", .path.display())]
    LoadPath {
        path: PathBuf,
        #[source]
        source: confy::ConfyError,
    },
}
