//! Error types for deckhand

use thiserror::Error;

/// Crate Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced at the crate's fallible boundaries.
///
/// The three core components (bridge, lifecycle manager, manifest
/// transforms) never return these; they convert every failure into
/// structured data. This type covers the IO and serialization edges
/// around them, plus the CLI.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("extension client error: {0}")]
    ExtensionClient(String),

    #[error("command failed: {message}")]
    CommandFailed { message: String },

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn invalid_manifest(message: impl Into<String>) -> Self {
        Error::InvalidManifest(message.into())
    }

    pub fn extension_client(message: impl Into<String>) -> Self {
        Error::ExtensionClient(message.into())
    }

    pub fn command_failed(message: impl Into<String>) -> Self {
        Error::CommandFailed {
            message: message.into(),
        }
    }
}
