use std::path::PathBuf;

use thiserror::Error;

use crate::protocol::failure::Failure;

#[derive(Error, Debug)]
pub enum ProxrpcError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Encoding error: {0}")]
    Encoding(#[from] postcard::Error),

    #[error("Proxy stream truncated: {0}")]
    Truncated(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot load config file {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invocation failed: {0}")]
    Invocation(#[from] Failure),

    #[error("No invoker installed on the communicator")]
    NoInvoker,

    #[error("Communicator has been destroyed")]
    CommunicatorDestroyed,
}

impl ProxrpcError {
    /// Shorthand for a [`ProxrpcError::Parse`] built from anything printable.
    pub fn parse(msg: impl Into<String>) -> Self {
        ProxrpcError::Parse(msg.into())
    }

    /// Returns the invocation failure carried by this error, if any.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            ProxrpcError::Invocation(failure) => Some(failure),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProxrpcError>;
