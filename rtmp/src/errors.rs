use crate::connection::WriteError;
use crate::messages::{MessageDeserializationError, MessageSerializationError};
use thiserror::Error;

/// Error raised while executing broker semantics against a connection.
///
/// Apart from `PublisherFailed`, which is only ever logged, every variant
/// causes the dispatcher to close the offending connection.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The AMF0 payload was empty, had the wrong arity, or carried the
    /// wrong value type at an expected position
    #[error("Malformed command payload: {0}")]
    MalformedCommand(String),

    /// A second publisher attempted to claim a stream key that already has
    /// an active publisher
    #[error("Stream key '{0}' already has an active publisher")]
    StreamKeyInUse(String),

    /// A subscriber requested a stream key no publisher is registered under
    #[error("No publisher registered for stream key '{0}'")]
    PublisherMissing(String),

    /// The publisher went away before caching its first key frame
    #[error("Publisher for stream key '{0}' failed before completing")]
    PublisherFailed(String),

    /// A command that is recognized but deliberately not served; the
    /// protocol state is unknown afterwards so the connection is dropped
    #[error("Unsupported command: {0}")]
    Unsupported(String),

    #[error(transparent)]
    WriteFailed(#[from] WriteError),

    #[error(transparent)]
    Serialization(#[from] MessageSerializationError),
}

impl From<MessageDeserializationError> for BrokerError {
    fn from(error: MessageDeserializationError) -> Self {
        BrokerError::MalformedCommand(error.to_string())
    }
}
