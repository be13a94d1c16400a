use relay_amf0::Amf0DeserializationError;
use thiserror::Error;

/// Encountered when an inbound message payload cannot be decoded
#[derive(Debug, Error)]
pub enum MessageDeserializationError {
    #[error("Failed to deserialize AMF0 values: {0}")]
    Amf0DeserializationError(#[from] Amf0DeserializationError),
}
