use relay_amf0::Amf0SerializationError;
use std::io;
use thiserror::Error;

/// Encountered when an outbound message payload cannot be produced
#[derive(Debug, Error)]
pub enum MessageSerializationError {
    #[error("Failed to serialize AMF0 values: {0}")]
    Amf0SerializationError(#[from] Amf0SerializationError),

    #[error("Failed to write to the payload buffer: {0}")]
    BufferWriteError(#[from] io::Error),
}
