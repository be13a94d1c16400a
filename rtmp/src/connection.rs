use crate::messages::RtmpMessage;
use crate::session::RtmpSession;
use std::sync::Arc;
use thiserror::Error;

/// A shared handle onto a peer connection.
pub type ConnectionRef = Arc<dyn ConnectionHandle>;

/// Reported by the transport when a flushed write was not accepted.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Connection write failed: {reason}")]
pub struct WriteError {
    pub reason: String,
}

impl WriteError {
    pub fn new<S: Into<String>>(reason: S) -> WriteError {
        WriteError {
            reason: reason.into(),
        }
    }
}

/// The capability a transport layer provides for each peer connection.
///
/// The broker core never touches sockets; it queues logical messages onto
/// this handle and the transport chunks them out.  Implementations must be
/// callable from any connection's processing context, since fan-out writes
/// to a subscriber happen on the publisher's side.
pub trait ConnectionHandle: Send + Sync {
    /// Stable identity for registry bookkeeping.  Two handles onto the same
    /// underlying connection must report the same id.
    fn id(&self) -> u64;

    /// The broker session attached to this connection.
    fn session(&self) -> &RtmpSession;

    /// Queues a message without forcing a flush.
    fn write(&self, message: RtmpMessage);

    /// Queues a message and flushes the outbound buffer, reporting whether
    /// the transport accepted the data.
    fn write_and_flush(&self, message: RtmpMessage) -> Result<(), WriteError>;

    /// Asks the transport to tear the connection down.
    fn close(&self);

    /// True once the connection is gone; pending readiness callbacks check
    /// this so they can drop their buffers instead of writing.
    fn is_closed(&self) -> bool;
}
