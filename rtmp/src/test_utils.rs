//! Support types shared by the unit tests.

use crate::connection::{ConnectionHandle, WriteError};
use crate::messages::RtmpMessage;
use crate::session::RtmpSession;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An in-memory connection that records every message the broker writes to
/// it.  Flushes can be made to fail to exercise the write-failure paths.
pub struct TestConnection {
    id: u64,
    session: RtmpSession,
    written: Mutex<Vec<RtmpMessage>>,
    closed: AtomicBool,
    fail_flushes: AtomicBool,
}

impl TestConnection {
    pub fn create(id: u64) -> Arc<TestConnection> {
        Arc::new(TestConnection {
            id,
            session: RtmpSession::new(),
            written: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            fail_flushes: AtomicBool::new(false),
        })
    }

    pub fn written(&self) -> Vec<RtmpMessage> {
        self.written.lock().clone()
    }

    pub fn clear_written(&self) {
        self.written.lock().clear();
    }

    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Makes every subsequent `write_and_flush` fail; queued `write`s are
    /// unaffected, matching a transport whose flush is what surfaces
    /// errors.
    pub fn fail_flushes(&self, fail: bool) {
        self.fail_flushes.store(fail, Ordering::SeqCst);
    }
}

impl ConnectionHandle for TestConnection {
    fn id(&self) -> u64 {
        self.id
    }

    fn session(&self) -> &RtmpSession {
        &self.session
    }

    fn write(&self, message: RtmpMessage) {
        self.written.lock().push(message);
    }

    fn write_and_flush(&self, message: RtmpMessage) -> Result<(), WriteError> {
        if self.fail_flushes.load(Ordering::SeqCst) {
            return Err(WriteError::new("flush rejected by test transport"));
        }

        self.written.lock().push(message);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
