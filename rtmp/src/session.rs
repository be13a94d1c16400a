use crate::messages::RtmpMessage;
use parking_lot::Mutex;
use relay_amf0::Amf0Value;

/// What a connection turned out to be.  Assigned by the first `publish` or
/// `play` command and never changed afterwards.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SessionRole {
    Unassigned,
    Publisher,
    Subscriber,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SessionState {
    Initializing,
    Complete,
}

/// How a publisher's readiness resolved
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ReadyOutcome {
    Complete,
    Failed,
}

/// Per-connection broker state.
///
/// A publisher session additionally caches the stream metadata and the
/// first video key frame so late subscribers can start decoding; both are
/// written once by the publisher's own message processing and only read by
/// other connections after [`when_ready`](RtmpSession::when_ready)
/// resolves.
pub struct RtmpSession {
    inner: Mutex<SessionInner>,
    readiness: Readiness,
}

struct SessionInner {
    role: SessionRole,
    app: Option<String>,
    stream_name: Option<String>,
    paused: bool,
    key_frame: Option<RtmpMessage>,
    metadata: Option<Amf0Value>,
}

impl RtmpSession {
    pub fn new() -> RtmpSession {
        RtmpSession {
            inner: Mutex::new(SessionInner {
                role: SessionRole::Unassigned,
                app: None,
                stream_name: None,
                paused: false,
                key_frame: None,
                metadata: None,
            }),
            readiness: Readiness::new(),
        }
    }

    pub fn role(&self) -> SessionRole {
        self.inner.lock().role
    }

    /// Assigns the connection's role.  Only the first assignment sticks.
    pub fn assign_role(&self, role: SessionRole) {
        let mut inner = self.inner.lock();
        if inner.role == SessionRole::Unassigned {
            inner.role = role;
        }
    }

    pub fn app(&self) -> Option<String> {
        self.inner.lock().app.clone()
    }

    pub fn set_app(&self, app: String) {
        self.inner.lock().app = Some(app);
    }

    pub fn stream_name(&self) -> Option<String> {
        self.inner.lock().stream_name.clone()
    }

    pub fn set_stream_name(&self, stream_name: String) {
        self.inner.lock().stream_name = Some(stream_name);
    }

    /// The fan-out identity, available once both `connect` and
    /// `publish`/`play` have run.
    pub fn stream_key(&self) -> Option<String> {
        let inner = self.inner.lock();
        match (&inner.app, &inner.stream_name) {
            (Some(app), Some(stream_name)) => Some(format!("{}/{}", app, stream_name)),
            _ => None,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.inner.lock().paused
    }

    pub fn set_paused(&self, paused: bool) {
        self.inner.lock().paused = paused;
    }

    pub fn metadata(&self) -> Option<Amf0Value> {
        self.inner.lock().metadata.clone()
    }

    pub fn set_metadata(&self, metadata: Amf0Value) {
        self.inner.lock().metadata = Some(metadata);
    }

    /// A retained handle onto the cached first key frame.
    pub fn key_frame(&self) -> Option<RtmpMessage> {
        self.inner.lock().key_frame.as_ref().map(RtmpMessage::retain)
    }

    /// Caches the publisher's first key frame and resolves readiness.  The
    /// first frame wins; later calls leave the cache untouched.
    pub fn set_key_frame(&self, frame: RtmpMessage) {
        {
            let mut inner = self.inner.lock();
            if inner.key_frame.is_some() {
                return;
            }
            inner.key_frame = Some(frame);
        }

        self.readiness.resolve(ReadyOutcome::Complete);
    }

    pub fn state(&self) -> SessionState {
        match self.readiness.outcome() {
            Some(ReadyOutcome::Complete) => SessionState::Complete,
            _ => SessionState::Initializing,
        }
    }

    /// Runs `callback` once the publisher has cached its first key frame or
    /// is known to never do so.  Runs synchronously when readiness has
    /// already resolved.
    pub fn when_ready<F>(&self, callback: F)
    where
        F: FnOnce(ReadyOutcome) + Send + 'static,
    {
        self.readiness.when_ready(callback);
    }

    /// Resolves readiness as failed.  Invoked by connection teardown when a
    /// publisher dies before completing; a no-op on completed sessions.
    pub fn fail_readiness(&self) {
        self.readiness.resolve(ReadyOutcome::Failed);
    }
}

impl Default for RtmpSession {
    fn default() -> Self {
        RtmpSession::new()
    }
}

type ReadyCallback = Box<dyn FnOnce(ReadyOutcome) + Send>;

/// One-shot completion: resolves at most once and drains its callback list
/// when it does.  Callbacks registered after resolution run immediately on
/// the caller's thread.
struct Readiness {
    inner: Mutex<ReadinessInner>,
}

struct ReadinessInner {
    outcome: Option<ReadyOutcome>,
    waiters: Vec<ReadyCallback>,
}

impl Readiness {
    fn new() -> Readiness {
        Readiness {
            inner: Mutex::new(ReadinessInner {
                outcome: None,
                waiters: Vec::new(),
            }),
        }
    }

    fn outcome(&self) -> Option<ReadyOutcome> {
        self.inner.lock().outcome
    }

    fn when_ready<F>(&self, callback: F)
    where
        F: FnOnce(ReadyOutcome) + Send + 'static,
    {
        let outcome = {
            let mut inner = self.inner.lock();
            match inner.outcome {
                None => {
                    inner.waiters.push(Box::new(callback));
                    return;
                }
                Some(outcome) => outcome,
            }
        };

        // Already resolved; run outside the lock.
        callback(outcome);
    }

    fn resolve(&self, outcome: ReadyOutcome) {
        let waiters = {
            let mut inner = self.inner.lock();
            if inner.outcome.is_some() {
                return;
            }
            inner.outcome = Some(outcome);
            std::mem::take(&mut inner.waiters)
        };

        for waiter in waiters {
            waiter(outcome);
        }
    }
}
