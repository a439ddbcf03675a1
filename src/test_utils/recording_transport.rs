//! In-memory transport that records every request instead of sending it.
//!
//! Clones share one recorder, so a test keeps a handle while the factory is
//! moved into a provider or client manager.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use parking_lot::{Condvar, Mutex};
use uuid::Uuid;

use crate::hec::{
    ClientError, ClientSpec, HecResponse, HecTransport, TransportError, TransportFactory,
};

/// One captured POST.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedPost {
    pub channel_id: Uuid,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub content_type: String,
    pub body: String,
}

impl CapturedPost {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Lifecycle step of a recorded transport, keyed by its channel id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    Built(Uuid),
    PostStarted(Uuid),
    PostFinished(Uuid),
    Dropped(Uuid),
}

#[derive(Default)]
struct Recorder {
    posts: Mutex<Vec<CapturedPost>>,
    events: Mutex<Vec<TransportEvent>>,
    changed: Condvar,
    status: AtomicU16,
    fail_posts: AtomicBool,
    gate: Mutex<Option<Receiver<()>>>,
    started: Mutex<Option<Sender<Uuid>>>,
}

impl Recorder {
    fn push_event(&self, event: TransportEvent) {
        self.events.lock().push(event);
        self.changed.notify_all();
    }
}

/// Factory producing [`RecordingTransport`]s that share one recorder.
#[derive(Clone)]
pub struct RecordingTransportFactory {
    recorder: Arc<Recorder>,
}

impl Default for RecordingTransportFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingTransportFactory {
    pub fn new() -> Self {
        let recorder = Recorder {
            status: AtomicU16::new(200),
            ..Recorder::default()
        };
        Self {
            recorder: Arc::new(recorder),
        }
    }

    /// Status code returned by every subsequent request.
    pub fn respond_with(&self, status: u16) {
        self.recorder.status.store(status, Ordering::SeqCst);
    }

    /// Make every subsequent request fail at the transport level.
    pub fn fail_posts(&self, fail: bool) {
        self.recorder.fail_posts.store(fail, Ordering::SeqCst);
    }

    /// Park requests until the returned sender is dropped. The receiver
    /// yields the channel id of each request as it starts.
    pub fn block_posts(&self) -> (Sender<()>, Receiver<Uuid>) {
        let (release_tx, release_rx) = bounded(0);
        let (started_tx, started_rx) = unbounded();
        *self.recorder.gate.lock() = Some(release_rx);
        *self.recorder.started.lock() = Some(started_tx);
        (release_tx, started_rx)
    }

    pub fn posts(&self) -> Vec<CapturedPost> {
        self.recorder.posts.lock().clone()
    }

    /// Bodies of all captured requests in send order.
    pub fn bodies(&self) -> Vec<String> {
        self.recorder
            .posts
            .lock()
            .iter()
            .map(|p| p.body.clone())
            .collect()
    }

    pub fn events(&self) -> Vec<TransportEvent> {
        self.recorder.events.lock().clone()
    }

    /// Wait until at least `count` requests have been captured.
    pub fn wait_for_posts(&self, count: usize, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        let mut events = self.recorder.events.lock();
        loop {
            if self.recorder.posts.lock().len() >= count {
                return true;
            }
            if self.recorder.changed.wait_until(&mut events, deadline).timed_out() {
                return self.recorder.posts.lock().len() >= count;
            }
        }
    }
}

impl TransportFactory for RecordingTransportFactory {
    fn build(&self, spec: &ClientSpec) -> Result<Box<dyn HecTransport>, ClientError> {
        self.recorder
            .push_event(TransportEvent::Built(spec.channel_id));
        Ok(Box::new(RecordingTransport {
            channel_id: spec.channel_id,
            recorder: Arc::clone(&self.recorder),
        }))
    }
}

/// Transport half of [`RecordingTransportFactory`].
pub struct RecordingTransport {
    channel_id: Uuid,
    recorder: Arc<Recorder>,
}

impl HecTransport for RecordingTransport {
    fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        content_type: &str,
        body: &str,
    ) -> Result<HecResponse, TransportError> {
        self.recorder
            .push_event(TransportEvent::PostStarted(self.channel_id));
        if let Some(started) = self.recorder.started.lock().as_ref() {
            let _ = started.send(self.channel_id);
        }
        let gate = self.recorder.gate.lock().clone();
        if let Some(gate) = gate {
            // Returns once the test drops the release sender.
            let _ = gate.recv();
        }

        let outcome = if self.recorder.fail_posts.load(Ordering::SeqCst) {
            Err(TransportError::Request {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            })
        } else {
            self.recorder.posts.lock().push(CapturedPost {
                channel_id: self.channel_id,
                url: url.to_string(),
                headers: headers.to_vec(),
                content_type: content_type.to_string(),
                body: body.to_string(),
            });
            Ok(HecResponse {
                status: self.recorder.status.load(Ordering::SeqCst),
                body: r#"{"text":"Success","code":0}"#.to_string(),
            })
        };
        self.recorder
            .push_event(TransportEvent::PostFinished(self.channel_id));
        outcome
    }
}

impl Drop for RecordingTransport {
    fn drop(&mut self) {
        self.recorder
            .push_event(TransportEvent::Dropped(self.channel_id));
    }
}

/// Factory whose every build fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingTransportFactory;

impl TransportFactory for FailingTransportFactory {
    fn build(&self, _spec: &ClientSpec) -> Result<Box<dyn HecTransport>, ClientError> {
        Err(ClientError::Build("transport construction refused".to_string()))
    }
}
