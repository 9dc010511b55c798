//! ---
//! sim_section: "03-transport"
//! sim_subsection: "module"
//! sim_type: "source"
//! sim_scope: "code"
//! sim_description: "Publish/subscribe transport abstraction and backends."
//! sim_version: "v0.1.0"
//! sim_owner: "tbd"
//! ---
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{QosLevel, Result, Transport, TransportError};

/// One recorded publish call, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRecord {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QosLevel,
    pub retain: bool,
}

/// In-memory transport recording every call, for tests and single-process
/// integration. Clones share the same state, so a test can keep a handle
/// while a session owns the transport.
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    published: Mutex<VecDeque<PublishRecord>>,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    connected: AtomicBool,
    refuse_connect: AtomicBool,
    fail_publishes: AtomicBool,
}

impl InMemoryTransport {
    /// Create a fresh recording transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `connect` call fail, exercising the fatal path.
    pub fn refuse_connections(&self) {
        self.inner.refuse_connect.store(true, Ordering::SeqCst);
    }

    /// Make every subsequent `publish` call fail, exercising the
    /// transient-error path.
    pub fn fail_publishes(&self) {
        self.inner.fail_publishes.store(true, Ordering::SeqCst);
    }

    /// Number of successful `connect` calls observed.
    pub fn connect_count(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    /// Number of `disconnect` calls observed.
    pub fn disconnect_count(&self) -> usize {
        self.inner.disconnects.load(Ordering::SeqCst)
    }

    /// Snapshot of everything published so far, in order.
    pub fn published(&self) -> Vec<PublishRecord> {
        let guard = self.inner.published.lock().expect("queue poisoned");
        guard.iter().cloned().collect()
    }

    /// Pop the oldest recorded publish, if any.
    pub fn next_published(&self) -> Option<PublishRecord> {
        let mut guard = self.inner.published.lock().expect("queue poisoned");
        guard.pop_front()
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.inner.refuse_connect.load(Ordering::SeqCst) {
            return Err(TransportError::Connect(
                "connection refused by test harness".to_owned(),
            ));
        }
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        self.inner.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QosLevel,
        retain: bool,
    ) -> Result<()> {
        if !self.inner.connected.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }
        if self.inner.fail_publishes.load(Ordering::SeqCst) {
            return Err(TransportError::Publish {
                topic: topic.to_owned(),
                reason: "publish failure injected by test harness".to_owned(),
            });
        }
        let mut guard = self.inner.published.lock().expect("queue poisoned");
        guard.push_back(PublishRecord {
            topic: topic.to_owned(),
            payload,
            qos,
            retain,
        });
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.inner.disconnects.fetch_add(1, Ordering::SeqCst);
        self.inner.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}
