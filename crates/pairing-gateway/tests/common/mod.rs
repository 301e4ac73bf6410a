//! Scripted in-memory stand-in for the protocol bridge.

use async_trait::async_trait;
use mdproto_client::{
    ClientError, ClientSession, ConnectionEvent, Connector, OutboundPayload, ProtocolClient,
    ProtocolVersion,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// What the fake bridge should do, plus probes for what was done to it.
#[derive(Clone)]
pub struct FakeBridge {
    /// Pairing-code result: `Ok(code)` or `Err(reason)`.
    pub pair_code: Result<String, String>,
    /// Lifecycle events emitted, in order, once the session opens.
    pub events: Vec<ConnectionEvent>,
    pub sent: Arc<Mutex<Vec<(String, OutboundPayload)>>>,
    pub pair_requests: Arc<AtomicUsize>,
    pub closed: Arc<AtomicBool>,
}

impl FakeBridge {
    pub fn new(pair_code: Result<String, String>, events: Vec<ConnectionEvent>) -> Self {
        Self {
            pair_code,
            events,
            sent: Arc::new(Mutex::new(Vec::new())),
            pair_requests: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn pair_request_count(&self) -> usize {
        self.pair_requests.load(Ordering::SeqCst)
    }

    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FakeBridge {
    async fn protocol_version(&self) -> ProtocolVersion {
        ProtocolVersion::FALLBACK
    }

    async fn open(
        &self,
        _auth: Option<serde_json::Value>,
        _version: ProtocolVersion,
    ) -> Result<ClientSession, ClientError> {
        let (tx, rx) = mpsc::channel(self.events.len().max(1));
        for event in self.events.clone() {
            // Capacity covers every scripted event; this never blocks.
            let _ = tx.send(event).await;
        }

        Ok(ClientSession {
            client: Arc::new(FakeClient {
                pair_code: self.pair_code.clone(),
                sent: self.sent.clone(),
                pair_requests: self.pair_requests.clone(),
                closed: self.closed.clone(),
            }),
            events: rx,
        })
    }
}

struct FakeClient {
    pair_code: Result<String, String>,
    sent: Arc<Mutex<Vec<(String, OutboundPayload)>>>,
    pair_requests: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl ProtocolClient for FakeClient {
    async fn request_pairing_code(&self, _number: &str) -> Result<String, ClientError> {
        self.pair_requests.fetch_add(1, Ordering::SeqCst);
        self.pair_code
            .clone()
            .map_err(ClientError::PairingFailed)
    }

    async fn send(&self, address: &str, payload: OutboundPayload) -> Result<(), ClientError> {
        self.sent.lock().await.push((address.to_string(), payload));
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
