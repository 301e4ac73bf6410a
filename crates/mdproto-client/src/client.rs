//! Bridge HTTP client and the adapter traits consumed by the gateway.

use crate::error::ClientError;
use crate::poller::EventPoller;
use crate::types::*;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};
use urlencoding::encode;

/// Buffered lifecycle events per session before the poller backpressures.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A live protocol session: one client handle plus its lifecycle-event
/// stream. The receiver is wired up before the bridge can emit anything, so
/// no event is lost between construction and the first `recv`.
pub struct ClientSession {
    pub client: Arc<dyn ProtocolClient>,
    pub events: mpsc::Receiver<ConnectionEvent>,
}

/// The operations the gateway needs from a connected protocol client.
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    /// Request a pairing code for `number`. Not gated on any lifecycle
    /// event; may race with `Opened`.
    async fn request_pairing_code(&self, number: &str) -> Result<String, ClientError>;

    /// Send one payload to `address`. Each call fails independently.
    async fn send(&self, address: &str, payload: OutboundPayload) -> Result<(), ClientError>;

    /// Close the session. Idempotent, never errors.
    async fn close(&self);
}

/// Opens protocol sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Whether the bridge behind this connector is reachable.
    async fn health_check(&self) -> bool {
        true
    }

    /// Current protocol version, falling back to
    /// [`ProtocolVersion::FALLBACK`] when it cannot be determined.
    async fn protocol_version(&self) -> ProtocolVersion;

    /// Open a session, optionally resuming from a persisted credential
    /// snapshot. Returns immediately; connection progress arrives as
    /// [`ConnectionEvent`]s.
    async fn open(
        &self,
        auth: Option<Value>,
        version: ProtocolVersion,
    ) -> Result<ClientSession, ClientError>;
}

/// Connector backed by the multi-device protocol bridge REST API.
#[derive(Clone)]
pub struct HttpConnector {
    client: Client,
    base_url: String,
    events_poll_interval: Duration,
}

impl HttpConnector {
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            events_poll_interval: crate::poller::DEFAULT_POLL_INTERVAL,
        })
    }

    /// How often sessions opened by this connector poll for lifecycle
    /// events.
    pub fn with_events_poll_interval(mut self, interval: Duration) -> Self {
        self.events_poll_interval = interval;
        self
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/v1/health", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn protocol_version(&self) -> ProtocolVersion {
        let result = async {
            let response = self
                .client
                .get(format!("{}/v1/version", self.base_url))
                .send()
                .await?;

            if !response.status().is_success() {
                let msg = response.text().await.unwrap_or_default();
                return Err(ClientError::Api(msg));
            }

            Ok(response.json::<VersionResponse>().await?.version)
        }
        .await;

        match result {
            Ok(version) => {
                debug!(%version, "Fetched protocol version");
                version
            }
            Err(e) => {
                warn!("Version fetch failed, using fallback: {}", e);
                ProtocolVersion::FALLBACK
            }
        }
    }

    #[instrument(skip(self, auth))]
    async fn open(
        &self,
        auth: Option<Value>,
        version: ProtocolVersion,
    ) -> Result<ClientSession, ClientError> {
        let request = OpenSessionRequest { auth, version };

        let response = self
            .client
            .post(format!("{}/v1/sessions", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let msg = response.text().await.unwrap_or_default();
            return Err(ClientError::Api(msg));
        }

        let opened: OpenSessionResponse = response.json().await?;
        debug!(session_id = %opened.session_id, "Bridge session opened");

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let client = Arc::new(MdHttpClient {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            session_id: opened.session_id.clone(),
            poller: Mutex::new(None),
        });

        let poller = EventPoller::new(
            self.client.clone(),
            self.base_url.clone(),
            opened.session_id,
            tx,
        )
        .with_poll_interval(self.events_poll_interval);
        *client.poller.lock().await = Some(tokio::spawn(poller.run()));

        Ok(ClientSession {
            client,
            events: rx,
        })
    }
}

/// One connected bridge session.
pub struct MdHttpClient {
    client: Client,
    base_url: String,
    session_id: String,
    /// Event poller task, taken on close.
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl MdHttpClient {
    fn session_url(&self, suffix: &str) -> String {
        format!(
            "{}/v1/sessions/{}{}",
            self.base_url,
            encode(&self.session_id),
            suffix
        )
    }
}

#[async_trait]
impl ProtocolClient for MdHttpClient {
    #[instrument(skip(self))]
    async fn request_pairing_code(&self, number: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .post(format!(
                "{}?number={}",
                self.session_url("/pair-code"),
                encode(number)
            ))
            .send()
            .await?;

        if !response.status().is_success() {
            let msg = response.text().await.unwrap_or_default();
            warn!("Pairing code request failed: {}", msg);
            return Err(ClientError::PairingFailed(msg));
        }

        // The bridge returns either a bare string or an object with a
        // `code` field.
        let body: Value = response.json().await?;
        let code = match &body {
            Value::String(code) => code.clone(),
            Value::Object(map) => map
                .get("code")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        };

        debug!("Pairing code issued");
        Ok(code)
    }

    #[instrument(skip(self, payload))]
    async fn send(&self, address: &str, payload: OutboundPayload) -> Result<(), ClientError> {
        let request = SendRequest {
            to: address.to_string(),
            payload,
        };

        let response = self
            .client
            .post(self.session_url("/send"))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let msg = response.text().await.unwrap_or_default();
            warn!("Send failed: {}", msg);
            return Err(ClientError::SendFailed(msg));
        }

        debug!(address = %address, "Sent payload");
        Ok(())
    }

    async fn close(&self) {
        let handle = self.poller.lock().await.take();
        let Some(handle) = handle else {
            return;
        };
        handle.abort();

        if let Err(e) = self
            .client
            .delete(self.session_url(""))
            .send()
            .await
        {
            debug!("Session delete failed (ignored): {}", e);
        }
    }
}
