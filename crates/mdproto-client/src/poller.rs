//! Lifecycle-event poller.

use crate::types::ConnectionEvent;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, error};
use urlencoding::encode;

pub(crate) const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Polls the bridge event endpoint and forwards lifecycle events, in
/// emission order, into an mpsc channel.
///
/// The poller stops after forwarding a `Closed` event or once the receiving
/// side goes away.
pub struct EventPoller {
    client: Client,
    base_url: String,
    session_id: String,
    poll_interval: Duration,
    tx: mpsc::Sender<ConnectionEvent>,
}

impl EventPoller {
    pub fn new(
        client: Client,
        base_url: String,
        session_id: String,
        tx: mpsc::Sender<ConnectionEvent>,
    ) -> Self {
        Self {
            client,
            base_url,
            session_id,
            poll_interval: DEFAULT_POLL_INTERVAL,
            tx,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub async fn run(self) {
        loop {
            match self.fetch_events().await {
                Ok(events) => {
                    for event in events {
                        let closed = matches!(event, ConnectionEvent::Closed { .. });
                        if self.tx.send(event).await.is_err() {
                            debug!("Event receiver dropped, stopping poller");
                            return;
                        }
                        if closed {
                            debug!(session_id = %self.session_id, "Session closed, stopping poller");
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!("Event poll error: {}", e);
                    sleep(ERROR_BACKOFF).await;
                    continue;
                }
            }

            sleep(self.poll_interval).await;
        }
    }

    async fn fetch_events(&self) -> Result<Vec<ConnectionEvent>, crate::ClientError> {
        let response = self
            .client
            .get(format!(
                "{}/v1/sessions/{}/events",
                self.base_url,
                encode(&self.session_id)
            ))
            .send()
            .await?;

        if !response.status().is_success() {
            let msg = response.text().await.unwrap_or_default();
            return Err(crate::ClientError::Api(msg));
        }

        // Skip event shapes this crate does not know about instead of
        // failing the whole batch.
        let raw: Vec<Value> = response.json().await?;
        let events = raw
            .into_iter()
            .filter_map(|v| match serde_json::from_value::<ConnectionEvent>(v) {
                Ok(event) => Some(event),
                Err(e) => {
                    debug!("Skipping unknown event: {}", e);
                    None
                }
            })
            .collect();

        Ok(events)
    }
}
