//! Response gate: at most one outcome per session.

use super::PairingOutcome;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tracing::debug;

/// Single-assignment cell collapsing the concurrent pairing-code and
/// lifecycle paths into the one HTTP response tied to a session.
///
/// The first `try_send` consumes the inner sender; every later call is a
/// silent no-op. A failed send (the HTTP caller went away) is swallowed:
/// the gate guarantees at most one write attempt, not delivery.
pub struct ResponseGate {
    tx: Mutex<Option<oneshot::Sender<PairingOutcome>>>,
}

impl ResponseGate {
    /// Create a gate and the receiver the HTTP handler awaits.
    pub fn channel() -> (Arc<Self>, oneshot::Receiver<PairingOutcome>) {
        let (tx, rx) = oneshot::channel();
        (
            Arc::new(Self {
                tx: Mutex::new(Some(tx)),
            }),
            rx,
        )
    }

    pub async fn try_send(&self, outcome: PairingOutcome) {
        let sender = self.tx.lock().await.take();
        let Some(sender) = sender else {
            debug!("Outcome already delivered, dropping {:?}", outcome);
            return;
        };

        if sender.send(outcome).is_err() {
            debug!("Caller gone before outcome delivery");
        }
    }

    /// Whether an outcome has already been delivered.
    pub async fn responded(&self) -> bool {
        self.tx.lock().await.is_none()
    }
}
