//! Pairing orchestrator.
//!
//! Drives one session from validated number to destroyed directory:
//! bootstrap storage, open the protocol client, race the pairing-code
//! request against the connection lifecycle, deliver onboarding after a
//! successful open, then clean up. Nothing escapes this module uncaught;
//! every failure becomes a log line or a single gate call.

mod code;
mod delivery;
mod gate;

pub use code::format_pair_code;
pub use delivery::deliver_onboarding;
pub use gate::ResponseGate;

use mdproto_client::{ClientSession, ConnectionEvent, Connector, ProtocolClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::session::{is_registered, SessionHandle, SessionStore};

/// Transport status code meaning the stored session is no longer authorized.
const STATUS_UNAUTHORIZED: u16 = 401;

/// The one result a session ever delivers to its HTTP caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingOutcome {
    /// A pairing code, already segmented for display.
    PairCode(String),
    /// Persisted credentials show the number is already paired.
    AlreadyRegistered,
    Failure(String),
}

/// Orchestrator knobs, sourced from [`crate::config::PairingConfig`].
#[derive(Debug, Clone)]
pub struct PairingSettings {
    /// Grace interval between a successful open and directory removal,
    /// letting in-flight sends finish.
    pub cleanup_grace: Duration,
    /// Close the client proactively after cleanup instead of waiting for
    /// the bridge's own close.
    pub close_after_cleanup: bool,
}

impl Default for PairingSettings {
    fn default() -> Self {
        Self {
            cleanup_grace: Duration::from_secs(2),
            close_after_cleanup: false,
        }
    }
}

/// Run one pairing session to completion.
///
/// `number` must already be canonical. The caller holds the receiving end
/// of `gate`; this function (and the branch it spawns) never panics its way
/// out and never leaves the gate permanently empty-handed: if every sender
/// is dropped without an outcome, the receiver resolves to an error the
/// HTTP handler maps to an internal failure.
pub async fn run_pairing(
    store: SessionStore,
    connector: Arc<dyn Connector>,
    settings: PairingSettings,
    number: String,
    gate: Arc<ResponseGate>,
) {
    // Bootstrapping
    let session = match store.prepare(&number).await {
        Ok(session) => session,
        Err(e) => {
            error!(phone_number = %number, "Session bootstrap failed: {}", e);
            gate.try_send(PairingOutcome::Failure(e.to_string())).await;
            return;
        }
    };
    let creds = session.load_creds().await;
    let registered = creds.as_ref().map(is_registered).unwrap_or(false);

    // Connecting. The event receiver is live before any async connection
    // work can complete, so the first event cannot be missed.
    let version = connector.protocol_version().await;
    let ClientSession { client, mut events } = match connector.open(creds, version).await {
        Ok(session) => session,
        Err(e) => {
            error!(phone_number = %number, "Client construction failed: {}", e);
            gate.try_send(PairingOutcome::Failure(format!("Connection failed: {}", e)))
                .await;
            return;
        }
    };

    // Registration branch, concurrent with the lifecycle loop below.
    let registration = tokio::spawn(registration_branch(
        client.clone(),
        gate.clone(),
        number.clone(),
        registered,
    ));

    // Lifecycle branch.
    while let Some(event) = events.recv().await {
        match event {
            ConnectionEvent::CredentialsUpdated { creds } => {
                if let Err(e) = session.save_creds(&creds).await {
                    error!(phone_number = %number, "Failed to persist credentials: {}", e);
                }
            }
            ConnectionEvent::PairingQrOffered { .. } => {
                debug!(phone_number = %number, "Ignoring QR offer, phone pairing only");
            }
            ConnectionEvent::Opened => {
                info!(phone_number = %number, "Connection opened, session authenticated");
                handle_authenticated(&session, client.as_ref(), &number, &settings).await;
                if settings.close_after_cleanup {
                    client.close().await;
                    break;
                }
            }
            ConnectionEvent::Closed { status_code } => {
                if status_code == Some(STATUS_UNAUTHORIZED) {
                    warn!(
                        phone_number = %number,
                        "Session unauthorized or expired, a fresh pairing code will be needed"
                    );
                } else {
                    info!(phone_number = %number, ?status_code, "Connection closed");
                }
                client.close().await;
                break;
            }
        }
    }

    // Let the pairing-code request finish delivering its outcome.
    let _ = registration.await;
    debug!(phone_number = %number, "Pairing session done");
}

/// Resolve the caller-visible outcome: short-circuit for registered
/// numbers, otherwise request and format a pairing code.
async fn registration_branch(
    client: Arc<dyn ProtocolClient>,
    gate: Arc<ResponseGate>,
    number: String,
    registered: bool,
) {
    if registered {
        info!(phone_number = %number, "Already registered, skipping pairing-code request");
        gate.try_send(PairingOutcome::AlreadyRegistered).await;
        return;
    }

    match client.request_pairing_code(&number).await {
        Ok(code) if code.is_empty() => {
            warn!(phone_number = %number, "Bridge returned no pairing code");
            gate.try_send(PairingOutcome::Failure("No pair code returned".into()))
                .await;
        }
        Ok(code) => {
            gate.try_send(PairingOutcome::PairCode(format_pair_code(&code)))
                .await;
        }
        Err(e) => {
            // The connection stays up: it may still authenticate off an
            // earlier code. No retry from this side.
            warn!(phone_number = %number, "Pairing-code request failed: {}", e);
            gate.try_send(PairingOutcome::Failure(e.to_string())).await;
        }
    }
}

/// Post-auth delivery and cleanup.
///
/// A missing credential file is an anomaly: log it and leave the directory
/// in place for diagnosis, skipping both delivery and cleanup.
async fn handle_authenticated(
    session: &SessionHandle,
    client: &dyn ProtocolClient,
    number: &str,
    settings: &PairingSettings,
) {
    let Some(creds_bytes) = session.read_creds_bytes().await else {
        error!(
            phone_number = %number,
            "Credential file missing after open, skipping delivery and cleanup"
        );
        return;
    };

    deliver_onboarding(client, number, creds_bytes).await;

    sleep(settings.cleanup_grace).await;
    session.destroy().await;
}
