//! Post-auth onboarding delivery.

use mdproto_client::{OutboundPayload, ProtocolClient};
use tracing::{error, info};

use crate::session::CREDS_FILE;

const ONBOARDING_IMAGE_URL: &str = "https://pairing-gateway.github.io/assets/onboarding.jpg";
const ONBOARDING_CAPTION: &str =
    "Pairing complete. Your session credentials are attached above.";
const WARNING_TEXT: &str = "Keep creds.json to yourself. Anyone holding this \
file can act as your account. Never share it, and delete this chat once you \
have stored it safely.";

/// Send the credential document, the onboarding image, and the warning text
/// to the freshly paired account.
///
/// The three sends are independent: a failure in one does not cancel the
/// others, and each failure is logged on its own.
pub async fn deliver_onboarding(
    client: &dyn ProtocolClient,
    address: &str,
    creds_bytes: Vec<u8>,
) {
    let sends = [
        OutboundPayload::Document {
            filename: CREDS_FILE.to_string(),
            mime_type: "application/json".to_string(),
            bytes: creds_bytes,
        },
        OutboundPayload::ImageUrl {
            url: ONBOARDING_IMAGE_URL.to_string(),
            caption: ONBOARDING_CAPTION.to_string(),
        },
        OutboundPayload::Text {
            body: WARNING_TEXT.to_string(),
        },
    ];

    for payload in sends {
        let what = match &payload {
            OutboundPayload::Document { .. } => "credential document",
            OutboundPayload::ImageUrl { .. } => "onboarding image",
            OutboundPayload::Text { .. } => "warning text",
        };
        if let Err(e) = client.send(address, payload).await {
            error!(address = %address, "Failed to deliver {}: {}", what, e);
        }
    }

    info!(address = %address, "Onboarding delivery attempted");
}
