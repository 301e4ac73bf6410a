//! Bridge API types.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Protocol version triple advertised to the remote service during the
/// handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolVersion(pub [u16; 3]);

impl ProtocolVersion {
    /// Version used when the bridge cannot tell us the current one.
    pub const FALLBACK: ProtocolVersion = ProtocolVersion([2, 3000, 0]);
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.0[0], self.0[1], self.0[2])
    }
}

/// Connection lifecycle event emitted by the bridge.
///
/// Events arrive in emission order. No ordering is guaranteed relative to
/// pairing-code requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnectionEvent {
    /// In-memory credential state changed; `creds` is the full snapshot.
    CredentialsUpdated { creds: Value },
    /// The connection is open and authenticated.
    Opened,
    /// The connection closed, with the transport status code if known.
    Closed { status_code: Option<u16> },
    /// The bridge offered a QR pairing payload. Phone-number pairing does
    /// not use it.
    PairingQrOffered { qr: String },
}

/// Outbound message payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboundPayload {
    Document {
        filename: String,
        mime_type: String,
        #[serde(
            serialize_with = "serialize_base64",
            deserialize_with = "deserialize_base64"
        )]
        bytes: Vec<u8>,
    },
    ImageUrl {
        url: String,
        caption: String,
    },
    Text {
        body: String,
    },
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&BASE64.encode(bytes))
}

fn deserialize_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    BASE64.decode(encoded).map_err(serde::de::Error::custom)
}

/// Request body for opening a bridge session.
#[derive(Debug, Serialize)]
pub struct OpenSessionRequest {
    /// Previously persisted credential snapshot, if any.
    pub auth: Option<Value>,
    pub version: ProtocolVersion,
}

/// Response after opening a bridge session.
#[derive(Debug, Deserialize)]
pub struct OpenSessionResponse {
    pub session_id: String,
}

/// Request body for sending a message.
#[derive(Debug, Serialize)]
pub struct SendRequest {
    pub to: String,
    pub payload: OutboundPayload,
}

/// Response from the bridge version endpoint.
#[derive(Debug, Deserialize)]
pub struct VersionResponse {
    pub version: ProtocolVersion,
}
