//! Pairing Gateway - phone-number pairing codes over HTTP.
//!
//! One endpoint: give it a phone number, it opens an ephemeral session
//! against the multi-device protocol bridge, returns the short pairing code,
//! and once the remote side completes pairing, ships the credential material
//! back to the paired account and destroys all local session state.

pub mod api;
pub mod config;
pub mod error;
pub mod faults;
pub mod number;
pub mod pairing;
pub mod session;

pub use config::Config;
pub use error::GatewayError;
pub use session::{SessionHandle, SessionStore};
