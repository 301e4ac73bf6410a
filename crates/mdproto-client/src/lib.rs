//! Multi-device protocol bridge client.
//!
//! The gateway never speaks the messaging protocol itself. This crate
//! defines the narrow adapter surface it consumes ([`Connector`],
//! [`ProtocolClient`], [`ConnectionEvent`]) and an implementation backed by
//! the protocol bridge's REST API.

mod client;
mod error;
mod poller;
mod types;

pub use client::{ClientSession, Connector, HttpConnector, MdHttpClient, ProtocolClient};
pub use error::ClientError;
pub use poller::EventPoller;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_connector(mock_server: &MockServer) -> HttpConnector {
        HttpConnector::new(mock_server.uri(), Duration::from_secs(5))
            .unwrap()
            .with_events_poll_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_health_check() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let connector = test_connector(&mock_server);
        assert!(connector.health_check().await);
    }

    #[tokio::test]
    async fn test_protocol_version_fetch() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/version"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "version": [2, 3000, 7]
            })))
            .mount(&mock_server)
            .await;

        let connector = test_connector(&mock_server);
        assert_eq!(
            connector.protocol_version().await,
            ProtocolVersion([2, 3000, 7])
        );
    }

    #[tokio::test]
    async fn test_protocol_version_falls_back_on_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/version"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let connector = test_connector(&mock_server);
        assert_eq!(connector.protocol_version().await, ProtocolVersion::FALLBACK);
    }

    #[tokio::test]
    async fn test_open_delivers_events_in_order() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "session_id": "abc"
            })))
            .mount(&mock_server)
            .await;

        // First poll returns the whole lifecycle, later polls return
        // nothing (the poller stops at `closed` anyway).
        Mock::given(method("GET"))
            .and(path("/v1/sessions/abc/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"type": "credentials_updated", "creds": {"registered": false}},
                {"type": "opened"},
                {"type": "closed", "status_code": 428}
            ])))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/sessions/abc/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&mock_server)
            .await;

        let connector = test_connector(&mock_server);
        let mut session = connector
            .open(None, ProtocolVersion::FALLBACK)
            .await
            .unwrap();

        assert!(matches!(
            session.events.recv().await,
            Some(ConnectionEvent::CredentialsUpdated { .. })
        ));
        assert!(matches!(
            session.events.recv().await,
            Some(ConnectionEvent::Opened)
        ));
        assert!(matches!(
            session.events.recv().await,
            Some(ConnectionEvent::Closed {
                status_code: Some(428)
            })
        ));
        // Poller stops after `closed`.
        assert!(session.events.recv().await.is_none());

        session.client.close().await;
    }

    #[tokio::test]
    async fn test_request_pairing_code_object_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/sessions/abc/pair-code"))
            .and(query_param("number", "15551234567"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": "ABCD1234"
            })))
            .mount(&mock_server)
            .await;

        let client = open_test_session(&mock_server).await;
        let code = client.request_pairing_code("15551234567").await.unwrap();
        assert_eq!(code, "ABCD1234");
    }

    #[tokio::test]
    async fn test_request_pairing_code_string_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/sessions/abc/pair-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!("XYZW9876")))
            .mount(&mock_server)
            .await;

        let client = open_test_session(&mock_server).await;
        let code = client.request_pairing_code("15551234567").await.unwrap();
        assert_eq!(code, "XYZW9876");
    }

    #[tokio::test]
    async fn test_request_pairing_code_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/sessions/abc/pair-code"))
            .respond_with(ResponseTemplate::new(428).set_body_string("precondition required"))
            .mount(&mock_server)
            .await;

        let client = open_test_session(&mock_server).await;
        let result = client.request_pairing_code("15551234567").await;
        assert!(matches!(result, Err(ClientError::PairingFailed(_))));
    }

    #[tokio::test]
    async fn test_send_failure_is_per_call() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/sessions/abc/send"))
            .respond_with(ResponseTemplate::new(500).set_body_string("no recipient"))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/sessions/abc/send"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let client = open_test_session(&mock_server).await;

        let first = client
            .send(
                "15551234567",
                OutboundPayload::Text {
                    body: "hello".into(),
                },
            )
            .await;
        assert!(matches!(first, Err(ClientError::SendFailed(_))));

        let second = client
            .send(
                "15551234567",
                OutboundPayload::Text {
                    body: "hello".into(),
                },
            )
            .await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/v1/sessions/abc"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let client = open_test_session(&mock_server).await;
        client.close().await;
        client.close().await;
    }

    /// Open a session against a server that already mocks the endpoints the
    /// test cares about. Event polling gets an empty default response.
    async fn open_test_session(mock_server: &MockServer) -> std::sync::Arc<dyn ProtocolClient> {
        Mock::given(method("POST"))
            .and(path("/v1/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "session_id": "abc"
            })))
            .mount(mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/sessions/abc/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(mock_server)
            .await;

        let connector = test_connector(mock_server);
        connector
            .open(None, ProtocolVersion::FALLBACK)
            .await
            .unwrap()
            .client
    }
}
