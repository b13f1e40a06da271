//! Outbound SMS gateway.
//!
//! The gateway is a trait so the notifier can be constructed with the real
//! Africa's Talking client, a no-op when credentials are absent, or a fake
//! in tests.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

const DEFAULT_API_URL: &str = "https://api.africastalking.com/version1/messaging";

#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Send one message and return the provider-reported delivery status.
    async fn send(&self, phone_number: &str, message: &str) -> anyhow::Result<String>;
}

/// Africa's Talking REST client with a bounded request timeout.
pub struct AfricasTalkingGateway {
    http: reqwest::Client,
    api_url: String,
    username: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(rename = "SMSMessageData")]
    sms_message_data: MessageData,
}

#[derive(Debug, Deserialize)]
struct MessageData {
    #[serde(rename = "Recipients")]
    recipients: Vec<Recipient>,
}

#[derive(Debug, Deserialize)]
struct Recipient {
    status: String,
}

impl AfricasTalkingGateway {
    pub fn new(username: String, api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_url: DEFAULT_API_URL.to_string(),
            username,
            api_key,
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[async_trait]
impl SmsGateway for AfricasTalkingGateway {
    async fn send(&self, phone_number: &str, message: &str) -> anyhow::Result<String> {
        let response = self
            .http
            .post(&self.api_url)
            .header("apiKey", &self.api_key)
            .header("Accept", "application/json")
            .form(&[
                ("username", self.username.as_str()),
                ("to", phone_number),
                ("message", message),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: SendResponse = response.json().await?;
        let status = body
            .sms_message_data
            .recipients
            .first()
            .map(|r| r.status.clone())
            .ok_or_else(|| anyhow::anyhow!("provider returned no recipients"))?;

        Ok(status)
    }
}

/// Gateway used when no SMS credentials are configured. Messages are
/// dropped, the caller still gets a status for the delivery log.
pub struct NoopGateway;

#[async_trait]
impl SmsGateway for NoopGateway {
    async fn send(&self, phone_number: &str, _message: &str) -> anyhow::Result<String> {
        tracing::debug!(phone_number, "SMS client not configured, message dropped");
        Ok("skipped".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(api_url: &str) -> AfricasTalkingGateway {
        AfricasTalkingGateway::new("sandbox".into(), "test-key".into(), Duration::from_secs(2))
            .unwrap()
            .with_api_url(api_url)
    }

    #[tokio::test]
    async fn send_returns_provider_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/version1/messaging"))
            .and(header("apiKey", "test-key"))
            .and(body_string_contains("to=%2B254712345678"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "SMSMessageData": {
                    "Message": "Sent to 1/1",
                    "Recipients": [{"status": "Success", "number": "+254712345678"}]
                }
            })))
            .mount(&server)
            .await;

        let gw = gateway(&format!("{}/version1/messaging", server.uri()));
        let status = gw.send("+254712345678", "Hello").await.unwrap();
        assert_eq!(status, "Success");
    }

    #[tokio::test]
    async fn send_fails_on_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let gw = gateway(&format!("{}/version1/messaging", server.uri()));
        assert!(gw.send("+254712345678", "Hello").await.is_err());
    }

    #[tokio::test]
    async fn send_fails_on_empty_recipients() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "SMSMessageData": {"Message": "none", "Recipients": []}
            })))
            .mount(&server)
            .await;

        let gw = gateway(&format!("{}/version1/messaging", server.uri()));
        assert!(gw.send("+254712345678", "Hello").await.is_err());
    }

    #[tokio::test]
    async fn noop_gateway_reports_skipped() {
        let status = NoopGateway.send("+254712345678", "Hello").await.unwrap();
        assert_eq!(status, "skipped");
    }
}
