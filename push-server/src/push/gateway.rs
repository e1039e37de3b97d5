//! Webhook delivery gateway.
//!
//! The one seam between the delivery engine and the network, so tests and
//! tooling can swap the HTTP client for a scripted mock.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

/// Errors from the push HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// Request could not be completed (connect failure, timeout, ...).
    #[error("push request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// What one delivery attempt came back with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Any 2xx other than the forget-me acknowledgement.
    Delivered,
    /// The subscriber asked to never be contacted again.
    ForgetMe,
    /// A non-2xx response.
    Failed { status: Option<u16> },
}

/// Delivers one serialized payload to one webhook address.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn deliver(
        &self,
        address: &str,
        body: &serde_json::Value,
    ) -> Result<PushOutcome, PushError>;
}

/// Production gateway posting JSON over HTTP.
///
/// The timeout is short and bounded so one slow subscriber cannot exhaust
/// the delivery workers.
pub struct HttpPushGateway {
    http: reqwest::Client,
}

impl HttpPushGateway {
    pub fn new(timeout: Duration) -> Result<Self, PushError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PushGateway for HttpPushGateway {
    async fn deliver(
        &self,
        address: &str,
        body: &serde_json::Value,
    ) -> Result<PushOutcome, PushError> {
        let response = self.http.post(address).json(body).send().await?;
        let status = response.status();

        // 205 Reset Content is the subscriber's "stop sending" signal.
        if status == StatusCode::RESET_CONTENT {
            Ok(PushOutcome::ForgetMe)
        } else if status.is_success() {
            Ok(PushOutcome::Delivered)
        } else {
            Ok(PushOutcome::Failed {
                status: Some(status.as_u16()),
            })
        }
    }
}
