//! The delivery boundary: one attempt to hand a message to the remote endpoint.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use tracing::{debug_span, Instrument};

use crate::config::Config;
use crate::error::{DeliveryError, NotifierError, Result};
use crate::message::Message;

/// Something that can deliver a message to a fixed destination.
///
/// Implementations make exactly one attempt per call and must bound their own
/// running time. Retrying is not their job and not the caller's either.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn attempt_deliver(&self, message: &Message) -> std::result::Result<(), DeliveryError>;
}

/// Posts the message body as `text/plain` to the configured URL.
#[derive(Debug, Clone)]
pub struct HttpSender {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl HttpSender {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| NotifierError::ConfigurationError(format!("invalid URL '{}': {}", url, e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifierError::ClientError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.url, config.request_timeout)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn classify(&self, err: reqwest::Error) -> DeliveryError {
        if err.is_timeout() {
            DeliveryError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else if err.is_builder() {
            DeliveryError::invalid_request(err.to_string())
        } else if err.is_connect() {
            DeliveryError::network(format!("connection failed: {}", err))
        } else {
            DeliveryError::network(err.to_string())
        }
    }
}

#[async_trait]
impl NotificationSender for HttpSender {
    async fn attempt_deliver(&self, message: &Message) -> std::result::Result<(), DeliveryError> {
        let span = debug_span!("http_post", message_id = %message.id(), url = %self.url);

        async move {
            tracing::debug!(msg = message.body(), "making http request");
            let started = Instant::now();

            let response = self
                .client
                .post(self.url.clone())
                .header(CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(message.body().to_owned())
                .send()
                .await
                .map_err(|e| self.classify(e))?;

            let status = response.status();
            tracing::debug!(
                status = status.as_u16(),
                duration_ms = started.elapsed().as_millis() as u64,
                "received response"
            );

            if status.is_success() {
                Ok(())
            } else {
                Err(DeliveryError::Rejected {
                    status: status.as_u16(),
                })
            }
        }
        .instrument(span)
        .await
    }
}
