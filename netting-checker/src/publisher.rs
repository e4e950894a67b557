//! Outcome publishing over NATS

use crate::errors::{CheckerError, Result};
use crate::metrics::{OUTCOME_PUBLISH_DURATION, OUTCOME_PUBLISH_TOTAL};
use crate::models::NettingMessage;
use async_nats::Client;
use async_trait::async_trait;
use std::time::Instant;
use tracing::{error, info};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutcomePublisher: Send + Sync {
    /// Publish a terminal outcome to `subject`
    async fn publish(&self, subject: &str, outcome: &NettingMessage) -> Result<()>;
}

/// Raw subject transport underneath the outcome publisher
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubjectSender: Send + Sync {
    async fn send(&self, subject: &str, payload: Vec<u8>) -> Result<()>;

    async fn flush(&self) -> Result<()>;
}

#[async_trait]
impl SubjectSender for Client {
    async fn send(&self, subject: &str, payload: Vec<u8>) -> Result<()> {
        Client::publish(self, subject.to_string(), payload.into())
            .await
            .map_err(|e| CheckerError::Nats(e.to_string()))
    }

    async fn flush(&self) -> Result<()> {
        Client::flush(self)
            .await
            .map_err(|e| CheckerError::Nats(format!("Flush failed: {}", e)))
    }
}

/// Publishes each outcome exactly once. A failed send or flush is returned
/// to the caller and never resent, since the message may already be out.
pub struct NatsOutcomePublisher<S = Client> {
    sender: S,
}

impl<S: SubjectSender> NatsOutcomePublisher<S> {
    pub fn new(sender: S) -> Self {
        Self { sender }
    }

    async fn publish_once(&self, subject: &str, payload: Vec<u8>) -> Result<()> {
        self.sender.send(subject, payload).await?;

        // Flush so a publish that never reaches the server surfaces as an error
        self.sender.flush().await
    }
}

#[async_trait]
impl<S: SubjectSender> OutcomePublisher for NatsOutcomePublisher<S> {
    async fn publish(&self, subject: &str, outcome: &NettingMessage) -> Result<()> {
        let start = Instant::now();
        let payload = outcome.to_bytes()?;

        let result = self.publish_once(subject, payload).await;

        OUTCOME_PUBLISH_DURATION.observe(start.elapsed().as_secs_f64());
        let status = if result.is_ok() { "success" } else { "error" };
        OUTCOME_PUBLISH_TOTAL
            .with_label_values(&[outcome.status.as_str(), status])
            .inc();

        match &result {
            Ok(()) => info!(
                "Published {} outcome for {} to {}",
                outcome.status, outcome.trx_id, subject
            ),
            Err(e) => error!(
                "Failed to publish {} outcome for {} to {}: {}",
                outcome.status, outcome.trx_id, subject, e
            ),
        }

        result
    }
}
