// NATS consumer for the netting status checker
// Listens to the trigger subject and evaluates each trigger on its own task

use crate::checker::{CompletionChecker, Evaluation};
use crate::config::{CheckerConfig, NatsConfig};
use crate::errors::{CheckerError, Result};
use crate::metrics::TRIGGERS_RECEIVED_TOTAL;
use async_nats::Client;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct TriggerConsumer {
    checker: Arc<CompletionChecker>,
    permits: Arc<Semaphore>,
}

impl TriggerConsumer {
    pub fn new(checker: Arc<CompletionChecker>, limits: &CheckerConfig) -> Self {
        Self {
            checker,
            permits: Arc::new(Semaphore::new(limits.max_concurrent.max(1))),
        }
    }

    /// Evaluation slots not currently taken
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Wait for a free slot, then evaluate `payload` on its own task.
    pub async fn dispatch(&self, payload: Vec<u8>) -> Result<JoinHandle<Evaluation>> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| CheckerError::Internal(e.to_string()))?;
        let checker = self.checker.clone();

        Ok(tokio::spawn(async move {
            let evaluation = checker.evaluate(&payload).await;
            drop(permit);
            evaluation
        }))
    }

    /// Consume triggers until the subscription closes.
    ///
    /// Triggers are never redelivered: the checker turns every failure into
    /// an outcome message, so receipt is the end of the trigger's life.
    pub async fn run(self, client: Client, nats: &NatsConfig) -> Result<()> {
        let mut subscriber = client
            .queue_subscribe(nats.trigger_subject.clone(), nats.queue_group.clone())
            .await
            .map_err(|e| CheckerError::Nats(e.to_string()))?;

        info!(
            "Subscribed to: {} (queue group: {})",
            nats.trigger_subject, nats.queue_group
        );

        while let Some(msg) = subscriber.next().await {
            TRIGGERS_RECEIVED_TOTAL.inc();
            debug!("Trigger received on {}", msg.subject);
            self.dispatch(msg.payload.to_vec()).await?;
        }

        warn!("Trigger subscription on {} ended", nats.trigger_subject);
        Ok(())
    }
}
