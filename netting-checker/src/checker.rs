//! Completion detection for multi-part netting processes.
//!
//! Every part of a process reports into three sets in the store
//! (`SOURCE`, `COMPLETED`, `FAILED`) and emits a trigger. Each trigger makes
//! the checker compute `SOURCE - COMPLETED - FAILED`; once nothing remains,
//! the first evaluation that claims the log marker publishes the outcome.

use crate::audit::StatusLogger;
use crate::config::ClaimMode;
use crate::errors::{CheckerError, Result};
use crate::metrics::{EVALUATIONS_IN_FLIGHT, EVALUATIONS_TOTAL, EVALUATION_DURATION};
use crate::models::{
    error_message, failed_message, NettingKeys, NettingMessage, ProcessStatus, TriggerIdentity,
    COMPLETED_MESSAGE,
};
use crate::publisher::OutcomePublisher;
use crate::store::SetStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

/// What a single trigger evaluation decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Parts still outstanding, nothing emitted
    InProgress { remaining: usize },
    /// Process already claimed by an earlier evaluation
    Duplicate,
    Completed,
    Failed { failed_parts: Vec<String> },
    /// Evaluation hit an error; a failure outcome was attempted
    Errored,
}

impl Evaluation {
    pub fn label(&self) -> &'static str {
        match self {
            Evaluation::InProgress { .. } => "in_progress",
            Evaluation::Duplicate => "duplicate",
            Evaluation::Completed => "completed",
            Evaluation::Failed { .. } => "failed",
            Evaluation::Errored => "errored",
        }
    }
}

pub struct CompletionChecker {
    store: Arc<dyn SetStore>,
    publisher: Arc<dyn OutcomePublisher>,
    status_log: Arc<dyn StatusLogger>,
    outcome_subject: String,
    claim_mode: ClaimMode,
}

impl CompletionChecker {
    pub fn new(
        store: Arc<dyn SetStore>,
        publisher: Arc<dyn OutcomePublisher>,
        status_log: Arc<dyn StatusLogger>,
        outcome_subject: impl Into<String>,
        claim_mode: ClaimMode,
    ) -> Self {
        Self {
            store,
            publisher,
            status_log,
            outcome_subject: outcome_subject.into(),
            claim_mode,
        }
    }

    /// Evaluate one raw trigger payload.
    ///
    /// Never fails: errors are turned into a failure outcome and logged, so
    /// the trigger counts as consumed whatever happens.
    pub async fn evaluate(&self, payload: &[u8]) -> Evaluation {
        let start = Instant::now();
        EVALUATIONS_IN_FLIGHT.inc();

        let evaluation = match NettingMessage::from_slice(payload) {
            Ok(trigger) => match self.check(&trigger).await {
                Ok(evaluation) => evaluation,
                Err(e) => self.contain(trigger.trx_id, &trigger.activity, e).await,
            },
            Err(e) => {
                let identity = TriggerIdentity::salvage(payload);
                self.contain(identity.trx_id, &identity.activity, e).await
            }
        };

        EVALUATIONS_IN_FLIGHT.dec();
        EVALUATION_DURATION.observe(start.elapsed().as_secs_f64());
        EVALUATIONS_TOTAL.with_label_values(&[evaluation.label()]).inc();

        evaluation
    }

    async fn check(&self, trigger: &NettingMessage) -> Result<Evaluation> {
        let keys = NettingKeys::new(&trigger.activity, trigger.trx_id);

        let remaining = self.store.set_difference(&keys.difference_operands()).await?;
        if !remaining.is_empty() {
            debug!(
                "{} part(s) outstanding for {} (activity: {})",
                remaining.len(),
                trigger.trx_id,
                trigger.activity
            );
            return Ok(Evaluation::InProgress { remaining: remaining.len() });
        }

        let Some(begin) = self.status_log.claim(trigger, &keys.log, self.claim_mode).await? else {
            debug!("Skipping already processed {} (activity: {})", trigger.trx_id, trigger.activity);
            return Ok(Evaluation::Duplicate);
        };

        let failed_parts = self.store.set_members(&keys.failed).await?;
        let (status, text, evaluation) = if failed_parts.is_empty() {
            (ProcessStatus::Completed, COMPLETED_MESSAGE.to_string(), Evaluation::Completed)
        } else {
            let text = failed_message(&failed_parts);
            (ProcessStatus::Failed, text, Evaluation::Failed { failed_parts })
        };

        let record = begin.finish(status, text.clone());
        let outcome = NettingMessage::outcome(trigger.trx_id, &trigger.activity, status, text);

        // Both side effects are attempted even if one of them fails
        let (published, logged) = tokio::join!(
            self.publisher.publish(&self.outcome_subject, &outcome),
            self.status_log.log_status(&keys.log, &record),
        );
        published?;
        logged?;

        info!(
            "Netting process {} (activity: {}) finished with status {}",
            trigger.trx_id, trigger.activity, status
        );

        Ok(evaluation)
    }

    /// Publish a failure outcome for an evaluation that errored
    async fn contain(&self, trx_id: Uuid, activity: &str, err: CheckerError) -> Evaluation {
        error!(
            "Error occurred on trxId: {} and activity: {} with error message: {}",
            trx_id, activity, err
        );

        let outcome = NettingMessage::outcome(trx_id, activity, ProcessStatus::Failed, error_message(&err));
        if let Err(publish_err) = self.publisher.publish(&self.outcome_subject, &outcome).await {
            error!(
                "Failed to publish failure outcome for {} (activity: {}): {}",
                trx_id, activity, publish_err
            );
        }

        Evaluation::Errored
    }
}
