// Status log for the checker's own processing of a netting process.
// The record under the log key doubles as the idempotency guard.

use crate::config::ClaimMode;
use crate::errors::Result;
use crate::models::{NettingMessage, ProcessStatus, StatusLogRecord};
use crate::store::SetStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusLogger: Send + Sync {
    /// Write `record` under `log_key`, replacing whatever is there
    async fn log_status(&self, log_key: &str, record: &StatusLogRecord) -> Result<()>;

    /// Write the Begin record, claiming the right to finish the process.
    /// Returns the written record, or None when the process was already claimed.
    async fn claim(&self, trigger: &NettingMessage, log_key: &str, mode: ClaimMode)
        -> Result<Option<StatusLogRecord>>;
}

pub struct StoreStatusLogger {
    store: Arc<dyn SetStore>,
}

impl StoreStatusLogger {
    pub fn new(store: Arc<dyn SetStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StatusLogger for StoreStatusLogger {
    async fn log_status(&self, log_key: &str, record: &StatusLogRecord) -> Result<()> {
        self.store.set_record(log_key, record).await?;

        info!(
            "Logged status {} for {} (activity: {})",
            record.status, record.trx_id, record.activity
        );
        Ok(())
    }

    async fn claim(
        &self,
        trigger: &NettingMessage,
        log_key: &str,
        mode: ClaimMode,
    ) -> Result<Option<StatusLogRecord>> {
        let record = StatusLogRecord::new(trigger, ProcessStatus::Begin);

        let claimed = match mode {
            ClaimMode::Atomic => self.store.set_record_if_absent(log_key, &record).await?,
            ClaimMode::CheckThenSet => {
                // Two evaluations can both pass this check before either writes
                if self.store.get_marker(log_key).await?.is_some() {
                    debug!("{} already present", log_key);
                    false
                } else {
                    self.store.set_record(log_key, &record).await?;
                    true
                }
            }
        };

        if !claimed {
            return Ok(None);
        }

        info!("Claimed {} for {} (activity: {})", log_key, trigger.trx_id, trigger.activity);
        Ok(Some(record))
    }
}
