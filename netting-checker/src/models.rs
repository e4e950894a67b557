use crate::errors::{CheckerError, Result};
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Outcome text published when every part finished successfully
pub const COMPLETED_MESSAGE: &str = "Netting process complete";

/// Status of a netting part or of the whole process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProcessStatus {
    Begin,
    Failed,
    Completed,
}

impl ProcessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStatus::Begin => "Begin",
            ProcessStatus::Failed => "Failed",
            ProcessStatus::Completed => "Completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProcessStatus::Begin)
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessStatus {
    type Err = CheckerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "begin" => Ok(ProcessStatus::Begin),
            "failed" => Ok(ProcessStatus::Failed),
            "completed" => Ok(ProcessStatus::Completed),
            other => Err(CheckerError::InvalidStatus(other.to_string())),
        }
    }
}

impl TryFrom<u8> for ProcessStatus {
    type Error = CheckerError;

    // Ordinals used by producers that serialize the status as an integer
    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(ProcessStatus::Begin),
            1 => Ok(ProcessStatus::Failed),
            2 => Ok(ProcessStatus::Completed),
            other => Err(CheckerError::InvalidStatus(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for ProcessStatus {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Name(String),
            Code(u8),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Name(name) => name.parse().map_err(de::Error::custom),
            Repr::Code(code) => ProcessStatus::try_from(code).map_err(de::Error::custom),
        }
    }
}

/// Message exchanged on both the trigger and the outcome subjects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NettingMessage {
    #[serde(alias = "TrxId")]
    pub trx_id: Uuid,
    #[serde(alias = "Timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(alias = "Activity")]
    pub activity: String,
    #[serde(alias = "Status")]
    pub status: ProcessStatus,
    #[serde(alias = "Message", default)]
    pub message: Option<String>,
}

impl NettingMessage {
    /// Build an outcome for a transaction, stamped with the current time
    pub fn outcome(trx_id: Uuid, activity: &str, status: ProcessStatus, message: impl Into<String>) -> Self {
        Self {
            trx_id,
            timestamp: Utc::now(),
            activity: activity.to_string(),
            status,
            message: Some(message.into()),
        }
    }

    /// Parse and validate a trigger payload
    pub fn from_slice(payload: &[u8]) -> Result<Self> {
        let trigger: NettingMessage = serde_json::from_slice(payload)
            .map_err(|e| CheckerError::MalformedTrigger(e.to_string()))?;

        if trigger.activity.trim().is_empty() {
            return Err(CheckerError::MalformedTrigger("activity is empty".to_string()));
        }

        Ok(trigger)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Whatever identifies a transaction in a payload that failed validation.
///
/// Used to address the failure outcome for a malformed trigger: fields that
/// cannot be recovered fall back to the nil id and an empty activity.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerIdentity {
    pub trx_id: Uuid,
    pub activity: String,
}

impl TriggerIdentity {
    pub fn salvage(payload: &[u8]) -> Self {
        let value: serde_json::Value = serde_json::from_slice(payload).unwrap_or_default();

        let field = |camel: &str, pascal: &str| {
            value
                .get(camel)
                .or_else(|| value.get(pascal))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        Self {
            trx_id: field("trxId", "TrxId")
                .and_then(|id| Uuid::parse_str(&id).ok())
                .unwrap_or_else(Uuid::nil),
            activity: field("activity", "Activity").unwrap_or_default(),
        }
    }
}

/// Store keys scoped to one `(activity, trx_id)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NettingKeys {
    pub log: String,
    pub source: String,
    pub completed: String,
    pub failed: String,
}

impl NettingKeys {
    pub fn new(activity: &str, trx_id: Uuid) -> Self {
        let scope = format!("{}_{}", activity, trx_id);
        Self {
            log: format!("LOG_STATUS_CHECKER_{}", scope),
            source: format!("SOURCE_{}", scope),
            completed: format!("COMPLETED_{}", scope),
            failed: format!("FAILED_{}", scope),
        }
    }

    /// Operands for `SOURCE - COMPLETED - FAILED`, minuend first
    pub fn difference_operands(&self) -> [String; 3] {
        [self.source.clone(), self.completed.clone(), self.failed.clone()]
    }
}

/// Status marker the checker keeps under the log key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusLogRecord {
    pub trx_id: Uuid,
    pub activity: String,
    pub status: ProcessStatus,
    pub message: Option<String>,
    pub begin: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
}

impl StatusLogRecord {
    pub fn new(trigger: &NettingMessage, status: ProcessStatus) -> Self {
        let now = Utc::now();
        Self {
            trx_id: trigger.trx_id,
            activity: trigger.activity.clone(),
            status,
            message: trigger.message.clone(),
            begin: (status == ProcessStatus::Begin).then_some(now),
            timestamp: now,
        }
    }

    /// Terminal record for a claimed process, keeping the claim's begin time
    pub fn finish(&self, status: ProcessStatus, message: impl Into<String>) -> Self {
        Self {
            trx_id: self.trx_id,
            activity: self.activity.clone(),
            status,
            message: Some(message.into()),
            begin: self.begin,
            timestamp: Utc::now(),
        }
    }
}

/// Outcome text for a process with failed parts
pub fn failed_message(failed_parts: &[String]) -> String {
    let mut parts = failed_parts.to_vec();
    parts.sort();
    format!("Netting process for {} data failed", parts.join(", "))
}

/// Outcome text for a process that could not be evaluated
pub fn error_message(err: &CheckerError) -> String {
    format!("Netting process failed because: {}", err)
}
