use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{CaseId, CaseStatus, Decision, Verdict};

/// Stored screening case: the submission context plus its verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub case_id: CaseId,
    pub subject_reference: String,
    pub received_at: DateTime<Utc>,
    pub status: CaseStatus,
    pub verdict: Verdict,
}

impl CaseRecord {
    /// Flattened summary for API responses and CLI output.
    pub fn status_view(&self) -> CaseStatusView {
        let conditions = match &self.verdict.decision {
            Decision::ConditionalApprove { conditions } => conditions.clone(),
            _ => Vec::new(),
        };
        CaseStatusView {
            case_id: self.case_id.clone(),
            subject_reference: self.subject_reference.clone(),
            status: self.status.label(),
            decision: self.verdict.decision.label(),
            risk_tier: self.verdict.risk_tier.label(),
            score: self.verdict.score,
            confidence: self.verdict.confidence,
            method: self.verdict.method.label(),
            rationale: self.verdict.rationale.clone(),
            conditions,
        }
    }
}

/// Serializable summary of a case outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseStatusView {
    pub case_id: CaseId,
    pub subject_reference: String,
    pub status: &'static str,
    pub decision: &'static str,
    pub risk_tier: &'static str,
    pub score: f64,
    pub confidence: f64,
    pub method: &'static str,
    pub rationale: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
}

/// Storage abstraction so the service layer can be exercised in isolation.
pub trait CaseRepository: Send + Sync {
    fn insert(&self, record: CaseRecord) -> Result<CaseRecord, RepositoryError>;
    fn fetch(&self, case_id: &CaseId) -> Result<Option<CaseRecord>, RepositoryError>;
    fn pending_review(&self, limit: usize) -> Result<Vec<CaseRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hook for cases that need human attention.
pub trait ReviewAlertPublisher: Send + Sync {
    fn publish(&self, alert: ReviewAlert) -> Result<(), AlertError>;
}

/// Alert raised when a case cannot be cleared automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAlert {
    pub template: String,
    pub case_id: CaseId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}
