use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::advisory::AdvisoryTransport;
use super::domain::{CaseId, CaseStatus, Decision, ScreeningSubmission};
use super::engine::ScreeningEngine;
use super::repository::{
    AlertError, CaseRecord, CaseRepository, RepositoryError, ReviewAlert, ReviewAlertPublisher,
};

static CASE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_case_id() -> CaseId {
    let id = CASE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CaseId(format!("case-{id:06}"))
}

/// Orchestrates one screening end to end: evaluate, persist, and raise an
/// alert when the verdict needs human follow-up.
pub struct ScreeningService<R, A, T: AdvisoryTransport> {
    engine: Arc<ScreeningEngine<T>>,
    repository: Arc<R>,
    alerts: Arc<A>,
}

impl<R, A, T> ScreeningService<R, A, T>
where
    R: CaseRepository + 'static,
    A: ReviewAlertPublisher + 'static,
    T: AdvisoryTransport + 'static,
{
    pub fn new(engine: ScreeningEngine<T>, repository: Arc<R>, alerts: Arc<A>) -> Self {
        Self {
            engine: Arc::new(engine),
            repository,
            alerts,
        }
    }

    /// Screen a submission and store the outcome. The verdict itself can
    /// never fail; only persistence and alerting can.
    pub fn screen(
        &self,
        submission: ScreeningSubmission,
    ) -> Result<CaseRecord, ScreeningServiceError> {
        if submission.subject_reference.trim().is_empty() {
            return Err(ScreeningServiceError::EmptySubjectReference);
        }

        let verdict = self.engine.evaluate(&submission.features);
        let case_id = next_case_id();
        let status = status_for(&verdict.decision);

        let record = CaseRecord {
            case_id: case_id.clone(),
            subject_reference: submission.subject_reference,
            received_at: Utc::now(),
            status,
            verdict,
        };
        let stored = self.repository.insert(record)?;

        if let Some(template) = alert_template(&stored.verdict.decision) {
            let mut details = BTreeMap::new();
            details.insert(
                "subject_reference".to_string(),
                stored.subject_reference.clone(),
            );
            details.insert("decision".to_string(), stored.verdict.decision.summary());
            details.insert(
                "risk_tier".to_string(),
                stored.verdict.risk_tier.label().to_string(),
            );
            details.insert("score".to_string(), format!("{:.1}", stored.verdict.score));
            self.alerts.publish(ReviewAlert {
                template: template.to_string(),
                case_id: case_id.clone(),
                details,
            })?;
        }

        info!(
            case = %stored.case_id.0,
            status = stored.status.label(),
            decision = stored.verdict.decision.label(),
            "screening case stored"
        );
        Ok(stored)
    }

    pub fn get(&self, case_id: &CaseId) -> Result<CaseRecord, ScreeningServiceError> {
        let record = self
            .repository
            .fetch(case_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn pending_review(&self, limit: usize) -> Result<Vec<CaseRecord>, ScreeningServiceError> {
        Ok(self.repository.pending_review(limit)?)
    }
}

fn status_for(decision: &Decision) -> CaseStatus {
    match decision {
        Decision::Approve => CaseStatus::Cleared,
        Decision::ConditionalApprove { .. } => CaseStatus::ConditionallyCleared,
        Decision::ManualReview { .. } => CaseStatus::PendingReview,
        Decision::Reject => CaseStatus::Declined,
    }
}

fn alert_template(decision: &Decision) -> Option<&'static str> {
    match decision {
        Decision::ManualReview { .. } => Some("case_review_needed"),
        Decision::Reject => Some("case_declined"),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScreeningServiceError {
    #[error("subject reference must not be empty")]
    EmptySubjectReference,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Alert(#[from] AlertError),
}
