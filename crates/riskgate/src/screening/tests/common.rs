use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use crate::screening::advisory::{
    AdvisoryClient, AdvisoryConfig, AdvisoryTransport, CompletionRequest, RetryBackoff,
    ScreeningPrompt, TransportFailure, TransportKind,
};
use crate::screening::domain::{FeatureMap, FeatureValue, ScreeningSubmission};
use crate::screening::engine::{ScreeningEngine, ScreeningPolicy};
use crate::screening::presets::transaction_screening;
use crate::screening::repository::{
    AlertError, CaseRecord, CaseRepository, RepositoryError, ReviewAlert, ReviewAlertPublisher,
};
use crate::screening::service::ScreeningService;
use crate::screening::{DecisionPolicy, ResponseParser};

pub(super) fn feature_map(entries: &[(&str, FeatureValue)]) -> FeatureMap {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

pub(super) fn number(value: f64) -> FeatureValue {
    FeatureValue::Number(value)
}

pub(super) fn text(value: &str) -> FeatureValue {
    FeatureValue::Text(value.to_string())
}

pub(super) fn flag(value: bool) -> FeatureValue {
    FeatureValue::Flag(value)
}

/// Low-value weekday card purchase in a domestic location; fires nothing.
pub(super) fn clean_purchase() -> FeatureMap {
    feature_map(&[
        ("amount", number(50.0)),
        ("location", text("New York, USA")),
        ("hour", number(14.0)),
        ("is_weekend", flag(false)),
        ("merchant_category", text("grocery")),
        ("transaction_type", text("purchase")),
        ("customer_risk_profile", text("low")),
    ])
}

/// Wire transfer structured just below the reporting threshold from an
/// unverified location; fires the high-amount, structured-amount,
/// wire-transfer, and high-risk-location rules.
pub(super) fn structured_wire() -> FeatureMap {
    feature_map(&[
        ("amount", number(9_500.0)),
        ("location", text("Unknown Location")),
        ("hour", number(14.0)),
        ("is_weekend", flag(false)),
        ("merchant_category", text("wire_transfer")),
        ("transaction_type", text("purchase")),
        ("customer_risk_profile", text("low")),
    ])
}

/// Advisory reply JSON with the default required fields populated.
pub(super) fn advisory_json(score: f64, risk_level: &str, reason: &str) -> String {
    json!({
        "score": score,
        "risk_level": risk_level,
        "confidence": 80,
        "indicators": ["model_flag"],
        "risk_factors": ["Model-identified factor"],
        "reason": reason,
        "decision_hint": "manual_review",
    })
    .to_string()
}

/// Wrap advisory text in the completion envelope the endpoint returns.
pub(super) fn envelope(response_text: &str) -> String {
    json!({ "response": response_text }).to_string()
}

pub(super) fn test_advisory_config() -> AdvisoryConfig {
    AdvisoryConfig {
        endpoint: "http://advisory.test/api/generate".to_string(),
        model: "test-model".to_string(),
        timeout: Duration::from_secs(1),
        max_retries: 3,
        backoff: RetryBackoff::Fixed(Duration::ZERO),
    }
}

pub(super) fn advisory_client<T: AdvisoryTransport>(transport: T) -> AdvisoryClient<T> {
    AdvisoryClient::new(test_advisory_config(), transport)
}

/// Transaction-profile engine over the given transport.
pub(super) fn transaction_engine<T: AdvisoryTransport>(transport: T) -> ScreeningEngine<T> {
    let profile = transaction_screening();
    let policy = ScreeningPolicy {
        decisions: DecisionPolicy::default().with_conditions(profile.conditions),
        ..ScreeningPolicy::default()
    };
    ScreeningEngine::new(
        profile.rules,
        policy,
        advisory_client(transport),
        ResponseParser::default(),
        Arc::new(profile.prompt),
    )
    .expect("transaction profile policy is valid")
}

/// Engine with no rules configured, for degraded-path coverage.
pub(super) fn vacuous_engine<T: AdvisoryTransport>(transport: T) -> ScreeningEngine<T> {
    ScreeningEngine::new(
        crate::screening::rules::RuleTable::default(),
        ScreeningPolicy::default(),
        advisory_client(transport),
        ResponseParser::default(),
        Arc::new(test_prompt()),
    )
    .expect("default policy is valid")
}

pub(super) fn submission(reference: &str, features: FeatureMap) -> ScreeningSubmission {
    ScreeningSubmission {
        subject_reference: reference.to_string(),
        features,
    }
}

pub(super) fn service_with<T: AdvisoryTransport + 'static>(
    engine: ScreeningEngine<T>,
) -> (
    ScreeningService<MemoryRepository, MemoryAlerts, T>,
    Arc<MemoryRepository>,
    Arc<MemoryAlerts>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let alerts = Arc::new(MemoryAlerts::default());
    let service = ScreeningService::new(engine, Arc::clone(&repository), Arc::clone(&alerts));
    (service, repository, alerts)
}

/// Transport double that always answers with the same body and records
/// every request it sees.
#[derive(Clone)]
pub(super) struct CannedTransport {
    body: String,
    calls: Arc<AtomicU32>,
    last_prompt: Arc<Mutex<Option<String>>>,
}

impl CannedTransport {
    pub(super) fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            calls: Arc::new(AtomicU32::new(0)),
            last_prompt: Arc::new(Mutex::new(None)),
        }
    }

    /// Canned transport whose body is a well-formed envelope around the
    /// given advisory JSON.
    pub(super) fn answering(advisory_body: &str) -> Self {
        Self::new(envelope(advisory_body))
    }

    pub(super) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .expect("prompt mutex poisoned")
            .clone()
    }
}

impl AdvisoryTransport for CannedTransport {
    fn send(&self, request: &CompletionRequest) -> Result<String, TransportFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().expect("prompt mutex poisoned") = Some(request.prompt.clone());
        Ok(self.body.clone())
    }
}

/// Transport double that fails every attempt with the same failure.
#[derive(Clone)]
pub(super) struct FailingTransport {
    kind: TransportKind,
    calls: Arc<AtomicU32>,
}

impl FailingTransport {
    pub(super) fn new(kind: TransportKind) -> Self {
        Self {
            kind,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub(super) fn network() -> Self {
        Self::new(TransportKind::Network)
    }

    pub(super) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AdvisoryTransport for FailingTransport {
    fn send(&self, _request: &CompletionRequest) -> Result<String, TransportFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(TransportFailure {
            kind: self.kind,
            detail: "connection refused".to_string(),
        })
    }
}

/// Transport double that plays back a scripted sequence of outcomes.
#[derive(Clone)]
pub(super) struct SequenceTransport {
    script: Arc<Mutex<VecDeque<Result<String, TransportFailure>>>>,
    calls: Arc<AtomicU32>,
}

impl SequenceTransport {
    pub(super) fn new(script: Vec<Result<String, TransportFailure>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub(super) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AdvisoryTransport for SequenceTransport {
    fn send(&self, _request: &CompletionRequest) -> Result<String, TransportFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .expect("script mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportFailure {
                    kind: TransportKind::Network,
                    detail: "script exhausted".to_string(),
                })
            })
    }
}

/// In-memory repository double.
#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<HashMap<String, CaseRecord>>,
}

impl MemoryRepository {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl CaseRepository for MemoryRepository {
    fn insert(&self, record: CaseRecord) -> Result<CaseRecord, RepositoryError> {
        let mut records = self.records.lock().expect("repository mutex poisoned");
        if records.contains_key(&record.case_id.0) {
            return Err(RepositoryError::Conflict);
        }
        records.insert(record.case_id.0.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, case_id: &crate::screening::CaseId) -> Result<Option<CaseRecord>, RepositoryError> {
        let records = self.records.lock().expect("repository mutex poisoned");
        Ok(records.get(&case_id.0).cloned())
    }

    fn pending_review(&self, limit: usize) -> Result<Vec<CaseRecord>, RepositoryError> {
        let records = self.records.lock().expect("repository mutex poisoned");
        let mut pending: Vec<CaseRecord> = records
            .values()
            .filter(|record| record.status == crate::screening::CaseStatus::PendingReview)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.case_id.cmp(&b.case_id));
        pending.truncate(limit);
        Ok(pending)
    }
}

/// Repository double that rejects every insert with a conflict.
#[derive(Default)]
pub(super) struct ConflictRepository;

impl CaseRepository for ConflictRepository {
    fn insert(&self, _record: CaseRecord) -> Result<CaseRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn fetch(&self, _case_id: &crate::screening::CaseId) -> Result<Option<CaseRecord>, RepositoryError> {
        Ok(None)
    }

    fn pending_review(&self, _limit: usize) -> Result<Vec<CaseRecord>, RepositoryError> {
        Ok(Vec::new())
    }
}

/// Repository double that reports an outage on every call.
#[derive(Default)]
pub(super) struct UnavailableRepository;

impl CaseRepository for UnavailableRepository {
    fn insert(&self, _record: CaseRecord) -> Result<CaseRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance window".to_string()))
    }

    fn fetch(&self, _case_id: &crate::screening::CaseId) -> Result<Option<CaseRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance window".to_string()))
    }

    fn pending_review(&self, _limit: usize) -> Result<Vec<CaseRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance window".to_string()))
    }
}

/// Alert publisher double that records published alerts.
#[derive(Default)]
pub(super) struct MemoryAlerts {
    events: Mutex<Vec<ReviewAlert>>,
}

impl MemoryAlerts {
    pub(super) fn events(&self) -> Vec<ReviewAlert> {
        self.events.lock().expect("alerts mutex poisoned").clone()
    }
}

impl ReviewAlertPublisher for MemoryAlerts {
    fn publish(&self, alert: ReviewAlert) -> Result<(), AlertError> {
        self.events.lock().expect("alerts mutex poisoned").push(alert);
        Ok(())
    }
}

/// Default prompt builder for tests that only need a placeholder.
pub(super) fn test_prompt() -> ScreeningPrompt {
    ScreeningPrompt {
        analyst_role: "a risk analyst".to_string(),
        subject_noun: "transaction".to_string(),
    }
}
