use metrics_exporter_prometheus::PrometheusHandle;
use riskgate::config::AdvisorySettings;
use riskgate::error::AppError;
use riskgate::screening::{
    credit_screening, transaction_screening, AdvisoryClient, AdvisoryConfig, AdvisoryTransport,
    AlertError, CaseId, CaseRecord, CaseRepository, CaseStatus, CompletionRequest, DecisionPolicy,
    RepositoryError, ResponseParser, RetryBackoff, ReviewAlert, ReviewAlertPublisher,
    ScreeningEngine, ScreeningPolicy, ScreeningProfile, TransportFailure, TransportKind,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Line of business selectable from the CLI and the batch endpoint.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ProfileKind {
    #[default]
    Transaction,
    Credit,
}

impl ProfileKind {
    pub(crate) fn load(self) -> ScreeningProfile {
        match self {
            ProfileKind::Transaction => transaction_screening(),
            ProfileKind::Credit => credit_screening(),
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            ProfileKind::Transaction => "transaction",
            ProfileKind::Credit => "credit",
        }
    }
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub(crate) fn advisory_config_from(settings: &AdvisorySettings) -> AdvisoryConfig {
    AdvisoryConfig {
        endpoint: settings.endpoint.clone(),
        model: settings.model.clone(),
        timeout: settings.timeout,
        max_retries: settings.max_retries,
        backoff: RetryBackoff::Fixed(settings.retry_delay),
    }
}

/// Single-attempt configuration paired with [`OfflineTransport`] so offline
/// evaluations settle on the rule verdict without pausing.
pub(crate) fn offline_advisory_config() -> AdvisoryConfig {
    AdvisoryConfig {
        endpoint: "offline".to_string(),
        model: "offline".to_string(),
        timeout: Duration::ZERO,
        max_retries: 1,
        backoff: RetryBackoff::Fixed(Duration::ZERO),
    }
}

pub(crate) fn build_engine<T: AdvisoryTransport + 'static>(
    profile: ScreeningProfile,
    client: AdvisoryClient<T>,
) -> Result<ScreeningEngine<T>, AppError> {
    let policy = ScreeningPolicy {
        decisions: DecisionPolicy::default().with_conditions(profile.conditions),
        ..ScreeningPolicy::default()
    };
    let engine = ScreeningEngine::new(
        profile.rules,
        policy,
        client,
        ResponseParser::default(),
        Arc::new(profile.prompt),
    )?;
    Ok(engine)
}

/// Transport that refuses every delivery. Evaluations run rule-only.
#[derive(Default, Clone)]
pub(crate) struct OfflineTransport;

impl AdvisoryTransport for OfflineTransport {
    fn send(&self, _request: &CompletionRequest) -> Result<String, TransportFailure> {
        Err(TransportFailure {
            kind: TransportKind::Network,
            detail: "advisory model disabled".to_string(),
        })
    }
}

/// Transport that replays a fixed script of advisory bodies, one per
/// request, then refuses further deliveries. Drives the CLI demo.
#[derive(Default, Clone)]
pub(crate) struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Result<String, TransportFailure>>>>,
}

impl ScriptedTransport {
    pub(crate) fn push_advisory(&self, body: &str) {
        let envelope = serde_json::json!({ "response": body }).to_string();
        self.script
            .lock()
            .expect("script mutex poisoned")
            .push_back(Ok(envelope));
    }

    pub(crate) fn push_outage(&self) {
        self.script
            .lock()
            .expect("script mutex poisoned")
            .push_back(Err(TransportFailure {
                kind: TransportKind::Network,
                detail: "scripted outage".to_string(),
            }));
    }
}

impl AdvisoryTransport for ScriptedTransport {
    fn send(&self, _request: &CompletionRequest) -> Result<String, TransportFailure> {
        let mut script = self.script.lock().expect("script mutex poisoned");
        script.pop_front().unwrap_or_else(|| {
            Err(TransportFailure {
                kind: TransportKind::Network,
                detail: "script exhausted".to_string(),
            })
        })
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryCaseRepository {
    records: Arc<Mutex<HashMap<CaseId, CaseRecord>>>,
}

impl CaseRepository for InMemoryCaseRepository {
    fn insert(&self, record: CaseRecord) -> Result<CaseRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.case_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.case_id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, case_id: &CaseId) -> Result<Option<CaseRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(case_id).cloned())
    }

    fn pending_review(&self, limit: usize) -> Result<Vec<CaseRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut pending: Vec<CaseRecord> = guard
            .values()
            .filter(|record| record.status == CaseStatus::PendingReview)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.case_id.cmp(&b.case_id));
        pending.truncate(limit);
        Ok(pending)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryReviewAlerts {
    events: Arc<Mutex<Vec<ReviewAlert>>>,
}

impl ReviewAlertPublisher for InMemoryReviewAlerts {
    fn publish(&self, alert: ReviewAlert) -> Result<(), AlertError> {
        let mut guard = self.events.lock().expect("alert mutex poisoned");
        guard.push(alert);
        Ok(())
    }
}

impl InMemoryReviewAlerts {
    pub(crate) fn events(&self) -> Vec<ReviewAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}
