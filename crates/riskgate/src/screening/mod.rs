//! Screening pipeline for the hybrid decision engine.
//!
//! A deterministic rule pass always runs first; a best-effort advisory
//! model may refine it; the combined assessment is mapped to a routing
//! decision. The service, repository, and router pieces wrap that pipeline
//! for storage and HTTP access.

pub mod advisory;
pub mod combine;
pub mod dataset;
pub mod decision;
pub mod domain;
pub mod engine;
pub mod presets;
pub mod repository;
pub mod router;
pub mod rules;
pub mod service;

#[cfg(test)]
mod tests;

pub use combine::CombinePolicy;
pub use dataset::{DatasetError, SubmissionImporter};
pub use decision::DecisionPolicy;
pub use domain::{
    AdvisoryVerdict, CaseId, CaseStatus, Decision, DecisionHint, EvaluationMethod, FeatureMap,
    FeatureValue, RiskTier, RuleVerdict, ScreeningSubmission, TierThresholds, Verdict,
};
pub use engine::{PolicyError, ScreeningEngine, ScreeningPolicy};
pub use presets::{credit_screening, transaction_screening, ScreeningProfile};
pub use repository::{
    AlertError, CaseRecord, CaseRepository, CaseStatusView, RepositoryError, ReviewAlert,
    ReviewAlertPublisher,
};
pub use router::screening_router;
pub use rules::{Band, Predicate, Rule, RuleEngine, RuleTable, Trigger};
pub use service::{ScreeningService, ScreeningServiceError};

pub use advisory::{
    AdvisoryClient, AdvisoryConfig, AdvisoryError, AdvisoryTransport, CompletionRequest,
    HttpTransport, ParseError, PromptBuilder, ResponseParser, ResponseSchema, RetryBackoff,
    ScreeningPrompt, TransportFailure, TransportKind,
};
