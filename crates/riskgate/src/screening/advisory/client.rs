use std::fmt;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Connection settings for the advisory completion endpoint.
#[derive(Debug, Clone)]
pub struct AdvisoryConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
    /// Total attempt budget. One request plus up to `max_retries - 1`
    /// re-sends of the identical payload.
    pub max_retries: u32,
    pub backoff: RetryBackoff,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/api/generate".to_string(),
            model: "llama3.2:1b".to_string(),
            timeout: Duration::from_secs(45),
            max_retries: 3,
            backoff: RetryBackoff::Fixed(Duration::from_secs(1)),
        }
    }
}

/// Delay schedule applied between advisory attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryBackoff {
    /// The same pause before every retry.
    Fixed(Duration),
    /// Pause grows by one step per completed attempt.
    Linear(Duration),
}

impl RetryBackoff {
    pub(crate) fn delay_after(self, completed_attempts: u32) -> Duration {
        match self {
            RetryBackoff::Fixed(step) => step,
            RetryBackoff::Linear(step) => step * completed_attempts,
        }
    }
}

/// Request body for the Ollama-style completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

/// Success envelope. Any 200 body that does not decode to this shape is a
/// malformed response, not a transport failure, and is never retried.
#[derive(Debug, Deserialize)]
struct CompletionEnvelope {
    response: String,
}

/// Why a single delivery attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Network,
    Timeout,
    HttpStatus(u16),
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Network => write!(f, "network error"),
            TransportKind::Timeout => write!(f, "timeout"),
            TransportKind::HttpStatus(code) => write!(f, "http status {code}"),
        }
    }
}

/// One failed delivery attempt, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct TransportFailure {
    pub kind: TransportKind,
    pub detail: String,
}

/// Advisory path failure. Callers treat every variant the same way: the
/// advisory signal is simply absent for this evaluation.
#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    #[error("advisory http client could not be constructed: {0}")]
    Client(String),
    #[error("advisory endpoint unavailable after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: TransportFailure },
    #[error("advisory endpoint returned an unexpected envelope: {detail}")]
    Envelope { detail: String },
}

/// Delivery seam so retry behavior can be exercised without a live model.
pub trait AdvisoryTransport: Send + Sync {
    /// Deliver one request and return the raw response body.
    fn send(&self, request: &CompletionRequest) -> Result<String, TransportFailure>;
}

/// Blocking HTTP transport against the configured endpoint.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(config: &AdvisoryConfig) -> Result<Self, AdvisoryError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| AdvisoryError::Client(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

impl AdvisoryTransport for HttpTransport {
    fn send(&self, request: &CompletionRequest) -> Result<String, TransportFailure> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportFailure {
                kind: TransportKind::HttpStatus(status.as_u16()),
                detail: format!("advisory endpoint answered {status}"),
            });
        }

        response.text().map_err(classify)
    }
}

fn classify(err: reqwest::Error) -> TransportFailure {
    let kind = if err.is_timeout() {
        TransportKind::Timeout
    } else {
        TransportKind::Network
    };
    TransportFailure {
        kind,
        detail: err.to_string(),
    }
}

/// Sends prompts to the advisory model with a bounded retry loop. The
/// request payload is built once and re-sent unchanged on every attempt.
pub struct AdvisoryClient<T> {
    config: AdvisoryConfig,
    transport: T,
}

impl<T: AdvisoryTransport> AdvisoryClient<T> {
    pub fn new(config: AdvisoryConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &AdvisoryConfig {
        &self.config
    }

    /// Request a completion for the prompt, retrying transport failures up
    /// to the configured budget. Malformed success envelopes fail
    /// immediately: the endpoint answered, it just answered nonsense.
    pub fn request(&self, prompt: &str) -> Result<String, AdvisoryError> {
        let request = CompletionRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            format: "json".to_string(),
        };

        let attempts = self.config.max_retries.max(1);
        let mut last_failure: Option<TransportFailure> = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                thread::sleep(self.config.backoff.delay_after(attempt - 1));
            }

            match self.transport.send(&request) {
                Ok(body) => {
                    debug!(attempt, "advisory endpoint answered");
                    let envelope: CompletionEnvelope = serde_json::from_str(&body)
                        .map_err(|err| AdvisoryError::Envelope {
                            detail: err.to_string(),
                        })?;
                    return Ok(envelope.response);
                }
                Err(failure) => {
                    warn!(attempt, total = attempts, error = %failure, "advisory attempt failed");
                    last_failure = Some(failure);
                }
            }
        }

        let last = last_failure.unwrap_or_else(|| TransportFailure {
            kind: TransportKind::Network,
            detail: "no attempt was made".to_string(),
        });
        Err(AdvisoryError::Exhausted { attempts, last })
    }
}
