//! Advisory model integration: prompt rendering, a retrying transport
//! client, and tolerant response parsing.
//!
//! Everything in this module is best-effort. A failure anywhere on the
//! advisory path leaves the evaluation running on the rule verdict alone.

mod client;
mod parser;
mod prompt;

pub use client::{
    AdvisoryClient, AdvisoryConfig, AdvisoryError, AdvisoryTransport, CompletionRequest,
    HttpTransport, RetryBackoff, TransportFailure, TransportKind,
};
pub use parser::{ParseError, ResponseParser, ResponseSchema};
pub use prompt::{PromptBuilder, ScreeningPrompt};
