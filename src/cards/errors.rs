//! Error types for agent card synthesis

use thiserror::Error;

use crate::llm::GenerateError;

/// Errors that can occur while synthesizing one agent card.
///
/// Every variant is non-fatal to the build: the orchestrator logs the failing
/// agent and moves on to the next manifest entry.
#[derive(Error, Debug)]
pub enum CardSynthesisError {
    /// The generation call itself failed (timeout, transport, upstream)
    #[error("generation request failed: {0}")]
    Generate(#[from] GenerateError),

    /// The response was not valid JSON after fence stripping
    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The response was an empty array or otherwise carried no card
    #[error("response contained no agent card")]
    EmptyResponse,

    /// Required fields absent from the returned card, all enumerated at once
    #[error("response is missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// Fields were present but could not be deserialized into a card
    #[error("card payload is malformed: {0}")]
    MalformedCard(String),
}
