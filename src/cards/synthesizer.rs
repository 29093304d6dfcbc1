//! Card synthesizer - translates one raw manifest entry into an agent card
//!
//! Invoked once per manifest entry, strictly sequentially. The generation
//! service is treated as a rate-limited singleton: after each successful
//! synthesis the synthesizer pauses for a configurable throttle before
//! returning control to the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::cards::{AGENT_CARD_PROMPT, AgentCard, CardSynthesisError};
use crate::llm::TextGenerator;
use crate::manifest::AgentEntry;

/// Fields the generation service must return for every card
const REQUIRED_FIELDS: [&str; 7] = [
    "name",
    "description",
    "skills",
    "url",
    "capabilities",
    "defaultInputModes",
    "defaultOutputModes",
];

/// Tuning knobs for the synthesizer
#[derive(Debug, Clone)]
pub struct SynthesizerConfig {
    /// Pause after each successful synthesis, throttling request rate to the
    /// generation service. Not applied after failures.
    pub throttle: Duration,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            throttle: Duration::from_millis(500),
        }
    }
}

/// Converts raw tool manifests into standardized agent cards
pub struct CardSynthesizer {
    generator: Arc<dyn TextGenerator>,
    config: SynthesizerConfig,
}

impl CardSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>, config: SynthesizerConfig) -> Self {
        Self { generator, config }
    }

    /// Synthesize the card for a single agent.
    ///
    /// Builds the prompt from the fixed instruction constant plus the
    /// single-agent JSON payload, calls the generator, and validates the
    /// returned text into an [`AgentCard`].
    pub async fn synthesize(
        &self,
        agent_id: &str,
        entry: &AgentEntry,
    ) -> Result<AgentCard, CardSynthesisError> {
        let mut payload = serde_json::Map::new();
        payload.insert(agent_id.to_string(), serde_json::to_value(entry)?);
        let prompt = format!(
            "{}\n{}",
            AGENT_CARD_PROMPT,
            serde_json::to_string_pretty(&payload)?
        );

        debug!(agent = %agent_id, prompt_len = prompt.len(), "Requesting card synthesis");
        let response = self.generator.generate(&prompt).await?;
        let card = parse_card(&response)?;

        // Throttle only on success; failed agents are skipped immediately.
        tokio::time::sleep(self.config.throttle).await;
        Ok(card)
    }
}

/// Remove markdown code-fence markers from the generator output
fn strip_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "")
}

/// Validate the generator output into a typed agent card.
///
/// Handles the generator returning the card wrapped in a single-element array
/// instead of a bare object, and enumerates every missing required field in
/// one error rather than failing on the first.
fn parse_card(raw: &str) -> Result<AgentCard, CardSynthesisError> {
    let text = strip_fences(raw);
    let mut value: JsonValue = serde_json::from_str(text.trim())?;

    if let JsonValue::Array(items) = value {
        value = items
            .into_iter()
            .next()
            .ok_or(CardSynthesisError::EmptyResponse)?;
    }

    let object = value
        .as_object()
        .ok_or_else(|| CardSynthesisError::MalformedCard("expected a JSON object".to_string()))?;

    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !object.contains_key(**field))
        .map(|field| field.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CardSynthesisError::MissingFields(missing));
    }

    if object.get("name").and_then(|n| n.as_str()).unwrap_or("").is_empty() {
        return Err(CardSynthesisError::MalformedCard(
            "name must be a non-empty string".to_string(),
        ));
    }

    serde_json::from_value(value).map_err(|e| CardSynthesisError::MalformedCard(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::GenerateError;
    use async_trait::async_trait;

    struct StaticGenerator {
        response: String,
    }

    #[async_trait]
    impl TextGenerator for StaticGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
            Ok(self.response.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
            Err(GenerateError::Timeout)
        }
    }

    fn zero_throttle() -> SynthesizerConfig {
        SynthesizerConfig {
            throttle: Duration::ZERO,
        }
    }

    const VALID_CARD: &str = r#"{
        "name": "Chart Agent",
        "description": "Handles chart-related operations",
        "url": "http://localhost:0000/",
        "version": "1.0.0",
        "capabilities": {"streaming": false, "pushNotifications": false, "stateTransitionHistory": false},
        "defaultInputModes": ["text", "text/plain"],
        "defaultOutputModes": ["text", "text/plain"],
        "skills": [
            {"id": "draw_chart", "name": "draw_chart", "description": "draws a chart", "tags": [], "examples": []}
        ]
    }"#;

    #[tokio::test]
    async fn test_synthesize_from_fenced_array_response() {
        let generator = Arc::new(StaticGenerator {
            response: format!("```json\n[{VALID_CARD}]\n```"),
        });
        let synthesizer = CardSynthesizer::new(generator, zero_throttle());

        let card = synthesizer
            .synthesize("chart", &AgentEntry::default())
            .await
            .unwrap();

        assert_eq!(card.name, "Chart Agent");
        assert_eq!(card.skills.len(), 1);
        assert_eq!(card.skills[0].id, "draw_chart");
    }

    #[tokio::test]
    async fn test_synthesize_bare_object_response() {
        let generator = Arc::new(StaticGenerator {
            response: VALID_CARD.to_string(),
        });
        let synthesizer = CardSynthesizer::new(generator, zero_throttle());

        let card = synthesizer
            .synthesize("chart", &AgentEntry::default())
            .await
            .unwrap();
        assert_eq!(card.version, "1.0.0");
    }

    #[tokio::test]
    async fn test_synthesize_propagates_generate_failure() {
        let synthesizer = CardSynthesizer::new(Arc::new(FailingGenerator), zero_throttle());

        let result = synthesizer.synthesize("chart", &AgentEntry::default()).await;
        assert!(matches!(
            result.unwrap_err(),
            CardSynthesisError::Generate(GenerateError::Timeout)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_synthesis_waits_out_the_throttle() {
        let generator = Arc::new(StaticGenerator {
            response: VALID_CARD.to_string(),
        });
        let throttle = Duration::from_millis(500);
        let synthesizer = CardSynthesizer::new(generator, SynthesizerConfig { throttle });

        let started = tokio::time::Instant::now();
        synthesizer
            .synthesize("chart", &AgentEntry::default())
            .await
            .unwrap();
        assert!(started.elapsed() >= throttle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_synthesis_skips_the_throttle() {
        let synthesizer = CardSynthesizer::new(
            Arc::new(FailingGenerator),
            SynthesizerConfig {
                throttle: Duration::from_millis(500),
            },
        );

        let started = tokio::time::Instant::now();
        let result = synthesizer.synthesize("chart", &AgentEntry::default()).await;
        assert!(result.is_err());
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_parse_card_not_json() {
        let result = parse_card("the model apologizes and refuses");
        assert!(matches!(
            result.unwrap_err(),
            CardSynthesisError::InvalidJson(_)
        ));
    }

    #[test]
    fn test_parse_card_empty_array() {
        let result = parse_card("[]");
        assert!(matches!(
            result.unwrap_err(),
            CardSynthesisError::EmptyResponse
        ));
    }

    #[test]
    fn test_parse_card_enumerates_all_missing_fields() {
        let result = parse_card(r#"{"name": "Chart Agent", "skills": []}"#);
        match result.unwrap_err() {
            CardSynthesisError::MissingFields(fields) => {
                assert_eq!(
                    fields,
                    vec![
                        "description",
                        "url",
                        "capabilities",
                        "defaultInputModes",
                        "defaultOutputModes"
                    ]
                );
            }
            other => panic!("Expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_card_rejects_empty_name() {
        let card = VALID_CARD.replace("Chart Agent", "");
        let result = parse_card(&card);
        assert!(matches!(
            result.unwrap_err(),
            CardSynthesisError::MalformedCard(_)
        ));
    }

    #[test]
    fn test_parse_card_rejects_non_object() {
        let result = parse_card("[42]");
        assert!(matches!(
            result.unwrap_err(),
            CardSynthesisError::MalformedCard(_)
        ));
    }

    #[test]
    fn test_parse_card_is_idempotent() {
        // Re-parsing the identical response yields the identical card.
        let first = parse_card(VALID_CARD).unwrap();
        let second = parse_card(VALID_CARD).unwrap();
        assert_eq!(first, second);
    }
}
