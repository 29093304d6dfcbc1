//! Agent card domain - standardized agent descriptions and their synthesis
//!
//! Raw tool manifests are translated into agent cards by prompting the
//! external text-generation service, then validating the returned JSON.

mod errors;
mod prompt;
mod synthesizer;
mod types;

pub use errors::CardSynthesisError;
pub use prompt::AGENT_CARD_PROMPT;
pub use synthesizer::{CardSynthesizer, SynthesizerConfig};
pub use types::{AgentCard, Capabilities, Skill, CARD_VERSION};
