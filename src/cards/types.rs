//! Agent card data model

use serde::{Deserialize, Serialize};

/// Fixed version literal stamped on every synthesized card
pub const CARD_VERSION: &str = "1.0.0";

fn default_version() -> String {
    CARD_VERSION.to_string()
}

/// Structured capability flags of an agent
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub push_notifications: bool,
    #[serde(default)]
    pub state_transition_history: bool,
}

/// One skill, derived 1:1 from a raw tool descriptor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Skill {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// Standardized description of one agent, persisted as
/// `agent_cards/<agent_id>.json`. Never mutated after creation; regeneration
/// replaces the file wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub url: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub capabilities: Capabilities,
    pub default_input_modes: Vec<String>,
    pub default_output_modes: Vec<String>,
    pub skills: Vec<Skill>,
}
