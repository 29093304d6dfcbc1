//! Agent manifest store
//!
//! Owns the on-disk JSON manifest of discovered agents
//! (`mcp_agents/mcp_cards.json`) and the per-agent card files under
//! `agent_cards/`. The pipeline summary is always recomputed from disk, never
//! cached, so it reflects manual edits made between build and magic wrap.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::cards::AgentCard;
use crate::project::ProjectLayout;

/// Errors that can occur in manifest operations
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest file does not exist
    #[error("agent manifest not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One raw tool descriptor as reported by the discovery step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "inputSchema", alias = "input_schema")]
    pub input_schema: Option<JsonValue>,
}

/// One discovered agent: raw tool list plus optional prompts/resources
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentEntry {
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
    #[serde(default)]
    pub prompts: Vec<JsonValue>,
    #[serde(default)]
    pub resources: Vec<JsonValue>,
}

/// The full manifest: agent identifier -> raw entry.
///
/// A BTreeMap keeps iteration in deterministic key order, which fixes the
/// card-generation order within a build.
pub type AgentManifest = BTreeMap<String, AgentEntry>;

/// Per-agent counts used by the pipeline summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentTotals {
    pub tools: usize,
    pub prompts: usize,
    pub resources: usize,
}

/// Aggregate counts across the assembled system.
///
/// Tool, prompt, and resource totals come from the manifest (the wrapper
/// proxies every manifest tool), but the agent count reflects the card files
/// actually on disk: an agent whose synthesis was skipped does not count.
#[derive(Debug, Clone, Default)]
pub struct PipelineSummary {
    pub agents: BTreeMap<String, AgentTotals>,
    generated_cards: usize,
}

impl PipelineSummary {
    pub fn new(manifest: &AgentManifest, generated_cards: usize) -> Self {
        let agents = manifest
            .iter()
            .map(|(id, entry)| {
                (
                    id.clone(),
                    AgentTotals {
                        tools: entry.tools.len(),
                        prompts: entry.prompts.len(),
                        resources: entry.resources.len(),
                    },
                )
            })
            .collect();
        Self {
            agents,
            generated_cards,
        }
    }

    /// Count of successfully generated agent cards
    pub fn total_agents(&self) -> usize {
        self.generated_cards
    }

    pub fn total_tools(&self) -> usize {
        self.agents.values().map(|t| t.tools).sum()
    }

    pub fn total_prompts(&self) -> usize {
        self.agents.values().map(|t| t.prompts).sum()
    }

    pub fn total_resources(&self) -> usize {
        self.agents.values().map(|t| t.resources).sum()
    }
}

/// Reads and writes the manifest and the per-agent card files
pub struct ManifestStore {
    layout: ProjectLayout,
}

impl ManifestStore {
    pub fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }

    /// Load the raw agent manifest from disk
    pub async fn load(&self) -> Result<AgentManifest, ManifestError> {
        let path = self.layout.manifest_file();
        if !path.exists() {
            return Err(ManifestError::NotFound(path));
        }

        let content = fs::read_to_string(&path).await?;
        let manifest = serde_json::from_str(&content)?;
        debug!(path = %path.display(), "Loaded agent manifest");
        Ok(manifest)
    }

    /// Write one agent card, replacing any previous file wholesale.
    ///
    /// Cards are pretty-printed with non-ASCII preserved, matching the format
    /// consumed by the generated orchestrator.
    pub async fn write_card(
        &self,
        agent_id: &str,
        card: &AgentCard,
    ) -> Result<PathBuf, ManifestError> {
        fs::create_dir_all(self.layout.card_dir()).await?;

        let path = self.layout.card_file(agent_id);
        let content = serde_json::to_string_pretty(card)?;
        fs::write(&path, content).await?;
        Ok(path)
    }

    /// Count of card files currently on disk
    pub async fn card_count(&self) -> Result<usize, ManifestError> {
        let dir = self.layout.card_dir();
        if !dir.exists() {
            return Ok(0);
        }

        let mut entries = fs::read_dir(&dir).await?;
        let mut count = 0;
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().is_some_and(|e| e == "json") {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Recompute the pipeline summary by reading the manifest and the card
    /// files fresh from disk
    pub async fn summary(&self) -> Result<PipelineSummary, ManifestError> {
        let manifest = self.load().await?;
        let generated_cards = self.card_count().await?;
        Ok(PipelineSummary::new(&manifest, generated_cards))
    }
}
