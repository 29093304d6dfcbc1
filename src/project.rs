//! Project directory layout and project creation
//!
//! A Nexagen project is a directory containing the raw agent manifest, the
//! per-agent card directory, the generated source artifacts, and the secrets
//! file. All path knowledge lives here so the rest of the crate never
//! hand-builds paths.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::info;

/// Errors that can occur while creating a project
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Packaged `.env` template copied into every new project
const ENV_TEMPLATE: &str = include_str!("../templates/env.example");

/// Resolved paths of a single Nexagen project
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Project name derived from the root directory
    pub fn project_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "nexagen_project".to_string())
    }

    /// `mcp.json` - placeholder configuration, empty object at creation
    pub fn mcp_config(&self) -> PathBuf {
        self.root.join("mcp.json")
    }

    /// Directory holding the raw agent manifest
    pub fn manifest_dir(&self) -> PathBuf {
        self.root.join("mcp_agents")
    }

    /// `mcp_agents/mcp_cards.json` - the raw agent manifest
    pub fn manifest_file(&self) -> PathBuf {
        self.manifest_dir().join("mcp_cards.json")
    }

    /// Directory holding one synthesized card file per agent
    pub fn card_dir(&self) -> PathBuf {
        self.root.join("agent_cards")
    }

    /// `agent_cards/<agent_id>.json`
    pub fn card_file(&self, agent_id: &str) -> PathBuf {
        self.card_dir().join(format!("{agent_id}.json"))
    }

    /// Secrets/config file copied from the packaged template
    pub fn env_file(&self) -> PathBuf {
        self.root.join(".env")
    }

    /// A generated artifact directly under the project root
    pub fn artifact(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    pub fn orchestrator(&self) -> PathBuf {
        self.artifact("orchestrator_agent.py")
    }

    pub fn agent_executor(&self) -> PathBuf {
        self.artifact("agent_executor.py")
    }

    pub fn demo(&self) -> PathBuf {
        self.artifact("test_demo.py")
    }

    /// Wrapper server emitted by magic wrap
    pub fn wrapper_server(&self) -> PathBuf {
        self.artifact("mcp_server.py")
    }

    /// Dependency manifest emitted by magic wrap
    pub fn dependency_manifest(&self) -> PathBuf {
        self.artifact("pyproject.toml")
    }

    /// Usage document emitted by magic wrap
    pub fn usage_doc(&self) -> PathBuf {
        self.artifact("NEXAGEN_MCP_USAGE.md")
    }
}

/// Create the initial project structure on disk.
///
/// Creates the root and manifest directories, writes an empty `mcp.json`, and
/// copies the packaged `.env` template. Idempotent over an existing directory.
pub async fn create_project(layout: &ProjectLayout) -> Result<(), ProjectError> {
    fs::create_dir_all(layout.root()).await?;
    fs::create_dir_all(layout.manifest_dir()).await?;
    fs::write(layout.mcp_config(), "{}").await?;
    fs::write(layout.env_file(), ENV_TEMPLATE).await?;

    info!(path = %layout.root().display(), "Created project structure");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_create_project_layout() {
        let dir = tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path().join("demo"));

        create_project(&layout).await.unwrap();

        assert!(layout.root().is_dir());
        assert!(layout.manifest_dir().is_dir());
        assert_eq!(
            std::fs::read_to_string(layout.mcp_config()).unwrap(),
            "{}"
        );
        assert!(layout.env_file().exists());
        assert_eq!(layout.project_name(), "demo");
    }

    #[tokio::test]
    async fn test_create_project_is_idempotent() {
        let dir = tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path().join("demo"));

        create_project(&layout).await.unwrap();
        create_project(&layout).await.unwrap();

        assert!(layout.mcp_config().exists());
    }

    #[test]
    fn test_card_file_path() {
        let layout = ProjectLayout::new("/tmp/demo");
        assert_eq!(
            layout.card_file("chart"),
            PathBuf::from("/tmp/demo/agent_cards/chart.json")
        );
    }
}
