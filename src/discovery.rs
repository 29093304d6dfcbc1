//! Agent discovery boundary
//!
//! Discovery produces the raw agent manifest at
//! `mcp_agents/mcp_cards.json`. The default implementation materializes a
//! probe script from the template catalog, runs it in the project root with
//! captured output, and removes the script afterwards. A discovery failure
//! leaves any previous manifest untouched.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

use crate::exec::{ExecError, ProcessRunner};
use crate::project::ProjectLayout;
use crate::templates::{TemplateCatalog, TemplateError};

/// Template name of the discovery probe script
const PROBE_TEMPLATE: &str = "auto_find_mcp_agents.py.tera";

/// File name the probe is materialized under while it runs
const PROBE_SCRIPT: &str = "auto_find_mcp_agents.py";

/// Errors that can occur during agent discovery
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("discovery probe exited with code {code}: {stderr}")]
    ProbeFailed { code: i32, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Discovery capability: populate the agent manifest for a project
#[async_trait]
pub trait AgentDiscovery: Send + Sync {
    async fn discover(&self, layout: &ProjectLayout) -> Result<(), DiscoveryError>;
}

/// Discovery via a materialized probe script run as a subprocess
pub struct ScriptDiscovery {
    catalog: Arc<TemplateCatalog>,
    runner: Arc<dyn ProcessRunner>,
}

impl ScriptDiscovery {
    pub fn new(catalog: Arc<TemplateCatalog>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { catalog, runner }
    }
}

#[async_trait]
impl AgentDiscovery for ScriptDiscovery {
    async fn discover(&self, layout: &ProjectLayout) -> Result<(), DiscoveryError> {
        let script_path = layout.artifact(PROBE_SCRIPT);
        self.catalog
            .materialize(PROBE_TEMPLATE, &script_path, &tera::Context::new())
            .await?;

        let result = self
            .runner
            .run("python", &[PROBE_SCRIPT.to_string()], layout.root())
            .await;

        // The probe is transient; remove it before inspecting the outcome so
        // it never lingers after a failed run.
        if let Err(e) = fs::remove_file(&script_path).await {
            warn!(path = %script_path.display(), error = %e, "Could not remove discovery probe");
        }

        let output = result?;
        if !output.is_success() {
            return Err(DiscoveryError::ProbeFailed {
                code: output.exit_code,
                stderr: output.stderr,
            });
        }

        debug!(manifest = %layout.manifest_file().display(), "Discovery probe finished");
        Ok(())
    }
}
