//! Finalizer ("magic wrap")
//!
//! Collapses the assembled multi-agent system into a single externally
//! callable MCP agent: emits the wrapper server, its dependency manifest, and
//! a usage document, then recomputes the pipeline summary fresh from disk.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::exec::ProcessRunner;
use crate::manifest::{ManifestError, ManifestStore, PipelineSummary};
use crate::pipeline::PipelineError;
use crate::project::ProjectLayout;
use crate::templates::{TemplateCatalog, TemplateError};

/// Tools the wrapper itself contributes on top of the internal agents:
/// `nexagen_route` and `list_available_agents`.
pub const WRAPPER_TOOL_SLOTS: usize = 2;

/// Prompts the wrapper itself contributes: `nexagen_example`.
pub const WRAPPER_PROMPT_SLOTS: usize = 1;

/// Runtime dependencies of the wrapper server
const WRAPPER_DEPENDENCIES: &[&str] = &["mcp[cli]", "python-dotenv", "requests", "jinja2"];

/// Errors inside the wrap sequence. Caught at the finalize top level and
/// never propagated to callers.
#[derive(Error, Debug)]
enum WrapError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Summary statistics reported after a successful wrap
#[derive(Debug)]
pub struct WrapReport {
    /// Generated-card count and per-agent totals, recomputed from disk
    pub summary: PipelineSummary,
    /// Internal tools plus the wrapper's own tool slots
    pub exposed_tools: usize,
    /// Internal prompts plus the wrapper's own prompt slot
    pub exposed_prompts: usize,
    /// Non-fatal problems encountered along the way
    pub warnings: Vec<String>,
}

/// Validates prerequisites and emits the wrapper artifacts
pub struct Finalizer {
    layout: ProjectLayout,
    store: ManifestStore,
    catalog: Arc<TemplateCatalog>,
    runner: Arc<dyn ProcessRunner>,
}

impl Finalizer {
    pub fn new(
        layout: ProjectLayout,
        catalog: Arc<TemplateCatalog>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        let store = ManifestStore::new(layout.clone());
        Self {
            layout,
            store,
            catalog,
            runner,
        }
    }

    /// Wrap the assembled system as a single MCP agent.
    ///
    /// The prerequisite check is a hard precondition: if any required file is
    /// missing, finalize aborts before writing anything and the error
    /// enumerates exactly the missing paths. Past that point every failure is
    /// caught here, logged, and surfaced as `Ok(None)` - callers never
    /// observe an error from the wrap sequence itself.
    pub async fn finalize(&self) -> Result<Option<WrapReport>, PipelineError> {
        info!("Starting Nexagen magic - wrapping as MCP agent");

        let missing = self.missing_prerequisites();
        if !missing.is_empty() {
            return Err(PipelineError::MissingPrerequisites(missing));
        }
        info!("All required files found");

        match self.wrap().await {
            Ok(report) => Ok(Some(report)),
            Err(e) => {
                error!(error = %e, "Magic wrap failed");
                Ok(None)
            }
        }
    }

    fn missing_prerequisites(&self) -> Vec<PathBuf> {
        [
            self.layout.orchestrator(),
            self.layout.agent_executor(),
            self.layout.manifest_file(),
            self.layout.env_file(),
        ]
        .into_iter()
        .filter(|path| !path.exists())
        .collect()
    }

    async fn wrap(&self) -> Result<WrapReport, WrapError> {
        let mut warnings = Vec::new();

        let mut params = tera::Context::new();
        params.insert("project_name", &self.layout.project_name());

        info!("Generating MCP server...");
        self.catalog
            .materialize("mcp_server.py.tera", &self.layout.wrapper_server(), &params)
            .await?;

        info!("Generating pyproject.toml...");
        self.catalog
            .materialize(
                "pyproject.toml.tera",
                &self.layout.dependency_manifest(),
                &params,
            )
            .await?;

        // Best effort: a failed install is a warning, the wrap continues.
        info!("Installing MCP dependencies...");
        if let Some(warning) = self.install_wrapper_dependencies().await {
            warn!(warning = %warning, "Continuing despite install failure");
            warnings.push(warning);
        }

        info!("Generating usage instructions...");
        self.write_usage_doc(&params).await?;

        // Re-read the manifest and card files from disk so the summary
        // reflects any edits made since the build ran.
        let summary = self.store.summary().await?;
        let report = WrapReport {
            exposed_tools: summary.total_tools() + WRAPPER_TOOL_SLOTS,
            exposed_prompts: summary.total_prompts() + WRAPPER_PROMPT_SLOTS,
            summary,
            warnings,
        };

        info!(
            agents = report.summary.total_agents(),
            tools = report.exposed_tools,
            prompts = report.exposed_prompts,
            "Magic complete - the multi-agent system is now a single MCP agent"
        );
        Ok(report)
    }

    async fn install_wrapper_dependencies(&self) -> Option<String> {
        let mut args = vec!["pip".to_string(), "install".to_string()];
        args.extend(WRAPPER_DEPENDENCIES.iter().map(|d| d.to_string()));

        match self.runner.run("uv", &args, self.layout.root()).await {
            Ok(output) if output.is_success() => None,
            Ok(output) => Some(format!(
                "could not install wrapper dependencies (exit code {}); install manually: uv pip install {}",
                output.exit_code,
                WRAPPER_DEPENDENCIES.join(" ")
            )),
            Err(e) => Some(format!(
                "could not install wrapper dependencies: {e}; install manually: uv pip install {}",
                WRAPPER_DEPENDENCIES.join(" ")
            )),
        }
    }

    async fn write_usage_doc(&self, base_params: &tera::Context) -> Result<(), WrapError> {
        // The usage doc embeds the project's absolute path in the
        // Claude Desktop configuration snippet.
        let absolute_root = tokio::fs::canonicalize(self.layout.root())
            .await
            .unwrap_or_else(|_| self.layout.root().to_path_buf());

        let mut params = base_params.clone();
        params.insert("project_path", &absolute_root.display().to_string());

        self.catalog
            .materialize(
                "NEXAGEN_MCP_USAGE.md.tera",
                &self.layout.usage_doc(),
                &params,
            )
            .await?;
        Ok(())
    }
}
