//! Build pipeline orchestrator
//!
//! Runs the ordered build stages: dependency installation, agent discovery,
//! per-agent card generation, and materialization of the five downstream
//! artifacts. Each non-fatal stage runs inside its own failure boundary and
//! is reported as a typed [`StageOutcome`]; only an unreadable manifest
//! before card generation aborts the build.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::cards::CardSynthesizer;
use crate::discovery::AgentDiscovery;
use crate::exec::ProcessRunner;
use crate::manifest::{ManifestError, ManifestStore};
use crate::project::ProjectLayout;
use crate::templates::TemplateCatalog;

/// Python packages the generated system needs at runtime
pub const PYTHON_DEPENDENCIES: &[&str] = &[
    "a2a-sdk",
    "mcp",
    "uvicorn",
    "httpx",
    "jinja2",
    "python-dotenv",
];

/// The five fixed materialization sub-stages: (stage id, artifact file name)
pub const ARTIFACT_STAGES: [(&str, &str); 5] = [
    ("orchestrator", "orchestrator_agent.py"),
    ("mcp-client", "mcp_client.py"),
    ("agent-executor", "agent_executor.py"),
    ("pipeline", "pipeline.py"),
    ("demo", "test_demo.py"),
];

fn format_missing(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fatal pipeline conditions - these abort the current top-level operation
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No manifest on disk when card generation was about to start
    #[error("agent manifest not found at {0}")]
    ManifestNotFound(PathBuf),

    /// The manifest exists but could not be read or parsed
    #[error("agent manifest could not be read: {0}")]
    ManifestUnreadable(#[source] ManifestError),

    /// Finalize precondition failed; every missing path enumerated
    #[error("missing prerequisite files: {}", format_missing(.0))]
    MissingPrerequisites(Vec<PathBuf>),
}

/// Result of one non-fatal build stage
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub stage: &'static str,
    pub error: Option<String>,
}

impl StageOutcome {
    fn ok(stage: &'static str) -> Self {
        Self { stage, error: None }
    }

    fn failed(stage: &'static str, error: impl fmt::Display) -> Self {
        Self {
            stage,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregated result of one build run
#[derive(Debug, Default)]
pub struct BuildReport {
    pub stages: Vec<StageOutcome>,
    pub cards_generated: usize,
    pub agents_skipped: Vec<String>,
}

impl BuildReport {
    pub fn failed_stages(&self) -> impl Iterator<Item = &StageOutcome> {
        self.stages.iter().filter(|s| !s.is_success())
    }
}

/// Drives the ordered build stages for one project
pub struct BuildPipeline {
    layout: ProjectLayout,
    store: ManifestStore,
    synthesizer: CardSynthesizer,
    catalog: Arc<TemplateCatalog>,
    runner: Arc<dyn ProcessRunner>,
    discovery: Arc<dyn AgentDiscovery>,
}

impl BuildPipeline {
    pub fn new(
        layout: ProjectLayout,
        synthesizer: CardSynthesizer,
        catalog: Arc<TemplateCatalog>,
        runner: Arc<dyn ProcessRunner>,
        discovery: Arc<dyn AgentDiscovery>,
    ) -> Self {
        let store = ManifestStore::new(layout.clone());
        Self {
            layout,
            store,
            synthesizer,
            catalog,
            runner,
            discovery,
        }
    }

    /// Run the full build.
    ///
    /// Returns `Err` only for the fatal manifest conditions; every other
    /// failure is isolated into a [`StageOutcome`] and the pipeline proceeds.
    /// Partially written artifacts from earlier runs are overwritten, never
    /// rolled back.
    pub async fn run(&self) -> Result<BuildReport, PipelineError> {
        info!(project = %self.layout.root().display(), "Starting Nexagen system build");
        let mut report = BuildReport::default();

        report.stages.push(self.install_dependencies().await);
        report.stages.push(self.run_discovery().await);

        self.generate_cards(&mut report).await?;

        for (stage, artifact) in ARTIFACT_STAGES {
            report.stages.push(self.materialize_artifact(stage, artifact).await);
        }

        info!(
            cards = report.cards_generated,
            skipped = report.agents_skipped.len(),
            failed_stages = report.failed_stages().count(),
            "Build finished"
        );
        Ok(report)
    }

    /// Stage 1: install the generated system's runtime dependencies.
    /// Delegated and best-effort; a failure never stops the build.
    async fn install_dependencies(&self) -> StageOutcome {
        info!("Installing dependencies...");
        let mut args = vec!["pip".to_string(), "install".to_string()];
        args.extend(PYTHON_DEPENDENCIES.iter().map(|d| d.to_string()));

        match self.runner.run("uv", &args, self.layout.root()).await {
            Ok(output) if output.is_success() => StageOutcome::ok("install-dependencies"),
            Ok(output) => {
                warn!(
                    code = output.exit_code,
                    stderr = %output.stderr,
                    "Dependency installation failed; continuing"
                );
                StageOutcome::failed(
                    "install-dependencies",
                    format!("exit code {}", output.exit_code),
                )
            }
            Err(e) => {
                warn!(error = %e, "Dependency installation failed; continuing");
                StageOutcome::failed("install-dependencies", e)
            }
        }
    }

    /// Stage 2: run agent discovery. On failure the manifest keeps its
    /// previous state and the build continues with whatever is on disk.
    async fn run_discovery(&self) -> StageOutcome {
        info!("Discovering agents...");
        match self.discovery.discover(&self.layout).await {
            Ok(()) => StageOutcome::ok("discovery"),
            Err(e) => {
                error!(error = %e, "Agent discovery failed; continuing with existing manifest");
                StageOutcome::failed("discovery", e)
            }
        }
    }

    /// Stage 3: synthesize one card per manifest entry, sequentially.
    ///
    /// An unreadable manifest here is the one fatal build condition. A
    /// per-agent synthesis failure is logged with the agent id and that agent
    /// is skipped.
    async fn generate_cards(&self, report: &mut BuildReport) -> Result<(), PipelineError> {
        info!("Generating agent cards...");
        let manifest = match self.store.load().await {
            Ok(manifest) => manifest,
            Err(ManifestError::NotFound(path)) => {
                return Err(PipelineError::ManifestNotFound(path));
            }
            Err(e) => return Err(PipelineError::ManifestUnreadable(e)),
        };

        for (agent_id, entry) in &manifest {
            info!(agent = %agent_id, "Processing agent");
            match self.synthesizer.synthesize(agent_id, entry).await {
                Ok(card) => match self.store.write_card(agent_id, &card).await {
                    Ok(path) => {
                        info!(agent = %agent_id, path = %path.display(), "Generated agent card");
                        report.cards_generated += 1;
                    }
                    Err(e) => {
                        error!(agent = %agent_id, error = %e, "Failed to write agent card; skipping");
                        report.agents_skipped.push(agent_id.clone());
                    }
                },
                Err(e) => {
                    error!(agent = %agent_id, error = %e, "Card synthesis failed; skipping agent");
                    report.agents_skipped.push(agent_id.clone());
                }
            }
        }

        info!(count = report.cards_generated, "Agent card generation done");
        Ok(())
    }

    /// Stage 4: materialize one downstream artifact in its own failure
    /// boundary so later artifacts still get generated.
    async fn materialize_artifact(&self, stage: &'static str, artifact: &str) -> StageOutcome {
        info!(stage = %stage, artifact = %artifact, "Generating artifact");

        let mut params = tera::Context::new();
        params.insert("project_name", &self.layout.project_name());

        let template = format!("{artifact}.tera");
        match self
            .catalog
            .materialize(&template, &self.layout.artifact(artifact), &params)
            .await
        {
            Ok(()) => StageOutcome::ok(stage),
            Err(e) => {
                error!(stage = %stage, error = %e, "Artifact generation failed; continuing");
                StageOutcome::failed(stage, e)
            }
        }
    }
}
