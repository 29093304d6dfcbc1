//! nexagen CLI entrypoint
//! Parses command-line arguments and dispatches to the build pipeline core.
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use nexagen::cards::{CardSynthesizer, SynthesizerConfig};
use nexagen::discovery::ScriptDiscovery;
use nexagen::exec::{ProcessRunner, ShellRunner};
use nexagen::finalize::Finalizer;
use nexagen::llm::{GeneratorConfig, OpenAiCompatGenerator, TextGenerator};
use nexagen::pipeline::BuildPipeline;
use nexagen::project::{ProjectLayout, create_project};
use nexagen::templates::TemplateCatalog;

#[derive(Parser)]
#[command(name = "nexagen")]
#[command(author, version, about = "Next-generation multi-agent system builder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Create a new Nexagen project
    Create {
        /// Name of the project directory to create
        project_name: String,
    },
    /// Build the multi-agent system in the current directory
    Build {
        /// Custom template directory (defaults to the embedded templates)
        #[arg(long)]
        template_dir: Option<PathBuf>,
        /// Pause after each successful card synthesis, in milliseconds
        #[arg(long, default_value_t = 500)]
        throttle_ms: u64,
        /// Upper bound for a single generation call, in seconds
        #[arg(long, default_value_t = 600)]
        timeout_secs: u64,
    },
    /// Run the generated demo client
    Run,
    /// Wrap the assembled system as a single MCP agent
    Magic {
        /// Custom template directory (defaults to the embedded templates)
        #[arg(long)]
        template_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with default level INFO
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Create { project_name } => {
            let layout = ProjectLayout::new(std::env::current_dir()?.join(&project_name));
            create_project(&layout)
                .await
                .context("Failed to create project")?;
            println!(
                "Project '{}' created successfully at {}",
                project_name,
                layout.root().display()
            );
        }
        Commands::Build {
            template_dir,
            throttle_ms,
            timeout_secs,
        } => {
            build_system(template_dir, throttle_ms, timeout_secs).await?;
        }
        Commands::Run => run_demo().await?,
        Commands::Magic { template_dir } => magic_wrap(template_dir).await?,
    }
    Ok(())
}

fn load_catalog(template_dir: Option<PathBuf>) -> anyhow::Result<Arc<TemplateCatalog>> {
    let catalog = match template_dir {
        Some(dir) => TemplateCatalog::from_dir(&dir)
            .with_context(|| format!("Failed to load templates from {}", dir.display()))?,
        None => TemplateCatalog::embedded().context("Failed to load embedded templates")?,
    };
    Ok(Arc::new(catalog))
}

/// Run the build pipeline against the current directory
async fn build_system(
    template_dir: Option<PathBuf>,
    throttle_ms: u64,
    timeout_secs: u64,
) -> anyhow::Result<()> {
    let layout = ProjectLayout::new(std::env::current_dir()?);
    let catalog = load_catalog(template_dir)?;

    let mut generator_config =
        GeneratorConfig::from_env().context("Generation service is not configured")?;
    generator_config.timeout = Duration::from_secs(timeout_secs);
    let generator: Arc<dyn TextGenerator> = Arc::new(
        OpenAiCompatGenerator::new(generator_config)
            .context("Failed to build generation client")?,
    );

    let synthesizer = CardSynthesizer::new(
        generator,
        SynthesizerConfig {
            throttle: Duration::from_millis(throttle_ms),
        },
    );

    let runner: Arc<dyn ProcessRunner> = Arc::new(ShellRunner::new());
    let discovery = Arc::new(ScriptDiscovery::new(catalog.clone(), runner.clone()));

    let pipeline = BuildPipeline::new(layout, synthesizer, catalog, runner, discovery);
    let report = pipeline.run().await.context("Build failed")?;

    println!(
        "Build agent cards ok. Generated {} card(s).",
        report.cards_generated
    );
    for agent in &report.agents_skipped {
        println!("  ✗ Skipped agent: {agent}");
    }
    for stage in report.failed_stages() {
        println!(
            "  ✗ Stage '{}' failed: {}",
            stage.stage,
            stage.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!("Nexagen system built successfully");
    Ok(())
}

/// Invoke the generated demo artifact
async fn run_demo() -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    info!("Starting Nexagen system...");

    let runner = ShellRunner::new();
    match runner
        .run("python", &["test_demo.py".to_string()], &cwd)
        .await
    {
        Ok(output) => {
            print!("{}", output.stdout);
            eprint!("{}", output.stderr);
            if !output.is_success() {
                println!("Demo exited with code {}", output.exit_code);
            }
        }
        Err(e) => println!("Run failed: {e}"),
    }
    Ok(())
}

/// Wrap the assembled system as a single MCP agent
async fn magic_wrap(template_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let layout = ProjectLayout::new(std::env::current_dir()?);
    let catalog = load_catalog(template_dir)?;
    let runner: Arc<dyn ProcessRunner> = Arc::new(ShellRunner::new());

    let finalizer = Finalizer::new(layout, catalog, runner);
    match finalizer.finalize().await {
        Ok(Some(report)) => {
            println!("{}", "=".repeat(60));
            println!("Nexagen MCP Agent Summary:");
            println!("{}", "=".repeat(60));
            for (agent, totals) in &report.summary.agents {
                println!("\n  Agent: {agent}");
                println!("    Tools: {}", totals.tools);
                println!("    Prompts: {}", totals.prompts);
                println!("    Resources: {}", totals.resources);
            }
            println!("\n{}", "-".repeat(60));
            println!("  Total Internal Agents: {}", report.summary.total_agents());
            println!("  Total Tools Exposed: {}", report.exposed_tools);
            println!("  Total Prompts: {}", report.exposed_prompts);
            println!("  Total Resources: {}", report.summary.total_resources());
            println!("{}", "=".repeat(60));
            for warning in &report.warnings {
                println!("  Warning: {warning}");
            }
            println!("\nMagic complete! Your multi-agent system is now a single MCP agent.");
            println!("Read NEXAGEN_MCP_USAGE.md for detailed usage instructions.");
            println!("Quick start: uv run mcp_server.py");
        }
        Ok(None) => {
            println!("Magic failed; see the log output above for details.");
        }
        Err(e) => {
            println!("Error: {e}");
            println!("Please run 'nexagen build' first.");
        }
    }
    Ok(())
}
