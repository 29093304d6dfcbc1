//! Template catalog - renders named templates into project artifacts
//!
//! The catalog is an explicitly constructed service: either the embedded
//! template set compiled into the binary, or a filesystem directory bound at
//! construction time. There is no process-wide template environment.

use std::path::Path;

use tera::Tera;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

/// Errors that can occur in template operations
#[derive(Error, Debug)]
pub enum TemplateError {
    /// No template with the given name in the catalog
    #[error("template not found: {0}")]
    NotFound(String),

    /// Tera failed to parse or render the template
    #[error("failed to render template {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: tera::Error,
    },

    /// IO error while loading templates or writing an artifact
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Templates compiled into the binary
const EMBEDDED_TEMPLATES: &[(&str, &str)] = &[
    (
        "auto_find_mcp_agents.py.tera",
        include_str!("../../templates/auto_find_mcp_agents.py.tera"),
    ),
    (
        "orchestrator_agent.py.tera",
        include_str!("../../templates/orchestrator_agent.py.tera"),
    ),
    (
        "mcp_client.py.tera",
        include_str!("../../templates/mcp_client.py.tera"),
    ),
    (
        "agent_executor.py.tera",
        include_str!("../../templates/agent_executor.py.tera"),
    ),
    (
        "pipeline.py.tera",
        include_str!("../../templates/pipeline.py.tera"),
    ),
    (
        "test_demo.py.tera",
        include_str!("../../templates/test_demo.py.tera"),
    ),
    (
        "mcp_server.py.tera",
        include_str!("../../templates/mcp_server.py.tera"),
    ),
    (
        "pyproject.toml.tera",
        include_str!("../../templates/pyproject.toml.tera"),
    ),
    (
        "NEXAGEN_MCP_USAGE.md.tera",
        include_str!("../../templates/NEXAGEN_MCP_USAGE.md.tera"),
    ),
];

/// A fixed, named set of templates plus the rendering engine
#[derive(Debug)]
pub struct TemplateCatalog {
    tera: Tera,
}

impl TemplateCatalog {
    /// Catalog backed by the templates compiled into the binary
    pub fn embedded() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        for (name, content) in EMBEDDED_TEMPLATES {
            tera.add_raw_template(name, content)
                .map_err(|e| TemplateError::Render {
                    name: name.to_string(),
                    source: e,
                })?;
        }
        Ok(Self { tera })
    }

    /// Catalog bound to a filesystem directory of `*.tera` files.
    ///
    /// Template names are the file names, matching the embedded naming.
    pub fn from_dir(dir: &Path) -> Result<Self, TemplateError> {
        if !dir.is_dir() {
            return Err(TemplateError::NotFound(dir.display().to_string()));
        }

        let mut tera = Tera::default();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "tera") {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let content = std::fs::read_to_string(&path)?;
                tera.add_raw_template(&name, &content)
                    .map_err(|e| TemplateError::Render { name, source: e })?;
            }
        }
        Ok(Self { tera })
    }

    /// Names of all templates in the catalog
    pub fn template_names(&self) -> Vec<&str> {
        self.tera.get_template_names().collect()
    }

    /// Render a named template against a parameter set
    pub fn render(
        &self,
        name: &str,
        params: &tera::Context,
    ) -> Result<String, TemplateError> {
        if !self.tera.get_template_names().any(|n| n == name) {
            return Err(TemplateError::NotFound(name.to_string()));
        }

        self.tera.render(name, params).map_err(|e| TemplateError::Render {
            name: name.to_string(),
            source: e,
        })
    }

    /// Render a named template and write the output to `destination`,
    /// overwriting any existing file.
    pub async fn materialize(
        &self,
        name: &str,
        destination: &Path,
        params: &tera::Context,
    ) -> Result<(), TemplateError> {
        let rendered = self.render(name, params)?;

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(destination, rendered).await?;

        debug!(template = %name, path = %destination.display(), "Materialized template");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_embedded_catalog_contains_all_artifacts() {
        let catalog = TemplateCatalog::embedded().unwrap();
        let names = catalog.template_names();

        for expected in [
            "orchestrator_agent.py.tera",
            "mcp_client.py.tera",
            "agent_executor.py.tera",
            "pipeline.py.tera",
            "test_demo.py.tera",
            "mcp_server.py.tera",
            "pyproject.toml.tera",
            "NEXAGEN_MCP_USAGE.md.tera",
            "auto_find_mcp_agents.py.tera",
        ] {
            assert!(names.contains(&expected), "missing template {expected}");
        }
    }

    #[test]
    fn test_render_unknown_template() {
        let catalog = TemplateCatalog::embedded().unwrap();
        let result = catalog.render("no_such.tera", &tera::Context::new());

        match result.unwrap_err() {
            TemplateError::NotFound(name) => assert_eq!(name, "no_such.tera"),
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_render_with_params() {
        let catalog = TemplateCatalog::embedded().unwrap();
        let mut params = tera::Context::new();
        params.insert("project_name", "demo");

        let rendered = catalog.render("pyproject.toml.tera", &params).unwrap();
        assert!(rendered.contains("demo"));
    }

    #[tokio::test]
    async fn test_materialize_overwrites_destination() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("greeting.txt.tera"),
            "hello {{ who }}",
        )
        .unwrap();

        let catalog = TemplateCatalog::from_dir(dir.path()).unwrap();
        let dest = dir.path().join("out/greeting.txt");
        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
        std::fs::write(&dest, "stale").unwrap();

        let mut params = tera::Context::new();
        params.insert("who", "world");
        catalog
            .materialize("greeting.txt.tera", &dest, &params)
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(dest).unwrap(), "hello world");
    }

    #[test]
    fn test_from_dir_missing_directory() {
        let result = TemplateCatalog::from_dir(Path::new("/nonexistent/templates"));
        assert!(matches!(result.unwrap_err(), TemplateError::NotFound(_)));
    }
}
