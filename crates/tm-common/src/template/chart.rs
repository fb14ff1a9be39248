//! Chart rendering
//!
//! A chart is a directory with a `templates/` folder. Every `*.yaml`, `*.yml`
//! and `*.tpl` file in it is rendered with minijinja against a context of:
//! - `Release.Name`, `Release.Namespace`
//! - `Values` (the structured value map passed by the caller)
//!
//! Undefined values are errors, so a typo in a chart fails the render instead
//! of producing a Testrun with empty fields.

use std::path::{Path, PathBuf};

use minijinja::{context, Environment, UndefinedBehavior, Value};
use tracing::debug;

use crate::Error;

const TEMPLATES_DIR: &str = "templates";
const TEMPLATE_EXTENSIONS: &[&str] = &["yaml", "yml", "tpl"];

/// Renders a chart into manifest documents
pub trait ChartRenderer: Send + Sync {
    /// Render all templates of the chart at `chart_path`
    ///
    /// Returns one string per template that produced non-blank output, in
    /// file name order.
    fn render(
        &self,
        chart_path: &Path,
        release_name: &str,
        namespace: &str,
        values: &serde_json::Value,
    ) -> Result<Vec<String>, Error>;
}

/// Chart renderer backed by minijinja
pub struct MiniJinjaChartRenderer {
    env: Environment<'static>,
}

impl Default for MiniJinjaChartRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MiniJinjaChartRenderer {
    /// Create a renderer with strict undefined handling
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        Self { env }
    }

    fn template_files(chart_path: &Path) -> Result<Vec<PathBuf>, Error> {
        let dir = chart_path.join(TEMPLATES_DIR);
        let entries = std::fs::read_dir(&dir).map_err(|e| {
            Error::template(dir.display().to_string(), format!("cannot read chart: {}", e))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| Error::template(dir.display().to_string(), e.to_string()))?
                .path();
            let is_template = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext));
            if path.is_file() && is_template {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl ChartRenderer for MiniJinjaChartRenderer {
    fn render(
        &self,
        chart_path: &Path,
        release_name: &str,
        namespace: &str,
        values: &serde_json::Value,
    ) -> Result<Vec<String>, Error> {
        let ctx = context! {
            Release => context! {
                Name => release_name,
                Namespace => namespace,
            },
            Values => Value::from_serialize(values),
        };

        let mut rendered = Vec::new();
        for file in Self::template_files(chart_path)? {
            let name = file.display().to_string();
            let source = std::fs::read_to_string(&file)
                .map_err(|e| Error::template(&name, e.to_string()))?;
            let output = self
                .env
                .render_str(&source, &ctx)
                .map_err(|e| Error::template(&name, e.to_string()))?;

            if output.trim().is_empty() {
                debug!(template = %name, "template rendered empty, skipping");
                continue;
            }
            rendered.push(output);
        }
        Ok(rendered)
    }
}
