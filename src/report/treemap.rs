use crate::stats::SerializedTree;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::PathBuf;
use tracing::info;

const BUILTIN_TEMPLATE: &str = include_str!("../../templates/treemap.html");

const LABEL_PLACEHOLDER: &str = "{{LABEL}}";
const DATA_PLACEHOLDER: &str = "{{DATA}}";

/// Writes the tree into an HTML treemap page
pub struct TreemapReporter {
    output_path: PathBuf,
    template_path: Option<PathBuf>,
}

impl TreemapReporter {
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            output_path,
            template_path: None,
        }
    }

    /// Use a custom template instead of the built-in one
    pub fn with_template(mut self, template_path: Option<PathBuf>) -> Self {
        self.template_path = template_path;
        self
    }

    pub fn render(&self, label: &str, tree: &SerializedTree) -> Result<String> {
        let template = match &self.template_path {
            Some(path) => std::fs::read_to_string(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to read template: {}", path.display()))?,
            None => BUILTIN_TEMPLATE.to_string(),
        };
        Ok(fill_template(&template, label, &tree.json))
    }

    pub fn report(&self, label: &str, tree: &SerializedTree) -> Result<()> {
        let html = self.render(label, tree)?;
        std::fs::write(&self.output_path, html)
            .into_diagnostic()
            .wrap_err_with(|| {
                format!("Failed to write treemap: {}", self.output_path.display())
            })?;

        info!(
            "Treemap with {} nodes written to {}",
            tree.nodes,
            self.output_path.display()
        );
        Ok(())
    }
}

/// Substitute every label and data placeholder
pub fn fill_template(template: &str, label: &str, data: &str) -> String {
    template
        .replace(LABEL_PLACEHOLDER, label)
        .replace(DATA_PLACEHOLDER, data)
}
