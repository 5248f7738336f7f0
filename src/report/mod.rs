mod json;
mod terminal;
mod treemap;

pub use json::JsonReporter;
pub use terminal::{summary_line, TerminalReporter};
pub use treemap::{fill_template, TreemapReporter};

use crate::stats::CoverageSummary;
use miette::Result;
use std::path::PathBuf;

/// Output format for the coverage summary
#[derive(Debug, Clone, Default)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

/// Reporter for the four coverage categories
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self { format, output_path }
    }

    pub fn report(&self, summary: &CoverageSummary) -> Result<()> {
        match &self.format {
            ReportFormat::Terminal => {
                let reporter = TerminalReporter::new();
                reporter.report(summary)
            }
            ReportFormat::Json => {
                let reporter = JsonReporter::new(self.output_path.clone());
                reporter.report(summary)
            }
        }
    }
}
