use crate::stats::{Coverage, CoverageKind, CoverageSummary, StatsError};
use miette::Result;
use tracing::warn;

/// Plain summary lines on stdout, one per category
pub struct TerminalReporter;

impl TerminalReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn report(&self, summary: &CoverageSummary) -> Result<()> {
        for line in self.lines(summary) {
            println!("{}", line);
        }
        Ok(())
    }

    pub fn lines(&self, summary: &CoverageSummary) -> Vec<String> {
        summary
            .entries()
            .iter()
            .map(|(kind, coverage)| match summary_line(*kind, coverage) {
                Ok(line) => line,
                Err(StatsError::EmptyCategory(kind)) => {
                    warn!("No {} were counted", kind);
                    format!("0 / 0 (n/a) {} are mapped", kind)
                }
            })
            .collect()
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// `M / N (PP.PP%) <kind> are mapped`
pub fn summary_line(kind: CoverageKind, coverage: &Coverage) -> Result<String, StatsError> {
    Ok(format!("{} {} are mapped", coverage.render(kind)?, kind))
}
