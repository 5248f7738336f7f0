use crate::stats::{Coverage, CoverageKind, CoverageSummary};
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Serialize;
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, summary: &CoverageSummary) -> Result<()> {
        let json = self.render(summary)?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write report: {}", path.display()))?;
            eprintln!("Report written to: {}", path.display());
        } else {
            println!("{}", json);
        }

        Ok(())
    }

    pub fn render(&self, summary: &CoverageSummary) -> Result<String> {
        let report = JsonReport::from_summary(summary);
        serde_json::to_string_pretty(&report).into_diagnostic()
    }
}

#[derive(Serialize)]
struct JsonReport {
    version: &'static str,
    top_level_classes: JsonCoverage,
    classes: JsonCoverage,
    methods: JsonCoverage,
    fields: JsonCoverage,
}

#[derive(Serialize)]
struct JsonCoverage {
    kind: CoverageKind,
    mapped: usize,
    total: usize,
    /// Absent total gives `null`
    percent: Option<f64>,
}

impl JsonCoverage {
    fn new(kind: CoverageKind, coverage: &Coverage) -> Self {
        Self {
            kind,
            mapped: coverage.mapped,
            total: coverage.total,
            percent: coverage.percent().map(|p| (p * 100.0).round() / 100.0),
        }
    }
}

impl JsonReport {
    fn from_summary(summary: &CoverageSummary) -> Self {
        Self {
            version: "1.0",
            top_level_classes: JsonCoverage::new(
                CoverageKind::TopLevelClasses,
                &summary.top_level_classes,
            ),
            classes: JsonCoverage::new(CoverageKind::Classes, &summary.classes),
            methods: JsonCoverage::new(CoverageKind::Methods, &summary.methods),
            fields: JsonCoverage::new(CoverageKind::Fields, &summary.fields),
        }
    }
}
