//! Coverage statistics
//!
//! Classification of mapped symbols, per-package aggregation of method
//! counts and serialization of the aggregate as a treemap forest.

mod aggregator;
mod classifier;
mod tree;

pub use aggregator::{prefix_keys, PrefixCounts};
pub use classifier::{
    ClassClassification, Classification, Classifier, ClassifierRules, Coverage, CoverageKind,
    CoverageSummary,
};
pub use tree::{KeyOrder, SerializedTree, Statistic, TreeSerializer};

use crate::artifact::ArtifactFlags;
use crate::mapping::Mappings;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("No {0} were counted, coverage is undefined")]
    EmptyCategory(CoverageKind),
}

/// Result of one coverage run
#[derive(Debug, Clone, Default)]
pub struct CoverageReport {
    pub summary: CoverageSummary,
    pub counts: PrefixCounts,
}

/// Classify every symbol of `mappings` and aggregate counted methods per
/// package prefix.
///
/// Methods are classified before fields, both in file order, so a shared
/// de-duplication set lets a method claim an intermediate name first.
pub fn analyze(
    mappings: &Mappings,
    flags: &ArtifactFlags,
    rules: &ClassifierRules,
) -> CoverageReport {
    let mut classifier = Classifier::new(rules, flags);
    let mut report = CoverageReport::default();

    for method in &mappings.methods {
        let result = classifier.classify_method(method);
        if result.counted {
            report.summary.methods.record(result.mapped);
            report.counts.record(&result.prefix_path, result.mapped);
        }
    }

    for field in &mappings.fields {
        let result = classifier.classify_field(field);
        if result.counted {
            report.summary.fields.record(result.mapped);
        }
    }

    for class in &mappings.classes {
        report.summary.record_class(classifier.classify_class(class));
    }

    report.counts.remove_root_ancestors(&rules.root_path);

    for (kind, coverage) in report.summary.entries() {
        debug!("{}: {} of {} mapped", kind, coverage.mapped, coverage.total);
    }
    info!(
        "Counted {} methods, {} fields, {} classes",
        report.summary.methods.total, report.summary.fields.total, report.summary.classes.total
    );

    report
}
