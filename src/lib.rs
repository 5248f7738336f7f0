//! mappingstats - Mapping coverage statistics for obfuscated JVM artifacts
//!
//! This library measures how much of an obfuscated JAR a name mapping has
//! made human-readable, and lays the result out as a package hierarchy for
//! a treemap.
//!
//! # Architecture
//!
//! The pipeline consists of:
//! 1. **Artifact indexing** - Read class files, collect synthetic members and bridge methods
//! 2. **Mapping parsing** - Read Tiny v1/v2 files into name triples
//! 3. **Classification** - Decide which symbols count and which are mapped
//! 4. **Aggregation** - Sum counted methods per package prefix
//! 5. **Tree serialization** - Emit the prefixes as a nested JSON forest
//! 6. **Reporting** - Summary lines, JSON summary, HTML treemap

pub mod artifact;
pub mod config;
pub mod mapping;
pub mod report;
pub mod stats;

pub use artifact::{ArtifactError, ArtifactFlags, MemberKey};
pub use config::Config;
pub use mapping::{MappingError, Mappings, NamespaceRoles};
pub use report::{ReportFormat, Reporter, TreemapReporter};
pub use stats::{analyze, CoverageReport, CoverageSummary, Statistic, TreeSerializer};
