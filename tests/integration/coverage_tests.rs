//! Coverage pipeline tests
//!
//! Index a hand-assembled JAR, read Tiny mappings and check the summary and
//! per-package counts.

mod common;

use common::{sample_jar, SAMPLE_TINY_V1, SAMPLE_TINY_V2};
use mappingstats::artifact::read_jar;
use mappingstats::config::Config;
use mappingstats::mapping::TinyReader;
use mappingstats::stats::{analyze, Coverage, ClassifierRules, CoverageReport, Statistic};
use mappingstats::{ArtifactFlags, Mappings, MemberKey, NamespaceRoles};
use std::path::Path;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    flags: ArtifactFlags,
    mappings: Mappings,
}

fn fixture(tiny: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("client.jar");
    sample_jar(&jar);
    let tiny_path = dir.path().join("mappings.tiny");
    std::fs::write(&tiny_path, tiny).unwrap();

    let flags = ArtifactFlags::from_jar(&jar).unwrap();
    let mappings = Mappings::from_file(&tiny_path, &NamespaceRoles::default()).unwrap();
    Fixture {
        _dir: dir,
        flags,
        mappings,
    }
}

fn run(fixture: &Fixture) -> CoverageReport {
    analyze(&fixture.mappings, &fixture.flags, &ClassifierRules::default())
}

// ============================================================================
// Artifact indexing
// ============================================================================

#[test]
fn test_jar_classes_are_read() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("client.jar");
    sample_jar(&jar);

    let mut names: Vec<_> = read_jar(&jar).unwrap().into_iter().map(|c| c.name).collect();
    names.sort();
    assert_eq!(names, vec!["a", "a$1", "b"]);
}

#[test]
fn test_synthetic_and_bridge_flags() {
    let fixture = fixture(SAMPLE_TINY_V2);
    let stats = fixture.flags.stats();
    assert_eq!(stats.synthetic_methods, 2);
    assert_eq!(stats.synthetic_fields, 1);
    assert_eq!(stats.bridges, 1);

    assert!(fixture
        .flags
        .field_flags(&MemberKey::field("a", "g"))
        .is_excluded());
    assert!(!fixture
        .flags
        .field_flags(&MemberKey::field("a", "d"))
        .is_excluded());

    let accessed = MemberKey::method("a", "f", "()Ljava/lang/String;");
    let bridge = MemberKey::method("a", "e", "()Ljava/lang/Object;");
    assert_eq!(fixture.flags.accessed_to_bridge().get(&accessed), Some(&bridge));
    assert!(fixture.flags.method_flags(&accessed).is_excluded());
    assert!(!fixture
        .flags
        .method_flags(&MemberKey::method("a", "a", "()V"))
        .is_excluded());
}

#[test]
fn test_missing_jar_is_an_error() {
    assert!(ArtifactFlags::from_jar(Path::new("/nonexistent/client.jar")).is_err());
}

// ============================================================================
// Summary
// ============================================================================

#[test]
fn test_sample_summary() {
    let report = run(&fixture(SAMPLE_TINY_V2));
    let summary = report.summary;

    // method_3 is synthetic, method_5 is bridged, method_6 is the bridge
    assert_eq!(summary.methods, Coverage { mapped: 1, total: 3 });
    // field_2 is synthetic
    assert_eq!(summary.fields, Coverage { mapped: 1, total: 1 });
    // Foo$1 is anonymous
    assert_eq!(summary.classes, Coverage { mapped: 1, total: 2 });
    assert_eq!(summary.top_level_classes, Coverage { mapped: 1, total: 2 });
}

#[test]
fn test_v1_and_v2_agree() {
    let v1 = run(&fixture(SAMPLE_TINY_V1));
    let v2 = run(&fixture(SAMPLE_TINY_V2));
    assert_eq!(v1.summary, v2.summary);

    for statistic in [Statistic::Mapped, Statistic::Unmapped] {
        let mut keys_v1: Vec<_> = v1.counts.keys(statistic).collect();
        let mut keys_v2: Vec<_> = v2.counts.keys(statistic).collect();
        keys_v1.sort();
        keys_v2.sort();
        assert_eq!(keys_v1, keys_v2);
    }
}

#[test]
fn test_analysis_is_repeatable() {
    let fixture = fixture(SAMPLE_TINY_V2);
    assert_eq!(run(&fixture).summary, run(&fixture).summary);
}

// ============================================================================
// Per-package counts
// ============================================================================

#[test]
fn test_prefix_counts() {
    let report = run(&fixture(SAMPLE_TINY_V2));
    let counts = &report.counts;

    assert_eq!(counts.mapped("/net/minecraft/util/Foo"), 1);
    assert_eq!(counts.unmapped("/net/minecraft/util/Foo"), 1);
    assert_eq!(counts.unmapped("/net/minecraft/util"), 1);
    assert_eq!(counts.unmapped("/net/minecraft/class_2"), 1);

    // Root ancestors are gone from both maps
    for key in ["", "/net", "/net/minecraft"] {
        assert_eq!(counts.mapped(key), 0, "{}", key);
        assert_eq!(counts.unmapped(key), 0, "{}", key);
    }
}

#[test]
fn test_counts_agree_with_method_totals() {
    let report = run(&fixture(SAMPLE_TINY_V2));
    let top_level: usize = ["/net/minecraft/util", "/net/minecraft/class_2"]
        .iter()
        .map(|key| report.counts.mapped(key) + report.counts.unmapped(key))
        .sum();
    assert_eq!(top_level, report.summary.methods.total);
}

// ============================================================================
// Rules
// ============================================================================

const LEGACY: &str = "tiny\t2\t0\tofficial\tintermediary\tnamed
c\tnet/minecraft/realms/R\tnet/minecraft/realms/R\tnet/minecraft/realms/R
\tm\t()V\ta\tmethod_10\tmethod_10
\tf\tI\tb\tfield_10\tfield_10
";

#[test]
fn test_legacy_package_counts_as_mapped() {
    let mappings = TinyReader::new(&NamespaceRoles::default())
        .read(LEGACY)
        .unwrap();
    let report = analyze(&mappings, &ArtifactFlags::new(), &ClassifierRules::default());
    assert_eq!(report.summary.methods, Coverage { mapped: 1, total: 1 });
    assert_eq!(report.summary.fields, Coverage { mapped: 1, total: 1 });
}

#[test]
fn test_legacy_packages_from_config() {
    let mappings = TinyReader::new(&NamespaceRoles::default())
        .read(LEGACY)
        .unwrap();
    let mut config = Config::default();
    config.legacy_packages.clear();

    let report = analyze(&mappings, &ArtifactFlags::new(), &config.classifier_rules());
    assert_eq!(report.summary.methods, Coverage { mapped: 0, total: 1 });
}

#[test]
fn test_other_root_package_counts_nothing() {
    let fixture = fixture(SAMPLE_TINY_V2);
    let mut config = Config::default();
    config.root_package = "com.mojang".to_string();

    let report = analyze(&fixture.mappings, &fixture.flags, &config.classifier_rules());
    assert_eq!(report.summary.methods.total, 0);
    assert_eq!(report.summary.fields.total, 0);
    assert!(report.counts.is_empty());
    // Classes are not bounded by the root package
    assert_eq!(report.summary.classes.total, 2);
}

#[test]
fn test_first_occurrence_wins() {
    let content = "tiny\t2\t0\tofficial\tintermediary\tnamed
c\ta\tnet/minecraft/class_1\tnet/minecraft/Foo
\tm\t()V\ta\tmethod_1\trun
c\tb\tnet/minecraft/class_2\tnet/minecraft/Bar
\tm\t()V\ta\tmethod_1\tmethod_1
";
    let mappings = TinyReader::new(&NamespaceRoles::default())
        .read(content)
        .unwrap();
    let report = analyze(&mappings, &ArtifactFlags::new(), &ClassifierRules::default());

    assert_eq!(report.summary.methods, Coverage { mapped: 1, total: 1 });
    assert_eq!(report.counts.mapped("/net/minecraft/Foo"), 1);
    assert_eq!(report.counts.unmapped("/net/minecraft/Bar"), 0);
}
