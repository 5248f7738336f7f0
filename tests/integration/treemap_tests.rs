//! Treemap serialization tests
//!
//! Build prefix counts from many owners and check that the streamed forest
//! is well-formed JSON whose nesting and order follow the package layout.

use mappingstats::report::{fill_template, TreemapReporter};
use mappingstats::stats::{KeyOrder, PrefixCounts, Statistic, TreeSerializer};
use serde_json::Value;
use std::path::PathBuf;

const ROOT: &str = "/net/minecraft/";
const MARKER: &str = "class_";

fn counts(owners: &[(&str, bool)]) -> PrefixCounts {
    let mut counts = PrefixCounts::new();
    for (owner, mapped) in owners {
        let path: Vec<&str> = owner.split('/').collect();
        counts.record(&path, *mapped);
    }
    counts.remove_root_ancestors(ROOT);
    counts
}

fn sample() -> PrefixCounts {
    counts(&[
        ("net/minecraft/util/math/Vec3", false),
        ("net/minecraft/util/math/Vec3", false),
        ("net/minecraft/util/math/class_4", false),
        ("net/minecraft/util/Identifier", false),
        ("net/minecraft/util/class_7", false),
        ("net/minecraft/util/Identifier", true),
        ("net/minecraft/entity/Entity", false),
        ("net/minecraft/entity/ai/Brain", false),
        ("net/minecraft/class_9", false),
        ("net/minecraft/Bootstrap", false),
    ])
}

fn serialize(counts: &PrefixCounts, statistic: Statistic) -> Value {
    let tree = TreeSerializer::new(counts, ROOT, MARKER, statistic).serialize();
    assert_eq!(tree.final_depth, 0);
    serde_json::from_str(&tree.json).expect("tree must be valid JSON")
}

fn names(nodes: &Value) -> Vec<&str> {
    nodes
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["name"].as_str().unwrap())
        .collect()
}

/// Every node's value is at least the sum of its children's
fn check_values(nodes: &Value) {
    for node in nodes.as_array().unwrap() {
        if let Some(children) = node.get("children") {
            let sum: u64 = children
                .as_array()
                .unwrap()
                .iter()
                .map(|c| c["value"].as_u64().unwrap())
                .sum();
            assert!(node["value"].as_u64().unwrap() >= sum, "{}", node["name"]);
            assert!(!children.as_array().unwrap().is_empty());
            check_values(children);
        }
    }
}

fn count_nodes(nodes: &Value) -> usize {
    nodes
        .as_array()
        .unwrap()
        .iter()
        .map(|n| 1 + n.get("children").map_or(0, count_nodes))
        .sum()
}

// ============================================================================
// Structure
// ============================================================================

#[test]
fn test_forest_structure() {
    let tree = serialize(&sample(), Statistic::Unmapped);

    assert_eq!(names(&tree), vec!["entity", "util", "Bootstrap", "class_9"]);

    let util = &tree[1];
    assert_eq!(util["value"], 5);
    assert_eq!(names(&util["children"]), vec!["math", "Identifier", "class_7"]);

    let math = &util["children"][0];
    assert_eq!(math["value"], 3);
    assert_eq!(names(&math["children"]), vec!["Vec3", "class_4"]);
    assert_eq!(math["children"][0]["value"], 2);
    assert!(math["children"][0].get("children").is_none());

    let entity = &tree[0];
    assert_eq!(names(&entity["children"]), vec!["ai", "Entity"]);
    assert_eq!(names(&entity["children"][0]["children"]), vec!["Brain"]);
}

#[test]
fn test_every_key_becomes_one_node() {
    let counts = sample();
    let tree = serialize(&counts, Statistic::Unmapped);
    assert_eq!(count_nodes(&tree), counts.len(Statistic::Unmapped));
    check_values(&tree);
}

#[test]
fn test_mapped_statistic_uses_mapped_keys() {
    let tree = serialize(&sample(), Statistic::Mapped);
    assert_eq!(names(&tree), vec!["util"]);
    assert_eq!(names(&tree[0]["children"]), vec!["Identifier"]);
    assert_eq!(tree[0]["children"][0]["value"], 1);
}

#[test]
fn test_deep_chain_closes_every_level() {
    let counts = counts(&[
        ("net/minecraft/a/b/c/d/e/F", false),
        ("net/minecraft/z/Y", false),
    ]);
    let tree = TreeSerializer::new(&counts, ROOT, MARKER, Statistic::Unmapped).serialize();
    assert_eq!(tree.max_depth, 5);
    assert_eq!(tree.final_depth, 0);

    let value: Value = serde_json::from_str(&tree.json).unwrap();
    assert_eq!(names(&value), vec!["a", "z"]);
}

#[test]
fn test_keys_outside_root() {
    // Keys shorter than the root path sort case-insensitively and still
    // produce balanced output
    let mut counts = PrefixCounts::new();
    counts.record(&["net", "minecraft", "Foo"], false);
    counts.record(&["com", "mojang", "Bar"], false);

    let tree = TreeSerializer::new(&counts, ROOT, MARKER, Statistic::Unmapped).serialize();
    assert_eq!(tree.final_depth, 0);
    let value: Value = serde_json::from_str(&tree.json).unwrap();
    assert!(value.is_array());
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_sorted_keys_are_preorder() {
    let counts = sample();
    let serializer = TreeSerializer::new(&counts, ROOT, MARKER, Statistic::Unmapped);
    let keys = serializer.sorted_keys();

    for (i, key) in keys.iter().enumerate() {
        // Descendants directly follow their ancestor
        let prefix = format!("{}/", key);
        let descendants = keys.iter().filter(|k| k.starts_with(&prefix)).count();
        assert!(keys[i + 1..=i + descendants]
            .iter()
            .all(|k| k.starts_with(&prefix)));
    }
}

#[test]
fn test_order_is_antisymmetric() {
    let order = KeyOrder::new(ROOT, MARKER);
    let counts = sample();
    let keys: Vec<_> = counts.keys(Statistic::Unmapped).collect();

    for a in &keys {
        for b in &keys {
            assert_eq!(order.compare(a, b), order.compare(b, a).reverse(), "{} {}", a, b);
        }
    }
}

// ============================================================================
// HTML
// ============================================================================

#[test]
fn test_treemap_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("treemap.html");
    let counts = sample();
    let tree = TreeSerializer::new(&counts, ROOT, MARKER, Statistic::Unmapped).serialize();

    TreemapReporter::new(output.clone())
        .report(Statistic::Unmapped.label(), &tree)
        .unwrap();

    let html = std::fs::read_to_string(&output).unwrap();
    assert!(html.contains("<title>Unmapped methods</title>"));
    assert!(html.contains(&tree.json));
}

#[test]
fn test_unwritable_output() {
    let tree = TreeSerializer::new(&PrefixCounts::new(), ROOT, MARKER, Statistic::Unmapped)
        .serialize();
    let result = TreemapReporter::new(PathBuf::from("/nonexistent/dir/treemap.html"))
        .report("Unmapped methods", &tree);
    assert!(result.is_err());
}

#[test]
fn test_fill_template_leaves_other_text() {
    assert_eq!(fill_template("{{OTHER}} {{DATA}}", "l", "[]"), "{{OTHER}} []");
}
