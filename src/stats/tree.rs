// Ordered tree serializer
//
// Turns the flat prefix keys into a nested `{name, value, children}` forest
// in one pass over the sorted keys. The sort order and the level computation
// depend on each other: the order puts every key right after its parent's
// last descendant-so-far, so the shared prefix with the previous key tells
// how many levels to close before the next node opens.

use super::aggregator::PrefixCounts;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Which per-prefix count a tree shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    #[default]
    Unmapped,
    Mapped,
}

impl Statistic {
    pub fn label(self) -> &'static str {
        match self {
            Statistic::Unmapped => "Unmapped methods",
            Statistic::Mapped => "Mapped methods",
        }
    }
}

/// Sibling order of prefix keys
///
/// Within one parent: packages (lowercase) before classes (uppercase), and
/// names still carrying the class marker last.
#[derive(Debug, Clone, Copy)]
pub struct KeyOrder<'a> {
    root_path: &'a str,
    class_marker: &'a str,
}

impl<'a> KeyOrder<'a> {
    pub fn new(root_path: &'a str, class_marker: &'a str) -> Self {
        Self {
            root_path,
            class_marker,
        }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        if a.len() < self.root_path.len() || b.len() < self.root_path.len() {
            return compare_ignore_case(a, b);
        }

        let a = a.strip_prefix(self.root_path).unwrap_or(a);
        let b = b.strip_prefix(self.root_path).unwrap_or(b);

        let mut a_segments = a.split('/');
        let mut b_segments = b.split('/');
        loop {
            match (a_segments.next(), b_segments.next()) {
                (Some(x), Some(y)) if x == y => continue,
                (Some(x), Some(y)) => return self.compare_segment(x, y),
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (None, None) => return Ordering::Equal,
            }
        }
    }

    fn compare_segment(&self, a: &str, b: &str) -> Ordering {
        let marked = |s: &str| !self.class_marker.is_empty() && s.starts_with(self.class_marker);
        let class_like = |s: &str| s.chars().next().map_or(false, char::is_uppercase);

        marked(a)
            .cmp(&marked(b))
            .then_with(|| class_like(a).cmp(&class_like(b)))
            .then_with(|| compare_ignore_case(a, b))
    }

    pub fn sort(&self, keys: &mut [&str]) {
        keys.sort_by(|a, b| self.compare(a, b));
    }
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Length of the `/`-aligned common prefix of two keys, including the
/// trailing `/`
fn shared_prefix_len(previous: &str, key: &str) -> usize {
    let previous = previous.as_bytes().iter().chain(b"/");
    let current = key.as_bytes().iter().chain(b"/");

    let mut shared = 0;
    for (i, (p, c)) in previous.zip(current).enumerate() {
        if p != c {
            break;
        }
        if *c == b'/' {
            shared = i + 1;
        }
    }
    shared
}

/// Serialized forest and its shape
#[derive(Debug, Clone)]
pub struct SerializedTree {
    pub json: String,
    pub nodes: usize,
    pub max_depth: usize,
    /// Open `children` arrays left at the end; 0 for well-formed output
    pub final_depth: usize,
}

pub struct TreeSerializer<'a> {
    counts: &'a PrefixCounts,
    order: KeyOrder<'a>,
    statistic: Statistic,
}

impl<'a> TreeSerializer<'a> {
    pub fn new(
        counts: &'a PrefixCounts,
        root_path: &'a str,
        class_marker: &'a str,
        statistic: Statistic,
    ) -> Self {
        Self {
            counts,
            order: KeyOrder::new(root_path, class_marker),
            statistic,
        }
    }

    /// Keys of the chosen statistic in tree order
    pub fn sorted_keys(&self) -> Vec<&'a str> {
        let mut keys: Vec<&str> = self.counts.keys(self.statistic).collect();
        self.order.sort(&mut keys);
        keys
    }

    pub fn serialize(&self) -> SerializedTree {
        let keys = self.sorted_keys();
        let mut writer = TreeWriter::new();

        // The first key is measured against the root itself
        let mut previous = self.order.root_path.trim_end_matches('/');
        let mut previous_level: Option<usize> = None;

        for key in keys {
            let shared = shared_prefix_len(previous, key);
            let level = key
                .as_bytes()
                .iter()
                .chain(b"/")
                .take(shared)
                .filter(|&&b| b == b'/')
                .count();

            match previous_level {
                None => {}
                Some(prev) if level > prev => writer.open_children(),
                Some(prev) => {
                    writer.close_levels(prev - level);
                    writer.close_node();
                    writer.separator();
                }
            }

            let name = match key.get(shared..) {
                Some(rest) if !rest.is_empty() => rest,
                _ => key,
            };
            writer.open_node(name, self.counts.count(key, self.statistic));

            previous = key;
            previous_level = Some(level);
        }

        if previous_level.is_some() {
            writer.close_levels(writer.depth);
            writer.close_node();
        }

        let tree = writer.finish();
        debug!(
            "Serialized {} nodes, max depth {}",
            tree.nodes, tree.max_depth
        );
        tree
    }
}

/// Streaming JSON writer that tracks how many `children` arrays are open
struct TreeWriter {
    out: String,
    depth: usize,
    max_depth: usize,
    nodes: usize,
}

impl TreeWriter {
    fn new() -> Self {
        Self {
            out: String::from("["),
            depth: 0,
            max_depth: 0,
            nodes: 0,
        }
    }

    fn open_node(&mut self, name: &str, value: usize) {
        self.out.push_str("{\"name\":");
        self.out
            .push_str(&serde_json::Value::String(name.to_string()).to_string());
        self.out.push_str(",\"value\":");
        self.out.push_str(&value.to_string());
        self.nodes += 1;
    }

    fn open_children(&mut self) {
        self.out.push_str(",\"children\":[");
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
    }

    /// Close the last node of `levels` open children arrays, never more than are open
    fn close_levels(&mut self, levels: usize) {
        for _ in 0..levels.min(self.depth) {
            self.out.push_str("}]");
            self.depth -= 1;
        }
    }

    fn close_node(&mut self) {
        self.out.push('}');
    }

    fn separator(&mut self) {
        self.out.push(',');
    }

    fn finish(mut self) -> SerializedTree {
        self.out.push(']');
        SerializedTree {
            json: self.out,
            nodes: self.nodes,
            max_depth: self.max_depth,
            final_depth: self.depth,
        }
    }
}
