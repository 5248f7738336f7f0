// Inheritance index - class to parent edges for every class in the artifact

use super::classfile::ParsedClass;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use std::collections::{HashMap, HashSet};

/// Directed graph with an edge from each class to its superclass and interfaces.
///
/// Parents outside the artifact appear as nodes but have no outgoing edges, so
/// ancestry stops at the artifact boundary.
#[derive(Debug, Default)]
pub struct InheritanceIndex {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl InheritanceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_classes(classes: &[ParsedClass]) -> Self {
        let mut index = Self::new();
        for class in classes {
            index.add_class(&class.name, class.parents());
        }
        index
    }

    pub fn add_class<'a>(&mut self, name: &str, parents: impl IntoIterator<Item = &'a str>) {
        let child = self.node(name);
        for parent in parents {
            let parent = self.node(parent);
            self.graph.update_edge(child, parent, ());
        }
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), idx);
        idx
    }

    /// Every transitive parent of `class_name`, not including itself
    pub fn ancestors(&self, class_name: &str) -> HashSet<&str> {
        let mut ancestors = HashSet::new();
        let Some(&start) = self.nodes.get(class_name) else {
            return ancestors;
        };

        let mut bfs = Bfs::new(&self.graph, start);
        while let Some(idx) = bfs.next(&self.graph) {
            if idx != start {
                ancestors.insert(self.graph[idx].as_str());
            }
        }
        ancestors
    }

    pub fn class_count(&self) -> usize {
        self.graph.node_count()
    }
}
