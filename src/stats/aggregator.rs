// Hierarchical aggregator
//
// Folds counted methods into per-prefix mapped/unmapped totals. A method owned
// by `net/minecraft/util/Foo` increments the keys
// "", "/net", "/net/minecraft", "/net/minecraft/util" and
// "/net/minecraft/util/Foo".

use super::Statistic;
use std::collections::HashMap;
use tracing::debug;

/// Mapped and unmapped method totals keyed by prefix path
#[derive(Debug, Clone, Default)]
pub struct PrefixCounts {
    mapped: HashMap<String, usize>,
    unmapped: HashMap<String, usize>,
}

/// Every prefix key of a segment path, shortest first
pub fn prefix_keys<S: AsRef<str>>(segments: &[S]) -> Vec<String> {
    let mut keys = Vec::with_capacity(segments.len() + 1);
    let mut key = String::new();
    keys.push(key.clone());
    for segment in segments {
        key.push('/');
        key.push_str(segment.as_ref());
        keys.push(key.clone());
    }
    keys
}

impl PrefixCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one method below every prefix of its owner path
    pub fn record<S: AsRef<str>>(&mut self, owner_path: &[S], mapped: bool) {
        let counts = if mapped {
            &mut self.mapped
        } else {
            &mut self.unmapped
        };
        for key in prefix_keys(owner_path) {
            *counts.entry(key).or_insert(0) += 1;
        }
    }

    /// Drop the structural ancestors of the root package, e.g. "", "/net" and
    /// "/net/minecraft" for `/net/minecraft/`
    pub fn remove_root_ancestors(&mut self, root_path: &str) {
        let segments: Vec<&str> = root_path
            .trim_start_matches('/')
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        for key in prefix_keys(&segments) {
            self.unmapped.remove(&key);
            self.mapped.remove(&key);
            debug!("Removed root ancestor prefix '{}'", key);
        }
    }

    pub fn mapped(&self, key: &str) -> usize {
        self.mapped.get(key).copied().unwrap_or(0)
    }

    pub fn unmapped(&self, key: &str) -> usize {
        self.unmapped.get(key).copied().unwrap_or(0)
    }

    pub fn count(&self, key: &str, statistic: Statistic) -> usize {
        match statistic {
            Statistic::Unmapped => self.unmapped(key),
            Statistic::Mapped => self.mapped(key),
        }
    }

    /// Keys that have an entry for `statistic`, in no particular order
    pub fn keys(&self, statistic: Statistic) -> impl Iterator<Item = &str> {
        let counts = match statistic {
            Statistic::Unmapped => &self.unmapped,
            Statistic::Mapped => &self.mapped,
        };
        counts.keys().map(String::as_str)
    }

    pub fn len(&self, statistic: Statistic) -> usize {
        match statistic {
            Statistic::Unmapped => self.unmapped.len(),
            Statistic::Mapped => self.mapped.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mapped.is_empty() && self.unmapped.is_empty()
    }
}
