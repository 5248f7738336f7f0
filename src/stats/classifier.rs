// Symbol classifier
//
// Decides for every method, field and class whether it counts towards
// coverage and whether its human name replaced the machine-generated one.

use super::StatsError;
use crate::artifact::{ArtifactFlags, EligibilityFlags, MemberKey};
use crate::mapping::{ClassTriple, MemberTriple};
use serde::Serialize;
use std::collections::HashSet;

/// Rules the classifier applies; see `Config::classifier_rules`
#[derive(Debug, Clone)]
pub struct ClassifierRules {
    /// Root package as a prefix path with leading and trailing `/`
    pub root_path: String,
    /// Original-namespace owner prefixes that always count as mapped
    pub legacy_packages: Vec<String>,
    pub method_prefix: String,
    pub field_prefix: String,
    pub class_marker: String,
    /// Methods and fields share one seen-name set
    pub shared_dedup: bool,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            root_path: "/net/minecraft/".to_string(),
            legacy_packages: vec!["net/minecraft/realms".to_string()],
            method_prefix: "method_".to_string(),
            field_prefix: "field_".to_string(),
            class_marker: "class_".to_string(),
            shared_dedup: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberKind {
    Method,
    Field,
}

/// Outcome for one method or field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    pub counted: bool,
    pub mapped: bool,
    /// Human-name owner path split on `/`
    pub prefix_path: Vec<String>,
}

/// Outcome for one class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassClassification {
    pub counted: bool,
    pub mapped: bool,
    pub top_level: bool,
}

/// Stateful classifier. The seen-name sets make the outcome depend on the
/// order symbols are fed in; use a fresh classifier per run.
pub struct Classifier<'a> {
    rules: &'a ClassifierRules,
    flags: &'a ArtifactFlags,
    seen_methods: HashSet<String>,
    seen_fields: HashSet<String>,
}

impl<'a> Classifier<'a> {
    pub fn new(rules: &'a ClassifierRules, flags: &'a ArtifactFlags) -> Self {
        Self {
            rules,
            flags,
            seen_methods: HashSet::new(),
            seen_fields: HashSet::new(),
        }
    }

    pub fn classify_method(&mut self, method: &MemberTriple) -> Classification {
        let key = MemberKey::method(
            &method.original.owner,
            &method.original.name,
            &method.original.descriptor,
        );
        let flags = self.flags.method_flags(&key);
        self.classify_member(MemberKind::Method, method, flags)
    }

    pub fn classify_field(&mut self, field: &MemberTriple) -> Classification {
        let key = MemberKey::field(&field.original.owner, &field.original.name);
        let flags = self.flags.field_flags(&key);
        self.classify_member(MemberKind::Field, field, flags)
    }

    fn classify_member(
        &mut self,
        kind: MemberKind,
        member: &MemberTriple,
        flags: EligibilityFlags,
    ) -> Classification {
        let intermediate = &member.intermediate.name;

        // First occurrence wins, even if it is then excluded
        if !self.seen(kind).insert(intermediate.clone()) {
            return Classification::default();
        }

        let prefix = match kind {
            MemberKind::Method => &self.rules.method_prefix,
            MemberKind::Field => &self.rules.field_prefix,
        };
        if !intermediate.starts_with(prefix.as_str()) {
            return Classification::default();
        }

        if flags.is_excluded() || !self.in_root(&member.human.owner) {
            return Classification::default();
        }

        let mapped = member.human.name != *intermediate || self.is_legacy(&member.original.owner);

        Classification {
            counted: true,
            mapped,
            prefix_path: member.human.owner.split('/').map(str::to_string).collect(),
        }
    }

    pub fn classify_class(&self, class: &ClassTriple) -> ClassClassification {
        let (simple, top_level) = match class.human.rfind('$') {
            Some(idx) => (&class.human[idx + 1..], false),
            None => (class.human.as_str(), true),
        };

        // Anonymous and local classes
        if simple.chars().next().map_or(true, |c| c.is_ascii_digit()) {
            return ClassClassification::default();
        }

        ClassClassification {
            counted: true,
            mapped: !simple.contains(self.rules.class_marker.as_str()),
            top_level,
        }
    }

    fn seen(&mut self, kind: MemberKind) -> &mut HashSet<String> {
        if self.rules.shared_dedup || kind == MemberKind::Method {
            &mut self.seen_methods
        } else {
            &mut self.seen_fields
        }
    }

    fn in_root(&self, human_owner: &str) -> bool {
        format!("/{}", human_owner).starts_with(&self.rules.root_path)
    }

    fn is_legacy(&self, original_owner: &str) -> bool {
        self.rules
            .legacy_packages
            .iter()
            .any(|package| original_owner.starts_with(package.as_str()))
    }
}

/// The four coverage categories, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageKind {
    TopLevelClasses,
    Classes,
    Methods,
    Fields,
}

impl CoverageKind {
    pub fn label(self) -> &'static str {
        match self {
            CoverageKind::TopLevelClasses => "top-level classes",
            CoverageKind::Classes => "classes",
            CoverageKind::Methods => "methods",
            CoverageKind::Fields => "fields",
        }
    }
}

impl std::fmt::Display for CoverageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Mapped and total counts of one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Coverage {
    pub mapped: usize,
    pub total: usize,
}

impl Coverage {
    pub fn record(&mut self, mapped: bool) {
        self.total += 1;
        if mapped {
            self.mapped += 1;
        }
    }

    pub fn percent(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.mapped as f64 / self.total as f64 * 100.0)
        }
    }

    /// `mapped / total (pp.pp%)`; an empty category has no percentage
    pub fn render(&self, kind: CoverageKind) -> Result<String, StatsError> {
        let percent = self.percent().ok_or(StatsError::EmptyCategory(kind))?;
        Ok(format!("{} / {} ({:.2}%)", self.mapped, self.total, percent))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CoverageSummary {
    pub top_level_classes: Coverage,
    pub classes: Coverage,
    pub methods: Coverage,
    pub fields: Coverage,
}

impl CoverageSummary {
    pub fn entries(&self) -> [(CoverageKind, Coverage); 4] {
        [
            (CoverageKind::TopLevelClasses, self.top_level_classes),
            (CoverageKind::Classes, self.classes),
            (CoverageKind::Methods, self.methods),
            (CoverageKind::Fields, self.fields),
        ]
    }

    pub fn record_class(&mut self, class: ClassClassification) {
        if !class.counted {
            return;
        }
        self.classes.record(class.mapped);
        if class.top_level {
            self.top_level_classes.record(class.mapped);
        }
    }
}
