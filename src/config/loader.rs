use crate::mapping::NamespaceRoles;
use crate::stats::{ClassifierRules, Statistic};
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a coverage run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Package that bounds the hierarchy (`net/minecraft` or `net.minecraft`)
    pub root_package: String,

    /// Original-namespace package prefixes whose members always count as mapped
    pub legacy_packages: Vec<String>,

    /// Namespace names in the mapping file
    pub namespaces: NamespaceRoles,

    /// Classification configuration
    pub classifier: ClassifierConfig,

    /// Treemap report configuration
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Prefix of machine-generated intermediate method names
    pub method_prefix: String,

    /// Prefix of machine-generated intermediate field names
    pub field_prefix: String,

    /// Marker contained in machine-generated class names
    pub class_marker: String,

    /// Share one seen-name set between methods and fields
    pub shared_dedup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Where the treemap is written
    pub output: PathBuf,

    /// Custom HTML template with `{{LABEL}}` and `{{DATA}}` placeholders
    pub template: Option<PathBuf>,

    /// Count shown by the treemap
    pub statistic: Statistic,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_package: "net/minecraft".to_string(),
            legacy_packages: vec!["net/minecraft/realms".to_string()],
            namespaces: NamespaceRoles::default(),
            classifier: ClassifierConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            method_prefix: "method_".to_string(),
            field_prefix: "field_".to_string(),
            class_marker: "class_".to_string(),
            shared_dedup: true,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("treemap.html"),
            template: None,
            statistic: Statistic::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(dir: &Path) -> Result<Self> {
        let default_names = [
            ".mappingstats.yml",
            ".mappingstats.yaml",
            ".mappingstats.toml",
            "mappingstats.yml",
            "mappingstats.yaml",
            "mappingstats.toml",
        ];

        for name in &default_names {
            let path = dir.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Root package as a prefix path: leading and trailing `/`, e.g. `/net/minecraft/`
    pub fn root_path(&self) -> String {
        let package = self.root_package.replace('.', "/");
        let package = package.trim_matches('/');
        if package.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", package)
        }
    }

    pub fn classifier_rules(&self) -> ClassifierRules {
        ClassifierRules {
            root_path: self.root_path(),
            legacy_packages: self
                .legacy_packages
                .iter()
                .map(|p| p.replace('.', "/"))
                .collect(),
            method_prefix: self.classifier.method_prefix.clone(),
            field_prefix: self.classifier.field_prefix.clone(),
            class_marker: self.classifier.class_marker.clone(),
            shared_dedup: self.classifier.shared_dedup,
        }
    }
}
