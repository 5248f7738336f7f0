// Artifact flag index
//
// Reads every class file in a JAR and records which members are compiler
// generated:
// - synthetic methods and fields (ACC_SYNTHETIC)
// - the accessed -> bridge method relation

mod bridge;
mod bytecode;
pub mod classfile;
mod inheritance;

pub use classfile::{parse_class, ClassParseError, ParsedClass};
pub use inheritance::InheritanceIndex;

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use zip::result::ZipError;
use zip::ZipArchive;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("IO error while reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("ZIP error while reading {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: ZipError,
    },
    #[error("Class parse error in {entry}: {source}")]
    ClassFile {
        entry: String,
        #[source]
        source: ClassParseError,
    },
}

/// Identity of a class member in the artifact's own (obfuscated) names.
///
/// Methods carry their descriptor; fields are identified by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberKey {
    pub owner: String,
    pub name: String,
    pub descriptor: Option<String>,
}

impl MemberKey {
    pub fn method(owner: &str, name: &str, descriptor: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: Some(descriptor.to_string()),
        }
    }

    pub fn field(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: None,
        }
    }
}

impl std::fmt::Display for MemberKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}{}",
            self.owner,
            self.name,
            self.descriptor.as_deref().unwrap_or("")
        )
    }
}

/// Exclusion flags for one member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EligibilityFlags {
    pub is_synthetic: bool,
    /// The member is the bridge (value side of the relation)
    pub is_bridge: bool,
    /// The member is forwarded to by a bridge (key side of the relation)
    pub is_accessed_by_bridge: bool,
}

impl EligibilityFlags {
    pub fn is_excluded(&self) -> bool {
        self.is_synthetic || self.is_bridge || self.is_accessed_by_bridge
    }
}

/// Per-member flags of the artifact, read-only once built
#[derive(Debug, Clone, Default)]
pub struct ArtifactFlags {
    synthetic_methods: HashSet<MemberKey>,
    synthetic_fields: HashSet<MemberKey>,
    accessed_to_bridge: HashMap<MemberKey, MemberKey>,
    bridges: HashSet<MemberKey>,
}

impl ArtifactFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a JAR file
    pub fn from_jar(path: &Path) -> Result<Self, ArtifactError> {
        let classes = read_jar(path)?;
        Ok(Self::from_classes(&classes))
    }

    /// Index already parsed classes
    pub fn from_classes(classes: &[ParsedClass]) -> Self {
        let mut flags = Self::new();

        for class in classes {
            for method in class.methods.iter().filter(|m| m.access.is_synthetic()) {
                flags.add_synthetic_method(MemberKey::method(
                    &class.name,
                    &method.name,
                    &method.descriptor,
                ));
            }
            for field in class.fields.iter().filter(|f| f.access.is_synthetic()) {
                flags.add_synthetic_field(MemberKey::field(&class.name, &field.name));
            }
        }

        let inheritance = InheritanceIndex::from_classes(classes);
        for (accessed, bridge) in bridge::find_bridges(classes, &inheritance) {
            flags.add_bridge(accessed, bridge);
        }

        info!(
            "Artifact flags: {} ({} types in the hierarchy)",
            flags.stats(),
            inheritance.class_count()
        );
        flags
    }

    pub fn add_synthetic_method(&mut self, key: MemberKey) {
        self.synthetic_methods.insert(key);
    }

    pub fn add_synthetic_field(&mut self, key: MemberKey) {
        self.synthetic_fields.insert(key);
    }

    pub fn add_bridge(&mut self, accessed: MemberKey, bridge: MemberKey) {
        if let Some(previous) = self.accessed_to_bridge.insert(accessed, bridge.clone()) {
            // Keep the bridge set equal to the relation's values
            if !self.accessed_to_bridge.values().any(|b| *b == previous) {
                self.bridges.remove(&previous);
            }
        }
        self.bridges.insert(bridge);
    }

    pub fn accessed_to_bridge(&self) -> &HashMap<MemberKey, MemberKey> {
        &self.accessed_to_bridge
    }

    pub fn method_flags(&self, key: &MemberKey) -> EligibilityFlags {
        EligibilityFlags {
            is_synthetic: self.synthetic_methods.contains(key),
            is_bridge: self.bridges.contains(key),
            is_accessed_by_bridge: self.accessed_to_bridge.contains_key(key),
        }
    }

    pub fn field_flags(&self, key: &MemberKey) -> EligibilityFlags {
        EligibilityFlags {
            is_synthetic: self.synthetic_fields.contains(key),
            ..EligibilityFlags::default()
        }
    }

    pub fn stats(&self) -> FlagStats {
        FlagStats {
            synthetic_methods: self.synthetic_methods.len(),
            synthetic_fields: self.synthetic_fields.len(),
            bridges: self.accessed_to_bridge.len(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FlagStats {
    pub synthetic_methods: usize,
    pub synthetic_fields: usize,
    pub bridges: usize,
}

impl std::fmt::Display for FlagStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} synthetic methods, {} synthetic fields, {} bridge pairs",
            self.synthetic_methods, self.synthetic_fields, self.bridges
        )
    }
}

/// Parse every `.class` entry of a JAR
pub fn read_jar(path: &Path) -> Result<Vec<ParsedClass>, ArtifactError> {
    let file = File::open(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|source| ArtifactError::Zip {
        path: path.to_path_buf(),
        source,
    })?;

    let mut classes = Vec::new();
    let mut buffer = Vec::new();

    for idx in 0..archive.len() {
        let mut entry = archive.by_index(idx).map_err(|source| ArtifactError::Zip {
            path: path.to_path_buf(),
            source,
        })?;

        if !entry.is_file() || !entry.name().ends_with(".class") {
            continue;
        }

        let name = entry.name().to_string();
        buffer.clear();
        entry
            .read_to_end(&mut buffer)
            .map_err(|source| ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let class = parse_class(&buffer)
            .map_err(|source| ArtifactError::ClassFile { entry: name, source })?;
        classes.push(class);
    }

    debug!("Read {} classes from {}", classes.len(), path.display());
    Ok(classes)
}
