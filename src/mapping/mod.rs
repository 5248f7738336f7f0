//! Name mappings
//!
//! A mapping associates every class, method and field of an obfuscated
//! artifact with names in several namespaces. Three of them matter here:
//! the original obfuscated names, the stable machine-generated intermediate
//! names, and the human-readable names.

mod tiny;

pub use tiny::TinyReader;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Failed to read mapping file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Mapping file is empty")]
    Empty,
    #[error("Unrecognized mapping header: {0}")]
    UnknownHeader(String),
    #[error("Namespace '{0}' is not present in the mapping file")]
    MissingNamespace(String),
    #[error("Line {line}: {message}")]
    Malformed { line: usize, message: String },
}

/// Which namespace of the mapping file plays which role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceRoles {
    /// Names found in the artifact
    pub original: String,
    /// Stable machine-generated names
    pub intermediate: String,
    /// Human-readable names
    pub human: String,
}

impl Default for NamespaceRoles {
    fn default() -> Self {
        Self {
            original: "official".to_string(),
            intermediate: "intermediary".to_string(),
            human: "named".to_string(),
        }
    }
}

/// A member's names in one namespace. Owner and descriptor are expressed in
/// that same namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryTriple {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

/// A method or field under the three namespace roles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberTriple {
    pub original: EntryTriple,
    pub intermediate: EntryTriple,
    pub human: EntryTriple,
}

/// A class under the three namespace roles (internal names, `/`-separated)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTriple {
    pub original: String,
    pub intermediate: String,
    pub human: String,
}

/// Parsed mapping, in file order
#[derive(Debug, Clone, Default)]
pub struct Mappings {
    pub classes: Vec<ClassTriple>,
    pub methods: Vec<MemberTriple>,
    pub fields: Vec<MemberTriple>,
}

impl Mappings {
    /// Read a Tiny v1 or v2 file
    pub fn from_file(path: &Path, roles: &NamespaceRoles) -> Result<Self, MappingError> {
        let content = std::fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        TinyReader::new(roles).read(&content)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.methods.is_empty() && self.fields.is_empty()
    }
}

impl std::fmt::Display for Mappings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} classes, {} methods, {} fields",
            self.classes.len(),
            self.methods.len(),
            self.fields.len()
        )
    }
}
