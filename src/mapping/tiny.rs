// Tiny mapping reader
//
// Tiny v1:
// ```
// v1	official	intermediary	named
// CLASS	a	net/minecraft/class_1	net/minecraft/util/Foo
// METHOD	a	(La;)V	b	method_1	doThing
// FIELD	a	I	c	field_1	count
// ```
//
// Tiny v2:
// ```
// tiny	2	0	official	intermediary	named
// c	a	net/minecraft/class_1	net/minecraft/util/Foo
// 	m	(La;)V	b	method_1	doThing
// 	f	I	c	field_1	count
// ```
//
// Member owners and descriptors are written in the first namespace; they are
// remapped into the other namespaces through the class table.

use super::{ClassTriple, EntryTriple, MappingError, Mappings, MemberTriple, NamespaceRoles};
use std::collections::HashMap;
use tracing::debug;

pub struct TinyReader<'a> {
    roles: &'a NamespaceRoles,
}

/// Entries as written in the file, names indexed by namespace column
#[derive(Debug, Default)]
struct RawMappings {
    namespaces: Vec<String>,
    classes: Vec<Vec<String>>,
    methods: Vec<RawMember>,
    fields: Vec<RawMember>,
}

#[derive(Debug)]
struct RawMember {
    owner: String,
    descriptor: String,
    names: Vec<String>,
}

impl<'a> TinyReader<'a> {
    pub fn new(roles: &'a NamespaceRoles) -> Self {
        Self { roles }
    }

    pub fn read(&self, content: &str) -> Result<Mappings, MappingError> {
        let header = content
            .lines()
            .next()
            .filter(|line| !line.trim().is_empty())
            .ok_or(MappingError::Empty)?;

        let raw = if header.starts_with("v1\t") {
            parse_v1(content)?
        } else if header.starts_with("tiny\t2\t") {
            parse_v2(content)?
        } else {
            return Err(MappingError::UnknownHeader(header.to_string()));
        };

        debug!(
            "Tiny namespaces {:?}: {} classes, {} methods, {} fields",
            raw.namespaces,
            raw.classes.len(),
            raw.methods.len(),
            raw.fields.len()
        );

        self.resolve(raw)
    }

    fn resolve(&self, raw: RawMappings) -> Result<Mappings, MappingError> {
        let column = |namespace: &str| {
            raw.namespaces
                .iter()
                .position(|ns| ns == namespace)
                .ok_or_else(|| MappingError::MissingNamespace(namespace.to_string()))
        };
        let original = column(&self.roles.original)?;
        let intermediate = column(&self.roles.intermediate)?;
        let human = column(&self.roles.human)?;

        let remappers = [original, intermediate, human].map(|col| ClassRemapper::new(&raw.classes, col));

        let classes = raw
            .classes
            .iter()
            .map(|names| ClassTriple {
                original: names[original].clone(),
                intermediate: names[intermediate].clone(),
                human: names[human].clone(),
            })
            .collect();

        let member = |raw: &RawMember| {
            let entry = |remapper: &ClassRemapper, col: usize| EntryTriple {
                owner: remapper.class(&raw.owner),
                name: raw.names[col].clone(),
                descriptor: remapper.descriptor(&raw.descriptor),
            };
            MemberTriple {
                original: entry(&remappers[0], original),
                intermediate: entry(&remappers[1], intermediate),
                human: entry(&remappers[2], human),
            }
        };

        Ok(Mappings {
            classes,
            methods: raw.methods.iter().map(&member).collect(),
            fields: raw.fields.iter().map(&member).collect(),
        })
    }
}

/// Maps first-namespace class names into one target namespace
struct ClassRemapper {
    names: HashMap<String, String>,
}

impl ClassRemapper {
    fn new(classes: &[Vec<String>], column: usize) -> Self {
        let names = classes
            .iter()
            .filter(|names| column != 0 && names[0] != names[column])
            .map(|names| (names[0].clone(), names[column].clone()))
            .collect();
        Self { names }
    }

    fn class(&self, name: &str) -> String {
        self.names
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    fn descriptor(&self, descriptor: &str) -> String {
        let mut out = String::with_capacity(descriptor.len());
        let mut rest = descriptor;
        while let Some(start) = rest.find('L') {
            out.push_str(&rest[..=start]);
            let after = &rest[start + 1..];
            match after.find(';') {
                Some(end) => {
                    out.push_str(&self.class(&after[..end]));
                    out.push(';');
                    rest = &after[end + 1..];
                }
                None => {
                    rest = after;
                    break;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

fn malformed(line: usize, message: impl Into<String>) -> MappingError {
    MappingError::Malformed {
        line,
        message: message.into(),
    }
}

/// Take exactly `count` names from `columns`; empty names fall back to the
/// first namespace's name.
fn names(columns: &[&str], count: usize, line: usize) -> Result<Vec<String>, MappingError> {
    if columns.len() < count {
        return Err(malformed(
            line,
            format!("expected {} names, found {}", count, columns.len()),
        ));
    }
    let first = columns.first().copied().unwrap_or_default();
    Ok(columns[..count]
        .iter()
        .map(|name| if name.is_empty() { first } else { *name })
        .map(str::to_string)
        .collect())
}

fn parse_v1(content: &str) -> Result<RawMappings, MappingError> {
    let mut lines = content.lines().enumerate();
    let mut raw = RawMappings::default();

    if let Some((_, header)) = lines.next() {
        raw.namespaces = header.split('\t').skip(1).map(str::to_string).collect();
    }
    let count = raw.namespaces.len();

    for (idx, line) in lines {
        let line_no = idx + 1;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let columns: Vec<&str> = line.split('\t').collect();
        match columns[0] {
            "CLASS" => raw.classes.push(names(&columns[1..], count, line_no)?),
            kind @ ("METHOD" | "FIELD") => {
                if columns.len() < 3 {
                    return Err(malformed(line_no, format!("{} entry without owner and descriptor", kind)));
                }
                let member = RawMember {
                    owner: columns[1].to_string(),
                    descriptor: columns[2].to_string(),
                    names: names(&columns[3..], count, line_no)?,
                };
                if kind == "METHOD" {
                    raw.methods.push(member);
                } else {
                    raw.fields.push(member);
                }
            }
            other => return Err(malformed(line_no, format!("unknown entry kind '{}'", other))),
        }
    }

    Ok(raw)
}

fn parse_v2(content: &str) -> Result<RawMappings, MappingError> {
    let mut lines = content.lines().enumerate();
    let mut raw = RawMappings::default();

    if let Some((_, header)) = lines.next() {
        raw.namespaces = header.split('\t').skip(3).map(str::to_string).collect();
    }
    let count = raw.namespaces.len();

    let mut in_header = true;
    let mut escaped_names = false;
    let mut current_class: Option<String> = None;

    for (idx, line) in lines {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let depth = line.len() - line.trim_start_matches('\t').len();
        let columns: Vec<String> = line[depth..]
            .split('\t')
            .map(|column| {
                if escaped_names {
                    unescape(column)
                } else {
                    column.to_string()
                }
            })
            .collect();
        let columns: Vec<&str> = columns.iter().map(String::as_str).collect();

        if in_header && depth == 1 {
            if columns[0] == "escaped-names" {
                escaped_names = true;
            }
            continue;
        }
        in_header = false;

        match (depth, columns[0]) {
            (0, "c") => {
                let class = names(&columns[1..], count, line_no)?;
                current_class = Some(class[0].clone());
                raw.classes.push(class);
            }
            (1, kind @ ("m" | "f")) => {
                let owner = current_class
                    .clone()
                    .ok_or_else(|| malformed(line_no, "member outside of a class"))?;
                let descriptor = columns
                    .get(1)
                    .ok_or_else(|| malformed(line_no, "member without descriptor"))?;
                let member = RawMember {
                    owner,
                    descriptor: descriptor.to_string(),
                    names: names(&columns[2..], count, line_no)?,
                };
                if kind == "m" {
                    raw.methods.push(member);
                } else {
                    raw.fields.push(member);
                }
            }
            // Class comments
            (1, "c") => {}
            // Parameters, locals and comments
            (d, _) if d >= 2 => {}
            (_, other) => {
                return Err(malformed(line_no, format!("unknown entry kind '{}'", other)))
            }
        }
    }

    Ok(raw)
}

fn unescape(s: &str) -> String {
    if !s.contains('\\') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
