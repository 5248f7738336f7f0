// JVM class file reader
//
// Reads just enough of a class file to index a JAR: the class name, its
// parents, every field and method with access flags and descriptor, and the
// methods each method body invokes.

use super::bytecode;
use thiserror::Error;

pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_BRIDGE: u16 = 0x0040;
pub const ACC_SYNTHETIC: u16 = 0x1000;

#[derive(Debug, Error)]
pub enum ClassParseError {
    #[error("unexpected end of class file")]
    UnexpectedEof,
    #[error("invalid class file magic header")]
    InvalidMagic,
    #[error("unsupported constant pool tag {tag}")]
    UnsupportedConstant { tag: u8 },
    #[error("invalid constant pool index {index}")]
    InvalidConstantIndex { index: u16 },
    #[error("malformed modified UTF-8 string in constant pool")]
    Utf8Decode,
    #[error("malformed descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("unknown opcode 0x{opcode:02x} at offset {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },
}

/// Access flags of a class member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessFlags(pub u16);

impl AccessFlags {
    pub fn is_synthetic(self) -> bool {
        self.0 & ACC_SYNTHETIC != 0
    }

    pub fn is_bridge(self) -> bool {
        self.0 & ACC_BRIDGE != 0
    }

    pub fn is_private(self) -> bool {
        self.0 & ACC_PRIVATE != 0
    }

    pub fn is_final(self) -> bool {
        self.0 & ACC_FINAL != 0
    }

    pub fn is_static(self) -> bool {
        self.0 & ACC_STATIC != 0
    }
}

/// A method referenced from bytecode (`Methodref` / `InterfaceMethodref`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub access: AccessFlags,
    pub name: String,
    pub descriptor: String,
}

#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub access: AccessFlags,
    pub name: String,
    pub descriptor: String,
    /// Methods invoked by the body, in bytecode order (empty for abstract/native)
    pub invoked: Vec<MethodRef>,
}

#[derive(Debug, Clone)]
pub struct ParsedClass {
    /// Internal name, e.g. `net/minecraft/a`
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
}

impl ParsedClass {
    /// Superclass followed by interfaces
    pub fn parents(&self) -> impl Iterator<Item = &str> {
        self.super_name
            .iter()
            .map(String::as_str)
            .chain(self.interfaces.iter().map(String::as_str))
    }
}

pub fn parse_class(bytes: &[u8]) -> Result<ParsedClass, ClassParseError> {
    let mut reader = ClassReader::new(bytes);
    reader.expect_magic()?;
    let _minor_version = reader.read_u2()?;
    let _major_version = reader.read_u2()?;
    let constant_pool = ConstantPool::parse(&mut reader)?;

    let _access_flags = reader.read_u2()?;
    let this_class = reader.read_u2()?;
    let super_class = reader.read_u2()?;

    let interfaces_count = reader.read_u2()?;
    let mut interfaces = Vec::with_capacity(interfaces_count as usize);
    for _ in 0..interfaces_count {
        let index = reader.read_u2()?;
        interfaces.push(constant_pool.class_name(index)?);
    }

    let fields_count = reader.read_u2()?;
    let mut fields = Vec::with_capacity(fields_count as usize);
    for _ in 0..fields_count {
        let access = AccessFlags(reader.read_u2()?);
        let name_index = reader.read_u2()?;
        let descriptor_index = reader.read_u2()?;
        let attributes_count = reader.read_u2()?;
        skip_attributes(&mut reader, attributes_count)?;

        fields.push(FieldInfo {
            access,
            name: constant_pool.utf8(name_index)?.to_string(),
            descriptor: constant_pool.utf8(descriptor_index)?.to_string(),
        });
    }

    let methods_count = reader.read_u2()?;
    let mut methods = Vec::with_capacity(methods_count as usize);
    for _ in 0..methods_count {
        let access = AccessFlags(reader.read_u2()?);
        let name_index = reader.read_u2()?;
        let descriptor_index = reader.read_u2()?;
        let attributes_count = reader.read_u2()?;

        let mut invoked = Vec::new();
        for _ in 0..attributes_count {
            let attribute_name_index = reader.read_u2()?;
            let attribute_length = reader.read_u4()? as usize;
            let body = reader.read_slice(attribute_length)?;
            if constant_pool.utf8(attribute_name_index)? == "Code" {
                invoked = read_code_invocations(body, &constant_pool)?;
            }
        }

        methods.push(MethodInfo {
            access,
            name: constant_pool.utf8(name_index)?.to_string(),
            descriptor: constant_pool.utf8(descriptor_index)?.to_string(),
            invoked,
        });
    }

    // Class attributes carry nothing we index
    let attributes_count = reader.read_u2()?;
    skip_attributes(&mut reader, attributes_count)?;

    let super_name = if super_class == 0 {
        None
    } else {
        Some(constant_pool.class_name(super_class)?)
    };

    Ok(ParsedClass {
        name: constant_pool.class_name(this_class)?,
        super_name,
        interfaces,
        fields,
        methods,
    })
}

fn read_code_invocations(
    body: &[u8],
    constant_pool: &ConstantPool,
) -> Result<Vec<MethodRef>, ClassParseError> {
    let mut reader = ClassReader::new(body);
    let _max_stack = reader.read_u2()?;
    let _max_locals = reader.read_u2()?;
    let code_length = reader.read_u4()? as usize;
    let code = reader.read_slice(code_length)?;

    bytecode::invoked_method_indices(code)?
        .into_iter()
        .map(|index| constant_pool.method_ref(index))
        .collect()
}

/// Argument and return type descriptors of a method descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub arguments: Vec<String>,
    pub return_type: String,
}

impl MethodDescriptor {
    pub fn parse(descriptor: &str) -> Result<Self, ClassParseError> {
        let invalid = || ClassParseError::InvalidDescriptor(descriptor.to_string());
        let rest = descriptor.strip_prefix('(').ok_or_else(invalid)?;
        let (params, return_type) = rest.split_once(')').ok_or_else(invalid)?;

        let mut arguments = Vec::new();
        let mut remaining = params;
        while !remaining.is_empty() {
            let len = type_descriptor_len(remaining).ok_or_else(invalid)?;
            arguments.push(remaining[..len].to_string());
            remaining = &remaining[len..];
        }

        if return_type != "V" && type_descriptor_len(return_type) != Some(return_type.len()) {
            return Err(invalid());
        }

        Ok(Self {
            arguments,
            return_type: return_type.to_string(),
        })
    }
}

/// Class named by an object type descriptor (`Lfoo/Bar;` -> `foo/Bar`)
pub fn object_type_name(descriptor: &str) -> Option<&str> {
    descriptor.strip_prefix('L')?.strip_suffix(';')
}

/// Length of the first type descriptor in `s`
fn type_descriptor_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut pos = 0;
    while bytes.get(pos) == Some(&b'[') {
        pos += 1;
    }
    match bytes.get(pos)? {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => Some(pos + 1),
        b'L' => s[pos..].find(';').map(|end| pos + end + 1),
        _ => None,
    }
}

#[derive(Debug, Clone)]
enum Constant {
    Utf8(String),
    Class { name_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    Other,
    Unusable,
}

struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    fn parse(reader: &mut ClassReader<'_>) -> Result<Self, ClassParseError> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable); // index 0 unused

        let mut index = 1;
        while index < count {
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let length = reader.read_u2()? as usize;
                    let bytes = reader.read_slice(length)?;
                    Constant::Utf8(decode_modified_utf8(bytes)?)
                }
                3 | 4 => {
                    reader.skip(4)?;
                    Constant::Other
                }
                5 | 6 => {
                    // Long and double take two slots
                    reader.skip(8)?;
                    entries.push(Constant::Unusable);
                    index += 1;
                    Constant::Other
                }
                7 => Constant::Class {
                    name_index: reader.read_u2()?,
                },
                8 | 16 | 19 | 20 => {
                    reader.read_u2()?;
                    Constant::Other
                }
                9 => {
                    reader.skip(4)?;
                    Constant::Other
                }
                10 | 11 => Constant::MethodRef {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                12 => Constant::NameAndType {
                    name_index: reader.read_u2()?,
                    descriptor_index: reader.read_u2()?,
                },
                15 => {
                    reader.skip(3)?;
                    Constant::Other
                }
                17 | 18 => {
                    reader.skip(4)?;
                    Constant::Other
                }
                other => return Err(ClassParseError::UnsupportedConstant { tag: other }),
            };

            entries.push(entry);
            index += 1;
        }

        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<&Constant, ClassParseError> {
        self.entries
            .get(index as usize)
            .ok_or(ClassParseError::InvalidConstantIndex { index })
    }

    fn utf8(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value.as_str()),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    fn class_name(&self, index: u16) -> Result<String, ClassParseError> {
        match self.get(index)? {
            Constant::Class { name_index } => Ok(self.utf8(*name_index)?.to_string()),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    fn method_ref(&self, index: u16) -> Result<MethodRef, ClassParseError> {
        let (class_index, name_and_type_index) = match self.get(index)? {
            Constant::MethodRef {
                class_index,
                name_and_type_index,
            } => (*class_index, *name_and_type_index),
            _ => return Err(ClassParseError::InvalidConstantIndex { index }),
        };

        match self.get(name_and_type_index)? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => Ok(MethodRef {
                owner: self.class_name(class_index)?,
                name: self.utf8(*name_index)?.to_string(),
                descriptor: self.utf8(*descriptor_index)?.to_string(),
            }),
            _ => Err(ClassParseError::InvalidConstantIndex {
                index: name_and_type_index,
            }),
        }
    }
}

/// Decode a `CONSTANT_Utf8` payload.
///
/// Class files use modified UTF-8: `\0` is written as `C0 80` and characters
/// outside the BMP as two 3-byte surrogates. Unpaired surrogates, which are
/// legal in string constants, become U+FFFD.
fn decode_modified_utf8(bytes: &[u8]) -> Result<String, ClassParseError> {
    if bytes.iter().all(|&b| (0x01..0x80).contains(&b)) {
        return Ok(bytes.iter().map(|&b| b as char).collect());
    }

    let continuation = |pos: usize| {
        bytes
            .get(pos)
            .filter(|&&b| b & 0xC0 == 0x80)
            .map(|&b| u16::from(b & 0x3F))
            .ok_or(ClassParseError::Utf8Decode)
    };

    let mut units = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while pos < bytes.len() {
        let lead = bytes[pos];
        let (unit, len) = match lead {
            0x01..=0x7F => (u16::from(lead), 1),
            0xC0..=0xDF => ((u16::from(lead & 0x1F) << 6) | continuation(pos + 1)?, 2),
            0xE0..=0xEF => (
                (u16::from(lead & 0x0F) << 12)
                    | (continuation(pos + 1)? << 6)
                    | continuation(pos + 2)?,
                3,
            ),
            _ => return Err(ClassParseError::Utf8Decode),
        };
        units.push(unit);
        pos += len;
    }

    Ok(char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect())
}

pub(super) struct ClassReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ClassReader<'a> {
    pub(super) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn expect_magic(&mut self) -> Result<(), ClassParseError> {
        const MAGIC: u32 = 0xCAFEBABE;
        if self.read_u4()? != MAGIC {
            return Err(ClassParseError::InvalidMagic);
        }
        Ok(())
    }

    pub(super) fn position(&self) -> usize {
        self.pos
    }

    pub(super) fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub(super) fn read_u1(&mut self) -> Result<u8, ClassParseError> {
        let value = *self.data.get(self.pos).ok_or(ClassParseError::UnexpectedEof)?;
        self.pos += 1;
        Ok(value)
    }

    pub(super) fn read_u2(&mut self) -> Result<u16, ClassParseError> {
        let bytes = self.read_slice(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub(super) fn read_u4(&mut self) -> Result<u32, ClassParseError> {
        let bytes = self.read_slice(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(super) fn read_i4(&mut self) -> Result<i32, ClassParseError> {
        Ok(self.read_u4()? as i32)
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], ClassParseError> {
        if self.pos + len > self.data.len() {
            return Err(ClassParseError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub(super) fn skip(&mut self, len: usize) -> Result<(), ClassParseError> {
        self.read_slice(len).map(|_| ())
    }
}

fn skip_attributes(reader: &mut ClassReader<'_>, count: u16) -> Result<(), ClassParseError> {
    for _ in 0..count {
        reader.read_u2()?; // attribute_name_index
        let length = reader.read_u4()? as usize;
        reader.skip(length)?;
    }
    Ok(())
}
