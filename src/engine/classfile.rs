//! Minimal JVM class-file reader.
//!
//! Only the parts the metrics need are decoded: the constant pool, access
//! flags, this/super/interface names, and field and method signatures.
//! Attributes, including method bodies, are skipped.

use std::collections::BTreeSet;

use thiserror::Error;

/// `ACC_PUBLIC` access flag.
pub const ACC_PUBLIC: u16 = 0x0001;

const MAGIC: u32 = 0xCAFE_BABE;

/// Reasons a byte sequence is not a usable class file.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClassFileError {
    /// Wrong magic number
    #[error("not a class file (magic {0:#010x})")]
    BadMagic(u32),
    /// Data ended before the structure did
    #[error("class file truncated at offset {0}")]
    Truncated(usize),
    /// A constant pool index pointed at the wrong kind of entry
    #[error("invalid constant pool reference #{0}")]
    BadIndex(u16),
    /// Unknown constant pool tag
    #[error("unknown constant pool tag {tag} at entry #{index}")]
    UnknownTag {
        /// Tag byte
        tag: u8,
        /// Pool index
        index: u16,
    },
}

type ParseResult<T> = std::result::Result<T, ClassFileError>;

/// A field or method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    /// Access flags
    pub access_flags: u16,
    /// Simple name
    pub name: String,
    /// Type descriptor
    pub descriptor: String,
}

impl MemberInfo {
    /// Whether the member is public.
    pub fn is_public(&self) -> bool {
        self.access_flags & ACC_PUBLIC != 0
    }
}

/// The decoded parts of a class file. Class names use the internal
/// slash-separated form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    /// Access flags of the class
    pub access_flags: u16,
    /// Name of this class
    pub name: String,
    /// Name of the superclass; absent only for the root class
    pub super_name: Option<String>,
    /// Directly implemented interfaces
    pub interfaces: Vec<String>,
    /// Declared fields
    pub fields: Vec<MemberInfo>,
    /// Declared methods
    pub methods: Vec<MemberInfo>,
    /// Every class named in the constant pool or in member descriptors
    pub referenced_classes: BTreeSet<String>,
    /// Invoked methods as `owner.name(descriptor)`
    pub method_refs: BTreeSet<String>,
}

impl ClassFile {
    /// Decode a class file.
    pub fn parse(data: &[u8]) -> ParseResult<Self> {
        let mut cursor = Cursor::new(data);

        let magic = cursor.u32()?;
        if magic != MAGIC {
            return Err(ClassFileError::BadMagic(magic));
        }
        cursor.skip(4)?; // minor, major

        let pool = ConstantPool::read(&mut cursor)?;

        let access_flags = cursor.u16()?;
        let name = pool.class_name(cursor.u16()?)?.to_string();
        let super_index = cursor.u16()?;
        let super_name = if super_index == 0 {
            None
        } else {
            Some(pool.class_name(super_index)?.to_string())
        };

        let interface_count = cursor.u16()?;
        let mut interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            interfaces.push(pool.class_name(cursor.u16()?)?.to_string());
        }

        let fields = read_members(&mut cursor, &pool)?;
        let methods = read_members(&mut cursor, &pool)?;

        let mut referenced_classes = pool.referenced_classes()?;
        for member in fields.iter().chain(methods.iter()) {
            referenced_classes.extend(descriptor_classes(&member.descriptor));
        }
        let method_refs = pool.method_refs()?;

        Ok(Self {
            access_flags,
            name,
            super_name,
            interfaces,
            fields,
            methods,
            referenced_classes,
            method_refs,
        })
    }

    /// Name with dots in place of slashes.
    pub fn binary_name(&self) -> String {
        self.name.replace('/', ".")
    }
}

/// Class names appearing as object types in a field or method descriptor.
pub fn descriptor_classes(descriptor: &str) -> Vec<String> {
    let mut classes = Vec::new();
    let mut rest = descriptor;

    while let Some(start) = rest.find('L') {
        let after = &rest[start + 1..];
        match after.find(';') {
            Some(end) => {
                classes.push(after[..end].to_string());
                rest = &after[end + 1..];
            }
            None => break,
        }
    }

    classes
}

/// Element class of a class-constant name, which may be an array descriptor.
/// Primitive arrays have none.
fn element_class(name: &str) -> Option<&str> {
    if !name.starts_with('[') {
        return Some(name);
    }
    let element = name.trim_start_matches('[');
    element
        .strip_prefix('L')
        .and_then(|inner| inner.strip_suffix(';'))
}

fn read_members(cursor: &mut Cursor<'_>, pool: &ConstantPool) -> ParseResult<Vec<MemberInfo>> {
    let count = cursor.u16()?;
    let mut members = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let access_flags = cursor.u16()?;
        let name = pool.utf8(cursor.u16()?)?.to_string();
        let descriptor = pool.utf8(cursor.u16()?)?.to_string();
        skip_attributes(cursor)?;
        members.push(MemberInfo {
            access_flags,
            name,
            descriptor,
        });
    }

    Ok(members)
}

fn skip_attributes(cursor: &mut Cursor<'_>) -> ParseResult<()> {
    let count = cursor.u16()?;
    for _ in 0..count {
        cursor.skip(2)?;
        let length = cursor.u32()? as usize;
        cursor.skip(length)?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
enum Constant {
    Unusable,
    Utf8(String),
    Class(u16),
    NameAndType(u16, u16),
    MethodRef { class: u16, name_and_type: u16 },
    Other,
}

struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    fn read(cursor: &mut Cursor<'_>) -> ParseResult<Self> {
        let count = cursor.u16()?;
        let mut entries = vec![Constant::Unusable];
        let mut index: u16 = 1;

        while index < count {
            let tag = cursor.u8()?;
            let (constant, slots) = match tag {
                1 => {
                    let length = cursor.u16()? as usize;
                    let bytes = cursor.bytes(length)?;
                    (Constant::Utf8(String::from_utf8_lossy(bytes).into_owned()), 1)
                }
                3 | 4 => {
                    cursor.skip(4)?;
                    (Constant::Other, 1)
                }
                5 | 6 => {
                    cursor.skip(8)?;
                    (Constant::Other, 2)
                }
                7 => (Constant::Class(cursor.u16()?), 1),
                8 | 16 | 19 | 20 => {
                    cursor.skip(2)?;
                    (Constant::Other, 1)
                }
                9 | 17 | 18 => {
                    cursor.skip(4)?;
                    (Constant::Other, 1)
                }
                10 | 11 => {
                    let class = cursor.u16()?;
                    let name_and_type = cursor.u16()?;
                    (Constant::MethodRef { class, name_and_type }, 1)
                }
                12 => {
                    let name = cursor.u16()?;
                    let descriptor = cursor.u16()?;
                    (Constant::NameAndType(name, descriptor), 1)
                }
                15 => {
                    cursor.skip(3)?;
                    (Constant::Other, 1)
                }
                tag => return Err(ClassFileError::UnknownTag { tag, index }),
            };

            entries.push(constant);
            if slots == 2 {
                entries.push(Constant::Unusable);
            }
            index = index.saturating_add(slots);
        }

        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> ParseResult<&Constant> {
        self.entries
            .get(index as usize)
            .ok_or(ClassFileError::BadIndex(index))
    }

    fn utf8(&self, index: u16) -> ParseResult<&str> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value),
            _ => Err(ClassFileError::BadIndex(index)),
        }
    }

    fn class_name(&self, index: u16) -> ParseResult<&str> {
        match self.get(index)? {
            Constant::Class(name) => self.utf8(*name),
            _ => Err(ClassFileError::BadIndex(index)),
        }
    }

    fn referenced_classes(&self) -> ParseResult<BTreeSet<String>> {
        let mut classes = BTreeSet::new();
        for entry in &self.entries {
            if let Constant::Class(name) = entry {
                if let Some(class) = element_class(self.utf8(*name)?) {
                    classes.insert(class.to_string());
                }
            }
        }
        Ok(classes)
    }

    fn method_refs(&self) -> ParseResult<BTreeSet<String>> {
        let mut refs = BTreeSet::new();
        for entry in &self.entries {
            if let Constant::MethodRef {
                class,
                name_and_type,
            } = entry
            {
                let owner = self.class_name(*class)?;
                let (name, descriptor) = match self.get(*name_and_type)? {
                    Constant::NameAndType(name, descriptor) => {
                        (self.utf8(*name)?, self.utf8(*descriptor)?)
                    }
                    _ => return Err(ClassFileError::BadIndex(*name_and_type)),
                };
                refs.insert(format!("{owner}.{name}{descriptor}"));
            }
        }
        Ok(refs)
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn bytes(&mut self, len: usize) -> ParseResult<&'a [u8]> {
        let data = self.data;
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= data.len())
            .ok_or(ClassFileError::Truncated(self.pos))?;
        let slice = &data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> ParseResult<()> {
        self.bytes(len).map(|_| ())
    }

    fn u8(&mut self) -> ParseResult<u8> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> ParseResult<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> ParseResult<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}
