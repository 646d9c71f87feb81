use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{Read, Seek, Write};

use binrw::{BinRead, BinResult, BinWrite, Endian};

use super::types::*;
use crate::error::{RemapError, Result};

/// Highest slot count a class file can declare (`constant_pool_count` is u16).
pub const MAX_POOL_SLOTS: usize = u16::MAX as usize;

/// The constant pool of one class, indexed exactly like the class file.
///
/// Slot 0 and the upper half of every Long/Double hold
/// [`ConstantInfo::Unusable`]. A side table maps every entry value to the
/// indices holding it, lowest first, so interning never creates a duplicate.
#[derive(Clone, Debug)]
pub struct ConstantPool {
    entries: Vec<ConstantInfo>,
    lookup: HashMap<ConstantInfo, Vec<u16>>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        ConstantPool {
            entries: vec![ConstantInfo::Unusable],
            lookup: HashMap::new(),
        }
    }
}

impl PartialEq for ConstantPool {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of the `constant_pool_count` field: number of slots plus one.
    pub fn slot_count(&self) -> u16 {
        self.entries.len() as u16
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() == 1
    }

    /// Iterates over usable entries with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &ConstantInfo)> {
        self.entries
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, entry)| !matches!(entry, ConstantInfo::Unusable))
            .map(|(index, entry)| (index as u16, entry))
    }

    pub fn resolve(&self, index: u16) -> Result<&ConstantInfo> {
        match self.entries.get(index as usize) {
            Some(ConstantInfo::Unusable) | None => Err(RemapError::invalid_index(index)),
            Some(entry) => Ok(entry),
        }
    }

    /// Lowest index currently holding a value equal to `entry`.
    pub fn index_of(&self, entry: &ConstantInfo) -> Option<u16> {
        self.lookup.get(entry).and_then(|indices| indices.first().copied())
    }

    /// Returns the index of an equal entry, appending one if none exists.
    pub fn intern(&mut self, entry: ConstantInfo) -> Result<u16> {
        if let Some(index) = self.index_of(&entry) {
            return Ok(index);
        }
        let slots = entry.slots();
        if self.entries.len() + slots > MAX_POOL_SLOTS {
            return Err(RemapError::ConstantPoolOverflow {
                slots: self.entries.len(),
            });
        }
        Ok(self.push(entry))
    }

    pub fn intern_utf8(&mut self, value: &str) -> Result<u16> {
        self.intern(ConstantInfo::utf8(value))
    }

    pub fn intern_class(&mut self, name: &str) -> Result<u16> {
        let name_index = self.intern_utf8(name)?;
        self.intern(ConstantInfo::Class(ClassConstant { name_index }))
    }

    pub fn intern_name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16> {
        let name_index = self.intern_utf8(name)?;
        let descriptor_index = self.intern_utf8(descriptor)?;
        self.intern(ConstantInfo::NameAndType(NameAndTypeConstant {
            name_index,
            descriptor_index,
        }))
    }

    /// Overwrites the entry at `index` in place. The replacement must occupy
    /// the same number of slots.
    pub fn replace(&mut self, index: u16, entry: ConstantInfo) -> Result<()> {
        let old = self.resolve(index)?;
        if old.slots() != entry.slots() {
            return Err(RemapError::malformed(
                None,
                format!(
                    "cannot replace {} at #{index} with {}",
                    old.kind_name(),
                    entry.kind_name()
                ),
            ));
        }
        self.forget(index);
        self.remember(entry.clone(), index);
        self.entries[index as usize] = entry;
        Ok(())
    }

    /// Hides the entry at `index` from interning without touching its
    /// content.
    pub fn forget(&mut self, index: u16) {
        let Some(entry) = self.entries.get(index as usize) else {
            return;
        };
        if let Some(indices) = self.lookup.get_mut(entry) {
            indices.retain(|&i| i != index);
            if indices.is_empty() {
                self.lookup.remove(entry);
            }
        }
    }

    fn remember(&mut self, entry: ConstantInfo, index: u16) {
        let indices = self.lookup.entry(entry).or_default();
        if let Err(pos) = indices.binary_search(&index) {
            indices.insert(pos, index);
        }
    }

    fn push(&mut self, entry: ConstantInfo) -> u16 {
        let index = self.entries.len() as u16;
        let slots = entry.slots();
        self.remember(entry.clone(), index);
        self.entries.push(entry);
        if slots == 2 {
            self.entries.push(ConstantInfo::Unusable);
        }
        index
    }

    // ---------------------------------------------------------------------------
    // Typed accessors
    // ---------------------------------------------------------------------------

    pub fn utf8(&self, index: u16) -> Result<Cow<'_, str>> {
        match self.resolve(index)? {
            ConstantInfo::Utf8(utf8) => utf8.as_str().ok_or_else(|| {
                RemapError::malformed(None, format!("constant #{index} is not valid modified UTF-8"))
            }),
            _ => Err(RemapError::invalid_index(index)),
        }
    }

    /// The raw `Utf8` entry at `index`, without decoding it. `String`
    /// constants may carry lone surrogates that only the JVM can decode.
    pub fn utf8_entry(&self, index: u16) -> Result<&Utf8Constant> {
        match self.resolve(index)? {
            ConstantInfo::Utf8(utf8) => Ok(utf8),
            _ => Err(RemapError::invalid_index(index)),
        }
    }

    pub fn class_name(&self, index: u16) -> Result<Cow<'_, str>> {
        match self.resolve(index)? {
            ConstantInfo::Class(class) => self.utf8(class.name_index),
            _ => Err(RemapError::invalid_index(index)),
        }
    }

    /// Name and descriptor of a `NameAndType` entry.
    pub fn name_and_type(&self, index: u16) -> Result<(Cow<'_, str>, Cow<'_, str>)> {
        match self.resolve(index)? {
            ConstantInfo::NameAndType(nat) => {
                Ok((self.utf8(nat.name_index)?, self.utf8(nat.descriptor_index)?))
            }
            _ => Err(RemapError::invalid_index(index)),
        }
    }

    /// `(class_index, name_and_type_index)` of a field, method or interface
    /// method reference.
    pub fn member_ref(&self, index: u16) -> Result<(u16, u16)> {
        match self.resolve(index)? {
            ConstantInfo::FieldRef(r) => Ok((r.class_index, r.name_and_type_index)),
            ConstantInfo::MethodRef(r) => Ok((r.class_index, r.name_and_type_index)),
            ConstantInfo::InterfaceMethodRef(r) => Ok((r.class_index, r.name_and_type_index)),
            _ => Err(RemapError::invalid_index(index)),
        }
    }

    /// Checks that every entry points at entries of the expected kind. Only
    /// `Utf8` entries used as names or descriptors are decoded.
    pub fn validate(&self) -> Result<()> {
        for (index, entry) in self.iter() {
            let checked = match entry {
                ConstantInfo::Class(c) => self.utf8(c.name_index).map(|_| ()),
                ConstantInfo::String(s) => self.utf8_entry(s.string_index).map(|_| ()),
                ConstantInfo::MethodType(m) => self.utf8(m.descriptor_index).map(|_| ()),
                ConstantInfo::Module(m) => self.utf8(m.name_index).map(|_| ()),
                ConstantInfo::Package(p) => self.utf8(p.name_index).map(|_| ()),
                ConstantInfo::NameAndType(_) => self.name_and_type(index).map(|_| ()),
                ConstantInfo::FieldRef(FieldRefConstant {
                    class_index,
                    name_and_type_index,
                })
                | ConstantInfo::MethodRef(MethodRefConstant {
                    class_index,
                    name_and_type_index,
                })
                | ConstantInfo::InterfaceMethodRef(InterfaceMethodRefConstant {
                    class_index,
                    name_and_type_index,
                }) => self
                    .class_name(*class_index)
                    .and_then(|_| self.name_and_type(*name_and_type_index))
                    .map(|_| ()),
                ConstantInfo::MethodHandle(h) => self.member_ref(h.reference_index).map(|_| ()),
                ConstantInfo::Dynamic(d) => self.name_and_type(d.name_and_type_index).map(|_| ()),
                ConstantInfo::InvokeDynamic(d) => {
                    self.name_and_type(d.name_and_type_index).map(|_| ())
                }
                _ => Ok(()),
            };
            checked.map_err(|e| e.at(crate::error::Location::Pool(index)))?;
        }
        Ok(())
    }
}

impl BinRead for ConstantPool {
    /// The `constant_pool_count` field read just before the entries.
    type Args<'a> = (u16,);

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        (count,): Self::Args<'_>,
    ) -> BinResult<Self> {
        if count == 0 {
            return Err(binrw::Error::AssertFail {
                pos: reader.stream_position()?,
                message: "constant pool count must be at least 1".to_string(),
            });
        }
        let mut pool = ConstantPool::new();
        while pool.entries.len() < count as usize {
            let pos = reader.stream_position()?;
            let entry = ConstantInfo::read_options(reader, endian, ())?;
            if pool.entries.len() + entry.slots() > count as usize {
                return Err(binrw::Error::AssertFail {
                    pos,
                    message: format!(
                        "{} constant at #{} overflows the declared pool count {count}",
                        entry.kind_name(),
                        pool.entries.len()
                    ),
                });
            }
            pool.push(entry);
        }
        Ok(pool)
    }
}

impl BinWrite for ConstantPool {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<()> {
        for entry in &self.entries[1..] {
            entry.write_options(writer, endian, ())?;
        }
        Ok(())
    }
}
