//! Rename classes, methods and fields inside compiled [Java Classfiles](https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html).
//!
//! The crate reads a class file into a `binrw` model, rewrites every symbolic
//! reference through a [`mapping::MappingTable`] and writes the result back:
//!
//! ```no_run
//! use classfile_remapper::mapping::MappingTable;
//! use classfile_remapper::remap::{remap_class, RemapContext};
//!
//! let bytes = std::fs::read("a.class").unwrap();
//! let mut mappings = MappingTable::new();
//! mappings.insert_class("a", "com/example/Main");
//! let ctx = RemapContext::builder(mappings).build(&[]);
//! let remapped = remap_class(&bytes, &ctx).unwrap();
//! assert_eq!(remapped.mapped_name, "com/example/Main");
//! ```

use std::io::Cursor;

use binrw::{BinRead, BinWrite};

#[macro_use]
extern crate bitflags;

pub mod attribute_info;
pub mod batch;
pub mod code_attribute;
pub mod constant_info;
pub mod descriptor;
pub mod error;
pub mod field_info;
pub mod mapping;
pub mod method_info;
pub mod remap;

#[cfg(feature = "jar-utils")]
pub mod jar_utils;

pub mod types;

pub use error::{Location, MappingWarning, RemapError, Result};
pub use types::*;

use constant_info::ConstantPool;

/// Decodes the structured form of nested attributes against the pool.
pub trait InterpretInner {
    fn interpret_inner(&mut self, const_pool: &ConstantPool) -> Result<()>;
}

/// Parses a complete class file, interpreting every recognised attribute.
///
/// ```rust
/// let result = classfile_remapper::read_class(b"this_will_be_parsed_as_classfile");
/// assert!(result.is_err());
/// ```
pub fn read_class(bytes: &[u8]) -> Result<ClassFile> {
    let mut cursor = Cursor::new(bytes);
    let mut class = ClassFile::read(&mut cursor)?;
    let consumed = cursor.position();
    if consumed != bytes.len() as u64 {
        return Err(RemapError::malformed(
            Some(consumed),
            format!("{} trailing bytes after the last attribute", bytes.len() as u64 - consumed),
        ));
    }
    let pool = std::mem::take(&mut class.const_pool);
    let interpreted = class.interpret_inner(&pool);
    class.const_pool = pool;
    interpreted?;
    Ok(class)
}

/// Serialises a class file. Opaque attributes are written verbatim; structured
/// ones are written from `info`, so call `sync_from_parsed` after editing them.
pub fn write_class(class: &ClassFile) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    class.write(&mut cursor)?;
    Ok(cursor.into_inner())
}
