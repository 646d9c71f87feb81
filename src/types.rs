use std::borrow::Cow;

use crate::InterpretInner;
use crate::attribute_info::{AttributeInfo, AttributeInfoVariant};
use crate::constant_info::ConstantPool;
use crate::error::{Location, Result};
use crate::field_info::FieldInfo;
use crate::method_info::MethodInfo;

use binrw::binrw;

/// Newest class file major version this crate accepts (Java 25).
pub const LATEST_MAJOR_VERSION: u16 = 69;
/// Oldest class file major version this crate accepts (JDK 1.1).
pub const OLDEST_MAJOR_VERSION: u16 = 45;

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big, magic = b"\xca\xfe\xba\xbe")]
pub struct ClassFile {
    pub minor_version: u16,
    #[br(assert(
        (OLDEST_MAJOR_VERSION..=LATEST_MAJOR_VERSION).contains(&major_version),
        "unsupported class file version {}",
        major_version
    ))]
    pub major_version: u16,
    #[br(temp)]
    #[bw(calc = const_pool.slot_count())]
    const_pool_size: u16,
    #[br(args(const_pool_size))]
    pub const_pool: ConstantPool,
    pub access_flags: ClassAccessFlags,
    pub this_class: u16,
    pub super_class: u16,
    #[br(temp)]
    #[bw(calc = interfaces.len() as u16)]
    interfaces_count: u16,
    #[br(count = interfaces_count)]
    pub interfaces: Vec<u16>,
    #[br(temp)]
    #[bw(calc = fields.len() as u16)]
    fields_count: u16,
    #[br(count = fields_count)]
    pub fields: Vec<FieldInfo>,
    #[br(temp)]
    #[bw(calc = methods.len() as u16)]
    methods_count: u16,
    #[br(count = methods_count)]
    pub methods: Vec<MethodInfo>,
    #[br(temp)]
    #[bw(calc = attributes.len() as u16)]
    attributes_count: u16,
    #[br(count = attributes_count)]
    pub attributes: Vec<AttributeInfo>,
}

impl ClassFile {
    /// Internal name of this class, e.g. `java/lang/String`.
    pub fn class_name(&self) -> Result<Cow<'_, str>> {
        self.const_pool
            .class_name(self.this_class)
            .map_err(|e| e.at(Location::ClassHeader))
    }

    /// Internal name of the superclass; `None` for `java/lang/Object` and
    /// `module-info`.
    pub fn super_name(&self) -> Result<Option<Cow<'_, str>>> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.const_pool
            .class_name(self.super_class)
            .map(Some)
            .map_err(|e| e.at(Location::ClassHeader))
    }

    pub fn interface_names(&self) -> Result<Vec<Cow<'_, str>>> {
        self.interfaces
            .iter()
            .map(|&index| {
                self.const_pool
                    .class_name(index)
                    .map_err(|e| e.at(Location::ClassHeader))
            })
            .collect()
    }

    /// First class-level attribute whose structured form matches `pick`.
    pub fn find_attribute<'a, T>(
        &'a self,
        pick: impl Fn(&'a AttributeInfoVariant) -> Option<&'a T>,
    ) -> Option<&'a T> {
        self.attributes
            .iter()
            .filter_map(|attr| attr.info_parsed.as_ref())
            .find_map(pick)
    }
}

impl InterpretInner for ClassFile {
    fn interpret_inner(&mut self, const_pool: &ConstantPool) -> Result<()> {
        for field in &mut self.fields {
            field.interpret_inner(const_pool)?;
        }
        for method in &mut self.methods {
            method.interpret_inner(const_pool)?;
        }
        for attr in &mut self.attributes {
            attr.interpret_inner(const_pool)?;
        }
        Ok(())
    }
}

#[binrw]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ClassAccessFlags(u16);

bitflags! {
    impl ClassAccessFlags: u16 {
        const PUBLIC = 0x0001;     //	Declared public; may be accessed from outside its package.
        const FINAL = 0x0010;      //	Declared final; no subclasses allowed.
        const SUPER = 0x0020;      //	Treat superclass methods specially when invoked by the invokespecial instruction.
        const INTERFACE = 0x0200;  //	Is an interface, not a class.
        const ABSTRACT = 0x0400;   //	Declared abstract; must not be instantiated.
        const SYNTHETIC = 0x1000;  //	Declared synthetic; not present in the source code.
        const ANNOTATION = 0x2000; //	Declared as an annotation type.
        const ENUM = 0x4000;       //	Declared as an enum type.
        const MODULE = 0x8000;     //	Declared as a module type.
    }
}
