use std::borrow::Cow;
use std::io::{Read, Seek, Write};

use binrw::{binrw, BinRead, BinResult, BinWrite, Endian};

/// One entry of the constant pool.
///
/// `Unusable` fills index 0 and the second slot of every `Long`/`Double`;
/// it is never read from or written to the binary form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConstantInfo {
    Utf8(Utf8Constant),
    Integer(IntegerConstant),
    Float(FloatConstant),
    Long(LongConstant),
    Double(DoubleConstant),
    Class(ClassConstant),
    String(StringConstant),
    FieldRef(FieldRefConstant),
    MethodRef(MethodRefConstant),
    InterfaceMethodRef(InterfaceMethodRefConstant),
    NameAndType(NameAndTypeConstant),
    MethodHandle(MethodHandleConstant),
    MethodType(MethodTypeConstant),
    Dynamic(DynamicConstant),
    InvokeDynamic(InvokeDynamicConstant),
    Module(ModuleConstant),
    Package(PackageConstant),
    Unusable,
}

pub const TAG_UTF8: u8 = 1;
pub const TAG_INTEGER: u8 = 3;
pub const TAG_FLOAT: u8 = 4;
pub const TAG_LONG: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_CLASS: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_FIELD_REF: u8 = 9;
pub const TAG_METHOD_REF: u8 = 10;
pub const TAG_INTERFACE_METHOD_REF: u8 = 11;
pub const TAG_NAME_AND_TYPE: u8 = 12;
pub const TAG_METHOD_HANDLE: u8 = 15;
pub const TAG_METHOD_TYPE: u8 = 16;
pub const TAG_DYNAMIC: u8 = 17;
pub const TAG_INVOKE_DYNAMIC: u8 = 18;
pub const TAG_MODULE: u8 = 19;
pub const TAG_PACKAGE: u8 = 20;

impl ConstantInfo {
    /// Number of pool slots the entry occupies (Long and Double take two).
    pub fn slots(&self) -> usize {
        match self {
            ConstantInfo::Long(_) | ConstantInfo::Double(_) => 2,
            _ => 1,
        }
    }

    pub fn tag(&self) -> Option<u8> {
        Some(match self {
            ConstantInfo::Utf8(_) => TAG_UTF8,
            ConstantInfo::Integer(_) => TAG_INTEGER,
            ConstantInfo::Float(_) => TAG_FLOAT,
            ConstantInfo::Long(_) => TAG_LONG,
            ConstantInfo::Double(_) => TAG_DOUBLE,
            ConstantInfo::Class(_) => TAG_CLASS,
            ConstantInfo::String(_) => TAG_STRING,
            ConstantInfo::FieldRef(_) => TAG_FIELD_REF,
            ConstantInfo::MethodRef(_) => TAG_METHOD_REF,
            ConstantInfo::InterfaceMethodRef(_) => TAG_INTERFACE_METHOD_REF,
            ConstantInfo::NameAndType(_) => TAG_NAME_AND_TYPE,
            ConstantInfo::MethodHandle(_) => TAG_METHOD_HANDLE,
            ConstantInfo::MethodType(_) => TAG_METHOD_TYPE,
            ConstantInfo::Dynamic(_) => TAG_DYNAMIC,
            ConstantInfo::InvokeDynamic(_) => TAG_INVOKE_DYNAMIC,
            ConstantInfo::Module(_) => TAG_MODULE,
            ConstantInfo::Package(_) => TAG_PACKAGE,
            ConstantInfo::Unusable => return None,
        })
    }

    /// Human readable kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConstantInfo::Utf8(_) => "Utf8",
            ConstantInfo::Integer(_) => "Integer",
            ConstantInfo::Float(_) => "Float",
            ConstantInfo::Long(_) => "Long",
            ConstantInfo::Double(_) => "Double",
            ConstantInfo::Class(_) => "Class",
            ConstantInfo::String(_) => "String",
            ConstantInfo::FieldRef(_) => "Fieldref",
            ConstantInfo::MethodRef(_) => "Methodref",
            ConstantInfo::InterfaceMethodRef(_) => "InterfaceMethodref",
            ConstantInfo::NameAndType(_) => "NameAndType",
            ConstantInfo::MethodHandle(_) => "MethodHandle",
            ConstantInfo::MethodType(_) => "MethodType",
            ConstantInfo::Dynamic(_) => "Dynamic",
            ConstantInfo::InvokeDynamic(_) => "InvokeDynamic",
            ConstantInfo::Module(_) => "Module",
            ConstantInfo::Package(_) => "Package",
            ConstantInfo::Unusable => "Unusable",
        }
    }

    /// Shorthand for building a `Utf8` entry from a Rust string.
    pub fn utf8(value: &str) -> Self {
        ConstantInfo::Utf8(Utf8Constant::new(value))
    }
}

impl BinRead for ConstantInfo {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let pos = reader.stream_position()?;
        let tag = u8::read_options(reader, endian, ())?;
        let entry = match tag {
            TAG_UTF8 => ConstantInfo::Utf8(Utf8Constant::read_options(reader, endian, ())?),
            TAG_INTEGER => ConstantInfo::Integer(IntegerConstant::read_options(reader, endian, ())?),
            TAG_FLOAT => ConstantInfo::Float(FloatConstant::read_options(reader, endian, ())?),
            TAG_LONG => ConstantInfo::Long(LongConstant::read_options(reader, endian, ())?),
            TAG_DOUBLE => ConstantInfo::Double(DoubleConstant::read_options(reader, endian, ())?),
            TAG_CLASS => ConstantInfo::Class(ClassConstant::read_options(reader, endian, ())?),
            TAG_STRING => ConstantInfo::String(StringConstant::read_options(reader, endian, ())?),
            TAG_FIELD_REF => {
                ConstantInfo::FieldRef(FieldRefConstant::read_options(reader, endian, ())?)
            }
            TAG_METHOD_REF => {
                ConstantInfo::MethodRef(MethodRefConstant::read_options(reader, endian, ())?)
            }
            TAG_INTERFACE_METHOD_REF => ConstantInfo::InterfaceMethodRef(
                InterfaceMethodRefConstant::read_options(reader, endian, ())?,
            ),
            TAG_NAME_AND_TYPE => {
                ConstantInfo::NameAndType(NameAndTypeConstant::read_options(reader, endian, ())?)
            }
            TAG_METHOD_HANDLE => {
                ConstantInfo::MethodHandle(MethodHandleConstant::read_options(reader, endian, ())?)
            }
            TAG_METHOD_TYPE => {
                ConstantInfo::MethodType(MethodTypeConstant::read_options(reader, endian, ())?)
            }
            TAG_DYNAMIC => ConstantInfo::Dynamic(DynamicConstant::read_options(reader, endian, ())?),
            TAG_INVOKE_DYNAMIC => ConstantInfo::InvokeDynamic(
                InvokeDynamicConstant::read_options(reader, endian, ())?,
            ),
            TAG_MODULE => ConstantInfo::Module(ModuleConstant::read_options(reader, endian, ())?),
            TAG_PACKAGE => ConstantInfo::Package(PackageConstant::read_options(reader, endian, ())?),
            other => {
                return Err(binrw::Error::AssertFail {
                    pos,
                    message: format!("unknown constant pool tag {other}"),
                });
            }
        };
        Ok(entry)
    }
}

impl BinWrite for ConstantInfo {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<()> {
        let Some(tag) = self.tag() else {
            return Ok(());
        };
        tag.write_options(writer, endian, ())?;
        match self {
            ConstantInfo::Utf8(c) => c.write_options(writer, endian, ()),
            ConstantInfo::Integer(c) => c.write_options(writer, endian, ()),
            ConstantInfo::Float(c) => c.write_options(writer, endian, ()),
            ConstantInfo::Long(c) => c.write_options(writer, endian, ()),
            ConstantInfo::Double(c) => c.write_options(writer, endian, ()),
            ConstantInfo::Class(c) => c.write_options(writer, endian, ()),
            ConstantInfo::String(c) => c.write_options(writer, endian, ()),
            ConstantInfo::FieldRef(c) => c.write_options(writer, endian, ()),
            ConstantInfo::MethodRef(c) => c.write_options(writer, endian, ()),
            ConstantInfo::InterfaceMethodRef(c) => c.write_options(writer, endian, ()),
            ConstantInfo::NameAndType(c) => c.write_options(writer, endian, ()),
            ConstantInfo::MethodHandle(c) => c.write_options(writer, endian, ()),
            ConstantInfo::MethodType(c) => c.write_options(writer, endian, ()),
            ConstantInfo::Dynamic(c) => c.write_options(writer, endian, ()),
            ConstantInfo::InvokeDynamic(c) => c.write_options(writer, endian, ()),
            ConstantInfo::Module(c) => c.write_options(writer, endian, ()),
            ConstantInfo::Package(c) => c.write_options(writer, endian, ()),
            ConstantInfo::Unusable => Ok(()),
        }
    }
}

/// Raw "modified UTF-8" bytes as stored in the class file.
#[binrw]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[brw(big)]
pub struct Utf8Constant {
    #[br(temp)]
    #[bw(calc = bytes.len() as u16)]
    length: u16,
    #[br(count = length)]
    pub bytes: Vec<u8>,
}

impl Utf8Constant {
    pub fn new(value: &str) -> Self {
        Utf8Constant {
            bytes: cesu8::to_java_cesu8(value).into_owned(),
        }
    }

    /// Decodes the modified UTF-8 payload. `None` when the bytes are not
    /// valid modified UTF-8.
    pub fn as_str(&self) -> Option<Cow<'_, str>> {
        cesu8::from_java_cesu8(&self.bytes).ok()
    }
}

#[binrw]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[brw(big)]
pub struct IntegerConstant {
    pub value: i32,
}

/// Stored as raw IEEE-754 bits so NaN payloads survive a round trip and the
/// entry can be hashed for deduplication.
#[binrw]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[brw(big)]
pub struct FloatConstant {
    pub bits: u32,
}

impl FloatConstant {
    pub fn value(&self) -> f32 {
        f32::from_bits(self.bits)
    }
}

#[binrw]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[brw(big)]
pub struct LongConstant {
    pub value: i64,
}

#[binrw]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[brw(big)]
pub struct DoubleConstant {
    pub bits: u64,
}

impl DoubleConstant {
    pub fn value(&self) -> f64 {
        f64::from_bits(self.bits)
    }
}

#[binrw]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[brw(big)]
pub struct ClassConstant {
    pub name_index: u16,
}

#[binrw]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[brw(big)]
pub struct StringConstant {
    pub string_index: u16,
}

#[binrw]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[brw(big)]
pub struct FieldRefConstant {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[binrw]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[brw(big)]
pub struct MethodRefConstant {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[binrw]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[brw(big)]
pub struct InterfaceMethodRefConstant {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[binrw]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[brw(big)]
pub struct NameAndTypeConstant {
    pub name_index: u16,
    pub descriptor_index: u16,
}

#[binrw]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[brw(big)]
pub struct MethodHandleConstant {
    pub reference_kind: u8,
    pub reference_index: u16,
}

#[binrw]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[brw(big)]
pub struct MethodTypeConstant {
    pub descriptor_index: u16,
}

#[binrw]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[brw(big)]
pub struct DynamicConstant {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type_index: u16,
}

#[binrw]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[brw(big)]
pub struct InvokeDynamicConstant {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type_index: u16,
}

#[binrw]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[brw(big)]
pub struct ModuleConstant {
    pub name_index: u16,
}

#[binrw]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[brw(big)]
pub struct PackageConstant {
    pub name_index: u16,
}
