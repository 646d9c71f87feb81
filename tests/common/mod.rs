//! Assembles small class files for the integration tests.
#![allow(dead_code)]

use classfile_remapper::attribute_info::*;
use classfile_remapper::constant_info::*;
use classfile_remapper::field_info::{FieldAccessFlags, FieldInfo};
use classfile_remapper::method_info::{MethodAccessFlags, MethodInfo};
use classfile_remapper::{read_class, write_class, ClassAccessFlags, ClassFile};

pub const ICONST_1: u8 = 0x04;
pub const ALOAD_0: u8 = 0x2a;
pub const RETURN: u8 = 0xb1;
pub const GETFIELD: u8 = 0xb4;
pub const INVOKEVIRTUAL: u8 = 0xb6;
pub const INVOKESPECIAL: u8 = 0xb7;
pub const INVOKESTATIC: u8 = 0xb8;
pub const INVOKEDYNAMIC: u8 = 0xba;
pub const NEW: u8 = 0xbb;
pub const POP: u8 = 0x57;
pub const LDC: u8 = 0x12;

pub const REF_INVOKE_STATIC: u8 = 6;

pub struct ClassBuilder {
    pub pool: ConstantPool,
    access_flags: ClassAccessFlags,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<FieldInfo>,
    methods: Vec<MethodInfo>,
    attributes: Vec<AttributeInfo>,
    bootstrap_methods: Vec<BootstrapMethod>,
}

impl ClassBuilder {
    pub fn new(name: &str, super_name: Option<&str>) -> Self {
        let mut pool = ConstantPool::new();
        let this_class = pool.intern_class(name).unwrap();
        let super_class = super_name.map_or(0, |s| pool.intern_class(s).unwrap());
        ClassBuilder {
            pool,
            access_flags: ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            this_class,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            bootstrap_methods: Vec::new(),
        }
    }

    /// `java/lang/Object` subclass.
    pub fn object(name: &str) -> Self {
        Self::new(name, Some("java/lang/Object"))
    }

    pub fn access(&mut self, flags: ClassAccessFlags) -> &mut Self {
        self.access_flags = flags;
        self
    }

    pub fn implements(&mut self, name: &str) -> &mut Self {
        let index = self.class(name);
        self.interfaces.push(index);
        self
    }

    pub fn utf8(&mut self, value: &str) -> u16 {
        self.pool.intern_utf8(value).unwrap()
    }

    pub fn class(&mut self, name: &str) -> u16 {
        self.pool.intern_class(name).unwrap()
    }

    pub fn string(&mut self, value: &str) -> u16 {
        let string_index = self.utf8(value);
        self.pool
            .intern(ConstantInfo::String(StringConstant { string_index }))
            .unwrap()
    }

    /// `String` constant over raw modified UTF-8 bytes.
    pub fn raw_string(&mut self, bytes: &[u8]) -> u16 {
        let string_index = self
            .pool
            .intern(ConstantInfo::Utf8(Utf8Constant {
                bytes: bytes.to_vec(),
            }))
            .unwrap();
        self.pool
            .intern(ConstantInfo::String(StringConstant { string_index }))
            .unwrap()
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        self.pool.intern_name_and_type(name, descriptor).unwrap()
    }

    pub fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class(owner);
        let name_and_type_index = self.name_and_type(name, descriptor);
        self.pool
            .intern(ConstantInfo::FieldRef(FieldRefConstant {
                class_index,
                name_and_type_index,
            }))
            .unwrap()
    }

    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class(owner);
        let name_and_type_index = self.name_and_type(name, descriptor);
        self.pool
            .intern(ConstantInfo::MethodRef(MethodRefConstant {
                class_index,
                name_and_type_index,
            }))
            .unwrap()
    }

    pub fn interface_method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class(owner);
        let name_and_type_index = self.name_and_type(name, descriptor);
        self.pool
            .intern(ConstantInfo::InterfaceMethodRef(InterfaceMethodRefConstant {
                class_index,
                name_and_type_index,
            }))
            .unwrap()
    }

    pub fn method_type(&mut self, descriptor: &str) -> u16 {
        let descriptor_index = self.utf8(descriptor);
        self.pool
            .intern(ConstantInfo::MethodType(MethodTypeConstant { descriptor_index }))
            .unwrap()
    }

    pub fn method_handle(&mut self, reference_kind: u8, reference_index: u16) -> u16 {
        self.pool
            .intern(ConstantInfo::MethodHandle(MethodHandleConstant {
                reference_kind,
                reference_index,
            }))
            .unwrap()
    }

    /// Adds a bootstrap method and returns its position in the table.
    pub fn bootstrap(&mut self, handle: u16, arguments: Vec<u16>) -> u16 {
        self.bootstrap_methods.push(BootstrapMethod {
            bootstrap_method_ref: handle,
            bootstrap_arguments: arguments,
        });
        (self.bootstrap_methods.len() - 1) as u16
    }

    pub fn invoke_dynamic(&mut self, bootstrap: u16, name: &str, descriptor: &str) -> u16 {
        let name_and_type_index = self.name_and_type(name, descriptor);
        self.pool
            .intern(ConstantInfo::InvokeDynamic(InvokeDynamicConstant {
                bootstrap_method_attr_index: bootstrap,
                name_and_type_index,
            }))
            .unwrap()
    }

    /// Wraps a structured attribute, interning its name.
    pub fn attribute(&mut self, variant: AttributeInfoVariant) -> AttributeInfo {
        let name_index = self.utf8(variant.name());
        AttributeInfo::from_parsed(name_index, variant).unwrap()
    }

    pub fn class_attribute(&mut self, variant: AttributeInfoVariant) -> &mut Self {
        let attr = self.attribute(variant);
        self.attributes.push(attr);
        self
    }

    /// An attribute this crate does not interpret.
    pub fn raw_attribute(&mut self, name: &str, info: Vec<u8>) -> &mut Self {
        let attribute_name_index = self.utf8(name);
        self.attributes.push(AttributeInfo {
            attribute_name_index,
            info,
            info_parsed: None,
        });
        self
    }

    pub fn field(
        &mut self,
        access_flags: FieldAccessFlags,
        name: &str,
        descriptor: &str,
        attributes: Vec<AttributeInfo>,
    ) -> &mut Self {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        self.fields.push(FieldInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        });
        self
    }

    /// Adds a method; `code` becomes its `Code` attribute when present.
    pub fn method(
        &mut self,
        access_flags: MethodAccessFlags,
        name: &str,
        descriptor: &str,
        code: Option<Vec<u8>>,
        mut attributes: Vec<AttributeInfo>,
    ) -> &mut Self {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        if let Some(code) = code {
            let attr = self.attribute(AttributeInfoVariant::Code(CodeAttribute {
                max_stack: 4,
                max_locals: 4,
                code,
                exception_table: Vec::new(),
                attributes: Vec::new(),
            }));
            attributes.insert(0, attr);
        }
        self.methods.push(MethodInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        });
        self
    }

    /// Public abstract method without a body.
    pub fn abstract_method(&mut self, name: &str, descriptor: &str) -> &mut Self {
        self.method(
            MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT,
            name,
            descriptor,
            None,
            Vec::new(),
        )
    }

    pub fn class_file(&mut self) -> ClassFile {
        let mut attributes = self.attributes.clone();
        if !self.bootstrap_methods.is_empty() {
            let attr = self.attribute(AttributeInfoVariant::BootstrapMethods(
                BootstrapMethodsAttribute {
                    bootstrap_methods: self.bootstrap_methods.clone(),
                },
            ));
            attributes.push(attr);
        }
        ClassFile {
            minor_version: 0,
            major_version: 61,
            const_pool: self.pool.clone(),
            access_flags: self.access_flags,
            this_class: self.this_class,
            super_class: self.super_class,
            interfaces: self.interfaces.clone(),
            fields: self.fields.clone(),
            methods: self.methods.clone(),
            attributes,
        }
    }

    pub fn build(&mut self) -> Vec<u8> {
        write_class(&self.class_file()).unwrap()
    }
}

/// Big-endian operand bytes.
pub fn u16_operand(index: u16) -> [u8; 2] {
    index.to_be_bytes()
}

/// `invokevirtual #index; return` style helper: opcode plus a u16 operand.
pub fn op(opcode: u8, index: u16) -> Vec<u8> {
    let [hi, lo] = u16_operand(index);
    vec![opcode, hi, lo]
}

pub fn parse(bytes: &[u8]) -> ClassFile {
    read_class(bytes).unwrap()
}

pub fn method_names(class: &ClassFile) -> Vec<(String, String)> {
    class
        .methods
        .iter()
        .map(|m| {
            (
                class.const_pool.utf8(m.name_index).unwrap().into_owned(),
                class.const_pool.utf8(m.descriptor_index).unwrap().into_owned(),
            )
        })
        .collect()
}

pub fn field_names(class: &ClassFile) -> Vec<(String, String)> {
    class
        .fields
        .iter()
        .map(|f| {
            (
                class.const_pool.utf8(f.name_index).unwrap().into_owned(),
                class.const_pool.utf8(f.descriptor_index).unwrap().into_owned(),
            )
        })
        .collect()
}

/// `(owner, name, descriptor)` of a member reference.
pub fn member_ref(class: &ClassFile, index: u16) -> (String, String, String) {
    let pool = &class.const_pool;
    let (class_index, nat_index) = pool.member_ref(index).unwrap();
    let (name, descriptor) = pool.name_and_type(nat_index).unwrap();
    (
        pool.class_name(class_index).unwrap().into_owned(),
        name.into_owned(),
        descriptor.into_owned(),
    )
}

/// Pool operands of the first method with a body named `name`.
pub fn code_operands(class: &ClassFile, name: &str) -> Vec<u16> {
    let method = class
        .methods
        .iter()
        .find(|m| class.const_pool.utf8(m.name_index).unwrap() == name)
        .unwrap();
    classfile_remapper::code_attribute::pool_operands(&method.code().unwrap().code)
        .unwrap()
        .into_iter()
        .map(|op| op.index)
        .collect()
}
