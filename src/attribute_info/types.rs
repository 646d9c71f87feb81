use std::io::{Read, Seek, Write};

use binrw::{binrw, BinRead, BinResult, BinWrite, Endian};

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct AttributeInfo {
    pub attribute_name_index: u16,
    #[br(temp)]
    #[bw(calc = info.len() as u32)]
    attribute_length: u32,
    #[br(count = attribute_length as usize)]
    pub info: Vec<u8>,
    /// Structured view of `info` for the attributes this crate understands.
    /// Filled by `interpret_inner`; written back with `sync_from_parsed`.
    #[brw(ignore)]
    pub info_parsed: Option<AttributeInfoVariant>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttributeInfoVariant {
    Code(CodeAttribute),
    ConstantValue(ConstantValueAttribute),
    Exceptions(ExceptionsAttribute),
    InnerClasses(InnerClassesAttribute),
    EnclosingMethod(EnclosingMethodAttribute),
    Signature(SignatureAttribute),
    SourceFile(SourceFileAttribute),
    BootstrapMethods(BootstrapMethodsAttribute),
    StackMapTable(StackMapTableAttribute),
    LocalVariableTable(LocalVariableTableAttribute),
    LocalVariableTypeTable(LocalVariableTypeTableAttribute),
    RuntimeVisibleAnnotations(RuntimeAnnotationsAttribute),
    RuntimeInvisibleAnnotations(RuntimeAnnotationsAttribute),
    RuntimeVisibleParameterAnnotations(ParameterAnnotationsAttribute),
    RuntimeInvisibleParameterAnnotations(ParameterAnnotationsAttribute),
    RuntimeVisibleTypeAnnotations(TypeAnnotationsAttribute),
    RuntimeInvisibleTypeAnnotations(TypeAnnotationsAttribute),
    AnnotationDefault(AnnotationDefaultAttribute),
    NestHost(NestHostAttribute),
    NestMembers(ClassListAttribute),
    PermittedSubclasses(ClassListAttribute),
    Record(RecordAttribute),
    ModuleMainClass(ModuleMainClassAttribute),
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct ExceptionEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    #[br(temp)]
    #[bw(calc = code.len() as u32)]
    code_length: u32,
    #[br(count = code_length as usize)]
    pub code: Vec<u8>,
    #[br(temp)]
    #[bw(calc = exception_table.len() as u16)]
    exception_table_length: u16,
    #[br(count = exception_table_length)]
    pub exception_table: Vec<ExceptionEntry>,
    #[br(temp)]
    #[bw(calc = attributes.len() as u16)]
    attributes_count: u16,
    #[br(count = attributes_count)]
    pub attributes: Vec<AttributeInfo>,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct InnerClassesAttribute {
    #[br(temp)]
    #[bw(calc = classes.len() as u16)]
    number_of_classes: u16,
    #[br(count = number_of_classes)]
    pub classes: Vec<InnerClassInfo>,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct InnerClassInfo {
    pub inner_class_info_index: u16,
    /// Zero for local and anonymous classes.
    pub outer_class_info_index: u16,
    /// Zero for anonymous classes.
    pub inner_name_index: u16,
    pub inner_class_access_flags: u16,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct EnclosingMethodAttribute {
    pub class_index: u16,
    pub method_index: u16,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct SignatureAttribute {
    pub signature_index: u16,
}

/// The SourceFile attribute is an optional fixed-length attribute in the attributes table of a ClassFile structure (§4.1).
///
/// There may be at most one SourceFile attribute in the attributes table of a ClassFile structure.
/// [see more](https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.7.10)
#[binrw]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[brw(big)]
pub struct SourceFileAttribute {
    /// The value of the sourcefile_index item must be a valid index into the constant_pool table.
    /// The constant_pool entry at that index must be a CONSTANT_Utf8_info structure representing a string.
    pub sourcefile_index: u16,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct ExceptionsAttribute {
    #[br(temp)]
    #[bw(calc = exception_table.len() as u16)]
    exception_table_length: u16,
    #[br(count = exception_table_length)]
    pub exception_table: Vec<u16>,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct ConstantValueAttribute {
    pub constant_value_index: u16,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct BootstrapMethod {
    pub bootstrap_method_ref: u16,
    #[br(temp)]
    #[bw(calc = bootstrap_arguments.len() as u16)]
    num_bootstrap_arguments: u16,
    #[br(count = num_bootstrap_arguments)]
    pub bootstrap_arguments: Vec<u16>,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct BootstrapMethodsAttribute {
    #[br(temp)]
    #[bw(calc = bootstrap_methods.len() as u16)]
    num_bootstrap_methods: u16,
    #[br(count = num_bootstrap_methods)]
    pub bootstrap_methods: Vec<BootstrapMethod>,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub enum VerificationTypeInfo {
    #[brw(magic = 0u8)]
    Top,
    #[brw(magic = 1u8)]
    Integer,
    #[brw(magic = 2u8)]
    Float,
    #[brw(magic = 3u8)]
    Double,
    #[brw(magic = 4u8)]
    Long,
    #[brw(magic = 5u8)]
    Null,
    #[brw(magic = 6u8)]
    UninitializedThis,
    #[brw(magic = 7u8)]
    Object {
        /// An index into the constant pool for the class of the object
        class: u16,
    },
    #[brw(magic = 8u8)]
    Uninitialized {
        /// Offset into associated code array of a new instruction
        /// that created the object being stored here.
        offset: u16,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum StackMapFrame {
    SameFrame {
        frame_type: u8,
    },
    SameLocals1StackItemFrame {
        frame_type: u8,
        stack: VerificationTypeInfo,
    },
    SameLocals1StackItemFrameExtended {
        offset_delta: u16,
        stack: VerificationTypeInfo,
    },
    ChopFrame {
        frame_type: u8,
        offset_delta: u16,
    },
    SameFrameExtended {
        offset_delta: u16,
    },
    AppendFrame {
        offset_delta: u16,
        locals: Vec<VerificationTypeInfo>,
    },
    FullFrame {
        offset_delta: u16,
        locals: Vec<VerificationTypeInfo>,
        stack: Vec<VerificationTypeInfo>,
    },
}

impl StackMapFrame {
    /// Every verification type carried by the frame, locals first.
    pub fn types_mut(&mut self) -> Vec<&mut VerificationTypeInfo> {
        match self {
            StackMapFrame::SameFrame { .. }
            | StackMapFrame::ChopFrame { .. }
            | StackMapFrame::SameFrameExtended { .. } => Vec::new(),
            StackMapFrame::SameLocals1StackItemFrame { stack, .. }
            | StackMapFrame::SameLocals1StackItemFrameExtended { stack, .. } => vec![stack],
            StackMapFrame::AppendFrame { locals, .. } => locals.iter_mut().collect(),
            StackMapFrame::FullFrame { locals, stack, .. } => {
                locals.iter_mut().chain(stack.iter_mut()).collect()
            }
        }
    }
}

fn read_types<R: Read + Seek>(
    reader: &mut R,
    endian: Endian,
    count: usize,
) -> BinResult<Vec<VerificationTypeInfo>> {
    (0..count)
        .map(|_| VerificationTypeInfo::read_options(reader, endian, ()))
        .collect()
}

impl BinRead for StackMapFrame {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let pos = reader.stream_position()?;
        let frame_type = u8::read_options(reader, endian, ())?;
        let frame = match frame_type {
            0..=63 => StackMapFrame::SameFrame { frame_type },
            64..=127 => StackMapFrame::SameLocals1StackItemFrame {
                frame_type,
                stack: VerificationTypeInfo::read_options(reader, endian, ())?,
            },
            247 => StackMapFrame::SameLocals1StackItemFrameExtended {
                offset_delta: u16::read_options(reader, endian, ())?,
                stack: VerificationTypeInfo::read_options(reader, endian, ())?,
            },
            248..=250 => StackMapFrame::ChopFrame {
                frame_type,
                offset_delta: u16::read_options(reader, endian, ())?,
            },
            251 => StackMapFrame::SameFrameExtended {
                offset_delta: u16::read_options(reader, endian, ())?,
            },
            252..=254 => {
                let offset_delta = u16::read_options(reader, endian, ())?;
                let locals = read_types(reader, endian, usize::from(frame_type - 251))?;
                StackMapFrame::AppendFrame {
                    offset_delta,
                    locals,
                }
            }
            255 => {
                let offset_delta = u16::read_options(reader, endian, ())?;
                let number_of_locals = u16::read_options(reader, endian, ())?;
                let locals = read_types(reader, endian, usize::from(number_of_locals))?;
                let number_of_stack_items = u16::read_options(reader, endian, ())?;
                let stack = read_types(reader, endian, usize::from(number_of_stack_items))?;
                StackMapFrame::FullFrame {
                    offset_delta,
                    locals,
                    stack,
                }
            }
            reserved => {
                return Err(binrw::Error::AssertFail {
                    pos,
                    message: format!("reserved stack map frame type {reserved}"),
                });
            }
        };
        Ok(frame)
    }
}

impl BinWrite for StackMapFrame {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<()> {
        match self {
            StackMapFrame::SameFrame { frame_type } => frame_type.write_options(writer, endian, ()),
            StackMapFrame::SameLocals1StackItemFrame { frame_type, stack } => {
                frame_type.write_options(writer, endian, ())?;
                stack.write_options(writer, endian, ())
            }
            StackMapFrame::SameLocals1StackItemFrameExtended {
                offset_delta,
                stack,
            } => {
                247u8.write_options(writer, endian, ())?;
                offset_delta.write_options(writer, endian, ())?;
                stack.write_options(writer, endian, ())
            }
            StackMapFrame::ChopFrame {
                frame_type,
                offset_delta,
            } => {
                frame_type.write_options(writer, endian, ())?;
                offset_delta.write_options(writer, endian, ())
            }
            StackMapFrame::SameFrameExtended { offset_delta } => {
                251u8.write_options(writer, endian, ())?;
                offset_delta.write_options(writer, endian, ())
            }
            StackMapFrame::AppendFrame {
                offset_delta,
                locals,
            } => {
                (251 + locals.len() as u8).write_options(writer, endian, ())?;
                offset_delta.write_options(writer, endian, ())?;
                locals.write_options(writer, endian, ())
            }
            StackMapFrame::FullFrame {
                offset_delta,
                locals,
                stack,
            } => {
                255u8.write_options(writer, endian, ())?;
                offset_delta.write_options(writer, endian, ())?;
                (locals.len() as u16).write_options(writer, endian, ())?;
                locals.write_options(writer, endian, ())?;
                (stack.len() as u16).write_options(writer, endian, ())?;
                stack.write_options(writer, endian, ())
            }
        }
    }
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct StackMapTableAttribute {
    #[br(temp)]
    #[bw(calc = entries.len() as u16)]
    number_of_entries: u16,
    #[br(count = number_of_entries)]
    pub entries: Vec<StackMapFrame>,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct LocalVariableTableAttribute {
    #[br(temp)]
    #[bw(calc = items.len() as u16)]
    local_variable_table_length: u16,
    #[br(count = local_variable_table_length)]
    pub items: Vec<LocalVariableTableItem>,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct LocalVariableTableItem {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub index: u16,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct LocalVariableTypeTableAttribute {
    #[br(temp)]
    #[bw(calc = items.len() as u16)]
    local_variable_type_table_length: u16,
    #[br(count = local_variable_type_table_length)]
    pub items: Vec<LocalVariableTypeTableItem>,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct LocalVariableTypeTableItem {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub signature_index: u16,
    pub index: u16,
}

// ---------------------------------------------------------------------------
// Annotations
// ---------------------------------------------------------------------------

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct RuntimeAnnotationsAttribute {
    #[br(temp)]
    #[bw(calc = annotations.len() as u16)]
    num_annotations: u16,
    #[br(count = num_annotations)]
    pub annotations: Vec<RuntimeAnnotation>,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct RuntimeAnnotation {
    pub type_index: u16,
    #[br(temp)]
    #[bw(calc = element_value_pairs.len() as u16)]
    num_element_value_pairs: u16,
    #[br(count = num_element_value_pairs)]
    pub element_value_pairs: Vec<ElementValuePair>,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct ElementValuePair {
    pub element_name_index: u16,
    pub value: ElementValue,
}

/// `element_value` union; the variant is chosen by its one-byte tag.
#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub enum ElementValue {
    #[brw(magic = b'B')]
    Byte { const_value_index: u16 },
    #[brw(magic = b'C')]
    Char { const_value_index: u16 },
    #[brw(magic = b'D')]
    Double { const_value_index: u16 },
    #[brw(magic = b'F')]
    Float { const_value_index: u16 },
    #[brw(magic = b'I')]
    Int { const_value_index: u16 },
    #[brw(magic = b'J')]
    Long { const_value_index: u16 },
    #[brw(magic = b'S')]
    Short { const_value_index: u16 },
    #[brw(magic = b'Z')]
    Boolean { const_value_index: u16 },
    #[brw(magic = b's')]
    String { const_value_index: u16 },
    #[brw(magic = b'e')]
    Enum(EnumConstValue),
    #[brw(magic = b'c')]
    Class { class_info_index: u16 },
    #[brw(magic = b'@')]
    Annotation(RuntimeAnnotation),
    #[brw(magic = b'[')]
    Array(ElementArrayValue),
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct ElementArrayValue {
    #[br(temp)]
    #[bw(calc = values.len() as u16)]
    num_values: u16,
    #[br(count = num_values)]
    pub values: Vec<ElementValue>,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct EnumConstValue {
    pub type_name_index: u16,
    pub const_name_index: u16,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct ParameterAnnotationsAttribute {
    #[br(temp)]
    #[bw(calc = parameter_annotations.len() as u8)]
    num_parameters: u8,
    #[br(count = num_parameters)]
    pub parameter_annotations: Vec<RuntimeAnnotationsAttribute>,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct TypeAnnotationsAttribute {
    #[br(temp)]
    #[bw(calc = annotations.len() as u16)]
    num_annotations: u16,
    #[br(count = num_annotations)]
    pub annotations: Vec<TypeAnnotation>,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct TypeAnnotation {
    pub target_type: u8,
    #[br(args(target_type))]
    pub target_info: TargetInfo,
    pub target_path: TypePath,
    pub type_index: u16,
    #[br(temp)]
    #[bw(calc = element_value_pairs.len() as u16)]
    num_element_value_pairs: u16,
    #[br(count = num_element_value_pairs)]
    pub element_value_pairs: Vec<ElementValuePair>,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
#[br(import(target_type: u8))]
pub enum TargetInfo {
    #[br(pre_assert(target_type == 0x00 || target_type == 0x01))]
    TypeParameter { type_parameter_index: u8 },
    #[br(pre_assert(target_type == 0x10))]
    SuperType { supertype_index: u16 },
    #[br(pre_assert(target_type == 0x11 || target_type == 0x12))]
    TypeParameterBound {
        type_parameter_index: u8,
        bound_index: u8,
    },
    #[br(pre_assert(matches!(target_type, 0x13..=0x15)))]
    Empty,
    #[br(pre_assert(target_type == 0x16))]
    FormalParameter { formal_parameter_index: u8 },
    #[br(pre_assert(target_type == 0x17))]
    Throws { throws_type_index: u16 },
    #[br(pre_assert(target_type == 0x40 || target_type == 0x41))]
    LocalVar {
        table_length: u16,
        #[br(count = table_length)]
        table: Vec<LocalVarTargetEntry>,
    },
    #[br(pre_assert(target_type == 0x42))]
    Catch { exception_table_index: u16 },
    #[br(pre_assert(matches!(target_type, 0x43..=0x46)))]
    Offset { offset: u16 },
    #[br(pre_assert(matches!(target_type, 0x47..=0x4b)))]
    TypeArgument {
        offset: u16,
        type_argument_index: u8,
    },
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct LocalVarTargetEntry {
    pub start_pc: u16,
    pub length: u16,
    pub index: u16,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct TypePath {
    #[br(temp)]
    #[bw(calc = path.len() as u8)]
    path_length: u8,
    #[br(count = path_length)]
    pub path: Vec<TypePathEntry>,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct TypePathEntry {
    pub type_path_kind: u8,
    pub type_argument_index: u8,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct AnnotationDefaultAttribute {
    pub default_value: ElementValue,
}

// ---------------------------------------------------------------------------
// Nest mates, records and modules
// ---------------------------------------------------------------------------

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct NestHostAttribute {
    pub host_class_index: u16,
}

/// Shared layout of `NestMembers` and `PermittedSubclasses`.
#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct ClassListAttribute {
    #[br(temp)]
    #[bw(calc = classes.len() as u16)]
    number_of_classes: u16,
    #[br(count = number_of_classes)]
    pub classes: Vec<u16>,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct RecordAttribute {
    #[br(temp)]
    #[bw(calc = components.len() as u16)]
    components_count: u16,
    #[br(count = components_count)]
    pub components: Vec<RecordComponentInfo>,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct RecordComponentInfo {
    pub name_index: u16,
    pub descriptor_index: u16,
    #[br(temp)]
    #[bw(calc = attributes.len() as u16)]
    attributes_count: u16,
    #[br(count = attributes_count)]
    pub attributes: Vec<AttributeInfo>,
}

#[binrw]
#[derive(Clone, Debug, PartialEq)]
#[brw(big)]
pub struct ModuleMainClassAttribute {
    pub main_class_index: u16,
}
