use std::io::Cursor;

use binrw::{BinRead, BinWrite, Endian};

use super::types::*;
use crate::code_attribute;
use crate::error::{RemapError, Result};

fn decode<T>(name: &str, info: &[u8]) -> Result<T>
where
    T: for<'a> BinRead<Args<'a> = ()>,
{
    let mut cursor = Cursor::new(info);
    let value = T::read_options(&mut cursor, Endian::Big, ())
        .map_err(|e| RemapError::malformed(None, format!("{name} attribute: {e}")))?;
    let consumed = cursor.position();
    if consumed != info.len() as u64 {
        return Err(RemapError::malformed(
            None,
            format!(
                "{name} attribute declares {} bytes but its content ends after {consumed}",
                info.len()
            ),
        ));
    }
    Ok(value)
}

fn encode<T>(name: &str, value: &T) -> Result<Vec<u8>>
where
    T: for<'a> BinWrite<Args<'a> = ()>,
{
    let mut cursor = Cursor::new(Vec::new());
    value
        .write_options(&mut cursor, Endian::Big, ())
        .map_err(|e| RemapError::malformed(None, format!("cannot encode {name} attribute: {e}")))?;
    Ok(cursor.into_inner())
}

/// Interprets the payload of a recognised attribute. Unknown names yield
/// `None` and stay opaque.
pub fn interpret_attribute(name: &str, info: &[u8]) -> Result<Option<AttributeInfoVariant>> {
    use AttributeInfoVariant as V;

    let variant = match name {
        "Code" => {
            let code: CodeAttribute = decode(name, info)?;
            code_attribute::validate(&code.code)?;
            V::Code(code)
        }
        "ConstantValue" => V::ConstantValue(decode(name, info)?),
        "Exceptions" => V::Exceptions(decode(name, info)?),
        "InnerClasses" => V::InnerClasses(decode(name, info)?),
        "EnclosingMethod" => V::EnclosingMethod(decode(name, info)?),
        "Signature" => V::Signature(decode(name, info)?),
        "SourceFile" => V::SourceFile(decode(name, info)?),
        "BootstrapMethods" => V::BootstrapMethods(decode(name, info)?),
        "StackMapTable" => V::StackMapTable(decode(name, info)?),
        "LocalVariableTable" => V::LocalVariableTable(decode(name, info)?),
        "LocalVariableTypeTable" => V::LocalVariableTypeTable(decode(name, info)?),
        "RuntimeVisibleAnnotations" => V::RuntimeVisibleAnnotations(decode(name, info)?),
        "RuntimeInvisibleAnnotations" => V::RuntimeInvisibleAnnotations(decode(name, info)?),
        "RuntimeVisibleParameterAnnotations" => {
            V::RuntimeVisibleParameterAnnotations(decode(name, info)?)
        }
        "RuntimeInvisibleParameterAnnotations" => {
            V::RuntimeInvisibleParameterAnnotations(decode(name, info)?)
        }
        "RuntimeVisibleTypeAnnotations" => V::RuntimeVisibleTypeAnnotations(decode(name, info)?),
        "RuntimeInvisibleTypeAnnotations" => {
            V::RuntimeInvisibleTypeAnnotations(decode(name, info)?)
        }
        "AnnotationDefault" => V::AnnotationDefault(decode(name, info)?),
        "NestHost" => V::NestHost(decode(name, info)?),
        "NestMembers" => V::NestMembers(decode(name, info)?),
        "PermittedSubclasses" => V::PermittedSubclasses(decode(name, info)?),
        "Record" => V::Record(decode(name, info)?),
        "ModuleMainClass" => V::ModuleMainClass(decode(name, info)?),
        _ => return Ok(None),
    };
    Ok(Some(variant))
}

/// Serialises a structured attribute back into its payload bytes.
pub fn encode_attribute(variant: &AttributeInfoVariant) -> Result<Vec<u8>> {
    use AttributeInfoVariant as V;

    let name = variant.name();
    match variant {
        V::Code(a) => encode(name, a),
        V::ConstantValue(a) => encode(name, a),
        V::Exceptions(a) => encode(name, a),
        V::InnerClasses(a) => encode(name, a),
        V::EnclosingMethod(a) => encode(name, a),
        V::Signature(a) => encode(name, a),
        V::SourceFile(a) => encode(name, a),
        V::BootstrapMethods(a) => encode(name, a),
        V::StackMapTable(a) => encode(name, a),
        V::LocalVariableTable(a) => encode(name, a),
        V::LocalVariableTypeTable(a) => encode(name, a),
        V::RuntimeVisibleAnnotations(a) | V::RuntimeInvisibleAnnotations(a) => encode(name, a),
        V::RuntimeVisibleParameterAnnotations(a) | V::RuntimeInvisibleParameterAnnotations(a) => {
            encode(name, a)
        }
        V::RuntimeVisibleTypeAnnotations(a) | V::RuntimeInvisibleTypeAnnotations(a) => {
            encode(name, a)
        }
        V::AnnotationDefault(a) => encode(name, a),
        V::NestHost(a) => encode(name, a),
        V::NestMembers(a) | V::PermittedSubclasses(a) => encode(name, a),
        V::Record(a) => encode(name, a),
        V::ModuleMainClass(a) => encode(name, a),
    }
}

impl AttributeInfoVariant {
    /// The attribute name as it appears in the constant pool.
    pub fn name(&self) -> &'static str {
        use AttributeInfoVariant as V;

        match self {
            V::Code(_) => "Code",
            V::ConstantValue(_) => "ConstantValue",
            V::Exceptions(_) => "Exceptions",
            V::InnerClasses(_) => "InnerClasses",
            V::EnclosingMethod(_) => "EnclosingMethod",
            V::Signature(_) => "Signature",
            V::SourceFile(_) => "SourceFile",
            V::BootstrapMethods(_) => "BootstrapMethods",
            V::StackMapTable(_) => "StackMapTable",
            V::LocalVariableTable(_) => "LocalVariableTable",
            V::LocalVariableTypeTable(_) => "LocalVariableTypeTable",
            V::RuntimeVisibleAnnotations(_) => "RuntimeVisibleAnnotations",
            V::RuntimeInvisibleAnnotations(_) => "RuntimeInvisibleAnnotations",
            V::RuntimeVisibleParameterAnnotations(_) => "RuntimeVisibleParameterAnnotations",
            V::RuntimeInvisibleParameterAnnotations(_) => "RuntimeInvisibleParameterAnnotations",
            V::RuntimeVisibleTypeAnnotations(_) => "RuntimeVisibleTypeAnnotations",
            V::RuntimeInvisibleTypeAnnotations(_) => "RuntimeInvisibleTypeAnnotations",
            V::AnnotationDefault(_) => "AnnotationDefault",
            V::NestHost(_) => "NestHost",
            V::NestMembers(_) => "NestMembers",
            V::PermittedSubclasses(_) => "PermittedSubclasses",
            V::Record(_) => "Record",
            V::ModuleMainClass(_) => "ModuleMainClass",
        }
    }
}
