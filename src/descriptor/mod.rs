//! JVM field and method descriptors (JVMS §4.3) and their class-name rewriting.
//!
//! Generic signatures have their own grammar in [`signature`].

pub mod signature;

use crate::error::{RemapError, Result};

/// Represents a JVM type from a descriptor string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JvmType {
    Int,
    Long,
    Float,
    Double,
    Byte,
    Char,
    Short,
    Boolean,
    Void,
    Reference(String),
    Array(Box<JvmType>),
}

impl JvmType {
    /// Returns the JVM descriptor string for this type.
    pub fn to_descriptor(&self) -> String {
        let mut out = String::new();
        self.write_descriptor(&mut out);
        out
    }

    fn write_descriptor(&self, out: &mut String) {
        match self {
            JvmType::Int => out.push('I'),
            JvmType::Long => out.push('J'),
            JvmType::Float => out.push('F'),
            JvmType::Double => out.push('D'),
            JvmType::Byte => out.push('B'),
            JvmType::Char => out.push('C'),
            JvmType::Short => out.push('S'),
            JvmType::Boolean => out.push('Z'),
            JvmType::Void => out.push('V'),
            JvmType::Reference(name) => {
                out.push('L');
                out.push_str(name);
                out.push(';');
            }
            JvmType::Array(inner) => {
                out.push('[');
                inner.write_descriptor(out);
            }
        }
    }

    /// Innermost class name of a reference or array-of-reference type.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            JvmType::Reference(name) => Some(name),
            JvmType::Array(inner) => inner.class_name(),
            _ => None,
        }
    }

    /// Rewrites every class name through `map`; unmapped names are kept.
    pub fn map_classes<F>(&mut self, map: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            JvmType::Reference(name) => {
                if let Some(mapped) = map(name) {
                    *name = mapped;
                }
            }
            JvmType::Array(inner) => inner.map_classes(map),
            _ => {}
        }
    }
}

/// Parse a single type descriptor starting at position `pos` in `desc`.
/// Returns (JvmType, next_position).
pub fn parse_type_at(desc: &str, pos: usize) -> Option<(JvmType, usize)> {
    let bytes = desc.as_bytes();
    match *bytes.get(pos)? {
        b'B' => Some((JvmType::Byte, pos + 1)),
        b'C' => Some((JvmType::Char, pos + 1)),
        b'D' => Some((JvmType::Double, pos + 1)),
        b'F' => Some((JvmType::Float, pos + 1)),
        b'I' => Some((JvmType::Int, pos + 1)),
        b'J' => Some((JvmType::Long, pos + 1)),
        b'S' => Some((JvmType::Short, pos + 1)),
        b'Z' => Some((JvmType::Boolean, pos + 1)),
        b'V' => Some((JvmType::Void, pos + 1)),
        b'L' => {
            let semi = desc[pos + 1..].find(';')?;
            let class_name = &desc[pos + 1..pos + 1 + semi];
            if class_name.is_empty() || class_name.contains(['.', '[', '<', '>']) {
                return None;
            }
            Some((JvmType::Reference(class_name.to_string()), pos + 1 + semi + 1))
        }
        b'[' => {
            let (inner, next) = parse_type_at(desc, pos + 1)?;
            if inner == JvmType::Void {
                return None;
            }
            Some((JvmType::Array(Box::new(inner)), next))
        }
        _ => None,
    }
}

/// Parse a complete field descriptor. `V` is only accepted when
/// `allow_void` is set (return types and annotation class literals).
pub fn parse_field_descriptor(desc: &str, allow_void: bool) -> Result<JvmType> {
    match parse_type_at(desc, 0) {
        Some((JvmType::Void, _)) if !allow_void => Err(RemapError::descriptor(desc)),
        Some((ty, end)) if end == desc.len() => Ok(ty),
        _ => Err(RemapError::descriptor(desc)),
    }
}

/// Parse a method descriptor, e.g. "(II)V" -> ([Int, Int], Void)
pub fn parse_method_descriptor(desc: &str) -> Result<(Vec<JvmType>, JvmType)> {
    let invalid = || RemapError::descriptor(desc);
    if !desc.starts_with('(') {
        return Err(invalid());
    }
    let mut params = Vec::new();
    let mut pos = 1;
    while desc.as_bytes().get(pos) != Some(&b')') {
        let (ty, next) = parse_type_at(desc, pos).ok_or_else(invalid)?;
        if ty == JvmType::Void {
            return Err(invalid());
        }
        params.push(ty);
        pos = next;
    }
    let (ret, end) = parse_type_at(desc, pos + 1).ok_or_else(invalid)?;
    if end != desc.len() {
        return Err(invalid());
    }
    Ok((params, ret))
}

/// Rewrites the class names of a field descriptor.
pub fn remap_field_descriptor<F>(desc: &str, map: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut ty = parse_field_descriptor(desc, false)?;
    ty.map_classes(map);
    Ok(ty.to_descriptor())
}

/// Rewrites the class names of a method descriptor.
pub fn remap_method_descriptor<F>(desc: &str, map: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let (mut params, mut ret) = parse_method_descriptor(desc)?;
    let mut out = String::with_capacity(desc.len());
    out.push('(');
    for param in &mut params {
        param.map_classes(map);
        param.write_descriptor(&mut out);
    }
    out.push(')');
    ret.map_classes(map);
    ret.write_descriptor(&mut out);
    Ok(out)
}

/// Rewrites either kind of descriptor, chosen by its first character.
pub fn remap_descriptor<F>(desc: &str, map: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if desc.starts_with('(') {
        remap_method_descriptor(desc, map)
    } else {
        remap_field_descriptor(desc, map)
    }
}

/// Class named by the return type of a method descriptor, if it returns an
/// object.
pub fn return_class(desc: &str) -> Option<String> {
    match parse_method_descriptor(desc).ok()?.1 {
        JvmType::Reference(name) => Some(name),
        _ => None,
    }
}

/// Convert internal class name to source name.
pub fn internal_to_source_name(name: &str) -> String {
    name.replace('/', ".")
}

/// Convert a source (dotted) class name to its internal form.
pub fn source_to_internal_name(name: &str) -> String {
    name.replace('.', "/")
}

/// Get just the simple class name from an internal name.
pub fn simple_class_name(name: &str) -> &str {
    match name.rfind('/') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}
