//! ProGuard / Mojang mapping files.
//!
//! ```text
//! com.example.Foo -> a:
//!     int count -> b
//!     1:4:void run(java.lang.String[]):10:13 -> c
//! ```
//!
//! The file maps readable names to obfuscated ones; the table produced here
//! goes the other way (obfuscated classes are the input). Member types are
//! written with readable names and are translated into obfuscated
//! descriptors.

use std::collections::HashMap;

use proguard::ProguardRecord;
use tracing::debug;

use crate::descriptor::source_to_internal_name;
use crate::error::{RemapError, Result};
use crate::mapping::{MappingEntry, MappingTable};

struct PendingMember<'a> {
    line: usize,
    owner: String,
    type_name: &'a str,
    name: &'a str,
    /// `Some` for methods.
    params: Option<Vec<&'a str>>,
    obfuscated: &'a str,
}

/// Reads the records with the `proguard` crate; member types are translated
/// once every class line has been seen.
pub fn parse(text: &str) -> Result<MappingTable> {
    let mut table = MappingTable::new();
    let mut named_to_obf: HashMap<String, String> = HashMap::new();
    let mut members = Vec::new();
    let mut current: Option<String> = None;

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let raw = raw.trim_end();
        if raw.trim_start().is_empty() {
            continue;
        }
        let record = ProguardRecord::try_parse(raw.as_bytes()).map_err(|e| {
            RemapError::mapping(line, format!("unparseable line ({:?})", e.kind()))
        })?;
        let pending = match record {
            ProguardRecord::Class {
                original,
                obfuscated,
                ..
            } => {
                let named = source_to_internal_name(original);
                let obfuscated = source_to_internal_name(obfuscated);
                named_to_obf.insert(named.clone(), obfuscated.clone());
                table.insert(MappingEntry::Class {
                    name: obfuscated.clone(),
                    target: named,
                });
                current = Some(obfuscated);
                continue;
            }
            ProguardRecord::Field {
                ty,
                original,
                obfuscated,
                ..
            } => (ty, original, None, obfuscated),
            ProguardRecord::Method {
                ty,
                original,
                obfuscated,
                arguments,
                original_class,
                ..
            } => {
                if original_class.is_some() {
                    debug!(line, name = original, "skipping member inlined from another class");
                    continue;
                }
                let params = arguments
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .collect();
                (ty, original, Some(params), obfuscated)
            }
            _ => continue,
        };

        let (type_name, name, params, obfuscated) = pending;
        let owner = current
            .clone()
            .ok_or_else(|| RemapError::mapping(line, "member line before any class"))?;
        if name == "<init>" || name == "<clinit>" {
            continue;
        }
        members.push(PendingMember {
            line,
            owner,
            type_name,
            name,
            params,
            obfuscated,
        });
    }

    for member in members {
        let PendingMember {
            line,
            owner,
            type_name,
            name,
            params,
            obfuscated,
        } = member;
        let return_type = type_descriptor(type_name, &named_to_obf)
            .ok_or_else(|| RemapError::mapping(line, format!("bad type '{type_name}'")))?;
        let entry = match params {
            Some(params) => {
                let mut descriptor = String::from("(");
                for param in params {
                    descriptor.push_str(&type_descriptor(param, &named_to_obf).ok_or_else(
                        || RemapError::mapping(line, format!("bad parameter type '{param}'")),
                    )?);
                }
                descriptor.push(')');
                descriptor.push_str(&return_type);
                MappingEntry::Method {
                    owner,
                    name: obfuscated.to_string(),
                    descriptor,
                    target: name.to_string(),
                }
            }
            None => MappingEntry::Field {
                owner,
                name: obfuscated.to_string(),
                descriptor: Some(return_type),
                target: name.to_string(),
            },
        };
        table.insert(entry);
    }
    Ok(table)
}

/// `java.lang.String[]` -> `[Ljava/lang/String;` with classes translated to
/// their obfuscated names.
fn type_descriptor(type_name: &str, named_to_obf: &HashMap<String, String>) -> Option<String> {
    let mut base = type_name.trim();
    let mut descriptor = String::new();
    while let Some(element) = base.strip_suffix("[]") {
        descriptor.push('[');
        base = element;
    }
    let primitive = match base {
        "int" => "I",
        "long" => "J",
        "float" => "F",
        "double" => "D",
        "byte" => "B",
        "char" => "C",
        "short" => "S",
        "boolean" => "Z",
        "void" => "V",
        "" => return None,
        _ => "",
    };
    if primitive.is_empty() {
        let internal = source_to_internal_name(base);
        let class = named_to_obf.get(&internal).unwrap_or(&internal);
        descriptor.push('L');
        descriptor.push_str(class);
        descriptor.push(';');
    } else {
        descriptor.push_str(primitive);
    }
    Some(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
# compiler: R8
com.example.Foo -> a:
    int count -> a
    com.example.Foo$Bar helper -> b
    1:4:void run(java.lang.String[],com.example.Foo):10:13 -> c
    com.example.Foo copy() -> d
    5:5:void <init>():1:1 -> <init>
com.example.Foo$Bar -> a$a:
    boolean ready -> a
";

    #[test]
    fn test_parses_classes_and_members() {
        let table = parse(SAMPLE).unwrap();
        assert_eq!(table.lookup_class("a"), Some("com/example/Foo"));
        assert_eq!(table.lookup_class("a$a"), Some("com/example/Foo$Bar"));
        assert_eq!(table.field_exact("a", "a", Some("I")), Some("count"));
        assert_eq!(table.field_exact("a", "b", Some("La$a;")), Some("helper"));
        assert_eq!(table.method_exact("a", "c", "([Ljava/lang/String;La;)V"), Some("run"));
        assert_eq!(table.method_exact("a", "d", "()La;"), Some("copy"));
        assert_eq!(table.field_exact("a$a", "a", Some("Z")), Some("ready"));
        assert_eq!(table.len(), 7);
    }

    #[test]
    fn test_inlined_members_are_skipped() {
        let table = parse(
            "com.example.Foo -> a:\n    \
             7:7:void com.example.Other.helper():20:20 -> b\n    \
             7:7:void work():5:5 -> b\n",
        )
        .unwrap();
        assert_eq!(table.method_exact("a", "b", "()V"), Some("work"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_member_before_class_is_an_error() {
        let err = parse("    int x -> a\n").unwrap_err();
        assert_eq!(err, RemapError::mapping(1, "member line before any class"));
    }

    #[test]
    fn test_missing_arrow_reports_line() {
        match parse("com.example.Foo -> a:\n    int x\n") {
            Err(RemapError::Mapping { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {other:?}"),
        }
    }
}
