//! Searge TSRG (v1) mapping files.
//!
//! ```text
//! a net/minecraft/Foo
//!     a field_1234_a
//!     b (La;)V func_5678_b
//! ```
//!
//! Field lines carry no descriptor. Searge intermediate names
//! (`field_…`/`func_…`) can be resolved to readable names with [`McpNames`].

use std::collections::HashMap;

use tracing::debug;

use crate::error::{RemapError, Result};
use crate::mapping::{MappingEntry, MappingTable};

pub fn parse(text: &str) -> Result<MappingTable> {
    parse_with_names(text, &McpNames::default())
}

/// Parses TSRG text, replacing Searge names found in `names`.
pub fn parse_with_names(text: &str, names: &McpNames) -> Result<MappingTable> {
    let mut table = MappingTable::new();
    let mut current: Option<String> = None;

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();

        if !raw.starts_with(['\t', ' ']) {
            let [name, target] = tokens[..] else {
                return Err(RemapError::mapping(line_no, "class line needs two names"));
            };
            if name.ends_with('/') {
                debug!(line = line_no, name, "skipping package mapping");
                current = None;
                continue;
            }
            table.insert_class(name, target);
            current = Some(name.to_string());
            continue;
        }

        let owner = current
            .as_deref()
            .ok_or_else(|| RemapError::mapping(line_no, "member line outside a class"))?;
        match tokens[..] {
            [name, target] => {
                table.insert_field(owner, name, None, names.field(target));
            }
            [name, descriptor, target] if descriptor.starts_with('(') => {
                table.insert(MappingEntry::Method {
                    owner: owner.to_string(),
                    name: name.to_string(),
                    descriptor: descriptor.to_string(),
                    target: names.method(target).to_string(),
                });
            }
            [name, descriptor, target] => {
                table.insert_field(owner, name, Some(descriptor), names.field(target));
            }
            _ => {
                return Err(RemapError::mapping(
                    line_no,
                    format!("expected 2 or 3 names, found {}", tokens.len()),
                ));
            }
        }
    }
    Ok(table)
}

/// MCP `fields.csv` / `methods.csv` tables: Searge name to readable name.
#[derive(Clone, Debug, Default)]
pub struct McpNames {
    fields: HashMap<String, String>,
    methods: HashMap<String, String>,
}

impl McpNames {
    /// Reads both CSV files (`searge,name,side,desc`, first line a header).
    pub fn from_csv(fields_csv: &str, methods_csv: &str) -> Result<Self> {
        Ok(McpNames {
            fields: read_csv(fields_csv)?,
            methods: read_csv(methods_csv)?,
        })
    }

    fn field<'a>(&'a self, searge: &'a str) -> &'a str {
        self.fields.get(searge).map(String::as_str).unwrap_or(searge)
    }

    fn method<'a>(&'a self, searge: &'a str) -> &'a str {
        self.methods.get(searge).map(String::as_str).unwrap_or(searge)
    }
}

/// `searge -> name` from an MCP table. Columns are found by header, so
/// extra or reordered columns are fine.
fn read_csv(text: &str) -> Result<HashMap<String, String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|header| header.trim() == name)
            .ok_or_else(|| RemapError::mapping(1, format!("missing '{name}' column")))
    };
    let (searge_column, name_column) = (column("searge")?, column("name")?);

    let mut names = HashMap::new();
    for record in reader.records() {
        let record = record?;
        match (record.get(searge_column), record.get(name_column)) {
            (Some(searge), Some(name)) if !searge.is_empty() && !name.is_empty() => {
                names.insert(searge.to_string(), name.to_string());
            }
            _ => {
                let line = record.position().map_or(0, |p| p.line() as usize);
                return Err(RemapError::mapping(line, "empty searge or name"));
            }
        }
    }
    Ok(names)
}
