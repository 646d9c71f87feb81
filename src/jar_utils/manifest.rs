use std::collections::BTreeMap;

use super::types::{JarError, JarResult};

/// Ordered key-value pairs with case-insensitive key lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManifestAttributes {
    entries: Vec<(String, String)>,
}

impl ManifestAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Replaces a matching key, otherwise appends.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some(entry) => *entry = (key, value),
            None => self.entries.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `META-INF/MANIFEST.MF`: the main section plus one section per named entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JarManifest {
    pub main_attributes: ManifestAttributes,
    /// Per-entry sections, mostly digests of signed entries.
    pub entries: BTreeMap<String, ManifestAttributes>,
}

impl JarManifest {
    pub fn parse(data: &[u8]) -> JarResult<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|e| JarError::Manifest(format!("invalid UTF-8: {e}")))?;

        // continuation lines start with a single space
        let mut lines: Vec<String> = Vec::new();
        for raw in text.split('\n') {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            match (line.strip_prefix(' '), lines.last_mut()) {
                (Some(rest), Some(last)) => last.push_str(rest),
                _ => lines.push(line.to_string()),
            }
        }

        let mut manifest = JarManifest::default();
        let mut section: Option<(String, ManifestAttributes)> = None;
        let mut in_main = true;
        for line in &lines {
            if line.is_empty() {
                if let Some((name, attrs)) = section.take() {
                    manifest.entries.insert(name, attrs);
                }
                in_main = false;
                continue;
            }
            let Some((key, value)) = line.split_once(": ") else {
                continue;
            };
            if in_main {
                manifest.main_attributes.set(key, value);
            } else if let Some((_, attrs)) = &mut section {
                attrs.set(key, value);
            } else if key.eq_ignore_ascii_case("Name") {
                section = Some((value.to_string(), ManifestAttributes::new()));
            } else {
                return Err(JarError::Manifest(format!(
                    "section attribute '{key}' before its Name"
                )));
            }
        }
        if let Some((name, attrs)) = section {
            manifest.entries.insert(name, attrs);
        }
        Ok(manifest)
    }

    /// Serialises with `\r\n` line endings and 72-byte lines.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        write_section(&mut out, &self.main_attributes);
        for (name, attrs) in &self.entries {
            out.push_str("\r\n");
            write_wrapped_line(&mut out, "Name", name);
            write_section(&mut out, attrs);
        }
        out.into_bytes()
    }

    pub fn main_attr(&self, key: &str) -> Option<&str> {
        self.main_attributes.get(key)
    }

    /// Drops every per-entry section. Their digests no longer match once
    /// classes are rewritten.
    pub fn strip_entry_sections(&mut self) {
        self.entries.clear();
    }
}

fn write_section(out: &mut String, attrs: &ManifestAttributes) {
    for (key, value) in attrs.iter() {
        write_wrapped_line(out, key, value);
    }
}

fn write_wrapped_line(out: &mut String, key: &str, value: &str) {
    let full = format!("{key}: {value}");
    let mut rest = full.as_str();
    let mut limit = 72;
    while !rest.is_empty() {
        let end = split_pos(rest, limit);
        if limit == 71 {
            out.push(' ');
        }
        out.push_str(&rest[..end]);
        out.push_str("\r\n");
        rest = &rest[end..];
        limit = 71;
    }
}

/// Largest char boundary at or below `max`, but at least one char.
fn split_pos(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    match (1..=max).rev().find(|&pos| s.is_char_boundary(pos)) {
        Some(pos) => pos,
        None => s.chars().next().map_or(s.len(), char::len_utf8),
    }
}
