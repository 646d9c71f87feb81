use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use super::manifest::JarManifest;
use crate::batch::BatchInput;

pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

#[derive(Error, Debug)]
pub enum JarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("manifest parse error: {0}")]
    Manifest(String),
}

pub type JarResult<T> = std::result::Result<T, JarError>;

/// In-memory JAR: entry path to raw bytes, directories left out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JarFile {
    entries: BTreeMap<String, Vec<u8>>,
}

impl JarFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read<R: Read + Seek>(reader: R) -> JarResult<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;
        let mut entries = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.insert(name, data);
        }
        Ok(JarFile { entries })
    }

    pub fn from_bytes(bytes: &[u8]) -> JarResult<Self> {
        Self::read(Cursor::new(bytes))
    }

    pub fn open(path: impl AsRef<Path>) -> JarResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::read(std::io::BufReader::new(file))
    }

    /// Writes every entry Deflate-compressed, in path order.
    pub fn write<W: Write + Seek>(&self, writer: W) -> JarResult<()> {
        let mut zip_writer = zip::ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in &self.entries {
            zip_writer.start_file(name.as_str(), options)?;
            zip_writer.write_all(data)?;
        }
        zip_writer.finish()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> JarResult<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        self.write(&mut buf)?;
        Ok(buf.into_inner())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> JarResult<()> {
        let file = std::fs::File::create(path)?;
        self.write(std::io::BufWriter::new(file))
    }

    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.entry_names().filter(|n| n.ends_with(".class"))
    }

    pub fn get_entry(&self, path: &str) -> Option<&[u8]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    pub fn set_entry(&mut self, path: impl Into<String>, data: Vec<u8>) {
        self.entries.insert(path.into(), data);
    }

    pub fn remove_entry(&mut self, path: &str) -> Option<Vec<u8>> {
        self.entries.remove(path)
    }

    pub fn contains_entry(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every `.class` entry as a batch item keyed by its path.
    pub fn class_inputs(&self) -> Vec<BatchInput> {
        self.entries
            .iter()
            .filter(|(name, _)| name.ends_with(".class"))
            .map(|(name, data)| BatchInput::new(name.as_str(), data.clone()))
            .collect()
    }

    pub fn manifest(&self) -> JarResult<Option<JarManifest>> {
        self.get_entry(MANIFEST_PATH)
            .map(JarManifest::parse)
            .transpose()
    }

    pub fn set_manifest(&mut self, manifest: &JarManifest) {
        self.set_entry(MANIFEST_PATH, manifest.to_bytes());
    }
}
