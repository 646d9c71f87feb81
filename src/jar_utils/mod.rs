//! JAR archives: in-memory access and whole-archive remapping.

mod manifest;
mod remap;
mod types;

pub use self::manifest::{JarManifest, ManifestAttributes};
pub use self::remap::{hierarchy_from_jar, is_signature_file, remap_jar, RemappedJar};
pub use self::types::*;
