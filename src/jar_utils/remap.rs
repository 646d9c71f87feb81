use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::types::{JarFile, JarResult, MANIFEST_PATH};
use crate::batch::{remap_batch, BatchOptions, BatchReport, ItemOutcome};
use crate::mapping::ClassNode;
use crate::remap::RemapContextBuilder;

/// A remapped archive and the per-class report it was assembled from.
#[derive(Clone, Debug)]
pub struct RemappedJar {
    pub jar: JarFile,
    pub report: BatchReport,
}

/// `META-INF/*.SF`, `*.RSA`, `*.DSA` and `*.EC`: signatures that no longer
/// verify once classes change.
pub fn is_signature_file(path: &str) -> bool {
    let Some(name) = path.strip_prefix("META-INF/") else {
        return false;
    };
    !name.contains('/')
        && [".SF", ".RSA", ".DSA", ".EC"]
            .iter()
            .any(|ext| name.to_ascii_uppercase().ends_with(ext))
}

/// Headers of every class in a library JAR, for use as supplementary
/// hierarchy. Classes that cannot be read are skipped.
pub fn hierarchy_from_jar(jar: &JarFile) -> Vec<ClassNode> {
    let names: Vec<&str> = jar.class_names().collect();
    names
        .par_iter()
        .filter_map(|&name| {
            let bytes = jar.get_entry(name)?;
            match ClassNode::from_bytes(bytes) {
                Ok(node) => Some(node),
                Err(e) => {
                    debug!(entry = name, error = %e, "classpath entry skipped");
                    None
                }
            }
        })
        .collect()
}

/// Remaps every class of `jar` and assembles the output archive.
///
/// Remapped classes move to their mapped path under the same prefix. Classes
/// that fail keep their original bytes and path. Signature files are dropped
/// and the manifest loses its per-entry sections; every other entry is
/// copied.
pub fn remap_jar(
    jar: &JarFile,
    builder: RemapContextBuilder,
    options: &BatchOptions,
) -> JarResult<RemappedJar> {
    let inputs = jar.class_inputs();
    let ctx = builder.build(&inputs);
    let report = remap_batch(&ctx, &inputs, options);

    let mut out = JarFile::new();
    for name in jar.entry_names() {
        if name.ends_with(".class") {
            continue;
        }
        if is_signature_file(name) {
            debug!(entry = name, "signature file dropped");
            continue;
        }
        if name == MANIFEST_PATH {
            if let Some(mut manifest) = jar.manifest()? {
                manifest.strip_entry_sections();
                out.set_manifest(&manifest);
            }
            continue;
        }
        if let Some(data) = jar.get_entry(name) {
            out.set_entry(name, data.to_vec());
        }
    }

    for (item, input) in report.items.iter().zip(&inputs) {
        match &item.outcome {
            ItemOutcome::Remapped(class) => {
                let path = mapped_path(&item.id, &class.original_name, &class.mapped_name);
                if path != item.id && out.contains_entry(&path) {
                    warn!(entry = %item.id, target = %path, "mapped path already taken, overwriting");
                }
                out.set_entry(path, class.bytes.clone());
            }
            ItemOutcome::Failed(_) | ItemOutcome::Cancelled => {
                out.set_entry(input.id.as_str(), input.bytes.clone());
            }
        }
    }

    info!(
        entries = out.len(),
        remapped = report.success_count(),
        failed = report.failure_count(),
        "jar assembled"
    );
    Ok(RemappedJar { jar: out, report })
}

/// `prefix/mapped.class` for an entry stored as `prefix/original.class`; an
/// entry whose path does not follow its class name keeps its path.
fn mapped_path(path: &str, original: &str, mapped: &str) -> String {
    path.strip_suffix(".class")
        .and_then(|stem| stem.strip_suffix(original))
        .filter(|prefix| prefix.is_empty() || prefix.ends_with('/'))
        .map(|prefix| format!("{prefix}{mapped}.class"))
        .unwrap_or_else(|| path.to_string())
}
