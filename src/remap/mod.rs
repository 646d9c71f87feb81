//! Rewrites every symbolic reference of a class through a [`RemapContext`].
//!
//! The pool pass ([`pool`]) renames the context-free constants in place and
//! records which indices were folded into an equal, lower entry. The member
//! and attribute passes then rename declarations, re-intern `Utf8` and
//! `NameAndType` entries and follow the recorded redirects wherever a class
//! file stores a pool index.

mod attributes;
mod code;
mod pool;

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::attribute_info::AttributeInfoVariant;
use crate::batch::BatchInput;
use crate::constant_info::ConstantPool;
use crate::descriptor::{remap_field_descriptor, remap_method_descriptor};
use crate::error::{Location, MappingWarning, Result};
use crate::mapping::{ClassNode, HierarchyIndex, MappingTable, MemberMatch};
use crate::field_info::FieldInfo;
use crate::method_info::{MethodAccessFlags, MethodInfo};
use crate::types::ClassFile;
use crate::{read_class, write_class};

use self::attributes::Scope;

/// Switches for the optional rewrites.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemapOptions {
    /// Rename `Outer$Inner` after a mapped `Outer` when the inner class has
    /// no mapping of its own.
    pub infer_inner_classes: bool,
    /// Rewrite `SourceFile` to the mapped outer class name + `.java` when
    /// the class is renamed.
    pub rewrite_source_file: bool,
}

impl Default for RemapOptions {
    fn default() -> Self {
        RemapOptions {
            infer_inner_classes: true,
            rewrite_source_file: true,
        }
    }
}

/// Everything a worker needs to remap a class. Read-only once built and
/// shared between threads.
#[derive(Clone, Debug, Default)]
pub struct RemapContext {
    mappings: MappingTable,
    hierarchy: HierarchyIndex,
    options: RemapOptions,
}

impl RemapContext {
    pub fn new(mappings: MappingTable, hierarchy: HierarchyIndex, options: RemapOptions) -> Self {
        RemapContext {
            mappings,
            hierarchy,
            options,
        }
    }

    pub fn builder(mappings: MappingTable) -> RemapContextBuilder {
        RemapContextBuilder {
            mappings,
            supplementary: Vec::new(),
            options: RemapOptions::default(),
        }
    }

    pub fn mappings(&self) -> &MappingTable {
        &self.mappings
    }

    pub fn hierarchy(&self) -> &HierarchyIndex {
        &self.hierarchy
    }

    pub fn options(&self) -> &RemapOptions {
        &self.options
    }

    /// Target name of a class, `None` when it keeps its name.
    pub fn map_class(&self, name: &str) -> Option<String> {
        self.mappings
            .map_class(name, self.options.infer_inner_classes)
    }

    pub fn lookup_method(&self, owner: &str, name: &str, descriptor: &str) -> Option<MemberMatch> {
        self.mappings
            .lookup_method(&self.hierarchy, owner, name, descriptor)
    }

    pub fn lookup_field(
        &self,
        owner: &str,
        name: &str,
        descriptor: Option<&str>,
    ) -> Option<MemberMatch> {
        self.mappings
            .lookup_field(&self.hierarchy, owner, name, descriptor)
    }
}

/// Collects the hierarchy before any class is remapped.
pub struct RemapContextBuilder {
    mappings: MappingTable,
    supplementary: Vec<ClassNode>,
    options: RemapOptions,
}

impl RemapContextBuilder {
    /// Library classes that are not remapped but take part in lookups.
    pub fn supplementary(mut self, nodes: impl IntoIterator<Item = ClassNode>) -> Self {
        self.supplementary.extend(nodes);
        self
    }

    pub fn options(mut self, options: RemapOptions) -> Self {
        self.options = options;
        self
    }

    /// Parses every input in parallel, then fills the index from a single
    /// thread. Batch classes replace supplementary ones of the same name.
    /// Inputs that cannot be parsed are left out; they fail later on their
    /// own.
    pub fn build(self, inputs: &[BatchInput]) -> RemapContext {
        let nodes: Vec<ClassNode> = inputs
            .par_iter()
            .filter_map(|input| match ClassNode::from_bytes(&input.bytes) {
                Ok(node) => Some(node),
                Err(e) => {
                    debug!(id = %input.id, error = %e, "left out of the hierarchy");
                    None
                }
            })
            .collect();

        let mut hierarchy = HierarchyIndex::new();
        for node in self.supplementary.into_iter().chain(nodes) {
            hierarchy.insert(node);
        }
        debug!(classes = hierarchy.len(), "hierarchy index built");
        RemapContext::new(self.mappings, hierarchy, self.options)
    }
}

/// Output of remapping one class.
#[derive(Clone, Debug, PartialEq)]
pub struct RemappedClass {
    pub original_name: String,
    pub mapped_name: String,
    pub bytes: Vec<u8>,
    pub warnings: Vec<MappingWarning>,
}

/// Reads, remaps and writes one class.
pub fn remap_class(bytes: &[u8], ctx: &RemapContext) -> Result<RemappedClass> {
    let mut class = read_class(bytes)?;
    let original_name = class.class_name()?.into_owned();
    let warnings = remap_class_file(&mut class, ctx)?;
    let mapped_name = class.class_name()?.into_owned();
    let bytes = write_class(&class)?;
    if original_name != mapped_name {
        debug!(from = %original_name, to = %mapped_name, "class renamed");
    }
    Ok(RemappedClass {
        original_name,
        mapped_name,
        bytes,
        warnings,
    })
}

/// Remaps a parsed class in place and returns the warnings raised.
pub fn remap_class_file(class: &mut ClassFile, ctx: &RemapContext) -> Result<Vec<MappingWarning>> {
    class.const_pool.validate()?;
    let this_name = class.class_name()?.into_owned();
    let pool = std::mem::take(&mut class.const_pool);
    let mut remapper = ClassRemapper::new(ctx, pool, this_name);
    let result = remapper.run(class);
    class.const_pool = remapper.pool;
    result?;
    Ok(remapper.warnings)
}

pub(crate) struct ClassRemapper<'a> {
    ctx: &'a RemapContext,
    /// The pool as read; names are always resolved against it.
    original: ConstantPool,
    pool: ConstantPool,
    /// Entries folded into an equal entry with a lower index.
    redirects: HashMap<u16, u16>,
    /// Entries whose value changed during the pool pass.
    changed: Vec<bool>,
    this_name: String,
    warnings: Vec<MappingWarning>,
}

impl<'a> ClassRemapper<'a> {
    fn new(ctx: &'a RemapContext, pool: ConstantPool, this_name: String) -> Self {
        ClassRemapper {
            ctx,
            original: pool.clone(),
            changed: vec![false; usize::from(pool.slot_count())],
            pool,
            redirects: HashMap::new(),
            this_name,
            warnings: Vec::new(),
        }
    }

    fn run(&mut self, class: &mut ClassFile) -> Result<()> {
        let bootstrap = class
            .find_attribute(|attr| match attr {
                AttributeInfoVariant::BootstrapMethods(b) => Some(b),
                _ => None,
            })
            .map(|b| b.bootstrap_methods.clone())
            .unwrap_or_default();
        self.remap_pool(&bootstrap)?;

        class.this_class = self.redirect(class.this_class);
        if class.super_class != 0 {
            class.super_class = self.redirect(class.super_class);
        }
        for interface in &mut class.interfaces {
            *interface = self.redirect(*interface);
        }
        for field in &mut class.fields {
            self.remap_field(field)?;
        }
        for method in &mut class.methods {
            self.remap_method(method)?;
        }
        self.remap_attributes(&mut class.attributes, &Scope::Class)?;
        self.add_source_file(&mut class.attributes)
    }

    /// Index that now stands for `index`.
    fn redirect(&self, index: u16) -> u16 {
        self.redirects.get(&index).copied().unwrap_or(index)
    }

    fn class_mapper(&self) -> impl Fn(&str) -> Option<String> + use<'a> {
        let ctx = self.ctx;
        move |name: &str| ctx.map_class(name)
    }

    fn record(&mut self, warning: Option<MappingWarning>) {
        if let Some(warning) = warning {
            warn!(class = %self.this_name, "{warning}");
            self.warnings.push(warning);
        }
    }

    /// Mapped method name through the hierarchy, recording ambiguity.
    fn method_target(&mut self, owner: &str, name: &str, descriptor: &str) -> Option<String> {
        let found = self.ctx.lookup_method(owner, name, descriptor)?;
        self.record(found.warning);
        Some(found.target)
    }

    fn field_target(&mut self, owner: &str, name: &str, descriptor: Option<&str>) -> Option<String> {
        let found = self.ctx.lookup_field(owner, name, descriptor)?;
        self.record(found.warning);
        Some(found.target)
    }

    /// Replaces the `Utf8` at `*index` with `rewrite(old)` when that differs.
    fn rewrite_utf8(
        &mut self,
        index: &mut u16,
        rewrite: impl FnOnce(&str) -> Result<String>,
    ) -> Result<()> {
        let old = self.pool.utf8(*index)?.into_owned();
        let new = rewrite(&old)?;
        if new != old {
            *index = self.pool.intern_utf8(&new)?;
        }
        Ok(())
    }

    fn remap_field(&mut self, field: &mut FieldInfo) -> Result<()> {
        let name = self.pool.utf8(field.name_index)?.into_owned();
        let descriptor = self.pool.utf8(field.descriptor_index)?.into_owned();
        let location = Location::Field {
            name: name.clone(),
            descriptor: descriptor.clone(),
        };
        let ctx = self.ctx;
        if let Some(target) = ctx.mappings.field_exact(&self.this_name, &name, Some(&descriptor))
            && target != name
        {
            field.name_index = self.pool.intern_utf8(target)?;
        }
        let map = self.class_mapper();
        self.rewrite_utf8(&mut field.descriptor_index, |d| remap_field_descriptor(d, &map))
            .map_err(|e| e.at(location))?;
        self.remap_attributes(
            &mut field.attributes,
            &Scope::Field {
                name: &name,
                descriptor: &descriptor,
            },
        )
    }

    fn remap_method(&mut self, method: &mut MethodInfo) -> Result<()> {
        let name = self.pool.utf8(method.name_index)?.into_owned();
        let descriptor = self.pool.utf8(method.descriptor_index)?.into_owned();
        let location = Location::Method {
            name: name.clone(),
            descriptor: descriptor.clone(),
        };
        let ctx = self.ctx;
        let target = if method
            .access_flags
            .intersects(MethodAccessFlags::PRIVATE | MethodAccessFlags::STATIC)
        {
            ctx.mappings
                .method_exact(&self.this_name, &name, &descriptor)
                .filter(|_| !name.starts_with('<'))
                .map(str::to_string)
        } else {
            let owner = self.this_name.clone();
            self.method_target(&owner, &name, &descriptor)
        };
        if let Some(target) = target
            && target != name
        {
            method.name_index = self.pool.intern_utf8(&target)?;
        }
        let map = self.class_mapper();
        self.rewrite_utf8(&mut method.descriptor_index, |d| remap_method_descriptor(d, &map))
            .map_err(|e| e.at(location))?;
        self.remap_attributes(
            &mut method.attributes,
            &Scope::Method {
                name: &name,
                descriptor: &descriptor,
            },
        )
    }
}
