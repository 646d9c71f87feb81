use std::collections::HashMap;

use crate::error::Result;
use crate::method_info::MethodAccessFlags;
use crate::types::ClassFile;

/// What the resolver needs to know about one class: its supertypes and the
/// members it declares.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassNode {
    pub name: String,
    pub super_name: Option<String>,
    /// In declaration order.
    pub interfaces: Vec<String>,
    /// `(name, descriptor)` of every declared field.
    pub fields: Vec<(String, String)>,
    /// `(name, descriptor, access)` of every declared method.
    pub methods: Vec<(String, String, MethodAccessFlags)>,
}

impl ClassNode {
    pub fn new(name: impl Into<String>, super_name: Option<&str>, interfaces: &[&str]) -> Self {
        ClassNode {
            name: name.into(),
            super_name: super_name.map(str::to_string),
            interfaces: interfaces.iter().map(|s| s.to_string()).collect(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: &str, descriptor: &str) -> Self {
        self.fields.push((name.to_string(), descriptor.to_string()));
        self
    }

    pub fn with_method(mut self, name: &str, descriptor: &str, access: MethodAccessFlags) -> Self {
        self.methods
            .push((name.to_string(), descriptor.to_string(), access));
        self
    }

    pub fn from_class(class: &ClassFile) -> Result<Self> {
        let pool = &class.const_pool;
        let fields = class
            .fields
            .iter()
            .map(|field| {
                Ok((
                    pool.utf8(field.name_index)?.into_owned(),
                    pool.utf8(field.descriptor_index)?.into_owned(),
                ))
            })
            .collect::<Result<_>>()?;
        let methods = class
            .methods
            .iter()
            .map(|method| {
                Ok((
                    pool.utf8(method.name_index)?.into_owned(),
                    pool.utf8(method.descriptor_index)?.into_owned(),
                    method.access_flags,
                ))
            })
            .collect::<Result<_>>()?;
        Ok(ClassNode {
            name: class.class_name()?.into_owned(),
            super_name: class.super_name()?.map(|s| s.into_owned()),
            interfaces: class
                .interface_names()?
                .into_iter()
                .map(|s| s.into_owned())
                .collect(),
            fields,
            methods,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_class(&crate::read_class(bytes)?)
    }

    /// Whether the class declares a field `name`; with no descriptor any
    /// field of that name counts.
    pub fn declares_field(&self, name: &str, descriptor: Option<&str>) -> bool {
        self.fields
            .iter()
            .any(|(n, d)| n == name && descriptor.is_none_or(|desc| desc == d))
    }

    /// Access flags of the declared method `name descriptor`, if any.
    pub fn method_access(&self, name: &str, descriptor: &str) -> Option<MethodAccessFlags> {
        self.methods
            .iter()
            .find(|(n, d, _)| n == name && d == descriptor)
            .map(|(_, _, access)| *access)
    }
}

/// Class name to [`ClassNode`], for every class the resolver can see.
#[derive(Clone, Debug, Default)]
pub struct HierarchyIndex {
    nodes: HashMap<String, ClassNode>,
}

impl HierarchyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node, replacing any earlier node of the same name.
    pub fn insert(&mut self, node: ClassNode) {
        self.nodes.insert(node.name.clone(), node);
    }

    pub fn get(&self, name: &str) -> Option<&ClassNode> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl FromIterator<ClassNode> for HierarchyIndex {
    fn from_iter<T: IntoIterator<Item = ClassNode>>(iter: T) -> Self {
        let mut index = HierarchyIndex::new();
        for node in iter {
            index.insert(node);
        }
        index
    }
}
