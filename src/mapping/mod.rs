//! The rename table and the inheritance-aware member lookup built on it.

pub mod format;
pub mod hierarchy;

use std::collections::{HashMap, HashSet, VecDeque};

pub use self::hierarchy::{ClassNode, HierarchyIndex};

use crate::descriptor::{remap_field_descriptor, remap_method_descriptor};
use crate::error::{MappingWarning, Result};
use crate::method_info::MethodAccessFlags;

/// One rename rule. Owners and descriptors use the source namespace.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum MappingEntry {
    Class {
        name: String,
        target: String,
    },
    Method {
        owner: String,
        name: String,
        descriptor: String,
        target: String,
    },
    Field {
        owner: String,
        name: String,
        /// TSRG field lines carry no descriptor.
        descriptor: Option<String>,
        target: String,
    },
}

#[derive(Clone, Debug, Default)]
struct ClassMembers {
    /// name -> [(descriptor, target)]
    methods: HashMap<String, Vec<(String, String)>>,
    /// name -> [(descriptor, target)]
    fields: HashMap<String, Vec<(Option<String>, String)>>,
}

/// Result of a member lookup that may have walked the hierarchy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberMatch {
    pub target: String,
    /// Class whose mapping entry was used.
    pub declared_in: String,
    pub warning: Option<MappingWarning>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum MemberKind {
    Method,
    Field,
}

#[derive(Clone, Debug, Default)]
pub struct MappingTable {
    classes: HashMap<String, String>,
    members: HashMap<String, ClassMembers>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule; a later rule for the same key replaces the earlier one.
    pub fn insert(&mut self, entry: MappingEntry) {
        match entry {
            MappingEntry::Class { name, target } => {
                self.classes.insert(name, target);
            }
            MappingEntry::Method {
                owner,
                name,
                descriptor,
                target,
            } => {
                let candidates = self
                    .members
                    .entry(owner)
                    .or_default()
                    .methods
                    .entry(name)
                    .or_default();
                match candidates.iter_mut().find(|(d, _)| *d == descriptor) {
                    Some(existing) => existing.1 = target,
                    None => candidates.push((descriptor, target)),
                }
            }
            MappingEntry::Field {
                owner,
                name,
                descriptor,
                target,
            } => {
                let candidates = self
                    .members
                    .entry(owner)
                    .or_default()
                    .fields
                    .entry(name)
                    .or_default();
                match candidates.iter_mut().find(|(d, _)| *d == descriptor) {
                    Some(existing) => existing.1 = target,
                    None => candidates.push((descriptor, target)),
                }
            }
        }
    }

    pub fn insert_class(&mut self, name: &str, target: &str) {
        self.insert(MappingEntry::Class {
            name: name.to_string(),
            target: target.to_string(),
        });
    }

    pub fn insert_method(&mut self, owner: &str, name: &str, descriptor: &str, target: &str) {
        self.insert(MappingEntry::Method {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            target: target.to_string(),
        });
    }

    pub fn insert_field(&mut self, owner: &str, name: &str, descriptor: Option<&str>, target: &str) {
        self.insert(MappingEntry::Field {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.map(str::to_string),
            target: target.to_string(),
        });
    }

    /// Every rule, sorted.
    pub fn entries(&self) -> Vec<MappingEntry> {
        let mut entries: Vec<MappingEntry> = self
            .classes
            .iter()
            .map(|(name, target)| MappingEntry::Class {
                name: name.clone(),
                target: target.clone(),
            })
            .collect();
        for (owner, members) in &self.members {
            for (name, candidates) in &members.methods {
                entries.extend(candidates.iter().map(|(descriptor, target)| {
                    MappingEntry::Method {
                        owner: owner.clone(),
                        name: name.clone(),
                        descriptor: descriptor.clone(),
                        target: target.clone(),
                    }
                }));
            }
            for (name, candidates) in &members.fields {
                entries.extend(candidates.iter().map(|(descriptor, target)| {
                    MappingEntry::Field {
                        owner: owner.clone(),
                        name: name.clone(),
                        descriptor: descriptor.clone(),
                        target: target.clone(),
                    }
                }));
            }
        }
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.classes.len()
            + self
                .members
                .values()
                .map(|m| {
                    m.methods.values().map(Vec::len).sum::<usize>()
                        + m.fields.values().map(Vec::len).sum::<usize>()
                })
                .sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Explicit class mapping only.
    pub fn lookup_class(&self, name: &str) -> Option<&str> {
        self.classes.get(name).map(String::as_str)
    }

    /// Class mapping, optionally inferring `Outer$Inner` from a mapped
    /// `Outer` when the inner class has no rule of its own.
    pub fn map_class(&self, name: &str, infer_inner: bool) -> Option<String> {
        if let Some(target) = self.classes.get(name) {
            return Some(target.clone());
        }
        if !infer_inner {
            return None;
        }
        let (outer, simple) = name.rsplit_once('$')?;
        if outer.is_empty() {
            return None;
        }
        let mapped_outer = self.map_class(outer, true)?;
        Some(format!("{mapped_outer}${simple}"))
    }

    /// Method rule declared exactly on `owner`.
    pub fn method_exact(&self, owner: &str, name: &str, descriptor: &str) -> Option<&str> {
        self.members
            .get(owner)?
            .methods
            .get(name)?
            .iter()
            .find(|(d, _)| d == descriptor)
            .map(|(_, target)| target.as_str())
    }

    /// Field rule declared exactly on `owner`. Typed rules win; untyped
    /// rules match any descriptor.
    pub fn field_exact(&self, owner: &str, name: &str, descriptor: Option<&str>) -> Option<&str> {
        let candidates = self.members.get(owner)?.fields.get(name)?;
        let typed = descriptor.and_then(|desc| {
            candidates
                .iter()
                .find(|(d, _)| d.as_deref() == Some(desc))
        });
        typed
            .or_else(|| candidates.iter().find(|(d, _)| d.is_none()))
            .or_else(|| descriptor.is_none().then(|| candidates.first()).flatten())
            .map(|(_, target)| target.as_str())
    }

    /// First method rule on `owner` named `name` whose descriptor starts with
    /// `prefix`. Annotation elements are looked up with `"()"`.
    pub fn lookup_method_by_prefix(&self, owner: &str, name: &str, prefix: &str) -> Option<&str> {
        self.members
            .get(owner)?
            .methods
            .get(name)?
            .iter()
            .find(|(d, _)| d.starts_with(prefix))
            .map(|(_, target)| target.as_str())
    }

    pub fn lookup_method(
        &self,
        hierarchy: &HierarchyIndex,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Option<MemberMatch> {
        if name == "<init>" || name == "<clinit>" {
            return None;
        }
        self.resolve_member(hierarchy, MemberKind::Method, owner, name, Some(descriptor))
    }

    pub fn lookup_field(
        &self,
        hierarchy: &HierarchyIndex,
        owner: &str,
        name: &str,
        descriptor: Option<&str>,
    ) -> Option<MemberMatch> {
        self.resolve_member(hierarchy, MemberKind::Field, owner, name, descriptor)
    }

    /// Exact owner, then the superclass chain, then every reachable interface
    /// breadth-first. The first hit wins; other interface hits with a
    /// different target are reported as ambiguous. A field walk stops at the
    /// first class that declares the field. A method walk stops at an owner
    /// declaring the method private or static, and at a superclass declaring
    /// it static, so references agree with the declaration they resolve to.
    fn resolve_member<'a>(
        &'a self,
        hierarchy: &'a HierarchyIndex,
        kind: MemberKind,
        owner: &'a str,
        name: &str,
        descriptor: Option<&str>,
    ) -> Option<MemberMatch> {
        let find = |class: &str| match kind {
            MemberKind::Method => descriptor.and_then(|d| self.method_exact(class, name, d)),
            MemberKind::Field => self.field_exact(class, name, descriptor),
        };
        let shadows = |class: &str, is_owner: bool| {
            let Some(node) = hierarchy.get(class) else {
                return false;
            };
            match kind {
                MemberKind::Field => node.declares_field(name, descriptor),
                MemberKind::Method => descriptor
                    .and_then(|d| node.method_access(name, d))
                    .is_some_and(|access| {
                        access.contains(MethodAccessFlags::STATIC)
                            || (is_owner && access.contains(MethodAccessFlags::PRIVATE))
                    }),
            }
        };
        let hit = |class: &str, target: &str| MemberMatch {
            target: target.to_string(),
            declared_in: class.to_string(),
            warning: None,
        };

        if let Some(target) = find(owner) {
            return Some(hit(owner, target));
        }
        if shadows(owner, true) {
            return None;
        }

        let mut visited: HashSet<&str> = HashSet::from([owner]);
        let mut chain = vec![owner];
        let mut current = owner;
        while let Some(super_name) = hierarchy
            .get(current)
            .and_then(|node| node.super_name.as_deref())
        {
            if !visited.insert(super_name) {
                break;
            }
            if let Some(target) = find(super_name) {
                return Some(hit(super_name, target));
            }
            if shadows(super_name, false) {
                return None;
            }
            chain.push(super_name);
            current = super_name;
        }

        let mut queue: VecDeque<&str> = chain
            .iter()
            .filter_map(|class| hierarchy.get(class))
            .flat_map(|node| node.interfaces.iter().map(String::as_str))
            .collect();
        let mut chosen: Option<(&str, &str)> = None;
        let mut rejected = Vec::new();
        while let Some(interface) = queue.pop_front() {
            if !visited.insert(interface) {
                continue;
            }
            if let Some(target) = find(interface) {
                match chosen {
                    None => chosen = Some((interface, target)),
                    Some((_, first)) if first != target => {
                        rejected.push((interface.to_string(), target.to_string()))
                    }
                    Some(_) => {}
                }
                continue;
            }
            if shadows(interface, false) {
                continue;
            }
            if let Some(node) = hierarchy.get(interface) {
                queue.extend(node.interfaces.iter().map(String::as_str));
            }
        }

        let (from, target) = chosen?;
        let warning = (!rejected.is_empty()).then(|| MappingWarning::AmbiguousMapping {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.unwrap_or_default().to_string(),
            chosen: target.to_string(),
            chosen_from: from.to_string(),
            rejected,
        });
        Some(MemberMatch {
            warning,
            ..hit(from, target)
        })
    }

    /// The reverse table: targets become names and descriptors are carried
    /// into the target namespace.
    pub fn inverse(&self) -> Result<MappingTable> {
        let map = |name: &str| self.map_class(name, true);
        let mut inverse = MappingTable::new();
        for entry in self.entries() {
            let reversed = match entry {
                MappingEntry::Class { name, target } => MappingEntry::Class {
                    name: target,
                    target: name,
                },
                MappingEntry::Method {
                    owner,
                    name,
                    descriptor,
                    target,
                } => MappingEntry::Method {
                    owner: map(&owner).unwrap_or(owner),
                    name: target,
                    descriptor: remap_method_descriptor(&descriptor, &map)?,
                    target: name,
                },
                MappingEntry::Field {
                    owner,
                    name,
                    descriptor,
                    target,
                } => MappingEntry::Field {
                    owner: map(&owner).unwrap_or(owner),
                    name: target,
                    descriptor: descriptor
                        .map(|d| remap_field_descriptor(&d, &map))
                        .transpose()?,
                    target: name,
                },
            };
            inverse.insert(reversed);
        }
        Ok(inverse)
    }
}

impl FromIterator<MappingEntry> for MappingTable {
    fn from_iter<T: IntoIterator<Item = MappingEntry>>(iter: T) -> Self {
        let mut table = MappingTable::new();
        for entry in iter {
            table.insert(entry);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn diamond() -> HierarchyIndex {
        // C extends B extends A; C implements I, J; J extends K
        [
            ClassNode::new("A", None, &[]),
            ClassNode::new("B", Some("A"), &[]),
            ClassNode::new("C", Some("B"), &["I", "J"]),
            ClassNode::new("I", None, &[]),
            ClassNode::new("J", None, &["K"]),
            ClassNode::new("K", None, &[]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_superclass_chain() {
        let mut table = MappingTable::new();
        table.insert_method("A", "m", "()V", "run");
        let found = table.lookup_method(&diamond(), "C", "m", "()V").unwrap();
        assert_eq!(found.target, "run");
        assert_eq!(found.declared_in, "A");
        assert!(table.lookup_method(&diamond(), "C", "m", "(I)V").is_none());
    }

    #[test]
    fn test_superclass_beats_interface() {
        let mut table = MappingTable::new();
        table.insert_method("I", "m", "()V", "fromInterface");
        table.insert_method("B", "m", "()V", "fromClass");
        let found = table.lookup_method(&diamond(), "C", "m", "()V").unwrap();
        assert_eq!(found.target, "fromClass");
        assert_eq!(found.warning, None);
    }

    #[test]
    fn test_interface_tie_break_warns() {
        let mut table = MappingTable::new();
        table.insert_method("K", "m", "()V", "second");
        table.insert_method("I", "m", "()V", "first");
        let found = table.lookup_method(&diamond(), "C", "m", "()V").unwrap();
        assert_eq!(found.target, "first");
        assert_eq!(
            found.warning,
            Some(MappingWarning::AmbiguousMapping {
                owner: "C".into(),
                name: "m".into(),
                descriptor: "()V".into(),
                chosen: "first".into(),
                chosen_from: "I".into(),
                rejected: vec![("K".into(), "second".into())],
            })
        );
    }

    #[test]
    fn test_same_target_is_not_ambiguous() {
        let mut table = MappingTable::new();
        table.insert_method("I", "m", "()V", "same");
        table.insert_method("J", "m", "()V", "same");
        let found = table.lookup_method(&diamond(), "C", "m", "()V").unwrap();
        assert_eq!(found.warning, None);
    }

    #[test]
    fn test_constructors_never_renamed() {
        let mut table = MappingTable::new();
        table.insert_method("A", "<init>", "()V", "oops");
        assert!(table.lookup_method(&diamond(), "A", "<init>", "()V").is_none());
    }

    #[test]
    fn test_field_shadowing_stops_walk() {
        let mut table = MappingTable::new();
        table.insert_field("A", "f", Some("I"), "count");
        let mut hierarchy = diamond();
        assert_eq!(
            table.lookup_field(&hierarchy, "C", "f", Some("I")).unwrap().target,
            "count"
        );
        hierarchy.insert(ClassNode::new("B", Some("A"), &[]).with_field("f", "I"));
        assert!(table.lookup_field(&hierarchy, "C", "f", Some("I")).is_none());
    }

    #[test]
    fn test_private_and_static_declarations_stop_method_walk() {
        let mut table = MappingTable::new();
        table.insert_method("A", "m", "(I)V", "runWith");
        let mut hierarchy = diamond();
        hierarchy.insert(
            ClassNode::new("B", Some("A"), &[]).with_method("m", "(I)V", MethodAccessFlags::PRIVATE),
        );
        assert!(table.lookup_method(&hierarchy, "B", "m", "(I)V").is_none());
        // a private method of B is not what C inherits
        assert_eq!(
            table.lookup_method(&hierarchy, "C", "m", "(I)V").unwrap().target,
            "runWith"
        );

        hierarchy.insert(
            ClassNode::new("B", Some("A"), &[]).with_method("m", "(I)V", MethodAccessFlags::STATIC),
        );
        assert!(table.lookup_method(&hierarchy, "C", "m", "(I)V").is_none());
    }

    #[test]
    fn test_untyped_field_fallback() {
        let mut table = MappingTable::new();
        table.insert_field("A", "f", None, "value");
        assert_eq!(table.field_exact("A", "f", Some("J")), Some("value"));
        table.insert_field("A", "f", Some("I"), "count");
        assert_eq!(table.field_exact("A", "f", Some("I")), Some("count"));
        assert_eq!(table.field_exact("A", "f", Some("J")), Some("value"));
    }

    #[test]
    fn test_inner_class_inference() {
        let mut table = MappingTable::new();
        table.insert_class("a", "com/example/Outer");
        table.insert_class("a$b", "com/example/Outer$Named");
        assert_eq!(table.map_class("a$c", true).as_deref(), Some("com/example/Outer$c"));
        assert_eq!(table.map_class("a$b$1", true).as_deref(), Some("com/example/Outer$Named$1"));
        assert_eq!(table.map_class("a$c", false), None);
        assert_eq!(table.map_class("z$c", true), None);
    }

    #[test]
    fn test_inverse() {
        let mut table = MappingTable::new();
        table.insert_class("a", "com/example/Foo");
        table.insert_method("a", "b", "(La;)V", "accept");
        table.insert_field("a", "c", Some("La;"), "self");
        let inverse = table.inverse().unwrap();
        assert_eq!(inverse.lookup_class("com/example/Foo"), Some("a"));
        assert_eq!(
            inverse.method_exact("com/example/Foo", "accept", "(Lcom/example/Foo;)V"),
            Some("b")
        );
        assert_eq!(
            inverse.field_exact("com/example/Foo", "self", Some("Lcom/example/Foo;")),
            Some("c")
        );
    }

    #[test]
    fn test_hierarchy_cycle_terminates() {
        let hierarchy: HierarchyIndex = [
            ClassNode::new("X", Some("Y"), &["X"]),
            ClassNode::new("Y", Some("X"), &[]),
        ]
        .into_iter()
        .collect();
        assert!(MappingTable::new().lookup_method(&hierarchy, "X", "m", "()V").is_none());
    }
}
