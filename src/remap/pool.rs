//! Renames the context-free constants in dependency order: classes and
//! method types, then member references, then method handles, then
//! `invokedynamic`/`Dynamic` call sites.

use super::ClassRemapper;
use crate::attribute_info::BootstrapMethod;
use crate::constant_info::*;
use crate::descriptor::{remap_field_descriptor, remap_method_descriptor, return_class};
use crate::error::{Location, RemapError, Result};

const LAMBDA_METAFACTORY: &str = "java/lang/invoke/LambdaMetafactory";

impl ClassRemapper<'_> {
    pub(super) fn remap_pool(&mut self, bootstrap: &[BootstrapMethod]) -> Result<()> {
        let indices: Vec<u16> = self.original.iter().map(|(index, _)| index).collect();

        self.pool_layer(&indices, bootstrap, |e| {
            matches!(e, ConstantInfo::Class(_) | ConstantInfo::MethodType(_))
        })?;
        self.pool_layer(&indices, bootstrap, |e| {
            matches!(
                e,
                ConstantInfo::FieldRef(_)
                    | ConstantInfo::MethodRef(_)
                    | ConstantInfo::InterfaceMethodRef(_)
            )
        })?;
        self.pool_layer(&indices, bootstrap, |e| {
            matches!(e, ConstantInfo::MethodHandle(_))
        })?;
        self.pool_layer(&indices, bootstrap, |e| {
            matches!(e, ConstantInfo::InvokeDynamic(_) | ConstantInfo::Dynamic(_))
        })
    }

    fn pool_layer(
        &mut self,
        indices: &[u16],
        bootstrap: &[BootstrapMethod],
        in_layer: fn(&ConstantInfo) -> bool,
    ) -> Result<()> {
        for &index in indices {
            let entry = self.original.resolve(index)?.clone();
            if !in_layer(&entry) {
                continue;
            }
            if let Some(rewritten) = self
                .rewrite_entry(&entry, bootstrap)
                .map_err(|e| e.at(Location::Pool(index)))?
                && rewritten != entry
            {
                self.settle(index, rewritten)?;
            }
        }
        self.collapse(indices, in_layer)
    }

    /// Installs the new value of `index`. When a lower entry already holds
    /// it, references are pointed there as well; the slot itself still gets
    /// the new value so opaque attributes never see the old name.
    fn settle(&mut self, index: u16, entry: ConstantInfo) -> Result<()> {
        if let Some(flag) = self.changed.get_mut(usize::from(index)) {
            *flag = true;
        }
        if let Some(lowest) = self.pool.index_of(&entry)
            && lowest < index
        {
            self.redirects.insert(index, lowest);
        }
        self.pool.replace(index, entry)
    }

    /// Folds entries that became equal to a lower entry during this layer.
    /// Both slots already hold the new value; only references move.
    fn collapse(&mut self, indices: &[u16], in_layer: fn(&ConstantInfo) -> bool) -> Result<()> {
        for &index in indices {
            if self.redirects.contains_key(&index) {
                continue;
            }
            let entry = self.pool.resolve(index)?;
            if !in_layer(entry) {
                continue;
            }
            let Some(lowest) = self.pool.index_of(entry) else {
                continue;
            };
            let touched = |i: u16| self.changed.get(usize::from(i)).copied().unwrap_or(true);
            if lowest < index && (touched(index) || touched(lowest)) {
                self.redirects.insert(index, lowest);
            }
        }
        Ok(())
    }

    /// New value of a context-free entry, `None` when nothing changes.
    fn rewrite_entry(
        &mut self,
        entry: &ConstantInfo,
        bootstrap: &[BootstrapMethod],
    ) -> Result<Option<ConstantInfo>> {
        let map = self.class_mapper();
        let rewritten = match entry {
            ConstantInfo::Class(class) => {
                let name = self.original.utf8(class.name_index)?;
                let mapped = if name.starts_with('[') {
                    Some(remap_field_descriptor(&name, &map)?)
                } else {
                    map(name.as_ref())
                };
                match mapped {
                    Some(mapped) if mapped != name => {
                        let name_index = self.pool.intern_utf8(&mapped)?;
                        Some(ConstantInfo::Class(ClassConstant { name_index }))
                    }
                    _ => None,
                }
            }
            ConstantInfo::MethodType(method_type) => {
                let descriptor = self.original.utf8(method_type.descriptor_index)?;
                let mapped = remap_method_descriptor(&descriptor, &map)?;
                if mapped != descriptor {
                    let descriptor_index = self.pool.intern_utf8(&mapped)?;
                    Some(ConstantInfo::MethodType(MethodTypeConstant { descriptor_index }))
                } else {
                    None
                }
            }
            ConstantInfo::FieldRef(r) => self
                .rewrite_member_ref(r.class_index, r.name_and_type_index, true)?
                .map(|(class_index, name_and_type_index)| {
                    ConstantInfo::FieldRef(FieldRefConstant {
                        class_index,
                        name_and_type_index,
                    })
                }),
            ConstantInfo::MethodRef(r) => self
                .rewrite_member_ref(r.class_index, r.name_and_type_index, false)?
                .map(|(class_index, name_and_type_index)| {
                    ConstantInfo::MethodRef(MethodRefConstant {
                        class_index,
                        name_and_type_index,
                    })
                }),
            ConstantInfo::InterfaceMethodRef(r) => self
                .rewrite_member_ref(r.class_index, r.name_and_type_index, false)?
                .map(|(class_index, name_and_type_index)| {
                    ConstantInfo::InterfaceMethodRef(InterfaceMethodRefConstant {
                        class_index,
                        name_and_type_index,
                    })
                }),
            ConstantInfo::MethodHandle(handle) => {
                let reference_index = self.redirect(handle.reference_index);
                (reference_index != handle.reference_index).then_some(ConstantInfo::MethodHandle(
                    MethodHandleConstant {
                        reference_kind: handle.reference_kind,
                        reference_index,
                    },
                ))
            }
            ConstantInfo::InvokeDynamic(indy) => {
                let (name, descriptor) = self.original.name_and_type(indy.name_and_type_index)?;
                let (name, descriptor) = (name.into_owned(), descriptor.into_owned());
                let mapped_descriptor = remap_method_descriptor(&descriptor, &map)?;
                let mapped_name = self
                    .lambda_target(indy.bootstrap_method_attr_index, &name, &descriptor, bootstrap)?
                    .unwrap_or_else(|| name.clone());
                if mapped_name == name && mapped_descriptor == descriptor {
                    None
                } else {
                    let name_and_type_index =
                        self.pool.intern_name_and_type(&mapped_name, &mapped_descriptor)?;
                    Some(ConstantInfo::InvokeDynamic(InvokeDynamicConstant {
                        bootstrap_method_attr_index: indy.bootstrap_method_attr_index,
                        name_and_type_index,
                    }))
                }
            }
            ConstantInfo::Dynamic(condy) => {
                let (name, descriptor) = self.original.name_and_type(condy.name_and_type_index)?;
                let mapped_descriptor = remap_field_descriptor(&descriptor, &map)?;
                if mapped_descriptor == descriptor {
                    None
                } else {
                    let name = name.into_owned();
                    let name_and_type_index =
                        self.pool.intern_name_and_type(&name, &mapped_descriptor)?;
                    Some(ConstantInfo::Dynamic(DynamicConstant {
                        bootstrap_method_attr_index: condy.bootstrap_method_attr_index,
                        name_and_type_index,
                    }))
                }
            }
            _ => None,
        };
        Ok(rewritten)
    }

    /// New `(class_index, name_and_type_index)` of a member reference.
    fn rewrite_member_ref(
        &mut self,
        class_index: u16,
        name_and_type_index: u16,
        is_field: bool,
    ) -> Result<Option<(u16, u16)>> {
        let owner = self.original.class_name(class_index)?.into_owned();
        let (name, descriptor) = self.original.name_and_type(name_and_type_index)?;
        let (name, descriptor) = (name.into_owned(), descriptor.into_owned());
        let map = self.class_mapper();

        let (mapped_name, mapped_descriptor) = if is_field {
            (
                self.field_target(&owner, &name, Some(&descriptor)),
                remap_field_descriptor(&descriptor, &map)?,
            )
        } else {
            (
                self.method_target(&owner, &name, &descriptor),
                remap_method_descriptor(&descriptor, &map)?,
            )
        };
        let mapped_name = mapped_name.unwrap_or_else(|| name.clone());

        let new_nat = if mapped_name == name && mapped_descriptor == descriptor {
            name_and_type_index
        } else {
            self.pool.intern_name_and_type(&mapped_name, &mapped_descriptor)?
        };
        let new_class = self.redirect(class_index);
        if new_class == class_index && new_nat == name_and_type_index {
            Ok(None)
        } else {
            Ok(Some((new_class, new_nat)))
        }
    }

    /// For `LambdaMetafactory` call sites, the implemented interface method's
    /// mapped name.
    fn lambda_target(
        &mut self,
        bootstrap_index: u16,
        name: &str,
        descriptor: &str,
        bootstrap: &[BootstrapMethod],
    ) -> Result<Option<String>> {
        let method = bootstrap.get(usize::from(bootstrap_index)).ok_or_else(|| {
            RemapError::malformed(
                None,
                format!("bootstrap method #{bootstrap_index} does not exist"),
            )
        })?;
        let ConstantInfo::MethodHandle(handle) = self.original.resolve(method.bootstrap_method_ref)?
        else {
            return Err(RemapError::invalid_index(method.bootstrap_method_ref));
        };
        let (owner_index, nat_index) = self.original.member_ref(handle.reference_index)?;
        let owner = self.original.class_name(owner_index)?;
        let (factory, _) = self.original.name_and_type(nat_index)?;
        if owner != LAMBDA_METAFACTORY || !matches!(&*factory, "metafactory" | "altMetafactory") {
            return Ok(None);
        }
        let Some(interface) = return_class(descriptor) else {
            return Ok(None);
        };
        let Some(&sam_index) = method.bootstrap_arguments.first() else {
            return Ok(None);
        };
        let ConstantInfo::MethodType(sam_type) = self.original.resolve(sam_index)? else {
            return Ok(None);
        };
        let sam_descriptor = self.original.utf8(sam_type.descriptor_index)?.into_owned();
        Ok(self.method_target(&interface, name, &sam_descriptor))
    }
}
