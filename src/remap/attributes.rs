use super::ClassRemapper;
use crate::attribute_info::*;
use crate::descriptor::signature::{remap_signature, SignatureKind};
use crate::descriptor::{
    parse_field_descriptor, remap_field_descriptor, remap_method_descriptor, simple_class_name,
    JvmType,
};
use crate::error::{Location, Result};

/// What an attribute table is attached to.
pub(super) enum Scope<'s> {
    Class,
    Field { name: &'s str, descriptor: &'s str },
    Method { name: &'s str, descriptor: &'s str },
    RecordComponent { name: &'s str, descriptor: &'s str },
    /// Attributes of a `Code` attribute; `method` is "name descriptor".
    Code { method: &'s str },
}

impl Scope<'_> {
    fn label(&self) -> Option<String> {
        match self {
            Scope::Class => None,
            Scope::Field { name, descriptor }
            | Scope::Method { name, descriptor }
            | Scope::RecordComponent { name, descriptor } => Some(format!("{name} {descriptor}")),
            Scope::Code { method } => Some(method.to_string()),
        }
    }

    /// Grammar of a `Signature` attribute found here.
    fn signature_kind(&self) -> SignatureKind {
        match self {
            Scope::Class => SignatureKind::Class,
            Scope::Method { .. } => SignatureKind::Method,
            Scope::Field { .. } | Scope::RecordComponent { .. } | Scope::Code { .. } => {
                SignatureKind::Field
            }
        }
    }
}

impl ClassRemapper<'_> {
    /// Remaps every recognised attribute of `attrs` and re-encodes the ones
    /// that changed. Unrecognised attributes are left byte for byte.
    pub(super) fn remap_attributes(
        &mut self,
        attrs: &mut [AttributeInfo],
        scope: &Scope,
    ) -> Result<()> {
        for attr in attrs {
            let Some(parsed) = &attr.info_parsed else {
                continue;
            };
            let mut variant = parsed.clone();
            self.remap_attribute(&mut variant, scope).map_err(|e| {
                e.at(Location::Attribute {
                    name: variant.name().to_string(),
                    owner: scope.label(),
                })
            })?;
            if attr.info_parsed.as_ref() != Some(&variant) {
                attr.info_parsed = Some(variant);
                attr.sync_from_parsed()?;
            }
        }
        Ok(())
    }

    /// Gives a renamed class without a `SourceFile` attribute one naming its
    /// new outer class.
    pub(super) fn add_source_file(&mut self, attrs: &mut Vec<AttributeInfo>) -> Result<()> {
        let present = attrs.iter().any(|attr| {
            matches!(attr.info_parsed, Some(AttributeInfoVariant::SourceFile(_)))
        });
        if present {
            return Ok(());
        }
        let Some(file_name) = self.source_file_name() else {
            return Ok(());
        };
        let name_index = self.pool.intern_utf8("SourceFile")?;
        let sourcefile_index = self.pool.intern_utf8(&file_name)?;
        attrs.push(AttributeInfo::from_parsed(
            name_index,
            AttributeInfoVariant::SourceFile(SourceFileAttribute { sourcefile_index }),
        )?);
        Ok(())
    }

    fn remap_attribute(&mut self, variant: &mut AttributeInfoVariant, scope: &Scope) -> Result<()> {
        let map = self.class_mapper();
        match variant {
            AttributeInfoVariant::Code(code) => {
                let method = scope.label().unwrap_or_default();
                self.remap_code(code, &method)?;
            }
            AttributeInfoVariant::ConstantValue(value) => {
                value.constant_value_index = self.redirect(value.constant_value_index);
            }
            AttributeInfoVariant::Exceptions(exceptions) => {
                for index in &mut exceptions.exception_table {
                    *index = self.redirect(*index);
                }
            }
            AttributeInfoVariant::InnerClasses(inner) => {
                for class in &mut inner.classes {
                    self.remap_inner_class(class)?;
                }
            }
            AttributeInfoVariant::EnclosingMethod(enclosing) => {
                self.remap_enclosing_method(enclosing)?;
            }
            AttributeInfoVariant::Signature(signature) => {
                let kind = scope.signature_kind();
                self.rewrite_utf8(&mut signature.signature_index, |s| {
                    remap_signature(s, kind, &map)
                })?;
            }
            AttributeInfoVariant::SourceFile(source) => {
                if let Some(file_name) = self.source_file_name() {
                    source.sourcefile_index = self.pool.intern_utf8(&file_name)?;
                }
            }
            AttributeInfoVariant::BootstrapMethods(bootstrap) => {
                for method in &mut bootstrap.bootstrap_methods {
                    method.bootstrap_method_ref = self.redirect(method.bootstrap_method_ref);
                    for argument in &mut method.bootstrap_arguments {
                        *argument = self.redirect(*argument);
                    }
                }
            }
            AttributeInfoVariant::StackMapTable(table) => {
                for frame in &mut table.entries {
                    for ty in frame.types_mut() {
                        if let VerificationTypeInfo::Object { class } = ty {
                            *class = self.redirect(*class);
                        }
                    }
                }
            }
            AttributeInfoVariant::LocalVariableTable(table) => {
                for item in &mut table.items {
                    self.rewrite_utf8(&mut item.descriptor_index, |d| {
                        remap_field_descriptor(d, &map)
                    })?;
                }
            }
            AttributeInfoVariant::LocalVariableTypeTable(table) => {
                for item in &mut table.items {
                    self.rewrite_utf8(&mut item.signature_index, |s| {
                        remap_signature(s, SignatureKind::Field, &map)
                    })?;
                }
            }
            AttributeInfoVariant::RuntimeVisibleAnnotations(annotations)
            | AttributeInfoVariant::RuntimeInvisibleAnnotations(annotations) => {
                for annotation in &mut annotations.annotations {
                    self.remap_annotation(
                        &mut annotation.type_index,
                        &mut annotation.element_value_pairs,
                    )?;
                }
            }
            AttributeInfoVariant::RuntimeVisibleParameterAnnotations(parameters)
            | AttributeInfoVariant::RuntimeInvisibleParameterAnnotations(parameters) => {
                for annotation in parameters
                    .parameter_annotations
                    .iter_mut()
                    .flat_map(|p| p.annotations.iter_mut())
                {
                    self.remap_annotation(
                        &mut annotation.type_index,
                        &mut annotation.element_value_pairs,
                    )?;
                }
            }
            AttributeInfoVariant::RuntimeVisibleTypeAnnotations(annotations)
            | AttributeInfoVariant::RuntimeInvisibleTypeAnnotations(annotations) => {
                for annotation in &mut annotations.annotations {
                    self.remap_annotation(
                        &mut annotation.type_index,
                        &mut annotation.element_value_pairs,
                    )?;
                }
            }
            AttributeInfoVariant::AnnotationDefault(default) => {
                self.remap_element_value(&mut default.default_value)?;
            }
            AttributeInfoVariant::NestHost(host) => {
                host.host_class_index = self.redirect(host.host_class_index);
            }
            AttributeInfoVariant::NestMembers(list)
            | AttributeInfoVariant::PermittedSubclasses(list) => {
                for class in &mut list.classes {
                    *class = self.redirect(*class);
                }
            }
            AttributeInfoVariant::Record(record) => {
                for component in &mut record.components {
                    self.remap_record_component(component)?;
                }
            }
            AttributeInfoVariant::ModuleMainClass(main) => {
                main.main_class_index = self.redirect(main.main_class_index);
            }
        }
        Ok(())
    }

    fn remap_inner_class(&mut self, class: &mut InnerClassInfo) -> Result<()> {
        let ctx = self.ctx;
        if class.inner_name_index != 0 {
            let inner = self.original.class_name(class.inner_class_info_index)?;
            let outer = match class.outer_class_info_index {
                0 => None,
                index => Some(self.original.class_name(index)?),
            };
            if let Some(mapped) = ctx.map_class(&inner)
                && mapped != inner
            {
                let mapped_outer = outer
                    .as_deref()
                    .map(|outer| ctx.map_class(outer).unwrap_or_else(|| outer.to_string()));
                let simple = inner_simple_name(&mapped, mapped_outer.as_deref());
                if !simple.is_empty() {
                    class.inner_name_index = self.pool.intern_utf8(simple)?;
                }
            }
        }
        class.inner_class_info_index = self.redirect(class.inner_class_info_index);
        if class.outer_class_info_index != 0 {
            class.outer_class_info_index = self.redirect(class.outer_class_info_index);
        }
        Ok(())
    }

    fn remap_enclosing_method(&mut self, enclosing: &mut EnclosingMethodAttribute) -> Result<()> {
        if enclosing.method_index != 0 {
            let owner = self.original.class_name(enclosing.class_index)?.into_owned();
            let (name, descriptor) = self.original.name_and_type(enclosing.method_index)?;
            let (name, descriptor) = (name.into_owned(), descriptor.into_owned());
            let map = self.class_mapper();
            let mapped_name = self
                .method_target(&owner, &name, &descriptor)
                .unwrap_or_else(|| name.clone());
            let mapped_descriptor = remap_method_descriptor(&descriptor, &map)?;
            if mapped_name != name || mapped_descriptor != descriptor {
                enclosing.method_index =
                    self.pool.intern_name_and_type(&mapped_name, &mapped_descriptor)?;
            }
        }
        enclosing.class_index = self.redirect(enclosing.class_index);
        Ok(())
    }

    /// `Outer.java` for a renamed class, `None` when nothing changes.
    fn source_file_name(&self) -> Option<String> {
        if !self.ctx.options().rewrite_source_file {
            return None;
        }
        let mapped = self.ctx.map_class(&self.this_name)?;
        if mapped == self.this_name {
            return None;
        }
        let simple = simple_class_name(&mapped);
        let outer = simple.split('$').next().unwrap_or(simple);
        Some(format!("{outer}.java"))
    }

    /// Renames an annotation's type and the elements it sets.
    fn remap_annotation(
        &mut self,
        type_index: &mut u16,
        pairs: &mut [ElementValuePair],
    ) -> Result<()> {
        let ctx = self.ctx;
        let descriptor = self.pool.utf8(*type_index)?.into_owned();
        let owner = match parse_field_descriptor(&descriptor, false)? {
            JvmType::Reference(owner) => Some(owner),
            _ => None,
        };
        for pair in pairs {
            if let Some(owner) = &owner {
                let name = self.pool.utf8(pair.element_name_index)?.into_owned();
                if let Some(target) = ctx.mappings().lookup_method_by_prefix(owner, &name, "()")
                    && target != name
                {
                    pair.element_name_index = self.pool.intern_utf8(target)?;
                }
            }
            self.remap_element_value(&mut pair.value)?;
        }
        let map = self.class_mapper();
        self.rewrite_utf8(type_index, |d| remap_field_descriptor(d, &map))
    }

    fn remap_element_value(&mut self, value: &mut ElementValue) -> Result<()> {
        let map = self.class_mapper();
        match value {
            ElementValue::Enum(constant) => {
                let descriptor = self.pool.utf8(constant.type_name_index)?.into_owned();
                if let JvmType::Reference(owner) = parse_field_descriptor(&descriptor, false)? {
                    let name = self.pool.utf8(constant.const_name_index)?.into_owned();
                    if let Some(target) = self.field_target(&owner, &name, Some(&descriptor))
                        && target != name
                    {
                        constant.const_name_index = self.pool.intern_utf8(&target)?;
                    }
                }
                self.rewrite_utf8(&mut constant.type_name_index, |d| {
                    remap_field_descriptor(d, &map)
                })?;
            }
            ElementValue::Class { class_info_index } => {
                // class literals may name `void`
                self.rewrite_utf8(class_info_index, |d| {
                    let mut ty = parse_field_descriptor(d, true)?;
                    ty.map_classes(&map);
                    Ok(ty.to_descriptor())
                })?;
            }
            ElementValue::Annotation(annotation) => {
                self.remap_annotation(
                    &mut annotation.type_index,
                    &mut annotation.element_value_pairs,
                )?;
            }
            ElementValue::Array(array) => {
                for value in &mut array.values {
                    self.remap_element_value(value)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn remap_record_component(&mut self, component: &mut RecordComponentInfo) -> Result<()> {
        let ctx = self.ctx;
        let name = self.pool.utf8(component.name_index)?.into_owned();
        let descriptor = self.pool.utf8(component.descriptor_index)?.into_owned();
        if let Some(target) = ctx
            .mappings()
            .field_exact(&self.this_name, &name, Some(&descriptor))
            && target != name
        {
            component.name_index = self.pool.intern_utf8(target)?;
        }
        let map = self.class_mapper();
        self.rewrite_utf8(&mut component.descriptor_index, |d| {
            remap_field_descriptor(d, &map)
        })?;
        self.remap_attributes(
            &mut component.attributes,
            &Scope::RecordComponent {
                name: &name,
                descriptor: &descriptor,
            },
        )
    }
}

/// Simple name of an inner class from its mapped binary name: the part after
/// `mapped_outer$` when it has that prefix, otherwise the part after the last
/// `$` with the digits of a local class stripped.
fn inner_simple_name<'n>(mapped: &'n str, mapped_outer: Option<&str>) -> &'n str {
    if let Some(outer) = mapped_outer
        && let Some(rest) = mapped
            .strip_prefix(outer)
            .and_then(|rest| rest.strip_prefix('$'))
    {
        return rest;
    }
    match mapped.rsplit_once('$') {
        Some((_, simple)) => simple.trim_start_matches(|c: char| c.is_ascii_digit()),
        None => simple_class_name(mapped),
    }
}
