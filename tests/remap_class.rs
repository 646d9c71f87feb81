mod common;

use classfile_remapper::attribute_info::*;
use classfile_remapper::batch::BatchInput;
use classfile_remapper::constant_info::ConstantInfo;
use classfile_remapper::field_info::FieldAccessFlags;
use classfile_remapper::mapping::MappingTable;
use classfile_remapper::method_info::MethodAccessFlags;
use classfile_remapper::remap::{remap_class, RemapContext, RemapOptions};
use classfile_remapper::{read_class, write_class, Location, MappingWarning, RemapError};
use pretty_assertions::assert_eq;

use common::*;

fn context(mappings: MappingTable, classes: &[&[u8]]) -> RemapContext {
    let inputs: Vec<BatchInput> = classes
        .iter()
        .enumerate()
        .map(|(i, bytes)| BatchInput::new(format!("{i}.class"), bytes.to_vec()))
        .collect();
    RemapContext::builder(mappings).build(&inputs)
}

fn constructor(b: &mut ClassBuilder) {
    let init = b.method_ref("java/lang/Object", "<init>", "()V");
    let mut code = vec![ALOAD_0];
    code.extend(op(INVOKESPECIAL, init));
    code.push(RETURN);
    b.method(MethodAccessFlags::PUBLIC, "<init>", "()V", Some(code), Vec::new());
}

fn source_file(class: &classfile_remapper::ClassFile) -> Option<String> {
    class
        .find_attribute(|attr| match attr {
            AttributeInfoVariant::SourceFile(source) => Some(source),
            _ => None,
        })
        .map(|source| {
            class
                .const_pool
                .utf8(source.sourcefile_index)
                .unwrap()
                .into_owned()
        })
}

/// Names of every `Class` constant, in pool order.
fn class_entries(class: &classfile_remapper::ClassFile) -> Vec<String> {
    class
        .const_pool
        .iter()
        .filter(|(_, entry)| matches!(entry, ConstantInfo::Class(_)))
        .map(|(index, _)| class.const_pool.class_name(index).unwrap().into_owned())
        .collect()
}

#[test]
fn test_parse_write_round_trip() {
    let mut b = ClassBuilder::object("a");
    b.field(FieldAccessFlags::PRIVATE, "f", "I", Vec::new());
    constructor(&mut b);
    b.raw_attribute("Custom", vec![1, 2, 3]);
    let bytes = b.build();

    assert_eq!(write_class(&read_class(&bytes).unwrap()).unwrap(), bytes);
}

#[test]
fn test_empty_mapping_is_identity() {
    let mut b = ClassBuilder::object("a");
    b.field(FieldAccessFlags::PRIVATE, "f", "La;", Vec::new());
    constructor(&mut b);
    let bytes = b.build();

    let out = remap_class(&bytes, &RemapContext::default()).unwrap();
    assert_eq!(out.original_name, "a");
    assert_eq!(out.mapped_name, "a");
    assert!(out.warnings.is_empty());
    assert_eq!(out.bytes, bytes);
}

#[test]
fn test_string_with_lone_surrogate_is_kept_verbatim() {
    let mut b = ClassBuilder::object("a");
    let string = b.raw_string(&[0xed, 0xa0, 0x80]);
    let code = vec![LDC, string as u8, POP, RETURN];
    b.method(MethodAccessFlags::STATIC, "s", "()V", Some(code), Vec::new());
    let bytes = b.build();

    let out = remap_class(&bytes, &RemapContext::default()).unwrap();
    assert_eq!(out.bytes, bytes);

    let mut mappings = MappingTable::new();
    mappings.insert_class("a", "com/example/Text");
    let out = parse(&remap_class(&bytes, &context(mappings, &[&bytes])).unwrap().bytes);
    let index = code_operands(&out, "s")[0];
    let ConstantInfo::String(constant) = out.const_pool.resolve(index).unwrap() else {
        panic!("ldc no longer loads a string");
    };
    assert_eq!(
        out.const_pool.utf8_entry(constant.string_index).unwrap().bytes,
        vec![0xed, 0xa0, 0x80]
    );
}

#[test]
fn test_class_rename_reaches_descriptors_and_source_file() {
    let mut b = ClassBuilder::object("a");
    let source = b.utf8("SourceFile.java");
    b.class_attribute(AttributeInfoVariant::SourceFile(SourceFileAttribute {
        sourcefile_index: source,
    }));
    b.raw_attribute("Custom", vec![9, 8, 7]);
    b.field(FieldAccessFlags::PRIVATE, "self", "La;", Vec::new());
    b.abstract_method("copy", "(La;)[La;");
    let bytes = b.build();

    let mut mappings = MappingTable::new();
    mappings.insert_class("a", "com/example/Main");
    let out = remap_class(&bytes, &context(mappings, &[&bytes])).unwrap();
    assert_eq!(out.mapped_name, "com/example/Main");

    let class = parse(&out.bytes);
    assert_eq!(class.class_name().unwrap(), "com/example/Main");
    assert_eq!(
        field_names(&class),
        vec![("self".to_string(), "Lcom/example/Main;".to_string())]
    );
    assert_eq!(
        method_names(&class),
        vec![(
            "copy".to_string(),
            "(Lcom/example/Main;)[Lcom/example/Main;".to_string()
        )]
    );
    assert_eq!(source_file(&class).as_deref(), Some("Main.java"));

    let custom = class
        .attributes
        .iter()
        .find(|attr| class.const_pool.utf8(attr.attribute_name_index).unwrap() == "Custom")
        .unwrap();
    assert_eq!(custom.info, vec![9, 8, 7]);
}

#[test]
fn test_source_file_rewrite_can_be_disabled() {
    let mut b = ClassBuilder::object("a");
    let source = b.utf8("SourceFile.java");
    b.class_attribute(AttributeInfoVariant::SourceFile(SourceFileAttribute {
        sourcefile_index: source,
    }));
    let bytes = b.build();

    let mut mappings = MappingTable::new();
    mappings.insert_class("a", "com/example/Main");
    let ctx = RemapContext::builder(mappings)
        .options(RemapOptions {
            rewrite_source_file: false,
            ..Default::default()
        })
        .build(&[]);
    let class = parse(&remap_class(&bytes, &ctx).unwrap().bytes);
    assert_eq!(source_file(&class).as_deref(), Some("SourceFile.java"));
}

#[test]
fn test_renamed_class_gains_source_file() {
    let mut b = ClassBuilder::object("a$Inner");
    constructor(&mut b);
    let bytes = b.build();

    let class = parse(&remap_class(&bytes, &context(MappingTable::new(), &[])).unwrap().bytes);
    assert_eq!(source_file(&class), None);

    let mut mappings = MappingTable::new();
    mappings.insert_class("a$Inner", "com/example/Main$Inner");
    let class = parse(&remap_class(&bytes, &context(mappings, &[&bytes])).unwrap().bytes);
    assert_eq!(source_file(&class).as_deref(), Some("Main.java"));
    assert_eq!(
        class
            .attributes
            .iter()
            .filter(|attr| class.const_pool.utf8(attr.attribute_name_index).unwrap() == "SourceFile")
            .count(),
        1
    );
}

#[test]
fn test_remapping_twice_changes_nothing() {
    let mut b = ClassBuilder::object("a");
    b.field(FieldAccessFlags::PUBLIC, "b", "La;", Vec::new());
    let getter = b.field_ref("a", "b", "La;");
    let mut code = vec![ALOAD_0];
    code.extend(op(GETFIELD, getter));
    code.push(POP);
    code.push(RETURN);
    b.method(MethodAccessFlags::PUBLIC, "c", "()V", Some(code), Vec::new());
    let bytes = b.build();

    let mut mappings = MappingTable::new();
    mappings.insert_class("a", "com/example/Main");
    mappings.insert_field("a", "b", Some("La;"), "value");
    mappings.insert_method("a", "c", "()V", "read");
    let ctx = context(mappings, &[&bytes]);

    let once = remap_class(&bytes, &ctx).unwrap();
    let twice = remap_class(&once.bytes, &ctx).unwrap();
    assert_eq!(twice.bytes, once.bytes);

    let class = parse(&once.bytes);
    assert_eq!(
        member_ref(&class, code_operands(&class, "read")[0]),
        (
            "com/example/Main".to_string(),
            "value".to_string(),
            "Lcom/example/Main;".to_string()
        )
    );
}

#[test]
fn test_method_mapping_follows_inheritance() {
    let mut a = ClassBuilder::object("a");
    a.method(MethodAccessFlags::PUBLIC, "m", "()V", Some(vec![RETURN]), Vec::new());
    let a = a.build();

    let mut b = ClassBuilder::new("b", Some("a"));
    b.method(MethodAccessFlags::PUBLIC, "m", "()V", Some(vec![RETURN]), Vec::new());
    b.method(MethodAccessFlags::PRIVATE, "m", "(I)V", Some(vec![RETURN]), Vec::new());
    let own = b.method_ref("b", "m", "(I)V");
    let mut code = vec![ALOAD_0, ICONST_1];
    code.extend(op(INVOKESPECIAL, own));
    code.push(RETURN);
    b.method(MethodAccessFlags::PUBLIC, "go", "()V", Some(code), Vec::new());
    b.method(MethodAccessFlags::STATIC, "s", "()V", Some(vec![RETURN]), Vec::new());
    let b = b.build();

    let mut c = ClassBuilder::object("c");
    let call = c.method_ref("b", "m", "()V");
    let mut code = vec![ALOAD_0];
    code.extend(op(INVOKEVIRTUAL, call));
    code.push(RETURN);
    c.method(MethodAccessFlags::STATIC, "call", "(Lb;)V", Some(code), Vec::new());
    let setup = c.method_ref("b", "s", "()V");
    let mut code = op(INVOKESTATIC, setup);
    code.push(RETURN);
    c.method(MethodAccessFlags::STATIC, "init", "()V", Some(code), Vec::new());
    let c = c.build();

    let mut mappings = MappingTable::new();
    mappings.insert_method("a", "m", "()V", "run");
    mappings.insert_method("a", "m", "(I)V", "runWith");
    mappings.insert_method("a", "s", "()V", "setup");
    let ctx = context(mappings, &[&a, &b, &c]);

    let b_out = parse(&remap_class(&b, &ctx).unwrap().bytes);
    assert_eq!(
        method_names(&b_out),
        vec![
            ("run".to_string(), "()V".to_string()),
            // private methods only take rules declared on their own class
            ("m".to_string(), "(I)V".to_string()),
            ("go".to_string(), "()V".to_string()),
            ("s".to_string(), "()V".to_string()),
        ]
    );
    // the call inside b resolves to the private declaration, not to a.m
    assert_eq!(
        member_ref(&b_out, code_operands(&b_out, "go")[0]),
        ("b".to_string(), "m".to_string(), "(I)V".to_string())
    );

    let c_out = parse(&remap_class(&c, &ctx).unwrap().bytes);
    assert_eq!(
        member_ref(&c_out, code_operands(&c_out, "call")[0]),
        ("b".to_string(), "run".to_string(), "()V".to_string())
    );
    assert_eq!(
        member_ref(&c_out, code_operands(&c_out, "init")[0]),
        ("b".to_string(), "s".to_string(), "()V".to_string())
    );
}

#[test]
fn test_field_lookup_stops_at_shadowing_declaration() {
    let mut a = ClassBuilder::object("a");
    a.field(FieldAccessFlags::PUBLIC, "f", "I", Vec::new());
    let a = a.build();

    let mut b = ClassBuilder::new("b", Some("a"));
    b.field(FieldAccessFlags::PUBLIC, "f", "I", Vec::new());
    let b = b.build();

    let d = ClassBuilder::new("d", Some("a")).build();

    let mut user = ClassBuilder::object("u");
    let through_b = user.field_ref("b", "f", "I");
    let through_d = user.field_ref("d", "f", "I");
    let mut code = vec![ALOAD_0];
    code.extend(op(GETFIELD, through_b));
    code.push(POP);
    code.push(ALOAD_0);
    code.extend(op(GETFIELD, through_d));
    code.push(POP);
    code.push(RETURN);
    user.method(MethodAccessFlags::PUBLIC, "read", "()V", Some(code), Vec::new());
    let user = user.build();

    let mut mappings = MappingTable::new();
    mappings.insert_field("a", "f", Some("I"), "count");
    let ctx = context(mappings, &[&a, &b, &d, &user]);

    let a_out = parse(&remap_class(&a, &ctx).unwrap().bytes);
    assert_eq!(field_names(&a_out)[0].0, "count");
    let b_out = parse(&remap_class(&b, &ctx).unwrap().bytes);
    assert_eq!(field_names(&b_out)[0].0, "f");

    let out = parse(&remap_class(&user, &ctx).unwrap().bytes);
    let operands = code_operands(&out, "read");
    assert_eq!(member_ref(&out, operands[0]).1, "f");
    assert_eq!(member_ref(&out, operands[1]).1, "count");
}

#[test]
fn test_ambiguous_interface_mapping_picks_first_interface() {
    let mut i1 = ClassBuilder::object("i1");
    i1.abstract_method("m", "()V");
    let i1 = i1.build();
    let mut i2 = ClassBuilder::object("i2");
    i2.abstract_method("m", "()V");
    let i2 = i2.build();

    let mut c = ClassBuilder::object("c");
    c.implements("i1").implements("i2");
    c.method(MethodAccessFlags::PUBLIC, "m", "()V", Some(vec![RETURN]), Vec::new());
    let c = c.build();

    let mut mappings = MappingTable::new();
    mappings.insert_method("i1", "m", "()V", "first");
    mappings.insert_method("i2", "m", "()V", "second");
    let ctx = context(mappings, &[&i1, &i2, &c]);

    let first = remap_class(&c, &ctx).unwrap();
    let again = remap_class(&c, &ctx).unwrap();
    assert_eq!(first, again);

    assert_eq!(method_names(&parse(&first.bytes))[0].0, "first");
    assert_eq!(
        first.warnings,
        vec![MappingWarning::AmbiguousMapping {
            owner: "c".to_string(),
            name: "m".to_string(),
            descriptor: "()V".to_string(),
            chosen: "first".to_string(),
            chosen_from: "i1".to_string(),
            rejected: vec![("i2".to_string(), "second".to_string())],
        }]
    );
}

#[test]
fn test_equal_class_entries_share_one_index() {
    let mut b = ClassBuilder::object("x");
    let old = b.class("a");
    let new = b.class("com/example/Foo");
    let mut code = op(NEW, old);
    code.push(POP);
    code.extend(op(NEW, new));
    code.push(POP);
    code.push(RETURN);
    b.method(MethodAccessFlags::STATIC, "make", "()V", Some(code), Vec::new());
    let bytes = b.build();

    let mut mappings = MappingTable::new();
    mappings.insert_class("a", "com/example/Foo");
    let out = parse(&remap_class(&bytes, &context(mappings, &[&bytes])).unwrap().bytes);

    let operands = code_operands(&out, "make");
    assert_eq!(operands[0], operands[1]);
    assert_eq!(operands[0], old.min(new));
    assert_eq!(
        out.const_pool.class_name(operands[0]).unwrap(),
        "com/example/Foo"
    );
    assert!(!class_entries(&out).iter().any(|name| name == "a"));
}

#[test]
fn test_classes_merged_by_mapping_leave_no_old_names() {
    let mut b = ClassBuilder::object("x");
    let first = b.class("a");
    let second = b.class("b");
    let mut code = op(NEW, first);
    code.push(POP);
    code.extend(op(NEW, second));
    code.push(POP);
    code.push(RETURN);
    b.method(MethodAccessFlags::STATIC, "make", "()V", Some(code), Vec::new());
    let bytes = b.build();

    let mut mappings = MappingTable::new();
    mappings.insert_class("a", "com/example/Foo");
    mappings.insert_class("b", "com/example/Foo");
    let out = parse(&remap_class(&bytes, &context(mappings, &[&bytes])).unwrap().bytes);

    assert_eq!(code_operands(&out, "make"), vec![first, first]);
    assert_eq!(
        class_entries(&out),
        vec!["x", "java/lang/Object", "com/example/Foo", "com/example/Foo"]
    );
}

#[test]
fn test_generic_signatures() {
    let mut b = ClassBuilder::object("x");
    let class_sig = b.utf8("<T:Ljava/lang/Object;>La<TT;>.b;Ljava/lang/Comparable<La$b;>;");
    b.class_attribute(AttributeInfoVariant::Signature(SignatureAttribute {
        signature_index: class_sig,
    }));
    let field_sig = b.utf8("Ljava/util/List<La;>;");
    let field_attr = b.attribute(AttributeInfoVariant::Signature(SignatureAttribute {
        signature_index: field_sig,
    }));
    b.field(FieldAccessFlags::PRIVATE, "items", "Ljava/util/List;", vec![field_attr]);
    let method_sig = b.utf8("<U:La;>(TU;Ljava/util/Map<Ljava/lang/String;+La;>;)V");
    let method_attr = b.attribute(AttributeInfoVariant::Signature(SignatureAttribute {
        signature_index: method_sig,
    }));
    b.method(
        MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT,
        "put",
        "(La;Ljava/util/Map;)V",
        None,
        vec![method_attr],
    );
    let bytes = b.build();

    let mut mappings = MappingTable::new();
    mappings.insert_class("a", "p/Outer");
    mappings.insert_class("a$b", "p/Outer$Inner");
    let out = parse(&remap_class(&bytes, &context(mappings, &[&bytes])).unwrap().bytes);

    let signature_of = |attrs: &[AttributeInfo]| {
        attrs
            .iter()
            .find_map(|attr| match &attr.info_parsed {
                Some(AttributeInfoVariant::Signature(sig)) => Some(sig.signature_index),
                _ => None,
            })
            .map(|index| out.const_pool.utf8(index).unwrap().into_owned())
            .unwrap()
    };
    assert_eq!(
        signature_of(&out.attributes),
        "<T:Ljava/lang/Object;>Lp/Outer<TT;>.Inner;Ljava/lang/Comparable<Lp/Outer$Inner;>;"
    );
    assert_eq!(
        signature_of(&out.fields[0].attributes),
        "Ljava/util/List<Lp/Outer;>;"
    );
    assert_eq!(
        signature_of(&out.methods[0].attributes),
        "<U:Lp/Outer;>(TU;Ljava/util/Map<Ljava/lang/String;+Lp/Outer;>;)V"
    );
    assert_eq!(method_names(&out)[0].1, "(Lp/Outer;Ljava/util/Map;)V");
}

#[test]
fn test_inner_class_names() {
    let mut b = ClassBuilder::object("a$b");
    let inner = b.class("a$b");
    let outer = b.class("a");
    let simple = b.utf8("b");
    b.class_attribute(AttributeInfoVariant::InnerClasses(InnerClassesAttribute {
        classes: vec![InnerClassInfo {
            inner_class_info_index: inner,
            outer_class_info_index: outer,
            inner_name_index: simple,
            inner_class_access_flags: 0x0009,
        }],
    }));
    let source = b.utf8("a.java");
    b.class_attribute(AttributeInfoVariant::SourceFile(SourceFileAttribute {
        sourcefile_index: source,
    }));
    let bytes = b.build();

    let mut mappings = MappingTable::new();
    mappings.insert_class("a", "p/Outer");
    mappings.insert_class("a$b", "p/Outer$Inner");
    let out = parse(&remap_class(&bytes, &context(mappings, &[&bytes])).unwrap().bytes);

    let entry = out
        .find_attribute(|attr| match attr {
            AttributeInfoVariant::InnerClasses(inner) => Some(&inner.classes[0]),
            _ => None,
        })
        .unwrap();
    let pool = &out.const_pool;
    assert_eq!(pool.class_name(entry.inner_class_info_index).unwrap(), "p/Outer$Inner");
    assert_eq!(pool.class_name(entry.outer_class_info_index).unwrap(), "p/Outer");
    assert_eq!(pool.utf8(entry.inner_name_index).unwrap(), "Inner");
    assert_eq!(source_file(&out).as_deref(), Some("Outer.java"));
}

#[test]
fn test_inner_class_inferred_from_outer() {
    let bytes = ClassBuilder::object("a$1").build();
    let mut mappings = MappingTable::new();
    mappings.insert_class("a", "p/Outer");
    let out = remap_class(&bytes, &context(mappings.clone(), &[&bytes])).unwrap();
    assert_eq!(out.mapped_name, "p/Outer$1");

    let ctx = RemapContext::builder(mappings)
        .options(RemapOptions {
            infer_inner_classes: false,
            ..Default::default()
        })
        .build(&[]);
    assert_eq!(remap_class(&bytes, &ctx).unwrap().mapped_name, "a$1");
}

const METAFACTORY_DESCRIPTOR: &str = "(Ljava/lang/invoke/MethodHandles$Lookup;Ljava/lang/String;\
Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodHandle;\
Ljava/lang/invoke/MethodType;)Ljava/lang/invoke/CallSite;";

#[test]
fn test_lambda_call_site_follows_interface_method() {
    let mut b = ClassBuilder::object("x");
    let factory = b.method_ref(
        "java/lang/invoke/LambdaMetafactory",
        "metafactory",
        METAFACTORY_DESCRIPTOR,
    );
    let factory = b.method_handle(REF_INVOKE_STATIC, factory);
    let sam = b.method_type("(Ljava/lang/Object;)V");
    let body = b.method_ref("x", "lambda$run$0", "(Ljava/lang/Object;)V");
    let body = b.method_handle(REF_INVOKE_STATIC, body);
    let bootstrap = b.bootstrap(factory, vec![sam, body, sam]);
    let lambda = b.invoke_dynamic(bootstrap, "a", "()Li;");

    let concat = b.method_ref(
        "java/lang/invoke/StringConcatFactory",
        "makeConcatWithConstants",
        METAFACTORY_DESCRIPTOR,
    );
    let concat = b.method_handle(REF_INVOKE_STATIC, concat);
    let recipe = b.string("\u{1}!");
    let concat_bootstrap = b.bootstrap(concat, vec![recipe]);
    let concat_site = b.invoke_dynamic(concat_bootstrap, "a", "(Li;)Ljava/lang/String;");

    let mut code = Vec::new();
    for site in [lambda, concat_site] {
        code.extend(op(common::INVOKEDYNAMIC, site));
        code.extend([0, 0, POP]);
    }
    code.push(RETURN);
    b.method(MethodAccessFlags::STATIC, "run", "()V", Some(code), Vec::new());
    let bytes = b.build();

    let mut mappings = MappingTable::new();
    mappings.insert_class("i", "p/Consumer");
    mappings.insert_method("i", "a", "(Ljava/lang/Object;)V", "accept");
    let out = parse(&remap_class(&bytes, &context(mappings, &[&bytes])).unwrap().bytes);

    let call_site = |index: u16| match out.const_pool.resolve(index).unwrap() {
        ConstantInfo::InvokeDynamic(indy) => {
            let (name, descriptor) = out.const_pool.name_and_type(indy.name_and_type_index).unwrap();
            (name.into_owned(), descriptor.into_owned())
        }
        other => panic!("expected InvokeDynamic, found {other:?}"),
    };
    let operands = code_operands(&out, "run");
    assert_eq!(
        call_site(operands[0]),
        ("accept".to_string(), "()Lp/Consumer;".to_string())
    );
    assert_eq!(
        call_site(operands[1]),
        ("a".to_string(), "(Lp/Consumer;)Ljava/lang/String;".to_string())
    );
}

#[test]
fn test_annotations_rename_types_elements_and_constants() {
    let mut b = ClassBuilder::object("x");
    let type_index = b.utf8("La;");
    let value_name = b.utf8("b");
    let text = b.utf8("a");
    let kind_name = b.utf8("c");
    let enum_type = b.utf8("Le;");
    let enum_const = b.utf8("d");
    let literal_name = b.utf8("k");
    b.class_attribute(AttributeInfoVariant::RuntimeVisibleAnnotations(
        RuntimeAnnotationsAttribute {
            annotations: vec![RuntimeAnnotation {
                type_index,
                element_value_pairs: vec![
                    ElementValuePair {
                        element_name_index: value_name,
                        value: ElementValue::String {
                            const_value_index: text,
                        },
                    },
                    ElementValuePair {
                        element_name_index: kind_name,
                        value: ElementValue::Enum(EnumConstValue {
                            type_name_index: enum_type,
                            const_name_index: enum_const,
                        }),
                    },
                    ElementValuePair {
                        element_name_index: literal_name,
                        value: ElementValue::Array(ElementArrayValue {
                            values: vec![ElementValue::Class {
                                class_info_index: type_index,
                            }],
                        }),
                    },
                ],
            }],
        },
    ));
    let bytes = b.build();

    let mut mappings = MappingTable::new();
    mappings.insert_class("a", "p/Ann");
    mappings.insert_class("e", "p/Kind");
    mappings.insert_method("a", "b", "()Ljava/lang/String;", "value");
    mappings.insert_method("a", "k", "()[Ljava/lang/Class;", "types");
    mappings.insert_field("e", "d", Some("Le;"), "ON");
    let out = parse(&remap_class(&bytes, &context(mappings, &[&bytes])).unwrap().bytes);

    let pool = &out.const_pool;
    let text_of = |index: u16| pool.utf8(index).unwrap().into_owned();
    let annotation = out
        .find_attribute(|attr| match attr {
            AttributeInfoVariant::RuntimeVisibleAnnotations(a) => Some(&a.annotations[0]),
            _ => None,
        })
        .unwrap();
    assert_eq!(text_of(annotation.type_index), "Lp/Ann;");

    let pairs = &annotation.element_value_pairs;
    assert_eq!(text_of(pairs[0].element_name_index), "value");
    let ElementValue::String { const_value_index } = pairs[0].value else {
        panic!("string element changed kind");
    };
    assert_eq!(text_of(const_value_index), "a");

    assert_eq!(text_of(pairs[1].element_name_index), "c");
    let ElementValue::Enum(constant) = &pairs[1].value else {
        panic!("enum element changed kind");
    };
    assert_eq!(text_of(constant.type_name_index), "Lp/Kind;");
    assert_eq!(text_of(constant.const_name_index), "ON");

    assert_eq!(text_of(pairs[2].element_name_index), "types");
    let ElementValue::Array(array) = &pairs[2].value else {
        panic!("array element changed kind");
    };
    let ElementValue::Class { class_info_index } = array.values[0] else {
        panic!("class element changed kind");
    };
    assert_eq!(text_of(class_info_index), "Lp/Ann;");
}

#[test]
fn test_malformed_input_is_rejected() {
    let bytes = ClassBuilder::object("a").build();
    let ctx = RemapContext::default();

    let truncated = remap_class(&bytes[..bytes.len() - 3], &ctx).unwrap_err();
    assert_eq!(truncated.kind(), "MalformedClassFile");

    let mut trailing = bytes.clone();
    trailing.push(0);
    assert_eq!(remap_class(&trailing, &ctx).unwrap_err().kind(), "MalformedClassFile");

    let mut bad_magic = bytes.clone();
    bad_magic[0] = 0xcb;
    assert_eq!(remap_class(&bad_magic, &ctx).unwrap_err().kind(), "MalformedClassFile");

    let mut undefined_opcode = ClassBuilder::object("a");
    undefined_opcode.method(MethodAccessFlags::STATIC, "m", "()V", Some(vec![0xcb]), Vec::new());
    let err = remap_class(&undefined_opcode.build(), &ctx).unwrap_err();
    assert_eq!(err.kind(), "MalformedClassFile");
}

#[test]
fn test_bad_operand_reports_code_location() {
    let mut b = ClassBuilder::object("a");
    let mut code = vec![ALOAD_0];
    code.extend(op(INVOKEVIRTUAL, 200));
    code.push(RETURN);
    b.method(MethodAccessFlags::PUBLIC, "run", "()V", Some(code), Vec::new());
    let err = remap_class(&b.build(), &RemapContext::default()).unwrap_err();
    assert_eq!(
        err,
        RemapError::InvalidPoolIndex {
            index: 200,
            location: Location::Code {
                method: "run ()V".to_string(),
                offset: 1,
            },
        }
    );
}

#[test]
fn test_bad_descriptor_reports_field() {
    let mut b = ClassBuilder::object("a");
    b.field(FieldAccessFlags::PRIVATE, "f", "Lbroken", Vec::new());
    let err = remap_class(&b.build(), &RemapContext::default()).unwrap_err();
    assert_eq!(err.kind(), "UnresolvableDescriptor");
    assert_eq!(
        err.location(),
        Some(&Location::Field {
            name: "f".to_string(),
            descriptor: "Lbroken".to_string(),
        })
    );
}
