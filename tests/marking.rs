//! Integration tests for the mark step.
//!
//! Each test builds a small program with the model builder, selects roots and checks the
//! resulting marks the way a sweep stage would read them.

use dotlink::{
    linker::SpecialMembers,
    metadata::{
        generics::GenericParamAttributes, marshalling::MarshalSpec, method::Parameter,
        typesystem::TypeAttributes,
    },
    prelude::*,
};

/// Marks from `roots` with default options and returns the session's annotations
fn mark(model: &MetadataModel, roots: &[Token]) -> Result<Annotations> {
    let mut context = LinkContext::new(model);
    for root in roots {
        context.annotations_mut().mark_root(*root);
    }
    context.mark()?;
    Ok(context.into_annotations())
}

/// A non-virtual call keeps the callee, but not its uncalled sibling.
#[test]
fn test_direct_call_keeps_only_callee() -> Result<()> {
    // class Program { static void Main() { Foo(); } static void Foo() {} static void Bar() {} }
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let foo = builder.method(program, "Foo").static_().body(|b| b.ret()).build();
    let bar = builder.method(program, "Bar").static_().body(|b| b.ret()).build();
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.call(foo).ret())
        .build();
    let model = builder.finish();

    let annotations = mark(&model, &[main])?;

    assert!(annotations.is_processed(main));
    assert!(annotations.is_processed(foo));
    assert!(annotations.is_marked(program));
    assert!(annotations.is_marked(corlib.object_type));
    assert!(annotations.is_marked(app));
    assert!(!annotations.is_marked(bar));
    assert_eq!(annotations.reason_chain(foo), vec![foo, main]);
    Ok(())
}

/// An override is kept only once its declaring type is instantiated somewhere.
#[test]
fn test_override_follows_instantiation() -> Result<()> {
    // abstract class Base { public virtual void V() {} }
    // class Derived : Base { public override void V() {} }
    // static Base Create() => null;
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let base = builder.class(app, "App", "Base").extends(corlib.object()).build();
    let base_v = builder
        .method(base, "V")
        .virtual_()
        .newslot()
        .body(|b| b.ret())
        .build();
    let derived = builder.class(app, "App", "Derived").extends(base.into()).build();
    let derived_ctor = builder.constructor(derived).build();
    let derived_v = builder.method(derived, "V").virtual_().body(|b| b.ret()).build();

    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let create = builder
        .method(program, "Create")
        .static_()
        .returns(base.into())
        .body(|b| b.ldnull().ret())
        .build();
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.call(create).callvirt(base_v).ret())
        .build();
    let make_derived = builder
        .method(program, "MakeDerived")
        .static_()
        .body(|b| b.newobj(derived_ctor).pop().ret())
        .build();
    let model = builder.finish();

    let annotations = mark(&model, &[main])?;
    assert!(annotations.is_processed(base_v));
    assert!(!annotations.is_marked(derived));
    assert!(!annotations.is_marked(derived_v));

    // `new Derived()` elsewhere makes the override reachable through the base call
    let annotations = mark(&model, &[main, make_derived])?;
    assert!(annotations.is_marked(derived));
    assert!(annotations.is_processed(derived_v));
    assert_eq!(annotations.marked_by(derived_v), Some(MarkedBy::Node(base_v)));
    Ok(())
}

/// The override is found even when the type is instantiated after the virtual call was seen.
#[test]
fn test_override_of_later_type() -> Result<()> {
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let base = builder.class(app, "App", "Base").extends(corlib.object()).build();
    let base_v = builder
        .method(base, "V")
        .virtual_()
        .newslot()
        .body(|b| b.ret())
        .build();
    let derived = builder.class(app, "App", "Derived").extends(base.into()).build();
    let derived_ctor = builder.constructor(derived).build();
    let derived_v = builder.method(derived, "V").virtual_().body(|b| b.ret()).build();

    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let late = builder
        .method(program, "Late")
        .static_()
        .body(|b| b.newobj(derived_ctor).pop().ret())
        .build();
    let middle = builder
        .method(program, "Middle")
        .static_()
        .body(|b| b.call(late).ret())
        .build();
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.ldnull().callvirt(base_v).call(middle).ret())
        .build();
    let model = builder.finish();

    let annotations = mark(&model, &[main])?;
    assert!(annotations.is_processed(derived_v));
    Ok(())
}

/// Instantiating `Box<Widget>` where `T : new()` keeps `Widget()`.
#[test]
fn test_constructor_constraint_keeps_default_constructor() -> Result<()> {
    // class Box<T> where T : new() {}
    // class Widget { public Widget() {} public Widget(int size) {} }
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let boxed = builder
        .class(app, "App", "Box`1")
        .generic_param_with(
            "T",
            GenericParamAttributes::DEFAULT_CONSTRUCTOR_CONSTRAINT,
            Vec::new(),
        )
        .extends(corlib.object())
        .build();
    let widget = builder.class(app, "App", "Widget").extends(corlib.object()).build();
    let widget_ctor = builder.constructor(widget).build();
    let sized_ctor = builder
        .constructor(widget)
        .param("size", CilPrimitiveKind::I4.into())
        .build();

    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let box_of_widget = TypeReference::generic_instance(boxed.into(), vec![widget.into()]);
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.local(box_of_widget).ret())
        .build();
    let model = builder.finish();

    let annotations = mark(&model, &[main])?;
    assert!(annotations.is_marked(boxed));
    assert!(annotations.is_marked(widget));
    assert!(annotations.is_processed(widget_ctor));
    assert!(!annotations.is_marked(sized_ctor));

    let param = model.type_def(boxed).map(|ty| ty.generic_params[0]);
    assert!(param.is_some_and(|param| annotations.is_marked(param)));
    Ok(())
}

/// `[XmlSchemaProvider("GetSchema")]` keeps the named static method.
#[test]
fn test_schema_provider_keeps_named_method() -> Result<()> {
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();

    let xml = builder.assembly("System.Xml");
    let provider = builder
        .class(xml, "System.Xml.Serialization", "XmlSchemaProviderAttribute")
        .extends(corlib.attribute())
        .build();
    let provider_ctor = builder
        .constructor(provider)
        .param("methodName", corlib.string())
        .build();

    let app = builder.assembly("App");
    let attribute = AttributeBuilder::new(provider_ctor)
        .arg(CustomAttributeArgument::String("GetSchema".into()))
        .build(builder.model())?;
    let schema = builder
        .class(app, "App", "Schema")
        .extends(corlib.object())
        .attribute(attribute)
        .build();
    let schema_ctor = builder.constructor(schema).build();
    let get_schema = builder
        .method(schema, "GetSchema")
        .static_()
        .body(|b| b.ret())
        .build();
    let other = builder.method(schema, "Other").static_().body(|b| b.ret()).build();

    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.newobj(schema_ctor).pop().ret())
        .build();
    let model = builder.finish();

    let annotations = mark(&model, &[main])?;
    assert!(annotations.is_processed(provider_ctor));
    assert!(annotations.is_processed(get_schema));
    assert!(!annotations.is_marked(other));

    // Without the registry entry nothing names the method
    let mut context = LinkContext::new(&model);
    *context.special_attributes_mut() = dotlink::linker::SpecialAttributeRegistry::empty();
    context.annotations_mut().mark_root(main);
    context.mark()?;
    assert!(!context.annotations().is_marked(get_schema));
    Ok(())
}

/// Registered conventions apply to method attributes on the declaring type's members.
#[test]
fn test_registered_special_attribute_on_method() -> Result<()> {
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let factory = builder
        .class(app, "App", "FactoryAttribute")
        .extends(corlib.attribute())
        .build();
    let factory_ctor = builder
        .constructor(factory)
        .param("member", corlib.string())
        .build();

    let service = builder.class(app, "App", "Service").extends(corlib.object()).build();
    let cache = builder.field(service, "cache", corlib.object()).private().build();
    let attribute = AttributeBuilder::new(factory_ctor)
        .arg(CustomAttributeArgument::String("cache".into()))
        .build(builder.model())?;
    let run = builder
        .method(service, "Run")
        .static_()
        .attribute(attribute)
        .body(|b| b.ret())
        .build();
    let model = builder.finish();

    let mut context = LinkContext::new(&model);
    context
        .special_attributes_mut()
        .register("App.FactoryAttribute", SpecialMembers::FIELD);
    context.annotations_mut().mark_root(run);
    context.mark()?;

    assert!(context.annotations().is_marked(cache));
    Ok(())
}

/// Two types holding each other terminate with both marked once.
#[test]
fn test_cyclic_fields_terminate() -> Result<()> {
    // struct A { B b; } struct B { A a; }
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let a = builder
        .class(app, "App", "A")
        .flags(TypeAttributes::SEALED)
        .extends(corlib.value_type())
        .build();
    let b = builder
        .class(app, "App", "B")
        .flags(TypeAttributes::SEALED)
        .extends(corlib.value_type())
        .build();
    let a_b = builder.field(a, "b", b.into()).build();
    let b_a = builder.field(b, "a", a.into()).build();

    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|body| body.local(a.into()).ret())
        .build();
    let model = builder.finish();

    let mut context = LinkContext::new(&model);
    context.annotations_mut().mark_root(main);
    let stats = context.mark()?;

    let annotations = context.annotations();
    assert!(annotations.is_marked(a));
    assert!(annotations.is_marked(b));
    assert!(annotations.is_marked(a_b));
    assert!(annotations.is_marked(b_a));
    assert_eq!(stats.fields_expanded, 2);
    Ok(())
}

/// Marking twice yields the same marked set; adding roots only adds marks.
#[test]
fn test_idempotent_and_monotonic() -> Result<()> {
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let base = builder.class(app, "App", "Base").extends(corlib.object()).build();
    let base_v = builder
        .method(base, "V")
        .virtual_()
        .newslot()
        .body(|b| b.ret())
        .build();
    let derived = builder.class(app, "App", "Derived").extends(base.into()).build();
    let derived_ctor = builder.constructor(derived).build();
    let derived_v = builder.method(derived, "V").virtual_().body(|b| b.ret()).build();

    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let log = builder
        .method(program, "Log")
        .static_()
        .param("message", corlib.string())
        .body(|b| b.ret())
        .build();
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.ldstr("hello").call(log).ldnull().callvirt(base_v).ret())
        .build();
    let make_derived = builder
        .method(program, "MakeDerived")
        .static_()
        .body(|b| b.newobj(derived_ctor).pop().ret())
        .build();
    let tool = builder.class(app, "App", "Tool").extends(corlib.object()).build();
    let tool_run = builder
        .method(tool, "Run")
        .static_()
        .body(|b| b.ldnull().pop().ret())
        .build();
    let model = builder.finish();

    let mut context = LinkContext::new(&model);
    context.annotations_mut().mark_root(main);
    context.mark()?;
    let first = context.annotations().marked();
    assert!(!first.contains(&derived_v));
    context.mark()?;
    assert_eq!(context.annotations().marked(), first);

    let wider = mark(&model, &[main, tool_run])?.marked();
    assert!(first.iter().all(|node| wider.contains(node)));
    assert!(wider.contains(&tool));

    // A root added to the same session still sees the virtual call from the first run
    context.annotations_mut().mark_root(make_derived);
    context.mark()?;
    let annotations = context.annotations();
    assert!(first.iter().all(|node| annotations.is_marked(*node)));
    assert!(annotations.is_marked(derived));
    assert!(annotations.is_processed(derived_v));
    assert_eq!(annotations.marked_by(derived_v), Some(MarkedBy::Node(base_v)));
    Ok(())
}

/// An empty root set is a configuration error.
#[test]
fn test_no_roots() {
    let mut builder = ModelBuilder::new();
    builder.corlib();
    let model = builder.finish();

    let result = LinkContext::new(&model).mark();
    assert!(matches!(result, Err(Error::ConfigurationError(_))));
}

/// A reference into an assembly that is not loaded aborts marking.
#[test]
fn test_dangling_reference() {
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.local(TypeReference::external("Missing", "Missing.Thing")).ret())
        .build();
    let model = builder.finish();

    let result = mark(&model, &[main]);
    assert!(matches!(result, Err(Error::ResolutionFailure(_))));
}

/// A damaged attribute blob is skipped; the constructor is still kept.
#[test]
fn test_malformed_attribute_is_skipped() -> Result<()> {
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let tag = builder
        .class(app, "App", "TagAttribute")
        .extends(corlib.attribute())
        .build();
    let tag_ctor = builder.constructor(tag).build();
    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let helper = builder.method(program, "Helper").static_().body(|b| b.ret()).build();
    let main = builder
        .method(program, "Main")
        .static_()
        .attribute(CustomAttribute::raw(tag_ctor, vec![0xFF, 0xFF]))
        .body(|b| b.call(helper).ret())
        .build();
    let model = builder.finish();

    let mut context = LinkContext::new(&model);
    context.annotations_mut().mark_root(main);
    let stats = context.mark()?;

    assert_eq!(stats.attributes_skipped, 1);
    assert!(context.annotations().is_marked(tag_ctor));
    assert!(context.annotations().is_processed(helper));
    Ok(())
}

/// Type-valued arguments and named members of an attribute are kept.
#[test]
fn test_attribute_arguments() -> Result<()> {
    // [Converter(typeof(WidgetConverter), Level = 3, Tag = "x")] class Widget {}
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let converter_attr = builder
        .class(app, "App", "ConverterAttribute")
        .extends(corlib.attribute())
        .build();
    let converter_ctor = builder
        .constructor(converter_attr)
        .param("type", corlib.type_())
        .build();
    let level_getter = builder
        .method(converter_attr, "get_Level")
        .returns(CilPrimitiveKind::I4.into())
        .body(|b| b.ldc_i4(0).ret())
        .build();
    let level_setter = builder
        .method(converter_attr, "set_Level")
        .param("value", CilPrimitiveKind::I4.into())
        .body(|b| b.ret())
        .build();
    builder
        .property(converter_attr, "Level", CilPrimitiveKind::I4.into())
        .getter(level_getter)
        .setter(level_setter)
        .build();
    let tag_field = builder.field(converter_attr, "Tag", corlib.string()).build();

    let widget_converter = builder
        .class(app, "App", "WidgetConverter")
        .extends(corlib.object())
        .build();
    let unrelated = builder.class(app, "App", "Unrelated").extends(corlib.object()).build();

    let attribute = AttributeBuilder::new(converter_ctor)
        .arg(CustomAttributeArgument::Type("App.WidgetConverter".into()))
        .property("Level", ArgumentKind::I4, CustomAttributeArgument::I4(3))
        .field("Tag", ArgumentKind::String, CustomAttributeArgument::String("x".into()))
        .build(builder.model())?;
    let widget = builder
        .class(app, "App", "Widget")
        .extends(corlib.object())
        .attribute(attribute)
        .build();
    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.local(widget.into()).ret())
        .build();
    let model = builder.finish();

    let annotations = mark(&model, &[main])?;
    assert!(annotations.is_processed(converter_ctor));
    assert!(annotations.is_marked(widget_converter));
    assert!(annotations.is_processed(level_setter));
    assert!(!annotations.is_marked(level_getter));
    assert!(annotations.is_marked(tag_field));
    assert!(!annotations.is_marked(unrelated));

    // Without following type arguments the converter is only kept by name
    let mut context = LinkContext::with_options(&model, MarkOptions::minimal());
    context.annotations_mut().mark_root(main);
    context.mark()?;
    assert!(!context.annotations().is_marked(widget_converter));
    Ok(())
}

/// Preserve policies keep members nothing references.
#[test]
fn test_preserve_policies() -> Result<()> {
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let dto = builder.class(app, "App", "Dto").extends(corlib.object()).build();
    let dto_name = builder.field(dto, "name", corlib.string()).build();
    let dto_print = builder.method(dto, "Print").body(|b| b.ret()).build();
    let service = builder.class(app, "App", "Service").extends(corlib.object()).build();
    let service_state = builder.field(service, "state", corlib.object()).build();
    let service_start = builder.method(service, "Start").body(|b| b.ret()).build();
    let service_stop = builder.method(service, "Stop").body(|b| b.ret()).build();
    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.local(dto.into()).local(service.into()).ret())
        .build();
    let model = builder.finish();

    let mut context = LinkContext::new(&model);
    let annotations = context.annotations_mut();
    annotations.mark_root(main);
    annotations.set_preserve(dto, TypePreserve::Fields);
    annotations.set_preserve(service, TypePreserve::Methods);
    annotations.add_preserved_method(dto, dto_print);
    context.mark()?;

    let annotations = context.annotations();
    assert!(annotations.is_marked(dto_name));
    assert!(annotations.is_processed(dto_print));
    assert!(annotations.is_processed(service_start));
    assert!(annotations.is_processed(service_stop));
    assert!(!annotations.is_marked(service_state));
    Ok(())
}

/// A marked type keeps its static constructor unless disabled.
#[test]
fn test_static_constructor() -> Result<()> {
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let config = builder.class(app, "App", "Config").extends(corlib.object()).build();
    let instance = builder
        .field(config, "Instance", config.into())
        .static_()
        .build();
    let cctor = builder.static_constructor(config).build();
    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.ldsfld(instance).pop().ret())
        .build();
    let model = builder.finish();

    let annotations = mark(&model, &[main])?;
    assert!(annotations.is_marked(instance));
    assert!(annotations.is_processed(cctor));

    let options = MarkOptions::new().with_static_constructors(false);
    let mut context = LinkContext::with_options(&model, options);
    context.annotations_mut().mark_root(main);
    context.mark()?;
    assert!(context.annotations().is_marked(config));
    assert!(!context.annotations().is_marked(cctor));
    Ok(())
}

/// Using one accessor of an event keeps the event and all of its accessors.
#[test]
fn test_event_accessors() -> Result<()> {
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let button = builder.class(app, "App", "Button").extends(corlib.object()).build();
    let add = builder
        .method(button, "add_Click")
        .param("value", corlib.multicast_delegate())
        .body(|b| b.ret())
        .build();
    let remove = builder
        .method(button, "remove_Click")
        .param("value", corlib.multicast_delegate())
        .body(|b| b.ret())
        .build();
    let click = builder
        .event(button, "Click", corlib.multicast_delegate())
        .add(add)
        .remove(remove)
        .build();
    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.ldnull().ldnull().callvirt(add).ret())
        .build();
    let model = builder.finish();

    let annotations = mark(&model, &[main])?;
    assert!(annotations.is_marked(click));
    assert!(annotations.is_processed(remove));
    Ok(())
}

/// Overrides of methods declared in an assembly that is copied as-is stay, since that
/// assembly may call them.
#[test]
fn test_unlinked_base_overrides() -> Result<()> {
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let lib = builder.assembly("Lib");
    let plugin = builder
        .type_def(lib, "Lib", "Plugin", TypeAttributes::PUBLIC | TypeAttributes::ABSTRACT)
        .extends(corlib.object())
        .build();
    let plugin_execute = builder.method(plugin, "Execute").abstract_().newslot().build();

    let app = builder.assembly("App");
    let mine = builder.class(app, "App", "MyPlugin").extends(plugin.into()).build();
    let mine_ctor = builder.constructor(mine).build();
    let mine_execute = builder.method(mine, "Execute").virtual_().body(|b| b.ret()).build();
    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.newobj(mine_ctor).pop().ret())
        .build();
    let model = builder.finish();

    let annotations = mark(&model, &[main])?;
    assert!(!annotations.is_marked(mine_execute));

    let mut context = LinkContext::new(&model);
    context
        .annotations_mut()
        .set_assembly_action(lib, LinkAction::Copy);
    context.annotations_mut().mark_root(main);
    context.mark()?;
    assert!(context.annotations().is_processed(mine_execute));
    assert!(context.annotations().is_marked(plugin_execute));

    let options = MarkOptions::new().with_unlinked_overrides(false);
    let mut context = LinkContext::with_options(&model, options);
    context
        .annotations_mut()
        .set_assembly_action(lib, LinkAction::Copy);
    context.annotations_mut().mark_root(main);
    context.mark()?;
    assert!(!context.annotations().is_marked(mine_execute));
    Ok(())
}

/// Bodies of methods in copied assemblies are not scanned.
#[test]
fn test_copied_assembly_bodies_are_not_parsed() -> Result<()> {
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let callee = builder.method(program, "Callee").static_().body(|b| b.ret()).build();
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.call(callee).ret())
        .build();
    let model = builder.finish();

    let mut context = LinkContext::new(&model);
    context.annotations_mut().set_assembly_action(app, LinkAction::Copy);
    context.annotations_mut().mark_root(main);
    context.mark()?;
    assert!(!context.annotations().is_marked(callee));

    let mut context = LinkContext::new(&model);
    context.annotations_mut().set_assembly_action(app, LinkAction::Copy);
    context.annotations_mut().mark_root(main);
    context
        .annotations_mut()
        .set_method_action(main, MethodAction::ForceParse);
    context.mark()?;
    assert!(context.annotations().is_marked(callee));
    Ok(())
}

/// Serializable types keep their default and deserialization constructors.
#[test]
fn test_serializable_constructors() -> Result<()> {
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let state = builder
        .class(app, "App", "State")
        .flags(TypeAttributes::SERIALIZABLE)
        .extends(corlib.object())
        .build();
    let default_ctor = builder.constructor(state).build();
    let serialization_ctor = builder
        .constructor(state)
        .family()
        .param("info", corlib.serialization_info())
        .param("context", corlib.streaming_context())
        .build();
    let other_ctor = builder
        .constructor(state)
        .param("id", CilPrimitiveKind::I4.into())
        .build();
    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.local(state.into()).ret())
        .build();
    let model = builder.finish();

    let annotations = mark(&model, &[main])?;
    assert!(annotations.is_processed(default_ctor));
    assert!(annotations.is_processed(serialization_ctor));
    assert!(!annotations.is_marked(other_ctor));
    Ok(())
}

/// Methods called on arrays have no definition and are skipped.
#[test]
fn test_array_methods_are_skipped() -> Result<()> {
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let item = builder.class(app, "App", "Item").extends(corlib.object()).build();
    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let array = TypeReference::sz_array(item.into());
    let get = MethodReference::Member {
        declaring_type: array.clone(),
        name: "Get".into(),
        signature: dotlink::metadata::method::MethodSignature {
            has_this: true,
            return_type: item.into(),
            params: vec![CilPrimitiveKind::I4.into()],
            generic_param_count: 0,
        },
    };
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.local(array).ldloc(0).ldc_i4(0).call(get).pop().ret())
        .build();
    let model = builder.finish();

    let annotations = mark(&model, &[main])?;
    assert!(annotations.is_marked(item));
    Ok(())
}

/// A delegate type keeps its constructor and all invoke methods once it is referenced.
#[test]
fn test_delegate_keeps_all_methods() -> Result<()> {
    // delegate void Callback(); Callback handler = null;
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let callback = builder
        .class(app, "App", "Callback")
        .flags(TypeAttributes::SEALED)
        .extends(corlib.multicast_delegate())
        .build();
    let callback_ctor = builder
        .constructor(callback)
        .param("target", corlib.object())
        .param("method", CilPrimitiveKind::I.into())
        .no_body()
        .build();
    let invoke = builder.method(callback, "Invoke").virtual_().no_body().build();
    let begin_invoke = builder
        .method(callback, "BeginInvoke")
        .virtual_()
        .no_body()
        .build();

    let plain = builder.class(app, "App", "Plain").extends(corlib.object()).build();
    let plain_unused = builder.method(plain, "Unused").body(|b| b.ret()).build();

    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.local(callback.into()).local(plain.into()).ret())
        .build();
    let model = builder.finish();

    let annotations = mark(&model, &[main])?;

    assert!(annotations.is_marked(callback));
    assert!(annotations.is_marked(corlib.multicast_delegate_type));
    assert!(annotations.is_processed(callback_ctor));
    assert!(annotations.is_processed(invoke));
    assert!(annotations.is_processed(begin_invoke));

    assert!(annotations.is_marked(plain));
    assert!(!annotations.is_marked(plain_unused));
    Ok(())
}

/// Custom marshalers named by parameter, return value and field descriptors are kept.
#[test]
fn test_custom_marshaler_types() -> Result<()> {
    // [return: MarshalAs(UnmanagedType.CustomMarshaler, MarshalTypeRef = typeof(ReturnMarshaler))]
    // static extern object Native([MarshalAs(..., typeof(ParamMarshaler))] object handle, ...);
    // [MarshalAs(..., typeof(FieldMarshaler))] static object Handle;
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let param_marshaler = builder
        .class(app, "App", "ParamMarshaler")
        .extends(corlib.object())
        .build();
    let return_marshaler = builder
        .class(app, "App", "ReturnMarshaler")
        .extends(corlib.object())
        .build();
    let field_marshaler = builder
        .class(app, "App", "FieldMarshaler")
        .extends(corlib.object())
        .build();
    let unused_marshaler = builder
        .class(app, "App", "UnusedMarshaler")
        .extends(corlib.object())
        .build();

    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let native = builder
        .method(program, "Native")
        .static_()
        .param_with(Parameter {
            marshal: Some(MarshalSpec::custom_marshaler("App.ParamMarshaler")),
            ..Parameter::new("handle", corlib.object())
        })
        .param_with(Parameter {
            marshal: Some(MarshalSpec::custom_marshaler("Missing.Marshaler, Missing")),
            ..Parameter::new("other", corlib.object())
        })
        .returns(corlib.object())
        .return_marshal(MarshalSpec::custom_marshaler("App.ReturnMarshaler"))
        .no_body()
        .build();
    let handle = builder
        .field(program, "Handle", corlib.object())
        .static_()
        .marshal(MarshalSpec::custom_marshaler("App.FieldMarshaler"))
        .build();
    let unused = builder
        .field(program, "Unused", corlib.object())
        .static_()
        .marshal(MarshalSpec::custom_marshaler("App.UnusedMarshaler"))
        .build();
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.ldnull().ldnull().call(native).stsfld(handle).ret())
        .build();
    let model = builder.finish();

    let mut context = LinkContext::new(&model);
    context.annotations_mut().mark_root(main);
    let stats = context.mark()?;
    let annotations = context.annotations();

    assert!(annotations.is_marked(param_marshaler));
    assert!(annotations.is_marked(return_marshaler));
    assert!(annotations.is_marked(field_marshaler));
    assert!(!annotations.is_marked(unused));
    assert!(!annotations.is_marked(unused_marshaler));
    assert_eq!(stats.type_names_skipped, 1);
    Ok(())
}

/// An interface call keeps the implementation of every instantiated implementer only.
#[test]
fn test_interface_dispatch() -> Result<()> {
    // interface IGreeter { void Greet(); }
    // class English : IGreeter { public void Greet() {} }
    // class French : IGreeter { public void Greet() {} }
    // IGreeter greeter = new English(); greeter.Greet();
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let greeter = builder.interface(app, "App", "IGreeter").build();
    let greet = builder.method(greeter, "Greet").abstract_().newslot().build();

    let english = builder
        .class(app, "App", "English")
        .extends(corlib.object())
        .implements(greeter.into())
        .build();
    let english_ctor = builder.constructor(english).build();
    let english_greet = builder
        .method(english, "Greet")
        .virtual_()
        .newslot()
        .body(|b| b.ret())
        .build();
    let french = builder
        .class(app, "App", "French")
        .extends(corlib.object())
        .implements(greeter.into())
        .build();
    let french_greet = builder
        .method(french, "Greet")
        .virtual_()
        .newslot()
        .body(|b| b.ret())
        .build();

    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.newobj(english_ctor).callvirt(greet).ret())
        .build();
    let model = builder.finish();

    let annotations = mark(&model, &[main])?;

    assert!(annotations.is_processed(greet));
    assert!(annotations.is_processed(english_greet));
    assert_eq!(annotations.marked_by(english_greet), Some(MarkedBy::Node(greet)));
    assert!(!annotations.is_marked(french));
    assert!(!annotations.is_marked(french_greet));
    Ok(())
}

/// A virtual method inherited from a base class implements an interface slot of the derived
/// class.
#[test]
fn test_inherited_method_implements_interface() -> Result<()> {
    // class Writer { public virtual void Flush() {} }
    // class BufferedWriter : Writer, IFlushable {}
    // IFlushable flushable = new BufferedWriter(); flushable.Flush();
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();
    let app = builder.assembly("App");
    let flushable = builder.interface(app, "App", "IFlushable").build();
    let flush = builder.method(flushable, "Flush").abstract_().newslot().build();

    let writer = builder.class(app, "App", "Writer").extends(corlib.object()).build();
    let writer_flush = builder
        .method(writer, "Flush")
        .virtual_()
        .newslot()
        .body(|b| b.ret())
        .build();
    let buffered = builder
        .class(app, "App", "BufferedWriter")
        .extends(writer.into())
        .implements(flushable.into())
        .build();
    let buffered_ctor = builder.constructor(buffered).build();

    let program = builder
        .class(app, "App", "Program")
        .extends(corlib.object())
        .build();
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.newobj(buffered_ctor).callvirt(flush).ret())
        .build();
    let model = builder.finish();

    let annotations = mark(&model, &[main])?;

    assert!(annotations.is_marked(buffered));
    assert!(annotations.is_processed(flush));
    assert!(annotations.is_processed(writer_flush));
    assert_eq!(annotations.marked_by(writer_flush), Some(MarkedBy::Node(flush)));
    Ok(())
}
