//! Integration tests for descriptor-driven root selection.

use std::path::PathBuf;

use dotlink::prelude::*;

struct Host {
    model: MetadataModel,
    host: Token,
    plugins: Token,
    main: Token,
    helper: Token,
    entry: Token,
    entry_key: Token,
    entry_describe: Token,
    reflected: Token,
    reflected_ctor: Token,
    reflected_run: Token,
    unused: Token,
}

fn build_host() -> Host {
    let mut builder = ModelBuilder::new();
    let corlib = builder.corlib();

    let host = builder.assembly("Host");
    let program = builder
        .class(host, "Host", "Program")
        .extends(corlib.object())
        .build();
    let helper = builder.method(program, "Helper").static_().body(|b| b.ret()).build();
    let main = builder
        .method(program, "Main")
        .static_()
        .body(|b| b.call(helper).ret())
        .build();
    let registry = builder
        .class(host, "Host", "Registry")
        .extends(corlib.object())
        .build();
    let entry = builder
        .class(host, "Host", "Entry")
        .nested_in(registry)
        .extends(corlib.object())
        .build();
    let entry_key = builder.field(entry, "key", corlib.string()).build();
    let entry_describe = builder.method(entry, "Describe").body(|b| b.ret()).build();

    let plugins = builder.assembly("Plugins");
    let reflected = builder
        .class(plugins, "Plugins", "Reflected")
        .extends(corlib.object())
        .build();
    let reflected_ctor = builder.constructor(reflected).build();
    let reflected_run = builder.method(reflected, "Run").body(|b| b.ret()).build();
    let unused = builder
        .class(plugins, "Plugins", "Unused")
        .extends(corlib.object())
        .build();

    Host {
        model: builder.finish(),
        host,
        plugins,
        main,
        helper,
        entry,
        entry_key,
        entry_describe,
        reflected,
        reflected_ctor,
        reflected_run,
        unused,
    }
}

fn sample_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/samples").join(name)
}

/// Roots, preserve policies and actions from a descriptor file drive marking.
#[test]
fn test_descriptor_file_drives_marking() -> Result<()> {
    let host = build_host();
    let descriptor = LinkerDescriptor::from_file(sample_path("plugins.xml"))?;
    assert_eq!(descriptor.assemblies.len(), 2);

    let mut context = LinkContext::new(&host.model);
    context.apply_descriptor(&descriptor)?;
    context.mark()?;
    let annotations = context.annotations();

    assert_eq!(annotations.assembly_action(host.host), LinkAction::Link);
    assert_eq!(annotations.marked_by(host.main), Some(MarkedBy::Root));
    assert!(annotations.is_processed(host.helper));

    // Nested type written with '+', fields only
    assert!(annotations.is_marked(host.entry));
    assert!(annotations.is_marked(host.entry_key));
    assert!(!annotations.is_marked(host.entry_describe));

    // A bare type entry keeps everything
    assert!(annotations.is_marked(host.reflected));
    assert!(annotations.is_processed(host.reflected_ctor));
    assert!(annotations.is_processed(host.reflected_run));
    assert!(annotations.is_marked(host.plugins));
    assert!(!annotations.is_marked(host.unused));
    Ok(())
}

/// `*` selects every type of an assembly.
#[test]
fn test_wildcard_type() -> Result<()> {
    let host = build_host();
    let descriptor = LinkerDescriptor::parse(
        r#"<linker>
             <assembly fullname="Host"><type fullname="Host.Program"><method name="Main"/></type></assembly>
             <assembly fullname="Plugins" action="copy"><type fullname="*"/></assembly>
           </linker>"#,
    )?;

    let mut context = LinkContext::new(&host.model);
    context.apply_descriptor(&descriptor)?;
    context.mark()?;
    let annotations = context.annotations();

    assert_eq!(annotations.assembly_action(host.plugins), LinkAction::Copy);
    assert!(annotations.is_marked(host.reflected));
    assert!(annotations.is_marked(host.unused));
    assert!(annotations.is_marked(host.reflected_run));
    Ok(())
}

/// A descriptor that only names types leaves nothing to start from.
#[test]
fn test_descriptor_without_methods() -> Result<()> {
    let host = build_host();
    let descriptor = LinkerDescriptor::parse(
        r#"<linker><assembly fullname="Host"><type fullname="Host.Registry" preserve="nothing"/></assembly></linker>"#,
    )?;

    let mut context = LinkContext::new(&host.model);
    context.apply_descriptor(&descriptor)?;
    assert!(matches!(context.mark(), Err(Error::ConfigurationError(_))));
    Ok(())
}

/// Unknown types and members are skipped, unknown assemblies are rejected.
#[test]
fn test_unknown_entries() -> Result<()> {
    let host = build_host();
    let descriptor = LinkerDescriptor::parse(
        r#"<linker>
             <assembly fullname="Host">
               <type fullname="Host.Program"><method name="Main"/><method name="Gone"/></type>
               <type fullname="Host.Gone"/>
             </assembly>
           </linker>"#,
    )?;
    let mut context = LinkContext::new(&host.model);
    context.apply_descriptor(&descriptor)?;
    context.mark()?;
    assert!(context.annotations().is_processed(host.main));

    let missing = LinkerDescriptor::parse(
        r#"<linker><assembly fullname="Elsewhere"><type fullname="A"/></assembly></linker>"#,
    )?;
    let mut context = LinkContext::new(&host.model);
    assert!(matches!(
        context.apply_descriptor(&missing),
        Err(Error::Descriptor(_))
    ));
    Ok(())
}

/// Malformed XML surfaces as an XML error.
#[test]
fn test_malformed_xml() {
    let result = LinkerDescriptor::parse("<linker><assembly fullname=\"A\"></linker>");
    assert!(matches!(result, Err(Error::XmlError(_))));

    let result = LinkerDescriptor::from_file(sample_path("does-not-exist.xml"));
    assert!(matches!(result, Err(Error::FileError(_))));
}
