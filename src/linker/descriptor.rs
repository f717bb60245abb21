//! XML linker descriptors.
//!
//! A descriptor names what must survive linking regardless of what the code references,
//! typically types only reached through reflection:
//!
//! ```xml
//! <linker>
//!   <assembly fullname="App" action="link">
//!     <type fullname="App.Plugin" preserve="methods"/>
//!     <type fullname="App.Settings">
//!       <method name="Load"/>
//!       <field name="path"/>
//!     </type>
//!     <type fullname="*"/>
//!   </assembly>
//! </linker>
//! ```
//!
//! Every listed type becomes a root. A type without child elements and without a `preserve`
//! attribute keeps all of its members; a type with children keeps the listed members. `*`
//! selects every type of the assembly. Nested types may be written with `/` or `+`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotlink::linker::LinkerDescriptor;
//!
//! let descriptor = LinkerDescriptor::parse(
//!     r#"<linker><assembly fullname="App"><type fullname="App.Entry"/></assembly></linker>"#,
//! )?;
//! assert_eq!(descriptor.assemblies[0].types[0].fullname, "App.Entry");
//! # Ok::<(), dotlink::Error>(())
//! ```

use std::{path::Path, str::FromStr};

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};

use crate::{
    linker::{Annotations, LinkAction, MethodAction, TypePreserve},
    metadata::{token::Token, MetadataModel},
    Error, Result,
};

/// Selects every type of an assembly
pub const ALL_TYPES: &str = "*";

/// A parsed linker descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkerDescriptor {
    /// The `<assembly>` entries in document order
    pub assemblies: Vec<AssemblyEntry>,
}

/// An `<assembly>` element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyEntry {
    /// Simple name of the assembly
    pub fullname: String,
    /// Link action from the `action` attribute
    pub action: Option<LinkAction>,
    /// The `<type>` children
    pub types: Vec<TypeEntry>,
}

/// A `<type>` element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeEntry {
    /// Full name of the type, or [`ALL_TYPES`]
    pub fullname: String,
    /// Preserve policy from the `preserve` attribute
    pub preserve: Option<TypePreserve>,
    /// Names from the `<method name="..">` children
    pub methods: Vec<String>,
    /// Names from the `<field name="..">` children
    pub fields: Vec<String>,
}

impl TypeEntry {
    /// The policy applied to the type: the explicit one, otherwise everything for an entry
    /// without member children
    #[must_use]
    pub fn effective_preserve(&self) -> TypePreserve {
        match self.preserve {
            Some(preserve) => preserve,
            None if self.methods.is_empty() && self.fields.is_empty() => TypePreserve::All,
            None => TypePreserve::Nothing,
        }
    }
}

impl LinkerDescriptor {
    /// Parses a descriptor from XML text
    ///
    /// # Errors
    /// Returns [`Error::XmlError`] for malformed XML and [`Error::Descriptor`] for misplaced
    /// elements, missing names or unknown `action`/`preserve` values.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut descriptor = LinkerDescriptor::default();
        let mut in_linker = false;
        let mut assembly: Option<AssemblyEntry> = None;
        let mut ty: Option<TypeEntry> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"linker" => in_linker = true,
                    b"assembly" if in_linker && assembly.is_none() => {
                        assembly = Some(Self::read_assembly(&e)?);
                    }
                    b"type" if assembly.is_some() && ty.is_none() => {
                        ty = Some(Self::read_type(&e)?);
                    }
                    other => return Err(Self::misplaced(other)),
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"linker" => {}
                    b"assembly" if in_linker && assembly.is_none() => {
                        descriptor.assemblies.push(Self::read_assembly(&e)?);
                    }
                    b"type" if ty.is_none() => match assembly.as_mut() {
                        Some(current) => current.types.push(Self::read_type(&e)?),
                        None => return Err(Self::misplaced(b"type")),
                    },
                    b"method" => match ty.as_mut() {
                        Some(current) => current.methods.push(Self::required(&e, "name")?),
                        None => return Err(Self::misplaced(b"method")),
                    },
                    b"field" => match ty.as_mut() {
                        Some(current) => current.fields.push(Self::required(&e, "name")?),
                        None => return Err(Self::misplaced(b"field")),
                    },
                    other => return Err(Self::misplaced(other)),
                },
                Event::End(e) => match e.name().as_ref() {
                    b"type" => {
                        if let (Some(current), Some(parent)) = (ty.take(), assembly.as_mut()) {
                            parent.types.push(current);
                        }
                    }
                    b"assembly" => {
                        if let Some(current) = assembly.take() {
                            descriptor.assemblies.push(current);
                        }
                    }
                    b"linker" => in_linker = false,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        if in_linker || assembly.is_some() {
            return Err(Error::Descriptor("unterminated <linker> element".to_string()));
        }
        Ok(descriptor)
    }

    /// Reads and parses a descriptor file
    ///
    /// # Errors
    /// Returns [`Error::FileError`] if the file cannot be read, otherwise see [`Self::parse`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let xml = std::fs::read_to_string(path)?;
        Self::parse(&xml)
    }

    /// Records the descriptor's actions, roots and preserve policies in `annotations`.
    ///
    /// Types and members the model does not define are logged and skipped.
    ///
    /// # Errors
    /// Returns [`Error::Descriptor`] if an entry names an assembly that is not loaded.
    pub fn apply(&self, model: &MetadataModel, annotations: &mut Annotations) -> Result<()> {
        for entry in &self.assemblies {
            let Some(assembly) = model.assembly_by_name(&entry.fullname) else {
                return Err(Error::Descriptor(format!(
                    "assembly '{}' is not loaded",
                    entry.fullname
                )));
            };

            if let Some(action) = entry.action {
                annotations.set_assembly_action(assembly.token, action);
            }

            for ty in &entry.types {
                if ty.fullname == ALL_TYPES {
                    let all: Vec<Token> = model
                        .types()
                        .filter(|def| def.assembly == assembly.token)
                        .map(|def| def.token)
                        .collect();
                    for token in all {
                        Self::apply_type(model, annotations, token, ty);
                    }
                    continue;
                }

                let name = ty.fullname.replace('+', "/");
                match model.find_type(assembly.token, &name) {
                    Some(token) => Self::apply_type(model, annotations, token, ty),
                    None => log::warn!(
                        "Descriptor type '{}' not found in {}",
                        ty.fullname,
                        entry.fullname
                    ),
                }
            }
        }
        Ok(())
    }

    fn apply_type(
        model: &MetadataModel,
        annotations: &mut Annotations,
        token: Token,
        entry: &TypeEntry,
    ) {
        annotations.mark_root(token);

        let preserve = entry.effective_preserve();
        if preserve != TypePreserve::Nothing {
            annotations.set_preserve(token, preserve);
        }

        let Some(definition) = model.type_def(token) else {
            return;
        };

        for name in &entry.methods {
            let matching: Vec<Token> = definition
                .methods
                .iter()
                .copied()
                .filter(|method| model.method(*method).is_some_and(|m| &m.name == name))
                .collect();
            if matching.is_empty() {
                log::warn!(
                    "Descriptor method '{name}' not found on {}",
                    model.full_name(token)
                );
            }
            for method in matching {
                annotations.mark_root(method);
                annotations.set_method_action(method, MethodAction::Parse);
            }
        }

        for name in &entry.fields {
            match model.find_field(token, name) {
                Some(field) => {
                    annotations.mark_root(field);
                }
                None => log::warn!(
                    "Descriptor field '{name}' not found on {}",
                    model.full_name(token)
                ),
            }
        }
    }

    fn read_assembly(element: &BytesStart) -> Result<AssemblyEntry> {
        Ok(AssemblyEntry {
            fullname: Self::required(element, "fullname")?,
            action: Self::parsed(element, "action")?,
            types: Vec::new(),
        })
    }

    fn read_type(element: &BytesStart) -> Result<TypeEntry> {
        Ok(TypeEntry {
            fullname: Self::required(element, "fullname")?,
            preserve: Self::parsed(element, "preserve")?,
            methods: Vec::new(),
            fields: Vec::new(),
        })
    }

    fn attribute(element: &BytesStart, key: &str) -> Result<Option<String>> {
        for attr in element.attributes() {
            let attr = attr?;
            if attr.key.as_ref() == key.as_bytes() {
                return Ok(Some(attr.unescape_value()?.into_owned()));
            }
        }
        Ok(None)
    }

    fn required(element: &BytesStart, key: &str) -> Result<String> {
        match Self::attribute(element, key)? {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(Error::Descriptor(format!(
                "<{}> requires a '{key}' attribute",
                String::from_utf8_lossy(element.name().as_ref())
            ))),
        }
    }

    fn parsed<T: FromStr>(element: &BytesStart, key: &str) -> Result<Option<T>> {
        let Some(value) = Self::attribute(element, key)? else {
            return Ok(None);
        };
        value
            .to_ascii_lowercase()
            .parse()
            .map(Some)
            .map_err(|_| Error::Descriptor(format!("invalid {key} '{value}'")))
    }

    fn misplaced(name: &[u8]) -> Error {
        Error::Descriptor(format!(
            "unexpected element <{}>",
            String::from_utf8_lossy(name)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::SampleApp;

    const DESCRIPTOR: &str = r#"
        <linker>
          <assembly fullname="App" action="copy">
            <type fullname="App.Plugin" preserve="fields"/>
            <type fullname="App.Settings">
              <method name="Load"/>
              <field name="path"/>
            </type>
          </assembly>
        </linker>"#;

    #[test]
    fn test_parse() {
        let descriptor = LinkerDescriptor::parse(DESCRIPTOR).unwrap();
        assert_eq!(descriptor.assemblies.len(), 1);

        let assembly = &descriptor.assemblies[0];
        assert_eq!(assembly.fullname, "App");
        assert_eq!(assembly.action, Some(LinkAction::Copy));
        assert_eq!(assembly.types.len(), 2);

        assert_eq!(assembly.types[0].preserve, Some(TypePreserve::Fields));
        assert_eq!(assembly.types[1].methods, vec!["Load".to_string()]);
        assert_eq!(assembly.types[1].fields, vec!["path".to_string()]);
    }

    #[test]
    fn test_effective_preserve() {
        let bare = TypeEntry {
            fullname: "A".into(),
            ..TypeEntry::default()
        };
        assert_eq!(bare.effective_preserve(), TypePreserve::All);

        let with_members = TypeEntry {
            methods: vec!["M".into()],
            ..bare.clone()
        };
        assert_eq!(with_members.effective_preserve(), TypePreserve::Nothing);

        let explicit = TypeEntry {
            preserve: Some(TypePreserve::Methods),
            ..with_members
        };
        assert_eq!(explicit.effective_preserve(), TypePreserve::Methods);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            LinkerDescriptor::parse(r#"<linker><assembly fullname="A" action="strip"/></linker>"#),
            Err(Error::Descriptor(_))
        ));
        assert!(matches!(
            LinkerDescriptor::parse(r#"<linker><assembly/></linker>"#),
            Err(Error::Descriptor(_))
        ));
        assert!(matches!(
            LinkerDescriptor::parse(r#"<linker><method name="M"/></linker>"#),
            Err(Error::Descriptor(_))
        ));
        assert!(LinkerDescriptor::parse(r#"<linker><assembly fullname="A">"#).is_err());
    }

    #[test]
    fn test_apply() {
        let app = SampleApp::new();
        let descriptor = LinkerDescriptor::parse(&format!(
            r#"<linker>
                 <assembly fullname="{0}" action="skip">
                   <type fullname="{1}"/>
                   <type fullname="{2}"><method name="{3}"/></type>
                   <type fullname="App.Missing"/>
                 </assembly>
               </linker>"#,
            app.assembly_name,
            app.model.full_name(app.unused_type),
            app.model.full_name(app.program),
            app.model.method(app.main).unwrap().name,
        ))
        .unwrap();

        let mut annotations = Annotations::new();
        descriptor.apply(&app.model, &mut annotations).unwrap();

        assert_eq!(annotations.assembly_action(app.assembly), LinkAction::Skip);
        assert!(annotations.is_marked(app.unused_type));
        assert_eq!(annotations.preserve(app.unused_type), TypePreserve::All);
        assert!(annotations.is_marked(app.program));
        assert_eq!(annotations.preserve(app.program), TypePreserve::Nothing);
        assert!(annotations.is_marked(app.main));
        assert_eq!(annotations.method_action(app.main), MethodAction::Parse);
    }

    #[test]
    fn test_apply_unknown_assembly() {
        let app = SampleApp::new();
        let descriptor = LinkerDescriptor::parse(
            r#"<linker><assembly fullname="Nowhere"><type fullname="X"/></assembly></linker>"#,
        )
        .unwrap();

        let mut annotations = Annotations::new();
        assert!(matches!(
            descriptor.apply(&app.model, &mut annotations),
            Err(Error::Descriptor(_))
        ));
    }
}
