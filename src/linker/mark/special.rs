//! Attributes whose first string argument names another member.
//!
//! Some framework attributes refer to a sibling member by name, for example
//! `[XmlSchemaProvider("GetSchema")]` on a type names a static method the XML serializer calls
//! through reflection. Nothing in any method body references that member, so marking has to
//! look at the attribute. [`SpecialAttributeRegistry`] maps the attribute's full name to the
//! kinds of members its argument may name; the members are looked up on the attributed type,
//! or on the declaring type when the attribute sits on a method.

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use crate::{
    linker::{mark::MarkStep, MarkedBy},
    metadata::{
        customattributes::{CustomAttribute, CustomAttributeArgument},
        method::MethodDef,
        token::Token,
        typesystem::TypeDef,
        MetadataModel,
    },
    Result,
};

/// `System.Xml.Serialization.XmlSchemaProviderAttribute`
pub const XML_SCHEMA_PROVIDER_ATTRIBUTE: &str =
    "System.Xml.Serialization.XmlSchemaProviderAttribute";
/// `System.Web.Services.Protocols.SoapHeaderAttribute`
pub const SOAP_HEADER_ATTRIBUTE: &str = "System.Web.Services.Protocols.SoapHeaderAttribute";

bitflags! {
    /// Member kinds the string argument of a special attribute may name
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SpecialMembers: u8 {
        /// Every method with the name
        const METHOD = 0x01;
        /// The field with the name
        const FIELD = 0x02;
        /// Both accessors of the property with the name
        const PROPERTY = 0x04;
    }
}

/// Attribute full name to the member kinds its first argument names
#[derive(Debug, Clone)]
pub struct SpecialAttributeRegistry {
    entries: FxHashMap<String, SpecialMembers>,
}

impl Default for SpecialAttributeRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(XML_SCHEMA_PROVIDER_ATTRIBUTE, SpecialMembers::METHOD);
        registry.register(
            SOAP_HEADER_ATTRIBUTE,
            SpecialMembers::FIELD | SpecialMembers::PROPERTY,
        );
        registry
    }
}

impl SpecialAttributeRegistry {
    /// Creates a registry with the framework's well-known entries
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry without any entry
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    /// Adds or replaces the entry for an attribute
    pub fn register(&mut self, attribute: impl Into<String>, members: SpecialMembers) {
        self.entries.insert(attribute.into(), members);
    }

    /// The member kinds registered for an attribute full name
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<SpecialMembers> {
        self.entries.get(attribute).copied()
    }

    /// Number of registered attributes
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> MarkStep<'_, 'a> {
    pub(super) fn mark_type_special_attributes(&mut self, ty: &TypeDef) -> Result<()> {
        self.mark_special_attributes(&ty.custom_attributes, ty.token, MarkedBy::Node(ty.token))
    }

    pub(super) fn mark_method_special_attributes(&mut self, method: &MethodDef) -> Result<()> {
        self.mark_special_attributes(
            &method.custom_attributes,
            method.declaring_type,
            MarkedBy::Node(method.token),
        )
    }

    fn mark_special_attributes(
        &mut self,
        attributes: &[CustomAttribute],
        target: Token,
        by: MarkedBy,
    ) -> Result<()> {
        if self.special.is_empty() {
            return Ok(());
        }

        let model: &'a MetadataModel = self.model;
        let Some(target_def) = model.type_def(target) else {
            return Ok(());
        };

        for attribute in attributes {
            let Some((members, name)) = self.special_member_name(attribute) else {
                continue;
            };

            if members.contains(SpecialMembers::METHOD) {
                for method in target_def.methods.iter().filter_map(|m| model.method(*m)) {
                    if method.name == name {
                        self.mark_method_definition(method.token, by);
                    }
                }
            }

            if members.contains(SpecialMembers::FIELD) {
                if let Some(field) = model.find_field(target, &name) {
                    self.mark_field_definition(field, by)?;
                }
            }

            if members.contains(SpecialMembers::PROPERTY) {
                let property = model
                    .find_property(target, &name)
                    .and_then(|property| model.property(property));
                if let Some(property) = property {
                    for accessor in property.getter.iter().chain(property.setter.iter()) {
                        self.mark_method_definition(*accessor, by);
                    }
                }
            }
        }
        Ok(())
    }

    /// The registry entry of an attribute and the member name in its first argument
    fn special_member_name(&self, attribute: &CustomAttribute) -> Option<(SpecialMembers, String)> {
        let model = self.model;
        let ctor = model.resolve_method(&attribute.constructor).ok()?;
        let attribute_type = model.declaring_type_of(ctor)?;
        let members = self.special.get(&model.full_name(attribute_type))?;

        let value = model.decode_custom_attribute(attribute).ok()?;
        match value.fixed_args.first()? {
            CustomAttributeArgument::String(name) if !name.is_empty() => {
                Some((members, name.clone()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_entries() {
        let registry = SpecialAttributeRegistry::new();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get(XML_SCHEMA_PROVIDER_ATTRIBUTE),
            Some(SpecialMembers::METHOD)
        );
        assert_eq!(
            registry.get(SOAP_HEADER_ATTRIBUTE),
            Some(SpecialMembers::FIELD | SpecialMembers::PROPERTY)
        );
        assert_eq!(registry.get("System.ObsoleteAttribute"), None);
    }

    #[test]
    fn test_register() {
        let mut registry = SpecialAttributeRegistry::empty();
        assert!(registry.is_empty());

        registry.register("App.FactoryAttribute", SpecialMembers::METHOD);
        registry.register("App.FactoryAttribute", SpecialMembers::FIELD);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("App.FactoryAttribute"), Some(SpecialMembers::FIELD));
    }
}
