//! Custom attribute marking.
//!
//! The attribute constructor is always marked and must resolve. Everything derived from the
//! blob is best effort: a blob that does not decode, or a type name that does not parse or
//! bind, is logged and skipped without failing the pass.

use crate::{
    linker::{mark::MarkStep, MarkedBy},
    metadata::{
        customattributes::{CustomAttribute, CustomAttributeArgument},
        marshalling::MarshalSpec,
        token::Token,
        typesystem::TypeName,
        MetadataModel,
    },
    Result,
};

impl<'a> MarkStep<'_, 'a> {
    /// Marks the attributes attached to `owner`
    pub(super) fn mark_custom_attributes(
        &mut self,
        attributes: &[CustomAttribute],
        owner: Token,
        by: MarkedBy,
    ) -> Result<()> {
        for attribute in attributes {
            self.mark_custom_attribute(attribute, owner, by)?;
        }
        Ok(())
    }

    fn mark_custom_attribute(
        &mut self,
        attribute: &CustomAttribute,
        owner: Token,
        by: MarkedBy,
    ) -> Result<()> {
        let model: &'a MetadataModel = self.model;
        let Some(ctor) = self.mark_method(&attribute.constructor, by)? else {
            return Ok(());
        };

        let value = match model.decode_custom_attribute(attribute) {
            Ok(value) => value,
            Err(error) => {
                log::warn!(
                    "Skipping undecodable attribute {} on {owner}: {error}",
                    model.method_name(ctor)
                );
                self.stats.attributes_skipped += 1;
                return Ok(());
            }
        };

        let follow_types = self.options.follow_type_attribute_arguments;
        let scopes = self.name_scopes(owner);

        if follow_types {
            for argument in &value.fixed_args {
                self.mark_type_argument(argument, &scopes, by)?;
            }
        }

        let attribute_type = model.declaring_type_of(ctor);
        for named in &value.named_args {
            if let Some(attribute_type) = attribute_type {
                if named.is_field {
                    if let Some(field) = model.find_field_in_hierarchy(attribute_type, &named.name) {
                        self.mark_field_definition(field, by)?;
                    }
                } else if let Some(setter) = model.find_property_setter(attribute_type, &named.name)
                {
                    self.mark_method_definition(setter, by);
                }
            }

            if follow_types {
                self.mark_type_argument(&named.value, &scopes, by)?;
            }
        }
        Ok(())
    }

    /// Marks the types named by a `System.Type` value, looking inside arrays
    fn mark_type_argument(
        &mut self,
        argument: &CustomAttributeArgument,
        scopes: &[Token],
        by: MarkedBy,
    ) -> Result<()> {
        match argument {
            CustomAttributeArgument::Type(name) if !name.is_empty() => {
                self.mark_type_name(name, scopes, by)
            }
            CustomAttributeArgument::Array(items) => {
                for item in items {
                    self.mark_type_argument(item, scopes, by)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Marks the type a reflection type name binds to in `scopes`
    fn mark_type_name(&mut self, name: &str, scopes: &[Token], by: MarkedBy) -> Result<()> {
        let parsed = match TypeName::parse(name) {
            Ok(parsed) => parsed,
            Err(error) => {
                log::warn!("Skipping unparsable type name '{name}': {error}");
                self.stats.type_names_skipped += 1;
                return Ok(());
            }
        };

        match self.model.resolve_type_name(&parsed, scopes) {
            Some(reference) => self.mark_type(&reference, by),
            None => {
                log::warn!("Skipping unresolvable type name '{name}'");
                self.stats.type_names_skipped += 1;
                Ok(())
            }
        }
    }

    /// Marks the custom marshaler type of a marshal descriptor
    pub(super) fn mark_marshal_spec(
        &mut self,
        spec: Option<&MarshalSpec>,
        owner: Token,
        by: MarkedBy,
    ) -> Result<()> {
        let Some(marshaler) = spec.and_then(MarshalSpec::custom_marshaler_type) else {
            return Ok(());
        };
        let scopes = self.name_scopes(owner);
        self.mark_type_name(marshaler, &scopes, by)
    }
}
