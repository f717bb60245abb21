//! Generic parameters and instantiations.
//!
//! A `new()` constraint lets generic code create instances of its type argument without any
//! `newobj` in sight: `Activator.CreateInstance<T>()` reaches the argument's parameterless
//! constructor at run time. Instantiating a constrained parameter therefore marks that
//! constructor.

use crate::{
    linker::{mark::MarkStep, MarkedBy},
    metadata::{
        method::MethodReference, token::Token, typesystem::TypeReference, MetadataModel,
    },
    Result,
};

impl<'a> MarkStep<'_, 'a> {
    /// Marks generic parameter definitions with their attributes and constraint types
    pub(super) fn mark_generic_parameters(&mut self, params: &[Token], by: MarkedBy) -> Result<()> {
        let model: &'a MetadataModel = self.model;
        for param in params {
            let Some(definition) = model.generic_param(*param) else {
                continue;
            };
            self.mark_node(*param, by);

            let param_by = MarkedBy::Node(*param);
            self.mark_custom_attributes(&definition.custom_attributes, *param, param_by)?;
            for constraint in &definition.constraints {
                self.mark_type(constraint, param_by)?;
            }
        }
        Ok(())
    }

    /// Marks the arguments of a generic type instance
    pub(super) fn mark_generic_instance_type(
        &mut self,
        element: &TypeReference,
        arguments: &[TypeReference],
        by: MarkedBy,
    ) -> Result<()> {
        for argument in arguments {
            self.mark_type(argument, by)?;
        }

        let model: &'a MetadataModel = self.model;
        let Some(definition) = model
            .resolve_type(element)
            .ok()
            .and_then(|token| model.type_def(token))
        else {
            return Ok(());
        };
        self.mark_constructor_constraints(&definition.generic_params, arguments, by);
        Ok(())
    }

    /// Marks the arguments of a generic method instance
    pub(super) fn mark_generic_instance_method(
        &mut self,
        element: &MethodReference,
        arguments: &[TypeReference],
        by: MarkedBy,
    ) -> Result<()> {
        for argument in arguments {
            self.mark_type(argument, by)?;
        }

        let model: &'a MetadataModel = self.model;
        let Some(definition) = model
            .resolve_method(element)
            .ok()
            .and_then(|token| model.method(token))
        else {
            return Ok(());
        };
        self.mark_constructor_constraints(&definition.generic_params, arguments, by);
        Ok(())
    }

    /// For every `new()` constrained parameter, marks the parameterless instance constructors
    /// of the matching argument
    fn mark_constructor_constraints(
        &mut self,
        params: &[Token],
        arguments: &[TypeReference],
        by: MarkedBy,
    ) {
        if params.len() != arguments.len() {
            return;
        }

        let model: &'a MetadataModel = self.model;
        for (param, argument) in params.iter().zip(arguments) {
            let constrained = model
                .generic_param(*param)
                .is_some_and(|definition| definition.has_default_constructor_constraint());
            if !constrained {
                continue;
            }

            let named = matches!(
                argument,
                TypeReference::Definition(_)
                    | TypeReference::External { .. }
                    | TypeReference::GenericInstance { .. }
            );
            let Some(argument_type) = named
                .then(|| model.resolve_type(argument).ok())
                .flatten()
                .and_then(|token| model.type_def(token))
            else {
                continue;
            };

            for ctor in argument_type
                .methods
                .iter()
                .filter_map(|method| model.method(*method))
                .filter(|method| method.is_default_constructor())
            {
                self.mark_method_definition(ctor.token, by);
            }
        }
    }
}
