//! Method marking and processing.

use rustc_hash::FxHashSet;

use crate::{
    linker::{mark::MarkStep, LinkAction, MarkedBy, MethodAction},
    metadata::{
        members::MemberReference,
        method::{MethodBody, MethodDef, MethodReference, Operand},
        token::Token,
        typesystem::TypeReference,
        MetadataModel,
    },
    Error, Result,
};

impl<'a> MarkStep<'_, 'a> {
    /// Marks the method a reference points at and returns its definition.
    ///
    /// Generic method instances mark their arguments. Methods of array types are provided by
    /// the runtime and have no definition; they yield `None`.
    ///
    /// # Errors
    /// Returns [`crate::Error::ResolutionFailure`] if the method cannot be bound.
    pub(super) fn mark_method(
        &mut self,
        reference: &MethodReference,
        by: MarkedBy,
    ) -> Result<Option<Token>> {
        let mut current = reference;
        while let MethodReference::GenericInstance { element, arguments } = current {
            self.mark_generic_instance_method(element, arguments, by)?;
            current = element;
        }

        if let MethodReference::Member { declaring_type, .. } = current {
            if declaring_type.is_array() {
                return Ok(None);
            }
            if matches!(declaring_type, TypeReference::GenericInstance { .. }) {
                self.mark_type(declaring_type, by)?;
            }
        }

        let token = self.model.resolve_method(current)?;
        self.mark_method_definition(token, by);
        Ok(Some(token))
    }

    /// Marks a method definition and queues it on its first mark
    pub(super) fn mark_method_definition(&mut self, token: Token, by: MarkedBy) {
        if self.annotations.method_action(token) == MethodAction::Nothing {
            self.annotations.set_method_action(token, MethodAction::Parse);
        }
        if self.mark_node(token, by) {
            self.methods.push_back(token);
        }
    }

    /// Expands a dequeued method: signature, attributes, overrides and body
    pub(super) fn process_method(&mut self, token: Token) -> Result<()> {
        if self.annotations.is_processed(token) {
            return Ok(());
        }

        let model: &'a MetadataModel = self.model;
        let method = model
            .method(token)
            .ok_or_else(|| Error::ResolutionFailure(format!("method definition {token}")))?;
        self.stats.methods_processed += 1;
        let by = MarkedBy::Node(token);

        self.mark_type_definition(method.declaring_type, by);
        self.mark_custom_attributes(&method.custom_attributes, token, by)?;
        self.mark_method_special_attributes(method)?;

        for param in &method.params {
            self.mark_type(&param.param_type, by)?;
            self.mark_custom_attributes(&param.custom_attributes, token, by)?;
            self.mark_marshal_spec(param.marshal.as_ref(), token, by)?;
        }

        self.mark_generic_parameters(&method.generic_params, by)?;

        for explicit in &method.overrides {
            self.mark_method(explicit, by)?;
        }
        self.mark_base_methods(token);

        if method.is_virtual() {
            self.register_virtual(token);
        }

        self.mark_type(&method.return_type.param_type, by)?;
        self.mark_custom_attributes(&method.return_type.custom_attributes, token, by)?;
        self.mark_marshal_spec(method.return_type.marshal.as_ref(), token, by)?;

        if self.should_parse_body(method) {
            if let Some(body) = &method.body {
                self.mark_method_body(body, by)?;
            }
        }

        self.mark_accessor_owner(method, by)?;

        self.annotations.set_processed(token);
        Ok(())
    }

    /// Marks every method `method` overrides, all the way up the hierarchy
    fn mark_base_methods(&mut self, method: Token) {
        let by = MarkedBy::Node(method);
        let mut pending: Vec<Token> = self.annotations.base_methods_of(method).to_vec();
        let mut visited = FxHashSet::default();

        while let Some(base) = pending.pop() {
            if !visited.insert(base) {
                continue;
            }
            self.mark_method_definition(base, by);
            pending.extend_from_slice(self.annotations.base_methods_of(base));
        }
    }

    fn should_parse_body(&self, method: &MethodDef) -> bool {
        if method.body.is_none() {
            return false;
        }

        let action = self.annotations.method_action(method.token);
        let assembly_action = self
            .model
            .assembly_of(method.token)
            .map(|assembly| self.annotations.assembly_action(assembly))
            .unwrap_or_default();

        action == MethodAction::ForceParse
            || (assembly_action == LinkAction::Link && action == MethodAction::Parse)
    }

    fn mark_method_body(&mut self, body: &MethodBody, by: MarkedBy) -> Result<()> {
        for local in &body.locals {
            self.mark_type(local, by)?;
        }

        for handler in &body.exception_handlers {
            if let Some(catch_type) = handler.catch_type() {
                self.mark_type(catch_type, by)?;
            }
        }

        for instruction in &body.instructions {
            match &instruction.operand {
                Operand::Field(field) => self.mark_field(field, by)?,
                Operand::Method(method) => {
                    self.mark_method(method, by)?;
                }
                Operand::Type(ty) => self.mark_type(ty, by)?,
                Operand::Token(MemberReference::Type(ty)) => self.mark_type(ty, by)?,
                Operand::Token(MemberReference::Method(method)) => {
                    self.mark_method(method, by)?;
                }
                Operand::Token(MemberReference::Field(field)) => self.mark_field(field, by)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Property accessors keep the property's attributes; event accessors keep the event's
    /// attributes and all of its accessors
    fn mark_accessor_owner(&mut self, method: &MethodDef, by: MarkedBy) -> Result<()> {
        let Some(owner) = method.accessor_of else {
            return Ok(());
        };
        let model: &'a MetadataModel = self.model;

        if let Some(property) = model.property(owner) {
            self.mark_node(owner, by);
            self.mark_custom_attributes(&property.custom_attributes, owner, by)?;
        } else if let Some(event) = model.event(owner) {
            self.mark_node(owner, by);
            self.mark_custom_attributes(&event.custom_attributes, owner, by)?;
            for accessor in event.accessors() {
                self.mark_method_definition(accessor, by);
            }
        }
        Ok(())
    }
}
