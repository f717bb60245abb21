//! Type and field marking.

use rustc_hash::FxHashSet;

use crate::{
    linker::{mark::MarkStep, LinkAction, MarkedBy, TypePreserve},
    metadata::{
        members::FieldReference,
        method::MethodDef,
        token::Token,
        typesystem::{TypeDef, TypeReference},
        MetadataModel,
    },
    Result,
};

impl<'a> MarkStep<'_, 'a> {
    /// Marks the type a reference points at.
    ///
    /// Type specifications are peeled first: generic instances mark their arguments, modified
    /// types their modifier; arrays, pointers and by-refs reduce to their element type.
    /// Generic parameters carry no definition and are ignored.
    ///
    /// # Errors
    /// Returns [`crate::Error::ResolutionFailure`] if the element type cannot be bound.
    pub(super) fn mark_type(&mut self, reference: &TypeReference, by: MarkedBy) -> Result<()> {
        let mut current = reference;
        loop {
            current = match current {
                TypeReference::GenericInstance { element, arguments } => {
                    self.mark_generic_instance_type(element, arguments, by)?;
                    element
                }
                TypeReference::Modified {
                    modifier, element, ..
                } => {
                    self.mark_type(modifier, by)?;
                    element
                }
                TypeReference::Array { element, .. }
                | TypeReference::Pointer(element)
                | TypeReference::ByRef(element)
                | TypeReference::Pinned(element) => element,
                TypeReference::Var(_) | TypeReference::MVar(_) => return Ok(()),
                TypeReference::Definition(_)
                | TypeReference::External { .. }
                | TypeReference::Primitive(_) => break,
            };
        }

        let token = self.model.resolve_type(current)?;
        self.mark_type_definition(token, by);
        Ok(())
    }

    /// Marks a type definition and schedules its expansion on the first mark
    pub(super) fn mark_type_definition(&mut self, token: Token, by: MarkedBy) {
        self.mark_node(token, by);
        self.schedule_type(token);
    }

    pub(super) fn schedule_type(&mut self, token: Token) {
        if self.scheduled_types.insert(token) {
            self.types.push_back(token);
        }
    }

    /// Marks everything a retained type cannot live without
    pub(super) fn expand_type(&mut self, token: Token) -> Result<()> {
        let model: &'a MetadataModel = self.model;
        let Some(ty) = model.type_def(token) else {
            return Ok(());
        };
        self.stats.types_expanded += 1;
        let by = MarkedBy::Node(token);

        self.mark_node(ty.assembly, by);
        self.mark_node(ty.module, by);
        self.process_assembly(ty.assembly)?;
        if let Some(outer) = ty.declaring_type {
            self.mark_type_definition(outer, by);
        }

        if let Some(base) = &ty.base {
            self.mark_type(base, by)?;
        }
        for interface in &ty.interfaces {
            self.mark_type(interface, by)?;
        }

        self.mark_custom_attributes(&ty.custom_attributes, token, by)?;
        self.mark_generic_parameters(&ty.generic_params, by)?;

        if model.is_multicast_delegate(token) {
            for method in &ty.methods {
                self.mark_method_definition(*method, by);
            }
        }

        if ty.is_serializable() {
            self.mark_methods_if(ty, by, |method| {
                method.is_default_constructor() || is_serialization_constructor(model, method)
            });
        }

        self.mark_type_special_attributes(ty)?;

        if model.is_value_type(token) {
            self.mark_fields(ty, by)?;
        }

        if self.options.mark_static_constructors {
            self.mark_methods_if(ty, by, MethodDef::is_static_constructor);
        }

        if self.options.keep_unlinked_overrides {
            let required: Vec<Token> = ty
                .methods
                .iter()
                .copied()
                .filter(|method| self.has_unlinked_base(*method))
                .collect();
            for method in required {
                self.mark_method_definition(method, by);
            }
        }

        self.on_type_marked(token);
        self.apply_preserve(ty)
    }

    /// Marks the attributes of an assembly and its modules, once per assembly.
    ///
    /// The assembly node itself is only marked when one of its types is.
    pub(super) fn process_assembly(&mut self, assembly: Token) -> Result<()> {
        if !self.processed_assemblies.insert(assembly) {
            return Ok(());
        }

        let model: &'a MetadataModel = self.model;
        let Some(definition) = model.assembly(assembly) else {
            return Ok(());
        };
        let by = MarkedBy::Node(assembly);

        self.mark_custom_attributes(&definition.custom_attributes, assembly, by)?;
        for module in &definition.modules {
            if let Some(module_def) = model.module(*module) {
                self.mark_custom_attributes(&module_def.custom_attributes, *module, by)?;
            }
        }
        Ok(())
    }

    /// Marks the field a reference points at
    ///
    /// # Errors
    /// Returns [`crate::Error::ResolutionFailure`] if the field cannot be bound.
    pub(super) fn mark_field(&mut self, reference: &FieldReference, by: MarkedBy) -> Result<()> {
        if let FieldReference::Member { declaring_type, .. } = reference {
            if matches!(declaring_type, TypeReference::GenericInstance { .. }) {
                self.mark_type(declaring_type, by)?;
            }
        }

        let token = self.model.resolve_field(reference)?;
        self.mark_field_definition(token, by)
    }

    /// Marks a field definition and expands it on the first call
    pub(super) fn mark_field_definition(&mut self, token: Token, by: MarkedBy) -> Result<()> {
        self.mark_node(token, by);
        if !self.expanded_fields.insert(token) {
            return Ok(());
        }

        let model: &'a MetadataModel = self.model;
        let Some(field) = model.field(token) else {
            return Ok(());
        };
        self.stats.fields_expanded += 1;
        let by = MarkedBy::Node(token);

        self.mark_type_definition(field.declaring_type, by);
        self.mark_type(&field.field_type, by)?;
        self.mark_custom_attributes(&field.custom_attributes, token, by)?;
        self.mark_marshal_spec(field.marshal.as_ref(), token, by)
    }

    fn mark_fields(&mut self, ty: &TypeDef, by: MarkedBy) -> Result<()> {
        for field in &ty.fields {
            self.mark_field_definition(*field, by)?;
        }
        Ok(())
    }

    fn mark_methods_if<F>(&mut self, ty: &TypeDef, by: MarkedBy, predicate: F)
    where
        F: Fn(&MethodDef) -> bool,
    {
        let model: &'a MetadataModel = self.model;
        for method in ty.methods.iter().filter_map(|token| model.method(*token)) {
            if predicate(method) {
                self.mark_method_definition(method.token, by);
            }
        }
    }

    /// Returns true if the method overrides, directly or through other overrides, a method
    /// declared in an assembly that is not linked
    fn has_unlinked_base(&self, method: Token) -> bool {
        let mut pending: Vec<Token> = self.annotations.base_methods_of(method).to_vec();
        let mut visited = FxHashSet::default();

        while let Some(base) = pending.pop() {
            if !visited.insert(base) {
                continue;
            }
            let unlinked = self
                .model
                .assembly_of(base)
                .is_some_and(|assembly| self.annotations.assembly_action(assembly) != LinkAction::Link);
            if unlinked {
                return true;
            }
            pending.extend_from_slice(self.annotations.base_methods_of(base));
        }
        false
    }

    fn apply_preserve(&mut self, ty: &TypeDef) -> Result<()> {
        let by = MarkedBy::Node(ty.token);

        let preserved = self.annotations.preserved_methods(ty.token).to_vec();
        for method in preserved {
            self.mark_method_definition(method, by);
        }

        match self.annotations.preserve(ty.token) {
            TypePreserve::Nothing => {}
            TypePreserve::Fields => self.mark_fields(ty, by)?,
            TypePreserve::Methods => self.mark_methods_if(ty, by, |_| true),
            TypePreserve::All => {
                self.mark_fields(ty, by)?;
                self.mark_methods_if(ty, by, |_| true);
            }
        }
        Ok(())
    }
}

/// `.ctor(SerializationInfo, StreamingContext)`, matched by simple type names
fn is_serialization_constructor(model: &MetadataModel, method: &MethodDef) -> bool {
    if !method.is_constructor() || method.is_static() || method.params.len() != 2 {
        return false;
    }

    let names: Vec<String> = method
        .params
        .iter()
        .map(|param| model.type_name(&param.param_type))
        .collect();
    simple_name(&names[0]) == "SerializationInfo" && simple_name(&names[1]) == "StreamingContext"
}

fn simple_name(full_name: &str) -> &str {
    full_name.rsplit(['.', '/']).next().unwrap_or(full_name)
}
