//! The link session.
//!
//! [`LinkContext`] ties one [`MetadataModel`] to the [`Annotations`] computed for it. Root
//! selection writes into the annotations through [`LinkContext::annotations_mut`] or a
//! [`LinkerDescriptor`]; [`LinkContext::mark`] then runs the mark step to its fixpoint.
//! Independent sessions over the same model share nothing but the read-only model.

use crate::{
    linker::{
        mark::{MarkStats, MarkStep, SpecialAttributeRegistry},
        Annotations, LinkerDescriptor, MarkOptions, OverrideTable,
    },
    metadata::{token::Token, MetadataModel},
    Result,
};

/// A link session over one model
#[derive(Debug)]
pub struct LinkContext<'a> {
    model: &'a MetadataModel,
    annotations: Annotations,
    options: MarkOptions,
    special_attributes: SpecialAttributeRegistry,
}

impl<'a> LinkContext<'a> {
    /// Creates a session with default options and empty annotations
    #[must_use]
    pub fn new(model: &'a MetadataModel) -> Self {
        Self::with_options(model, MarkOptions::default())
    }

    /// Creates a session with the given options
    #[must_use]
    pub fn with_options(model: &'a MetadataModel, options: MarkOptions) -> Self {
        LinkContext {
            model,
            annotations: Annotations::new(),
            options,
            special_attributes: SpecialAttributeRegistry::default(),
        }
    }

    /// The model this session links
    #[must_use]
    pub fn model(&self) -> &'a MetadataModel {
        self.model
    }

    /// The annotations computed so far
    #[must_use]
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Mutable access to the annotations, for root selection
    pub fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }

    /// The options of this session
    #[must_use]
    pub fn options(&self) -> &MarkOptions {
        &self.options
    }

    /// The special attribute registry, for registering further conventions
    pub fn special_attributes_mut(&mut self) -> &mut SpecialAttributeRegistry {
        &mut self.special_attributes
    }

    /// Consumes the session, returning the annotations for the sweep stage
    #[must_use]
    pub fn into_annotations(self) -> Annotations {
        self.annotations
    }

    /// The core library: the assembly named in the options, or the model's designated one
    #[must_use]
    pub fn corlib(&self) -> Option<Token> {
        self.model
            .assembly_by_name(&self.options.corlib_name)
            .map(|assembly| assembly.token)
            .or_else(|| self.model.corlib())
    }

    /// Applies a descriptor's link actions, roots and preserve policies
    ///
    /// # Errors
    /// Returns [`crate::Error::Descriptor`] if the descriptor names an assembly that is not
    /// loaded.
    pub fn apply_descriptor(&mut self, descriptor: &LinkerDescriptor) -> Result<()> {
        descriptor.apply(self.model, &mut self.annotations)
    }

    /// Marks everything reachable from the roots.
    ///
    /// Computes the override table first unless one has already been installed.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConfigurationError`] if no method is marked as a root and
    /// [`crate::Error::ResolutionFailure`] if a reachable reference cannot be bound.
    pub fn mark(&mut self) -> Result<MarkStats> {
        if self.annotations.override_table().is_empty() {
            let table = OverrideTable::build(self.model);
            log::debug!("Computed {} override edges", table.len());
            self.annotations.set_override_table(table);
        }

        let corlib = self.corlib();
        MarkStep::new(
            self.model,
            &mut self.annotations,
            &self.options,
            &self.special_attributes,
            corlib,
        )
        .run()
    }
}
