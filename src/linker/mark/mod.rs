//! The mark step: computes everything reachable from the root set.
//!
//! Marking is a worklist algorithm over the metadata graph. Two FIFO queues hold the work:
//! types waiting to be expanded and methods waiting to be processed. A node is queued only on
//! its `Unmarked -> Marked` transition, so every node is expanded at most once no matter how
//! many edges lead to it, and cyclic metadata cannot cause unbounded recursion.
//!
//! # Architecture
//!
//! The step is split by the kind of edge it follows:
//!
//! - `types`: type references, type expansion, fields and preserve policies
//! - `methods`: method references, signatures and bodies
//! - `virtuals`: override edges, which are only followed once the overriding type is reachable
//! - `attributes`: custom attribute constructors, named arguments and type-valued arguments
//! - `special`: attributes whose string argument names another member
//! - `generics`: generic parameters, instantiations and `new()` constraints
//!
//! # Fixpoint
//!
//! One round drains both queues and then sweeps all registered virtual methods. Override
//! eligibility can change as a side effect of type marking, so the step repeats rounds until a
//! round leaves both queues empty without producing a single new mark.

mod attributes;
mod generics;
mod methods;
mod special;
mod types;
mod virtuals;

use std::{collections::VecDeque, fmt};

use rustc_hash::{FxHashMap, FxHashSet};

pub use special::{SpecialAttributeRegistry, SpecialMembers};

use crate::{
    linker::{Annotations, MarkOptions, MarkedBy, MethodAction},
    metadata::{method::MethodDef, token::Token, MetadataModel},
    Error, Result,
};

/// Counters collected by one run of the mark step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkStats {
    /// Number of fixpoint rounds
    pub rounds: usize,
    /// Methods dequeued and processed
    pub methods_processed: usize,
    /// Types expanded
    pub types_expanded: usize,
    /// Fields expanded
    pub fields_expanded: usize,
    /// Overrides marked because their base method and declaring type were reachable
    pub overrides_propagated: usize,
    /// Custom attributes whose blob could not be decoded
    pub attributes_skipped: usize,
    /// Type names in attributes or marshal descriptors that could not be resolved
    pub type_names_skipped: usize,
    /// Nodes marked when the step finished, roots included
    pub marked: usize,
}

impl fmt::Display for MarkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} marked in {} rounds ({} methods, {} types, {} fields, {} overrides, {} attributes skipped, {} type names skipped)",
            self.marked,
            self.rounds,
            self.methods_processed,
            self.types_expanded,
            self.fields_expanded,
            self.overrides_propagated,
            self.attributes_skipped,
            self.type_names_skipped
        )
    }
}

/// State of one marking pass.
///
/// Borrows the model and the session's annotations for the duration of the pass; the queues
/// and bookkeeping sets live only as long as the pass.
pub(crate) struct MarkStep<'c, 'a> {
    model: &'a MetadataModel,
    annotations: &'c mut Annotations,
    options: &'c MarkOptions,
    special: &'c SpecialAttributeRegistry,
    corlib: Option<Token>,
    /// Methods waiting to be processed
    methods: VecDeque<Token>,
    /// Types waiting to be expanded
    types: VecDeque<Token>,
    scheduled_types: FxHashSet<Token>,
    expanded_fields: FxHashSet<Token>,
    /// Registered virtual methods in registration order
    virtual_methods: Vec<Token>,
    virtual_set: FxHashSet<Token>,
    /// `(base, override)` pairs waiting for the override's declaring type
    parked: FxHashMap<Token, Vec<(Token, Token)>>,
    parked_pairs: FxHashSet<(Token, Token)>,
    processed_assemblies: FxHashSet<Token>,
    new_marks: usize,
    stats: MarkStats,
}

impl<'c, 'a> MarkStep<'c, 'a> {
    pub(crate) fn new(
        model: &'a MetadataModel,
        annotations: &'c mut Annotations,
        options: &'c MarkOptions,
        special: &'c SpecialAttributeRegistry,
        corlib: Option<Token>,
    ) -> Self {
        MarkStep {
            model,
            annotations,
            options,
            special,
            corlib,
            methods: VecDeque::new(),
            types: VecDeque::new(),
            scheduled_types: FxHashSet::default(),
            expanded_fields: FxHashSet::default(),
            virtual_methods: Vec::new(),
            virtual_set: FxHashSet::default(),
            parked: FxHashMap::default(),
            parked_pairs: FxHashSet::default(),
            processed_assemblies: FxHashSet::default(),
            new_marks: 0,
            stats: MarkStats::default(),
        }
    }

    /// Runs the pass to its fixpoint.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConfigurationError`] if no root method is marked and
    /// [`crate::Error::ResolutionFailure`] if a reachable reference cannot be bound. No usable
    /// result is left behind in either case.
    pub(crate) fn run(mut self) -> Result<MarkStats> {
        self.initialize()?;

        loop {
            self.stats.rounds += 1;
            let marks_before = self.new_marks;

            self.drain()?;
            self.process_virtual_methods();

            let new_marks = self.new_marks - marks_before;
            log::debug!(
                "Mark round {}: {} new marks, {} methods queued",
                self.stats.rounds,
                new_marks,
                self.methods.len()
            );
            if new_marks == 0 && self.methods.is_empty() && self.types.is_empty() {
                break;
            }
        }

        self.stats.marked = self.annotations.marked_count();
        log::info!("Marking finished: {}", self.stats);
        Ok(self.stats)
    }

    /// Seeds the queues from the marks root selection left in the annotations
    fn initialize(&mut self) -> Result<()> {
        let model = self.model;

        for assembly in model.assemblies() {
            self.process_assembly(assembly.token)?;
        }

        for ty in model.types() {
            if self.annotations.is_marked(ty.token) {
                self.schedule_type(ty.token);
            }

            for field in &ty.fields {
                if self.annotations.is_marked(*field) {
                    self.mark_field_definition(*field, MarkedBy::Root)?;
                }
            }

            for method in &ty.methods {
                // Virtual methods processed by an earlier run still need their overrides tracked
                if self.annotations.is_processed(*method)
                    && model.method(*method).is_some_and(MethodDef::is_virtual)
                {
                    self.register_virtual(*method);
                }
                if self.annotations.is_marked(*method) {
                    if self.annotations.method_action(*method) == MethodAction::Nothing {
                        self.annotations
                            .set_method_action(*method, MethodAction::Parse);
                    }
                    self.methods.push_back(*method);
                }
            }
        }

        while let Some(ty) = self.types.pop_front() {
            self.expand_type(ty)?;
        }

        if self.methods.is_empty() {
            return Err(Error::ConfigurationError("No entry methods".to_string()));
        }
        log::debug!("Mark step starts with {} root methods", self.methods.len());
        Ok(())
    }

    /// Empties both queues; types are expanded before the next method is processed
    fn drain(&mut self) -> Result<()> {
        loop {
            if let Some(ty) = self.types.pop_front() {
                self.expand_type(ty)?;
            } else if let Some(method) = self.methods.pop_front() {
                self.process_method(method)?;
            } else {
                return Ok(());
            }
        }
    }

    /// Marks a node, returning true on its first mark
    fn mark_node(&mut self, node: Token, by: MarkedBy) -> bool {
        let first = self.annotations.mark(node, by);
        if first {
            self.new_marks += 1;
            log::trace!("Marked {node}");
        }
        first
    }

    /// Lookup scopes for type names found in metadata owned by `owner`
    fn name_scopes(&self, owner: Token) -> Vec<Token> {
        let mut scopes: Vec<Token> = self.model.assembly_of(owner).into_iter().collect();
        if let Some(corlib) = self.corlib {
            if !scopes.contains(&corlib) {
                scopes.push(corlib);
            }
        }
        scopes
    }
}
