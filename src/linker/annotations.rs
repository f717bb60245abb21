//! The annotation store: everything the linker knows about a node besides its metadata.
//!
//! Marking never touches the [`crate::metadata::MetadataModel`]; all results of a link session
//! live here. The store is filled in three stages:
//!
//! - Root selection (or a [`crate::linker::LinkerDescriptor`]) marks entry points and sets
//!   link actions and preserve policies
//! - [`crate::linker::OverrideTable::build`] installs the override relation
//! - The mark step marks everything reachable and flags processed methods
//!
//! A later sweep stage removes every node whose [`Status`] is still [`Status::Unmarked`].

use rustc_hash::{FxHashMap, FxHashSet};
use strum::{Display, EnumString};

use crate::{linker::OverrideTable, metadata::token::Token};

/// Marking progress of a node. Transitions only ever go forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Display)]
pub enum Status {
    /// Not (yet) known to be reachable
    #[default]
    Unmarked,
    /// Must be retained
    Marked,
    /// Retained, and its outgoing edges have been expanded
    Processed,
}

/// What to do with an assembly as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum LinkAction {
    /// Trim the assembly down to its marked members
    #[default]
    Link,
    /// Keep the assembly unchanged
    Copy,
    /// Leave the assembly out of the output without inspecting it
    Skip,
}

/// Whether the body of a marked method gets inspected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MethodAction {
    /// Nothing decided yet
    #[default]
    Nothing,
    /// Inspect the body if the assembly is linked
    Parse,
    /// Inspect the body regardless of the assembly action
    #[strum(serialize = "forceparse")]
    ForceParse,
}

/// Which members of a type are kept whenever the type itself is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TypePreserve {
    /// Only what marking finds
    #[default]
    Nothing,
    /// All fields
    Fields,
    /// All methods, constructors included
    Methods,
    /// All fields and methods
    All,
}

/// Why a node was marked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkedBy {
    /// Selected as an entry point before marking started
    Root,
    /// Reached over an edge from another node
    Node(Token),
}

/// Per-node linker state of one link session
#[derive(Debug, Default)]
pub struct Annotations {
    status: FxHashMap<Token, Status>,
    marked_by: FxHashMap<Token, MarkedBy>,
    assembly_actions: FxHashMap<Token, LinkAction>,
    default_action: LinkAction,
    method_actions: FxHashMap<Token, MethodAction>,
    preserve: FxHashMap<Token, TypePreserve>,
    preserved_methods: FxHashMap<Token, Vec<Token>>,
    overrides: OverrideTable,
}

impl Annotations {
    /// Creates an empty store; every assembly is linked by default
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a node. Returns true if the node was unmarked before.
    ///
    /// The first reason recorded for a node is kept.
    pub fn mark(&mut self, node: Token, by: MarkedBy) -> bool {
        let status = self.status.entry(node).or_default();
        if *status != Status::Unmarked {
            return false;
        }

        *status = Status::Marked;
        self.marked_by.entry(node).or_insert(by);
        true
    }

    /// Marks a node as an entry point
    pub fn mark_root(&mut self, node: Token) -> bool {
        self.mark(node, MarkedBy::Root)
    }

    /// Returns true if the node is marked or processed
    #[must_use]
    pub fn is_marked(&self, node: Token) -> bool {
        self.status(node) != Status::Unmarked
    }

    /// Returns true if the node's edges have been expanded
    #[must_use]
    pub fn is_processed(&self, node: Token) -> bool {
        self.status(node) == Status::Processed
    }

    /// Flags a node as expanded; an unmarked node becomes marked as well
    pub fn set_processed(&mut self, node: Token) {
        self.status.insert(node, Status::Processed);
    }

    /// Current status of a node
    #[must_use]
    pub fn status(&self, node: Token) -> Status {
        self.status.get(&node).copied().unwrap_or_default()
    }

    /// The reason a node was marked, `None` for nodes marked without one or not at all
    #[must_use]
    pub fn marked_by(&self, node: Token) -> Option<MarkedBy> {
        self.marked_by.get(&node).copied()
    }

    /// Follows `marked_by` links from `node` back towards a root.
    ///
    /// The chain starts with `node` and ends at a root, at a node without a recorded reason,
    /// or just before a node would repeat.
    #[must_use]
    pub fn reason_chain(&self, node: Token) -> Vec<Token> {
        let mut chain = vec![node];
        let mut seen: FxHashSet<Token> = chain.iter().copied().collect();
        let mut current = node;

        while let Some(MarkedBy::Node(parent)) = self.marked_by(current) {
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Number of marked (or processed) nodes
    #[must_use]
    pub fn marked_count(&self) -> usize {
        self.status
            .values()
            .filter(|status| **status != Status::Unmarked)
            .count()
    }

    /// All marked nodes in token order
    #[must_use]
    pub fn marked(&self) -> Vec<Token> {
        let mut marked: Vec<Token> = self
            .status
            .iter()
            .filter(|(_, status)| **status != Status::Unmarked)
            .map(|(token, _)| *token)
            .collect();
        marked.sort_unstable();
        marked
    }

    /// The link action of an assembly
    #[must_use]
    pub fn assembly_action(&self, assembly: Token) -> LinkAction {
        self.assembly_actions
            .get(&assembly)
            .copied()
            .unwrap_or(self.default_action)
    }

    /// Sets the link action of an assembly
    pub fn set_assembly_action(&mut self, assembly: Token, action: LinkAction) {
        self.assembly_actions.insert(assembly, action);
    }

    /// Sets the action of assemblies without an explicit one
    pub fn set_default_action(&mut self, action: LinkAction) {
        self.default_action = action;
    }

    /// The body handling of a method
    #[must_use]
    pub fn method_action(&self, method: Token) -> MethodAction {
        self.method_actions.get(&method).copied().unwrap_or_default()
    }

    /// Sets the body handling of a method
    pub fn set_method_action(&mut self, method: Token, action: MethodAction) {
        self.method_actions.insert(method, action);
    }

    /// Installs the override relation marking consults
    pub fn set_override_table(&mut self, overrides: OverrideTable) {
        self.overrides = overrides;
    }

    /// The installed override relation
    #[must_use]
    pub fn override_table(&self) -> &OverrideTable {
        &self.overrides
    }

    /// Methods overriding or implementing `method`
    #[must_use]
    pub fn overrides_of(&self, method: Token) -> &[Token] {
        self.overrides.overrides_of(method)
    }

    /// Methods `method` overrides or implements
    #[must_use]
    pub fn base_methods_of(&self, method: Token) -> &[Token] {
        self.overrides.base_methods_of(method)
    }

    /// The preserve policy of a type
    #[must_use]
    pub fn preserve(&self, ty: Token) -> TypePreserve {
        self.preserve.get(&ty).copied().unwrap_or_default()
    }

    /// Sets the preserve policy of a type
    pub fn set_preserve(&mut self, ty: Token, preserve: TypePreserve) {
        self.preserve.insert(ty, preserve);
    }

    /// Methods kept whenever `ty` is kept
    #[must_use]
    pub fn preserved_methods(&self, ty: Token) -> &[Token] {
        self.preserved_methods
            .get(&ty)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Keeps `method` whenever `ty` is kept
    pub fn add_preserved_method(&mut self, ty: Token, method: Token) {
        let methods = self.preserved_methods.entry(ty).or_default();
        if !methods.contains(&method) {
            methods.push(method);
        }
    }
}
