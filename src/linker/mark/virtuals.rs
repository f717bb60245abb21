//! Propagation of marks along override edges.
//!
//! An override is only needed when its base method is reachable and an instance of its
//! declaring type can exist, i.e. the declaring type is marked. Either condition can become
//! true first:
//!
//! - When a virtual method is registered, overrides on already marked types are marked right
//!   away. The remaining `(base, override)` pairs are parked under the override's declaring
//!   type.
//! - When a type is expanded, the pairs parked under it fire.
//!
//! The sweep after every queue drain re-checks all registered virtual methods, which catches
//! anything the two triggers missed.

use crate::{
    linker::{mark::MarkStep, MarkedBy},
    metadata::token::Token,
};

impl MarkStep<'_, '_> {
    /// Registers a processed virtual method and resolves its overrides
    pub(super) fn register_virtual(&mut self, method: Token) {
        if self.virtual_set.insert(method) {
            self.virtual_methods.push(method);
            self.process_virtual_method(method);
        }
    }

    /// Checks every override of `method` and, for the ones that get marked, their overrides
    fn process_virtual_method(&mut self, method: Token) {
        let mut pending = vec![method];
        while let Some(base) = pending.pop() {
            let overrides = self.annotations.overrides_of(base).to_vec();
            for overrider in overrides {
                if self.process_override(overrider, base) {
                    pending.push(overrider);
                }
            }
        }
    }

    /// Marks `overrider` if its declaring type is marked. Returns true if it got marked.
    fn process_override(&mut self, overrider: Token, base: Token) -> bool {
        let Some(declaring_type) = self.model.declaring_type_of(overrider) else {
            return false;
        };

        if !self.annotations.is_marked(declaring_type) {
            if self.parked_pairs.insert((base, overrider)) {
                self.parked
                    .entry(declaring_type)
                    .or_default()
                    .push((base, overrider));
            }
            return false;
        }

        if self.annotations.is_marked(overrider) {
            return false;
        }

        self.stats.overrides_propagated += 1;
        self.mark_method_definition(overrider, MarkedBy::Node(base));
        true
    }

    /// Fires the override pairs parked under a type that just got expanded
    pub(super) fn on_type_marked(&mut self, ty: Token) {
        let Some(pairs) = self.parked.remove(&ty) else {
            return;
        };

        for (base, overrider) in pairs {
            self.parked_pairs.remove(&(base, overrider));
            if self.process_override(overrider, base) {
                self.process_virtual_method(overrider);
            }
        }
    }

    /// Re-checks the overrides of every registered virtual method
    pub(super) fn process_virtual_methods(&mut self) {
        let mut index = 0;
        while let Some(method) = self.virtual_methods.get(index).copied() {
            self.process_virtual_method(method);
            index += 1;
        }
    }
}
