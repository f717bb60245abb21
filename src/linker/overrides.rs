//! Override relation between virtual methods.
//!
//! The table is computed once from the whole model before marking starts and is read-only
//! afterwards. It records, for every virtual method, the methods that override or implement
//! it, and the inverse relation. Three kinds of edges are collected:
//!
//! - explicit `MethodImpl` entries (explicit interface implementations, covariant overrides)
//! - implicit overrides: a virtual method without `newslot` overrides the nearest virtual method
//!   with the same name and signature on its base chain
//! - implicit interface implementations: a virtual method implements a method with the same
//!   name and signature on any interface its type implements, directly or through another
//!   interface; a virtual method inherited from a base class fills a slot the type itself
//!   leaves open
//!
//! Signatures of generic bases and interfaces are compared after substituting the type
//! arguments they are instantiated with, so `Repository<string>::Save(!0)` is matched by
//! `Save(string)`.

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::metadata::{
    method::{MethodDef, MethodSignature},
    token::Token,
    typesystem::{TypeDef, TypeReference},
    MetadataModel,
};

/// Virtual method to overriding methods, and overriding method to base methods.
#[derive(Debug, Default, Clone)]
pub struct OverrideTable {
    /// Map from a virtual method to all methods overriding or implementing it.
    overrides: FxHashMap<Token, Vec<Token>>,
    /// Map from a method to all methods it overrides or implements.
    bases: FxHashMap<Token, Vec<Token>>,
}

impl OverrideTable {
    /// Creates an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the override relation of every type in the model.
    ///
    /// Types are scanned in parallel; the result does not depend on scheduling.
    #[must_use]
    pub fn build(model: &MetadataModel) -> Self {
        let mut pairs: Vec<(Token, Token)> = model
            .types
            .par_iter()
            .filter(|ty| !ty.is_interface())
            .flat_map_iter(|ty| override_pairs(model, ty))
            .collect();
        pairs.sort_unstable();
        pairs.dedup();

        let mut table = Self::default();
        for (base, overrider) in pairs {
            table.insert(base, overrider);
        }
        table
    }

    /// Records that `overrider` overrides or implements `base`
    pub fn insert(&mut self, base: Token, overrider: Token) {
        if base == overrider {
            return;
        }

        let overriders = self.overrides.entry(base).or_default();
        if overriders.contains(&overrider) {
            return;
        }
        overriders.push(overrider);
        self.bases.entry(overrider).or_default().push(base);
    }

    /// Methods overriding or implementing `method`
    #[must_use]
    pub fn overrides_of(&self, method: Token) -> &[Token] {
        self.overrides
            .get(&method)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Methods `method` overrides or implements
    #[must_use]
    pub fn base_methods_of(&self, method: Token) -> &[Token] {
        self.bases
            .get(&method)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of override edges
    #[must_use]
    pub fn len(&self) -> usize {
        self.overrides.values().map(Vec::len).sum()
    }

    /// Returns true if no override edge is recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

/// All `(base, override)` pairs contributed by one type
fn override_pairs(model: &MetadataModel, ty: &TypeDef) -> Vec<(Token, Token)> {
    let virtuals: Vec<&MethodDef> = ty
        .methods
        .iter()
        .filter_map(|token| model.method(*token))
        .filter(|method| method.is_virtual())
        .collect();
    let interfaces = interfaces_of(model, ty);
    if virtuals.is_empty() && interfaces.is_empty() {
        return Vec::new();
    }

    let mut pairs = Vec::new();
    let bases = model.hierarchy(ty.token);

    for method in &virtuals {
        for explicit in &method.overrides {
            if let Ok(base) = model.resolve_method(explicit) {
                pairs.push((base, method.token));
            }
        }

        if !method.is_new_slot() {
            let signature = method.signature();
            let overridden = bases.iter().skip(1).find_map(|(base_ty, args)| {
                find_virtual(model, *base_ty, args, &method.name, &signature)
            });
            if let Some(base) = overridden {
                pairs.push((base, method.token));
            }
        }
    }

    for (interface, args) in &interfaces {
        let Some(interface_def) = model.type_def(*interface) else {
            continue;
        };
        for slot in interface_def
            .methods
            .iter()
            .filter_map(|token| model.method(*token))
        {
            let slot_signature = slot.signature().substitute(args);
            // A method declared on the type wins over one inherited from a base
            let implementation = virtuals
                .iter()
                .find(|method| {
                    method.name == slot.name
                        && model.signatures_equal(&slot_signature, &method.signature())
                })
                .map(|method| method.token)
                .or_else(|| {
                    bases.iter().skip(1).find_map(|(base_ty, args)| {
                        find_virtual(model, *base_ty, args, &slot.name, &slot_signature)
                    })
                });
            if let Some(implementation) = implementation {
                pairs.push((slot.token, implementation));
            }
        }
    }

    pairs
}

/// The virtual method declared on `base_ty` with the given name and signature, comparing after
/// substituting the base's type arguments
fn find_virtual(
    model: &MetadataModel,
    base_ty: Token,
    args: &[TypeReference],
    name: &str,
    signature: &MethodSignature,
) -> Option<Token> {
    model
        .type_def(base_ty)?
        .methods
        .iter()
        .filter_map(|token| model.method(*token))
        .find(|candidate| {
            candidate.is_virtual()
                && candidate.name == name
                && model.signatures_equal(&candidate.signature().substitute(args), signature)
        })
        .map(|candidate| candidate.token)
}

/// Interfaces implemented by a type directly or through other interfaces, each with the type
/// arguments it is instantiated with in terms of the type's own generic parameters
fn interfaces_of(model: &MetadataModel, ty: &TypeDef) -> Vec<(Token, Vec<TypeReference>)> {
    let mut result = Vec::new();
    let mut visited = FxHashSet::default();
    let mut pending: Vec<TypeReference> = ty.interfaces.iter().rev().cloned().collect();

    while let Some(reference) = pending.pop() {
        let Ok(token) = model.resolve_type(&reference) else {
            continue;
        };
        if !visited.insert(token) {
            continue;
        }

        let args = match reference {
            TypeReference::GenericInstance { arguments, .. } => arguments,
            _ => Vec::new(),
        };
        if let Some(interface) = model.type_def(token) {
            pending.extend(
                interface
                    .interfaces
                    .iter()
                    .rev()
                    .map(|parent| parent.substitute(&args, &[])),
            );
        }
        result.push((token, args));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{builder::ModelBuilder, method::MethodReference};

    #[test]
    fn test_implicit_override_chain() {
        let mut builder = ModelBuilder::new();
        let corlib = builder.corlib();
        let app = builder.assembly("App");
        let shape = builder.class(app, "App", "Shape").extends(corlib.object()).build();
        let shape_area = builder.method(shape, "Area").virtual_().newslot().build();
        let square = builder.class(app, "App", "Square").extends(shape.into()).build();
        let square_area = builder.method(square, "Area").virtual_().build();
        let to_string = builder.method(square, "ToString")
            .virtual_()
            .returns(corlib.string())
            .build();
        // newslot hides instead of overriding
        let hidden = builder.class(app, "App", "Hidden").extends(square.into()).build();
        let hidden_area = builder.method(hidden, "Area").virtual_().newslot().build();
        let model = builder.finish();

        let table = OverrideTable::build(&model);
        assert_eq!(table.overrides_of(shape_area), &[square_area]);
        assert_eq!(table.base_methods_of(square_area), &[shape_area]);
        assert_eq!(table.overrides_of(corlib.object_to_string), &[to_string]);
        assert!(table.base_methods_of(hidden_area).is_empty());
        assert!(table.overrides_of(square_area).is_empty());
    }

    #[test]
    fn test_generic_base_substitution() {
        let mut builder = ModelBuilder::new();
        let corlib = builder.corlib();
        let app = builder.assembly("App");
        let handler = builder
            .class(app, "App", "Handler`1")
            .generic_param("T")
            .extends(corlib.object())
            .build();
        let handle = builder
            .method(handler, "Handle")
            .virtual_()
            .newslot()
            .param("item", TypeReference::Var(0))
            .build();
        let text = builder
            .class(app, "App", "TextHandler")
            .extends(TypeReference::generic_instance(handler.into(), vec![corlib.string()]))
            .build();
        let text_handle = builder
            .method(text, "Handle")
            .virtual_()
            .param("item", corlib.string())
            .build();
        let model = builder.finish();

        let table = OverrideTable::build(&model);
        assert_eq!(table.overrides_of(handle), &[text_handle]);
    }

    #[test]
    fn test_interface_and_explicit_implementations() {
        let mut builder = ModelBuilder::new();
        let corlib = builder.corlib();
        let app = builder.assembly("App");
        let closeable = builder.interface(app, "App", "ICloseable").build();
        let close = builder.method(closeable, "Close").abstract_().newslot().build();
        let disposable = builder
            .interface(app, "App", "IResource")
            .implements(closeable.into())
            .build();
        let dispose = builder.method(disposable, "Dispose").abstract_().newslot().build();

        let file = builder
            .class(app, "App", "File")
            .extends(corlib.object())
            .implements(disposable.into())
            .build();
        let file_close = builder.method(file, "Close").virtual_().newslot().build();
        let file_dispose = builder
            .method(file, "App.IResource.Dispose")
            .private()
            .virtual_()
            .newslot()
            .overrides(MethodReference::Definition(dispose))
            .build();
        let model = builder.finish();

        let table = OverrideTable::build(&model);
        assert_eq!(table.overrides_of(close), &[file_close]);
        assert_eq!(table.overrides_of(dispose), &[file_dispose]);
        assert_eq!(table.base_methods_of(file_dispose), &[dispose]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_inherited_interface_implementation() {
        // class Writer { public virtual void Flush() {} }
        // class BufferedWriter : Writer, IFlushable {}
        let mut builder = ModelBuilder::new();
        let corlib = builder.corlib();
        let app = builder.assembly("App");
        let flushable = builder.interface(app, "App", "IFlushable").build();
        let flush = builder.method(flushable, "Flush").abstract_().newslot().build();
        let writer = builder.class(app, "App", "Writer").extends(corlib.object()).build();
        let writer_flush = builder.method(writer, "Flush").virtual_().newslot().build();
        let buffered = builder
            .class(app, "App", "BufferedWriter")
            .extends(writer.into())
            .implements(flushable.into())
            .build();
        let model = builder.finish();

        let table = OverrideTable::build(&model);
        assert_eq!(table.overrides_of(flush), &[writer_flush]);
        assert_eq!(table.base_methods_of(writer_flush), &[flush]);
        assert!(model.type_def(buffered).is_some_and(|ty| ty.methods.is_empty()));
    }

    #[test]
    fn test_insert_dedupes() {
        let mut table = OverrideTable::new();
        let base = Token::new(0x0600_0001);
        let derived = Token::new(0x0600_0002);

        assert!(table.is_empty());
        table.insert(base, derived);
        table.insert(base, derived);
        table.insert(base, base);
        assert_eq!(table.overrides_of(base), &[derived]);
        assert_eq!(table.len(), 1);
    }
}
