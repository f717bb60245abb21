//! The loaded metadata of all assemblies taking part in one link session.
//!
//! [`MetadataModel`] stores every definition in per-table arenas; a definition's token row is
//! its arena index plus one. Rows are numbered across all assemblies, so a [`Token`] is a
//! unique identity for the whole session. The model is immutable once built, see
//! [`crate::metadata::builder::ModelBuilder`].
//!
//! Resolution follows the usual metadata resolver semantics: named types are looked up by
//! assembly and full name, member references by name and signature on the declaring type and
//! then on its base types.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    metadata::{
        assembly::{AssemblyDef, ModuleDef},
        customattributes::{
            parse_custom_attribute_data_with_resolver, ArgumentKind, CustomAttribute,
            CustomAttributeValue,
        },
        generics::GenericParamDef,
        members::{EventDef, FieldDef, FieldReference, PropertyDef},
        method::{MethodDef, MethodReference, MethodSignature},
        token::{TableId, Token},
        typesystem::{CilPrimitiveKind, TypeDef, TypeName, TypeNameModifier, TypeReference},
    },
    Error, Result,
};

/// Upper bound on inheritance depth; deeper chains can only come from cyclic metadata
const MAX_HIERARCHY_DEPTH: usize = 256;

/// How two type references are compared when their definitions may or may not be loaded
#[derive(Debug, PartialEq, Eq)]
enum TypeIdentity {
    Resolved(Token),
    Unresolved(String),
}

/// Read-only graph of assemblies, modules, types and members
#[derive(Debug, Default)]
pub struct MetadataModel {
    pub(crate) assemblies: Vec<AssemblyDef>,
    pub(crate) modules: Vec<ModuleDef>,
    pub(crate) types: Vec<TypeDef>,
    pub(crate) methods: Vec<MethodDef>,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) properties: Vec<PropertyDef>,
    pub(crate) events: Vec<EventDef>,
    pub(crate) generic_params: Vec<GenericParamDef>,
    pub(crate) assembly_index: FxHashMap<String, Token>,
    pub(crate) type_index: FxHashMap<(Token, String), Token>,
    pub(crate) corlib: Option<Token>,
}

fn arena_index(token: Token, table: TableId) -> Option<usize> {
    if token.is_table(table) && token.row() > 0 {
        Some(token.row() as usize - 1)
    } else {
        None
    }
}

impl MetadataModel {
    /// Returns the assembly with the given token
    #[must_use]
    pub fn assembly(&self, token: Token) -> Option<&AssemblyDef> {
        self.assemblies.get(arena_index(token, TableId::Assembly)?)
    }

    /// Returns the module with the given token
    #[must_use]
    pub fn module(&self, token: Token) -> Option<&ModuleDef> {
        self.modules.get(arena_index(token, TableId::Module)?)
    }

    /// Returns the type definition with the given token
    #[must_use]
    pub fn type_def(&self, token: Token) -> Option<&TypeDef> {
        self.types.get(arena_index(token, TableId::TypeDef)?)
    }

    /// Returns the method definition with the given token
    #[must_use]
    pub fn method(&self, token: Token) -> Option<&MethodDef> {
        self.methods.get(arena_index(token, TableId::MethodDef)?)
    }

    /// Returns the field definition with the given token
    #[must_use]
    pub fn field(&self, token: Token) -> Option<&FieldDef> {
        self.fields.get(arena_index(token, TableId::Field)?)
    }

    /// Returns the property definition with the given token
    #[must_use]
    pub fn property(&self, token: Token) -> Option<&PropertyDef> {
        self.properties.get(arena_index(token, TableId::Property)?)
    }

    /// Returns the event definition with the given token
    #[must_use]
    pub fn event(&self, token: Token) -> Option<&EventDef> {
        self.events.get(arena_index(token, TableId::Event)?)
    }

    /// Returns the generic parameter with the given token
    #[must_use]
    pub fn generic_param(&self, token: Token) -> Option<&GenericParamDef> {
        self.generic_params
            .get(arena_index(token, TableId::GenericParam)?)
    }

    /// All loaded assemblies
    pub fn assemblies(&self) -> impl Iterator<Item = &AssemblyDef> {
        self.assemblies.iter()
    }

    /// All modules of all assemblies
    pub fn modules(&self) -> impl Iterator<Item = &ModuleDef> {
        self.modules.iter()
    }

    /// All types of all assemblies, nested types included
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.iter()
    }

    /// All methods of all assemblies
    pub fn methods(&self) -> impl Iterator<Item = &MethodDef> {
        self.methods.iter()
    }

    /// All fields of all assemblies
    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter()
    }

    /// Number of type definitions
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Number of method definitions
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Looks up an assembly by simple name
    #[must_use]
    pub fn assembly_by_name(&self, name: &str) -> Option<&AssemblyDef> {
        self.assembly_index
            .get(name)
            .and_then(|token| self.assembly(*token))
    }

    /// The assembly primitive types resolve against
    #[must_use]
    pub fn corlib(&self) -> Option<Token> {
        self.corlib
    }

    /// Looks up a type by assembly and full name (`Ns.Outer/Inner`)
    #[must_use]
    pub fn find_type(&self, assembly: Token, full_name: &str) -> Option<Token> {
        self.type_index
            .get(&(assembly, full_name.to_string()))
            .copied()
    }

    /// The assembly defining a node
    #[must_use]
    pub fn assembly_of(&self, token: Token) -> Option<Token> {
        match token.table_id()? {
            TableId::Assembly => self.assembly(token).map(|assembly| assembly.token),
            TableId::Module => self.module(token).map(|module| module.assembly),
            TableId::TypeDef => self.type_def(token).map(|ty| ty.assembly),
            TableId::MethodDef => self.assembly_of(self.method(token)?.declaring_type),
            TableId::Field => self.assembly_of(self.field(token)?.declaring_type),
            TableId::Property => self.assembly_of(self.property(token)?.declaring_type),
            TableId::Event => self.assembly_of(self.event(token)?.declaring_type),
            TableId::GenericParam => self.assembly_of(self.generic_param(token)?.owner),
        }
    }

    /// The type declaring a member, or the type owning a generic parameter
    #[must_use]
    pub fn declaring_type_of(&self, token: Token) -> Option<Token> {
        match token.table_id()? {
            TableId::TypeDef => self.type_def(token)?.declaring_type,
            TableId::MethodDef => Some(self.method(token)?.declaring_type),
            TableId::Field => Some(self.field(token)?.declaring_type),
            TableId::Property => Some(self.property(token)?.declaring_type),
            TableId::Event => Some(self.event(token)?.declaring_type),
            TableId::GenericParam => {
                let owner = self.generic_param(token)?.owner;
                if owner.is_table(TableId::TypeDef) {
                    Some(owner)
                } else {
                    self.declaring_type_of(owner)
                }
            }
            TableId::Assembly | TableId::Module => None,
        }
    }

    /// Metadata full name of a type definition, nested types joined with `/`
    #[must_use]
    pub fn full_name(&self, token: Token) -> String {
        let Some(ty) = self.type_def(token) else {
            return format!("<unknown {token}>");
        };
        match ty.declaring_type {
            Some(outer) => format!("{}/{}", self.full_name(outer), ty.name),
            None => ty.full_name(),
        }
    }

    /// Reflection name of a type definition, nested types joined with `+`
    #[must_use]
    pub fn reflection_name(&self, token: Token) -> String {
        self.full_name(token).replace('/', "+")
    }

    /// Full name of the element type a reference points at, without resolving it
    #[must_use]
    pub fn type_name(&self, reference: &TypeReference) -> String {
        match reference.element() {
            TypeReference::Definition(token) => self.full_name(*token),
            TypeReference::External { full_name, .. } => full_name.clone(),
            TypeReference::Primitive(kind) => kind.full_name().to_string(),
            other => other.to_string(),
        }
    }

    /// Human readable description of a method for diagnostics
    #[must_use]
    pub fn method_name(&self, token: Token) -> String {
        match self.method(token) {
            Some(method) => format!("{}::{}", self.full_name(method.declaring_type), method.name),
            None => format!("<unknown {token}>"),
        }
    }

    /// Binds a type reference to its definition.
    ///
    /// Type specifications are peeled to their element type first; primitives resolve against
    /// the corlib.
    ///
    /// # Errors
    /// Returns [`crate::Error::ResolutionFailure`] if the scope is not loaded, the scope does not
    /// define the type, or the reference is a generic parameter.
    pub fn resolve_type(&self, reference: &TypeReference) -> Result<Token> {
        match reference.element() {
            TypeReference::Definition(token) => match self.type_def(*token) {
                Some(_) => Ok(*token),
                None => Err(Error::ResolutionFailure(format!("type definition {token}"))),
            },
            TypeReference::External { scope, full_name } => self
                .assembly_by_name(scope)
                .and_then(|assembly| self.find_type(assembly.token, full_name))
                .ok_or_else(|| Error::ResolutionFailure(format!("[{scope}]{full_name}"))),
            TypeReference::Primitive(kind) => self
                .corlib
                .and_then(|corlib| self.find_type(corlib, kind.full_name()))
                .ok_or_else(|| Error::ResolutionFailure(format!("primitive {}", kind.full_name()))),
            other => Err(Error::ResolutionFailure(format!("generic parameter {other}"))),
        }
    }

    /// Binds a method reference to its definition.
    ///
    /// Member references are matched by name and signature on the declaring type, then on each
    /// of its base types in turn.
    ///
    /// # Errors
    /// Returns [`crate::Error::ResolutionFailure`] if no matching definition exists.
    pub fn resolve_method(&self, reference: &MethodReference) -> Result<Token> {
        match reference.element() {
            MethodReference::Definition(token) => match self.method(*token) {
                Some(_) => Ok(*token),
                None => Err(Error::ResolutionFailure(format!("method definition {token}"))),
            },
            MethodReference::Member {
                declaring_type,
                name,
                signature,
            } => {
                let start = self.resolve_type(declaring_type)?;
                for (ty, _) in self.hierarchy(start) {
                    let Some(type_def) = self.type_def(ty) else {
                        continue;
                    };
                    let found = type_def.methods.iter().copied().find(|candidate| {
                        self.method(*candidate).is_some_and(|method| {
                            method.name == *name
                                && self.signatures_equal(&method.signature(), signature)
                        })
                    });
                    if let Some(found) = found {
                        return Ok(found);
                    }
                }
                Err(Error::ResolutionFailure(reference.to_string()))
            }
            MethodReference::GenericInstance { .. } => {
                Err(Error::ResolutionFailure(reference.to_string()))
            }
        }
    }

    /// Binds a field reference to its definition.
    ///
    /// # Errors
    /// Returns [`crate::Error::ResolutionFailure`] if no matching definition exists.
    pub fn resolve_field(&self, reference: &FieldReference) -> Result<Token> {
        match reference {
            FieldReference::Definition(token) => match self.field(*token) {
                Some(_) => Ok(*token),
                None => Err(Error::ResolutionFailure(format!("field definition {token}"))),
            },
            FieldReference::Member {
                declaring_type,
                name,
                field_type,
            } => {
                let start = self.resolve_type(declaring_type)?;
                for (ty, _) in self.hierarchy(start) {
                    let Some(type_def) = self.type_def(ty) else {
                        continue;
                    };
                    let found = type_def.fields.iter().copied().find(|candidate| {
                        self.field(*candidate).is_some_and(|field| {
                            field.name == *name && self.types_equal(&field.field_type, field_type)
                        })
                    });
                    if let Some(found) = found {
                        return Ok(found);
                    }
                }
                Err(Error::ResolutionFailure(reference.to_string()))
            }
        }
    }

    /// Resolves the base type of a type definition, `None` if it has none
    ///
    /// # Errors
    /// Returns [`crate::Error::ResolutionFailure`] if the base type cannot be bound.
    pub fn base_type(&self, token: Token) -> Result<Option<Token>> {
        match self.type_def(token).and_then(|ty| ty.base.as_ref()) {
            Some(base) => self.resolve_type(base).map(Some),
            None => Ok(None),
        }
    }

    /// The type itself followed by its resolvable base types, each with the type arguments it
    /// is instantiated with as seen from `token`.
    ///
    /// The walk stops at the first base that cannot be resolved, and at a repeated type.
    #[must_use]
    pub fn hierarchy(&self, token: Token) -> Vec<(Token, Vec<TypeReference>)> {
        let mut chain = Vec::new();
        let mut visited = FxHashSet::default();
        let mut current = Some((token, Vec::new()));

        while let Some((ty, args)) = current.take() {
            if !visited.insert(ty) || chain.len() >= MAX_HIERARCHY_DEPTH {
                break;
            }

            current = self
                .type_def(ty)
                .and_then(|type_def| type_def.base.as_ref())
                .and_then(|base| {
                    let base = base.substitute(&args, &[]);
                    let base_token = self.resolve_type(&base).ok()?;
                    let base_args = match base {
                        TypeReference::GenericInstance { arguments, .. } => arguments,
                        _ => Vec::new(),
                    };
                    Some((base_token, base_args))
                });
            chain.push((ty, args));
        }
        chain
    }

    /// Compares two method signatures, ignoring the `this` flag
    #[must_use]
    pub fn signatures_equal(&self, a: &MethodSignature, b: &MethodSignature) -> bool {
        a.generic_param_count == b.generic_param_count
            && a.params.len() == b.params.len()
            && self.types_equal(&a.return_type, &b.return_type)
            && a
                .params
                .iter()
                .zip(&b.params)
                .all(|(left, right)| self.types_equal(left, right))
    }

    /// Structural type equality; named types are equal when they resolve to the same
    /// definition, or when neither resolves and their names agree.
    #[must_use]
    pub fn types_equal(&self, a: &TypeReference, b: &TypeReference) -> bool {
        match (a, b) {
            (TypeReference::Var(x), TypeReference::Var(y))
            | (TypeReference::MVar(x), TypeReference::MVar(y)) => x == y,
            (
                TypeReference::GenericInstance {
                    element: e1,
                    arguments: a1,
                },
                TypeReference::GenericInstance {
                    element: e2,
                    arguments: a2,
                },
            ) => {
                a1.len() == a2.len()
                    && self.types_equal(e1, e2)
                    && a1.iter().zip(a2).all(|(x, y)| self.types_equal(x, y))
            }
            (
                TypeReference::Array {
                    element: e1,
                    rank: r1,
                },
                TypeReference::Array {
                    element: e2,
                    rank: r2,
                },
            ) => r1 == r2 && self.types_equal(e1, e2),
            (TypeReference::Pointer(x), TypeReference::Pointer(y))
            | (TypeReference::ByRef(x), TypeReference::ByRef(y))
            | (TypeReference::Pinned(x), TypeReference::Pinned(y)) => self.types_equal(x, y),
            (
                TypeReference::Modified {
                    modifier: m1,
                    required: r1,
                    element: e1,
                },
                TypeReference::Modified {
                    modifier: m2,
                    required: r2,
                    element: e2,
                },
            ) => r1 == r2 && self.types_equal(m1, m2) && self.types_equal(e1, e2),
            _ => match (self.type_identity(a), self.type_identity(b)) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }

    fn type_identity(&self, reference: &TypeReference) -> Option<TypeIdentity> {
        match reference {
            TypeReference::Definition(_)
            | TypeReference::External { .. }
            | TypeReference::Primitive(_) => Some(match self.resolve_type(reference) {
                Ok(token) => TypeIdentity::Resolved(token),
                Err(_) => TypeIdentity::Unresolved(self.type_name(reference)),
            }),
            _ => None,
        }
    }

    /// Returns true if the type derives from `System.ValueType` (or is an enum)
    #[must_use]
    pub fn is_value_type(&self, token: Token) -> bool {
        let Some(ty) = self.type_def(token) else {
            return false;
        };
        match ty.base.as_ref().map(|base| self.type_name(base)) {
            Some(base) if base == "System.ValueType" => self.full_name(token) != "System.Enum",
            Some(base) if base == "System.Enum" => true,
            _ => false,
        }
    }

    /// Returns true if the type derives from `System.Enum`
    #[must_use]
    pub fn is_enum(&self, token: Token) -> bool {
        self.type_def(token)
            .and_then(|ty| ty.base.as_ref())
            .is_some_and(|base| self.type_name(base) == "System.Enum")
    }

    /// Returns true if the type's base type is `System.MulticastDelegate`
    #[must_use]
    pub fn is_multicast_delegate(&self, token: Token) -> bool {
        self.type_def(token)
            .and_then(|ty| ty.base.as_ref())
            .is_some_and(|base| self.type_name(base) == "System.MulticastDelegate")
    }

    /// Finds the first method with the given name declared directly on a type
    #[must_use]
    pub fn find_method(&self, ty: Token, name: &str) -> Option<Token> {
        self.type_def(ty)?
            .methods
            .iter()
            .copied()
            .find(|method| self.method(*method).is_some_and(|m| m.name == name))
    }

    /// Finds a field by name declared directly on a type
    #[must_use]
    pub fn find_field(&self, ty: Token, name: &str) -> Option<Token> {
        self.type_def(ty)?
            .fields
            .iter()
            .copied()
            .find(|field| self.field(*field).is_some_and(|f| f.name == name))
    }

    /// Finds a property by name declared directly on a type
    #[must_use]
    pub fn find_property(&self, ty: Token, name: &str) -> Option<Token> {
        self.type_def(ty)?
            .properties
            .iter()
            .copied()
            .find(|property| self.property(*property).is_some_and(|p| p.name == name))
    }

    /// Finds the setter of a named property on a type or its base types
    #[must_use]
    pub fn find_property_setter(&self, ty: Token, name: &str) -> Option<Token> {
        self.hierarchy(ty).into_iter().find_map(|(current, _)| {
            self.find_property(current, name)
                .and_then(|property| self.property(property)?.setter)
        })
    }

    /// Finds a named field on a type or its base types
    #[must_use]
    pub fn find_field_in_hierarchy(&self, ty: Token, name: &str) -> Option<Token> {
        self.hierarchy(ty)
            .into_iter()
            .find_map(|(current, _)| self.find_field(current, name))
    }

    /// The integer kind of an enum, read from its `value__` instance field
    #[must_use]
    pub fn enum_underlying(&self, token: Token) -> Option<ArgumentKind> {
        let ty = self.type_def(token)?;
        ty.fields
            .iter()
            .filter_map(|field| self.field(*field))
            .find(|field| !field.is_static() && field.name == "value__")
            .and_then(|field| match &field.field_type {
                TypeReference::Primitive(kind) => primitive_argument_kind(*kind),
                _ => None,
            })
    }

    /// How a constructor parameter of this type is encoded in an attribute blob, `None` if the
    /// type cannot appear in a custom attribute
    #[must_use]
    pub fn attribute_argument_kind(&self, reference: &TypeReference) -> Option<ArgumentKind> {
        match reference {
            TypeReference::Primitive(kind) => primitive_argument_kind(*kind),
            TypeReference::Array { element, rank: 1 } => Some(ArgumentKind::SzArray(Box::new(
                self.attribute_argument_kind(element)?,
            ))),
            TypeReference::Definition(_) | TypeReference::External { .. } => {
                let name = self.type_name(reference);
                if name == "System.Type" {
                    return Some(ArgumentKind::Type);
                }
                if let Some(kind) = CilPrimitiveKind::from_full_name(&name) {
                    return primitive_argument_kind(kind);
                }

                let token = self.resolve_type(reference).ok()?;
                if self.is_enum(token) {
                    Some(ArgumentKind::Enum {
                        name: self.reflection_name(token),
                        underlying: Box::new(self.enum_underlying(token)?),
                    })
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Binds a parsed reflection type name to a type reference.
    ///
    /// Assembly qualified names are looked up in the named assembly only; unqualified names in
    /// each of `scopes` in order. Generic arguments are resolved the same way.
    #[must_use]
    pub fn resolve_type_name(&self, name: &TypeName, scopes: &[Token]) -> Option<TypeReference> {
        let full_name = name.full_name();
        let definition = match name.assembly_name() {
            Some(assembly) => {
                let assembly = self.assembly_by_name(assembly)?;
                self.find_type(assembly.token, &full_name)?
            }
            None => scopes
                .iter()
                .find_map(|scope| self.find_type(*scope, &full_name))?,
        };

        let mut reference = TypeReference::Definition(definition);
        if !name.generic_arguments.is_empty() {
            let arguments = name
                .generic_arguments
                .iter()
                .map(|argument| self.resolve_type_name(argument, scopes))
                .collect::<Option<Vec<_>>>()?;
            reference = TypeReference::generic_instance(reference, arguments);
        }

        for modifier in &name.modifiers {
            reference = match modifier {
                TypeNameModifier::SzArray => TypeReference::sz_array(reference),
                TypeNameModifier::Array(rank) => TypeReference::Array {
                    element: Box::new(reference),
                    rank: *rank,
                },
                TypeNameModifier::Pointer => TypeReference::pointer(reference),
                TypeNameModifier::ByRef => TypeReference::by_ref(reference),
            };
        }
        Some(reference)
    }

    /// Decodes a custom attribute blob against its resolved constructor.
    ///
    /// Enum types named inside the blob are looked up in the constructor's assembly, then in the
    /// corlib.
    ///
    /// # Errors
    /// Returns [`crate::Error::ResolutionFailure`] if the constructor cannot be resolved and
    /// [`crate::Error::Malformed`] if the blob does not match the constructor or a parameter
    /// type cannot be encoded in an attribute.
    pub fn decode_custom_attribute(&self, attribute: &CustomAttribute) -> Result<CustomAttributeValue> {
        let ctor_token = self.resolve_method(&attribute.constructor)?;
        let ctor = self
            .method(ctor_token)
            .ok_or_else(|| Error::ResolutionFailure(attribute.constructor.to_string()))?;

        let params = ctor
            .params
            .iter()
            .map(|param| {
                self.attribute_argument_kind(&param.param_type).ok_or_else(|| {
                    malformed_error!(
                        "Parameter {} of {} has no attribute encoding",
                        param.name,
                        self.method_name(ctor_token)
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let scopes: Vec<Token> = self
            .assembly_of(ctor_token)
            .into_iter()
            .chain(self.corlib)
            .collect();
        let resolver = |enum_name: &str| {
            let parsed = TypeName::parse(enum_name).ok()?;
            let reference = self.resolve_type_name(&parsed, &scopes)?;
            self.enum_underlying(reference.as_definition()?)
        };

        parse_custom_attribute_data_with_resolver(&attribute.blob, &params, &resolver)
    }
}

fn primitive_argument_kind(kind: CilPrimitiveKind) -> Option<ArgumentKind> {
    Some(match kind {
        CilPrimitiveKind::Boolean => ArgumentKind::Boolean,
        CilPrimitiveKind::Char => ArgumentKind::Char,
        CilPrimitiveKind::I1 => ArgumentKind::I1,
        CilPrimitiveKind::U1 => ArgumentKind::U1,
        CilPrimitiveKind::I2 => ArgumentKind::I2,
        CilPrimitiveKind::U2 => ArgumentKind::U2,
        CilPrimitiveKind::I4 => ArgumentKind::I4,
        CilPrimitiveKind::U4 => ArgumentKind::U4,
        CilPrimitiveKind::I8 => ArgumentKind::I8,
        CilPrimitiveKind::U8 => ArgumentKind::U8,
        CilPrimitiveKind::R4 => ArgumentKind::R4,
        CilPrimitiveKind::R8 => ArgumentKind::R8,
        CilPrimitiveKind::String => ArgumentKind::String,
        CilPrimitiveKind::Object => ArgumentKind::Object,
        CilPrimitiveKind::Void
        | CilPrimitiveKind::I
        | CilPrimitiveKind::U
        | CilPrimitiveKind::TypedReference => return None,
    })
}
