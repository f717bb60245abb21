//! Fluent construction of a [`MetadataModel`].
//!
//! [`ModelBuilder`] allocates tokens in definition order and keeps the name index of the
//! model current, so references to already built types resolve while the rest of the model
//! is still being put together. Member builders borrow the model builder mutably and hand
//! back the new definition's token from `build()`.
//!
//! # Examples
//!
//! ```rust
//! use dotlink::metadata::{builder::ModelBuilder, typesystem::CilPrimitiveKind};
//!
//! let mut builder = ModelBuilder::new();
//! let corlib = builder.corlib();
//! let app = builder.assembly("App");
//! let program = builder.class(app, "App", "Program").extends(corlib.object()).build();
//!
//! let helper = builder
//!     .method(program, "Helper")
//!     .static_()
//!     .returns(CilPrimitiveKind::I4.into())
//!     .body(|body| body.ldc_i4(42).ret())
//!     .build();
//! let main = builder
//!     .method(program, "Main")
//!     .static_()
//!     .body(|body| body.call(helper).pop().ret())
//!     .build();
//!
//! let model = builder.finish();
//! assert_eq!(model.method_name(main), "App.Program::Main");
//! assert_eq!(model.type_def(program).unwrap().methods, vec![helper, main]);
//! ```

mod body;
mod corlib;

pub use body::MethodBodyBuilder;
pub use corlib::{CorLib, CORLIB_NAME};

use crate::{
    metadata::{
        assembly::{AssemblyDef, ModuleDef},
        customattributes::{
            encode_custom_attribute_value, ArgumentKind, CustomAttribute,
            CustomAttributeArgument, CustomAttributeNamedArgument, CustomAttributeValue,
        },
        generics::GenericParamDef,
        marshalling::MarshalSpec,
        members::{EventDef, FieldAttributes, FieldDef, PropertyDef},
        method::{
            MethodAccessFlags, MethodBody, MethodDef, MethodModifiers, MethodReference,
            MethodSemantics, MethodVtableFlags, Parameter, CONSTRUCTOR_NAME,
            STATIC_CONSTRUCTOR_NAME,
        },
        token::{TableId, Token},
        typesystem::{CilPrimitiveKind, TypeAttributes, TypeDef, TypeReference},
        MetadataModel,
    },
    Error, Result,
};

fn next_token(table: TableId, len: usize) -> Token {
    Token::from_parts(table, u32::try_from(len + 1).unwrap_or(0x00FF_FFFF))
}

fn arena_index(token: Token) -> usize {
    (token.row() as usize).saturating_sub(1)
}

/// A generic parameter waiting for its owner's token
struct PendingGenericParam {
    name: String,
    flags: u32,
    constraints: Vec<TypeReference>,
}

/// Builds a [`MetadataModel`] one definition at a time
#[derive(Debug, Default)]
pub struct ModelBuilder {
    model: MetadataModel,
    corlib: Option<CorLib>,
}

impl ModelBuilder {
    /// Creates an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assembly with a single manifest module and returns its token
    pub fn assembly(&mut self, name: &str) -> Token {
        let token = next_token(TableId::Assembly, self.model.assemblies.len());
        let module = next_token(TableId::Module, self.model.modules.len());

        self.model.modules.push(ModuleDef {
            token: module,
            name: format!("{name}.dll"),
            assembly: token,
            types: Vec::new(),
            custom_attributes: Vec::new(),
        });
        self.model.assemblies.push(AssemblyDef {
            token,
            name: name.to_string(),
            modules: vec![module],
            custom_attributes: Vec::new(),
        });
        self.model.assembly_index.insert(name.to_string(), token);
        token
    }

    /// Designates the assembly primitive types resolve against
    pub fn set_corlib(&mut self, assembly: Token) {
        self.model.corlib = Some(assembly);
    }

    /// Creates a minimal `mscorlib` on first use and returns its well-known definitions
    pub fn corlib(&mut self) -> CorLib {
        if let Some(corlib) = self.corlib {
            return corlib;
        }
        let corlib = CorLib::create(self);
        self.corlib = Some(corlib);
        corlib
    }

    /// The model as built so far
    #[must_use]
    pub fn model(&self) -> &MetadataModel {
        &self.model
    }

    /// Finishes construction
    #[must_use]
    pub fn finish(self) -> MetadataModel {
        self.model
    }

    /// Starts a type definition with raw `TypeAttributes`
    pub fn type_def(
        &mut self,
        assembly: Token,
        namespace: &str,
        name: &str,
        flags: u32,
    ) -> TypeDefBuilder<'_> {
        TypeDefBuilder {
            builder: self,
            assembly,
            namespace: namespace.to_string(),
            name: name.to_string(),
            flags,
            base: None,
            interfaces: Vec::new(),
            declaring_type: None,
            generic_params: Vec::new(),
            custom_attributes: Vec::new(),
        }
    }

    /// Starts a public class
    pub fn class(&mut self, assembly: Token, namespace: &str, name: &str) -> TypeDefBuilder<'_> {
        self.type_def(assembly, namespace, name, TypeAttributes::PUBLIC)
    }

    /// Starts a public interface
    pub fn interface(
        &mut self,
        assembly: Token,
        namespace: &str,
        name: &str,
    ) -> TypeDefBuilder<'_> {
        self.type_def(
            assembly,
            namespace,
            name,
            TypeAttributes::PUBLIC | TypeAttributes::INTERFACE | TypeAttributes::ABSTRACT,
        )
    }

    /// Starts a public, non-virtual instance method
    pub fn method(&mut self, declaring_type: Token, name: &str) -> MethodBuilder<'_> {
        MethodBuilder {
            builder: self,
            declaring_type,
            name: name.to_string(),
            access: MethodAccessFlags::PUBLIC,
            vtable: MethodVtableFlags::REUSE_SLOT,
            modifiers: MethodModifiers::HIDE_BY_SIG,
            params: Vec::new(),
            return_type: Parameter::new("", CilPrimitiveKind::Void.into()),
            generic_params: Vec::new(),
            overrides: Vec::new(),
            body: None,
            custom_attributes: Vec::new(),
        }
    }

    /// Starts a public instance constructor
    pub fn constructor(&mut self, declaring_type: Token) -> MethodBuilder<'_> {
        self.method(declaring_type, CONSTRUCTOR_NAME)
            .modifiers(MethodModifiers::SPECIAL_NAME | MethodModifiers::RTSPECIAL_NAME)
            .body(MethodBodyBuilder::ret)
    }

    /// Starts the type initializer
    pub fn static_constructor(&mut self, declaring_type: Token) -> MethodBuilder<'_> {
        self.method(declaring_type, STATIC_CONSTRUCTOR_NAME)
            .private()
            .modifiers(
                MethodModifiers::STATIC
                    | MethodModifiers::SPECIAL_NAME
                    | MethodModifiers::RTSPECIAL_NAME,
            )
            .body(MethodBodyBuilder::ret)
    }

    /// Starts a public instance field
    pub fn field(
        &mut self,
        declaring_type: Token,
        name: &str,
        field_type: TypeReference,
    ) -> FieldBuilder<'_> {
        FieldBuilder {
            builder: self,
            declaring_type,
            name: name.to_string(),
            flags: FieldAttributes::PUBLIC,
            field_type,
            marshal: None,
            custom_attributes: Vec::new(),
        }
    }

    /// Starts a property; accessors are attached with [`PropertyBuilder::getter`] and
    /// [`PropertyBuilder::setter`]
    pub fn property(
        &mut self,
        declaring_type: Token,
        name: &str,
        property_type: TypeReference,
    ) -> PropertyBuilder<'_> {
        PropertyBuilder {
            builder: self,
            declaring_type,
            name: name.to_string(),
            property_type,
            getter: None,
            setter: None,
            other: Vec::new(),
            custom_attributes: Vec::new(),
        }
    }

    /// Starts an event
    pub fn event(
        &mut self,
        declaring_type: Token,
        name: &str,
        event_type: TypeReference,
    ) -> EventBuilder<'_> {
        EventBuilder {
            builder: self,
            declaring_type,
            name: name.to_string(),
            event_type,
            add: None,
            remove: None,
            fire: None,
            custom_attributes: Vec::new(),
        }
    }

    /// Attaches a custom attribute to an assembly or module
    ///
    /// # Errors
    /// Returns [`crate::Error::ConfigurationError`] if `owner` is neither.
    pub fn add_attribute(&mut self, owner: Token, attribute: CustomAttribute) -> Result<()> {
        let target = match owner.table_id() {
            Some(TableId::Assembly) => self
                .model
                .assemblies
                .get_mut(arena_index(owner))
                .map(|assembly| &mut assembly.custom_attributes),
            Some(TableId::Module) => self
                .model
                .modules
                .get_mut(arena_index(owner))
                .map(|module| &mut module.custom_attributes),
            _ => None,
        };

        match target {
            Some(attributes) => {
                attributes.push(attribute);
                Ok(())
            }
            None => Err(Error::ConfigurationError(format!(
                "{owner} is not an assembly or module"
            ))),
        }
    }

    fn push_generic_params(&mut self, owner: Token, pending: Vec<PendingGenericParam>) -> Vec<Token> {
        pending
            .into_iter()
            .enumerate()
            .map(|(number, param)| {
                let token = next_token(TableId::GenericParam, self.model.generic_params.len());
                self.model.generic_params.push(GenericParamDef {
                    token,
                    name: param.name,
                    number: u32::try_from(number).unwrap_or(u32::MAX),
                    owner,
                    flags: param.flags,
                    constraints: param.constraints,
                    custom_attributes: Vec::new(),
                });
                token
            })
            .collect()
    }

    fn type_mut(&mut self, token: Token) -> Option<&mut TypeDef> {
        if token.is_table(TableId::TypeDef) {
            self.model.types.get_mut(arena_index(token))
        } else {
            None
        }
    }

    fn method_mut(&mut self, token: Token) -> Option<&mut MethodDef> {
        if token.is_table(TableId::MethodDef) {
            self.model.methods.get_mut(arena_index(token))
        } else {
            None
        }
    }
}

/// Builder for a [`TypeDef`]
pub struct TypeDefBuilder<'a> {
    builder: &'a mut ModelBuilder,
    assembly: Token,
    namespace: String,
    name: String,
    flags: u32,
    base: Option<TypeReference>,
    interfaces: Vec<TypeReference>,
    declaring_type: Option<Token>,
    generic_params: Vec<PendingGenericParam>,
    custom_attributes: Vec<CustomAttribute>,
}

impl TypeDefBuilder<'_> {
    /// Adds raw `TypeAttributes` bits
    #[must_use]
    pub fn flags(mut self, flags: u32) -> Self {
        self.flags |= flags;
        self
    }

    /// Sets the base type
    #[must_use]
    pub fn extends(mut self, base: TypeReference) -> Self {
        self.base = Some(base);
        self
    }

    /// Adds an implemented interface
    #[must_use]
    pub fn implements(mut self, interface: TypeReference) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Nests the type inside `outer`; nested types have no namespace of their own
    #[must_use]
    pub fn nested_in(mut self, outer: Token) -> Self {
        self.declaring_type = Some(outer);
        self.namespace.clear();
        self.flags = (self.flags & !TypeAttributes::VISIBILITY_MASK) | TypeAttributes::NESTED_PUBLIC;
        self
    }

    /// Adds an unconstrained generic parameter
    #[must_use]
    pub fn generic_param(self, name: &str) -> Self {
        self.generic_param_with(name, 0, Vec::new())
    }

    /// Adds a generic parameter with `GenericParamAttributes` and constraint types
    #[must_use]
    pub fn generic_param_with(
        mut self,
        name: &str,
        flags: u32,
        constraints: Vec<TypeReference>,
    ) -> Self {
        self.generic_params.push(PendingGenericParam {
            name: name.to_string(),
            flags,
            constraints,
        });
        self
    }

    /// Attaches a custom attribute
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.custom_attributes.push(attribute);
        self
    }

    /// Adds the type to the model
    pub fn build(self) -> Token {
        let builder = self.builder;
        let token = next_token(TableId::TypeDef, builder.model.types.len());
        let module = builder
            .model
            .assembly(self.assembly)
            .and_then(|assembly| assembly.modules.first().copied())
            .unwrap_or(Token(0));
        let generic_params = builder.push_generic_params(token, self.generic_params);

        let ty = TypeDef {
            token,
            namespace: self.namespace,
            name: self.name,
            flags: self.flags,
            assembly: self.assembly,
            module,
            declaring_type: self.declaring_type,
            base: self.base,
            interfaces: self.interfaces,
            fields: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
            nested_types: Vec::new(),
            generic_params,
            custom_attributes: self.custom_attributes,
        };

        let full_name = match ty.declaring_type {
            Some(outer) => format!("{}/{}", builder.model.full_name(outer), ty.name),
            None => ty.full_name(),
        };
        builder
            .model
            .type_index
            .insert((self.assembly, full_name), token);

        match ty.declaring_type {
            Some(outer) => {
                if let Some(outer) = builder.type_mut(outer) {
                    outer.nested_types.push(token);
                }
            }
            None => {
                if let Some(module) = builder.model.modules.get_mut(arena_index(module)) {
                    module.types.push(token);
                }
            }
        }
        builder.model.types.push(ty);
        token
    }
}

/// Builder for a [`MethodDef`]
pub struct MethodBuilder<'a> {
    builder: &'a mut ModelBuilder,
    declaring_type: Token,
    name: String,
    access: MethodAccessFlags,
    vtable: MethodVtableFlags,
    modifiers: MethodModifiers,
    params: Vec<Parameter>,
    return_type: Parameter,
    generic_params: Vec<PendingGenericParam>,
    overrides: Vec<MethodReference>,
    body: Option<MethodBody>,
    custom_attributes: Vec<CustomAttribute>,
}

impl MethodBuilder<'_> {
    /// Adds modifier flags
    #[must_use]
    pub fn modifiers(mut self, modifiers: MethodModifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    /// Makes the method private
    #[must_use]
    pub fn private(mut self) -> Self {
        self.access = MethodAccessFlags::PRIVATE;
        self
    }

    /// Makes the method accessible to derived types only
    #[must_use]
    pub fn family(mut self) -> Self {
        self.access = MethodAccessFlags::FAMILY;
        self
    }

    /// Makes the method static
    #[must_use]
    pub fn static_(self) -> Self {
        self.modifiers(MethodModifiers::STATIC)
    }

    /// Makes the method virtual, reusing an inherited slot when one matches
    #[must_use]
    pub fn virtual_(self) -> Self {
        self.modifiers(MethodModifiers::VIRTUAL)
    }

    /// Makes the method abstract; abstract methods have no body
    #[must_use]
    pub fn abstract_(mut self) -> Self {
        self.body = None;
        self.modifiers(MethodModifiers::VIRTUAL | MethodModifiers::ABSTRACT)
    }

    /// Gives a virtual method a new slot instead of overriding an inherited one
    #[must_use]
    pub fn newslot(mut self) -> Self {
        self.vtable = MethodVtableFlags::NEW_SLOT;
        self
    }

    /// Adds a parameter
    #[must_use]
    pub fn param(self, name: &str, param_type: TypeReference) -> Self {
        self.param_with(Parameter::new(name, param_type))
    }

    /// Adds a fully described parameter
    #[must_use]
    pub fn param_with(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    /// Sets the return type
    #[must_use]
    pub fn returns(mut self, return_type: TypeReference) -> Self {
        self.return_type.param_type = return_type;
        self
    }

    /// Attaches a custom attribute to the return value
    #[must_use]
    pub fn return_attribute(mut self, attribute: CustomAttribute) -> Self {
        self.return_type.custom_attributes.push(attribute);
        self
    }

    /// Sets the marshalling of the return value
    #[must_use]
    pub fn return_marshal(mut self, marshal: MarshalSpec) -> Self {
        self.return_type.marshal = Some(marshal);
        self
    }

    /// Adds an unconstrained method generic parameter
    #[must_use]
    pub fn generic_param(self, name: &str) -> Self {
        self.generic_param_with(name, 0, Vec::new())
    }

    /// Adds a method generic parameter with `GenericParamAttributes` and constraint types
    #[must_use]
    pub fn generic_param_with(
        mut self,
        name: &str,
        flags: u32,
        constraints: Vec<TypeReference>,
    ) -> Self {
        self.generic_params.push(PendingGenericParam {
            name: name.to_string(),
            flags,
            constraints,
        });
        self
    }

    /// Records an explicit `MethodImpl` override
    #[must_use]
    pub fn overrides(mut self, base: impl Into<MethodReference>) -> Self {
        self.overrides.push(base.into());
        self
    }

    /// Attaches a custom attribute
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.custom_attributes.push(attribute);
        self
    }

    /// Sets the body from a [`MethodBodyBuilder`] chain
    #[must_use]
    pub fn body<F>(mut self, f: F) -> Self
    where
        F: FnOnce(MethodBodyBuilder) -> MethodBodyBuilder,
    {
        self.body = Some(f(MethodBodyBuilder::new()).build());
        self
    }

    /// Removes the body, as for runtime-implemented or P/Invoke methods
    #[must_use]
    pub fn no_body(mut self) -> Self {
        self.body = None;
        self
    }

    /// Adds the method to its declaring type
    pub fn build(self) -> Token {
        let builder = self.builder;
        let token = next_token(TableId::MethodDef, builder.model.methods.len());
        let generic_params = builder.push_generic_params(token, self.generic_params);

        builder.model.methods.push(MethodDef {
            token,
            name: self.name,
            declaring_type: self.declaring_type,
            flags_access: self.access,
            flags_vtable: self.vtable,
            flags_modifiers: self.modifiers,
            semantics: MethodSemantics::empty(),
            accessor_of: None,
            params: self.params,
            return_type: self.return_type,
            generic_params,
            overrides: self.overrides,
            body: self.body,
            custom_attributes: self.custom_attributes,
        });
        if let Some(ty) = builder.type_mut(self.declaring_type) {
            ty.methods.push(token);
        }
        token
    }
}

/// Builder for a [`FieldDef`]
pub struct FieldBuilder<'a> {
    builder: &'a mut ModelBuilder,
    declaring_type: Token,
    name: String,
    flags: u32,
    field_type: TypeReference,
    marshal: Option<MarshalSpec>,
    custom_attributes: Vec<CustomAttribute>,
}

impl FieldBuilder<'_> {
    /// Makes the field static
    #[must_use]
    pub fn static_(mut self) -> Self {
        self.flags |= FieldAttributes::STATIC;
        self
    }

    /// Makes the field private
    #[must_use]
    pub fn private(mut self) -> Self {
        self.flags = (self.flags & !FieldAttributes::FIELD_ACCESS_MASK) | FieldAttributes::PRIVATE;
        self
    }

    /// Sets the marshalling information
    #[must_use]
    pub fn marshal(mut self, marshal: MarshalSpec) -> Self {
        self.flags |= FieldAttributes::HAS_FIELD_MARSHAL;
        self.marshal = Some(marshal);
        self
    }

    /// Attaches a custom attribute
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.custom_attributes.push(attribute);
        self
    }

    /// Adds the field to its declaring type
    pub fn build(self) -> Token {
        let builder = self.builder;
        let token = next_token(TableId::Field, builder.model.fields.len());
        builder.model.fields.push(FieldDef {
            token,
            name: self.name,
            flags: self.flags,
            declaring_type: self.declaring_type,
            field_type: self.field_type,
            custom_attributes: self.custom_attributes,
            marshal: self.marshal,
        });
        if let Some(ty) = builder.type_mut(self.declaring_type) {
            ty.fields.push(token);
        }
        token
    }
}

/// Builder for a [`PropertyDef`]
pub struct PropertyBuilder<'a> {
    builder: &'a mut ModelBuilder,
    declaring_type: Token,
    name: String,
    property_type: TypeReference,
    getter: Option<Token>,
    setter: Option<Token>,
    other: Vec<Token>,
    custom_attributes: Vec<CustomAttribute>,
}

impl PropertyBuilder<'_> {
    /// Sets the `get_` accessor
    #[must_use]
    pub fn getter(mut self, method: Token) -> Self {
        self.getter = Some(method);
        self
    }

    /// Sets the `set_` accessor
    #[must_use]
    pub fn setter(mut self, method: Token) -> Self {
        self.setter = Some(method);
        self
    }

    /// Adds an accessor with `Other` semantics
    #[must_use]
    pub fn other(mut self, method: Token) -> Self {
        self.other.push(method);
        self
    }

    /// Attaches a custom attribute
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.custom_attributes.push(attribute);
        self
    }

    /// Adds the property and records the accessor semantics on its methods
    pub fn build(self) -> Token {
        let builder = self.builder;
        let token = next_token(TableId::Property, builder.model.properties.len());

        let accessors = self
            .getter
            .map(|m| (m, MethodSemantics::GETTER))
            .into_iter()
            .chain(self.setter.map(|m| (m, MethodSemantics::SETTER)))
            .chain(self.other.iter().map(|m| (*m, MethodSemantics::OTHER)));
        for (method, semantics) in accessors {
            if let Some(method) = builder.method_mut(method) {
                method.semantics |= semantics;
                method.accessor_of = Some(token);
            }
        }

        builder.model.properties.push(PropertyDef {
            token,
            name: self.name,
            declaring_type: self.declaring_type,
            property_type: self.property_type,
            getter: self.getter,
            setter: self.setter,
            other: self.other,
            custom_attributes: self.custom_attributes,
        });
        if let Some(ty) = builder.type_mut(self.declaring_type) {
            ty.properties.push(token);
        }
        token
    }
}

/// Builder for an [`EventDef`]
pub struct EventBuilder<'a> {
    builder: &'a mut ModelBuilder,
    declaring_type: Token,
    name: String,
    event_type: TypeReference,
    add: Option<Token>,
    remove: Option<Token>,
    fire: Option<Token>,
    custom_attributes: Vec<CustomAttribute>,
}

impl EventBuilder<'_> {
    /// Sets the `add_` accessor
    #[must_use]
    pub fn add(mut self, method: Token) -> Self {
        self.add = Some(method);
        self
    }

    /// Sets the `remove_` accessor
    #[must_use]
    pub fn remove(mut self, method: Token) -> Self {
        self.remove = Some(method);
        self
    }

    /// Sets the `raise_` accessor
    #[must_use]
    pub fn fire(mut self, method: Token) -> Self {
        self.fire = Some(method);
        self
    }

    /// Attaches a custom attribute
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.custom_attributes.push(attribute);
        self
    }

    /// Adds the event and records the accessor semantics on its methods
    pub fn build(self) -> Token {
        let builder = self.builder;
        let token = next_token(TableId::Event, builder.model.events.len());

        let accessors = [
            (self.add, MethodSemantics::ADD_ON),
            (self.remove, MethodSemantics::REMOVE_ON),
            (self.fire, MethodSemantics::FIRE),
        ];
        for (method, semantics) in accessors {
            if let Some(method) = method.and_then(|m| builder.method_mut(m)) {
                method.semantics |= semantics;
                method.accessor_of = Some(token);
            }
        }

        builder.model.events.push(EventDef {
            token,
            name: self.name,
            declaring_type: self.declaring_type,
            event_type: self.event_type,
            add: self.add,
            remove: self.remove,
            fire: self.fire,
            other: Vec::new(),
            custom_attributes: self.custom_attributes,
        });
        if let Some(ty) = builder.type_mut(self.declaring_type) {
            ty.events.push(token);
        }
        token
    }
}

/// Builds an encoded [`CustomAttribute`] against its constructor's parameter types
///
/// ```rust
/// use dotlink::metadata::{
///     builder::{AttributeBuilder, ModelBuilder},
///     customattributes::CustomAttributeArgument,
/// };
///
/// let mut builder = ModelBuilder::new();
/// let corlib = builder.corlib();
/// let app = builder.assembly("App");
/// let attr = builder.class(app, "App", "TagAttribute").extends(corlib.attribute()).build();
/// let ctor = builder.constructor(attr).param("tag", corlib.string()).build();
///
/// let attribute = AttributeBuilder::new(ctor)
///     .arg(CustomAttributeArgument::String("fast".into()))
///     .build(builder.model())?;
/// let model = builder.finish();
/// let value = model.decode_custom_attribute(&attribute)?;
/// assert_eq!(value.fixed_args, vec![CustomAttributeArgument::String("fast".into())]);
/// # Ok::<(), dotlink::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct AttributeBuilder {
    constructor: MethodReference,
    value: CustomAttributeValue,
}

impl AttributeBuilder {
    /// Starts an attribute instantiated through `constructor`
    pub fn new(constructor: impl Into<MethodReference>) -> Self {
        AttributeBuilder {
            constructor: constructor.into(),
            value: CustomAttributeValue::default(),
        }
    }

    /// Adds the next constructor argument
    #[must_use]
    pub fn arg(mut self, value: CustomAttributeArgument) -> Self {
        self.value.fixed_args.push(value);
        self
    }

    /// Adds a named property assignment
    #[must_use]
    pub fn property(mut self, name: &str, arg_type: ArgumentKind, value: CustomAttributeArgument) -> Self {
        self.value.named_args.push(CustomAttributeNamedArgument {
            is_field: false,
            name: name.to_string(),
            arg_type,
            value,
        });
        self
    }

    /// Adds a named field assignment
    #[must_use]
    pub fn field(mut self, name: &str, arg_type: ArgumentKind, value: CustomAttributeArgument) -> Self {
        self.value.named_args.push(CustomAttributeNamedArgument {
            is_field: true,
            name: name.to_string(),
            arg_type,
            value,
        });
        self
    }

    /// Encodes the attribute; the constructor must already be part of `model`
    ///
    /// # Errors
    /// Returns [`crate::Error::ResolutionFailure`] if the constructor is unknown and
    /// [`crate::Error::Malformed`] if the arguments do not fit its parameters.
    pub fn build(self, model: &MetadataModel) -> Result<CustomAttribute> {
        let ctor = model.resolve_method(&self.constructor)?;
        let params = model
            .method(ctor)
            .map(|method| method.params.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|param| {
                model
                    .attribute_argument_kind(&param.param_type)
                    .ok_or_else(|| malformed_error!("Parameter {} has no attribute encoding", param.name))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CustomAttribute {
            constructor: self.constructor,
            blob: encode_custom_attribute_value(&self.value, &params)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::generics::GenericParamAttributes;

    #[test]
    fn test_nested_type_names() {
        let mut builder = ModelBuilder::new();
        let corlib = builder.corlib();
        let app = builder.assembly("App");
        let outer = builder.class(app, "App", "Outer").extends(corlib.object()).build();
        let inner = builder.class(app, "App", "Inner").nested_in(outer).build();
        let model = builder.finish();

        assert_eq!(model.full_name(inner), "App.Outer/Inner");
        assert_eq!(model.reflection_name(inner), "App.Outer+Inner");
        assert_eq!(model.find_type(app, "App.Outer/Inner"), Some(inner));
        assert_eq!(model.type_def(outer).unwrap().nested_types, vec![inner]);

        let module = model.type_def(outer).unwrap().module;
        assert_eq!(model.module(module).unwrap().types, vec![outer]);
    }

    #[test]
    fn test_generic_params_owned() {
        let mut builder = ModelBuilder::new();
        let app = builder.assembly("App");
        let list = builder
            .class(app, "App", "Box`1")
            .generic_param_with(
                "T",
                GenericParamAttributes::DEFAULT_CONSTRUCTOR_CONSTRAINT,
                Vec::new(),
            )
            .build();
        let model = builder.finish();

        let params = &model.type_def(list).unwrap().generic_params;
        assert_eq!(params.len(), 1);
        let param = model.generic_param(params[0]).unwrap();
        assert_eq!(param.owner, list);
        assert_eq!(param.number, 0);
        assert!(param.has_default_constructor_constraint());
        assert_eq!(model.assembly_of(params[0]), Some(app));
    }

    #[test]
    fn test_accessor_semantics() {
        let mut builder = ModelBuilder::new();
        let corlib = builder.corlib();
        let app = builder.assembly("App");
        let ty = builder.class(app, "App", "Counter").extends(corlib.object()).build();
        let get = builder.method(ty, "get_Value").returns(CilPrimitiveKind::I4.into()).build();
        let set = builder
            .method(ty, "set_Value")
            .param("value", CilPrimitiveKind::I4.into())
            .build();
        let property = builder
            .property(ty, "Value", CilPrimitiveKind::I4.into())
            .getter(get)
            .setter(set)
            .build();
        let model = builder.finish();

        let get = model.method(get).unwrap();
        assert!(get.semantics.contains(MethodSemantics::GETTER));
        assert_eq!(get.accessor_of, Some(property));
        assert_eq!(model.find_property_setter(ty, "Value"), Some(set));
    }

    #[test]
    fn test_module_attributes() {
        let mut builder = ModelBuilder::new();
        let corlib = builder.corlib();
        let app = builder.assembly("App");
        let attribute = CustomAttribute::raw(corlib.attribute_ctor, vec![1, 0, 0, 0]);
        builder.add_attribute(app, attribute.clone()).unwrap();

        let ty = builder.class(app, "App", "X").build();
        assert!(builder.add_attribute(ty, attribute).is_err());

        let model = builder.finish();
        assert_eq!(model.assembly(app).unwrap().custom_attributes.len(), 1);
    }
}
