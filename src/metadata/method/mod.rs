//! Method definitions, references and bodies.
//!
//! # Key Components
//!
//! - [`MethodDef`]: A method definition with its signature, overrides and decoded body
//! - [`MethodReference`]: How call sites and attributes refer to methods
//! - [`MethodSignature`]: The comparable part of a method's signature
//! - [`MethodBody`], [`Instruction`], [`Operand`]: Decoded CIL
//! - [`ExceptionHandler`]: try/catch/finally/fault clauses

mod body;
mod exceptions;
mod types;

use std::fmt;

pub use body::{Instruction, MethodBody, Operand};
pub use exceptions::{ExceptionHandler, HandlerKind};
pub use types::*;

use crate::metadata::{
    customattributes::CustomAttribute, marshalling::MarshalSpec, token::Token,
    typesystem::TypeReference,
};

/// Name of instance constructors
pub const CONSTRUCTOR_NAME: &str = ".ctor";
/// Name of type initializers
pub const STATIC_CONSTRUCTOR_NAME: &str = ".cctor";

/// A parameter, or the return value, of a method
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Name, empty for the return value
    pub name: String,
    /// Type of the parameter
    pub param_type: TypeReference,
    /// Custom attributes attached to the parameter
    pub custom_attributes: Vec<CustomAttribute>,
    /// `FieldMarshal` information
    pub marshal: Option<MarshalSpec>,
}

impl Parameter {
    /// A parameter without attributes or marshalling information
    pub fn new(name: impl Into<String>, param_type: TypeReference) -> Self {
        Parameter {
            name: name.into(),
            param_type,
            custom_attributes: Vec::new(),
            marshal: None,
        }
    }
}

/// The parts of a method signature two methods are compared by
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    /// Instance method
    pub has_this: bool,
    /// Number of method level generic parameters
    pub generic_param_count: u32,
    /// Return type
    pub return_type: TypeReference,
    /// Parameter types in order
    pub params: Vec<TypeReference>,
}

impl MethodSignature {
    /// The signature as seen through an instantiation of the declaring type
    #[must_use]
    pub fn substitute(&self, type_args: &[TypeReference]) -> MethodSignature {
        if type_args.is_empty() {
            return self.clone();
        }

        MethodSignature {
            has_this: self.has_this,
            generic_param_count: self.generic_param_count,
            return_type: self.return_type.substitute(type_args, &[]),
            params: self
                .params
                .iter()
                .map(|param| param.substitute(type_args, &[]))
                .collect(),
        }
    }
}

/// A method definition
#[derive(Debug, Clone)]
pub struct MethodDef {
    /// Token
    pub token: Token,
    /// Name
    pub name: String,
    /// Type declaring this method
    pub declaring_type: Token,
    /// Access flags
    pub flags_access: MethodAccessFlags,
    /// Vtable layout flags
    pub flags_vtable: MethodVtableFlags,
    /// Modifiers
    pub flags_modifiers: MethodModifiers,
    /// Role as property or event accessor
    pub semantics: MethodSemantics,
    /// The property or event this method is an accessor of
    pub accessor_of: Option<Token>,
    /// Parameters, without the implicit `this`
    pub params: Vec<Parameter>,
    /// The return value
    pub return_type: Parameter,
    /// Generic parameters, ordered by number
    pub generic_params: Vec<Token>,
    /// `MethodImpl` entries: methods this method explicitly implements
    pub overrides: Vec<MethodReference>,
    /// Decoded body, `None` for abstract, runtime and P/Invoke methods
    pub body: Option<MethodBody>,
    /// Custom attributes attached to the method
    pub custom_attributes: Vec<CustomAttribute>,
}

impl MethodDef {
    /// Returns true for virtual methods
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.flags_modifiers.contains(MethodModifiers::VIRTUAL)
    }

    /// Returns true for static methods
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags_modifiers.contains(MethodModifiers::STATIC)
    }

    /// Returns true for abstract methods
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags_modifiers.contains(MethodModifiers::ABSTRACT)
    }

    /// Returns true if the method always gets a new vtable slot
    #[must_use]
    pub fn is_new_slot(&self) -> bool {
        self.flags_vtable.contains(MethodVtableFlags::NEW_SLOT)
    }

    /// Returns true for instance and static constructors
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.flags_modifiers
            .contains(MethodModifiers::SPECIAL_NAME | MethodModifiers::RTSPECIAL_NAME)
            && (self.name == CONSTRUCTOR_NAME || self.name == STATIC_CONSTRUCTOR_NAME)
    }

    /// Returns true for the type initializer
    #[must_use]
    pub fn is_static_constructor(&self) -> bool {
        self.is_constructor() && self.is_static() && self.name == STATIC_CONSTRUCTOR_NAME
    }

    /// Returns true for an instance constructor without parameters
    #[must_use]
    pub fn is_default_constructor(&self) -> bool {
        self.is_constructor() && !self.is_static() && self.params.is_empty()
    }

    /// The signature used to match this method against references and overrides
    #[must_use]
    pub fn signature(&self) -> MethodSignature {
        MethodSignature {
            has_this: !self.is_static(),
            generic_param_count: u32::try_from(self.generic_params.len()).unwrap_or(u32::MAX),
            return_type: self.return_type.param_type.clone(),
            params: self
                .params
                .iter()
                .map(|param| param.param_type.clone())
                .collect(),
        }
    }
}

/// How an instruction, attribute or `MethodImpl` refers to a method
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MethodReference {
    /// A `MethodDef` loaded into the model
    Definition(Token),
    /// A `MemberRef`, bound by name and signature on `declaring_type` or its bases
    Member {
        /// Type the method is looked up on; may be a generic instance
        declaring_type: TypeReference,
        /// Method name
        name: String,
        /// Signature in terms of the open declaring type
        signature: MethodSignature,
    },
    /// A `MethodSpec`, a generic method closed over its arguments
    GenericInstance {
        /// The open generic method
        element: Box<MethodReference>,
        /// One argument per generic parameter of `element`
        arguments: Vec<TypeReference>,
    },
}

impl MethodReference {
    /// Reference to a method defined in the model
    #[must_use]
    pub fn definition(token: Token) -> Self {
        MethodReference::Definition(token)
    }

    /// Returns the reference with all generic instantiations peeled off
    #[must_use]
    pub fn element(&self) -> &MethodReference {
        let mut current = self;
        while let MethodReference::GenericInstance { element, .. } = current {
            current = element;
        }
        current
    }
}

impl From<Token> for MethodReference {
    fn from(token: Token) -> Self {
        MethodReference::Definition(token)
    }
}

impl fmt::Display for MethodReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodReference::Definition(token) => write!(f, "methoddef({token})"),
            MethodReference::Member {
                declaring_type,
                name,
                signature,
            } => {
                write!(f, "{} {declaring_type}::{name}(", signature.return_type)?;
                for (index, param) in signature.params.iter().enumerate() {
                    if index > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ")")
            }
            MethodReference::GenericInstance { element, arguments } => {
                write!(f, "{element}<")?;
                for (index, argument) in arguments.iter().enumerate() {
                    if index > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{argument}")?;
                }
                write!(f, ">")
            }
        }
    }
}
