//! Fields, properties and events.

use std::fmt;

use crate::metadata::{
    customattributes::CustomAttribute, marshalling::MarshalSpec, method::MethodReference,
    token::Token, typesystem::TypeReference,
};

/// Flags for `Field` table entries (ECMA-335 II.23.1.5)
#[allow(non_snake_case)]
pub mod FieldAttributes {
    /// Mask for the accessibility bits
    pub const FIELD_ACCESS_MASK: u32 = 0x0007;
    /// Accessible only by the parent type
    pub const PRIVATE: u32 = 0x0001;
    /// Accessibly by anyone who has visibility to this scope
    pub const PUBLIC: u32 = 0x0006;
    /// Defined on type, else per instance
    pub const STATIC: u32 = 0x0010;
    /// Field can only be initialized, not written to after init
    pub const INIT_ONLY: u32 = 0x0020;
    /// Value is compile time constant
    pub const LITERAL: u32 = 0x0040;
    /// CLI provides 'special' behavior, depending upon the name of the field
    pub const RTSPECIAL_NAME: u32 = 0x0400;
    /// Field has marshalling information
    pub const HAS_FIELD_MARSHAL: u32 = 0x1000;
}

/// A field definition
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Token
    pub token: Token,
    /// Name
    pub name: String,
    /// `FieldAttributes` bitmask
    pub flags: u32,
    /// Type declaring this field
    pub declaring_type: Token,
    /// Type of the field
    pub field_type: TypeReference,
    /// Custom attributes attached to the field
    pub custom_attributes: Vec<CustomAttribute>,
    /// `FieldMarshal` information
    pub marshal: Option<MarshalSpec>,
}

impl FieldDef {
    /// Returns true for static fields
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags & FieldAttributes::STATIC != 0
    }
}

/// How an instruction refers to a field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldReference {
    /// A `Field` row loaded into the model
    Definition(Token),
    /// A `MemberRef`, bound by name and type on `declaring_type` or its bases
    Member {
        /// Type the field is looked up on; may be a generic instance
        declaring_type: TypeReference,
        /// Field name
        name: String,
        /// Field type in terms of the open declaring type
        field_type: TypeReference,
    },
}

impl From<Token> for FieldReference {
    fn from(token: Token) -> Self {
        FieldReference::Definition(token)
    }
}

impl fmt::Display for FieldReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldReference::Definition(token) => write!(f, "field({token})"),
            FieldReference::Member {
                declaring_type,
                name,
                field_type,
            } => write!(f, "{field_type} {declaring_type}::{name}"),
        }
    }
}

/// A property definition
#[derive(Debug, Clone)]
pub struct PropertyDef {
    /// Token
    pub token: Token,
    /// Name
    pub name: String,
    /// Type declaring this property
    pub declaring_type: Token,
    /// Type of the property
    pub property_type: TypeReference,
    /// `get_` accessor
    pub getter: Option<Token>,
    /// `set_` accessor
    pub setter: Option<Token>,
    /// Other accessors
    pub other: Vec<Token>,
    /// Custom attributes attached to the property
    pub custom_attributes: Vec<CustomAttribute>,
}

impl PropertyDef {
    /// All accessor methods of the property
    pub fn accessors(&self) -> impl Iterator<Item = Token> + '_ {
        self.getter
            .iter()
            .chain(self.setter.iter())
            .chain(self.other.iter())
            .copied()
    }
}

/// An event definition
#[derive(Debug, Clone)]
pub struct EventDef {
    /// Token
    pub token: Token,
    /// Name
    pub name: String,
    /// Type declaring this event
    pub declaring_type: Token,
    /// Delegate type of the event
    pub event_type: TypeReference,
    /// `add_` accessor
    pub add: Option<Token>,
    /// `remove_` accessor
    pub remove: Option<Token>,
    /// `raise_` accessor
    pub fire: Option<Token>,
    /// Other accessors
    pub other: Vec<Token>,
    /// Custom attributes attached to the event
    pub custom_attributes: Vec<CustomAttribute>,
}

impl EventDef {
    /// All accessor methods of the event
    pub fn accessors(&self) -> impl Iterator<Item = Token> + '_ {
        self.add
            .iter()
            .chain(self.remove.iter())
            .chain(self.fire.iter())
            .chain(self.other.iter())
            .copied()
    }
}

/// The operand of `ldtoken`: a type, method or field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberReference {
    /// `ldtoken` of a type
    Type(TypeReference),
    /// `ldtoken` of a method
    Method(MethodReference),
    /// `ldtoken` of a field
    Field(FieldReference),
}

impl fmt::Display for MemberReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberReference::Type(reference) => write!(f, "{reference}"),
            MemberReference::Method(reference) => write!(f, "{reference}"),
            MemberReference::Field(reference) => write!(f, "{reference}"),
        }
    }
}
