//! CustomAttribute-specific types and data structures.
//!
//! This module contains all the types used for representing parsed custom attribute data,
//! including argument values, named arguments, and the overall custom attribute value structure.
//! These types are designed to be self-contained and follow ECMA-335 II.23.3 specification.

use crate::metadata::method::MethodReference;

/// A custom attribute as stored in the `CustomAttribute` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomAttribute {
    /// The attribute's instance constructor
    pub constructor: MethodReference,
    /// The encoded value blob, decoded against the constructor's parameter types
    pub blob: Vec<u8>,
}

impl CustomAttribute {
    /// Creates an attribute from an already encoded value blob
    pub fn raw(constructor: impl Into<MethodReference>, blob: Vec<u8>) -> Self {
        CustomAttribute {
            constructor: constructor.into(),
            blob,
        }
    }
}

/// Represents a parsed custom attribute value with arguments and named arguments
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CustomAttributeValue {
    /// Fixed arguments from the constructor signature
    pub fixed_args: Vec<CustomAttributeArgument>,
    /// Named arguments (fields and properties)
    pub named_args: Vec<CustomAttributeNamedArgument>,
}

/// Represents a single custom attribute argument value
#[derive(Debug, Clone, PartialEq)]
pub enum CustomAttributeArgument {
    /// Boolean value
    Bool(bool),
    /// Character value (16-bit Unicode)
    Char(char),
    /// Signed 8-bit integer
    I1(i8),
    /// Unsigned 8-bit integer
    U1(u8),
    /// Signed 16-bit integer
    I2(i16),
    /// Unsigned 16-bit integer
    U2(u16),
    /// Signed 32-bit integer
    I4(i32),
    /// Unsigned 32-bit integer
    U4(u32),
    /// Signed 64-bit integer
    I8(i64),
    /// Unsigned 64-bit integer
    U8(u64),
    /// 32-bit floating point
    R4(f32),
    /// 64-bit floating point
    R8(f64),
    /// UTF-8 string, empty for the null string
    String(String),
    /// Type reference as reflection type name, empty for a null `Type`
    Type(String),
    /// Array of arguments, empty for a null array
    Array(Vec<CustomAttributeArgument>),
    /// Enum value (enum type name + underlying value)
    Enum(String, Box<CustomAttributeArgument>),
}

impl CustomAttributeArgument {
    /// The kind a boxed (`object` typed) occurrence of this value is tagged with
    #[must_use]
    pub fn kind(&self) -> ArgumentKind {
        match self {
            CustomAttributeArgument::Bool(_) => ArgumentKind::Boolean,
            CustomAttributeArgument::Char(_) => ArgumentKind::Char,
            CustomAttributeArgument::I1(_) => ArgumentKind::I1,
            CustomAttributeArgument::U1(_) => ArgumentKind::U1,
            CustomAttributeArgument::I2(_) => ArgumentKind::I2,
            CustomAttributeArgument::U2(_) => ArgumentKind::U2,
            CustomAttributeArgument::I4(_) => ArgumentKind::I4,
            CustomAttributeArgument::U4(_) => ArgumentKind::U4,
            CustomAttributeArgument::I8(_) => ArgumentKind::I8,
            CustomAttributeArgument::U8(_) => ArgumentKind::U8,
            CustomAttributeArgument::R4(_) => ArgumentKind::R4,
            CustomAttributeArgument::R8(_) => ArgumentKind::R8,
            CustomAttributeArgument::String(_) => ArgumentKind::String,
            CustomAttributeArgument::Type(_) => ArgumentKind::Type,
            CustomAttributeArgument::Array(items) => ArgumentKind::SzArray(Box::new(
                items.first().map_or(ArgumentKind::Object, CustomAttributeArgument::kind),
            )),
            CustomAttributeArgument::Enum(name, value) => ArgumentKind::Enum {
                name: name.clone(),
                underlying: Box::new(value.kind()),
            },
        }
    }
}

/// Represents a named argument (field or property) in a custom attribute
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAttributeNamedArgument {
    /// Whether this is a field (true) or property (false)
    pub is_field: bool,
    /// Name of the field or property
    pub name: String,
    /// Type of the argument
    pub arg_type: ArgumentKind,
    /// Value of the argument
    pub value: CustomAttributeArgument,
}

/// The encoded type of an attribute argument (`FieldOrPropType` in ECMA-335 II.23.3)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgumentKind {
    /// `bool`
    Boolean,
    /// `char`
    Char,
    /// `sbyte`
    I1,
    /// `byte`
    U1,
    /// `short`
    I2,
    /// `ushort`
    U2,
    /// `int`
    I4,
    /// `uint`
    U4,
    /// `long`
    I8,
    /// `ulong`
    U8,
    /// `float`
    R4,
    /// `double`
    R8,
    /// `string`
    String,
    /// `System.Type`
    Type,
    /// `object`; every value carries its own type tag
    Object,
    /// An enum, stored as its underlying integer
    Enum {
        /// Reflection name of the enum type
        name: String,
        /// Integer kind backing the enum
        underlying: Box<ArgumentKind>,
    },
    /// Single dimensional array of the element kind
    SzArray(Box<ArgumentKind>),
}

impl ArgumentKind {
    /// The `SERIALIZATION_TYPE` tag of this kind
    #[must_use]
    pub fn tag(&self) -> u8 {
        match self {
            ArgumentKind::Boolean => SERIALIZATION_TYPE::BOOLEAN,
            ArgumentKind::Char => SERIALIZATION_TYPE::CHAR,
            ArgumentKind::I1 => SERIALIZATION_TYPE::I1,
            ArgumentKind::U1 => SERIALIZATION_TYPE::U1,
            ArgumentKind::I2 => SERIALIZATION_TYPE::I2,
            ArgumentKind::U2 => SERIALIZATION_TYPE::U2,
            ArgumentKind::I4 => SERIALIZATION_TYPE::I4,
            ArgumentKind::U4 => SERIALIZATION_TYPE::U4,
            ArgumentKind::I8 => SERIALIZATION_TYPE::I8,
            ArgumentKind::U8 => SERIALIZATION_TYPE::U8,
            ArgumentKind::R4 => SERIALIZATION_TYPE::R4,
            ArgumentKind::R8 => SERIALIZATION_TYPE::R8,
            ArgumentKind::String => SERIALIZATION_TYPE::STRING,
            ArgumentKind::Type => SERIALIZATION_TYPE::TYPE,
            ArgumentKind::Object => SERIALIZATION_TYPE::TAGGED_OBJECT,
            ArgumentKind::Enum { .. } => SERIALIZATION_TYPE::ENUM,
            ArgumentKind::SzArray(_) => SERIALIZATION_TYPE::SZARRAY,
        }
    }

    /// The primitive kind for a tag, `None` for tags that need more data
    #[must_use]
    pub fn from_primitive_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            SERIALIZATION_TYPE::BOOLEAN => ArgumentKind::Boolean,
            SERIALIZATION_TYPE::CHAR => ArgumentKind::Char,
            SERIALIZATION_TYPE::I1 => ArgumentKind::I1,
            SERIALIZATION_TYPE::U1 => ArgumentKind::U1,
            SERIALIZATION_TYPE::I2 => ArgumentKind::I2,
            SERIALIZATION_TYPE::U2 => ArgumentKind::U2,
            SERIALIZATION_TYPE::I4 => ArgumentKind::I4,
            SERIALIZATION_TYPE::U4 => ArgumentKind::U4,
            SERIALIZATION_TYPE::I8 => ArgumentKind::I8,
            SERIALIZATION_TYPE::U8 => ArgumentKind::U8,
            SERIALIZATION_TYPE::R4 => ArgumentKind::R4,
            SERIALIZATION_TYPE::R8 => ArgumentKind::R8,
            SERIALIZATION_TYPE::STRING => ArgumentKind::String,
            SERIALIZATION_TYPE::TYPE => ArgumentKind::Type,
            SERIALIZATION_TYPE::TAGGED_OBJECT => ArgumentKind::Object,
            _ => return None,
        })
    }

    /// Returns true if values of this kind can hold a `System.Type`
    #[must_use]
    pub fn may_contain_type(&self) -> bool {
        match self {
            ArgumentKind::Type | ArgumentKind::Object => true,
            ArgumentKind::SzArray(element) => element.may_contain_type(),
            _ => false,
        }
    }
}

/// .NET `CorSerializationType` constants as defined in corhdr.h
#[allow(non_snake_case, missing_docs)]
pub mod SERIALIZATION_TYPE {
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0A;
    pub const U8: u8 = 0x0B;
    pub const R4: u8 = 0x0C;
    pub const R8: u8 = 0x0D;
    pub const STRING: u8 = 0x0E;
    pub const SZARRAY: u8 = 0x1D;
    pub const TYPE: u8 = 0x50;
    pub const TAGGED_OBJECT: u8 = 0x51;
    pub const FIELD: u8 = 0x53;
    pub const PROPERTY: u8 = 0x54;
    pub const ENUM: u8 = 0x55;
}
