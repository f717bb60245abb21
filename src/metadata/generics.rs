//! Generic parameters of types and methods.

use crate::metadata::{customattributes::CustomAttribute, token::Token, typesystem::TypeReference};

#[allow(non_snake_case)]
/// All possible flags for `GenericParamAttributes`
pub mod GenericParamAttributes {
    /// The generic parameter is covariant
    pub const VARIANCE_MASK: u32 = 0x0003;
    /// The generic parameter is covariant
    pub const COVARIANT: u32 = 0x0001;
    /// The generic parameter is contravariant
    pub const CONTRAVARIANT: u32 = 0x0002;
    /// The generic parameter has a special constraint
    pub const SPECIAL_CONSTRAINT_MASK: u32 = 0x001C;
    /// The generic parameter has a reference type constraint
    pub const REFERENCE_TYPE_CONSTRAINT: u32 = 0x0004;
    /// The generic parameter has a value type constraint
    pub const NOT_NULLABLE_VALUE_TYPE_CONSTRAINT: u32 = 0x0008;
    /// The generic parameter has a constructor constraint
    pub const DEFAULT_CONSTRUCTOR_CONSTRAINT: u32 = 0x0010;
}

/// A generic parameter of a type or method
#[derive(Debug, Clone)]
pub struct GenericParamDef {
    /// Token
    pub token: Token,
    /// Name (`T`, `TKey`, ...)
    pub name: String,
    /// Zero based position in the owner's parameter list
    pub number: u32,
    /// The `TypeDef` or `MethodDef` declaring the parameter
    pub owner: Token,
    /// `GenericParamAttributes` bitmask
    pub flags: u32,
    /// `GenericParamConstraint` types
    pub constraints: Vec<TypeReference>,
    /// Custom attributes attached to the parameter
    pub custom_attributes: Vec<CustomAttribute>,
}

impl GenericParamDef {
    /// Returns true if the parameter carries the `new()` constraint
    #[must_use]
    pub fn has_default_constructor_constraint(&self) -> bool {
        self.flags & GenericParamAttributes::DEFAULT_CONSTRUCTOR_CONSTRAINT != 0
    }

    /// Returns true if the parameter carries the `struct` constraint
    #[must_use]
    pub fn has_value_type_constraint(&self) -> bool {
        self.flags & GenericParamAttributes::NOT_NULLABLE_VALUE_TYPE_CONSTRAINT != 0
    }
}
