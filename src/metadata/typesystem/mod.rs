//! .NET type system representation for reachability analysis.
//!
//! This module holds the type definitions of the in-memory model together with the
//! reference forms that signatures, instruction operands and custom attributes use to point
//! at types.
//!
//! # Key Components
//!
//! - [`TypeDef`]: A type definition with its members, nested types and generic parameters
//! - [`TypeReference`]: A reference to a definition, a named external type, a primitive or a
//!   type specification (array, pointer, generic instance, ...)
//! - [`CilPrimitiveKind`]: Built-in primitive types (int32, string, object, etc.)
//! - [`TypeName`]: Parser for the reflection-format names stored in attribute blobs
//! - [`TypeAttributes`]: Raw `TypeDef` flag constants
//!
//! # Examples
//!
//! ```rust
//! use dotlink::metadata::builder::ModelBuilder;
//!
//! let mut builder = ModelBuilder::new();
//! let corlib = builder.corlib();
//! let app = builder.assembly("App");
//! let program = builder.class(app, "App", "Program").extends(corlib.object()).build();
//! let model = builder.finish();
//!
//! let ty = model.type_def(program).unwrap();
//! assert_eq!(ty.full_name(), "App.Program");
//! assert!(!ty.is_interface());
//! ```

mod primitives;
mod reference;
mod typename;

pub use primitives::CilPrimitiveKind;
pub use reference::TypeReference;
pub use typename::{TypeName, TypeNameModifier};

use crate::metadata::{customattributes::CustomAttribute, token::Token};

/// Flags for `TypeDef` table entries (ECMA-335 II.23.1.15)
#[allow(non_snake_case)]
pub mod TypeAttributes {
    /// Use this mask to retrieve visibility information. These 3 bits contain one of the following values:
    pub const VISIBILITY_MASK: u32 = 0x0000_0007;
    /// Class has no public scope
    pub const NOT_PUBLIC: u32 = 0x0000_0000;
    /// Class has public scope
    pub const PUBLIC: u32 = 0x0000_0001;
    /// Class is nested with public visibility
    pub const NESTED_PUBLIC: u32 = 0x0000_0002;
    /// Class is nested with private visibility
    pub const NESTED_PRIVATE: u32 = 0x0000_0003;
    /// Class is nested with family visibility
    pub const NESTED_FAMILY: u32 = 0x0000_0004;
    /// Class is nested with assembly visibility
    pub const NESTED_ASSEMBLY: u32 = 0x0000_0005;
    //
    /// Use this mask to retrieve class semantics information
    pub const CLASS_SEMANTICS_MASK: u32 = 0x0000_0020;
    /// Type is a class
    pub const CLASS: u32 = 0x0000_0000;
    /// Type is an interface
    pub const INTERFACE: u32 = 0x0000_0020;
    //
    /// Class is abstract
    pub const ABSTRACT: u32 = 0x0000_0080;
    /// Class cannot be extended
    pub const SEALED: u32 = 0x0000_0100;
    /// Class name is special
    pub const SPECIAL_NAME: u32 = 0x0000_0400;
    /// Class/Interface is imported
    pub const IMPORT: u32 = 0x0000_1000;
    /// Reserved (Class is serializable)
    pub const SERIALIZABLE: u32 = 0x0000_2000;
    /// Initialize the class before first static field access
    pub const BEFORE_FIELD_INIT: u32 = 0x0010_0000;
    /// CLI provides 'special' behavior, depending upon the name of the Type
    pub const RTSPECIAL_NAME: u32 = 0x0000_0800;
}

/// A type definition.
///
/// Member lists hold tokens into the owning [`crate::metadata::MetadataModel`]; constructors
/// are regular entries of `methods`.
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// Token
    pub token: Token,
    /// `TypeNamespace`, empty for nested types and the global `<Module>` type
    pub namespace: String,
    /// `TypeName`
    pub name: String,
    /// `TypeAttributes` bitmask
    pub flags: u32,
    /// Assembly defining this type
    pub assembly: Token,
    /// Module defining this type
    pub module: Token,
    /// Enclosing type of a nested type
    pub declaring_type: Option<Token>,
    /// Base type, `None` for `System.Object`, interfaces and `<Module>`
    pub base: Option<TypeReference>,
    /// Directly implemented interfaces
    pub interfaces: Vec<TypeReference>,
    /// Fields
    pub fields: Vec<Token>,
    /// Methods, including constructors
    pub methods: Vec<Token>,
    /// Properties
    pub properties: Vec<Token>,
    /// Events
    pub events: Vec<Token>,
    /// Nested types
    pub nested_types: Vec<Token>,
    /// Generic parameters, ordered by number
    pub generic_params: Vec<Token>,
    /// Custom attributes attached to the type
    pub custom_attributes: Vec<CustomAttribute>,
}

impl TypeDef {
    /// Namespace-qualified name; nested types are not prefixed with their enclosing type here,
    /// see [`crate::metadata::MetadataModel::full_name`] for that.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Returns true for interface definitions
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags & TypeAttributes::CLASS_SEMANTICS_MASK == TypeAttributes::INTERFACE
    }

    /// Returns true if the type carries the `serializable` flag
    #[must_use]
    pub fn is_serializable(&self) -> bool {
        self.flags & TypeAttributes::SERIALIZABLE != 0
    }

    /// Returns true for abstract classes and interfaces
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags & TypeAttributes::ABSTRACT != 0
    }

    /// Returns true if the type cannot be derived from
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.flags & TypeAttributes::SEALED != 0
    }

    /// Returns true for nested types
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.declaring_type.is_some()
    }
}
