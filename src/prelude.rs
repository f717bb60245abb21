//! # dotlink Prelude
//!
//! The types needed to build or load a model, select roots and run the mark step, for glob
//! import.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotlink operations
pub use crate::Error;

/// The result type used throughout dotlink
pub use crate::Result;

// ================================================================================================
// Metadata Model
// ================================================================================================

/// Arena storage and resolution for loaded assemblies
pub use crate::metadata::MetadataModel;

/// Metadata token type identifying every node of the model
pub use crate::metadata::token::{Node, TableId, Token};

/// Symbolic references to types, methods, fields and members
pub use crate::metadata::{
    members::{FieldReference, MemberReference},
    method::MethodReference,
    typesystem::{CilPrimitiveKind, TypeName, TypeReference},
};

/// Custom attribute values
pub use crate::metadata::customattributes::{
    ArgumentKind, CustomAttribute, CustomAttributeArgument, CustomAttributeValue,
};

// ================================================================================================
// Model Construction
// ================================================================================================

/// Fluent model builder and the minimal core library
pub use crate::metadata::builder::{AttributeBuilder, CorLib, ModelBuilder};

// ================================================================================================
// Linking
// ================================================================================================

/// Link session and its configuration
pub use crate::linker::{LinkContext, LinkerDescriptor, MarkOptions};

/// Marking results
pub use crate::linker::{
    Annotations, LinkAction, MarkStats, MarkedBy, MethodAction, Status, TypePreserve,
};
