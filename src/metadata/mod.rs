//! In-memory .NET metadata for reachability analysis.
//!
//! This module contains the read-only metadata graph the linker marks: assemblies, modules,
//! types and their members, together with the reference forms (type, method and field
//! references) that signatures, method bodies and custom attributes use to point at them.
//!
//! # Key Components
//!
//! - [`MetadataModel`] - All loaded assemblies, with name lookup and reference resolution
//! - [`builder`] - Fluent construction of a model, including a minimal corlib
//! - [`token`] - Metadata table row references used throughout .NET
//! - [`typesystem`] - Type definitions, type references and reflection type names
//! - [`method`] - Method definitions, signatures and decoded bodies
//! - [`customattributes`] - Custom attribute blob decoding and encoding
//!
//! # Examples
//!
//! ```rust
//! use dotlink::metadata::{builder::ModelBuilder, typesystem::TypeReference};
//!
//! let mut builder = ModelBuilder::new();
//! let corlib = builder.corlib();
//! let app = builder.assembly("App");
//! let widget = builder.class(app, "App.UI", "Widget").extends(corlib.object()).build();
//! let model = builder.finish();
//!
//! let reference = TypeReference::external("App", "App.UI.Widget");
//! assert_eq!(model.resolve_type(&reference)?, widget);
//! assert!(model.resolve_type(&TypeReference::external("App", "App.UI.Gone")).is_err());
//! # Ok::<(), dotlink::Error>(())
//! ```

/// Assemblies and modules
pub mod assembly;
/// Little-endian blob reading and writing
pub mod blob;
/// Fluent construction of a [`MetadataModel`]
pub mod builder;
/// Implementation of custom attribute parsing and representation
pub mod customattributes;
/// Generic parameters
pub mod generics;
/// Implementation of the type marshalling for native code invokations
pub mod marshalling;
/// Fields, properties and events
pub mod members;
/// Methods, signatures and bodies
pub mod method;
/// Commonly used metadata token type
pub mod token;
/// The type system of .NET assemblies
pub mod typesystem;

mod model;

pub use model::MetadataModel;
