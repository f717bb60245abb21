//! Reachability marking.
//!
//! This module decides which parts of a [`crate::metadata::MetadataModel`] must be retained.
//! Root selection (by hand through [`Annotations`], or with a [`LinkerDescriptor`]) marks the
//! entry points; [`LinkContext::mark`] then follows every edge the runtime could take from
//! them and records the outcome in the session's [`Annotations`].
//!
//! # Key Components
//!
//! - [`LinkContext`] - One link session: model, annotations, options
//! - [`Annotations`] - Per-node status, reasons, link actions and preserve policies
//! - [`OverrideTable`] - Virtual method to override map, computed before marking
//! - [`MarkOptions`] - Switches for the optional marking rules
//! - [`LinkerDescriptor`] - XML root and policy configuration
//! - [`SpecialAttributeRegistry`] - Attributes whose string argument names another member
//!
//! # Examples
//!
//! ```rust
//! use dotlink::{linker::LinkContext, metadata::builder::ModelBuilder};
//!
//! let mut builder = ModelBuilder::new();
//! let corlib = builder.corlib();
//! let app = builder.assembly("App");
//! let program = builder.class(app, "App", "Program").extends(corlib.object()).build();
//! let unused = builder.method(program, "Unused").static_().body(|b| b.ret()).build();
//! let main = builder.method(program, "Main").static_().body(|b| b.ret()).build();
//! let model = builder.finish();
//!
//! let mut context = LinkContext::new(&model);
//! context.annotations_mut().mark_root(main);
//! context.mark()?;
//!
//! assert!(context.annotations().is_processed(main));
//! assert!(!context.annotations().is_marked(unused));
//! # Ok::<(), dotlink::Error>(())
//! ```

pub mod annotations;
pub mod context;
pub mod descriptor;
pub mod mark;
pub mod options;
pub mod overrides;

pub use annotations::{Annotations, LinkAction, MarkedBy, MethodAction, Status, TypePreserve};
pub use context::LinkContext;
pub use descriptor::{AssemblyEntry, LinkerDescriptor, TypeEntry};
pub use mark::{MarkStats, SpecialAttributeRegistry, SpecialMembers};
pub use options::MarkOptions;
pub use overrides::OverrideTable;
