// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # dotlink
//!
//! The marking core of a .NET assembly linker. Given a set of loaded assemblies and a set of
//! root members, `dotlink` computes every type, method, field and generic parameter that is
//! transitively required at run time, so that a later sweep stage can drop everything else.
//!
//! ## Features
//!
//! - **Worklist marking** - Explicit type and method queues, each node expanded once
//! - **Virtual dispatch** - Overrides are kept only when their declaring type is reachable
//! - **Custom attributes** - Constructors, named members and `System.Type` arguments
//! - **Generics** - Type arguments, constraints and `new()` constructor requirements
//! - **Descriptors** - XML root and preserve configuration
//! - **Explanations** - Every mark records the node that caused it
//!
//! ## Quick Start
//!
//! ```rust
//! use dotlink::prelude::*;
//!
//! let mut builder = ModelBuilder::new();
//! let corlib = builder.corlib();
//! let app = builder.assembly("App");
//! let program = builder.class(app, "App", "Program").extends(corlib.object()).build();
//! let helper = builder.method(program, "Helper").static_().body(|b| b.ret()).build();
//! let main = builder
//!     .method(program, "Main")
//!     .static_()
//!     .body(|b| b.call(helper).ret())
//!     .build();
//! let model = builder.finish();
//!
//! let mut context = LinkContext::new(&model);
//! context.annotations_mut().mark_root(main);
//! let stats = context.mark()?;
//!
//! assert!(context.annotations().is_marked(helper));
//! assert_eq!(context.annotations().reason_chain(helper), vec![helper, main]);
//! println!("{stats}");
//! # Ok::<(), dotlink::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`] - The read-only metadata graph and its builder
//! - [`linker`] - Annotations, root configuration and the mark step
//! - [`prelude`] - Convenient re-exports of commonly used types
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Logging
//!
//! Progress is reported through the [`log`](https://docs.rs/log) facade. The library never
//! installs a logger; attach one in the application to see round summaries (`debug`),
//! individual marks (`trace`) and skipped attribute data (`warn`).

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust
/// use dotlink::prelude::*;
///
/// let mut builder = ModelBuilder::new();
/// builder.corlib();
/// let model = builder.finish();
/// let context = LinkContext::with_options(&model, MarkOptions::minimal());
/// assert_eq!(context.corlib(), model.corlib());
/// ```
pub mod prelude;

/// The in-memory metadata model the linker operates on.
///
/// Assemblies, modules, types and members live in arenas owned by [`metadata::MetadataModel`]
/// and are addressed by [`metadata::token::Token`]. References to other members are kept
/// symbolic ([`metadata::typesystem::TypeReference`], [`metadata::method::MethodReference`],
/// ...) and bound through the model's `resolve_*` methods.
///
/// # Key Components
///
/// - [`metadata::MetadataModel`] - Storage, name lookup and resolution
/// - [`metadata::builder`] - Fluent construction of models, including a minimal corlib
/// - [`metadata::customattributes`] - Custom attribute blob encoding and decoding
/// - [`metadata::typesystem`] - Type definitions, references and reflection type names
pub mod metadata;

/// Reachability marking: annotations, configuration and the mark step.
pub mod linker;

/// `dotlink` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dotlink` Error type
///
/// # Examples
///
/// ```rust
/// use dotlink::{linker::LinkContext, metadata::builder::ModelBuilder, Error};
///
/// let mut builder = ModelBuilder::new();
/// builder.corlib();
/// let model = builder.finish();
///
/// match LinkContext::new(&model).mark() {
///     Err(Error::ConfigurationError(message)) => println!("nothing to mark: {message}"),
///     Err(e) => println!("Error: {e}"),
///     Ok(stats) => println!("{stats}"),
/// }
/// ```
pub use error::Error;
