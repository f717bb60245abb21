//! Protected regions of method bodies.
//!
//! Only typed `catch` clauses reference metadata: the caught type has to be retained together
//! with the method, while `filter`, `finally` and `fault` clauses carry no type.

use std::ops::Range;

use crate::metadata::typesystem::TypeReference;

/// What runs when control leaves a protected region
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerKind {
    /// `catch (T)`
    Catch(TypeReference),
    /// `catch when (...)`, the filter block starts at the given offset
    Filter(u32),
    /// `finally`
    Finally,
    /// `fault`, a `finally` that only runs on exceptions
    Fault,
}

/// A protected region and its handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// The clause kind
    pub kind: HandlerKind,
    /// Byte range of the `try` block
    pub try_range: Range<u32>,
    /// Byte range of the handler block
    pub handler_range: Range<u32>,
}

impl ExceptionHandler {
    /// The caught type of a typed `catch` clause
    #[must_use]
    pub fn catch_type(&self) -> Option<&TypeReference> {
        match &self.kind {
            HandlerKind::Catch(caught) => Some(caught),
            _ => None,
        }
    }
}
