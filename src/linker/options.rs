//! Configuration for the mark step.
//!
//! The defaults reproduce the usual linker behaviour. Switching rules off trades safety for
//! a smaller result and is meant for callers that know their program does not rely on them.

use crate::metadata::builder::CORLIB_NAME;

/// Options controlling which optional edges the mark step follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkOptions {
    /// Keep the type initializer of every marked type (default: true).
    pub mark_static_constructors: bool,

    /// Keep virtual methods overriding a method of an assembly that is not linked
    /// (default: true).
    ///
    /// Code in copied or skipped assemblies is never inspected, so calls it makes through the
    /// base slot are invisible to marking.
    pub keep_unlinked_overrides: bool,

    /// Mark types named by `System.Type` values inside custom attributes (default: true).
    pub follow_type_attribute_arguments: bool,

    /// Simple name of the core library; unqualified type names in attributes fall back to it.
    pub corlib_name: String,
}

impl Default for MarkOptions {
    fn default() -> Self {
        Self {
            mark_static_constructors: true,
            keep_unlinked_overrides: true,
            follow_type_attribute_arguments: true,
            corlib_name: CORLIB_NAME.to_string(),
        }
    }
}

impl MarkOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options following only edges that are strictly required.
    ///
    /// Type initializers, overrides of unlinked methods and type names inside attributes are
    /// not followed.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            mark_static_constructors: false,
            keep_unlinked_overrides: false,
            follow_type_attribute_arguments: false,
            ..Self::default()
        }
    }

    /// Sets whether type initializers are kept.
    #[must_use]
    pub fn with_static_constructors(mut self, enabled: bool) -> Self {
        self.mark_static_constructors = enabled;
        self
    }

    /// Sets whether overrides of unlinked base methods are kept.
    #[must_use]
    pub fn with_unlinked_overrides(mut self, enabled: bool) -> Self {
        self.keep_unlinked_overrides = enabled;
        self
    }

    /// Sets whether type-valued attribute arguments are followed.
    #[must_use]
    pub fn with_type_attribute_arguments(mut self, enabled: bool) -> Self {
        self.follow_type_attribute_arguments = enabled;
        self
    }

    /// Sets the core library name.
    #[must_use]
    pub fn with_corlib_name(mut self, name: impl Into<String>) -> Self {
        self.corlib_name = name.into();
        self
    }
}
