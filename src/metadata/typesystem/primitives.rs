use strum::{Display, EnumIter};

/// Built-in types that signatures encode with a single element type byte.
///
/// All of them live in the core library; [`crate::metadata::MetadataModel::resolve_type`]
/// binds them against the designated corlib assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum CilPrimitiveKind {
    /// System.Void - represents no value
    Void,
    /// System.Boolean - true/false value
    Boolean,
    /// System.Char - Unicode 16-bit character
    Char,
    /// System.SByte - signed 8-bit integer
    I1,
    /// System.Byte - unsigned 8-bit integer
    U1,
    /// System.Int16 - signed 16-bit integer
    I2,
    /// System.UInt16 - unsigned 16-bit integer
    U2,
    /// System.Int32 - signed 32-bit integer
    I4,
    /// System.UInt32 - unsigned 32-bit integer
    U4,
    /// System.Int64 - signed 64-bit integer
    I8,
    /// System.UInt64 - unsigned 64-bit integer
    U8,
    /// System.Single - 32-bit floating point
    R4,
    /// System.Double - 64-bit floating point
    R8,
    /// System.IntPtr - native sized signed integer
    I,
    /// System.UIntPtr - native sized unsigned integer
    U,
    /// System.Object - base class for all reference types
    Object,
    /// System.String - immutable string of Unicode characters
    String,
    /// System.TypedReference - type-safe pointer (used by compiler)
    TypedReference,
}

impl CilPrimitiveKind {
    /// The namespace-qualified name of the corlib type backing this primitive
    #[must_use]
    pub fn full_name(&self) -> &'static str {
        match self {
            CilPrimitiveKind::Void => "System.Void",
            CilPrimitiveKind::Boolean => "System.Boolean",
            CilPrimitiveKind::Char => "System.Char",
            CilPrimitiveKind::I1 => "System.SByte",
            CilPrimitiveKind::U1 => "System.Byte",
            CilPrimitiveKind::I2 => "System.Int16",
            CilPrimitiveKind::U2 => "System.UInt16",
            CilPrimitiveKind::I4 => "System.Int32",
            CilPrimitiveKind::U4 => "System.UInt32",
            CilPrimitiveKind::I8 => "System.Int64",
            CilPrimitiveKind::U8 => "System.UInt64",
            CilPrimitiveKind::R4 => "System.Single",
            CilPrimitiveKind::R8 => "System.Double",
            CilPrimitiveKind::I => "System.IntPtr",
            CilPrimitiveKind::U => "System.UIntPtr",
            CilPrimitiveKind::Object => "System.Object",
            CilPrimitiveKind::String => "System.String",
            CilPrimitiveKind::TypedReference => "System.TypedReference",
        }
    }

    /// The simple type name, without the `System` namespace
    #[must_use]
    pub fn name(&self) -> &'static str {
        &self.full_name()["System.".len()..]
    }

    /// Looks up the primitive backing a corlib full name such as `System.Int32`
    #[must_use]
    pub fn from_full_name(full_name: &str) -> Option<Self> {
        use strum::IntoEnumIterator;

        CilPrimitiveKind::iter().find(|kind| kind.full_name() == full_name)
    }

    /// Returns true for the primitives the runtime treats as value types
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        !matches!(
            self,
            CilPrimitiveKind::Object | CilPrimitiveKind::String | CilPrimitiveKind::Void
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_full_names_roundtrip() {
        for kind in CilPrimitiveKind::iter() {
            assert_eq!(CilPrimitiveKind::from_full_name(kind.full_name()), Some(kind));
            assert!(kind.full_name().starts_with("System."));
        }
        assert_eq!(CilPrimitiveKind::from_full_name("System.Type"), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(CilPrimitiveKind::I4.name(), "Int32");
        assert_eq!(CilPrimitiveKind::U.name(), "UIntPtr");
        assert!(CilPrimitiveKind::I4.is_value_type());
        assert!(!CilPrimitiveKind::String.is_value_type());
    }
}
