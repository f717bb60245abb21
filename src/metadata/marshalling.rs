//! Marshalling information attached to parameters, return values and fields.
//!
//! The linker only needs to see through one kind of descriptor: a custom marshaler names its
//! managed implementation by reflection type name, which has to survive trimming. All other
//! native types are kept as their raw `NATIVE_TYPE` byte.

#[allow(non_snake_case)]
/// Native type constants as defined in ECMA-335 II.23.4
pub mod NATIVE_TYPE {
    /// BOOLEAN type (0x02) - 4-byte boolean value
    pub const BOOLEAN: u8 = 0x02;
    /// I4 type (0x07) - Signed 32-bit integer
    pub const I4: u8 = 0x07;
    /// LPSTR type (0x14) - Null-terminated ANSI string pointer
    pub const LPSTR: u8 = 0x14;
    /// LPWSTR type (0x15) - Null-terminated Unicode string pointer
    pub const LPWSTR: u8 = 0x15;
    /// INTERFACE type (0x19) - COM interface pointer
    pub const INTERFACE: u8 = 0x19;
    /// CUSTOMMARSHALER type (0x2c) - Custom marshaler
    pub const CUSTOMMARSHALER: u8 = 0x2c;
}

/// A `FieldMarshal` descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarshalSpec {
    /// Any native type other than a custom marshaler
    Native(u8),
    /// Custom marshaler - User-defined marshalling with custom logic
    CustomMarshaler {
        /// GUID identifying the custom marshaler
        guid: String,
        /// Native type name for the marshaler
        native_type_name: String,
        /// Cookie string passed to the marshaler
        cookie: String,
        /// Reflection name of the managed `ICustomMarshaler` implementation
        type_reference: String,
    },
}

impl MarshalSpec {
    /// A custom marshaler implemented by the type with the given reflection name
    pub fn custom_marshaler(type_reference: impl Into<String>) -> Self {
        MarshalSpec::CustomMarshaler {
            guid: String::new(),
            native_type_name: String::new(),
            cookie: String::new(),
            type_reference: type_reference.into(),
        }
    }

    /// The `NATIVE_TYPE` byte of this descriptor
    #[must_use]
    pub fn native_type(&self) -> u8 {
        match self {
            MarshalSpec::Native(native) => *native,
            MarshalSpec::CustomMarshaler { .. } => NATIVE_TYPE::CUSTOMMARSHALER,
        }
    }

    /// Reflection name of the custom marshaler type, if there is one
    #[must_use]
    pub fn custom_marshaler_type(&self) -> Option<&str> {
        match self {
            MarshalSpec::CustomMarshaler { type_reference, .. } if !type_reference.is_empty() => {
                Some(type_reference)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_marshaler_type() {
        let spec = MarshalSpec::custom_marshaler("Interop.CookieMarshaler, Interop");
        assert_eq!(spec.native_type(), NATIVE_TYPE::CUSTOMMARSHALER);
        assert_eq!(
            spec.custom_marshaler_type(),
            Some("Interop.CookieMarshaler, Interop")
        );

        assert_eq!(MarshalSpec::Native(NATIVE_TYPE::LPWSTR).custom_marshaler_type(), None);
        assert_eq!(MarshalSpec::custom_marshaler("").custom_marshaler_type(), None);
    }
}
