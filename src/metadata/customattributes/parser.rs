//! Custom attribute blob decoder (ECMA-335 II.23.3).
//!
//! A blob starts with the prolog `0x0001`, followed by one value per constructor parameter
//! (encoded according to the parameter type alone), followed by a `u16` count of named
//! arguments. Each named argument carries its own type tag, so enum-typed named arguments name
//! their enum and need a resolver to learn its underlying integer size.

use crate::{
    metadata::{
        blob::BlobReader,
        customattributes::{
            ArgumentKind, CustomAttributeArgument, CustomAttributeNamedArgument,
            CustomAttributeValue, SERIALIZATION_TYPE,
        },
    },
    Result,
};

/// Maximum nesting of arrays and boxed values before a blob is rejected
const MAX_NESTING_DEPTH: usize = 64;

/// Maps an enum's reflection name to the kind of its underlying integer
pub type EnumResolver<'a> = dyn Fn(&str) -> Option<ArgumentKind> + 'a;

/// Parse custom attribute blob data using the constructor's parameter kinds.
///
/// Named arguments of enum type cannot be decoded without a resolver and produce a
/// [`crate::Error::Malformed`]; use [`parse_custom_attribute_data_with_resolver`] for those.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for an invalid prolog or truncated or invalid data.
///
/// # Examples
///
/// ```rust
/// use dotlink::metadata::customattributes::{
///     parse_custom_attribute_data, ArgumentKind, CustomAttributeArgument,
/// };
///
/// let blob = [0x01, 0x00, 0x05, b'H', b'e', b'l', b'l', b'o', 0x00, 0x00];
/// let value = parse_custom_attribute_data(&blob, &[ArgumentKind::String])?;
/// assert_eq!(value.fixed_args, vec![CustomAttributeArgument::String("Hello".into())]);
/// # Ok::<(), dotlink::Error>(())
/// ```
pub fn parse_custom_attribute_data(
    data: &[u8],
    params: &[ArgumentKind],
) -> Result<CustomAttributeValue> {
    let mut parser = CustomAttributeParser::new(data);
    parser.parse_custom_attribute(params)
}

/// Parse custom attribute blob data, resolving enum types of named arguments with `resolver`.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for an invalid prolog, truncated or invalid data, or an
/// enum type the resolver does not know.
pub fn parse_custom_attribute_data_with_resolver(
    data: &[u8],
    params: &[ArgumentKind],
    resolver: &EnumResolver<'_>,
) -> Result<CustomAttributeValue> {
    let mut parser = CustomAttributeParser::with_resolver(data, resolver);
    parser.parse_custom_attribute(params)
}

/// Custom attribute parser implementing ECMA-335 II.23.3 specification.
pub struct CustomAttributeParser<'a> {
    /// Binary data parser for reading attribute blob
    reader: BlobReader<'a>,
    /// Lookup for the underlying type of enums named in the blob
    enum_resolver: Option<&'a EnumResolver<'a>>,
}

impl<'a> CustomAttributeParser<'a> {
    /// Creates a new custom attribute parser for the provided blob data.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: BlobReader::new(data),
            enum_resolver: None,
        }
    }

    /// Creates a new custom attribute parser that can decode enum-typed named arguments.
    #[must_use]
    pub fn with_resolver(data: &'a [u8], resolver: &'a EnumResolver<'a>) -> Self {
        Self {
            reader: BlobReader::new(data),
            enum_resolver: Some(resolver),
        }
    }

    /// Parse a complete custom attribute blob.
    ///
    /// An empty blob stands for an attribute without arguments.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for various format violations:
    /// - Invalid prolog (not 0x0001)
    /// - Insufficient data for declared arguments
    /// - Invalid serialization types in named arguments
    /// - Nesting depth limit exceeded during parsing
    pub fn parse_custom_attribute(
        &mut self,
        params: &[ArgumentKind],
    ) -> Result<CustomAttributeValue> {
        if !self.reader.has_more_data() {
            if params.is_empty() {
                return Ok(CustomAttributeValue::default());
            }
            return Err(malformed_error!(
                "Empty custom attribute blob for a constructor with {} parameters",
                params.len()
            ));
        }

        let prolog = self.reader.read_le::<u16>()?;
        if prolog != 0x0001 {
            return Err(malformed_error!(
                "Invalid custom attribute prolog - expected 0x0001, got {:#06x}",
                prolog
            ));
        }

        let mut fixed_args = Vec::with_capacity(params.len());
        for kind in params {
            fixed_args.push(self.parse_value(kind, 0)?);
        }

        let mut named_args = Vec::new();
        if self.reader.remaining() >= 2 {
            let num_named = self.reader.read_le::<u16>()?;
            for _ in 0..num_named {
                match self.parse_named_argument()? {
                    Some(arg) => named_args.push(arg),
                    None => break,
                }
            }
        }

        Ok(CustomAttributeValue {
            fixed_args,
            named_args,
        })
    }

    /// Parse one named argument: `FIELD`/`PROPERTY` marker, type, name, value.
    fn parse_named_argument(&mut self) -> Result<Option<CustomAttributeNamedArgument>> {
        if !self.reader.has_more_data() {
            return Ok(None);
        }

        let field_or_prop = self.reader.read_le::<u8>()?;
        let is_field = match field_or_prop {
            SERIALIZATION_TYPE::FIELD => true,
            SERIALIZATION_TYPE::PROPERTY => false,
            // Some legacy compilers pad the named argument list with zeros
            0x00 => return Ok(None),
            _ => {
                return Err(malformed_error!(
                    "Invalid field/property indicator: 0x{:02X}",
                    field_or_prop
                ))
            }
        };

        let arg_type = self.parse_field_or_prop_type(0)?;
        let name = self
            .reader
            .read_ser_string()?
            .ok_or_else(|| malformed_error!("Named argument without a name"))?;
        let value = self.parse_value(&arg_type, 0)?;

        Ok(Some(CustomAttributeNamedArgument {
            is_field,
            name,
            arg_type,
            value,
        }))
    }

    /// Reads an encoded `FieldOrPropType`
    fn parse_field_or_prop_type(&mut self, depth: usize) -> Result<ArgumentKind> {
        if depth > MAX_NESTING_DEPTH {
            return Err(malformed_error!(
                "Custom attribute type nesting exceeds {}",
                MAX_NESTING_DEPTH
            ));
        }

        let tag = self.reader.read_le::<u8>()?;
        if let Some(kind) = ArgumentKind::from_primitive_tag(tag) {
            return Ok(kind);
        }

        match tag {
            SERIALIZATION_TYPE::SZARRAY => Ok(ArgumentKind::SzArray(Box::new(
                self.parse_field_or_prop_type(depth + 1)?,
            ))),
            SERIALIZATION_TYPE::ENUM => {
                let name = self
                    .reader
                    .read_ser_string()?
                    .ok_or_else(|| malformed_error!("Enum argument without a type name"))?;
                let underlying = self.resolve_enum(&name)?;
                Ok(ArgumentKind::Enum {
                    name,
                    underlying: Box::new(underlying),
                })
            }
            _ => Err(malformed_error!(
                "Unsupported custom attribute argument type: 0x{:02X}",
                tag
            )),
        }
    }

    fn resolve_enum(&self, name: &str) -> Result<ArgumentKind> {
        let underlying = self
            .enum_resolver
            .and_then(|resolver| resolver(name))
            .ok_or_else(|| malformed_error!("Cannot determine underlying type of enum {}", name))?;

        match underlying {
            ArgumentKind::Boolean
            | ArgumentKind::Char
            | ArgumentKind::I1
            | ArgumentKind::U1
            | ArgumentKind::I2
            | ArgumentKind::U2
            | ArgumentKind::I4
            | ArgumentKind::U4
            | ArgumentKind::I8
            | ArgumentKind::U8 => Ok(underlying),
            other => Err(malformed_error!(
                "Enum {} has non-integral underlying type {:?}",
                name,
                other
            )),
        }
    }

    /// Parse a value whose kind is known from the constructor signature or a type tag
    fn parse_value(&mut self, kind: &ArgumentKind, depth: usize) -> Result<CustomAttributeArgument> {
        if depth > MAX_NESTING_DEPTH {
            return Err(malformed_error!(
                "Custom attribute value nesting exceeds {}",
                MAX_NESTING_DEPTH
            ));
        }

        Ok(match kind {
            ArgumentKind::Boolean => CustomAttributeArgument::Bool(self.reader.read_le::<u8>()? != 0),
            ArgumentKind::Char => {
                let val = self.reader.read_le::<u16>()?;
                CustomAttributeArgument::Char(char::from_u32(u32::from(val)).unwrap_or('\u{FFFD}'))
            }
            ArgumentKind::I1 => CustomAttributeArgument::I1(self.reader.read_le::<i8>()?),
            ArgumentKind::U1 => CustomAttributeArgument::U1(self.reader.read_le::<u8>()?),
            ArgumentKind::I2 => CustomAttributeArgument::I2(self.reader.read_le::<i16>()?),
            ArgumentKind::U2 => CustomAttributeArgument::U2(self.reader.read_le::<u16>()?),
            ArgumentKind::I4 => CustomAttributeArgument::I4(self.reader.read_le::<i32>()?),
            ArgumentKind::U4 => CustomAttributeArgument::U4(self.reader.read_le::<u32>()?),
            ArgumentKind::I8 => CustomAttributeArgument::I8(self.reader.read_le::<i64>()?),
            ArgumentKind::U8 => CustomAttributeArgument::U8(self.reader.read_le::<u64>()?),
            ArgumentKind::R4 => CustomAttributeArgument::R4(self.reader.read_le::<f32>()?),
            ArgumentKind::R8 => CustomAttributeArgument::R8(self.reader.read_le::<f64>()?),
            ArgumentKind::String => {
                CustomAttributeArgument::String(self.reader.read_ser_string()?.unwrap_or_default())
            }
            ArgumentKind::Type => {
                CustomAttributeArgument::Type(self.reader.read_ser_string()?.unwrap_or_default())
            }
            ArgumentKind::Object => {
                let boxed = self.parse_field_or_prop_type(depth + 1)?;
                self.parse_value(&boxed, depth + 1)?
            }
            ArgumentKind::Enum { name, underlying } => CustomAttributeArgument::Enum(
                name.clone(),
                Box::new(self.parse_value(underlying, depth + 1)?),
            ),
            ArgumentKind::SzArray(element) => {
                let length = self.reader.read_le::<i32>()?;
                if length == -1 {
                    return Ok(CustomAttributeArgument::Array(Vec::new()));
                }
                let length = usize::try_from(length)
                    .map_err(|_| malformed_error!("Invalid array length: {}", length))?;
                // Every element takes at least one byte
                if length > self.reader.remaining() {
                    return Err(malformed_error!(
                        "Array of {} elements exceeds remaining {} bytes",
                        length,
                        self.reader.remaining()
                    ));
                }

                let mut items = Vec::with_capacity(length);
                for _ in 0..length {
                    items.push(self.parse_value(element, depth + 1)?);
                }
                CustomAttributeArgument::Array(items)
            }
        })
    }
}
