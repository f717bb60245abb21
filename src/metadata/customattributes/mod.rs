//! Custom attribute parsing and representation for .NET metadata.
//!
//! Custom attributes encode metadata annotations in a compact binary format that includes
//! constructor arguments and named field/property values:
//! - **Prolog** - Standard 0x0001 marker indicating valid custom attribute blob
//! - **Fixed Arguments** - Constructor parameter values in declaration order
//! - **Named Arguments** - Field and property values with name/value pairs
//!
//! Attributes are kept as raw blobs on their owners ([`CustomAttribute`]) and decoded on
//! demand, see [`crate::metadata::MetadataModel::decode_custom_attribute`] for decoding
//! against a resolved constructor.
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Section 23.3 - Custom Attributes

mod encoder;
mod parser;
mod types;

pub use encoder::encode_custom_attribute_value;
pub use parser::{
    parse_custom_attribute_data, parse_custom_attribute_data_with_resolver,
    CustomAttributeParser, EnumResolver,
};
pub use types::*;
