//! Custom attribute blob encoder, the inverse of [`super::parse_custom_attribute_data`].

use crate::{
    metadata::{
        blob::BlobWriter,
        customattributes::{
            ArgumentKind, CustomAttributeArgument, CustomAttributeNamedArgument,
            CustomAttributeValue, SERIALIZATION_TYPE,
        },
    },
    Result,
};

/// Encodes a custom attribute value against the constructor's parameter kinds.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the number of fixed arguments does not match
/// `params`, or a value does not fit the kind it is encoded as.
///
/// # Examples
///
/// ```rust
/// use dotlink::metadata::customattributes::{
///     encode_custom_attribute_value, parse_custom_attribute_data, ArgumentKind,
///     CustomAttributeArgument, CustomAttributeValue,
/// };
///
/// let value = CustomAttributeValue {
///     fixed_args: vec![CustomAttributeArgument::Type("App.Handler, App".into())],
///     named_args: vec![],
/// };
/// let blob = encode_custom_attribute_value(&value, &[ArgumentKind::Type])?;
/// assert_eq!(parse_custom_attribute_data(&blob, &[ArgumentKind::Type])?, value);
/// # Ok::<(), dotlink::Error>(())
/// ```
pub fn encode_custom_attribute_value(
    value: &CustomAttributeValue,
    params: &[ArgumentKind],
) -> Result<Vec<u8>> {
    if value.fixed_args.len() != params.len() {
        return Err(malformed_error!(
            "Constructor takes {} arguments, {} given",
            params.len(),
            value.fixed_args.len()
        ));
    }

    let mut writer = BlobWriter::new();
    writer.write_le::<u16>(0x0001);

    for (argument, kind) in value.fixed_args.iter().zip(params) {
        encode_value(&mut writer, argument, kind)?;
    }

    let num_named = u16::try_from(value.named_args.len())
        .map_err(|_| malformed_error!("Too many named arguments"))?;
    writer.write_le::<u16>(num_named);
    for named in &value.named_args {
        encode_named_argument(&mut writer, named)?;
    }

    Ok(writer.into_bytes())
}

fn encode_named_argument(
    writer: &mut BlobWriter,
    named: &CustomAttributeNamedArgument,
) -> Result<()> {
    writer.write_le::<u8>(if named.is_field {
        SERIALIZATION_TYPE::FIELD
    } else {
        SERIALIZATION_TYPE::PROPERTY
    });
    encode_field_or_prop_type(writer, &named.arg_type)?;
    writer.write_ser_string(Some(&named.name))?;
    encode_value(writer, &named.value, &named.arg_type)
}

fn encode_field_or_prop_type(writer: &mut BlobWriter, kind: &ArgumentKind) -> Result<()> {
    writer.write_le::<u8>(kind.tag());
    match kind {
        ArgumentKind::Enum { name, .. } => writer.write_ser_string(Some(name)),
        ArgumentKind::SzArray(element) => encode_field_or_prop_type(writer, element),
        _ => Ok(()),
    }
}

fn encode_value(
    writer: &mut BlobWriter,
    argument: &CustomAttributeArgument,
    kind: &ArgumentKind,
) -> Result<()> {
    match (kind, argument) {
        (ArgumentKind::Boolean, CustomAttributeArgument::Bool(v)) => writer.write_le(u8::from(*v)),
        (ArgumentKind::Char, CustomAttributeArgument::Char(v)) => {
            let code = u16::try_from(u32::from(*v))
                .map_err(|_| malformed_error!("Character {:?} outside the BMP", v))?;
            writer.write_le(code);
        }
        (ArgumentKind::I1, CustomAttributeArgument::I1(v)) => writer.write_le(*v),
        (ArgumentKind::U1, CustomAttributeArgument::U1(v)) => writer.write_le(*v),
        (ArgumentKind::I2, CustomAttributeArgument::I2(v)) => writer.write_le(*v),
        (ArgumentKind::U2, CustomAttributeArgument::U2(v)) => writer.write_le(*v),
        (ArgumentKind::I4, CustomAttributeArgument::I4(v)) => writer.write_le(*v),
        (ArgumentKind::U4, CustomAttributeArgument::U4(v)) => writer.write_le(*v),
        (ArgumentKind::I8, CustomAttributeArgument::I8(v)) => writer.write_le(*v),
        (ArgumentKind::U8, CustomAttributeArgument::U8(v)) => writer.write_le(*v),
        (ArgumentKind::R4, CustomAttributeArgument::R4(v)) => writer.write_le(*v),
        (ArgumentKind::R8, CustomAttributeArgument::R8(v)) => writer.write_le(*v),
        (ArgumentKind::String, CustomAttributeArgument::String(v)) => {
            writer.write_ser_string(Some(v))?;
        }
        (ArgumentKind::Type, CustomAttributeArgument::Type(v)) => {
            writer.write_ser_string((!v.is_empty()).then_some(v.as_str()))?;
        }
        (ArgumentKind::Object, value) => {
            let boxed = value.kind();
            encode_field_or_prop_type(writer, &boxed)?;
            encode_value(writer, value, &boxed)?;
        }
        (ArgumentKind::Enum { underlying, .. }, CustomAttributeArgument::Enum(_, value)) => {
            encode_value(writer, value, underlying)?;
        }
        (ArgumentKind::SzArray(element), CustomAttributeArgument::Array(items)) => {
            let length = i32::try_from(items.len())
                .map_err(|_| malformed_error!("Array of {} elements", items.len()))?;
            writer.write_le(length);
            for item in items {
                encode_value(writer, item, element)?;
            }
        }
        (kind, value) => {
            return Err(malformed_error!(
                "Value {:?} cannot be encoded as {:?}",
                value,
                kind
            ))
        }
    }
    Ok(())
}
