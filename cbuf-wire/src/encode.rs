//! Record serialization and wire-size computation.
//!
//! `naked_size` and `write_struct_body` mirror each other field for field;
//! the serializer sizes the message first, allocates exactly that many
//! bytes, and checks the written length at the end. Missing or ill-typed
//! field values fail with [`WireError::Encoding`] — nothing is zero-filled.

use bytes::{BufMut, BytesMut};
use cbuf_core::{
    ArrayKind, ElementDescriptor, ElementType, Fields, HashIndex, QualName, ScalarKind, Schema,
    StructDescriptor, TypedArray, Value, WireError,
};

use crate::{
    frame::{Preamble, PREAMBLE_SIZE},
    record::Record,
};

/// Total wire size of `record` when serialized against its descriptor.
pub fn serialized_message_size(
    schema: &Schema,
    index: &HashIndex,
    record: &Record,
) -> Result<usize, WireError> {
    let desc = index.resolve(record.hash_value)?;
    Ok(PREAMBLE_SIZE + naked_size(schema, &desc, &record.message)?)
}

/// Serialize one framed record. The output length always equals
/// [`serialized_message_size`] for the same record.
pub fn serialize_message(
    schema: &Schema,
    index: &HashIndex,
    record: &Record,
) -> Result<bytes::Bytes, WireError> {
    let desc = index.resolve(record.hash_value)?;
    let total = PREAMBLE_SIZE + naked_size(schema, &desc, &record.message)?;
    if total as u64 > u64::from(Preamble::max_size(record.variant)) {
        return Err(WireError::encoding(
            desc.name.as_str(),
            format!("record of {total} bytes exceeds the encodable size"),
        ));
    }

    let mut out = BytesMut::with_capacity(total);
    Preamble {
        size: total as u32,
        variant: record.variant,
        hash: record.hash_value,
        timestamp: record.timestamp,
    }
    .write(&mut out);
    write_struct_body(schema, &desc, &record.message, &mut out)?;

    if out.len() != total {
        return Err(WireError::encoding(
            desc.name.as_str(),
            format!("wrote {} bytes where {total} were sized", out.len()),
        ));
    }
    Ok(out.freeze())
}

/// Wire size of a struct body (no preamble).
pub(crate) fn naked_size(
    schema: &Schema,
    desc: &StructDescriptor,
    fields: &Fields,
) -> Result<usize, WireError> {
    let mut size = 0usize;
    for element in &desc.elements {
        let value = field_value(desc, element, fields)?;
        size += element_size(schema, desc, element, value)?;
    }
    Ok(size)
}

/// Write a struct body (no preamble), mirroring [`naked_size`].
pub(crate) fn write_struct_body(
    schema: &Schema,
    desc: &StructDescriptor,
    fields: &Fields,
    out: &mut BytesMut,
) -> Result<(), WireError> {
    for element in &desc.elements {
        let value = field_value(desc, element, fields)?;
        write_element(schema, desc, element, value, out)?;
    }
    Ok(())
}

fn field_value<'a>(
    desc: &StructDescriptor,
    element: &ElementDescriptor,
    fields: &'a Fields,
) -> Result<&'a Value, WireError> {
    fields.get(&element.name).ok_or_else(|| {
        WireError::encoding(
            context(desc, element),
            "message has no value for this field",
        )
    })
}

fn context(desc: &StructDescriptor, element: &ElementDescriptor) -> String {
    format!("{}.{}", desc.name, element.name)
}

fn mismatch(desc: &StructDescriptor, element: &ElementDescriptor, value: &Value) -> WireError {
    WireError::encoding(
        context(desc, element),
        format!(
            "value kind {} does not match element type '{}'",
            value.kind_name(),
            element.ty.type_name()
        ),
    )
}

/// Scalar kind backing numeric and enum elements in arrays.
fn array_scalar_kind(ty: &ElementType) -> Option<ScalarKind> {
    match ty {
        ElementType::Scalar(kind) => Some(*kind),
        ElementType::Enum32 => Some(ScalarKind::I32),
        _ => None,
    }
}

/// Validate an array value's element count against the declared kind.
/// Returns (count, prefix bytes).
fn array_count(
    desc: &StructDescriptor,
    element: &ElementDescriptor,
    count: usize,
) -> Result<(u32, usize), WireError> {
    let count32 = u32::try_from(count)
        .map_err(|_| WireError::encoding(context(desc, element), "array too long"))?;
    match element.array {
        ArrayKind::Scalar => unreachable!("array_count on a scalar element"),
        ArrayKind::Fixed(n) => {
            if count32 != n {
                return Err(WireError::encoding(
                    context(desc, element),
                    format!("fixed array of {n} elements got {count32}"),
                ));
            }
            Ok((count32, 0))
        }
        ArrayKind::Compact(bound) => {
            if count32 > bound {
                return Err(WireError::CompactOverflow {
                    element: element.name.clone(),
                    count: count32,
                    bound,
                });
            }
            Ok((count32, 4))
        }
        ArrayKind::Dynamic => Ok((count32, 4)),
    }
}

fn element_size(
    schema: &Schema,
    desc: &StructDescriptor,
    element: &ElementDescriptor,
    value: &Value,
) -> Result<usize, WireError> {
    if element.array == ArrayKind::Scalar {
        return scalar_size(schema, desc, element, value);
    }

    match value {
        Value::TypedArray(array) => {
            let Some(kind) = array_scalar_kind(&element.ty) else {
                return Err(mismatch(desc, element, value));
            };
            if array.kind() != kind {
                return Err(mismatch(desc, element, value));
            }
            let (_, prefix) = array_count(desc, element, array.len())?;
            Ok(prefix + array.as_bytes().len())
        }
        Value::List(items) => {
            let (_, prefix) = array_count(desc, element, items.len())?;
            let mut size = prefix;
            for item in items {
                size += scalar_size(schema, desc, element, item)?;
            }
            Ok(size)
        }
        _ => Err(mismatch(desc, element, value)),
    }
}

fn write_element(
    schema: &Schema,
    desc: &StructDescriptor,
    element: &ElementDescriptor,
    value: &Value,
    out: &mut BytesMut,
) -> Result<(), WireError> {
    if element.array == ArrayKind::Scalar {
        return write_scalar(schema, desc, element, value, out);
    }

    match value {
        Value::TypedArray(array) => {
            let Some(kind) = array_scalar_kind(&element.ty) else {
                return Err(mismatch(desc, element, value));
            };
            if array.kind() != kind {
                return Err(mismatch(desc, element, value));
            }
            let (count, prefix) = array_count(desc, element, array.len())?;
            if prefix > 0 {
                out.put_u32_le(count);
            }
            out.put_slice(array.as_bytes());
            Ok(())
        }
        Value::List(items) => {
            let (count, prefix) = array_count(desc, element, items.len())?;
            if prefix > 0 {
                out.put_u32_le(count);
            }
            for item in items {
                write_scalar(schema, desc, element, item, out)?;
            }
            Ok(())
        }
        _ => Err(mismatch(desc, element, value)),
    }
}

/// Size of one scalar (or one array item) of this element's type.
fn scalar_size(
    schema: &Schema,
    desc: &StructDescriptor,
    element: &ElementDescriptor,
    value: &Value,
) -> Result<usize, WireError> {
    match &element.ty {
        ElementType::Scalar(kind) => match_scalar(desc, element, *kind, value)
            .map(|_| kind.wire_size()),
        ElementType::Enum32 => {
            match_scalar(desc, element, ScalarKind::I32, value).map(|_| 4)
        }
        ElementType::String { upper_bound } => {
            let Value::String(s) = value else {
                return Err(mismatch(desc, element, value));
            };
            match upper_bound {
                Some(bound) => {
                    if s.len() > *bound as usize {
                        return Err(WireError::encoding(
                            context(desc, element),
                            format!("string of {} bytes exceeds bound {bound}", s.len()),
                        ));
                    }
                    Ok(*bound as usize)
                }
                None => Ok(4 + s.len()),
            }
        }
        ElementType::Struct(name) => {
            let inner = nested_descriptor(schema, name)?;
            let Value::Struct(inner_fields) = value else {
                return Err(mismatch(desc, element, value));
            };
            let body = naked_size(schema, &inner, inner_fields)?;
            Ok(if inner.naked { body } else { PREAMBLE_SIZE + body })
        }
    }
}

/// Write one scalar (or one array item), mirroring [`scalar_size`].
fn write_scalar(
    schema: &Schema,
    desc: &StructDescriptor,
    element: &ElementDescriptor,
    value: &Value,
    out: &mut BytesMut,
) -> Result<(), WireError> {
    match &element.ty {
        ElementType::Scalar(kind) => put_scalar(out, *kind, value)
            .ok_or_else(|| mismatch(desc, element, value)),
        ElementType::Enum32 => put_scalar(out, ScalarKind::I32, value)
            .ok_or_else(|| mismatch(desc, element, value)),
        ElementType::String { upper_bound } => {
            let Value::String(s) = value else {
                return Err(mismatch(desc, element, value));
            };
            match upper_bound {
                Some(bound) => {
                    let bound = *bound as usize;
                    if s.len() > bound {
                        return Err(WireError::encoding(
                            context(desc, element),
                            format!("string of {} bytes exceeds bound {bound}", s.len()),
                        ));
                    }
                    out.put_slice(s.as_bytes());
                    out.put_bytes(0, bound - s.len());
                }
                None => {
                    out.put_u32_le(s.len() as u32);
                    out.put_slice(s.as_bytes());
                }
            }
            Ok(())
        }
        ElementType::Struct(name) => {
            let inner = nested_descriptor(schema, name)?;
            let Value::Struct(inner_fields) = value else {
                return Err(mismatch(desc, element, value));
            };
            if !inner.naked {
                let body = naked_size(schema, &inner, inner_fields)?;
                // Nested records carry no variant and a zero timestamp.
                Preamble {
                    size: (PREAMBLE_SIZE + body) as u32,
                    variant: None,
                    hash: inner.hash_value,
                    timestamp: 0.0,
                }
                .write(out);
            }
            write_struct_body(schema, &inner, inner_fields, out)
        }
    }
}

fn nested_descriptor(
    schema: &Schema,
    name: &QualName,
) -> Result<std::sync::Arc<StructDescriptor>, WireError> {
    schema.get(name).cloned().ok_or_else(|| {
        WireError::encoding(
            name.as_str(),
            "schema map has no descriptor for nested type",
        )
    })
}

fn match_scalar(
    desc: &StructDescriptor,
    element: &ElementDescriptor,
    kind: ScalarKind,
    value: &Value,
) -> Result<(), WireError> {
    // Sizing only needs the type check; reuse the encoder's matching rules.
    if TypedArray::from_values(kind, std::slice::from_ref(value)).is_none() {
        return Err(mismatch(desc, element, value));
    }
    Ok(())
}

fn put_scalar(out: &mut BytesMut, kind: ScalarKind, value: &Value) -> Option<()> {
    match (kind, value) {
        (ScalarKind::Bool, Value::Bool(v)) => out.put_u8(u8::from(*v)),
        (ScalarKind::U8, Value::U8(v)) => out.put_u8(*v),
        (ScalarKind::I8, Value::I8(v)) => out.put_i8(*v),
        (ScalarKind::U16, Value::U16(v)) => out.put_u16_le(*v),
        (ScalarKind::I16, Value::I16(v)) => out.put_i16_le(*v),
        (ScalarKind::U32, Value::U32(v)) => out.put_u32_le(*v),
        (ScalarKind::I32, Value::I32(v)) => out.put_i32_le(*v),
        (ScalarKind::U64, Value::U64(v)) => out.put_u64_le(*v),
        (ScalarKind::I64, Value::I64(v)) => out.put_i64_le(*v),
        (ScalarKind::F32, Value::F32(v)) => out.put_f32_le(*v),
        (ScalarKind::F64, Value::F64(v)) => out.put_f64_le(*v),
        _ => return None,
    }
    Some(())
}
