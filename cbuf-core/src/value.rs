//! Decoded message representation.
//!
//! Decoders produce a [`Fields`] map per struct, in descriptor order.
//! Numeric and bool arrays stay as [`TypedArray`] views over the wire
//! buffer; element access converts on read, so buffer alignment never
//! matters. The backing [`Bytes`] keeps the caller's buffer alive for as
//! long as the view exists.

use std::sync::Arc;

use bytes::Bytes;

use crate::descriptor::ScalarKind;

/// A single decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(Arc<str>),
    /// Contiguous little-endian numeric array aliasing the source buffer.
    TypedArray(TypedArray),
    /// String or struct array elements, decoded one by one.
    List(Vec<Value>),
    /// A nested struct message.
    Struct(Fields),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Self::String(Arc::from(s.as_ref()))
    }

    pub fn as_struct(&self) -> Option<&Fields> {
        match self {
            Self::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn as_typed_array(&self) -> Option<&TypedArray> {
        match self {
            Self::TypedArray(arr) => Some(arr),
            _ => None,
        }
    }

    /// Name of the variant, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "Bool",
            Self::I8(_) => "I8",
            Self::I16(_) => "I16",
            Self::I32(_) => "I32",
            Self::I64(_) => "I64",
            Self::U8(_) => "U8",
            Self::U16(_) => "U16",
            Self::U32(_) => "U32",
            Self::U64(_) => "U64",
            Self::F32(_) => "F32",
            Self::F64(_) => "F64",
            Self::String(_) => "String",
            Self::TypedArray(_) => "TypedArray",
            Self::List(_) => "List",
            Self::Struct(_) => "Struct",
        }
    }
}

/// Ordered field-name → value map for one decoded struct.
///
/// Field order follows the descriptor; lookup is by name. Structs in this
/// format are small, so lookup is a linear scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Vec<(String, Value)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self(Vec::with_capacity(n))
    }

    /// Append a field, replacing any previous value under the same name.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for Fields {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A typed view over a contiguous run of little-endian scalars.
///
/// The backing bytes usually alias the buffer passed to the decoder
/// (zero-copy); building one from values copies instead. Equality is over
/// kind and bytes, so a copied array compares equal to an aliased one.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedArray {
    kind: ScalarKind,
    data: Bytes,
}

impl TypedArray {
    /// Wrap raw little-endian bytes. `data.len()` must be a multiple of the
    /// scalar width.
    pub fn from_bytes(kind: ScalarKind, data: Bytes) -> Option<Self> {
        if data.len() % kind.wire_size() != 0 {
            return None;
        }
        Some(Self { kind, data })
    }

    /// Build an array by encoding scalar values of the matching kind.
    /// Returns `None` when any value does not match `kind`.
    pub fn from_values(kind: ScalarKind, values: &[Value]) -> Option<Self> {
        let mut data = Vec::with_capacity(values.len() * kind.wire_size());
        for value in values {
            append_scalar_le(&mut data, kind, value)?;
        }
        Some(Self {
            kind,
            data: Bytes::from(data),
        })
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    /// Element count.
    pub fn len(&self) -> usize {
        self.data.len() / self.kind.wire_size()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The little-endian backing bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The backing buffer handle (cheap to clone, aliases the source).
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// Decode the element at `index`.
    pub fn value_at(&self, index: usize) -> Option<Value> {
        let width = self.kind.wire_size();
        let chunk = self.data.get(index * width..(index + 1) * width)?;
        Some(decode_scalar_le(self.kind, chunk))
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        let width = self.kind.wire_size();
        self.data
            .chunks_exact(width)
            .map(move |chunk| decode_scalar_le(self.kind, chunk))
    }

    pub fn to_values(&self) -> Vec<Value> {
        self.iter().collect()
    }
}

fn decode_scalar_le(kind: ScalarKind, chunk: &[u8]) -> Value {
    match kind {
        ScalarKind::Bool => Value::Bool(chunk[0] != 0),
        ScalarKind::U8 => Value::U8(chunk[0]),
        ScalarKind::I8 => Value::I8(chunk[0] as i8),
        ScalarKind::U16 => Value::U16(u16::from_le_bytes([chunk[0], chunk[1]])),
        ScalarKind::I16 => Value::I16(i16::from_le_bytes([chunk[0], chunk[1]])),
        ScalarKind::U32 => Value::U32(u32::from_le_bytes(chunk.try_into().expect("4-byte chunk"))),
        ScalarKind::I32 => Value::I32(i32::from_le_bytes(chunk.try_into().expect("4-byte chunk"))),
        ScalarKind::U64 => Value::U64(u64::from_le_bytes(chunk.try_into().expect("8-byte chunk"))),
        ScalarKind::I64 => Value::I64(i64::from_le_bytes(chunk.try_into().expect("8-byte chunk"))),
        ScalarKind::F32 => Value::F32(f32::from_le_bytes(chunk.try_into().expect("4-byte chunk"))),
        ScalarKind::F64 => Value::F64(f64::from_le_bytes(chunk.try_into().expect("8-byte chunk"))),
    }
}

fn append_scalar_le(out: &mut Vec<u8>, kind: ScalarKind, value: &Value) -> Option<()> {
    match (kind, value) {
        (ScalarKind::Bool, Value::Bool(v)) => out.push(u8::from(*v)),
        (ScalarKind::U8, Value::U8(v)) => out.push(*v),
        (ScalarKind::I8, Value::I8(v)) => out.push(*v as u8),
        (ScalarKind::U16, Value::U16(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (ScalarKind::I16, Value::I16(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (ScalarKind::U32, Value::U32(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (ScalarKind::I32, Value::I32(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (ScalarKind::U64, Value::U64(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (ScalarKind::I64, Value::I64(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (ScalarKind::F32, Value::F32(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (ScalarKind::F64, Value::F64(v)) => out.extend_from_slice(&v.to_le_bytes()),
        _ => return None,
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_array_round_trips_values() {
        let arr = TypedArray::from_values(
            ScalarKind::I32,
            &[Value::I32(-1), Value::I32(0), Value::I32(70000)],
        )
        .expect("matching kinds");
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.value_at(0), Some(Value::I32(-1)));
        assert_eq!(arr.value_at(2), Some(Value::I32(70000)));
        assert_eq!(arr.value_at(3), None);
        assert_eq!(arr.to_values().len(), 3);
    }

    #[test]
    fn typed_array_rejects_ragged_bytes() {
        assert!(TypedArray::from_bytes(ScalarKind::U32, Bytes::from_static(&[1, 2, 3])).is_none());
    }

    #[test]
    fn bool_array_reads_nonzero_as_true() {
        let arr = TypedArray::from_bytes(ScalarKind::Bool, Bytes::from_static(&[0, 1, 7]))
            .expect("1-byte elements");
        assert_eq!(arr.value_at(0), Some(Value::Bool(false)));
        assert_eq!(arr.value_at(1), Some(Value::Bool(true)));
        assert_eq!(arr.value_at(2), Some(Value::Bool(true)));
    }

    #[test]
    fn fields_preserve_order_and_replace_by_name() {
        let mut fields = Fields::new();
        fields.set("a", Value::U8(1));
        fields.set("b", Value::U8(2));
        fields.set("a", Value::U8(9));

        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("a"), Some(&Value::U8(9)));
        let order: Vec<&str> = fields.iter().map(|(n, _)| n).collect();
        assert_eq!(order, ["a", "b"]);
    }
}
