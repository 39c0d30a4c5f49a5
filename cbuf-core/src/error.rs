//! Error type for the codec layer.

/// Error returned by the wire codec and by hash-index construction.
///
/// Every variant maps to one failure mode of record decoding or encoding;
/// nothing is retried internally and no partial output is surfaced.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WireError {
    /// The caller-supplied offset lies outside the buffer.
    #[error("offset {offset} out of range for a buffer of {len} bytes")]
    InvalidOffset { offset: usize, len: usize },

    /// The record does not start with the cbuf magic word.
    #[error("bad record magic 0x{found:08X} (expected 0x{expected:08X})")]
    InvalidMagic { found: u32, expected: u32 },

    /// Fewer bytes are available than the record needs.
    #[error("record needs {needed} bytes but only {available} are available")]
    TruncatedRecord { needed: usize, available: usize },

    /// No descriptor is registered for the record's hash.
    #[error("no descriptor for hash 0x{hash:016X}")]
    UnknownHash { hash: u64 },

    /// A compact array carries more elements than its declared bound.
    #[error("compact array '{element}' holds {count} elements, over its bound of {bound}")]
    CompactOverflow {
        element: String,
        count: u32,
        bound: u32,
    },

    /// Decoding consumed a different number of bytes than the header declared.
    #[error("record declared {declared} bytes but decoding consumed {consumed}")]
    SizeMismatch { declared: usize, consumed: usize },

    /// A field value was missing or ill-typed during encoding, or an
    /// element referenced a type the schema map does not contain.
    #[error("encoding failed at '{context}': {detail}")]
    Encoding { context: String, detail: String },

    /// Two distinct descriptors hash to the same value.
    #[error("hash 0x{hash:016X} is shared by '{first}' and '{second}'")]
    AmbiguousHash {
        hash: u64,
        first: String,
        second: String,
    },
}

impl WireError {
    /// Shorthand for [`WireError::Encoding`].
    pub fn encoding(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Encoding {
            context: context.into(),
            detail: detail.into(),
        }
    }
}
