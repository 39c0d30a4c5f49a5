//! Record framing: the 24-byte little-endian preamble.
//!
//! Layout: magic `u32`, size-and-variant `u32`, type hash `u64`, timestamp
//! `f64` (seconds since the Unix epoch). When bit 31 of the size word is
//! set, bits 27–30 carry a variant and the size lives in the low 27 bits;
//! otherwise the low 31 bits are all size. Whether the bit was set is
//! preserved through decode so re-encoding is byte-exact.

use bytes::{BufMut, BytesMut};
use cbuf_core::WireError;

/// "TNDV" in little-endian byte order.
pub const CBUF_MAGIC: u32 = 0x5644_4E54;

/// Total preamble length in bytes.
pub const PREAMBLE_SIZE: usize = 24;

const VARIANT_BIT: u32 = 0x8000_0000;
const VARIANT_SIZE_MASK: u32 = 0x07FF_FFFF;
const PLAIN_SIZE_MASK: u32 = 0x7FFF_FFFF;

/// Decoded preamble of a framed record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preamble {
    /// Total record length, header included.
    pub size: u32,
    /// `Some` iff the variant bit was set on the wire.
    pub variant: Option<u8>,
    pub hash: u64,
    pub timestamp: f64,
}

impl Preamble {
    /// Parse and validate a preamble at the start of `view`.
    pub fn read(view: &[u8]) -> Result<Self, WireError> {
        if view.len() < PREAMBLE_SIZE {
            return Err(WireError::TruncatedRecord {
                needed: PREAMBLE_SIZE,
                available: view.len(),
            });
        }
        let magic = u32::from_le_bytes(view[0..4].try_into().expect("4 bytes"));
        if magic != CBUF_MAGIC {
            return Err(WireError::InvalidMagic {
                found: magic,
                expected: CBUF_MAGIC,
            });
        }
        let word = u32::from_le_bytes(view[4..8].try_into().expect("4 bytes"));
        let (size, variant) = unpack_size_and_variant(word);
        let hash = u64::from_le_bytes(view[8..16].try_into().expect("8 bytes"));
        let timestamp = f64::from_le_bytes(view[16..24].try_into().expect("8 bytes"));
        Ok(Self {
            size,
            variant,
            hash,
            timestamp,
        })
    }

    /// Append the 24 preamble bytes to `out`.
    pub fn write(&self, out: &mut BytesMut) {
        out.put_u32_le(CBUF_MAGIC);
        out.put_u32_le(pack_size_and_variant(self.size, self.variant));
        out.put_u64_le(self.hash);
        out.put_f64_le(self.timestamp);
    }

    /// Largest encodable record size for this preamble's variant mode.
    pub fn max_size(variant: Option<u8>) -> u32 {
        if variant.is_some() {
            VARIANT_SIZE_MASK
        } else {
            PLAIN_SIZE_MASK
        }
    }
}

/// Split a size word into (size, variant).
pub fn unpack_size_and_variant(word: u32) -> (u32, Option<u8>) {
    if word & VARIANT_BIT != 0 {
        ((word & VARIANT_SIZE_MASK), Some(((word >> 27) & 0x0F) as u8))
    } else {
        (word & PLAIN_SIZE_MASK, None)
    }
}

/// Pack a size and optional variant back into the wire word.
pub fn pack_size_and_variant(size: u32, variant: Option<u8>) -> u32 {
    match variant {
        Some(v) => VARIANT_BIT | (u32::from(v & 0x0F) << 27) | (size & VARIANT_SIZE_MASK),
        None => size & PLAIN_SIZE_MASK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpacks_variant_word() {
        // Bit 31 set, variant 1, size 25.
        assert_eq!(unpack_size_and_variant(0x8800_0019), (25, Some(1)));
        assert_eq!(unpack_size_and_variant(0x0000_0019), (25, None));
    }

    #[test]
    fn pack_round_trips_both_modes() {
        for word in [0x8800_0019u32, 0x0000_0019, 0x8000_0001, 0x7FFF_FFFF] {
            let (size, variant) = unpack_size_and_variant(word);
            assert_eq!(pack_size_and_variant(size, variant), word);
        }
    }

    #[test]
    fn preamble_round_trips() {
        let preamble = Preamble {
            size: 40,
            variant: Some(3),
            hash: 0x0123_4567_89AB_CDEF,
            timestamp: 1_700_000_000.25,
        };
        let mut out = BytesMut::new();
        preamble.write(&mut out);
        assert_eq!(out.len(), PREAMBLE_SIZE);
        assert_eq!(Preamble::read(&out).expect("read"), preamble);
    }

    #[test]
    fn rejects_bad_magic_and_short_input() {
        let mut out = BytesMut::new();
        Preamble {
            size: 24,
            variant: None,
            hash: 1,
            timestamp: 0.0,
        }
        .write(&mut out);
        let mut bytes = out.to_vec();
        bytes[0] ^= 0xFF;
        assert!(matches!(
            Preamble::read(&bytes),
            Err(WireError::InvalidMagic { .. })
        ));
        assert!(matches!(
            Preamble::read(&bytes[..10]),
            Err(WireError::TruncatedRecord { .. })
        ));
    }
}
