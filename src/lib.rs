//! # bitstruct — bit-level struct packing
//!
//! Packs integers of arbitrary bit width, IEEE-754 floats, booleans, raw bytes
//! and padding into a byte buffer described by a compact format string, and
//! unpacks buffers back into [`Value`]s. Fields need not start or end on a byte
//! boundary and each field carries its own byte order.
//!
//! ## Format strings
//!
//! A format is a concatenation of `[endian]type width` groups, for example
//! `"u1u3p7s16"` or `"u1<u2u3>f32"`.
//!
//! - `u` unsigned integer, `s` signed integer (two's complement)
//! - `f` float, 32 or 64 bits
//! - `b` boolean
//! - `r` raw bytes
//! - `p` padding, packed as zeros and skipped on unpack
//!
//! `>` means MSB first, `<` LSB first. An unmarked field uses the byte order
//! of the previous field (big endian when none is given), so in `"u1<u2u3"`
//! both `u2` and `u3` are LSB first. See [`FormatOptions::legacy`] for the
//! dialect without carry-forward.
//!
//! ## Usage
//!
//! ```
//! use bitstruct::{pack, unpack, values, Value};
//!
//! let packed = pack("u1u1s6u7u9", &values![0u8, 0u8, -2i8, 65u8, 22u16]).unwrap();
//! assert_eq!(packed, b"\x3e\x82\x16");
//!
//! let unpacked = unpack("u1u1s6u7u9", &packed).unwrap();
//! assert_eq!(unpacked[2], Value::Signed(-2));
//! ```
//!
//! Compile once with [`Codec`] when the same format is used repeatedly.

pub mod bits;
pub mod codec;
pub mod dump;
pub mod format;
pub mod swap;
pub mod value;

pub use bits::{translate_endianness, translate_endianness_by, BitString};
pub use codec::{Codec, CodecError};
pub use format::{Endianness, FieldKind, FieldSpec, Format, FormatOptions};
pub use swap::byteswap;
pub use value::Value;

/// Pack `values` according to `fmt`. When the total number of bits is not a
/// multiple of 8 the last byte is zero-padded.
pub fn pack(fmt: &str, values: &[Value]) -> Result<Vec<u8>, CodecError> {
    Codec::compile(fmt)?.pack(values)
}

/// Unpack `data` (presumably packed with the same `fmt`). Returns one value per
/// non-padding field, even when there is only one.
pub fn unpack(fmt: &str, data: &[u8]) -> Result<Vec<Value>, CodecError> {
    Codec::compile(fmt)?.unpack(data)
}

/// Number of bits described by `fmt`, padding included.
pub fn calcsize(fmt: &str) -> Result<usize, CodecError> {
    Ok(Format::compile(fmt)?.calcsize())
}
