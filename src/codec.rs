//! Pack/unpack values according to a compiled format.
//!
//! Packing encodes each field into its own bit string, appends it to the
//! accumulator and zero-pads the result to a whole number of bytes once, at
//! the very end. Unpacking views the buffer as MSB-first bits and walks the
//! fields with a bit cursor.
//!
//! Per-field byte order: integers, booleans and raw fields are rendered
//! MSB-first and group-reversed for `<` fields (see [`crate::bits`]). Floats
//! are taken as their big-endian IEEE-754 byte image and go through the raw
//! encoder, so `<f32` stores the bytes little endian.

use crate::bits::{self, BitString};
use crate::format::{Endianness, FieldKind, FieldSpec, Format, FormatOptions};
use crate::value::Value;
use bitvec::prelude::*;
use byteorder::{BigEndian, ByteOrder};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("Format: {0}")]
    Format(String),
    #[error("Range: {0}")]
    Range(String),
    #[error("Arity: {0}")]
    Arity(String),
    #[error("Type: {0}")]
    Type(String),
    #[error("Value: {0}")]
    Value(String),
}

impl CodecError {
    fn at_field(self, index: usize, field: &FieldSpec) -> Self {
        let ctx = |m: String| format!("field {} ({}): {}", index, field, m);
        match self {
            CodecError::Format(m) => CodecError::Format(ctx(m)),
            CodecError::Range(m) => CodecError::Range(ctx(m)),
            CodecError::Arity(m) => CodecError::Arity(ctx(m)),
            CodecError::Type(m) => CodecError::Type(ctx(m)),
            CodecError::Value(m) => CodecError::Value(ctx(m)),
        }
    }
}

/// A compiled format whose field widths have been checked against their kinds.
#[derive(Debug, Clone)]
pub struct Codec {
    format: Format,
}

impl Codec {
    /// Fails with [`CodecError::Range`] when a float field is not 32 or 64 bits wide.
    pub fn new(format: Format) -> Result<Self, CodecError> {
        for (index, field) in format.fields().iter().enumerate() {
            check_width(field).map_err(|e| e.at_field(index, field))?;
        }
        Ok(Codec { format })
    }

    pub fn compile(descriptor: &str) -> Result<Self, CodecError> {
        Self::new(Format::compile(descriptor)?)
    }

    pub fn compile_with(descriptor: &str, options: FormatOptions) -> Result<Self, CodecError> {
        Self::new(Format::compile_with(descriptor, options)?)
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    /// Size in bits.
    pub fn calcsize(&self) -> usize {
        self.format.calcsize()
    }

    /// Size of a packed buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.calcsize().div_ceil(8)
    }

    /// Pack `values` (one per non-padding field, in order). Trailing bits of the
    /// last byte are zero.
    pub fn pack(&self, values: &[Value]) -> Result<Vec<u8>, CodecError> {
        let expected = self.format.value_count();
        if values.len() != expected {
            return Err(CodecError::Arity(format!(
                "format '{}' takes {} value(s), got {}",
                self.format,
                expected,
                values.len()
            )));
        }

        let mut bits = BitString::with_capacity(self.calcsize());
        let mut args = values.iter();
        for (index, field) in self.format.fields().iter().enumerate() {
            if field.kind == FieldKind::Pad {
                bits.resize(bits.len() + field.width, false);
                continue;
            }
            let value = args
                .next()
                .ok_or_else(|| CodecError::Arity(format!("no value for field {} ({})", index, field)))?;
            let encoded = encode_field(field, value).map_err(|e| e.at_field(index, field))?;
            bits.extend_from_bitslice(&encoded);
        }

        let out = bits::into_padded_bytes(bits);
        tracing::debug!(format = %self.format, bytes = out.len(), "packed");
        Ok(out)
    }

    /// Unpack one value per non-padding field. Bytes beyond the format's size are ignored.
    pub fn unpack(&self, data: &[u8]) -> Result<Vec<Value>, CodecError> {
        let bits = data.view_bits::<Msb0>();
        let mut out = Vec::with_capacity(self.format.value_count());
        let mut pos = 0usize;
        for (index, field) in self.format.fields().iter().enumerate() {
            let end = pos.checked_add(field.width).ok_or_else(|| {
                CodecError::Arity(format!("field {} ({}) starts past the addressable range", index, field))
            })?;
            let value = match field.kind {
                FieldKind::Pad => {
                    pos = end;
                    continue;
                }
                FieldKind::Unsigned => {
                    let field_bits = field_slice(bits, pos, end, index, field)?;
                    decode_unsigned(&bits::from_field_order(field_bits, field.endianness)).map(Value::Unsigned)
                }
                FieldKind::Signed => {
                    let field_bits = field_slice(bits, pos, end, index, field)?;
                    decode_signed(&bits::from_field_order(field_bits, field.endianness)).map(Value::Signed)
                }
                // Any set bit makes it true, whatever the group order.
                FieldKind::Boolean => Ok(Value::Bool(field_slice(bits, pos, end, index, field)?.any())),
                FieldKind::Float => decode_float(field, field_slice(bits, pos, end, index, field)?),
                FieldKind::Raw => Ok(Value::Raw(decode_raw(
                    field_slice(bits, pos, end, index, field)?,
                    field.endianness,
                ))),
            };
            out.push(value.map_err(|e| e.at_field(index, field))?);
            pos = end;
        }
        tracing::debug!(format = %self.format, bytes = data.len(), values = out.len(), "unpacked");
        Ok(out)
    }
}

fn check_width(field: &FieldSpec) -> Result<(), CodecError> {
    match field.kind {
        FieldKind::Float if field.width != 32 && field.width != 64 => Err(CodecError::Range(format!(
            "bad float size {}, must be 32 or 64 bits",
            field.width
        ))),
        _ => Ok(()),
    }
}

// ---------- Encoding ----------

/// Two's-complement image of an integer: the low 128 bits, plus the bit
/// repeated above them for fields wider than 128.
#[derive(Debug, Clone, Copy)]
struct Image {
    low: u128,
    negative: bool,
}

impl Image {
    fn unsigned(x: u128) -> Self {
        Image { low: x, negative: false }
    }

    fn signed(x: i128) -> Self {
        Image { low: x as u128, negative: x < 0 }
    }

    /// `width` bits, most significant first.
    fn to_bits(self, width: usize) -> BitString {
        (0..width)
            .rev()
            .map(|i| if i >= 128 { self.negative } else { (self.low >> i) & 1 == 1 })
            .collect()
    }
}

/// Smallest and largest value of a `width`-bit two's-complement integer.
fn signed_bounds(width: usize) -> (i128, i128) {
    if width >= 128 {
        (i128::MIN, i128::MAX)
    } else {
        let half = 1i128 << (width - 1);
        (-half, half - 1)
    }
}

fn fits_unsigned(width: usize, x: u128) -> bool {
    width >= 128 || x < (1u128 << width)
}

fn encode_field(field: &FieldSpec, value: &Value) -> Result<BitString, CodecError> {
    let bits = match field.kind {
        FieldKind::Unsigned => encode_unsigned(field.width, value)?,
        FieldKind::Signed => encode_signed(field.width, value)?,
        FieldKind::Boolean => encode_boolean(field.width, value)?,
        FieldKind::Float => return encode_float(field, value),
        FieldKind::Raw => {
            let bytes = value
                .as_bytes()
                .ok_or_else(|| type_error(field, value))?;
            return Ok(encode_raw(bytes, field.width, field.endianness));
        }
        FieldKind::Pad => BitString::repeat(false, field.width),
    };
    Ok(bits::to_field_order(bits, field.endianness))
}

fn type_error(field: &FieldSpec, value: &Value) -> CodecError {
    CodecError::Type(format!(
        "cannot pack a {} value into a '{}' field",
        value.type_name(),
        field.kind.letter()
    ))
}

/// Negative values are stored as `2^width + value`.
fn encode_unsigned(width: usize, value: &Value) -> Result<BitString, CodecError> {
    let image = match *value {
        Value::Unsigned(x) if fits_unsigned(width, x) => Image::unsigned(x),
        Value::Signed(x) if x >= 0 && fits_unsigned(width, x as u128) => Image::unsigned(x as u128),
        Value::Signed(x) if x < 0 && x >= signed_bounds(width).0 => Image::signed(x),
        Value::Unsigned(_) | Value::Signed(_) => {
            return Err(CodecError::Value(format!(
                "{} does not fit in {} unsigned bits",
                value, width
            )))
        }
        _ => {
            return Err(CodecError::Type(format!(
                "cannot pack a {} value into a 'u' field",
                value.type_name()
            )))
        }
    };
    Ok(image.to_bits(width))
}

fn encode_signed(width: usize, value: &Value) -> Result<BitString, CodecError> {
    let (min, max) = signed_bounds(width);
    let x = match *value {
        Value::Signed(x) => Some(x),
        Value::Unsigned(x) => i128::try_from(x).ok(),
        _ => {
            return Err(CodecError::Type(format!(
                "cannot pack a {} value into a 's' field",
                value.type_name()
            )))
        }
    };
    match x {
        Some(x) if x >= min && x <= max => Ok(Image::signed(x).to_bits(width)),
        _ => Err(CodecError::Value(format!(
            "{} does not fit in {} signed bits ({}..={})",
            value, width, min, max
        ))),
    }
}

/// The whole field holds 1 or 0; integers are packed as unsigned.
fn encode_boolean(width: usize, value: &Value) -> Result<BitString, CodecError> {
    match *value {
        Value::Bool(b) => Ok(Image::unsigned(b as u128).to_bits(width)),
        Value::Unsigned(_) | Value::Signed(_) => encode_unsigned(width, value),
        _ => Err(CodecError::Type(format!(
            "cannot pack a {} value into a 'b' field",
            value.type_name()
        ))),
    }
}

fn encode_float(field: &FieldSpec, value: &Value) -> Result<BitString, CodecError> {
    let x = match *value {
        Value::Float(x) => x,
        Value::Unsigned(x) => x as f64,
        Value::Signed(x) => x as f64,
        _ => return Err(type_error(field, value)),
    };
    let bytes = match field.width {
        32 => {
            let mut buf = [0u8; 4];
            BigEndian::write_f32(&mut buf, x as f32);
            buf.to_vec()
        }
        64 => {
            let mut buf = [0u8; 8];
            BigEndian::write_f64(&mut buf, x);
            buf.to_vec()
        }
        n => {
            return Err(CodecError::Range(format!(
                "bad float size {}, must be 32 or 64 bits",
                n
            )))
        }
    };
    Ok(encode_raw(&bytes, field.width, field.endianness))
}

/// The first `width` bits of `bytes`, zero-filled when `bytes` is shorter.
fn encode_raw(bytes: &[u8], width: usize, endianness: Endianness) -> BitString {
    let view = bytes.view_bits::<Msb0>();
    let mut bits = BitString::with_capacity(width);
    bits.extend_from_bitslice(&view[..width.min(view.len())]);
    bits.resize(width, false);
    bits::to_field_order(bits, endianness)
}

// ---------- Decoding ----------

fn field_slice<'a>(
    bits: &'a BitSlice<u8, Msb0>,
    pos: usize,
    end: usize,
    index: usize,
    field: &FieldSpec,
) -> Result<&'a BitSlice<u8, Msb0>, CodecError> {
    bits.get(pos..end).ok_or_else(|| {
        CodecError::Arity(format!(
            "field {} ({}) needs bits {}..{} but the buffer holds {}",
            index,
            field,
            pos,
            end,
            bits.len()
        ))
    })
}

fn fold_u128(bits: &BitSlice<u8, Msb0>) -> u128 {
    bits.iter().by_vals().fold(0u128, |acc, b| (acc << 1) | b as u128)
}

fn decode_unsigned(bits: &BitSlice<u8, Msb0>) -> Result<u128, CodecError> {
    let (high, low) = bits.split_at(bits.len().saturating_sub(128));
    if high.any() {
        return Err(CodecError::Value(format!(
            "{}-bit unsigned value does not fit in 128 bits",
            bits.len()
        )));
    }
    Ok(fold_u128(low))
}

/// Negative when the top bit of the MSB-first field is set.
fn decode_signed(bits: &BitSlice<u8, Msb0>) -> Result<i128, CodecError> {
    let width = bits.len();
    let negative = bits.first().map(|b| *b).unwrap_or(false);
    if width < 128 {
        let pattern = fold_u128(bits);
        return Ok(if negative {
            (pattern | (!0u128 << width)) as i128
        } else {
            pattern as i128
        });
    }
    let (high, low) = bits.split_at(width - 128);
    let sign_extended = high.iter().by_vals().all(|b| b == negative) && low[0] == negative;
    if !sign_extended {
        return Err(CodecError::Value(format!(
            "{}-bit signed value does not fit in 128 bits",
            width
        )));
    }
    Ok(fold_u128(low) as i128)
}

fn decode_float(field: &FieldSpec, slice: &BitSlice<u8, Msb0>) -> Result<Value, CodecError> {
    let bytes = decode_raw(slice, field.endianness);
    match field.width {
        32 => Ok(Value::Float(BigEndian::read_f32(&bytes) as f64)),
        64 => Ok(Value::Float(BigEndian::read_f64(&bytes))),
        n => Err(CodecError::Range(format!(
            "bad float size {}, must be 32 or 64 bits",
            n
        ))),
    }
}

/// Whole bytes of the field. A trailing partial group becomes one more byte
/// with its bits in the high-order positions and zeros below.
fn decode_raw(slice: &BitSlice<u8, Msb0>, endianness: Endianness) -> Vec<u8> {
    bits::into_padded_bytes(bits::from_field_order(slice, endianness))
}
