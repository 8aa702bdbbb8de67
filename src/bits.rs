//! Bit strings and endianness translation.
//!
//! A [`BitString`] is an arbitrary-length, MSB-first sequence of bits. Packing
//! appends one field at a time; unpacking views the input buffer as a
//! [`BitSlice`] and slices fields out of it.
//!
//! Endianness translation is a *group reversal*: the bits are split into
//! byte-sized groups and the order of the groups is reversed while the bit
//! order inside each group is kept. When the length is not a multiple of the
//! group width the leftover group is the one at the start of an MSB-first
//! string and ends up at the end of the LSB-first string.

use crate::format::Endianness;
use bitvec::prelude::*;
use std::num::NonZeroUsize;

pub type BitString = BitVec<u8, Msb0>;

/// Longest bit string a byte buffer can address.
pub const MAX_BITS: usize = BitSlice::<u8, Msb0>::MAX_BITS;

pub const BYTE_WIDTH: NonZeroUsize = match NonZeroUsize::new(8) {
    Some(n) => n,
    None => unreachable!(),
};

/// Reorder `bits` into `target` byte order using 8-bit groups.
///
/// `translate_endianness(&translate_endianness(bits, LsbFirst), MsbFirst) == bits`
/// for every length.
pub fn translate_endianness(bits: &BitSlice<u8, Msb0>, target: Endianness) -> BitString {
    translate_endianness_by(bits, target, BYTE_WIDTH)
}

/// [`translate_endianness`] with a custom group width.
pub fn translate_endianness_by(
    bits: &BitSlice<u8, Msb0>,
    target: Endianness,
    group_width: NonZeroUsize,
) -> BitString {
    let group_width = group_width.get();
    let partial = bits.len() % group_width;
    let mut out = BitString::with_capacity(bits.len());
    match target {
        // MSB-first input: [partial][g1][g2]..[gn] -> [gn]..[g2][g1][partial]
        Endianness::LsbFirst => {
            let (head, groups) = bits.split_at(partial);
            for group in groups.rchunks(group_width) {
                out.extend_from_bitslice(group);
            }
            out.extend_from_bitslice(head);
        }
        // LSB-first input: [gn]..[g2][g1][partial] -> [partial][g1][g2]..[gn]
        Endianness::MsbFirst => {
            let (groups, tail) = bits.split_at(bits.len() - partial);
            out.extend_from_bitslice(tail);
            for group in groups.rchunks(group_width) {
                out.extend_from_bitslice(group);
            }
        }
    }
    out
}

/// Bring a field into `target` order; MSB-first fields are already canonical.
pub(crate) fn to_field_order(bits: BitString, target: Endianness) -> BitString {
    match target {
        Endianness::MsbFirst => bits,
        Endianness::LsbFirst => translate_endianness(&bits, Endianness::LsbFirst),
    }
}

/// Inverse of [`to_field_order`]: normalize a field slice to MSB-first order.
pub(crate) fn from_field_order(bits: &BitSlice<u8, Msb0>, source: Endianness) -> BitString {
    match source {
        Endianness::MsbFirst => {
            let mut out = BitString::with_capacity(bits.len());
            out.extend_from_bitslice(bits);
            out
        }
        Endianness::LsbFirst => translate_endianness(bits, Endianness::MsbFirst),
    }
}

/// Zero-fill to the next byte boundary and return the bytes.
pub(crate) fn into_padded_bytes(mut bits: BitString) -> Vec<u8> {
    let tail = bits.len() % 8;
    if tail != 0 {
        bits.resize(bits.len() + 8 - tail, false);
    }
    bits.into_vec()
}

/// Parse a string of `0`/`1` characters.
pub fn parse_bits(s: &str) -> Option<BitString> {
    s.chars()
        .map(|c| match c {
            '0' => Some(false),
            '1' => Some(true),
            _ => None,
        })
        .collect()
}

/// Render bits as a string of `0`/`1` characters.
pub fn format_bits(bits: &BitSlice<u8, Msb0>) -> String {
    bits.iter().by_vals().map(|b| if b { '1' } else { '0' }).collect()
}
