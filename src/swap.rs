//! In-place byte swapping of byte-aligned buffers.
//!
//! Independent of the bit-level codec. Typical use is fixing up word byte
//! order after packing, e.g. `byteswap("12", &mut packed, 0)` leaves the first
//! byte alone and swaps the next two.

use crate::codec::CodecError;

/// Reverse consecutive groups of bytes in `data`, starting at `offset`.
///
/// Each character of `groups` is one decimal digit giving the length of the
/// next group; `"24"` applied to `00 11 22 33 44 55` gives
/// `11 00 55 44 33 22`. All groups are checked before anything is swapped, so
/// on error `data` is unchanged.
pub fn byteswap<'a>(groups: &str, data: &'a mut [u8], offset: usize) -> Result<&'a mut [u8], CodecError> {
    let lengths = group_lengths(groups)?;
    let total: usize = lengths.iter().sum();
    offset
        .checked_add(total)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| {
            CodecError::Arity(format!(
                "byteswap '{}' at offset {} needs {} more bytes, buffer has {}",
                groups,
                offset,
                total,
                data.len()
            ))
        })?;

    let mut i = offset;
    for len in lengths {
        data[i..i + len].reverse();
        i += len;
    }
    tracing::trace!(groups, offset, swapped = total, "byteswap");
    Ok(data)
}

fn group_lengths(groups: &str) -> Result<Vec<usize>, CodecError> {
    groups
        .chars()
        .map(|c| {
            c.to_digit(10)
                .map(|d| d as usize)
                .ok_or_else(|| CodecError::Format(format!("bad byteswap group '{}' in '{}'", c, groups)))
        })
        .collect()
}
