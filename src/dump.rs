//! Text helpers: render values and bytes for display, parse hex and literals.

use crate::codec::CodecError;
use crate::format::{FieldKind, Format};
use crate::value::Value;

/// Lowercase hex without separators, e.g. `3e8216`.
pub fn hex_string(b: &[u8]) -> String {
    b.iter().map(|x| format!("{:02x}", x)).collect()
}

/// Parse hex bytes. Accepts an optional `0x` prefix and ignores whitespace,
/// `:` and `_` separators.
pub fn parse_hex(s: &str) -> Result<Vec<u8>, CodecError> {
    let s = s.trim();
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    let digits: Vec<char> = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '_')
        .collect();
    if digits.len() % 2 != 0 {
        return Err(CodecError::Value(format!("odd number of hex digits in {:?}", s)));
    }
    digits
        .chunks(2)
        .map(|pair| {
            let hi = pair[0].to_digit(16);
            let lo = pair[1].to_digit(16);
            match (hi, lo) {
                (Some(hi), Some(lo)) => Ok((hi * 16 + lo) as u8),
                _ => Err(CodecError::Value(format!(
                    "bad hex byte '{}{}' in {:?}",
                    pair[0], pair[1], s
                ))),
            }
        })
        .collect()
}

/// Values as a tuple, e.g. `(0, 0, -2, 65, 22)`; a single value keeps the trailing comma.
pub fn format_tuple(values: &[Value]) -> String {
    let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    if items.len() == 1 {
        format!("({},)", items[0])
    } else {
        format!("({})", items.join(", "))
    }
}

/// One line per field: bit offset, field and value (padding shows `-`).
pub fn format_fields(format: &Format, values: &[Value]) -> String {
    let mut lines = Vec::with_capacity(format.fields().len());
    let mut offset = 0usize;
    let mut values = values.iter();
    for field in format.fields() {
        let shown = if field.kind.carries_value() {
            values.next().map(|v| v.to_string()).unwrap_or_else(|| "?".to_string())
        } else {
            "-".to_string()
        };
        lines.push(format!("{:>6}  {:<8} {}", offset, field.to_string(), shown));
        offset += field.width;
    }
    lines.join("\n")
}

fn parse_u128(s: &str) -> Option<u128> {
    let s = s.replace('_', "");
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u128::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

fn parse_i128(s: &str) -> Option<i128> {
    match s.strip_prefix('-') {
        Some(rest) => {
            let magnitude = parse_u128(rest)?;
            if magnitude == 1u128 << 127 {
                Some(i128::MIN)
            } else {
                i128::try_from(magnitude).ok().map(|m| -m)
            }
        }
        None => parse_u128(s.strip_prefix('+').unwrap_or(s)).and_then(|m| i128::try_from(m).ok()),
    }
}

/// Parse a command-line literal for a field of `kind`.
///
/// `u`: decimal or `0x` hex (a leading `-` gives a two's-complement value);
/// `s`: signed decimal or hex; `f`: float; `b`: `true`/`false`/`1`/`0`; `r`: hex bytes.
pub fn parse_value(kind: FieldKind, s: &str) -> Result<Value, CodecError> {
    let s = s.trim();
    let bad = || CodecError::Value(format!("cannot parse {:?} as a '{}' value", s, kind.letter()));
    match kind {
        FieldKind::Unsigned if s.starts_with('-') => parse_i128(s).map(Value::Signed).ok_or_else(bad),
        FieldKind::Unsigned => parse_u128(s).map(Value::Unsigned).ok_or_else(bad),
        FieldKind::Signed => parse_i128(s).map(Value::Signed).ok_or_else(bad),
        FieldKind::Float => s.parse::<f64>().map(Value::Float).map_err(|_| bad()),
        FieldKind::Boolean => match s.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(bad()),
        },
        FieldKind::Raw => parse_hex(s).map(Value::Raw),
        FieldKind::Pad => Err(CodecError::Type("padding takes no value".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let bytes = parse_hex("0x3e 82:16").expect("hex");
        assert_eq!(bytes, vec![0x3e, 0x82, 0x16]);
        assert_eq!(hex_string(&bytes), "3e8216");
    }

    #[test]
    fn hex_rejects_odd_and_bad_digits() {
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
        assert_eq!(parse_hex("").expect("empty"), Vec::<u8>::new());
    }

    #[test]
    fn tuple_formatting() {
        assert_eq!(format_tuple(&[Value::Unsigned(1)]), "(1,)");
        assert_eq!(
            format_tuple(&[Value::Unsigned(0), Value::Signed(-2), Value::Bool(true)]),
            "(0, -2, true)"
        );
        assert_eq!(format_tuple(&[Value::Raw(vec![0x00, 0xe0])]), "(b'\\x00\\xe0',)");
        assert_eq!(format_tuple(&[]), "()");
    }

    #[test]
    fn field_listing_shows_offsets_and_padding() {
        let format = Format::compile("u1p3<s4").expect("compile");
        let text = format_fields(&format, &[Value::Unsigned(1), Value::Signed(-1)]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].trim_start().starts_with("0  >u1"));
        assert!(lines[1].contains(">p3") && lines[1].ends_with('-'));
        assert!(lines[2].trim_start().starts_with("4  <s4") && lines[2].ends_with("-1"));
    }

    #[test]
    fn literals_per_kind() {
        assert_eq!(parse_value(FieldKind::Unsigned, "0x10").expect("u"), Value::Unsigned(16));
        assert_eq!(parse_value(FieldKind::Unsigned, "-1").expect("u"), Value::Signed(-1));
        assert_eq!(parse_value(FieldKind::Signed, "-0x80").expect("s"), Value::Signed(-128));
        assert_eq!(
            parse_value(FieldKind::Signed, &format!("-{}", 1u128 << 127)).expect("s"),
            Value::Signed(i128::MIN)
        );
        assert_eq!(parse_value(FieldKind::Float, "3.75").expect("f"), Value::Float(3.75));
        assert_eq!(parse_value(FieldKind::Boolean, "TRUE").expect("b"), Value::Bool(true));
        assert_eq!(parse_value(FieldKind::Raw, "00ff").expect("r"), Value::Raw(vec![0, 255]));
        assert!(parse_value(FieldKind::Boolean, "yes").is_err());
        assert!(parse_value(FieldKind::Pad, "0").is_err());
    }
}
