//! Format descriptor tests: syntax (compile success/failure) and endianness resolution.

use bitstruct::{calcsize, CodecError, Endianness, FieldKind, FieldSpec, Format, FormatOptions};

fn field(kind: FieldKind, width: usize, endianness: Endianness) -> FieldSpec {
    FieldSpec { kind, width, endianness }
}

// ==================== Syntax: valid descriptors ====================

#[test]
fn compile_all_types() {
    let f = Format::compile("u1s2f32b4r5p6").expect("compile");
    let kinds: Vec<FieldKind> = f.fields().iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![
            FieldKind::Unsigned,
            FieldKind::Signed,
            FieldKind::Float,
            FieldKind::Boolean,
            FieldKind::Raw,
            FieldKind::Pad,
        ]
    );
    let widths: Vec<usize> = f.fields().iter().map(|f| f.width).collect();
    assert_eq!(widths, vec![1, 2, 32, 4, 5, 6]);
    assert_eq!(f.value_count(), 5);
}

#[test]
fn compile_multi_digit_widths() {
    let f = Format::compile("u128s1000").expect("compile");
    assert_eq!(f.fields()[0].width, 128);
    assert_eq!(f.fields()[1].width, 1000);
    assert_eq!(f.calcsize(), 1128);
}

#[test]
fn default_endianness_is_msb_first() {
    let f = Format::compile("u1u2").expect("compile");
    assert!(f.fields().iter().all(|f| f.endianness == Endianness::MsbFirst));
}

// ==================== Endianness carry-forward ====================

#[test]
fn endianness_carries_forward() {
    let f = Format::compile("u1<u2u3").expect("compile");
    assert_eq!(
        f.fields(),
        &[
            field(FieldKind::Unsigned, 1, Endianness::MsbFirst),
            field(FieldKind::Unsigned, 2, Endianness::LsbFirst),
            field(FieldKind::Unsigned, 3, Endianness::LsbFirst),
        ]
    );
}

#[test]
fn endianness_override_then_carry() {
    let f = Format::compile("u1u1<s14<u17>u9<f32p3").expect("compile");
    let order: Vec<Endianness> = f.fields().iter().map(|f| f.endianness).collect();
    use Endianness::*;
    assert_eq!(order, vec![MsbFirst, MsbFirst, LsbFirst, LsbFirst, MsbFirst, LsbFirst, LsbFirst]);
}

#[test]
fn legacy_options_do_not_carry() {
    let f = Format::compile_with("u1<u2u3>u4u5", FormatOptions::legacy()).expect("compile");
    let order: Vec<Endianness> = f.fields().iter().map(|f| f.endianness).collect();
    use Endianness::*;
    assert_eq!(order, vec![MsbFirst, LsbFirst, MsbFirst, MsbFirst, MsbFirst]);
}

#[test]
fn custom_default_endianness() {
    let options = FormatOptions {
        carry_endianness: true,
        default_endianness: Endianness::LsbFirst,
    };
    let f = Format::compile_with("u9>u9u9", options).expect("compile");
    let order: Vec<Endianness> = f.fields().iter().map(|f| f.endianness).collect();
    use Endianness::*;
    assert_eq!(order, vec![LsbFirst, MsbFirst, MsbFirst]);
}

#[test]
fn display_spells_out_every_marker() {
    let f = Format::compile("u1<u2u3>p4").expect("compile");
    assert_eq!(f.to_string(), ">u1<u2<u3>p4");
    let again: Format = f.to_string().parse().expect("reparse");
    assert_eq!(again, f);
}

// ==================== Syntax: invalid descriptors ====================

#[test]
fn reject_unknown_type_letter() {
    let err = Format::compile("u1x3").unwrap_err();
    assert!(matches!(err, CodecError::Format(_)), "{}", err);
    assert!(err.to_string().contains("'x'"), "{}", err);
    assert!(Format::compile("U8").is_err());
}

#[test]
fn reject_missing_width() {
    assert!(matches!(Format::compile("u").unwrap_err(), CodecError::Format(_)));
    assert!(matches!(Format::compile("u8s").unwrap_err(), CodecError::Format(_)));
    assert!(matches!(Format::compile("<").unwrap_err(), CodecError::Format(_)));
}

#[test]
fn reject_zero_width() {
    let err = Format::compile("u8p0").unwrap_err();
    assert!(matches!(err, CodecError::Format(_)), "{}", err);
}

#[test]
fn reject_empty_and_separators() {
    assert!(matches!(Format::compile("").unwrap_err(), CodecError::Format(_)));
    assert!(Format::compile("u1 u2").is_err());
    assert!(Format::compile("u1,u2").is_err());
    assert!(Format::compile("<<u1").is_err());
    assert!(Format::compile("u-1").is_err());
}

#[test]
fn reject_overflowing_width() {
    let err = Format::compile("u99999999999999999999999").unwrap_err();
    assert!(matches!(err, CodecError::Format(_)), "{}", err);
}

#[test]
fn reject_widths_whose_sum_overflows() {
    let err = Format::compile("p18446744073709551615p1").unwrap_err();
    assert!(matches!(err, CodecError::Format(_)), "{}", err);
    let err = Format::compile("u1s9223372036854775807u9223372036854775807").unwrap_err();
    assert!(matches!(err, CodecError::Format(_)), "{}", err);
}

// ==================== calcsize ====================

#[test]
fn calcsize_counts_padding_and_ignores_float_width() {
    assert_eq!(calcsize("p7u1").expect("calcsize"), 8);
    // Float widths are only checked when packing or unpacking.
    assert_eq!(calcsize("f33").expect("calcsize"), 33);
    assert!(calcsize("q1").is_err());
}

#[cfg(target_pointer_width = "64")]
#[test]
fn calcsize_of_huge_widths() {
    assert_eq!(calcsize("p1152921504606846976p1").expect("calcsize"), 1152921504606846977);
    assert!(matches!(calcsize("p18446744073709551615").unwrap_err(), CodecError::Format(_)));
}
