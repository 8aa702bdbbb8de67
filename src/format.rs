//! Format descriptor compiler.
//!
//! A descriptor such as `"u1<s14u17>f32"` is a concatenation of
//! `[endian]type width` tokens. Compiling it yields an ordered list of
//! [`FieldSpec`]s with every field's byte order resolved.
//!
//! With the default [`FormatOptions`] an endianness marker carries forward:
//! in `"u1<u2u3"` the `u1` field is MSB first while both `u2` and `u3` are
//! LSB first. [`FormatOptions::legacy`] turns the carry-forward off so that
//! unmarked fields always use the default byte order.

use crate::bits;
use crate::codec::CodecError;
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "format.pest"]
struct DescriptorParser;

/// Byte order of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endianness {
    /// `>`: most significant byte first (big endian).
    #[default]
    MsbFirst,
    /// `<`: least significant byte first (little endian).
    LsbFirst,
}

impl Endianness {
    pub fn from_marker(c: char) -> Option<Self> {
        match c {
            '>' => Some(Endianness::MsbFirst),
            '<' => Some(Endianness::LsbFirst),
            _ => None,
        }
    }

    pub fn marker(self) -> char {
        match self {
            Endianness::MsbFirst => '>',
            Endianness::LsbFirst => '<',
        }
    }
}

/// Type of a field, one per descriptor letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// `u`
    Unsigned,
    /// `s`, two's complement
    Signed,
    /// `f`, IEEE-754 binary32 or binary64
    Float,
    /// `b`
    Boolean,
    /// `r`, raw bytes
    Raw,
    /// `p`, zero bits on pack, skipped on unpack
    Pad,
}

impl FieldKind {
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'u' => Some(FieldKind::Unsigned),
            's' => Some(FieldKind::Signed),
            'f' => Some(FieldKind::Float),
            'b' => Some(FieldKind::Boolean),
            'r' => Some(FieldKind::Raw),
            'p' => Some(FieldKind::Pad),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            FieldKind::Unsigned => 'u',
            FieldKind::Signed => 's',
            FieldKind::Float => 'f',
            FieldKind::Boolean => 'b',
            FieldKind::Raw => 'r',
            FieldKind::Pad => 'p',
        }
    }

    /// Padding consumes no value on pack and produces none on unpack.
    pub fn carries_value(self) -> bool {
        self != FieldKind::Pad
    }
}

/// One compiled field: kind, width in bits and resolved byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub width: usize,
    pub endianness: Endianness,
}

impl std::fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.endianness.marker(), self.kind.letter(), self.width)
    }
}

/// Descriptor compilation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// Unmarked fields reuse the previous field's byte order.
    pub carry_endianness: bool,
    /// Byte order of unmarked fields before any marker is seen (or always, without carry-forward).
    pub default_endianness: Endianness,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            carry_endianness: true,
            default_endianness: Endianness::MsbFirst,
        }
    }
}

impl FormatOptions {
    /// Earlier descriptor dialect: every unmarked field is big endian.
    pub fn legacy() -> Self {
        FormatOptions {
            carry_endianness: false,
            ..FormatOptions::default()
        }
    }
}

/// A compiled descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    fields: Vec<FieldSpec>,
    bits: usize,
}

impl Format {
    /// Compile with the default options (endianness carry-forward, big endian default).
    pub fn compile(descriptor: &str) -> Result<Self, CodecError> {
        Self::compile_with(descriptor, FormatOptions::default())
    }

    pub fn compile_with(descriptor: &str, options: FormatOptions) -> Result<Self, CodecError> {
        let pairs = DescriptorParser::parse(Rule::descriptor, descriptor)
            .map_err(|e| CodecError::Format(format!("invalid descriptor {:?}: {}", descriptor, e)))?;
        let root = pairs
            .into_iter()
            .next()
            .ok_or_else(|| CodecError::Format("empty descriptor".to_string()))?;

        let mut tokens = root.into_inner().filter(|p| p.as_rule() == Rule::field);
        let mut fields = Vec::new();
        tokens.try_fold(options.default_endianness, |current, pair| {
            let field = build_field(pair, current)?;
            fields.push(field);
            Ok::<_, CodecError>(if options.carry_endianness {
                field.endianness
            } else {
                options.default_endianness
            })
        })?;

        if fields.is_empty() {
            return Err(CodecError::Format("empty descriptor".to_string()));
        }
        let bits = fields
            .iter()
            .try_fold(0usize, |total, f| total.checked_add(f.width))
            .filter(|total| *total <= bits::MAX_BITS)
            .ok_or_else(|| {
                CodecError::Format(format!(
                    "descriptor {:?} is wider than {} bits",
                    descriptor,
                    bits::MAX_BITS
                ))
            })?;
        let format = Format { fields, bits };
        tracing::trace!(descriptor, fields = format.fields.len(), bits, "compiled descriptor");
        Ok(format)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Total width in bits, padding included. Not rounded to a byte boundary.
    pub fn calcsize(&self) -> usize {
        self.bits
    }

    /// Number of values `pack` takes and `unpack` returns.
    pub fn value_count(&self) -> usize {
        self.fields.iter().filter(|f| f.kind.carries_value()).count()
    }
}

impl std::fmt::Display for Format {
    /// Canonical descriptor with every marker spelled out.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for field in &self.fields {
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Format {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::compile(s)
    }
}

/// `inherited` is the byte order an unmarked field gets.
fn build_field(pair: pest::iterators::Pair<Rule>, inherited: Endianness) -> Result<FieldSpec, CodecError> {
    let token = pair.as_str().to_string();
    let mut endianness = inherited;
    let mut kind = None;
    let mut width = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::endian => {
                let c = inner.as_str().chars().next().unwrap_or('>');
                endianness = Endianness::from_marker(c)
                    .ok_or_else(|| CodecError::Format(format!("bad endianness marker in {:?}", token)))?;
            }
            Rule::kind => {
                let c = inner.as_str().chars().next().unwrap_or('?');
                kind = Some(
                    FieldKind::from_letter(c)
                        .ok_or_else(|| CodecError::Format(format!("bad type '{}' in format", c)))?,
                );
            }
            Rule::width => {
                let n: usize = inner
                    .as_str()
                    .parse()
                    .map_err(|e| CodecError::Format(format!("bad width in {:?}: {}", token, e)))?;
                width = Some(n);
            }
            _ => {}
        }
    }
    let kind = kind.ok_or_else(|| CodecError::Format(format!("missing type in {:?}", token)))?;
    let width = match width {
        Some(0) => return Err(CodecError::Format(format!("zero width in {:?}", token))),
        Some(n) => n,
        None => return Err(CodecError::Format(format!("missing width in {:?}", token))),
    };
    Ok(FieldSpec { kind, width, endianness })
}
