//! Canonical text codec for the native types behind simple values.
//!
//! Encoding is the invariant XML Schema lexical form: decimal digits with a
//! leading `-` for negatives, `true`/`false` for booleans. Decoding is a
//! little more lenient than encoding:
//!
//! * a leading `+` is accepted on every integer type but never emitted,
//! * surrounding XML whitespace (space, tab, CR, LF) is stripped,
//! * leading zeros are accepted,
//! * `1`/`0` are accepted as booleans.

use std::fmt;
use std::num::{IntErrorKind, ParseIntError};
use std::str::FromStr;

use crate::ValueError;

/// A native scalar with a canonical XML text form.
pub trait XmlScalar: Copy + PartialEq + PartialOrd + fmt::Debug + Send + Sync + 'static {
    /// Name used in diagnostics, e.g. `Int64`.
    const TYPE_NAME: &'static str;

    /// Canonical encoding. Never emits a leading `+`.
    fn to_xml(self) -> String;

    /// Decodes an XML literal.
    fn from_xml(text: &str) -> Result<Self, ValueError>;
}

#[inline]
fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn trim_xml_whitespace(text: &str) -> &str {
    text.trim_matches(is_xml_whitespace)
}

fn decode_integer<T>(text: &str, target: &'static str, unsigned: bool) -> Result<T, ValueError>
where
    T: FromStr<Err = ParseIntError> + Default,
{
    let literal = trim_xml_whitespace(text);

    // A negative literal is well formed for an unsigned type, just not
    // representable. `-0` is the single exception.
    if unsigned {
        if let Some(digits) = literal.strip_prefix('-') {
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ValueError::format(text, target));
            }
            if digits.bytes().all(|b| b == b'0') {
                return Ok(T::default());
            }
            return Err(ValueError::overflow(text, target));
        }
    }

    literal.parse::<T>().map_err(|err| match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            ValueError::overflow(text, target)
        }
        _ => ValueError::format(text, target),
    })
}

macro_rules! xml_integer {
    ($($ty:ty => $name:literal, $unsigned:literal;)*) => {
        $(
            impl XmlScalar for $ty {
                const TYPE_NAME: &'static str = $name;

                fn to_xml(self) -> String {
                    self.to_string()
                }

                fn from_xml(text: &str) -> Result<Self, ValueError> {
                    decode_integer::<$ty>(text, $name, $unsigned)
                }
            }
        )*
    };
}

xml_integer! {
    i8 => "SByte", false;
    i16 => "Int16", false;
    i32 => "Int32", false;
    i64 => "Int64", false;
    u8 => "Byte", true;
    u16 => "UInt16", true;
    u32 => "UInt32", true;
    u64 => "UInt64", true;
}

impl XmlScalar for bool {
    const TYPE_NAME: &'static str = "Boolean";

    fn to_xml(self) -> String {
        String::from(if self { "true" } else { "false" })
    }

    fn from_xml(text: &str) -> Result<Self, ValueError> {
        match trim_xml_whitespace(text) {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ValueError::format(text, Self::TYPE_NAME)),
        }
    }
}
