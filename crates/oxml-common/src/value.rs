use std::any::Any;
use std::cmp::Ordering;
use std::fmt::{self, Display};

use once_cell::unsync::OnceCell;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{ValueError, XmlScalar};

/* ───────────────────── Object-safe simple type ─────────────────────
Element metadata stores attribute values behind `Box<dyn SimpleType>`
so that one attribute table can hold Int64, Boolean, ... side by side.
Typed access goes through `as_any` + downcast to `SimpleValue<N>`.
------------------------------------------------------------------- */

/// An attribute value whose native type is erased.
pub trait SimpleType: Any + Send + fmt::Debug {
    /// Name of the native type, e.g. `Int64`.
    fn native_type_name(&self) -> &'static str;

    fn inner_text(&self) -> Option<&str>;

    fn set_inner_text(&mut self, text: Option<String>);

    /// `true` when a native value is present or the text decodes to one.
    fn has_value(&self) -> bool;

    /// Re-derives the native value from the text without propagating
    /// decode failures.
    ///
    /// Clears the native value only when there is text to decode; with no
    /// text it reports whether a native value is present and keeps it.
    fn try_parse(&mut self) -> bool;

    /// `true` when the text (if any) is a valid literal and the value is
    /// not empty. Does not mutate.
    fn is_valid(&self) -> bool;

    fn clone_boxed(&self) -> Box<dyn SimpleType>;

    /* down-cast hooks */
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl Clone for Box<dyn SimpleType> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

/* ───────────────────────── Typed wrapper ────────────────────────── */

/// A typed attribute value holding a cached text form and a cached native
/// form.
///
/// Either side may be populated on its own; the other is derived on first
/// read and cached. Assigning one side through `&mut self` clears the
/// other. Once both are present the text decodes to the native value; the
/// text may still differ from the canonical encoding (`"+5"` vs `"5"`),
/// because decoding is more lenient than encoding.
///
/// Instances are `Send` but not `Sync`: each one belongs to a single
/// attribute slot.
#[derive(Clone, Debug)]
pub struct SimpleValue<N: XmlScalar> {
    text: OnceCell<String>,
    value: OnceCell<N>,
}

pub type Int64Value = SimpleValue<i64>;
pub type Int32Value = SimpleValue<i32>;
pub type Int16Value = SimpleValue<i16>;
pub type SByteValue = SimpleValue<i8>;
pub type UInt64Value = SimpleValue<u64>;
pub type UInt32Value = SimpleValue<u32>;
pub type UInt16Value = SimpleValue<u16>;
pub type ByteValue = SimpleValue<u8>;
pub type BooleanValue = SimpleValue<bool>;

impl<N: XmlScalar> Default for SimpleValue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: XmlScalar> SimpleValue<N> {
    /// Empty value: no text, no native value.
    pub fn new() -> Self {
        Self {
            text: OnceCell::new(),
            value: OnceCell::new(),
        }
    }

    /// Native value populated; text is derived lazily.
    pub fn from_native(value: N) -> Self {
        Self {
            text: OnceCell::new(),
            value: OnceCell::with_value(value),
        }
    }

    /// Text populated; the native value is decoded lazily.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: OnceCell::with_value(text.into()),
            value: OnceCell::new(),
        }
    }

    /// Deep copy of `source`, rejecting an absent source.
    pub fn copy_from(source: Option<&Self>) -> Result<Self, ValueError> {
        source
            .cloned()
            .ok_or(ValueError::InvalidArgument("copy source must not be absent"))
    }

    /// Native value of `source`.
    ///
    /// Fails with `InvalidOperation` when `source` is absent or empty, and
    /// with the decode error when its text is not a valid literal.
    pub fn to_native(source: Option<&Self>) -> Result<N, ValueError> {
        source
            .ok_or(ValueError::InvalidOperation(
                "cannot convert an absent simple value to its native type",
            ))?
            .value()
    }

    /// Text form, synthesizing the canonical encoding from the native value
    /// when no text has been assigned.
    pub fn inner_text(&self) -> Option<&str> {
        match self.text.get() {
            Some(text) => {
                if let Some(value) = self.value.get() {
                    // Decode equality, not string equality: stored text may be
                    // any accepted spelling ("+7", "007", " 7 ", "-0").
                    debug_assert!(
                        N::from_xml(text).is_ok_and(|decoded| decoded == *value),
                        "text {text:?} does not decode to {value:?}"
                    );
                }
                Some(text.as_str())
            }
            None => {
                let value = self.value.get()?;
                Some(self.text.get_or_init(|| value.to_xml()).as_str())
            }
        }
    }

    /// Assigns new text and drops the cached native value.
    pub fn set_inner_text(&mut self, text: Option<String>) {
        self.text = match text {
            Some(text) => OnceCell::with_value(text),
            None => OnceCell::new(),
        };
        self.value = OnceCell::new();
    }

    /// Assigns a new native value and drops the cached text.
    pub fn set_value(&mut self, value: N) {
        self.value = OnceCell::with_value(value);
        self.text = OnceCell::new();
    }

    /// Native value, decoding (and caching) the text on first access.
    pub fn value(&self) -> Result<N, ValueError> {
        if let Some(value) = self.value.get() {
            return Ok(*value);
        }
        let text = self
            .text
            .get()
            .ok_or(ValueError::InvalidOperation("simple value is empty"))?;
        let decoded = N::from_xml(text)?;
        Ok(*self.value.get_or_init(|| decoded))
    }

    /// Decodes the text, overwriting the native value.
    ///
    /// `Format` and `Overflow` propagate. Without text there is nothing to
    /// decode: succeeds if a native value exists, else `InvalidOperation`.
    pub fn parse(&mut self) -> Result<(), ValueError> {
        match self.text.get() {
            Some(text) => {
                let decoded = N::from_xml(text)?;
                self.value = OnceCell::with_value(decoded);
                Ok(())
            }
            None if self.value.get().is_some() => Ok(()),
            None => Err(ValueError::InvalidOperation("simple value is empty")),
        }
    }

    /// Like [`parse`](Self::parse) but reports failure as `false`.
    ///
    /// The native value is cleared before decoding and stays absent on
    /// failure. Without text, returns whether a native value exists and
    /// leaves it untouched.
    pub fn try_parse(&mut self) -> bool {
        let Some(text) = self.text.get() else {
            return self.value.get().is_some();
        };
        self.value = OnceCell::new();
        match N::from_xml(text) {
            Ok(decoded) => {
                self.value = OnceCell::with_value(decoded);
                true
            }
            Err(_) => false,
        }
    }

    pub fn has_value(&self) -> bool {
        self.value().is_ok()
    }

    /// Neither text nor native value is set.
    pub fn is_empty(&self) -> bool {
        self.text.get().is_none() && self.value.get().is_none()
    }
}

impl<N: XmlScalar> From<N> for SimpleValue<N> {
    fn from(value: N) -> Self {
        Self::from_native(value)
    }
}

impl<N: XmlScalar> Display for SimpleValue<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.inner_text().unwrap_or_default())
    }
}

/// Values compare by native value when both decode, otherwise by text.
impl<N: XmlScalar> PartialEq for SimpleValue<N> {
    fn eq(&self, other: &Self) -> bool {
        match (self.value(), other.value()) {
            (Ok(a), Ok(b)) => a == b,
            _ => self.inner_text() == other.inner_text(),
        }
    }
}

impl<N: XmlScalar> PartialEq<N> for SimpleValue<N> {
    fn eq(&self, other: &N) -> bool {
        self.value().is_ok_and(|value| value == *other)
    }
}

impl<N: XmlScalar> PartialOrd for SimpleValue<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.value(), other.value()) {
            (Ok(a), Ok(b)) => a.partial_cmp(&b),
            _ if self == other => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl<N: XmlScalar> SimpleType for SimpleValue<N> {
    fn native_type_name(&self) -> &'static str {
        N::TYPE_NAME
    }

    fn inner_text(&self) -> Option<&str> {
        SimpleValue::inner_text(self)
    }

    fn set_inner_text(&mut self, text: Option<String>) {
        SimpleValue::set_inner_text(self, text)
    }

    fn has_value(&self) -> bool {
        SimpleValue::has_value(self)
    }

    fn try_parse(&mut self) -> bool {
        SimpleValue::try_parse(self)
    }

    fn is_valid(&self) -> bool {
        match self.text.get() {
            Some(text) => N::from_xml(text).is_ok(),
            None => self.value.get().is_some(),
        }
    }

    fn clone_boxed(&self) -> Box<dyn SimpleType> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/* ───────────────────────── serde (text form) ───────────────────────── */

#[cfg(feature = "serde")]
impl<N: XmlScalar> Serialize for SimpleValue<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner_text().serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, N: XmlScalar> Deserialize<'de> for SimpleValue<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = Option::<String>::deserialize(deserializer)?;
        let mut value = Self::new();
        value.set_inner_text(text);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValueErrorKind;

    #[test]
    fn empty_value() {
        let v = Int64Value::new();
        assert!(v.is_empty());
        assert!(!v.has_value());
        assert_eq!(v.inner_text(), None);
        assert_eq!(v.value().unwrap_err().kind(), ValueErrorKind::InvalidOperation);
        assert_eq!(v.to_string(), "");
    }

    #[test]
    fn native_value_synthesizes_canonical_text() {
        let v = Int64Value::from_native(-42);
        assert_eq!(v.inner_text(), Some("-42"));
        // cached: second read hands back the same slot
        assert!(std::ptr::eq(
            v.inner_text().unwrap(),
            v.inner_text().unwrap()
        ));
        assert_eq!(v.value(), Ok(-42));
    }

    #[test]
    fn text_is_decoded_lazily() {
        let v = Int64Value::from_text("+5");
        assert_eq!(v.value(), Ok(5));
        // the tolerated asymmetry: text keeps its plus sign
        assert_eq!(v.inner_text(), Some("+5"));
        assert_eq!(Int64Value::from_native(5).inner_text(), Some("5"));
    }

    #[test]
    fn setting_one_side_clears_the_other() {
        let mut v = Int32Value::from_text("10");
        assert_eq!(v.value(), Ok(10));
        v.set_value(11);
        assert_eq!(v.inner_text(), Some("11"));

        v.set_inner_text(Some("12".into()));
        assert_eq!(v.value(), Ok(12));

        v.set_inner_text(None);
        assert!(v.is_empty());
    }

    #[test]
    fn parse_propagates_errors() {
        let mut v = Int64Value::from_text("abc");
        assert_eq!(v.parse().unwrap_err().kind(), ValueErrorKind::Format);

        let mut v = Int64Value::from_text("99999999999999999999");
        assert_eq!(v.parse().unwrap_err().kind(), ValueErrorKind::Overflow);

        let mut v = Int64Value::from_text("7");
        assert_eq!(v.parse(), Ok(()));
        assert_eq!(v.value(), Ok(7));

        let mut v = Int64Value::new();
        assert_eq!(v.parse().unwrap_err().kind(), ValueErrorKind::InvalidOperation);

        let mut v = Int64Value::from_native(3);
        assert_eq!(v.parse(), Ok(()));
    }

    #[test]
    fn try_parse_clears_on_failure() {
        let mut v = Int64Value::from_text("12.5");
        assert!(!v.try_parse());
        assert!(!v.has_value());

        let mut v = Int64Value::from_text("-12");
        assert!(v.try_parse());
        assert_eq!(v.value(), Ok(-12));

        let mut v = Int64Value::from_native(9);
        assert!(v.try_parse());
        assert_eq!(v.value(), Ok(9));

        assert!(!Int64Value::new().try_parse());
    }

    #[test]
    fn try_parse_without_text_keeps_native_value() {
        let mut boxed: Box<dyn SimpleType> = Box::new(UInt16Value::from_native(40));
        assert!(boxed.try_parse());
        assert!(boxed.has_value());
        let typed = boxed.as_any().downcast_ref::<UInt16Value>().unwrap();
        assert_eq!(typed.value(), Ok(40));

        boxed.set_inner_text(None);
        assert!(!boxed.try_parse());
        assert!(!boxed.has_value());
    }

    #[test]
    fn non_canonical_text_survives_parse() {
        for (text, expected) in [("007", 7), ("+7", 7), (" 7\t", 7), ("-0", 0)] {
            let mut v = Int32Value::from_text(text);
            assert_eq!(v.parse(), Ok(()));
            assert_eq!(v.value(), Ok(expected));
            // both sides are populated; the stored spelling is kept
            assert_eq!(v.inner_text(), Some(text));
        }

        let mut v = ByteValue::from_text("-0");
        assert!(v.try_parse());
        assert_eq!(v.inner_text(), Some("-0"));
        assert_eq!(v, 0);
    }

    #[test]
    fn to_native_and_copy_reject_absent_sources() {
        assert_eq!(
            Int64Value::to_native(None).unwrap_err().kind(),
            ValueErrorKind::InvalidOperation
        );
        assert_eq!(
            Int64Value::copy_from(None).unwrap_err().kind(),
            ValueErrorKind::InvalidArgument
        );

        let source = Int64Value::from_text("+8");
        let mut copy = Int64Value::copy_from(Some(&source)).unwrap();
        assert_eq!(copy.inner_text(), Some("+8"));
        copy.set_value(1);
        assert_eq!(source.value(), Ok(8));
        assert_eq!(Int64Value::to_native(Some(&source)), Ok(8));
    }

    #[test]
    fn comparisons_use_native_values() {
        assert_eq!(Int64Value::from_text("+5"), Int64Value::from_native(5));
        assert_eq!(Int64Value::from_text("005"), 5);
        assert!(Int64Value::from_native(-1) < Int64Value::from_text("1"));
        assert_ne!(Int64Value::from_text("x"), Int64Value::from_text("y"));
        assert_eq!(Int64Value::from_text("x"), Int64Value::from_text("x"));
        assert_eq!(
            Int64Value::from_text("x").partial_cmp(&Int64Value::from_native(1)),
            None
        );
    }

    #[test]
    fn dyn_simple_type_round_trip() {
        let mut boxed: Box<dyn SimpleType> = Box::new(BooleanValue::from_text("1"));
        assert_eq!(boxed.native_type_name(), "Boolean");
        assert!(boxed.is_valid());
        assert!(boxed.has_value());

        boxed.set_inner_text(Some("yes".into()));
        assert!(!boxed.is_valid());
        assert!(!boxed.try_parse());

        let copy = boxed.clone();
        let typed = copy.as_any().downcast_ref::<BooleanValue>().unwrap();
        assert_eq!(typed.inner_text(), Some("yes"));

        boxed
            .as_any_mut()
            .downcast_mut::<BooleanValue>()
            .unwrap()
            .set_value(false);
        assert_eq!(boxed.inner_text(), Some("false"));
    }
}
