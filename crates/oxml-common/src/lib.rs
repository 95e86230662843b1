//! Typed simple values for Open XML attributes.
//!
//! A [`SimpleValue`] keeps an attribute's text and its native value side by
//! side and converts lazily in whichever direction is needed. The canonical
//! codec lives in [`XmlScalar`]; [`SimpleType`] erases the native type so
//! element metadata can hold heterogeneous attribute values.

pub mod error;
pub mod scalar;
pub mod value;

pub use error::*;
pub use scalar::*;
pub use value::*;
