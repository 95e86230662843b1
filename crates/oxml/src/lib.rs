//! Meta crate that re-exports the Open XML building blocks with sensible
//! defaults. The typed simple values are always available; the per-type
//! metadata cache sits behind the default `framework` feature.

pub use oxml_common as common;

#[cfg(feature = "framework")]
pub use oxml_framework as framework;

pub use oxml_common::{
    BooleanValue, ByteValue, Int16Value, Int32Value, Int64Value, SByteValue, SimpleType,
    SimpleValue, UInt16Value, UInt32Value, UInt64Value, ValueError, ValueErrorKind, XmlScalar,
};

#[cfg(feature = "framework")]
pub use oxml_framework::{
    CacheError, ElementMetadata, ElementType, OpenXmlElement, PackageCache, PartContainer,
    PartMetadata, PartType, TypeKey,
};
