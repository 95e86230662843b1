//! Per-type artifact cache for an Open XML object model.
//!
//! Value factories, element factories and structural/constraint metadata
//! are pure functions of a type. [`PackageCache`] computes each of them
//! once per type and hands out the memoized result afterwards.
//!
//! Element and part types take part by implementing [`ElementType`] and
//! [`PartType`]; their `describe` functions are the derivations the cache
//! memoizes.

pub mod activator;
pub mod cache;
pub mod element;
pub mod error;
pub mod part;
pub mod store;
pub mod type_key;

pub use activator::{Activate, Factory, create_activator};
pub use cache::{CacheStats, PackageCache};
pub use element::{
    AttributeMetadata, ChildMetadata, ElementMetadata, ElementMetadataBuilder, ElementType,
    OpenXmlElement, QualifiedName,
};
pub use error::CacheError;
pub use part::{PartConstraint, PartContainer, PartMetadata, PartMetadataBuilder, PartType};
pub use store::{
    ConcurrentTypeStore, DefaultTypeStore, LockedTypeStore, StorePolicy, TypeStore,
};
pub use type_key::TypeKey;

// Re-export for convenience
pub use oxml_common::{SimpleType, SimpleValue, ValueError};
