//! Process-wide cache of per-type artifacts.
//!
//! Four independent stores, one per artifact kind:
//!
//! | store               | key               | value                          |
//! |---------------------|-------------------|--------------------------------|
//! | simple factories    | simple value type | `Factory<dyn SimpleType>`      |
//! | element factories   | element type      | `Factory<dyn OpenXmlElement>`  |
//! | element metadata    | element type      | `Arc<ElementMetadata>`         |
//! | part metadata       | part type         | `Arc<PartMetadata>`            |
//!
//! Keys are types, a closed set for the life of the process, so nothing is
//! ever evicted. The global instance is created on first use and lives
//! until the process exits; it is never reset. Tests that use it should
//! declare their own element and part types.
//!
//! Derivations only reach "down" (part metadata → element metadata →
//! simple factories), so the serialized policy cannot deadlock across
//! stores.

use std::any::{TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use oxml_common::SimpleType;

use crate::activator::{Activate, Factory, cast_factory, create_activator};
use crate::element::derive_element_metadata;
use crate::part::derive_part_metadata;
use crate::store::{DefaultTypeStore, StorePolicy, TypeStore};
use crate::{
    CacheError, ElementMetadata, ElementType, OpenXmlElement, PartContainer, PartMetadata,
    PartType, TypeKey,
};

static CACHE: Lazy<PackageCache> = Lazy::new(PackageCache::new);

/// Entry counts per store.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub simple_factories: usize,
    pub element_factories: usize,
    pub element_metadata: usize,
    pub part_metadata: usize,
}

pub struct PackageCache {
    simple_factories: DefaultTypeStore<Factory<dyn SimpleType>>,
    element_factories: DefaultTypeStore<Factory<dyn OpenXmlElement>>,
    element_metadata: DefaultTypeStore<Arc<ElementMetadata>>,
    part_metadata: DefaultTypeStore<Arc<PartMetadata>>,
}

impl Default for PackageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageCache {
    /// An isolated cache. Most callers want [`PackageCache::global`].
    pub fn new() -> Self {
        Self {
            simple_factories: DefaultTypeStore::default(),
            element_factories: DefaultTypeStore::default(),
            element_metadata: DefaultTypeStore::default(),
            part_metadata: DefaultTypeStore::default(),
        }
    }

    /// The process-wide cache.
    pub fn global() -> &'static PackageCache {
        &CACHE
    }

    /// Store policy selected at build time.
    pub fn policy(&self) -> StorePolicy {
        <DefaultTypeStore<Arc<ElementMetadata>> as TypeStore<Arc<ElementMetadata>>>::POLICY
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            simple_factories: self.simple_factories.len(),
            element_factories: self.element_factories.len(),
            element_metadata: self.element_metadata.len(),
            part_metadata: self.part_metadata.len(),
        }
    }

    /// Cached constructor of concrete type `C` as artifact kind `K`.
    ///
    /// `K` must be `dyn SimpleType` or `dyn OpenXmlElement`; any other kind
    /// fails with [`CacheError::UnsupportedKind`].
    pub fn factory<K, C>(&self) -> Result<Factory<K>, CacheError>
    where
        K: ?Sized + 'static,
        C: Activate<K>,
    {
        let unsupported = || CacheError::UnsupportedKind {
            kind: type_name::<K>(),
        };
        let kind = TypeId::of::<K>();

        if kind == TypeId::of::<dyn SimpleType>() {
            let factory = self
                .simple_factories
                .get_or_create(TypeKey::of::<C>(), |key| {
                    trace_miss("simple factory", key);
                    cast_factory(create_activator::<K, C>(key)).ok_or_else(unsupported)
                })?;
            cast_factory(factory).ok_or_else(unsupported)
        } else if kind == TypeId::of::<dyn OpenXmlElement>() {
            let factory = self
                .element_factories
                .get_or_create(TypeKey::of::<C>(), |key| {
                    trace_miss("element factory", key);
                    cast_factory(create_activator::<K, C>(key)).ok_or_else(unsupported)
                })?;
            cast_factory(factory).ok_or_else(unsupported)
        } else {
            Err(unsupported())
        }
    }

    pub fn simple_factory<C>(&self) -> Result<Factory<dyn SimpleType>, CacheError>
    where
        C: Activate<dyn SimpleType>,
    {
        self.factory::<dyn SimpleType, C>()
    }

    pub fn element_factory<C>(&self) -> Result<Factory<dyn OpenXmlElement>, CacheError>
    where
        C: Activate<dyn OpenXmlElement>,
    {
        self.factory::<dyn OpenXmlElement, C>()
    }

    /// Structural metadata of element type `E`.
    pub fn element_metadata<E: ElementType>(&self) -> Result<Arc<ElementMetadata>, CacheError> {
        self.element_metadata
            .get_or_create(TypeKey::of::<E>(), |key| {
                trace_miss("element metadata", key);
                derive_element_metadata::<E>(self, key)
                    .map(Arc::new)
                    .inspect_err(|err| trace_failure("element metadata", key, err))
            })
    }

    /// Structural metadata of `element`'s runtime type.
    pub fn element_metadata_of(
        &self,
        element: &dyn OpenXmlElement,
    ) -> Result<Arc<ElementMetadata>, CacheError> {
        element.metadata_in(self)
    }

    /// Constraint metadata of part type `P`.
    pub fn part_metadata<P: PartType>(&self) -> Result<Arc<PartMetadata>, CacheError> {
        self.part_metadata.get_or_create(TypeKey::of::<P>(), |key| {
            trace_miss("part metadata", key);
            derive_part_metadata::<P>(self, key)
                .map(Arc::new)
                .inspect_err(|err| trace_failure("part metadata", key, err))
        })
    }

    /// Constraint metadata of `part`'s runtime type.
    pub fn part_metadata_of(
        &self,
        part: &dyn PartContainer,
    ) -> Result<Arc<PartMetadata>, CacheError> {
        part.metadata_in(self)
    }
}

impl fmt::Debug for PackageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageCache")
            .field("policy", &self.policy())
            .field("stats", &self.stats())
            .finish()
    }
}

#[inline]
fn trace_miss(artifact: &'static str, key: TypeKey) {
    #[cfg(feature = "tracing")]
    tracing::debug!(artifact, ty = key.name(), "package cache miss");
    #[cfg(not(feature = "tracing"))]
    let _ = (artifact, key);
}

#[inline]
fn trace_failure(artifact: &'static str, key: TypeKey, err: &CacheError) {
    #[cfg(feature = "tracing")]
    tracing::warn!(artifact, ty = key.name(), error = %err, "derivation failed");
    #[cfg(not(feature = "tracing"))]
    let _ = (artifact, key, err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxml_common::{Int32Value, Int64Value};

    #[derive(Debug, Default)]
    struct Paragraph;

    impl ElementType for Paragraph {
        const NAMESPACE: &'static str = "urn:cache-test";
        const LOCAL_NAME: &'static str = "p";
    }

    #[test]
    fn factories_are_memoized_per_type() {
        let cache = PackageCache::new();
        let a = cache.simple_factory::<Int64Value>().unwrap();
        let b = cache.factory::<dyn SimpleType, Int64Value>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let c = cache.simple_factory::<Int32Value>().unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(c().native_type_name(), "Int32");

        let p = cache.element_factory::<Paragraph>().unwrap();
        assert_eq!(p().qualified_name().local_name, "p");

        assert_eq!(
            cache.stats(),
            CacheStats {
                simple_factories: 2,
                element_factories: 1,
                element_metadata: 0,
                part_metadata: 0,
            }
        );
    }

    #[test]
    fn instance_and_type_lookups_agree() {
        let cache = PackageCache::new();
        let by_type = cache.element_metadata::<Paragraph>().unwrap();
        let by_instance = cache.element_metadata_of(&Paragraph).unwrap();
        assert!(Arc::ptr_eq(&by_type, &by_instance));
    }

    #[test]
    fn policy_follows_build_feature() {
        let expected = if cfg!(feature = "serialized-cache") {
            StorePolicy::Serialized
        } else {
            StorePolicy::Optimistic
        };
        assert_eq!(PackageCache::global().policy(), expected);
        assert!(format!("{:?}", PackageCache::new()).contains("PackageCache"));
    }
}
