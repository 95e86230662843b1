//! Element types and their structural metadata.
//!
//! An element type describes itself once through [`ElementType::describe`];
//! the resulting [`ElementMetadata`] is memoized per type by the
//! [`PackageCache`]. Child elements are recorded by key only and resolved
//! on demand, so recursive content models (a table inside a cell inside a
//! table) never derive eagerly.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use oxml_common::SimpleType;

use crate::{Activate, CacheError, Factory, PackageCache, TypeKey};

/// Namespace-qualified XML name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub namespace: &'static str,
    pub local_name: &'static str,
}

impl QualifiedName {
    pub const fn new(namespace: &'static str, local_name: &'static str) -> Self {
        Self {
            namespace,
            local_name,
        }
    }
}

/// Clark notation: `{namespace}local`.
impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(self.local_name)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local_name)
        }
    }
}

/* ───────────────────────── Element traits ───────────────────────── */

/// A concrete element type.
pub trait ElementType: Default + fmt::Debug + Send + Sync + 'static {
    const NAMESPACE: &'static str;
    const LOCAL_NAME: &'static str;

    /// Declares the attributes and children of this element type.
    ///
    /// Runs once per type (at least once under the optimistic cache
    /// policy) and must depend on nothing but the type itself.
    fn describe(builder: &mut ElementMetadataBuilder<'_>) -> Result<(), CacheError> {
        let _ = builder;
        Ok(())
    }
}

/// Object-safe view of an element instance.
pub trait OpenXmlElement: Any + fmt::Debug + Send + Sync {
    fn type_key(&self) -> TypeKey;

    fn qualified_name(&self) -> QualifiedName;

    /// Metadata of this instance's runtime type.
    fn metadata_in(&self, cache: &PackageCache) -> Result<Arc<ElementMetadata>, CacheError>;

    fn as_any(&self) -> &dyn Any;
}

impl<T: ElementType> OpenXmlElement for T {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(T::NAMESPACE, T::LOCAL_NAME)
    }

    fn metadata_in(&self, cache: &PackageCache) -> Result<Arc<ElementMetadata>, CacheError> {
        cache.element_metadata::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/* ───────────────────────────── Metadata ─────────────────────────── */

/// A declared attribute of an element type.
#[derive(Clone)]
pub struct AttributeMetadata {
    name: QualifiedName,
    value_type: TypeKey,
    required: bool,
    factory: Factory<dyn SimpleType>,
}

impl AttributeMetadata {
    pub fn name(&self) -> QualifiedName {
        self.name
    }

    pub fn value_type(&self) -> TypeKey {
        self.value_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Fresh, empty value of the declared type.
    pub fn new_value(&self) -> Box<dyn SimpleType> {
        (self.factory)()
    }
}

impl fmt::Debug for AttributeMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeMetadata")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// A permitted child element and its occurrence bounds.
#[derive(Clone)]
pub struct ChildMetadata {
    element: TypeKey,
    name: QualifiedName,
    min_occurs: u32,
    max_occurs: Option<u32>,
    resolve: fn(&PackageCache) -> Result<Arc<ElementMetadata>, CacheError>,
}

impl ChildMetadata {
    pub fn element(&self) -> TypeKey {
        self.element
    }

    pub fn name(&self) -> QualifiedName {
        self.name
    }

    pub fn min_occurs(&self) -> u32 {
        self.min_occurs
    }

    /// `None` means unbounded.
    pub fn max_occurs(&self) -> Option<u32> {
        self.max_occurs
    }

    /// Structural metadata of the child type, derived on first use.
    pub fn metadata(&self, cache: &PackageCache) -> Result<Arc<ElementMetadata>, CacheError> {
        (self.resolve)(cache)
    }
}

impl fmt::Debug for ChildMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildMetadata")
            .field("element", &self.element)
            .field("name", &self.name)
            .field("min_occurs", &self.min_occurs)
            .field("max_occurs", &self.max_occurs)
            .finish_non_exhaustive()
    }
}

/// Attributes and children allowed on one element type.
#[derive(Debug)]
pub struct ElementMetadata {
    element: TypeKey,
    name: QualifiedName,
    attributes: Vec<AttributeMetadata>,
    children: Vec<ChildMetadata>,
}

impl ElementMetadata {
    pub fn element(&self) -> TypeKey {
        self.element
    }

    pub fn name(&self) -> QualifiedName {
        self.name
    }

    /// Attributes in declaration order.
    pub fn attributes(&self) -> &[AttributeMetadata] {
        &self.attributes
    }

    /// Children in declaration order.
    pub fn children(&self) -> &[ChildMetadata] {
        &self.children
    }

    pub fn attribute(&self, namespace: &str, local_name: &str) -> Option<&AttributeMetadata> {
        self.attributes
            .iter()
            .find(|a| a.name.namespace == namespace && a.name.local_name == local_name)
    }

    pub fn child(&self, element: TypeKey) -> Option<&ChildMetadata> {
        self.children.iter().find(|c| c.element == element)
    }

    pub fn required_attributes(&self) -> impl Iterator<Item = &AttributeMetadata> {
        self.attributes.iter().filter(|a| a.required)
    }

    /// Empty value of the named attribute's declared type.
    pub fn new_attribute_value(
        &self,
        namespace: &str,
        local_name: &str,
    ) -> Option<Box<dyn SimpleType>> {
        self.attribute(namespace, local_name)
            .map(AttributeMetadata::new_value)
    }
}

/* ────────────────────────────── Builder ─────────────────────────── */

/// Collects an element type's declarations during derivation.
pub struct ElementMetadataBuilder<'a> {
    cache: &'a PackageCache,
    element: TypeKey,
    name: QualifiedName,
    attributes: Vec<AttributeMetadata>,
    children: Vec<ChildMetadata>,
}

impl<'a> ElementMetadataBuilder<'a> {
    pub(crate) fn new(cache: &'a PackageCache, element: TypeKey, name: QualifiedName) -> Self {
        Self {
            cache,
            element,
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// The cache the element is being derived into.
    pub fn cache(&self) -> &'a PackageCache {
        self.cache
    }

    pub fn attribute<V>(
        &mut self,
        namespace: &'static str,
        local_name: &'static str,
    ) -> Result<&mut Self, CacheError>
    where
        V: Activate<dyn SimpleType>,
    {
        self.push_attribute::<V>(QualifiedName::new(namespace, local_name), false)
    }

    pub fn required_attribute<V>(
        &mut self,
        namespace: &'static str,
        local_name: &'static str,
    ) -> Result<&mut Self, CacheError>
    where
        V: Activate<dyn SimpleType>,
    {
        self.push_attribute::<V>(QualifiedName::new(namespace, local_name), true)
    }

    fn push_attribute<V>(
        &mut self,
        name: QualifiedName,
        required: bool,
    ) -> Result<&mut Self, CacheError>
    where
        V: Activate<dyn SimpleType>,
    {
        if self.attributes.iter().any(|a| a.name == name) {
            return Err(CacheError::invalid_metadata(
                self.element.name(),
                format!("attribute {name} declared twice"),
            ));
        }
        let factory = self.cache.simple_factory::<V>()?;
        self.attributes.push(AttributeMetadata {
            name,
            value_type: TypeKey::of::<V>(),
            required,
            factory,
        });
        Ok(self)
    }

    /// Permits child element `E` between `min_occurs` and `max_occurs`
    /// times (`None` = unbounded).
    pub fn child<E: ElementType>(
        &mut self,
        min_occurs: u32,
        max_occurs: Option<u32>,
    ) -> Result<&mut Self, CacheError> {
        let element = TypeKey::of::<E>();
        if self.children.iter().any(|c| c.element == element) {
            return Err(CacheError::invalid_metadata(
                self.element.name(),
                format!("child {element} declared twice"),
            ));
        }
        if max_occurs.is_some_and(|max| max < min_occurs) {
            return Err(CacheError::invalid_metadata(
                self.element.name(),
                format!("child {element} has max_occurs below min_occurs {min_occurs}"),
            ));
        }
        self.children.push(ChildMetadata {
            element,
            name: QualifiedName::new(E::NAMESPACE, E::LOCAL_NAME),
            min_occurs,
            max_occurs,
            resolve: |cache: &PackageCache| cache.element_metadata::<E>(),
        });
        Ok(self)
    }

    pub(crate) fn build(self) -> ElementMetadata {
        ElementMetadata {
            element: self.element,
            name: self.name,
            attributes: self.attributes,
            children: self.children,
        }
    }
}

/// The structural-metadata derivation for `E`.
pub(crate) fn derive_element_metadata<E: ElementType>(
    cache: &PackageCache,
    key: TypeKey,
) -> Result<ElementMetadata, CacheError> {
    let mut builder =
        ElementMetadataBuilder::new(cache, key, QualifiedName::new(E::NAMESPACE, E::LOCAL_NAME));
    E::describe(&mut builder)?;
    Ok(builder.build())
}
