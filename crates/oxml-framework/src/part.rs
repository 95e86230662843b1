//! Part types and their containment constraints.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{CacheError, ElementMetadata, ElementType, PackageCache, TypeKey};

/// A concrete part type (a document part, a styles part, an image part...).
pub trait PartType: Default + fmt::Debug + Send + Sync + 'static {
    const CONTENT_TYPE: &'static str;
    const RELATIONSHIP_TYPE: &'static str;

    /// Declares the root element and the child parts this part may hold.
    ///
    /// Same purity requirement as [`ElementType::describe`].
    fn describe(builder: &mut PartMetadataBuilder<'_>) -> Result<(), CacheError> {
        let _ = builder;
        Ok(())
    }
}

/// Object-safe view of a part (or package) instance.
pub trait PartContainer: Any + fmt::Debug + Send + Sync {
    fn type_key(&self) -> TypeKey;

    fn content_type(&self) -> &'static str;

    fn relationship_type(&self) -> &'static str;

    /// Constraint metadata of this instance's runtime type.
    fn metadata_in(&self, cache: &PackageCache) -> Result<Arc<PartMetadata>, CacheError>;

    fn as_any(&self) -> &dyn Any;
}

impl<T: PartType> PartContainer for T {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn content_type(&self) -> &'static str {
        T::CONTENT_TYPE
    }

    fn relationship_type(&self) -> &'static str {
        T::RELATIONSHIP_TYPE
    }

    fn metadata_in(&self, cache: &PackageCache) -> Result<Arc<PartMetadata>, CacheError> {
        cache.part_metadata::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One permitted child part, keyed by relationship type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartConstraint {
    pub part: TypeKey,
    pub relationship_type: &'static str,
    pub content_type: &'static str,
    /// At least one instance must be present.
    pub required: bool,
    /// More than one instance may be present.
    pub allows_many: bool,
    /// Target is a shared data part rather than an owned child.
    pub data_part: bool,
}

/// Root element and child-part constraints of one part type.
#[derive(Debug)]
pub struct PartMetadata {
    part: TypeKey,
    content_type: &'static str,
    relationship_type: &'static str,
    root_element: Option<Arc<ElementMetadata>>,
    constraints: Vec<PartConstraint>,
}

impl PartMetadata {
    pub fn part(&self) -> TypeKey {
        self.part
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn relationship_type(&self) -> &'static str {
        self.relationship_type
    }

    pub fn root_element(&self) -> Option<&Arc<ElementMetadata>> {
        self.root_element.as_ref()
    }

    pub fn constraints(&self) -> &[PartConstraint] {
        &self.constraints
    }

    pub fn constraint(&self, relationship_type: &str) -> Option<&PartConstraint> {
        self.constraints
            .iter()
            .find(|c| c.relationship_type == relationship_type)
    }

    pub fn required_parts(&self) -> impl Iterator<Item = &PartConstraint> {
        self.constraints.iter().filter(|c| c.required)
    }
}

/// Collects a part type's declarations during derivation.
pub struct PartMetadataBuilder<'a> {
    cache: &'a PackageCache,
    part: TypeKey,
    root_element: Option<Arc<ElementMetadata>>,
    constraints: Vec<PartConstraint>,
}

impl<'a> PartMetadataBuilder<'a> {
    pub(crate) fn new(cache: &'a PackageCache, part: TypeKey) -> Self {
        Self {
            cache,
            part,
            root_element: None,
            constraints: Vec::new(),
        }
    }

    pub fn cache(&self) -> &'a PackageCache {
        self.cache
    }

    /// Sets the root element, pulling its structural metadata from the
    /// cache.
    pub fn root_element<E: ElementType>(&mut self) -> Result<&mut Self, CacheError> {
        if let Some(existing) = &self.root_element {
            return Err(CacheError::invalid_metadata(
                self.part.name(),
                format!("root element already set to {}", existing.name()),
            ));
        }
        self.root_element = Some(self.cache.element_metadata::<E>()?);
        Ok(self)
    }

    pub fn child_part<P: PartType>(
        &mut self,
        required: bool,
        allows_many: bool,
    ) -> Result<&mut Self, CacheError> {
        self.push_constraint::<P>(required, allows_many, false)
    }

    pub fn data_part<P: PartType>(
        &mut self,
        required: bool,
        allows_many: bool,
    ) -> Result<&mut Self, CacheError> {
        self.push_constraint::<P>(required, allows_many, true)
    }

    fn push_constraint<P: PartType>(
        &mut self,
        required: bool,
        allows_many: bool,
        data_part: bool,
    ) -> Result<&mut Self, CacheError> {
        if self.constraint_exists(P::RELATIONSHIP_TYPE) {
            return Err(CacheError::invalid_metadata(
                self.part.name(),
                format!("relationship {} declared twice", P::RELATIONSHIP_TYPE),
            ));
        }
        self.constraints.push(PartConstraint {
            part: TypeKey::of::<P>(),
            relationship_type: P::RELATIONSHIP_TYPE,
            content_type: P::CONTENT_TYPE,
            required,
            allows_many,
            data_part,
        });
        Ok(self)
    }

    fn constraint_exists(&self, relationship_type: &str) -> bool {
        self.constraints
            .iter()
            .any(|c| c.relationship_type == relationship_type)
    }

    pub(crate) fn build<P: PartType>(self) -> PartMetadata {
        PartMetadata {
            part: self.part,
            content_type: P::CONTENT_TYPE,
            relationship_type: P::RELATIONSHIP_TYPE,
            root_element: self.root_element,
            constraints: self.constraints,
        }
    }
}

/// The part-constraint derivation for `P`.
pub(crate) fn derive_part_metadata<P: PartType>(
    cache: &PackageCache,
    key: TypeKey,
) -> Result<PartMetadata, CacheError> {
    let mut builder = PartMetadataBuilder::new(cache, key);
    P::describe(&mut builder)?;
    Ok(builder.build::<P>())
}
