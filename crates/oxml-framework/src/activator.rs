//! Zero-argument constructors for concrete types, handed out as shared
//! factories of an artifact kind (`dyn SimpleType`, `dyn OpenXmlElement`).

use std::any::Any;
use std::sync::Arc;

use oxml_common::SimpleType;

use crate::{ElementType, OpenXmlElement, TypeKey};

/// Shared constructor producing fresh boxed instances of kind `K`.
pub type Factory<K> = Arc<dyn Fn() -> Box<K> + Send + Sync>;

/// Builds a new default instance of `Self` boxed as kind `K`.
///
/// Implemented for every simple value (as `dyn SimpleType`) and every
/// element type (as `dyn OpenXmlElement`).
pub trait Activate<K: ?Sized>: Sized + 'static {
    fn activate() -> Box<K>;
}

impl<T: SimpleType + Default> Activate<dyn SimpleType> for T {
    fn activate() -> Box<dyn SimpleType> {
        Box::new(T::default())
    }
}

impl<T: ElementType> Activate<dyn OpenXmlElement> for T {
    fn activate() -> Box<dyn OpenXmlElement> {
        Box::new(T::default())
    }
}

/// Factory for concrete type `C`; `ty` is the key the factory is cached
/// under.
pub fn create_activator<K, C>(ty: TypeKey) -> Factory<K>
where
    K: ?Sized + 'static,
    C: Activate<K>,
{
    debug_assert!(ty.is::<C>(), "activator for {ty} built from another type");
    let factory: Factory<K> = Arc::new(C::activate);
    factory
}

/// Re-types a factory when `A` and `B` are the same kind.
pub(crate) fn cast_factory<A, B>(factory: Factory<A>) -> Option<Factory<B>>
where
    A: ?Sized + 'static,
    B: ?Sized + 'static,
{
    let erased: Box<dyn Any> = Box::new(factory);
    erased.downcast::<Factory<B>>().ok().map(|factory| *factory)
}
