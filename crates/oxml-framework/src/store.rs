//! Type-keyed memo stores.
//!
//! Both implementations share one contract: after the first successful
//! `get_or_create` for a key, every caller sees a clone of the same value
//! for the rest of the store's life. They differ in how a miss is handled:
//!
//! * [`LockedTypeStore`] runs `create` while holding the store's lock, so
//!   `create` runs exactly once per key and misses on unrelated keys queue
//!   behind each other.
//! * [`ConcurrentTypeStore`] runs `create` outside any lock. Threads that
//!   miss the same key at the same time may each run `create`; the first
//!   result to be installed wins and the rest are dropped. `create` must
//!   therefore be a pure function of the key.
//!
//! Errors from `create` are passed through and nothing is stored.

use std::cell::RefCell;
use std::fmt;
use std::hash::BuildHasherDefault;

use dashmap::DashMap;
use parking_lot::ReentrantMutex;
use rustc_hash::{FxHashMap, FxHasher};

use crate::TypeKey;

/// How a store serializes first-time creation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StorePolicy {
    /// One lock around the store; `create` runs exactly once per key.
    Serialized,
    /// Lock-free lookups; `create` may run more than once per key.
    Optimistic,
}

impl fmt::Display for StorePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StorePolicy::Serialized => "serialized",
            StorePolicy::Optimistic => "optimistic",
        })
    }
}

pub trait TypeStore<V: Clone + Send + Sync>: Default + Send + Sync {
    const POLICY: StorePolicy;

    /// Memoized value for `key`, if one has been installed.
    fn get(&self, key: TypeKey) -> Option<V>;

    /// Memoized value for `key`, running `create` on a miss.
    fn get_or_create<E, F>(&self, key: TypeKey, create: F) -> Result<V, E>
    where
        F: FnOnce(TypeKey) -> Result<V, E>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/* ─────────────────────────── Serialized ─────────────────────────── */

/// Store guarded by a single re-entrant lock.
///
/// The lock is re-entrant so that a creation function may look up other
/// keys of the same store from the same thread.
pub struct LockedTypeStore<V> {
    map: ReentrantMutex<RefCell<FxHashMap<TypeKey, V>>>,
}

impl<V> Default for LockedTypeStore<V> {
    fn default() -> Self {
        Self {
            map: ReentrantMutex::new(RefCell::new(FxHashMap::default())),
        }
    }
}

impl<V: Clone + Send + Sync> TypeStore<V> for LockedTypeStore<V> {
    const POLICY: StorePolicy = StorePolicy::Serialized;

    fn get(&self, key: TypeKey) -> Option<V> {
        self.map.lock().borrow().get(&key).cloned()
    }

    fn get_or_create<E, F>(&self, key: TypeKey, create: F) -> Result<V, E>
    where
        F: FnOnce(TypeKey) -> Result<V, E>,
    {
        let guard = self.map.lock();
        if let Some(value) = guard.borrow().get(&key) {
            return Ok(value.clone());
        }

        // No borrow is held across `create`; it may re-enter this store.
        let created = create(key)?;
        let mut map = guard.borrow_mut();
        Ok(map.entry(key).or_insert(created).clone())
    }

    fn len(&self) -> usize {
        self.map.lock().borrow().len()
    }
}

impl<V> fmt::Debug for LockedTypeStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockedTypeStore")
            .field("len", &self.map.lock().borrow().len())
            .finish()
    }
}

/* ─────────────────────────── Optimistic ─────────────────────────── */

/// Lock-free store backed by a sharded concurrent map.
pub struct ConcurrentTypeStore<V> {
    map: DashMap<TypeKey, V, BuildHasherDefault<FxHasher>>,
}

impl<V> Default for ConcurrentTypeStore<V> {
    fn default() -> Self {
        Self {
            map: DashMap::with_hasher(BuildHasherDefault::default()),
        }
    }
}

impl<V: Clone + Send + Sync> TypeStore<V> for ConcurrentTypeStore<V> {
    const POLICY: StorePolicy = StorePolicy::Optimistic;

    fn get(&self, key: TypeKey) -> Option<V> {
        self.map.get(&key).map(|v| v.value().clone())
    }

    fn get_or_create<E, F>(&self, key: TypeKey, create: F) -> Result<V, E>
    where
        F: FnOnce(TypeKey) -> Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        // No shard lock is held while creating; a racing thread may install
        // first, in which case `created` is dropped.
        let created = create(key)?;
        Ok(self.map.entry(key).or_insert(created).value().clone())
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

impl<V> fmt::Debug for ConcurrentTypeStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentTypeStore")
            .field("len", &self.map.len())
            .finish()
    }
}

/// Store used by [`PackageCache`](crate::PackageCache), chosen at build
/// time by the `serialized-cache` feature.
#[cfg(feature = "serialized-cache")]
pub type DefaultTypeStore<V> = LockedTypeStore<V>;

#[cfg(not(feature = "serialized-cache"))]
pub type DefaultTypeStore<V> = ConcurrentTypeStore<V>;
