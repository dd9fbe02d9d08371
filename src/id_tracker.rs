//! IdTracker: hands out small sequential ids per key behind a mutex.
//!
//! The containers themselves never lock; this type shows the intended
//! pattern for sharing one across threads. Each call holds the lock for
//! its whole duration, so a key observed by two threads always maps to the
//! same id.

use crate::error::CapacityError;
use crate::hash::{EqualTo, FastHash, KeyEq, KeyHasher};
use crate::hash_map::HashMap;
use core::borrow::Borrow;
use std::sync::{Mutex, MutexGuard, PoisonError};

struct Ids<K, H, E> {
    ids: HashMap<K, u32, H, E>,
    next_id: u32,
}

pub struct IdTracker<K, H = FastHash, E = EqualTo> {
    inner: Mutex<Ids<K, H, E>>,
}

impl<K> IdTracker<K> {
    pub fn new() -> Self {
        Self::with_hasher_and_eq(FastHash, EqualTo)
    }
}

impl<K> Default for IdTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, H, E> IdTracker<K, H, E> {
    pub fn with_hasher_and_eq(hasher: H, eq: E) -> Self {
        Self {
            inner: Mutex::new(Ids {
                ids: HashMap::with_hasher_and_eq(0, 0.7, hasher, eq),
                next_id: 0,
            }),
        }
    }

    // Every mutation leaves the map consistent before it can panic, so a
    // poisoned lock is safe to take over.
    fn lock(&self) -> MutexGuard<'_, Ids<K, H, E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().ids.is_empty()
    }

    /// Forget every key and restart numbering at zero.
    pub fn clear(&self) {
        let mut guard = self.lock();
        guard.ids.clear();
        guard.next_id = 0;
    }
}

impl<K, H, E> IdTracker<K, H, E>
where
    H: KeyHasher<K>,
    E: KeyEq<K>,
{
    /// Id for `key`, assigning the next free one on first sight.
    pub fn get_or_create_id(&self, key: K) -> Result<u32, CapacityError> {
        let mut guard = self.lock();
        let Ids { ids, next_id } = &mut *guard;
        if let Some(id) = ids.get(&key) {
            return Ok(*id);
        }
        let id = *next_id;
        ids.insert(key, id)?;
        *next_id += 1;
        Ok(id)
    }
}

impl<K, H, E> IdTracker<K, H, E> {
    pub fn get_id<Q>(&self, key: &Q) -> Option<u32>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        self.lock().ids.get(key).copied()
    }

    /// Drop `key`; its id is not reused until `clear`.
    pub fn remove_id<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
        E: KeyEq<Q>,
    {
        self.lock().ids.erase(key)
    }
}
