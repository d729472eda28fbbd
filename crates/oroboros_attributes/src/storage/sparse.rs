//! # Sparse Attribute Storage
//!
//! Direct-indexed storage: the handle index *is* the array position.
//!
//! - `values[i]` and `generations[i]` are parallel arrays
//! - A handle exists iff its generation matches `generations[index]`
//! - Generation `0` is the tombstone for an empty slot
//! - Capacity only grows; removal never frees memory

use std::iter::{Enumerate, FusedIterator, Zip};
use std::slice;

use super::AttributeStore;
use crate::config::StoreConfig;
use crate::error::{AttributeError, AttributeResult};
use crate::handle::{Handle, INDEX_SPACE};
use crate::value::AttributeValue;

/// Smallest capacity the store grows to on its first write.
const MIN_GROWTH: usize = 64;

/// Direct-indexed storage for one attribute type.
///
/// This storage guarantees:
/// - O(1) worst-case `exists`/`get`/`remove`, O(1) amortized `set`
/// - Stale handles are rejected by a single generation compare
/// - Θ(capacity) memory, regardless of how many handles carry the attribute
///
/// # Type Parameters
///
/// * `T` - The value type to store
///
/// # Example
///
/// ```rust,ignore
/// let mut health: SparseStore<f32> = SparseStore::with_capacity(1_000_000);
/// health.set(Handle::new(42, 1), 100.0)?;
/// assert_eq!(health.get(Handle::new(42, 1)), Some(&100.0));
/// assert!(!health.exists(Handle::new(42, 2))); // recycled index
/// ```
#[derive(Clone, Debug)]
pub struct SparseStore<T: AttributeValue> {
    /// One value per handle index.
    values: Vec<T>,
    /// Generation of the handle owning each index, `0` when empty.
    generations: Vec<u32>,
    /// Number of indices with a nonzero generation.
    count: usize,
    /// Sizing limits.
    config: StoreConfig,
}

impl<T: AttributeValue> SparseStore<T> {
    /// Creates an empty store. Nothing is allocated until the first write.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            generations: Vec::new(),
            count: 0,
            config: StoreConfig::default(),
        }
    }

    /// Creates a store with `capacity` handle indices pre-sized.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut store = Self::new();
        store.grow_to(capacity);
        store
    }

    /// Creates a store sized and limited by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::InvalidConfig`] if the config fails validation
    /// or the initial capacity cannot be allocated.
    pub fn with_config(config: StoreConfig) -> AttributeResult<Self> {
        config.validate()?;
        let mut store = Self {
            config,
            ..Self::new()
        };
        let reserve_failed = |e| {
            AttributeError::InvalidConfig(format!(
                "initial_capacity {}: {e}",
                config.initial_capacity
            ))
        };
        store
            .values
            .try_reserve_exact(config.initial_capacity)
            .map_err(reserve_failed)?;
        store
            .generations
            .try_reserve_exact(config.initial_capacity)
            .map_err(reserve_failed)?;
        store.grow_to(config.initial_capacity);
        Ok(store)
    }

    /// Returns the number of addressable handle indices.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.generations.len()
    }

    /// Returns the number of registered handles.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns `true` if no handle is registered.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the sizing configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Checks whether `handle` is registered with its exact generation.
    ///
    /// Out-of-range indices and the reserved zero generation are misses.
    #[inline]
    #[must_use]
    pub fn exists(&self, handle: Handle) -> bool {
        !handle.is_none() && self.generations.get(handle.slot()) == Some(&handle.generation())
    }

    /// Gets the value for `handle`.
    ///
    /// # Returns
    ///
    /// Reference to the value, or None if the handle is unknown or stale.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        if self.exists(handle) {
            Some(&self.values[handle.slot()])
        } else {
            None
        }
    }

    /// Gets a mutable value for `handle`.
    ///
    /// # Returns
    ///
    /// Mutable reference to the value, or None if the handle is unknown or stale.
    #[inline]
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        if self.exists(handle) {
            Some(&mut self.values[handle.slot()])
        } else {
            None
        }
    }

    /// Reads the value stored at `handle`'s index without a generation check.
    ///
    /// Returns the zeroed value when the index is beyond capacity.
    #[inline]
    #[must_use]
    pub fn read(&self, handle: Handle) -> T {
        self.values
            .get(handle.slot())
            .copied()
            .unwrap_or_else(<T as bytemuck::Zeroable>::zeroed)
    }

    /// Associates `value` with `handle`.
    ///
    /// Grows storage (amortized doubling) when the index is beyond capacity.
    /// Writing through a newer generation silently replaces a stale occupant.
    ///
    /// # Errors
    ///
    /// - [`AttributeError::NullHandle`] if the generation is zero
    /// - [`AttributeError::CapacityExceeded`] if growth would pass the limit
    pub fn set(&mut self, handle: Handle, value: T) -> AttributeResult<()> {
        self.validate(handle)?;

        let index = handle.slot();
        if index >= self.capacity() {
            self.grow_for(index);
        }

        let generation = &mut self.generations[index];
        if *generation == 0 {
            self.count += 1;
        }
        *generation = handle.generation();
        self.values[index] = value;

        Ok(())
    }

    /// Unregisters `handle`, leaving a tombstone in place.
    ///
    /// # Returns
    ///
    /// `true` if the handle was registered, `false` if unknown or stale.
    pub fn remove(&mut self, handle: Handle) -> bool {
        if !self.exists(handle) {
            return false;
        }
        self.generations[handle.slot()] = 0;
        self.count -= 1;
        true
    }

    /// Grows the addressable index range to at least `capacity`.
    ///
    /// New indices read as empty. Never shrinks: a request at or below the
    /// current capacity is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::CapacityExceeded`] if the store would have to
    /// grow past the limit.
    pub fn resize(&mut self, capacity: usize) -> AttributeResult<()> {
        if capacity <= self.capacity() {
            return Ok(());
        }
        self.config.check_capacity(capacity)?;
        self.grow_to(capacity);
        Ok(())
    }

    /// Unregisters every handle.
    ///
    /// Costs O(capacity): the whole generation array is zeroed.
    pub fn clear(&mut self) {
        tracing::debug!(
            capacity = self.capacity(),
            count = self.count,
            "clearing sparse attribute store"
        );
        self.generations.fill(0);
        self.count = 0;
    }

    /// Releases spare allocation beyond the current capacity.
    pub fn shrink_to_fit(&mut self) {
        self.values.shrink_to_fit();
        self.generations.shrink_to_fit();
    }

    /// Iterates over every registered handle in index order.
    #[inline]
    pub fn iter(&self) -> SparseIter<'_, T> {
        SparseIter {
            generations: self.generations.iter().enumerate(),
            values: &self.values,
            remaining: self.count,
        }
    }

    /// Iterates mutably over every registered handle in index order.
    #[inline]
    pub fn iter_mut(&mut self) -> SparseIterMut<'_, T> {
        SparseIterMut {
            entries: self.generations.iter().zip(self.values.iter_mut()).enumerate(),
            remaining: self.count,
        }
    }

    /// Rejects writes that can never succeed, before anything is mutated.
    pub(crate) fn validate(&self, handle: Handle) -> AttributeResult<()> {
        if handle.is_none() {
            return Err(AttributeError::NullHandle {
                index: handle.index(),
            });
        }
        if handle.slot() >= self.capacity() {
            self.config.check_capacity(handle.slot() + 1)?;
        }
        Ok(())
    }

    /// Value held at `index` by any occupant, live or stale.
    #[inline]
    pub(crate) fn occupant(&self, index: usize) -> Option<&T> {
        match self.generations.get(index) {
            Some(&generation) if generation != 0 => Some(&self.values[index]),
            _ => None,
        }
    }

    /// Grows so `index` is addressable. The caller has already validated it.
    fn grow_for(&mut self, index: usize) {
        let required = index + 1;
        let doubled = self.capacity().saturating_mul(2).max(MIN_GROWTH);
        let target = match self.config.max_capacity {
            Some(limit) => doubled.min(limit),
            None => doubled,
        };
        self.grow_to(target.max(required));
    }

    fn grow_to(&mut self, capacity: usize) {
        let capacity = capacity.min(INDEX_SPACE);
        let old = self.capacity();
        if capacity <= old {
            return;
        }

        self.values
            .resize(capacity, <T as bytemuck::Zeroable>::zeroed());
        self.generations.resize(capacity, 0);

        tracing::debug!(from = old, to = capacity, "sparse attribute store grew");
    }
}

impl<T: AttributeValue> Default for SparseStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: AttributeValue> AttributeStore for SparseStore<T> {
    type Value = T;
    type Iter<'a> = SparseIter<'a, T>;

    fn capacity(&self) -> usize {
        SparseStore::capacity(self)
    }

    fn len(&self) -> usize {
        SparseStore::len(self)
    }

    fn exists(&self, handle: Handle) -> bool {
        SparseStore::exists(self, handle)
    }

    fn get(&self, handle: Handle) -> Option<&T> {
        SparseStore::get(self, handle)
    }

    fn read(&self, handle: Handle) -> T {
        SparseStore::read(self, handle)
    }

    fn set(&mut self, handle: Handle, value: T) -> AttributeResult<()> {
        SparseStore::set(self, handle, value)
    }

    fn remove(&mut self, handle: Handle) -> bool {
        SparseStore::remove(self, handle)
    }

    fn clear(&mut self) {
        SparseStore::clear(self);
    }

    fn resize(&mut self, capacity: usize) -> AttributeResult<()> {
        SparseStore::resize(self, capacity)
    }

    fn iter(&self) -> SparseIter<'_, T> {
        SparseStore::iter(self)
    }
}

impl<'a, T: AttributeValue> IntoIterator for &'a SparseStore<T> {
    type Item = (Handle, &'a T);
    type IntoIter = SparseIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Forward scan over a [`SparseStore`], yielding registered handles only.
#[derive(Clone, Debug)]
pub struct SparseIter<'a, T> {
    generations: Enumerate<slice::Iter<'a, u32>>,
    values: &'a [T],
    remaining: usize,
}

impl<'a, T> Iterator for SparseIter<'a, T> {
    type Item = (Handle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        // Everything past the last registered index is skipped.
        if self.remaining == 0 {
            return None;
        }
        for (index, &generation) in self.generations.by_ref() {
            if generation != 0 {
                self.remaining -= 1;
                #[allow(clippy::cast_possible_truncation)]
                let handle = Handle::new(index as u32, generation);
                return Some((handle, &self.values[index]));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for SparseIter<'_, T> {}

impl<T> FusedIterator for SparseIter<'_, T> {}

/// Mutable forward scan over a [`SparseStore`].
#[derive(Debug)]
pub struct SparseIterMut<'a, T> {
    entries: Enumerate<Zip<slice::Iter<'a, u32>, slice::IterMut<'a, T>>>,
    remaining: usize,
}

impl<'a, T> Iterator for SparseIterMut<'a, T> {
    type Item = (Handle, &'a mut T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        for (index, (&generation, value)) in self.entries.by_ref() {
            if generation != 0 {
                self.remaining -= 1;
                #[allow(clippy::cast_possible_truncation)]
                let handle = Handle::new(index as u32, generation);
                return Some((handle, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for SparseIterMut<'_, T> {}

impl<T> FusedIterator for SparseIterMut<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwritten_handles_do_not_exist() {
        let store: SparseStore<u32> = SparseStore::with_capacity(8);
        assert!(!store.exists(Handle::new(3, 1)));
        assert!(!store.exists(Handle::new(1000, 1)));
        assert_eq!(store.get(Handle::new(1000, 1)), None);
        assert_eq!(store.read(Handle::new(1000, 1)), 0);
    }

    #[test]
    fn test_set_get_roundtrip() {
        let mut store: SparseStore<u64> = SparseStore::new();
        let handle = Handle::new(5, 3);

        store.set(handle, 99).unwrap();
        assert!(store.exists(handle));
        assert_eq!(store.get(handle), Some(&99));
        assert_eq!(store.read(handle), 99);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_is_idempotent() {
        let mut store: SparseStore<i32> = SparseStore::new();
        let handle = Handle::new(2, 1);
        store.set(handle, -4).unwrap();
        store.set(handle, -4).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(handle), Some(&-4));
    }

    #[test]
    fn test_stale_handle_is_a_miss() {
        let mut store: SparseStore<u32> = SparseStore::new();
        let old = Handle::new(4, 1);
        let new = Handle::new(4, 2);

        store.set(old, 10).unwrap();
        assert!(!store.exists(new));
        assert_eq!(store.get(new), None);

        // Recycled index overwrites the stale occupant without double counting.
        store.set(new, 20).unwrap();
        assert!(!store.exists(old));
        assert_eq!(store.get(new), Some(&20));
        assert_eq!(store.len(), 1);
        assert!(!store.remove(old));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut store: SparseStore<u32> = SparseStore::new();
        let a = Handle::new(0, 1);
        let b = Handle::new(1, 1);
        store.set(a, 1).unwrap();
        store.set(b, 2).unwrap();

        assert!(store.remove(a));
        assert!(!store.exists(a));
        assert_eq!(store.len(), 1);
        assert!(!store.remove(a));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(b), Some(&2));
    }

    #[test]
    fn test_auto_grow() {
        let mut store: SparseStore<u8> = SparseStore::new();
        assert_eq!(store.capacity(), 0);

        store.set(Handle::new(0, 1), 1).unwrap();
        assert_eq!(store.capacity(), MIN_GROWTH);

        store.set(Handle::new(500, 1), 2).unwrap();
        assert!(store.capacity() > 500);
        assert_eq!(store.get(Handle::new(500, 1)), Some(&2));
        assert_eq!(store.get(Handle::new(0, 1)), Some(&1));
    }

    #[test]
    fn test_resize_never_shrinks() {
        let mut store: SparseStore<u16> = SparseStore::with_capacity(100);
        store.resize(10).unwrap();
        assert_eq!(store.capacity(), 100);
        store.resize(300).unwrap();
        assert_eq!(store.capacity(), 300);
        assert!(!store.exists(Handle::new(299, 1)));
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut store: SparseStore<u32> = SparseStore::with_capacity(16);
        store.set(Handle::new(1, 1), 1).unwrap();
        store.set(Handle::new(9, 4), 9).unwrap();

        store.clear();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.capacity(), 16);
        assert!(!store.exists(Handle::new(9, 4)));
        assert_eq!(store.iter().count(), 0);
    }

    #[test]
    fn test_null_handle_rejected() {
        let mut store: SparseStore<u32> = SparseStore::new();
        assert_eq!(
            store.set(Handle::new(3, 0), 1),
            Err(AttributeError::NullHandle { index: 3 })
        );
        assert_eq!(store.len(), 0);
        assert!(!store.exists(Handle::new(3, 0)));
    }

    #[test]
    fn test_capacity_limit() {
        let config = StoreConfig {
            initial_capacity: 4,
            max_capacity: Some(100),
            dense_reserve: 0,
        };
        let mut store: SparseStore<u32> = SparseStore::with_config(config).unwrap();
        assert_eq!(store.capacity(), 4);

        store.set(Handle::new(70, 1), 7).unwrap();
        assert_eq!(store.capacity(), 71);

        // Doubling is clamped to the limit.
        store.set(Handle::new(72, 1), 7).unwrap();
        assert_eq!(store.capacity(), 100);

        assert_eq!(
            store.set(Handle::new(100, 1), 1),
            Err(AttributeError::CapacityExceeded { requested: 101, limit: 100 })
        );
        assert!(store.resize(101).is_err());
        assert_eq!(store.capacity(), 100);
    }

    #[test]
    fn test_with_config_rejects_oversized_capacity() {
        let config = StoreConfig {
            initial_capacity: usize::MAX,
            ..StoreConfig::default()
        };
        assert!(matches!(
            SparseStore::<u32>::with_config(config),
            Err(AttributeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_resize_within_capacity_is_noop() {
        let config = StoreConfig {
            initial_capacity: 100,
            max_capacity: Some(100),
            dense_reserve: 0,
        };
        let mut store: SparseStore<u32> = SparseStore::with_config(config).unwrap();
        store.resize(100).unwrap();
        store.resize(1).unwrap();
        assert_eq!(store.capacity(), 100);
        assert!(store.resize(101).is_err());
    }

    #[test]
    fn test_shrink_after_clear() {
        let mut store: SparseStore<u64> = SparseStore::new();
        for index in 0..200 {
            store.set(Handle::new(index, 1), u64::from(index)).unwrap();
        }
        let capacity = store.capacity();

        store.clear();
        store.shrink_to_fit();
        assert_eq!(store.capacity(), capacity);
        assert!(store.is_empty());

        store.set(Handle::new(150, 2), 15).unwrap();
        assert_eq!(store.get(Handle::new(150, 2)), Some(&15));
        assert!(!store.exists(Handle::new(150, 1)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_iter_yields_registered_only() {
        let mut store: SparseStore<u32> = SparseStore::with_capacity(32);
        store.set(Handle::new(3, 1), 30).unwrap();
        store.set(Handle::new(7, 2), 70).unwrap();
        store.set(Handle::new(20, 5), 200).unwrap();
        store.remove(Handle::new(7, 2));

        let iter = store.iter();
        assert_eq!(iter.len(), 2);
        let entries: Vec<_> = iter.collect();
        assert_eq!(
            entries,
            vec![(Handle::new(3, 1), &30), (Handle::new(20, 5), &200)]
        );
        assert!(entries.iter().all(|(handle, _)| store.exists(*handle)));
    }

    #[test]
    fn test_iter_mut() {
        let mut store: SparseStore<u32> = SparseStore::new();
        store.set(Handle::new(0, 1), 1).unwrap();
        store.set(Handle::new(2, 1), 2).unwrap();

        for (_, value) in store.iter_mut() {
            *value *= 10;
        }
        assert_eq!(store.get(Handle::new(0, 1)), Some(&10));
        assert_eq!(store.get(Handle::new(2, 1)), Some(&20));
    }

    #[test]
    fn test_get_mut_rejects_stale() {
        let mut store: SparseStore<u32> = SparseStore::new();
        store.set(Handle::new(1, 1), 5).unwrap();
        assert!(store.get_mut(Handle::new(1, 2)).is_none());
        *store.get_mut(Handle::new(1, 1)).unwrap() = 6;
        assert_eq!(store.get(Handle::new(1, 1)), Some(&6));
    }
}
