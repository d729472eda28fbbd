//! # Dense Attribute Storage
//!
//! Indirect storage for attributes most handles never carry.
//!
//! ```text
//! slots (SparseStore<u32>)     data (Vec<T>)
//!   handle 3v1 -> 0  ------->  [0] shared default
//!   handle 7v2 -> 2  ----+     [1] (free)
//!   handle 9v1 -> 0      +-->  [2] distinct value
//! free_list: [1]
//! ```
//!
//! Every handle holding the default aliases slot 0, so resetting a value
//! to the default releases its slot instead of storing a copy.

use std::iter::FusedIterator;

use super::sparse::{SparseIter, SparseStore};
use super::AttributeStore;
use crate::config::StoreConfig;
use crate::error::{AttributeError, AttributeResult};
use crate::handle::Handle;
use crate::value::AttributeValue;

/// Slot reserved for the shared default value.
const SHARED_DEFAULT_SLOT: u32 = 0;

/// Compact storage for one attribute type with a shared default.
///
/// This storage guarantees:
/// - O(1) amortized `get`/`set`/`remove`
/// - Θ(unique values) memory for values, plus the slot indirection
/// - Writing the default value never allocates a dense slot
///
/// Values equal to the shared default are detected by **bit** comparison,
/// never `PartialEq`.
///
/// # Example
///
/// ```rust,ignore
/// let mut burning: DenseStore<f32> = DenseStore::new(0.0);
/// burning.set(handle, 3.5)?;          // takes a dense slot
/// burning.set(handle, 0.0)?;          // releases it, aliases slot 0
/// assert_eq!(burning.count_non_shared_default(), 0);
/// ```
#[derive(Clone, Debug)]
pub struct DenseStore<T: AttributeValue> {
    /// Handle -> dense slot indirection.
    slots: SparseStore<u32>,
    /// Dense values. `data[0]` is the shared default.
    data: Vec<T>,
    /// Reclaimed slots, reused before `data` grows.
    free_list: Vec<u32>,
}

impl<T: AttributeValue> DenseStore<T> {
    /// Creates an empty store whose unassigned handles resolve to `shared_default`.
    #[must_use]
    pub fn new(shared_default: T) -> Self {
        Self {
            slots: SparseStore::new(),
            data: vec![shared_default],
            free_list: Vec::new(),
        }
    }

    /// Creates a store with `capacity` handle indices pre-sized.
    #[must_use]
    pub fn with_capacity(shared_default: T, capacity: usize) -> Self {
        Self {
            slots: SparseStore::with_capacity(capacity),
            ..Self::new(shared_default)
        }
    }

    /// Creates a store sized and limited by `config`.
    ///
    /// `config.dense_reserve` value slots are reserved on top of slot 0.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::InvalidConfig`](crate::AttributeError::InvalidConfig)
    /// if the config fails validation or the reservation cannot be allocated.
    pub fn with_config(shared_default: T, config: StoreConfig) -> AttributeResult<Self> {
        let slots = SparseStore::with_config(config)?;
        let mut data = Vec::new();
        // Slot 0 comes on top of the reservation.
        data.try_reserve_exact(config.dense_reserve.saturating_add(1))
            .map_err(|e| {
                AttributeError::InvalidConfig(format!(
                    "dense_reserve {}: {e}",
                    config.dense_reserve
                ))
            })?;
        data.push(shared_default);
        Ok(Self {
            slots,
            data,
            free_list: Vec::new(),
        })
    }

    /// Returns the number of addressable handle indices.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Returns the number of registered handles, default or not.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no handle is registered.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the number of handles holding a value distinct from the
    /// shared default.
    #[inline]
    #[must_use]
    pub fn count_non_shared_default(&self) -> usize {
        self.data.len() - self.free_list.len() - 1
    }

    /// Returns the length of the dense value array, slot 0 included.
    #[inline]
    #[must_use]
    pub fn dense_len(&self) -> usize {
        self.data.len()
    }

    /// Returns the number of reclaimed slots waiting for reuse.
    #[inline]
    #[must_use]
    pub fn free_slots(&self) -> usize {
        self.free_list.len()
    }

    /// Returns the shared default value.
    #[inline]
    #[must_use]
    pub fn shared_default(&self) -> T {
        self.data[SHARED_DEFAULT_SLOT as usize]
    }

    /// Replaces the shared default value.
    ///
    /// This is a **bulk** mutation: every handle currently aliasing the
    /// default observes the new value immediately. Handles holding their own
    /// slot are untouched, even if their value now equals the new default.
    #[inline]
    pub fn set_shared_default(&mut self, value: T) {
        self.data[SHARED_DEFAULT_SLOT as usize] = value;
    }

    /// Checks whether `handle` is registered with its exact generation.
    #[inline]
    #[must_use]
    pub fn exists(&self, handle: Handle) -> bool {
        self.slots.exists(handle)
    }

    /// Gets the resolved value for `handle`.
    ///
    /// # Returns
    ///
    /// Reference to the value (the shared default for aliased handles), or
    /// None if the handle is unknown or stale.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle)
            .map(|&slot| &self.data[slot as usize])
    }

    /// Reads through the raw slot mapping without a generation check.
    ///
    /// Resolves to the shared default when the mapping points nowhere.
    #[inline]
    #[must_use]
    pub fn read(&self, handle: Handle) -> T {
        let slot = self.slots.read(handle) as usize;
        self.data
            .get(slot)
            .copied()
            .unwrap_or_else(|| self.shared_default())
    }

    /// Associates `value` with `handle`.
    ///
    /// | current slot | `value` is default | effect                         |
    /// |--------------|--------------------|--------------------------------|
    /// | none / 0     | yes                | map to 0, no allocation        |
    /// | none / 0     | no                 | allocate a slot, write value   |
    /// | `s` != 0     | yes                | free `s`, map to 0             |
    /// | `s` != 0     | no                 | overwrite `data[s]` in place   |
    ///
    /// A stale occupant of the same index hands its slot to the new handle.
    ///
    /// # Errors
    ///
    /// - [`AttributeError::NullHandle`](crate::AttributeError::NullHandle) if the generation is zero
    /// - [`AttributeError::CapacityExceeded`](crate::AttributeError::CapacityExceeded) if the
    ///   index is over the limit
    pub fn set(&mut self, handle: Handle, value: T) -> AttributeResult<()> {
        // Fail before touching data or the free list.
        self.slots.validate(handle)?;

        let is_default = value.bits_eq(&self.data[SHARED_DEFAULT_SLOT as usize]);
        let current = self.slots.occupant(handle.slot()).copied();

        let slot = match (current, is_default) {
            (None | Some(SHARED_DEFAULT_SLOT), true) => SHARED_DEFAULT_SLOT,
            (None | Some(SHARED_DEFAULT_SLOT), false) => self.allocate(value),
            (Some(slot), true) => {
                self.free_list.push(slot);
                SHARED_DEFAULT_SLOT
            }
            (Some(slot), false) => {
                self.data[slot as usize] = value;
                slot
            }
        };

        self.slots.set(handle, slot)
    }

    /// Unregisters `handle`, releasing its dense slot if it owned one.
    ///
    /// # Returns
    ///
    /// `true` if the handle was registered, `false` if unknown or stale.
    pub fn remove(&mut self, handle: Handle) -> bool {
        match self.slots.get(handle).copied() {
            Some(slot) => {
                if slot != SHARED_DEFAULT_SLOT {
                    self.free_list.push(slot);
                }
                self.slots.remove(handle)
            }
            None => false,
        }
    }

    /// Grows the addressable index range to at least `capacity`.
    ///
    /// Only the slot indirection is resized; dense values grow on demand.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::CapacityExceeded`](crate::AttributeError::CapacityExceeded)
    /// if `capacity` is over the limit.
    pub fn resize(&mut self, capacity: usize) -> AttributeResult<()> {
        self.slots.resize(capacity)
    }

    /// Unregisters every handle and drops every distinct value.
    ///
    /// The shared default survives.
    pub fn clear(&mut self) {
        tracing::debug!(
            dense_len = self.data.len(),
            free = self.free_list.len(),
            "clearing dense attribute store"
        );
        self.slots.clear();
        self.free_list.clear();
        self.data.truncate(1);
    }

    /// Releases spare allocation in the indirection, value and free arrays.
    ///
    /// Slot numbers are never renumbered.
    pub fn shrink_to_fit(&mut self) {
        self.slots.shrink_to_fit();
        self.data.shrink_to_fit();
        self.free_list.shrink_to_fit();
    }

    /// Iterates over every registered handle with its resolved value.
    ///
    /// Handles explicitly set to the default and handles that were only ever
    /// registered at the default are indistinguishable here.
    #[inline]
    pub fn iter(&self) -> DenseIter<'_, T> {
        DenseIter {
            slots: self.slots.iter(),
            data: &self.data,
        }
    }

    /// Iterates over handles holding a value distinct from the shared default.
    #[inline]
    pub fn iter_non_default(&self) -> NonDefaultIter<'_, T> {
        NonDefaultIter {
            slots: self.slots.iter(),
            data: &self.data,
            remaining: self.count_non_shared_default(),
        }
    }

    /// Takes a slot from the free list, or appends one.
    fn allocate(&mut self, value: T) -> u32 {
        if let Some(slot) = self.free_list.pop() {
            tracing::trace!(slot, "recycled dense attribute slot");
            self.data[slot as usize] = value;
            return slot;
        }

        if self.data.len() == self.data.capacity() {
            tracing::debug!(
                dense_len = self.data.len(),
                "dense attribute values growing"
            );
        }
        #[allow(clippy::cast_possible_truncation)]
        let slot = self.data.len() as u32;
        self.data.push(value);
        slot
    }
}

impl<T: AttributeValue> Default for DenseStore<T> {
    /// An empty store with the all-zero value as the shared default.
    fn default() -> Self {
        Self::new(<T as bytemuck::Zeroable>::zeroed())
    }
}

impl<T: AttributeValue> AttributeStore for DenseStore<T> {
    type Value = T;
    type Iter<'a> = DenseIter<'a, T>;

    fn capacity(&self) -> usize {
        DenseStore::capacity(self)
    }

    fn len(&self) -> usize {
        DenseStore::len(self)
    }

    fn exists(&self, handle: Handle) -> bool {
        DenseStore::exists(self, handle)
    }

    fn get(&self, handle: Handle) -> Option<&T> {
        DenseStore::get(self, handle)
    }

    fn read(&self, handle: Handle) -> T {
        DenseStore::read(self, handle)
    }

    fn set(&mut self, handle: Handle, value: T) -> AttributeResult<()> {
        DenseStore::set(self, handle, value)
    }

    fn remove(&mut self, handle: Handle) -> bool {
        DenseStore::remove(self, handle)
    }

    fn clear(&mut self) {
        DenseStore::clear(self);
    }

    fn resize(&mut self, capacity: usize) -> AttributeResult<()> {
        DenseStore::resize(self, capacity)
    }

    fn iter(&self) -> DenseIter<'_, T> {
        DenseStore::iter(self)
    }
}

impl<'a, T: AttributeValue> IntoIterator for &'a DenseStore<T> {
    type Item = (Handle, &'a T);
    type IntoIter = DenseIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Every registered handle of a [`DenseStore`] with its resolved value.
#[derive(Clone, Debug)]
pub struct DenseIter<'a, T> {
    slots: SparseIter<'a, u32>,
    data: &'a [T],
}

impl<'a, T> Iterator for DenseIter<'a, T> {
    type Item = (Handle, &'a T);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let data = self.data;
        self.slots
            .next()
            .map(|(handle, &slot)| (handle, &data[slot as usize]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl<T> ExactSizeIterator for DenseIter<'_, T> {}

impl<T> FusedIterator for DenseIter<'_, T> {}

/// Registered handles of a [`DenseStore`] that own a distinct value.
#[derive(Clone, Debug)]
pub struct NonDefaultIter<'a, T> {
    slots: SparseIter<'a, u32>,
    data: &'a [T],
    remaining: usize,
}

impl<'a, T> Iterator for NonDefaultIter<'a, T> {
    type Item = (Handle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        for (handle, &slot) in self.slots.by_ref() {
            if slot != SHARED_DEFAULT_SLOT {
                self.remaining -= 1;
                return Some((handle, &self.data[slot as usize]));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for NonDefaultIter<'_, T> {}

impl<T> FusedIterator for NonDefaultIter<'_, T> {}
