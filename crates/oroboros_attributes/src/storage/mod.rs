//! # Attribute Storage
//!
//! Two interchangeable strategies for attaching a value to a handle.
//!
//! ## Design Philosophy
//!
//! - [`SparseStore`]: one slot per handle index. O(1) everything,
//!   Θ(capacity) memory. Use when most live handles carry the attribute.
//! - [`DenseStore`]: an index → slot indirection over a compact value array
//!   with a shared default in slot 0. Θ(unique values) memory. Use when the
//!   attribute is absent or default for the vast majority of handles.
//! - The caller picks the strategy at construction. Both implement
//!   [`AttributeStore`], so generic code never needs to know which one it got.
//! - No dynamic dispatch: the trait is used through generics only.

mod dense;
mod sparse;

pub use dense::{DenseIter, DenseStore, NonDefaultIter};
pub use sparse::{SparseIter, SparseIterMut, SparseStore};

use crate::error::AttributeResult;
use crate::handle::Handle;
use crate::value::AttributeValue;

/// The capability surface shared by every storage strategy.
///
/// Reads never fail. A stale handle (its index recycled to a newer
/// generation) is simply absent.
///
/// # Example
///
/// ```rust,ignore
/// fn tint_all<S>(store: &mut S, handles: &[Handle]) -> AttributeResult<()>
/// where
///     S: AttributeStore<Value = Tint>,
/// {
///     store.set_all(handles.iter().map(|&handle| (handle, Tint::RED)))
/// }
/// ```
pub trait AttributeStore {
    /// The stored value type.
    type Value: AttributeValue;

    /// Iterator over every registered handle with its resolved value.
    type Iter<'a>: Iterator<Item = (Handle, &'a Self::Value)>
    where
        Self: 'a;

    /// Number of handle indices addressable without growing.
    fn capacity(&self) -> usize;

    /// Number of handles currently registered.
    fn len(&self) -> usize;

    /// Returns `true` if no handle is registered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `handle` is registered with its exact generation.
    fn exists(&self, handle: Handle) -> bool;

    /// Returns the value for `handle`, or `None` on a miss.
    fn get(&self, handle: Handle) -> Option<&Self::Value>;

    /// Unchecked read: skips the generation check.
    ///
    /// Callers must have checked [`AttributeStore::exists`]. On a miss the
    /// result is whatever the storage holds for that index (never undefined
    /// behavior, never a panic).
    fn read(&self, handle: Handle) -> Self::Value;

    /// Associates `value` with `handle`, growing storage as needed.
    ///
    /// # Errors
    ///
    /// Fails if the handle has the reserved zero generation or the write
    /// would exceed the configured maximum capacity.
    fn set(&mut self, handle: Handle, value: Self::Value) -> AttributeResult<()>;

    /// Writes every `(handle, value)` pair in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by [`AttributeStore::set`].
    fn set_all<I>(&mut self, entries: I) -> AttributeResult<()>
    where
        I: IntoIterator<Item = (Handle, Self::Value)>,
    {
        for (handle, value) in entries {
            self.set(handle, value)?;
        }
        Ok(())
    }

    /// Unregisters `handle`. Returns `false` if it was not registered.
    fn remove(&mut self, handle: Handle) -> bool;

    /// Unregisters every handle. Capacity is kept.
    fn clear(&mut self);

    /// Grows the addressable index range to at least `capacity`. Never shrinks.
    ///
    /// # Errors
    ///
    /// Fails if `capacity` exceeds the configured maximum capacity.
    fn resize(&mut self, capacity: usize) -> AttributeResult<()>;

    /// Iterates over every registered handle in index order.
    fn iter(&self) -> Self::Iter<'_>;
}
