//! # Handles
//!
//! Handles are lightweight keys minted by the entity allocator:
//! - An index into the attribute arrays
//! - A generation counter for detecting recycled indices
//!
//! The stores in this crate only ever *read* handles. Generation `0` is
//! reserved: it marks "no handle" and an empty (removed) slot.

use std::fmt;

/// Number of distinct indices a [`Handle`] can address.
pub(crate) const INDEX_SPACE: usize = (u32::MAX as usize).saturating_add(1);

/// Generation-checked key identifying a live object.
///
/// The handle is packed into a single `u64`:
/// - Lower 32 bits: Index into attribute arrays
/// - Upper 32 bits: Generation counter for detecting stale references
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Handle(u64);

impl Handle {
    /// The "no handle" value. Its generation is zero, so it never exists
    /// in any store.
    pub const NONE: Self = Self(0);

    /// Creates a handle from index and generation.
    ///
    /// # Arguments
    ///
    /// * `index` - The index into attribute arrays (0 to 2^32-1)
    /// * `generation` - The generation counter; `0` is reserved
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the handle.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the handle.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Returns `true` if the generation is the reserved zero value.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.generation() == 0
    }

    /// Returns the packed representation.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Rebuilds a handle from its packed representation.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    #[inline]
    pub(crate) const fn slot(self) -> usize {
        self.index() as usize
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_roundtrip() {
        let handle = Handle::new(12345, 67890);
        assert_eq!(handle.index(), 12345);
        assert_eq!(handle.generation(), 67890);
        assert_eq!(Handle::from_bits(handle.to_bits()), handle);
    }

    #[test]
    fn test_generation_zero_is_none() {
        assert!(Handle::NONE.is_none());
        assert!(Handle::new(7, 0).is_none());
        assert!(!Handle::new(7, 1).is_none());
        assert_eq!(Handle::default(), Handle::NONE);
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(Handle::new(3, 1).to_string(), "3v1");
    }
}
