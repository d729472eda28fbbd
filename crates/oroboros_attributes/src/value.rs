//! # Attribute Values
//!
//! Attribute values are pure data containers with no behavior.
//! They must be plain old data so the dense store can compare them
//! against the shared default byte-for-byte.

use bytemuck::Pod;

/// Marker trait for values stored against a handle.
///
/// Values must be:
/// - `Pod`: Plain old data, no padding, no pointers, bitwise copyable
/// - `'static`: No borrowed data
///
/// Implemented for every `Pod` type. Custom structs opt in with
/// `#[derive(Clone, Copy, Pod, Zeroable)]` and `#[repr(C)]`:
///
/// ```rust,ignore
/// #[derive(Clone, Copy, Debug, Pod, Zeroable)]
/// #[repr(C)]
/// struct Tint {
///     rgba: [u8; 4],
/// }
/// ```
///
/// Equality inside the stores is *bit* equality: `-0.0` and `0.0` are
/// different values, and two `NaN`s with the same payload are equal.
pub trait AttributeValue: Pod + 'static {
    /// Returns `true` if both values have the same binary representation.
    #[inline]
    fn bits_eq(&self, other: &Self) -> bool {
        bytemuck::bytes_of(self) == bytemuck::bytes_of(other)
    }
}

impl<T: Pod + 'static> AttributeValue for T {}
