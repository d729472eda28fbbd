//! # OROBOROS Attribute Storage
//!
//! Handle-indexed attribute stores for large simulations:
//! - Any plain-old-data value attached to a generation-checked [`Handle`]
//! - Stale (recycled) handles rejected without scanning a generation table
//! - Two strategies behind one [`AttributeStore`] trait
//!
//! ## Choosing a Strategy
//!
//! 1. **[`SparseStore`]** - one slot per handle index. Pick it when most live
//!    handles carry the attribute.
//! 2. **[`DenseStore`]** - slot indirection plus a shared default. Pick it when
//!    the attribute is absent or default for the overwhelming majority.
//!
//! Handles are minted and recycled by the entity allocator. The stores only
//! read them and never bump generations.
//!
//! ## Example
//!
//! ```rust,ignore
//! use oroboros_attributes::{AttributeStore, DenseStore, Handle, SparseStore};
//!
//! let mut mass: SparseStore<f32> = SparseStore::with_capacity(1_000_000);
//! let mut on_fire: DenseStore<u8> = DenseStore::new(0);
//!
//! let handle = Handle::new(17, 1);
//! mass.set(handle, 80.0)?;
//! on_fire.set(handle, 1)?;
//! ```
//!
//! ## Threading
//!
//! Stores are single-writer. Every mutation takes `&mut self`; confine a store
//! to one owner or serialize access externally.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod handle;
pub mod storage;
pub mod value;

pub use config::StoreConfig;
pub use error::{AttributeError, AttributeResult};
pub use handle::Handle;
pub use storage::{
    AttributeStore, DenseIter, DenseStore, NonDefaultIter, SparseIter, SparseIterMut,
    SparseStore,
};
pub use value::AttributeValue;
