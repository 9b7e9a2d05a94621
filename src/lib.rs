#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

macro_rules! trace {
    ($($tt:tt)*) => {
        #[cfg(feature = "tracing")]
        {
            tracing::trace!($($tt)*)
        }
    };
}

pub(crate) use trace;

mod error;
mod slot;

/// A hash map over the open-addressing table.
///
/// This module provides a `HashMap` that wraps the `HashTable` and provides
/// a key-value map interface with configurable hashers and policies.
pub mod hash_map;

pub mod hash_table;

/// A hash set over the open-addressing table.
///
/// This module provides a `HashSet` that wraps the `HashTable` and provides
/// a set interface with configurable hashers and policies.
pub mod hash_set;

pub mod policy;

pub use error::KeyNotFound;
pub use hash_map::Entry;
pub use hash_map::HashMap;
pub use hash_set::HashSet;
pub use hash_table::HashTable;
pub use policy::CollisionPolicy;
pub use policy::LinearProbing;
pub use policy::MaskRangeHashing;
pub use policy::Power2RehashPolicy;
pub use policy::QuadraticProbing;
pub use policy::RangeHashing;
pub use policy::RehashPolicy;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used when none is specified.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder used when none is specified.
        pub type DefaultHashBuilder = std::hash::RandomState;
    } else {
        /// Placeholder for the default hasher builder when neither `foldhash`
        /// nor `std` is enabled. It has no values, so a builder must be passed
        /// to `with_hasher`.
        #[derive(Clone, Copy, Debug)]
        pub enum DefaultHashBuilder {}
    }
}

/// A handle to an occupied slot, playing the role of an iterator position.
///
/// Handles are returned by lookups and insertions and can be used to read,
/// modify, or erase an entry without hashing its key again, or to resume
/// traversal with `iter_from`.
///
/// A handle is **non-generational**: it stays valid while its entry is
/// present and the table is not rehashed. Erasing *other* entries never
/// invalidates it. Once its own entry is erased, or any rehash happens, the
/// slot it names may be empty or hold an unrelated entry.
///
/// # Examples
///
/// ```
/// # #[cfg(any(feature = "std", feature = "foldhash"))]
/// # {
/// use probe_hash::HashMap;
///
/// let mut map: HashMap<&str, i32> = HashMap::new();
/// let (ptr, inserted) = map.insert("key", 42);
/// assert!(inserted);
/// assert_eq!(map.ptr_get(ptr), Some((&"key", &42)));
/// # }
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Ptr(usize);

impl core::fmt::Debug for Ptr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Ptr({})", self.0)
    }
}

impl Ptr {
    #[inline(always)]
    pub(crate) fn from_index(index: usize) -> Self {
        debug_assert!(index != slot::END);
        Ptr(index)
    }

    #[inline(always)]
    pub(crate) fn from_link(link: usize) -> Option<Self> {
        (link != slot::END).then_some(Ptr(link))
    }

    /// The slot index this handle refers to.
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0
    }
}
