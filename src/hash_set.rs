use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

use crate::DefaultHashBuilder;
use crate::Ptr;
use crate::hash_table;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;
use crate::policy::CollisionPolicy;
use crate::policy::LinearProbing;
use crate::policy::MaskRangeHashing;
use crate::policy::Power2RehashPolicy;
use crate::policy::RangeHashing;
use crate::policy::RehashPolicy;

/// A hash set implemented using the open-addressing [`HashTable`] as the
/// underlying storage.
///
/// `HashSet<T, S>` stores values of type `T` where `T` implements `Hash + Eq`
/// and uses a configurable hasher builder `S` to hash values. It shares every
/// design choice of [`HashMap`](crate::HashMap): the same policies, the same
/// tombstone deletion, and the same most-recent-first iteration order that is
/// reversed by each rehash.
///
/// # Performance Characteristics
///
/// - **Memory**: one slot per bucket, each the size of `T` plus a cached u64
///   hash and two link indices.
pub struct HashSet<
    T,
    S = DefaultHashBuilder,
    P = LinearProbing,
    R = MaskRangeHashing,
    G = Power2RehashPolicy,
> {
    table: HashTable<T, P, R, G>,
    hash_builder: S,
}

impl<T, S, P, R, G> Clone for HashSet<T, S, P, R, G>
where
    T: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<T, S, P, R, G> PartialEq for HashSet<T, S, P, R, G>
where
    T: Hash + Eq,
    S: BuildHasher,
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|v| other.contains(v))
    }
}

impl<T, S, P, R, G> Eq for HashSet<T, S, P, R, G>
where
    T: Hash + Eq,
    S: BuildHasher,
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
}

impl<T, S, P, R, G> Debug for HashSet<T, S, P, R, G>
where
    T: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S> HashSet<T, S> {
    /// Creates a new hash set with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasherDefault;
    /// # use siphasher::sip::SipHasher;
    /// use probe_hash::HashSet;
    ///
    /// type Sip = BuildHasherDefault<SipHasher>;
    ///
    /// let set: HashSet<i32, _> = HashSet::with_hasher(Sip::default());
    /// assert!(set.is_empty());
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_policies(0, hash_builder)
    }

    /// Creates a new hash set sized for `capacity` values, with the given
    /// hasher builder.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self::with_policies(capacity, hash_builder)
    }
}

impl<T, S> HashSet<T, S>
where
    S: Default,
{
    /// Creates a new hash set using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use probe_hash::HashSet;
    ///
    /// let set: HashSet<i32> = HashSet::new();
    /// assert!(set.is_empty());
    /// assert_eq!(set.bucket_count(), 64);
    /// # }
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates a new hash set sized for `capacity` values using the default
    /// hasher builder.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<T, S, P, R, G> HashSet<T, S, P, R, G> {
    /// Creates a set whose policies are chosen through its type.
    pub fn with_policies(capacity: usize, hash_builder: S) -> Self
    where
        P: CollisionPolicy,
        R: RangeHashing,
        G: RehashPolicy,
    {
        Self {
            table: HashTable::with_capacity(capacity),
            hash_builder,
        }
    }

    /// Returns a reference to the set's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns an iterator over the values of the set, most recently inserted
    /// first.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use probe_hash::HashSet;
    ///
    /// let mut set: HashSet<char> = HashSet::new();
    /// set.insert('a');
    /// set.insert('b');
    /// set.insert('c');
    ///
    /// let order: String = set.iter().collect();
    /// assert_eq!(order, "cba");
    /// # }
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator from the value `ptr` refers to until the end of
    /// the traversal order.
    pub fn iter_from(&self, ptr: Ptr) -> IterFrom<'_, T> {
        IterFrom {
            inner: self.table.iter_from(ptr),
        }
    }

    /// Clears the set, returning all values as an iterator.
    pub fn drain(&mut self) -> Drain<'_, T, P, R, G> {
        Drain {
            inner: self.table.drain(),
        }
    }
}

impl<T, S, P, R, G> HashSet<T, S, P, R, G>
where
    T: Hash + Eq,
    S: BuildHasher,
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
    /// Returns the number of elements in the set.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of values the set can hold before it grows.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the number of buckets in the underlying table.
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Returns the current ratio of values to buckets.
    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }

    /// Returns the load factor the set grows to stay under.
    pub fn max_load_factor(&self) -> f32 {
        self.table.max_load_factor()
    }

    /// Returns the bucket `value` currently resolves to. Intended for
    /// inspection and testing.
    pub fn bucket(&self, value: &T) -> usize {
        let hash = self.hash_builder.hash_one(value);
        self.table
            .insertion_slot(hash, |v| v == value)
            .unwrap_or_else(|| R::reduce(hash, self.table.bucket_count()))
    }

    /// Returns 1 if bucket `index` holds a value, otherwise 0.
    pub fn bucket_size(&self, index: usize) -> usize {
        self.table.bucket_size(index)
    }

    /// Adds a value to the set unless an equal value is already present.
    ///
    /// Returns a handle to the stored value and whether it was inserted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use probe_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// assert!(set.insert(1).1);
    /// assert!(!set.insert(1).1);
    /// assert_eq!(set.len(), 1);
    /// # }
    /// ```
    pub fn insert(&mut self, value: T) -> (Ptr, bool) {
        let hash = self.hash_builder.hash_one(&value);
        let entry = self.table.entry(hash, |v| v == &value);
        let ptr = entry.ptr();
        match entry {
            TableEntry::Occupied(_) => (ptr, false),
            TableEntry::Vacant(entry) => {
                entry.insert(value);
                (ptr, true)
            }
        }
    }

    /// Like [`insert`](Self::insert), but returns `hint` directly if it
    /// refers to a value equal to `value`.
    pub fn insert_with_hint(&mut self, hint: Ptr, value: T) -> Ptr {
        if self.ptr_get(hint).is_some_and(|v| v == &value) {
            return hint;
        }
        self.insert(value).0
    }

    /// Adds a value to the set, replacing the existing value, if any, that is
    /// equal to the given one. Returns the replaced value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use probe_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// assert_eq!(set.replace(1), Some(1));
    /// assert_eq!(set.replace(2), None);
    /// assert_eq!(set.len(), 2);
    /// # }
    /// ```
    pub fn replace(&mut self, value: T) -> Option<T> {
        let hash = self.hash_builder.hash_one(&value);
        match self.table.entry(hash, |v| v == &value) {
            TableEntry::Occupied(mut entry) => Some(core::mem::replace(entry.get_mut(), value)),
            TableEntry::Vacant(entry) => {
                entry.insert(value);
                None
            }
        }
    }

    /// Returns a reference to the value in the set, if any, that is equal to
    /// the given value.
    pub fn get(&self, value: &T) -> Option<&T> {
        let hash = self.hash_builder.hash_one(value);
        self.table.find(hash, |v| v == value)
    }

    /// Returns a handle to the stored value equal to `value`.
    pub fn find(&self, value: &T) -> Option<Ptr> {
        let hash = self.hash_builder.hash_one(value);
        self.table.find_ptr(hash, |v| v == value)
    }

    /// Returns `true` if the set contains a value.
    pub fn contains(&self, value: &T) -> bool {
        self.find(value).is_some()
    }

    /// Returns the number of values equal to `value`: 0 or 1.
    pub fn count(&self, value: &T) -> usize {
        self.contains(value) as usize
    }

    /// Removes a value from the set. Returns whether the value was present.
    pub fn remove(&mut self, value: &T) -> bool {
        self.take(value).is_some()
    }

    /// Removes and returns the value in the set, if any, that is equal to the
    /// given one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use probe_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// assert_eq!(set.take(&1), Some(1));
    /// assert_eq!(set.take(&1), None);
    /// # }
    /// ```
    pub fn take(&mut self, value: &T) -> Option<T> {
        let hash = self.hash_builder.hash_one(value);
        self.table.remove(hash, |v| v == value)
    }

    /// Removes `value`, returning the number of values removed: 0 or 1.
    pub fn erase(&mut self, value: &T) -> usize {
        self.remove(value) as usize
    }

    /// Removes the value `ptr` refers to, returning it and a handle to the
    /// value after it in traversal order.
    pub fn remove_ptr(&mut self, ptr: Ptr) -> Option<(T, Option<Ptr>)> {
        self.table.remove_ptr(ptr)
    }

    /// Removes the values from `first` up to, but not including, `last`.
    /// `None` stands for the end of the traversal.
    pub fn remove_range(&mut self, first: Ptr, last: Option<Ptr>) -> usize {
        self.table.remove_range(first, last)
    }

    /// Retains only the elements specified by the predicate, visiting them in
    /// traversal order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use probe_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// set.insert(2);
    /// set.insert(3);
    /// set.insert(4);
    ///
    /// set.retain(|&x| x % 2 == 0);
    /// assert_eq!(set.len(), 2);
    /// assert!(set.contains(&2));
    /// assert!(set.contains(&4));
    /// # }
    /// ```
    pub fn retain(&mut self, mut f: impl FnMut(&T) -> bool) {
        self.table.retain(|v| f(v));
    }

    /// Returns the value `ptr` refers to.
    pub fn ptr_get(&self, ptr: Ptr) -> Option<&T> {
        self.table.get_ptr(ptr)
    }

    /// Returns a handle to the first value in traversal order.
    pub fn first(&self) -> Option<Ptr> {
        self.table.first()
    }

    /// Rebuilds the table with at least `bucket_count` buckets, reversing the
    /// traversal order.
    pub fn rehash(&mut self, bucket_count: usize) {
        self.table.rehash(bucket_count);
    }

    /// Reserves capacity for at least `additional` more values.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Shrinks the table as much as the load factor allows.
    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit();
    }

    /// Clears the set, removing all values. The bucket count is kept.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns `true` if `self` has no elements in common with `other`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use probe_hash::HashSet;
    ///
    /// let a: HashSet<i32> = [1, 2, 3].into();
    /// let b: HashSet<i32> = [4, 5].into();
    /// assert!(a.is_disjoint(&b));
    /// # }
    /// ```
    pub fn is_disjoint(&self, other: &Self) -> bool {
        if self.len() <= other.len() {
            self.iter().all(|v| !other.contains(v))
        } else {
            other.iter().all(|v| !self.contains(v))
        }
    }

    /// Returns `true` if every element of `self` is in `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|v| other.contains(v))
    }

    /// Returns `true` if every element of `other` is in `self`.
    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }

    /// Returns an iterator over the values in `self` or `other`, without
    /// duplicates.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use probe_hash::HashSet;
    ///
    /// let a: HashSet<i32> = [1, 2].into();
    /// let b: HashSet<i32> = [2, 3].into();
    ///
    /// let union: Vec<_> = a.union(&b).copied().collect();
    /// assert_eq!(union.len(), 3);
    /// # }
    /// ```
    pub fn union<'a>(&'a self, other: &'a Self) -> Union<'a, T, S, P, R, G> {
        Union {
            iter: self.iter(),
            other_iter: other.iter(),
            first: self,
        }
    }

    /// Returns an iterator over the values in both `self` and `other`.
    pub fn intersection<'a>(&'a self, other: &'a Self) -> Intersection<'a, T, S, P, R, G> {
        if self.len() <= other.len() {
            Intersection {
                iter: self.iter(),
                other,
            }
        } else {
            Intersection {
                iter: other.iter(),
                other: self,
            }
        }
    }

    /// Returns an iterator over the values in `self` but not in `other`.
    pub fn difference<'a>(&'a self, other: &'a Self) -> Difference<'a, T, S, P, R, G> {
        Difference {
            iter: self.iter(),
            other,
        }
    }

    /// Returns an iterator over the values in exactly one of `self` and
    /// `other`.
    pub fn symmetric_difference<'a>(
        &'a self,
        other: &'a Self,
    ) -> SymmetricDifference<'a, T, S, P, R, G> {
        SymmetricDifference {
            iter: self.difference(other).chain(other.difference(self)),
        }
    }

    /// Returns utilization statistics of the underlying table.
    ///
    /// Requires the `stats` feature.
    #[cfg(feature = "stats")]
    pub fn debug_stats(&self) -> hash_table::DebugStats {
        self.table.debug_stats()
    }
}

impl<T, S, P, R, G> Default for HashSet<T, S, P, R, G>
where
    S: Default,
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
    fn default() -> Self {
        Self::with_policies(0, S::default())
    }
}

impl<T, S, P, R, G> Extend<T> for HashSet<T, S, P, R, G>
where
    T: Hash + Eq,
    S: BuildHasher,
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let reserve = if self.is_empty() {
            iter.size_hint().0
        } else {
            iter.size_hint().0.div_ceil(2)
        };
        self.reserve(reserve);
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T, S, P, R, G> FromIterator<T> for HashSet<T, S, P, R, G>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<T, S, P, R, G, const N: usize> From<[T; N]> for HashSet<T, S, P, R, G>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
    fn from(values: [T; N]) -> Self {
        let mut set = Self::with_policies(N, S::default());
        for value in values {
            set.insert(value);
        }
        set
    }
}

impl<T, S, P, R, G> IntoIterator for HashSet<T, S, P, R, G> {
    type IntoIter = IntoIter<T>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, T, S, P, R, G> IntoIterator for &'a HashSet<T, S, P, R, G> {
    type IntoIter = Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the values of a `HashSet`.
pub struct Iter<'a, T> {
    inner: hash_table::Iter<'a, T>,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// An iterator over the tail of a `HashSet`'s traversal order.
pub struct IterFrom<'a, T> {
    inner: hash_table::IterFrom<'a, T>,
}

impl<T> Clone for IterFrom<'_, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, T> Iterator for IterFrom<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// A draining iterator over the values of a `HashSet`.
pub struct Drain<'a, T, P = LinearProbing, R = MaskRangeHashing, G = Power2RehashPolicy> {
    inner: hash_table::Drain<'a, T, P, R, G>,
}

impl<T, P, R, G> Iterator for Drain<'_, T, P, R, G> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, P, R, G> ExactSizeIterator for Drain<'_, T, P, R, G> {}

/// An owning iterator over the values of a `HashSet`.
pub struct IntoIter<T> {
    inner: hash_table::IntoIter<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

/// An iterator over the union of two sets.
pub struct Union<'a, T, S, P = LinearProbing, R = MaskRangeHashing, G = Power2RehashPolicy> {
    iter: Iter<'a, T>,
    other_iter: Iter<'a, T>,
    first: &'a HashSet<T, S, P, R, G>,
}

impl<'a, T, S, P, R, G> Iterator for Union<'a, T, S, P, R, G>
where
    T: Hash + Eq,
    S: BuildHasher,
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(v) = self.iter.next() {
            return Some(v);
        }
        loop {
            let v = self.other_iter.next()?;
            if !self.first.contains(v) {
                return Some(v);
            }
        }
    }
}

/// An iterator over the intersection of two sets.
pub struct Intersection<'a, T, S, P = LinearProbing, R = MaskRangeHashing, G = Power2RehashPolicy>
{
    iter: Iter<'a, T>,
    other: &'a HashSet<T, S, P, R, G>,
}

impl<'a, T, S, P, R, G> Iterator for Intersection<'a, T, S, P, R, G>
where
    T: Hash + Eq,
    S: BuildHasher,
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let v = self.iter.next()?;
            if self.other.contains(v) {
                return Some(v);
            }
        }
    }
}

/// An iterator over the difference of two sets.
pub struct Difference<'a, T, S, P = LinearProbing, R = MaskRangeHashing, G = Power2RehashPolicy> {
    iter: Iter<'a, T>,
    other: &'a HashSet<T, S, P, R, G>,
}

impl<'a, T, S, P, R, G> Iterator for Difference<'a, T, S, P, R, G>
where
    T: Hash + Eq,
    S: BuildHasher,
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let v = self.iter.next()?;
            if !self.other.contains(v) {
                return Some(v);
            }
        }
    }
}

/// An iterator over the symmetric difference of two sets.
pub struct SymmetricDifference<
    'a,
    T,
    S,
    P = LinearProbing,
    R = MaskRangeHashing,
    G = Power2RehashPolicy,
> {
    iter: core::iter::Chain<Difference<'a, T, S, P, R, G>, Difference<'a, T, S, P, R, G>>,
}

impl<'a, T, S, P, R, G> Iterator for SymmetricDifference<'a, T, S, P, R, G>
where
    T: Hash + Eq,
    S: BuildHasher,
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }
}
