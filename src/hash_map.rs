use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::ops::Index;

use crate::DefaultHashBuilder;
use crate::KeyNotFound;
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

/// A hash map implemented using the open-addressing [`HashTable`] as the
/// underlying storage.
///
/// `HashMap<K, V, S>` stores key-value pairs where keys implement `Hash + Eq`
/// and uses a configurable hasher builder `S` to hash keys. The remaining
/// parameters select the probing, range-reduction and rehash policies; the
/// defaults give linear probing over a power-of-two table kept at most half
/// full.
///
/// Iteration visits entries most recently inserted first. Every rehash
/// reverses that order, so callers should treat iteration order as
/// unspecified across insertions that may grow the table.
///
/// # Performance Characteristics
///
/// - **Memory**: one slot per bucket, each the size of `(K, V)` plus a cached
///   u64 hash and two link indices. At most half of the buckets are occupied.
/// - **Removal**: leaves a tombstone. Tombstones are dropped when the table is
///   rebuilt, which also happens without growth once live entries and
///   tombstones together would exceed the load factor.
pub struct HashMap<
    K,
    V,
    S = DefaultHashBuilder,
    P = LinearProbing,
    R = MaskRangeHashing,
    G = Power2RehashPolicy,
> {
    table: HashTable<(K, V), P, R, G>,
    hash_builder: S,
}

impl<K, V, S, P, R, G> Clone for HashMap<K, V, S, P, R, G>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<K, V, S, P, R, G> Debug for HashMap<K, V, S, P, R, G>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// Creates a new hash map with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasherDefault;
    /// # use siphasher::sip::SipHasher;
    /// use probe_hash::HashMap;
    ///
    /// type Sip = BuildHasherDefault<SipHasher>;
    ///
    /// let map: HashMap<i32, String, _> = HashMap::with_hasher(Sip::default());
    /// assert!(map.is_empty());
    /// assert_eq!(map.bucket_count(), 64);
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_policies(0, hash_builder)
    }

    /// Creates a new hash map sized for `capacity` entries, with the given
    /// hasher builder.
    ///
    /// The table gets twice as many buckets as requested, rounded up to a
    /// power of two and never fewer than 64.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasherDefault;
    /// # use siphasher::sip::SipHasher;
    /// use probe_hash::HashMap;
    ///
    /// type Sip = BuildHasherDefault<SipHasher>;
    ///
    /// let map: HashMap<i32, String, _> = HashMap::with_capacity_and_hasher(100, Sip::default());
    /// assert!(map.capacity() >= 100);
    /// assert_eq!(map.bucket_count(), 256);
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self::with_policies(capacity, hash_builder)
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    S: Default,
{
    /// Creates a new hash map using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasherDefault;
    /// # use siphasher::sip::SipHasher;
    /// use probe_hash::HashMap;
    ///
    /// type Sip = BuildHasherDefault<SipHasher>;
    ///
    /// let map: HashMap<i32, String, Sip> = HashMap::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates a new hash map sized for `capacity` entries using the default
    /// hasher builder.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<K, V, S, P, R, G> HashMap<K, V, S, P, R, G> {
    /// Creates a map whose policies are chosen through its type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasherDefault;
    /// # use siphasher::sip::SipHasher;
    /// use probe_hash::HashMap;
    /// use probe_hash::QuadraticProbing;
    ///
    /// type Sip = BuildHasherDefault<SipHasher>;
    ///
    /// let mut map: HashMap<u32, &str, Sip, QuadraticProbing> =
    ///     HashMap::with_policies(10, Sip::default());
    /// map.insert(1, "one");
    /// assert_eq!(map.get(&1), Some(&"one"));
    /// ```
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

    /// Returns a reference to the map's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns an iterator over the key-value pairs of the map.
    ///
    /// The most recently inserted entry comes first.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasherDefault;
    /// # use siphasher::sip::SipHasher;
    /// use probe_hash::HashMap;
    ///
    /// type Sip = BuildHasherDefault<SipHasher>;
    ///
    /// let mut map = HashMap::with_hasher(Sip::default());
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    ///
    /// let pairs: Vec<_> = map.iter().collect();
    /// assert_eq!(pairs, [(&2, &"b"), (&1, &"a")]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator starting at the entry `ptr` refers to and running
    /// to the end of the traversal order.
    pub fn iter_from(&self, ptr: Ptr) -> IterFrom<'_, K, V> {
        IterFrom {
            inner: self.table.iter_from(ptr),
        }
    }

    /// Returns an iterator over the entries with mutable references to the
    /// values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }

    /// Returns an iterator over the keys of the map.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values of the map.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable references to the values of the map.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Removes all entries, returning them as an iterator. The map is empty
    /// once the iterator is dropped.
    pub fn drain(&mut self) -> Drain<'_, K, V, P, R, G> {
        Drain {
            inner: self.table.drain(),
        }
    }
}

impl<K, V, S, P, R, G> HashMap<K, V, S, P, R, G>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of entries the map can hold before it grows.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the number of buckets in the underlying table.
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Returns the current ratio of entries to buckets.
    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }

    /// Returns the load factor the map grows to stay under.
    pub fn max_load_factor(&self) -> f32 {
        self.table.max_load_factor()
    }

    /// Returns the bucket `key` currently resolves to: its own bucket if
    /// present, otherwise the bucket an insertion would use.
    ///
    /// Intended for inspection and testing.
    pub fn bucket(&self, key: &K) -> usize {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .insertion_slot(hash, |(k, _)| k == key)
            .unwrap_or_else(|| R::reduce(hash, self.table.bucket_count()))
    }

    /// Returns 1 if bucket `index` holds an entry, otherwise 0.
    pub fn bucket_size(&self, index: usize) -> usize {
        self.table.bucket_size(index)
    }

    /// Inserts a key-value pair unless the key is already present.
    ///
    /// Returns a handle to the entry for `key` and whether an insertion
    /// happened. An existing value is left untouched; use
    /// [`insert_or_assign`](Self::insert_or_assign) to overwrite it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasherDefault;
    /// # use siphasher::sip::SipHasher;
    /// use probe_hash::HashMap;
    ///
    /// type Sip = BuildHasherDefault<SipHasher>;
    ///
    /// let mut map = HashMap::with_hasher(Sip::default());
    /// let (first, inserted) = map.insert(37, "a");
    /// assert!(inserted);
    ///
    /// let (again, inserted) = map.insert(37, "b");
    /// assert!(!inserted);
    /// assert_eq!(first, again);
    /// assert_eq!(map.get(&37), Some(&"a"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> (Ptr, bool) {
        let hash = self.hash_builder.hash_one(&key);
        let entry = self.table.entry(hash, |(k, _)| k == &key);
        let ptr = entry.ptr();
        match entry {
            TableEntry::Occupied(_) => (ptr, false),
            TableEntry::Vacant(entry) => {
                entry.insert((key, value));
                (ptr, true)
            }
        }
    }

    /// Inserts a key-value pair, overwriting the value if the key is already
    /// present.
    ///
    /// Returns a handle to the entry and whether a new entry was created.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasherDefault;
    /// # use siphasher::sip::SipHasher;
    /// use probe_hash::HashMap;
    ///
    /// type Sip = BuildHasherDefault<SipHasher>;
    ///
    /// let mut map = HashMap::with_hasher(Sip::default());
    /// assert!(map.insert_or_assign(37, "a").1);
    /// assert!(!map.insert_or_assign(37, "b").1);
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// ```
    pub fn insert_or_assign(&mut self, key: K, value: V) -> (Ptr, bool) {
        let hash = self.hash_builder.hash_one(&key);
        let entry = self.table.entry(hash, |(k, _)| k == &key);
        let ptr = entry.ptr();
        match entry {
            TableEntry::Occupied(mut entry) => {
                entry.get_mut().1 = value;
                (ptr, false)
            }
            TableEntry::Vacant(entry) => {
                entry.insert((key, value));
                (ptr, true)
            }
        }
    }

    /// Like [`insert`](Self::insert), but if `hint` refers to an entry with
    /// an equal key that entry is returned without hashing or probing.
    pub fn insert_with_hint(&mut self, hint: Ptr, key: K, value: V) -> Ptr {
        if self.ptr_get(hint).is_some_and(|(k, _)| k == &key) {
            return hint;
        }
        self.insert(key, value).0
    }

    /// Like [`insert_or_assign`](Self::insert_or_assign), but if `hint`
    /// refers to an entry with an equal key its value is overwritten without
    /// hashing or probing.
    pub fn insert_or_assign_with_hint(&mut self, hint: Ptr, key: K, value: V) -> Ptr {
        if let Some((k, v)) = self.table.get_ptr_mut(hint)
            && *k == key
        {
            *v = value;
            return hint;
        }
        self.insert_or_assign(key, value).0
    }

    /// Gets the entry for `key` for in-place manipulation.
    ///
    /// Like every insertion path, this may grow the table first, even when
    /// the key turns out to be present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasherDefault;
    /// # use siphasher::sip::SipHasher;
    /// use probe_hash::HashMap;
    ///
    /// type Sip = BuildHasherDefault<SipHasher>;
    ///
    /// let mut words = HashMap::with_hasher(Sip::default());
    /// for word in ["a", "b", "a", "c", "a"] {
    ///     *words.entry(word).or_insert(0) += 1;
    /// }
    /// assert_eq!(words.get(&"a"), Some(&3));
    /// assert_eq!(words.get(&"c"), Some(&1));
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, P, R, G> {
        let hash = self.hash_builder.hash_one(&key);
        match self.table.entry(hash, |(k, _)| k == &key) {
            TableEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry { entry }),
            TableEntry::Vacant(entry) => Entry::Vacant(VacantEntry { entry, key }),
        }
    }

    /// Returns a mutable reference to the value for `key`, inserting
    /// `V::default()` first if the key is absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.entry(key).or_default()
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find_mut(hash, |(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Returns the stored key and its value.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find(hash, |(k, _)| k == key)
            .map(|(k, v)| (k, v))
    }

    /// Returns a handle to the entry for `key`.
    pub fn find(&self, key: &K) -> Option<Ptr> {
        let hash = self.hash_builder.hash_one(key);
        self.table.find_ptr(hash, |(k, _)| k == key)
    }

    /// Returns `true` if the map contains a value for the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Returns the number of entries with key `key`: 0 or 1.
    pub fn count(&self, key: &K) -> usize {
        self.contains_key(key) as usize
    }

    /// Returns the value for a key that must be present.
    ///
    /// # Errors
    ///
    /// Returns [`KeyNotFound`] if the map has no entry for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasherDefault;
    /// # use siphasher::sip::SipHasher;
    /// use probe_hash::HashMap;
    /// use probe_hash::KeyNotFound;
    ///
    /// type Sip = BuildHasherDefault<SipHasher>;
    ///
    /// let mut map = HashMap::with_hasher(Sip::default());
    /// map.insert("x", 1);
    /// assert_eq!(map.at(&"x"), Ok(&1));
    /// assert_eq!(map.at(&"y"), Err(KeyNotFound));
    /// ```
    pub fn at(&self, key: &K) -> Result<&V, KeyNotFound> {
        self.get(key).ok_or(KeyNotFound)
    }

    /// Mutable counterpart of [`at`](Self::at).
    ///
    /// # Errors
    ///
    /// Returns [`KeyNotFound`] if the map has no entry for `key`.
    pub fn at_mut(&mut self, key: &K) -> Result<&mut V, KeyNotFound> {
        self.get_mut(key).ok_or(KeyNotFound)
    }

    /// Removes a key from the map, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes a key from the map, returning the stored key and value.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let hash = self.hash_builder.hash_one(key);
        self.table.remove(hash, |(k, _)| k == key)
    }

    /// Removes `key`, returning the number of entries removed: 0 or 1.
    pub fn erase(&mut self, key: &K) -> usize {
        self.remove_entry(key).is_some() as usize
    }

    /// Removes the entry `ptr` refers to. Returns the entry and a handle to
    /// the one after it in traversal order.
    ///
    /// Handles to all other entries remain valid.
    pub fn remove_ptr(&mut self, ptr: Ptr) -> Option<((K, V), Option<Ptr>)> {
        self.table.remove_ptr(ptr)
    }

    /// Removes the entries from `first` up to, but not including, `last` in
    /// traversal order, where `None` stands for the end. Returns the number
    /// of entries removed.
    pub fn remove_range(&mut self, first: Ptr, last: Option<Ptr>) -> usize {
        self.table.remove_range(first, last)
    }

    /// Retains only the entries for which `f` returns `true`.
    pub fn retain(&mut self, mut f: impl FnMut(&K, &mut V) -> bool) {
        self.table.retain(|(k, v)| f(k, v));
    }

    /// Returns the entry `ptr` refers to, or `None` if its bucket is not
    /// occupied.
    pub fn ptr_get(&self, ptr: Ptr) -> Option<(&K, &V)> {
        self.table.get_ptr(ptr).map(|(k, v)| (k, v))
    }

    /// Returns the entry `ptr` refers to, with a mutable value.
    pub fn ptr_get_mut(&mut self, ptr: Ptr) -> Option<(&K, &mut V)> {
        self.table.get_ptr_mut(ptr).map(|(k, v)| (&*k, v))
    }

    /// Returns a handle to the first entry in traversal order.
    pub fn first(&self) -> Option<Ptr> {
        self.table.first()
    }

    /// Rebuilds the table with at least `bucket_count` buckets. The table
    /// never shrinks here, and the traversal order is reversed.
    pub fn rehash(&mut self, bucket_count: usize) {
        self.table.rehash(bucket_count);
    }

    /// Reserves capacity for at least `additional` more entries.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Shrinks the table as much as possible while keeping the load factor,
    /// dropping all tombstones.
    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit();
    }

    /// Clears the map, removing all key-value pairs. The bucket count is kept.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns utilization statistics of the underlying table.
    ///
    /// Requires the `stats` feature.
    #[cfg(feature = "stats")]
    pub fn debug_stats(&self) -> hash_table::DebugStats {
        self.table.debug_stats()
    }

    /// Returns the probe distance histogram of the underlying table.
    ///
    /// Requires the `stats` feature.
    #[cfg(feature = "stats")]
    pub fn probe_histogram(&self) -> alloc::vec::Vec<usize> {
        self.table.probe_histogram()
    }
}

impl<K, V, S, P, R, G> Default for HashMap<K, V, S, P, R, G>
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

impl<K, V, S, P, R, G> PartialEq for HashMap<K, V, S, P, R, G>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|other_v| v == other_v))
    }
}

impl<K, V, S, P, R, G> Eq for HashMap<K, V, S, P, R, G>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
}

impl<K, V, S, P, R, G> Index<&K> for HashMap<K, V, S, P, R, G>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index(&self, key: &K) -> &V {
        match self.at(key) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<K, V, S, P, R, G> Extend<(K, V)> for HashMap<K, V, S, P, R, G>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        let iter = iter.into_iter();
        let reserve = if self.is_empty() {
            iter.size_hint().0
        } else {
            iter.size_hint().0.div_ceil(2)
        };
        self.reserve(reserve);
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S, P, R, G> FromIterator<(K, V)> for HashMap<K, V, S, P, R, G>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, S, P, R, G, const N: usize> From<[(K, V); N]> for HashMap<K, V, S, P, R, G>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
    fn from(entries: [(K, V); N]) -> Self {
        let mut map = Self::with_policies(N, S::default());
        for (k, v) in entries {
            map.insert(k, v);
        }
        map
    }
}

impl<K, V, S, P, R, G> IntoIterator for HashMap<K, V, S, P, R, G> {
    type IntoIter = IntoIter<K, V>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, K, V, S, P, R, G> IntoIterator for &'a HashMap<K, V, S, P, R, G> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S, P, R, G> IntoIterator for &'a mut HashMap<K, V, S, P, R, G> {
    type IntoIter = IterMut<'a, K, V>;
    type Item = (&'a K, &'a mut V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// A view into a single entry in the map, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashMap`].
///
/// [`entry`]: HashMap::entry
pub enum Entry<'a, K, V, P = LinearProbing, R = MaskRangeHashing, G = Power2RehashPolicy> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V, P, R, G>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V, P, R, G>),
}

impl<'a, K, V, P, R, G> Entry<'a, K, V, P, R, G> {
    /// Inserts a default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }

    /// Returns a handle to the bucket of this entry.
    pub fn ptr(&self) -> Ptr {
        match self {
            Entry::Occupied(entry) => entry.ptr(),
            Entry::Vacant(entry) => entry.ptr(),
        }
    }
}

impl<'a, K, V, P, R, G> Entry<'a, K, V, P, R, G>
where
    V: Default,
{
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the map.
pub struct VacantEntry<'a, K, V, P = LinearProbing, R = MaskRangeHashing, G = Power2RehashPolicy>
{
    entry: hash_table::VacantEntry<'a, (K, V), P, R, G>,
    key: K,
}

impl<'a, K, V, P, R, G> VacantEntry<'a, K, V, P, R, G> {
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value into the map and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        &mut self.entry.insert((self.key, value)).1
    }

    /// Returns a handle to the bucket the entry will be stored in.
    pub fn ptr(&self) -> Ptr {
        self.entry.ptr()
    }
}

/// A view into an occupied entry in the map.
pub struct OccupiedEntry<'a, K, V, P = LinearProbing, R = MaskRangeHashing, G = Power2RehashPolicy>
{
    entry: hash_table::OccupiedEntry<'a, (K, V), P, R, G>,
}

impl<'a, K, V, P, R, G> OccupiedEntry<'a, K, V, P, R, G> {
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.entry.get().0
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.entry.get().1
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.entry.get_mut().1
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.entry.into_mut().1
    }

    /// Inserts a value into the entry and returns the old value.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(&mut self.entry.get_mut().1, value)
    }

    /// Removes the entry from the map and returns the value.
    pub fn remove(self) -> V {
        self.entry.remove().1
    }

    /// Removes the entry from the map and returns the key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.entry.remove()
    }

    /// Returns a handle to the entry's bucket.
    pub fn ptr(&self) -> Ptr {
        self.entry.ptr()
    }
}

/// An iterator over the key-value pairs of a `HashMap`.
pub struct Iter<'a, K, V> {
    inner: hash_table::Iter<'a, (K, V)>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// An iterator over the tail of a `HashMap`'s traversal order, created by
/// [`HashMap::iter_from`].
pub struct IterFrom<'a, K, V> {
    inner: hash_table::IterFrom<'a, (K, V)>,
}

impl<K, V> Clone for IterFrom<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for IterFrom<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// A mutable iterator over the entries of a `HashMap`.
pub struct IterMut<'a, K, V> {
    inner: hash_table::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (&*k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of a `HashMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// An iterator over the values of a `HashMap`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// A mutable iterator over the values of a `HashMap`.
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

/// A draining iterator over the key-value pairs of a `HashMap`.
pub struct Drain<'a, K, V, P = LinearProbing, R = MaskRangeHashing, G = Power2RehashPolicy> {
    inner: hash_table::Drain<'a, (K, V), P, R, G>,
}

impl<K, V, P, R, G> Iterator for Drain<'_, K, V, P, R, G> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, P, R, G> ExactSizeIterator for Drain<'_, K, V, P, R, G> {}

/// An owning iterator over the entries of a `HashMap`.
pub struct IntoIter<K, V> {
    inner: hash_table::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::hash::BuildHasher;
    use core::hash::Hasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::policy::QuadraticProbing;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k1: rng.try_next_u64().unwrap_or(0),
                k2: rng.try_next_u64().unwrap_or(0),
            }
        }
    }

    type TestMap<K, V> = HashMap<K, V, SipHashBuilder>;

    /// Hashes integers to themselves so bucket placement is predictable.
    #[derive(Clone, Default)]
    struct IdentityHashBuilder;

    struct IdentityHasher(u64);

    impl Hasher for IdentityHasher {
        fn finish(&self) -> u64 {
            self.0
        }

        fn write(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.0 = (self.0 << 8) | b as u64;
            }
        }

        fn write_u32(&mut self, n: u32) {
            self.0 = n as u64;
        }

        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }
    }

    impl BuildHasher for IdentityHashBuilder {
        type Hasher = IdentityHasher;

        fn build_hasher(&self) -> Self::Hasher {
            IdentityHasher(0)
        }
    }

    fn keys_in_order<S, P, R, G>(map: &HashMap<u64, u64, S, P, R, G>) -> Vec<u64> {
        map.keys().copied().collect()
    }

    #[test]
    fn test_new_and_with_hasher() {
        let map: HashMap<i32, String, SipHashBuilder> = HashMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.bucket_count(), 64);

        let map2 = HashMap::<i32, String, _>::with_hasher(SipHashBuilder::default());
        assert!(map2.is_empty());
        assert_eq!(map2.max_load_factor(), 0.5);
    }

    #[test]
    fn test_with_capacity() {
        let map: HashMap<i32, String, SipHashBuilder> = HashMap::with_capacity(100);
        assert!(map.capacity() >= 100);
        assert_eq!(map.bucket_count(), 256);

        let map2 =
            HashMap::<i32, String, _>::with_capacity_and_hasher(200, SipHashBuilder::default());
        assert!(map2.capacity() >= 200);
        assert!(map2.is_empty());
    }

    #[test]
    fn test_insert_does_not_overwrite() {
        let mut map = TestMap::new();

        let (ptr, inserted) = map.insert(1, "hello".to_string());
        assert!(inserted);
        assert_eq!(map.len(), 1);
        assert!(!map.is_empty());

        let (again, inserted) = map.insert(1, "world".to_string());
        assert!(!inserted);
        assert_eq!(ptr, again);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"hello".to_string()));
    }

    #[test]
    fn test_insert_or_assign() {
        let mut map = TestMap::new();
        assert!(map.insert_or_assign(1, "hello".to_string()).1);
        assert!(!map.insert_or_assign(1, "world".to_string()).1);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"world".to_string()));
    }

    #[test]
    fn test_insert_with_hint() {
        let mut map = TestMap::new();
        let (ptr, _) = map.insert(1, 10);

        assert_eq!(map.insert_with_hint(ptr, 1, 99), ptr);
        assert_eq!(map.get(&1), Some(&10));

        assert_eq!(map.insert_or_assign_with_hint(ptr, 1, 20), ptr);
        assert_eq!(map.get(&1), Some(&20));

        let other = map.insert_with_hint(ptr, 2, 30);
        assert_ne!(other, ptr);
        assert_eq!(map.ptr_get(other), Some((&2, &30)));

        let other = map.insert_or_assign_with_hint(ptr, 2, 31);
        assert_eq!(map.ptr_get(other), Some((&2, &31)));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_get_mut() {
        let mut map = TestMap::new();
        map.insert(1, "hello".to_string());

        if let Some(value) = map.get_mut(&1) {
            value.push_str(" world");
        }

        assert_eq!(map.get(&1), Some(&"hello world".to_string()));
        assert_eq!(map.get_mut(&2), None);
    }

    #[test]
    fn test_contains_key_and_count() {
        let mut map = TestMap::new();
        assert!(!map.contains_key(&1));
        assert_eq!(map.count(&1), 0);

        map.insert(1, "value".to_string());
        assert!(map.contains_key(&1));
        assert_eq!(map.count(&1), 1);
        assert!(!map.contains_key(&2));
        assert_eq!(map.get_key_value(&1), Some((&1, &"value".to_string())));
    }

    #[test]
    fn test_at_reports_missing_key() {
        let mut map = TestMap::new();
        map.insert("a", 1);

        assert_eq!(map.at(&"a"), Ok(&1));
        assert_eq!(map.at(&"b"), Err(KeyNotFound));
        *map.at_mut(&"a").unwrap() += 1;
        assert_eq!(map[&"a"], 2);
        assert_eq!(map.at_mut(&"b"), Err(KeyNotFound));
        assert_eq!(KeyNotFound.to_string(), "key not found in map");
    }

    #[test]
    #[should_panic(expected = "key not found in map")]
    fn test_index_missing_key_panics() {
        let map: HashMap<i32, i32, SipHashBuilder> = HashMap::new();
        let _value: i32 = map[&1];
    }

    #[test]
    fn test_remove() {
        let mut map = TestMap::new();
        map.insert(1, "hello".to_string());
        map.insert(2, "world".to_string());

        assert_eq!(map.remove(&1), Some("hello".to_string()));
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key(&1));
        assert!(map.contains_key(&2));
        assert_eq!(map.remove(&1), None);

        assert_eq!(map.remove_entry(&2), Some((2, "world".to_string())));
        assert!(map.is_empty());
    }

    #[test]
    fn test_erase_counts() {
        let mut map = TestMap::new();
        map.insert(5, 5);
        assert_eq!(map.erase(&5), 1);
        assert_eq!(map.erase(&5), 0);
        assert_eq!(map.erase(&6), 0);
        assert!(map.find(&5).is_none());
    }

    #[test]
    fn test_handles_survive_other_erasures() {
        let mut map = TestMap::new();
        for i in 0..20u64 {
            map.insert(i, i * 100);
        }
        let keep = map.find(&7).unwrap();
        for i in (0..20u64).filter(|&i| i != 7) {
            map.erase(&i);
        }
        assert_eq!(map.ptr_get(keep), Some((&7, &700)));
        assert_eq!(map.first(), Some(keep));
    }

    #[test]
    fn test_remove_ptr_and_range() {
        let mut map = TestMap::new();
        for i in 1..=5u64 {
            map.insert(i, i);
        }
        // traversal: 5 4 3 2 1
        let four = map.find(&4).unwrap();
        let (entry, next) = map.remove_ptr(four).unwrap();
        assert_eq!(entry, (4, 4));
        assert_eq!(next, map.find(&3));
        assert!(map.remove_ptr(four).is_none());

        let three = map.find(&3).unwrap();
        let one = map.find(&1).unwrap();
        assert_eq!(map.remove_range(three, Some(one)), 2);
        assert_eq!(keys_in_order(&map), [5, 1]);
    }

    #[test]
    fn test_iter_from() {
        let mut map = TestMap::new();
        for i in 1..=4u64 {
            map.insert(i, i);
        }
        let ptr = map.find(&2).unwrap();
        let rest: Vec<u64> = map.iter_from(ptr).map(|(k, _)| *k).collect();
        assert_eq!(rest, [2, 1]);
    }

    #[test]
    fn test_iterator_lengths() {
        let mut map = TestMap::new();
        for i in 0..10u64 {
            map.insert(i, i);
        }
        map.erase(&3);

        assert_eq!(map.iter().len(), 9);
        assert_eq!(map.keys().len(), 9);
        assert_eq!(map.values().len(), 9);
        assert_eq!(map.values_mut().len(), 9);
        assert_eq!(map.iter_mut().len(), 9);

        let mut iter = map.iter();
        iter.next();
        assert_eq!(iter.len(), 8);

        let mut drain = map.drain();
        assert_eq!(drain.len(), 9);
        drain.next();
        assert_eq!(drain.len(), 8);
    }

    #[test]
    fn test_entry_api() {
        let mut map = TestMap::new();

        let value = map.entry(1).or_insert("default".to_string());
        assert_eq!(value, &"default".to_string());

        let value = map.entry(1).or_insert("other".to_string());
        assert_eq!(value, &"default".to_string());

        let value = map.entry(2).or_insert_with(|| "computed".to_string());
        assert_eq!(value, &"computed".to_string());

        map.entry(1).and_modify(|v| v.push_str("_modified"));
        assert_eq!(map.get(&1), Some(&"default_modified".to_string()));

        assert_eq!(map.entry(3).key(), &3);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_entry_or_default() {
        let mut map: HashMap<i32, Vec<i32>, SipHashBuilder> = HashMap::new();
        map.entry(1).or_default().push(42);
        map.entry(1).or_default().push(43);
        assert_eq!(map.get(&1), Some(&vec![42, 43]));

        *map.get_or_insert_default(2) = vec![7];
        map.get_or_insert_default(2).push(8);
        assert_eq!(map.get(&2), Some(&vec![7, 8]));
    }

    #[test]
    fn test_occupied_entry() {
        let mut map = TestMap::new();
        let (ptr, _) = map.insert(1, "hello".to_string());

        match map.entry(1) {
            Entry::Occupied(mut entry) => {
                assert_eq!(entry.key(), &1);
                assert_eq!(entry.get(), &"hello".to_string());
                assert_eq!(entry.ptr(), ptr);

                entry.get_mut().push_str(" world");
                let old = entry.insert("replaced".to_string());
                assert_eq!(old, "hello world".to_string());
                assert_eq!(entry.remove_entry(), (1, "replaced".to_string()));
            }
            Entry::Vacant(_) => panic!("Expected occupied entry"),
        }

        assert!(map.is_empty());
    }

    #[test]
    fn test_vacant_entry() {
        let mut map = TestMap::new();

        let ptr = match map.entry(1) {
            Entry::Vacant(entry) => {
                assert_eq!(entry.key(), &1);
                let ptr = entry.ptr();
                let value = entry.insert("hello".to_string());
                assert_eq!(value, &"hello".to_string());
                ptr
            }
            Entry::Occupied(_) => panic!("Expected vacant entry"),
        };

        assert_eq!(map.find(&1), Some(ptr));
        assert_eq!(map.ptr_get(ptr), Some((&1, &"hello".to_string())));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_iteration_is_most_recent_first() {
        let mut map = TestMap::new();
        map.insert('A', 1);
        map.insert('B', 2);
        map.insert('C', 3);

        let order: Vec<char> = map.keys().copied().collect();
        assert_eq!(order, ['C', 'B', 'A']);

        map.rehash(0);
        let order: Vec<char> = map.keys().copied().collect();
        assert_eq!(order, ['A', 'B', 'C']);
        assert_eq!(map.bucket_count(), 64);
    }

    #[test]
    fn test_growth_at_threshold() {
        let mut map = TestMap::new();
        for i in 1..=32u64 {
            map.insert(i, i * 10);
        }
        assert_eq!(map.bucket_count(), 64);

        map.insert(33, 330);
        assert_eq!(map.bucket_count(), 128);
        assert!(map.load_factor() <= 0.5);
        for i in 1..=33u64 {
            assert_eq!(map.get(&i), Some(&(i * 10)));
        }
    }

    #[test]
    fn test_equality_ignores_order() {
        let mut forward = TestMap::new();
        let mut backward = TestMap::new();
        for i in 0..50u64 {
            forward.insert(i, i * 3);
        }
        for i in (0..50u64).rev() {
            backward.insert(i, i * 3);
        }

        assert_ne!(keys_in_order(&forward), keys_in_order(&backward));
        assert_eq!(forward, backward);

        backward.insert_or_assign(10, 0);
        assert_ne!(forward, backward);
        backward.insert_or_assign(10, 30);
        backward.erase(&11);
        assert_ne!(forward, backward);
    }

    #[test]
    fn test_iterators() {
        let mut map = TestMap::new();
        map.insert(1, "one".to_string());
        map.insert(2, "two".to_string());
        map.insert(3, "three".to_string());

        let pairs: Vec<(i32, String)> = map.iter().map(|(k, v)| (*k, v.clone())).collect();
        assert_eq!(
            pairs,
            [
                (3, "three".to_string()),
                (2, "two".to_string()),
                (1, "one".to_string())
            ]
        );

        let keys: Vec<i32> = map.keys().copied().collect();
        assert_eq!(keys, [3, 2, 1]);

        let values: Vec<&String> = map.values().collect();
        assert_eq!(values.len(), 3);
        assert_eq!(map.iter().size_hint(), (3, Some(3)));

        let mut seen = 0;
        for (_, v) in &map {
            assert!(!v.is_empty());
            seen += 1;
        }
        assert_eq!(seen, 3);
    }

    #[test]
    fn test_iter_mut_and_values_mut() {
        let mut map = TestMap::new();
        for i in 0..10u64 {
            map.insert(i, i);
        }
        for (k, v) in map.iter_mut() {
            *v += *k;
        }
        for v in map.values_mut() {
            *v += 1;
        }
        for (_, v) in &mut map {
            *v *= 10;
        }
        for i in 0..10u64 {
            assert_eq!(map.get(&i), Some(&((2 * i + 1) * 10)));
        }
    }

    #[test]
    fn test_drain() {
        let mut map = TestMap::new();
        map.insert(1, "one".to_string());
        map.insert(2, "two".to_string());
        map.insert(3, "three".to_string());

        let drained: Vec<(i32, String)> = map.drain().collect();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0], (3, "three".to_string()));
        assert!(map.is_empty());

        map.insert(4, "four".to_string());
        assert_eq!(map.get(&4), Some(&"four".to_string()));
    }

    #[test]
    fn test_into_iter() {
        let mut map = TestMap::new();
        map.insert(1, 'a');
        map.insert(2, 'b');
        let entries: Vec<(i32, char)> = map.into_iter().collect();
        assert_eq!(entries, [(2, 'b'), (1, 'a')]);
    }

    #[test]
    fn test_retain() {
        let mut map = TestMap::new();
        for i in 0..100u64 {
            map.insert(i, i);
        }
        map.retain(|k, v| {
            *v += 1;
            k % 10 == 0
        });
        assert_eq!(map.len(), 10);
        assert_eq!(map.get(&50), Some(&51));
        assert_eq!(map.get(&51), None);
    }

    #[test]
    fn test_collections() {
        let map: HashMap<u64, &str, SipHashBuilder> = [(1, "a"), (2, "b"), (3, "c")].into();
        assert_eq!(map.len(), 3);
        assert_eq!(map[&2], "b");

        let collected: HashMap<u64, u64, SipHashBuilder> = (0..40).map(|i| (i, i)).collect();
        assert_eq!(collected.len(), 40);
        assert_eq!(collected.bucket_count(), 128);

        let mut extended = collected.clone();
        extended.extend((40..50).map(|i| (i, i)));
        extended.extend([(0, 999)]);
        assert_eq!(extended.len(), 50);
        assert_eq!(extended.get(&0), Some(&0));
    }

    #[test]
    fn test_bucket_diagnostics() {
        let mut map = HashMap::with_hasher(IdentityHashBuilder);
        map.insert(3u64, ());
        map.insert(67u64, ());

        assert_eq!(map.bucket(&3), 3);
        assert_eq!(map.bucket(&67), 4);
        assert_eq!(map.bucket(&131), 5);
        assert_eq!(map.bucket(&10), 10);
        assert_eq!(map.bucket_size(3), 1);
        assert_eq!(map.bucket_size(5), 0);

        map.erase(&3);
        assert_eq!(map.bucket_size(3), 0);
        assert_eq!(map.bucket(&131), 3);
        assert_eq!(map.bucket(&67), 4);
    }

    #[test]
    fn test_quadratic_probing_policy() {
        let mut map: HashMap<u64, u64, IdentityHashBuilder, QuadraticProbing> =
            HashMap::with_policies(0, IdentityHashBuilder);
        for i in 0..4u64 {
            map.insert(64 * i, i);
        }
        assert_eq!(map.bucket(&0), 0);
        assert_eq!(map.bucket(&64), 1);
        assert_eq!(map.bucket(&128), 3);
        assert_eq!(map.bucket(&192), 6);
        for i in 0..4u64 {
            assert_eq!(map.get(&(64 * i)), Some(&i));
        }
    }

    #[test]
    fn test_clear_keeps_buckets() {
        let mut map = TestMap::new();
        for i in 0..100u64 {
            map.insert(i, i);
        }
        let buckets = map.bucket_count();
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.bucket_count(), buckets);
        assert_eq!(map.first(), None);
        assert_eq!(map.get(&5), None);
    }

    #[test]
    fn test_reserve_and_shrink() {
        let mut map = TestMap::new();
        map.reserve(1000);
        assert!(map.capacity() >= 1000);
        map.insert(1, 1);
        map.shrink_to_fit();
        assert_eq!(map.bucket_count(), 64);
        assert_eq!(map.get(&1), Some(&1));

        map.rehash(10);
        assert_eq!(map.bucket_count(), 64);
        map.rehash(300);
        assert_eq!(map.bucket_count(), 512);
    }

    #[test]
    fn test_collision_handling() {
        let mut map = TestMap::new();

        for i in 0..1000 {
            map.insert(i, i * 2);
        }

        assert_eq!(map.len(), 1000);

        for i in 0..1000 {
            assert_eq!(map.get(&i), Some(&(i * 2)));
        }

        for i in (0..1000).step_by(2) {
            assert_eq!(map.remove(&i), Some(i * 2));
        }

        assert_eq!(map.len(), 500);

        for i in (1..1000).step_by(2) {
            assert_eq!(map.get(&i), Some(&(i * 2)));
        }
    }

    #[test]
    fn test_string_keys() {
        let mut map = TestMap::new();

        map.insert("hello".to_string(), 1);
        map.insert("world".to_string(), 2);
        map.insert("rust".to_string(), 3);

        assert_eq!(map.get(&"hello".to_string()), Some(&1));
        assert_eq!(map.get(&"world".to_string()), Some(&2));
        assert_eq!(map.get(&"rust".to_string()), Some(&3));
        assert_eq!(map.get(&"missing".to_string()), None);
    }

    #[test]
    fn test_default_clone_debug() {
        let map: HashMap<i32, String, SipHashBuilder> = HashMap::default();
        assert!(map.is_empty());

        let mut map = TestMap::new();
        map.insert(1, "a");
        map.insert(2, "b");
        let cloned = map.clone();
        assert_eq!(cloned, map);
        assert_eq!(format!("{:?}", cloned), r#"{2: "b", 1: "a"}"#);
    }
}
