//! The open-addressing table shared by [`HashMap`] and [`HashSet`].
//!
//! [`HashMap`]: crate::HashMap
//! [`HashSet`]: crate::HashSet

use alloc::vec::Vec;
use core::fmt::Debug;
use core::marker::PhantomData;

use crate::Ptr;
use crate::policy::CollisionPolicy;
use crate::policy::LinearProbing;
use crate::policy::MaskRangeHashing;
use crate::policy::Power2RehashPolicy;
use crate::policy::RangeHashing;
use crate::policy::RehashPolicy;
use crate::policy::capacity_overflow;
use crate::slot::END;
use crate::slot::Node;
use crate::slot::Slot;

/// Outcome of walking a probe sequence.
enum Probe {
    /// An occupied slot matched.
    Found(usize),
    /// No match. Holds the slot an insertion would use: the first tombstone
    /// passed if one was being tracked, otherwise the terminating empty slot.
    Vacant(usize),
    /// Every slot was visited without a match or an empty slot.
    Saturated,
}

/// Detailed statistics about the state of a [`HashTable`].
///
/// Requires the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of entries in the table
    pub populated: usize,
    /// Total number of slots allocated
    pub buckets: usize,
    /// Number of slots holding a tombstone
    pub tombstones: usize,
    /// Number of slots that were never used since the last rebuild
    pub empty_slots: usize,
    /// Load factor (populated / buckets)
    pub load_factor: f64,
    /// Longest probe distance of any entry
    pub max_probe_length: usize,
    /// Total memory in bytes used by the slot array
    pub total_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.buckets,
            self.load_factor * 100.0
        );
        println!(
            "Slots: {} tombstones, {} empty",
            self.tombstones, self.empty_slots
        );
        println!("Longest probe: {}", self.max_probe_length);
        println!("Total Allocated: {} bytes", self.total_bytes);
    }
}

/// An open-addressing hash table with tombstone deletion and a linked
/// traversal order.
///
/// `HashTable<V>` stores values of type `V` in a single power-of-two slot
/// array. Collisions are resolved by probing according to `P`, hashes are
/// mapped to their first slot by `R`, and growth is governed by `G`. Like
/// other raw tables, every operation takes the value's hash and an equality
/// predicate, so the caller decides both how values are hashed and what makes
/// two of them equal.
///
/// Occupied slots are threaded into a doubly-linked list. New values are
/// linked at the front, so iteration yields the most recently inserted value
/// first. A rebuild replays that list front to back through the same
/// insertion rule, which reverses the iteration order every time the table
/// is rehashed.
///
/// The hash of every value is cached in its slot; rehashing never calls back
/// into the hasher.
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use probe_hash::hash_table::HashTable;
/// # use siphasher::sip::SipHasher;
/// #
/// # #[derive(Debug, PartialEq)]
/// # struct Person {
/// #     id: u64,
/// #     name: String,
/// # }
/// #
/// # fn hash_id(id: u64) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     id.hash(&mut hasher);
/// #     hasher.finish()
/// # }
///
/// let mut table: HashTable<Person> = HashTable::with_capacity(100);
/// let hash = hash_id(123);
///
/// // Insert a person
/// match table.entry(hash, |p: &Person| p.id == 123) {
///     probe_hash::hash_table::Entry::Vacant(entry) => {
///         entry.insert(Person {
///             id: 123,
///             name: "Alice".to_string(),
///         });
///     }
///     probe_hash::hash_table::Entry::Occupied(_) => {
///         println!("Person already exists");
///     }
/// }
/// ```
pub struct HashTable<V, P = LinearProbing, R = MaskRangeHashing, G = Power2RehashPolicy> {
    slots: Vec<Slot<V>>,

    populated: usize,
    tombstones: usize,
    head: usize,

    _policies: PhantomData<fn() -> (P, R, G)>,
}

impl<V, P, R, G> Debug for HashTable<V, P, R, G>
where
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        struct Entries<'a, V>(&'a [Slot<V>], usize);

        impl<V: Debug> Debug for Entries<'_, V> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let mut list = f.debug_list();
                let mut cursor = self.1;
                while let Some(node) = self.0.get(cursor).and_then(Slot::node) {
                    list.entry(&(cursor, &node.value));
                    cursor = node.next;
                }
                list.finish()
            }
        }

        f.debug_struct("HashTable")
            .field("populated", &self.populated)
            .field("tombstones", &self.tombstones)
            .field("buckets", &self.slots.len())
            .field("entries", &Entries(&self.slots, self.head))
            .finish()
    }
}

impl<V, P, R, G> Clone for HashTable<V, P, R, G>
where
    V: Clone,
{
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            populated: self.populated,
            tombstones: self.tombstones,
            head: self.head,
            _policies: PhantomData,
        }
    }
}

impl<V, P, R, G> Default for HashTable<V, P, R, G>
where
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

fn empty_slots<V>(buckets: usize) -> Vec<Slot<V>> {
    let mut slots = Vec::with_capacity(buckets);
    slots.resize_with(buckets, || Slot::Empty);
    slots
}

impl<V, P, R, G> HashTable<V, P, R, G>
where
    P: CollisionPolicy,
    R: RangeHashing,
    G: RehashPolicy,
{
    /// Creates a new hash table sized for `capacity` values.
    ///
    /// The slot array is never smaller than the rehash policy's minimum (64
    /// slots for [`Power2RehashPolicy`]).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// // Create a table that can hold at least 100 items without resizing
    /// let table: HashTable<String> = HashTable::with_capacity(100);
    /// assert!(table.capacity() >= 100);
    /// assert_eq!(table.bucket_count(), 256);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        let buckets = G::round_up_pow2(G::buckets_for(capacity), G::MIN_BUCKETS);
        Self {
            slots: empty_slots(buckets),
            populated: 0,
            tombstones: 0,
            head: END,
            _policies: PhantomData,
        }
    }

    /// Returns the number of elements in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table contains no elements.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of slots in the table.
    pub fn bucket_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of values the table can hold before it grows.
    pub fn capacity(&self) -> usize {
        (self.slots.len() as f64 * G::max_load_factor() as f64) as usize
    }

    /// Returns the number of tombstones left behind by removals since the
    /// last rebuild.
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Returns the ratio of values to slots.
    pub fn load_factor(&self) -> f32 {
        self.populated as f32 / self.slots.len() as f32
    }

    /// Returns the load factor the table grows to stay under.
    pub fn max_load_factor(&self) -> f32 {
        G::max_load_factor()
    }

    /// Returns 1 if slot `index` holds a value, 0 otherwise (including for
    /// out of range indices).
    pub fn bucket_size(&self, index: usize) -> usize {
        self.slots.get(index).is_some_and(Slot::is_occupied) as usize
    }

    #[inline]
    fn probe(&self, hash: u64, eq: impl Fn(&V) -> bool, seek_tombstone: bool) -> Probe {
        let buckets = self.slots.len();
        let start = R::reduce(hash, buckets);

        let mut first_tombstone = None;
        let mut index = start;
        for step in 1..=buckets {
            match &self.slots[index] {
                Slot::Empty => return Probe::Vacant(first_tombstone.unwrap_or(index)),
                Slot::Occupied(node) => {
                    if node.hash == hash && eq(&node.value) {
                        return Probe::Found(index);
                    }
                }
                Slot::Tombstone => {
                    if seek_tombstone && first_tombstone.is_none() {
                        first_tombstone = Some(index);
                    }
                }
            }
            index = P::next(start, step, buckets);
        }

        first_tombstone.map_or(Probe::Saturated, Probe::Vacant)
    }

    #[inline]
    fn find_index(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<usize> {
        match self.probe(hash, eq, false) {
            Probe::Found(index) => Some(index),
            Probe::Vacant(_) | Probe::Saturated => None,
        }
    }

    /// Returns a reference to the value matching `hash` and `eq`.
    ///
    /// Tombstones along the probe sequence are skipped; the first empty slot
    /// ends the search.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::with_capacity(10);
    /// table.entry(7, |&v| v == 7).or_insert(7);
    ///
    /// assert_eq!(table.find(7, |&v| v == 7), Some(&7));
    /// assert_eq!(table.find(8, |&v| v == 8), None);
    /// ```
    pub fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        let index = self.find_index(hash, eq)?;
        self.slots[index].node().map(|node| &node.value)
    }

    /// Returns a mutable reference to the value matching `hash` and `eq`.
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        let index = self.find_index(hash, eq)?;
        self.slots[index].node_mut().map(|node| &mut node.value)
    }

    /// Returns a handle to the value matching `hash` and `eq`.
    pub fn find_ptr(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<Ptr> {
        self.find_index(hash, eq).map(Ptr::from_index)
    }

    /// Returns the slot an insertion of a value with `hash` would use.
    ///
    /// If a matching value is present its slot is returned. Otherwise this is
    /// the first tombstone on the probe sequence, or the empty slot that ends
    /// it. Returns `None` only if the probe sequence holds neither.
    pub fn insertion_slot(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<usize> {
        match self.probe(hash, eq, true) {
            Probe::Found(index) | Probe::Vacant(index) => Some(index),
            Probe::Saturated => None,
        }
    }

    /// Gets an entry for the given hash and equality predicate.
    ///
    /// If inserting one more value would exceed the maximum load factor, the
    /// table grows *before* probing, even if the value turns out to be
    /// present. Once tombstones fill more than half of the slots left free
    /// by live values, the table is rebuilt at its current size to drop them.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use probe_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_str(s: &str) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     s.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table: HashTable<String> = HashTable::with_capacity(10);
    /// let hash = hash_str("hello");
    ///
    /// match table.entry(hash, |s: &String| s == "hello") {
    ///     probe_hash::hash_table::Entry::Vacant(entry) => {
    ///         entry.insert("hello".to_string());
    ///     }
    ///     probe_hash::hash_table::Entry::Occupied(_) => unreachable!(),
    /// }
    ///
    /// // Or use the convenience method
    /// table
    ///     .entry(hash, |s: &String| s == "hello")
    ///     .or_insert("ignored".to_string());
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn entry(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Entry<'_, V, P, R, G> {
        self.prepare_insert();
        loop {
            match self.probe(hash, &eq, true) {
                Probe::Found(index) => {
                    return Entry::Occupied(OccupiedEntry { table: self, index });
                }
                Probe::Vacant(index) => {
                    return Entry::Vacant(VacantEntry {
                        table: self,
                        index,
                        hash,
                    });
                }
                Probe::Saturated => self.grow_saturated(),
            }
        }
    }

    fn prepare_insert(&mut self) {
        let buckets = self.slots.len();
        if G::need_rehash(self.populated + 1, buckets) {
            self.reserve(1);
        } else if self.needs_compaction() {
            crate::trace!(
                "compacting {} tombstones in {} buckets",
                self.tombstones, buckets
            );
            self.rebuild(buckets);
        }
    }

    /// Tombstones may fill at most half of the slots that will not hold a
    /// live value after the next insertion. Past that the table is rebuilt in
    /// place, so at least that many insertions separate two compactions and
    /// the other half stays empty to end probe sequences.
    fn needs_compaction(&self) -> bool {
        let free = self.slots.len().saturating_sub(self.populated + 1);
        self.tombstones > 0 && self.tombstones * 2 > free
    }

    #[cold]
    #[inline(never)]
    fn grow_saturated(&mut self) {
        let buckets = G::round_up_pow2(G::buckets_for(self.slots.len()), self.slots.len());
        self.rebuild(buckets);
    }

    /// Removes and returns the value matching `hash` and `eq`.
    ///
    /// The slot becomes a tombstone and the value is unlinked from the
    /// traversal order. Handles to other values stay valid.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::with_capacity(10);
    /// table.entry(42, |&n| n == 42).or_insert(42);
    ///
    /// assert_eq!(table.remove(42, |&n| n == 42), Some(42));
    /// assert!(table.is_empty());
    /// assert_eq!(table.tombstones(), 1);
    ///
    /// // Removing a missing value returns None
    /// assert_eq!(table.remove(99, |&n| n == 99), None);
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<V> {
        let index = self.find_index(hash, eq)?;
        self.unlink_and_bury(index).map(|node| node.value)
    }

    /// Removes the value `ptr` refers to, returning it together with a handle
    /// to the value that followed it in traversal order.
    ///
    /// Returns `None` if `ptr` does not refer to an occupied slot.
    pub fn remove_ptr(&mut self, ptr: Ptr) -> Option<(V, Option<Ptr>)> {
        let node = self.unlink_and_bury(ptr.index())?;
        Some((node.value, Ptr::from_link(node.next)))
    }

    /// Removes the values from `first` up to, but not including, `last` in
    /// traversal order. `None` for `last` means the end of the traversal.
    ///
    /// If `last` does not follow `first`, everything from `first` to the end
    /// is removed. Returns the number of values removed.
    pub fn remove_range(&mut self, first: Ptr, last: Option<Ptr>) -> usize {
        let Some(before) = self.slots.get(first.index()).and_then(Slot::node).map(|n| n.prev)
        else {
            return 0;
        };

        let stop = last.map_or(END, Ptr::index);
        let mut cursor = first.index();
        let mut removed = 0;
        while cursor != stop {
            let Some(node) = self.slots.get_mut(cursor).and_then(Slot::mark_tombstone) else {
                cursor = END;
                break;
            };
            cursor = node.next;
            removed += 1;
        }

        self.populated -= removed;
        self.tombstones += removed;
        self.link_nodes(before, cursor);
        removed
    }

    /// Returns the value `ptr` refers to.
    pub fn get_ptr(&self, ptr: Ptr) -> Option<&V> {
        self.slots
            .get(ptr.index())
            .and_then(Slot::node)
            .map(|node| &node.value)
    }

    /// Returns a mutable reference to the value `ptr` refers to.
    pub fn get_ptr_mut(&mut self, ptr: Ptr) -> Option<&mut V> {
        self.slots
            .get_mut(ptr.index())
            .and_then(Slot::node_mut)
            .map(|node| &mut node.value)
    }

    /// Returns a handle to the first value in traversal order, the most
    /// recently inserted one.
    pub fn first(&self) -> Option<Ptr> {
        Ptr::from_link(self.head)
    }

    /// Returns a handle to the value following `ptr` in traversal order.
    pub fn next_ptr(&self, ptr: Ptr) -> Option<Ptr> {
        let node = self.slots.get(ptr.index())?.node()?;
        Ptr::from_link(node.next)
    }

    /// Rebuilds the table with at least `count` slots.
    ///
    /// The table never shrinks through this method: the new size is `count`
    /// rounded up to the rehash policy's granularity, but no smaller than the
    /// current size. All tombstones are dropped, every handle is invalidated,
    /// and the traversal order is reversed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::with_capacity(0);
    /// for i in 1..=3u64 {
    ///     table.entry(i, |&v| v == i).or_insert(i);
    /// }
    /// assert_eq!(table.iter().copied().collect::<Vec<_>>(), [3, 2, 1]);
    ///
    /// table.rehash(200);
    /// assert_eq!(table.bucket_count(), 256);
    /// assert_eq!(table.iter().copied().collect::<Vec<_>>(), [1, 2, 3]);
    /// ```
    pub fn rehash(&mut self, count: usize) {
        let buckets = G::round_up_pow2(count, self.slots.len());
        self.rebuild(buckets);
    }

    /// Reserves capacity for at least `additional` more elements.
    ///
    /// Does nothing if the table can already take them without exceeding the
    /// maximum load factor.
    pub fn reserve(&mut self, additional: usize) {
        let required = self
            .populated
            .checked_add(additional)
            .unwrap_or_else(|| capacity_overflow());
        if G::need_rehash(required, self.slots.len()) {
            self.rehash(G::buckets_for(required));
        }
    }

    /// Shrinks the table to the smallest size that holds its values, dropping
    /// all tombstones.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashTable;
    ///
    /// let mut table: HashTable<u64> = HashTable::with_capacity(1000);
    /// assert!(table.capacity() >= 1000);
    ///
    /// table.entry(5, |&v| v == 5).or_insert(5);
    /// table.entry(10, |&v| v == 10).or_insert(10);
    ///
    /// table.shrink_to_fit();
    /// assert_eq!(table.bucket_count(), 64);
    /// assert_eq!(table.len(), 2);
    /// ```
    pub fn shrink_to_fit(&mut self) {
        let buckets = G::round_up_pow2(G::buckets_for(self.populated), G::MIN_BUCKETS);
        if buckets < self.slots.len() || self.tombstones > 0 {
            self.rebuild(buckets);
        }
    }

    fn rebuild(&mut self, buckets: usize) {
        crate::trace!(
            "rebuilding {} entries: {} -> {} buckets",
            self.populated,
            self.slots.len(),
            buckets
        );

        let mut old = core::mem::replace(&mut self.slots, empty_slots(buckets));
        let mut cursor = self.head;
        self.populated = 0;
        self.tombstones = 0;
        self.head = END;

        while let Some(node) = old.get_mut(cursor).and_then(Slot::reset_to_empty) {
            cursor = node.next;
            let index = self.free_slot(node.hash);
            self.link_at_head(index, node.value, node.hash);
        }
    }

    /// First unoccupied slot on the probe sequence of `hash`.
    fn free_slot(&self, hash: u64) -> usize {
        let buckets = self.slots.len();
        let start = R::reduce(hash, buckets);
        let mut index = start;
        for step in 1..=buckets {
            if !self.slots[index].is_occupied() {
                return index;
            }
            index = P::next(start, step, buckets);
        }

        self.slots
            .iter()
            .position(|slot| !slot.is_occupied())
            .unwrap_or_else(|| capacity_overflow())
    }

    fn link_at_head(&mut self, index: usize, value: V, hash: u64) {
        let old_head = self.head;
        self.slots[index].occupy(value, hash).next = old_head;
        if let Some(node) = self.slots.get_mut(old_head).and_then(Slot::node_mut) {
            node.prev = index;
        }
        self.head = index;
        self.populated += 1;
    }

    /// Removes all elements from the table.
    ///
    /// Every slot, tombstones included, becomes empty. The table keeps its
    /// size.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::with_capacity(10);
    /// table.entry(1, |&n| n == 1).or_insert(1);
    /// table.entry(2, |&n| n == 2).or_insert(2);
    /// table.remove(2, |&n| n == 2);
    ///
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert_eq!(table.tombstones(), 0);
    /// assert_eq!(table.bucket_count(), 64);
    /// ```
    pub fn clear(&mut self) {
        crate::trace!("clearing {} entries", self.populated);
        for slot in &mut self.slots {
            slot.reset_to_empty();
        }
        self.populated = 0;
        self.tombstones = 0;
        self.head = END;
    }

    /// Retains only the values for which `f` returns `true`, visiting them in
    /// traversal order.
    pub fn retain(&mut self, mut f: impl FnMut(&mut V) -> bool) {
        let mut cursor = self.head;
        while let Some(node) = self.slots.get_mut(cursor).and_then(Slot::node_mut) {
            let keep = f(&mut node.value);
            let next = node.next;
            if !keep {
                self.unlink_and_bury(cursor);
            }
            cursor = next;
        }
    }

    /// Computes a histogram of probe distances: `hist[d]` is the number of
    /// values stored `d` steps into their probe sequence.
    ///
    /// Requires the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> Vec<usize> {
        let mut hist = alloc::vec![0usize; 1];
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(node) = slot.node() else {
                continue;
            };
            let distance = self.probe_distance(node.hash, index);
            if hist.len() <= distance {
                hist.resize(distance + 1, 0);
            }
            hist[distance] += 1;
        }
        hist
    }

    #[cfg(any(test, feature = "stats"))]
    fn probe_distance(&self, hash: u64, index: usize) -> usize {
        let buckets = self.slots.len();
        let start = R::reduce(hash, buckets);
        let mut candidate = start;
        for step in 1..=buckets {
            if candidate == index {
                return step - 1;
            }
            candidate = P::next(start, step, buckets);
        }
        buckets
    }

    /// Returns detailed utilization statistics for debugging.
    ///
    /// Requires the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let buckets = self.slots.len();
        let empty_slots = self.slots.iter().filter(|slot| slot.is_empty()).count();
        DebugStats {
            populated: self.populated,
            buckets,
            tombstones: self.tombstones,
            empty_slots,
            load_factor: self.populated as f64 / buckets as f64,
            max_probe_length: self.probe_histogram().len() - 1,
            total_bytes: buckets * core::mem::size_of::<Slot<V>>(),
        }
    }
}

impl<V, P, R, G> HashTable<V, P, R, G> {
    /// Joins `left` and `right` in the traversal list. Either may be `END`.
    fn link_nodes(&mut self, left: usize, right: usize) {
        if left == END {
            self.head = right;
        } else if let Some(node) = self.slots.get_mut(left).and_then(Slot::node_mut) {
            node.next = right;
        }

        if let Some(node) = self.slots.get_mut(right).and_then(Slot::node_mut) {
            node.prev = left;
        }
    }

    fn unlink_and_bury(&mut self, index: usize) -> Option<Node<V>> {
        let (prev, next) = self
            .slots
            .get(index)
            .and_then(Slot::node)
            .map(|node| (node.prev, node.next))?;

        self.link_nodes(prev, next);
        let node = self.slots[index].mark_tombstone()?;
        self.populated -= 1;
        self.tombstones += 1;
        Some(node)
    }

    /// Returns an iterator over all values in traversal order, most recently
    /// inserted first (reversed by every rehash).
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            slots: &self.slots,
            cursor: self.head,
            remaining: self.populated,
        }
    }

    /// Returns an iterator starting at `ptr` and following the traversal
    /// order to the end. Yields nothing if `ptr` is not occupied.
    pub fn iter_from(&self, ptr: Ptr) -> IterFrom<'_, V> {
        IterFrom {
            slots: &self.slots,
            cursor: ptr.index(),
            bound: self.populated,
        }
    }

    /// Returns an iterator yielding mutable references in traversal order.
    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut {
            slots: self.slots.as_mut_ptr(),
            len: self.slots.len(),
            cursor: self.head,
            remaining: self.populated,
            _marker: PhantomData,
        }
    }

    /// Returns an iterator that removes and yields all values in traversal
    /// order.
    ///
    /// When the iterator is dropped the table is empty, whether or not it was
    /// exhausted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::with_capacity(10);
    /// table.entry(1, |&n| n == 1).or_insert(1);
    /// table.entry(2, |&n| n == 2).or_insert(2);
    ///
    /// let values: Vec<u64> = table.drain().collect();
    /// assert!(table.is_empty());
    /// assert_eq!(values, [2, 1]);
    /// ```
    pub fn drain(&mut self) -> Drain<'_, V, P, R, G> {
        Drain { table: self }
    }
}

/// A view into a single entry in the hash table, which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, V, P = LinearProbing, R = MaskRangeHashing, G = Power2RehashPolicy> {
    /// A vacant entry - no matching value is present in the table
    Vacant(VacantEntry<'a, V, P, R, G>),
    /// An occupied entry - a matching value is present in the table
    Occupied(OccupiedEntry<'a, V, P, R, G>),
}

impl<'a, V, P, R, G> Entry<'a, V, P, R, G> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value in the entry.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the value in the entry.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Calls `f` on the value if the entry is occupied.
    pub fn and_modify(self, f: impl FnOnce(&mut V)) -> Self {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Inserts `V::default()` if the entry is vacant and returns a mutable
    /// reference to the value in the entry.
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }

    /// Returns a handle to the slot of this entry. For a vacant entry this is
    /// the slot the value will be inserted into.
    pub fn ptr(&self) -> Ptr {
        match self {
            Entry::Occupied(entry) => entry.ptr(),
            Entry::Vacant(entry) => entry.ptr(),
        }
    }
}

/// A view into a vacant entry in a [`HashTable`].
pub struct VacantEntry<'a, V, P = LinearProbing, R = MaskRangeHashing, G = Power2RehashPolicy> {
    table: &'a mut HashTable<V, P, R, G>,
    index: usize,
    hash: u64,
}

impl<'a, V, P, R, G> VacantEntry<'a, V, P, R, G> {
    /// Inserts a value into the vacant entry, linking it at the front of the
    /// traversal order, and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        let table = self.table;
        let index = self.index;
        if table.slots[index].is_tombstone() {
            table.tombstones -= 1;
        }

        let old_head = table.head;
        if let Some(node) = table.slots.get_mut(old_head).and_then(Slot::node_mut) {
            node.prev = index;
        }
        table.head = index;
        table.populated += 1;

        let node = table.slots[index].occupy(value, self.hash);
        node.next = old_head;
        &mut node.value
    }

    /// Returns a handle to the slot the value will be inserted into.
    pub fn ptr(&self) -> Ptr {
        Ptr::from_index(self.index)
    }
}

/// A view into an occupied entry in a [`HashTable`].
pub struct OccupiedEntry<'a, V, P = LinearProbing, R = MaskRangeHashing, G = Power2RehashPolicy> {
    table: &'a mut HashTable<V, P, R, G>,
    index: usize,
}

impl<'a, V, P, R, G> OccupiedEntry<'a, V, P, R, G> {
    fn node(&self) -> &Node<V> {
        match &self.table.slots[self.index] {
            Slot::Occupied(node) => node,
            Slot::Empty | Slot::Tombstone => unreachable!("occupied entry points at a free slot"),
        }
    }

    fn node_mut(&mut self) -> &mut Node<V> {
        match &mut self.table.slots[self.index] {
            Slot::Occupied(node) => node,
            Slot::Empty | Slot::Tombstone => unreachable!("occupied entry points at a free slot"),
        }
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.node().value
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.node_mut().value
    }

    /// Converts the entry into a mutable reference with the table's lifetime.
    pub fn into_mut(self) -> &'a mut V {
        let table = self.table;
        match &mut table.slots[self.index] {
            Slot::Occupied(node) => &mut node.value,
            Slot::Empty | Slot::Tombstone => unreachable!("occupied entry points at a free slot"),
        }
    }

    /// Removes the value from the table, leaving a tombstone.
    pub fn remove(self) -> V {
        match self.table.unlink_and_bury(self.index) {
            Some(node) => node.value,
            None => unreachable!("occupied entry points at a free slot"),
        }
    }

    /// Returns a handle to the slot of this entry.
    pub fn ptr(&self) -> Ptr {
        Ptr::from_index(self.index)
    }
}

/// An iterator over the values of a [`HashTable`] in traversal order.
///
/// This struct is created by the [`iter`] method on [`HashTable`].
///
/// [`iter`]: HashTable::iter
pub struct Iter<'a, V> {
    slots: &'a [Slot<V>],
    cursor: usize,
    remaining: usize,
}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            cursor: self.cursor,
            remaining: self.remaining,
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.slots.get(self.cursor)?.node()?;
        self.cursor = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

/// An iterator over the tail of the traversal order, starting at a handle.
///
/// This struct is created by the [`iter_from`] method on [`HashTable`]. Its
/// length is only known once it is exhausted.
///
/// [`iter_from`]: HashTable::iter_from
pub struct IterFrom<'a, V> {
    slots: &'a [Slot<V>],
    cursor: usize,
    bound: usize,
}

impl<V> Clone for IterFrom<'_, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            cursor: self.cursor,
            bound: self.bound,
        }
    }
}

impl<'a, V> Iterator for IterFrom<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.slots.get(self.cursor)?.node()?;
        self.cursor = node.next;
        self.bound = self.bound.saturating_sub(1);
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.bound))
    }
}

/// A mutable iterator over the values of a [`HashTable`] in traversal order.
///
/// This struct is created by the [`iter_mut`] method on [`HashTable`].
///
/// [`iter_mut`]: HashTable::iter_mut
pub struct IterMut<'a, V> {
    slots: *mut Slot<V>,
    len: usize,
    cursor: usize,
    remaining: usize,
    _marker: PhantomData<&'a mut V>,
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        // SAFETY: `cursor < len`, so the pointer is within the slot array that
        // is mutably borrowed for `'a`. The traversal list is acyclic and visits
        // each occupied slot once, so no two yielded references alias. The
        // links themselves are never handed out, so the caller can not alter
        // the path the iterator takes.
        let slot = unsafe { &mut *self.slots.add(self.cursor) };
        let node = slot.node_mut()?;
        self.cursor = node.next;
        self.remaining -= 1;
        Some(&mut node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IterMut<'_, V> {}

// SAFETY: `IterMut` behaves like `&mut [Slot<V>]`, handing out disjoint
// `&mut V`.
unsafe impl<V: Send> Send for IterMut<'_, V> {}
unsafe impl<V: Sync> Sync for IterMut<'_, V> {}

/// A draining iterator over the values in a [`HashTable`].
///
/// This struct is created by the [`drain`] method on [`HashTable`].
///
/// [`drain`]: HashTable::drain
pub struct Drain<'a, V, P = LinearProbing, R = MaskRangeHashing, G = Power2RehashPolicy> {
    table: &'a mut HashTable<V, P, R, G>,
}

impl<V, P, R, G> Iterator for Drain<'_, V, P, R, G> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        let table = &mut *self.table;
        let node = table.slots.get_mut(table.head).and_then(Slot::mark_tombstone)?;
        table.head = node.next;
        if let Some(next) = table.slots.get_mut(node.next).and_then(Slot::node_mut) {
            next.prev = END;
        }
        table.populated -= 1;
        table.tombstones += 1;
        Some(node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.table.populated, Some(self.table.populated))
    }
}

impl<V, P, R, G> ExactSizeIterator for Drain<'_, V, P, R, G> {}

impl<V, P, R, G> Drop for Drain<'_, V, P, R, G> {
    fn drop(&mut self) {
        for _ in &mut *self {}

        for slot in &mut self.table.slots {
            *slot = Slot::Empty;
        }
        self.table.tombstones = 0;
    }
}

/// An owning iterator over the values of a [`HashTable`] in traversal order.
pub struct IntoIter<V> {
    slots: Vec<Slot<V>>,
    cursor: usize,
    remaining: usize,
}

impl<V> Iterator for IntoIter<V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.slots.get_mut(self.cursor)?.reset_to_empty()?;
        self.cursor = node.next;
        self.remaining -= 1;
        Some(node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {}

impl<V, P, R, G> IntoIterator for HashTable<V, P, R, G> {
    type IntoIter = IntoIter<V>;
    type Item = V;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            slots: self.slots,
            cursor: self.head,
            remaining: self.populated,
        }
    }
}

impl<'a, V, P, R, G> IntoIterator for &'a HashTable<V, P, R, G> {
    type IntoIter = Iter<'a, V>;
    type Item = &'a V;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
