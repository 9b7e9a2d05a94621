//! Per-slot storage and its state machine.

/// Link value meaning "no neighbour". Never a valid slot index, since a
/// table can not hold `usize::MAX` slots.
pub(crate) const END: usize = usize::MAX;

/// An occupied slot's payload: the value, its cached hash, and the links of
/// the traversal list.
#[derive(Debug, Clone)]
pub(crate) struct Node<V> {
    pub(crate) value: V,
    pub(crate) hash: u64,
    pub(crate) prev: usize,
    pub(crate) next: usize,
}

/// A single cell of the slot array.
///
/// `Empty` ends a probe sequence. `Tombstone` is skipped by lookups but may be
/// reused by an insertion. Transitions only ever touch the slot itself;
/// keeping the traversal links consistent is the table's job.
#[derive(Debug, Clone)]
pub(crate) enum Slot<V> {
    Empty,
    Tombstone,
    Occupied(Node<V>),
}

impl<V> Slot<V> {
    #[inline(always)]
    pub(crate) fn is_occupied(&self) -> bool {
        matches!(self, Slot::Occupied(_))
    }

    #[cfg(any(test, feature = "stats"))]
    #[inline(always)]
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    #[inline(always)]
    pub(crate) fn is_tombstone(&self) -> bool {
        matches!(self, Slot::Tombstone)
    }

    /// Stores `value` with unlinked neighbours. The slot must not be occupied.
    #[inline]
    pub(crate) fn occupy(&mut self, value: V, hash: u64) -> &mut Node<V> {
        debug_assert!(!self.is_occupied());
        *self = Slot::Occupied(Node {
            value,
            hash,
            prev: END,
            next: END,
        });
        match self {
            Slot::Occupied(node) => node,
            _ => unreachable!(),
        }
    }

    /// Turns an occupied slot into a tombstone, handing back its node.
    #[inline]
    pub(crate) fn mark_tombstone(&mut self) -> Option<Node<V>> {
        if !self.is_occupied() {
            return None;
        }
        match core::mem::replace(self, Slot::Tombstone) {
            Slot::Occupied(node) => Some(node),
            _ => None,
        }
    }

    /// Resets the slot, returning the node it held if any.
    #[inline]
    pub(crate) fn reset_to_empty(&mut self) -> Option<Node<V>> {
        match core::mem::replace(self, Slot::Empty) {
            Slot::Occupied(node) => Some(node),
            Slot::Empty | Slot::Tombstone => None,
        }
    }

    #[inline(always)]
    pub(crate) fn node(&self) -> Option<&Node<V>> {
        match self {
            Slot::Occupied(node) => Some(node),
            Slot::Empty | Slot::Tombstone => None,
        }
    }

    #[inline(always)]
    pub(crate) fn node_mut(&mut self) -> Option<&mut Node<V>> {
        match self {
            Slot::Occupied(node) => Some(node),
            Slot::Empty | Slot::Tombstone => None,
        }
    }
}
