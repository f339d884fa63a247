//! Sorted order queue with predecessor hints.
//!
//! ## Architecture
//!
//! - **Slab**: Arena of [`OrderNode`]s linked by slot index
//! - **HashMap**: Order key to slot, for O(1) membership and removal
//! - **Sentinels**: [`QUEUE_START`] and [`QUEUE_END`] occupy fixed slots
//!   and bound every real order
//!
//! ```text
//! START <-> cheapest <-> ... <-> most expensive <-> END
//! ```
//!
//! ## Hints
//!
//! `insert` takes the key of a supposed predecessor. A good hint makes the
//! insertion O(1); a bad one only costs a longer forward scan. A hint that
//! was removed is followed back through the predecessor it had when it left
//! the queue. A hint that never existed, or that does not sort strictly
//! before the new order, restarts the scan at `QUEUE_START`.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use slab::Slab;
use thiserror::Error;

use crate::orderbook::OrderNode;
use crate::types::{Order, OrderKey, QUEUE_END, QUEUE_START};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("order {0} is already queued")]
    DuplicateOrder(OrderKey),

    #[error("order {0} is not queued")]
    OrderNotFound(OrderKey),

    #[error("sentinel entries cannot be inserted or removed")]
    SentinelImmutable,

    #[error("order {0} has a zero amount")]
    DegenerateOrder(OrderKey),
}

/// Ascending queue of orders between two permanent sentinels.
#[derive(Debug, Clone)]
pub struct OrderQueue {
    nodes: Slab<OrderNode>,

    /// Live keys (sentinels included) to slab slots
    index: HashMap<OrderKey, usize>,

    /// Removed keys to the predecessor they had when removed
    retired: HashMap<OrderKey, OrderKey>,

    head: usize,
    tail: usize,
}

impl Default for OrderQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderQueue {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a queue with room for `capacity` orders besides the sentinels.
    ///
    /// # Example
    ///
    /// ```
    /// use batch_auction::orderbook::OrderQueue;
    ///
    /// let queue = OrderQueue::with_capacity(1_000);
    /// assert!(queue.is_empty());
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Slab::with_capacity(capacity + 2);
        let head = nodes.insert(OrderNode::new(QUEUE_START));
        let tail = nodes.insert(OrderNode::new(QUEUE_END));
        nodes[head].next = Some(tail);
        nodes[tail].prev = Some(head);

        let mut index = HashMap::with_capacity(capacity + 2);
        index.insert(QUEUE_START.encode(), head);
        index.insert(QUEUE_END.encode(), tail);

        Self {
            nodes,
            index,
            retired: HashMap::new(),
            head,
            tail,
        }
    }

    // ========================================================================
    // Size and Lookup
    // ========================================================================

    /// Number of real orders (sentinels excluded)
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len() - 2
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sentinels are always contained.
    #[inline]
    pub fn contains(&self, key: &OrderKey) -> bool {
        self.index.contains_key(key)
    }

    /// Removed keys still resolvable as hints
    #[inline]
    pub fn history_len(&self) -> usize {
        self.retired.len()
    }

    pub fn get(&self, key: &OrderKey) -> Option<&Order> {
        self.index.get(key).map(|&slot| &self.nodes[slot].order)
    }

    /// Cheapest real order
    pub fn first(&self) -> Option<&Order> {
        self.iter().next()
    }

    /// Most expensive real order
    pub fn last(&self) -> Option<&Order> {
        let slot = self.prev_slot(self.tail);
        (slot != self.head).then(|| &self.nodes[slot].order)
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Insert `order` after the position found from `hint`.
    ///
    /// # Returns
    ///
    /// The number of nodes the scan stepped over past the resolved hint.
    /// Zero means the hint was exact.
    pub fn insert(&mut self, order: Order, hint: &OrderKey) -> Result<usize, QueueError> {
        let key = order.encode();
        if order.is_sentinel() {
            return Err(QueueError::SentinelImmutable);
        }
        if !order.is_real() {
            return Err(QueueError::DegenerateOrder(key));
        }
        if self.index.contains_key(&key) {
            return Err(QueueError::DuplicateOrder(key));
        }

        let mut cursor = self.resolve_hint(hint, &order);
        let mut hops = 0;
        loop {
            let next = self.next_slot(cursor);
            if next == self.tail || self.nodes[next].order >= order {
                break;
            }
            cursor = next;
            hops += 1;
        }

        self.link_after(cursor, order);
        Ok(hops)
    }

    /// Remove a live order, remembering its predecessor for stale hints.
    pub fn remove(&mut self, key: &OrderKey) -> Result<Order, QueueError> {
        let (order, prev) = self.unlink(key)?;
        let prev_key = self.nodes[prev].order.encode();
        self.retired.insert(*key, prev_key);
        Ok(order)
    }

    /// Remove a live order without keeping it as a hint. For removals no
    /// later insert can refer to, such as claims after settlement.
    pub fn take(&mut self, key: &OrderKey) -> Result<Order, QueueError> {
        self.unlink(key).map(|(order, _)| order)
    }

    /// Undo an `insert` whose enclosing operation failed. Leaves the
    /// removed-key history exactly as it was before the insert.
    pub(crate) fn rollback_insert(&mut self, key: &OrderKey) -> Result<Order, QueueError> {
        self.take(key)
    }

    /// Drop the removed-key history once no more inserts can happen.
    pub fn clear_history(&mut self) {
        self.retired.clear();
        self.retired.shrink_to_fit();
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Real orders in ascending price order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            queue: self,
            cursor: self.next_slot(self.head),
        }
    }

    /// Real orders strictly after `key`, which must be live. `QUEUE_START`
    /// yields the whole queue.
    pub fn iter_after(&self, key: &OrderKey) -> Result<Iter<'_>, QueueError> {
        let slot = *self.index.get(key).ok_or(QueueError::OrderNotFound(*key))?;
        Ok(Iter {
            queue: self,
            cursor: self.next_slot(slot),
        })
    }

    /// SHA-256 over the live order keys in queue order.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for order in self.iter() {
            hasher.update(order.encode());
        }
        let mut root = [0u8; 32];
        root.copy_from_slice(&hasher.finalize());
        root
    }

    // ========================================================================
    // Internals
    // ========================================================================

    #[inline]
    fn next_slot(&self, slot: usize) -> usize {
        self.nodes[slot].next.unwrap_or(self.tail)
    }

    #[inline]
    fn prev_slot(&self, slot: usize) -> usize {
        self.nodes[slot].prev.unwrap_or(self.head)
    }

    /// Find the slot to start scanning from. Removal times strictly increase
    /// along the retired chain, so the walk terminates.
    fn resolve_hint(&self, hint: &OrderKey, order: &Order) -> usize {
        let mut key = *hint;
        loop {
            if let Some(&slot) = self.index.get(&key) {
                if slot == self.head || slot == self.tail {
                    return self.head;
                }
                return if self.nodes[slot].order < *order {
                    slot
                } else {
                    self.head
                };
            }
            match self.retired.get(&key) {
                Some(prev) => key = *prev,
                None => return self.head,
            }
        }
    }

    fn link_after(&mut self, prev: usize, order: Order) {
        let next = self.next_slot(prev);
        let key = order.encode();

        let slot = self.nodes.insert(OrderNode::new(order));
        self.nodes[slot].prev = Some(prev);
        self.nodes[slot].next = Some(next);
        self.nodes[prev].next = Some(slot);
        self.nodes[next].prev = Some(slot);
        self.index.insert(key, slot);
    }

    fn unlink(&mut self, key: &OrderKey) -> Result<(Order, usize), QueueError> {
        let slot = *self.index.get(key).ok_or(QueueError::OrderNotFound(*key))?;
        if slot == self.head || slot == self.tail {
            return Err(QueueError::SentinelImmutable);
        }
        self.index.remove(key);

        let prev = self.prev_slot(slot);
        let next = self.next_slot(slot);
        self.nodes[prev].next = Some(next);
        self.nodes[next].prev = Some(prev);

        let node = self.nodes.remove(slot);
        Ok((node.order, prev))
    }
}

/// Ascending iterator over real orders.
pub struct Iter<'a> {
    queue: &'a OrderQueue,
    cursor: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Order;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == self.queue.tail {
            return None;
        }
        let node = &self.queue.nodes[self.cursor];
        self.cursor = node.next.unwrap_or(self.queue.tail);
        Some(&node.order)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
