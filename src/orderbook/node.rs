//! Queue node for slab-based storage.
//!
//! ## Design
//!
//! `OrderNode` wraps an `Order` with doubly-linked list pointers. The
//! pointers are slab keys (`usize`), not references, so the queue is a
//! plain index arena with no ownership cycles.
//!
//! ## Slab Integration
//!
//! Per official slab docs (https://docs.rs/slab/0.4.11):
//! - Keys are `usize` values returned by `slab.insert()`
//! - Keys may be reused after `slab.remove()`
//! - O(1) insert, remove, and lookup

use crate::types::Order;

/// Order node stored in the slab.
///
/// ## Memory Layout
///
/// ```text
/// OrderNode {
///     order: Order (40 bytes)
///     next: Option<usize>
///     prev: Option<usize>
/// }
/// ```
#[derive(Debug, Clone)]
pub struct OrderNode {
    pub order: Order,

    /// Next (more expensive) node, `None` only for the end sentinel
    pub next: Option<usize>,

    /// Previous (cheaper) node, `None` only for the start sentinel
    pub prev: Option<usize>,
}

impl OrderNode {
    /// Create a new order node (not yet linked)
    #[inline]
    pub fn new(order: Order) -> Self {
        Self {
            order,
            next: None,
            prev: None,
        }
    }
}
