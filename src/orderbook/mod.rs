//! Order book for a single auction.
//!
//! ## Architecture
//!
//! The book is a sorted doubly-linked list living in a slab arena:
//!
//! - **Slab-based storage**: O(1) node insertion, removal, and lookup
//! - **Key index**: 32-byte order key to slab slot
//! - **Ascending price order**: cheapest limit first, bounded by sentinels
//!
//! ## Components
//!
//! - [`OrderNode`]: Wrapper around `Order` with linked-list slot pointers
//! - [`OrderQueue`]: The sorted queue with hinted insertion
//!
//! ## Performance
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | Insert with exact hint | O(1) |
//! | Insert with stale hint | O(k) in scan distance |
//! | Remove by key | O(1) |
//! | Contains | O(1) |
//!
//! ## Example
//!
//! ```
//! use batch_auction::orderbook::OrderQueue;
//! use batch_auction::types::{Order, QUEUE_START};
//!
//! let mut queue = OrderQueue::with_capacity(16);
//! let order = Order::new(2, 50, 100).unwrap();
//! queue.insert(order, &QUEUE_START.encode()).unwrap();
//!
//! assert!(queue.contains(&order.encode()));
//! ```

pub mod node;
pub mod queue;

pub use node::OrderNode;
pub use queue::{Iter, OrderQueue, QueueError};
