//! Clearing engine for batch auctions.
//!
//! ## Design Principles
//!
//! 1. **Determinism**: Same book and auctioneer order always clear identically
//! 2. **Exact Math**: Cross-multiplied 256-bit comparisons, one truncating division
//! 3. **Resumable**: A scan can be split across bounded calls with no change in result
//!
//! ## Example
//!
//! ```
//! use batch_auction::engine::{compute_clearing, FillClass};
//! use batch_auction::types::Order;
//!
//! // 100 auctioned tokens, reserve of 50 bidding tokens
//! let initial = Order::new(1, 50, 100).unwrap();
//! let cheap = Order::new(2, 60, 90).unwrap();
//! let dear = Order::new(3, 80, 90).unwrap();
//!
//! let outcome = compute_clearing(&[cheap, dear], &initial).unwrap();
//! assert_eq!(outcome.clearing_order.classify(&cheap), FillClass::Full);
//! ```

pub mod accumulator;
pub mod clearing;

use thiserror::Error;

use crate::orderbook::QueueError;

pub use accumulator::{advance, InterimState};
pub use clearing::{compute_clearing, ClearingOrder, ClearingOutcome, ClearingScan, FillClass};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("auctioneer order has a zero amount")]
    DegenerateInitialOrder,

    #[error("arithmetic overflow in clearing")]
    Overflow,

    #[error("step count must be positive")]
    ZeroSteps,

    #[error("book holds {count} orders, more than the maximum of {max}")]
    TooManyOrders { count: usize, max: usize },

    #[error("reached end of queue")]
    ReachedEnd,

    #[error("too many orders summed up")]
    TooManyOrdersSummed,

    #[error(transparent)]
    Queue(#[from] QueueError),
}
