//! # Batch Auction
//!
//! Sealed-bid, uniform-price batch auctions.
//!
//! ## Architecture
//!
//! The engine consists of:
//! - **Types**: Orders and their 32-byte keys, exact price math, settlement receipts
//! - **OrderBook**: Price-sorted order queue with slab-based storage and insertion hints
//! - **Engine**: Clearing price computation and incremental precomputation
//! - **Auction**: Lifecycle, settlement, claims and fees behind [`AuctionHouse`]
//! - **Access**: Allow-list gates consulted on placement
//!
//! ## Design Principles
//!
//! 1. **Determinism**: The same book always clears at the same price
//! 2. **No Floating Point**: 96-bit amounts, 256-bit cross-multiplied comparisons
//! 3. **All-or-Nothing**: Every operation validates, computes, transfers, then commits
//! 4. **Bounded Work**: Large books can be summed ahead of settlement in slices
//!
//! ## Example
//!
//! ```
//! use alloy_primitives::Address;
//! use batch_auction::{AuctionHouse, AuctionParams, EngineConfig, InMemoryLedger, ManualClock};
//! use batch_auction::types::QUEUE_START;
//!
//! let (auctioning, bidding) = (Address::repeat_byte(0xa1), Address::repeat_byte(0xb1));
//! let (auctioneer, bidder) = (Address::repeat_byte(1), Address::repeat_byte(2));
//!
//! let mut ledger = InMemoryLedger::new();
//! ledger.mint(auctioning, auctioneer, 1_000);
//! ledger.approve(auctioning, auctioneer, 1_000);
//! ledger.mint(bidding, bidder, 1_000);
//! ledger.approve(bidding, bidder, 1_000);
//!
//! let clock = ManualClock::new(0);
//! let mut house = AuctionHouse::new(EngineConfig::default(), auctioneer, ledger, clock.clone());
//! let id = house
//!     .initiate_auction(auctioneer, AuctionParams {
//!         auctioning_token: auctioning,
//!         bidding_token: bidding,
//!         auction_start: 0,
//!         cancellation_deadline: 10,
//!         auction_end: 10,
//!         auctioned_sell_amount: 1_000,
//!         min_buy_amount: 100,
//!         minimum_bid_amount: 1,
//!         min_funding_threshold: 0,
//!         is_atomic_closure_allowed: false,
//!         allow_list: None,
//!         allow_list_data: Vec::new(),
//!     })
//!     .unwrap();
//!
//! let placed = house
//!     .place_orders(id, bidder, &[(1_000, 500)], &[QUEUE_START.encode()], &[])
//!     .unwrap();
//!
//! clock.set(10);
//! let receipt = house.settle_auction(id).unwrap();
//! assert_eq!(receipt.raised, 500);
//!
//! let owed = house.claim_from_participant_orders(id, &placed).unwrap();
//! assert_eq!(owed.auctioning, 1_000);
//! ```

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: Order, price math, SettlementReceipt
pub mod types;

/// Order queue: price-sorted, slab-backed, hint-driven insertion
pub mod orderbook;

/// Clearing engine: uniform price computation
pub mod engine;

/// Auction lifecycle, settlement and claims
pub mod auction;

/// Allow-list gates
pub mod access;

/// Asset transfer collaborator
pub mod ledger;

/// Time source
pub mod clock;

pub mod config;
pub mod error;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use access::{AccessControlGate, AllowListGate, SignatureVerifier};
pub use auction::{AuctionHouse, AuctionParams, ClaimAmounts, Phase};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{compute_clearing, ClearingOrder, ClearingOutcome, InterimState};
pub use error::{AuctionError, ErrorKind};
pub use ledger::{AssetLedger, InMemoryLedger, TransferBatch};
pub use orderbook::OrderQueue;
pub use types::{Order, OrderKey, SettlementReceipt};
