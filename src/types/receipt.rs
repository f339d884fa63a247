//! Settlement receipt for a finished auction.
//!
//! The receipt fixes the clearing result together with a SHA-256 root over
//! the order book as it stood at settlement, so claims can later be checked
//! against the exact book that was cleared.

use ssz_rs::prelude::*;

/// Summary of one auction settlement.
///
/// ## Book Root
///
/// The 32-byte `book_root` is a SHA-256 hash over the live order keys in
/// ascending queue order at the moment of settlement.
///
/// ## Example
///
/// ```
/// use batch_auction::types::SettlementReceipt;
///
/// let receipt = SettlementReceipt {
///     auction_id: 1,
///     book_root: [0xab; 32],
///     ..Default::default()
/// };
/// assert_eq!(receipt.book_root_hex().len(), 64);
/// assert!(!receipt.cleared_on_order());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct SettlementReceipt {
    pub auction_id: u64,

    /// `0` when the clearing price is a synthetic boundary
    pub clearing_owner_id: u64,

    /// Auctioned side of the clearing price
    pub clearing_buy_amount: u128,

    /// Bidding side of the clearing price
    pub clearing_sell_amount: u128,

    /// Fill of the marginal order, in bidding tokens
    pub clearing_volume: u128,

    /// Bidding tokens taken at the clearing price
    pub raised: u128,

    /// Auctioned tokens sold
    pub auctioneer_fill: u128,

    pub min_funding_not_reached: bool,

    /// Orders still awaiting a claim
    pub orders_remaining: u64,

    /// SHA-256 over the cleared book (32 bytes)
    pub book_root: [u8; 32],

    /// Settlement time in seconds
    pub settled_at: u64,
}

impl SettlementReceipt {
    pub fn book_root_hex(&self) -> String {
        hex::encode(self.book_root)
    }

    /// The clearing price is a real participant order.
    pub fn cleared_on_order(&self) -> bool {
        self.clearing_owner_id != 0
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
