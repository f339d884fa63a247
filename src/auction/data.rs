//! Per-auction records.
//!
//! An [`Auction`] pairs the immutable [`AuctionData`] fixed at initiation
//! with the auction's own [`OrderQueue`]. Only two parts of the data change
//! after creation: the interim sum written by incremental precomputation,
//! and the settlement record written exactly once.

use alloy_primitives::Address;

use crate::engine::{ClearingOrder, InterimState};
use crate::error::AuctionError;
use crate::ledger::TokenId;
use crate::orderbook::OrderQueue;
use crate::types::{Order, SettlementReceipt};

// ============================================================================
// Phase
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before the start time
    NotStarted,
    /// Orders may be placed and, until the cancellation deadline, cancelled
    Open,
    /// Past the end time, book frozen, precomputation allowed
    AwaitingSettlement,
    /// Clearing price fixed, claims allowed
    Settled,
}

// ============================================================================
// Parameters
// ============================================================================

/// Auctioneer input to `initiate_auction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionParams {
    pub auctioning_token: TokenId,
    pub bidding_token: TokenId,
    pub auction_start: u64,
    pub cancellation_deadline: u64,
    pub auction_end: u64,

    /// Auctioned supply
    pub auctioned_sell_amount: u128,

    /// Reserve: least amount of bidding tokens accepted for the whole supply
    pub min_buy_amount: u128,

    /// Every order must sell strictly more than this
    pub minimum_bid_amount: u128,

    /// Below this many bidding tokens raised, everything is refunded
    pub min_funding_threshold: u128,

    pub is_atomic_closure_allowed: bool,

    /// Identity of the gate consulted on placement
    pub allow_list: Option<Address>,

    /// Opaque data handed to the gate
    pub allow_list_data: Vec<u8>,
}

impl AuctionParams {
    pub fn validate(&self, now: u64) -> Result<(), AuctionError> {
        if self.auctioned_sell_amount == 0 {
            return Err(AuctionError::InvalidParameters("cannot auction zero tokens"));
        }
        if self.min_buy_amount == 0 {
            return Err(AuctionError::InvalidParameters("tokens cannot be auctioned for free"));
        }
        if self.minimum_bid_amount == 0 {
            return Err(AuctionError::InvalidParameters("minimum bid amount must be positive"));
        }
        if self.auctioning_token == self.bidding_token {
            return Err(AuctionError::InvalidParameters("auctioning and bidding token must differ"));
        }
        if self.auction_start >= self.auction_end {
            return Err(AuctionError::InvalidParameters("auction must start before it ends"));
        }
        if self.cancellation_deadline > self.auction_end {
            return Err(AuctionError::InvalidParameters("time periods are not configured correctly"));
        }
        if self.auction_end <= now {
            return Err(AuctionError::InvalidParameters("auction end date must be in the future"));
        }
        Ok(())
    }
}

/// Fee parameters as copied into an auction at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSnapshot {
    /// Thousandths of the auctioned amount
    pub numerator: u64,
    pub receiver: Address,
}

// ============================================================================
// Settlement record
// ============================================================================

/// Written once when the auction settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementRecord {
    pub clearing_order: ClearingOrder,
    pub clearing_volume: u128,
    pub raised: u128,
    pub auctioneer_fill: u128,
    pub min_funding_not_reached: bool,
    pub receipt: SettlementReceipt,
}

// ============================================================================
// Auction data
// ============================================================================

#[derive(Debug, Clone)]
pub struct AuctionData {
    pub auction_id: u64,
    pub auctioneer: Address,
    pub auctioning_token: TokenId,
    pub bidding_token: TokenId,
    pub auction_start: u64,
    pub auction_end: u64,
    pub cancellation_deadline: u64,

    /// `sell_amount` is the supply, `buy_amount` the reserve
    pub initial_order: Order,

    pub minimum_bid_amount: u128,
    pub min_funding_threshold: u128,
    pub is_atomic_closure_allowed: bool,
    pub fee: FeeSnapshot,

    /// Auctioned tokens deposited on top of the supply to cover the fee
    pub fee_amount: u128,

    pub allow_list: Option<Address>,
    pub allow_list_data: Vec<u8>,

    pub interim: InterimState,
    pub incremental_started: bool,
    pub settlement: Option<SettlementRecord>,
}

impl AuctionData {
    pub fn phase(&self, now: u64) -> Phase {
        if self.settlement.is_some() {
            Phase::Settled
        } else if now < self.auction_start {
            Phase::NotStarted
        } else if now < self.auction_end {
            Phase::Open
        } else {
            Phase::AwaitingSettlement
        }
    }

    pub fn require_phase(&self, now: u64, expected: Phase) -> Result<(), AuctionError> {
        let actual = self.phase(now);
        if actual != expected {
            return Err(AuctionError::WrongPhase {
                auction_id: self.auction_id,
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Settlement record, or a phase error if the auction has not settled.
    pub fn settled(&self, now: u64) -> Result<&SettlementRecord, AuctionError> {
        self.settlement
            .as_ref()
            .ok_or(AuctionError::WrongPhase {
                auction_id: self.auction_id,
                expected: Phase::Settled,
                actual: self.phase(now),
            })
    }

    pub fn clearing_order(&self) -> Option<&ClearingOrder> {
        self.settlement.as_ref().map(|s| &s.clearing_order)
    }

    pub fn min_funding_not_reached(&self) -> Option<bool> {
        self.settlement.as_ref().map(|s| s.min_funding_not_reached)
    }
}

/// One auction: its record and its book.
#[derive(Debug, Clone)]
pub struct Auction {
    pub(crate) data: AuctionData,
    pub(crate) queue: OrderQueue,
}

impl Auction {
    pub fn data(&self) -> &AuctionData {
        &self.data
    }

    pub fn queue(&self) -> &OrderQueue {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> AuctionParams {
        AuctionParams {
            auctioning_token: Address::repeat_byte(1),
            bidding_token: Address::repeat_byte(2),
            auction_start: 100,
            cancellation_deadline: 150,
            auction_end: 200,
            auctioned_sell_amount: 10,
            min_buy_amount: 5,
            minimum_bid_amount: 1,
            min_funding_threshold: 0,
            is_atomic_closure_allowed: false,
            allow_list: None,
            allow_list_data: Vec::new(),
        }
    }

    #[test]
    fn test_valid_params() {
        assert_eq!(params().validate(100), Ok(()));
    }

    #[test]
    fn test_rejected_params() {
        let cases: Vec<fn(&mut AuctionParams)> = vec![
            |p| p.auctioned_sell_amount = 0,
            |p| p.min_buy_amount = 0,
            |p| p.minimum_bid_amount = 0,
            |p| p.bidding_token = p.auctioning_token,
            |p| p.auction_start = 200,
            |p| p.cancellation_deadline = 201,
        ];
        for mutate in cases {
            let mut p = params();
            mutate(&mut p);
            assert!(p.validate(100).unwrap_err().is_validation_error());
        }
        assert!(params().validate(200).is_err(), "end must be in the future");
    }
}
