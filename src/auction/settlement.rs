//! Settlement and claim arithmetic.
//!
//! Everything here is pure: it reads an [`Auction`] and returns the record
//! to commit together with the [`TransferBatch`] the ledger has to apply
//! first. The house owns sequencing and commits.
//!
//! ## Fee model
//!
//! At initiation the auctioneer deposits the supply `S` plus
//! `fee = S * numerator / 1000`. The fee is only earned on tokens actually
//! sold:
//!
//! ```text
//! unsold          = S - fill
//! auctioneer gets   unsold + fee * unsold / S     (auctioned token)
//!                   fill * price.sell / price.buy (bidding token)
//! fee receiver gets fee * fill / S                (auctioned token)
//! ```
//!
//! When the funding threshold is missed the auctioneer simply gets `S + fee`
//! back and every participant is refunded.

use tracing::debug;

use crate::auction::data::{Auction, AuctionData, SettlementRecord};
use crate::engine::{ClearingOutcome, ClearingScan, FillClass};
use crate::error::AuctionError;
use crate::ledger::TransferBatch;
use crate::types::price::mul_div;
use crate::types::{Order, SettlementReceipt};

/// Tokens owed to a participant for a set of orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClaimAmounts {
    pub auctioning: u128,
    pub bidding: u128,
}

impl ClaimAmounts {
    fn add(&mut self, other: ClaimAmounts) -> Result<(), AuctionError> {
        self.auctioning = self
            .auctioning
            .checked_add(other.auctioning)
            .ok_or(AuctionError::Overflow)?;
        self.bidding = self
            .bidding
            .checked_add(other.bidding)
            .ok_or(AuctionError::Overflow)?;
        Ok(())
    }
}

/// `S * numerator / 1000`
pub fn fee_amount(sell_amount: u128, numerator: u64, denominator: u64) -> Result<u128, AuctionError> {
    mul_div(sell_amount, u128::from(numerator), u128::from(denominator)).ok_or(AuctionError::Overflow)
}

/// Run the clearing scan, resuming from any interim state.
pub fn clear(auction: &Auction) -> Result<ClearingOutcome, AuctionError> {
    let data = &auction.data;
    let outcome = match data.interim.order {
        None => ClearingScan::new(data.initial_order).run(auction.queue.iter())?,
        Some(order) => data
            .interim
            .scan(data.initial_order)
            .run(auction.queue.iter_after(&order.encode())?)?,
    };
    Ok(outcome)
}

/// Clear the auction and build the settlement record plus the auctioneer's
/// payouts.
pub fn settle(auction: &Auction, now: u64) -> Result<(SettlementRecord, TransferBatch), AuctionError> {
    let data = &auction.data;
    let outcome = clear(auction)?;
    let min_funding_not_reached = outcome.raised < data.min_funding_threshold;
    let batch = auctioneer_payouts(data, &outcome, min_funding_not_reached)?;

    let clearing = outcome.clearing_order.as_order();
    let receipt = SettlementReceipt {
        auction_id: data.auction_id,
        clearing_owner_id: clearing.owner_id,
        clearing_buy_amount: clearing.buy_amount,
        clearing_sell_amount: clearing.sell_amount,
        clearing_volume: outcome.clearing_volume,
        raised: outcome.raised,
        auctioneer_fill: outcome.auctioneer_fill,
        min_funding_not_reached,
        orders_remaining: auction.queue.len() as u64,
        book_root: auction.queue.digest(),
        settled_at: now,
    };

    debug!(
        auction_id = data.auction_id,
        raised = outcome.raised,
        fill = outcome.auctioneer_fill,
        min_funding_not_reached,
        "Cleared"
    );

    let record = SettlementRecord {
        clearing_order: outcome.clearing_order,
        clearing_volume: outcome.clearing_volume,
        raised: outcome.raised,
        auctioneer_fill: outcome.auctioneer_fill,
        min_funding_not_reached,
        receipt,
    };
    Ok((record, batch))
}

fn auctioneer_payouts(
    data: &AuctionData,
    outcome: &ClearingOutcome,
    min_funding_not_reached: bool,
) -> Result<TransferBatch, AuctionError> {
    let supply = data.initial_order.sell_amount;
    let fee = data.fee_amount;
    let mut batch = TransferBatch::new();

    if min_funding_not_reached {
        let refund = supply.checked_add(fee).ok_or(AuctionError::Overflow)?;
        batch.pay(data.auctioning_token, data.auctioneer, refund);
        return Ok(batch);
    }

    let fill = outcome.auctioneer_fill;
    let unsold = supply.checked_sub(fill).ok_or(AuctionError::Overflow)?;
    let fee_back = mul_div(fee, unsold, supply).ok_or(AuctionError::Overflow)?;
    let fee_earned = mul_div(fee, fill, supply).ok_or(AuctionError::Overflow)?;

    let price = &outcome.clearing_order;
    let proceeds = if fill == 0 {
        0
    } else {
        mul_div(fill, price.sell_amount(), price.buy_amount()).ok_or(AuctionError::Overflow)?
    };

    batch
        .pay(data.auctioning_token, data.auctioneer, unsold + fee_back)
        .pay(data.bidding_token, data.auctioneer, proceeds)
        .pay(data.auctioning_token, data.fee.receiver, fee_earned);
    Ok(batch)
}

/// What one order is owed once its auction has settled.
pub fn claim_amounts(record: &SettlementRecord, order: &Order) -> Result<ClaimAmounts, AuctionError> {
    if record.min_funding_not_reached {
        return Ok(ClaimAmounts {
            auctioning: 0,
            bidding: order.sell_amount,
        });
    }

    let price = &record.clearing_order;
    let at_price = |amount: u128| {
        mul_div(amount, price.buy_amount(), price.sell_amount()).ok_or(AuctionError::Overflow)
    };

    match price.classify(order) {
        FillClass::Full => Ok(ClaimAmounts {
            auctioning: at_price(order.sell_amount)?,
            bidding: 0,
        }),
        FillClass::Marginal => Ok(ClaimAmounts {
            auctioning: at_price(record.clearing_volume)?,
            bidding: order
                .sell_amount
                .checked_sub(record.clearing_volume)
                .ok_or(AuctionError::Overflow)?,
        }),
        FillClass::Unfilled => Ok(ClaimAmounts {
            auctioning: 0,
            bidding: order.sell_amount,
        }),
    }
}

/// Sum of [`claim_amounts`] over a batch.
pub fn total_claim(record: &SettlementRecord, orders: &[Order]) -> Result<ClaimAmounts, AuctionError> {
    let mut total = ClaimAmounts::default();
    for order in orders {
        total.add(claim_amounts(record, order)?)?;
    }
    Ok(total)
}

// ============================================================================
// Unit Tests
// ============================================================================
