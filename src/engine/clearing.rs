//! Uniform clearing price computation.
//!
//! ## Algorithm
//!
//! Orders are scanned cheapest first while their sell amounts accumulate.
//! The first order at which the accumulated demand, converted at that
//! order's own rate, covers the auctioned supply is the marginal order:
//!
//! ```text
//! total * order.buy >= supply * order.sell
//! ```
//!
//! Everything before it fills completely. The marginal order fills the
//! residual supply, and if that residual rounds down to nothing the price
//! sits on a synthetic boundary between it and its predecessor. When demand
//! never covers the supply, the price is set by total demand or by the
//! auctioneer's reserve, whichever is higher.
//!
//! ## Resumption
//!
//! [`ClearingScan`] carries the running sum and the last order summed, so a
//! scan interrupted by the incremental accumulator resumes with exactly the
//! same result as an uninterrupted one.

use std::cmp::Ordering;

use alloy_primitives::U256;

use crate::engine::EngineError;
use crate::types::price::{mul_div, wide_mul};
use crate::types::{Order, MAX_AMOUNT, SYNTHETIC_OWNER_ID};

// ============================================================================
// Clearing order
// ============================================================================

/// The price an auction cleared at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearingOrder {
    /// A participant order is the marginal order and fills partially.
    Real(Order),

    /// The price falls between orders, or on total demand or the reserve.
    SyntheticBoundary {
        /// Auctioned side of the price
        buy_amount: u128,
        /// Bidding side of the price
        sell_amount: u128,
        /// Last order filled in full, `None` when nothing fills
        last_filled: Option<Order>,
    },
}

/// How a participant order settles against the clearing price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillClass {
    Full,
    Marginal,
    Unfilled,
}

impl ClearingOrder {
    pub fn buy_amount(&self) -> u128 {
        match self {
            ClearingOrder::Real(order) => order.buy_amount,
            ClearingOrder::SyntheticBoundary { buy_amount, .. } => *buy_amount,
        }
    }

    pub fn sell_amount(&self) -> u128 {
        match self {
            ClearingOrder::Real(order) => order.sell_amount,
            ClearingOrder::SyntheticBoundary { sell_amount, .. } => *sell_amount,
        }
    }

    /// Flat order form, with owner `0` for synthetic prices.
    pub fn as_order(&self) -> Order {
        match self {
            ClearingOrder::Real(order) => *order,
            ClearingOrder::SyntheticBoundary {
                buy_amount,
                sell_amount,
                ..
            } => Order {
                owner_id: SYNTHETIC_OWNER_ID,
                buy_amount: *buy_amount,
                sell_amount: *sell_amount,
            },
        }
    }

    /// Classify a queued order. Synthetic prices compare by queue position
    /// so rounding in the boundary amounts can never move an order across it.
    pub fn classify(&self, order: &Order) -> FillClass {
        match self {
            ClearingOrder::Real(clearing) => match order.cmp(clearing) {
                Ordering::Less => FillClass::Full,
                Ordering::Equal => FillClass::Marginal,
                Ordering::Greater => FillClass::Unfilled,
            },
            ClearingOrder::SyntheticBoundary { last_filled, .. } => match last_filled {
                Some(last) if order <= last => FillClass::Full,
                _ => FillClass::Unfilled,
            },
        }
    }
}

/// Result of a complete clearing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearingOutcome {
    pub clearing_order: ClearingOrder,

    /// Bidding tokens of the marginal order that fill, `0` when synthetic
    pub clearing_volume: u128,

    /// Bidding tokens taken at the clearing price
    pub raised: u128,

    /// Auctioned tokens sold
    pub auctioneer_fill: u128,
}

// ============================================================================
// Scan
// ============================================================================

/// Resumable clearing scan over ascending orders.
#[derive(Debug, Clone, Copy)]
pub struct ClearingScan {
    initial: Order,
    sum: u128,
    last: Option<Order>,
}

impl ClearingScan {
    /// Start a fresh scan against the auctioneer's order, where
    /// `initial.sell_amount` is the supply and `initial.buy_amount` the reserve.
    pub fn new(initial: Order) -> Self {
        Self::resume(initial, 0, None)
    }

    /// Continue after `last`, with `sum` already including it.
    pub fn resume(initial: Order, sum: u128, last: Option<Order>) -> Self {
        Self { initial, sum, last }
    }

    /// Accumulated demand up to `order` covers the supply at its rate.
    #[inline]
    pub fn covers_supply(initial: &Order, total: u128, order: &Order) -> bool {
        wide_mul(total, order.buy_amount) >= wide_mul(initial.sell_amount, order.sell_amount)
    }

    /// Consume the remaining orders, which must continue the ascending
    /// sequence this scan was resumed from.
    pub fn run<'a, I>(self, orders: I) -> Result<ClearingOutcome, EngineError>
    where
        I: IntoIterator<Item = &'a Order>,
    {
        let initial = self.initial;
        if !initial.is_real() {
            return Err(EngineError::DegenerateInitialOrder);
        }
        let supply = initial.sell_amount;
        let mut total = self.sum;
        let mut previous = self.last;

        for order in orders {
            debug_assert!(
                previous.map_or(true, |p| p < *order),
                "orders must be strictly ascending"
            );
            total = total
                .checked_add(order.sell_amount)
                .ok_or(EngineError::Overflow)?;

            if Self::covers_supply(&initial, total, order) {
                return marginal(&initial, total - order.sell_amount, *order, previous);
            }
            previous = Some(*order);
        }

        if total > initial.buy_amount {
            Ok(ClearingOutcome {
                clearing_order: synthetic(supply, total, previous)?,
                clearing_volume: 0,
                raised: total,
                auctioneer_fill: supply,
            })
        } else {
            let auctioneer_fill =
                mul_div(total, supply, initial.buy_amount).ok_or(EngineError::Overflow)?;
            Ok(ClearingOutcome {
                clearing_order: synthetic(supply, initial.buy_amount, previous)?,
                clearing_volume: 0,
                raised: total,
                auctioneer_fill,
            })
        }
    }
}

fn marginal(
    initial: &Order,
    before: u128,
    order: Order,
    previous: Option<Order>,
) -> Result<ClearingOutcome, EngineError> {
    let supply = initial.sell_amount;
    let booked = wide_mul(before, order.buy_amount) / U256::from(order.sell_amount);

    // Demand ahead of the marginal order may already exceed supply after
    // truncation, leaving nothing to cover.
    let partial = if booked >= U256::from(supply) {
        0
    } else {
        let covered = supply - u128::try_from(booked).map_err(|_| EngineError::Overflow)?;
        mul_div(covered, order.sell_amount, order.buy_amount).ok_or(EngineError::Overflow)?
    };

    if partial > 0 {
        return Ok(ClearingOutcome {
            clearing_order: ClearingOrder::Real(order),
            clearing_volume: partial,
            raised: before + partial,
            auctioneer_fill: supply,
        });
    }

    let auctioneer_fill = if before > 0 { supply } else { 0 };
    Ok(ClearingOutcome {
        clearing_order: synthetic(supply, before, previous)?,
        clearing_volume: 0,
        raised: before,
        auctioneer_fill,
    })
}

fn synthetic(
    buy_amount: u128,
    sell_amount: u128,
    last_filled: Option<Order>,
) -> Result<ClearingOrder, EngineError> {
    if sell_amount > MAX_AMOUNT {
        return Err(EngineError::Overflow);
    }
    Ok(ClearingOrder::SyntheticBoundary {
        buy_amount,
        sell_amount,
        last_filled,
    })
}

/// Clear a complete ascending order list in one pass.
///
/// # Arguments
///
/// * `sorted_orders` - Participant orders, strictly ascending
/// * `initial` - Auctioneer order: `sell_amount` supply, `buy_amount` reserve
///
/// # Example
///
/// ```
/// use batch_auction::engine::{compute_clearing, ClearingOrder};
/// use batch_auction::types::Order;
///
/// let initial = Order::new(1, 100, 100).unwrap();
/// let bid = Order::new(2, 100, 200).unwrap();
///
/// let outcome = compute_clearing(&[bid], &initial).unwrap();
/// assert_eq!(outcome.clearing_order, ClearingOrder::Real(bid));
/// assert_eq!(outcome.clearing_volume, 200);
/// ```
pub fn compute_clearing(
    sorted_orders: &[Order],
    initial: &Order,
) -> Result<ClearingOutcome, EngineError> {
    ClearingScan::new(*initial).run(sorted_orders)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::price::to_base_units;

    fn units(s: &str) -> u128 {
        to_base_units(s, 18).unwrap()
    }

    fn order(owner_id: u64, buy: &str, sell: &str) -> Order {
        Order::new(owner_id, units(buy), units(sell)).unwrap()
    }

    fn sorted(mut orders: Vec<Order>) -> Vec<Order> {
        orders.sort();
        orders
    }

    #[test]
    fn test_reserve_price_with_thin_demand() {
        let initial = order(1, "1", "1");
        let bid = order(2, "0.05", "0.1");

        let outcome = compute_clearing(&[bid], &initial).unwrap();
        assert_eq!(
            outcome.clearing_order,
            ClearingOrder::SyntheticBoundary {
                buy_amount: units("1"),
                sell_amount: units("1"),
                last_filled: Some(bid),
            }
        );
        assert_eq!(outcome.clearing_volume, 0);
        assert_eq!(outcome.auctioneer_fill, units("0.1"));
        assert_eq!(outcome.raised, units("0.1"));
    }

    #[test]
    fn test_three_identical_bids_fill_at_reserve() {
        let initial = order(1, "1", "1");
        let bids = sorted(vec![
            order(2, "0.1", "0.1"),
            order(3, "0.1", "0.1"),
            order(4, "0.1", "0.1"),
        ]);

        let outcome = compute_clearing(&bids, &initial).unwrap();
        assert_eq!(outcome.clearing_order.as_order(), Order::new(0, units("1"), units("1")).unwrap());
        assert_eq!(outcome.clearing_volume, 0);
        for bid in &bids {
            assert_eq!(outcome.clearing_order.classify(bid), FillClass::Full);
        }
    }

    #[test]
    fn test_marginal_order_with_zero_partial_fill() {
        let initial = order(1, "1", "1");
        let bids = sorted(vec![
            order(2, "0.2", "2"),
            order(3, "0.2", "2"),
            order(4, "2", "2.000000000000000001"),
        ]);

        let outcome = compute_clearing(&bids, &initial).unwrap();
        assert_eq!(
            outcome.clearing_order,
            ClearingOrder::SyntheticBoundary {
                buy_amount: units("1"),
                sell_amount: units("4"),
                last_filled: Some(bids[1]),
            }
        );
        assert_eq!(outcome.clearing_volume, 0);
        assert_eq!(outcome.clearing_order.classify(&bids[2]), FillClass::Unfilled);
        assert_eq!(outcome.clearing_order.classify(&bids[0]), FillClass::Full);
    }

    #[test]
    fn test_no_participation_uses_reserve() {
        let initial = order(1, "0.5", "1");
        let outcome = compute_clearing(&[], &initial).unwrap();

        assert_eq!(outcome.clearing_order.buy_amount(), units("1"));
        assert_eq!(outcome.clearing_order.sell_amount(), units("0.5"));
        assert_eq!(outcome.clearing_volume, 0);
        assert_eq!(outcome.raised, 0);
        assert_eq!(outcome.auctioneer_fill, 0);
    }

    #[test]
    fn test_single_order_eats_supply() {
        let initial = order(1, "1", "1");
        let bid = order(2, "10", "20");

        let outcome = compute_clearing(&[bid], &initial).unwrap();
        assert_eq!(outcome.clearing_order, ClearingOrder::Real(bid));
        assert_eq!(
            outcome.clearing_volume,
            mul_div(units("1"), bid.sell_amount, bid.buy_amount).unwrap()
        );
        assert_eq!(outcome.auctioneer_fill, units("1"));
    }

    #[test]
    fn test_demand_above_reserve_sets_price() {
        // 500 auctioned with a reserve of 1, three bids never covering supply
        let initial = order(1, "1", "500");
        let bids = sorted(vec![
            order(2, "1", "2"),
            order(3, "1", "2"),
            order(4, "1", "2"),
        ]);

        let outcome = compute_clearing(&bids, &initial).unwrap();
        assert_eq!(
            outcome.clearing_order,
            ClearingOrder::SyntheticBoundary {
                buy_amount: units("500"),
                sell_amount: units("6"),
                last_filled: Some(bids[2]),
            }
        );
        assert_eq!(outcome.auctioneer_fill, units("500"));
        assert_eq!(outcome.raised, units("6"));
    }

    #[test]
    fn test_two_of_three_orders_eat_supply() {
        let initial = order(1, "1", "3");
        let bids = sorted(vec![
            order(2, "1", "1"),
            order(3, "4", "2"),
            order(4, "6", "2"),
        ]);

        let outcome = compute_clearing(&bids, &initial).unwrap();
        // first order buys 2 at the marginal rate, leaving 1 for half the second
        assert_eq!(outcome.clearing_order, ClearingOrder::Real(bids[1]));
        assert_eq!(outcome.clearing_volume, units("0.5"));
        assert_eq!(outcome.raised, units("1.5"));
        assert_eq!(outcome.clearing_order.classify(&bids[0]), FillClass::Full);
        assert_eq!(outcome.clearing_order.classify(&bids[1]), FillClass::Marginal);
        assert_eq!(outcome.clearing_order.classify(&bids[2]), FillClass::Unfilled);
    }

    #[test]
    fn test_equal_prices_decided_by_owner() {
        let initial = order(1, "1", "1");
        let bids = sorted(vec![order(3, "0.5", "1"), order(2, "0.5", "1")]);

        let outcome = compute_clearing(&bids, &initial).unwrap();
        assert_eq!(bids[0].owner_id, 2);
        assert_eq!(outcome.clearing_order, ClearingOrder::Real(bids[1]));
    }

    #[test]
    fn test_resumed_scan_matches_direct() {
        let initial = order(1, "1", "3");
        let bids = sorted(vec![
            order(2, "0.5", "1"),
            order(3, "0.7", "1"),
            order(4, "1", "1"),
            order(5, "2", "1"),
        ]);

        let direct = compute_clearing(&bids, &initial).unwrap();
        let head: u128 = bids[..2].iter().map(|o| o.sell_amount).sum();
        let resumed = ClearingScan::resume(initial, head, Some(bids[1]))
            .run(&bids[2..])
            .unwrap();
        assert_eq!(direct, resumed);
    }

    #[test]
    fn test_degenerate_initial_order() {
        let initial = Order::new(1, 0, 5).unwrap();
        assert_eq!(
            compute_clearing(&[], &initial),
            Err(EngineError::DegenerateInitialOrder)
        );
    }

    #[test]
    fn test_demand_beyond_encodable_range_overflows() {
        // Two full-size bids at a negligible rate never cover the supply,
        // and their combined demand cannot be encoded as a boundary price.
        let initial = Order::new(1, MAX_AMOUNT, MAX_AMOUNT).unwrap();
        let bids = vec![
            Order::new(2, 1, MAX_AMOUNT).unwrap(),
            Order::new(3, 1, MAX_AMOUNT).unwrap(),
        ];

        assert_eq!(compute_clearing(&bids, &initial), Err(EngineError::Overflow));
        assert!(compute_clearing(&bids[..1], &initial).is_ok());
    }
}
