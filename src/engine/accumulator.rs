//! Incremental precomputation of the clearing sum.
//!
//! Books too large to clear in one bounded call can be summed ahead of
//! settlement in slices. Each call walks a fixed number of orders past the
//! stored interim order and hands back the new interim state; settlement
//! resumes the clearing scan from it.

use crate::engine::clearing::ClearingScan;
use crate::engine::EngineError;
use crate::orderbook::OrderQueue;
use crate::types::{Order, QUEUE_START};

/// Running sum of sell amounts and the last order included in it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterimState {
    pub sum_bid_amount: u128,

    /// `None` until the first order is summed
    pub order: Option<Order>,
}

impl InterimState {
    /// Clearing scan continuing from this state.
    pub fn scan(&self, initial: Order) -> ClearingScan {
        ClearingScan::resume(initial, self.sum_bid_amount, self.order)
    }
}

/// Sum `steps` more orders after `state`.
///
/// # Errors
///
/// * `ZeroSteps` - `steps` is zero
/// * `TooManyOrders` - the book holds more than `max_orders` orders
/// * `ReachedEnd` - the walk would reach the end sentinel
/// * `TooManyOrdersSummed` - the last order summed already covers the
///   supply, so settlement could no longer find the marginal order
pub fn advance(
    queue: &OrderQueue,
    initial: &Order,
    state: &InterimState,
    steps: usize,
    max_orders: usize,
) -> Result<InterimState, EngineError> {
    if steps == 0 {
        return Err(EngineError::ZeroSteps);
    }
    if queue.len() > max_orders {
        return Err(EngineError::TooManyOrders {
            count: queue.len(),
            max: max_orders,
        });
    }

    let from = state.order.unwrap_or(QUEUE_START).encode();
    let mut orders = queue.iter_after(&from)?;
    let mut sum = state.sum_bid_amount;
    let mut last = state.order;

    for _ in 0..steps {
        let order = orders.next().ok_or(EngineError::ReachedEnd)?;
        sum = sum
            .checked_add(order.sell_amount)
            .ok_or(EngineError::Overflow)?;
        last = Some(*order);
    }

    if let Some(order) = &last {
        if ClearingScan::covers_supply(initial, sum, order) {
            return Err(EngineError::TooManyOrdersSummed);
        }
    }

    Ok(InterimState {
        sum_bid_amount: sum,
        order: last,
    })
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::compute_clearing;

    fn queue_of(orders: &[Order]) -> OrderQueue {
        let mut queue = OrderQueue::new();
        for order in orders {
            queue.insert(*order, &QUEUE_START.encode()).unwrap();
        }
        queue
    }

    fn book() -> (Order, Vec<Order>) {
        let initial = Order::new(1, 10, 1_000).unwrap();
        let orders = vec![
            Order::new(2, 100, 400).unwrap(),
            Order::new(3, 100, 300).unwrap(),
            Order::new(4, 300, 300).unwrap(),
            Order::new(5, 900, 300).unwrap(),
        ];
        (initial, orders)
    }

    #[test]
    fn test_advance_accumulates_in_price_order() {
        let (initial, orders) = book();
        let queue = queue_of(&orders);

        let state = advance(&queue, &initial, &InterimState::default(), 1, 100).unwrap();
        assert_eq!(state.sum_bid_amount, 400);
        assert_eq!(state.order, Some(orders[0]));

        let state = advance(&queue, &initial, &state, 1, 100).unwrap();
        assert_eq!(state.sum_bid_amount, 700);
        assert_eq!(state.order, Some(orders[1]));
    }

    #[test]
    fn test_advance_then_settle_matches_direct() {
        let (initial, orders) = book();
        let queue = queue_of(&orders);
        let direct = compute_clearing(&orders, &initial).unwrap();

        let state = advance(&queue, &initial, &InterimState::default(), 2, 100).unwrap();
        let from = state.order.unwrap().encode();
        let resumed = state
            .scan(initial)
            .run(queue.iter_after(&from).unwrap())
            .unwrap();

        assert_eq!(direct, resumed);
    }

    #[test]
    fn test_zero_steps_rejected() {
        let (initial, orders) = book();
        let queue = queue_of(&orders);
        assert_eq!(
            advance(&queue, &initial, &InterimState::default(), 0, 100),
            Err(EngineError::ZeroSteps)
        );
    }

    #[test]
    fn test_reaching_end_fails() {
        let initial = Order::new(1, 10, 1_000_000).unwrap();
        let queue = queue_of(&[Order::new(2, 1, 10).unwrap()]);
        assert_eq!(
            advance(&queue, &initial, &InterimState::default(), 2, 100),
            Err(EngineError::ReachedEnd)
        );
    }

    #[test]
    fn test_too_many_orders() {
        let (initial, orders) = book();
        let queue = queue_of(&orders);
        assert_eq!(
            advance(&queue, &initial, &InterimState::default(), 1, 3),
            Err(EngineError::TooManyOrders { count: 4, max: 3 })
        );
    }

    #[test]
    fn test_summing_past_marginal_order_fails() {
        let (initial, orders) = book();
        let queue = queue_of(&orders);
        assert_eq!(
            advance(&queue, &initial, &InterimState::default(), 3, 100),
            Err(EngineError::TooManyOrdersSummed)
        );
    }
}
