//! Participant orders and their 256-bit queue keys.
//!
//! ## Key Layout
//!
//! Every order packs into a single 32-byte big-endian key that doubles as
//! its identity inside the order queue:
//!
//! ```text
//! | owner_id (8 bytes) | buy_amount (12 bytes) | sell_amount (12 bytes) |
//! ```
//!
//! Amounts are 96-bit quantities held in `u128`. Anything above
//! [`MAX_AMOUNT`] cannot be encoded and is rejected at construction.
//!
//! ## Price Ordering
//!
//! `a` is cheaper than `b` iff `a.buy * b.sell < b.buy * a.sell`. The
//! products are taken in 256 bits so the comparison is exact. Equal prices
//! fall back to the smaller `owner_id`, then the amounts, which makes
//! [`Ord`] a total order consistent with equality.

use std::cmp::Ordering;

use alloy_primitives::B256;
use ssz_rs::prelude::*;
use thiserror::Error;

use crate::types::price::cross_cmp;

/// A 32-byte encoded order.
pub type OrderKey = B256;

/// Largest amount representable in the 96-bit key fields.
pub const MAX_AMOUNT: u128 = (1u128 << 96) - 1;

/// Owner id reserved for synthetic clearing orders.
pub const SYNTHETIC_OWNER_ID: u64 = 0;

/// Lower queue sentinel. Permanent, never removable.
pub const QUEUE_START: Order = Order {
    owner_id: 1,
    buy_amount: 0,
    sell_amount: 0,
};

/// Upper queue sentinel. Permanent, never removable.
pub const QUEUE_END: Order = Order {
    owner_id: u64::MAX,
    buy_amount: 0,
    sell_amount: 0,
};

const OWNER_BYTES: usize = 8;
const AMOUNT_BYTES: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("amount {0} does not fit in 96 bits")]
    AmountOutOfRange(u128),
}

// ============================================================================
// Order struct
// ============================================================================

/// A limit sell order: give up to `sell_amount` bidding tokens for at least
/// `buy_amount` auctioned tokens.
///
/// ## SSZ Layout
///
/// Fixed-size container of 40 bytes (8 + 16 + 16). The queue key uses the
/// packed 32-byte form from [`Order::encode`] instead.
///
/// ## Example
///
/// ```
/// use batch_auction::types::Order;
///
/// let order = Order::new(7, 50, 100).unwrap();
/// let key = order.encode();
/// assert_eq!(Order::decode(&key), order);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, SimpleSerialize)]
pub struct Order {
    /// Registered owner id, `0` only for synthetic orders
    pub owner_id: u64,

    /// Minimum amount of auctioned tokens wanted
    pub buy_amount: u128,

    /// Amount of bidding tokens offered
    pub sell_amount: u128,
}

impl Order {
    /// Create an order, checking both amounts fit in 96 bits.
    ///
    /// # Arguments
    ///
    /// * `owner_id` - Registered owner id
    /// * `buy_amount` - Auctioned tokens wanted
    /// * `sell_amount` - Bidding tokens offered
    pub fn new(owner_id: u64, buy_amount: u128, sell_amount: u128) -> Result<Self, OrderError> {
        for amount in [buy_amount, sell_amount] {
            if amount > MAX_AMOUNT {
                return Err(OrderError::AmountOutOfRange(amount));
            }
        }
        Ok(Self {
            owner_id,
            buy_amount,
            sell_amount,
        })
    }

    /// Pack into the 32-byte big-endian queue key.
    pub fn encode(&self) -> OrderKey {
        let mut bytes = [0u8; 32];
        bytes[..OWNER_BYTES].copy_from_slice(&self.owner_id.to_be_bytes());
        bytes[OWNER_BYTES..OWNER_BYTES + AMOUNT_BYTES]
            .copy_from_slice(&self.buy_amount.to_be_bytes()[16 - AMOUNT_BYTES..]);
        bytes[OWNER_BYTES + AMOUNT_BYTES..]
            .copy_from_slice(&self.sell_amount.to_be_bytes()[16 - AMOUNT_BYTES..]);
        B256::from(bytes)
    }

    /// Unpack a queue key. Every 32-byte value decodes to some order.
    pub fn decode(key: &OrderKey) -> Self {
        let bytes = key.as_slice();
        let mut owner = [0u8; 8];
        owner.copy_from_slice(&bytes[..OWNER_BYTES]);

        let mut buy = [0u8; 16];
        buy[16 - AMOUNT_BYTES..].copy_from_slice(&bytes[OWNER_BYTES..OWNER_BYTES + AMOUNT_BYTES]);

        let mut sell = [0u8; 16];
        sell[16 - AMOUNT_BYTES..].copy_from_slice(&bytes[OWNER_BYTES + AMOUNT_BYTES..]);

        Self {
            owner_id: u64::from_be_bytes(owner),
            buy_amount: u128::from_be_bytes(buy),
            sell_amount: u128::from_be_bytes(sell),
        }
    }

    /// Both amounts are positive.
    #[inline]
    pub fn is_real(&self) -> bool {
        self.buy_amount > 0 && self.sell_amount > 0
    }

    #[inline]
    pub fn is_sentinel(&self) -> bool {
        *self == QUEUE_START || *self == QUEUE_END
    }

    /// Compare limit prices only, ignoring owner and size.
    #[inline]
    pub fn price_cmp(&self, other: &Order) -> Ordering {
        cross_cmp(
            self.buy_amount,
            self.sell_amount,
            other.buy_amount,
            other.sell_amount,
        )
    }
}

impl Ord for Order {
    fn cmp(&self, other: &Self) -> Ordering {
        self.price_cmp(other)
            .then(self.owner_id.cmp(&other.owner_id))
            .then(self.buy_amount.cmp(&other.buy_amount))
            .then(self.sell_amount.cmp(&other.sell_amount))
    }
}

impl PartialOrd for Order {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
