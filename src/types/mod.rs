//! Core data types for the batch auction engine.
//!
//! ## Types
//!
//! - [`Order`]: A participant limit order and its 32-byte queue key
//! - [`SettlementReceipt`]: SSZ-encoded summary of a settled auction
//!
//! ## Amounts
//!
//! All amounts are integer base units bounded to 96 bits and held in `u128`.
//! Products are taken in 256 bits (see [`price`]).

mod order;
mod receipt;
pub mod price;

pub use order::{
    Order, OrderError, OrderKey, MAX_AMOUNT, QUEUE_END, QUEUE_START, SYNTHETIC_OWNER_ID,
};
pub use receipt::SettlementReceipt;
