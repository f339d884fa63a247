//! Auction lifecycle.
//!
//! ```text
//! NotStarted --start--> Open --end--> AwaitingSettlement --settle--> Settled
//! ```
//!
//! Orders are placed while Open and cancelled until the cancellation
//! deadline. Once the auction is past its end the book is frozen; it may be
//! summed incrementally and is then settled, either on its own or together
//! with one last order. Claims drain the book after settlement.

pub mod data;
pub mod house;
pub mod settlement;
pub mod users;

pub use data::{Auction, AuctionData, AuctionParams, FeeSnapshot, Phase, SettlementRecord};
pub use house::{AuctionHouse, Bid};
pub use settlement::ClaimAmounts;
pub use users::UserRegistry;
